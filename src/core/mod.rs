pub mod auto_reply;
pub mod error;
pub mod events;
pub mod persona;
pub mod scheduler;
pub mod services;
pub mod settings;
pub mod traits;
