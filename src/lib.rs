//! Fake incoming calls and chat messages for when you need a way out.
//!
//! Library exports, shared by the server binary and the tests.

pub mod api;
pub mod config;
pub mod context;
pub mod core;
pub mod infrastructure;
