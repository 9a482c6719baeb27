//! The application context: built once at startup and handed to whatever
//! needs the services.

use crate::config::AppConfig;
use crate::core::events::{BusPresenter, EventBus};
use crate::core::scheduler::Scheduler;
use crate::core::services::LocalConversationService;
use crate::core::settings::StoredSettingsService;
use crate::core::traits::{ConversationService, Presenter, SettingsService};
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::repositories::{
    DbConversationRepository, DbScheduleRepository, DbSettingsRepository,
};
use log::{info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct AppContext {
    pub config: AppConfig,
    pub database: DatabaseConnection,
    pub events: EventBus,
    pub conversations: Arc<dyn ConversationService>,
    pub settings: Arc<dyn SettingsService>,
    pub scheduler: Scheduler,
}

impl AppContext {
    /// Opens the database, starts the scheduler and re-arms stored events.
    pub async fn build(config: AppConfig) -> anyhow::Result<(Arc<AppContext>, JoinHandle<()>)> {
        let database = DatabaseConnection::connect(&config.database_url).await?;
        info!("database ready at {}", config.database_url);

        let events = EventBus::new();
        let presenter = Arc::new(BusPresenter::new(events.clone()));
        let (context, scheduler_handle) = Self::assemble(config, database, events, presenter);

        // Missing a few fake calls after a restart does not stop the app.
        if let Err(e) = context.scheduler.restore().await {
            warn!("could not restore scheduled events: {e}");
        }

        Ok((context, scheduler_handle))
    }

    /// Wires the services on top of an already migrated database.
    pub fn assemble(
        config: AppConfig,
        database: DatabaseConnection,
        events: EventBus,
        presenter: Arc<dyn Presenter>,
    ) -> (Arc<AppContext>, JoinHandle<()>) {
        let conversations: Arc<dyn ConversationService> = Arc::new(LocalConversationService::new(
            Arc::new(DbConversationRepository::new(database.clone())),
            events.clone(),
        ));
        let settings: Arc<dyn SettingsService> = Arc::new(StoredSettingsService::new(Arc::new(
            DbSettingsRepository::new(database.clone()),
        )));
        let (scheduler, scheduler_handle) = Scheduler::start(
            Arc::new(DbScheduleRepository::new(database.clone())),
            presenter,
            conversations.clone(),
        );

        let context = AppContext {
            config,
            database,
            events,
            conversations,
            settings,
            scheduler,
        };

        (Arc::new(context), scheduler_handle)
    }
}
