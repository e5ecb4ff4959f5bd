use std::sync::Arc;

use arc_swap::ArcSwapOption;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::AvailabilityConfig;
use crate::contract::client::AvailabilityApi;
use crate::domain::events::AvailabilityEvent;
use crate::domain::repo::ScheduleRepository;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::AvailabilityLocalClient;
use crate::infra::events::{BroadcastEventPublisher, FanoutEventPublisher, TracingEventPublisher};
use crate::infra::storage::memory_repo::InMemoryScheduleRepository;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmScheduleRepository;

const EVENT_BUFFER: usize = 256;

/// Module wiring: picks a repository, builds the domain service and hands
/// out the local client.
pub struct AvailabilityModule {
    // Keep the domain service behind ArcSwap for cheap read-mostly access.
    service: ArcSwapOption<Service>,
    events: BroadcastEventPublisher,
}

impl Default for AvailabilityModule {
    fn default() -> Self {
        Self {
            service: ArcSwapOption::empty(),
            events: BroadcastEventPublisher::new(EVENT_BUFFER),
        }
    }
}

impl From<&AvailabilityConfig> for ServiceConfig {
    fn from(cfg: &AvailabilityConfig) -> Self {
        Self {
            granularity: cfg.granularity,
            allow_reservation_override: cfg.allow_reservation_override,
            next_open_horizon_days: cfg.next_open_horizon_days,
        }
    }
}

impl AvailabilityModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the service. With `db` the SeaORM repository is used (run
    /// [`AvailabilityModule::migrate`] first), otherwise state lives in memory.
    pub fn init(&self, cfg: &AvailabilityConfig, db: Option<DatabaseConnection>) {
        info!("Initializing availability module");
        debug!(
            granularity = %cfg.granularity,
            allow_reservation_override = cfg.allow_reservation_override,
            next_open_horizon_days = cfg.next_open_horizon_days,
            "Loaded availability config"
        );

        let repo: Arc<dyn ScheduleRepository> = match db {
            Some(conn) => {
                info!("Using SeaORM schedule repository");
                Arc::new(SeaOrmScheduleRepository::new(conn))
            }
            None => {
                info!("Using in-memory schedule repository");
                Arc::new(InMemoryScheduleRepository::new())
            }
        };
        self.init_with_repo(cfg, repo);
    }

    /// Build the service over a caller-supplied repository.
    pub fn init_with_repo(&self, cfg: &AvailabilityConfig, repo: Arc<dyn ScheduleRepository>) {
        let events = FanoutEventPublisher::new()
            .with(Arc::new(TracingEventPublisher))
            .with(Arc::new(self.events.clone()));
        let service = Service::new(repo, Arc::new(events), ServiceConfig::from(cfg));
        self.service.store(Some(Arc::new(service)));
    }

    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running availability database migrations");
        Migrator::up(db, None).await?;
        info!("Availability database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    /// Local in-process client over the initialized service.
    pub fn client(&self) -> anyhow::Result<Arc<dyn AvailabilityApi>> {
        Ok(Arc::new(AvailabilityLocalClient::new(self.service()?)))
    }

    /// Receive every domain event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AvailabilityEvent> {
        self.events.subscribe()
    }
}
