//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        audits::{JobAuditsService, PgJobAuditsService},
        credentials::{CredentialsService, PgCredentialsService},
        cursors::{PgSyncCursorsService, SyncCursorsService},
        jobs::{JobQueue, PgJobQueue, RetryPolicy, records::Queue},
        mappings::{MappingsService, PgMappingsService},
        tenants::{PgTenantsService, TenantsService},
        webhooks::{PgWebhookEventsService, WebhookEventsService},
    },
    engine::{
        ClientResolver, CursorSyncProcessor, DEFAULT_PAGE_SIZE, Dispatcher, JobRunner,
        OrderProcessor, Processor, ProductProcessor, Scheduler, WebhookIngress, WorkerPool,
        WorkerSettings,
    },
    platforms::{ClientFactory, HttpClientFactory, PlatformError, PlatformSettings},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to build platform clients")]
    Platforms(#[source] PlatformError),
}

/// Engine knobs that are not tied to a single worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub platforms: PlatformSettings,
    pub retry_policy: RetryPolicy,

    /// ERP customer used for orders whose customer has no mapping.
    pub default_customer_code: Option<String>,

    /// Records requested per cursor-sync page.
    pub page_size: u32,
}

impl EngineSettings {
    #[must_use]
    pub fn new(platforms: PlatformSettings) -> Self {
        Self {
            platforms,
            retry_policy: RetryPolicy::default(),
            default_customer_code: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Services and engine components shared by the server and the CLI.
#[derive(Clone)]
pub struct AppContext {
    pub db: Db,
    pub tenants: Arc<dyn TenantsService>,
    pub credentials: Arc<dyn CredentialsService>,
    pub mappings: Arc<dyn MappingsService>,
    pub cursors: Arc<dyn SyncCursorsService>,
    pub audits: Arc<dyn JobAuditsService>,
    pub webhooks: Arc<dyn WebhookEventsService>,
    pub jobs: Arc<dyn JobQueue>,
    pub dispatcher: Dispatcher,
    pub ingress: WebhookIngress,
    pub runner: JobRunner,
    orders: Arc<dyn Processor>,
    products: Arc<dyn Processor>,
    sync: Arc<dyn Processor>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails, when the
    /// connected role bypasses row-level security, or when the HTTP client cannot be
    /// built.
    pub async fn from_database_url(
        url: &str,
        settings: EngineSettings,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        database::ensure_rls_enforced_role(&pool)
            .await
            .map_err(AppInitError::Database)?;

        let factory =
            HttpClientFactory::new(settings.platforms.clone()).map_err(AppInitError::Platforms)?;

        Ok(Self::from_db(Db::new(pool), Arc::new(factory), &settings))
    }

    /// Wire every service over `db`, building platform clients through `factory`.
    #[must_use]
    pub fn from_db(db: Db, factory: Arc<dyn ClientFactory>, settings: &EngineSettings) -> Self {
        let tenants: Arc<dyn TenantsService> = Arc::new(PgTenantsService::new(db.clone()));
        let credentials: Arc<dyn CredentialsService> =
            Arc::new(PgCredentialsService::new(db.clone()));
        let mappings: Arc<dyn MappingsService> = Arc::new(PgMappingsService::new(db.clone()));
        let cursors: Arc<dyn SyncCursorsService> =
            Arc::new(PgSyncCursorsService::new(db.clone()));
        let audits: Arc<dyn JobAuditsService> = Arc::new(PgJobAuditsService::new(db.clone()));
        let webhooks: Arc<dyn WebhookEventsService> =
            Arc::new(PgWebhookEventsService::new(db.clone()));
        let jobs: Arc<dyn JobQueue> = Arc::new(PgJobQueue::new(db.clone()));

        let dispatcher = Dispatcher::new(Arc::clone(&jobs), settings.retry_policy);
        let clients = ClientResolver::new(Arc::clone(&credentials), factory);

        let orders: Arc<dyn Processor> = Arc::new(OrderProcessor::new(
            clients.clone(),
            Arc::clone(&mappings),
            settings.default_customer_code.clone(),
        ));
        let products: Arc<dyn Processor> =
            Arc::new(ProductProcessor::new(clients.clone(), Arc::clone(&mappings)));
        let sync: Arc<dyn Processor> = Arc::new(CursorSyncProcessor::new(
            clients,
            Arc::clone(&mappings),
            Arc::clone(&cursors),
            settings.page_size,
        ));

        let ingress = WebhookIngress::new(
            Arc::clone(&tenants),
            Arc::clone(&webhooks),
            dispatcher.clone(),
        );
        let runner = JobRunner::new(
            Arc::clone(&jobs),
            Arc::clone(&audits),
            Arc::clone(&tenants),
            dispatcher.clone(),
        );

        Self {
            db,
            tenants,
            credentials,
            mappings,
            cursors,
            audits,
            webhooks,
            jobs,
            dispatcher,
            ingress,
            runner,
            orders,
            products,
            sync,
        }
    }

    /// Processor that drains `queue`.
    #[must_use]
    pub fn processor(&self, queue: Queue) -> Arc<dyn Processor> {
        match queue {
            Queue::Orders => Arc::clone(&self.orders),
            Queue::Products => Arc::clone(&self.products),
            Queue::Sync => Arc::clone(&self.sync),
        }
    }

    /// A worker pool for `queue`, using `runner` so callers can attach job events.
    #[must_use]
    pub fn worker_pool(
        &self,
        queue: Queue,
        settings: WorkerSettings,
        runner: JobRunner,
    ) -> WorkerPool {
        WorkerPool::new(queue, settings, runner, self.processor(queue))
    }

    /// Scheduler that also replays unprocessed webhooks.
    #[must_use]
    pub fn scheduler(&self, replay_limit: u32) -> Scheduler {
        Scheduler::new(Arc::clone(&self.tenants), self.dispatcher.clone())
            .with_webhook_replay(self.ingress.clone(), replay_limit)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}
