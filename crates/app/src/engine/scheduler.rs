//! Scheduled cursor syncs

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info, warn};

use crate::{
    domain::{entities::EntityType, tenants::TenantsService},
    engine::{CURSOR_SYNC_ENTITIES, Dispatcher, SyncError, WebhookIngress, WorkItem},
};

/// What one tick queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub tenants: usize,
    pub jobs: usize,
    pub replayed_webhooks: usize,
}

/// Periodically queues a first-page cursor sync per active tenant and entity type, and
/// re-drives webhooks left unprocessed.
#[derive(Clone)]
pub struct Scheduler {
    tenants: Arc<dyn TenantsService>,
    dispatcher: Dispatcher,
    ingress: Option<WebhookIngress>,
    entity_types: Vec<EntityType>,
    replay_limit: u32,
}

impl Scheduler {
    #[must_use]
    pub fn new(tenants: Arc<dyn TenantsService>, dispatcher: Dispatcher) -> Self {
        Self {
            tenants,
            dispatcher,
            ingress: None,
            entity_types: CURSOR_SYNC_ENTITIES.to_vec(),
            replay_limit: 100,
        }
    }

    /// Also replay up to `limit` unprocessed webhooks per tenant on every tick.
    #[must_use]
    pub fn with_webhook_replay(mut self, ingress: WebhookIngress, limit: u32) -> Self {
        self.ingress = Some(ingress);
        self.replay_limit = limit;
        self
    }

    /// Restrict which entity types are synced.
    #[must_use]
    pub fn with_entity_types(mut self, entity_types: Vec<EntityType>) -> Self {
        self.entity_types = entity_types
            .into_iter()
            .filter(|entity_type| CURSOR_SYNC_ENTITIES.contains(entity_type))
            .collect();
        self
    }

    /// Queue one round of work.
    ///
    /// A tenant whose work cannot be queued is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only when the active tenants cannot be listed.
    pub async fn tick(&self) -> Result<TickSummary, SyncError> {
        let tenants = self.tenants.list_active_tenants().await?;
        let mut summary = TickSummary {
            tenants: tenants.len(),
            ..TickSummary::default()
        };

        for tenant in tenants {
            for entity_type in &self.entity_types {
                match self
                    .dispatcher
                    .enqueue(WorkItem::cursor_sync(tenant.uuid, *entity_type, 1))
                    .await
                {
                    Ok(_outcome) => summary.jobs += 1,
                    Err(error) => {
                        warn!(tenant = %tenant.uuid, %entity_type, error = %error.report(), "could not schedule cursor sync");
                    }
                }
            }

            if let Some(ingress) = &self.ingress {
                match ingress.replay_unprocessed(tenant.uuid, self.replay_limit).await {
                    Ok(replayed) => summary.replayed_webhooks += replayed,
                    Err(error) => {
                        warn!(tenant = %tenant.uuid, error = %error, "could not replay webhooks");
                    }
                }
            }
        }

        debug!(?summary, "scheduler tick");

        Ok(summary)
    }

    /// Tick every `every` until `shutdown` flips to `true`.
    pub async fn run(self, every: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(every_secs = every.as_secs(), "starting sync scheduler");

        loop {
            tokio::select! {
                _instant = ticker.tick() => {
                    if let Err(error) = self.tick().await {
                        error!(error = %error.report(), "scheduler tick failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("sync scheduler stopped");
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("entity_types", &self.entity_types)
            .field("replay_limit", &self.replay_limit)
            .finish_non_exhaustive()
    }
}
