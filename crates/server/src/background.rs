//! Worker pools and the cursor-sync scheduler.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinSet};
use tracing::{error, info};

use syncbridge_app::{context::AppContext, domain::jobs::records::Queue};

use crate::{config::ServerConfig, observability::JobMetrics};

/// Spawn one pool per queue plus the scheduler. Each task stops once `shutdown` flips.
pub(crate) fn spawn(
    app: &AppContext,
    config: &ServerConfig,
    shutdown: &watch::Receiver<bool>,
) -> JoinSet<()> {
    let mut tasks = JoinSet::new();

    if !config.workers.workers_enabled {
        info!("worker pools disabled; serving ingress only");
        return tasks;
    }

    let runner = app.runner.clone().with_events(Arc::new(JobMetrics));

    for queue in Queue::ALL {
        let pool = app.worker_pool(queue, config.worker_settings(queue), runner.clone());

        tasks.spawn(pool.run(shutdown.clone()));
    }

    match config.workers.sync_interval() {
        Some(every) => {
            let scheduler = app.scheduler(config.workers.webhook_replay_limit);

            tasks.spawn(scheduler.run(every, shutdown.clone()));
        }
        None => info!("sync scheduler disabled"),
    }

    tasks
}

/// Wait for every background task to return.
pub(crate) async fn drain(mut tasks: JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(source) = joined {
            error!("background task failed: {source}");
        }
    }
}
