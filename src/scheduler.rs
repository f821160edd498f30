use anyhow::Result;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::db::Store;

/// Background maintenance: sweeps expired reset tokens so dead tokens do
/// not accumulate on user rows. Consumption already checks expiry, so the
/// sweep is hygiene, not a correctness requirement.
pub struct Scheduler {
    store: Store,
    config: SchedulerConfig,
}

impl Scheduler {
    #[must_use]
    pub const fn new(store: Store, config: SchedulerConfig) -> Self {
        Self { store, config }
    }

    pub async fn start(&self) -> Result<JobScheduler> {
        let sched = JobScheduler::new().await?;

        let interval = Duration::from_secs(u64::from(self.config.prune_interval_minutes) * 60);
        let store = self.store.clone();

        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let store = store.clone();
            Box::pin(async move {
                let now_ms = chrono::Utc::now().timestamp_millis();
                match store.prune_expired_reset_tokens(now_ms).await {
                    Ok(0) => {}
                    Ok(pruned) => info!("Pruned {pruned} expired reset tokens"),
                    Err(e) => warn!("Reset token sweep failed: {e}"),
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!(
            "Scheduler started (reset-token sweep every {} minutes)",
            self.config.prune_interval_minutes
        );

        Ok(sched)
    }
}
