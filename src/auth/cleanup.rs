//! Periodic removal of expired sessions and verification records

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::service::AuthService;

/// Spawns the purge loop; the first run happens immediately
pub fn start_cleanup_task(service: AuthService, interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match service.purge_expired().await {
                Ok(report) if report.sessions > 0 || report.verifications > 0 => {
                    info!(
                        sessions = report.sessions,
                        verifications = report.verifications,
                        "Purged expired auth records"
                    );
                }
                Ok(_) => debug!("No expired auth records"),
                Err(e) => error!(error = %e, "Expired record cleanup failed"),
            }
        }
    })
}
