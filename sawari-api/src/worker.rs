use tokio::time::{interval, Duration};
use tracing::{error, info};

use sawari_store::app_config::BusinessRules;
use sawari_store::StoreHandle;

/// Background sweep: periodically expires overdue holds and purges expired
/// ones past the grace window. Runs once at startup, then on the interval.
pub async fn start_sweep_worker(store: StoreHandle, rules: BusinessRules) {
    let mut ticker = interval(Duration::from_secs(rules.sweep_interval_minutes * 60));
    info!(
        interval_minutes = rules.sweep_interval_minutes,
        "sweep worker started"
    );

    loop {
        ticker.tick().await;
        match sawari_booking::sweep(&store, &rules) {
            Ok(report) => {
                if report.expired > 0 || report.purged > 0 {
                    info!(
                        expired = report.expired,
                        purged = report.purged,
                        "sweep pass complete"
                    );
                }
            }
            Err(e) => error!("sweep pass failed: {}", e),
        }
    }
}
