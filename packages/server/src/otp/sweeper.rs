use std::time::Duration;

use sea_orm::DatabaseConnection;
use tracing::{debug, error, info};

use super::purge_expired;

/// Periodically delete expired OTP records.
pub async fn run_otp_sweeper(db: DatabaseConnection, interval_secs: u64) {
    info!(interval_secs, "Starting OTP sweeper");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        interval.tick().await;

        match purge_expired(&db).await {
            Ok(0) => {}
            Ok(count) => debug!(count, "Purged expired OTP records"),
            Err(e) => error!(error = %e, "OTP sweep failed"),
        }
    }
}
