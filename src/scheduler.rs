use crate::config::Config;
use crate::sourcing::SourcingService;
use log::{error, info};
use std::sync::Arc;
use tokio::time::sleep;

/// Two independent schedules: the version scanner and the sourcing driver.
/// Each loop swallows nothing silently — the per-dataset outcomes are logged
/// by the service and the totals here.
pub fn run(service: Arc<SourcingService>, config: &Config) {
    let scan_interval = config.scan_interval;
    let scanner = service.clone();
    tokio::spawn(async move {
        loop {
            match scanner.update_datasets().await {
                Ok(report) => info!("dataset scan: {}", report),
                Err(e) => error!("dataset scan aborted: {}", e),
            }
            sleep(scan_interval).await;
        }
    });

    let source_interval = config.source_interval;
    tokio::spawn(async move {
        loop {
            match service.update_db().await {
                Ok(report) => info!("sourcing run: {}", report),
                Err(e) => error!("sourcing run aborted: {}", e),
            }
            sleep(source_interval).await;
        }
    });
}
