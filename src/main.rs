use anyhow::Context;
use log::info;
use shotsdb::config::Config;
use shotsdb::portal::PortalSession;
use shotsdb::sourcing::SourcingService;
use shotsdb::storage::repository::DatasetRepository;
use std::sync::Arc;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Error)
        .filter_module("sea_orm", log::LevelFilter::Error)
        .init();

    let config = Config::from_env();

    let db = shotsdb::storage::establish_connection(&config.database_url)
        .await
        .context("failed to connect to database")?;
    let db = Arc::new(db);

    for uid in &config.datasets {
        let (dataset, created) = DatasetRepository::get_or_create(db.as_ref(), uid)
            .await
            .with_context(|| format!("failed to register dataset {}", uid))?;
        if created {
            info!("registered dataset {} (id {})", dataset.uid, dataset.id);
        }
    }

    let portal = Arc::new(PortalSession::new(
        &config.portal_base_url,
        config.portal_app_token.clone(),
        config.portal_credentials.clone(),
    ));
    let service = Arc::new(SourcingService::new(db, portal));

    shotsdb::scheduler::run(service, &config);
    info!(
        "pipeline running: scan every {}s, source every {}s",
        config.scan_interval.as_secs(),
        config.source_interval.as_secs()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    Ok(())
}
