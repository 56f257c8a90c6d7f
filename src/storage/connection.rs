use crate::storage::entity;
use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use std::time::Duration;

/// Unique indexes backing the pipeline's dedup keys. Cities, counties and
/// districts dedup on their full validated field set; schools on
/// (code, city, county); records on (dataset, school); summaries on
/// (dataset, sector).
const UNIQUE_INDEXES: [&str; 7] = [
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_datasets_uid ON datasets(uid);",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_cities_name ON cities(name);",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_counties_name ON counties(name);",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_districts_name ON districts(name);",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_schools_code_city_county ON schools(code, city_id, county_id);",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_records_dataset_school ON records(dataset_id, school_id);",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_summaries_dataset_sector ON summaries(dataset_id, sector_kind, sector_id);",
];

pub async fn establish_connection(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());
    opt.max_connections(10)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    if db.get_database_backend() == sea_orm::DatabaseBackend::Sqlite {
        db.execute(sea_orm::Statement::from_string(
            sea_orm::DatabaseBackend::Sqlite,
            "PRAGMA journal_mode=WAL;".to_string(),
        ))
        .await?;
    }

    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let stmt = builder.build(
        schema
            .create_table_from_entity(entity::dataset::Entity)
            .if_not_exists(),
    );
    db.execute(stmt).await?;

    let stmt = builder.build(
        schema
            .create_table_from_entity(entity::city::Entity)
            .if_not_exists(),
    );
    db.execute(stmt).await?;

    let stmt = builder.build(
        schema
            .create_table_from_entity(entity::county::Entity)
            .if_not_exists(),
    );
    db.execute(stmt).await?;

    let stmt = builder.build(
        schema
            .create_table_from_entity(entity::district::Entity)
            .if_not_exists(),
    );
    db.execute(stmt).await?;

    let stmt = builder.build(
        schema
            .create_table_from_entity(entity::school::Entity)
            .if_not_exists(),
    );
    db.execute(stmt).await?;

    let stmt = builder.build(
        schema
            .create_table_from_entity(entity::record::Entity)
            .if_not_exists(),
    );
    db.execute(stmt).await?;

    let stmt = builder.build(
        schema
            .create_table_from_entity(entity::summary::Entity)
            .if_not_exists(),
    );
    db.execute(stmt).await?;

    for index in UNIQUE_INDEXES {
        db.execute(sea_orm::Statement::from_string(
            db.get_database_backend(),
            index.to_string(),
        ))
        .await?;
    }

    info!("database ready: schema created and dedup indexes in place");

    Ok(db)
}
