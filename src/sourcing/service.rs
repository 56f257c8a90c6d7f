use crate::portal::DataPortal;
use crate::sourcing::fields::{self, FieldsMap};
use crate::sourcing::model::{DatasetOutcome, ScanOutcome, ScanReport, SourceError, SourceReport};
use crate::sourcing::{resolver, summary};
use crate::storage::entity::dataset;
use crate::storage::repository::{
    DatasetRepository, SectorKind, SectorRepository, SummaryRepository,
};
use log::{error, info, warn};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use std::sync::Arc;

pub struct SourcingService {
    db: Arc<DatabaseConnection>,
    portal: Arc<dyn DataPortal>,
}

impl SourcingService {
    pub fn new(db: Arc<DatabaseConnection>, portal: Arc<dyn DataPortal>) -> Self {
        Self { db, portal }
    }

    /// Check every dataset against the portal and requeue the ones with a
    /// newer release. One dataset's failure never stops the scan.
    pub async fn update_datasets(&self) -> Result<ScanReport, DbErr> {
        let mut report = ScanReport::default();

        for dataset in DatasetRepository::all(self.db.as_ref()).await? {
            let uid = dataset.uid.clone();
            match self.check_one(dataset).await {
                Ok(outcome) => {
                    if let ScanOutcome::Requeued { new_uid } = &outcome {
                        info!("dataset {}: new release {}, requeued", uid, new_uid);
                    }
                    report.push(uid, outcome);
                }
                Err(e) => {
                    warn!("dataset {}: version check failed: {}", uid, e);
                    report.push(uid, ScanOutcome::Failed(e));
                }
            }
        }

        Ok(report)
    }

    async fn check_one(&self, dataset: dataset::Model) -> Result<ScanOutcome, SourceError> {
        let (new_uid, changed) = self.portal.get_latest_dataset(&dataset.uid).await?;
        if !changed {
            return Ok(ScanOutcome::Unchanged);
        }
        DatasetRepository::requeue(self.db.as_ref(), dataset, new_uid.clone()).await?;
        Ok(ScanOutcome::Requeued { new_uid })
    }

    /// Source every pending dataset, one transaction per dataset: entries,
    /// summaries and the sourced flag land together or not at all. Datasets
    /// already sourced are skipped; a failed dataset is rolled back, logged
    /// and the run moves on to the next one.
    pub async fn update_db(&self) -> Result<SourceReport, DbErr> {
        let mut report = SourceReport::default();

        for dataset in DatasetRepository::all(self.db.as_ref()).await? {
            if dataset.sourced {
                report.push(dataset.uid, DatasetOutcome::AlreadySourced);
                continue;
            }

            let uid = dataset.uid.clone();
            match self.source_one(&dataset).await {
                Ok((entries, summaries)) => {
                    info!(
                        "dataset {}: sourced {} entries, cached {} summaries",
                        uid, entries, summaries
                    );
                    report.push(uid, DatasetOutcome::Sourced { entries, summaries });
                }
                Err(e) => {
                    error!("dataset {}: sourcing failed, rolled back: {}", uid, e);
                    report.push(uid, DatasetOutcome::Failed(e));
                }
            }
        }

        Ok(report)
    }

    async fn source_one(&self, dataset: &dataset::Model) -> Result<(usize, usize), SourceError> {
        let txn = self.db.begin().await?;

        let entries = self.source_dataset(&txn, dataset).await?;
        let summaries = Self::cache_summaries(&txn, dataset).await?;
        DatasetRepository::mark_sourced(&txn, dataset.id).await?;

        txn.commit().await?;
        Ok((entries, summaries))
    }

    /// Pull the dataset's content and resolve every entry. The first entry
    /// that fails aborts the dataset; fault isolation lives one level up.
    async fn source_dataset<C: ConnectionTrait>(
        &self,
        conn: &C,
        dataset: &dataset::Model,
    ) -> Result<usize, SourceError> {
        let mappings = FieldsMap::parse(&dataset.fields_map)?.inverse();
        let content = self.portal.get_content(&dataset.uid).await?;

        let mut resolved = 0;
        for raw in content {
            let entry = fields::apply(&mappings, raw);
            resolver::resolve_entry(conn, dataset, &entry).await?;
            resolved += 1;
        }
        Ok(resolved)
    }

    /// Upsert one summary per sector that has reported records in this
    /// dataset; sectors with an empty selection get no row.
    async fn cache_summaries<C: ConnectionTrait>(
        conn: &C,
        dataset: &dataset::Model,
    ) -> Result<usize, SourceError> {
        let mut cached = 0;
        for kind in SectorKind::ALL {
            for sector_id in SectorRepository::sector_ids(conn, kind).await? {
                if let Some(document) =
                    summary::generate_summary(conn, dataset.id, kind, sector_id).await?
                {
                    SummaryRepository::upsert(conn, dataset.id, kind, sector_id, document).await?;
                    cached += 1;
                }
            }
        }
        Ok(cached)
    }
}
