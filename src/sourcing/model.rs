use crate::portal::PortalError;
use crate::sourcing::validate::ValidationError;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Portal(#[from] PortalError),
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
    #[error("fields_map is not a JSON field table: {0}")]
    FieldsMap(#[from] serde_json::Error),
}

/// What happened to one dataset during a sourcing run.
#[derive(Debug)]
pub enum DatasetOutcome {
    Sourced { entries: usize, summaries: usize },
    AlreadySourced,
    Failed(SourceError),
}

#[derive(Debug, Default)]
pub struct SourceReport {
    pub outcomes: Vec<(String, DatasetOutcome)>,
}

impl SourceReport {
    pub fn push(&mut self, uid: String, outcome: DatasetOutcome) {
        self.outcomes.push((uid, outcome));
    }

    pub fn sourced(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, DatasetOutcome::Sourced { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, DatasetOutcome::AlreadySourced))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, DatasetOutcome::Failed(_)))
            .count()
    }
}

impl std::fmt::Display for SourceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} sourced, {} already sourced, {} failed",
            self.sourced(),
            self.skipped(),
            self.failed()
        )
    }
}

/// What happened to one dataset during a version scan.
#[derive(Debug)]
pub enum ScanOutcome {
    Requeued { new_uid: String },
    Unchanged,
    Failed(SourceError),
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub outcomes: Vec<(String, ScanOutcome)>,
}

impl ScanReport {
    pub fn push(&mut self, uid: String, outcome: ScanOutcome) {
        self.outcomes.push((uid, outcome));
    }

    pub fn requeued(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ScanOutcome::Requeued { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ScanOutcome::Failed(_)))
            .count()
    }
}

impl std::fmt::Display for ScanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requeued, {} unchanged, {} failed",
            self.requeued(),
            self.outcomes.len() - self.requeued() - self.failed(),
            self.failed()
        )
    }
}
