pub mod dataset_repo;
pub mod record_repo;
pub mod school_repo;
pub mod sector_repo;
pub mod summary_repo;

pub use dataset_repo::DatasetRepository;
pub use record_repo::{RecordFields, RecordRepository};
pub use school_repo::{SchoolFields, SchoolRepository};
pub use sector_repo::{SectorKind, SectorRepository};
pub use summary_repo::SummaryRepository;
