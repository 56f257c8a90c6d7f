pub mod session;
pub mod urls;

pub use session::PortalSession;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// One raw content row as published by the portal. Field names are
/// source-defined; values may be absent or blank.
pub type RawEntry = Map<String, Value>;

#[derive(thiserror::Error, Debug)]
pub enum PortalError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("malformed dataset uid: {0}")]
    MalformedUid(String),
}

/// Upstream open-data portal, as seen by the pipeline.
#[async_trait]
pub trait DataPortal: Send + Sync {
    /// Current uid in the lineage of `uid`, plus whether it differs from the
    /// one we hold.
    async fn get_latest_dataset(&self, uid: &str) -> Result<(String, bool), PortalError>;

    /// Full content of one release, one pass, in upstream order.
    async fn get_content(&self, uid: &str) -> Result<Vec<RawEntry>, PortalError>;
}
