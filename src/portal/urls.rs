/// Default open-data portal (California Health & Human Services).
pub const DEFAULT_PORTAL_URL: &str = "https://data.chhs.ca.gov";

/// Paged content of one dataset release. `$order=:id` keeps paging stable so
/// one pass sees every row exactly once.
pub fn url_resource(base: &str, uid: &str, limit: usize, offset: usize) -> String {
    format!(
        "{}/resource/{}.json?$order=:id&$limit={}&$offset={}",
        base, uid, limit, offset
    )
}

/// Migration lookup: maps any uid in a dataset lineage to the current one.
pub fn url_migration(base: &str, uid: &str) -> String {
    format!("{}/api/migrations/{}.json", base, uid)
}
