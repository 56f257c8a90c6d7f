use crate::portal::urls::DEFAULT_PORTAL_URL;
use log::warn;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub portal_base_url: String,
    pub portal_app_token: Option<String>,
    pub portal_credentials: Option<(String, String)>,
    /// Dataset uids to register at startup (datasets are otherwise created
    /// out of band).
    pub datasets: Vec<String>,
    pub scan_interval: Duration,
    pub source_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://shots.db?mode=rwc".to_string());
        let portal_base_url =
            env::var("PORTAL_BASE_URL").unwrap_or_else(|_| DEFAULT_PORTAL_URL.to_string());
        let portal_app_token = env::var("PORTAL_APP_TOKEN").ok().filter(|t| !t.is_empty());
        let portal_credentials =
            match (env::var("PORTAL_USERNAME"), env::var("PORTAL_PASSWORD")) {
                (Ok(user), Ok(password)) => Some((user, password)),
                _ => None,
            };
        let datasets = env::var("DATASETS")
            .map(|raw| parse_dataset_list(&raw))
            .unwrap_or_default();

        Self {
            database_url,
            portal_base_url,
            portal_app_token,
            portal_credentials,
            datasets,
            scan_interval: Duration::from_secs(interval_var("SCAN_INTERVAL_SECS", 21600)),
            source_interval: Duration::from_secs(interval_var("SOURCE_INTERVAL_SECS", 900)),
        }
    }
}

fn parse_dataset_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn interval_var(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("ignoring unparseable {}={:?}, using {}s", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
