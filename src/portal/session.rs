use super::urls;
use super::{DataPortal, PortalError, RawEntry};
use async_trait::async_trait;
use base64::Engine;
use log::{info, warn};
use rand::Rng;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

const PAGE_SIZE: usize = 1000;
const MAX_TRIES: usize = 4;

/// HTTP session against the open-data portal. Throttled (429) and transient
/// server responses are retried a bounded number of times, honoring
/// Retry-After when the portal sends one.
pub struct PortalSession {
    client: Client,
    base_url: String,
    app_token: Option<String>,
    authorization: Option<String>,
    uid_re: Regex,
}

impl PortalSession {
    pub fn new(
        base_url: &str,
        app_token: Option<String>,
        credentials: Option<(String, String)>,
    ) -> Self {
        let authorization = credentials.map(|(user, password)| {
            format!(
                "Basic {}",
                base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", user, password))
            )
        });

        Self {
            client: Client::builder()
                .cookie_store(true)
                .timeout(Duration::from_secs(30))
                .user_agent("shotsdb/0.1")
                .build()
                .expect("failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            app_token: app_token.filter(|t| !t.is_empty()),
            authorization,
            uid_re: Regex::new(r"^[a-z0-9]{4}-[a-z0-9]{4}$").expect("uid pattern"),
        }
    }

    fn check_uid(&self, uid: &str) -> Result<(), PortalError> {
        if self.uid_re.is_match(uid) {
            Ok(())
        } else {
            Err(PortalError::MalformedUid(uid.to_string()))
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, PortalError> {
        let mut try_num = 1;
        loop {
            let mut request = self.client.get(url);
            if let Some(token) = &self.app_token {
                request = request.header("X-App-Token", token);
            }
            if let Some(auth) = &self.authorization {
                request = request.header("Authorization", auth);
            }

            let resp = request.send().await?;
            let status = resp.status();

            if status.is_success() {
                let body = resp.text().await?;
                return serde_json::from_str(&body)
                    .map_err(|e| PortalError::InvalidResponse(e.to_string()));
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if !retryable || try_num >= MAX_TRIES {
                return Err(PortalError::Status {
                    status,
                    url: url.to_string(),
                });
            }

            let wait = resp
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1 << try_num);
            let jitter = rand::thread_rng().gen_range(0..=wait / 5 + 1);
            warn!(
                "{} [{}] got {}, retry {}/{} in {}s",
                self,
                url,
                status,
                try_num,
                MAX_TRIES,
                wait + jitter
            );
            tokio::time::sleep(Duration::from_secs(wait + jitter)).await;
            try_num += 1;
        }
    }
}

#[async_trait]
impl DataPortal for PortalSession {
    async fn get_latest_dataset(&self, uid: &str) -> Result<(String, bool), PortalError> {
        self.check_uid(uid)?;
        let url = urls::url_migration(&self.base_url, uid);
        let body = self.get_json(&url).await?;

        let new_uid = body
            .get("nbeId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PortalError::InvalidResponse(format!("no nbeId in migration response [{}]", url))
            })?;
        // Never adopt an identifier the portal itself would reject.
        self.check_uid(new_uid)?;

        info!("{} get_latest_dataset({}) -> {}", self, uid, new_uid);
        Ok((new_uid.to_string(), new_uid != uid))
    }

    async fn get_content(&self, uid: &str) -> Result<Vec<RawEntry>, PortalError> {
        self.check_uid(uid)?;
        let mut entries = Vec::new();
        let mut offset = 0usize;

        loop {
            let url = urls::url_resource(&self.base_url, uid, PAGE_SIZE, offset);
            let page = self.get_json(&url).await?;
            let rows = page.as_array().ok_or_else(|| {
                PortalError::InvalidResponse(format!("expected JSON array [{}]", url))
            })?;

            for row in rows {
                match row.as_object() {
                    Some(obj) => entries.push(obj.clone()),
                    None => {
                        return Err(PortalError::InvalidResponse(format!(
                            "non-object row in content page [{}]",
                            url
                        )))
                    }
                }
            }

            info!(
                "{} get_content({}) offset={} rows={}",
                self,
                uid,
                offset,
                rows.len()
            );
            if rows.len() < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }

        Ok(entries)
    }
}

impl std::fmt::Display for PortalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<PortalSession [{}]>", self.base_url)
    }
}

impl std::fmt::Debug for PortalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<PortalSession [{}]>", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_shape() {
        let session = PortalSession::new("https://data.example.gov/", None, None);
        assert!(session.check_uid("abcd-1234").is_ok());
        assert!(session.check_uid("ABCD-1234").is_err());
        assert!(session.check_uid("abcd1234").is_err());
        assert!(session.check_uid("abcd-12345").is_err());
        assert!(session.check_uid("").is_err());
    }

    #[test]
    fn trailing_slash_stripped() {
        let session = PortalSession::new("https://data.example.gov/", None, None);
        assert_eq!(format!("{}", session), "<PortalSession [https://data.example.gov]>");
    }
}
