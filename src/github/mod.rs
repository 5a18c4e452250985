pub mod contents;
pub mod fetcher;
pub mod repo;
pub mod search;

use crate::error::{HarvestError, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;

pub use fetcher::{GitHubClient, QuotaPolicy};
pub use search::{RepoSearch, RepoSummary};

const API_ACCEPT: &str = "application/vnd.github.v3+json";
const CLIENT_AGENT: &str = concat!("snippet-harvester/", env!("CARGO_PKG_VERSION"));

/// Status code and body of one API call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Quota exhaustion is reported as 403, secondary limits as 429
    pub fn is_rate_limited(&self) -> bool {
        self.status == 403 || self.status == 429
    }

    pub fn json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|source| HarvestError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// First `max` characters of the body, for log lines
    pub fn body_preview(&self, max: usize) -> &str {
        match self.body.char_indices().nth(max) {
            Some((idx, _)) => &self.body[..idx],
            None => &self.body,
        }
    }
}

/// Raw HTTP GET against the code host
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<ApiResponse>;
}

/// reqwest-backed transport sending the API headers on every call
pub struct ReqwestTransport {
    client: Client,
    token: Option<String>,
}

impl ReqwestTransport {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<ApiResponse> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, API_ACCEPT)
            .header(USER_AGENT, CLIENT_AGENT);

        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        let transport_err = |e: reqwest::Error| HarvestError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = request.send().await.map_err(transport_err)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_err)?;

        Ok(ApiResponse { status, body })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_preview_respects_char_boundaries() {
        let response = ApiResponse {
            status: 500,
            body: "ééééé".to_string(),
        };
        assert_eq!(response.body_preview(2), "éé");
        assert_eq!(response.body_preview(50), "ééééé");
    }

    #[test]
    fn test_rate_limited_statuses() {
        let forbidden = ApiResponse {
            status: 403,
            body: String::new(),
        };
        let ok = ApiResponse {
            status: 200,
            body: String::new(),
        };
        assert!(forbidden.is_rate_limited());
        assert!(!ok.is_rate_limited());
        assert!(ok.is_ok());
    }
}
