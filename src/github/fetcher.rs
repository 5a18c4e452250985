use super::{ApiResponse, Transport};
use crate::error::{HarvestError, Result};
use reqwest::Url;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// When to stop and wait for the API quota to refill
#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    /// Wait when fewer calls than this remain
    pub min_remaining: u64,
    /// Added on top of the time left until reset
    pub safety_margin: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            min_remaining: 10,
            safety_margin: Duration::from_secs(10),
        }
    }
}

impl QuotaPolicy {
    /// Sleep needed before `reset` (unix seconds), measured from `now`
    pub fn wait_until(&self, reset: u64, now: Duration) -> Duration {
        let until_reset = Duration::from_secs(reset).saturating_sub(now);
        until_reset + self.safety_margin
    }
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: RateLimitWindow,
}

#[derive(Debug, Deserialize)]
struct RateLimitWindow {
    remaining: u64,
    reset: u64,
}

/// GitHub REST client; every call goes through [`GitHubClient::get`] so quota
/// handling lives in one place.
pub struct GitHubClient {
    transport: Box<dyn Transport>,
    api_base: Url,
    quota: QuotaPolicy,
}

impl GitHubClient {
    pub fn new(transport: Box<dyn Transport>, api_base: &str, quota: QuotaPolicy) -> Result<Self> {
        let api_base = Url::parse(api_base.trim_end_matches('/'))
            .map_err(|e| HarvestError::InvalidUrl(format!("{}: {}", api_base, e)))?;

        if api_base.cannot_be_a_base() {
            return Err(HarvestError::InvalidUrl(api_base.to_string()));
        }

        Ok(Self {
            transport,
            api_base,
            quota,
        })
    }

    /// Build an endpoint URL; each `/`-separated piece of `path` is percent-encoded
    pub fn api_url(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut url = self.api_base.clone();

        url.path_segments_mut()
            .map_err(|_| HarvestError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url.into())
    }

    /// Pre-flight quota check: sleeps until the reset time when the remaining
    /// budget is below the policy threshold. Failures to read the quota are ignored.
    pub async fn check_rate_limit(&self) {
        let url = match self.api_url("rate_limit", &[]) {
            Ok(url) => url,
            Err(_) => return,
        };

        let response = match self.transport.get(&url).await {
            Ok(response) if response.is_ok() => response,
            Ok(response) => {
                tracing::debug!("Rate limit status unavailable (HTTP {})", response.status);
                return;
            }
            Err(e) => {
                tracing::debug!("Rate limit status unavailable: {}", e);
                return;
            }
        };

        let status: RateLimitResponse = match response.json(&url) {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!("{}", e);
                return;
            }
        };

        let core = status.resources.core;
        tracing::info!("[Rate limit] remaining: {}", core.remaining);

        if core.remaining < self.quota.min_remaining {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            let wait = self.quota.wait_until(core.reset, now);

            tracing::warn!(
                "Rate limit nearly exhausted, waiting {:.1} minutes",
                wait.as_secs_f64() / 60.0
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// GET with quota awareness: on a rate-limit status, check the quota
    /// (sleeping if needed) and retry exactly once.
    pub async fn get(&self, url: &str) -> Result<ApiResponse> {
        let response = self.transport.get(url).await?;

        if !response.is_rate_limited() {
            return Ok(response);
        }

        tracing::warn!("HTTP {} from {}, checking quota before retry", response.status, url);
        self.check_rate_limit().await;
        self.transport.get(url).await
    }
}
