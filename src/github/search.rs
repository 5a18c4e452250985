use super::GitHubClient;
use serde::Deserialize;
use std::time::Duration;

/// The search API serves at most 1000 results, 100 per page
pub const PER_PAGE: usize = 100;
pub const MAX_SEARCH_PAGES: usize = 10;

/// Repository returned by the search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    pub full_name: String,
    #[serde(default)]
    pub stargazers_count: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<RepoSummary>,
}

/// Repository search filters
#[derive(Debug, Clone)]
pub struct RepoSearch {
    pub language: String,
    pub license: String,
    pub min_stars: u32,
    pub max_repos: usize,
    pub page_pause: Duration,
}

impl RepoSearch {
    pub fn query(&self) -> String {
        format!(
            "language:{} license:{} stars:>{}",
            self.language, self.license, self.min_stars
        )
    }

    pub fn pages_needed(&self) -> usize {
        ((self.max_repos + PER_PAGE - 1) / PER_PAGE).min(MAX_SEARCH_PAGES)
    }
}

impl GitHubClient {
    /// Collect repositories matching `search`, most-starred first.
    ///
    /// Paging stops at the first failed or empty page; whatever was gathered
    /// until then is returned.
    pub async fn search_repositories(&self, search: &RepoSearch) -> Vec<RepoSummary> {
        tracing::info!(
            "Searching for {} repositories licensed {}...",
            search.language,
            search.license
        );

        let query = search.query();
        let per_page = PER_PAGE.to_string();
        let pages = search.pages_needed();
        let mut repos = Vec::new();

        for page in 1..=pages {
            let page_param = page.to_string();
            let url = match self.api_url(
                "search/repositories",
                &[
                    ("q", query.as_str()),
                    ("sort", "stars"),
                    ("order", "desc"),
                    ("per_page", per_page.as_str()),
                    ("page", page_param.as_str()),
                ],
            ) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!("{}", e);
                    break;
                }
            };

            let response = match self.get(&url).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Repository search failed on page {}: {}", page, e);
                    break;
                }
            };

            if !response.is_ok() {
                tracing::warn!(
                    "Repository search failed. Status: {}, page: {}. Response: {}",
                    response.status,
                    page,
                    response.body_preview(200)
                );
                break;
            }

            let items = match response.json::<SearchResponse>(&url) {
                Ok(parsed) => parsed.items,
                Err(e) => {
                    tracing::warn!("{}", e);
                    break;
                }
            };

            if items.is_empty() {
                tracing::info!("No repositories on page {}", page);
                break;
            }

            repos.extend(items);
            tracing::info!("Page {}/{} - {} repositories so far", page, pages, repos.len());

            tokio::time::sleep(search.page_pause).await;
        }

        repos.truncate(search.max_repos);
        repos
    }
}
