use super::GitHubClient;
use crate::error::{HarvestError, Result};
use serde::Deserialize;

/// Branch assumed when the repository metadata cannot be read
pub const FALLBACK_BRANCH: &str = "main";

#[derive(Debug, Deserialize)]
struct RepoMetadata {
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Option<Vec<FileEntry>>,
    #[serde(default)]
    truncated: bool,
}

/// One entry of a recursive repository tree
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

impl FileEntry {
    pub fn is_blob(&self) -> bool {
        self.entry_type == "blob"
    }
}

impl GitHubClient {
    /// Resolve the repository's default branch, falling back to [`FALLBACK_BRANCH`]
    pub async fn default_branch(&self, repo: &str) -> String {
        let url = match self.api_url(&format!("repos/{}", repo), &[]) {
            Ok(url) => url,
            Err(_) => return FALLBACK_BRANCH.to_string(),
        };

        let branch = match self.get(&url).await {
            Ok(response) if response.is_ok() => response
                .json::<RepoMetadata>(&url)
                .ok()
                .and_then(|m| m.default_branch),
            Ok(response) => {
                tracing::debug!("Metadata for {} unavailable (HTTP {})", repo, response.status);
                None
            }
            Err(e) => {
                tracing::debug!("Metadata for {} unavailable: {}", repo, e);
                None
            }
        };

        branch.unwrap_or_else(|| {
            tracing::warn!(
                "  Could not resolve default branch of {}, assuming '{}'",
                repo,
                FALLBACK_BRANCH
            );
            FALLBACK_BRANCH.to_string()
        })
    }

    /// List every blob on `branch` whose path ends with one of `extensions`
    pub async fn list_files(
        &self,
        repo: &str,
        branch: &str,
        extensions: &[&str],
    ) -> Result<Vec<FileEntry>> {
        let url = self.api_url(
            &format!("repos/{}/git/trees/{}", repo, branch),
            &[("recursive", "1")],
        )?;

        let response = self.get(&url).await?;
        if !response.is_ok() {
            return Err(HarvestError::Status {
                url,
                status: response.status,
            });
        }

        let listing: TreeResponse = response.json(&url)?;
        let tree = listing.tree.ok_or_else(|| HarvestError::MissingTree {
            repo: repo.to_string(),
        })?;

        if listing.truncated {
            tracing::info!("  Tree listing of {} is truncated, using partial listing", repo);
        }

        Ok(tree
            .into_iter()
            .filter(|entry| entry.is_blob())
            .filter(|entry| extensions.iter().any(|ext| entry.path.ends_with(ext)))
            .collect())
    }
}
