use crate::error::{HarvestError, Result};
use crate::github::{QuotaPolicy, RepoSearch};
use crate::parser::code_parser::CodeParser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Static settings for one collection run
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub api_url: String,
    pub output_dir: PathBuf,
    pub record_prefix: String,
    pub license: String,
    pub language: String,
    /// Hard ceiling on records written in the run
    pub max_blocks: usize,
    pub max_blocks_per_repo: usize,
    /// Files scanned per repository, in tree order
    pub max_files_per_repo: usize,
    pub max_repos: usize,
    pub min_stars: u32,
    pub file_pause: Duration,
    pub page_pause: Duration,
    pub quota: QuotaPolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            output_dir: PathBuf::from("human_code_dataset"),
            record_prefix: "human".to_string(),
            license: "mit".to_string(),
            language: "python".to_string(),
            max_blocks: 2500,
            max_blocks_per_repo: 50,
            max_files_per_repo: 30,
            max_repos: 100,
            min_stars: 100,
            file_pause: Duration::from_millis(100),
            page_pause: Duration::from_secs(1),
            quota: QuotaPolicy::default(),
        }
    }
}

impl CollectorConfig {
    pub fn validate(&self, parser: &CodeParser) -> Result<()> {
        if parser.get(&self.language).is_none() {
            return Err(HarvestError::config(format!(
                "unsupported language '{}' (supported: {})",
                self.language,
                parser.supported_languages().join(", ")
            )));
        }

        if self.license.trim().is_empty() {
            return Err(HarvestError::config("license must not be empty"));
        }

        if self.record_prefix.trim().is_empty() {
            return Err(HarvestError::config("record prefix must not be empty"));
        }

        let caps = [
            ("max blocks", self.max_blocks),
            ("max blocks per repository", self.max_blocks_per_repo),
            ("max files per repository", self.max_files_per_repo),
            ("max repositories", self.max_repos),
        ];
        for (name, value) in caps {
            if value == 0 {
                return Err(HarvestError::config(format!("{} must be at least 1", name)));
            }
        }

        Ok(())
    }

    pub fn repo_search(&self) -> RepoSearch {
        RepoSearch {
            language: self.language.clone(),
            license: self.license.clone(),
            min_stars: self.min_stars,
            max_repos: self.max_repos,
            page_pause: self.page_pause,
        }
    }
}
