use crate::config::{CollectorConfig, DEFAULT_API_URL};
use clap::Parser;
use std::path::PathBuf;

/// Harvest license-tagged code blocks from popular GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "snippet-harvester", version, about)]
pub struct Cli {
    /// GitHub token; unauthenticated runs get a much smaller quota
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// REST API base (GitHub Enterprise: https://<host>/api/v3)
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Directory receiving one JSON file per block
    #[arg(long, env = "HARVEST_OUTPUT_DIR", default_value = "human_code_dataset")]
    pub output_dir: PathBuf,

    /// License key used in the search filter (e.g. mit, apache-2.0)
    #[arg(long, env = "HARVEST_LICENSE", default_value = "mit")]
    pub license: String,

    /// Language key used in the search filter and for parsing
    #[arg(long, env = "HARVEST_LANGUAGE", default_value = "python")]
    pub language: String,

    /// Stop after this many blocks in total
    #[arg(long, env = "HARVEST_MAX_BLOCKS", default_value_t = 2500)]
    pub max_blocks: usize,

    #[arg(long, default_value_t = 50)]
    pub max_blocks_per_repo: usize,

    /// Files scanned per repository
    #[arg(long, default_value_t = 30)]
    pub max_files_per_repo: usize,

    /// Repositories requested from search (the API serves at most 1000)
    #[arg(long, default_value_t = 100)]
    pub max_repos: usize,

    /// Only repositories with more stars than this
    #[arg(long, default_value_t = 100)]
    pub min_stars: u32,

    /// File name prefix of written records
    #[arg(long, default_value = "human")]
    pub record_prefix: String,
}

impl Cli {
    pub fn to_config(&self) -> CollectorConfig {
        CollectorConfig {
            api_url: self.api_url.clone(),
            output_dir: self.output_dir.clone(),
            record_prefix: self.record_prefix.clone(),
            license: self.license.to_lowercase(),
            language: self.language.to_lowercase(),
            max_blocks: self.max_blocks,
            max_blocks_per_repo: self.max_blocks_per_repo,
            max_files_per_repo: self.max_files_per_repo,
            max_repos: self.max_repos,
            min_stars: self.min_stars,
            ..Default::default()
        }
    }
}
