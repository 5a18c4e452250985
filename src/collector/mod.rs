pub mod session;

use crate::config::CollectorConfig;
use crate::dataset::{DatasetRecord, DatasetWriter};
use crate::error::{HarvestError, Result};
use crate::github::{GitHubClient, RepoSummary};
use crate::parser::code_parser::CodeParser;
use crate::parser::CodeBlock;
use session::Session;
use std::path::PathBuf;

/// Outcome of a collection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub blocks_written: usize,
    pub repositories_found: usize,
    pub repositories_visited: usize,
    pub repositories_failed: usize,
    pub output_dir: PathBuf,
}

/// Drives search -> tree -> contents -> blocks -> records for one language
pub struct Collector {
    client: GitHubClient,
    parser: CodeParser,
    writer: DatasetWriter,
    config: CollectorConfig,
}

impl Collector {
    pub fn new(
        client: GitHubClient,
        parser: CodeParser,
        writer: DatasetWriter,
        config: CollectorConfig,
    ) -> Result<Self> {
        config.validate(&parser)?;

        Ok(Self {
            client,
            parser,
            writer,
            config,
        })
    }

    pub async fn run(&self) -> RunSummary {
        let mut session = Session::new(self.config.max_blocks, self.config.max_blocks_per_repo);
        let mut summary = RunSummary {
            blocks_written: 0,
            repositories_found: 0,
            repositories_visited: 0,
            repositories_failed: 0,
            output_dir: self.writer.dir().to_path_buf(),
        };

        self.client.check_rate_limit().await;

        let repos = self
            .client
            .search_repositories(&self.config.repo_search())
            .await;
        summary.repositories_found = repos.len();

        if repos.is_empty() {
            tracing::error!("No repositories found");
            return summary;
        }

        tracing::info!(
            "{} repositories found. Target: {} code blocks",
            repos.len(),
            self.config.max_blocks
        );

        for repo in &repos {
            if session.global_cap_reached() {
                break;
            }

            session.start_repo();
            summary.repositories_visited += 1;

            tracing::info!(
                "[{}/{}] Processing: {} ({} stars)",
                session.collected(),
                self.config.max_blocks,
                repo.full_name,
                repo.stargazers_count
            );

            match self.process_repository(&mut session, repo).await {
                Ok(count) => tracing::info!("  {} blocks collected", count),
                Err(e) => {
                    summary.repositories_failed += 1;
                    tracing::warn!("  Skipping {}: {}", repo.full_name, e);
                }
            }
        }

        summary.blocks_written = session.collected();
        summary
    }

    async fn process_repository(&self, session: &mut Session, repo: &RepoSummary) -> Result<usize> {
        let language = self.parser.get(&self.config.language).ok_or_else(|| {
            HarvestError::config(format!("unsupported language '{}'", self.config.language))
        })?;

        let branch = self.client.default_branch(&repo.full_name).await;
        let files = self
            .client
            .list_files(&repo.full_name, &branch, language.extensions())
            .await?;

        tracing::info!("  {} {} files found", files.len(), self.config.language);

        for file in files.iter().take(self.config.max_files_per_repo) {
            if !session.has_capacity() {
                break;
            }

            if let Some(content) = self.client.file_contents(&repo.full_name, &file.path).await {
                if !content.is_empty() {
                    self.write_blocks(session, repo, &file.path, &content).await;
                }
            }

            tokio::time::sleep(self.config.file_pause).await;
        }

        Ok(session.repo_collected())
    }

    async fn write_blocks(&self, session: &mut Session, repo: &RepoSummary, path: &str, content: &str) {
        let blocks = self.parser.extract_blocks(content, &self.config.language);
        tracing::debug!("    {}: {} blocks", path, blocks.len());

        for block in blocks {
            if !session.has_capacity() {
                break;
            }

            let line_count = block.line_count();
            let CodeBlock {
                content,
                start_line,
                symbol_kind,
                ..
            } = block;
            let record = DatasetRecord::new(
                content,
                &repo.full_name,
                path,
                &self.config.license,
                &self.config.language,
            );

            // A failed write consumes neither a sequence number nor cap space
            match self.writer.write(session.next_sequence(), &record).await {
                Ok(written) => {
                    tracing::debug!(
                        "    wrote {} ({}, {} lines from line {})",
                        written.display(),
                        symbol_kind.as_str(),
                        line_count,
                        start_line + 1
                    );
                    session.record_written();
                }
                Err(e) => tracing::warn!("    {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{scripted_client, ScriptedTransport};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    const FIVE_FUNCTIONS: &str = "def one():\n    a = 1\n    return a\n\n\
def two():\n    b = 2\n    return b\n\n\
def three():\n    c = 3\n    return c\n\n\
def four():\n    d = 4\n    return d\n\n\
def five():\n    e = 5\n    return e\n";

    fn b64(text: &str) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(text)
    }

    fn contents_body(text: &str) -> String {
        format!(r#"{{"type":"file","encoding":"base64","content":"{}"}}"#, b64(text))
    }

    fn search_body(names: &[&str]) -> String {
        let items: Vec<String> = names
            .iter()
            .map(|n| format!(r#"{{"full_name":"{}","stargazers_count":500}}"#, n))
            .collect();
        format!(r#"{{"items":[{}]}}"#, items.join(","))
    }

    fn tree_body(paths: &[&str]) -> String {
        let entries: Vec<String> = paths
            .iter()
            .map(|p| format!(r#"{{"path":"{}","type":"blob"}}"#, p))
            .collect();
        format!(r#"{{"tree":[{}],"truncated":false}}"#, entries.join(","))
    }

    fn base_transport(repos: &[&str]) -> ScriptedTransport {
        let reset = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 3600;
        ScriptedTransport::new()
            .route(
                "/rate_limit",
                200,
                format!(r#"{{"resources":{{"core":{{"remaining":4999,"reset":{}}}}}}}"#, reset),
            )
            .route("search/repositories", 200, search_body(repos))
    }

    async fn collector(
        transport: ScriptedTransport,
        out: &Path,
        config: CollectorConfig,
    ) -> (Collector, Arc<ScriptedTransport>) {
        let (client, transport) = scripted_client(transport);
        let writer = DatasetWriter::create(out, &config.record_prefix).await.unwrap();
        let collector = Collector::new(client, CodeParser::new(), writer, config).unwrap();
        (collector, transport)
    }

    fn record_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn read_record(dir: &Path, name: &str) -> DatasetRecord {
        serde_json::from_str(&std::fs::read_to_string(dir.join(name)).unwrap()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_cap_stops_mid_file() {
        let temp = tempfile::tempdir().unwrap();
        let transport = base_transport(&["a/one", "b/two"])
            .route("/repos/a/one", 200, r#"{"default_branch":"main"}"#)
            .route("/repos/a/one/git/trees/main", 200, tree_body(&["lib.py"]))
            .route("/repos/a/one/contents/lib.py", 200, contents_body(FIVE_FUNCTIONS));
        let config = CollectorConfig {
            max_blocks: 3,
            ..Default::default()
        };

        let (collector, transport) = collector(transport, temp.path(), config).await;
        let summary = collector.run().await;

        assert_eq!(summary.blocks_written, 3);
        assert_eq!(summary.repositories_visited, 1);
        assert_eq!(
            record_files(temp.path()),
            vec!["human_1.json", "human_2.json", "human_3.json"]
        );
        assert_eq!(transport.count_calls("/repos/b/two"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_repo_cap_and_contiguous_sequence() {
        let temp = tempfile::tempdir().unwrap();
        let transport = base_transport(&["a/one", "b/two"])
            .route("/repos/a/one", 200, r#"{"default_branch":"main"}"#)
            .route("/repos/a/one/git/trees/main", 200, tree_body(&["x.py", "y.py"]))
            .route("/repos/a/one/contents/x.py", 200, contents_body(FIVE_FUNCTIONS))
            .route("/repos/a/one/contents/y.py", 200, contents_body(FIVE_FUNCTIONS))
            .route("/repos/b/two", 200, r#"{"default_branch":"trunk"}"#)
            .route("/repos/b/two/git/trees/trunk", 200, tree_body(&["z.py"]))
            .route("/repos/b/two/contents/z.py", 200, contents_body(FIVE_FUNCTIONS));
        let config = CollectorConfig {
            max_blocks_per_repo: 2,
            ..Default::default()
        };

        let (collector, transport) = collector(transport, temp.path(), config).await;
        let summary = collector.run().await;

        assert_eq!(summary.blocks_written, 4);
        assert_eq!(
            record_files(temp.path()),
            vec!["human_1.json", "human_2.json", "human_3.json", "human_4.json"]
        );
        assert_eq!(read_record(temp.path(), "human_2.json").source, "github_repo:a/one");
        assert_eq!(read_record(temp.path(), "human_3.json").source, "github_repo:b/two");
        // the cap was hit inside x.py, so y.py is never fetched
        assert_eq!(transport.count_calls("/contents/y.py"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tree_skips_repository() {
        let temp = tempfile::tempdir().unwrap();
        let transport = base_transport(&["a/one", "b/two"])
            .route("/repos/a/one", 200, r#"{"default_branch":"main"}"#)
            .route("/repos/a/one/git/trees/main", 500, "server error")
            .route("/repos/b/two", 200, r#"{"default_branch":"main"}"#)
            .route("/repos/b/two/git/trees/main", 200, tree_body(&["ok.py"]))
            .route("/repos/b/two/contents/ok.py", 200, contents_body(FIVE_FUNCTIONS));

        let (collector, _) = collector(transport, temp.path(), CollectorConfig::default()).await;
        let summary = collector.run().await;

        assert_eq!(summary.repositories_failed, 1);
        assert_eq!(summary.repositories_visited, 2);
        assert_eq!(summary.blocks_written, 5);
        assert!(record_files(temp.path())
            .iter()
            .all(|name| read_record(temp.path(), name).source == "github_repo:b/two"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_fields_and_file_scan_cap() {
        let temp = tempfile::tempdir().unwrap();
        let unicode_file = "class Grüße:\n    def sag(self):\n        return 'héllo wörld'\n";
        let transport = base_transport(&["a/one"])
            .route("/repos/a/one", 500, "")
            .route("/repos/a/one/git/trees/main", 200, tree_body(&["g.py", "skip_me.py"]))
            .route("/repos/a/one/contents/g.py", 200, contents_body(unicode_file))
            .route("/repos/a/one/contents/skip_me.py", 200, contents_body(FIVE_FUNCTIONS));
        let config = CollectorConfig {
            max_files_per_repo: 1,
            ..Default::default()
        };

        let (collector, transport) = collector(transport, temp.path(), config).await;
        let summary = collector.run().await;

        assert_eq!(summary.blocks_written, 1);
        assert_eq!(transport.count_calls("/contents/skip_me.py"), 0);

        let raw = std::fs::read_to_string(temp.path().join("human_1.json")).unwrap();
        assert!(raw.contains("Grüße"));

        let record = read_record(temp.path(), "human_1.json");
        assert_eq!(
            record,
            DatasetRecord {
                code: unicode_file.trim().to_string(),
                source: "github_repo:a/one".to_string(),
                file: "g.py".to_string(),
                license: "MIT".to_string(),
                language: "python".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_is_not_counted() {
        let temp = tempfile::tempdir().unwrap();
        // a directory squatting on the second record name makes that write fail
        std::fs::create_dir(temp.path().join("human_2.json")).unwrap();
        let transport = base_transport(&["a/one"])
            .route("/repos/a/one", 200, r#"{"default_branch":"main"}"#)
            .route("/repos/a/one/git/trees/main", 200, tree_body(&["lib.py"]))
            .route("/repos/a/one/contents/lib.py", 200, contents_body(FIVE_FUNCTIONS));
        let config = CollectorConfig {
            max_blocks: 3,
            ..Default::default()
        };

        let (collector, _) = collector(transport, temp.path(), config).await;
        let summary = collector.run().await;

        // every later block retries sequence 2 instead of skipping past it
        assert_eq!(summary.blocks_written, 1);
        assert_eq!(summary.repositories_failed, 0);
        assert_eq!(record_files(temp.path()), vec!["human_1.json", "human_2.json"]);
        assert!(temp.path().join("human_2.json").is_dir());
        assert!(read_record(temp.path(), "human_1.json").code.starts_with("def one"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_repositories_found() {
        let temp = tempfile::tempdir().unwrap();
        let (collector, _) = collector(base_transport(&[]), temp.path(), CollectorConfig::default()).await;

        let summary = collector.run().await;

        assert_eq!(summary.repositories_found, 0);
        assert_eq!(summary.blocks_written, 0);
        assert!(record_files(temp.path()).is_empty());
    }
}
