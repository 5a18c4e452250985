use super::GitHubClient;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(rename = "type")]
    entry_type: Option<String>,
    content: Option<String>,
}

impl GitHubClient {
    /// Fetch and decode one file. `None` means "skip this file": any non-200
    /// status, non-file entry, transport error or undecodable payload.
    pub async fn file_contents(&self, repo: &str, path: &str) -> Option<String> {
        let url = self
            .api_url(&format!("repos/{}/contents/{}", repo, path), &[])
            .ok()?;

        let response = match self.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("    {}", e);
                return None;
            }
        };

        if !response.is_ok() {
            tracing::debug!("    {} unavailable (HTTP {})", path, response.status);
            return None;
        }

        let entry: ContentsResponse = response.json(&url).ok()?;
        if entry.entry_type.as_deref() != Some("file") {
            return None;
        }

        decode_content(&entry.content?)
    }
}

/// Decode a base64 contents payload. Characters outside the base64 alphabet
/// (the API wraps payloads in newlines) are ignored, invalid UTF-8 is dropped.
pub fn decode_content(encoded: &str) -> Option<String> {
    let cleaned: String = encoded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();

    let bytes = STANDARD.decode(cleaned).ok()?;
    Some(utf8_dropping_invalid(&bytes))
}

fn utf8_dropping_invalid(mut bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());

    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                text.push_str(valid);
                return text;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let skip = e.error_len().unwrap_or(rest.len());
                bytes = &rest[skip..];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{scripted_client, ScriptedTransport};

    #[test]
    fn test_decode_wrapped_payload() {
        // "def f():\n    return 1\n" split over lines the way the API sends it
        let encoded = "ZGVmIGYoKToKICAgIHJl\ndHVybiAxCg==\n";
        assert_eq!(decode_content(encoded).unwrap(), "def f():\n    return 1\n");
    }

    #[test]
    fn test_invalid_utf8_is_dropped() {
        let encoded = STANDARD.encode(b"caf\xc3\xa9 \xff\xfeok");
        assert_eq!(decode_content(&encoded).unwrap(), "café ok");
    }

    #[test]
    fn test_bad_base64_is_none() {
        assert!(decode_content("abc").is_none());
    }

    #[tokio::test]
    async fn test_file_contents_round_trip() {
        let body = format!(
            r#"{{"type":"file","encoding":"base64","content":"{}"}}"#,
            STANDARD.encode("print('héllo')\n")
        );
        let (client, transport) = scripted_client(
            ScriptedTransport::new().route("/contents/src/app.py", 200, body),
        );

        let text = client.file_contents("octo/cat", "src/app.py").await;

        assert_eq!(text.as_deref(), Some("print('héllo')\n"));
        assert!(transport.calls()[0].ends_with("/repos/octo/cat/contents/src/app.py"));
    }

    #[tokio::test]
    async fn test_directory_entry_is_none() {
        let (client, _) = scripted_client(
            ScriptedTransport::new().route("/contents/src", 200, r#"[{"type":"file"}]"#),
        );
        assert!(client.file_contents("octo/cat", "src").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let (client, _) = scripted_client(ScriptedTransport::new());
        assert!(client.file_contents("octo/cat", "gone.py").await.is_none());
    }
}
