use async_trait::async_trait;
use std::time::Duration;

use crate::models::{Engine, Extraction};

mod instagram;
mod orchestrator;
mod ytdlp;

pub use instagram::{extract_shortcode, InstagramExtractor};
pub use orchestrator::Orchestrator;
pub use ytdlp::YtDlpExtractor;

pub const MAX_DESCRIPTION_CHARS: usize = 200;

const LINE_BREAKS: [char; 4] = ['\n', '\r', '\u{2028}', '\u{2029}'];

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("bad shortcode")]
    BadShortcode,
    #[error("failed to launch extractor: {0}")]
    Launch(#[source] std::io::Error),
    #[error("extractor timed out after {0:?}")]
    Timeout(Duration),
    #[error("extractor exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("no metadata returned")]
    NoMetadata,
    #[error("malformed extractor output: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no resolvable media url")]
    NoMedia,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("private account or login required")]
    Private,
    #[error("post not found")]
    PostNotFound,
}

// ── Extractor seam ───────────────────────────────────────────────────────────

/// One extraction engine. Failures must be returned, never swallowed, so the
/// orchestrator can fall through to the next engine.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn engine(&self) -> Engine;

    async fn extract(&self, url: &str) -> Result<Extraction, EngineError>;
}

// ── Text helpers ─────────────────────────────────────────────────────────────

/// First line of `text`, cut to at most 200 characters.
pub fn short_description(text: &str) -> String {
    let line = text.split(&LINE_BREAKS[..]).next().unwrap_or("");
    line.chars().take(MAX_DESCRIPTION_CHARS).collect()
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_keeps_first_line_only() {
        assert_eq!(short_description("first\nsecond\nthird"), "first");
        assert_eq!(short_description("windows\r\nline"), "windows");
        assert_eq!(short_description(""), "");
    }

    #[test]
    fn description_stops_at_any_line_break() {
        assert_eq!(short_description("old mac\rsecond"), "old mac");
        assert_eq!(short_description("line\u{2028}separator"), "line");
        assert_eq!(short_description("para\u{2029}separator"), "para");
    }

    #[test]
    fn description_is_truncated_by_characters() {
        let long = "é".repeat(500);
        let short = short_description(&long);
        assert_eq!(short.chars().count(), MAX_DESCRIPTION_CHARS);
    }
}
