use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;

use super::{is_http_url, short_description, EngineError, Extractor};
use crate::config::YtDlpConfig;
use crate::models::{Engine, Extraction, MediaKind};

// ── Constants ────────────────────────────────────────────────────────────────

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
const SOCKET_TIMEOUT_SECS: u32 = 15;
const NO_METADATA_DESCRIPTION: &str = "No metadata provided.";
const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "webp"];

// ── yt-dlp JSON shape ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct Info {
    #[serde(rename = "_type")]
    kind: Option<String>,
    entries: Option<Vec<Info>>,
    url: Option<String>,
    ext: Option<String>,
    format: Option<String>,
    thumbnail: Option<String>,
    description: Option<String>,
    title: Option<String>,
    formats: Option<Vec<Format>>,
}

#[derive(Debug, Deserialize)]
struct Format {
    url: Option<String>,
    ext: Option<String>,
    vcodec: Option<String>,
}

// ── Extractor ────────────────────────────────────────────────────────────────

/// Primary engine: shells out to `yt-dlp` and reads its metadata dump.
pub struct YtDlpExtractor {
    config: YtDlpConfig,
}

impl YtDlpExtractor {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// First configured cookie file that exists right now.
    fn cookie_file(&self) -> Option<PathBuf> {
        let found = self.config.cookie_paths.iter().find(|p| p.is_file()).cloned();
        match &found {
            Some(path) => tracing::debug!(path = %path.display(), "using cookie file"),
            None => tracing::warn!(
                candidates = ?self.config.cookie_paths,
                "no cookie file found, extracting anonymously"
            ),
        }
        found
    }

    fn build_args(&self, url: &str, cookies: Option<&PathBuf>) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "-f".to_string(),
            "best".to_string(),
            "--no-check-certificates".to_string(),
            "--socket-timeout".to_string(),
            SOCKET_TIMEOUT_SECS.to_string(),
            "--user-agent".to_string(),
            MOBILE_USER_AGENT.to_string(),
        ];

        if let Some(path) = cookies {
            args.push("--cookies".to_string());
            args.push(path.display().to_string());
        }

        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn engine(&self) -> Engine {
        Engine::Primary
    }

    async fn extract(&self, url: &str) -> Result<Extraction, EngineError> {
        let cookies = self.cookie_file();
        let args = self.build_args(url, cookies.as_ref());

        let mut command = tokio::process::Command::new(&self.config.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let timeout = self.config.process_timeout;
        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| EngineError::Timeout(timeout))?
            .map_err(EngineError::Launch)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("")
                .trim()
                .to_string();
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                stderr: last_line,
            });
        }

        parse_info(&output.stdout)
    }
}

// ── Normalization ────────────────────────────────────────────────────────────

fn parse_info(stdout: &[u8]) -> Result<Extraction, EngineError> {
    if stdout.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(EngineError::NoMetadata);
    }

    let info: Option<Info> = serde_json::from_slice(stdout)?;
    let mut info = info.ok_or(EngineError::NoMetadata)?;

    // Carousels and playlists collapse to their first entry.
    if info.kind.as_deref() == Some("playlist") {
        info = info
            .entries
            .take()
            .and_then(|entries| entries.into_iter().next())
            .ok_or(EngineError::NoMetadata)?;
    }

    normalize(info)
}

fn normalize(info: Info) -> Result<Extraction, EngineError> {
    let format_label = info.format.as_deref().unwrap_or("").to_lowercase();
    let is_video = info.ext.as_deref() == Some("mp4") || format_label.contains("video");

    let direct = info.url.clone().filter(|u| is_http_url(u));

    let video_url = if is_video {
        first_mp4_format(&info).or_else(|| direct.clone())
    } else {
        None
    };

    // A video that resolves to nothing is served as its still image.
    let (kind, url) = match video_url {
        Some(url) => (MediaKind::Video, url),
        None => {
            let image = direct
                .filter(|_| info.ext.as_deref().map_or(true, |ext| IMAGE_EXTS.contains(&ext)))
                .or_else(|| info.thumbnail.clone().filter(|u| is_http_url(u)))
                .ok_or(EngineError::NoMedia)?;
            (MediaKind::Image, image)
        }
    };

    let raw_description = info
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .or(info.title.as_deref().filter(|t| !t.is_empty()))
        .unwrap_or(NO_METADATA_DESCRIPTION);

    Ok(Extraction {
        kind,
        url,
        thumbnail: info.thumbnail,
        description: short_description(raw_description),
    })
}

fn first_mp4_format(info: &Info) -> Option<String> {
    info.formats.as_ref()?.iter().find_map(|f| {
        let has_video = f.vcodec.as_deref() != Some("none");
        let url = f.url.as_deref().filter(|u| is_http_url(u))?;
        (f.ext.as_deref() == Some("mp4") && has_video).then(|| url.to_string())
    })
}
