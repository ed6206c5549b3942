use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Secret file mount used by the hosted deployment.
pub const PRODUCTION_COOKIE_PATH: &str = "/etc/secrets/cookies.txt";
pub const LOCAL_COOKIE_PATH: &str = "cookies.txt";

pub const DEFAULT_INSTAGRAM_BASE_URL: &str = "https://www.instagram.com";
/// GraphQL document id of the web client's single-post query.
pub const DEFAULT_INSTAGRAM_DOC_ID: &str = "8845758582119845";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ytdlp: YtDlpConfig,
    pub instagram: InstagramConfig,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    pub binary: String,
    pub process_timeout: Duration,
    /// Cookie files in priority order; the first one present on disk wins.
    pub cookie_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct InstagramConfig {
    pub base_url: String,
    pub doc_id: String,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Applies to connecting and to each read, not to the whole transfer.
    pub timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
        }
    }
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            process_timeout: Duration::from_secs(60),
            cookie_paths: default_cookie_paths(None),
        }
    }
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INSTAGRAM_BASE_URL.to_string(),
            doc_id: DEFAULT_INSTAGRAM_DOC_ID.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let process_timeout = timeout_secs(
            "YTDLP_TIMEOUT_SECS",
            env::var("YTDLP_TIMEOUT_SECS").ok(),
            YtDlpConfig::default().process_timeout,
        )?;
        let proxy_timeout = timeout_secs(
            "PROXY_TIMEOUT_SECS",
            env::var("PROXY_TIMEOUT_SECS").ok(),
            ProxyConfig::default().timeout,
        )?;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            ytdlp: YtDlpConfig {
                binary: env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string()),
                process_timeout,
                cookie_paths: default_cookie_paths(env::var("COOKIE_FILE").ok()),
            },
            instagram: InstagramConfig {
                base_url: env::var("INSTAGRAM_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_INSTAGRAM_BASE_URL.to_string()),
                doc_id: env::var("INSTAGRAM_DOC_ID")
                    .unwrap_or_else(|_| DEFAULT_INSTAGRAM_DOC_ID.to_string()),
            },
            proxy: ProxyConfig {
                timeout: proxy_timeout,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn timeout_secs(name: &str, raw: Option<String>, default: Duration) -> Result<Duration> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{name} must be a whole number of seconds"))?;
    if secs == 0 {
        bail!("{name} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

fn default_cookie_paths(overridden: Option<String>) -> Vec<PathBuf> {
    overridden
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .into_iter()
        .chain([
            PathBuf::from(PRODUCTION_COOKIE_PATH),
            PathBuf::from(LOCAL_COOKIE_PATH),
        ])
        .collect()
}
