use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use serde_json::json;
use url::Url;

use crate::config::ProxyConfig;

// ── Constants ────────────────────────────────────────────────────────────────

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REFERER: &str = "https://www.instagram.com/";
const CHUNK_SIZE: usize = 1024;
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub const TUNNEL_COLLAPSED: &str = "Tunnel collapsed";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("target is not an absolute http(s) URL")]
    InvalidTarget,
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned HTTP {0}")]
    Upstream(u16),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "proxy failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "detail": TUNNEL_COLLAPSED })),
        )
            .into_response()
    }
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Fetches `target` and relays its body unchanged. Any URL is accepted.
pub async fn relay(target: &str, config: &ProxyConfig) -> Result<Response, ProxyError> {
    let url = validate_target(target)?;

    // Compression stays off so the relayed bytes match upstream exactly.
    // No total deadline: a long transfer only fails when upstream goes idle.
    let client = reqwest::ClientBuilder::new()
        .connect_timeout(config.timeout)
        .read_timeout(config.timeout)
        .user_agent(DESKTOP_USER_AGENT)
        .no_gzip()
        .no_brotli()
        .no_deflate()
        .build()?;

    let response = client
        .get(url)
        .header(reqwest::header::REFERER, REFERER)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ProxyError::Upstream(response.status().as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));

    let body = response
        .bytes_stream()
        .flat_map(|chunk| stream::iter(rechunk(chunk)));

    Ok(([(CONTENT_TYPE, content_type)], Body::from_stream(body)).into_response())
}

fn validate_target(target: &str) -> Result<Url, ProxyError> {
    let url = Url::parse(target).map_err(|_| ProxyError::InvalidTarget)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ProxyError::InvalidTarget),
    }
}

/// Splits an upstream chunk into pieces of at most `CHUNK_SIZE` bytes.
fn rechunk(chunk: Result<Bytes, reqwest::Error>) -> Vec<Result<Bytes, reqwest::Error>> {
    match chunk {
        Ok(mut bytes) => {
            let mut pieces = Vec::with_capacity(bytes.len().div_ceil(CHUNK_SIZE));
            while bytes.len() > CHUNK_SIZE {
                pieces.push(Ok(bytes.split_to(CHUNK_SIZE)));
            }
            if !bytes.is_empty() {
                pieces.push(Ok(bytes));
            }
            pieces
        }
        Err(e) => {
            tracing::warn!(error = %e, "upstream stream interrupted");
            vec![Err(e)]
        }
    }
}
