use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use super::{short_description, EngineError, Extractor};
use crate::config::InstagramConfig;
use crate::models::{Engine, Extraction, MediaKind};

// ── Constants ────────────────────────────────────────────────────────────────

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const IG_APP_ID: &str = "936619743392459";
const FB_LSD_TOKEN: &str = "AVqbxe3J_YA";
const FB_ASBD_ID: &str = "129477";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const SHORTCODE_MARKERS: &[&str] = &["/reel/", "/p/"];

static SHORTCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

// ── Shortcode ────────────────────────────────────────────────────────────────

/// Pulls the post shortcode out of a `/reel/<code>` or `/p/<code>` URL.
pub fn extract_shortcode(url: &str) -> Result<String, EngineError> {
    let rest = SHORTCODE_MARKERS
        .iter()
        .find_map(|marker| url.split_once(*marker).map(|(_, rest)| rest))
        .ok_or(EngineError::BadShortcode)?;

    let code = rest
        .split(|c: char| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or("");

    if SHORTCODE_RE.is_match(code) {
        Ok(code.to_string())
    } else {
        Err(EngineError::BadShortcode)
    }
}

// ── Extractor ────────────────────────────────────────────────────────────────

/// Secondary engine: asks Instagram's GraphQL endpoint for the post object.
pub struct InstagramExtractor {
    client: reqwest::Client,
    config: InstagramConfig,
}

impl InstagramExtractor {
    pub fn new(config: InstagramConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, config })
    }

    async fn fetch_post(&self, shortcode: &str) -> Result<Value, EngineError> {
        let endpoint = format!("{}/api/graphql", self.config.base_url.trim_end_matches('/'));
        let variables = serde_json::json!({ "shortcode": shortcode }).to_string();

        let response = self
            .client
            .post(&endpoint)
            .header("X-IG-App-ID", IG_APP_ID)
            .header("X-FB-LSD", FB_LSD_TOKEN)
            .header("X-ASBD-ID", FB_ASBD_ID)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(REFERER, "https://www.instagram.com/")
            .header(ORIGIN, "https://www.instagram.com")
            .header(ACCEPT, "*/*")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .form(&[
                ("doc_id", self.config.doc_id.as_str()),
                ("variables", variables.as_str()),
                ("lsd", FB_LSD_TOKEN),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EngineError::Private);
        }
        if !status.is_success() {
            return Err(EngineError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let body: Value = serde_json::from_str(&body)?;

        let post = body
            .pointer("/data/xdt_shortcode_media")
            .or_else(|| body.pointer("/data/shortcode_media"))
            .filter(|v| !v.is_null());

        match post {
            Some(post) => Ok(post.clone()),
            None if requires_login(&body) => Err(EngineError::Private),
            None => Err(EngineError::PostNotFound),
        }
    }
}

#[async_trait]
impl Extractor for InstagramExtractor {
    fn engine(&self) -> Engine {
        Engine::Secondary
    }

    async fn extract(&self, url: &str) -> Result<Extraction, EngineError> {
        let shortcode = extract_shortcode(url)?;
        tracing::debug!(shortcode = %shortcode, "fetching post");
        let post = self.fetch_post(&shortcode).await?;
        map_post(&post)
    }
}

// ── Post mapping ─────────────────────────────────────────────────────────────

fn requires_login(body: &Value) -> bool {
    body.get("message")
        .and_then(Value::as_str)
        .map(|m| m.contains("login_required") || m.contains("checkpoint_required"))
        .unwrap_or(false)
        || body.get("require_login").and_then(Value::as_bool).unwrap_or(false)
}

fn map_post(post: &Value) -> Result<Extraction, EngineError> {
    // Carousel posts use their first child.
    let item = post
        .pointer("/edge_sidecar_to_children/edges/0/node")
        .unwrap_or(post);

    let is_video = item.get("is_video").and_then(Value::as_bool).unwrap_or(false);
    let image_url = item
        .get("display_url")
        .and_then(Value::as_str)
        .map(String::from);

    let url = if is_video {
        item.get("video_url").and_then(Value::as_str).map(String::from)
    } else {
        image_url.clone()
    }
    .ok_or(EngineError::NoMedia)?;

    let caption = post
        .pointer("/edge_media_to_caption/edges/0/node/text")
        .and_then(Value::as_str)
        .unwrap_or("");

    Ok(Extraction {
        kind: if is_video { MediaKind::Video } else { MediaKind::Image },
        url,
        thumbnail: image_url,
        description: short_description(caption),
    })
}
