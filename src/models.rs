use serde::{Deserialize, Serialize};

pub const GENERIC_FAILURE: &str = "Target locked (Private) or Invalid Link.";

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Primary,
    Secondary,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

/// What a single engine resolved, before it is stamped with the engine name.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub kind: MediaKind,
    pub url: String,
    pub thumbnail: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedMedia {
    pub engine: Engine,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub thumbnail: Option<String>,
    pub description: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ExtractResponse {
    pub success: bool,
    #[serde(flatten)]
    pub media: Option<ResolvedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractResponse {
    pub fn resolved(engine: Engine, extraction: Extraction) -> Self {
        Self {
            success: true,
            media: Some(ResolvedMedia {
                engine,
                kind: extraction.kind,
                url: extraction.url,
                thumbnail: extraction.thumbnail,
                description: extraction.description,
            }),
            error: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            media: None,
            error: Some(GENERIC_FAILURE.to_string()),
        }
    }
}
