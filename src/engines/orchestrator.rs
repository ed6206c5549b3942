use super::Extractor;
use crate::models::ExtractResponse;

/// Tries each engine in order and returns the first success.
pub struct Orchestrator {
    engines: Vec<Box<dyn Extractor>>,
}

impl Orchestrator {
    pub fn new(engines: Vec<Box<dyn Extractor>>) -> Self {
        Self { engines }
    }

    pub async fn resolve(&self, url: &str) -> ExtractResponse {
        let mut failures = Vec::with_capacity(self.engines.len());

        for extractor in &self.engines {
            match extractor.extract(url).await {
                Ok(extraction) => {
                    tracing::info!(engine = %extractor.engine(), kind = ?extraction.kind, "media resolved");
                    return ExtractResponse::resolved(extractor.engine(), extraction);
                }
                Err(e) => {
                    tracing::warn!(engine = %extractor.engine(), error = %e, "engine failed");
                    failures.push(format!("{}: {}", extractor.engine(), e));
                }
            }
        }

        tracing::error!(url, failures = ?failures, "all engines failed");
        ExtractResponse::failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::EngineError;
    use crate::models::{Engine, Extraction, MediaKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fake {
        engine: Engine,
        result: Option<Extraction>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Extractor for Fake {
        fn engine(&self) -> Engine {
            self.engine
        }

        async fn extract(&self, _url: &str) -> Result<Extraction, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().ok_or(EngineError::NoMetadata)
        }
    }

    fn sample(url: &str) -> Extraction {
        Extraction {
            kind: MediaKind::Image,
            url: url.to_string(),
            thumbnail: Some(url.to_string()),
            description: "caption".to_string(),
        }
    }

    fn pair(
        primary: Option<Extraction>,
        secondary: Option<Extraction>,
    ) -> (Orchestrator, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let primary_calls = Arc::new(AtomicUsize::new(0));
        let secondary_calls = Arc::new(AtomicUsize::new(0));
        let engines: Vec<Box<dyn Extractor>> = vec![
            Box::new(Fake {
                engine: Engine::Primary,
                result: primary,
                calls: primary_calls.clone(),
            }),
            Box::new(Fake {
                engine: Engine::Secondary,
                result: secondary,
                calls: secondary_calls.clone(),
            }),
        ];
        (Orchestrator::new(engines), primary_calls, secondary_calls)
    }

    #[tokio::test]
    async fn primary_success_skips_secondary() {
        let (orchestrator, primary, secondary) =
            pair(Some(sample("https://a/1.jpg")), Some(sample("https://b/2.jpg")));

        let response = orchestrator.resolve("https://x").await;

        assert!(response.success);
        let media = response.media.unwrap();
        assert_eq!(media.engine, Engine::Primary);
        assert_eq!(media.url, "https://a/1.jpg");
        assert_eq!(primary.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_back_to_secondary() {
        let (orchestrator, _, secondary) = pair(None, Some(sample("https://b/2.jpg")));

        let response = orchestrator.resolve("https://x").await;

        assert_eq!(response.media.unwrap().engine, Engine::Secondary);
        assert_eq!(secondary.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn double_failure_is_generic() {
        let (orchestrator, primary, secondary) = pair(None, None);

        let response = orchestrator.resolve("https://x").await;

        assert_eq!(response, ExtractResponse::failed());
        assert_eq!(primary.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.load(Ordering::SeqCst), 1);
    }
}
