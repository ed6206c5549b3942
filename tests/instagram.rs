//! Secondary engine against a mocked Instagram GraphQL endpoint.

use offgrid_engine::config::InstagramConfig;
use offgrid_engine::engines::{EngineError, Extractor, InstagramExtractor};
use offgrid_engine::models::{Engine, MediaKind};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn extractor(server: &MockServer) -> InstagramExtractor {
    InstagramExtractor::new(InstagramConfig {
        base_url: server.uri(),
        doc_id: "42".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn resolves_reel_by_shortcode() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .and(header("x-ig-app-id", "936619743392459"))
        .and(body_string_contains("doc_id=42"))
        .and(body_string_contains("abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"xdt_shortcode_media": {
                "is_video": true,
                "video_url": "https://cdn.example/reel.mp4",
                "display_url": "https://cdn.example/reel.jpg",
                "edge_media_to_caption": {"edges": [{"node": {"text": "Golden hour\n#sunset"}}]}
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ig = extractor(&server);
    assert_eq!(ig.engine(), Engine::Secondary);

    let extraction = ig
        .extract("https://www.instagram.com/reel/abc123/?igsh=xyz")
        .await
        .unwrap();

    assert_eq!(extraction.kind, MediaKind::Video);
    assert_eq!(extraction.url, "https://cdn.example/reel.mp4");
    assert_eq!(extraction.thumbnail.as_deref(), Some("https://cdn.example/reel.jpg"));
    assert_eq!(extraction.description, "Golden hour");
}

#[tokio::test]
async fn bad_shortcode_never_calls_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = extractor(&server)
        .extract("https://www.instagram.com/stories/someone/123/")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::BadShortcode));
}

#[tokio::test]
async fn forbidden_is_private() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = extractor(&server)
        .extract("https://www.instagram.com/p/locked/")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Private));
}

#[tokio::test]
async fn login_message_is_private() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "login_required",
            "status": "fail"
        })))
        .mount(&server)
        .await;

    let err = extractor(&server)
        .extract("https://www.instagram.com/p/locked/")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Private));
}

#[tokio::test]
async fn null_post_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"xdt_shortcode_media": null}, "status": "ok"})),
        )
        .mount(&server)
        .await;

    let err = extractor(&server)
        .extract("https://www.instagram.com/p/gone/")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::PostNotFound));
}

#[tokio::test]
async fn server_error_is_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = extractor(&server)
        .extract("https://www.instagram.com/p/abc/")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Status(500)));
}
