use super::*;
use crate::state::test_helpers::spawn_fake_service;
use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;

const TIMEOUTS: RenderTimeouts = RenderTimeouts { request_secs: 5, connect_secs: 2 };

/// Fake renderer: rejects sources containing `bad`, otherwise echoes the curve option.
fn fake_renderer() -> Router {
    Router::new().route(
        "/mermaid/svg",
        post(|Json(body): Json<serde_json::Value>| async move {
            let source = body["diagram_source"].as_str().unwrap_or_default();
            if source.contains("bad") {
                return (StatusCode::BAD_REQUEST, "Syntax error in graph".to_owned());
            }
            let curve = body["diagram_options"]["flowchart_curve"]
                .as_str()
                .unwrap_or_default();
            (StatusCode::OK, format!("<svg data-curve=\"{curve}\"></svg>"))
        }),
    )
}

// =============================================================================
// diagram_options
// =============================================================================

#[test]
fn strict_options() {
    let options = diagram_options(&LeniencyProfile::Strict.config());
    assert_eq!(options["theme"], "default");
    assert_eq!(options["flowchart_html-labels"], "false");
    assert_eq!(options["flowchart_curve"], "linear");
    assert_eq!(options["flowchart_node-spacing"], "50");
    assert_eq!(options["flowchart_rank-spacing"], "60");
    assert_eq!(options["font-family"], "Inter, Arial, sans-serif");
    assert!(!options.contains_key("log-level"));
}

#[test]
fn lenient_options() {
    let options = diagram_options(&LeniencyProfile::Lenient.config());
    assert_eq!(options["flowchart_html-labels"], "true");
    assert_eq!(options["flowchart_curve"], "basis");
    assert_eq!(options["log-level"], "0");
    assert!(!options.contains_key("flowchart_node-spacing"));
}

// =============================================================================
// parse_response
// =============================================================================

#[test]
fn parse_response_maps_statuses() {
    assert_eq!(parse_response(200, "<svg/>".into()).unwrap().markup, "<svg/>");
    assert!(matches!(parse_response(400, "bad".into()), Err(RenderError::Syntax(msg)) if msg == "bad"));
    assert!(matches!(parse_response(503, String::new()), Err(RenderError::Response { status: 503, .. })));
}

// =============================================================================
// HTTP
// =============================================================================

#[tokio::test]
async fn render_posts_source_with_current_options() {
    let base = spawn_fake_service(fake_renderer()).await;
    let engine = KrokiEngine::new(&format!("{base}/"), TIMEOUTS).unwrap();

    let strict = engine.render("k1", "graph TD\nA[x]").await.unwrap();
    assert_eq!(strict.markup, r#"<svg data-curve="linear"></svg>"#);

    engine.initialize(&LeniencyProfile::Lenient.config());
    let lenient = engine.render("k2", "graph TD\nA[x]").await.unwrap();
    assert_eq!(lenient.markup, r#"<svg data-curve="basis"></svg>"#);
}

#[tokio::test]
async fn render_rejection_is_syntax_error() {
    let base = spawn_fake_service(fake_renderer()).await;
    let engine = KrokiEngine::new(&base, TIMEOUTS).unwrap();

    let err = engine.render("k", "bad diagram").await.unwrap_err();
    assert!(matches!(err, RenderError::Syntax(ref msg) if msg.contains("Syntax error")));
}

#[tokio::test]
async fn render_unreachable_service_is_request_error() {
    let engine = KrokiEngine::new("http://127.0.0.1:9", TIMEOUTS).unwrap();
    let err = engine.render("k", "graph TD").await.unwrap_err();
    assert!(matches!(err, RenderError::Request(_)));
}
