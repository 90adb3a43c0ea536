use super::*;

#[test]
fn escape_html_covers_markup_characters() {
    assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    assert_eq!(escape_html("A --> B"), "A --&gt; B");
}

#[test]
fn placeholder_echoes_escaped_source() {
    let html = placeholder_markup("A[<b>] --> B", "could not render");
    assert!(html.contains("A[&lt;b&gt;] --&gt; B"));
    assert!(html.contains("<details>"));
    assert!(html.contains("could not render"));
    assert!(!html.contains("<b>"));
}

#[test]
fn rendered_markup_is_inserted_verbatim() {
    let state = RenderState::Rendered { markup: "<svg id=\"d\"></svg>".into() };
    let page = render_page("hld", &state, false);
    assert!(page.contains("<svg id=\"d\"></svg>"));
    assert!(!page.contains("http-equiv=\"refresh\""));
    assert!(!page.contains("Download PNG"));
}

#[test]
fn fallback_shows_notice() {
    let state = RenderState::FallbackRendered { markup: "<svg/>".into(), notice: "simplified".into() };
    let page = render_page("hld", &state, false);
    assert!(page.contains("<div class=\"notice\">simplified</div>"));
}

#[test]
fn in_flight_states_refresh_and_report_progress() {
    let primary = render_page("hld", &RenderState::Rendering { tier: Tier::Primary }, false);
    assert!(primary.contains("http-equiv=\"refresh\""));
    assert!(primary.contains("Rendering diagram..."));

    let retry = render_page("hld", &RenderState::Rendering { tier: Tier::Retry }, false);
    assert!(retry.contains("Attempting to fix diagram syntax..."));
}

#[test]
fn embed_renders_escaped_iframe() {
    let state = RenderState::Embedded { url: "https://lucid.app/e?a=1&b=\"2\"".into() };
    let page = render_page("lld", &state, true);
    assert!(page.contains("src=\"https://lucid.app/e?a=1&amp;b=&quot;2&quot;\""));
    assert!(!page.contains("Download PNG"));
}

#[test]
fn exports_add_actions_and_editor_script() {
    let state = RenderState::Rendered { markup: "<svg/>".into() };
    let page = render_page("hld", &state, true);
    assert!(page.contains("href=\"/api/diagrams/hld/png\""));
    assert!(page.contains("openEditor('/api/diagrams/hld/drawio')"));
    assert!(page.contains("<script>"));
}

#[test]
fn id_is_escaped_in_title() {
    let page = render_page("<x>", &RenderState::Empty { message: "none".into() }, false);
    assert!(page.contains("<title>&lt;x&gt;</title>"));
    assert!(page.contains("<p>none</p>"));
}

#[test]
fn unrenderable_with_exports_previews_png() {
    let state = RenderState::Unrenderable { source: "A -->".into(), message: "broken".into() };
    let page = render_page("hld", &state, true);
    assert!(page.contains("PNG Fallback Preview"));
    assert!(page.contains("<img src=\"/api/diagrams/hld/png\""));
    assert!(page.find("Raw Diagram Code") < page.find("PNG Fallback Preview"));
}

#[test]
fn png_preview_needs_exports_and_a_failed_render() {
    let unrenderable = RenderState::Unrenderable { source: "A -->".into(), message: "broken".into() };
    assert!(!render_page("hld", &unrenderable, false).contains("<img"));

    let fallback = RenderState::FallbackRendered { markup: "<svg/>".into(), notice: "n".into() };
    assert!(!render_page("hld", &fallback, true).contains("PNG Fallback Preview"));
}
