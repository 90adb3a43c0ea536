//! Diagram view — HTML presentation of a [`RenderState`].
//!
//! DESIGN
//! ======
//! The view is a pure function of the state. Markup from the renderer is
//! inserted as-is; everything that came from user text (sources, ids, embed
//! URLs, messages) is escaped. Unsettled states ask the browser to refresh so
//! the page follows the ladder without a script.

use std::fmt::Write as _;

use crate::services::render::{RenderState, Tier};

const REFRESH_SECS: u32 = 1;

const STYLE: &str = "body{font-family:Inter,Arial,sans-serif;margin:2rem;color:#1f2937}\
.card{border:1px solid #e5e7eb;border-radius:8px;padding:1.5rem}\
.canvas{min-height:200px;display:flex;align-items:center;justify-content:center;background:#f9fafb}\
.notice{background:#eff6ff;border:1px solid #bfdbfe;color:#1d4ed8;padding:.75rem;margin-top:1rem}\
.issue{background:#fefce8;border:1px solid #fde68a;color:#a16207;padding:1rem}\
.actions{display:flex;gap:.5rem;margin-bottom:1rem}\
.preview{margin-top:1rem}.preview img{max-width:100%;display:block;margin-top:.5rem}\
pre{background:#f9fafb;padding:.5rem;overflow-x:auto;font-size:.75rem}";

/// Editor handoff: fetch the payload, open the editor, post `load` on `ready`.
const EDITOR_SCRIPT: &str = r#"<script>
async function openEditor(path) {
  const res = await fetch(path, { method: 'POST' });
  if (!res.ok) { alert('Failed to convert to draw.io'); return; }
  const handoff = await res.json();
  const win = window.open(handoff.url, '_blank');
  if (!win) { alert('Popup blocked. Please allow popups to open diagrams.net.'); return; }
  window.addEventListener('message', function onMessage(evt) {
    let msg = evt.data;
    if (typeof msg === 'string' && msg !== 'ready') { try { msg = JSON.parse(msg); } catch (_) { return; } }
    if (msg === 'ready' || (msg && msg.event === 'ready')) {
      win.postMessage(handoff.message, '*');
      window.removeEventListener('message', onMessage);
    }
  });
}
</script>"#;

/// Escape text for HTML element and attribute content.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Static placeholder shown when every tier failed.
#[must_use]
pub fn placeholder_markup(source: &str, message: &str) -> String {
    format!(
        "<div class=\"issue\"><strong>Diagram Rendering Issue</strong><p>{}</p>\
         <details><summary>Raw Diagram Code</summary><pre>{}</pre></details></div>",
        escape_html(message),
        escape_html(source)
    )
}

/// Full HTML page for diagram `id` in `state`.
///
/// `exports_enabled` toggles the download and editor actions, and the inline
/// PNG preview under an unrenderable diagram.
#[must_use]
pub fn render_page(id: &str, state: &RenderState, exports_enabled: bool) -> String {
    let id_html = escape_html(id);
    let mut page = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    if !state.is_settled() {
        let _ = write!(page, "<meta http-equiv=\"refresh\" content=\"{REFRESH_SECS}\">");
    }
    let _ = write!(page, "<title>{id_html}</title><style>{STYLE}</style></head><body><div class=\"card\">");

    if exports_enabled && exportable(state) {
        let path = format!("/api/diagrams/{}", escape_html(id));
        let _ = write!(
            page,
            "<div class=\"actions\"><a href=\"{path}/png\">Download PNG</a>\
             <button onclick=\"openEditor('{path}/drawio')\">Edit in draw.io</button></div>"
        );
    }

    page.push_str("<div class=\"canvas\">");
    page.push_str(&body(id, state));
    page.push_str("</div>");
    if let RenderState::FallbackRendered { notice, .. } = state {
        let _ = write!(page, "<div class=\"notice\">{}</div>", escape_html(notice));
    }
    if exports_enabled && matches!(state, RenderState::Unrenderable { .. }) {
        page.push_str(&png_preview(id));
    }
    page.push_str("</div>");
    if exports_enabled && exportable(state) {
        page.push_str(EDITOR_SCRIPT);
    }
    page.push_str("</body></html>");
    page
}

/// Inline raster of the original text, for diagrams the engine rejected.
/// The export backend renders with its own parser and may still succeed.
fn png_preview(id: &str) -> String {
    format!(
        "<div class=\"preview\"><strong>PNG Fallback Preview</strong>\
         <img src=\"/api/diagrams/{}/png\" alt=\"Diagram PNG\" onerror=\"this.parentElement.remove()\"></div>",
        escape_html(id)
    )
}

fn body(id: &str, state: &RenderState) -> String {
    match state {
        RenderState::Idle | RenderState::Rendering { tier: Tier::Primary } => "<p>Rendering diagram...</p>".into(),
        RenderState::Rendering { tier: Tier::Retry | Tier::Fallback } => {
            "<p>Attempting to fix diagram syntax...</p>".into()
        }
        RenderState::Rendered { markup } | RenderState::FallbackRendered { markup, .. } => markup.clone(),
        RenderState::Unrenderable { source, message } => placeholder_markup(source, message),
        RenderState::Empty { message } => format!("<p>{}</p>", escape_html(message)),
        RenderState::Embedded { url } => format!(
            "<iframe title=\"Embedded {}\" src=\"{}\" width=\"100%\" height=\"600\" style=\"border:0\" allowfullscreen></iframe>",
            escape_html(id),
            escape_html(url)
        ),
    }
}

fn exportable(state: &RenderState) -> bool {
    !matches!(state, RenderState::Empty { .. } | RenderState::Embedded { .. })
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
