#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-deadline-ui]";

/// Legend widget styles plus the hover behaviour of highlighted cells.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --deadline-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --deadline-legend-bg: rgba(255, 255, 255, 0.97);
  --deadline-legend-border: rgba(148, 163, 184, 0.4);
  --deadline-legend-radius: 12px;
  --deadline-text: #1f2933;
  --deadline-muted: #52606d;
}

.deadline-highlighted:hover {
  filter: brightness(0.95);
}

.deadline-legend {
  position: fixed;
  top: 20px;
  right: 20px;
  z-index: 2147483000;
  min-width: 220px;
  font-family: var(--deadline-font-family);
  font-size: 13px;
  color: var(--deadline-text);
  background: var(--deadline-legend-bg);
  border: 1px solid var(--deadline-legend-border);
  border-radius: var(--deadline-legend-radius);
  box-shadow: 0 12px 32px rgba(15, 23, 42, 0.18);
  user-select: none;
}

.deadline-legend.is-dragging {
  opacity: 0.85;
}

.deadline-legend-header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  gap: 8px;
  padding: 8px 12px;
  border-bottom: 1px solid var(--deadline-legend-border);
  cursor: move;
  touch-action: none;
}

.deadline-legend-header h2 {
  margin: 0;
  font-size: 13px;
  font-weight: 600;
}

.deadline-legend-close {
  border: none;
  background: transparent;
  color: var(--deadline-muted);
  font-size: 16px;
  line-height: 1;
  cursor: pointer;
}

.deadline-legend ul {
  list-style: none;
  margin: 0;
  padding: 8px 12px 10px;
  display: flex;
  flex-direction: column;
  gap: 6px;
}

.deadline-legend-item {
  display: flex;
  align-items: center;
  gap: 8px;
}

.deadline-legend-swatch {
  width: 14px;
  height: 14px;
  border-radius: 4px;
  border: 1px solid var(--deadline-legend-border);
  flex-shrink: 0;
}

.deadline-legend-hint {
  color: var(--deadline-muted);
  font-size: 12px;
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-deadline-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
