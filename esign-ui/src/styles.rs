#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-esign-ui]";

/// Default console CSS; hosts override the custom properties.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --esign-font-family: 'Pretendard', 'Noto Sans KR', system-ui, -apple-system, sans-serif;
  --esign-bg: #f8fafc;
  --esign-card-bg: #ffffff;
  --esign-border: rgba(148, 163, 184, 0.32);
  --esign-radius: 12px;
  --esign-text: #1f2933;
  --esign-muted: #64748b;
  --esign-heading: #0f172a;
  --esign-accent: #2563eb;
  --esign-accent-hover: #1d4ed8;
  --esign-tone-success: #047857;
  --esign-tone-success-bg: rgba(16, 185, 129, 0.14);
  --esign-tone-danger: #b42318;
  --esign-tone-danger-bg: rgba(180, 35, 24, 0.1);
  --esign-tone-neutral: #475467;
  --esign-tone-neutral-bg: rgba(71, 84, 103, 0.12);
  --esign-tone-warning: #b54708;
  --esign-tone-warning-bg: rgba(220, 104, 3, 0.14);
  --esign-tone-in-progress: #1d4ed8;
  --esign-tone-in-progress-bg: rgba(37, 99, 235, 0.12);
}

.document-list,
.leave-page,
.leave-detail,
.widget-host {
  font-family: var(--esign-font-family);
  color: var(--esign-text);
  max-width: 1200px;
  margin: 0 auto;
  padding: 32px 24px;
}

.list-header,
.detail-header,
.widget-toolbar {
  display: flex;
  align-items: flex-end;
  justify-content: space-between;
  gap: 16px;
  margin-bottom: 24px;
}

.list-header h1,
.detail-header h1 {
  margin: 0;
  font-size: 1.75rem;
  color: var(--esign-heading);
}

.list-header p {
  margin: 4px 0 0;
  color: var(--esign-muted);
}

.widget-toolbar h2 {
  margin: 0;
  font-size: 1.25rem;
  color: var(--esign-heading);
}

.filter-tabs {
  display: flex;
  gap: 8px;
}

.filter-tab,
.page-button,
.pagination-controls button {
  border: 1px solid var(--esign-border);
  background: var(--esign-card-bg);
  color: var(--esign-text);
  border-radius: 8px;
  padding: 6px 12px;
  font: inherit;
  cursor: pointer;
}

.filter-tab.is-active,
.page-button.is-active {
  background: var(--esign-accent);
  border-color: var(--esign-accent);
  color: #ffffff;
}

.pagination-controls button:disabled {
  opacity: 0.45;
  cursor: not-allowed;
}

button.primary {
  background: var(--esign-accent);
  color: #ffffff;
  border: none;
  border-radius: 8px;
  padding: 10px 16px;
  font: inherit;
  font-weight: 600;
  cursor: pointer;
}

button.primary:hover {
  background: var(--esign-accent-hover);
}

.list-table {
  width: 100%;
  border-collapse: collapse;
  background: var(--esign-card-bg);
  border: 1px solid var(--esign-border);
  border-radius: var(--esign-radius);
  overflow: hidden;
}

.list-table th {
  text-align: left;
  font-size: 0.8rem;
  font-weight: 600;
  color: var(--esign-muted);
  background: var(--esign-bg);
  padding: 12px 16px;
}

.list-table td {
  padding: 14px 16px;
  border-top: 1px solid var(--esign-border);
  font-size: 0.9rem;
}

.list-row {
  cursor: pointer;
}

.list-row:hover {
  background: var(--esign-bg);
}

.row-title {
  display: block;
  font-weight: 600;
}

.row-sub {
  display: block;
  font-size: 0.75rem;
  color: var(--esign-muted);
}

.list-empty {
  text-align: center;
  color: var(--esign-muted);
  padding: 48px 16px;
}

.status-badge,
.widget-status {
  display: inline-flex;
  align-items: center;
  border-radius: 999px;
  padding: 2px 10px;
  font-size: 0.75rem;
  font-weight: 600;
}

[data-tone='success'] {
  color: var(--esign-tone-success);
  background: var(--esign-tone-success-bg);
}

[data-tone='danger'] {
  color: var(--esign-tone-danger);
  background: var(--esign-tone-danger-bg);
}

[data-tone='neutral'] {
  color: var(--esign-tone-neutral);
  background: var(--esign-tone-neutral-bg);
}

[data-tone='warning'] {
  color: var(--esign-tone-warning);
  background: var(--esign-tone-warning-bg);
}

[data-tone='in-progress'] {
  color: var(--esign-tone-in-progress);
  background: var(--esign-tone-in-progress-bg);
}

.pagination {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-top: 16px;
  font-size: 0.85rem;
  color: var(--esign-muted);
}

.pagination-controls {
  display: flex;
  gap: 6px;
}

.widget-notice,
.page-error {
  border-radius: 8px;
  padding: 10px 14px;
  margin: 0 0 16px;
  font-size: 0.9rem;
}

.widget-container {
  min-height: 720px;
  border: 1px solid var(--esign-border);
  border-radius: var(--esign-radius);
  background: var(--esign-card-bg);
  overflow: hidden;
}

.widget-container iframe {
  width: 100%;
  min-height: 720px;
  border: 0;
}

.modal-backdrop {
  position: fixed;
  inset: 0;
  background: rgba(15, 23, 42, 0.55);
  display: flex;
  align-items: center;
  justify-content: center;
  z-index: 50;
}

.modal {
  position: relative;
  width: min(1100px, 94vw);
  max-height: 92vh;
  overflow: auto;
  background: var(--esign-card-bg);
  border-radius: var(--esign-radius);
}

.modal .widget-host {
  padding: 24px;
}

.modal-close {
  position: absolute;
  top: 12px;
  right: 16px;
  border: none;
  background: transparent;
  font-size: 1.5rem;
  cursor: pointer;
  color: var(--esign-muted);
}

.approval-lines {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(280px, 1fr));
  gap: 16px;
  margin-bottom: 24px;
}

.approval-line {
  background: var(--esign-card-bg);
  border: 1px solid var(--esign-border);
  border-radius: var(--esign-radius);
  padding: 16px;
}

.approval-title {
  margin: 0 0 12px;
  font-size: 0.75rem;
  font-weight: 600;
  color: var(--esign-muted);
}

.approval-line ul {
  display: flex;
  gap: 8px;
  list-style: none;
  margin: 0;
  padding: 0;
}

.approval-line li {
  flex: 1;
  text-align: center;
  border: 1px solid var(--esign-border);
  border-radius: 8px;
  padding: 8px 4px;
}

.approval-role {
  display: block;
  font-size: 0.7rem;
  color: var(--esign-muted);
}

.approval-name {
  display: block;
  font-weight: 600;
  font-size: 0.85rem;
}

.detail-fields {
  display: grid;
  grid-template-columns: 140px 1fr;
  gap: 10px 16px;
  background: var(--esign-card-bg);
  border: 1px solid var(--esign-border);
  border-radius: var(--esign-radius);
  padding: 20px;
  margin: 0 0 24px;
}

.detail-fields dt {
  color: var(--esign-muted);
  font-size: 0.85rem;
}

.detail-fields dd {
  margin: 0;
}

.history ol {
  list-style: none;
  margin: 0;
  padding: 0;
  border-left: 2px solid var(--esign-border);
}

.history-entry {
  display: grid;
  grid-template-columns: 160px 1fr 140px 140px;
  gap: 12px;
  padding: 10px 16px;
  font-size: 0.85rem;
}

.history-action {
  font-weight: 600;
}

.history-entry time {
  color: var(--esign-muted);
  text-align: right;
}

@media (max-width: 768px) {
  .list-header {
    flex-direction: column;
    align-items: flex-start;
  }

  .history-entry {
    grid-template-columns: 1fr;
  }

  .detail-fields {
    grid-template-columns: 1fr;
  }
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document에 <head>가 없습니다"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-esign-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
