//! `wasm_bindgen` entry points that render a page into a host element.

use esign_core::{ConsoleConfig, DocumentFilter};
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;
use web_sys::{console, Document, Element, Window};
use yew::html::BaseComponent;

use crate::document_list::{DocumentList, DocumentListProps};
use crate::pages::{
    ConfigProps, DocumentPage, LeaveDetail, LeaveDetailProps, LeavePage, TemplateEditorPage,
};
use crate::{session, styles};

fn mount_target(selector: &str) -> Result<Element, JsValue> {
    let window: Window =
        web_sys::window().ok_or_else(|| JsValue::from_str("window 객체가 없습니다"))?;
    let document: Document = window
        .document()
        .ok_or_else(|| JsValue::from_str("document에 접근할 수 없습니다"))?;

    if let Err(err) = styles::ensure_styles(&document) {
        console::error_1(&err);
    }

    document
        .query_selector(selector)
        .map_err(|err| JsValue::from_str(&format!("잘못된 selector: {err:?}")))?
        .ok_or_else(|| JsValue::from_str("selector에 해당하는 요소가 없습니다"))
}

/// Partial JS config; missing keys keep their defaults.
fn read_config(config: JsValue) -> Result<ConsoleConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(ConsoleConfig::default());
    }
    from_value(config).map_err(|err| JsValue::from_str(&format!("설정을 읽을 수 없습니다: {err}")))
}

fn render<C>(selector: &str, props: C::Properties) -> Result<(), JsValue>
where
    C: BaseComponent,
{
    console_error_panic_hook::set_once();

    let target = mount_target(selector)?;
    yew::Renderer::<C>::with_root_and_props(target, props).render();
    Ok(())
}

/// Document list; `filter` is one of `todo`, `inprogress`, `completed`, `all`.
#[wasm_bindgen]
pub fn mount_document_list(
    selector: &str,
    filter: Option<String>,
    config: JsValue,
) -> Result<(), JsValue> {
    let props = DocumentListProps {
        filter: DocumentFilter::from_param(filter.as_deref()),
        config: read_config(config)?,
    };
    render::<DocumentList>(selector, props)
}

/// Document widget page driven by the URL's `template_id`, `document_id` and `mode`.
#[wasm_bindgen]
pub fn mount_document_page(selector: &str, config: JsValue) -> Result<(), JsValue> {
    let config = read_config(config)?;
    render::<DocumentPage>(selector, ConfigProps { config })
}

/// Template editor driven by the URL's `template_id` and `mode`.
#[wasm_bindgen]
pub fn mount_template_editor(selector: &str, config: JsValue) -> Result<(), JsValue> {
    let config = read_config(config)?;
    render::<TemplateEditorPage>(selector, ConfigProps { config })
}

#[wasm_bindgen]
pub fn mount_leave_page(selector: &str, config: JsValue) -> Result<(), JsValue> {
    let config = read_config(config)?;
    render::<LeavePage>(selector, ConfigProps { config })
}

/// Leave request detail for the URL's `id`.
#[wasm_bindgen]
pub fn mount_leave_detail(selector: &str, config: JsValue) -> Result<(), JsValue> {
    let config = read_config(config)?;
    let document_id = session::query_param("id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| JsValue::from_str("문서 ID가 필요합니다"))?;
    render::<LeaveDetail>(
        selector,
        LeaveDetailProps {
            config,
            document_id: document_id.into(),
        },
    )
}
