//! Yew components of the e-signature admin console.

pub mod routes;

#[cfg(target_arch = "wasm32")]
mod document_list;
#[cfg(target_arch = "wasm32")]
mod mount;
#[cfg(target_arch = "wasm32")]
mod pages;
#[cfg(target_arch = "wasm32")]
mod session;
#[cfg(target_arch = "wasm32")]
mod styles;
#[cfg(target_arch = "wasm32")]
mod widget_host;

#[cfg(target_arch = "wasm32")]
pub use mount::{
    mount_document_list, mount_document_page, mount_leave_detail, mount_leave_page,
    mount_template_editor,
};

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use wasm_bindgen::JsValue;

    fn wasm_only() -> Result<(), JsValue> {
        Err(JsValue::from_str("esign-ui는 wasm32 타깃에서만 동작합니다"))
    }

    pub fn mount_document_list(_: &str, _: Option<String>, _: JsValue) -> Result<(), JsValue> {
        wasm_only()
    }

    pub fn mount_document_page(_: &str, _: JsValue) -> Result<(), JsValue> {
        wasm_only()
    }

    pub fn mount_template_editor(_: &str, _: JsValue) -> Result<(), JsValue> {
        wasm_only()
    }

    pub fn mount_leave_page(_: &str, _: JsValue) -> Result<(), JsValue> {
        wasm_only()
    }

    pub fn mount_leave_detail(_: &str, _: JsValue) -> Result<(), JsValue> {
        wasm_only()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::{
    mount_document_list, mount_document_page, mount_leave_detail, mount_leave_page,
    mount_template_editor,
};
