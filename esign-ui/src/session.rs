//! Browser session: stored bearer token, API client and navigation.

use esign_api::{ApiClient, ApiError};
use esign_core::ConsoleConfig;
use wasm_bindgen::JsValue;
use web_sys::{console, Storage, UrlSearchParams};

use crate::routes;

/// `localStorage` key holding the session bearer token.
const SESSION_KEY: &str = "accessToken";

fn storage() -> Option<Storage> {
    web_sys::window()?.local_storage().ok()?
}

pub fn stored_token() -> Option<String> {
    storage()?
        .get_item(SESSION_KEY)
        .ok()?
        .filter(|token| !token.is_empty())
}

/// Client for the configured backend, carrying the stored session if any.
pub fn api_client(config: &ConsoleConfig) -> ApiClient {
    let mut config = config.clone();
    if let Some(origin) = web_sys::window().and_then(|window| window.location().origin().ok()) {
        config.api_base = routes::absolute_api_base(&origin, &config.api_base);
    }
    let client = ApiClient::new(config);
    match stored_token() {
        Some(token) => client.with_bearer(token),
        None => client,
    }
}

pub fn navigate(href: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(err) = window.location().set_href(href) {
            console::error_1(&err);
        }
    }
}

pub fn redirect_to_login(config: &ConsoleConfig) {
    if let Some(storage) = storage() {
        if let Err(err) = storage.remove_item(SESSION_KEY) {
            console::error_1(&err);
        }
    }
    navigate(&config.login_path);
}

pub fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(err) = window.alert_with_message(message) {
            console::error_1(&err);
        }
    }
}

pub fn query_param(key: &str) -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    UrlSearchParams::new_with_str(&search).ok()?.get(key)
}

/// Logs a failed call; a rejected session leaves for the login page.
pub fn report_api_error(context: &str, err: &ApiError, config: &ConsoleConfig) {
    console::error_1(&JsValue::from_str(&format!("{context}: {err}")));
    if err.requires_login() {
        redirect_to_login(config);
    }
}
