//! WASM <-> JavaScript bridge for hosts that render the console without Yew.

use esign_core::status::{status_label, status_tone, summary_label, summary_tone};
use esign_core::{
    AuthToken, ConsoleConfig, ConsoleError, LayoutOptions, PageWindow, VendorResponse,
    WidgetMode, WidgetOptions, WidgetOutcome,
};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
struct JsConsoleConfig {
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    dependency_poll_interval_ms: Option<u32>,
    #[serde(default)]
    dependency_timeout_ms: Option<u32>,
    #[serde(default)]
    open_delay_ms: Option<u32>,
    #[serde(default)]
    page_limit: Option<u32>,
    #[serde(default)]
    leave_template_id: Option<String>,
    #[serde(default)]
    company_country_code: Option<String>,
    #[serde(default)]
    lang_code: Option<String>,
    #[serde(default)]
    login_path: Option<String>,
}

impl From<JsConsoleConfig> for ConsoleConfig {
    fn from(cfg: JsConsoleConfig) -> Self {
        let mut base = ConsoleConfig::default();
        if let Some(api_base) = cfg.api_base {
            base.api_base = api_base;
        }
        if let Some(interval) = cfg.dependency_poll_interval_ms {
            base.dependency_poll_interval_ms = interval;
        }
        if let Some(timeout) = cfg.dependency_timeout_ms {
            base.dependency_timeout_ms = timeout;
        }
        if let Some(delay) = cfg.open_delay_ms {
            base.open_delay_ms = delay;
        }
        if let Some(limit) = cfg.page_limit {
            base.page_limit = limit;
        }
        if let Some(template_id) = cfg.leave_template_id {
            base.leave_template_id = template_id;
        }
        if let Some(country) = cfg.company_country_code {
            base.company_country_code = country;
        }
        if let Some(lang) = cfg.lang_code {
            base.lang_code = lang;
        }
        if let Some(path) = cfg.login_path {
            base.login_path = path;
        }
        base
    }
}

fn read_config(config: Option<JsValue>) -> Result<ConsoleConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsConsoleConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("설정을 읽을 수 없습니다: {err}")))?;
            Ok(ConsoleConfig::from(cfg))
        }
        _ => Ok(ConsoleConfig::default()),
    }
}

fn format_console_error(err: ConsoleError) -> String {
    format!("Console error: {err}")
}

#[derive(Serialize)]
struct StatusBadge {
    label: &'static str,
    tone: &'static str,
}

/// Detailed badge for a status code (`{label, tone}`).
#[wasm_bindgen]
pub fn status_badge(code: &str) -> Result<JsValue, JsValue> {
    to_value(&StatusBadge {
        label: status_label(code),
        tone: status_tone(code).level(),
    })
    .map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Coarse badge used by generic document lists.
#[wasm_bindgen]
pub fn summary_badge(code: &str) -> Result<JsValue, JsValue> {
    to_value(&StatusBadge {
        label: summary_label(code),
        tone: summary_tone(code).level(),
    })
    .map_err(|err| JsValue::from_str(&err.to_string()))
}

#[derive(Debug, Serialize, PartialEq)]
struct PageSummary {
    page: u32,
    total_pages: u32,
    has_previous: bool,
    has_next: bool,
    buttons: Vec<u32>,
    showing: Option<(u64, u64)>,
}

fn page_summary(page: u32, limit: u32, total_count: u64) -> Result<PageSummary, ConsoleError> {
    let mut window = PageWindow::with_total(limit, total_count);
    window.go_to(page)?;
    Ok(PageSummary {
        page: window.page(),
        total_pages: window.total_pages(),
        has_previous: window.has_previous(),
        has_next: window.has_next(),
        buttons: window.buttons().into_iter().map(|button| button.number).collect(),
        showing: window.showing_range(),
    })
}

/// Pagination controls for a result set.
#[wasm_bindgen]
pub fn paginate(page: u32, limit: u32, total_count: f64) -> Result<JsValue, JsValue> {
    let total = if total_count.is_finite() && total_count > 0.0 {
        total_count as u64
    } else {
        0
    };
    let summary = page_summary(page, limit, total)
        .map_err(|err| JsValue::from_str(&format_console_error(err)))?;
    to_value(&summary).map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Whole days since `created_ms`.
#[wasm_bindgen]
pub fn elapsed_days(created_ms: f64, now_ms: f64) -> u32 {
    esign_core::elapsed_days(created_ms as i64, now_ms as i64).min(u64::from(u32::MAX)) as u32
}

#[derive(Deserialize)]
struct JsToken {
    company_id: String,
    #[serde(default)]
    user_key: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl From<JsToken> for AuthToken {
    fn from(token: JsToken) -> Self {
        AuthToken {
            company_id: token.company_id,
            user_key: token.user_key,
            user_id: token
                .user_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| "user".to_string()),
            access_token: token.access_token,
            refresh_token: token.refresh_token.unwrap_or_default(),
        }
    }
}

/// Vendor option object for `mode` (`{kind: "new_document", template_id}` etc).
#[wasm_bindgen]
pub fn build_widget_options(
    token: JsValue,
    mode: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let token: JsToken = from_value(token)
        .map_err(|err| JsValue::from_str(&format!("토큰을 읽을 수 없습니다: {err}")))?;
    let mode: WidgetMode = from_value(mode)
        .map_err(|err| JsValue::from_str(&format!("모드를 읽을 수 없습니다: {err}")))?;
    let cfg = read_config(config)?;

    let options = WidgetOptions::build(
        &AuthToken::from(token),
        &mode,
        &cfg,
        LayoutOptions::new(&cfg, true, false),
    );
    to_value(&options).map_err(|err| JsValue::from_str(&format!("옵션 직렬화 실패: {err}")))
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum JsOutcome {
    Completed { document_id: Option<String> },
    Pending { code: Option<String> },
    Cancelled,
    Failed { message: String },
}

fn classify(success: bool, response: &VendorResponse) -> JsOutcome {
    let outcome = if success {
        WidgetOutcome::from_success(response)
    } else {
        WidgetOutcome::from_error(response)
    };
    let message = outcome.user_message();
    match outcome {
        WidgetOutcome::Completed { document_id } => JsOutcome::Completed { document_id },
        WidgetOutcome::Pending { code } => JsOutcome::Pending { code },
        WidgetOutcome::Cancelled => JsOutcome::Cancelled,
        WidgetOutcome::Failed { .. } => JsOutcome::Failed {
            message: message.unwrap_or_default(),
        },
    }
}

/// Classifies a vendor success (`success = true`) or error callback payload.
#[wasm_bindgen]
pub fn classify_callback(success: bool, response: JsValue) -> Result<JsValue, JsValue> {
    let response: VendorResponse = from_value(response)
        .map_err(|err| JsValue::from_str(&format!("콜백을 읽을 수 없습니다: {err}")))?;
    to_value(&classify(success, &response)).map_err(|err| JsValue::from_str(&err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = ConsoleConfig::from(JsConsoleConfig {
            page_limit: Some(10),
            ..JsConsoleConfig::default()
        });
        assert_eq!(cfg.page_limit, 10);
        assert_eq!(cfg.api_base, ConsoleConfig::default().api_base);
    }

    #[test]
    fn page_summary_for_middle_page() {
        let summary = page_summary(2, 20, 45).expect("summary");
        assert_eq!(summary.total_pages, 3);
        assert_eq!(summary.buttons, vec![1, 2, 3]);
        assert!(summary.has_previous && summary.has_next);
        assert_eq!(summary.showing, Some((21, 40)));
    }

    #[test]
    fn empty_result_has_no_controls() {
        let summary = page_summary(1, 20, 0).expect("summary");
        assert_eq!(summary.total_pages, 0);
        assert!(summary.buttons.is_empty());
        assert!(!summary.has_previous && !summary.has_next);
        assert_eq!(summary.showing, None);
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        assert!(page_summary(4, 20, 45).is_err());
    }

    #[test]
    fn user_cancel_is_silent() {
        let response = VendorResponse {
            code: Some("1201".to_string()),
            ..VendorResponse::default()
        };
        assert_eq!(classify(false, &response), JsOutcome::Cancelled);

        let failed = VendorResponse {
            code: Some("4001".to_string()),
            message: Some("권한 없음".to_string()),
            ..VendorResponse::default()
        };
        assert_eq!(
            classify(false, &failed),
            JsOutcome::Failed {
                message: "오류 발생: 권한 없음 (4001)".to_string()
            }
        );
    }
}
