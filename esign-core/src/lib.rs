//! Core logic for the e-signature admin console: document model, status
//! taxonomy, paging view-model and the embedded widget lifecycle.

use serde::{Deserialize, Serialize};

pub mod document;
pub mod fields;
pub mod paging;
pub mod status;
pub mod wait;
pub mod widget;

pub use document::{
    elapsed_days, AuthToken, CurrentStatus, Document, FieldEntry, HistoryEntry, Recipient,
    TemplateRef,
};
pub use fields::{FieldMap, LeaveRequest, APPLICANT_APPROVAL_LINE, RECEPTION_APPROVAL_LINE};
pub use paging::{ApplyOutcome, DocumentFilter, DocumentListState, ListPage, ListQuery, PageWindow};
pub use status::{DocumentStatus, StatusTone};
pub use wait::{wait_until, CancelToken, WaitOutcome, WaitPolicy};
pub use widget::{
    ConstructPlan, LayoutOptions, VendorResponse, VendorSdk, WidgetEffect, WidgetFailure,
    WidgetLifecycle, WidgetMode, WidgetOptions, WidgetOutcome, WidgetPhase,
};

/// Tunable constants shared by the UI, the JS bridge and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Prefix of every backend route (`/eformsign/*`, `/auth/*`, `/members/*`).
    pub api_base: String,
    /// Interval between checks for the global scripting dependency.
    pub dependency_poll_interval_ms: u32,
    /// Give up waiting for the dependency after this long.
    pub dependency_timeout_ms: u32,
    /// Delay between constructing the vendor widget and opening it.
    pub open_delay_ms: u32,
    /// Fixed page size of document lists.
    pub page_limit: u32,
    /// Form template used by the leave-request pages.
    pub leave_template_id: String,
    pub company_country_code: String,
    pub lang_code: String,
    /// Where authorization failures send the user.
    pub login_path: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: "/api/v1".to_string(),
            dependency_poll_interval_ms: 200,
            dependency_timeout_ms: 10_000,
            open_delay_ms: 500,
            page_limit: 20,
            leave_template_id: String::new(),
            company_country_code: "kr".to_string(),
            lang_code: "ko".to_string(),
            login_path: "/login".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Joins `path` onto the configured API base without doubling slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Errors raised by the console core.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConsoleError {
    #[error("응답에 필요한 데이터가 없습니다")]
    MissingData,
    #[error("데이터를 읽을 수 없습니다: {0}")]
    Parse(String),
    #[error("페이지 {page}은(는) 범위를 벗어났습니다 (전체 {total_pages}페이지)")]
    InvalidPage { page: u32, total_pages: u32 },
    #[error("잘못된 접근입니다: {0}")]
    InvalidTarget(String),
    #[error("기타 오류: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ConsoleConfig {
            api_base: "https://console.example/api/v1/".to_string(),
            ..ConsoleConfig::default()
        };
        assert_eq!(
            config.endpoint("/eformsign/token"),
            "https://console.example/api/v1/eformsign/token"
        );
    }

    #[test]
    fn defaults_match_widget_timings() {
        let config = ConsoleConfig::default();
        assert_eq!(config.dependency_poll_interval_ms, 200);
        assert_eq!(config.dependency_timeout_ms, 10_000);
        assert_eq!(config.open_delay_ms, 500);
        assert_eq!(config.page_limit, 20);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ConsoleConfig =
            serde_json::from_str(r#"{"leave_template_id": "tpl-leave", "page_limit": 10}"#)
                .expect("config");
        assert_eq!(config.leave_template_id, "tpl-leave");
        assert_eq!(config.page_limit, 10);
        assert_eq!(config.login_path, "/login");
    }
}
