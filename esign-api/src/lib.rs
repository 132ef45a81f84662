//! Backend proxy adapter: decoding of the `{success, message, data}`
//! envelope and an HTTP client for the console's REST endpoints.

pub mod client;
pub mod envelope;

pub use client::{ApiClient, Method};
pub use envelope::{
    decode_created_document_id, decode_document_detail, decode_document_list, decode_login,
    decode_rows, decode_templates, decode_token, unwrap_envelope, TemplateSummary, MAX_TOTAL_ROWS,
};

use esign_core::ConsoleError;

/// Errors from talking to the backend proxy.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or expired session; the caller sends the user to login.
    #[error("로그인이 필요합니다")]
    Unauthorized,
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("네트워크 오류: {0}")]
    Network(String),
    #[error("응답을 해석할 수 없습니다: {0}")]
    Decode(String),
    /// The envelope said `success: false`.
    #[error("요청이 거부되었습니다: {0}")]
    Rejected(String),
}

impl ApiError {
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl From<ConsoleError> for ApiError {
    fn from(err: ConsoleError) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
