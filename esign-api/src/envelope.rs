//! Decoding of backend responses.
//!
//! The proxy wraps provider payloads in `{success, message, data}` but the
//! inner shape varies by endpoint and by provider version, so every decoder
//! here accepts the handful of layouts seen in practice.

use esign_core::{AuthToken, ConsoleError, Document, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ApiError;

/// Returns the `data` payload, or the body itself when there is no envelope.
pub fn unwrap_envelope(body: &Value) -> Result<&Value, ApiError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(ApiError::Rejected(message));
    }
    Ok(match body.get("data") {
        Some(data) if !data.is_null() => data,
        _ => body,
    })
}

/// Some provider responses nest one more `data` level.
fn inner_payload(data: &Value) -> &Value {
    match data.get("data") {
        Some(inner) if inner.is_object() => inner,
        _ => data,
    }
}

/// Totals above this are treated as a corrupt count; every page up to it
/// still gets its own button.
pub const MAX_TOTAL_ROWS: u64 = 100_000;

fn positive_count(value: Option<&Value>) -> Option<u64> {
    let count = match value? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }?;
    (count > 0).then_some(count)
}

/// Rows that still fail to decode are dropped so one bad row does not
/// blank the page.
fn parse_documents(values: &[Value]) -> Vec<Document> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match Document::deserialize(value) {
            Ok(document) => Some(document),
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping undecodable document row");
                None
            }
        })
        .collect()
}

/// Document list plus total rows. The total falls back from `total_rows`
/// to `total_count` to the number of documents returned.
pub fn decode_document_list(body: &Value) -> Result<ListPage, ApiError> {
    let payload = inner_payload(unwrap_envelope(body)?);
    let documents = match payload.get("documents").and_then(Value::as_array) {
        Some(values) => parse_documents(values),
        None => match payload.as_array() {
            Some(values) => parse_documents(values),
            None => Vec::new(),
        },
    };
    let reported = positive_count(payload.get("total_rows"))
        .or_else(|| positive_count(payload.get("total_count")))
        .unwrap_or(documents.len() as u64);
    if reported > MAX_TOTAL_ROWS {
        tracing::warn!(reported, max = MAX_TOTAL_ROWS, "clamping document total");
    }
    let total_count = reported.min(MAX_TOTAL_ROWS);
    Ok(ListPage {
        documents,
        total_count,
    })
}

pub fn decode_document_detail(body: &Value) -> Result<Document, ApiError> {
    let data = unwrap_envelope(body)?;
    let payload = match data.get("data") {
        Some(inner) if inner.is_object() => inner,
        _ => match data.get("document") {
            Some(document) if document.is_object() => document,
            _ => data,
        },
    };
    if payload.get("id").is_none() {
        return Err(ConsoleError::MissingData.into());
    }
    serde_json::from_value(payload.clone())
        .map_err(|err| ApiError::from(ConsoleError::Parse(err.to_string())))
}

#[derive(Deserialize)]
struct TokenBundle {
    api_key: ApiKeyInfo,
    oauth_token: OauthToken,
}

#[derive(Deserialize)]
struct ApiKeyInfo {
    company: CompanyKey,
}

#[derive(Deserialize)]
struct CompanyKey {
    #[serde(default)]
    company_id: String,
    #[serde(default)]
    user_key: Option<String>,
}

#[derive(Deserialize)]
struct OauthToken {
    #[serde(default)]
    id: Option<String>,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Token bundle of `GET /eformsign/token`.
pub fn decode_token(body: &Value) -> Result<AuthToken, ApiError> {
    let data = unwrap_envelope(body)?;
    let bundle: TokenBundle = serde_json::from_value(data.clone())
        .map_err(|err| ConsoleError::Parse(err.to_string()))?;
    Ok(AuthToken {
        company_id: bundle.api_key.company.company_id,
        user_key: bundle.api_key.company.user_key,
        user_id: bundle
            .oauth_token
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| "user".to_string()),
        access_token: bundle.oauth_token.access_token,
        refresh_token: bundle.oauth_token.refresh_token.unwrap_or_default(),
    })
}

/// Session bearer token of `POST /auth/login`.
pub fn decode_login(body: &Value) -> Result<String, ApiError> {
    unwrap_envelope(body)?
        .get("accessToken")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConsoleError::MissingData.into())
}

/// Id of a document created from a template.
pub fn decode_created_document_id(body: &Value) -> Result<String, ApiError> {
    unwrap_envelope(body)?
        .get("document")
        .and_then(|document| document.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConsoleError::MissingData.into())
}

/// Form template as listed by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateSummary {
    pub form_id: String,
    #[serde(default, alias = "form_name")]
    pub name: String,
    #[serde(default)]
    pub version: Option<u32>,
}

pub fn decode_templates(body: &Value) -> Result<Vec<TemplateSummary>, ApiError> {
    decode_rows(body, &["templates", "forms"])?
        .into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|err| ApiError::from(ConsoleError::Parse(err.to_string())))
        })
        .collect()
}

/// Rows of an admin listing under the first matching key, or the payload
/// itself when it is already an array.
pub fn decode_rows(body: &Value, keys: &[&str]) -> Result<Vec<Value>, ApiError> {
    let data = unwrap_envelope(body)?;
    let rows = keys
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_array))
        .or_else(|| data.as_array());
    Ok(rows.cloned().unwrap_or_default())
}
