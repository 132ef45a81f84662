//! HTTP client for the backend proxy.
//!
//! Works natively and on `wasm32` (reqwest uses `fetch` there). URLs must be
//! absolute, so browser hosts resolve `api_base` against the page origin.

use esign_core::{AuthToken, ConsoleConfig, Document, ListPage, ListQuery};
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::envelope::{
    decode_created_document_id, decode_document_detail, decode_document_list, decode_login,
    decode_rows, decode_templates, decode_token, unwrap_envelope, TemplateSummary,
};
use crate::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Maps a response to its JSON body or to the error taxonomy: 401/403 end the
/// session, other failures carry the backend's `message` when it sent one.
fn classify(status: StatusCode, text: &str) -> Result<Value, ApiError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        return Err(ApiError::Http {
            status: status.as_u16(),
            message,
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Thin wrapper around the console's REST routes.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: ConsoleConfig,
    bearer: Option<String>,
}

impl ApiClient {
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            http: Client::new(),
            config,
            bearer: None,
        }
    }

    /// Session token attached as `Authorization: Bearer` on every call.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.config.endpoint(path);
        tracing::debug!(%url, ?method, "calling backend");

        let mut builder = self.http.request(method.into(), &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = &self.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        match classify(status, &text) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(%url, status = status.as_u16(), error = %err, "backend call failed");
                Err(err)
            }
        }
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        self.request(Method::Get, path, query, None).await
    }

    /// `POST /auth/login`, returns the session bearer token.
    pub async fn login(&self, login_id: &str, password: &str) -> Result<String, ApiError> {
        let body = json!({ "loginId": login_id, "password": password });
        let response = self
            .request(Method::Post, "/auth/login", &[], Some(&body))
            .await?;
        decode_login(&response)
    }

    /// `GET /members/me`.
    pub async fn me(&self) -> Result<Value, ApiError> {
        let response = self.get("/members/me", &[]).await?;
        unwrap_envelope(&response).cloned()
    }

    /// `GET /eformsign/token`.
    pub async fn widget_token(&self) -> Result<AuthToken, ApiError> {
        let response = self.get("/eformsign/token", &[]).await?;
        decode_token(&response)
    }

    /// `GET /eformsign/documents` for one page of the list view-model.
    pub async fn documents(&self, query: &ListQuery) -> Result<ListPage, ApiError> {
        let response = self.get("/eformsign/documents", &query.query_pairs()).await?;
        decode_document_list(&response)
    }

    /// `GET /eformsign/documents/{id}`.
    pub async fn document(&self, document_id: &str) -> Result<Document, ApiError> {
        let response = self
            .get(&format!("/eformsign/documents/{document_id}"), &[])
            .await?;
        decode_document_detail(&response)
    }

    /// Replaces each summary with its detail, keeping the summary when the
    /// detail call fails.
    pub async fn with_details(&self, documents: Vec<Document>) -> Vec<Document> {
        let details = join_all(documents.iter().map(|summary| self.document(&summary.id))).await;
        documents
            .into_iter()
            .zip(details)
            .map(|(summary, detail)| match detail {
                Ok(detail) => detail,
                Err(err) => {
                    tracing::warn!(document = %summary.id, error = %err, "detail fetch failed");
                    summary
                }
            })
            .collect()
    }

    /// `POST /eformsign/documents`, returns the new document id.
    pub async fn create_document(&self, template_id: &str) -> Result<String, ApiError> {
        let body = json!({ "templateId": template_id });
        let response = self
            .request(Method::Post, "/eformsign/documents", &[], Some(&body))
            .await?;
        decode_created_document_id(&response)
    }

    pub async fn templates(&self) -> Result<Vec<TemplateSummary>, ApiError> {
        let response = self.get("/eformsign/templates", &[]).await?;
        decode_templates(&response)
    }

    pub async fn duplicate_template(&self, template_id: &str) -> Result<Value, ApiError> {
        let path = format!("/eformsign/templates/{template_id}/duplicate");
        let response = self.request(Method::Post, &path, &[], None).await?;
        unwrap_envelope(&response).cloned()
    }

    pub async fn delete_template(&self, template_id: &str) -> Result<(), ApiError> {
        let path = format!("/eformsign/templates/{template_id}");
        self.request(Method::Delete, &path, &[], None).await?;
        Ok(())
    }

    pub async fn members(&self) -> Result<Vec<Value>, ApiError> {
        let response = self.get("/eformsign/company/members", &[]).await?;
        decode_rows(&response, &["members"])
    }

    pub async fn create_member(&self, member: &Value) -> Result<Value, ApiError> {
        self.mutate(Method::Post, "/eformsign/company/members", Some(member))
            .await
    }

    pub async fn update_member(&self, member_id: &str, member: &Value) -> Result<Value, ApiError> {
        let path = format!("/eformsign/company/members/{member_id}");
        self.mutate(Method::Patch, &path, Some(member)).await
    }

    pub async fn delete_member(&self, member_id: &str) -> Result<(), ApiError> {
        let path = format!("/eformsign/company/members/{member_id}");
        self.mutate(Method::Delete, &path, None).await?;
        Ok(())
    }

    pub async fn groups(&self) -> Result<Vec<Value>, ApiError> {
        let response = self.get("/eformsign/company/groups", &[]).await?;
        decode_rows(&response, &["groups"])
    }

    pub async fn create_group(&self, group: &Value) -> Result<Value, ApiError> {
        self.mutate(Method::Post, "/eformsign/company/groups", Some(group))
            .await
    }

    pub async fn update_group(&self, group_id: &str, group: &Value) -> Result<Value, ApiError> {
        let path = format!("/eformsign/company/groups/{group_id}");
        self.mutate(Method::Patch, &path, Some(group)).await
    }

    pub async fn delete_group(&self, group_id: &str) -> Result<(), ApiError> {
        let path = format!("/eformsign/company/groups/{group_id}");
        self.mutate(Method::Delete, &path, None).await?;
        Ok(())
    }

    async fn mutate(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let response = self.request(method, path, &[], body).await?;
        if response.is_null() {
            return Ok(Value::Null);
        }
        unwrap_envelope(&response).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_session_requires_login() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = classify(status, r#"{"message":"expired"}"#).expect_err("rejected");
            assert!(err.requires_login());
        }
    }

    #[test]
    fn failure_message_comes_from_body() {
        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"message":"템플릿이 없습니다"}"#,
        )
        .expect_err("bad request");
        assert!(matches!(
            err,
            ApiError::Http { status: 400, ref message } if message == "템플릿이 없습니다"
        ));
        assert!(!err.requires_login());
    }

    #[test]
    fn failure_without_json_uses_reason() {
        let err = classify(StatusCode::BAD_GATEWAY, "<html>upstream</html>").expect_err("502");
        assert!(matches!(
            err,
            ApiError::Http { status: 502, ref message } if message == "Bad Gateway"
        ));
    }

    #[test]
    fn empty_success_body_is_null() {
        assert_eq!(classify(StatusCode::NO_CONTENT, "").expect("204"), Value::Null);
        assert_eq!(classify(StatusCode::OK, "  \n").expect("blank"), Value::Null);
    }

    #[test]
    fn success_body_is_parsed() {
        let value = classify(StatusCode::OK, r#"{"success":true,"data":[1]}"#).expect("json");
        assert_eq!(value["data"][0], 1);

        let err = classify(StatusCode::OK, "not json").expect_err("decode");
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
