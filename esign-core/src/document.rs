//! Document model as returned by the backend proxy.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::FieldMap;
use crate::status::DocumentStatus;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Participant of a workflow step (creator, executor, recipient).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Recipient {
    #[serde(default)]
    pub recipient_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Where the document currently sits in its workflow.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CurrentStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_type: String,
    #[serde(default)]
    pub status_doc_type: Option<String>,
    #[serde(default)]
    pub step_type: Option<String>,
    #[serde(default)]
    pub step_index: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub step_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub step_recipients: Vec<Recipient>,
}

impl CurrentStatus {
    /// Detailed status for the numeric code, `None` outside the taxonomy.
    pub fn status(&self) -> Option<DocumentStatus> {
        DocumentStatus::from_code(&self.status_type)
    }
}

/// Some detail responses carry the status as a bare step name.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Detailed(CurrentStatus),
    Label(String),
}

fn status_or_label<'de, D>(deserializer: D) -> Result<CurrentStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawStatus>::deserialize(deserializer)? {
        Some(RawStatus::Detailed(status)) => status,
        Some(RawStatus::Label(step_name)) => CurrentStatus {
            step_name,
            ..CurrentStatus::default()
        },
        None => CurrentStatus::default(),
    })
}

/// One executed workflow action.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HistoryEntry {
    #[serde(default)]
    pub step_type: Option<String>,
    #[serde(default)]
    pub step_name: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub executor: Option<Recipient>,
    #[serde(default)]
    pub executed_date: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl HistoryEntry {
    /// Label of the action, raw code when outside the taxonomy.
    pub fn action_label(&self) -> Option<String> {
        self.action_type
            .as_deref()
            .map(|code| DocumentStatus::action_label(code).into_owned())
    }

    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_date.and_then(DateTime::from_timestamp_millis)
    }
}

/// Raw `{id, value}` pair filled in by the form template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldEntry {
    pub id: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl FieldEntry {
    /// Value rendered as text; null and empty strings count as missing.
    pub fn text(&self) -> Option<String> {
        let text = match &self.value {
            serde_json::Value::Null => return None,
            serde_json::Value::String(value) => value.clone(),
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TemplateRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// An instance of a template with its workflow state.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Document {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub document_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub document_name: String,
    #[serde(default)]
    pub template: Option<TemplateRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub creator: Recipient,
    /// Milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_date: i64,
    #[serde(default)]
    pub last_editor: Option<Recipient>,
    #[serde(default)]
    pub updated_date: Option<i64>,
    #[serde(default, deserialize_with = "status_or_label")]
    pub current_status: CurrentStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<FieldEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub histories: Vec<HistoryEntry>,
}

impl Document {
    pub fn status(&self) -> Option<DocumentStatus> {
        self.current_status.status()
    }

    /// Names of whoever must act on the current step, `-` when nobody.
    pub fn handler_names(&self) -> String {
        let names: Vec<&str> = self
            .current_status
            .step_recipients
            .iter()
            .map(|recipient| recipient.name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        }
    }

    pub fn history_count(&self) -> usize {
        self.histories.len()
    }

    pub fn elapsed_days(&self, now_ms: i64) -> u64 {
        elapsed_days(self.created_date, now_ms)
    }

    /// Builds the typed field lookup once per document.
    pub fn field_map(&self) -> FieldMap {
        FieldMap::from_entries(&self.fields)
    }
}

/// Whole days between `created_ms` and `now_ms`, never negative.
pub fn elapsed_days(created_ms: i64, now_ms: i64) -> u64 {
    let diff = now_ms.saturating_sub(created_ms);
    if diff <= 0 {
        return 0;
    }
    (diff / MILLIS_PER_DAY) as u64
}

/// Short-lived credentials handed to the vendor widget.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub company_id: String,
    /// Missing keys still allow construction but the host warns about it.
    pub user_key: Option<String>,
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthToken {
    pub fn has_user_key(&self) -> bool {
        self.user_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("company_id", &self.company_id)
            .field("user_key", &self.user_key.as_ref().map(|_| "***"))
            .field("user_id", &self.user_id)
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = MILLIS_PER_DAY;

    #[test]
    fn elapsed_days_floors_partial_days() {
        assert_eq!(elapsed_days(0, DAY * 3 - 1), 2);
        assert_eq!(elapsed_days(0, DAY * 3), 3);
    }

    #[test]
    fn future_created_date_is_zero_days() {
        assert_eq!(elapsed_days(DAY * 10, DAY), 0);
        assert_eq!(elapsed_days(i64::MAX, i64::MIN), 0);
    }

    #[test]
    fn status_may_be_plain_label() {
        let doc: Document = serde_json::from_str(
            r#"{"id":"d1","current_status":"결재 대기","fields":[]}"#,
        )
        .expect("document");
        assert_eq!(doc.current_status.step_name, "결재 대기");
        assert!(doc.status().is_none());
    }

    #[test]
    fn null_fields_read_as_missing() {
        let doc: Document = serde_json::from_str(
            r#"{
                "id": "d3",
                "document_name": null,
                "document_number": null,
                "creator": {"id": null, "name": null},
                "created_date": null,
                "current_status": {"status_type": null, "step_name": null, "step_recipients": null},
                "fields": null,
                "histories": null
            }"#,
        )
        .expect("document");
        assert_eq!(doc.document_name, "");
        assert_eq!(doc.created_date, 0);
        assert_eq!(doc.current_status, CurrentStatus::default());
        assert_eq!(doc.handler_names(), "-");
        assert!(doc.histories.is_empty());
    }

    #[test]
    fn handler_names_join_recipients() {
        let doc: Document = serde_json::from_str(
            r#"{
                "id": "d2",
                "current_status": {
                    "status_type": "060",
                    "step_name": "결재",
                    "step_recipients": [{"id": "a", "name": "김철수"}, {"id": "b", "name": "이영희"}]
                }
            }"#,
        )
        .expect("document");
        assert_eq!(doc.handler_names(), "김철수, 이영희");
        assert_eq!(Document::default().handler_names(), "-");
    }

    #[test]
    fn field_text_treats_empty_as_missing() {
        let empty = FieldEntry {
            id: "일간".into(),
            value: serde_json::json!(""),
            kind: None,
        };
        let number = FieldEntry {
            id: "일간".into(),
            value: serde_json::json!(2),
            kind: None,
        };
        assert_eq!(empty.text(), None);
        assert_eq!(number.text().as_deref(), Some("2"));
    }

    #[test]
    fn debug_hides_credentials() {
        let token = AuthToken {
            company_id: "c".into(),
            user_key: Some("secret-key".into()),
            user_id: "u".into(),
            access_token: "secret-access".into(),
            refresh_token: "secret-refresh".into(),
        };
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("secret"));
    }
}
