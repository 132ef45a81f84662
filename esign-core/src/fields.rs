//! Typed lookup over the `{id, value}` bag filled in by form templates.

use std::collections::HashMap;

use crate::document::FieldEntry;

/// Placeholder rendered for missing values in lists and detail cards.
pub const MISSING_VALUE: &str = "-";
/// Placeholder for an empty approval-line slot.
pub const MISSING_APPROVER: &str = "X";

/// Approval line of the applicant's department, in signing order.
pub const APPLICANT_APPROVAL_LINE: [&str; 5] = [
    "신청부서 팀장",
    "신청부서 부서장",
    "신청부서 임원",
    "신청부서 대표이사",
    "신청부서 회장",
];

/// Approval line of the receiving department.
pub const RECEPTION_APPROVAL_LINE: [&str; 2] = ["접수부서 담당", "접수부서 이사"];

/// Field values keyed by field id. A missing key is a normal state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    values: HashMap<String, String>,
}

impl FieldMap {
    /// First non-empty occurrence of a key wins.
    pub fn from_entries(entries: &[FieldEntry]) -> Self {
        let mut values = HashMap::new();
        for entry in entries {
            if let Some(text) = entry.text() {
                values.entry(entry.id.clone()).or_insert(text);
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// First key in `keys` that has a value.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn display(&self, key: &str) -> &str {
        self.get(key).unwrap_or(MISSING_VALUE)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Keys of the leave-request form template.
pub mod leave_keys {
    pub const APPLICANT: &str = "신청자명";
    pub const APPLIED_ON: &str = "신청일";
    pub const KIND: &str = "휴가 구분";
    pub const START_DATE: &str = "휴가 시작일";
    pub const START_TIME: &str = "휴가 시작시각";
    pub const END_DATE: &str = "휴가 종료일";
    pub const END_TIME: &str = "휴가 종료시각";
    /// Older template revisions used this name for the end time.
    pub const END_TIME_LEGACY: &str = "휴가 종료시간";
    pub const DAYS: &str = "일간";
    pub const REASON: &str = "휴가 사유";
}

/// Leave request view over a document's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveRequest {
    fields: FieldMap,
}

impl LeaveRequest {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    pub fn applicant(&self) -> &str {
        self.fields.display(leave_keys::APPLICANT)
    }

    pub fn applied_on(&self) -> &str {
        self.fields.display(leave_keys::APPLIED_ON)
    }

    pub fn kind(&self) -> &str {
        self.fields.display(leave_keys::KIND)
    }

    pub fn reason(&self) -> &str {
        self.fields.display(leave_keys::REASON)
    }

    pub fn end_time(&self) -> Option<&str> {
        self.fields
            .first_of(&[leave_keys::END_TIME, leave_keys::END_TIME_LEGACY])
    }

    /// `start_date start_time ~ end_date end_time` with dashes for gaps.
    pub fn period(&self) -> String {
        format!(
            "{} {} ~ {} {}",
            self.fields.display(leave_keys::START_DATE),
            self.fields.display(leave_keys::START_TIME),
            self.fields.display(leave_keys::END_DATE),
            self.end_time().unwrap_or(MISSING_VALUE),
        )
    }

    /// Number of days as written on the form, `None` when absent.
    pub fn days(&self) -> Option<&str> {
        self.fields.get(leave_keys::DAYS)
    }

    /// `(role, approver)` pairs with the department prefix stripped.
    pub fn approval_line<'a>(&'a self, keys: &[&'a str]) -> Vec<(&'a str, &'a str)> {
        keys.iter()
            .map(|&key| {
                let role = key
                    .split_once(' ')
                    .map(|(_, role)| role)
                    .unwrap_or(key);
                (role, self.fields.get(key).unwrap_or(MISSING_APPROVER))
            })
            .collect()
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entry(id: &str, value: serde_json::Value) -> FieldEntry {
        FieldEntry {
            id: id.to_string(),
            value,
            kind: None,
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let map = FieldMap::from_entries(&[
            entry("신청자명", json!("홍길동")),
            entry("신청자명", json!("임꺽정")),
        ]);
        assert_eq!(map.get("신청자명"), Some("홍길동"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn missing_keys_render_dash() {
        let leave = LeaveRequest::new(FieldMap::default());
        assert_eq!(leave.applicant(), "-");
        assert_eq!(leave.period(), "- - ~ - -");
        assert_eq!(leave.days(), None);
    }

    #[test]
    fn end_time_falls_back_to_legacy_key() {
        let leave = LeaveRequest::new(FieldMap::from_entries(&[
            entry("휴가 시작일", json!("2024-05-01")),
            entry("휴가 시작시각", json!("09:00")),
            entry("휴가 종료일", json!("2024-05-02")),
            entry("휴가 종료시간", json!("18:00")),
        ]));
        assert_eq!(leave.period(), "2024-05-01 09:00 ~ 2024-05-02 18:00");
    }

    #[test]
    fn approval_line_strips_department() {
        let leave = LeaveRequest::new(FieldMap::from_entries(&[entry(
            "접수부서 담당",
            json!("박담당"),
        )]));
        let line = leave.approval_line(&RECEPTION_APPROVAL_LINE);
        assert_eq!(line, vec![("담당", "박담당"), ("이사", "X")]);
    }
}
