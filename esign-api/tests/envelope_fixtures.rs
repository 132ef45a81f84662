use std::fs;

use esign_api::{decode_document_detail, decode_document_list, decode_token};
use esign_core::{
    ApplyOutcome, DocumentFilter, DocumentListState, DocumentStatus, LeaveRequest,
    APPLICANT_APPROVAL_LINE, RECEPTION_APPROVAL_LINE,
};
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn load(name: &str) -> Value {
    let raw = fs::read_to_string(fixture_path(name)).expect("fixture 읽기 실패");
    serde_json::from_str(&raw).expect("fixture JSON 오류")
}

#[test]
fn nested_document_list_decodes() {
    let page = decode_document_list(&load("document_list.json")).expect("목록 해석 실패");
    let mut state = DocumentListState::new(DocumentFilter::All, 20);
    let query = state.refresh();

    assert_eq!(page.total_count, 45);
    assert_eq!(page.documents.len(), 4);

    let first = &page.documents[0];
    assert_eq!(first.status().map(DocumentStatus::code), Some("003"));
    assert_eq!(first.handler_names(), "이영희, 박철수");
    assert_eq!(first.history_count(), 2);
    // 2024-01-01 -> 2024-01-11
    assert_eq!(first.elapsed_days(1_704_931_200_000), 10);

    let second = &page.documents[1];
    assert_eq!(second.current_status.step_name, "완료");
    assert_eq!(second.status(), None);
    assert_eq!(second.handler_names(), "-");

    let nulls = &page.documents[3];
    assert_eq!(nulls.id, "doc-004");
    assert_eq!(nulls.document_name, "");
    assert_eq!(nulls.created_date, 0);
    assert_eq!(nulls.status().map(DocumentStatus::code), Some("060"));
    assert_eq!(nulls.handler_names(), "-");
    assert_eq!(nulls.history_count(), 0);

    assert_eq!(state.apply(&query, page), ApplyOutcome::Applied);
    assert_eq!(state.window().total_pages(), 3);
    assert_eq!(state.window().showing_range(), Some((1, 20)));
}

#[test]
fn leave_detail_decodes_fields_and_history() {
    let document = decode_document_detail(&load("document_detail.json")).expect("상세 해석 실패");
    assert_eq!(document.id, "doc-001");
    assert_eq!(document.status(), Some(DocumentStatus::Completed));

    let leave = LeaveRequest::new(document.field_map());
    assert_eq!(leave.applicant(), "김민수");
    assert_eq!(leave.kind(), "연차");
    assert_eq!(leave.period(), "2024-01-15 09:00 ~ 2024-01-16 18:00");
    assert_eq!(leave.days(), Some("2"));
    assert_eq!(leave.reason(), "가족 여행");

    let applicant = leave.approval_line(&APPLICANT_APPROVAL_LINE);
    assert_eq!(applicant[0], ("팀장", "이영희"));
    assert_eq!(applicant[1], ("부서장", "X"));
    assert_eq!(applicant.len(), 5);

    let reception = leave.approval_line(&RECEPTION_APPROVAL_LINE);
    assert_eq!(reception, vec![("담당", "정하늘"), ("이사", "X")]);

    let labels: Vec<String> = document
        .histories
        .iter()
        .filter_map(|entry| entry.action_label())
        .collect();
    assert_eq!(labels, vec!["문서 임시 저장", "문서 취소 요청", "완료"]);
}

#[test]
fn token_bundle_decodes() {
    let token = decode_token(&load("token.json")).expect("토큰 해석 실패");
    assert_eq!(token.company_id, "c0ffee00c0ffee00c0ffee00c0ffee00");
    assert_eq!(token.user_id, "kim@example.com");
    assert_eq!(token.access_token, "access-xyz");
    assert_eq!(token.refresh_token, "refresh-abc");
    assert!(token.has_user_key());

    let debug = format!("{token:?}");
    assert!(!debug.contains("access-xyz"));
}
