//! Status code taxonomy and its presentation tones.
//!
//! Two taxonomies exist on the provider side. The detailed one
//! ([`DocumentStatus`]) covers every workflow action and is used for
//! document details and histories. The generic list view only ever sees
//! `001`, `060` and `099`, see [`summary_label`].

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Label shown for codes outside the taxonomy.
pub const UNKNOWN_STATUS_LABEL: &str = "알 수 없는 상태";

/// Coarse color bucket for a status badge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Success,
    Danger,
    Neutral,
    Warning,
    /// Default bucket: in-progress and unmapped codes.
    InProgress,
}

impl StatusTone {
    pub const ALL: [StatusTone; 5] = [
        StatusTone::Success,
        StatusTone::Danger,
        StatusTone::Neutral,
        StatusTone::Warning,
        StatusTone::InProgress,
    ];

    /// Value of the `data-tone` attribute styled by the UI.
    pub fn level(self) -> &'static str {
        match self {
            StatusTone::Success => "success",
            StatusTone::Danger => "danger",
            StatusTone::Neutral => "neutral",
            StatusTone::Warning => "warning",
            StatusTone::InProgress => "in-progress",
        }
    }
}

macro_rules! document_statuses {
    ($($variant:ident = $code:literal, $label:literal, $tone:ident;)+) => {
        /// Closed set of provider status codes.
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
        pub enum DocumentStatus {
            $($variant,)+
        }

        impl DocumentStatus {
            pub const ALL: &'static [DocumentStatus] = &[$(DocumentStatus::$variant,)+];

            pub fn from_code(code: &str) -> Option<Self> {
                match code.trim() {
                    $($code => Some(DocumentStatus::$variant),)+
                    _ => None,
                }
            }

            pub fn code(self) -> &'static str {
                match self {
                    $(DocumentStatus::$variant => $code,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $(DocumentStatus::$variant => $label,)+
                }
            }

            pub fn tone(self) -> StatusTone {
                match self {
                    $(DocumentStatus::$variant => StatusTone::$tone,)+
                }
            }
        }
    };
}

document_statuses! {
    TempSaved = "001", "문서 임시 저장", Neutral;
    Created = "002", "문서 생성", InProgress;
    Finalized = "003", "문서 최종 완료", Success;
    ApprovalRequested = "010", "결재요청", InProgress;
    ApprovalRejected = "011", "결재 반려", Danger;
    ApprovalApproved = "012", "결재 승인", Success;
    ApprovalRequestWithdrawn = "013", "결재 요청 취소", Warning;
    InternalRequested = "020", "내부자 요청", InProgress;
    InternalRejected = "021", "내부자 반려", Danger;
    InternalApproved = "022", "내부자 승인", Success;
    InternalTempSaved = "023", "내부자 임시 저장", Neutral;
    ExternalRequested = "030", "외부자 요청", InProgress;
    ExternalRejected = "031", "외부자 반려", Danger;
    ExternalApproved = "032", "외부자 승인", Success;
    ExternalRerequested = "033", "외부자 재 요청", InProgress;
    ExternalViewed = "034", "외부자 열람", Neutral;
    ExternalTempSaved = "035", "외부자 임시 저장", Neutral;
    CancelRequested = "040", "문서 취소 요청", Warning;
    CancelRequestDeclined = "041", "문서 취소 요청 거절", Neutral;
    Cancelled = "042", "문서 취소", Danger;
    Modified = "043", "문서 수정", Warning;
    ModificationWithdrawn = "044", "문서 수정 취소", Neutral;
    RejectRequested = "045", "문서 반려 요청", Warning;
    RejectRequestDeclined = "046", "문서 반려 요청 거절", Neutral;
    DeleteRequested = "047", "문서 삭제 요청", Warning;
    DeleteRequestDeclined = "048", "문서 삭제 요청 거절", Neutral;
    Deleted = "049", "문서 삭제", Danger;
    CompletedPdfSent = "050", "완료 문서 PDF 전송", Success;
    Transferred = "051", "문서 이관", Neutral;
    ParticipantRequested = "060", "참여자 요청", InProgress;
    ParticipantRejected = "061", "참여자 반려", Danger;
    ParticipantApproved = "062", "참여자 승인", Success;
    ParticipantRerequested = "063", "참여자 재요청(외부자)", InProgress;
    ParticipantViewed = "064", "참여자 문서 열람(외부자)", Neutral;
    ReviewerRequested = "070", "검토자 요청", InProgress;
    ReviewerRejected = "071", "검토자 반려", Danger;
    ReviewerApproved = "072", "검토자 승인", Success;
    ReviewerRerequested = "073", "검토자 재요청(외부자)", InProgress;
    ReviewerViewed = "074", "검토자 문서 열람(외부자)", Neutral;
    Completed = "099", "완료", Success;
}

impl DocumentStatus {
    /// History action label; unknown codes are shown as-is.
    pub fn action_label(code: &str) -> Cow<'_, str> {
        match DocumentStatus::from_code(code) {
            Some(status) => Cow::Borrowed(status.label()),
            None => Cow::Borrowed(code),
        }
    }
}

/// Label for any code, falling back to [`UNKNOWN_STATUS_LABEL`].
pub fn status_label(code: &str) -> &'static str {
    DocumentStatus::from_code(code)
        .map(DocumentStatus::label)
        .unwrap_or(UNKNOWN_STATUS_LABEL)
}

/// Tone for any code; unmapped codes land in the in-progress bucket.
pub fn status_tone(code: &str) -> StatusTone {
    DocumentStatus::from_code(code)
        .map(DocumentStatus::tone)
        .unwrap_or(StatusTone::InProgress)
}

/// Label used by the generic list view.
pub fn summary_label(code: &str) -> &'static str {
    match code.trim() {
        "001" => "임시저장",
        "099" => "완료",
        _ => "진행중",
    }
}

pub fn summary_tone(code: &str) -> StatusTone {
    match code.trim() {
        "001" => StatusTone::Neutral,
        "099" => StatusTone::Success,
        _ => StatusTone::InProgress,
    }
}

/// Tint for leave requests, which only expose a step name.
pub fn step_name_tone(step_name: &str) -> StatusTone {
    if step_name.contains("완료") {
        StatusTone::Success
    } else if step_name.contains("반려") {
        StatusTone::Danger
    } else {
        StatusTone::InProgress
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn completed_is_success() {
        assert_eq!(status_label("099"), "완료");
        assert_eq!(status_tone("099"), StatusTone::Success);
    }

    #[test]
    fn external_temp_save_is_neutral() {
        assert_eq!(status_label("035"), "외부자 임시 저장");
        assert_eq!(status_tone("035"), StatusTone::Neutral);
    }

    #[test]
    fn unknown_code_falls_back() {
        assert_eq!(status_label("999"), UNKNOWN_STATUS_LABEL);
        assert_eq!(status_tone("999"), StatusTone::InProgress);
        assert_eq!(DocumentStatus::action_label("999"), "999");
    }

    #[test]
    fn codes_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for status in DocumentStatus::ALL {
            assert!(seen.insert(status.code()), "duplicate {}", status.code());
            assert_eq!(DocumentStatus::from_code(status.code()), Some(*status));
        }
        assert_eq!(seen.len(), 40);
    }

    #[test]
    fn every_bucket_is_used() {
        let used: HashSet<StatusTone> = DocumentStatus::ALL.iter().map(|s| s.tone()).collect();
        for tone in StatusTone::ALL {
            assert!(used.contains(&tone), "{tone:?} has no members");
        }
    }

    #[test]
    fn summary_taxonomy_is_separate() {
        assert_eq!(summary_label("060"), "진행중");
        assert_eq!(status_label("060"), "참여자 요청");
        assert_eq!(summary_label("123"), "진행중");
        assert_eq!(summary_tone("001"), StatusTone::Neutral);
    }

    #[test]
    fn step_name_tint() {
        assert_eq!(step_name_tone("최종 완료"), StatusTone::Success);
        assert_eq!(step_name_tone("팀장 반려"), StatusTone::Danger);
        assert_eq!(step_name_tone("결재 중"), StatusTone::InProgress);
    }

    proptest! {
        #[test]
        fn any_code_gets_exactly_one_tone(code in "[0-9]{3}") {
            let tone = status_tone(&code);
            let matches = StatusTone::ALL.iter().filter(|candidate| **candidate == tone).count();
            prop_assert_eq!(matches, 1);
            let label = status_label(&code);
            prop_assert!(!label.is_empty());
        }
    }
}
