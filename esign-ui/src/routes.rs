//! Console page paths and the query strings the pages read back.

use esign_core::{DocumentFilter, WidgetMode};
use urlencoding::encode;

pub const DOCUMENTS: &str = "/documents";
pub const TEMPLATES: &str = "/templates";
pub const ADMIN_TEMPLATES: &str = "/admin/templates";
pub const LEAVE: &str = "/leave";

/// Resolves a relative `api_base` against the page origin.
pub fn absolute_api_base(origin: &str, api_base: &str) -> String {
    if api_base.starts_with("http://") || api_base.starts_with("https://") {
        return api_base.to_string();
    }
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        api_base.trim_start_matches('/')
    )
}

/// Document page for a widget mode; template modes live in the editor.
pub fn document_href(mode: &WidgetMode) -> String {
    match mode {
        WidgetMode::NewDocument { template_id } => {
            format!("/document?template_id={}", encode(template_id))
        }
        WidgetMode::ProcessDocument { document_id } => {
            format!("/document?document_id={}&mode=action", encode(document_id))
        }
        WidgetMode::PreviewDocument { document_id } => {
            format!("/document?document_id={}&mode=preview", encode(document_id))
        }
        WidgetMode::EditTemplate { template_id } => format!(
            "{ADMIN_TEMPLATES}/editor?template_id={}&mode=edit",
            encode(template_id)
        ),
        WidgetMode::DuplicateTemplate { template_id } => format!(
            "{ADMIN_TEMPLATES}/editor?template_id={}&mode=duplicate",
            encode(template_id)
        ),
    }
}

pub fn documents_href(filter: DocumentFilter) -> String {
    format!("{DOCUMENTS}?filter={}", filter.param())
}

pub fn leave_detail_href(document_id: &str) -> String {
    format!("{LEAVE}/info?id={}", encode(document_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_base_joins_origin() {
        assert_eq!(
            absolute_api_base("https://console.example.com/", "/api/v1"),
            "https://console.example.com/api/v1"
        );
        assert_eq!(
            absolute_api_base("https://console.example.com", "https://api.example.com/v1"),
            "https://api.example.com/v1"
        );
    }

    #[test]
    fn row_targets_round_trip_through_the_document_page() {
        let mode = DocumentFilter::Todo.open_mode("doc-1");
        assert_eq!(document_href(&mode), "/document?document_id=doc-1&mode=action");
        let reparsed = WidgetMode::for_document_page(None, Some("doc-1"), Some("action"))
            .expect("target");
        assert_eq!(reparsed, mode);

        let preview = DocumentFilter::Completed.open_mode("doc-2");
        let reparsed = WidgetMode::for_document_page(None, Some("doc-2"), Some("preview"))
            .expect("target");
        assert_eq!(reparsed, preview);
    }

    #[test]
    fn template_links() {
        let mode = WidgetMode::DuplicateTemplate {
            template_id: "t-9".to_string(),
        };
        assert_eq!(
            document_href(&mode),
            "/admin/templates/editor?template_id=t-9&mode=duplicate"
        );
        assert_eq!(leave_detail_href("d-3"), "/leave/info?id=d-3");
        assert_eq!(documents_href(DocumentFilter::Todo), "/documents?filter=todo");
    }

    #[test]
    fn ids_are_percent_encoded() {
        let mode = WidgetMode::PreviewDocument {
            document_id: "a&mode=action b".to_string(),
        };
        assert_eq!(
            document_href(&mode),
            "/document?document_id=a%26mode%3Daction%20b&mode=preview"
        );
        let mode = WidgetMode::NewDocument {
            template_id: "휴가/2024".to_string(),
        };
        assert_eq!(
            document_href(&mode),
            "/document?template_id=%ED%9C%B4%EA%B0%80%2F2024"
        );
        assert_eq!(leave_detail_href("x?y#z"), "/leave/info?id=x%3Fy%23z");
    }
}
