//! Page window and the document list view-model.
//!
//! The view-model never performs I/O. Every state change that needs data
//! returns a [`ListQuery`]; the host fetches it and hands the result back
//! through [`DocumentListState::apply`]. Each query carries a generation so
//! a response that arrives after the filter or page moved on is dropped.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::widget::WidgetMode;
use crate::ConsoleError;

/// 1-based page position against a server-side total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageWindow {
    page: u32,
    limit: u32,
    total_count: u64,
}

/// One numbered pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageButton {
    pub number: u32,
    pub active: bool,
}

impl PageWindow {
    /// A zero limit is treated as one item per page.
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            total_count: 0,
        }
    }

    /// Window on page 1 of a known result set.
    pub fn with_total(limit: u32, total_count: u64) -> Self {
        Self {
            total_count,
            ..Self::new(limit)
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_pages(&self) -> u32 {
        let pages = self.total_count.div_ceil(u64::from(self.limit));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Highest page the window may point at.
    pub fn last_page(&self) -> u32 {
        self.total_pages().max(1)
    }

    /// Items to skip on the server for the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        let total_pages = self.total_pages();
        total_pages != 0 && self.page < total_pages
    }

    /// One button per page. Decoders cap the total so this stays small.
    pub fn buttons(&self) -> Vec<PageButton> {
        (1..=self.total_pages())
            .map(|number| PageButton {
                number,
                active: number == self.page,
            })
            .collect()
    }

    /// 1-based inclusive range of items on the current page.
    pub fn showing_range(&self) -> Option<(u64, u64)> {
        if self.total_count == 0 {
            return None;
        }
        let first = self.offset() + 1;
        let last = (u64::from(self.page) * u64::from(self.limit)).min(self.total_count);
        (first <= last).then_some((first, last))
    }

    pub fn go_to(&mut self, page: u32) -> Result<(), ConsoleError> {
        if page == 0 || page > self.last_page() {
            return Err(ConsoleError::InvalidPage {
                page,
                total_pages: self.total_pages(),
            });
        }
        self.page = page;
        Ok(())
    }

    fn reset(&mut self) {
        self.page = 1;
    }

    /// Records a new total and pulls the page back inside the window.
    /// Returns `true` when the page had to move.
    fn set_total(&mut self, total_count: u64) -> bool {
        self.total_count = total_count;
        let last = self.last_page();
        if self.page > last {
            self.page = last;
            true
        } else {
            false
        }
    }
}

/// List tabs and the provider's document-box type codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFilter {
    InProgress,
    Todo,
    Completed,
    All,
}

impl DocumentFilter {
    /// Tab order of the document list.
    pub const ALL: [DocumentFilter; 4] = [
        DocumentFilter::Todo,
        DocumentFilter::InProgress,
        DocumentFilter::Completed,
        DocumentFilter::All,
    ];

    /// Parses the `filter` route parameter; anything unknown lists everything.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("todo") => DocumentFilter::Todo,
            Some("inprogress") => DocumentFilter::InProgress,
            Some("completed") => DocumentFilter::Completed,
            _ => DocumentFilter::All,
        }
    }

    /// Inverse of [`DocumentFilter::from_param`].
    pub fn param(self) -> &'static str {
        match self {
            DocumentFilter::InProgress => "inprogress",
            DocumentFilter::Todo => "todo",
            DocumentFilter::Completed => "completed",
            DocumentFilter::All => "all",
        }
    }

    pub fn type_code(self) -> &'static str {
        match self {
            DocumentFilter::InProgress => "01",
            DocumentFilter::Todo => "02",
            DocumentFilter::Completed => "03",
            DocumentFilter::All => "04",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DocumentFilter::InProgress => "진행 중 문서",
            DocumentFilter::Todo => "처리할 문서",
            DocumentFilter::Completed => "완료 문서",
            DocumentFilter::All => "전체 문서",
        }
    }

    /// Rows in the to-do box open for processing, the rest read-only.
    pub fn open_mode(self, document_id: &str) -> WidgetMode {
        match self {
            DocumentFilter::Todo => WidgetMode::ProcessDocument {
                document_id: document_id.to_string(),
            },
            _ => WidgetMode::PreviewDocument {
                document_id: document_id.to_string(),
            },
        }
    }
}

/// Parameters of one list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: DocumentFilter,
    pub page: u32,
    pub limit: u32,
    pub template_id: Option<String>,
    generation: u64,
}

impl ListQuery {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `type`, `page`, `limit` and optionally `templateId` query pairs.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("type", self.filter.type_code().to_string()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(template_id) = &self.template_id {
            pairs.push(("templateId", template_id.clone()));
        }
        pairs
    }
}

/// One page of documents plus the server's total row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub documents: Vec<Document>,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The response belonged to an older query and was ignored.
    Stale,
    /// The total shrank below the current page; fetch this query next.
    Refetch(ListQuery),
}

/// Paginated document list held by a list page.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentListState {
    filter: DocumentFilter,
    template_id: Option<String>,
    window: PageWindow,
    documents: Vec<Document>,
    loading: bool,
    generation: u64,
}

impl DocumentListState {
    pub fn new(filter: DocumentFilter, limit: u32) -> Self {
        Self {
            filter,
            template_id: None,
            window: PageWindow::new(limit),
            documents: Vec::new(),
            loading: false,
            generation: 0,
        }
    }

    /// Restricts the list to documents of one template.
    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn filter(&self) -> DocumentFilter {
        self.filter
    }

    pub fn window(&self) -> &PageWindow {
        &self.window
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Query for the current filter and page.
    pub fn refresh(&mut self) -> ListQuery {
        self.generation += 1;
        self.loading = true;
        tracing::debug!(
            filter = self.filter.type_code(),
            page = self.window.page(),
            generation = self.generation,
            "requesting document page"
        );
        ListQuery {
            filter: self.filter,
            page: self.window.page(),
            limit: self.window.limit(),
            template_id: self.template_id.clone(),
            generation: self.generation,
        }
    }

    /// Switching filters always starts again from page 1.
    pub fn select_filter(&mut self, filter: DocumentFilter) -> ListQuery {
        self.filter = filter;
        self.window.reset();
        self.refresh()
    }

    pub fn select_page(&mut self, page: u32) -> Result<ListQuery, ConsoleError> {
        self.window.go_to(page)?;
        Ok(self.refresh())
    }

    pub fn next_page(&mut self) -> Option<ListQuery> {
        if !self.window.has_next() {
            return None;
        }
        self.select_page(self.window.page() + 1).ok()
    }

    pub fn previous_page(&mut self) -> Option<ListQuery> {
        if !self.window.has_previous() {
            return None;
        }
        self.select_page(self.window.page() - 1).ok()
    }

    /// Replaces documents and total together if `query` is still current.
    pub fn apply(&mut self, query: &ListQuery, page: ListPage) -> ApplyOutcome {
        if query.generation != self.generation {
            tracing::debug!(
                stale = query.generation,
                current = self.generation,
                "dropping stale document page"
            );
            return ApplyOutcome::Stale;
        }
        self.loading = false;
        self.documents = page.documents;
        if self.window.set_total(page.total_count) {
            tracing::warn!(
                total = page.total_count,
                page = self.window.page(),
                "page fell outside the result set, moving back"
            );
            return ApplyOutcome::Refetch(self.refresh());
        }
        ApplyOutcome::Applied
    }

    /// Transient fetch failure: show an empty list and keep the page usable.
    pub fn fail(&mut self, query: &ListQuery) -> bool {
        if query.generation != self.generation {
            return false;
        }
        self.loading = false;
        self.documents.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn docs(range: std::ops::RangeInclusive<u32>) -> Vec<Document> {
        range
            .map(|n| Document {
                id: format!("doc-{n}"),
                ..Document::default()
            })
            .collect()
    }

    #[test]
    fn forty_five_items_by_twenty() {
        let mut state = DocumentListState::new(DocumentFilter::All, 20);
        let first = state.refresh();
        assert_eq!(
            state.apply(
                &first,
                ListPage {
                    documents: docs(1..=20),
                    total_count: 45
                }
            ),
            ApplyOutcome::Applied
        );
        assert_eq!(state.window().total_pages(), 3);

        let second = state.select_page(2).expect("page 2 exists");
        assert_eq!(second.page, 2);
        state.apply(
            &second,
            ListPage {
                documents: docs(21..=40),
                total_count: 45,
            },
        );

        assert_eq!(state.window().showing_range(), Some((21, 40)));
        assert_eq!(state.documents().first().map(|d| d.id.as_str()), Some("doc-21"));
        let buttons = state.window().buttons();
        let numbers: Vec<u32> = buttons.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        let active: Vec<u32> = buttons.iter().filter(|b| b.active).map(|b| b.number).collect();
        assert_eq!(active, vec![2]);
        assert!(state.window().has_previous());
        assert!(state.window().has_next());
    }

    #[test]
    fn changing_filter_resets_page() {
        let mut state = DocumentListState::new(DocumentFilter::All, 20);
        let query = state.refresh();
        state.apply(
            &query,
            ListPage {
                documents: docs(1..=20),
                total_count: 100,
            },
        );
        state.select_page(4).expect("page 4 exists");

        let query = state.select_filter(DocumentFilter::Todo);
        assert_eq!(query.page, 1);
        assert_eq!(
            query.query_pairs(),
            vec![
                ("type", "02".to_string()),
                ("page", "1".to_string()),
                ("limit", "20".to_string()),
            ]
        );
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut state = DocumentListState::new(DocumentFilter::All, 20);
        let old = state.refresh();
        let current = state.select_filter(DocumentFilter::Completed);
        assert_eq!(
            state.apply(
                &old,
                ListPage {
                    documents: docs(1..=3),
                    total_count: 3
                }
            ),
            ApplyOutcome::Stale
        );
        assert!(state.documents().is_empty());
        assert!(state.is_loading());
        assert!(!state.fail(&old));
        assert!(state.fail(&current));
        assert!(!state.is_loading());
    }

    #[test]
    fn shrinking_total_pulls_page_back() {
        let mut state = DocumentListState::new(DocumentFilter::All, 10);
        let query = state.refresh();
        state.apply(
            &query,
            ListPage {
                documents: docs(1..=10),
                total_count: 50,
            },
        );
        let query = state.select_page(5).expect("page 5 exists");
        let outcome = state.apply(
            &query,
            ListPage {
                documents: Vec::new(),
                total_count: 15,
            },
        );
        match outcome {
            ApplyOutcome::Refetch(next) => assert_eq!(next.page, 2),
            other => panic!("expected refetch, got {other:?}"),
        }
    }

    #[test]
    fn empty_result_disables_navigation() {
        let mut state = DocumentListState::new(DocumentFilter::Todo, 20);
        let query = state.refresh();
        state.apply(&query, ListPage::default());
        let window = state.window();
        assert_eq!(window.total_pages(), 0);
        assert!(window.buttons().is_empty());
        assert!(!window.has_previous());
        assert!(!window.has_next());
        assert_eq!(window.showing_range(), None);
        assert!(state.next_page().is_none());
        assert!(state.previous_page().is_none());
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let mut state = DocumentListState::new(DocumentFilter::All, 20);
        assert_eq!(
            state.select_page(2),
            Err(ConsoleError::InvalidPage {
                page: 2,
                total_pages: 0
            })
        );
        assert!(state.select_page(0).is_err());
    }

    #[test]
    fn template_restricted_list_sends_template_id() {
        let mut state =
            DocumentListState::new(DocumentFilter::All, 20).with_template("tpl-leave");
        let query = state.refresh();
        assert!(query
            .query_pairs()
            .contains(&("templateId", "tpl-leave".to_string())));
    }

    #[test]
    fn filter_params_and_open_modes() {
        assert_eq!(DocumentFilter::from_param(Some("todo")).type_code(), "02");
        assert_eq!(DocumentFilter::from_param(Some("inprogress")).type_code(), "01");
        assert_eq!(DocumentFilter::from_param(Some("completed")).type_code(), "03");
        assert_eq!(DocumentFilter::from_param(None).type_code(), "04");
        assert_eq!(DocumentFilter::Todo.open_mode("d").code(), "02");
        assert_eq!(DocumentFilter::All.open_mode("d").code(), "03");
        for filter in DocumentFilter::ALL {
            assert_eq!(DocumentFilter::from_param(Some(filter.param())), filter);
        }
    }

    proptest! {
        #[test]
        fn total_pages_is_ceiling(total in 0u64..10_000, limit in 1u32..500) {
            let mut window = PageWindow::new(limit);
            window.set_total(total);
            let expected = (total + u64::from(limit) - 1) / u64::from(limit);
            prop_assert_eq!(u64::from(window.total_pages()), expected);
            prop_assert_eq!(window.buttons().len() as u64, expected);
            if expected == 0 {
                prop_assert!(!window.has_previous());
                prop_assert!(!window.has_next());
            }
            prop_assert!(window.page() >= 1 && window.page() <= window.last_page());
        }
    }
}
