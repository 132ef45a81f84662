//! Paginated document list and the hook that drives [`DocumentListState`].

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use esign_core::status::{status_label, summary_label, summary_tone};
use esign_core::{
    ApplyOutcome, ConsoleConfig, Document, DocumentFilter, DocumentListState, ListQuery,
    PageWindow,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;
use web_sys::console;
use yew::prelude::*;

use crate::{routes, session};

/// Shared handle to a list view-model plus the fetch loop around it.
#[derive(Clone)]
pub struct ListHandle {
    state: Rc<RefCell<DocumentListState>>,
    redraw: UseForceUpdateHandle,
    config: ConsoleConfig,
    with_details: bool,
}

impl ListHandle {
    pub fn documents(&self) -> Vec<Document> {
        self.state.borrow().documents().to_vec()
    }

    pub fn window(&self) -> PageWindow {
        *self.state.borrow().window()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn refresh(&self) {
        let query = self.state.borrow_mut().refresh();
        self.fetch(query);
    }

    pub fn select_filter(&self, filter: DocumentFilter) {
        let query = self.state.borrow_mut().select_filter(filter);
        self.fetch(query);
    }

    pub fn select_page(&self, page: u32) {
        let query = self.state.borrow_mut().select_page(page);
        match query {
            Ok(query) => self.fetch(query),
            Err(err) => console::warn_1(&JsValue::from_str(&err.to_string())),
        }
    }

    pub fn next_page(&self) {
        let query = self.state.borrow_mut().next_page();
        if let Some(query) = query {
            self.fetch(query);
        }
    }

    pub fn previous_page(&self) {
        let query = self.state.borrow_mut().previous_page();
        if let Some(query) = query {
            self.fetch(query);
        }
    }

    fn fetch(&self, query: ListQuery) {
        self.redraw.force_update();
        let handle = self.clone();
        spawn_local(async move {
            let client = session::api_client(&handle.config);
            let result = match client.documents(&query).await {
                Ok(mut page) if handle.with_details => {
                    page.documents = client.with_details(page.documents).await;
                    Ok(page)
                }
                other => other,
            };

            let follow_up = match result {
                Ok(page) => {
                    let outcome = handle.state.borrow_mut().apply(&query, page);
                    match outcome {
                        ApplyOutcome::Refetch(next) => Some(next),
                        ApplyOutcome::Applied | ApplyOutcome::Stale => None,
                    }
                }
                Err(err) => {
                    session::report_api_error("문서 목록 조회 실패", &err, &handle.config);
                    handle.state.borrow_mut().fail(&query);
                    None
                }
            };
            handle.redraw.force_update();
            if let Some(next) = follow_up {
                handle.fetch(next);
            }
        });
    }
}

/// List state for `filter`, refetched whenever the filter changes.
#[hook]
pub fn use_document_list(
    filter: DocumentFilter,
    config: &ConsoleConfig,
    template_id: Option<String>,
    with_details: bool,
) -> ListHandle {
    let limit = config.page_limit;
    let state = use_mut_ref(move || {
        let state = DocumentListState::new(filter, limit);
        match template_id {
            Some(template_id) => state.with_template(template_id),
            None => state,
        }
    });
    let handle = ListHandle {
        state,
        redraw: use_force_update(),
        config: config.clone(),
        with_details,
    };

    {
        let handle = handle.clone();
        use_effect_with(filter, move |filter| {
            handle.select_filter(*filter);
            || ()
        });
    }
    handle
}

fn format_date(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn now_millis() -> i64 {
    js_sys::Date::now() as i64
}

pub fn render_pagination(list: &ListHandle) -> Html {
    let window = list.window();
    if window.total_count() == 0 {
        return html! {};
    }

    let showing = window
        .showing_range()
        .map(|(first, last)| format!("전체 {}건 중 {first}-{last}", window.total_count()))
        .unwrap_or_default();

    let on_previous = {
        let list = list.clone();
        Callback::from(move |_| list.previous_page())
    };
    let on_next = {
        let list = list.clone();
        Callback::from(move |_| list.next_page())
    };

    html! {
        <nav class="pagination" aria-label="페이지">
            <span class="pagination-range">{ showing }</span>
            <div class="pagination-controls">
                <button type="button" disabled={!window.has_previous()} onclick={on_previous}>{"이전"}</button>
                {
                    for window.buttons().into_iter().map(|button| {
                        let list = list.clone();
                        let number = button.number;
                        let onclick = Callback::from(move |_| list.select_page(number));
                        html! {
                            <button
                                type="button"
                                class={classes!("page-button", button.active.then_some("is-active"))}
                                aria-current={button.active.then_some("page")}
                                onclick={onclick}
                            >
                                { number }
                            </button>
                        }
                    })
                }
                <button type="button" disabled={!window.has_next()} onclick={on_next}>{"다음"}</button>
            </div>
        </nav>
    }
}

#[derive(Properties, PartialEq)]
pub struct DocumentListProps {
    pub filter: DocumentFilter,
    pub config: ConsoleConfig,
}

#[function_component(DocumentList)]
pub fn document_list(props: &DocumentListProps) -> Html {
    let filter = use_state(|| props.filter);
    let list = use_document_list(*filter, &props.config, None, false);
    let documents = list.documents();
    let now = now_millis();

    let tabs = DocumentFilter::ALL.into_iter().map(|tab| {
        let filter = filter.clone();
        let active = *filter == tab;
        let onclick = Callback::from(move |_| filter.set(tab));
        html! {
            <button
                type="button"
                class={classes!("filter-tab", active.then_some("is-active"))}
                onclick={onclick}
            >
                { tab.title() }
            </button>
        }
    });

    let body = if list.is_loading() && documents.is_empty() {
        html! { <tr><td class="list-empty" colspan="6">{"불러오는 중..."}</td></tr> }
    } else if documents.is_empty() {
        html! { <tr><td class="list-empty" colspan="6">{"문서가 없습니다."}</td></tr> }
    } else {
        html! { for documents.iter().map(|document| render_row(document, *filter, now)) }
    };

    html! {
        <section class="document-list">
            <header class="list-header">
                <h1>{ filter.title() }</h1>
                <div class="filter-tabs" role="tablist">{ for tabs }</div>
            </header>
            <table class="list-table">
                <thead>
                    <tr>
                        <th>{"문서명"}</th>
                        <th>{"상태"}</th>
                        <th>{"작성자"}</th>
                        <th>{"처리자"}</th>
                        <th>{"이력"}</th>
                        <th>{"경과"}</th>
                    </tr>
                </thead>
                <tbody>{ body }</tbody>
            </table>
            { render_pagination(&list) }
        </section>
    }
}

fn render_row(document: &Document, filter: DocumentFilter, now: i64) -> Html {
    let code = document.current_status.status_type.as_str();
    let href = routes::document_href(&filter.open_mode(&document.id));
    let onclick = Callback::from(move |_| session::navigate(&href));

    html! {
        <tr class="list-row" onclick={onclick}>
            <td>
                <span class="row-title">{ document.document_name.clone() }</span>
                <span class="row-sub">{ format_date(document.created_date) }</span>
            </td>
            <td>
                <span class="status-badge" data-tone={summary_tone(code).level()} title={status_label(code)}>
                    { summary_label(code) }
                </span>
            </td>
            <td>{ document.creator.name.clone() }</td>
            <td>{ document.handler_names() }</td>
            <td>{ document.history_count() }</td>
            <td>{ format!("{}일", document.elapsed_days(now)) }</td>
        </tr>
    }
}
