//! Console pages built on the widget host and the document list.

use esign_core::fields::leave_keys;
use esign_core::status::{status_label, status_tone, step_name_tone};
use esign_core::{
    ConsoleConfig, ConsoleError, Document, HistoryEntry, LeaveRequest, Prefill, WidgetMode,
    APPLICANT_APPROVAL_LINE, RECEPTION_APPROVAL_LINE,
};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::document_list::{now_millis, render_pagination, use_document_list};
use crate::routes;
use crate::session;
use crate::widget_host::WidgetHost;

const LEAVE_DOCUMENT_NAME: &str = "휴가신청서";
const LEAVE_CREATED_NOTICE: &str = "휴가 신청서가 성공적으로 작성되었습니다.";

#[derive(Properties, PartialEq)]
pub struct ConfigProps {
    pub config: ConsoleConfig,
}

fn render_invalid_target(err: &ConsoleError, back_href: &'static str) -> Html {
    html! {
        <section class="page-error" data-tone="danger">
            <p>{ err.to_string() }</p>
            <a href={back_href}>{"돌아가기"}</a>
        </section>
    }
}

/// New document, processing or preview, from `template_id`/`document_id`/`mode`.
#[function_component(DocumentPage)]
pub fn document_page(props: &ConfigProps) -> Html {
    let target = use_memo((), |_| {
        WidgetMode::for_document_page(
            session::query_param("template_id").as_deref(),
            session::query_param("document_id").as_deref(),
            session::query_param("mode").as_deref(),
        )
    });

    match &*target {
        Ok(mode) => html! {
            <WidgetHost
                mode={mode.clone()}
                config={props.config.clone()}
                container_id="eformsign_iframe"
                on_complete={Callback::from(|_| session::navigate(routes::DOCUMENTS))}
            />
        },
        Err(err) => render_invalid_target(err, routes::TEMPLATES),
    }
}

#[function_component(TemplateEditorPage)]
pub fn template_editor_page(props: &ConfigProps) -> Html {
    let target = use_memo((), |_| {
        WidgetMode::for_template_editor(
            session::query_param("template_id").as_deref(),
            session::query_param("mode").as_deref(),
        )
    });

    match &*target {
        Ok(mode) => html! {
            <WidgetHost
                mode={mode.clone()}
                config={props.config.clone()}
                container_id="eformsign_template_iframe"
                on_complete={Callback::from(|_| session::navigate(routes::ADMIN_TEMPLATES))}
            />
        },
        Err(err) => render_invalid_target(err, routes::ADMIN_TEMPLATES),
    }
}

/// Leave-request list with a modal that writes a new request.
#[function_component(LeavePage)]
pub fn leave_page(props: &ConfigProps) -> Html {
    let template_id = props.config.leave_template_id.clone();
    let list = use_document_list(
        esign_core::DocumentFilter::All,
        &props.config,
        (!template_id.is_empty()).then(|| template_id.clone()),
        true,
    );
    let writing = use_state(|| false);
    let documents = list.documents();
    let now = now_millis();

    let on_write = {
        let writing = writing.clone();
        Callback::from(move |_| writing.set(true))
    };
    let on_close = {
        let writing = writing.clone();
        Callback::from(move |_| writing.set(false))
    };
    let on_complete = {
        let writing = writing.clone();
        let list = list.clone();
        Callback::from(move |_| {
            session::alert(LEAVE_CREATED_NOTICE);
            writing.set(false);
            list.refresh();
        })
    };

    let modal = if *writing {
        let prefill = Prefill {
            document_name: LEAVE_DOCUMENT_NAME.to_string(),
            fields: Vec::new(),
        };
        let content = match WidgetMode::for_document_page(Some(&template_id), None, None) {
            Ok(mode) => html! {
                <WidgetHost
                    mode={mode}
                    config={props.config.clone()}
                    container_id="eformsign_write_iframe"
                    prefill={Some(prefill)}
                    on_complete={on_complete}
                />
            },
            Err(err) => html! { <p class="widget-notice" data-tone="danger">{ err.to_string() }</p> },
        };
        html! {
            <div class="modal-backdrop">
                <div class="modal">
                    <button type="button" class="modal-close" onclick={on_close} aria-label="닫기">{"×"}</button>
                    { content }
                </div>
            </div>
        }
    } else {
        html! {}
    };

    let body = if documents.is_empty() {
        let label = if list.is_loading() { "불러오는 중..." } else { "휴가 신청 내역이 없습니다." };
        html! { <tr><td class="list-empty" colspan="6">{ label }</td></tr> }
    } else {
        html! { for documents.iter().map(|document| render_leave_row(document, now)) }
    };

    html! {
        <section class="leave-page">
            <header class="list-header">
                <div>
                    <h1>{"휴가 관리"}</h1>
                    <p>{"휴가 신청 내역을 조회하고 관리합니다."}</p>
                </div>
                <button type="button" class="primary" onclick={on_write}>{"휴가 신청"}</button>
            </header>
            <table class="list-table">
                <thead>
                    <tr>
                        <th>{"신청자"}</th>
                        <th>{"휴가 구분"}</th>
                        <th>{"기간"}</th>
                        <th>{"일수"}</th>
                        <th>{"상태"}</th>
                        <th>{"경과"}</th>
                    </tr>
                </thead>
                <tbody>{ body }</tbody>
            </table>
            { render_pagination(&list) }
            { modal }
        </section>
    }
}

fn render_leave_row(document: &Document, now: i64) -> Html {
    let leave = LeaveRequest::new(document.field_map());
    let step_name = document.current_status.step_name.clone();
    let href = routes::leave_detail_href(&document.id);
    let onclick = Callback::from(move |_| session::navigate(&href));

    html! {
        <tr class="list-row" onclick={onclick}>
            <td>{ leave.applicant() }</td>
            <td>{ leave.kind() }</td>
            <td>{ leave.period() }</td>
            <td>{ leave.days().map(|days| format!("{days}일")).unwrap_or_else(|| "-".to_string()) }</td>
            <td>
                <span class="status-badge" data-tone={step_name_tone(&step_name).level()}>{ step_name.clone() }</span>
            </td>
            <td>{ format!("{}일", document.elapsed_days(now)) }</td>
        </tr>
    }
}

#[derive(Properties, PartialEq)]
pub struct LeaveDetailProps {
    pub config: ConsoleConfig,
    pub document_id: AttrValue,
}

/// Leave request card: fields, both approval lines and the history.
#[function_component(LeaveDetail)]
pub fn leave_detail(props: &LeaveDetailProps) -> Html {
    let document = use_state(|| None::<Document>);
    let failed = use_state(|| false);

    {
        let document = document.clone();
        let failed = failed.clone();
        let config = props.config.clone();
        use_effect_with(props.document_id.clone(), move |document_id| {
            let document_id = document_id.to_string();
            spawn_local(async move {
                match session::api_client(&config).document(&document_id).await {
                    Ok(loaded) => document.set(Some(loaded)),
                    Err(err) => {
                        session::report_api_error("문서 조회 실패", &err, &config);
                        failed.set(true);
                    }
                }
            });
            || ()
        });
    }

    let Some(document) = document.as_ref() else {
        let label = if *failed { "문서를 불러오지 못했습니다." } else { "불러오는 중..." };
        return html! { <section class="leave-detail"><p class="list-empty">{ label }</p></section> };
    };

    let leave = LeaveRequest::new(document.field_map());
    let code = document.current_status.status_type.as_str();

    html! {
        <section class="leave-detail">
            <header class="detail-header">
                <a href={routes::LEAVE}>{"← 목록"}</a>
                <h1>{ document.document_name.clone() }</h1>
                <span class="status-badge" data-tone={status_tone(code).level()}>{ status_label(code) }</span>
            </header>
            <div class="approval-lines">
                { render_approval_line("신청부서 결재선", leave.approval_line(&APPLICANT_APPROVAL_LINE)) }
                { render_approval_line("접수부서 결재선", leave.approval_line(&RECEPTION_APPROVAL_LINE)) }
            </div>
            <dl class="detail-fields">
                <dt>{"신청자"}</dt><dd>{ leave.applicant() }</dd>
                <dt>{"신청일"}</dt><dd>{ leave.applied_on() }</dd>
                <dt>{"휴가 기간"}</dt>
                <dd>{ leave.period() }{" "}{ format!("({}일간)", leave.days().unwrap_or("0")) }</dd>
                <dt>{ leave_keys::KIND }</dt><dd>{ leave.kind() }</dd>
                <dt>{ leave_keys::REASON }</dt><dd>{ leave.reason() }</dd>
            </dl>
            <section class="history">
                <h2>{"처리 이력"}</h2>
                <ol>{ for document.histories.iter().map(render_history) }</ol>
            </section>
        </section>
    }
}

fn render_approval_line(title: &'static str, line: Vec<(&str, &str)>) -> Html {
    html! {
        <div class="approval-line">
            <p class="approval-title">{ title }</p>
            <ul>
                {
                    for line.into_iter().map(|(role, approver)| html! {
                        <li>
                            <span class="approval-role">{ role.to_string() }</span>
                            <span class="approval-name">{ approver.to_string() }</span>
                        </li>
                    })
                }
            </ul>
        </div>
    }
}

fn render_history(entry: &HistoryEntry) -> Html {
    let executed = entry
        .executed_at()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let executor = entry
        .executor
        .as_ref()
        .map(|recipient| recipient.name.clone())
        .unwrap_or_default();

    html! {
        <li class="history-entry">
            <span class="history-action">{ entry.action_label().unwrap_or_else(|| "-".to_string()) }</span>
            <span class="history-step">{ entry.step_name.clone().unwrap_or_default() }</span>
            <span class="history-executor">{ executor }</span>
            <time>{ executed }</time>
        </li>
    }
}
