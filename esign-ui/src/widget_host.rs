//! Host component for the vendor's embedded widget.
//!
//! All sequencing lives in [`WidgetLifecycle`]; this module only performs
//! the effects it asks for (polling, script tags, token fetch, the vendor
//! constructor) and feeds the results back in.

use std::cell::RefCell;
use std::rc::Rc;

use esign_core::widget::{DEPENDENCY_ALIAS, DEPENDENCY_GLOBAL, DEPENDENCY_SCRIPT_URL};
use esign_core::{
    wait_until, CancelToken, ConsoleConfig, ConstructPlan, LayoutOptions, Prefill,
    VendorResponse, VendorSdk, WaitOutcome, WaitPolicy, WidgetEffect, WidgetLifecycle,
    WidgetMode, WidgetOutcome, WidgetPhase,
};
use gloo_timers::future::sleep;
use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{console, Document, HtmlScriptElement};
use yew::prelude::*;

use crate::session;

const DEPENDENCY_SCRIPT_ID: &str = "efs_dependency_script";

type VendorCallback = Closure<dyn FnMut(JsValue)>;

#[derive(Properties, PartialEq)]
pub struct WidgetHostProps {
    pub mode: WidgetMode,
    pub config: ConsoleConfig,
    pub container_id: AttrValue,
    #[prop_or_default]
    pub prefill: Option<Prefill>,
    #[prop_or(true)]
    pub header: bool,
    #[prop_or_default]
    pub footer: bool,
    /// Called with the vendor's document id once the flow completes.
    #[prop_or_default]
    pub on_complete: Callback<Option<String>>,
}

#[derive(Clone, PartialEq)]
struct HostView {
    phase: WidgetPhase,
    missing_user_key: bool,
}

#[derive(Clone)]
struct Host {
    lifecycle: Rc<RefCell<WidgetLifecycle>>,
    callbacks: Rc<RefCell<Vec<VendorCallback>>>,
    cancel: CancelToken,
    config: ConsoleConfig,
    view: UseStateHandle<HostView>,
    vendor_error: UseStateHandle<Option<String>>,
    on_complete: Callback<Option<String>>,
}

impl Host {
    fn sync(&self) {
        let lifecycle = self.lifecycle.borrow();
        self.view.set(HostView {
            phase: lifecycle.phase(),
            missing_user_key: lifecycle
                .token()
                .is_some_and(|token| !token.has_user_key()),
        });
    }

    fn dispatch(&self, transition: impl FnOnce(&mut WidgetLifecycle) -> Vec<WidgetEffect>) {
        if self.cancel.is_cancelled() {
            return;
        }
        let effects = transition(&mut *self.lifecycle.borrow_mut());
        self.sync();
        for effect in effects {
            self.run(effect);
        }
    }

    fn run(&self, effect: WidgetEffect) {
        match effect {
            WidgetEffect::PollDependency => self.poll_dependency(),
            WidgetEffect::InjectSdk(sdk) => self.inject_sdk(sdk),
            WidgetEffect::FetchToken => self.fetch_token(),
            WidgetEffect::Construct(plan) => self.construct(plan),
            WidgetEffect::Report(failure) => {
                console::warn_1(&JsValue::from_str(&failure.message()));
            }
        }
    }

    fn poll_dependency(&self) {
        if !global_present(DEPENDENCY_GLOBAL) {
            if let Err(err) = ensure_script(DEPENDENCY_SCRIPT_ID, DEPENDENCY_SCRIPT_URL) {
                console::error_1(&err);
            }
        }
        let host = self.clone();
        spawn_local(async move {
            let policy = WaitPolicy::dependency(&host.config);
            let probe = || global_present(DEPENDENCY_GLOBAL);
            match wait_until(policy, &host.cancel, probe, sleep).await {
                WaitOutcome::Ready => {
                    alias_dependency();
                    let sdk = host.lifecycle.borrow().mode().sdk();
                    let sdk_present = global_present(sdk.constructor());
                    host.dispatch(|lifecycle| lifecycle.dependency_detected(sdk_present));
                }
                WaitOutcome::TimedOut => host.dispatch(WidgetLifecycle::dependency_timed_out),
                WaitOutcome::Cancelled => {}
            }
        });
    }

    fn inject_sdk(&self, sdk: VendorSdk) {
        let Some(document) = web_sys::window().and_then(|window| window.document()) else {
            self.dispatch(WidgetLifecycle::sdk_failed);
            return;
        };

        if document.get_element_by_id(sdk.script_id()).is_some() {
            // Tag left by an earlier mount that may still be loading.
            let host = self.clone();
            spawn_local(async move {
                let policy = WaitPolicy::dependency(&host.config);
                let probe = || global_present(sdk.constructor());
                match wait_until(policy, &host.cancel, probe, sleep).await {
                    WaitOutcome::Ready => host.dispatch(WidgetLifecycle::sdk_loaded),
                    WaitOutcome::TimedOut => host.dispatch(WidgetLifecycle::sdk_failed),
                    WaitOutcome::Cancelled => {}
                }
            });
            return;
        }

        let onload = {
            let host = self.clone();
            Closure::once_into_js(move || host.dispatch(WidgetLifecycle::sdk_loaded))
        };
        let onerror = {
            let host = self.clone();
            Closure::once_into_js(move || host.dispatch(WidgetLifecycle::sdk_failed))
        };
        let injected =
            create_script(&document, sdk.script_id(), sdk.script_url()).and_then(|script| {
                script.set_onload(Some(onload.unchecked_ref()));
                script.set_onerror(Some(onerror.unchecked_ref()));
                append_to_head(&document, &script)
            });
        if let Err(err) = injected {
            console::error_1(&err);
            self.dispatch(WidgetLifecycle::sdk_failed);
        }
    }

    fn fetch_token(&self) {
        let host = self.clone();
        spawn_local(async move {
            let client = session::api_client(&host.config);
            match client.widget_token().await {
                Ok(token) => host.dispatch(move |lifecycle| lifecycle.token_received(token)),
                Err(err) => {
                    session::report_api_error("토큰 발급 실패", &err, &host.config);
                    host.dispatch(move |lifecycle| lifecycle.token_failed(err.to_string()));
                }
            }
        });
    }

    fn construct(&self, plan: ConstructPlan) {
        let prepared = clear_container(&plan.container_id)
            .and_then(|_| create_instance(plan.sdk))
            .and_then(|instance| {
                let serializer = serde_wasm_bindgen::Serializer::json_compatible();
                let options = plan
                    .options
                    .serialize(&serializer)
                    .map_err(|err| JsValue::from_str(&err.to_string()))?;
                Ok((instance, options))
            });
        let (instance, options) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                let reason = describe(&err);
                self.dispatch(move |lifecycle| lifecycle.construction_failed(reason));
                return;
            }
        };

        let handlers = self.vendor_callbacks();
        let host = self.clone();
        spawn_local(async move {
            sleep(plan.open_delay).await;
            if host.cancel.is_cancelled() {
                return;
            }
            let opened =
                bind_and_open(&instance, plan.sdk, &options, &plan.container_id, &handlers);
            if let Err(err) = opened {
                let reason = describe(&err);
                host.dispatch(move |lifecycle| lifecycle.construction_failed(reason));
            }
        });
    }

    /// Success, error and action handlers, kept alive until unmount.
    fn vendor_callbacks(&self) -> [JsValue; 3] {
        let success = {
            let host = self.clone();
            VendorCallback::new(move |payload: JsValue| host.on_success(payload))
        };
        let error = {
            let host = self.clone();
            VendorCallback::new(move |payload: JsValue| host.on_error(payload))
        };
        let action = VendorCallback::new(|payload: JsValue| {
            console::log_2(&JsValue::from_str("전자서명 action"), &payload);
        });
        let handles = [
            success.as_ref().clone(),
            error.as_ref().clone(),
            action.as_ref().clone(),
        ];
        self.callbacks.borrow_mut().extend([success, error, action]);
        handles
    }

    fn on_success(&self, payload: JsValue) {
        console::log_2(&JsValue::from_str("전자서명 success"), &payload);
        let Some(response) = decode_response(payload) else {
            return;
        };
        if let WidgetOutcome::Completed { document_id } = WidgetOutcome::from_success(&response) {
            let notice = self.lifecycle.borrow().mode().completion_notice();
            if let Some(notice) = notice {
                session::alert(notice);
            }
            self.on_complete.emit(document_id);
        }
    }

    fn on_error(&self, payload: JsValue) {
        console::error_2(&JsValue::from_str("전자서명 error"), &payload);
        let response = decode_response(payload).unwrap_or_default();
        if let Some(message) = WidgetOutcome::from_error(&response).user_message() {
            self.vendor_error.set(Some(message));
        }
    }
}

fn decode_response(payload: JsValue) -> Option<VendorResponse> {
    match from_value::<VendorResponse>(payload) {
        Ok(response) => Some(response),
        Err(err) => {
            console::warn_1(&JsValue::from_str(&format!("전자서명 응답 해석 실패: {err}")));
            None
        }
    }
}

fn global_present(name: &str) -> bool {
    Reflect::get(&js_sys::global(), &JsValue::from_str(name))
        .map(|value| !value.is_undefined() && !value.is_null())
        .unwrap_or(false)
}

/// The SDK looks the dependency up under its long name as well.
fn alias_dependency() {
    if global_present(DEPENDENCY_ALIAS) {
        return;
    }
    let global = js_sys::global();
    let aliased = Reflect::get(&global, &JsValue::from_str(DEPENDENCY_GLOBAL))
        .and_then(|value| Reflect::set(&global, &JsValue::from_str(DEPENDENCY_ALIAS), &value));
    if let Err(err) = aliased {
        console::error_1(&err);
    }
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("document 객체가 없습니다"))
}

fn create_script(document: &Document, id: &str, src: &str) -> Result<HtmlScriptElement, JsValue> {
    let script: HtmlScriptElement = document.create_element("script")?.dyn_into()?;
    script.set_id(id);
    script.set_src(src);
    script.set_async(true);
    Ok(script)
}

fn append_to_head(document: &Document, script: &HtmlScriptElement) -> Result<(), JsValue> {
    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document에 <head>가 없습니다"))?;
    head.append_child(script)?;
    Ok(())
}

fn ensure_script(id: &str, src: &str) -> Result<(), JsValue> {
    let document = document()?;
    if document.get_element_by_id(id).is_some() {
        return Ok(());
    }
    let script = create_script(&document, id, src)?;
    append_to_head(&document, &script)
}

fn clear_container(container_id: &str) -> Result<(), JsValue> {
    if let Some(container) = document()?.get_element_by_id(container_id) {
        container.set_inner_html("");
    }
    Ok(())
}

fn create_instance(sdk: VendorSdk) -> Result<JsValue, JsValue> {
    let constructor: Function =
        Reflect::get(&js_sys::global(), &JsValue::from_str(sdk.constructor()))?.dyn_into()?;
    Reflect::construct(&constructor, &Array::new())
}

fn bind_and_open(
    instance: &JsValue,
    sdk: VendorSdk,
    options: &JsValue,
    container_id: &str,
    handlers: &[JsValue; 3],
) -> Result<(), JsValue> {
    let bind: Function =
        Reflect::get(instance, &JsValue::from_str(sdk.bind_method()))?.dyn_into()?;
    let args = Array::of5(
        options,
        &JsValue::from_str(container_id),
        &handlers[0],
        &handlers[1],
        &handlers[2],
    );
    bind.apply(instance, &args)?;
    let open: Function = Reflect::get(instance, &JsValue::from_str("open"))?.dyn_into()?;
    open.call0(instance)?;
    Ok(())
}

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

#[function_component(WidgetHost)]
pub fn widget_host(props: &WidgetHostProps) -> Html {
    let view = use_state(|| HostView {
        phase: WidgetPhase::Idle,
        missing_user_key: false,
    });
    let vendor_error = use_state(|| None::<String>);
    let cancel = (*use_memo((), |_| CancelToken::new())).clone();
    let callbacks = use_mut_ref(Vec::<VendorCallback>::new);
    let lifecycle = {
        let mode = props.mode.clone();
        let container_id = props.container_id.to_string();
        let config = props.config.clone();
        let layout = LayoutOptions::new(&props.config, props.header, props.footer);
        let prefill = props.prefill.clone();
        use_mut_ref(move || {
            let lifecycle = WidgetLifecycle::new(mode, container_id, &config).with_layout(layout);
            match prefill {
                Some(prefill) => lifecycle.with_prefill(prefill),
                None => lifecycle,
            }
        })
    };

    {
        let host = Host {
            lifecycle,
            callbacks,
            cancel,
            config: props.config.clone(),
            view: view.clone(),
            vendor_error: vendor_error.clone(),
            on_complete: props.on_complete.clone(),
        };
        let container_id = props.container_id.to_string();
        use_effect_with((), move |_| {
            host.dispatch(WidgetLifecycle::mount);
            host.dispatch(WidgetLifecycle::open);
            move || {
                host.cancel.cancel();
                host.lifecycle.borrow_mut().teardown();
                if let Err(err) = clear_container(&container_id) {
                    console::error_1(&err);
                }
                host.callbacks.borrow_mut().clear();
            }
        });
    }

    let status = match &view.phase {
        WidgetPhase::Failed(failure) => html! {
            <span class="widget-status" data-tone="danger">{ failure.message() }</span>
        },
        WidgetPhase::Constructed => html! {},
        WidgetPhase::Ready | WidgetPhase::WaitingToken => html! {
            <span class="widget-status" data-tone="in-progress">{"문서 준비 중..."}</span>
        },
        WidgetPhase::Idle | WidgetPhase::WaitingDependency | WidgetPhase::WaitingSdk => html! {
            <span class="widget-status" data-tone="warning">{"SDK 로딩 중..."}</span>
        },
    };

    html! {
        <div class="widget-host">
            <header class="widget-toolbar">
                <h2>{ props.mode.title() }</h2>
                { status }
            </header>
            {
                if view.missing_user_key {
                    html! { <p class="widget-notice" data-tone="warning">{"Warning: User Key missing"}</p> }
                } else {
                    html! {}
                }
            }
            {
                vendor_error
                    .as_ref()
                    .map(|message| html! { <p class="widget-notice" data-tone="danger">{ message.clone() }</p> })
                    .unwrap_or_default()
            }
            <div id={props.container_id.clone()} class="widget-container"></div>
        </div>
    }
}
