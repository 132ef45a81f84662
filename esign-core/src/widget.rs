//! Embedded vendor widget: operation modes, the option object handed to the
//! vendor SDK, callback classification and the bootstrap state machine.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::document::AuthToken;
use crate::{ConsoleConfig, ConsoleError};

/// Global symbol the vendor SDK needs before it can be loaded.
pub const DEPENDENCY_GLOBAL: &str = "$";
/// Alias the SDK expects next to [`DEPENDENCY_GLOBAL`].
pub const DEPENDENCY_ALIAS: &str = "jQuery";
pub const DEPENDENCY_SCRIPT_URL: &str = "https://www.eformsign.com/plugins/jquery/jquery.min.js";

/// Result code the vendor reports when the user finished the flow.
pub const COMPLETION_CODE: &str = "-1";
/// Error code the vendor reports when the user closed the widget.
pub const USER_CANCEL_CODE: &str = "1201";

/// The two vendor SDK flavours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VendorSdk {
    Document,
    Template,
}

impl VendorSdk {
    /// DOM id of the injected script tag.
    pub fn script_id(self) -> &'static str {
        match self {
            VendorSdk::Document => "efs_sdk_script",
            VendorSdk::Template => "efs_template_script",
        }
    }

    pub fn script_url(self) -> &'static str {
        match self {
            VendorSdk::Document => "https://www.eformsign.com/lib/js/efs_embedded_v2.js",
            VendorSdk::Template => "https://www.eformsign.com/lib/js/efs_embedded_form.js",
        }
    }

    /// Global constructor exported by the SDK.
    pub fn constructor(self) -> &'static str {
        match self {
            VendorSdk::Document => "EformSignDocument",
            VendorSdk::Template => "EformSignTemplate",
        }
    }

    /// Method binding options, container and callbacks to an instance.
    pub fn bind_method(self) -> &'static str {
        match self {
            VendorSdk::Document => "document",
            VendorSdk::Template => "template",
        }
    }
}

/// What the widget is opened for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetMode {
    NewDocument { template_id: String },
    EditTemplate { template_id: String },
    DuplicateTemplate { template_id: String },
    ProcessDocument { document_id: String },
    PreviewDocument { document_id: String },
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

impl WidgetMode {
    /// Route parameters of the document page. A document id wins over a
    /// template id; `view_mode == "preview"` opens read-only.
    pub fn for_document_page(
        template_id: Option<&str>,
        document_id: Option<&str>,
        view_mode: Option<&str>,
    ) -> Result<Self, ConsoleError> {
        if let Some(document_id) = non_empty(document_id) {
            let document_id = document_id.to_string();
            return Ok(if view_mode == Some("preview") {
                WidgetMode::PreviewDocument { document_id }
            } else {
                WidgetMode::ProcessDocument { document_id }
            });
        }
        match non_empty(template_id) {
            Some(template_id) => Ok(WidgetMode::NewDocument {
                template_id: template_id.to_string(),
            }),
            None => Err(ConsoleError::InvalidTarget(
                "템플릿 ID 또는 문서 ID가 필요합니다".to_string(),
            )),
        }
    }

    /// Route parameters of the template editor; anything but `duplicate` edits.
    pub fn for_template_editor(
        template_id: Option<&str>,
        mode: Option<&str>,
    ) -> Result<Self, ConsoleError> {
        let template_id = non_empty(template_id)
            .ok_or_else(|| ConsoleError::InvalidTarget("템플릿 ID가 필요합니다".to_string()))?
            .to_string();
        Ok(if mode == Some("duplicate") {
            WidgetMode::DuplicateTemplate { template_id }
        } else {
            WidgetMode::EditTemplate { template_id }
        })
    }

    /// Two-digit vendor mode code.
    pub fn code(&self) -> &'static str {
        match self {
            WidgetMode::NewDocument { .. } => "01",
            WidgetMode::ProcessDocument { .. } | WidgetMode::EditTemplate { .. } => "02",
            WidgetMode::PreviewDocument { .. } | WidgetMode::DuplicateTemplate { .. } => "03",
        }
    }

    pub fn sdk(&self) -> VendorSdk {
        match self {
            WidgetMode::EditTemplate { .. } | WidgetMode::DuplicateTemplate { .. } => {
                VendorSdk::Template
            }
            _ => VendorSdk::Document,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WidgetMode::NewDocument { .. } => "새 문서 작성",
            WidgetMode::ProcessDocument { .. } | WidgetMode::PreviewDocument { .. } => {
                "문서 뷰어"
            }
            WidgetMode::EditTemplate { .. } => "템플릿 수정",
            WidgetMode::DuplicateTemplate { .. } => "템플릿 복제",
        }
    }

    /// Message shown once the vendor reports completion, if any.
    pub fn completion_notice(&self) -> Option<&'static str> {
        match self {
            WidgetMode::EditTemplate { .. } => Some("템플릿이 수정되었습니다."),
            WidgetMode::DuplicateTemplate { .. } => Some("템플릿이 복제되었습니다."),
            _ => None,
        }
    }

    fn mode_options(&self) -> ModeOptions {
        let mut options = ModeOptions {
            kind: self.code().to_string(),
            template_id: None,
            document_id: None,
            template_type: None,
        };
        match self {
            WidgetMode::NewDocument { template_id } => {
                options.template_id = Some(template_id.clone());
            }
            WidgetMode::EditTemplate { template_id }
            | WidgetMode::DuplicateTemplate { template_id } => {
                options.template_id = Some(template_id.clone());
                options.template_type = Some("form".to_string());
            }
            WidgetMode::ProcessDocument { document_id }
            | WidgetMode::PreviewDocument { document_id } => {
                options.document_id = Some(document_id.clone());
            }
        }
        options
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompanyOptions {
    pub id: String,
    pub country_code: String,
    pub user_key: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserOptions {
    /// Member user type; the template SDK takes no type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModeOptions {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutOptions {
    pub lang_code: String,
    pub header: bool,
    pub footer: bool,
}

impl LayoutOptions {
    pub fn new(config: &ConsoleConfig, header: bool, footer: bool) -> Self {
        Self {
            lang_code: config.lang_code.clone(),
            header,
            footer,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrefillField {
    pub id: String,
    pub value: String,
}

/// Values written into a new document before the user sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prefill {
    pub document_name: String,
    #[serde(default)]
    pub fields: Vec<PrefillField>,
}

/// Option object passed to the vendor bind call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WidgetOptions {
    pub company: CompanyOptions,
    pub user: UserOptions,
    pub mode: ModeOptions,
    pub layout: LayoutOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill: Option<Prefill>,
}

impl WidgetOptions {
    pub fn build(
        token: &AuthToken,
        mode: &WidgetMode,
        config: &ConsoleConfig,
        layout: LayoutOptions,
    ) -> Self {
        let user_type = match mode.sdk() {
            VendorSdk::Document => Some("01".to_string()),
            VendorSdk::Template => None,
        };
        Self {
            company: CompanyOptions {
                id: token.company_id.clone(),
                country_code: config.company_country_code.clone(),
                user_key: token.user_key.clone().unwrap_or_default(),
            },
            user: UserOptions {
                kind: user_type,
                id: token.user_id.clone(),
                access_token: token.access_token.clone(),
                refresh_token: token.refresh_token.clone(),
            },
            mode: mode.mode_options(),
            layout,
            prefill: None,
        }
    }

    pub fn with_prefill(mut self, prefill: Prefill) -> Self {
        self.prefill = Some(prefill);
        self
    }
}

/// Vendor payloads mix numbers, strings and objects for the same key.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(code)) => Some(code),
        Some(other) => Some(other.to_string()),
    })
}

/// Payload of the vendor's success/error/action callbacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VendorResponse {
    #[serde(default, deserialize_with = "lenient_text")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub document_id: Option<String>,
}

/// Classified callback result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOutcome {
    Completed { document_id: Option<String> },
    /// Success callback without the completion code.
    Pending { code: Option<String> },
    /// The user closed the widget; nothing to show.
    Cancelled,
    Failed { code: Option<String>, message: String },
}

impl WidgetOutcome {
    pub fn from_success(response: &VendorResponse) -> Self {
        if response.code.as_deref() == Some(COMPLETION_CODE) {
            WidgetOutcome::Completed {
                document_id: response.document_id.clone(),
            }
        } else {
            WidgetOutcome::Pending {
                code: response.code.clone(),
            }
        }
    }

    pub fn from_error(response: &VendorResponse) -> Self {
        if response.code.as_deref() == Some(USER_CANCEL_CODE) {
            return WidgetOutcome::Cancelled;
        }
        WidgetOutcome::Failed {
            code: response.code.clone(),
            message: response
                .message
                .clone()
                .unwrap_or_else(|| "알 수 없는 오류".to_string()),
        }
    }

    /// Text to surface to the user, `None` when nothing should be shown.
    pub fn user_message(&self) -> Option<String> {
        match self {
            WidgetOutcome::Failed {
                code: Some(code),
                message,
            } => Some(format!("오류 발생: {message} ({code})")),
            WidgetOutcome::Failed {
                code: None,
                message,
            } => Some(format!("오류 발생: {message}")),
            _ => None,
        }
    }
}

/// Why the widget could not be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetFailure {
    DependencyTimeout,
    SdkLoadFailed,
    TokenFetchFailed(String),
    ConstructFailed(String),
}

impl WidgetFailure {
    /// Failures tied to one open; teardown clears them.
    fn is_per_open(&self) -> bool {
        matches!(
            self,
            WidgetFailure::TokenFetchFailed(_) | WidgetFailure::ConstructFailed(_)
        )
    }

    pub fn message(&self) -> String {
        match self {
            WidgetFailure::DependencyTimeout => "스크립트 로딩 시간이 초과되었습니다.".to_string(),
            WidgetFailure::SdkLoadFailed => "전자서명 SDK를 불러오지 못했습니다.".to_string(),
            WidgetFailure::TokenFetchFailed(reason) => {
                format!("토큰 발급에 실패했습니다. ({reason})")
            }
            WidgetFailure::ConstructFailed(reason) => {
                format!("전자서명 화면을 열지 못했습니다. ({reason})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetPhase {
    Idle,
    WaitingDependency,
    WaitingSdk,
    /// SDK usable; nothing has asked for a widget yet.
    Ready,
    WaitingToken,
    Constructed,
    Failed(WidgetFailure),
}

/// Everything the host needs to build the vendor instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructPlan {
    pub sdk: VendorSdk,
    /// Container to empty before the instance is created.
    pub container_id: String,
    pub options: WidgetOptions,
    /// Pause between construction and the bind/open calls.
    pub open_delay: Duration,
}

/// Side effects the host performs on behalf of the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEffect {
    PollDependency,
    InjectSdk(VendorSdk),
    FetchToken,
    Construct(ConstructPlan),
    Report(WidgetFailure),
}

/// Bootstrap sequence for one widget container.
///
/// Three readiness signals (dependency, SDK, token) are fed in as events;
/// the single construction happens when all three are present and no
/// instance is held. Each transition returns the effects to run.
#[derive(Debug, Clone)]
pub struct WidgetLifecycle {
    mode: WidgetMode,
    container_id: String,
    config: ConsoleConfig,
    layout: LayoutOptions,
    prefill: Option<Prefill>,
    polling: bool,
    dependency_ready: bool,
    sdk_requested: bool,
    sdk_ready: bool,
    token_requested: bool,
    token: Option<AuthToken>,
    instance: bool,
    failure: Option<WidgetFailure>,
}

impl WidgetLifecycle {
    pub fn new(mode: WidgetMode, container_id: impl Into<String>, config: &ConsoleConfig) -> Self {
        let layout = LayoutOptions::new(config, true, false);
        Self {
            mode,
            container_id: container_id.into(),
            config: config.clone(),
            layout,
            prefill: None,
            polling: false,
            dependency_ready: false,
            sdk_requested: false,
            sdk_ready: false,
            token_requested: false,
            token: None,
            instance: false,
            failure: None,
        }
    }

    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_prefill(mut self, prefill: Prefill) -> Self {
        self.prefill = Some(prefill);
        self
    }

    pub fn mode(&self) -> &WidgetMode {
        &self.mode
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn sdk_ready(&self) -> bool {
        self.sdk_ready
    }

    pub fn has_instance(&self) -> bool {
        self.instance
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub fn failure(&self) -> Option<&WidgetFailure> {
        self.failure.as_ref()
    }

    pub fn phase(&self) -> WidgetPhase {
        if let Some(failure) = &self.failure {
            return WidgetPhase::Failed(failure.clone());
        }
        if self.instance {
            WidgetPhase::Constructed
        } else if !self.dependency_ready {
            if self.polling {
                WidgetPhase::WaitingDependency
            } else {
                WidgetPhase::Idle
            }
        } else if !self.sdk_ready {
            WidgetPhase::WaitingSdk
        } else if self.token_requested {
            WidgetPhase::WaitingToken
        } else {
            WidgetPhase::Ready
        }
    }

    /// Page or modal mounted: start waiting for the dependency.
    pub fn mount(&mut self) -> Vec<WidgetEffect> {
        if self.polling || self.dependency_ready || self.failure.is_some() {
            return Vec::new();
        }
        self.polling = true;
        vec![WidgetEffect::PollDependency]
    }

    /// The dependency global appeared. `sdk_present` tells whether the SDK
    /// constructor is already on the page from an earlier mount.
    pub fn dependency_detected(&mut self, sdk_present: bool) -> Vec<WidgetEffect> {
        self.polling = false;
        self.dependency_ready = true;
        if sdk_present {
            self.sdk_ready = true;
            return self.try_construct();
        }
        if self.sdk_requested || self.sdk_ready {
            return Vec::new();
        }
        self.sdk_requested = true;
        vec![WidgetEffect::InjectSdk(self.mode.sdk())]
    }

    pub fn dependency_timed_out(&mut self) -> Vec<WidgetEffect> {
        self.polling = false;
        if self.dependency_ready {
            return Vec::new();
        }
        tracing::warn!(container = %self.container_id, "dependency never appeared");
        self.fail(WidgetFailure::DependencyTimeout)
    }

    pub fn sdk_loaded(&mut self) -> Vec<WidgetEffect> {
        self.sdk_ready = true;
        self.try_construct()
    }

    pub fn sdk_failed(&mut self) -> Vec<WidgetEffect> {
        tracing::warn!(sdk = ?self.mode.sdk(), "vendor SDK failed to load");
        self.fail(WidgetFailure::SdkLoadFailed)
    }

    /// Widget requested (page load or modal open): one token fetch per open.
    pub fn open(&mut self) -> Vec<WidgetEffect> {
        if self.instance || self.token_requested || self.token.is_some() {
            return Vec::new();
        }
        if self.failure.is_some() {
            return Vec::new();
        }
        self.token_requested = true;
        vec![WidgetEffect::FetchToken]
    }

    /// A token that arrives after teardown is ignored.
    pub fn token_received(&mut self, token: AuthToken) -> Vec<WidgetEffect> {
        if !self.token_requested {
            tracing::debug!("ignoring token for a closed widget");
            return Vec::new();
        }
        self.token_requested = false;
        if !token.has_user_key() {
            tracing::warn!("token bundle has no company user key");
        }
        self.token = Some(token);
        self.try_construct()
    }

    pub fn token_failed(&mut self, reason: impl Into<String>) -> Vec<WidgetEffect> {
        if !self.token_requested {
            return Vec::new();
        }
        self.token_requested = false;
        let reason = reason.into();
        tracing::error!(%reason, "token fetch failed");
        self.fail(WidgetFailure::TokenFetchFailed(reason))
    }

    /// The host could not create or open the vendor instance.
    pub fn construction_failed(&mut self, reason: impl Into<String>) -> Vec<WidgetEffect> {
        let reason = reason.into();
        tracing::error!(%reason, "vendor widget construction failed");
        self.fail(WidgetFailure::ConstructFailed(reason))
    }

    /// Modal or page closed: drop the instance handle and the token so the
    /// next open constructs from scratch.
    pub fn teardown(&mut self) {
        self.instance = false;
        self.token = None;
        self.token_requested = false;
        if self.failure.as_ref().is_some_and(WidgetFailure::is_per_open) {
            self.failure = None;
        }
    }

    fn fail(&mut self, failure: WidgetFailure) -> Vec<WidgetEffect> {
        if self.failure.is_some() {
            return Vec::new();
        }
        self.failure = Some(failure.clone());
        vec![WidgetEffect::Report(failure)]
    }

    fn try_construct(&mut self) -> Vec<WidgetEffect> {
        if self.instance || self.failure.is_some() || !self.dependency_ready || !self.sdk_ready {
            return Vec::new();
        }
        let Some(token) = &self.token else {
            return Vec::new();
        };
        let mut options =
            WidgetOptions::build(token, &self.mode, &self.config, self.layout.clone());
        if let Some(prefill) = &self.prefill {
            options = options.with_prefill(prefill.clone());
        }
        self.instance = true;
        tracing::debug!(container = %self.container_id, mode = self.mode.code(), "constructing widget");
        vec![WidgetEffect::Construct(ConstructPlan {
            sdk: self.mode.sdk(),
            container_id: self.container_id.clone(),
            options,
            open_delay: Duration::from_millis(u64::from(self.config.open_delay_ms)),
        })]
    }
}
