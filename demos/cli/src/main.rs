use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use esign_api::ApiClient;
use esign_core::status::{summary_label, UNKNOWN_STATUS_LABEL};
use esign_core::{
    ApplyOutcome, ConsoleConfig, Document, DocumentFilter, DocumentListState, DocumentStatus,
    LeaveRequest, APPLICANT_APPROVAL_LINE, RECEPTION_APPROVAL_LINE,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "esign-cli",
    about = "전자서명 콘솔 백엔드를 터미널에서 조회합니다."
)]
struct Args {
    /// Backend base URL including the API prefix.
    #[arg(long, default_value = "http://localhost:8080/api/v1")]
    base_url: String,

    /// Session bearer token.
    #[arg(long, env = "ESIGN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Page size for document listings.
    #[arg(long, default_value_t = 20)]
    limit: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a widget token bundle and show who it belongs to.
    Token,
    /// List one page of documents.
    List {
        /// todo, inprogress, completed or all.
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Restrict to one form template.
        #[arg(long)]
        template: Option<String>,
    },
    /// Show one document with its fields and history.
    Show { document_id: String },
    /// Print the status code taxonomy.
    Statuses,
    /// Log in and print the session token to pass as `--token`.
    Login {
        login_id: String,
        #[arg(long, env = "ESIGN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the logged-in member.
    Me,
    /// Start a document from a template and print its id.
    CreateDocument { template_id: String },
    /// Form templates.
    Templates {
        #[command(subcommand)]
        action: Option<TemplateAction>,
    },
    /// Company members.
    Members {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Company groups.
    Groups {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateAction {
    Duplicate { template_id: String },
    Delete { template_id: String },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    List,
    /// Create from a JSON object.
    Create { body: String },
    /// Patch one entry with a JSON object.
    Update { id: String, body: String },
    Delete { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directory {
    Members,
    Groups,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ConsoleConfig {
        api_base: args.base_url.clone(),
        page_limit: args.limit,
        ..ConsoleConfig::default()
    };
    let client = match &args.token {
        Some(token) => ApiClient::new(config.clone()).with_bearer(token),
        None => ApiClient::new(config.clone()),
    };

    match args.command {
        Command::Token => {
            let token = client
                .widget_token()
                .await
                .context("토큰 발급에 실패했습니다")?;
            println!("company: {}", token.company_id);
            println!("user: {}", token.user_id);
            if !token.has_user_key() {
                println!("Warning: User Key missing");
            }
        }
        Command::List {
            filter,
            page,
            template,
        } => list(&client, &config, filter.as_deref(), page, template).await?,
        Command::Show { document_id } => {
            let document = client
                .document(&document_id)
                .await
                .with_context(|| format!("문서 {document_id}를 불러오지 못했습니다"))?;
            print_document(&document);
        }
        Command::Statuses => {
            for status in DocumentStatus::ALL {
                println!(
                    "{}  {:<10}  {}",
                    status.code(),
                    status.tone().level(),
                    status.label()
                );
            }
            println!("---   {:<10}  {UNKNOWN_STATUS_LABEL}", "fallback");
        }
        Command::Login { login_id, password } => {
            let token = client
                .login(&login_id, &password)
                .await
                .context("로그인에 실패했습니다")?;
            println!("{token}");
        }
        Command::Me => {
            let me = client.me().await.context("회원 정보 조회에 실패했습니다")?;
            print_json(&me)?;
        }
        Command::CreateDocument { template_id } => {
            let document_id = client
                .create_document(&template_id)
                .await
                .with_context(|| format!("템플릿 {template_id}로 문서를 만들지 못했습니다"))?;
            println!("{document_id}");
        }
        Command::Templates { action } => templates(&client, action).await?,
        Command::Members { action } => directory(&client, Directory::Members, action).await?,
        Command::Groups { action } => directory(&client, Directory::Groups, action).await?,
    }

    Ok(())
}

async fn list(
    client: &ApiClient,
    config: &ConsoleConfig,
    filter: Option<&str>,
    page: u32,
    template: Option<String>,
) -> anyhow::Result<()> {
    let filter = DocumentFilter::from_param(filter);
    let mut state = DocumentListState::new(filter, config.page_limit);
    if let Some(template) = template {
        state = state.with_template(template);
    }

    // The first fetch learns the total; only then can `page` be validated.
    let mut query = state.refresh();
    let now = Utc::now().timestamp_millis();
    loop {
        let result = client
            .documents(&query)
            .await
            .context("문서 목록 조회에 실패했습니다")?;
        match state.apply(&query, result) {
            ApplyOutcome::Refetch(next) => query = next,
            _ if page != state.window().page() => {
                tracing::debug!(page, total = state.window().total_count(), "jumping to page");
                query = state.select_page(page).context("페이지 범위를 벗어났습니다")?;
            }
            _ => break,
        }
    }

    let window = state.window();
    println!("{} ({}건)", filter.title(), window.total_count());
    for document in state.documents() {
        let code = document.current_status.status_type.as_str();
        println!(
            "{}  {:<8}  {:<30}  {:<20}  이력 {}  {}일",
            document.id,
            summary_label(code),
            document.document_name,
            document.handler_names(),
            document.history_count(),
            document.elapsed_days(now),
        );
    }
    match window.showing_range() {
        Some((first, last)) => println!(
            "{first}-{last} / {} (page {}/{})",
            window.total_count(),
            window.page(),
            window.total_pages()
        ),
        None => println!("문서가 없습니다."),
    }
    Ok(())
}

async fn templates(client: &ApiClient, action: Option<TemplateAction>) -> anyhow::Result<()> {
    match action {
        None => {
            let templates = client.templates().await.context("템플릿 조회에 실패했습니다")?;
            for template in templates {
                let version = template
                    .version
                    .map(|version| format!("v{version}"))
                    .unwrap_or_default();
                println!("{}  {}  {version}", template.form_id, template.name);
            }
        }
        Some(TemplateAction::Duplicate { template_id }) => {
            let copy = client
                .duplicate_template(&template_id)
                .await
                .with_context(|| format!("템플릿 {template_id} 복제에 실패했습니다"))?;
            print_json(&copy)?;
        }
        Some(TemplateAction::Delete { template_id }) => {
            client
                .delete_template(&template_id)
                .await
                .with_context(|| format!("템플릿 {template_id} 삭제에 실패했습니다"))?;
            println!("deleted {template_id}");
        }
    }
    Ok(())
}

async fn directory(
    client: &ApiClient,
    directory: Directory,
    action: AdminAction,
) -> anyhow::Result<()> {
    match action {
        AdminAction::List => {
            let rows = match directory {
                Directory::Members => client.members().await,
                Directory::Groups => client.groups().await,
            }
            .context("목록 조회에 실패했습니다")?;
            for row in rows {
                println!("{row}");
            }
        }
        AdminAction::Create { body } => {
            let body = parse_body(&body)?;
            let created = match directory {
                Directory::Members => client.create_member(&body).await,
                Directory::Groups => client.create_group(&body).await,
            }
            .context("생성에 실패했습니다")?;
            print_json(&created)?;
        }
        AdminAction::Update { id, body } => {
            let body = parse_body(&body)?;
            let updated = match directory {
                Directory::Members => client.update_member(&id, &body).await,
                Directory::Groups => client.update_group(&id, &body).await,
            }
            .with_context(|| format!("{id} 수정에 실패했습니다"))?;
            print_json(&updated)?;
        }
        AdminAction::Delete { id } => {
            match directory {
                Directory::Members => client.delete_member(&id).await,
                Directory::Groups => client.delete_group(&id).await,
            }
            .with_context(|| format!("{id} 삭제에 실패했습니다"))?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn parse_body(raw: &str) -> anyhow::Result<Value> {
    let body: Value = serde_json::from_str(raw).context("JSON 본문을 해석할 수 없습니다")?;
    anyhow::ensure!(body.is_object(), "JSON 본문은 객체여야 합니다");
    Ok(body)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_document(document: &Document) {
    println!("{} {}", document.id, document.document_name);
    let status = document
        .status()
        .map(DocumentStatus::label)
        .unwrap_or(document.current_status.step_name.as_str());
    println!("상태: {status}");
    println!("처리자: {}", document.handler_names());

    let fields = document.field_map();
    if !fields.is_empty() {
        let leave = LeaveRequest::new(fields);
        println!("신청자: {}", leave.applicant());
        println!("기간: {}", leave.period());
        for (title, keys) in [
            ("신청부서", &APPLICANT_APPROVAL_LINE[..]),
            ("접수부서", &RECEPTION_APPROVAL_LINE[..]),
        ] {
            let line: Vec<String> = leave
                .approval_line(keys)
                .into_iter()
                .map(|(role, approver)| format!("{role}={approver}"))
                .collect();
            println!("{title}: {}", line.join(", "));
        }
    }

    for entry in &document.histories {
        let at = entry
            .executed_at()
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {at}  {}  {}",
            entry.action_label().unwrap_or_default(),
            entry.step_name.as_deref().unwrap_or("")
        );
    }
}


#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn admin_subcommands_parse() {
        let args = Args::try_parse_from([
            "esign-cli",
            "--token",
            "t",
            "members",
            "update",
            "m1",
            r#"{"name":"변경"}"#,
        ])
        .expect("members update");
        assert!(matches!(
            args.command,
            Command::Members {
                action: AdminAction::Update { ref id, .. }
            } if id == "m1"
        ));

        let args = Args::try_parse_from(["esign-cli", "templates"]).expect("templates");
        assert!(matches!(args.command, Command::Templates { action: None }));

        let args = Args::try_parse_from(["esign-cli", "templates", "duplicate", "f1"])
            .expect("duplicate");
        assert!(matches!(
            args.command,
            Command::Templates {
                action: Some(TemplateAction::Duplicate { .. })
            }
        ));
    }

    #[test]
    fn body_must_be_a_json_object() {
        assert_eq!(
            parse_body(r#"{"name":"인사팀"}"#).expect("object")["name"],
            "인사팀"
        );
        assert!(parse_body("[1, 2]").is_err());
        assert!(parse_body("name=인사팀").is_err());
    }
}
