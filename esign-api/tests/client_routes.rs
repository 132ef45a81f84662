//! Drives `ApiClient` against a local listener that records each request
//! and answers with a canned reply.

use esign_api::{ApiClient, ApiError};
use esign_core::{ConsoleConfig, DocumentFilter, DocumentListState};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Recorded {
    method: String,
    target: String,
    authorization: Option<String>,
    body: Option<Value>,
}

fn header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|at| at + 4)
}

async fn read_request(socket: &mut TcpStream) -> Recorded {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_len = loop {
        let read = socket.read(&mut chunk).await.expect("요청 읽기 실패");
        assert!(read > 0, "요청 헤더 전에 연결이 끊겼습니다");
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(end) = header_end(&buffer) {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..head_len]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while buffer.len() < head_len + content_length {
        let read = socket.read(&mut chunk).await.expect("본문 읽기 실패");
        assert!(read > 0, "본문 전에 연결이 끊겼습니다");
        buffer.extend_from_slice(&chunk[..read]);
    }
    let body = (content_length > 0).then(|| {
        serde_json::from_slice(&buffer[head_len..head_len + content_length]).expect("JSON 본문")
    });

    Recorded {
        method,
        target,
        authorization,
        body,
    }
}

/// Answers one connection per reply, in order. `Value::Null` sends an empty body.
async fn serve(replies: Vec<(u16, Value)>) -> (ConsoleConfig, JoinHandle<Vec<Recorded>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for (status, body) in replies {
            let (mut socket, _) = listener.accept().await.expect("accept");
            seen.push(read_request(&mut socket).await);
            let body = if body.is_null() {
                String::new()
            } else {
                body.to_string()
            };
            let response = format!(
                "HTTP/1.1 {status} OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.expect("응답 쓰기 실패");
            let _ = socket.shutdown().await;
        }
        seen
    });
    let config = ConsoleConfig {
        api_base: format!("http://{addr}/api/v1"),
        ..ConsoleConfig::default()
    };
    (config, handle)
}

fn ok(data: Value) -> (u16, Value) {
    (200, json!({ "success": true, "message": "ok", "data": data }))
}

#[tokio::test]
async fn admin_routes_use_expected_method_path_and_body() {
    let (config, server) = serve(vec![
        ok(json!({ "templates": [{ "form_id": "f1", "form_name": "휴가신청서" }] })),
        ok(json!({ "form_id": "f2" })),
        (204, Value::Null),
        ok(json!({ "members": [{ "id": "m1" }, { "id": "m2" }] })),
        ok(json!({ "id": "m3" })),
        ok(json!({ "id": "m1", "name": "변경" })),
        (204, Value::Null),
        ok(json!([{ "id": "g1" }])),
        ok(json!({ "id": "g2" })),
        ok(json!({ "id": "g1" })),
        (204, Value::Null),
        ok(json!({ "document": { "id": "new-doc" } })),
    ])
    .await;
    let client = ApiClient::new(config).with_bearer("session-1");

    let templates = client.templates().await.expect("templates");
    assert_eq!(templates[0].name, "휴가신청서");
    let copy = client.duplicate_template("f1").await.expect("duplicate");
    assert_eq!(copy["form_id"], "f2");
    client.delete_template("f1").await.expect("delete template");

    assert_eq!(client.members().await.expect("members").len(), 2);
    let member = json!({ "id": "m3", "name": "신입" });
    assert_eq!(client.create_member(&member).await.expect("create")["id"], "m3");
    let patch = json!({ "name": "변경" });
    client.update_member("m1", &patch).await.expect("update");
    client.delete_member("m1").await.expect("delete member");

    assert_eq!(client.groups().await.expect("groups").len(), 1);
    let group = json!({ "name": "인사팀" });
    client.create_group(&group).await.expect("create group");
    client.update_group("g1", &group).await.expect("update group");
    client.delete_group("g1").await.expect("delete group");

    let created = client.create_document("tpl-leave").await.expect("create document");
    assert_eq!(created, "new-doc");

    let seen = server.await.expect("server");
    let routes: Vec<(&str, &str)> = seen
        .iter()
        .map(|request| (request.method.as_str(), request.target.as_str()))
        .collect();
    assert_eq!(
        routes,
        vec![
            ("GET", "/api/v1/eformsign/templates"),
            ("POST", "/api/v1/eformsign/templates/f1/duplicate"),
            ("DELETE", "/api/v1/eformsign/templates/f1"),
            ("GET", "/api/v1/eformsign/company/members"),
            ("POST", "/api/v1/eformsign/company/members"),
            ("PATCH", "/api/v1/eformsign/company/members/m1"),
            ("DELETE", "/api/v1/eformsign/company/members/m1"),
            ("GET", "/api/v1/eformsign/company/groups"),
            ("POST", "/api/v1/eformsign/company/groups"),
            ("PATCH", "/api/v1/eformsign/company/groups/g1"),
            ("DELETE", "/api/v1/eformsign/company/groups/g1"),
            ("POST", "/api/v1/eformsign/documents"),
        ]
    );
    assert!(seen
        .iter()
        .all(|request| request.authorization.as_deref() == Some("Bearer session-1")));

    assert_eq!(seen[1].body, None);
    assert_eq!(seen[4].body.as_ref(), Some(&member));
    assert_eq!(seen[5].body.as_ref(), Some(&patch));
    assert_eq!(seen[8].body.as_ref(), Some(&group));
    assert_eq!(seen[11].body, Some(json!({ "templateId": "tpl-leave" })));
}

#[tokio::test]
async fn login_then_me() {
    let (config, server) = serve(vec![
        ok(json!({ "accessToken": "bearer-123" })),
        ok(json!({ "id": "kim@example.com", "name": "김민수" })),
    ])
    .await;

    let anonymous = ApiClient::new(config.clone());
    let token = anonymous.login("kim", "pw").await.expect("login");
    assert_eq!(token, "bearer-123");
    let me = ApiClient::new(config).with_bearer(token).me().await.expect("me");
    assert_eq!(me["name"], "김민수");

    let seen = server.await.expect("server");
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].target, "/api/v1/auth/login");
    assert_eq!(seen[0].authorization, None);
    assert_eq!(seen[0].body, Some(json!({ "loginId": "kim", "password": "pw" })));
    assert_eq!(seen[1].target, "/api/v1/members/me");
    assert_eq!(seen[1].authorization.as_deref(), Some("Bearer bearer-123"));
}

#[tokio::test]
async fn list_query_and_error_statuses() {
    let (config, server) = serve(vec![
        ok(json!({ "documents": [{ "id": "d1" }], "total_rows": 1 })),
        (401, json!({ "message": "expired" })),
        (500, json!({ "success": false, "message": "provider down" })),
    ])
    .await;
    let client = ApiClient::new(config);

    let mut state = DocumentListState::new(DocumentFilter::Completed, 20);
    let query = state.refresh();
    let page = client.documents(&query).await.expect("documents");
    assert_eq!(page.documents[0].id, "d1");

    let expired = client.widget_token().await.expect_err("401");
    assert!(expired.requires_login());

    let failed = client.document("d1").await.expect_err("500");
    assert!(matches!(
        failed,
        ApiError::Http { status: 500, ref message } if message == "provider down"
    ));
    assert!(!failed.requires_login());

    let seen = server.await.expect("server");
    let expected_query: Vec<String> = query
        .query_pairs()
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    assert_eq!(
        seen[0].target,
        format!("/api/v1/eformsign/documents?{}", expected_query.join("&"))
    );
    assert_eq!(seen[1].target, "/api/v1/eformsign/token");
    assert_eq!(seen[2].target, "/api/v1/eformsign/documents/d1");
}
