use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taxchat::api::ApiMode;
use taxchat::storage::{ACTIVE_SESSION_KEY, AUTH_TOKEN_KEY};
use taxchat::{execute_command, AppContext, Backend, Cli, ClientConfig, Commands, LocalStore};

fn context(api_url: &str, data_dir: &Path, mode: ApiMode) -> AppContext {
    let config = ClientConfig {
        api_url: api_url.to_string(),
        mode,
        data_dir: data_dir.to_path_buf(),
        timeout: Duration::from_secs(5),
        verbose: false,
        log_http: false,
    };
    let store = LocalStore::open(data_dir).unwrap().shared();
    let backend = Backend::from_config(&config).unwrap();
    AppContext::new(config, store, backend)
}

fn cli(args: &[&str]) -> Cli {
    use clap::Parser;
    let mut argv = vec!["taxchat"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

async fn mount_session(server: &MockServer, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/new-session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": session_id })))
        .mount(server)
        .await;
}

async fn mount_answer(server: &MockServer, session_id: &str, question: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({ "session_id": session_id, "message": question })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "VAT rises to 10%.",
            "citations": [],
            "route": "qa",
            "refusal": false,
            "timestamp": "2024-07-01T10:00:05"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_chat_over_http_persists_state() {
    let server = MockServer::start().await;
    mount_session(&server, "srv-1").await;
    mount_answer(&server, "srv-1", "What are the new VAT rates?").await;
    let temp = TempDir::new().unwrap();

    let ctx = context(&format!("{}/api", server.uri()), temp.path(), ApiMode::Http);
    let mut chat = ctx.chat_session();
    chat.initialize().await.unwrap();
    assert!(chat.send_message("What are the new VAT rates?").await.unwrap());

    assert_eq!(chat.messages().len(), 2);
    assert_eq!(chat.messages()[1].text, "VAT rises to 10%.");
    assert_eq!(chat.error(), None);

    // A fresh process sees the same recent chats and active session
    let reopened = LocalStore::open(temp.path()).unwrap();
    assert_eq!(reopened.get(ACTIVE_SESSION_KEY).as_deref(), Some("srv-1"));
    let recent = execute_command(&cli(&["recent"]), &Commands::Recent, &context(
        &format!("{}/api", server.uri()),
        temp.path(),
        ApiMode::Http,
    ))
    .await
    .unwrap();
    assert!(recent.contains("What are the new VAT rates?"));
}

#[tokio::test]
async fn test_unreachable_backend_uses_fallback_session_and_error_bubble() {
    let temp = TempDir::new().unwrap();
    let ctx = context("http://127.0.0.1:9/api", temp.path(), ApiMode::Http);

    let mut chat = ctx.chat_session();
    chat.initialize().await.unwrap();
    assert!(chat.session_id().starts_with("fallback_"));

    chat.send_message("hello").await.unwrap();
    assert!(chat.error().unwrap().starts_with("Failed to send message:"));
    assert!(chat.messages().last().unwrap().is_error);
}

#[tokio::test]
async fn test_login_token_is_sent_with_chat_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-123",
            "token_type": "bearer",
            "expires_in": 1800,
            "user": {"id": 1, "email": "ada@example.ng", "username": "ada",
                     "full_name": null, "is_verified": false, "created_at": "2024-07-01T09:00:00"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/new-session"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "owned-1" })))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let ctx = context(&format!("{}/api", server.uri()), temp.path(), ApiMode::Http);
    ctx.store.lock().await.set(ACTIVE_SESSION_KEY, "anon-1").unwrap();

    let output = execute_command(
        &cli(&["login", "ada@example.ng", "--password", "secret123"]),
        &Commands::Login { email: "ada@example.ng".to_string() },
        &ctx,
    )
    .await
    .unwrap();
    assert!(output.contains("ada@example.ng"));
    assert_eq!(ctx.store.lock().await.get(AUTH_TOKEN_KEY).as_deref(), Some("tok-123"));
    assert_eq!(ctx.store.lock().await.get(ACTIVE_SESSION_KEY), None);

    // A new context picks the stored token up for chat requests
    let ctx = context(&format!("{}/api", server.uri()), temp.path(), ApiMode::Http);
    ctx.apply_stored_token().await;
    let mut chat = ctx.chat_session();
    chat.initialize().await.unwrap();
    assert_eq!(chat.session_id(), "owned-1");
}

#[tokio::test]
async fn test_new_command_creates_session_with_stored_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/new-session"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "owned-1" })))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let ctx = context(&format!("{}/api", server.uri()), temp.path(), ApiMode::Http);
    ctx.store.lock().await.set(AUTH_TOKEN_KEY, "tok-123").unwrap();

    let output = execute_command(&cli(&["new"]), &Commands::New, &ctx).await.unwrap();
    assert!(output.contains("owned-1"));
    assert_eq!(ctx.store.lock().await.get(ACTIVE_SESSION_KEY).as_deref(), Some("owned-1"));
}

#[tokio::test]
async fn test_mock_mode_answers_offline_and_has_no_accounts() {
    let temp = TempDir::new().unwrap();
    let ctx = context("http://unused.invalid/api", temp.path(), ApiMode::Mock);

    let mut chat = ctx.chat_session();
    chat.initialize().await.unwrap();
    assert!(chat.session_id().starts_with("mock_"));

    chat.send_message("How will small businesses be affected?").await.unwrap();
    assert_eq!(chat.messages()[1].citations[0].chunk_id, "sme_001");

    assert!(ctx.auth_session().is_err());
}
