use chatline_core::auth::{AuthApi, NewAccount};
use chatline_core::chat::{
    ChatApi, ChatSession, Message, MessageRole, ReplyEvent, ReplyRequest,
};
use chatline_core::config::ClientConfig;
use chatline_core::error::ChatlineError;
use chatline_infrastructure::HttpBackend;
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

/// Mock backend for testing the HTTP client
struct BackendMockServer {
    server: MockServer,
}

impl BackendMockServer {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn backend(&self) -> HttpBackend {
        let config = ClientConfig {
            base_url: format!("{}/", self.server.uri()),
            request_timeout_secs: Some(5),
            ..ClientConfig::default()
        };
        HttpBackend::new(&config).unwrap()
    }

    async fn mount(&self, mock: Mock) {
        mock.mount(&self.server).await;
    }
}

fn user_json() -> serde_json::Value {
    json!({"id": 3, "username": "amy", "email": "amy@example.com", "is_active": true})
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_login_posts_form_and_returns_grant() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("username=amy"))
            .and(body_string_contains("password=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-abc",
                "token_type": "bearer",
                "user": user_json()
            }))),
    )
    .await;

    let grant = mock.backend().login("amy", "s3cret").await.unwrap();

    assert_eq!(grant.access_token, "jwt-abc");
    assert_eq!(grant.user.username, "amy");
}

#[tokio::test]
async fn test_login_error_carries_detail() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "用户名或密码错误"})),
            ),
    )
    .await;

    let err = mock.backend().login("amy", "wrong").await.unwrap_err();

    assert_eq!(err, ChatlineError::http(401, "用户名或密码错误"));
}

#[tokio::test]
async fn test_login_validation_error_has_empty_message() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": [{"loc": ["body", "password"], "msg": "field required"}]
            }))),
    )
    .await;

    let err = mock.backend().login("amy", "").await.unwrap_err();

    assert_eq!(err, ChatlineError::http(422, ""));
}

#[tokio::test]
async fn test_login_malformed_body_is_invalid_response() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>")),
    )
    .await;

    let err = mock.backend().login("amy", "s3cret").await.unwrap_err();

    assert!(matches!(err, ChatlineError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let config = ClientConfig {
        // Port 9 (discard) is closed on test machines
        base_url: "http://127.0.0.1:9".to_string(),
        request_timeout_secs: Some(2),
        ..ClientConfig::default()
    };
    let backend = HttpBackend::new(&config).unwrap();

    let err = backend.login("amy", "s3cret").await.unwrap_err();

    assert!(err.is_network());
}

#[tokio::test]
async fn test_verify_sends_bearer_with_get() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("GET"))
            .and(path("/api/auth/verify"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"valid": true, "user": user_json()})),
            ),
    )
    .await;

    let user = mock.backend().verify(TOKEN).await.unwrap();

    assert_eq!(user.id, 3);
}

#[tokio::test]
async fn test_verify_rejected_token() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("GET"))
            .and(path("/api/auth/verify"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Could not validate credentials"})),
            ),
    )
    .await;

    let err = mock.backend().verify("expired").await.unwrap_err();

    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_register_posts_json() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .and(body_json(json!({
                "username": "amy",
                "email": "amy@example.com",
                "password": "s3cret"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json())),
    )
    .await;

    let account = NewAccount {
        username: "amy".to_string(),
        email: "amy@example.com".to_string(),
        password: "s3cret".to_string(),
    };
    let user = mock.backend().register(&account).await.unwrap();

    assert_eq!(user.email, "amy@example.com");
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_list_sessions_maps_backend_shape() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("GET"))
            .and(path("/api/chat/sessions"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": "s2",
                    "user_id": 3,
                    "title": "Newer",
                    "created_at": "2024-05-02T08:00:00",
                    "updated_at": "2024-05-02T09:00:00",
                    "messages": [
                        {
                            "id": "m1",
                            "chat_session_id": "s2",
                            "content": "hi",
                            "type": "user",
                            "image_url": null,
                            "image_path": null,
                            "timestamp": "2024-05-02T08:00:01"
                        }
                    ]
                },
                {
                    "id": "s1",
                    "user_id": 3,
                    "title": "Older",
                    "created_at": "2024-05-01T08:00:00",
                    "updated_at": null,
                    "messages": []
                }
            ]))),
    )
    .await;

    let sessions = mock.backend().list_sessions(TOKEN).await.unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, "s2");
    assert_eq!(sessions[0].messages[0].role, MessageRole::User);
    assert_eq!(sessions[1].updated_at, sessions[1].created_at);
}

#[tokio::test]
async fn test_list_sessions_error_status() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("GET"))
            .and(path("/api/chat/sessions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error")),
    )
    .await;

    let err = mock.backend().list_sessions(TOKEN).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_save_session_posts_snake_case_body() {
    let mut session = ChatSession::new();
    session.id = "s9".to_string();
    session.push_message(Message::new("hello", MessageRole::User, None, None));

    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/chat/sessions"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_string_contains("\"created_at\""))
            .and(body_string_contains("\"type\":\"user\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "s9"})))
            .expect(1),
    )
    .await;

    mock.backend().save_session(TOKEN, &session).await.unwrap();
}

#[tokio::test]
async fn test_delete_session_reports_any_status() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("DELETE"))
            .and(path("/api/chat/sessions/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "会话删除成功"}))),
    )
    .await;
    mock.mount(
        Mock::given(method("DELETE"))
            .and(path("/api/chat/sessions/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "会话不存在"}))),
    )
    .await;

    let backend = mock.backend();
    assert_eq!(backend.delete_session(TOKEN, "s1").await.unwrap(), 200);
    assert_eq!(backend.delete_session(TOKEN, "gone").await.unwrap(), 404);
}

// ============================================================================
// Replies and uploads
// ============================================================================

#[tokio::test]
async fn test_stream_reply_decodes_events() {
    let body = concat!(
        "data: {\"session_id\": \"s1\"}\n\n",
        "data: {\"content\": \"你\", \"type\": \"chunk\"}\n\n",
        "data: {\"content\": \"好\", \"type\": \"chunk\"}\n\n",
        "data: {\"type\": \"done\", \"message_id\": \"m7\"}\n\n",
    );

    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/chat/chat/stream"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({"message": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")),
    )
    .await;

    let request = ReplyRequest {
        message: "hello".to_string(),
        image_url: None,
        session_id: None,
    };
    let events: Vec<ReplyEvent> = mock
        .backend()
        .stream_reply(TOKEN, request)
        .await
        .unwrap()
        .map(|event| event.unwrap())
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            ReplyEvent::SessionAssigned("s1".to_string()),
            ReplyEvent::Chunk("你".to_string()),
            ReplyEvent::Chunk("好".to_string()),
            ReplyEvent::Done {
                message_id: Some("m7".to_string())
            },
        ]
    );
}

#[tokio::test]
async fn test_stream_reply_rejected_before_streaming() {
    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/chat/chat/stream"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"}))),
    )
    .await;

    let request = ReplyRequest {
        message: "hello".to_string(),
        image_url: None,
        session_id: Some("s1".to_string()),
    };
    let result = mock.backend().stream_reply("bad", request).await;

    assert!(result.err().unwrap().is_unauthorized());
}

#[tokio::test]
async fn test_upload_image_sends_multipart_file() {
    let temp = tempfile::tempdir().unwrap();
    let image_path = temp.path().join("cat.png");
    std::fs::write(&image_path, b"fake-png-bytes").unwrap();

    let mock = BackendMockServer::new().await;
    mock.mount(
        Mock::given(method("POST"))
            .and(path("/api/upload/image"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_string_contains("name=\"file\"; filename=\"cat.png\""))
            .and(body_string_contains("image/png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "image_url": "/uploads/1234.png",
                "image_path": "uploads/1234.png",
                "error": null
            }))),
    )
    .await;

    let uploaded = mock.backend().upload_image(TOKEN, &image_path).await.unwrap();

    assert_eq!(uploaded.url, "/uploads/1234.png");
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let mock = BackendMockServer::new().await;

    let err = mock
        .backend()
        .upload_image(TOKEN, std::path::Path::new("/definitely/not/here.png"))
        .await
        .unwrap_err();

    assert!(matches!(err, ChatlineError::Io { .. }));
}
