//! HTTP client for the Chatline backend.
//!
//! Implements [`AuthApi`] and [`ChatApi`] over reqwest. Endpoint paths are
//! appended to the configured base URL:
//!
//! | operation | request |
//! |---|---|
//! | login | `POST /api/auth/login` (form) |
//! | verify | `GET /api/auth/verify` |
//! | register | `POST /api/auth/register` (JSON) |
//! | list sessions | `GET /api/chat/sessions` |
//! | save session | `POST /api/chat/sessions` (JSON) |
//! | delete session | `DELETE /api/chat/sessions/{id}` |
//! | stream reply | `POST /api/chat/chat/stream` (JSON → SSE) |
//! | upload image | `POST /api/upload/image` (multipart) |

use crate::dto::{
    ErrorDto, LoginResponseDto, SessionDto, UploadResponseDto, UserDto, VerifyResponseDto,
};
use crate::sse;
use async_trait::async_trait;
use chatline_core::auth::{AuthApi, LoginGrant, NewAccount};
use chatline_core::chat::{ChatApi, ChatSession, ReplyRequest, ReplyStream, UploadedImage};
use chatline_core::config::ClientConfig;
use chatline_core::error::{ChatlineError, Result};
use chatline_core::user::User;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

const LOGIN_PATH: &str = "/api/auth/login";
const VERIFY_PATH: &str = "/api/auth/verify";
const REGISTER_PATH: &str = "/api/auth/register";
const SESSIONS_PATH: &str = "/api/chat/sessions";
const STREAM_PATH: &str = "/api/chat/chat/stream";
const UPLOAD_PATH: &str = "/api/upload/image";

/// reqwest-based implementation of the backend traits.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpBackend {
    /// Creates a backend client from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns `ChatlineError::Config` if the config is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .build()
            .map_err(|e| ChatlineError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.normalized_base_url().to_string(),
            timeout: config.request_timeout_secs.map(Duration::from_secs),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // Streaming requests skip the timeout; it would cut long replies short.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    fn authorized(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.request(method, path)
            .header("Authorization", format!("Bearer {}", token))
    }
}

async fn send(request: RequestBuilder) -> Result<Response> {
    request.send().await.map_err(transport_error)
}

fn transport_error(err: reqwest::Error) -> ChatlineError {
    ChatlineError::network(err.to_string())
}

/// Passes success responses through and turns the rest into `Http` errors
/// carrying the backend's `detail` string, or an empty message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = ErrorDto::from_body(&body)
        .message()
        .map(str::to_string)
        .unwrap_or_default();
    debug!(status = status.as_u16(), %message, "Backend returned error status");
    Err(ChatlineError::http(status.as_u16(), message))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let url = response.url().path().to_string();
    response.json::<T>().await.map_err(|e| {
        ChatlineError::invalid_response(format!("Failed to parse response from {}: {}", url, e))
    })
}

#[async_trait]
impl AuthApi for HttpBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant> {
        debug!(username, "POST {}", LOGIN_PATH);
        let request = self
            .request(Method::POST, LOGIN_PATH)
            .form(&[("username", username), ("password", password)]);

        let response = check_status(send(request).await?).await?;
        let dto: LoginResponseDto = read_json(response).await?;
        Ok(dto.into())
    }

    async fn verify(&self, token: &str) -> Result<User> {
        debug!("GET {}", VERIFY_PATH);
        let request = self.authorized(Method::GET, VERIFY_PATH, token);

        let response = check_status(send(request).await?).await?;
        let dto: VerifyResponseDto = read_json(response).await?;
        if dto.valid == Some(false) {
            return Err(ChatlineError::http(401, "Token is not valid"));
        }
        Ok(dto.user.into())
    }

    async fn register(&self, account: &NewAccount) -> Result<User> {
        debug!(username = %account.username, "POST {}", REGISTER_PATH);
        let request = self.request(Method::POST, REGISTER_PATH).json(account);

        let response = check_status(send(request).await?).await?;
        let dto: UserDto = read_json(response).await?;
        Ok(dto.into())
    }
}

#[async_trait]
impl ChatApi for HttpBackend {
    async fn list_sessions(&self, token: &str) -> Result<Vec<ChatSession>> {
        debug!("GET {}", SESSIONS_PATH);
        let request = self.authorized(Method::GET, SESSIONS_PATH, token);

        let response = check_status(send(request).await?).await?;
        let dtos: Vec<SessionDto> = read_json(response).await?;
        dtos.into_iter().map(ChatSession::try_from).collect()
    }

    async fn save_session(&self, token: &str, session: &ChatSession) -> Result<()> {
        debug!(session_id = %session.id, "POST {}", SESSIONS_PATH);
        let request = self
            .authorized(Method::POST, SESSIONS_PATH, token)
            .json(&SessionDto::from(session));

        check_status(send(request).await?).await?;
        Ok(())
    }

    async fn delete_session(&self, token: &str, session_id: &str) -> Result<u16> {
        let path = format!("{}/{}", SESSIONS_PATH, session_id);
        debug!("DELETE {}", path);
        let response = send(self.authorized(Method::DELETE, &path, token)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "Session delete was not accepted");
        }
        Ok(status.as_u16())
    }

    async fn stream_reply(&self, token: &str, request: ReplyRequest) -> Result<ReplyStream> {
        debug!(session_id = ?request.session_id, "POST {}", STREAM_PATH);
        let builder = self
            .client
            .post(self.url(STREAM_PATH))
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "text/event-stream")
            .json(&request);

        let response = check_status(send(builder).await?).await?;
        Ok(sse::reply_events(response.bytes_stream()))
    }

    async fn upload_image(&self, token: &str, path: &Path) -> Result<UploadedImage> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        debug!(file_name = %file_name, mime = %mime, size = data.len(), "POST {}", UPLOAD_PATH);

        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str(mime.essence_str())
            .map_err(|e| ChatlineError::io(format!("Cannot attach {}: {}", path.display(), e)))?;
        let request = self
            .authorized(Method::POST, UPLOAD_PATH, token)
            .multipart(Form::new().part("file", part));

        let response = check_status(send(request).await?).await?;
        let dto: UploadResponseDto = read_json(response).await?;
        UploadedImage::try_from(dto)
    }
}
