use super::api::ChatApi;
use super::message::{LocalImage, Message, MessageRole};
use super::model::ChatSession;
use super::reply::{ReplyEvent, ReplyRequest, ReplySummary};
use crate::auth::TokenStore;
use crate::error::{ChatlineError, Result};
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Prefix for the bot message shown when a reply could not be streamed.
pub const REPLY_FAILURE_PREFIX: &str = "抱歉，发生了错误：";

/// A session in the collection, keyed locally.
///
/// Backend ids are empty until first persisted and may repeat, so the current
/// session refers to entries by this key instead.
#[derive(Debug, Clone)]
struct SessionEntry {
    key: Uuid,
    session: ChatSession,
}

#[derive(Debug, Clone)]
enum CurrentSession {
    /// Aliases the collection entry with this key.
    Listed(Uuid),
    /// No longer part of the collection; edits stay local to it.
    Detached(ChatSession),
}

#[derive(Debug, Default)]
struct ChatState {
    /// Most recent first
    entries: Vec<SessionEntry>,
    current: Option<CurrentSession>,
    is_loading: bool,
}

impl ChatState {
    fn current(&self) -> Option<&ChatSession> {
        match self.current.as_ref()? {
            CurrentSession::Listed(key) => self
                .entries
                .iter()
                .find(|entry| entry.key == *key)
                .map(|entry| &entry.session),
            CurrentSession::Detached(session) => Some(session),
        }
    }

    fn current_mut(&mut self) -> Option<&mut ChatSession> {
        match self.current.as_mut()? {
            CurrentSession::Listed(key) => {
                let key = *key;
                self.entries
                    .iter_mut()
                    .find(|entry| entry.key == key)
                    .map(|entry| &mut entry.session)
            }
            CurrentSession::Detached(session) => Some(session),
        }
    }

    fn insert_new(&mut self) -> ChatSession {
        let session = ChatSession::new();
        let key = Uuid::new_v4();
        self.entries.insert(
            0,
            SessionEntry {
                key,
                session: session.clone(),
            },
        );
        self.current = Some(CurrentSession::Listed(key));
        session
    }

    fn replace_entries(&mut self, sessions: Vec<ChatSession>) {
        // The old entries go away, so a listed current session keeps living detached.
        if let Some(CurrentSession::Listed(_)) = self.current {
            self.current = self.current().cloned().map(CurrentSession::Detached);
        }
        self.entries = sessions
            .into_iter()
            .map(|session| SessionEntry {
                key: Uuid::new_v4(),
                session,
            })
            .collect();
    }

    fn remove_by_id(&mut self, session_id: &str) -> usize {
        let current_matches = self
            .current()
            .map(|session| session.id == session_id)
            .unwrap_or(false);
        let before = self.entries.len();
        self.entries.retain(|entry| entry.session.id != session_id);
        if current_matches {
            self.current = None;
        }
        before - self.entries.len()
    }
}

/// Client-side state of the user's chat sessions.
///
/// `ChatService` is responsible for:
/// - Keeping the session collection and the current session
/// - Appending messages and mutating the streaming bot message
/// - Loading, saving and deleting sessions on the backend
/// - Driving a streamed reply for a user message
///
/// State sits behind a single lock that is never held across a backend call,
/// so user actions may interleave with requests in flight.
pub struct ChatService {
    state: RwLock<ChatState>,
    api: Arc<dyn ChatApi>,
    token_store: Arc<dyn TokenStore>,
}

impl ChatService {
    /// Creates an empty `ChatService`.
    ///
    /// # Arguments
    ///
    /// * `api` - Backend used for session sync and replies
    /// * `token_store` - Source of the bearer token, read on every backend call
    pub fn new(api: Arc<dyn ChatApi>, token_store: Arc<dyn TokenStore>) -> Self {
        Self {
            state: RwLock::new(ChatState::default()),
            api,
            token_store,
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    /// Snapshot of the session collection, most recent first.
    pub async fn sessions(&self) -> Vec<ChatSession> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .map(|entry| entry.session.clone())
            .collect()
    }

    /// Snapshot of the current session.
    pub async fn current_session(&self) -> Option<ChatSession> {
        self.state.read().await.current().cloned()
    }

    /// Position of the current session in [`sessions`](Self::sessions).
    ///
    /// `None` when there is no current session or it is detached. Entries are
    /// compared by their local key, so unsaved sessions with equal empty ids
    /// are told apart.
    pub async fn current_index(&self) -> Option<usize> {
        let state = self.state.read().await;
        match state.current.as_ref()? {
            CurrentSession::Listed(key) => state.entries.iter().position(|entry| entry.key == *key),
            CurrentSession::Detached(_) => None,
        }
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn set_loading(&self, loading: bool) {
        self.state.write().await.is_loading = loading;
    }

    // ============================================================================
    // Local mutations
    // ============================================================================

    /// Creates an unsaved session, puts it at the front and makes it current.
    pub async fn create_new_session(&self) -> ChatSession {
        let session = self.state.write().await.insert_new();
        debug!("Created new chat session");
        session
    }

    /// Appends a message to the current session, creating one if needed.
    ///
    /// Refreshes `updated_at`, and the first user message replaces the default
    /// title.
    pub async fn add_message(
        &self,
        content: impl Into<String>,
        role: MessageRole,
        image_url: Option<String>,
        image_file: Option<LocalImage>,
    ) -> Message {
        let message = Message::new(content, role, image_url, image_file);
        let mut state = self.state.write().await;
        if state.current().is_none() {
            state.insert_new();
        }
        if let Some(session) = state.current_mut() {
            session.push_message(message.clone());
        }
        message
    }

    /// Same as [`add_message`](Self::add_message); used to seed a bot message
    /// that is filled in by later [`update_streaming_message`](Self::update_streaming_message)
    /// calls.
    pub async fn add_streaming_message(
        &self,
        content: impl Into<String>,
        role: MessageRole,
        image_url: Option<String>,
        image_file: Option<LocalImage>,
    ) -> Message {
        self.add_message(content, role, image_url, image_file).await
    }

    /// Appends `delta` to the last message of the current session.
    ///
    /// Returns `false` without changes when there is no current session, it
    /// has no messages, or the last message is not a bot message.
    pub async fn update_streaming_message(&self, delta: &str) -> bool {
        let mut state = self.state.write().await;
        match state.current_mut().and_then(|s| s.last_bot_message_mut()) {
            Some(message) => {
                message.content.push_str(delta);
                true
            }
            None => false,
        }
    }

    /// Replaces the content of the last bot message. Same guards as
    /// [`update_streaming_message`](Self::update_streaming_message).
    pub async fn update_last_message(&self, content: &str) -> bool {
        let mut state = self.state.write().await;
        match state.current_mut().and_then(|s| s.last_bot_message_mut()) {
            Some(message) => {
                message.content = content.to_string();
                true
            }
            None => false,
        }
    }

    /// Makes the listed session with `session_id` current.
    ///
    /// Returns `None` and leaves the current session alone when no listed
    /// session has that id.
    pub async fn switch_session(&self, session_id: &str) -> Option<ChatSession> {
        let mut state = self.state.write().await;
        let entry = state
            .entries
            .iter()
            .find(|entry| entry.session.id == session_id)?;
        let (key, session) = (entry.key, entry.session.clone());
        state.current = Some(CurrentSession::Listed(key));
        Some(session)
    }

    /// Drops every session in memory and resets the loading flag.
    ///
    /// Never touches the backend.
    pub async fn clear_all_data(&self) {
        let mut state = self.state.write().await;
        state.current = None;
        state.entries.clear();
        state.is_loading = false;
        debug!("Cleared chat data");
    }

    // ============================================================================
    // Backend sync
    // ============================================================================

    async fn bearer_token(&self) -> Result<String> {
        self.token_store
            .load()
            .await?
            .ok_or(ChatlineError::Unauthenticated)
    }

    /// Replaces the session collection with the backend's list.
    ///
    /// A current session that aliased a replaced entry becomes detached and
    /// keeps its content.
    ///
    /// # Returns
    ///
    /// The number of sessions loaded.
    ///
    /// # Errors
    ///
    /// Returns the backend error. Local state is left untouched in that case.
    pub async fn load_sessions(&self) -> Result<usize> {
        info!("Loading chat sessions");
        let fetched = async {
            let token = self.bearer_token().await?;
            self.api.list_sessions(&token).await
        }
        .await;

        match fetched {
            Ok(sessions) => {
                let count = sessions.len();
                self.state.write().await.replace_entries(sessions);
                info!(count, "Loaded chat sessions");
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, "Failed to load chat sessions");
                Err(e)
            }
        }
    }

    /// Stores `session` on the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error after logging it. Local state is never rolled
    /// back.
    pub async fn save_session(&self, session: &ChatSession) -> Result<()> {
        let result = async {
            let token = self.bearer_token().await?;
            self.api.save_session(&token, session).await
        }
        .await;

        if let Err(e) = &result {
            error!(session_id = %session.id, error = %e, "Failed to save chat session");
        }
        result
    }

    /// Deletes a session on the backend and then locally.
    ///
    /// Once the request completes, every session with that id is removed from
    /// the collection, whatever status the backend answered with.
    ///
    /// # Errors
    ///
    /// Returns an error when no response was received. Local state is left
    /// untouched in that case.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let status = async {
            let token = self.bearer_token().await?;
            self.api.delete_session(&token, session_id).await
        }
        .await
        .map_err(|e| {
            error!(session_id, error = %e, "Failed to delete chat session");
            e
        })?;

        if !(200..300).contains(&status) {
            warn!(
                session_id,
                status, "Backend rejected session delete; removing locally anyway"
            );
        }

        let removed = self.state.write().await.remove_by_id(session_id);
        info!(session_id, removed, "Deleted chat session");
        Ok(())
    }

    /// Uploads a local image and returns the URL to attach to a message.
    pub async fn upload_image(&self, path: &Path) -> Result<String> {
        let token = self.bearer_token().await?;
        let uploaded = self.api.upload_image(&token, path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to upload image");
            e
        })?;
        debug!(url = %uploaded.url, "Uploaded image");
        Ok(uploaded.url)
    }

    // ============================================================================
    // Reply flow
    // ============================================================================

    /// Sends a user message and streams the bot's reply into the current session.
    ///
    /// Appends the user message, seeds an empty bot message and then applies
    /// each [`ReplyEvent`] as it arrives. The loading flag is set for the
    /// duration and reset on every exit path.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without touching state when no token is
    /// stored. A failure to open or read the stream replaces the bot message
    /// with an error notice and is returned.
    pub async fn send_message(
        &self,
        content: &str,
        image_url: Option<String>,
    ) -> Result<ReplySummary> {
        let token = self.bearer_token().await?;

        self.add_message(content, MessageRole::User, image_url.clone(), None)
            .await;
        self.add_streaming_message("", MessageRole::Bot, None, None)
            .await;

        let session_id = self
            .current_session()
            .await
            .map(|session| session.id)
            .filter(|id| !id.is_empty());
        let request = ReplyRequest {
            message: content.to_string(),
            image_url,
            session_id,
        };

        self.set_loading(true).await;
        let result = self.stream_reply(&token, request).await;
        self.set_loading(false).await;

        if let Err(e) = &result {
            error!(error = %e, "Reply stream failed");
            self.update_last_message(&format!("{}{}", REPLY_FAILURE_PREFIX, e))
                .await;
        }
        result
    }

    async fn stream_reply(&self, token: &str, request: ReplyRequest) -> Result<ReplySummary> {
        let mut stream = self.api.stream_reply(token, request).await?;
        let mut summary = ReplySummary::default();

        while let Some(event) = stream.next().await {
            match event? {
                ReplyEvent::SessionAssigned(id) => {
                    self.assign_session_id(&id).await;
                    summary.session_id = Some(id);
                }
                ReplyEvent::Chunk(delta) => {
                    self.update_streaming_message(&delta).await;
                    summary.content.push_str(&delta);
                }
                ReplyEvent::Error(message) => {
                    warn!(%message, "Backend reported a reply error");
                    self.update_last_message(&message).await;
                    summary.content = message;
                    summary.failed = true;
                }
                ReplyEvent::Done { message_id } => {
                    summary.message_id = message_id;
                    break;
                }
            }
        }

        Ok(summary)
    }

    async fn assign_session_id(&self, session_id: &str) {
        let mut state = self.state.write().await;
        if let Some(session) = state.current_mut() {
            if !session.is_persisted() {
                session.id = session_id.to_string();
                debug!(session_id, "Backend assigned session id");
            }
        }
    }
}
