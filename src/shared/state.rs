use crate::chat::ChatSession;
use crate::config::AppConfig;
use crate::llm::CompletionProvider;
use crate::shared::utils::DbPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Chat transcripts live only here; they are created and discarded through
/// the session routes and never persisted.
pub type ChatSessions = tokio::sync::Mutex<HashMap<Uuid, ChatSession>>;

#[derive(Clone)]
pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub ai: Arc<dyn CompletionProvider>,
    pub chat_sessions: Arc<ChatSessions>,
}
