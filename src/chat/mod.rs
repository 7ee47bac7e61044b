pub mod dispatcher;
pub mod format;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::error::ServiceError;
use crate::shared::models::{ChartTable, ChatRole, ChatTurn};
use crate::shared::state::AppState;

/// Messages containing "sales" always go to the query dispatcher, never to
/// the completion service.
pub fn is_sales_query(text: &str) -> bool {
    text.to_lowercase().contains("sales")
}

/// Append-only transcript for one interactive session. Created on session
/// start, discarded on session end; nothing survives a restart.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub turns: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: ChatRole::User,
            text: text.into(),
            chart: None,
        });
    }

    pub fn push_assistant(
        &mut self,
        text: impl Into<String>,
        chart: Option<ChartTable>,
    ) -> ChatTurn {
        let turn = ChatTurn {
            role: ChatRole::Assistant,
            text: text.into(),
            chart,
        };
        self.turns.push(turn.clone());
        turn
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
}

pub fn configure_chat_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat/sessions", post(create_session))
        .route("/api/chat/sessions/:id", axum::routing::delete(end_session))
        .route("/api/chat/sessions/:id/history", get(session_history))
        .route("/api/chat/sessions/:id/messages", post(post_message))
}

/// POST /api/chat/sessions - start a chat session
async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionCreatedResponse>, ServiceError> {
    let id = Uuid::new_v4();
    let mut sessions = state.chat_sessions.lock().await;
    sessions.insert(id, ChatSession::new(id));
    info!("Started chat session {}", id);
    Ok(Json(SessionCreatedResponse { session_id: id }))
}

/// DELETE /api/chat/sessions/:id - end a session and discard its transcript
async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    let mut sessions = state.chat_sessions.lock().await;
    sessions
        .remove(&id)
        .ok_or_else(|| ServiceError::not_found("unknown chat session"))?;
    info!("Ended chat session {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/chat/sessions/:id/history - full transcript in order
async fn session_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatTurn>>, ServiceError> {
    let sessions = state.chat_sessions.lock().await;
    let session = sessions
        .get(&id)
        .ok_or_else(|| ServiceError::not_found("unknown chat session"))?;
    Ok(Json(session.turns.clone()))
}

/// POST /api/chat/sessions/:id/messages - send one user message and get the
/// assistant turn back
async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatMessageRequest>,
) -> Result<Json<ChatTurn>, ServiceError> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err(ServiceError::validation("message text is required"));
    }

    let mut sessions = state.chat_sessions.lock().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| ServiceError::not_found("unknown chat session"))?;

    let history = session.turns.clone();
    session.push_user(text.clone());

    let turn = if is_sales_query(&text) {
        let pool = state.conn.clone();
        let question = text.clone();
        let report = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            dispatcher::answer(&mut conn, &question)
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("dispatcher task failed: {e}")))??;
        session.push_assistant(report.summary, report.chart)
    } else {
        let reply = state
            .ai
            .complete(&history, &text)
            .await
            .map_err(|e| ServiceError::External(e.to_string()))?;
        session.push_assistant(reply, None)
    };

    Ok(Json(turn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::ChartRow;
    use crate::tests::test_util;

    #[test]
    fn sales_routing_predicate_matches_anywhere_case_insensitive() {
        test_util::setup();
        assert!(is_sales_query("what are sales by year"));
        assert!(is_sales_query("TOTAL SALES please"));
        assert!(is_sales_query("how do wholesales work"));
        assert!(!is_sales_query("hello there"));
        assert!(!is_sales_query("show me the inventory"));
    }

    #[test]
    fn transcript_alternates_starting_with_user() {
        test_util::setup();
        let mut session = ChatSession::new(Uuid::new_v4());
        let n = 5;
        for i in 0..n {
            session.push_user(format!("question {i}"));
            session.push_assistant(format!("answer {i}"), None);
        }
        assert_eq!(session.turns.len(), 2 * n);
        for (index, turn) in session.turns.iter().enumerate() {
            let expected = if index % 2 == 0 {
                ChatRole::User
            } else {
                ChatRole::Assistant
            };
            assert_eq!(turn.role, expected, "turn {index}");
        }
    }

    #[test]
    fn assistant_turn_carries_chart_payload() {
        test_util::setup();
        let mut session = ChatSession::new(Uuid::new_v4());
        session.push_user("sales by location");
        let chart = ChartTable {
            label_column: "Location".to_string(),
            value_column: "Total Sales".to_string(),
            rows: vec![ChartRow {
                label: "A".to_string(),
                value: 15.0,
            }],
        };
        let turn = session.push_assistant("Sales by location:\n- A: $15.00", Some(chart.clone()));
        assert_eq!(turn.chart, Some(chart));
        assert_eq!(session.turns.last().expect("turn").role, ChatRole::Assistant);
    }

    #[test]
    fn user_turns_never_carry_charts() {
        test_util::setup();
        let mut session = ChatSession::new(Uuid::new_v4());
        session.push_user("hello");
        assert!(session.turns[0].chart.is_none());
    }
}
