use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::{now_ms, AppState};

const GREETING: &str = "Hi! I'm your RideLink assistant. Ask about rides, payments or safety.";
const REPLY: &str =
    "Thanks! Our team will get back shortly. For urgent issues, call 112 or see Safety.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Bot,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Author,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChatExchange {
    pub message: ChatMessage,
    pub reply: ChatMessage,
}

/// Opening message of the help chat
pub async fn greeting() -> Json<Vec<ChatMessage>> {
    Json(vec![ChatMessage {
        id: "m1".to_string(),
        role: Author::Bot,
        text: GREETING.to_string(),
    }])
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<Json<ChatExchange>> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Type a message first".to_string()));
    }

    let message = ChatMessage {
        id: format!("u_{}", now_ms()),
        role: Author::User,
        text: text.to_string(),
    };

    tokio::time::sleep(state.config.help_reply_delay).await;

    Ok(Json(ChatExchange {
        message,
        reply: ChatMessage {
            id: format!("b_{}", now_ms()),
            role: Author::Bot,
            text: REPLY.to_string(),
        },
    }))
}
