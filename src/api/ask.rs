use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{AskRequest, AskResponse, QaStatus};
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> &'static str {
    "ok"
}

/// GET /api/status - Whether the QA system is up and which retrieval tier serves it
pub async fn status(State(state): State<AppState>) -> Json<QaStatus> {
    Json(state.qa.status())
}

/// POST /api/ask - Answer a question about the resume
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question is required".to_string()));
    }
    let question = truncate_question(question, state.config.max_question_bytes);

    tracing::info!("Question: {question}");
    let answer = state.qa.answer(question).await;

    Ok(Json(AskResponse {
        question: question.to_string(),
        answer,
    }))
}

/// Longest prefix of `question` within `max_bytes` that ends on a char boundary.
fn truncate_question(question: &str, max_bytes: usize) -> &str {
    if question.len() <= max_bytes {
        return question;
    }
    let mut end = max_bytes;
    while !question.is_char_boundary(end) {
        end -= 1;
    }
    &question[..end]
}
