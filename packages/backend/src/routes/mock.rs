use axum::extract::{Path, Query, State};
use axum::Json;
use gateprep_algo::{MockQuestion, MockTestReport};
use serde::Deserialize;

use crate::response::{ok, AppError, SuccessResponse};
use crate::state::AppState;

/// Upper bound on questions drawn per subject in one request.
const MAX_PER_SUBJECT: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MockTestQuery {
    per_subject: Option<usize>,
}

/// The client sends back the questions it was given along with its answers.
#[derive(Debug, Deserialize)]
pub(super) struct MockSubmission {
    questions: Vec<MockQuestion>,
    answers: Vec<String>,
}

pub(super) async fn assemble(
    State(state): State<AppState>,
    Query(query): Query<MockTestQuery>,
) -> Result<Json<SuccessResponse<Vec<MockQuestion>>>, AppError> {
    let per_subject = query
        .per_subject
        .unwrap_or_else(|| state.mock_questions_per_subject())
        .min(MAX_PER_SUBJECT);
    let bank = state.questions();
    let questions = state.engine().assemble_mock_test(bank.as_ref(), per_subject);
    Ok(ok(questions))
}

pub(super) async fn submit(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<MockSubmission>,
) -> Result<Json<SuccessResponse<MockTestReport>>, AppError> {
    let report = state
        .engine()
        .submit_mock_test(&user_id, &payload.questions, &payload.answers)
        .await?;
    Ok(ok(report))
}
