use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use gateprep_algo::{LearningPathEntry, ProgressReport, TopicKey, UpdateResult, UserState};
use serde::{Deserialize, Serialize};

use crate::engine::TestOutcome;
use crate::overview::Overview;
use crate::response::{ok, AppError, SuccessResponse};
use crate::state::AppState;
use crate::store::TestRecord;

type ApiResult<T> = Result<Json<SuccessResponse<T>>, AppError>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:user_id/state", get(get_state).delete(reset_state))
        .route("/:user_id/answers", post(record_answer))
        .route("/:user_id/tests", get(test_history).post(record_test))
        .route("/:user_id/recommendations", get(recommendations))
        .route("/:user_id/learning-path", get(learning_path))
        .route("/:user_id/progress", get(progress))
        .route("/:user_id/overview", get(overview))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerRequest {
    topic: String,
    correct_fraction: f64,
    #[serde(default)]
    time_taken: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestRequest {
    subject: String,
    total_correct: u32,
    num_questions: u32,
    #[serde(default)]
    time_taken: f64,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    subject: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    n: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationsResponse {
    user_id: String,
    topics: Vec<TopicKey>,
}

async fn get_state(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<UserState> {
    let user_state = state.engine().get_or_create_state(&user_id).await?;
    Ok(ok(user_state))
}

async fn reset_state(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<UserState> {
    let user_state = state.engine().reset_state(&user_id).await?;
    Ok(ok(user_state))
}

async fn record_answer(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<AnswerRequest>,
) -> ApiResult<UpdateResult> {
    let result = state
        .engine()
        .record_answer(&user_id, &payload.topic, payload.correct_fraction, payload.time_taken)
        .await?;
    Ok(ok(result))
}

async fn record_test(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<TestRequest>,
) -> ApiResult<TestOutcome> {
    let outcome = state
        .engine()
        .record_test_result(
            &user_id,
            &payload.subject,
            payload.total_correct,
            payload.num_questions,
            payload.time_taken,
        )
        .await?;
    Ok(ok(outcome))
}

async fn test_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<TestRecord>> {
    let records = state
        .engine()
        .get_test_history(&user_id, query.subject.as_deref(), query.limit)
        .await?;
    Ok(ok(records))
}

async fn recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> ApiResult<RecommendationsResponse> {
    let topics = state
        .engine()
        .get_topic_recommendations(&user_id, query.n)
        .await?;
    Ok(ok(RecommendationsResponse { user_id, topics }))
}

async fn learning_path(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<LearningPathEntry>> {
    let path = state.engine().generate_learning_path(&user_id).await?;
    Ok(ok(path))
}

async fn progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ProgressReport> {
    let report = state.engine().get_progress_report(&user_id).await?;
    Ok(ok(report))
}

async fn overview(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Overview> {
    let overview = state.engine().get_overview(&user_id).await?;
    Ok(ok(overview))
}
