//! Student placement handlers
//!
//! Reads are open to every authenticated role; mutations sit behind
//! `require_placement_role`. The JWT subject is recorded as `performedBy`.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};
use crate::auth::Claims;
use crate::placement::api::{
    BatchTransferRequest, BatchTransferResponse, PromotionRecordResponse, StudentResponse,
    TransferRecordResponse,
};
use crate::placement::{
    ExternalTransferRequest, GraduationRequest, PromotionRequest, StudentId, TransferRequest,
    WithdrawalRequest,
};

/// Get a student with placement, status and histories
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student found", body = StudentResponse),
        (status = 401, description = "Authentication failed"),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_jwt" = [])),
    tag = "Students"
)]
pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StudentResponse> {
    let id = StudentId::new(id)?;
    let student = state.placement.get_student(&id).await?;
    ok(StudentResponse::from(&student))
}

#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/transfer-history",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Transfer records, oldest first", body = Vec<TransferRecordResponse>),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_jwt" = [])),
    tag = "Students"
)]
pub async fn get_transfer_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<TransferRecordResponse>> {
    let id = StudentId::new(id)?;
    let history = state.placement.transfer_history(&id).await?;
    ok(history.iter().map(Into::into).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/promotion-history",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Promotion records, oldest first", body = Vec<PromotionRecordResponse>),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_jwt" = [])),
    tag = "Students"
)]
pub async fn get_promotion_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<PromotionRecordResponse>> {
    let id = StudentId::new(id)?;
    let history = state.placement.promotion_history(&id).await?;
    ok(history.iter().map(Into::into).collect())
}

/// Move a student to another grade/section of this school
#[utoipa::path(
    post,
    path = "/api/v1/students/{id}/transfer",
    params(("id" = String, Path, description = "Student id")),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer committed", body = StudentResponse),
        (status = 400, description = "Already in the specified grade code and stream section, or invalid parameters"),
        (status = 401, description = "Authentication failed"),
        (status = 403, description = "Role not permitted"),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Concurrent update, retry"),
        (status = 422, description = "Student has left the school")
    ),
    security(("bearer_jwt" = [])),
    tag = "Students"
)]
pub async fn transfer_student(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<StudentResponse> {
    let id = StudentId::new(id)?;
    let student = state.placement.transfer(&id, &req, &claims.actor()).await?;
    ok(StudentResponse::from(&student))
}

/// Transfer a student out to another school
#[utoipa::path(
    post,
    path = "/api/v1/students/{id}/external-transfer",
    params(("id" = String, Path, description = "Student id")),
    request_body = ExternalTransferRequest,
    responses(
        (status = 200, description = "Transfer committed", body = StudentResponse),
        (status = 400, description = "Target school id or exit reason missing"),
        (status = 403, description = "Role not permitted"),
        (status = 404, description = "Student not found"),
        (status = 422, description = "Student has left the school")
    ),
    security(("bearer_jwt" = [])),
    tag = "Students"
)]
pub async fn external_transfer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<ExternalTransferRequest>,
) -> ApiResult<StudentResponse> {
    let id = StudentId::new(id)?;
    let student = state
        .placement
        .external_transfer(&id, &req, &claims.actor())
        .await?;
    ok(StudentResponse::from(&student))
}

#[utoipa::path(
    post,
    path = "/api/v1/students/{id}/promote",
    params(("id" = String, Path, description = "Student id")),
    request_body = PromotionRequest,
    responses(
        (status = 200, description = "Promotion committed", body = StudentResponse),
        (status = 400, description = "Invalid promotion"),
        (status = 403, description = "Role not permitted"),
        (status = 404, description = "Student not found"),
        (status = 422, description = "Student has left the school")
    ),
    security(("bearer_jwt" = [])),
    tag = "Students"
)]
pub async fn promote_student(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<PromotionRequest>,
) -> ApiResult<StudentResponse> {
    let id = StudentId::new(id)?;
    let student = state.placement.promote(&id, &req, &claims.actor()).await?;
    ok(StudentResponse::from(&student))
}

#[utoipa::path(
    post,
    path = "/api/v1/students/{id}/graduate",
    params(("id" = String, Path, description = "Student id")),
    request_body = GraduationRequest,
    responses(
        (status = 200, description = "Graduation committed", body = StudentResponse),
        (status = 400, description = "Invalid parameters"),
        (status = 403, description = "Role not permitted"),
        (status = 404, description = "Student not found"),
        (status = 422, description = "Student has left the school")
    ),
    security(("bearer_jwt" = [])),
    tag = "Students"
)]
pub async fn graduate_student(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<GraduationRequest>,
) -> ApiResult<StudentResponse> {
    let id = StudentId::new(id)?;
    let student = state.placement.graduate(&id, &req, &claims.actor()).await?;
    ok(StudentResponse::from(&student))
}

#[utoipa::path(
    post,
    path = "/api/v1/students/{id}/withdraw",
    params(("id" = String, Path, description = "Student id")),
    request_body = WithdrawalRequest,
    responses(
        (status = 200, description = "Withdrawal committed", body = StudentResponse),
        (status = 400, description = "Reason missing"),
        (status = 403, description = "Role not permitted"),
        (status = 404, description = "Student not found"),
        (status = 422, description = "Student has left the school")
    ),
    security(("bearer_jwt" = [])),
    tag = "Students"
)]
pub async fn withdraw_student(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<WithdrawalRequest>,
) -> ApiResult<StudentResponse> {
    let id = StudentId::new(id)?;
    let student = state.placement.withdraw(&id, &req, &claims.actor()).await?;
    ok(StudentResponse::from(&student))
}

/// Apply one target to many students
///
/// Always 200 once authenticated; per-student failures are listed in `errors`.
#[utoipa::path(
    post,
    path = "/api/v1/students/batch-transfer",
    request_body = BatchTransferRequest,
    responses(
        (status = 200, description = "Per-student outcome", body = BatchTransferResponse),
        (status = 401, description = "Authentication failed"),
        (status = 403, description = "Role not permitted")
    ),
    security(("bearer_jwt" = [])),
    tag = "Students"
)]
pub async fn batch_transfer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<BatchTransferRequest>,
) -> ApiResult<BatchTransferResponse> {
    let outcome = state
        .placement
        .batch_transfer(&req.student_ids, &req.target(), &claims.actor())
        .await;
    ok(BatchTransferResponse::from(outcome))
}
