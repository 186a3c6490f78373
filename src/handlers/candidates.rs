// src/handlers/candidates.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::{AppJson, AppPath, AppQuery},
        validation::validate_not_blank,
    },
    config::AppState,
    handlers::MessageResponse,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::candidate::{Candidate, CandidateChanges, CandidateFilter, CandidateStatus, NewCandidate},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCandidatePayload {
    #[validate(required(message = "required"), custom(function = "validate_not_blank"))]
    #[schema(example = "Jane Smith")]
    pub full_name: Option<String>,

    #[validate(required(message = "required"), custom(function = "validate_not_blank"))]
    #[schema(example = "+14155550123")]
    pub phone: Option<String>,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,

    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
    pub notes: Option<String>,
    pub linkedin_url: Option<String>,
    pub resume_url: Option<String>,

    // Ausente = "new"
    pub status: Option<CandidateStatus>,
}

impl CreateCandidatePayload {
    fn into_new_candidate(self) -> NewCandidate {
        NewCandidate {
            full_name: self.full_name.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            email: self.email,
            job_title: self.job_title,
            company: self.company,
            location: self.location,
            skills: self.skills,
            notes: self.notes,
            linkedin_url: self.linkedin_url,
            resume_url: self.resume_url,
            status: self.status.unwrap_or_default(),
        }
    }
}

// Atualização parcial: só os campos enviados mudam
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCandidatePayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub full_name: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub phone: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
    pub notes: Option<String>,
    pub linkedin_url: Option<String>,
    pub resume_url: Option<String>,
    pub status: Option<CandidateStatus>,
}

impl From<UpdateCandidatePayload> for CandidateChanges {
    fn from(p: UpdateCandidatePayload) -> Self {
        CandidateChanges {
            full_name: p.full_name.map(|v| v.trim().to_string()),
            phone: p.phone.map(|v| v.trim().to_string()),
            email: p.email,
            job_title: p.job_title,
            company: p.company,
            location: p.location,
            skills: p.skills,
            notes: p.notes,
            linkedin_url: p.linkedin_url,
            resume_url: p.resume_url,
            status: p.status,
        }
    }
}

// =============================================================================
//  HANDLERS
// =============================================================================

// GET /api/candidates
#[utoipa::path(
    get,
    path = "/api/candidates",
    tag = "Candidates",
    params(CandidateFilter),
    responses(
        (status = 200, description = "Candidatos do usuário, mais recentes primeiro", body = Vec<Candidate>),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_candidates(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppQuery(filter): AppQuery<CandidateFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let candidates = app_state
        .candidate_service
        .list_candidates(user.id, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(candidates))
}

// GET /api/candidates/{id}
#[utoipa::path(
    get,
    path = "/api/candidates/{id}",
    tag = "Candidates",
    params(("id" = Uuid, Path, description = "ID do candidato")),
    responses(
        (status = 200, body = Candidate),
        (status = 404, description = "Candidato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_candidate(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let candidate = app_state
        .candidate_service
        .get_candidate(user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(candidate))
}

// POST /api/candidates
#[utoipa::path(
    post,
    path = "/api/candidates",
    tag = "Candidates",
    request_body = CreateCandidatePayload,
    responses(
        (status = 201, description = "Candidato criado", body = Candidate),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_candidate(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppJson(payload): AppJson<CreateCandidatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let candidate = app_state
        .candidate_service
        .create_candidate(user.id, payload.into_new_candidate())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(candidate)))
}

// PUT /api/candidates/{id}
#[utoipa::path(
    put,
    path = "/api/candidates/{id}",
    tag = "Candidates",
    params(("id" = Uuid, Path, description = "ID do candidato")),
    request_body = UpdateCandidatePayload,
    responses(
        (status = 200, body = Candidate),
        (status = 400, description = "Dados inválidos (ex: status fora do enum)"),
        (status = 404, description = "Candidato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_candidate(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateCandidatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let candidate = app_state
        .candidate_service
        .update_candidate(user.id, id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(candidate))
}

// DELETE /api/candidates/{id}
#[utoipa::path(
    delete,
    path = "/api/candidates/{id}",
    tag = "Candidates",
    params(("id" = Uuid, Path, description = "ID do candidato")),
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, description = "Candidato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_candidate(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .candidate_service
        .delete_candidate(user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(MessageResponse { message: "Candidate deleted" }))
}
