// src/handlers/calls.rs

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
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
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::call::{Call, CallFilter, CallOutcome, CallStatus},
    services::call_service::{CallUpdate, DispatchRequest},
};

const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MakeCallPayload {
    #[validate(required(message = "required"), custom(function = "validate_not_blank"))]
    #[schema(example = "agent_123")]
    pub agent_id: Option<String>,

    // Obrigatório quando não há `candidate_id`; se vierem os dois, este vence
    #[schema(example = "+14155550123")]
    pub recipient_phone: Option<String>,

    #[schema(example = "+14155550100")]
    pub from_phone: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub user_data: Option<Map<String, Value>>,

    pub candidate_id: Option<Uuid>,
    pub phone_number_id: Option<Uuid>,
    pub company_profile_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MakeCallResponse {
    pub success: bool,
    pub call: Call,
    // Resposta crua do provedor; ausente quando a chamada foi reaproveitada
    #[schema(value_type = Option<Object>)]
    pub provider_response: Option<Value>,
    pub replayed: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCallPayload {
    pub outcome: Option<CallOutcome>,
    pub notes: Option<String>,
    pub status: Option<CallStatus>,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// POST /api/calls/make-call
#[utoipa::path(
    post,
    path = "/api/calls/make-call",
    tag = "Calls",
    request_body = MakeCallPayload,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Evita disparar a mesma chamada duas vezes")
    ),
    responses(
        (status = 201, description = "Chamada aceita pelo provedor", body = MakeCallResponse),
        (status = 200, description = "Chamada já existente para a mesma chave", body = MakeCallResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Candidato, número ou perfil não encontrado"),
        (status = 500, description = "Provedor recusou ou não respondeu")
    ),
    security(("api_jwt" = []))
)]
pub async fn make_call(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    AppJson(payload): AppJson<MakeCallPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let request = DispatchRequest {
        agent_id: payload.agent_id.unwrap_or_default(),
        recipient_phone: payload.recipient_phone,
        from_phone: payload.from_phone,
        user_data: payload.user_data,
        candidate_id: payload.candidate_id,
        phone_number_id: payload.phone_number_id,
        company_profile_id: payload.company_profile_id,
        idempotency_key,
    };

    let outcome = app_state
        .call_service
        .dispatch(user.id, request)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let status = if outcome.replayed { StatusCode::OK } else { StatusCode::CREATED };
    let body = MakeCallResponse {
        success: true,
        call: outcome.call,
        provider_response: outcome.provider_response,
        replayed: outcome.replayed,
    };

    Ok((status, Json(body)))
}

// GET /api/calls
#[utoipa::path(
    get,
    path = "/api/calls",
    tag = "Calls",
    params(CallFilter),
    responses((status = 200, description = "Chamadas, mais recentes primeiro", body = Vec<Call>)),
    security(("api_jwt" = []))
)]
pub async fn list_calls(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppQuery(filter): AppQuery<CallFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let calls = app_state
        .call_service
        .list_calls(user.id, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(calls))
}

// GET /api/calls/{id}
#[utoipa::path(
    get,
    path = "/api/calls/{id}",
    tag = "Calls",
    params(("id" = Uuid, Path, description = "ID da chamada")),
    responses(
        (status = 200, body = Call),
        (status = 404, description = "Chamada não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_call(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let call = app_state
        .call_service
        .get_call(user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(call))
}

// PUT /api/calls/{id}
#[utoipa::path(
    put,
    path = "/api/calls/{id}",
    tag = "Calls",
    params(("id" = Uuid, Path, description = "ID da chamada")),
    request_body = UpdateCallPayload,
    responses(
        (status = 200, body = Call),
        (status = 400, description = "Resultado/status inválidos"),
        (status = 404, description = "Chamada não encontrada"),
        (status = 409, description = "Transição de status não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_call(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateCallPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let update = CallUpdate {
        status: payload.status,
        outcome: payload.outcome,
        notes: payload.notes,
    };

    let call = app_state
        .call_service
        .update_call(user.id, id, update)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(call))
}

// POST /api/calls/{id}/transcript
#[utoipa::path(
    post,
    path = "/api/calls/{id}/transcript",
    tag = "Calls",
    params(("id" = Uuid, Path, description = "ID da chamada")),
    responses(
        (status = 200, description = "Transcrição gravada na chamada", body = Call),
        (status = 404, description = "Chamada não encontrada"),
        (status = 409, description = "Chamada sem ID do provedor")
    ),
    security(("api_jwt" = []))
)]
pub async fn sync_transcript(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let call = app_state
        .call_service
        .sync_transcript(user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(call))
}
