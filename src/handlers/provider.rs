// src/handlers/provider.rs

// Repasse direto para a API do provedor de voz. A resposta volta como veio.
// As rotas por chamada só aceitam IDs de chamadas registradas pelo usuário.

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::{error::ApiError, extract::AppPath},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

// GET /api/provider/agents
#[utoipa::path(
    get,
    path = "/api/provider/agents",
    tag = "Provider",
    responses(
        (status = 200, description = "Agentes cadastrados no provedor"),
        (status = 500, description = "Erro do provedor")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_agents(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let agents = app_state
        .call_service
        .list_agents()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(agents))
}

// GET /api/provider/agents/{agent_id}
#[utoipa::path(
    get,
    path = "/api/provider/agents/{agent_id}",
    tag = "Provider",
    params(("agent_id" = String, Path, description = "ID do agente no provedor")),
    responses((status = 200, description = "Detalhes do agente")),
    security(("api_jwt" = []))
)]
pub async fn get_agent(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    AppPath(agent_id): AppPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let agent = app_state
        .call_service
        .get_agent(&agent_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(agent))
}

// GET /api/provider/calls/{call_id}
#[utoipa::path(
    get,
    path = "/api/provider/calls/{call_id}",
    tag = "Provider",
    params(("call_id" = String, Path, description = "ID da chamada no provedor")),
    responses(
        (status = 200, description = "Estado da chamada no provedor"),
        (status = 404, description = "Chamada não encontrada para este usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_provider_call(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(call_id): AppPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let call = app_state
        .call_service
        .provider_call(user.id, &call_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(call))
}

// POST /api/provider/calls/{call_id}/end
#[utoipa::path(
    post,
    path = "/api/provider/calls/{call_id}/end",
    tag = "Provider",
    params(("call_id" = String, Path, description = "ID da chamada no provedor")),
    responses(
        (status = 200, description = "Chamada encerrada"),
        (status = 404, description = "Chamada não encontrada para este usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn end_provider_call(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(call_id): AppPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .call_service
        .end_provider_call(user.id, &call_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}

// GET /api/provider/calls/{call_id}/transcript
#[utoipa::path(
    get,
    path = "/api/provider/calls/{call_id}/transcript",
    tag = "Provider",
    params(("call_id" = String, Path, description = "ID da chamada no provedor")),
    responses(
        (status = 200, description = "Transcrição no formato do provedor"),
        (status = 404, description = "Chamada não encontrada para este usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_provider_transcript(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(call_id): AppPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let transcript = app_state
        .call_service
        .provider_transcript(user.id, &call_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(transcript))
}
