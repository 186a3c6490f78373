// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::{AppJson, AppPath},
        validation::validate_not_blank,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::settings::{CompanyProfile, NewCompanyProfile, NewPhoneNumber, PhoneNumber},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePhoneNumberPayload {
    #[validate(required(message = "required"), custom(function = "validate_not_blank"))]
    #[schema(example = "+14155550100")]
    pub phone_number: Option<String>,

    #[schema(example = "Recrutamento SP")]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyPayload {
    #[validate(required(message = "required"), custom(function = "validate_not_blank"))]
    #[schema(example = "Acme Talent")]
    pub company_name: Option<String>,

    pub description: Option<String>,

    #[serde(default)]
    pub is_default: bool,
}

// =============================================================================
//  NÚMEROS DE TELEFONE
// =============================================================================

// GET /api/settings/phone-numbers
#[utoipa::path(
    get,
    path = "/api/settings/phone-numbers",
    tag = "Settings",
    responses((status = 200, description = "Números ativos", body = Vec<PhoneNumber>)),
    security(("api_jwt" = []))
)]
pub async fn list_phone_numbers(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let numbers = app_state
        .settings_service
        .list_phone_numbers(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(numbers))
}

// POST /api/settings/phone-numbers
#[utoipa::path(
    post,
    path = "/api/settings/phone-numbers",
    tag = "Settings",
    request_body = CreatePhoneNumberPayload,
    responses(
        (status = 201, body = PhoneNumber),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_phone_number(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppJson(payload): AppJson<CreatePhoneNumberPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = NewPhoneNumber {
        phone_number: payload.phone_number.unwrap_or_default(),
        label: payload.label,
    };

    let number = app_state
        .settings_service
        .create_phone_number(user.id, input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(number)))
}

// DELETE /api/settings/phone-numbers/{id}
#[utoipa::path(
    delete,
    path = "/api/settings/phone-numbers/{id}",
    tag = "Settings",
    params(("id" = Uuid, Path, description = "ID do número")),
    responses(
        (status = 200, description = "Número desativado", body = PhoneNumber),
        (status = 404, description = "Número não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_phone_number(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let number = app_state
        .settings_service
        .deactivate_phone_number(user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(number))
}

// =============================================================================
//  PERFIS DE EMPRESA
// =============================================================================

// GET /api/settings/companies
#[utoipa::path(
    get,
    path = "/api/settings/companies",
    tag = "Settings",
    responses((status = 200, body = Vec<CompanyProfile>)),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let companies = app_state
        .settings_service
        .list_companies(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(companies))
}

// POST /api/settings/companies
#[utoipa::path(
    post,
    path = "/api/settings/companies",
    tag = "Settings",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, body = CompanyProfile),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppJson(payload): AppJson<CreateCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = NewCompanyProfile {
        company_name: payload.company_name.unwrap_or_default().trim().to_string(),
        description: payload.description,
        is_default: payload.is_default,
    };

    let company = app_state
        .settings_service
        .create_company(user.id, input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(company)))
}

// PUT /api/settings/companies/{id}/default
#[utoipa::path(
    put,
    path = "/api/settings/companies/{id}/default",
    tag = "Settings",
    params(("id" = Uuid, Path, description = "ID do perfil")),
    responses(
        (status = 200, description = "Perfil agora é o padrão", body = CompanyProfile),
        (status = 404, description = "Perfil não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_default_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .settings_service
        .set_default_company(user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}
