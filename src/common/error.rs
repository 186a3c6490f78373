use std::collections::HashMap;
use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    integrations::bolna::ProviderError,
    middleware::i18n::Locale,
    models::call::CallStatus,
};

/// Entidade procurada quando um ID não existe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Candidate,
    Call,
    PhoneNumber,
    CompanyProfile,
}

impl Resource {
    fn code(self) -> &'static str {
        match self {
            Resource::Candidate => "candidate_not_found",
            Resource::Call => "call_not_found",
            Resource::PhoneNumber => "phone_number_not_found",
            Resource::CompanyProfile => "company_profile_not_found",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Candidate => "Candidato",
            Resource::Call => "Chamada",
            Resource::PhoneNumber => "Número de telefone",
            Resource::CompanyProfile => "Perfil de empresa",
        };
        f.write_str(name)
    }
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição malformada: {0}")]
    InvalidPayload(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("{0} não encontrado")]
    NotFound(Resource),

    #[error("Transição de status inválida: {from:?} -> {to:?}")]
    InvalidStatusTransition { from: CallStatus, to: CallStatus },

    #[error("Chamada sem ID do provedor")]
    MissingProviderCallId,

    #[error("Chave de idempotência já usada")]
    DuplicateIdempotencyKey,

    // Mensagem do provedor repassada sem alteração
    #[error("{0}")]
    Provider(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err.to_string())
    }
}

// Rejeições dos extratores do axum viram 400 no nosso formato
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidPayload(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidPayload(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidPayload(rejection.body_text())
    }
}

/// Erro pronto para o cliente: status + mensagem já traduzida.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::InvalidStatusTransition { .. }
            | AppError::MissingProviderCallId
            | AppError::DuplicateIdempotencyKey => StatusCode::CONFLICT,
            // Falhas do provedor e erros internos viram 500.
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::InvalidPayload(_) => "invalid_payload",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::NotFound(resource) => resource.code(),
            AppError::InvalidStatusTransition { .. } => "invalid_status_transition",
            AppError::MissingProviderCallId => "call_without_provider_id",
            AppError::DuplicateIdempotencyKey => "duplicate_idempotency_key",
            _ => "internal_error",
        }
    }

    /// Converte para a resposta do cliente no idioma do `locale`.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let translated = store.translate(&locale.0, self.code()).map(str::to_string);

        let (error, details) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (translated, Some(json!(details)))
            }
            AppError::InvalidPayload(reason) => (translated, Some(json!({ "reason": reason }))),
            AppError::InvalidStatusTransition { from, to } => {
                (translated, Some(json!({ "from": from, "to": to })))
            }
            AppError::Provider(message) => {
                tracing::warn!("Erro do provedor de chamadas: {}", message);
                (Some(message), None)
            }
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                // O `tracing` registra a mensagem detalhada; o cliente recebe a genérica.
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (translated, None)
            }
            _ => (translated, None),
        };

        ApiError {
            status,
            error: error.unwrap_or_else(|| "Unexpected error".to_string()),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::shared())
            .into_response()
    }
}

/// Erro de validação de um único campo, para regras que o `validator` não cobre.
pub fn field_error(field: &'static str, code: &'static str) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    let mut err = validator::ValidationError::new(code);
    err.message = Some(code.into());
    errors.add(field, err);
    AppError::ValidationError(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(err: AppError, lang: &str) -> ApiError {
        err.to_api_error(&Locale(lang.to_string()), &I18nStore::new())
    }

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(AppError::NotFound(Resource::Call).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::MissingProviderCallId.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::DuplicateIdempotencyKey.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Provider("Invalid agent".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn provider_message_is_passed_through_verbatim() {
        let api = render(AppError::Provider("Agent not found for id abc".into()), "pt");
        assert_eq!(api.error, "Agent not found for id abc");
        assert!(api.details.is_none());
    }

    #[test]
    fn not_found_is_translated() {
        let api = render(AppError::NotFound(Resource::Candidate), "pt");
        assert_eq!(api.error, "Candidato não encontrado");

        let api = render(AppError::NotFound(Resource::Candidate), "en");
        assert_eq!(api.error, "Candidate not found");
    }

    #[test]
    fn field_error_carries_field_details() {
        let api = render(field_error("recipient_phone", "required"), "en");
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details, Some(json!({ "recipient_phone": ["required"] })));
    }

    #[test]
    fn internal_errors_hide_details() {
        let api = render(AppError::InternalServerError(anyhow::anyhow!("pool closed")), "en");
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "An unexpected error occurred.");
    }
}
