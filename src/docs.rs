// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Candidates ---
        handlers::candidates::list_candidates,
        handlers::candidates::get_candidate,
        handlers::candidates::create_candidate,
        handlers::candidates::update_candidate,
        handlers::candidates::delete_candidate,

        // --- Calls ---
        handlers::calls::make_call,
        handlers::calls::list_calls,
        handlers::calls::get_call,
        handlers::calls::update_call,
        handlers::calls::sync_transcript,

        // --- Settings ---
        handlers::settings::list_phone_numbers,
        handlers::settings::create_phone_number,
        handlers::settings::deactivate_phone_number,
        handlers::settings::list_companies,
        handlers::settings::create_company,
        handlers::settings::set_default_company,

        // --- Provider ---
        handlers::provider::list_agents,
        handlers::provider::get_agent,
        handlers::provider::get_provider_call,
        handlers::provider::end_provider_call,
        handlers::provider::get_provider_transcript,
    ),
    components(
        schemas(
            handlers::HealthResponse,
            handlers::MessageResponse,

            // Auth
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // Candidates
            models::candidate::Candidate,
            models::candidate::CandidateStatus,
            handlers::candidates::CreateCandidatePayload,
            handlers::candidates::UpdateCandidatePayload,

            // Calls
            models::call::Call,
            models::call::CallStatus,
            models::call::CallOutcome,
            handlers::calls::MakeCallPayload,
            handlers::calls::MakeCallResponse,
            handlers::calls::UpdateCallPayload,

            // Settings
            models::settings::PhoneNumber,
            models::settings::CompanyProfile,
            handlers::settings::CreatePhoneNumberPayload,
            handlers::settings::CreateCompanyPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Registro e login"),
        (name = "Candidates", description = "Pipeline de candidatos"),
        (name = "Calls", description = "Disparo e registro de chamadas"),
        (name = "Settings", description = "Números de origem e perfis de empresa"),
        (name = "Provider", description = "Repasse para a API do provedor de voz")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
