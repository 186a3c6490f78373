// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new().route("/users/me", get(handlers::auth::get_me));

    let candidate_routes = Router::new()
        .route(
            "/candidates",
            get(handlers::candidates::list_candidates).post(handlers::candidates::create_candidate),
        )
        .route(
            "/candidates/{id}",
            get(handlers::candidates::get_candidate)
                .put(handlers::candidates::update_candidate)
                .delete(handlers::candidates::delete_candidate),
        );

    let call_routes = Router::new()
        .route("/calls", get(handlers::calls::list_calls))
        .route("/calls/make-call", post(handlers::calls::make_call))
        .route(
            "/calls/{id}",
            get(handlers::calls::get_call).put(handlers::calls::update_call),
        )
        .route("/calls/{id}/transcript", post(handlers::calls::sync_transcript));

    let settings_routes = Router::new()
        .route(
            "/settings/phone-numbers",
            get(handlers::settings::list_phone_numbers).post(handlers::settings::create_phone_number),
        )
        .route("/settings/phone-numbers/{id}", delete(handlers::settings::deactivate_phone_number))
        .route(
            "/settings/companies",
            get(handlers::settings::list_companies).post(handlers::settings::create_company),
        )
        .route("/settings/companies/{id}/default", put(handlers::settings::set_default_company));

    let provider_routes = Router::new()
        .route("/provider/agents", get(handlers::provider::list_agents))
        .route("/provider/agents/{agent_id}", get(handlers::provider::get_agent))
        .route("/provider/calls/{call_id}", get(handlers::provider::get_provider_call))
        .route("/provider/calls/{call_id}/end", post(handlers::provider::end_provider_call))
        .route(
            "/provider/calls/{call_id}/transcript",
            get(handlers::provider::get_provider_transcript),
        );

    // Tudo abaixo exige Bearer válido
    let protected_routes = Router::new()
        .merge(user_routes)
        .merge(candidate_routes)
        .merge(call_routes)
        .merge(settings_routes)
        .merge(provider_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(handlers::health))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
