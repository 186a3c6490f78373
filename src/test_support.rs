// src/test_support.rs

// Infra de testes: provedor falso e um app completo sobre o armazenamento em memória.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    config::{AppState, Config},
    db::Repositories,
    integrations::{
        bolna::{ProviderCallAck, ProviderCallRequest, ProviderError},
        VoiceCallProvider,
    },
    models::auth::User,
    routes::build_router,
};

/// Provedor que responde sempre igual e guarda os pedidos recebidos.
pub struct FakeProvider {
    reply: Result<Value, String>,
    transcript: Value,
    call_details: Option<Value>,
    delay: Option<Duration>,
    requests: Mutex<Vec<ProviderCallRequest>>,
    // IDs consultados/encerrados pelas rotas de proxy
    lookups: Mutex<Vec<String>>,
}

impl FakeProvider {
    fn new(reply: Result<Value, String>) -> Self {
        Self {
            reply,
            transcript: Value::Null,
            call_details: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting(call_id: &str, status: &str) -> Self {
        Self::new(Ok(json!({ "id": call_id, "status": status })))
    }

    pub fn rejecting(message: &str) -> Self {
        Self::new(Err(message.to_string()))
    }

    pub fn with_transcript(mut self, transcript: Value) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn with_call_details(mut self, details: Value) -> Self {
        self.call_details = Some(details);
        self
    }

    /// Segura o `make_call` para que pedidos concorrentes se sobreponham.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ProviderCallRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl VoiceCallProvider for FakeProvider {
    async fn make_call(&self, request: &ProviderCallRequest) -> Result<ProviderCallAck, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(raw) => Ok(ProviderCallAck::from_response(raw.clone())),
            Err(message) => Err(ProviderError::Rejected { status: 400, message: message.clone() }),
        }
    }

    async fn get_call(&self, call_id: &str) -> Result<Value, ProviderError> {
        self.lookups.lock().unwrap().push(call_id.to_string());
        Ok(self
            .call_details
            .clone()
            .unwrap_or_else(|| json!({ "id": call_id, "status": "completed" })))
    }

    async fn end_call(&self, call_id: &str) -> Result<Value, ProviderError> {
        self.lookups.lock().unwrap().push(call_id.to_string());
        Ok(json!({ "message": "Call ended" }))
    }

    async fn get_transcript(&self, call_id: &str) -> Result<Value, ProviderError> {
        self.lookups.lock().unwrap().push(call_id.to_string());
        Ok(self.transcript.clone())
    }

    async fn list_agents(&self) -> Result<Value, ProviderError> {
        Ok(json!([{ "id": "agent-1", "agent_name": "Recruiter" }]))
    }

    async fn get_agent(&self, agent_id: &str) -> Result<Value, ProviderError> {
        Ok(json!({ "id": agent_id }))
    }
}

/// Repositórios para os testes de contrato: sempre o de memória e, se
/// `DATABASE_URL` estiver definida, também o Postgres (com as migrações aplicadas).
pub async fn repository_backends() -> Vec<(&'static str, Repositories)> {
    let mut backends = vec![("memory", Repositories::in_memory())];

    if let Some(url) = std::env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()) {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("DATABASE_URL definida, mas o banco não respondeu");
        sqlx::migrate!().run(&pool).await.expect("falha ao rodar as migrações");
        backends.push(("postgres", Repositories::postgres(pool)));
    }

    backends
}

/// Usuário novo (e-mail único) para isolar os dados de cada teste.
pub async fn new_user(repos: &Repositories) -> Uuid {
    let email = format!("{}@example.com", Uuid::new_v4());
    repos.users.create_user(&email, None, "not-a-bcrypt-hash").await.unwrap().id
}

pub struct TestApp {
    pub router: Router,
    pub provider: Arc<FakeProvider>,
    pub user: User,
    pub token: String,
}

/// App completo com um usuário já cadastrado (sem passar pelo bcrypt).
pub async fn test_app(provider: FakeProvider) -> TestApp {
    let provider = Arc::new(provider);
    let repos = Repositories::in_memory();
    let user = repos
        .users
        .create_user("recruiter@example.com", Some("Test Recruiter"), "not-a-bcrypt-hash")
        .await
        .unwrap();

    let state = AppState::from_parts(Config::for_tests(), repos, provider.clone());
    let token = state.auth_service.create_token(user.id).unwrap();

    TestApp { router: build_router(state), provider, user, token }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, Some(&self.token), &[]).await
    }

    pub async fn get_anonymous(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None, &[]).await
    }

    pub async fn get_with_token(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, Some(token), &[]).await
    }

    pub async fn get_localized(&self, uri: &str, accept_language: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, Some(&self.token), &[("Accept-Language", accept_language)])
            .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), Some(&self.token), &[]).await
    }

    pub async fn post_anonymous(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), None, &[]).await
    }

    pub async fn post_with_header(&self, uri: &str, body: Value, header: (&str, &str)) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), Some(&self.token), &[header]).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body), Some(&self.token), &[]).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None, Some(&self.token), &[]).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }
}
