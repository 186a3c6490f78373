// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::Repositories,
    integrations::{bolna::DEFAULT_BASE_URL, BolnaClient, VoiceCallProvider},
    services::{
        auth::AuthService, call_service::CallService, candidate_service::CandidateService,
        settings_service::SettingsService,
    },
};

/// Configuração carregada das variáveis de ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    // Sem DATABASE_URL a aplicação roda com armazenamento em memória
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub bolna_api_key: Option<String>,
    pub bolna_base_url: String,
    pub provider_timeout: Duration,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: optional_env("DATABASE_URL"),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 5)?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bolna_api_key: optional_env("BOLNA_API_KEY"),
            bolna_base_url: optional_env("BOLNA_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            provider_timeout: Duration::from_secs(parse_env("PROVIDER_TIMEOUT_SECS", 30)?),
            port: parse_env("PORT", 3001)?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            bolna_api_key: Some("test-key".to_string()),
            bolna_base_url: DEFAULT_BASE_URL.to_string(),
            provider_timeout: Duration::from_secs(5),
            port: 0,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} contém um valor inválido: {}", key, raw)),
        None => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub candidate_service: CandidateService,
    pub call_service: CallService,
    pub settings_service: SettingsService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let repos = match &config.database_url {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;

                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
                Repositories::postgres(db_pool)
            }
            None => {
                tracing::warn!("⚠️ DATABASE_URL não definida: usando armazenamento em memória (os dados somem ao reiniciar).");
                Repositories::in_memory()
            }
        };

        if config.bolna_api_key.is_none() {
            tracing::warn!("⚠️ BOLNA_API_KEY não definida: chamadas ao provedor vão falhar.");
        }

        let provider: Arc<dyn VoiceCallProvider> = Arc::new(BolnaClient::new(&config)?);
        Ok(Self::from_parts(config, repos, provider))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_parts(config: Config, repos: Repositories, provider: Arc<dyn VoiceCallProvider>) -> Self {
        let auth_service = AuthService::new(repos.users.clone(), config.jwt_secret.clone());
        let candidate_service = CandidateService::new(repos.candidates.clone());
        let settings_service = SettingsService::new(repos.settings.clone());
        let call_service = CallService::new(
            repos.calls.clone(),
            repos.candidates.clone(),
            repos.settings.clone(),
            provider,
        );

        Self {
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            candidate_service,
            call_service,
            settings_service,
        }
    }
}
