pub mod user_repo;
pub use user_repo::{PgUserRepository, UserRepository};
pub mod candidate_repo;
pub use candidate_repo::{CandidateRepository, PgCandidateRepository};
pub mod call_repo;
pub use call_repo::{CallRepository, PgCallRepository};
pub mod settings_repo;
pub use settings_repo::{PgSettingsRepository, SettingsRepository};
pub mod memory;
pub use memory::MemoryStore;

use std::sync::Arc;

use sqlx::PgPool;

/// Conjunto de repositórios injetado nos serviços.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub candidates: Arc<dyn CandidateRepository>,
    pub calls: Arc<dyn CallRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            candidates: Arc::new(PgCandidateRepository::new(pool.clone())),
            calls: Arc::new(PgCallRepository::new(pool.clone())),
            settings: Arc::new(PgSettingsRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        // Uma única instância atrás de todos os traits, como um banco só
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            candidates: store.clone(),
            calls: store.clone(),
            settings: store,
        }
    }
}
