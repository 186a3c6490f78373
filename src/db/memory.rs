// src/db/memory.rs

// Armazenamento em memória usado quando não há DATABASE_URL (desenvolvimento e testes).
// Cada operação segura um único guard do RwLock, então o "limpa e define" do
// perfil padrão é atômico do mesmo jeito que a transação no Postgres.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CallRepository, CandidateRepository, SettingsRepository, UserRepository},
    models::{
        auth::User,
        call::{Call, CallChanges, CallFilter, NewCall},
        candidate::{Candidate, CandidateChanges, CandidateFilter, NewCandidate},
        settings::{CompanyProfile, NewCompanyProfile, NewPhoneNumber, PhoneNumber},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    candidates: Vec<Candidate>,
    calls: Vec<Call>,
    phone_numbers: Vec<PhoneNumber>,
    companies: Vec<CompanyProfile>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// As tabelas guardam em ordem de inserção; as listagens devolvem o mais recente primeiro.
fn newest_first<T: Clone>(rows: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    rows.iter().rev().filter(|r| keep(r)).cloned().collect()
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(
        &self,
        email: &str,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == email) {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.map(str::to_string),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CandidateRepository for MemoryStore {
    async fn list(&self, user_id: Uuid, filter: &CandidateFilter) -> Result<Vec<Candidate>, AppError> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.candidates, |c| c.user_id == user_id && filter.matches(c)))
    }

    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Candidate>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .candidates
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn create(&self, user_id: Uuid, input: NewCandidate) -> Result<Candidate, AppError> {
        let now = Utc::now();
        let candidate = Candidate {
            id: Uuid::new_v4(),
            user_id,
            full_name: input.full_name,
            phone: input.phone,
            email: input.email,
            job_title: input.job_title,
            company: input.company,
            location: input.location,
            skills: input.skills,
            notes: input.notes,
            linkedin_url: input.linkedin_url,
            resume_url: input.resume_url,
            status: input.status,
            created_at: now,
            updated_at: now,
        };

        self.tables.write().await.candidates.push(candidate.clone());
        Ok(candidate)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, changes: CandidateChanges) -> Result<Option<Candidate>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(candidate) = tables
            .candidates
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id)
        else {
            return Ok(None);
        };

        changes.apply(candidate);
        candidate.updated_at = Utc::now();
        Ok(Some(candidate.clone()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.candidates.len();
        tables.candidates.retain(|c| !(c.id == id && c.user_id == user_id));
        let removed = tables.candidates.len() < before;

        // Mesmo efeito do ON DELETE SET NULL
        if removed {
            for call in tables.calls.iter_mut().filter(|c| c.candidate_id == Some(id)) {
                call.candidate_id = None;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl CallRepository for MemoryStore {
    async fn list(&self, user_id: Uuid, filter: &CallFilter) -> Result<Vec<Call>, AppError> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.calls, |c| c.user_id == user_id && filter.matches(c)))
    }

    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Call>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.calls.iter().find(|c| c.id == id && c.user_id == user_id).cloned())
    }

    async fn find_by_idempotency_key(&self, user_id: Uuid, key: &str) -> Result<Option<Call>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .calls
            .iter()
            .find(|c| c.user_id == user_id && c.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn find_by_provider_call_id(&self, user_id: Uuid, provider_call_id: &str) -> Result<Option<Call>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .calls
            .iter()
            .rev()
            .find(|c| c.user_id == user_id && c.provider_call_id.as_deref() == Some(provider_call_id))
            .cloned())
    }

    async fn create(&self, user_id: Uuid, input: NewCall) -> Result<Call, AppError> {
        let mut tables = self.tables.write().await;

        // Mesmo efeito do índice único idx_calls_idempotency
        if let Some(key) = input.idempotency_key.as_deref() {
            if tables
                .calls
                .iter()
                .any(|c| c.user_id == user_id && c.idempotency_key.as_deref() == Some(key))
            {
                return Err(AppError::DuplicateIdempotencyKey);
            }
        }

        let call = Call {
            id: Uuid::new_v4(),
            user_id,
            candidate_id: input.candidate_id,
            phone_number_id: input.phone_number_id,
            company_profile_id: input.company_profile_id,
            agent_id: input.agent_id,
            recipient_phone: input.recipient_phone,
            provider_call_id: input.provider_call_id,
            idempotency_key: input.idempotency_key,
            status: input.status,
            outcome: None,
            duration_seconds: None,
            transcript: None,
            summary: None,
            notes: None,
            started_at: Utc::now(),
            ended_at: None,
        };

        tables.calls.push(call.clone());
        Ok(call)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, changes: CallChanges) -> Result<Option<Call>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(call) = tables.calls.iter_mut().find(|c| c.id == id && c.user_id == user_id) else {
            return Ok(None);
        };

        changes.apply(call);
        Ok(Some(call.clone()))
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn list_active_phone_numbers(&self, user_id: Uuid) -> Result<Vec<PhoneNumber>, AppError> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.phone_numbers, |p| p.user_id == user_id && p.is_active))
    }

    async fn find_phone_number(&self, user_id: Uuid, id: Uuid) -> Result<Option<PhoneNumber>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .phone_numbers
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .cloned())
    }

    async fn create_phone_number(&self, user_id: Uuid, input: NewPhoneNumber) -> Result<PhoneNumber, AppError> {
        let number = PhoneNumber {
            id: Uuid::new_v4(),
            user_id,
            phone_number: input.phone_number,
            label: input.label,
            is_active: true,
            created_at: Utc::now(),
        };

        self.tables.write().await.phone_numbers.push(number.clone());
        Ok(number)
    }

    async fn deactivate_phone_number(&self, user_id: Uuid, id: Uuid) -> Result<Option<PhoneNumber>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(number) = tables
            .phone_numbers
            .iter_mut()
            .find(|p| p.id == id && p.user_id == user_id)
        else {
            return Ok(None);
        };

        number.is_active = false;
        Ok(Some(number.clone()))
    }

    async fn list_companies(&self, user_id: Uuid) -> Result<Vec<CompanyProfile>, AppError> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.companies, |c| c.user_id == user_id))
    }

    async fn find_company(&self, user_id: Uuid, id: Uuid) -> Result<Option<CompanyProfile>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .companies
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn find_default_company(&self, user_id: Uuid) -> Result<Option<CompanyProfile>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .companies
            .iter()
            .find(|c| c.user_id == user_id && c.is_default)
            .cloned())
    }

    async fn create_company(&self, user_id: Uuid, input: NewCompanyProfile) -> Result<CompanyProfile, AppError> {
        let mut tables = self.tables.write().await;

        if input.is_default {
            for company in tables.companies.iter_mut().filter(|c| c.user_id == user_id) {
                company.is_default = false;
            }
        }

        let company = CompanyProfile {
            id: Uuid::new_v4(),
            user_id,
            company_name: input.company_name,
            description: input.description,
            is_default: input.is_default,
            created_at: Utc::now(),
        };
        tables.companies.push(company.clone());
        Ok(company)
    }

    async fn set_default_company(&self, user_id: Uuid, id: Uuid) -> Result<Option<CompanyProfile>, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.companies.iter().any(|c| c.id == id && c.user_id == user_id) {
            return Ok(None);
        }

        let mut updated = None;
        for company in tables.companies.iter_mut().filter(|c| c.user_id == user_id) {
            company.is_default = company.id == id;
            if company.is_default {
                updated = Some(company.clone());
            }
        }
        Ok(updated)
    }
}
