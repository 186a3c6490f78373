// src/services/candidate_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    db::CandidateRepository,
    models::candidate::{Candidate, CandidateChanges, CandidateFilter, NewCandidate},
};

#[derive(Clone)]
pub struct CandidateService {
    repo: Arc<dyn CandidateRepository>,
}

impl CandidateService {
    pub fn new(repo: Arc<dyn CandidateRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_candidates(&self, user_id: Uuid, filter: &CandidateFilter) -> Result<Vec<Candidate>, AppError> {
        self.repo.list(user_id, filter).await
    }

    pub async fn get_candidate(&self, user_id: Uuid, id: Uuid) -> Result<Candidate, AppError> {
        self.repo
            .find_by_id(user_id, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Candidate))
    }

    pub async fn create_candidate(&self, user_id: Uuid, mut input: NewCandidate) -> Result<Candidate, AppError> {
        input.full_name = input.full_name.trim().to_string();
        input.phone = input.phone.trim().to_string();

        let candidate = self.repo.create(user_id, input).await?;
        tracing::info!("🧑 Candidato {} criado", candidate.id);
        Ok(candidate)
    }

    pub async fn update_candidate(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: CandidateChanges,
    ) -> Result<Candidate, AppError> {
        self.repo
            .update(user_id, id, changes)
            .await?
            .ok_or(AppError::NotFound(Resource::Candidate))
    }

    pub async fn delete_candidate(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(user_id, id).await? {
            return Err(AppError::NotFound(Resource::Candidate));
        }
        tracing::info!("🗑️ Candidato {} removido", id);
        Ok(())
    }
}
