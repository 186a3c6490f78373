// src/db/candidate_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::candidate::{Candidate, CandidateChanges, CandidateFilter, NewCandidate},
};

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn list(&self, user_id: Uuid, filter: &CandidateFilter) -> Result<Vec<Candidate>, AppError>;
    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Candidate>, AppError>;
    async fn create(&self, user_id: Uuid, input: NewCandidate) -> Result<Candidate, AppError>;
    /// `None` quando o candidato não existe.
    async fn update(&self, user_id: Uuid, id: Uuid, changes: CandidateChanges) -> Result<Option<Candidate>, AppError>;
    /// `false` quando o candidato não existe.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgCandidateRepository {
    pool: PgPool,
}

impl PgCandidateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateRepository for PgCandidateRepository {
    async fn list(&self, user_id: Uuid, filter: &CandidateFilter) -> Result<Vec<Candidate>, AppError> {
        let search_term = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let candidates = sqlx::query_as::<_, Candidate>(
            r#"
            SELECT * FROM candidates
            WHERE user_id = $1
            AND ($2::candidate_status IS NULL OR status = $2)
            AND (
                $3::text IS NULL
                OR full_name ILIKE $3
                OR phone ILIKE $3
                OR email ILIKE $3
                OR job_title ILIKE $3
                OR company ILIKE $3
            )
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(filter.status)
        .bind(search_term)
        .fetch_all(&self.pool)
        .await?;

        Ok(candidates)
    }

    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Candidate>, AppError> {
        let candidate = sqlx::query_as::<_, Candidate>(
            "SELECT * FROM candidates WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(candidate)
    }

    async fn create(&self, user_id: Uuid, input: NewCandidate) -> Result<Candidate, AppError> {
        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            INSERT INTO candidates (
                user_id, full_name, phone, email, job_title, company,
                location, skills, notes, linkedin_url, resume_url, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(input.full_name)
        .bind(input.phone)
        .bind(input.email)
        .bind(input.job_title)
        .bind(input.company)
        .bind(input.location)
        .bind(input.skills)
        .bind(input.notes)
        .bind(input.linkedin_url)
        .bind(input.resume_url)
        .bind(input.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(candidate)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, changes: CandidateChanges) -> Result<Option<Candidate>, AppError> {
        // COALESCE mantém o valor atual para os campos não enviados
        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            UPDATE candidates SET
                full_name = COALESCE($3, full_name),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                job_title = COALESCE($6, job_title),
                company = COALESCE($7, company),
                location = COALESCE($8, location),
                skills = COALESCE($9, skills),
                notes = COALESCE($10, notes),
                linkedin_url = COALESCE($11, linkedin_url),
                resume_url = COALESCE($12, resume_url),
                status = COALESCE($13, status),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.full_name)
        .bind(changes.phone)
        .bind(changes.email)
        .bind(changes.job_title)
        .bind(changes.company)
        .bind(changes.location)
        .bind(changes.skills)
        .bind(changes.notes)
        .bind(changes.linkedin_url)
        .bind(changes.resume_url)
        .bind(changes.status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(candidate)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
