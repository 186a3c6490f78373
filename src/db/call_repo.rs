// src/db/call_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::call::{Call, CallChanges, CallFilter, NewCall},
};

#[async_trait]
pub trait CallRepository: Send + Sync {
    async fn list(&self, user_id: Uuid, filter: &CallFilter) -> Result<Vec<Call>, AppError>;
    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Call>, AppError>;
    async fn find_by_idempotency_key(&self, user_id: Uuid, key: &str) -> Result<Option<Call>, AppError>;
    async fn find_by_provider_call_id(&self, user_id: Uuid, provider_call_id: &str) -> Result<Option<Call>, AppError>;
    /// Falha com `DuplicateIdempotencyKey` se a chave já existir para o usuário.
    async fn create(&self, user_id: Uuid, input: NewCall) -> Result<Call, AppError>;
    async fn update(&self, user_id: Uuid, id: Uuid, changes: CallChanges) -> Result<Option<Call>, AppError>;
}

#[derive(Clone)]
pub struct PgCallRepository {
    pool: PgPool,
}

impl PgCallRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallRepository for PgCallRepository {
    async fn list(&self, user_id: Uuid, filter: &CallFilter) -> Result<Vec<Call>, AppError> {
        let calls = sqlx::query_as::<_, Call>(
            r#"
            SELECT * FROM calls
            WHERE user_id = $1
            AND ($2::uuid IS NULL OR candidate_id = $2)
            AND ($3::call_status IS NULL OR status = $3)
            ORDER BY started_at DESC
            "#,
        )
        .bind(user_id)
        .bind(filter.candidate_id)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(calls)
    }

    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Call>, AppError> {
        let call = sqlx::query_as::<_, Call>("SELECT * FROM calls WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(call)
    }

    async fn find_by_idempotency_key(&self, user_id: Uuid, key: &str) -> Result<Option<Call>, AppError> {
        let call = sqlx::query_as::<_, Call>(
            "SELECT * FROM calls WHERE user_id = $1 AND idempotency_key = $2",
        )
        .bind(user_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(call)
    }

    async fn find_by_provider_call_id(&self, user_id: Uuid, provider_call_id: &str) -> Result<Option<Call>, AppError> {
        let call = sqlx::query_as::<_, Call>(
            "SELECT * FROM calls WHERE user_id = $1 AND provider_call_id = $2 ORDER BY started_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(provider_call_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(call)
    }

    async fn create(&self, user_id: Uuid, input: NewCall) -> Result<Call, AppError> {
        sqlx::query_as::<_, Call>(
            r#"
            INSERT INTO calls (
                user_id, candidate_id, phone_number_id, company_profile_id,
                agent_id, recipient_phone, provider_call_id, idempotency_key, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(input.candidate_id)
        .bind(input.phone_number_id)
        .bind(input.company_profile_id)
        .bind(input.agent_id)
        .bind(input.recipient_phone)
        .bind(input.provider_call_id)
        .bind(input.idempotency_key)
        .bind(input.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // idx_calls_idempotency
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateIdempotencyKey;
                }
            }
            e.into()
        })
    }

    async fn update(&self, user_id: Uuid, id: Uuid, changes: CallChanges) -> Result<Option<Call>, AppError> {
        let call = sqlx::query_as::<_, Call>(
            r#"
            UPDATE calls SET
                status = COALESCE($3, status),
                outcome = COALESCE($4, outcome),
                notes = COALESCE($5, notes),
                transcript = COALESCE($6, transcript),
                duration_seconds = COALESCE($7, duration_seconds),
                summary = COALESCE($8, summary),
                ended_at = COALESCE($9, ended_at)
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.status)
        .bind(changes.outcome)
        .bind(changes.notes)
        .bind(changes.transcript)
        .bind(changes.duration_seconds)
        .bind(changes.summary)
        .bind(changes.ended_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::call::CallStatus,
        test_support::{new_user, repository_backends},
    };

    fn new_call(provider_call_id: &str, idempotency_key: Option<&str>) -> NewCall {
        NewCall {
            candidate_id: None,
            phone_number_id: None,
            company_profile_id: None,
            agent_id: "agent-1".to_string(),
            recipient_phone: "+15550001".to_string(),
            provider_call_id: Some(provider_call_id.to_string()),
            idempotency_key: idempotency_key.map(str::to_string),
            status: CallStatus::Initiated,
        }
    }

    #[tokio::test]
    async fn duplicate_idempotency_key_is_rejected_per_user() {
        for (backend, repos) in repository_backends().await {
            let user_id = new_user(&repos).await;
            let other_user = new_user(&repos).await;

            repos.calls.create(user_id, new_call("p-1", Some("k-1"))).await.unwrap();

            let err = repos.calls.create(user_id, new_call("p-2", Some("k-1"))).await.unwrap_err();
            assert!(matches!(err, AppError::DuplicateIdempotencyKey), "{backend}: {err:?}");

            // Sem chave, ou com a mesma chave em outro usuário, não há conflito
            repos.calls.create(user_id, new_call("p-3", None)).await.unwrap();
            repos.calls.create(user_id, new_call("p-4", None)).await.unwrap();
            repos.calls.create(other_user, new_call("p-5", Some("k-1"))).await.unwrap();

            let found = repos.calls.find_by_idempotency_key(user_id, "k-1").await.unwrap().unwrap();
            assert_eq!(found.provider_call_id.as_deref(), Some("p-1"), "{backend}");
        }
    }

    #[tokio::test]
    async fn provider_call_id_lookup_is_scoped_to_the_owner() {
        for (backend, repos) in repository_backends().await {
            let user_id = new_user(&repos).await;
            let provider_call_id = format!("p-{}", Uuid::new_v4());
            let call = repos.calls.create(user_id, new_call(&provider_call_id, None)).await.unwrap();

            let found = repos.calls.find_by_provider_call_id(user_id, &provider_call_id).await.unwrap();
            assert_eq!(found.map(|c| c.id), Some(call.id), "{backend}");

            let stranger = new_user(&repos).await;
            assert!(repos.calls.find_by_provider_call_id(stranger, &provider_call_id).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn update_keeps_fields_that_are_not_changed() {
        for (backend, repos) in repository_backends().await {
            let user_id = new_user(&repos).await;
            let call = repos.calls.create(user_id, new_call("p-1", None)).await.unwrap();

            let changes = CallChanges {
                summary: Some("Resumo".to_string()),
                duration_seconds: Some(61),
                ..Default::default()
            };
            repos.calls.update(user_id, call.id, changes).await.unwrap();

            let changes = CallChanges { notes: Some("Ligar de novo".to_string()), ..Default::default() };
            let updated = repos.calls.update(user_id, call.id, changes).await.unwrap().unwrap();

            assert_eq!(updated.summary.as_deref(), Some("Resumo"), "{backend}");
            assert_eq!(updated.duration_seconds, Some(61), "{backend}");
            assert_eq!(updated.notes.as_deref(), Some("Ligar de novo"), "{backend}");
            assert_eq!(updated.status, CallStatus::Initiated, "{backend}");
        }
    }
}
