use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{CompanyProfile, NewCompanyProfile, NewPhoneNumber, PhoneNumber},
};

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    // --- Números de telefone ---
    async fn list_active_phone_numbers(&self, user_id: Uuid) -> Result<Vec<PhoneNumber>, AppError>;
    async fn find_phone_number(&self, user_id: Uuid, id: Uuid) -> Result<Option<PhoneNumber>, AppError>;
    async fn create_phone_number(&self, user_id: Uuid, input: NewPhoneNumber) -> Result<PhoneNumber, AppError>;
    async fn deactivate_phone_number(&self, user_id: Uuid, id: Uuid) -> Result<Option<PhoneNumber>, AppError>;

    // --- Perfis de empresa ---
    async fn list_companies(&self, user_id: Uuid) -> Result<Vec<CompanyProfile>, AppError>;
    async fn find_company(&self, user_id: Uuid, id: Uuid) -> Result<Option<CompanyProfile>, AppError>;
    async fn find_default_company(&self, user_id: Uuid) -> Result<Option<CompanyProfile>, AppError>;
    /// Se `is_default`, limpa os outros padrões na mesma transação.
    async fn create_company(&self, user_id: Uuid, input: NewCompanyProfile) -> Result<CompanyProfile, AppError>;
    /// Torna `id` o único padrão. `None` quando o perfil não existe.
    async fn set_default_company(&self, user_id: Uuid, id: Uuid) -> Result<Option<CompanyProfile>, AppError>;
}

#[derive(Clone)]
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn list_active_phone_numbers(&self, user_id: Uuid) -> Result<Vec<PhoneNumber>, AppError> {
        let numbers = sqlx::query_as::<_, PhoneNumber>(
            "SELECT * FROM phone_numbers WHERE user_id = $1 AND is_active = true ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(numbers)
    }

    async fn find_phone_number(&self, user_id: Uuid, id: Uuid) -> Result<Option<PhoneNumber>, AppError> {
        let number = sqlx::query_as::<_, PhoneNumber>(
            "SELECT * FROM phone_numbers WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(number)
    }

    async fn create_phone_number(&self, user_id: Uuid, input: NewPhoneNumber) -> Result<PhoneNumber, AppError> {
        let number = sqlx::query_as::<_, PhoneNumber>(
            "INSERT INTO phone_numbers (user_id, phone_number, label) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(input.phone_number)
        .bind(input.label)
        .fetch_one(&self.pool)
        .await?;

        Ok(number)
    }

    async fn deactivate_phone_number(&self, user_id: Uuid, id: Uuid) -> Result<Option<PhoneNumber>, AppError> {
        let number = sqlx::query_as::<_, PhoneNumber>(
            "UPDATE phone_numbers SET is_active = false WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(number)
    }

    async fn list_companies(&self, user_id: Uuid) -> Result<Vec<CompanyProfile>, AppError> {
        let companies = sqlx::query_as::<_, CompanyProfile>(
            "SELECT * FROM company_profiles WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(companies)
    }

    async fn find_company(&self, user_id: Uuid, id: Uuid) -> Result<Option<CompanyProfile>, AppError> {
        let company = sqlx::query_as::<_, CompanyProfile>(
            "SELECT * FROM company_profiles WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    async fn find_default_company(&self, user_id: Uuid) -> Result<Option<CompanyProfile>, AppError> {
        let company = sqlx::query_as::<_, CompanyProfile>(
            "SELECT * FROM company_profiles WHERE user_id = $1 AND is_default = true",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    async fn create_company(&self, user_id: Uuid, input: NewCompanyProfile) -> Result<CompanyProfile, AppError> {
        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            sqlx::query("UPDATE company_profiles SET is_default = false WHERE user_id = $1 AND is_default = true")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let company = sqlx::query_as::<_, CompanyProfile>(
            r#"
            INSERT INTO company_profiles (user_id, company_name, description, is_default)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(input.company_name)
        .bind(input.description)
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await?; // Se falhar aqui, o tx sofre rollback automático ao sair do escopo (drop)

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        Ok(company)
    }

    async fn set_default_company(&self, user_id: Uuid, id: Uuid) -> Result<Option<CompanyProfile>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Trava o alvo antes de mexer nos outros; se não existir, nada muda
        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM company_profiles WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if exists.is_none() {
            return Ok(None);
        }

        sqlx::query(
            "UPDATE company_profiles SET is_default = false WHERE user_id = $1 AND is_default = true AND id <> $2",
        )
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let company = sqlx::query_as::<_, CompanyProfile>(
            "UPDATE company_profiles SET is_default = true WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(company))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_user, repository_backends};

    fn company(name: &str, is_default: bool) -> NewCompanyProfile {
        NewCompanyProfile { company_name: name.to_string(), description: None, is_default }
    }

    #[tokio::test]
    async fn only_one_company_is_default_per_user() {
        for (backend, repos) in repository_backends().await {
            let user_id = new_user(&repos).await;
            let other_user = new_user(&repos).await;

            let acme = repos.settings.create_company(user_id, company("Acme", true)).await.unwrap();
            let globex = repos.settings.create_company(user_id, company("Globex", true)).await.unwrap();
            let foreign = repos.settings.create_company(other_user, company("Initech", true)).await.unwrap();

            let default = repos.settings.find_default_company(user_id).await.unwrap().unwrap();
            assert_eq!(default.id, globex.id, "{backend}");

            let switched = repos.settings.set_default_company(user_id, acme.id).await.unwrap().unwrap();
            assert!(switched.is_default, "{backend}");

            let defaults: Vec<Uuid> = repos
                .settings
                .list_companies(user_id)
                .await
                .unwrap()
                .into_iter()
                .filter(|c| c.is_default)
                .map(|c| c.id)
                .collect();
            assert_eq!(defaults, vec![acme.id], "{backend}");

            // O padrão de outro usuário não é afetado
            let other_default = repos.settings.find_default_company(other_user).await.unwrap().unwrap();
            assert_eq!(other_default.id, foreign.id, "{backend}");
        }
    }

    #[tokio::test]
    async fn set_default_ignores_unknown_and_foreign_companies() {
        for (backend, repos) in repository_backends().await {
            let user_id = new_user(&repos).await;
            let other_user = new_user(&repos).await;

            let mine = repos.settings.create_company(user_id, company("Acme", true)).await.unwrap();
            let foreign = repos.settings.create_company(other_user, company("Initech", false)).await.unwrap();

            assert!(repos.settings.set_default_company(user_id, Uuid::new_v4()).await.unwrap().is_none());
            assert!(repos.settings.set_default_company(user_id, foreign.id).await.unwrap().is_none());

            let default = repos.settings.find_default_company(user_id).await.unwrap().unwrap();
            assert_eq!(default.id, mine.id, "{backend}");
        }
    }

    #[tokio::test]
    async fn deactivated_numbers_leave_the_active_list() {
        for (backend, repos) in repository_backends().await {
            let user_id = new_user(&repos).await;
            let number = repos
                .settings
                .create_phone_number(user_id, NewPhoneNumber { phone_number: "+15559999".into(), label: None })
                .await
                .unwrap();

            let deactivated = repos.settings.deactivate_phone_number(user_id, number.id).await.unwrap().unwrap();
            assert!(!deactivated.is_active, "{backend}");
            assert!(repos.settings.list_active_phone_numbers(user_id).await.unwrap().is_empty(), "{backend}");

            // Continua encontrável para as chamadas antigas
            let kept = repos.settings.find_phone_number(user_id, number.id).await.unwrap();
            assert!(kept.is_some(), "{backend}");
        }
    }
}
