// src/services/settings_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    db::SettingsRepository,
    models::settings::{CompanyProfile, NewCompanyProfile, NewPhoneNumber, PhoneNumber},
};

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  NÚMEROS DE TELEFONE
    // =========================================================================

    pub async fn list_phone_numbers(&self, user_id: Uuid) -> Result<Vec<PhoneNumber>, AppError> {
        self.repo.list_active_phone_numbers(user_id).await
    }

    pub async fn create_phone_number(&self, user_id: Uuid, mut input: NewPhoneNumber) -> Result<PhoneNumber, AppError> {
        input.phone_number = input.phone_number.trim().to_string();
        self.repo.create_phone_number(user_id, input).await
    }

    pub async fn deactivate_phone_number(&self, user_id: Uuid, id: Uuid) -> Result<PhoneNumber, AppError> {
        self.repo
            .deactivate_phone_number(user_id, id)
            .await?
            .ok_or(AppError::NotFound(Resource::PhoneNumber))
    }

    // =========================================================================
    //  PERFIS DE EMPRESA
    // =========================================================================

    pub async fn list_companies(&self, user_id: Uuid) -> Result<Vec<CompanyProfile>, AppError> {
        self.repo.list_companies(user_id).await
    }

    pub async fn create_company(&self, user_id: Uuid, input: NewCompanyProfile) -> Result<CompanyProfile, AppError> {
        let company = self.repo.create_company(user_id, input).await?;
        if company.is_default {
            tracing::info!("🏢 Perfil {} definido como padrão", company.id);
        }
        Ok(company)
    }

    pub async fn set_default_company(&self, user_id: Uuid, id: Uuid) -> Result<CompanyProfile, AppError> {
        let company = self
            .repo
            .set_default_company(user_id, id)
            .await?
            .ok_or(AppError::NotFound(Resource::CompanyProfile))?;

        tracing::info!("🏢 Perfil {} definido como padrão", company.id);
        Ok(company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Repositories;

    fn company(name: &str, is_default: bool) -> NewCompanyProfile {
        NewCompanyProfile {
            company_name: name.to_string(),
            description: None,
            is_default,
        }
    }

    async fn defaults(service: &SettingsService, user_id: Uuid) -> Vec<String> {
        service
            .list_companies(user_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_default)
            .map(|c| c.company_name)
            .collect()
    }

    #[tokio::test]
    async fn new_default_replaces_previous_one() {
        let service = SettingsService::new(Repositories::in_memory().settings);
        let user_id = Uuid::new_v4();

        service.create_company(user_id, company("Acme", true)).await.unwrap();
        service.create_company(user_id, company("Globex", false)).await.unwrap();
        assert_eq!(defaults(&service, user_id).await, vec!["Acme"]);

        service.create_company(user_id, company("Initech", true)).await.unwrap();
        assert_eq!(defaults(&service, user_id).await, vec!["Initech"]);
    }

    #[tokio::test]
    async fn set_default_on_existing_profile_keeps_a_single_default() {
        let service = SettingsService::new(Repositories::in_memory().settings);
        let user_id = Uuid::new_v4();

        service.create_company(user_id, company("Acme", true)).await.unwrap();
        let globex = service.create_company(user_id, company("Globex", false)).await.unwrap();

        let updated = service.set_default_company(user_id, globex.id).await.unwrap();
        assert!(updated.is_default);
        assert_eq!(defaults(&service, user_id).await, vec!["Globex"]);

        let err = service.set_default_company(user_id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Resource::CompanyProfile)));
        assert_eq!(defaults(&service, user_id).await, vec!["Globex"]);
    }

    #[tokio::test]
    async fn defaults_are_scoped_per_user() {
        let service = SettingsService::new(Repositories::in_memory().settings);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        service.create_company(alice, company("Acme", true)).await.unwrap();
        service.create_company(bob, company("Globex", true)).await.unwrap();

        assert_eq!(defaults(&service, alice).await, vec!["Acme"]);
        assert_eq!(defaults(&service, bob).await, vec!["Globex"]);
    }

    #[tokio::test]
    async fn deactivated_numbers_leave_the_active_list() {
        let service = SettingsService::new(Repositories::in_memory().settings);
        let user_id = Uuid::new_v4();

        let number = service
            .create_phone_number(user_id, NewPhoneNumber { phone_number: " +15550100 ".into(), label: None })
            .await
            .unwrap();
        assert_eq!(number.phone_number, "+15550100");
        assert_eq!(service.list_phone_numbers(user_id).await.unwrap().len(), 1);

        let disabled = service.deactivate_phone_number(user_id, number.id).await.unwrap();
        assert!(!disabled.is_active);
        assert!(service.list_phone_numbers(user_id).await.unwrap().is_empty());
    }
}
