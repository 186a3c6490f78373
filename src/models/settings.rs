// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::FromRow;
use utoipa::ToSchema;

// Número de origem das chamadas
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PhoneNumber {
    pub id: Uuid,
    #[schema(ignore)]
    pub user_id: Uuid,

    #[schema(example = "+14155550100")]
    pub phone_number: String,

    #[schema(example = "Recrutamento SP")]
    pub label: Option<String>,

    // Desativação é lógica: o registro continua referenciado pelas chamadas antigas
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// Identidade da empresa apresentada ao candidato durante a chamada
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CompanyProfile {
    pub id: Uuid,
    #[schema(ignore)]
    pub user_id: Uuid,

    #[schema(example = "Acme Talent")]
    pub company_name: String,

    #[schema(example = "Consultoria de recrutamento para times de engenharia")]
    pub description: Option<String>,

    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPhoneNumber {
    pub phone_number: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCompanyProfile {
    pub company_name: String,
    pub description: Option<String>,
    pub is_default: bool,
}
