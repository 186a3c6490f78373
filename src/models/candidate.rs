// src/models/candidate.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE candidate_status do banco
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "candidate_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    #[default]
    New,
    Contacted,
    Interested,
    NotInterested,
    Scheduled,
    Hired,
    Rejected,
}

// --- CANDIDATO ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Candidate {
    pub id: Uuid,
    #[schema(ignore)]
    pub user_id: Uuid,

    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(example = "+14155550123")]
    pub phone: String,
    pub email: Option<String>,

    #[schema(example = "Software Engineer")]
    pub job_title: Option<String>,
    #[schema(example = "Tech Corp")]
    pub company: Option<String>,
    pub location: Option<String>,

    // No Postgres é TEXT[], no Rust é Vec<String>
    #[schema(example = json!(["rust", "postgres"]))]
    pub skills: Option<Vec<String>>,
    pub notes: Option<String>,
    pub linkedin_url: Option<String>,
    pub resume_url: Option<String>,

    pub status: CandidateStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados já validados para inserir um candidato.
#[derive(Debug, Clone, Default)]
pub struct NewCandidate {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
    pub notes: Option<String>,
    pub linkedin_url: Option<String>,
    pub resume_url: Option<String>,
    pub status: CandidateStatus,
}

/// Atualização parcial: `None` mantém o valor atual.
#[derive(Debug, Clone, Default)]
pub struct CandidateChanges {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
    pub notes: Option<String>,
    pub linkedin_url: Option<String>,
    pub resume_url: Option<String>,
    pub status: Option<CandidateStatus>,
}

impl CandidateChanges {
    pub fn status(status: CandidateStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub(crate) fn apply(self, candidate: &mut Candidate) {
        if let Some(v) = self.full_name {
            candidate.full_name = v;
        }
        if let Some(v) = self.phone {
            candidate.phone = v;
        }
        if let Some(v) = self.email {
            candidate.email = Some(v);
        }
        if let Some(v) = self.job_title {
            candidate.job_title = Some(v);
        }
        if let Some(v) = self.company {
            candidate.company = Some(v);
        }
        if let Some(v) = self.location {
            candidate.location = Some(v);
        }
        if let Some(v) = self.skills {
            candidate.skills = Some(v);
        }
        if let Some(v) = self.notes {
            candidate.notes = Some(v);
        }
        if let Some(v) = self.linkedin_url {
            candidate.linkedin_url = Some(v);
        }
        if let Some(v) = self.resume_url {
            candidate.resume_url = Some(v);
        }
        if let Some(v) = self.status {
            candidate.status = v;
        }
    }
}

/// Filtros da listagem (`GET /api/candidates`)
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CandidateFilter {
    pub status: Option<CandidateStatus>,
    pub search: Option<String>,
}

impl CandidateFilter {
    pub(crate) fn matches(&self, candidate: &Candidate) -> bool {
        if let Some(status) = self.status {
            if candidate.status != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                [
                    Some(candidate.full_name.as_str()),
                    Some(candidate.phone.as_str()),
                    candidate.email.as_deref(),
                    candidate.job_title.as_deref(),
                    candidate.company.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&term))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, status: CandidateStatus) -> Candidate {
        let now = Utc::now();
        Candidate {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: name.to_string(),
            phone: "+15550001".to_string(),
            email: Some("jane@example.com".to_string()),
            job_title: Some("Backend Engineer".to_string()),
            company: None,
            location: None,
            skills: None,
            notes: None,
            linkedin_url: None,
            resume_url: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&CandidateStatus::NotInterested).unwrap();
        assert_eq!(json, "\"not_interested\"");

        let parsed: Result<CandidateStatus, _> = serde_json::from_str("\"active\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn filter_matches_status_and_search_case_insensitively() {
        let c = candidate("Jane Smith", CandidateStatus::Contacted);

        let by_status = CandidateFilter { status: Some(CandidateStatus::Contacted), search: None };
        assert!(by_status.matches(&c));

        let wrong_status = CandidateFilter { status: Some(CandidateStatus::Hired), search: None };
        assert!(!wrong_status.matches(&c));

        let by_title = CandidateFilter { status: None, search: Some("backend".to_string()) };
        assert!(by_title.matches(&c));

        let blank = CandidateFilter { status: None, search: Some("   ".to_string()) };
        assert!(blank.matches(&c));
    }

    #[test]
    fn changes_only_touch_given_fields() {
        let mut c = candidate("Jane Smith", CandidateStatus::New);
        CandidateChanges { notes: Some("ligar amanhã".to_string()), ..Default::default() }.apply(&mut c);

        assert_eq!(c.notes.as_deref(), Some("ligar amanhã"));
        assert_eq!(c.full_name, "Jane Smith");
        assert_eq!(c.status, CandidateStatus::New);
    }
}
