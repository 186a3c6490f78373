// src/models/call.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE call_status do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "call_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Initiated,
    Ringing,
    InProgress,
    Completed,
    Failed,
    NoAnswer,
    Busy,
}

impl CallStatus {
    // Posição no ciclo de vida. Todos os estados finais dividem o último degrau.
    fn stage(self) -> u8 {
        match self {
            CallStatus::Initiated => 0,
            CallStatus::Ringing => 1,
            CallStatus::InProgress => 2,
            CallStatus::Completed | CallStatus::Failed | CallStatus::NoAnswer | CallStatus::Busy => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.stage() == 3
    }

    /// Só avança. Reaplicar o mesmo estado é permitido; trocar um estado final
    /// por outro não.
    pub fn can_transition_to(self, next: CallStatus) -> bool {
        self == next || next.stage() > self.stage()
    }

    /// Estado inicial a partir do status informado pelo provedor no aceite.
    pub fn from_provider(status: Option<&str>) -> Self {
        match status.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if matches!(s.as_str(), "ringing" | "in-progress" | "in_progress" | "in progress") => {
                CallStatus::Ringing
            }
            _ => CallStatus::Initiated,
        }
    }
}

// Mapeia o CREATE TYPE call_outcome do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "call_outcome", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Interested,
    NotInterested,
    CallbackRequested,
    WrongNumber,
    Voicemail,
    NoResponse,
}

// --- CHAMADA ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Call {
    pub id: Uuid,
    #[schema(ignore)]
    pub user_id: Uuid,

    pub candidate_id: Option<Uuid>,
    pub phone_number_id: Option<Uuid>,
    pub company_profile_id: Option<Uuid>,

    #[schema(example = "agent_123")]
    pub agent_id: String,
    #[schema(example = "+14155550123")]
    pub recipient_phone: String,

    // ID da chamada no provedor (Bolna), usado para correlação
    pub provider_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,

    pub status: CallStatus,
    pub outcome: Option<CallOutcome>,
    pub duration_seconds: Option<i32>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub notes: Option<String>,

    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Registro criado após o aceite do provedor.
#[derive(Debug, Clone)]
pub struct NewCall {
    pub candidate_id: Option<Uuid>,
    pub phone_number_id: Option<Uuid>,
    pub company_profile_id: Option<Uuid>,
    pub agent_id: String,
    pub recipient_phone: String,
    pub provider_call_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub status: CallStatus,
}

/// Campos alterados numa atualização. O serviço já validou a transição.
#[derive(Debug, Clone, Default)]
pub struct CallChanges {
    pub status: Option<CallStatus>,
    pub outcome: Option<CallOutcome>,
    pub notes: Option<String>,
    pub transcript: Option<String>,
    pub duration_seconds: Option<i32>,
    pub summary: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl CallChanges {
    pub(crate) fn apply(self, call: &mut Call) {
        if let Some(v) = self.status {
            call.status = v;
        }
        if let Some(v) = self.outcome {
            call.outcome = Some(v);
        }
        if let Some(v) = self.notes {
            call.notes = Some(v);
        }
        if let Some(v) = self.transcript {
            call.transcript = Some(v);
        }
        if let Some(v) = self.duration_seconds {
            call.duration_seconds = Some(v);
        }
        if let Some(v) = self.summary {
            call.summary = Some(v);
        }
        if let Some(v) = self.ended_at {
            call.ended_at = Some(v);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallFilter {
    pub candidate_id: Option<Uuid>,
    pub status: Option<CallStatus>,
}

impl CallFilter {
    pub(crate) fn matches(&self, call: &Call) -> bool {
        self.candidate_id.is_none_or(|id| call.candidate_id == Some(id))
            && self.status.is_none_or(|status| call.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        use CallStatus::*;

        assert!(Initiated.can_transition_to(Ringing));
        assert!(Initiated.can_transition_to(Completed));
        assert!(Ringing.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(NoAnswer));

        assert!(!Ringing.can_transition_to(Initiated));
        assert!(!InProgress.can_transition_to(Ringing));
        assert!(!Completed.can_transition_to(InProgress));
    }

    #[test]
    fn terminal_states_only_accept_themselves() {
        use CallStatus::*;

        assert!(Completed.can_transition_to(Completed));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Busy.can_transition_to(NoAnswer));
        assert!(Busy.is_terminal());
        assert!(!Ringing.is_terminal());
    }

    #[test]
    fn provider_status_maps_to_initial_state() {
        assert_eq!(CallStatus::from_provider(Some("ringing")), CallStatus::Ringing);
        assert_eq!(CallStatus::from_provider(Some("In-Progress")), CallStatus::Ringing);
        assert_eq!(CallStatus::from_provider(Some("queued")), CallStatus::Initiated);
        assert_eq!(CallStatus::from_provider(None), CallStatus::Initiated);
    }

    #[test]
    fn unknown_outcome_is_rejected() {
        let parsed: Result<CallOutcome, _> = serde_json::from_str("\"maybe\"");
        assert!(parsed.is_err());

        let ok: CallOutcome = serde_json::from_str("\"callback_requested\"").unwrap();
        assert_eq!(ok, CallOutcome::CallbackRequested);
    }
}
