// src/services/call_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    common::error::{field_error, AppError, Resource},
    db::{CallRepository, CandidateRepository, SettingsRepository},
    integrations::{bolna::ProviderCallRequest, VoiceCallProvider},
    models::{
        call::{Call, CallChanges, CallFilter, CallOutcome, CallStatus, NewCall},
        candidate::{Candidate, CandidateChanges, CandidateStatus},
        settings::CompanyProfile,
    },
};

/// Pedido de chamada já desserializado pelo handler.
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    pub agent_id: String,
    pub recipient_phone: Option<String>,
    pub from_phone: Option<String>,
    pub user_data: Option<Map<String, Value>>,
    pub candidate_id: Option<Uuid>,
    pub phone_number_id: Option<Uuid>,
    pub company_profile_id: Option<Uuid>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub call: Call,
    // `None` quando a chamada veio de uma chave de idempotência já usada
    pub provider_response: Option<Value>,
    pub replayed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CallUpdate {
    pub status: Option<CallStatus>,
    pub outcome: Option<CallOutcome>,
    pub notes: Option<String>,
}

// Uma trava por (usuário, chave de idempotência) em uso
type KeyLocks = Arc<Mutex<HashMap<(Uuid, String), Arc<Mutex<()>>>>>;

#[derive(Clone)]
pub struct CallService {
    calls: Arc<dyn CallRepository>,
    candidates: Arc<dyn CandidateRepository>,
    settings: Arc<dyn SettingsRepository>,
    provider: Arc<dyn VoiceCallProvider>,
    key_locks: KeyLocks,
}

impl CallService {
    pub fn new(
        calls: Arc<dyn CallRepository>,
        candidates: Arc<dyn CandidateRepository>,
        settings: Arc<dyn SettingsRepository>,
        provider: Arc<dyn VoiceCallProvider>,
    ) -> Self {
        Self { calls, candidates, settings, provider, key_locks: KeyLocks::default() }
    }

    // =========================================================================
    //  DISPARO
    // =========================================================================

    /// Envia a chamada ao provedor uma única vez e registra o resultado.
    /// Se o provedor recusar, nenhum registro é criado.
    ///
    /// Pedidos com a mesma chave de idempotência são serializados: o segundo
    /// espera o primeiro terminar e recebe a chamada já registrada.
    pub async fn dispatch(&self, user_id: Uuid, request: DispatchRequest) -> Result<DispatchOutcome, AppError> {
        let Some(key) = non_blank(request.idempotency_key.as_deref()) else {
            return self.dispatch_once(user_id, request, None).await;
        };

        let slot = {
            let mut locks = self.key_locks.lock().await;
            locks.entry((user_id, key.clone())).or_default().clone()
        };

        let result = {
            let _guard = slot.lock().await;
            self.dispatch_once(user_id, request, Some(key.clone())).await
        };

        // Remove a trava quando ninguém mais está esperando por ela
        let mut locks = self.key_locks.lock().await;
        if Arc::strong_count(&slot) == 2 {
            locks.remove(&(user_id, key));
        }

        result
    }

    async fn dispatch_once(
        &self,
        user_id: Uuid,
        request: DispatchRequest,
        idempotency_key: Option<String>,
    ) -> Result<DispatchOutcome, AppError> {
        if let Some(key) = &idempotency_key {
            if let Some(existing) = self.calls.find_by_idempotency_key(user_id, key).await? {
                info!("🔁 Chave de idempotência repetida, devolvendo chamada {}", existing.id);
                return Ok(DispatchOutcome { call: existing, provider_response: None, replayed: true });
            }
        }

        let agent_id = non_blank(Some(request.agent_id.as_str())).ok_or_else(|| field_error("agent_id", "required"))?;

        // 1. Resolve o contexto (candidato, número de origem, empresa)
        let candidate = match request.candidate_id {
            Some(id) => Some(
                self.candidates
                    .find_by_id(user_id, id)
                    .await?
                    .ok_or(AppError::NotFound(Resource::Candidate))?,
            ),
            None => None,
        };

        let recipient_phone = non_blank(request.recipient_phone.as_deref())
            .or_else(|| candidate.as_ref().map(|c| c.phone.clone()))
            .ok_or_else(|| field_error("recipient_phone", "required"))?;

        let phone_number = match request.phone_number_id {
            Some(id) => {
                let number = self
                    .settings
                    .find_phone_number(user_id, id)
                    .await?
                    .ok_or(AppError::NotFound(Resource::PhoneNumber))?;
                if !number.is_active {
                    return Err(field_error("phone_number_id", "inactive"));
                }
                Some(number)
            }
            None => None,
        };

        let from_phone = non_blank(request.from_phone.as_deref())
            .or_else(|| phone_number.as_ref().map(|p| p.phone_number.clone()));

        let company = match request.company_profile_id {
            Some(id) => Some(
                self.settings
                    .find_company(user_id, id)
                    .await?
                    .ok_or(AppError::NotFound(Resource::CompanyProfile))?,
            ),
            None => self.settings.find_default_company(user_id).await?,
        };

        // 2. Monta o payload e chama o provedor (sem retry)
        let payload = ProviderCallRequest {
            agent_id: agent_id.clone(),
            recipient_phone_number: recipient_phone.clone(),
            from_phone_number: from_phone,
            user_data: call_context(candidate.as_ref(), company.as_ref(), request.user_data),
        };

        let ack = match self.provider.make_call(&payload).await {
            Ok(ack) => ack,
            Err(e) => {
                warn!("❌ Provedor recusou a chamada para {}: {}", recipient_phone, e);
                return Err(e.into());
            }
        };

        if ack.call_id.is_none() {
            warn!("⚠️ Provedor aceitou a chamada sem devolver um ID: {}", ack.raw);
        }

        // 3. Registra a chamada
        let created = self
            .calls
            .create(
                user_id,
                NewCall {
                    candidate_id: candidate.as_ref().map(|c| c.id),
                    phone_number_id: phone_number.as_ref().map(|p| p.id),
                    company_profile_id: company.as_ref().map(|c| c.id),
                    agent_id,
                    recipient_phone,
                    provider_call_id: ack.call_id.clone(),
                    idempotency_key: idempotency_key.clone(),
                    status: CallStatus::from_provider(ack.status.as_deref()),
                },
            )
            .await;

        let call = match (created, idempotency_key) {
            (Ok(call), _) => call,
            // Outra instância do servidor registrou a mesma chave primeiro
            (Err(AppError::DuplicateIdempotencyKey), Some(key)) => {
                let existing = self
                    .calls
                    .find_by_idempotency_key(user_id, &key)
                    .await?
                    .ok_or(AppError::DuplicateIdempotencyKey)?;
                warn!(
                    "⚠️ Chave {} registrada em paralelo; chamada {:?} do provedor ficou sem registro",
                    key, ack.call_id
                );
                return Ok(DispatchOutcome { call: existing, provider_response: Some(ack.raw), replayed: true });
            }
            (Err(e), _) => return Err(e),
        };

        info!("📞 Chamada {} registrada (provedor: {:?}, status: {:?})", call.id, call.provider_call_id, call.status);

        // 4. Candidato novo passa para "contacted"
        if let Some(candidate) = candidate.filter(|c| c.status == CandidateStatus::New) {
            let promoted = self
                .candidates
                .update(user_id, candidate.id, CandidateChanges::status(CandidateStatus::Contacted))
                .await;
            if let Err(e) = promoted {
                // A chamada já foi feita; não desfazemos o registro por causa disso
                error!("Falha ao marcar candidato {} como contatado: {}", candidate.id, e);
            }
        }

        Ok(DispatchOutcome { call, provider_response: Some(ack.raw), replayed: false })
    }

    // =========================================================================
    //  REGISTROS
    // =========================================================================

    pub async fn list_calls(&self, user_id: Uuid, filter: &CallFilter) -> Result<Vec<Call>, AppError> {
        self.calls.list(user_id, filter).await
    }

    pub async fn get_call(&self, user_id: Uuid, id: Uuid) -> Result<Call, AppError> {
        self.calls
            .find_by_id(user_id, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Call))
    }

    /// Registra resultado/notas/status. Um resultado sempre leva a `completed`,
    /// mesmo vindo de outro estado final (ex: `no_answer` + `voicemail`).
    pub async fn update_call(&self, user_id: Uuid, id: Uuid, update: CallUpdate) -> Result<Call, AppError> {
        let call = self.get_call(user_id, id).await?;

        let target = match (update.outcome, update.status) {
            (Some(_), Some(status)) if status != CallStatus::Completed => {
                return Err(field_error("status", "outcome_requires_completed"));
            }
            (Some(_), _) => Some(CallStatus::Completed),
            (None, status) => status,
        };

        let mut changes = CallChanges {
            outcome: update.outcome,
            notes: update.notes,
            ..Default::default()
        };

        if let Some(next) = target {
            if update.outcome.is_none() && !call.status.can_transition_to(next) {
                return Err(AppError::InvalidStatusTransition { from: call.status, to: next });
            }
            changes.status = Some(next);
            if next.is_terminal() && call.ended_at.is_none() {
                changes.ended_at = Some(Utc::now().max(call.started_at));
            }
        }

        self.calls
            .update(user_id, id, changes)
            .await?
            .ok_or(AppError::NotFound(Resource::Call))
    }

    /// Busca a transcrição no provedor e guarda no registro da chamada, junto
    /// com a duração e o resumo quando o provedor os informa.
    pub async fn sync_transcript(&self, user_id: Uuid, id: Uuid) -> Result<Call, AppError> {
        let call = self.get_call(user_id, id).await?;
        let provider_call_id = call.provider_call_id.ok_or(AppError::MissingProviderCallId)?;

        let raw = self.provider.get_transcript(&provider_call_id).await?;
        let mut changes = CallChanges {
            transcript: Some(transcript_text(&raw)),
            ..Default::default()
        };

        // Detalhes são complementares: sem eles a transcrição ainda é salva
        match self.provider.get_call(&provider_call_id).await {
            Ok(details) => {
                changes.duration_seconds = call_duration(&details);
                changes.summary = call_summary(&details);
            }
            Err(e) => warn!("⚠️ Não foi possível obter os detalhes da chamada {}: {}", provider_call_id, e),
        }

        self.calls
            .update(user_id, id, changes)
            .await?
            .ok_or(AppError::NotFound(Resource::Call))
    }

    // =========================================================================
    //  PROXY DO PROVEDOR
    // =========================================================================

    pub async fn list_agents(&self) -> Result<Value, AppError> {
        Ok(self.provider.list_agents().await?)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Value, AppError> {
        Ok(self.provider.get_agent(agent_id).await?)
    }

    // As rotas por chamada só alcançam chamadas registradas pelo próprio usuário
    async fn owned_provider_call_id(&self, user_id: Uuid, provider_call_id: &str) -> Result<String, AppError> {
        self.calls
            .find_by_provider_call_id(user_id, provider_call_id)
            .await?
            .and_then(|call| call.provider_call_id)
            .ok_or(AppError::NotFound(Resource::Call))
    }

    pub async fn provider_call(&self, user_id: Uuid, provider_call_id: &str) -> Result<Value, AppError> {
        let provider_call_id = self.owned_provider_call_id(user_id, provider_call_id).await?;
        Ok(self.provider.get_call(&provider_call_id).await?)
    }

    pub async fn end_provider_call(&self, user_id: Uuid, provider_call_id: &str) -> Result<Value, AppError> {
        let provider_call_id = self.owned_provider_call_id(user_id, provider_call_id).await?;
        info!("🛑 Encerrando chamada {} no provedor", provider_call_id);
        Ok(self.provider.end_call(&provider_call_id).await?)
    }

    pub async fn provider_transcript(&self, user_id: Uuid, provider_call_id: &str) -> Result<Value, AppError> {
        let provider_call_id = self.owned_provider_call_id(user_id, provider_call_id).await?;
        Ok(self.provider.get_transcript(&provider_call_id).await?)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Contexto enviado ao agente. O que veio em `user_data` tem precedência.
fn call_context(
    candidate: Option<&Candidate>,
    company: Option<&CompanyProfile>,
    user_data: Option<Map<String, Value>>,
) -> Map<String, Value> {
    let mut context = Map::new();

    if let Some(candidate) = candidate {
        context.insert("candidate_name".into(), Value::String(candidate.full_name.clone()));
        if let Some(job_title) = &candidate.job_title {
            context.insert("job_title".into(), Value::String(job_title.clone()));
        }
    }
    if let Some(company) = company {
        context.insert("company_name".into(), Value::String(company.company_name.clone()));
    }

    context.extend(user_data.unwrap_or_default());
    context
}

fn transcript_text(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.clone(),
        Value::Object(obj) => match obj.get("transcript") {
            Some(Value::String(text)) => text.clone(),
            _ => raw.to_string(),
        },
        _ => raw.to_string(),
    }
}

/// Duração em segundos: `conversation_duration`, `conversation_time` ou
/// `telephony_data.duration`, como número ou texto numérico.
fn call_duration(details: &Value) -> Option<i32> {
    let candidates = [
        details.get("conversation_duration"),
        details.get("conversation_time"),
        details.get("duration"),
        details.get("telephony_data").and_then(|t| t.get("duration")),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|secs| secs.is_finite() && *secs >= 0.0 && *secs <= f64::from(i32::MAX))
        .map(|secs| secs.round() as i32)
}

fn call_summary(details: &Value) -> Option<String> {
    details
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
