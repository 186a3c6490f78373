//! Cliente HTTP do provedor de chamadas por voz (Bolna).
//!
//! Todas as operações usam autenticação Bearer com `BOLNA_API_KEY`. Nenhuma
//! operação é repetida automaticamente: a decisão de tentar de novo é de quem chamou.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

pub const DEFAULT_BASE_URL: &str = "https://api.bolna.dev/v2";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("BOLNA_API_KEY not configured")]
    NotConfigured,

    // Mensagem extraída da resposta do provedor, sem alteração
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Voice call provider did not respond within {0} seconds")]
    Timeout(u64),

    #[error("{0}")]
    Transport(String),

    #[error("Invalid response from voice call provider: {0}")]
    InvalidResponse(String),

    #[error("Invalid request to voice call provider: {0}")]
    InvalidRequest(String),
}

/// Corpo do `POST /call`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderCallRequest {
    pub agent_id: String,
    pub recipient_phone_number: String,
    // Sem número de origem o provedor usa um número gerenciado por ele
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_phone_number: Option<String>,
    pub user_data: Map<String, Value>,
}

/// Confirmação imediata do provedor (não é o fim da chamada).
#[derive(Debug, Clone)]
pub struct ProviderCallAck {
    pub call_id: Option<String>,
    pub status: Option<String>,
    pub raw: Value,
}

impl ProviderCallAck {
    pub fn from_response(raw: Value) -> Self {
        let call_id = ["id", "execution_id", "call_id"]
            .iter()
            .find_map(|key| raw.get(*key).and_then(value_as_id));
        let status = raw.get("status").and_then(Value::as_str).map(str::to_string);
        Self { call_id, status, raw }
    }
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Contrato do provedor externo. O `CallService` depende só deste trait.
#[async_trait]
pub trait VoiceCallProvider: Send + Sync {
    async fn make_call(&self, request: &ProviderCallRequest) -> Result<ProviderCallAck, ProviderError>;
    async fn get_call(&self, call_id: &str) -> Result<Value, ProviderError>;
    async fn end_call(&self, call_id: &str) -> Result<Value, ProviderError>;
    async fn get_transcript(&self, call_id: &str) -> Result<Value, ProviderError>;
    async fn list_agents(&self) -> Result<Value, ProviderError>;
    async fn get_agent(&self, agent_id: &str) -> Result<Value, ProviderError>;
}

#[derive(Clone)]
pub struct BolnaClient {
    client: Client,
    api_key: Option<String>,
    base_url: Url,
    timeout_secs: u64,
}

impl BolnaClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let timeout_secs = config.provider_timeout.as_secs();
        let client = Client::builder()
            .timeout(config.provider_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let base_url = Url::parse(&config.bolna_base_url)
            .with_context(|| format!("BOLNA_BASE_URL inválida: {}", config.bolna_base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("BOLNA_BASE_URL não pode ser usada como base: {}", config.bolna_base_url);
        }

        Ok(Self {
            client,
            api_key: config.bolna_api_key.clone(),
            base_url,
            timeout_secs,
        })
    }

    /// URL do endpoint. Cada segmento é codificado, então IDs vindos do
    /// cliente não conseguem mudar o caminho nem acrescentar query string.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidRequest("base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, segments: &[&str], body: Option<&ProviderCallRequest>) -> Result<Value, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;
        let url = self.endpoint(segments)?;

        debug!("Bolna {} {}", method, url);

        let mut request = self.client.request(method, url).bearer_auth(api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::Transport(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: extract_error_message(status, &text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

/// Mensagem de erro do provedor: `message`, depois `error`, depois o corpo cru.
pub(crate) fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = json.get(key).and_then(Value::as_str) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    } else if !body.trim().is_empty() {
        return body.trim().to_string();
    }

    format!("Bolna API error: {}", status.as_u16())
}

#[async_trait]
impl VoiceCallProvider for BolnaClient {
    async fn make_call(&self, request: &ProviderCallRequest) -> Result<ProviderCallAck, ProviderError> {
        info!(
            "📞 Solicitando chamada ao Bolna: agent={} to={} from={:?}",
            request.agent_id, request.recipient_phone_number, request.from_phone_number
        );
        let raw = self.send(Method::POST, &["call"], Some(request)).await?;
        Ok(ProviderCallAck::from_response(raw))
    }

    async fn get_call(&self, call_id: &str) -> Result<Value, ProviderError> {
        self.send(Method::GET, &["call", call_id], None).await
    }

    async fn end_call(&self, call_id: &str) -> Result<Value, ProviderError> {
        self.send(Method::POST, &["call", call_id, "end"], None).await
    }

    async fn get_transcript(&self, call_id: &str) -> Result<Value, ProviderError> {
        self.send(Method::GET, &["call", call_id, "transcript"], None).await
    }

    async fn list_agents(&self) -> Result<Value, ProviderError> {
        self.send(Method::GET, &["agents"], None).await
    }

    async fn get_agent(&self, agent_id: &str) -> Result<Value, ProviderError> {
        self.send(Method::GET, &["agents", agent_id], None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_omits_from_number_when_absent() {
        let request = ProviderCallRequest {
            agent_id: "agent-1".into(),
            recipient_phone_number: "+15550001".into(),
            from_phone_number: None,
            user_data: Map::new(),
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({ "agent_id": "agent-1", "recipient_phone_number": "+15550001", "user_data": {} })
        );
    }

    #[test]
    fn payload_includes_from_number_when_present() {
        let request = ProviderCallRequest {
            agent_id: "agent-1".into(),
            recipient_phone_number: "+15550001".into(),
            from_phone_number: Some("+15559999".into()),
            user_data: Map::new(),
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["from_phone_number"], "+15559999");
    }

    #[test]
    fn ack_reads_id_from_any_known_key() {
        let ack = ProviderCallAck::from_response(json!({ "execution_id": "exec-9", "status": "queued" }));
        assert_eq!(ack.call_id.as_deref(), Some("exec-9"));
        assert_eq!(ack.status.as_deref(), Some("queued"));

        let ack = ProviderCallAck::from_response(json!({ "id": 42 }));
        assert_eq!(ack.call_id.as_deref(), Some("42"));

        let ack = ProviderCallAck::from_response(json!({ "message": "done" }));
        assert!(ack.call_id.is_none());
    }

    #[test]
    fn error_message_prefers_message_then_error_then_body() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(extract_error_message(status, r#"{"message":"Invalid agent","error":"x"}"#), "Invalid agent");
        assert_eq!(extract_error_message(status, r#"{"error":"Quota exceeded"}"#), "Quota exceeded");
        assert_eq!(extract_error_message(status, "upstream exploded"), "upstream exploded");
        assert_eq!(extract_error_message(StatusCode::BAD_GATEWAY, ""), "Bolna API error: 502");
        assert_eq!(extract_error_message(status, r#"{"detail":[]}"#), "Bolna API error: 400");
    }

    #[test]
    fn endpoint_keeps_the_base_path() {
        let client = BolnaClient::new(&Config::for_tests()).unwrap();
        assert_eq!(client.endpoint(&["call"]).unwrap().as_str(), "https://api.bolna.dev/v2/call");

        let mut config = Config::for_tests();
        config.bolna_base_url = "http://localhost:9000/v2/".to_string();
        let client = BolnaClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(&["agents", "agent-1"]).unwrap().as_str(),
            "http://localhost:9000/v2/agents/agent-1"
        );
    }

    #[test]
    fn ids_cannot_escape_their_path_segment() {
        let client = BolnaClient::new(&Config::for_tests()).unwrap();

        let url = client.endpoint(&["call", "../../agents?all=1#x", "transcript"]).unwrap();

        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], "v2");
        assert_eq!(segments[1], "call");
        assert_eq!(segments[3], "transcript");
        assert!(!segments[2].contains('/'));
        assert!(!segments[2].contains('?'));
    }

    #[test]
    fn invalid_base_url_is_rejected_at_start_up() {
        let mut config = Config::for_tests();
        config.bolna_base_url = "not a url".to_string();
        assert!(BolnaClient::new(&config).is_err());

        config.bolna_base_url = "mailto:ops@example.com".to_string();
        assert!(BolnaClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let mut config = Config::for_tests();
        config.bolna_api_key = None;
        let client = BolnaClient::new(&config).unwrap();

        let err = client.list_agents().await.unwrap_err();
        assert_eq!(err.to_string(), "BOLNA_API_KEY not configured");
    }
}
