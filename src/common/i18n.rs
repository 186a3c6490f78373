// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::LazyLock;

pub const DEFAULT_LANG: &str = "en";

// (código, inglês, português)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation_failed", "One or more fields are invalid.", "Um ou mais campos são inválidos."),
    ("invalid_payload", "The request could not be parsed.", "Não foi possível interpretar a requisição."),
    ("email_already_exists", "This e-mail is already in use.", "Este e-mail já está em uso."),
    ("invalid_credentials", "Invalid e-mail or password.", "E-mail ou senha inválidos."),
    ("invalid_token", "Missing or invalid authentication token.", "Token de autenticação inválido ou ausente."),
    ("candidate_not_found", "Candidate not found", "Candidato não encontrado"),
    ("call_not_found", "Call not found", "Chamada não encontrada"),
    ("phone_number_not_found", "Phone number not found", "Número de telefone não encontrado"),
    ("company_profile_not_found", "Company profile not found", "Perfil de empresa não encontrado"),
    ("invalid_status_transition", "Call status can only move forward.", "O status da chamada só pode avançar."),
    ("call_without_provider_id", "This call has no provider call id yet.", "Esta chamada ainda não possui ID no provedor."),
    ("duplicate_idempotency_key", "This idempotency key was already used.", "Esta chave de idempotência já foi usada."),
    ("internal_error", "An unexpected error occurred.", "Ocorreu um erro inesperado."),
];

/// Catálogo de mensagens por idioma, carregado uma vez na inicialização.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

static SHARED: LazyLock<I18nStore> = LazyLock::new(I18nStore::new);

impl I18nStore {
    pub fn new() -> Self {
        let mut en = HashMap::new();
        let mut pt = HashMap::new();
        for (code, en_msg, pt_msg) in MESSAGES {
            en.insert(*code, *en_msg);
            pt.insert(*code, *pt_msg);
        }

        let mut catalogs = HashMap::new();
        catalogs.insert("en", en);
        catalogs.insert("pt", pt);
        Self { catalogs }
    }

    /// Instância usada quando não há estado disponível (ex: rejeições de extratores).
    pub fn shared() -> &'static I18nStore {
        &SHARED
    }

    /// Traduz `code` para `lang`, caindo para o inglês quando o idioma não é suportado.
    pub fn translate(&self, lang: &str, code: &str) -> Option<&'static str> {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(code))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(code)))
            .copied()
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_known_codes_and_falls_back_to_english() {
        let store = I18nStore::new();

        assert_eq!(store.translate("pt", "candidate_not_found"), Some("Candidato não encontrado"));
        assert_eq!(store.translate("fr", "candidate_not_found"), Some("Candidate not found"));
        assert_eq!(store.translate("en", "no_such_code"), None);
    }
}
