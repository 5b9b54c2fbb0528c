//! Provider registry and interactive configuration.
//!
//! The set of chat providers is a closed enumeration. Each provider carries
//! its own config record with its own required fields: Kimi needs an
//! endpoint (defaulted) and an API key, Gemini needs only an API key with
//! an optional endpoint override. Modelling the records as distinct types
//! keeps states like "a gemini entry with a kimi-only field" unrepresentable.
//!
//! [`configure`] drives the per-provider prompt sequence and returns the
//! resulting record. It never reads or writes the settings document; callers
//! merge the result into [`ProviderTable`] themselves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompt::{Prompt, PromptError};

/// Default chat endpoint for the Kimi provider.
pub const KIMI_DEFAULT_ENDPOINT: &str = "https://kimi.moonshot.cn/api";

/// Identifier of a supported provider.
///
/// `ALL` is the registry: stable order, used for prompt menus and for any
/// logic that must range over every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Kimi,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Kimi, ProviderKind::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Kimi => "kimi",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Comma-separated list of every registered identifier, for messages.
    pub fn registry_names() -> String {
        Self::ALL
            .iter()
            .map(ProviderKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no registered provider.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown provider '{0}'")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Kimi provider configuration. Both fields are required for the provider
/// to count as configured; the endpoint falls back to
/// [`KIMI_DEFAULT_ENDPOINT`] when the persisted document omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KimiConfig {
    #[serde(default = "default_kimi_endpoint")]
    pub endpoint: String,
    pub api_key: String,
}

fn default_kimi_endpoint() -> String {
    KIMI_DEFAULT_ENDPOINT.to_string()
}

/// Gemini provider configuration. Only the API key is required; the
/// endpoint, when present, overrides the vendor default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub api_key: String,
}

/// One provider's configuration, tagged by provider identity.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    Kimi(KimiConfig),
    Gemini(GeminiConfig),
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::Kimi(_) => ProviderKind::Kimi,
            ProviderConfig::Gemini(_) => ProviderKind::Gemini,
        }
    }
}

/// Per-provider config records of the settings document. An absent entry
/// means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kimi: Option<KimiConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,
}

impl ProviderTable {
    /// Merge exactly one provider's record, replacing any previous entry.
    pub fn insert(&mut self, config: ProviderConfig) {
        match config {
            ProviderConfig::Kimi(kimi) => self.kimi = Some(kimi),
            ProviderConfig::Gemini(gemini) => self.gemini = Some(gemini),
        }
    }

    /// Whether `kind` has its full required-credential set stored.
    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Kimi => self
                .kimi
                .as_ref()
                .is_some_and(|c| !c.api_key.is_empty() && !c.endpoint.is_empty()),
            ProviderKind::Gemini => self.gemini.as_ref().is_some_and(|c| !c.api_key.is_empty()),
        }
    }
}

/// Drive the interactive configuration dialog for `kind`.
///
/// Kimi: endpoint with a hard-coded default, then a mandatory key.
/// Gemini: optional endpoint override, then a mandatory key. Mandatory
/// answers re-prompt until non-empty.
pub fn configure(kind: ProviderKind, prompt: &mut dyn Prompt) -> Result<ProviderConfig, PromptError> {
    match kind {
        ProviderKind::Kimi => {
            let answer = prompt.ask(&format!("Kimi API endpoint [{KIMI_DEFAULT_ENDPOINT}]:"))?;
            let endpoint = match answer.trim() {
                "" => KIMI_DEFAULT_ENDPOINT.to_string(),
                other => other.to_string(),
            };
            let api_key = ask_required(prompt, "Kimi API key:")?;
            Ok(ProviderConfig::Kimi(KimiConfig { endpoint, api_key }))
        }
        ProviderKind::Gemini => {
            let answer = prompt.ask("Gemini API endpoint (leave empty for the default):")?;
            let endpoint = match answer.trim() {
                "" => None,
                other => Some(other.to_string()),
            };
            let api_key = ask_required(prompt, "Gemini API key:")?;
            Ok(ProviderConfig::Gemini(GeminiConfig { endpoint, api_key }))
        }
    }
}

fn ask_required(prompt: &mut dyn Prompt, question: &str) -> Result<String, PromptError> {
    loop {
        let answer = prompt.ask(question)?;
        let answer = answer.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;

    #[test]
    fn registry_is_stable_and_parses_back() {
        assert_eq!(ProviderKind::ALL[0], ProviderKind::Kimi);
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        assert_eq!(ProviderKind::registry_names(), "kimi, gemini");
    }

    #[test]
    fn unknown_provider_name_is_rejected() {
        let err = "claude".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err, UnknownProvider("claude".to_string()));
    }

    #[test]
    fn empty_api_key_does_not_count_as_configured() {
        let mut table = ProviderTable::default();
        table.insert(ProviderConfig::Gemini(GeminiConfig {
            endpoint: None,
            api_key: String::new(),
        }));
        assert!(!table.is_configured(ProviderKind::Gemini));

        table.insert(ProviderConfig::Gemini(GeminiConfig {
            endpoint: None,
            api_key: "g-key".to_string(),
        }));
        assert!(table.is_configured(ProviderKind::Gemini));
        assert!(!table.is_configured(ProviderKind::Kimi));
    }

    #[test]
    fn configure_kimi_defaults_the_endpoint() {
        let mut prompt = ScriptedPrompt::new(["", "sk-kimi"]);
        let config = configure(ProviderKind::Kimi, &mut prompt).unwrap();
        match config {
            ProviderConfig::Kimi(kimi) => {
                assert_eq!(kimi.endpoint, KIMI_DEFAULT_ENDPOINT);
                assert_eq!(kimi.api_key, "sk-kimi");
            }
            other => panic!("expected kimi config, got {other:?}"),
        }
    }

    #[test]
    fn configure_reprompts_for_a_mandatory_key() {
        let mut prompt = ScriptedPrompt::new(["https://kimi.example/api", "", "  ", "sk-kimi"]);
        let config = configure(ProviderKind::Kimi, &mut prompt).unwrap();
        match config {
            ProviderConfig::Kimi(kimi) => {
                assert_eq!(kimi.endpoint, "https://kimi.example/api");
                assert_eq!(kimi.api_key, "sk-kimi");
            }
            other => panic!("expected kimi config, got {other:?}"),
        }
    }

    #[test]
    fn configure_gemini_keeps_an_explicit_endpoint() {
        let mut prompt = ScriptedPrompt::new(["https://proxy.example/gemini", "g-key"]);
        let config = configure(ProviderKind::Gemini, &mut prompt).unwrap();
        match config {
            ProviderConfig::Gemini(gemini) => {
                assert_eq!(gemini.endpoint.as_deref(), Some("https://proxy.example/gemini"));
                assert_eq!(gemini.api_key, "g-key");
            }
            other => panic!("expected gemini config, got {other:?}"),
        }
    }

    #[test]
    fn kimi_endpoint_defaults_when_absent_from_json() {
        let kimi: KimiConfig = serde_json::from_str(r#"{ "apiKey": "sk" }"#).unwrap();
        assert_eq!(kimi.endpoint, KIMI_DEFAULT_ENDPOINT);
    }
}
