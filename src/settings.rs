//! The persisted settings document: shape, defaults, validation.
//!
//! `Settings` is the single JSON document the tool stores. The schema is
//! deliberately permissive at parse time (every top-level field has a
//! default, so a partial document parses), while constraint checks run
//! afterwards and report every violated field at once.
//!
//! Validation is structural only. Business rules like "the active provider
//! must be configured" belong to the command layer, which enforces them at
//! use time.
//!
//! # Examples
//!
//! ```
//! use ianai::settings::Settings;
//!
//! let settings = Settings::from_json(r#"{ "provider": "kimi" }"#).unwrap();
//! assert_eq!(settings.provider.as_str(), "kimi");
//! assert!(settings.providers.kimi.is_none());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::providers::{ProviderKind, ProviderTable};

/// One per-field validation failure, naming the deepest offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("settings.json: '{path}' {message}")]
pub struct Diagnostic {
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(path: &str, message: &str) -> Self {
        Self {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

/// Commit-message generation defaults. Owned by the commit collaborator;
/// only the defaults are seeded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxlength: Option<u8>,

    #[serde(rename = "type", default)]
    pub style: CommitStyle,
}

impl Default for Commitment {
    fn default() -> Self {
        Self {
            generate: Some(1),
            maxlength: Some(60),
            style: CommitStyle::Plain,
        }
    }
}

/// Commit message formatting style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitStyle {
    #[default]
    #[serde(rename = "")]
    Plain,
    #[serde(rename = "conventional")]
    Conventional,
}

/// The persisted settings document.
///
/// Written as pretty-printed JSON, always as a full-document overwrite.
/// Field names on the wire are camelCase where the records say so
/// (`apiKey`); the auxiliary maps are open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The currently active provider. Must name a configured provider to
    /// be usable, but that rule is enforced by `switch` and by the send
    /// path, not here.
    pub provider: ProviderKind,

    /// Per-provider configuration records.
    pub providers: ProviderTable,

    /// Open-ended auxiliary data, opaque to the core.
    pub metadata: BTreeMap<String, serde_json::Value>,

    /// Open-ended string map; the first-run flow stores additional
    /// request headers here.
    pub payload: BTreeMap<String, String>,

    /// Commit-message generation defaults.
    pub commitment: Commitment,

    /// Optional proxy URL for provider HTTP calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::ALL[0],
            providers: ProviderTable::default(),
            metadata: BTreeMap::new(),
            payload: BTreeMap::new(),
            commitment: Commitment::default(),
            proxy: None,
        }
    }
}

impl Settings {
    /// Parse and validate a raw settings document.
    ///
    /// Structural errors (wrong types, unknown enum values, missing
    /// required fields inside a provider record) surface as a single
    /// diagnostic carrying the deepest field path. After a successful
    /// parse, every constraint violation is collected and reported
    /// together.
    ///
    /// # Errors
    /// Returns the list of diagnostics; never partially succeeds.
    pub fn from_json(text: &str) -> Result<Settings, Vec<Diagnostic>> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        let settings: Settings = match serde_path_to_error::deserialize(&mut deserializer) {
            Ok(settings) => settings,
            Err(err) => {
                let path = err.path().to_string();
                let path = if path.is_empty() || path == "." {
                    "settings".to_string()
                } else {
                    path
                };
                return Err(vec![Diagnostic {
                    path,
                    message: strip_json_location(err.inner().to_string()),
                }]);
            }
        };

        let issues = settings.validate();
        if issues.is_empty() { Ok(settings) } else { Err(issues) }
    }

    /// Check field constraints, collecting every violation.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut issues = Vec::new();

        if let Some(kimi) = &self.providers.kimi {
            if Url::parse(&kimi.endpoint).is_err() {
                issues.push(Diagnostic::new("providers.kimi.endpoint", "must be a URL"));
            }
        }
        if let Some(gemini) = &self.providers.gemini {
            if let Some(endpoint) = &gemini.endpoint {
                if Url::parse(endpoint).is_err() {
                    issues.push(Diagnostic::new("providers.gemini.endpoint", "must be a URL"));
                }
            }
        }

        if let Some(generate) = self.commitment.generate {
            if generate > 10 {
                issues.push(Diagnostic::new(
                    "commitment.generate",
                    "must be less than or equal to 10",
                ));
            }
        }
        if let Some(maxlength) = self.commitment.maxlength {
            if maxlength > 100 {
                issues.push(Diagnostic::new(
                    "commitment.maxlength",
                    "must be less than or equal to 100",
                ));
            }
        }

        if let Some(proxy) = &self.proxy {
            if Url::parse(proxy).is_err() {
                issues.push(Diagnostic::new("proxy", "must be a URL"));
            }
        }

        issues
    }
}

// serde_json appends "at line N column M"; the path already locates the
// field, so the trailer is noise in diagnostics.
fn strip_json_location(message: String) -> String {
    match message.rfind(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message,
    }
}
