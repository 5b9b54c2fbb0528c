//! Thin HTTP bindings for the supported providers.
//!
//! This module is deliberately small vendor glue: it gates on the generic
//! "is the active provider configured" check, builds one reqwest client
//! (honoring the optional proxy), and speaks each vendor's wire shape just
//! enough to get a completion back as plain text.

use std::error::Error;

use reqwest::header::AUTHORIZATION;
use serde_json::{Value, json};
use tracing::debug;

use crate::providers::{GeminiConfig, KimiConfig, ProviderKind};
use crate::settings::Settings;

const GEMINI_DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const GEMINI_MODEL: &str = "gemini-2.5-flash";
const KIMI_MODEL: &str = "k2";

/// Send one message through the active provider and return the reply text.
///
/// # Errors
/// Fails when the active provider is not configured, or on any transport
/// or response-shape error from the vendor.
pub async fn send_message(settings: &Settings, message: &str) -> Result<String, Box<dyn Error>> {
    let kind = settings.provider;
    if !settings.providers.is_configured(kind) {
        return Err(format!("{kind} is not configured. Run \"ai init\" to configure.").into());
    }

    let client = build_client(settings)?;
    match kind {
        ProviderKind::Kimi => {
            let config = settings
                .providers
                .kimi
                .as_ref()
                .ok_or("kimi configuration missing")?;
            kimi_chat(&client, config, message).await
        }
        ProviderKind::Gemini => {
            let config = settings
                .providers
                .gemini
                .as_ref()
                .ok_or("gemini configuration missing")?;
            gemini_generate(&client, config, message).await
        }
    }
}

fn build_client(settings: &Settings) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut builder = reqwest::Client::builder();
    if let Some(proxy) = &settings.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

/// Open a Kimi chat, then stream a completion for it and collect the text.
async fn kimi_chat(
    client: &reqwest::Client,
    config: &KimiConfig,
    message: &str,
) -> Result<String, Box<dyn Error>> {
    let endpoint = config.endpoint.trim_end_matches('/');

    let opened: Value = client
        .post(format!("{endpoint}/chat"))
        .header(AUTHORIZATION, &config.api_key)
        .json(&json!({
            "name": "new chat",
            "is_example": false,
            "enter_method": "new_chat",
            "kimiplus_id": "kimi",
            "model": KIMI_MODEL,
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let chat_id = opened
        .get("id")
        .and_then(Value::as_str)
        .ok_or("kimi: chat id missing from response")?;
    debug!("opened kimi chat {chat_id}");

    let raw = client
        .post(format!("{endpoint}/chat/{chat_id}/completion/stream"))
        .header(AUTHORIZATION, &config.api_key)
        .json(&json!({
            "messages": [{ "role": "user", "content": message }],
            "use_search": false,
            "extend": { "sidebar": false },
            "kimiplus_id": "kimi",
            "use_research": false,
            "use_math": false,
            "refs": [],
            "refs_file": [],
            "model": KIMI_MODEL,
        }))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    extract_stream_content(&raw)
}

/// Accumulate the completion text out of a Kimi event stream body.
///
/// The stream is newline-separated `data: {...}` events; only `cmpl`
/// events carry text.
fn extract_stream_content(raw: &str) -> Result<String, Box<dyn Error>> {
    let mut content = String::new();
    for line in raw.lines() {
        let line = line.trim();
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let event: Value = serde_json::from_str(data.trim())
            .map_err(|_| "failed to parse endpoint response as JSON")?;
        if event.get("event").and_then(Value::as_str) == Some("cmpl") {
            if let Some(text) = event.get("text").and_then(Value::as_str) {
                content.push_str(text);
            }
        }
    }
    Ok(content)
}

/// One-shot Gemini generateContent call, honoring the optional endpoint
/// override.
async fn gemini_generate(
    client: &reqwest::Client,
    config: &GeminiConfig,
    message: &str,
) -> Result<String, Box<dyn Error>> {
    let base = config
        .endpoint
        .as_deref()
        .unwrap_or(GEMINI_DEFAULT_ENDPOINT)
        .trim_end_matches('/');
    let url = format!("{base}/v1beta/models/{GEMINI_MODEL}:generateContent");

    let response: Value = client
        .post(&url)
        .header("x-goog-api-key", &config.api_key)
        .json(&json!({ "contents": [{ "parts": [{ "text": message }] }] }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or("gemini: no candidates in response")?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    Ok(text)
}

/// Strip a Markdown code fence from around a model reply, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
