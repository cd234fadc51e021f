//! # Asistente conversacional
//!
//! Cliente mínimo para la API REST de Gemini (`generateContent`), sin SDK.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::AppConfig;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Error de transporte con el servicio de IA: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("El servicio de IA respondió {status}: {body}")]
    Api { status: u16, body: String },
}

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Devuelve el texto generado; cadena vacía si el servicio no produjo texto
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError>;
}

pub struct GeminiAssistant {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiAssistant {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Assistant for GeminiAssistant {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model);
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.text())
    }
}

/// `None` si no hay clave configurada
pub fn from_config(config: &AppConfig) -> Option<Box<dyn Assistant>> {
    match &config.gemini_api_key {
        Some(key) => Some(Box::new(GeminiAssistant::new(key.clone(), config.gemini_model.clone()))),
        None => {
            tracing::warn!("GOOGLE_GEMINI_API_KEY no configurada, el chat no estará disponible");
            None
        }
    }
}

/// Construye el prompt con el contexto del usuario si hay sesión
pub fn build_prompt(username: Option<&str>, message: &str) -> String {
    let context = username
        .map(|name| format!("User: {}. ", name))
        .unwrap_or_default();
    format!(
        "{}You are a helpful hotel assistant. Answer briefly and clearly. Message: {}",
        context, message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_username_when_present() {
        let prompt = build_prompt(Some("alice"), "Is breakfast included?");
        assert!(prompt.starts_with("User: alice. You are a helpful hotel assistant."));
        assert!(prompt.ends_with("Message: Is breakfast included?"));
    }

    #[test]
    fn prompt_without_session() {
        let prompt = build_prompt(None, "hello");
        assert!(prompt.starts_with("You are a helpful hotel assistant."));
    }

    #[test]
    fn extracts_text_from_first_candidate() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Check-in "},{"text":"is at 3pm."}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "Check-in is at 3pm.");
    }

    #[test]
    fn missing_candidates_yield_empty_text() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.text(), "");
    }
}
