//! # Correo transaccional
//!
//! El envío se hace contra un relay HTTP (`MAIL_API_URL`) con una petición JSON.
//! Sin relay configurado se usa [`LogMailer`], que solo deja constancia en el log.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Error de transporte enviando correo: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("El relay de correo respondió {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_key: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let mut request = self.client.post(&self.endpoint).json(&OutgoingMail {
            from: &self.from,
            to: [to],
            subject,
            text: body,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = to, subject = subject, "Correo enviado");
        Ok(())
    }
}

/// Mailer de desarrollo: no envía nada
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        tracing::info!(to = to, subject = subject, body = body, "Correo (sin relay configurado)");
        Ok(())
    }
}

pub fn from_config(config: &AppConfig) -> Box<dyn Mailer> {
    match &config.mail_api_url {
        Some(url) => Box::new(HttpMailer::new(
            url.clone(),
            config.mail_api_key.clone(),
            config.mail_from.clone(),
        )),
        None => {
            tracing::warn!("MAIL_API_URL no configurado, los correos solo se registrarán en el log");
            Box::new(LogMailer)
        }
    }
}

/// Envía un correo sin propagar el fallo: el error se registra y se descarta.
///
/// Devuelve `true` si el envío se completó.
pub async fn notify(mailer: &dyn Mailer, to: &str, subject: &str, body: &str) -> bool {
    match mailer.send(to, subject, body).await {
        Ok(()) => true,
        Err(e) => {
            crate::api::middleware::log_error_chain(&e, Some("sending email"));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), MailError> {
            Err(MailError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    #[actix_web::test]
    async fn notify_swallows_failures() {
        assert!(!notify(&FailingMailer, "guest@example.com", "Hi", "Body").await);
    }

    #[actix_web::test]
    async fn log_mailer_always_succeeds() {
        assert!(notify(&LogMailer, "guest@example.com", "Hi", "Body").await);
    }

    #[test]
    fn config_without_relay_falls_back() {
        let config = AppConfig::default();
        assert!(config.mail_api_url.is_none());
        let _mailer = from_config(&config);
    }
}
