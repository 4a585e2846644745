//! Outgoing email.
//!
//! `HttpMailer` posts to a JSON email API (Resend-compatible payload).
//! Without an API key the server falls back to `LogMailer`, which only logs.

use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use serde::Serialize;

use crate::config::MailConfig;
use crate::utils::error::{AppError, AppResult};

const REQUEST_TIMEOUT_SECS: u64 = 15;
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()>;
}

pub fn from_config(config: &MailConfig) -> AppResult<Arc<dyn Mailer>> {
    match &config.api_key {
        Some(api_key) => {
            tracing::info!(api_url = %config.api_url, "Mail: sending through HTTP API");
            Ok(Arc::new(HttpMailer::new(
                config.api_url.clone(),
                api_key.clone(),
                config.from.clone(),
            )?))
        }
        None => {
            tracing::warn!("Mail: MAIL_API_KEY not set, emails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::InternalServerError(format!("Mail client: {}", e)))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&SendEmailRequest {
                from: &self.from,
                to: [email.to.as_str()],
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Email API unreachable: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(to = %email.to, "Email accepted");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        Err(AppError::ExternalServiceError(format!(
            "Email API returned {}: {}",
            status, body
        )))
    }
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.html.len(),
            "Email (log only)"
        );
        Ok(())
    }
}
