//! SendGrid-backed provider.

use async_trait::async_trait;
use dispatch_log::debug;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::{Envelope, ErrorClass, Provider, ProviderError, Result, SendOutcome};

/// SendGrid configuration.
#[derive(Debug, Clone)]
pub struct SendgridConfig {
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl SendgridConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: "https://api.sendgrid.com/v3/mail/send".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Provider implementation backed by SendGrid's v3 mail/send API.
pub struct SendgridProvider {
    client: Client,
    config: SendgridConfig,
}

impl SendgridProvider {
    pub fn new(config: SendgridConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Provider for SendgridProvider {
    async fn send(&self, envelope: &Envelope) -> Result<SendOutcome> {
        envelope.validate()?;

        let payload = SendgridPayload::from_envelope(envelope);

        debug!(
            to = ?envelope.to.iter().map(|a| &a.email).collect::<Vec<_>>(),
            subject = %envelope.subject,
            "sending envelope via sendgrid"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let message_id = response
                .headers()
                .get("x-message-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Ok(SendOutcome::ok(message_id.unwrap_or_default()));
        }

        if status.as_u16() == 429 {
            return Ok(SendOutcome::failed("rate_limited", ErrorClass::RateLimited));
        }

        let class = if status.is_server_error() {
            ErrorClass::Retryable
        } else {
            ErrorClass::Permanent
        };
        Ok(SendOutcome::failed(status.as_str().to_string(), class))
    }

    async fn is_healthy(&self) -> bool {
        self.client
            .get("https://api.sendgrid.com/v3/scopes")
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[derive(Debug, Serialize)]
struct SendgridPayload {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<EmailAddress>,
    subject: String,
    content: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    categories: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

impl SendgridPayload {
    fn from_envelope(envelope: &Envelope) -> Self {
        let mut content = Vec::new();
        if let Some(text) = &envelope.text {
            content.push(Content {
                content_type: "text/plain".to_string(),
                value: text.clone(),
            });
        }
        content.push(Content {
            content_type: "text/html".to_string(),
            value: envelope.html.clone(),
        });

        Self {
            personalizations: vec![Personalization {
                to: envelope
                    .to
                    .iter()
                    .map(|a| EmailAddress {
                        email: a.email.clone(),
                        name: a.name.clone(),
                    })
                    .collect(),
            }],
            from: EmailAddress {
                email: envelope.from.email.clone(),
                name: envelope.from.name.clone(),
            },
            reply_to: envelope.reply_to.as_ref().map(|a| EmailAddress {
                email: a.email.clone(),
                name: a.name.clone(),
            }),
            subject: envelope.subject.clone(),
            content,
            categories: envelope.tags.clone(),
        }
    }
}
