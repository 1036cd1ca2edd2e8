// src/mailer.rs

use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    ApiError(String),
}

/// A plain-text message to one or more recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

pub trait Mailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailerError>;
}

pub struct BrevoMailer {
    api_url: String,
    api_key: String,
    sender_email: String,
    sender_name: String,
    client: Client,
}

#[derive(Serialize)]
struct BrevoSender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct BrevoRecipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoPayload<'a> {
    sender: BrevoSender<'a>,
    to: Vec<BrevoRecipient<'a>>,
    subject: &'a str,
    text_content: &'a str,
}

impl BrevoMailer {
    pub fn new(
        api_url: String,
        api_key: String,
        sender_email: String,
        sender_name: String,
        timeout: Duration,
    ) -> Result<Self, MailerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailerError::RequestFailed(e.to_string()))?;

        Ok(Self {
            api_url,
            api_key,
            sender_email,
            sender_name,
            client,
        })
    }

    fn payload<'a>(&'a self, message: &'a EmailMessage) -> BrevoPayload<'a> {
        BrevoPayload {
            sender: BrevoSender {
                name: &self.sender_name,
                email: &self.sender_email,
            },
            to: message
                .to
                .iter()
                .map(|email| BrevoRecipient {
                    email: email.as_str(),
                })
                .collect(),
            subject: &message.subject,
            text_content: &message.body,
        }
    }
}

impl Mailer for BrevoMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        let resp = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&self.payload(message))
            .send()
            .map_err(|e| MailerError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(MailerError::ApiError(format!("{status} - {error_body}")));
        }

        Ok(())
    }
}
