use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

const RESET_SUBJECT: &str = "Reset your EduPredict password";
const SERVER_TOKEN_HEADER: &str = "X-Postmark-Server-Token";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),
}

/// Outbound notification sink. Only reset links go out today.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_email(&self, to: &str, link: &str) -> Result<(), MailError>;
}

/// Delivers through the Postmark HTTP API.
pub struct PostmarkMailer {
    http: reqwest::Client,
    api_base: String,
    server_token: String,
    sender: String,
}

impl PostmarkMailer {
    pub fn new(
        http: reqwest::Client,
        api_base: String,
        server_token: String,
        sender: String,
    ) -> Self {
        Self {
            http,
            api_base,
            server_token,
            sender,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: String,
    message_stream: &'a str,
}

#[async_trait]
impl Mailer for PostmarkMailer {
    async fn send_reset_email(&self, to: &str, link: &str) -> Result<(), MailError> {
        let body = SendEmailRequest {
            from: &self.sender,
            to,
            subject: RESET_SUBJECT,
            text_body: format!(
                "Click the link to reset your password: {link}\nIf you did not request this, you can ignore it."
            ),
            message_stream: "outbound",
        };

        self.http
            .post(format!("{}/email", self.api_base))
            .header(SERVER_TOKEN_HEADER, self.server_token.as_str())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        debug!(%to, "reset email accepted for delivery");
        Ok(())
    }
}

/// Drops all mail. Used in tests and when no server token is configured.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_reset_email(&self, _to: &str, _link: &str) -> Result<(), MailError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_email_request_uses_postmark_field_names() {
        let body = SendEmailRequest {
            from: "no-reply@example.com",
            to: "user@example.com",
            subject: RESET_SUBJECT,
            text_body: "hello".to_string(),
            message_stream: "outbound",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("From").is_some());
        assert!(json.get("To").is_some());
        assert!(json.get("Subject").is_some());
        assert!(json.get("TextBody").is_some());
        assert!(json.get("MessageStream").is_some());
    }

    #[tokio::test]
    async fn noop_mailer_always_succeeds() {
        let mailer = NoopMailer;
        assert!(mailer
            .send_reset_email("user@example.com", "https://app/reset?token=x")
            .await
            .is_ok());
    }
}
