use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub email: String,
}

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("identity provider is not configured")]
    NotConfigured,

    #[error("failed to build the authorize url")]
    AuthorizeUrl,

    #[error("code exchange failed: {0}")]
    Exchange(#[from] reqwest::Error),

    #[error("identity claim is missing an email")]
    MissingEmail,
}

/// External identity provider boundary. The login flow only ever sees a
/// verified email; token mechanics stay behind this trait.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    fn authorize_url(&self, state: &str) -> Result<String, VerifierError>;
    async fn verify_code(&self, code: &str) -> Result<VerifiedIdentity, VerifierError>;
}

pub struct GoogleVerifier {
    http: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleVerifier {
    pub fn new(http: reqwest::Client, config: GoogleConfig) -> Self {
        Self { http, config }
    }

    fn ensure_configured(&self) -> Result<(), VerifierError> {
        if self.config.client_id.is_empty()
            || self.config.client_secret.is_empty()
            || self.config.redirect_uri.is_empty()
        {
            return Err(VerifierError::NotConfigured);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserinfoResponse {
    email: Option<String>,
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    fn authorize_url(&self, state: &str) -> Result<String, VerifierError> {
        self.ensure_configured()?;

        let url = reqwest::Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("access_type", "offline"),
                ("include_granted_scopes", "true"),
                ("prompt", "select_account"),
                ("state", state),
            ],
        )
        .map_err(|_| VerifierError::AuthorizeUrl)?;

        Ok(url.to_string())
    }

    async fn verify_code(&self, code: &str) -> Result<VerifiedIdentity, VerifierError> {
        self.ensure_configured()?;

        let token: TokenResponse = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let info: UserinfoResponse = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match info.email {
            Some(email) if !email.is_empty() => Ok(VerifiedIdentity { email }),
            _ => Err(VerifierError::MissingEmail),
        }
    }
}

/// Test double that skips the provider and returns a fixed identity.
pub struct StaticVerifier(pub String);

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    fn authorize_url(&self, state: &str) -> Result<String, VerifierError> {
        Ok(format!("https://auth.invalid/authorize?state={state}"))
    }

    async fn verify_code(&self, _code: &str) -> Result<VerifiedIdentity, VerifierError> {
        Ok(VerifiedIdentity {
            email: self.0.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> GoogleVerifier {
        GoogleVerifier::new(
            reqwest::Client::new(),
            GoogleConfig {
                client_id: "client-123".to_string(),
                client_secret: "secret-456".to_string(),
                redirect_uri: "http://localhost:8000/api/google/callback".to_string(),
            },
        )
    }

    #[test]
    fn authorize_url_carries_client_state_and_redirect() {
        let url = configured().authorize_url("nonce-789").unwrap();
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=nonce-789"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri="));
        // The secret never appears in the browser-facing URL.
        assert!(!url.contains("secret-456"));
    }

    #[test]
    fn unconfigured_verifier_refuses_to_start() {
        let verifier = GoogleVerifier::new(
            reqwest::Client::new(),
            GoogleConfig {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: String::new(),
            },
        );
        assert!(matches!(
            verifier.authorize_url("nonce"),
            Err(VerifierError::NotConfigured)
        ));
    }
}
