use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub frontend_origin: String,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub google: GoogleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// The one email that always resolves to the ADMIN role.
    pub admin_email: String,
    /// Argon2 time cost; memory and parallelism stay at the crate defaults.
    pub hash_cost: u32,
    pub reset_ttl_minutes: i64,
    /// When set, forgot-password echoes the reset link in the response body.
    /// Development only.
    pub debug_echo_reset_link: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_base: String,
    pub server_token: Option<String>,
    pub sender: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let frontend_origin = std::env::var("FRONTEND_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "edupredict".to_string()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "edupredict-users".to_string()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        };

        let auth = AuthConfig {
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@edupredict.local".to_string()),
            hash_cost: std::env::var("HASH_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            reset_ttl_minutes: std::env::var("RESET_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            debug_echo_reset_link: std::env::var("RESET_LINK_DEBUG")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };

        let mail = MailConfig {
            api_base: std::env::var("MAIL_API_BASE")
                .unwrap_or_else(|_| "https://api.postmarkapp.com".to_string()),
            server_token: std::env::var("MAIL_SERVER_TOKEN").ok(),
            sender: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@edupredict.local".to_string()),
        };

        let google = GoogleConfig {
            client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: std::env::var("GOOGLE_REDIRECT_URI").unwrap_or_default(),
        };

        Ok(Self {
            database_url,
            frontend_origin,
            jwt,
            auth,
            mail,
            google,
        })
    }
}
