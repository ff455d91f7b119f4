use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// What a session asserts about its holder. Nothing else from the account
/// row leaks into the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPrincipal {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&User> for SessionPrincipal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,     // user ID
    email: String, // principal email
    role: Role,    // authorization role
    iat: usize,    // issued at
    exp: usize,    // expiration time
    iss: String,   // issuer
    aud: String,   // audience
}

/// Signing and verification material for session tokens
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let cfg = &state.config.jwt;
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes * 60).max(0) as u64),
        }
    }
}

impl SessionKeys {
    /// Sign a session token carrying the principal.
    pub fn establish(&self, principal: &SessionPrincipal) -> anyhow::Result<String> {
        let now = time::OffsetDateTime::now_utc();
        let exp = now + self.ttl;

        let claims = SessionClaims {
            sub: principal.user_id,
            email: principal.email.clone(),
            role: principal.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %principal.user_id, "session token signed");
        Ok(token)
    }

    /// Decode and validate a session token. Tampered, expired or misissued
    /// tokens all come back as None.
    pub fn verify(&self, token: &str) -> Option<SessionPrincipal> {
        let mut validation = Validation::default();
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);

        match decode::<SessionClaims>(token, &self.decoding, &validation) {
            Ok(data) => Some(SessionPrincipal {
                user_id: data.claims.sub,
                email: data.claims.email,
                role: data.claims.role,
            }),
            Err(e) => {
                debug!(error = %e, "session token rejected");
                None
            }
        }
    }
}

pub(crate) fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub(crate) fn oauth_state_cookie(value: String) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(10))
        .build()
}

pub(crate) fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Extracts the caller's principal from `Authorization: Bearer` or, failing
/// that, the session cookie.
#[derive(Debug)]
pub struct Session(pub SessionPrincipal);

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);

        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|v| v.to_string());

        let token = match bearer {
            Some(token) => token,
            None => CookieJar::from_headers(&parts.headers)
                .get(SESSION_COOKIE)
                .map(|c| c.value().to_string())
                .ok_or(ApiError::Unauthenticated("Missing session token."))?,
        };

        match keys.verify(&token) {
            Some(principal) => Ok(Session(principal)),
            None => Err(ApiError::Unauthenticated("Invalid or expired session.")),
        }
    }
}

/// Same as [`Session`] but additionally requires the ADMIN role.
#[derive(Debug)]
pub struct AdminSession(pub SessionPrincipal);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Session(principal) = Session::from_request_parts(parts, state).await?;
        if principal.role != Role::Admin {
            warn!(user_id = %principal.user_id, role = ?principal.role, "admin access denied");
            return Err(ApiError::Forbidden("Forbidden. Admin access required."));
        }
        Ok(AdminSession(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> SessionKeys {
        SessionKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            ttl: Duration::from_secs(300),
        }
    }

    fn principal(role: Role) -> SessionPrincipal {
        SessionPrincipal {
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn establish_and_verify_roundtrip() {
        let keys = make_keys("secret", "iss", "aud");
        let original = principal(Role::Faculty);

        let token = keys.establish(&original).unwrap();
        let verified = keys.verify(&token).unwrap();

        assert_eq!(verified.user_id, original.user_id);
        assert_eq!(verified.email, original.email);
        assert_eq!(verified.role, Role::Faculty);
    }

    #[test]
    fn rejects_wrong_issuer_or_audience() {
        let keys = make_keys("secret", "iss", "aud");
        let token = keys.establish(&principal(Role::User)).unwrap();

        let other_issuer = make_keys("secret", "other-iss", "aud");
        assert!(other_issuer.verify(&token).is_none());

        let other_audience = make_keys("secret", "iss", "other-aud");
        assert!(other_audience.verify(&token).is_none());
    }

    #[test]
    fn rejects_tampered_tokens() {
        let keys = make_keys("secret", "iss", "aud");
        let token = keys.establish(&principal(Role::User)).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');
        assert!(keys.verify(&tampered).is_none());

        assert!(keys.verify("garbage.token.here").is_none());
        assert!(make_keys("other-secret", "iss", "aud").verify(&token).is_none());
    }

    #[tokio::test]
    async fn session_extractor_accepts_bearer_header() {
        let state = AppState::fake();
        let keys = SessionKeys::from_ref(&state);
        let original = principal(Role::User);
        let token = keys.establish(&original).unwrap();

        let (mut parts, _) = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();

        let Session(got) = Session::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(got.user_id, original.user_id);
    }

    #[tokio::test]
    async fn session_extractor_falls_back_to_cookie() {
        let state = AppState::fake();
        let keys = SessionKeys::from_ref(&state);
        let token = keys.establish(&principal(Role::User)).unwrap();

        let (mut parts, _) = Request::builder()
            .uri("/")
            .header(header::COOKIE, format!("{SESSION_COOKIE}={token}"))
            .body(())
            .unwrap()
            .into_parts();

        assert!(Session::from_request_parts(&mut parts, &state).await.is_ok());
    }

    #[tokio::test]
    async fn session_extractor_rejects_missing_and_bad_tokens() {
        let state = AppState::fake();

        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let err = Session::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));

        let (mut parts, _) = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, "Bearer not-a-token")
            .body(())
            .unwrap()
            .into_parts();
        let err = Session::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn admin_extractor_rejects_non_admin_roles() {
        let state = AppState::fake();
        let keys = SessionKeys::from_ref(&state);

        for role in [Role::Faculty, Role::User] {
            let token = keys.establish(&principal(role)).unwrap();

            let (mut parts, _) = Request::builder()
                .uri("/")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(())
                .unwrap()
                .into_parts();

            let err = AdminSession::from_request_parts(&mut parts, &state)
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::Forbidden(_)));
        }
    }

    #[tokio::test]
    async fn admin_extractor_accepts_admin() {
        let state = AppState::fake();
        let keys = SessionKeys::from_ref(&state);
        let token = keys.establish(&principal(Role::Admin)).unwrap();

        let (mut parts, _) = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();

        assert!(AdminSession::from_request_parts(&mut parts, &state)
            .await
            .is_ok());
    }
}
