use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, instrument, warn};

use crate::auth::dto::{
    Ack, ForceChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
    LoginResponse, OAuthCallbackParams, PublicUser, ResetPasswordRequest, SignupRequest,
};
use crate::auth::oauth::VerifierError;
use crate::auth::password;
use crate::auth::repo_types::{Provider, Role, User};
use crate::auth::roles;
use crate::auth::session::{
    oauth_state_cookie, removal_cookie, session_cookie, Session, SessionKeys, SessionPrincipal,
    OAUTH_STATE_COOKIE, SESSION_COOKIE,
};
use crate::auth::tokens;
use crate::auth::validate;
use crate::error::{ApiError, StoreError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/auth/force-change-password", post(force_change_password))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/google/start", get(google_start))
        .route("/google/callback", get(google_callback))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Ack>), ApiError> {
    payload.email = payload.email.trim().to_string();

    if !validate::is_valid_email(&payload.email) {
        warn!("signup rejected: invalid email format");
        return Err(ApiError::Validation("Invalid email format.".to_string()));
    }
    if !validate::is_strong_password(&payload.password) {
        return Err(ApiError::Validation(
            validate::PASSWORD_POLICY_MESSAGE.to_string(),
        ));
    }
    if payload.password != payload.confirm_password {
        return Err(ApiError::Validation("Passwords do not match.".to_string()));
    }

    match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(_)) => return Err(ApiError::Conflict("Email already registered.".to_string())),
        Ok(None) => {}
        Err(e) => return Err(ApiError::internal("Unable to process signup right now.", e)),
    }

    let hash = password::hash_password(&payload.password, state.config.auth.hash_cost)
        .map_err(|e| ApiError::internal("Unable to process signup right now.", e))?;
    let role = roles::resolve_role(&state.db, &state.config.auth.admin_email, &payload.email)
        .await
        .map_err(|e| ApiError::internal("Unable to process signup right now.", e))?;

    let user = match User::create(
        &state.db,
        &payload.email,
        Some(hash.as_str()),
        Provider::Password,
        role,
    )
    .await
    {
        Ok(user) => user,
        // Lost a race against a concurrent signup for the same email.
        Err(StoreError::DuplicateKey) => {
            return Err(ApiError::Conflict("Email already registered.".to_string()))
        }
        Err(e) => return Err(ApiError::internal("Unable to process signup right now.", e)),
    };

    info!(user_id = %user.id, email = %user.email, role = ?user.role, "user signed up");
    Ok((StatusCode::CREATED, Json(Ack::new("Signup successful."))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.email = payload.email.trim().to_string();

    if !validate::is_valid_email(&payload.email) {
        warn!("login rejected: invalid email format");
        return Err(ApiError::Validation("Invalid email format.".to_string()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Validation("Password is required.".to_string()));
    }

    let mut user = match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("login rejected: unknown email");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => return Err(ApiError::internal("Unable to process login right now.", e)),
    };

    let stored_hash = match (user.provider, user.password_hash.as_deref()) {
        (Provider::Password, Some(hash)) => hash,
        _ => {
            warn!(user_id = %user.id, "login rejected: no usable password credential");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !password::verify_password(&payload.password, stored_hash) {
        warn!(user_id = %user.id, "login rejected: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    // The designated admin keeps ADMIN even if the stored role drifted.
    if user.email == state.config.auth.admin_email && user.role != Role::Admin {
        User::update_role(&state.db, user.id, Role::Admin)
            .await
            .map_err(|e| ApiError::internal("Unable to process login right now.", e))?;
        info!(user_id = %user.id, "admin role restored at login");
        user.role = Role::Admin;
    }

    let principal = SessionPrincipal::from(&user);
    let keys = SessionKeys::from_ref(&state);
    let token = keys
        .establish(&principal)
        .map_err(|e| ApiError::internal("Unable to process login right now.", e))?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful.".to_string(),
        token,
        user: PublicUser::from(&user),
        require_password_change: user.must_change_password,
    }))
}

/// Weaker than the signup policy on purpose: seeded faculty accounts rotate
/// their initial password here, and only the 8-char minimum applies.
#[instrument(skip(state, payload))]
pub async fn force_change_password(
    State(state): State<AppState>,
    Session(principal): Session,
    Json(payload): Json<ForceChangePasswordRequest>,
) -> Result<Json<Ack>, ApiError> {
    if payload.new_password.chars().count() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let hash = password::hash_password(&payload.new_password, state.config.auth.hash_cost)
        .map_err(|e| ApiError::internal("Unable to update password right now.", e))?;

    User::rotate_password(&state.db, principal.user_id, &hash)
        .await
        .map_err(|e| ApiError::internal("Unable to update password right now.", e))?;

    info!(user_id = %principal.user_id, "password changed, flag cleared");
    Ok(Json(Ack::new("Password updated successfully")))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    const ACK: &str = "If the account exists, a reset link will be emailed.";

    // Same body for every input class so responses never confirm accounts.
    let ack = |reset_link: Option<String>| {
        Json(ForgotPasswordResponse {
            message: ACK.to_string(),
            reset_link,
        })
    };

    let email = payload.email.trim().to_string();
    if !validate::is_valid_email(&email) {
        return Ok(ack(None));
    }

    let user = match User::find_by_email(&state.db, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(ack(None)),
        Err(e) => return Err(ApiError::internal("Unable to process reset right now.", e)),
    };

    if user.provider != Provider::Password {
        return Ok(ack(None));
    }

    let raw = tokens::issue(&state.db, user.id, state.config.auth.reset_ttl_minutes)
        .await
        .map_err(|e| ApiError::internal("Unable to process reset right now.", e))?;
    let link = format!("{}/reset?token={}", state.config.frontend_origin, raw);

    state
        .mailer
        .send_reset_email(&user.email, &link)
        .await
        .map_err(|e| ApiError::internal("Unable to process reset right now.", e))?;

    info!(user_id = %user.id, "reset link issued");

    let reset_link = state.config.auth.debug_echo_reset_link.then_some(link);
    Ok(ack(reset_link))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Ack>, ApiError> {
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(ApiError::Validation("Reset token is required.".to_string()));
    }
    if payload.password != payload.confirm_password {
        return Err(ApiError::Validation("Passwords do not match.".to_string()));
    }
    if !validate::is_strong_password(&payload.password) {
        return Err(ApiError::Validation(
            validate::PASSWORD_POLICY_MESSAGE.to_string(),
        ));
    }

    let pending = match tokens::redeem(&state.db, token).await {
        Ok(Some(pending)) => pending,
        Ok(None) => {
            warn!("reset rejected: token unknown, expired or used");
            return Err(ApiError::InvalidResetToken);
        }
        Err(e) => return Err(ApiError::internal("Unable to reset password right now.", e)),
    };

    if pending.provider != Provider::Password {
        warn!(user_id = %pending.user_id, "reset rejected: federated account");
        return Err(ApiError::InvalidResetToken);
    }

    let hash = password::hash_password(&payload.password, state.config.auth.hash_cost)
        .map_err(|e| ApiError::internal("Unable to reset password right now.", e))?;

    let consumed = tokens::consume(&state.db, pending.reset_id, pending.user_id, &hash)
        .await
        .map_err(|e| ApiError::internal("Unable to reset password right now.", e))?;
    if !consumed {
        warn!(user_id = %pending.user_id, "reset rejected: lost the redemption race");
        return Err(ApiError::InvalidResetToken);
    }

    info!(user_id = %pending.user_id, "password reset completed");
    Ok(Json(Ack::new("Password updated successfully.")))
}

#[instrument(skip(state, jar))]
pub async fn google_start(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    let url = state
        .verifier
        .authorize_url(&nonce)
        .map_err(|e| ApiError::internal("Unable to start Google sign-in right now.", e))?;

    Ok((jar.add(oauth_state_cookie(nonce)), Redirect::temporary(&url)))
}

#[instrument(skip(state, jar, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<OAuthCallbackParams>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let presented = params
        .state
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("Missing OAuth state.".to_string()))?;
    let pinned = jar
        .get(OAUTH_STATE_COOKIE)
        .ok_or_else(|| ApiError::Validation("Missing OAuth state.".to_string()))?;
    if pinned.value() != presented {
        warn!("oauth state mismatch");
        return Err(ApiError::Validation("Invalid OAuth state.".to_string()));
    }

    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("Missing authorization code.".to_string()))?;

    let identity = match state.verifier.verify_code(code).await {
        Ok(identity) => identity,
        Err(VerifierError::MissingEmail) => {
            return Err(ApiError::Validation("Google token missing email.".to_string()))
        }
        Err(e) => {
            return Err(ApiError::internal(
                "Unable to complete Google sign-in right now.",
                e,
            ))
        }
    };

    let user = match User::find_by_email(&state.db, &identity.email).await {
        Ok(Some(mut user)) => {
            let resolved =
                roles::resolve_role(&state.db, &state.config.auth.admin_email, &user.email)
                    .await
                    .map_err(|e| {
                        ApiError::internal("Unable to complete Google sign-in right now.", e)
                    })?;
            // Forward-only sync: promote to ADMIN or FACULTY, never demote.
            if resolved != user.role && matches!(resolved, Role::Admin | Role::Faculty) {
                User::update_role(&state.db, user.id, resolved).await.map_err(|e| {
                    ApiError::internal("Unable to complete Google sign-in right now.", e)
                })?;
                info!(user_id = %user.id, from = ?user.role, to = ?resolved, "role synced at federated login");
                user.role = resolved;
            }
            user
        }
        Ok(None) => {
            let role =
                roles::resolve_role(&state.db, &state.config.auth.admin_email, &identity.email)
                    .await
                    .map_err(|e| {
                        ApiError::internal("Unable to complete Google sign-in right now.", e)
                    })?;
            let user =
                User::create(&state.db, &identity.email, None, Provider::Federated, role)
                    .await
                    .map_err(|e| {
                        ApiError::internal("Unable to complete Google sign-in right now.", e)
                    })?;
            info!(user_id = %user.id, email = %user.email, role = ?role, "federated account created");
            user
        }
        Err(e) => {
            return Err(ApiError::internal(
                "Unable to complete Google sign-in right now.",
                e,
            ))
        }
    };

    let principal = SessionPrincipal::from(&user);
    let keys = SessionKeys::from_ref(&state);
    let token = keys.establish(&principal).map_err(|e| {
        ApiError::internal("Unable to complete Google sign-in right now.", e)
    })?;

    info!(user_id = %user.id, "federated login");

    let jar = jar
        .remove(removal_cookie(OAUTH_STATE_COOKIE))
        .add(session_cookie(token));
    let welcome = format!("{}/welcome", state.config.frontend_origin);
    Ok((jar, Redirect::temporary(&welcome)))
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Ack>) {
    (
        jar.remove(removal_cookie(SESSION_COOKIE)),
        Json(Ack::new("Logged out.")),
    )
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn force_change_counts_password_length_in_characters() {
        let state = AppState::fake();
        let principal = SessionPrincipal {
            user_id: Uuid::new_v4(),
            email: "faculty@example.com".to_string(),
            role: Role::Faculty,
        };
        // Seven characters, fourteen bytes.
        let payload = ForceChangePasswordRequest {
            new_password: "ЖЖЖЖЖЖЖ".to_string(),
        };

        let err = force_change_password(State(state), Session(principal), Json(payload))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(msg) if msg == "Password must be at least 8 characters"
        ));
    }
}
