use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceChangePasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
    pub require_password_change: bool,
}

/// Always the same ack, whatever the input matched. The `reset_link` field
/// only exists in debug mode and is absent (not null) otherwise, so the
/// production response shape never varies by account.
#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_uses_camel_case_flag() {
        let resp = LoginResponse {
            message: "Login successful.".to_string(),
            token: "jwt".to_string(),
            user: PublicUser {
                id: Uuid::new_v4(),
                email: "user@example.com".to_string(),
                role: Role::User,
            },
            require_password_change: true,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["requirePasswordChange"], true);
        assert_eq!(json["user"]["role"], "USER");
    }

    #[test]
    fn forgot_response_omits_link_outside_debug() {
        let resp = ForgotPasswordResponse {
            message: "If the account exists, a reset link will be emailed.".to_string(),
            reset_link: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("reset_link"));

        let debug_resp = ForgotPasswordResponse {
            message: "If the account exists, a reset link will be emailed.".to_string(),
            reset_link: Some("http://localhost:5173/reset?token=x".to_string()),
        };
        let json = serde_json::to_string(&debug_resp).unwrap();
        assert!(json.contains("reset_link"));
    }

    #[test]
    fn signup_request_accepts_frontend_field_names() {
        let body = r#"{"email":"a@b.co","password":"Abcdef1!","confirmPassword":"Abcdef1!"}"#;
        let req: SignupRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.confirm_password, "Abcdef1!");
    }

    #[test]
    fn force_change_request_accepts_new_password_key() {
        let body = r#"{"newPassword":"longenough"}"#;
        let req: ForceChangePasswordRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.new_password, "longenough");
    }
}
