//! Wire types for the chat service endpoints.
//!
//! Domain types (`Conversation`, `Message`, `User`) deserialize straight off
//! the wire; only the shapes that differ from the domain live here.

use parley_core::auth::{Session, User};
use serde::Deserialize;

/// Response of `POST /auth/login` and `POST /auth/register`.
///
/// Deployments disagree on the token key (`token` vs `access_token`); both
/// are accepted.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    pub user: User,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Session {
            token: response.token,
            user: response.user,
        }
    }
}

/// FastAPI-style error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Extracts a human-readable message from an error response body, falling
/// back to the raw body, then to the status reason.
pub fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        match parsed.detail {
            Some(serde_json::Value::String(detail)) => return detail,
            Some(other) => return other.to_string(),
            None => {}
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Unknown server error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn auth_response_accepts_both_token_keys() {
        let with_token = r#"{"token":"t1","user":{"id":"u1","full_name":"A","email":"a@b.com"}}"#;
        let with_access =
            r#"{"access_token":"t2","user":{"id":"u1","full_name":"A","email":"a@b.com"}}"#;

        let first: AuthResponse = serde_json::from_str(with_token).unwrap();
        let second: AuthResponse = serde_json::from_str(with_access).unwrap();
        assert_eq!(first.token, "t1");
        assert_eq!(second.token, "t2");

        let session: Session = second.into();
        assert_eq!(session.user.email, "a@b.com");
    }

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"detail":"Invalid credentials"}"#),
            "Invalid credentials"
        );
    }

    #[test]
    fn error_message_falls_back_to_body_then_reason() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream exploded"),
            "upstream exploded"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "  "), "Bad Gateway");
    }

    #[test]
    fn structured_detail_is_stringified() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"field required"}]}"#;
        let message = error_message(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert!(message.contains("field required"));
    }
}
