use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, MeResponse, PublicUser, RegisterRequest, RegisterResponse, TokenResponse},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::{is_unique_violation, User},
    },
    error::{ApiError, FieldErrors},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_credentials(email: &str, password: &str, check_length: bool) -> Result<(), ApiError> {
    let mut fields = FieldErrors::new();
    if !is_valid_email(email) {
        fields.insert("email", vec!["email must be a valid address".into()]);
    }
    if check_length && password.len() < 8 {
        fields.insert("password", vec!["password must be at least 8 characters".into()]);
    } else if password.is_empty() {
        fields.insert("password", vec!["password must not be empty".into()]);
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(fields))
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    validate_credentials(&payload.email, &payload.password, true)?;

    // Friendly pre-check; the unique index still backstops races.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = hash_password(&payload.password)?;
    let user = match User::create(&state.db, &payload.email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "email already registered (insert race)");
            return Err(ApiError::DuplicateEmail);
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(RegisterResponse {
        user: PublicUser {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_credentials(&payload.email, &payload.password, false)?;

    // Unknown email and wrong password return the same body, so callers
    // cannot probe which addresses are registered.
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::unauthenticated("Invalid email or password"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthenticated("Invalid email or password"));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user_id): AuthUser) -> Json<MeResponse> {
    Json(MeResponse { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn register_rules_require_long_password() {
        assert!(validate_credentials("a@x.com", "short", true).is_err());
        assert!(validate_credentials("a@x.com", "secret123", true).is_ok());
    }

    #[test]
    fn login_rules_only_require_presence() {
        assert!(validate_credentials("a@x.com", "short", false).is_ok());
        assert!(validate_credentials("a@x.com", "", false).is_err());
        assert!(validate_credentials("not-an-email", "whatever", false).is_err());
    }

    #[test]
    fn me_response_uses_camel_case() {
        let json = serde_json::to_string(&MeResponse {
            user_id: uuid::Uuid::nil(),
        })
        .unwrap();
        assert!(json.contains("\"userId\""));
    }
}
