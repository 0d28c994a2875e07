use std::collections::BTreeMap;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand_core::OsRng;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use jaque_db::Database;
use jaque_types::api::{
    ExistsResponse, LoginRequest, RegisterRequest, UpdateProfileRequest, UserProfile,
};

use crate::error::ApiError;
use crate::mapper;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let mut errors = BTreeMap::new();
    if req.username.trim().is_empty() {
        errors.insert("usuario".to_string(), "El nombre de usuario es obligatorio".to_string());
    }
    if req.email.trim().is_empty() {
        errors.insert("email".to_string(), "El email es obligatorio".to_string());
    } else if !req.email.contains('@') {
        errors.insert("email".to_string(), "El email no es válido".to_string());
    }
    if req.password.trim().is_empty() {
        errors.insert("password".to_string(), "La contraseña es obligatoria".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // Username first, then email: the first clash wins.
    if state.db.username_exists(&req.username)? {
        return Err(ApiError::conflict("usuario", "El nombre de usuario ya está usado"));
    }
    if state.db.email_exists(&req.email)? {
        return Err(ApiError::conflict("email", "El email ya esta registrado"));
    }

    let password_hash = hash_password(&req.password)?;
    let row = state.db.create_user(&req.username, &req.email, &password_hash)?;

    Ok((StatusCode::CREATED, Json(mapper::user_profile(row))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .db
        .get_user_by_username(&req.username)?
        .ok_or(ApiError::AuthFailed)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("Stored password hash unreadable: {}", e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::AuthFailed)?;

    Ok(Json(mapper::user_profile(user)))
}

pub async fn profile_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .db
        .get_user_by_username(&username)?
        .ok_or_else(|| ApiError::user_not_found(&username))?;
    Ok(Json(mapper::user_profile(user)))
}

pub async fn profile_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .db
        .get_user_by_email(&email)?
        .ok_or_else(|| ApiError::user_not_found(&email))?;
    Ok(Json(mapper::user_profile(user)))
}

pub async fn profile_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .db
        .get_user_by_id(&id.to_string())?
        .ok_or_else(|| ApiError::user_not_found(&id.to_string()))?;
    Ok(Json(mapper::user_profile(user)))
}

/// Partial update: blank or missing fields leave the stored value alone.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let username = req
        .username
        .as_deref()
        .filter(|u| !u.trim().is_empty());
    let password_hash = match req.password.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = state
        .db
        .update_user(&id.to_string(), username, password_hash.as_deref())?
        .ok_or_else(|| ApiError::user_not_found(&id.to_string()))?;

    Ok(Json(mapper::user_profile(user)))
}

pub async fn username_exists(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let existe = state.db.username_exists(&username)?;
    Ok(Json(ExistsResponse { existe }))
}

pub async fn email_exists(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let existe = state.db.email_exists(&email)?;
    Ok(Json(ExistsResponse { existe }))
}

// The source this replaces compared passwords in plaintext; stored
// credentials here are always argon2id hashes.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
        })
    }

    fn registration(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "secreto123".to_string(),
        }
    }

    #[tokio::test]
    async fn username_conflict_is_checked_before_email() {
        let state = state();
        register(State(state.clone()), Json(registration("alice", "alice@example.com")))
            .await
            .unwrap();

        // Same username AND same email: the username clash must win.
        let err = register(State(state.clone()), Json(registration("alice", "alice@example.com")))
            .await
            .unwrap_err();
        let ApiError::Conflict(errors) = err else {
            panic!("expected conflict");
        };
        assert!(errors.contains_key("usuario"));
        assert!(!errors.contains_key("email"));

        // Fresh username, taken email.
        let err = register(State(state), Json(registration("bob", "alice@example.com")))
            .await
            .unwrap_err();
        let ApiError::Conflict(errors) = err else {
            panic!("expected conflict");
        };
        assert!(errors.contains_key("email"));
    }

    #[tokio::test]
    async fn register_then_login() {
        let state = state();
        register(State(state.clone()), Json(registration("alice", "alice@example.com")))
            .await
            .unwrap();

        let profile = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "alice".to_string(),
                password: "secreto123".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(profile.username, "alice");

        let err = login(
            State(state),
            Json(LoginRequest {
                username: "alice".to_string(),
                password: "incorrecta".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::AuthFailed));
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("secreto123").unwrap();
        assert_ne!(hash, "secreto123");

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"secreto123", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"otra-cosa", &parsed)
                .is_err()
        );
    }
}
