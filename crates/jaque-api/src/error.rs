use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use jaque_types::page::SortError;

/// Central error taxonomy. Every handler returns `Result<_, ApiError>` and
/// the `IntoResponse` impl below is the single place errors become HTTP.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 422 with a field → message map.
    #[error("validation failed")]
    Validation(BTreeMap<String, String>),

    /// 404 with a stable machine-readable code plus human message.
    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    /// 409 with a field → message map (duplicate username/email).
    #[error("conflict")]
    Conflict(BTreeMap<String, String>),

    /// 401, bad login.
    #[error("credenciales inválidas")]
    AuthFailed,

    /// 400, uploaded file had no content.
    #[error("el fichero está vacío")]
    EmptyUpload,

    /// 413, uploaded file above the import cap.
    #[error("el fichero es demasiado grande")]
    UploadTooLarge,

    /// 500 with a deliberately generic message; the detail only goes to the
    /// log.
    #[error("error procesando el fichero CSV")]
    ImportParse(String),

    /// 500 fallback for anything the store or runtime throws at us.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn user_not_found(id: &str) -> Self {
        Self::NotFound {
            code: "USER_NOT_FOUND",
            message: format!("Usuario con id {} no encontrado", id),
        }
    }

    pub fn move_not_found(id: &str) -> Self {
        Self::NotFound {
            code: "MOVE_NOT_FOUND",
            message: format!("Jugada con id {} no encontrada", id),
        }
    }

    pub fn validation(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.to_string());
        Self::Validation(errors)
    }

    pub fn conflict(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.to_string());
        Self::Conflict(errors)
    }
}

impl From<SortError> for ApiError {
    fn from(err: SortError) -> Self {
        let field = match err {
            SortError::ZeroSize => "size",
            _ => "sort",
        };
        Self::validation(field, &err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
            }
            Self::NotFound { code, message } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "errorCode": code, "message": message })),
            )
                .into_response(),
            Self::Conflict(errors) => (StatusCode::CONFLICT, Json(errors)).into_response(),
            Self::AuthFailed => {
                (StatusCode::UNAUTHORIZED, "Credenciales inválidas").into_response()
            }
            Self::EmptyUpload => {
                (StatusCode::BAD_REQUEST, "El fichero está vacío").into_response()
            }
            Self::UploadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "El fichero es demasiado grande").into_response()
            }
            Self::ImportParse(detail) => {
                error!("CSV import failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error procesando el fichero CSV",
                )
                    .into_response()
            }
            Self::Internal(err) => {
                error!("Unhandled error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal server error: {}", err),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        let cases = [
            (ApiError::validation("fen", "obligatorio"), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::user_not_found("abc"), StatusCode::NOT_FOUND),
            (ApiError::conflict("usuario", "usado"), StatusCode::CONFLICT),
            (ApiError::AuthFailed, StatusCode::UNAUTHORIZED),
            (ApiError::EmptyUpload, StatusCode::BAD_REQUEST),
            (ApiError::UploadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (ApiError::ImportParse("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn sort_errors_become_validation_failures() {
        let err: ApiError = SortError::InvalidDirection("up".into()).into();
        match err {
            ApiError::Validation(map) => assert!(map.contains_key("sort")),
            other => panic!("expected validation, got {:?}", other),
        }

        let err: ApiError = SortError::ZeroSize.into();
        match err {
            ApiError::Validation(map) => assert!(map.contains_key("size")),
            other => panic!("expected validation, got {:?}", other),
        }
    }
}
