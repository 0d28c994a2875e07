use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a user. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Partial profile update: only non-blank fields overwrite.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub existe: bool,
}

// -- Moves --

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMoveRequest {
    pub user_id: Uuid,
    pub move_san: Option<String>,
    pub move_uci_from: String,
    pub move_uci_to: String,
    pub fen: String,
    pub pgn: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub move_san: Option<String>,
    pub move_uci_from: String,
    pub move_uci_to: String,
    pub fen: String,
    pub pgn: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing/export view: the two UCI halves are combined into one token,
/// absent when either half is empty.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSummary {
    pub id: Uuid,
    pub username: String,
    pub fen: String,
    pub move_uci: Option<String>,
    pub move_san: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub content: Vec<T>,
}

// -- CSV import --

/// One parsed upload row. Transient: it only becomes a move through the
/// confirm endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvPreviewRow {
    pub fen: String,
    pub move_uci: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportConfirmRequest {
    pub user_id: Uuid,
    pub rows: Vec<CsvPreviewRow>,
}
