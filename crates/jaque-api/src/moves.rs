use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use jaque_db::models::{MoveFields, MoveFilter, MoveInsert, MoveUpdate};
use jaque_types::api::{CreateMoveRequest, MoveDetail, MoveSummary, PageResponse};
use jaque_types::page::{PageRequest, SortKey, resolve_sort};

use crate::error::ApiError;
use crate::mapper;
use crate::users::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
    /// Repeated `sort=field,direction` values; order is primary-first.
    #[serde(default = "default_sort")]
    pub sort: Vec<String>,
}

fn default_size() -> u32 {
    PageRequest::DEFAULT_SIZE
}

fn default_sort() -> Vec<String> {
    vec!["createdAt,desc".to_string()]
}

impl ListQuery {
    fn resolve(&self) -> Result<(PageRequest, Vec<SortKey>), ApiError> {
        let page = PageRequest::new(self.page, self.size)?;
        let sort = resolve_sort(&self.sort)?;
        Ok((page, sort))
    }
}

pub async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PageResponse<MoveSummary>>, ApiError> {
    list_filtered(state, MoveFilter::All, query).await
}

pub async fn list_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PageResponse<MoveSummary>>, ApiError> {
    list_filtered(state, MoveFilter::UserId(user_id.to_string()), query).await
}

pub async fn list_by_player(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PageResponse<MoveSummary>>, ApiError> {
    list_filtered(state, MoveFilter::UsernameContains(name), query).await
}

async fn list_filtered(
    state: AppState,
    filter: MoveFilter,
    query: ListQuery,
) -> Result<Json<PageResponse<MoveSummary>>, ApiError> {
    let (page, sort) = query.resolve()?;

    // Run blocking DB reads off the async runtime
    let db = state.clone();
    let listed = tokio::task::spawn_blocking(move || db.db.list_moves(&filter, &page, &sort))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("task join error")
        })??;

    Ok(Json(PageResponse {
        page: page.page,
        size: page.size,
        total_elements: listed.total,
        total_pages: page.total_pages(listed.total),
        content: listed.rows.into_iter().map(mapper::move_summary).collect(),
    }))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MoveDetail>, ApiError> {
    let row = state
        .db
        .get_move_by_id(&id.to_string())?
        .ok_or_else(|| ApiError::move_not_found(&id.to_string()))?;
    Ok(Json(mapper::move_detail(row)))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateMoveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_move(&req)?;

    let fields = to_fields(req);
    let db = state.clone();
    let outcome = tokio::task::spawn_blocking(move || db.db.insert_move(&fields))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("task join error")
        })??;

    match outcome {
        MoveInsert::Created(rows) => {
            let row = rows
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("insert returned no row"))?;
            Ok((StatusCode::CREATED, Json(mapper::move_detail(row))))
        }
        MoveInsert::UserMissing(user_id) => Err(ApiError::user_not_found(&user_id)),
    }
}

/// Full-field replacement, owner included.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateMoveRequest>,
) -> Result<Json<MoveDetail>, ApiError> {
    validate_move(&req)?;

    let fields = to_fields(req);
    let db = state.clone();
    let move_id = id.to_string();
    let outcome = {
        let move_id = move_id.clone();
        tokio::task::spawn_blocking(move || db.db.update_move(&move_id, &fields))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                anyhow::anyhow!("task join error")
            })??
    };

    match outcome {
        MoveUpdate::Updated(row) => Ok(Json(mapper::move_detail(row))),
        MoveUpdate::MoveMissing => Err(ApiError::move_not_found(&move_id)),
        MoveUpdate::UserMissing(user_id) => Err(ApiError::user_not_found(&user_id)),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.delete_move(&id.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn to_fields(req: CreateMoveRequest) -> MoveFields {
    MoveFields {
        user_id: req.user_id.to_string(),
        move_san: req.move_san,
        move_uci_from: req.move_uci_from,
        move_uci_to: req.move_uci_to,
        fen: req.fen,
        pgn: req.pgn,
    }
}

fn validate_move(req: &CreateMoveRequest) -> Result<(), ApiError> {
    let mut errors = BTreeMap::new();
    if req.move_uci_from.trim().is_empty() {
        errors.insert("moveUciFrom".to_string(), "El move_uci_from es obligatorio".to_string());
    }
    if req.move_uci_to.trim().is_empty() {
        errors.insert("moveUciTo".to_string(), "El move_uci_to es obligatorio".to_string());
    }
    if req.fen.trim().is_empty() {
        errors.insert("fen".to_string(), "El FEN es obligatorio".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateMoveRequest {
        CreateMoveRequest {
            user_id: Uuid::new_v4(),
            move_san: Some("e4".to_string()),
            move_uci_from: "e2".to_string(),
            move_uci_to: "e4".to_string(),
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string(),
            pgn: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(validate_move(&request()).is_ok());
    }

    #[test]
    fn blank_required_fields_are_collected() {
        let mut req = request();
        req.move_uci_from = " ".to_string();
        req.fen = String::new();

        let Err(ApiError::Validation(errors)) = validate_move(&req) else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("moveUciFrom"));
        assert!(errors.contains_key("fen"));
    }
}
