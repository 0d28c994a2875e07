//! Two-phase CSV import: preview the upload, then confirm the rows into
//! persisted moves.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use jaque_db::models::{MoveFields, MoveInsert};
use jaque_types::api::{CsvPreviewRow, ImportConfirmRequest, MoveDetail};

use crate::error::ApiError;
use crate::mapper;
use crate::users::AppState;

/// Upload cap enforced at this layer, before any parsing.
const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

/// POST /moves/import/csv — multipart `file` + `userId`, returns the parsed
/// preview rows without persisting anything.
pub async fn preview_csv(
    mut multipart: Multipart,
) -> Result<Json<Vec<CsvPreviewRow>>, ApiError> {
    let mut file: Option<Bytes> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::ImportParse(format!("multipart read failed: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::ImportParse(format!("file read failed: {}", e)))?;
                file = Some(data);
            }
            Some("userId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::ImportParse(format!("userId read failed: {}", e)))?;
                user_id = Some(text);
            }
            _ => {}
        }
    }

    let data = file.ok_or_else(|| ApiError::validation("file", "El fichero es obligatorio"))?;
    let user_id =
        user_id.ok_or_else(|| ApiError::validation("userId", "El userId es obligatorio"))?;
    if user_id.trim().parse::<uuid::Uuid>().is_err() {
        return Err(ApiError::validation("userId", "El userId no es válido"));
    }

    if data.is_empty() {
        return Err(ApiError::EmptyUpload);
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::UploadTooLarge);
    }

    let rows = parse_preview(&data).map_err(|e| ApiError::ImportParse(e.to_string()))?;
    Ok(Json(rows))
}

/// POST /moves/import/confirm — turns the (possibly edited) preview rows
/// into one batch insert. A missing user aborts the whole batch.
pub async fn confirm_import(
    State(state): State<AppState>,
    Json(req): Json<ImportConfirmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = req.user_id.to_string();
    let fields: Vec<MoveFields> = req
        .rows
        .iter()
        .map(|row| {
            let (move_uci_from, move_uci_to) = split_uci(&row.move_uci);
            MoveFields {
                user_id: user_id.clone(),
                move_san: None,
                move_uci_from,
                move_uci_to,
                fen: row.fen.clone(),
                pgn: None,
            }
        })
        .collect();

    let db = state.clone();
    let outcome = tokio::task::spawn_blocking(move || db.db.insert_moves(&fields))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("task join error")
        })??;

    match outcome {
        MoveInsert::Created(rows) => {
            let created: Vec<MoveDetail> = rows.into_iter().map(mapper::move_detail).collect();
            Ok((StatusCode::CREATED, Json(created)))
        }
        MoveInsert::UserMissing(user_id) => Err(ApiError::user_not_found(&user_id)),
    }
}

/// Parse an upload into preview rows. The first record is always treated as
/// the header and discarded; records with fewer than two fields are skipped.
pub fn parse_preview(data: &[u8]) -> Result<Vec<CsvPreviewRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < 2 {
            continue;
        }
        rows.push(CsvPreviewRow {
            fen: record[0].trim().to_string(),
            move_uci: record[1].trim().to_string(),
        });
    }
    Ok(rows)
}

/// Split a combined UCI token into its from/to squares. Short tokens leave
/// the missing half empty.
pub fn split_uci(combined: &str) -> (String, String) {
    let from = combined.get(0..2).unwrap_or("").to_string();
    let to = combined.get(2..4).unwrap_or("").to_string();
    (from, to)
}
