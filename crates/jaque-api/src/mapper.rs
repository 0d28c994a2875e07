//! Row → DTO conversion. Plain functions, no shared state.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use jaque_db::models::{MoveRow, UserRow};
use jaque_types::api::{MoveDetail, MoveSummary, UserProfile};

pub fn user_profile(row: UserRow) -> UserProfile {
    UserProfile {
        id: parse_id(&row.id),
        username: row.username,
        email: row.email,
        created_at: parse_timestamp(&row.created_at, &row.id),
    }
}

pub fn move_detail(row: MoveRow) -> MoveDetail {
    MoveDetail {
        id: parse_id(&row.id),
        user_id: parse_id(&row.user_id),
        move_san: row.move_san,
        move_uci_from: row.move_uci_from,
        move_uci_to: row.move_uci_to,
        fen: row.fen,
        pgn: row.pgn,
        created_at: parse_timestamp(&row.created_at, &row.id),
    }
}

pub fn move_summary(row: MoveRow) -> MoveSummary {
    MoveSummary {
        id: parse_id(&row.id),
        username: row.username,
        fen: row.fen,
        move_uci: combine_uci(&row.move_uci_from, &row.move_uci_to),
        move_san: row.move_san,
        created_at: parse_timestamp(&row.created_at, &row.id),
    }
}

/// The combined UCI token; absent when either half is empty (short import
/// rows leave the destination square blank).
pub fn combine_uci(from: &str, to: &str) -> Option<String> {
    if from.is_empty() || to.is_empty() {
        return None;
    }
    Some(format!("{}{}", from, to))
}

fn parse_id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_uci_requires_both_halves() {
        assert_eq!(combine_uci("e2", "e4").as_deref(), Some("e2e4"));
        assert_eq!(combine_uci("e2", ""), None);
        assert_eq!(combine_uci("", "e4"), None);
    }

    #[test]
    fn sqlite_timestamps_parse_as_utc() {
        let parsed = parse_timestamp("2025-03-01 14:30:00", "row");
        assert_eq!(parsed.to_rfc3339(), "2025-03-01T14:30:00+00:00");
    }

    #[test]
    fn summary_mapping_combines_uci() {
        let row = MoveRow {
            id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4().to_string(),
            username: "alice".to_string(),
            move_san: Some("e4".to_string()),
            move_uci_from: "e2".to_string(),
            move_uci_to: "e4".to_string(),
            fen: "fen".to_string(),
            pgn: None,
            created_at: "2025-03-01 14:30:00".to_string(),
        };
        let summary = move_summary(row);
        assert_eq!(summary.move_uci.as_deref(), Some("e2e4"));
        assert_eq!(summary.username, "alice");
    }
}
