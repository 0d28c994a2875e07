/// Database row types — these map directly to SQLite rows.
/// Distinct from the jaque-types DTOs to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct MoveRow {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub move_san: Option<String>,
    pub move_uci_from: String,
    pub move_uci_to: String,
    pub fen: String,
    pub pgn: Option<String>,
    pub created_at: String,
}

/// Field set for inserting or replacing a move. Ids and timestamps are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct MoveFields {
    pub user_id: String,
    pub move_san: Option<String>,
    pub move_uci_from: String,
    pub move_uci_to: String,
    pub fen: String,
    pub pgn: Option<String>,
}

/// Which moves a listing query covers.
pub enum MoveFilter {
    All,
    UserId(String),
    /// Case-sensitive substring match on the owner's username.
    UsernameContains(String),
}

pub struct PagedMoves {
    pub total: u64,
    pub rows: Vec<MoveRow>,
}

/// Outcome of a (batch) insert. A missing owner aborts the transaction, so
/// `UserMissing` means nothing was persisted.
pub enum MoveInsert {
    Created(Vec<MoveRow>),
    UserMissing(String),
}

pub enum MoveUpdate {
    Updated(MoveRow),
    MoveMissing,
    UserMissing(String),
}
