use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS moves (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id),
            move_san        TEXT,
            move_uci_from   TEXT NOT NULL,
            move_uci_to     TEXT NOT NULL,
            fen             TEXT NOT NULL,
            pgn             TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_moves_user
            ON moves(user_id);

        CREATE INDEX IF NOT EXISTS idx_moves_created
            ON moves(created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
