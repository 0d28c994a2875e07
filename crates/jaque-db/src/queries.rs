use crate::Database;
use crate::models::{MoveFields, MoveFilter, MoveInsert, MoveRow, MoveUpdate, PagedMoves, UserRow};
use anyhow::Result;
use jaque_types::page::{PageRequest, SortKey};
use rusqlite::Connection;
use uuid::Uuid;

const MOVE_COLUMNS: &str =
    "m.id, m.user_id, u.username, m.move_san, m.move_uci_from, m.move_uci_to, m.fen, m.pgn, m.created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (&id, username, email, password_hash),
            )?;
            query_user(conn, "id", &id)?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", id))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?)
        })
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?)
        })
    }

    /// Partial profile update: only the supplied fields overwrite.
    /// Returns None when the user does not exist.
    pub fn update_user(
        &self,
        id: &str,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_user(&tx, "id", id)?.is_none() {
                return Ok(None);
            }
            if let Some(username) = username {
                tx.execute("UPDATE users SET username = ?1 WHERE id = ?2", (username, id))?;
            }
            if let Some(password_hash) = password_hash {
                tx.execute("UPDATE users SET password = ?1 WHERE id = ?2", (password_hash, id))?;
            }

            let row = query_user(&tx, "id", id)?;
            tx.commit()?;
            Ok(row)
        })
    }

    // -- Moves --

    pub fn get_move_by_id(&self, id: &str) -> Result<Option<MoveRow>> {
        self.with_conn(|conn| query_move(conn, id))
    }

    /// Filtered, paged, sorted listing plus the total count for the same
    /// filter. An empty sort slice means the store's natural order.
    pub fn list_moves(
        &self,
        filter: &MoveFilter,
        page: &PageRequest,
        sort: &[SortKey],
    ) -> Result<PagedMoves> {
        self.with_conn(|conn| {
            let (where_sql, filter_param): (&str, Option<&str>) = match filter {
                MoveFilter::All => ("", None),
                MoveFilter::UserId(id) => (" WHERE m.user_id = ?1", Some(id.as_str())),
                // instr() keeps the containment check case-sensitive,
                // unlike LIKE.
                MoveFilter::UsernameContains(name) => {
                    (" WHERE instr(u.username, ?1) > 0", Some(name.as_str()))
                }
            };

            let count_sql = format!(
                "SELECT COUNT(*) FROM moves m JOIN users u ON m.user_id = u.id{}",
                where_sql
            );
            let total: u64 = match filter_param {
                Some(p) => conn.query_row(&count_sql, [p], |row| row.get(0))?,
                None => conn.query_row(&count_sql, [], |row| row.get(0))?,
            };

            let (limit_idx, offset_idx) = if filter_param.is_some() { (2, 3) } else { (1, 2) };
            let sql = format!(
                "SELECT {} FROM moves m JOIN users u ON m.user_id = u.id{}{} LIMIT ?{} OFFSET ?{}",
                MOVE_COLUMNS,
                where_sql,
                order_clause(sort),
                limit_idx,
                offset_idx,
            );

            let limit = i64::from(page.size);
            let offset = page.offset() as i64;
            let mut params: Vec<&dyn rusqlite::types::ToSql> = Vec::new();
            if let Some(p) = filter_param.as_ref() {
                params.push(p);
            }
            params.push(&limit);
            params.push(&offset);

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params.as_slice(), map_move_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(PagedMoves { total, rows })
        })
    }

    /// Every move, in the store's natural order (export path).
    pub fn export_all_moves(&self) -> Result<Vec<MoveRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM moves m JOIN users u ON m.user_id = u.id",
                MOVE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_move_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn insert_move(&self, fields: &MoveFields) -> Result<MoveInsert> {
        self.insert_moves(std::slice::from_ref(fields))
    }

    /// Insert a batch of moves in one transaction. The owning user of each
    /// move is checked inside the same transaction; the first missing user
    /// aborts the batch and nothing persists.
    pub fn insert_moves(&self, moves: &[MoveFields]) -> Result<MoveInsert> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(moves.len());

            for fields in moves {
                let user_known: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                    [&fields.user_id],
                    |row| row.get(0),
                )?;
                if !user_known {
                    // Dropping the transaction rolls back earlier inserts.
                    return Ok(MoveInsert::UserMissing(fields.user_id.clone()));
                }

                let id = Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO moves (id, user_id, move_san, move_uci_from, move_uci_to, fen, pgn)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        id,
                        fields.user_id,
                        fields.move_san,
                        fields.move_uci_from,
                        fields.move_uci_to,
                        fields.fen,
                        fields.pgn,
                    ],
                )?;
                ids.push(id);
            }

            let mut rows = Vec::with_capacity(ids.len());
            for id in &ids {
                let row = query_move(&tx, id)?
                    .ok_or_else(|| anyhow::anyhow!("move {} vanished after insert", id))?;
                rows.push(row);
            }

            tx.commit()?;
            Ok(MoveInsert::Created(rows))
        })
    }

    /// Full-field replacement, owner included.
    pub fn update_move(&self, id: &str, fields: &MoveFields) -> Result<MoveUpdate> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_move(&tx, id)?.is_none() {
                return Ok(MoveUpdate::MoveMissing);
            }

            let user_known: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [&fields.user_id],
                |row| row.get(0),
            )?;
            if !user_known {
                return Ok(MoveUpdate::UserMissing(fields.user_id.clone()));
            }

            tx.execute(
                "UPDATE moves SET user_id = ?1, move_san = ?2, move_uci_from = ?3,
                     move_uci_to = ?4, fen = ?5, pgn = ?6 WHERE id = ?7",
                rusqlite::params![
                    fields.user_id,
                    fields.move_san,
                    fields.move_uci_from,
                    fields.move_uci_to,
                    fields.fen,
                    fields.pgn,
                    id,
                ],
            )?;

            let row = query_move(&tx, id)?
                .ok_or_else(|| anyhow::anyhow!("move {} vanished after update", id))?;
            tx.commit()?;
            Ok(MoveUpdate::Updated(row))
        })
    }

    /// Idempotent: deleting an unknown id is a no-op.
    pub fn delete_move(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM moves WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn order_clause(sort: &[SortKey]) -> String {
    if sort.is_empty() {
        return String::new();
    }
    let keys: Vec<String> = sort
        .iter()
        .map(|key| format!("m.{} {}", key.field.column(), key.direction.keyword()))
        .collect();
    format!(" ORDER BY {}", keys.join(", "))
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is always one of our own literals, never caller input.
    let sql = format!(
        "SELECT id, username, email, password, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_move(conn: &Connection, id: &str) -> Result<Option<MoveRow>> {
    let sql = format!(
        "SELECT {} FROM moves m JOIN users u ON m.user_id = u.id WHERE m.id = ?1",
        MOVE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt.query_row([id], map_move_row).optional()?;
    Ok(row)
}

fn map_move_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MoveRow> {
    Ok(MoveRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        move_san: row.get(3)?,
        move_uci_from: row.get(4)?,
        move_uci_to: row.get(5)?,
        fen: row.get(6)?,
        pgn: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
