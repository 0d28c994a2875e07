//! Pagination and sort resolution for the move listings.
//!
//! The wire form is `?page=0&size=10&sort=createdAt,desc&sort=fen`. Each
//! `sort` value is a `field,direction` pair; a value after the first that
//! carries no direction defaults to ascending. The legacy two-argument form
//! (`?sort=createdAt&sort=desc`) is kept as a compatibility shim. A single
//! bare field is ambiguous between the two forms and is rejected.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 10;

    pub fn new(page: u32, size: u32) -> Result<Self, SortError> {
        if size == 0 {
            return Err(SortError::ZeroSize);
        }
        Ok(Self { page, size })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn total_pages(&self, total_elements: u64) -> u32 {
        total_elements.div_ceil(u64::from(self.size)) as u32
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: Self::DEFAULT_SIZE }
    }
}

/// Whitelisted sortable fields. Keeping this closed also keeps the ORDER BY
/// clause built from it injection-safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    CreatedAt,
    Fen,
    MoveSan,
    MoveUciFrom,
    MoveUciTo,
}

impl SortField {
    pub fn parse(name: &str) -> Result<Self, SortError> {
        match name {
            "" => Err(SortError::EmptyField),
            "id" => Ok(Self::Id),
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            "fen" => Ok(Self::Fen),
            "moveSan" | "move_san" => Ok(Self::MoveSan),
            "moveUciFrom" | "move_uci_from" => Ok(Self::MoveUciFrom),
            "moveUciTo" | "move_uci_to" => Ok(Self::MoveUciTo),
            other => Err(SortError::UnknownField(other.to_string())),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CreatedAt => "created_at",
            Self::Fen => "fen",
            Self::MoveSan => "move_san",
            Self::MoveUciFrom => "move_uci_from",
            Self::MoveUciTo => "move_uci_to",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Result<Self, SortError> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(SortError::InvalidDirection(other.to_string())),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortError {
    #[error("page size must be greater than zero")]
    ZeroSize,
    #[error("sort requires at least one field")]
    Empty,
    #[error("empty sort field name")]
    EmptyField,
    #[error("invalid sort direction `{0}`, expected `asc` or `desc`")]
    InvalidDirection(String),
    #[error("unknown sort field `{0}`")]
    UnknownField(String),
    #[error("ambiguous sort value `{0}`, use the `field,direction` form")]
    Ambiguous(String),
}

/// Turn the raw `sort` query values into ordered sort keys. Key order in the
/// result matches input order (primary first).
pub fn resolve_sort(raw: &[String]) -> Result<Vec<SortKey>, SortError> {
    let first = raw.first().ok_or(SortError::Empty)?;

    if first.contains(',') {
        // Canonical form: every value is `field[,direction]`.
        raw.iter()
            .map(|token| match token.split_once(',') {
                Some((field, direction)) => Ok(SortKey {
                    field: SortField::parse(field.trim())?,
                    direction: SortDirection::parse(direction.trim())?,
                }),
                None => Ok(SortKey {
                    field: SortField::parse(token.trim())?,
                    direction: SortDirection::Asc,
                }),
            })
            .collect()
    } else if raw.len() == 2 {
        // Legacy shim: `?sort=field&sort=direction`.
        Ok(vec![SortKey {
            field: SortField::parse(first.trim())?,
            direction: SortDirection::parse(raw[1].trim())?,
        }])
    } else {
        // One bare field could be either form, and more than two bare
        // values fit neither. Refuse instead of guessing.
        Err(SortError::Ambiguous(raw.join("&sort=")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sort(values: &[&str]) -> Result<Vec<SortKey>, SortError> {
        let raw: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        resolve_sort(&raw)
    }

    #[test]
    fn canonical_single_pair() {
        let keys = sort(&["createdAt,desc"]).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].field, SortField::CreatedAt);
        assert_eq!(keys[0].direction, SortDirection::Desc);
    }

    #[test]
    fn multi_key_order_is_preserved() {
        let keys = sort(&["fen,asc", "createdAt,desc", "id,asc"]).unwrap();
        let fields: Vec<SortField> = keys.iter().map(|k| k.field).collect();
        assert_eq!(
            fields,
            vec![SortField::Fen, SortField::CreatedAt, SortField::Id]
        );
    }

    #[test]
    fn bare_field_after_first_defaults_to_asc() {
        let keys = sort(&["createdAt,desc", "fen"]).unwrap();
        assert_eq!(keys[1].field, SortField::Fen);
        assert_eq!(keys[1].direction, SortDirection::Asc);
    }

    #[test]
    fn legacy_two_argument_form() {
        let keys = sort(&["fen", "desc"]).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].field, SortField::Fen);
        assert_eq!(keys[0].direction, SortDirection::Desc);
    }

    #[test]
    fn single_bare_field_is_ambiguous() {
        assert!(matches!(sort(&["fen"]), Err(SortError::Ambiguous(_))));
    }

    #[test]
    fn direction_is_case_insensitive() {
        let keys = sort(&["fen,DESC"]).unwrap();
        assert_eq!(keys[0].direction, SortDirection::Desc);
    }

    #[test]
    fn bad_direction_is_rejected() {
        assert_eq!(
            sort(&["fen,sideways"]),
            Err(SortError::InvalidDirection("sideways".to_string()))
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert_eq!(
            sort(&["password,asc"]),
            Err(SortError::UnknownField("password".to_string()))
        );
    }

    #[test]
    fn empty_sort_is_rejected() {
        assert_eq!(sort(&[]), Err(SortError::Empty));
    }

    #[test]
    fn snake_case_field_names_are_accepted() {
        let keys = sort(&["move_uci_from,asc"]).unwrap();
        assert_eq!(keys[0].field, SortField::MoveUciFrom);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(PageRequest::new(0, 0), Err(SortError::ZeroSize));
    }

    #[test]
    fn window_math() {
        let page = PageRequest::new(2, 10).unwrap();
        assert_eq!(page.offset(), 20);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(45), 5);
        assert_eq!(page.total_pages(50), 5);
        assert_eq!(page.total_pages(51), 6);
    }
}
