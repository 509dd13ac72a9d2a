//! Common identifier types.
//!
//! Every table uses SQLite integer primary keys; the aliases below keep signatures readable and
//! make it obvious which table an id refers to.

pub type UserId = i64;
pub type SessionTokenId = i64;
pub type FilmId = i64;
pub type ActorId = i64;
pub type CriticId = i64;
pub type LanguageId = i64;

/// Parse a path segment into an id.
///
/// Path ids are extracted as strings so that `/films/not-an-id` can answer 404 like an unknown
/// numeric id would, instead of axum's plain-text 400 rejection.
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id(" 7 "), Some(7));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id("not-an-id"), None);
        assert_eq!(parse_id(""), None);
    }
}
