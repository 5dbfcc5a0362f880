use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_YEAR_FUTURE_SLACK, MIN_MOVIE_YEAR};

/// Movie record stored in redb and replayed through the feed
///
/// `name` holds the normalized title-cased form; `name_lower` is the
/// derived lowercase form used for the uniqueness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Store-assigned identifier (64 hex characters)
    pub id: String,
    pub name: String,
    #[serde(rename = "nameLower")]
    pub name_lower: String,
    pub year: i32,
    /// When the record was committed (Unix timestamp, server-assigned)
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

/// Normalize a raw movie name: trim, collapse whitespace, title-case
/// each token
///
/// "  the dark   KNIGHT " becomes "The Dark Knight". Returns None when
/// nothing is left after trimming.
pub fn normalize_name(raw: &str) -> Option<String> {
    let normalized = raw
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ");

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Check a release year against the accepted range for a given current year
pub fn year_in_range(year: i32, current_year: i32) -> bool {
    year >= MIN_MOVIE_YEAR && year <= current_year + MAX_YEAR_FUTURE_SLACK
}

/// Check a release year against the accepted range as of now
pub fn validate_year(year: i32) -> bool {
    year_in_range(year, Utc::now().year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_title_cases_tokens() {
        assert_eq!(
            normalize_name("  the dark   KNIGHT "),
            Some("The Dark Knight".to_string())
        );
        assert_eq!(normalize_name("dune"), Some("Dune".to_string()));
        assert_eq!(normalize_name("UP"), Some("Up".to_string()));
    }

    #[test]
    fn test_normalize_name_rejects_blank_input() {
        assert_eq!(normalize_name(""), None);
        assert_eq!(normalize_name("   "), None);
        assert_eq!(normalize_name("\t\n"), None);
    }

    #[test]
    fn test_year_range_boundaries() {
        let current = 2026;

        assert!(!year_in_range(1889, current));
        assert!(year_in_range(1890, current));
        assert!(year_in_range(current + 5, current));
        assert!(!year_in_range(current + 6, current));
    }

    #[test]
    fn test_movie_record_serialization() {
        let record = MovieRecord {
            id: "a".repeat(64),
            name: "Dune".to_string(),
            name_lower: "dune".to_string(),
            year: 2021,
            created_at: 1733788800,
        };

        // Verify the stored encoding round-trips
        let bytes = crate::db::encode(&record).unwrap();
        let decoded: MovieRecord = crate::db::decode(&bytes).unwrap();

        assert_eq!(record, decoded);
    }
}
