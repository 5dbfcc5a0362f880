use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// Fallback when the provider reports a miss without a message
const DEFAULT_NOT_FOUND: &str = "Movie not found";

/// Enriched metadata returned by the OMDb API
///
/// Absent fields arrive as the literal string "N/A"; that is passed through
/// untouched, the way the provider delivers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
    #[serde(rename = "Genre", default)]
    pub genre: Option<String>,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: Option<String>,
    #[serde(rename = "Runtime", default)]
    pub runtime: Option<String>,
    #[serde(rename = "Director", default)]
    pub director: Option<String>,
    #[serde(rename = "Actors", default)]
    pub actors: Option<String>,
    #[serde(rename = "Plot", default)]
    pub plot: Option<String>,
    #[serde(rename = "Awards", default)]
    pub awards: Option<String>,
}

/// Read-only client for the external metadata API
///
/// Responses are never cached; every detail view re-fetches.
#[derive(Debug, Clone)]
pub struct OmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Look up one title, optionally narrowed by release year
    ///
    /// A provider-reported miss carries the provider's own message; a
    /// transport or HTTP failure is surfaced as a generic upstream error.
    pub async fn lookup(&self, title: &str, year: Option<i32>) -> Result<MovieDetails> {
        let mut query = vec![
            ("t", title.to_string()),
            ("apikey", self.api_key.clone()),
        ];
        if let Some(year) = year {
            query.push(("y", year.to_string()));
        }

        let payload = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        parse_payload(payload)
    }
}

/// Split the provider's miss sentinel from a real result
///
/// OMDb answers 200 with `{"Response":"False","Error":"..."}` when the
/// title is unknown.
fn parse_payload(payload: Value) -> Result<MovieDetails> {
    if payload.get("Response").and_then(Value::as_str) == Some("False") {
        let message = payload
            .get("Error")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_NOT_FOUND)
            .to_string();
        return Err(AppError::DetailsNotFound(message));
    }

    Ok(serde_json::from_value(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_miss_surfaces_provider_message() {
        let payload = json!({
            "Response": "False",
            "Error": "Movie not found!"
        });

        match parse_payload(payload) {
            Err(AppError::DetailsNotFound(msg)) => assert_eq!(msg, "Movie not found!"),
            other => panic!("expected provider message, got {other:?}"),
        }
    }

    #[test]
    fn test_provider_miss_without_message_gets_default() {
        let payload = json!({ "Response": "False" });

        match parse_payload(payload) {
            Err(AppError::DetailsNotFound(msg)) => assert_eq!(msg, DEFAULT_NOT_FOUND),
            other => panic!("expected default message, got {other:?}"),
        }
    }

    #[test]
    fn test_full_payload_parses() {
        let payload = json!({
            "Response": "True",
            "Title": "Dune",
            "Year": "2021",
            "Poster": "https://example.com/dune.jpg",
            "Genre": "Action, Adventure, Drama",
            "imdbRating": "8.0",
            "Runtime": "155 min",
            "Director": "Denis Villeneuve",
            "Actors": "Timothée Chalamet, Rebecca Ferguson",
            "Plot": "Paul Atreides leads nomadic tribes.",
            "Awards": "Won 6 Oscars"
        });

        let details = parse_payload(payload).unwrap();
        assert_eq!(details.title, "Dune");
        assert_eq!(details.year.as_deref(), Some("2021"));
        assert_eq!(details.imdb_rating.as_deref(), Some("8.0"));
        assert_eq!(details.director.as_deref(), Some("Denis Villeneuve"));
    }

    #[test]
    fn test_sparse_payload_parses_with_gaps() {
        let payload = json!({
            "Response": "True",
            "Title": "Obscure Short",
            "Poster": "N/A"
        });

        let details = parse_payload(payload).unwrap();
        assert_eq!(details.title, "Obscure Short");
        assert_eq!(details.poster.as_deref(), Some("N/A"));
        assert_eq!(details.plot, None);
    }
}
