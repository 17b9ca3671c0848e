use crate::models::MarketKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned error: {status}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error("Missing {0} in scoreboard data")]
    MissingField(&'static str),

    #[error("No regular season calendar entry for week {0}")]
    UnknownWeek(u32),

    #[error("Malformed {market} market: no outcome for {name}")]
    MalformedMarket { market: MarketKind, name: String },

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Sheet error: {0}")]
    Sheet(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
