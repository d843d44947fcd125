use thiserror::Error;

use crate::types::Money;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider '{provider}' returned status {status}: {body}")]
    ProviderStatus {
        provider: &'static str,
        status:   u16,
        body:     String,
    },

    #[error("Provider '{provider}' response had no generated text")]
    EmptyCompletion { provider: &'static str },

    #[error("Could not extract valid JSON from AI response")]
    JsonExtraction,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GameError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        GameError::NotFound { kind, id: id.into() }
    }

    /// The validation failure behind this error, if it is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            GameError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

/// A user action was rejected before any state changed.
/// The Display text is the message shown to the player.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill all fields! ({field} is required)")]
    MissingField { field: &'static str },

    #[error("Unknown business type: {0}")]
    UnknownBusinessType(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min:   Money,
        max:   Money,
        value: Money,
    },

    #[error("Insufficient capital! Available {available}, required {required}")]
    InsufficientCapital { available: Money, required: Money },

    #[error("Minimum bid is {minimum}, got {offered}")]
    BidTooLow { minimum: Money, offered: Money },

    #[error("Starting price {starting_price} exceeds market value {market_value}")]
    StartingPriceAboveMarket {
        starting_price: Money,
        market_value:   Money,
    },

    #[error("Unsupported auction duration: {0} seconds")]
    UnsupportedDuration(u64),

    #[error("'{value}' is not a valid {field}")]
    InvalidChoice { field: &'static str, value: String },

    #[error("Unknown auction category: {0}")]
    UnknownCategory(String),

    #[error("Auction {0} is closed")]
    AuctionClosed(String),

    #[error("Business {0} has completed all rounds")]
    BusinessCompleted(String),

    #[error("No business selected for this session")]
    NoBusinessSelected,

    #[error("No scenario in progress")]
    NoScenario,

    #[error("Option {chosen} does not exist; choose 1 to {available}")]
    InvalidOption { chosen: usize, available: usize },

    #[error("Invalid admin password")]
    InvalidPassword,

    #[error("Invalid scenario record: {0}")]
    InvalidScenario(String),
}

pub type GameResult<T> = Result<T, GameError>;
