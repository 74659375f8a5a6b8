//! Error types for the monitor

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Price table error: {0}")]
    PriceTable(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("LLM API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
