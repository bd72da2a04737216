use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read input '{path}': {message}")]
    InputRead { path: String, message: String },

    #[error("Malformed entity id '{0}': expected cityId_typeCode_sequence")]
    MalformedId(String),

    #[error("Unknown entity type code '{0}'")]
    UnknownType(String),

    #[error("Failed to normalize field '{field}': '{value}' is not numeric")]
    Normalization { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, ScraperError>;
