//! Errors surfaced outside the toy core.
//!
//! Toy and registry operations never fail; they log and drop. These variants
//! cover loading configuration and decoding peer messages.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("malformed sync message: {0}")]
    Json(#[from] serde_json::Error),
}
