use thiserror::Error;

/// Error returned when a rendered snapshot cannot be read back.
#[derive(Debug, Error)]
pub enum ParseError {
  #[error("Unable to read snapshot: {0}")]
  Json(#[from] serde_json::Error),
  #[error("Missing key: {0}")]
  MissingKey(&'static str),
  #[error("Unknown key: {0}")]
  UnknownKey(String),
  #[error("Invalid value for {key}: {reason}")]
  InvalidValue { key: &'static str, reason: String },
}
