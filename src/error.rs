//! Domain error taxonomy shared by the storage layer and the API client.
//!
//! Every failure that leaves [`crate::cache::Store`] or [`crate::debrid::DebridClient`]
//! is one of these variants. Callers show [`AppError::user_message`] to people and
//! branch on [`AppError::code`] in code.

use thiserror::Error;

use crate::cache::BackendError;

/// Boxed cause for transport failures.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

const NETWORK_MESSAGE: &str = "Network connection failed. Please check your internet connection.";
const AUTH_MESSAGE: &str = "Invalid API key. Please check your Real-Debrid API key.";
const VALIDATION_MESSAGE: &str = "Invalid input provided.";
const STORAGE_MESSAGE: &str = "Failed to access local storage.";
const RATE_LIMIT_MESSAGE: &str = "Too many requests. Please wait a moment before trying again.";
const DECODE_MESSAGE: &str = "Received an unexpected response from Real-Debrid.";

const API_DEFAULT_MESSAGE: &str = "An API error occurred";
const NOT_FOUND_MESSAGE: &str = "Resource not found.";
const SERVER_ERROR_RETRY_MESSAGE: &str = "Server error. Please try again later.";
const CLIENT_ERROR_MESSAGE: &str = "Client error occurred.";
const SERVER_ERROR_MESSAGE: &str = "Server error occurred.";
const FORBIDDEN_MESSAGE: &str = "Access forbidden. Please check your API key permissions.";

#[derive(Debug, Error)]
pub enum AppError {
  /// Non-2xx response that is not an auth or rate-limit failure.
  #[error("{message}")]
  Api {
    message: String,
    status: u16,
    status_text: String,
    user_message: String,
  },

  /// No response was received (DNS, refused connection, timeout, broken body stream).
  #[error("{message}")]
  Network {
    message: String,
    #[source]
    source: Cause,
  },

  /// 401 or 403 from the remote service.
  #[error("{message}")]
  Authentication { message: String },

  /// Caller-supplied input was rejected before any I/O happened.
  #[error("{message}")]
  Validation {
    message: String,
    field: Option<String>,
  },

  /// The storage backend failed.
  #[error("{message}")]
  Storage {
    message: String,
    #[source]
    source: Option<BackendError>,
  },

  /// 429 from the remote service.
  #[error("{message}")]
  RateLimit { message: String },

  /// A 2xx response whose body did not match the expected shape.
  #[error("{message}")]
  Decode {
    message: String,
    #[source]
    source: serde_json::Error,
  },
}

impl AppError {
  /// Stable machine-readable code.
  pub fn code(&self) -> &'static str {
    match self {
      Self::Api { .. } => "API_ERROR",
      Self::Network { .. } => "NETWORK_ERROR",
      Self::Authentication { .. } => "AUTH_ERROR",
      Self::Validation { .. } => "VALIDATION_ERROR",
      Self::Storage { .. } => "STORAGE_ERROR",
      Self::RateLimit { .. } => "RATE_LIMIT_ERROR",
      Self::Decode { .. } => "DECODE_ERROR",
    }
  }

  /// Message suitable for showing to the end user.
  pub fn user_message(&self) -> &str {
    match self {
      Self::Api { user_message, .. } => user_message,
      Self::Network { .. } => NETWORK_MESSAGE,
      Self::Authentication { .. } => AUTH_MESSAGE,
      Self::Validation { .. } => VALIDATION_MESSAGE,
      Self::Storage { .. } => STORAGE_MESSAGE,
      Self::RateLimit { .. } => RATE_LIMIT_MESSAGE,
      Self::Decode { .. } => DECODE_MESSAGE,
    }
  }

  /// HTTP status carried by API errors.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Api { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// True when the user should be asked for a new API key.
  pub fn is_auth(&self) -> bool {
    matches!(self, Self::Authentication { .. })
  }

  pub fn network(message: impl Into<String>, source: impl Into<Cause>) -> Self {
    Self::Network {
      message: message.into(),
      source: source.into(),
    }
  }

  pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
    Self::Validation {
      message: message.into(),
      field: field.map(String::from),
    }
  }

  pub fn storage(message: impl Into<String>, source: BackendError) -> Self {
    Self::Storage {
      message: message.into(),
      source: Some(source),
    }
  }

  pub fn decode(message: impl Into<String>, source: serde_json::Error) -> Self {
    Self::Decode {
      message: message.into(),
      source,
    }
  }
}

/// Classify an unsuccessful HTTP response.
///
/// Rules are checked in order and the first match wins. The function is total
/// over `u16`; codes outside the 4xx/5xx ranges become a generic [`AppError::Api`].
pub fn classify(status: u16, status_text: &str, message: Option<&str>) -> AppError {
  let message = message
    .map(String::from)
    .unwrap_or_else(|| format!("HTTP {}: {}", status, status_text));

  let api = |message: String, user_message: &str| AppError::Api {
    message,
    status,
    status_text: status_text.to_string(),
    user_message: user_message.to_string(),
  };

  match status {
    401 => AppError::Authentication { message },
    403 => AppError::Authentication {
      message: FORBIDDEN_MESSAGE.to_string(),
    },
    429 => AppError::RateLimit { message },
    404 => api(message, NOT_FOUND_MESSAGE),
    500 | 502 | 503 | 504 => api(message, SERVER_ERROR_RETRY_MESSAGE),
    400..=499 => api(message, CLIENT_ERROR_MESSAGE),
    500.. => api(message, SERVER_ERROR_MESSAGE),
    _ => api(message, API_DEFAULT_MESSAGE),
  }
}
