use std::collections::BTreeMap;
use thiserror::Error;

/// Failure of a single request against the finance API.
///
/// A response discarded because its range was superseded is not an error;
/// see [`crate::cache::FetchOutcome::Discarded`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
  /// Transport-level failure, including timeouts
  #[error("network failure: {message}")]
  Network { message: String },

  /// Non-2xx response, with the field errors from the body when present
  #[error("server returned {status}{}", describe_errors(.errors))]
  Server {
    status: u16,
    errors: BTreeMap<String, Vec<String>>,
  },

  /// 2xx response whose body did not match the expected shape
  #[error("failed to decode response: {message}")]
  Decode { message: String },
}

impl FetchError {
  pub fn network(message: impl Into<String>) -> Self {
    Self::Network {
      message: message.into(),
    }
  }

  /// Whether an explicit retry by the caller might succeed
  pub fn is_retryable(&self) -> bool {
    match self {
      Self::Network { .. } => true,
      Self::Server { status, .. } => *status >= 500,
      Self::Decode { .. } => false,
    }
  }
}

fn describe_errors(errors: &BTreeMap<String, Vec<String>>) -> String {
  if errors.is_empty() {
    return String::new();
  }
  let fields: Vec<String> = errors
    .iter()
    .map(|(field, messages)| format!("{} {}", field, messages.join(", ")))
    .collect();
  format!(": {}", fields.join("; "))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_server_error_display_lists_fields() {
    let mut errors = BTreeMap::new();
    errors.insert("happen_after".to_string(), vec!["is invalid".to_string()]);
    let err = FetchError::Server {
      status: 422,
      errors,
    };
    assert_eq!(err.to_string(), "server returned 422: happen_after is invalid");
  }

  #[test]
  fn test_server_error_display_without_body() {
    let err = FetchError::Server {
      status: 500,
      errors: BTreeMap::new(),
    };
    assert_eq!(err.to_string(), "server returned 500");
  }

  #[test]
  fn test_retryable() {
    assert!(FetchError::network("connection reset").is_retryable());
    assert!(FetchError::Server {
      status: 503,
      errors: BTreeMap::new()
    }
    .is_retryable());
    assert!(!FetchError::Server {
      status: 401,
      errors: BTreeMap::new()
    }
    .is_retryable());
    assert!(!FetchError::Decode {
      message: "eof".to_string()
    }
    .is_retryable());
  }
}
