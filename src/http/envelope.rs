//! The uniform response envelope of the backend.
//!
//! Every REST response arrives as `{data, statusCode, message}`. An
//! envelope status of 200 or 201 is success; anything else is an error,
//! regardless of what the transport said.

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
  pub data: Option<T>,
  pub status_code: u16,
  #[serde(default)]
  pub message: String,
}

impl<T> ApiEnvelope<T> {
  fn is_success(&self) -> bool {
    matches!(self.status_code, 200 | 201)
  }

  /// Unwrap the envelope into its payload.
  pub fn into_result(self) -> Result<T> {
    if !self.is_success() {
      return Err(Error::Api {
        status: self.status_code,
        message: self.message,
      });
    }
    self.data.ok_or(Error::Api {
      status: self.status_code,
      message: "response envelope carried no data".to_string(),
    })
  }

  /// Unwrap an envelope whose payload is irrelevant (logout, otp send).
  pub fn into_empty(self) -> Result<()> {
    if self.is_success() {
      Ok(())
    } else {
      Err(Error::Api {
        status: self.status_code,
        message: self.message,
      })
    }
  }
}
