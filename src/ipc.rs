//! Messages exchanged between the host and the display.
//!
//! Two channels exist:
//! - **`load-file`** (host -> display): announces a path the display should load.
//! - **`read-file-content`** (display -> host): asks the host for a file's bytes
//!   and gets back a [`ReadFileResponse`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::oneshot;

/// Name of the host -> display channel announcing a file to load.
pub const LOAD_FILE: &str = "load-file";

/// Name of the display -> host request channel for file bytes.
pub const READ_FILE_CONTENT: &str = "read-file-content";

/// A pending `read-file-content` request.
#[derive(Debug)]
pub struct ReadFileRequest {
    pub path: PathBuf,
    pub reply: oneshot::Sender<ReadFileResponse>,
}

/// Result of a `read-file-content` request.
///
/// Serializes as `{"success":true,"data":[..]}` or
/// `{"success":false,"error":".."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireResponse", try_from = "WireResponse")]
pub enum ReadFileResponse {
    Success { data: Vec<u8> },
    Failure { error: String },
}

impl ReadFileResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn into_result(self) -> Result<Vec<u8>, String> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Failure { error } => Err(error),
        }
    }
}

impl<E: std::fmt::Display> From<Result<Vec<u8>, E>> for ReadFileResponse {
    fn from(result: Result<Vec<u8>, E>) -> Self {
        match result {
            Ok(data) => Self::Success { data },
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireResponse {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<ReadFileResponse> for WireResponse {
    fn from(response: ReadFileResponse) -> Self {
        match response {
            ReadFileResponse::Success { data } => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            ReadFileResponse::Failure { error } => Self {
                success: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<WireResponse> for ReadFileResponse {
    type Error = String;

    fn try_from(wire: WireResponse) -> Result<Self, Self::Error> {
        match wire {
            WireResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(Self::Success { data }),
            WireResponse {
                success: true,
                data: None,
                ..
            } => Err("successful response without data".to_string()),
            WireResponse {
                success: false,
                error,
                ..
            } => Ok(Self::failure(error.unwrap_or_default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_wire_shape() {
        let response = ReadFileResponse::Success {
            data: vec![1, 2, 3],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({ "success": true, "data": [1, 2, 3] }));
    }

    #[test]
    fn failure_wire_shape() {
        let response = ReadFileResponse::failure("File does not exist: /nope.drc");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({ "success": false, "error": "File does not exist: /nope.drc" })
        );
    }

    #[test]
    fn parses_wire_form() {
        let parsed: ReadFileResponse =
            serde_json::from_str(r#"{"success":false,"error":"denied"}"#).unwrap();
        assert_eq!(parsed, ReadFileResponse::failure("denied"));

        let parsed: ReadFileResponse =
            serde_json::from_str(r#"{"success":true,"data":[7]}"#).unwrap();
        assert_eq!(parsed.into_result(), Ok(vec![7]));

        assert!(serde_json::from_str::<ReadFileResponse>(r#"{"success":true}"#).is_err());
    }

    #[test]
    fn from_io_result() {
        let err: Result<Vec<u8>, std::io::Error> =
            Err(std::io::Error::other("disk on fire"));
        let response = ReadFileResponse::from(err);
        assert!(!response.is_success());
        assert_eq!(response.into_result(), Err("disk on fire".to_string()));
    }
}
