//! Error taxonomy for the form controller.
//!
//! Every variant is rendered as a banner before it is returned, so callers
//! only need the value for logging or tests.

use thiserror::Error;

/// Problems caught on the client before anything touches the network.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File size too large. Please select a file smaller than 10MB.")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("Unsupported file type. Please select a valid image file.")]
    UnsupportedType { mime_type: String },
    #[error("Please upload and select an image first!")]
    NoImageSelected,
    #[error("Please enter QR code data (URL or text)")]
    EmptyPayload,
    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("No QR code available for download")]
    NothingToDownload,
}

/// Failures talking to the rendering service: network errors and non-2xx replies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error! status: {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },
    #[error("{0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid API base URL {base}: {source}")]
    BadBase {
        base: String,
        #[source]
        source: url::ParseError,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(" ({})", detail),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum StudioError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] ApiError),
    /// The service answered 2xx with `success: false`.
    #[error("{0}")]
    Application(String),
    #[error("Invalid JSON file: {0}")]
    ImportFormat(#[from] serde_json::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StudioError::Validation(_))
    }
}
