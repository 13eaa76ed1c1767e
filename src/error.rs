// src/error.rs

use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Custom error types for the application
#[derive(Error, Debug)]
pub enum AppError {
    /// Error for invalid input validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error during download process
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Checkout session could not be created or followed
    #[error("Checkout error: {0}")]
    CheckoutError(String),

    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Error for path operation failures
    #[error("Path error: {0}")]
    PathError(String),

    /// General application errors
    #[error("Application error: {0}")]
    General(String),

    /// A free-tier operation was asked for a premium quality, or the reverse
    #[error("Premium feature: {0}")]
    PremiumFeature(String),

    /// Error for security violations (tampering, path traversal, etc.)
    #[error("Security violation detected. If this is unexpected, please report this issue.")]
    SecurityViolation,

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    HttpError(#[from] ReqwestError),

    /// The backend answered with a non-success status
    #[error("HTTP status {status} from {endpoint}")]
    HttpStatus { endpoint: String, status: u16 },

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] SerdeError),

    /// Config file errors
    #[error("Config error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// True for failures that happened while talking to the backend.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_) | AppError::HttpStatus { .. } | AppError::JsonError(_)
        )
    }
}

/// Convert a string error to AppError::General
impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::General(error)
    }
}

/// Convert a &str error to AppError::General
impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::General(error.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(error: toml::de::Error) -> Self {
        AppError::ConfigError(error.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(error: toml::ser::Error) -> Self {
        AppError::ConfigError(error.to_string())
    }
}

/// The single generic notice shown to the user for each failing call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Metadata lookup failed
    VideoInfo,
    /// Free download failed
    Download,
    /// Checkout session creation failed
    Payment,
    /// Verification or premium download failed on the return view
    PremiumDownload,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::VideoInfo => "Erro ao obter informações do vídeo",
            Notice::Download => "Erro ao fazer download",
            Notice::Payment => "Erro ao processar pagamento",
            Notice::PremiumDownload => "Erro ao processar download",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
