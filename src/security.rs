//! Security utilities for tierload
//!
//! Output directory checks and redaction of checkout session tokens before
//! they reach the logs.

use crate::error::AppError;
use base64::{engine::general_purpose, Engine as _};
use ring::digest;
use std::path::{Component, Path};

// Sensitive directory patterns that downloads must never be written into
pub const SENSITIVE_DIRECTORIES: [&str; 12] = [
    "/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin",
    "/usr/local/bin", "/usr/local/sbin", "/var/run",
    "/boot", "/dev", "/proc", "/sys"
];

/// Reject output locations that traverse upwards or land in system directories
pub fn validate_path_safety(path: &Path) -> Result<(), AppError> {
    // Canonicalize the path to resolve any .. or symlinks
    let canonical_path = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            // If path doesn't exist yet, we need to check its components
            return check_path_components(path);
        }
    };

    let path_str = canonical_path.to_string_lossy().to_string();

    for dir in SENSITIVE_DIRECTORIES.iter() {
        if path_str == *dir || path_str.starts_with(&format!("{}/", dir)) {
            return Err(AppError::SecurityViolation);
        }
    }

    Ok(())
}

/// Check path components for relative traversal attempts
fn check_path_components(path: &Path) -> Result<(), AppError> {
    let path_str = path.to_string_lossy();

    if path_str.contains('~') {
        return Err(AppError::SecurityViolation);
    }

    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(AppError::SecurityViolation);
    }

    for dir in SENSITIVE_DIRECTORIES.iter() {
        if path_str == *dir || path_str.starts_with(&format!("{}/", dir)) {
            return Err(AppError::SecurityViolation);
        }
    }

    Ok(())
}

/// Stable short fingerprint of a checkout session id, safe to log.
///
/// The raw id authorizes a premium download, so it never goes to the log.
pub fn session_fingerprint(session_id: &str) -> String {
    let digest = digest::digest(&digest::SHA256, session_id.as_bytes());
    let encoded = general_purpose::URL_SAFE_NO_PAD.encode(&digest.as_ref()[0..6]);
    format!("sess#{}", encoded)
}
