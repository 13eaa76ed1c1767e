// src/utils.rs

use crate::access::AccessTier;
use crate::error::AppError;
use crate::models::FormatOption;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

/// Title used in file names when the video title is unknown
pub const FALLBACK_FILE_TITLE: &str = "video";

const MAX_URL_LENGTH: usize = 4096;
const MAX_TITLE_LENGTH: usize = 120;

static FORBIDDEN_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F\x7F]"#).unwrap());
static REPEATED_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Check a pasted source URL before any lookup is attempted
pub fn validate_url(url: &str) -> Result<(), AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::ValidationError("URL cannot be empty".to_string()));
    }

    // Check URL length to prevent DoS attacks
    if url.len() > MAX_URL_LENGTH {
        return Err(AppError::ValidationError(
            "URL exceeds maximum allowed length".to_string(),
        ));
    }

    // Check only for truly problematic characters
    let unusual_chars = ['<', '>', '\\', '{', '}', '^', '`'];
    if url.chars().any(|c| unusual_chars.contains(&c) || c.is_whitespace()) {
        return Err(AppError::ValidationError(
            "URL contains unusual characters".to_string(),
        ));
    }

    let parsed = Url::parse(url)
        .map_err(|e| AppError::ValidationError(format!("Invalid URL format: {} ({})", url, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::ValidationError(format!(
            "Unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(AppError::ValidationError(format!(
            "URL has no host: {}",
            url
        ))),
    }
}

/// Make a video title usable as a file name on every platform
pub fn sanitize_filename(title: &str) -> String {
    let cleaned = FORBIDDEN_FILENAME_CHARS.replace_all(title, " ");
    let collapsed = REPEATED_WHITESPACE.replace_all(cleaned.trim(), " ");
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c.is_whitespace());
    trimmed.chars().take(MAX_TITLE_LENGTH).collect::<String>().trim_end().to_string()
}

/// File name for a saved payload. Premium files carry an `_HD` suffix.
pub fn derive_filename(title: Option<&str>, tier: AccessTier) -> String {
    let base = title.map(sanitize_filename).unwrap_or_default();
    let base = if base.is_empty() {
        FALLBACK_FILE_TITLE.to_string()
    } else {
        base
    };
    match tier {
        AccessTier::Free => format!("{}.mp4", base),
        AccessTier::Premium => format!("{}_HD.mp4", base),
    }
}

/// Format a duration in seconds as m:ss
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Button-style label for a format listing
pub fn format_option_label(format: &FormatOption, tier: AccessTier) -> String {
    let mut label = if format.container.is_empty() {
        format.quality_label.clone()
    } else {
        format!("{} ({})", format.quality_label, format.container)
    };
    if !format.filesize_display.is_empty() {
        label.push_str(&format!(" ~{}", format.filesize_display));
    }
    if tier.is_premium() {
        label.push_str(" PREMIUM");
    }
    label
}
