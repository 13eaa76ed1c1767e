// src/models.rs
// Wire types shared with the metadata and payment backend

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Metadata returned by `GET /api/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDescriptor {
    pub title: String,
    /// Length in seconds. The backend sends this as a numeric string.
    #[serde(default, deserialize_with = "seconds_from_any")]
    pub duration: u64,
    #[serde(rename = "thumbnail", default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub formats: Vec<FormatOption>,
}

/// One selectable encoding of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatOption {
    /// Human-readable tier such as "720p"; the only key used for access decisions
    #[serde(rename = "quality")]
    pub quality_label: String,
    #[serde(rename = "itag")]
    pub format_id: i64,
    #[serde(default)]
    pub container: String,
    #[serde(rename = "filesize", default, deserialize_with = "display_from_any")]
    pub filesize_display: String,
}

/// What the user asked to buy. Lives only until the checkout redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseIntent {
    pub video_url: String,
    pub quality_label: String,
    pub display_title: String,
}

/// Title used for checkout when no metadata has been loaded
pub const FALLBACK_CHECKOUT_TITLE: &str = "Vídeo";

impl PurchaseIntent {
    pub fn new(video_url: &str, quality_label: &str, title: Option<&str>) -> Self {
        let display_title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(FALLBACK_CHECKOUT_TITLE)
            .to_string();
        Self {
            video_url: video_url.to_string(),
            quality_label: quality_label.to_string(),
            display_title,
        }
    }
}

/// Body of `POST /api/create-checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub video_title: String,
    pub video_url: String,
    pub quality: String,
}

impl From<&PurchaseIntent> for CreateCheckoutRequest {
    fn from(intent: &PurchaseIntent) -> Self {
        Self {
            video_title: intent.display_title.clone(),
            video_url: intent.video_url.clone(),
            quality: intent.quality_label.clone(),
        }
    }
}

/// Response of `POST /api/create-checkout`: the hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    pub url: String,
}

/// Server-held metadata attached to a checkout session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default, alias = "videoUrl", alias = "url")]
    pub video_url: Option<String>,
    #[serde(default, alias = "quality_label")]
    pub quality: Option<String>,
}

/// Response of `GET /api/verify-payment`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub metadata: Option<SessionMetadata>,
}

/// Parameters of one download executor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub video_url: String,
    pub quality_label: String,
    pub session_id: Option<String>,
}

/// A payload that has been written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub filename: String,
    pub bytes: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Int(u64),
    Float(f64),
    Text(String),
}

// Reads the leading digits the way the web client's parseInt did; anything
// unreadable counts as zero.
fn seconds_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(LooseValue::Int(n)) => n,
        Some(LooseValue::Float(f)) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        Some(LooseValue::Float(_)) => 0,
        Some(LooseValue::Text(s)) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        }
        None => 0,
    })
}

fn display_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(LooseValue::Int(n)) => n.to_string(),
        Some(LooseValue::Float(f)) => f.to_string(),
        Some(LooseValue::Text(s)) => s,
        None => String::new(),
    })
}
