// src/downloader.rs
// Download executor shared by the free path and the verified premium path

use crate::access::{AccessTier, TierPolicy};
use crate::api::Backend;
use crate::error::AppError;
use crate::models::{DownloadRequest, SavedFile};
use crate::security::{session_fingerprint, validate_path_safety};
use crate::utils::derive_filename;
use crate::verify::VerifiedSession;
use log::{debug, info};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Destination for a fully retrieved payload.
///
/// The sink takes ownership of the bytes; they are released as soon as
/// `save` returns.
pub trait PayloadSink {
    fn save(&mut self, filename: &str, payload: Vec<u8>) -> Result<SavedFile, AppError>;
}

/// Saves payloads into a directory on disk
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        validate_path_safety(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Picks "name (1).mp4", "name (2).mp4", ... when the name is taken
    fn free_path(&self, filename: &str) -> PathBuf {
        let candidate = self.dir.join(filename);
        if !candidate.exists() {
            return candidate;
        }

        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{}", ext)),
            None => (filename, String::new()),
        };
        (1..)
            .map(|n| self.dir.join(format!("{} ({}){}", stem, n, ext)))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

// "Clip.mp4" -> "Clip.mp4.part", then "Clip.mp4.1.part", ... if taken
fn part_path_for(final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let candidate = final_path.with_file_name(format!("{}.part", name));
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| final_path.with_file_name(format!("{}.{}.part", name, n)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

impl PayloadSink for FileSink {
    fn save(&mut self, filename: &str, payload: Vec<u8>) -> Result<SavedFile, AppError> {
        fs::create_dir_all(&self.dir)?;

        let final_path = self.free_path(filename);
        let part_path = part_path_for(&final_path);

        // Write everything under a temporary name, then move into place.
        // create_new never truncates a file that is not ours.
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&part_path)?;
            if let Err(e) = file.write_all(&payload).and_then(|_| file.sync_all()) {
                let _ = fs::remove_file(&part_path);
                return Err(AppError::IoError(e));
            }
        }
        if let Err(e) = fs::rename(&part_path, &final_path) {
            let _ = fs::remove_file(&part_path);
            return Err(AppError::IoError(e));
        }

        let bytes = payload.len() as u64;
        drop(payload);

        let filename = final_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string());
        info!("Saved {} ({} bytes)", final_path.display(), bytes);

        Ok(SavedFile {
            path: final_path,
            filename,
            bytes,
        })
    }
}

/// Fetches a whole payload from the backend and hands it to a sink
pub struct DownloadExecutor {
    backend: Arc<dyn Backend>,
    policy: Arc<TierPolicy>,
}

impl DownloadExecutor {
    pub fn new(backend: Arc<dyn Backend>, policy: Arc<TierPolicy>) -> Self {
        Self { backend, policy }
    }

    /// Free path. Refuses labels the policy marks as premium.
    pub async fn download_free(
        &self,
        video_url: &str,
        quality_label: &str,
        title: Option<&str>,
        sink: &mut dyn PayloadSink,
    ) -> Result<SavedFile, AppError> {
        if self.policy.classify(quality_label).is_premium() {
            return Err(AppError::PremiumFeature(format!(
                "{} requires a purchase",
                quality_label
            )));
        }

        let request = DownloadRequest {
            video_url: video_url.to_string(),
            quality_label: quality_label.to_string(),
            session_id: None,
        };
        debug!("Free download of {} at {}", request.video_url, request.quality_label);

        let payload = self
            .backend
            .download_free(&request.video_url, &request.quality_label)
            .await?;
        sink.save(&derive_filename(title, AccessTier::Free), payload)
    }

    /// Premium path. Only reachable with a session the verifier reported paid.
    pub async fn download_premium(
        &self,
        session: &VerifiedSession,
        video_url: &str,
        quality_label: &str,
        sink: &mut dyn PayloadSink,
    ) -> Result<SavedFile, AppError> {
        let request = DownloadRequest {
            video_url: video_url.to_string(),
            quality_label: quality_label.to_string(),
            session_id: Some(session.session_id().to_string()),
        };
        debug!(
            "Premium download of {} at {} for {}",
            request.video_url,
            request.quality_label,
            session_fingerprint(session.session_id())
        );

        let payload = self
            .backend
            .download_premium(&request.video_url, &request.quality_label, session.session_id())
            .await?;
        sink.save(&derive_filename(session.video_title(), AccessTier::Premium), payload)
    }
}
