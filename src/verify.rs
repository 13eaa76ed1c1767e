// src/verify.rs
// Return view: confirm payment with the backend, then deliver the premium file

use crate::access::TierPolicy;
use crate::api::Backend;
use crate::downloader::{DownloadExecutor, PayloadSink};
use crate::error::{AppError, Notice};
use crate::models::{SavedFile, SessionMetadata};
use crate::security::session_fingerprint;
use log::{debug, error, info, warn};
use reqwest::Url;
use std::sync::Arc;

/// Parameters carried by the navigation back from the payment provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnParams {
    pub session_id: Option<String>,
    pub video_url: Option<String>,
    pub quality: Option<String>,
}

impl ReturnParams {
    /// Read `session_id`, `url` and `quality` from a full return address
    pub fn from_return_url(address: &str) -> Result<Self, AppError> {
        let url = Url::parse(address).map_err(|e| {
            AppError::ValidationError(format!("Invalid return address {}: {}", address, e))
        })?;
        Ok(Self::from_pairs(url.query_pairs()))
    }

    /// Read the parameters from a bare query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Self {
        let address = format!("http://return.invalid/?{}", query.trim_start_matches('?'));
        match Url::parse(&address) {
            Ok(url) => Self::from_pairs(url.query_pairs()),
            Err(_) => Self::default(),
        }
    }

    fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: Iterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = ReturnParams::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "session_id" => params.session_id = Some(value.to_string()),
                "url" => params.video_url = Some(value.to_string()),
                "quality" => params.quality = Some(value.to_string()),
                _ => {}
            }
        }
        params
    }
}

/// A checkout session the backend has explicitly reported as paid.
///
/// Only [`ReturnHandler`] can create one, and only from a `paid: true`
/// verification answer.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    session_id: String,
    metadata: SessionMetadata,
}

impl VerifiedSession {
    fn confirmed(session_id: String, metadata: SessionMetadata) -> Self {
        Self {
            session_id,
            metadata,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn video_title(&self) -> Option<&str> {
        self.metadata.video_title.as_deref()
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }
}

/// Return view lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyState {
    /// Nothing to do, or not started yet
    Idle,
    Verifying,
    /// The backend says the session is not paid; a normal outcome
    NotPaid,
    /// Paid, but the target video or quality could not be resolved
    Verified,
    DownloadingPremium,
    Completed(SavedFile),
    Failed(Notice),
}

impl VerifyState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VerifyState::Verifying | VerifyState::DownloadingPremium)
    }
}

/// Runs one return-view activation.
///
/// `activate` consumes the handler, so a handler delivers at most one
/// premium payload.
pub struct ReturnHandler {
    backend: Arc<dyn Backend>,
    executor: DownloadExecutor,
    state: VerifyState,
}

impl ReturnHandler {
    pub fn new(backend: Arc<dyn Backend>, policy: Arc<TierPolicy>) -> Self {
        let executor = DownloadExecutor::new(Arc::clone(&backend), policy);
        Self {
            backend,
            executor,
            state: VerifyState::Idle,
        }
    }

    pub fn state(&self) -> &VerifyState {
        &self.state
    }

    fn transition(&mut self, next: VerifyState) {
        debug!("return view: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub async fn activate(
        mut self,
        params: ReturnParams,
        sink: &mut dyn PayloadSink,
    ) -> VerifyState {
        let session_id = match params.session_id.clone() {
            Some(id) => id,
            None => {
                debug!("Return view opened without a session id");
                return self.state;
            }
        };
        let fingerprint = session_fingerprint(&session_id);

        self.transition(VerifyState::Verifying);
        let verification = match self.backend.verify_payment(&session_id).await {
            Ok(v) => v,
            Err(e) => {
                error!("Payment verification for {} failed: {}", fingerprint, e);
                self.transition(VerifyState::Failed(Notice::PremiumDownload));
                return self.state;
            }
        };

        if !verification.paid {
            info!("Session {} is not paid", fingerprint);
            self.transition(VerifyState::NotPaid);
            return self.state;
        }

        let session =
            VerifiedSession::confirmed(session_id, verification.metadata.unwrap_or_default());
        info!("Session {} confirmed as paid", fingerprint);

        let (video_url, quality) = match resolve_target(session.metadata(), &params) {
            Some(target) => target,
            None => {
                warn!(
                    "Session {} is paid but the video or quality is unknown; nothing to download",
                    fingerprint
                );
                self.transition(VerifyState::Verified);
                return self.state;
            }
        };

        self.transition(VerifyState::DownloadingPremium);
        match self
            .executor
            .download_premium(&session, &video_url, &quality, sink)
            .await
        {
            Ok(saved) => self.transition(VerifyState::Completed(saved)),
            Err(e) => {
                error!("Premium download for {} failed: {}", fingerprint, e);
                self.transition(VerifyState::Failed(Notice::PremiumDownload));
            }
        }
        self.state
    }
}

/// Pick the video and quality to deliver.
///
/// Server-held session metadata wins over the navigation parameters, which
/// the user can edit; the parameters only fill gaps.
pub fn resolve_target(
    metadata: &SessionMetadata,
    params: &ReturnParams,
) -> Option<(String, String)> {
    let video_url = prefer_server(
        "url",
        metadata.video_url.as_deref(),
        params.video_url.as_deref(),
    )?;
    let quality = prefer_server(
        "quality",
        metadata.quality.as_deref(),
        params.quality.as_deref(),
    )?;
    Some((video_url, quality))
}

fn prefer_server(name: &str, server: Option<&str>, client: Option<&str>) -> Option<String> {
    let server = server.map(str::trim).filter(|s| !s.is_empty());
    let client = client.map(str::trim).filter(|s| !s.is_empty());
    match (server, client) {
        (Some(s), Some(c)) if s != c => {
            warn!(
                "Return parameter {} ({}) disagrees with the paid session ({}); using the session",
                name, c, s
            );
            Some(s.to_string())
        }
        (Some(s), _) => Some(s.to_string()),
        (None, Some(c)) => Some(c.to_string()),
        (None, None) => None,
    }
}
