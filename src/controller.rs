// src/controller.rs
// Owner of the interactive state: active video, lookups, offer and flags

use crate::access::{AccessTier, TierPolicy};
use crate::api::Backend;
use crate::checkout::{CheckoutOrchestrator, CheckoutState, Navigator, PremiumOffer};
use crate::downloader::{DownloadExecutor, PayloadSink};
use crate::error::AppError;
use crate::models::{PurchaseIntent, SavedFile, VideoDescriptor};
use crate::utils::validate_url;
use log::{debug, info, warn};
use std::sync::Arc;

/// A video whose metadata has been received, with the URL it was looked up for
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveVideo {
    pub source_url: String,
    pub descriptor: VideoDescriptor,
}

/// Handle for one issued metadata lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    seq: u64,
    url: String,
}

impl LookupTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// What choosing a quality led to
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Free quality, saved right away
    Downloaded(SavedFile),
    /// Premium quality, the purchase offer is now open
    OfferShown(PremiumOffer),
}

/// Everything the user can see
#[derive(Debug, Default)]
pub struct UiState {
    pub source_url: String,
    pub active: Option<ActiveVideo>,
    pub loading: bool,
    pub downloading: bool,
    latest_lookup: u64,
}

pub struct Controller {
    backend: Arc<dyn Backend>,
    policy: Arc<TierPolicy>,
    executor: DownloadExecutor,
    checkout: CheckoutOrchestrator,
    state: UiState,
}

impl Controller {
    pub fn new(backend: Arc<dyn Backend>, policy: Arc<TierPolicy>, offer: PremiumOffer) -> Self {
        let executor = DownloadExecutor::new(Arc::clone(&backend), Arc::clone(&policy));
        let checkout = CheckoutOrchestrator::new(Arc::clone(&policy), offer);
        Self {
            backend,
            policy,
            executor,
            checkout,
            state: UiState::default(),
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn checkout_state(&self) -> &CheckoutState {
        self.checkout.state()
    }

    pub fn is_offer_open(&self) -> bool {
        self.checkout.is_offer_open()
    }

    /// Quality whose offer is currently open
    pub fn selected_quality(&self) -> Option<&str> {
        self.checkout.intent().map(|i| i.quality_label.as_str())
    }

    pub fn classify(&self, quality_label: &str) -> AccessTier {
        self.policy.classify(quality_label)
    }

    pub fn set_url(&mut self, url: &str) {
        self.state.source_url = url.trim().to_string();
    }

    /// Whether the lookup action is enabled for the current input
    pub fn can_lookup(&self) -> bool {
        validate_url(&self.state.source_url).is_ok()
    }

    /// Issue a lookup for the current URL and close any offer for the previous
    /// video. Fails without any network call on bad input.
    pub fn begin_lookup(&mut self) -> Result<LookupTicket, AppError> {
        validate_url(&self.state.source_url)?;
        self.state.latest_lookup += 1;
        self.state.loading = true;
        self.state.active = None;
        self.checkout.dismiss();
        debug!("lookup #{} for {}", self.state.latest_lookup, self.state.source_url);
        Ok(LookupTicket {
            seq: self.state.latest_lookup,
            url: self.state.source_url.clone(),
        })
    }

    /// Apply the result of a lookup.
    ///
    /// Returns `Ok(false)` when a newer lookup has been issued since; the
    /// result, success or failure, is then dropped.
    pub fn complete_lookup(
        &mut self,
        ticket: LookupTicket,
        result: Result<VideoDescriptor, AppError>,
    ) -> Result<bool, AppError> {
        if ticket.seq != self.state.latest_lookup {
            warn!(
                "Discarding stale lookup #{} (latest is #{})",
                ticket.seq, self.state.latest_lookup
            );
            return Ok(false);
        }

        self.state.loading = false;
        let descriptor = result?;
        info!(
            "Loaded '{}' with {} formats",
            descriptor.title,
            descriptor.formats.len()
        );
        self.state.active = Some(ActiveVideo {
            source_url: ticket.url,
            descriptor,
        });
        Ok(true)
    }

    /// Look up the current URL and make it the active video
    pub async fn lookup(&mut self) -> Result<&VideoDescriptor, AppError> {
        let ticket = self.begin_lookup()?;
        let result = self.backend.video_info(ticket.url()).await;
        self.complete_lookup(ticket, result)?;
        self.state
            .active
            .as_ref()
            .map(|a| &a.descriptor)
            .ok_or_else(|| AppError::General("Lookup produced no video".to_string()))
    }

    /// React to the user picking a quality of the active video
    pub async fn select_quality(
        &mut self,
        quality_label: &str,
        sink: &mut dyn PayloadSink,
    ) -> Result<Selection, AppError> {
        let active = self
            .state
            .active
            .clone()
            .ok_or_else(|| AppError::ValidationError("No video loaded".to_string()))?;

        match self.policy.classify(quality_label) {
            AccessTier::Premium => {
                let intent = PurchaseIntent::new(
                    &active.source_url,
                    quality_label,
                    Some(active.descriptor.title.as_str()),
                );
                let offer = self.checkout.select(intent)?.clone();
                Ok(Selection::OfferShown(offer))
            }
            AccessTier::Free => {
                if self.state.downloading {
                    return Err(AppError::DownloadError(
                        "A download is already running".to_string(),
                    ));
                }
                self.state.downloading = true;
                let result = self
                    .executor
                    .download_free(
                        &active.source_url,
                        quality_label,
                        Some(active.descriptor.title.as_str()),
                        sink,
                    )
                    .await;
                self.state.downloading = false;
                result.map(Selection::Downloaded)
            }
        }
    }

    pub fn close_offer(&mut self) {
        self.checkout.dismiss();
    }

    /// Buy the quality whose offer is open; returns the hosted checkout URL
    pub async fn purchase(&mut self, navigator: &mut dyn Navigator) -> Result<String, AppError> {
        self.checkout
            .begin_checkout(self.backend.as_ref(), navigator)
            .await
    }

    /// Forget the active video and close any offer
    pub fn reset(&mut self) {
        self.checkout.dismiss();
        self.state.active = None;
        self.state.loading = false;
        self.state.downloading = false;
    }
}
