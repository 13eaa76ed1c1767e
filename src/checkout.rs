// src/checkout.rs
// Purchase flow for premium qualities: intent, session creation, redirect

use crate::access::TierPolicy;
use crate::api::Backend;
use crate::error::{AppError, Notice};
use crate::models::{CreateCheckoutRequest, PurchaseIntent};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Price shown next to a premium quality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PremiumOffer {
    pub price: String,
    pub original_price: String,
    pub discount: String,
}

impl Default for PremiumOffer {
    fn default() -> Self {
        Self {
            price: "R$ 1,99".to_string(),
            original_price: "R$ 9,99".to_string(),
            discount: "80% OFF".to_string(),
        }
    }
}

/// Sends the user to the hosted checkout page
pub trait Navigator {
    fn navigate(&mut self, url: &str) -> Result<(), AppError>;
}

/// Checkout lifecycle as seen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    /// The purchase offer is on screen
    IntentSelected(PurchaseIntent),
    AwaitingSessionCreation(PurchaseIntent),
    /// Control has left for the payment provider
    Redirecting(String),
    /// Session creation failed; the offer stays up for a retry
    Failed { intent: PurchaseIntent, notice: Notice },
}

pub struct CheckoutOrchestrator {
    policy: Arc<TierPolicy>,
    offer: PremiumOffer,
    state: CheckoutState,
}

impl CheckoutOrchestrator {
    pub fn new(policy: Arc<TierPolicy>, offer: PremiumOffer) -> Self {
        Self {
            policy,
            offer,
            state: CheckoutState::Idle,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn offer(&self) -> &PremiumOffer {
        &self.offer
    }

    /// The intent behind the open offer, if any
    pub fn intent(&self) -> Option<&PurchaseIntent> {
        match &self.state {
            CheckoutState::IntentSelected(intent)
            | CheckoutState::AwaitingSessionCreation(intent)
            | CheckoutState::Failed { intent, .. } => Some(intent),
            CheckoutState::Idle | CheckoutState::Redirecting(_) => None,
        }
    }

    pub fn is_offer_open(&self) -> bool {
        self.intent().is_some()
    }

    fn transition(&mut self, next: CheckoutState) {
        debug!("checkout: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Show the purchase offer for a premium quality
    pub fn select(&mut self, intent: PurchaseIntent) -> Result<&PremiumOffer, AppError> {
        if !self.policy.is_premium(&intent.quality_label) {
            return Err(AppError::PremiumFeature(format!(
                "{} is a free quality and cannot be purchased",
                intent.quality_label
            )));
        }
        match self.state {
            CheckoutState::AwaitingSessionCreation(_) | CheckoutState::Redirecting(_) => {
                return Err(AppError::CheckoutError(
                    "A checkout is already in progress".to_string(),
                ))
            }
            _ => {}
        }
        self.transition(CheckoutState::IntentSelected(intent));
        Ok(&self.offer)
    }

    /// Close the offer without buying.
    ///
    /// Also clears a session creation whose future was dropped before it
    /// finished.
    pub fn dismiss(&mut self) {
        if matches!(
            self.state,
            CheckoutState::IntentSelected(_)
                | CheckoutState::AwaitingSessionCreation(_)
                | CheckoutState::Failed { .. }
        ) {
            self.transition(CheckoutState::Idle);
        }
    }

    /// Create a payment session for the selected intent and redirect to it.
    ///
    /// On failure nothing is navigated and the offer stays open.
    pub async fn begin_checkout(
        &mut self,
        backend: &dyn Backend,
        navigator: &mut dyn Navigator,
    ) -> Result<String, AppError> {
        let intent = match &self.state {
            CheckoutState::IntentSelected(intent) | CheckoutState::Failed { intent, .. } => {
                intent.clone()
            }
            _ => {
                return Err(AppError::CheckoutError(
                    "No premium quality selected".to_string(),
                ))
            }
        };

        // Never open a session for a free quality
        if !self.policy.is_premium(&intent.quality_label) {
            return Err(AppError::PremiumFeature(format!(
                "{} is a free quality and cannot be purchased",
                intent.quality_label
            )));
        }

        self.transition(CheckoutState::AwaitingSessionCreation(intent.clone()));
        let request = CreateCheckoutRequest::from(&intent);

        let redirect = match backend.create_checkout(&request).await {
            Ok(redirect) if !redirect.url.trim().is_empty() => redirect,
            Ok(_) => {
                return Err(self.fail(
                    intent,
                    AppError::CheckoutError("Backend returned an empty checkout URL".to_string()),
                ))
            }
            Err(e) => return Err(self.fail(intent, e)),
        };

        if let Err(e) = navigator.navigate(&redirect.url) {
            return Err(self.fail(intent, e));
        }

        info!(
            "Redirecting to checkout for {} at {}",
            intent.video_url, intent.quality_label
        );
        self.transition(CheckoutState::Redirecting(redirect.url.clone()));
        Ok(redirect.url)
    }

    fn fail(&mut self, intent: PurchaseIntent, cause: AppError) -> AppError {
        error!("Checkout session creation failed: {}", cause);
        self.transition(CheckoutState::Failed {
            intent,
            notice: Notice::Payment,
        });
        cause
    }
}
