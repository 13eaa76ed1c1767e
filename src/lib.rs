// src/lib.rs
// Expose tierload functionality as a library for the CLI and tests

pub mod access;
pub mod api;
pub mod checkout;
pub mod cli;
pub mod config;
pub mod controller;
pub mod downloader;
pub mod error;
pub mod models;
pub mod security;
pub mod utils;
pub mod verify;

pub use access::{AccessTier, TierPolicy};
pub use api::{Backend, HttpBackend};
pub use checkout::{CheckoutOrchestrator, CheckoutState, Navigator, PremiumOffer};
pub use config::Config;
pub use controller::{Controller, Selection};
pub use downloader::{DownloadExecutor, FileSink, PayloadSink};
pub use error::{AppError, Notice};
pub use verify::{ReturnHandler, ReturnParams, VerifyState};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
