// tests/common/mod.rs
// In-memory collaborators: a scripted backend, a recording navigator and sink

#![allow(dead_code)]

pub mod http;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tierload::models::{
    CheckoutRedirect, CreateCheckoutRequest, FormatOption, PaymentVerification, SavedFile,
    SessionMetadata, VideoDescriptor,
};
use tierload::{AppError, Backend, Navigator, PayloadSink};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Info(String),
    Free { url: String, quality: String },
    CreateCheckout(CreateCheckoutRequest),
    Verify(String),
    Premium { url: String, quality: String, session_id: String },
}

fn server_error(endpoint: &str) -> AppError {
    AppError::HttpStatus {
        endpoint: endpoint.to_string(),
        status: 500,
    }
}

pub struct MockBackend {
    calls: Mutex<Vec<Call>>,
    videos: HashMap<String, VideoDescriptor>,
    verification: Option<PaymentVerification>,
    checkout_url: Option<String>,
    payload: Vec<u8>,
    fail_downloads: bool,
    stall_checkout: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            videos: HashMap::new(),
            verification: None,
            checkout_url: Some("https://checkout.example.com/pay/cs_test_1".to_string()),
            payload: b"video-bytes".to_vec(),
            fail_downloads: false,
            stall_checkout: false,
        }
    }

    pub fn with_video(mut self, url: &str, descriptor: VideoDescriptor) -> Self {
        self.videos.insert(url.to_string(), descriptor);
        self
    }

    pub fn with_verification(mut self, verification: PaymentVerification) -> Self {
        self.verification = Some(verification);
        self
    }

    pub fn failing_checkout(mut self) -> Self {
        self.checkout_url = None;
        self
    }

    /// Session creation never answers
    pub fn stalled_checkout(mut self) -> Self {
        self.stall_checkout = true;
        self
    }

    pub fn failing_downloads(mut self) -> Self {
        self.fail_downloads = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn video_info(&self, video_url: &str) -> Result<VideoDescriptor, AppError> {
        self.record(Call::Info(video_url.to_string()));
        self.videos
            .get(video_url)
            .cloned()
            .ok_or_else(|| server_error("/api/info"))
    }

    async fn download_free(&self, video_url: &str, quality: &str) -> Result<Vec<u8>, AppError> {
        self.record(Call::Free {
            url: video_url.to_string(),
            quality: quality.to_string(),
        });
        if self.fail_downloads {
            return Err(server_error("/api/download"));
        }
        Ok(self.payload.clone())
    }

    async fn create_checkout(
        &self,
        request: &CreateCheckoutRequest,
    ) -> Result<CheckoutRedirect, AppError> {
        self.record(Call::CreateCheckout(request.clone()));
        if self.stall_checkout {
            std::future::pending::<()>().await;
        }
        match &self.checkout_url {
            Some(url) => Ok(CheckoutRedirect { url: url.clone() }),
            None => Err(server_error("/api/create-checkout")),
        }
    }

    async fn verify_payment(&self, session_id: &str) -> Result<PaymentVerification, AppError> {
        self.record(Call::Verify(session_id.to_string()));
        self.verification
            .clone()
            .ok_or_else(|| server_error("/api/verify-payment"))
    }

    async fn download_premium(
        &self,
        video_url: &str,
        quality: &str,
        session_id: &str,
    ) -> Result<Vec<u8>, AppError> {
        self.record(Call::Premium {
            url: video_url.to_string(),
            quality: quality.to_string(),
            session_id: session_id.to_string(),
        });
        if self.fail_downloads {
            return Err(server_error("/api/download-premium"));
        }
        Ok(self.payload.clone())
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub visited: Vec<String>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, url: &str) -> Result<(), AppError> {
        self.visited.push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub saved: Vec<(String, Vec<u8>)>,
}

impl PayloadSink for MemorySink {
    fn save(&mut self, filename: &str, payload: Vec<u8>) -> Result<SavedFile, AppError> {
        let bytes = payload.len() as u64;
        self.saved.push((filename.to_string(), payload));
        Ok(SavedFile {
            path: PathBuf::from(filename),
            filename: filename.to_string(),
            bytes,
        })
    }
}

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

pub fn sample_video() -> VideoDescriptor {
    let format = |quality: &str, itag: i64| FormatOption {
        quality_label: quality.to_string(),
        format_id: itag,
        container: "mp4".to_string(),
        filesize_display: "10 MB".to_string(),
    };
    VideoDescriptor {
        title: "Never Gonna Give You Up".to_string(),
        duration: 213,
        thumbnail_url: "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string(),
        formats: vec![
            format("1080p", 137),
            format("720p", 22),
            format("360p", 18),
        ],
    }
}

pub fn paid(title: &str) -> PaymentVerification {
    PaymentVerification {
        paid: true,
        metadata: Some(SessionMetadata {
            video_title: Some(title.to_string()),
            video_url: None,
            quality: None,
        }),
    }
}

pub fn unpaid() -> PaymentVerification {
    PaymentVerification {
        paid: false,
        metadata: None,
    }
}
