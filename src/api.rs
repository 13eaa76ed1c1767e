// src/api.rs
// Client side of the metadata/payment backend contract

use crate::config::Config;
use crate::error::AppError;
use crate::models::{CheckoutRedirect, CreateCheckoutRequest, PaymentVerification, VideoDescriptor};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const INFO_PATH: &str = "/api/info";
pub const DOWNLOAD_PATH: &str = "/api/download";
pub const CREATE_CHECKOUT_PATH: &str = "/api/create-checkout";
pub const VERIFY_PAYMENT_PATH: &str = "/api/verify-payment";
pub const PREMIUM_DOWNLOAD_PATH: &str = "/api/download-premium";

/// The five backend calls the client depends on.
///
/// Any transport failure or non-2xx answer is an `Err`; there are no retries
/// at this layer.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/info?url=`
    async fn video_info(&self, video_url: &str) -> Result<VideoDescriptor, AppError>;

    /// `GET /api/download?url=&quality=`
    async fn download_free(&self, video_url: &str, quality: &str) -> Result<Vec<u8>, AppError>;

    /// `POST /api/create-checkout`
    async fn create_checkout(
        &self,
        request: &CreateCheckoutRequest,
    ) -> Result<CheckoutRedirect, AppError>;

    /// `GET /api/verify-payment?session_id=`
    async fn verify_payment(&self, session_id: &str) -> Result<PaymentVerification, AppError>;

    /// `GET /api/download-premium?url=&quality=&session_id=`
    async fn download_premium(
        &self,
        video_url: &str,
        quality: &str,
        session_id: &str,
    ) -> Result<Vec<u8>, AppError>;
}

/// reqwest implementation of [`Backend`]
///
/// `timeout` bounds connecting and each read. JSON calls are also bounded as
/// a whole; payload downloads may take longer as long as bytes keep arriving.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, AppError> {
        // Fail early on an unusable base address
        Url::parse(api_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid api_url {}: {}", api_url, e)))?;

        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(concat!("tierload/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: api_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(&config.api_url, config.timeout())
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, AppError> {
        let raw = format!("{}{}", self.base_url, path);
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        url.map_err(|e| AppError::ConfigError(format!("Invalid endpoint {}: {}", raw, e)))
    }

    pub fn info_url(&self, video_url: &str) -> Result<Url, AppError> {
        self.endpoint(INFO_PATH, &[("url", video_url)])
    }

    pub fn download_url(&self, video_url: &str, quality: &str) -> Result<Url, AppError> {
        self.endpoint(DOWNLOAD_PATH, &[("url", video_url), ("quality", quality)])
    }

    pub fn create_checkout_url(&self) -> Result<Url, AppError> {
        self.endpoint(CREATE_CHECKOUT_PATH, &[])
    }

    pub fn verify_payment_url(&self, session_id: &str) -> Result<Url, AppError> {
        self.endpoint(VERIFY_PAYMENT_PATH, &[("session_id", session_id)])
    }

    pub fn premium_download_url(
        &self,
        video_url: &str,
        quality: &str,
        session_id: &str,
    ) -> Result<Url, AppError> {
        self.endpoint(
            PREMIUM_DOWNLOAD_PATH,
            &[("url", video_url), ("quality", quality), ("session_id", session_id)],
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, url: Url) -> Result<T, AppError> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        let body = ensure_success(path, response)?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_binary(&self, path: &str, url: Url) -> Result<Vec<u8>, AppError> {
        let response = self.client.get(url).send().await?;
        let body = ensure_success(path, response)?.bytes().await?;
        debug!("{} returned {} bytes", path, body.len());
        Ok(body.to_vec())
    }
}

fn ensure_success(path: &str, response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::HttpStatus {
            endpoint: path.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn video_info(&self, video_url: &str) -> Result<VideoDescriptor, AppError> {
        let url = self.info_url(video_url)?;
        self.get_json(INFO_PATH, url).await
    }

    async fn download_free(&self, video_url: &str, quality: &str) -> Result<Vec<u8>, AppError> {
        let url = self.download_url(video_url, quality)?;
        self.get_binary(DOWNLOAD_PATH, url).await
    }

    async fn create_checkout(
        &self,
        request: &CreateCheckoutRequest,
    ) -> Result<CheckoutRedirect, AppError> {
        let url = self.create_checkout_url()?;
        let response = self
            .client
            .post(url)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await?;
        let body = ensure_success(CREATE_CHECKOUT_PATH, response)?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn verify_payment(&self, session_id: &str) -> Result<PaymentVerification, AppError> {
        let url = self.verify_payment_url(session_id)?;
        self.get_json(VERIFY_PAYMENT_PATH, url).await
    }

    async fn download_premium(
        &self,
        video_url: &str,
        quality: &str,
        session_id: &str,
    ) -> Result<Vec<u8>, AppError> {
        let url = self.premium_download_url(video_url, quality, session_id)?;
        self.get_binary(PREMIUM_DOWNLOAD_PATH, url).await
    }
}
