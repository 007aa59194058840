use std::time::Duration;

use airsight_api::models::{Device, SensorData};
use airsight_api::restful::{ApiResponse, SensorQuery};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::{FetchError, Result};

/// Source of readings and device listings.
#[async_trait]
pub trait SensorTransport: Send + Sync {
    /// Latest reading of `device_id`, or its recent window when `historical`.
    async fn fetch_readings(&self, device_id: &str, historical: bool) -> Result<SensorData>;

    /// The device directory, including the source tag and fallback message.
    async fn fetch_devices(&self) -> Result<ApiResponse<Vec<Device>>>;
}

/// Talks to the airsight HTTP service.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends `request` and unwraps the envelope, turning every non-success
    /// answer into a [`FetchError`].
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let body: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => return Err(FetchError::from_status(status, String::new())),
        };

        if !status.is_success() {
            let detail = body.error.or(body.message).unwrap_or_default();
            return Err(FetchError::from_status(status, detail));
        }

        if !body.success {
            let detail = body
                .error
                .or(body.message)
                .unwrap_or_else(|| String::from("request was not successful"));
            return Err(FetchError::Backend(detail));
        }

        Ok(body)
    }
}

#[async_trait]
impl SensorTransport for HttpTransport {
    async fn fetch_readings(&self, device_id: &str, historical: bool) -> Result<SensorData> {
        let query = SensorQuery {
            device_id: Some(device_id.to_string()),
            historical,
        };
        let request = self.client.get(self.url("/sensors")).query(&query);

        tracing::debug!("fetching readings of {device_id} (historical: {historical})");

        let body: ApiResponse<SensorData> = self.send(request).await?;

        match body.data {
            Some(data) if !data.is_empty() => Ok(data),
            _ => Err(FetchError::EmptyResult(device_id.to_string())),
        }
    }

    async fn fetch_devices(&self) -> Result<ApiResponse<Vec<Device>>> {
        let request = self.client.get(self.url("/devices"));

        self.send(request).await
    }
}
