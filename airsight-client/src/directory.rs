use airsight_api::models::DeviceListing;
use time::OffsetDateTime;

use crate::transport::SensorTransport;

/// Loads the device directory. Never fails: when the service cannot be
/// reached the placeholder list is returned, tagged as such and carrying the
/// reason.
pub async fn load_devices(transport: &dyn SensorTransport) -> DeviceListing {
    match transport.fetch_devices().await {
        Ok(body) => {
            let devices = body.data.unwrap_or_default();
            tracing::debug!("devices fetched successfully: {}", devices.len());

            DeviceListing {
                devices,
                source: body.source.unwrap_or_default(),
                message: body.message,
            }
        }
        Err(e) => {
            tracing::warn!("error fetching devices: {}", e);
            DeviceListing::placeholder(OffsetDateTime::now_utc(), e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use airsight_api::models::{DataSource, Device, SensorData, placeholder_devices};
    use airsight_api::restful::ApiResponse;
    use async_trait::async_trait;

    use super::*;
    use crate::error::{FetchError, Result};

    struct FixedTransport {
        devices: Result<ApiResponse<Vec<Device>>>,
    }

    #[async_trait]
    impl SensorTransport for FixedTransport {
        async fn fetch_readings(&self, device_id: &str, _historical: bool) -> Result<SensorData> {
            Err(FetchError::EmptyResult(device_id.to_string()))
        }

        async fn fetch_devices(&self) -> Result<ApiResponse<Vec<Device>>> {
            self.devices.clone()
        }
    }

    #[tokio::test]
    async fn test_transport_failure_yields_placeholder() {
        let transport = FixedTransport {
            devices: Err(FetchError::Network(String::from("connection refused"))),
        };

        let listing = load_devices(&transport).await;

        assert!(listing.is_placeholder());
        assert_eq!(listing.devices.len(), 3);
        assert_eq!(listing.devices[0].id, "Esp_353");
        assert!(listing.message.is_some_and(|m| m.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_keeps_server_source_tag() {
        let devices = placeholder_devices(OffsetDateTime::now_utc());
        let transport = FixedTransport {
            devices: Ok(ApiResponse::ok(devices[..1].to_vec())
                .with_source(DataSource::Placeholder)
                .with_message("Using fallback device data due to database error")),
        };

        let listing = load_devices(&transport).await;

        assert!(listing.is_placeholder());
        assert_eq!(listing.devices.len(), 1);

        let transport = FixedTransport {
            devices: Ok(ApiResponse::ok(devices)),
        };
        let listing = load_devices(&transport).await;

        assert_eq!(listing.source, DataSource::Live);
        assert!(listing.message.is_none());
    }
}
