//! Network throttling via Network.emulateNetworkConditions

#![allow(deprecated)] // EmulateNetworkConditionsParams is deprecated but still functional

use chromiumoxide::cdp::browser_protocol::network::{
    ConnectionType, EmulateNetworkConditionsParams,
};
use chromiumoxide::cdp::browser_protocol::network::EnableParams;
use chromiumoxide::Page;
use tracing::{debug, instrument};

use crate::error::SessionError;

pub use crate::config::NetworkProfile;

impl NetworkProfile {
    /// Download throughput in bytes per second (-1 means no throttling)
    pub fn download_throughput(&self) -> f64 {
        match self.download_bps() {
            Some(bps) => bps as f64,
            None => -1.0,
        }
    }

    /// Upload throughput in bytes per second (-1 means no throttling)
    pub fn upload_throughput(&self) -> f64 {
        match self.upload_bps() {
            Some(bps) => bps as f64,
            None => -1.0,
        }
    }

    /// Added request latency in milliseconds
    pub fn latency(&self) -> f64 {
        match self.rtt_ms() {
            Some(rtt) => rtt as f64,
            None => 0.0,
        }
    }

    pub fn offline(&self) -> bool {
        matches!(self, NetworkProfile::Offline)
    }

    fn connection_type(&self) -> ConnectionType {
        match self {
            NetworkProfile::None => ConnectionType::None,
            NetworkProfile::Offline => ConnectionType::None,
            NetworkProfile::Fast3G => ConnectionType::Cellular3g,
            _ => ConnectionType::Cellular4g,
        }
    }
}

/// Network throttling controller
pub struct NetworkThrottler;

impl NetworkThrottler {
    /// Apply a fixed latency and symmetric throughput cap to a page
    ///
    /// `NetworkProfile::None` is a no-op.
    #[instrument(skip(page), fields(profile = ?profile))]
    pub async fn apply(page: &Page, profile: NetworkProfile) -> Result<(), SessionError> {
        if profile == NetworkProfile::None {
            return Ok(());
        }

        debug!(
            "Applying network throttling: offline={}, latency={}ms, down={:.2} KB/s, up={:.2} KB/s",
            profile.offline(),
            profile.latency(),
            profile.download_throughput() / 1024.0,
            profile.upload_throughput() / 1024.0
        );

        // Conditions only take effect once the Network domain is enabled
        page.execute(EnableParams::default()).await?;

        let params = EmulateNetworkConditionsParams::builder()
            .offline(profile.offline())
            .latency(profile.latency())
            .download_throughput(profile.download_throughput())
            .upload_throughput(profile.upload_throughput())
            .connection_type(profile.connection_type())
            .build()
            .map_err(|e| {
                SessionError::Protocol(format!("Failed to build network params: {}", e))
            })?;

        page.execute(params).await?;

        debug!("Network throttling applied successfully");
        Ok(())
    }
}
