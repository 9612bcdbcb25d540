//! CPU throttling via Emulation.setCPUThrottlingRate

use chromiumoxide::cdp::browser_protocol::emulation::SetCpuThrottlingRateParams;
use chromiumoxide::Page;
use tracing::{debug, instrument};

use crate::error::SessionError;

/// CPU throttling controller
pub struct CpuThrottler;

impl CpuThrottler {
    /// Slow the page's main thread down by `rate`
    ///
    /// * 1.0 = full speed
    /// * 4.0 = mid-tier mobile device
    /// * 6.0 = low-end mobile device
    #[instrument(skip(page), fields(rate = %rate))]
    pub async fn apply(page: &Page, rate: f64) -> Result<(), SessionError> {
        Self::validate_rate(rate)?;

        debug!("Applying CPU throttling with {}x slowdown", rate);

        let params = SetCpuThrottlingRateParams::builder()
            .rate(rate)
            .build()
            .map_err(|e| SessionError::Protocol(format!("Failed to build CPU params: {}", e)))?;

        page.execute(params).await?;

        debug!("CPU throttling applied successfully");
        Ok(())
    }

    /// Rates below 1.0 would speed the page up, which no device profile wants
    pub fn validate_rate(rate: f64) -> Result<(), SessionError> {
        if !rate.is_finite() || rate < 1.0 {
            return Err(SessionError::Launch(format!(
                "CPU throttling rate must be >= 1.0 (got {})",
                rate
            )));
        }
        Ok(())
    }
}
