use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::measure::BodyLandmarks;

/// Landmark update pushed by an AR session's real-time processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArMeasurementUpdate {
    pub landmarks: BodyLandmarks,
    pub confidence: f64,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArSessionStatus {
    pub is_active: bool,
}

/// Platform AR boundary, injected into the orchestrator so tests can swap in
/// a fake provider. Every call may fail; the orchestrator treats any error
/// as "capability unavailable" and falls back to simulated tracking, never
/// failing the flow.
#[async_trait]
pub trait ArCapability: Send + Sync {
    async fn is_supported(&self) -> Result<bool>;
    async fn start_session(&self) -> Result<bool>;
    async fn stop_session(&self) -> Result<()>;
    async fn start_real_time_processing(&self) -> Result<()>;
    async fn stop_real_time_processing(&self) -> Result<()>;
    async fn session_status(&self) -> Result<ArSessionStatus>;
    /// Subscribe to the measurement-update stream of an active session.
    async fn measurement_updates(&self) -> Result<mpsc::Receiver<ArMeasurementUpdate>>;
}

/// The capability on platforms without body-tracking hardware support.
/// Reports unsupported and rejects everything else, which routes the
/// orchestrator straight to the simulated fallback.
pub struct UnsupportedAr;

#[async_trait]
impl ArCapability for UnsupportedAr {
    async fn is_supported(&self) -> Result<bool> {
        Ok(false)
    }

    async fn start_session(&self) -> Result<bool> {
        bail!("AR sessions are not supported on this platform")
    }

    async fn stop_session(&self) -> Result<()> {
        Ok(())
    }

    async fn start_real_time_processing(&self) -> Result<()> {
        bail!("AR real-time processing is not supported on this platform")
    }

    async fn stop_real_time_processing(&self) -> Result<()> {
        Ok(())
    }

    async fn session_status(&self) -> Result<ArSessionStatus> {
        Ok(ArSessionStatus { is_active: false })
    }

    async fn measurement_updates(&self) -> Result<mpsc::Receiver<ArMeasurementUpdate>> {
        bail!("no AR session to subscribe to")
    }
}

/// Pick the AR provider for the current platform. Desktop builds have no
/// body-tracking capability, so this always routes to the fallback today;
/// the indirection keeps the orchestrator unaware of that.
pub fn platform_capability() -> std::sync::Arc<dyn ArCapability> {
    std::sync::Arc::new(UnsupportedAr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_capability_reports_unsupported() {
        let ar = UnsupportedAr;
        assert!(!ar.is_supported().await.unwrap());
        assert!(ar.start_session().await.is_err());
        assert!(!ar.session_status().await.unwrap().is_active);
        // Stop calls are best-effort no-ops so teardown never fails.
        assert!(ar.stop_session().await.is_ok());
        assert!(ar.stop_real_time_processing().await.is_ok());
    }
}
