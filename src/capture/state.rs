use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::measure::{
    convert_at, BodyLandmarks, FrontMeasurement, MergedRecord, SideMeasurement, View,
};
use crate::units::UnitSystem;

/// Minimum overall confidence before a capture action is allowed.
const CAPTURE_CONFIDENCE_GATE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CapturePhase {
    Home,
    Instructions,
    CapturingFront,
    CapturingSide,
    Review,
}

impl CapturePhase {
    pub fn current_view(&self) -> Option<View> {
        match self {
            CapturePhase::CapturingFront => Some(View::Front),
            CapturePhase::CapturingSide => Some(View::Side),
            _ => None,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.current_view().is_some()
    }
}

/// Coarse confidence tier shown to the user during live capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackingQuality {
    Poor,
    Good,
    Excellent,
}

impl TrackingQuality {
    pub fn classify(confidence: f64) -> Self {
        if confidence > 0.8 {
            TrackingQuality::Excellent
        } else if confidence > 0.6 {
            TrackingQuality::Good
        } else {
            TrackingQuality::Poor
        }
    }
}

/// Outcome of a successful capture action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureAdvance {
    /// Front view stored; the flow moves on to the side view.
    FrontCaptured,
    /// Both views merged; tracking should stop and review begins.
    SessionComplete,
}

/// In-memory state of one measurement-taking flow. Owned exclusively by the
/// orchestrator; mutated only on its lock, so interleaved async callbacks
/// never race. Nothing here is durable until explicitly persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureState {
    pub phase: CapturePhase,
    pub session_id: Option<String>,
    pub unit_system: UnitSystem,
    pub landmarks: BodyLandmarks,
    pub body_detected: bool,
    pub confidence: f64,
    pub quality: TrackingQuality,
    pub front: Option<FrontMeasurement>,
    pub side: Option<SideMeasurement>,
    pub merged: Option<MergedRecord>,
    pub started_at: Option<DateTime<Utc>>,
}

impl Default for CaptureState {
    fn default() -> Self {
        Self {
            phase: CapturePhase::Home,
            session_id: None,
            unit_system: UnitSystem::default(),
            landmarks: BodyLandmarks::default(),
            body_detected: false,
            confidence: 0.0,
            quality: TrackingQuality::Poor,
            front: None,
            side: None,
            merged: None,
            started_at: None,
        }
    }
}

impl CaptureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_instructions(&mut self) -> Result<()> {
        if self.phase != CapturePhase::Home {
            bail!("instructions can only be opened from the home screen");
        }
        self.phase = CapturePhase::Instructions;
        Ok(())
    }

    /// Enter the front-view capture step and clear any stale tracking data.
    pub fn begin_capture(
        &mut self,
        session_id: String,
        unit_system: UnitSystem,
        started_at: DateTime<Utc>,
    ) -> Result<()> {
        if self.phase != CapturePhase::Instructions {
            bail!("capture must be started from the instructions screen");
        }
        *self = Self {
            phase: CapturePhase::CapturingFront,
            session_id: Some(session_id),
            unit_system,
            started_at: Some(started_at),
            ..Self::default()
        };
        Ok(())
    }

    /// Replace the tracking snapshot wholesale with this tick's data.
    pub fn apply_tracking(
        &mut self,
        landmarks: BodyLandmarks,
        confidence: f64,
        body_detected: bool,
    ) {
        self.landmarks = landmarks;
        self.confidence = confidence;
        self.body_detected = body_detected;
        self.quality = TrackingQuality::classify(confidence);
    }

    /// The only gating invariant on user-triggered capture.
    pub fn can_capture(&self) -> bool {
        self.phase.is_capturing()
            && self.body_detected
            && self.confidence > CAPTURE_CONFIDENCE_GATE
    }

    /// Run the converter on the current landmark snapshot for the active
    /// view. Front advances to side; side merges both views and moves to
    /// review.
    pub fn capture(&mut self, now: DateTime<Utc>) -> Result<CaptureAdvance> {
        let view = self
            .phase
            .current_view()
            .ok_or_else(|| anyhow!("no capture in progress"))?;
        if !self.can_capture() {
            bail!(
                "capture blocked: body_detected={}, confidence={:.2}",
                self.body_detected,
                self.confidence
            );
        }

        let result = convert_at(&self.landmarks, view, now.timestamp_millis());
        match view {
            View::Front => {
                self.front = Some(FrontMeasurement::from_result(&result, now));
                self.phase = CapturePhase::CapturingSide;
                Ok(CaptureAdvance::FrontCaptured)
            }
            View::Side => {
                let side = SideMeasurement::from_result(&result, now);
                let front = self
                    .front
                    .as_ref()
                    .ok_or_else(|| anyhow!("side capture without a stored front view"))?;
                let merged = MergedRecord::merge(
                    front,
                    &side,
                    self.unit_system,
                    self.landmarks.clone(),
                    now,
                )?;
                self.side = Some(side);
                self.merged = Some(merged);
                self.phase = CapturePhase::Review;
                Ok(CaptureAdvance::SessionComplete)
            }
        }
    }

    /// Discard the in-memory flow entirely (user cancel or teardown).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::SimulatedTracker;

    fn tracking_state() -> CaptureState {
        let mut state = CaptureState::new();
        state.open_instructions().unwrap();
        state
            .begin_capture("session-1".into(), UnitSystem::Cm, Utc::now())
            .unwrap();
        let mut tracker = SimulatedTracker::seeded(390.0, 844.0, 11);
        let landmarks = tracker.next_landmarks();
        let confidence = landmarks.mean_confidence();
        state.apply_tracking(landmarks, confidence, true);
        state
    }

    #[test]
    fn happy_path_walks_all_phases() {
        let mut state = tracking_state();
        assert_eq!(state.phase, CapturePhase::CapturingFront);
        assert_eq!(state.capture(Utc::now()).unwrap(), CaptureAdvance::FrontCaptured);
        assert_eq!(state.phase, CapturePhase::CapturingSide);
        assert_eq!(
            state.capture(Utc::now()).unwrap(),
            CaptureAdvance::SessionComplete
        );
        assert_eq!(state.phase, CapturePhase::Review);

        let merged = state.merged.as_ref().unwrap();
        assert_eq!(merged.measurement_type, "ar");
        assert!(merged.measurements.depth > 0.0);
        assert_eq!(merged.measurements.chest, state.front.as_ref().unwrap().chest);
    }

    #[test]
    fn transitions_reject_wrong_phases() {
        let mut state = CaptureState::new();
        assert!(state
            .begin_capture("s".into(), UnitSystem::Cm, Utc::now())
            .is_err());
        state.open_instructions().unwrap();
        assert!(state.open_instructions().is_err());
        assert!(state.capture(Utc::now()).is_err());
    }

    #[test]
    fn capture_is_gated_on_detection_and_confidence() {
        let mut state = tracking_state();

        let landmarks = state.landmarks.clone();
        state.apply_tracking(landmarks.clone(), 0.9, false);
        assert!(!state.can_capture());
        assert!(state.capture(Utc::now()).is_err());

        state.apply_tracking(landmarks.clone(), 0.7, true);
        assert!(!state.can_capture(), "gate is strictly greater than 0.7");

        state.apply_tracking(landmarks, 0.71, true);
        assert!(state.can_capture());
    }

    #[test]
    fn quality_tiers_match_thresholds() {
        assert_eq!(TrackingQuality::classify(0.85), TrackingQuality::Excellent);
        assert_eq!(TrackingQuality::classify(0.8), TrackingQuality::Good);
        assert_eq!(TrackingQuality::classify(0.61), TrackingQuality::Good);
        assert_eq!(TrackingQuality::classify(0.6), TrackingQuality::Poor);
        assert_eq!(TrackingQuality::classify(0.0), TrackingQuality::Poor);
    }

    #[test]
    fn reset_discards_everything() {
        let mut state = tracking_state();
        state.capture(Utc::now()).unwrap();
        state.reset();
        assert_eq!(state.phase, CapturePhase::Home);
        assert!(state.front.is_none());
        assert!(state.merged.is_none());
        assert!(!state.body_detected);
    }

    #[test]
    fn simulated_tracking_enables_capture() {
        // The simulated pose's fixed confidences average above both the
        // excellent tier and the capture gate.
        let state = tracking_state();
        assert_eq!(state.quality, TrackingQuality::Excellent);
        assert!(state.can_capture());
    }
}
