use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use tauri::{AppHandle, Emitter};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::ar::ArCapability;
use crate::camera::FrameSource;
use crate::capture::state::{CaptureAdvance, CapturePhase, CaptureState, TrackingQuality};
use crate::db::{Database, MeasurementEntry};
use crate::measure::SimulatedTracker;
use crate::units::UnitSystem;
use crate::vision::VisionAnalyzer;

/// Period of the live tracking loop.
const TRACKING_TICK: Duration = Duration::from_millis(100);

/// Viewport the simulated tracker scales its pose to.
const SIM_VIEWPORT_WIDTH: f64 = 390.0;
const SIM_VIEWPORT_HEIGHT: f64 = 844.0;

#[derive(Serialize, Clone)]
struct TrackingUpdateEvent {
    body_detected: bool,
    confidence: f64,
    quality: TrackingQuality,
}

#[derive(Serialize, Clone)]
struct CaptureStateChangedEvent {
    state: CaptureState,
}

#[derive(Serialize, Clone)]
struct MeasurementSavedEvent {
    measurement_id: String,
}

/// Background tracking loop plus the token that tears it down. The token is
/// cancelled on every exit path: capture completion, user cancel, teardown.
struct TrackingTask {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

/// Drives the two-view capture flow: state transitions, the live tracking
/// loop (AR-backed or simulated), merge on completion, and handoff to the
/// measurement store.
#[derive(Clone)]
pub struct CaptureController {
    state: Arc<Mutex<CaptureState>>,
    app_handle: AppHandle,
    db: Database,
    ar: Arc<dyn ArCapability>,
    frames: Arc<dyn FrameSource>,
    tracking: Arc<Mutex<Option<TrackingTask>>>,
}

impl CaptureController {
    pub fn new(
        app_handle: AppHandle,
        db: Database,
        ar: Arc<dyn ArCapability>,
        frames: Arc<dyn FrameSource>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(CaptureState::new())),
            app_handle,
            db,
            ar,
            frames,
            tracking: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn get_state(&self) -> CaptureState {
        self.state.lock().await.clone()
    }

    pub async fn open_instructions(&self) -> Result<CaptureState> {
        {
            let mut state = self.state.lock().await;
            state.open_instructions()?;
        }
        self.emit_state_changed().await;
        Ok(self.get_state().await)
    }

    /// Enter the front-view capture step and start live tracking. AR
    /// capability problems are never fatal here; they only select the
    /// simulated fallback.
    pub async fn begin_capture(&self, unit_system: UnitSystem) -> Result<CaptureState> {
        let session_id = Uuid::new_v4().to_string();
        {
            let mut state = self.state.lock().await;
            state.begin_capture(session_id.clone(), unit_system, Utc::now())?;
        }
        info!("capture session {session_id} started");

        match self.try_start_ar_tracking().await {
            Ok(()) => info!("AR tracking active for session {session_id}"),
            Err(err) => {
                warn!("AR capability unavailable ({err:#}); using simulated tracking");
                self.start_simulated_tracking().await;
            }
        }

        self.emit_state_changed().await;
        Ok(self.get_state().await)
    }

    /// User-triggered capture of the current view. Gated inside the state
    /// machine; completing the side view stops tracking.
    pub async fn capture(&self) -> Result<CaptureState> {
        let advance = {
            let mut state = self.state.lock().await;
            state.capture(Utc::now())?
        };

        if advance == CaptureAdvance::SessionComplete {
            self.stop_tracking().await;
        }

        self.emit_state_changed().await;
        Ok(self.get_state().await)
    }

    /// Persist the merged record. On failure the error is surfaced and the
    /// record stays in memory so the user can retry.
    pub async fn save_measurements(&self, notes: Option<String>) -> Result<String> {
        let record = {
            let state = self.state.lock().await;
            if state.phase != CapturePhase::Review {
                bail!("no completed measurement to save");
            }
            state
                .merged
                .clone()
                .ok_or_else(|| anyhow!("review phase without a merged record"))?
        };

        let entry = MeasurementEntry::from_record(Uuid::new_v4().to_string(), &record, notes);
        self.db.insert_measurement(&entry).await?;
        info!("measurement {} saved", entry.id);

        let _ = self.app_handle.emit(
            "measurement-saved",
            MeasurementSavedEvent {
                measurement_id: entry.id.clone(),
            },
        );

        {
            let mut state = self.state.lock().await;
            state.reset();
        }
        self.emit_state_changed().await;
        Ok(entry.id)
    }

    /// Abandon the flow: stop tracking on whatever path it took and discard
    /// the in-memory session. Also used on screen teardown.
    pub async fn cancel(&self) -> Result<()> {
        self.stop_tracking().await;
        {
            let mut state = self.state.lock().await;
            state.reset();
        }
        self.emit_state_changed().await;
        Ok(())
    }

    /// Full AR path: probe support, start the session and its real-time
    /// processing, seed detection from one analyzed camera frame, then
    /// follow the update stream. Any rejection bubbles up as "unavailable".
    async fn try_start_ar_tracking(&self) -> Result<()> {
        if !self.ar.is_supported().await? {
            bail!("AR not supported on this device");
        }
        if !self.ar.start_session().await? {
            bail!("AR session failed to start");
        }
        self.ar.start_real_time_processing().await?;
        if !self.ar.session_status().await?.is_active {
            bail!("AR session did not become active");
        }
        let mut updates = self.ar.measurement_updates().await?;

        // One-off frame analysis so detection state is populated before the
        // first stream update lands.
        match self.frames.capture_frame() {
            Ok(frame) => {
                let analysis = VisionAnalyzer::new().analyze(&frame);
                let mut state = self.state.lock().await;
                state.apply_tracking(
                    analysis.landmarks,
                    analysis.confidence,
                    analysis.has_human,
                );
            }
            Err(err) => warn!("initial frame capture failed: {err:#}"),
        }

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let state = self.state.clone();
        let app_handle = self.app_handle.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    update = updates.recv() => {
                        let Some(update) = update else {
                            info!("AR update stream closed");
                            break;
                        };
                        if !update.is_valid {
                            continue;
                        }
                        let event = {
                            let mut guard = state.lock().await;
                            guard.apply_tracking(update.landmarks, update.confidence, true);
                            TrackingUpdateEvent {
                                body_detected: guard.body_detected,
                                confidence: guard.confidence,
                                quality: guard.quality,
                            }
                        };
                        let _ = app_handle.emit("tracking-update", event);
                    }
                }
            }
        });

        self.install_tracking_task(TrackingTask { handle, token }).await;
        Ok(())
    }

    /// Simulated fallback: a 100ms tick replacing the landmark snapshot
    /// wholesale each period.
    async fn start_simulated_tracking(&self) {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let state = self.state.clone();
        let app_handle = self.app_handle.clone();

        let handle = tokio::spawn(async move {
            let mut tracker = SimulatedTracker::new(SIM_VIEWPORT_WIDTH, SIM_VIEWPORT_HEIGHT);
            let mut ticker = time::interval(TRACKING_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => {
                        info!("simulated tracking loop shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let landmarks = tracker.next_landmarks();
                        let confidence = landmarks.mean_confidence();
                        let event = {
                            let mut guard = state.lock().await;
                            guard.apply_tracking(landmarks, confidence, true);
                            TrackingUpdateEvent {
                                body_detected: guard.body_detected,
                                confidence: guard.confidence,
                                quality: guard.quality,
                            }
                        };
                        let _ = app_handle.emit("tracking-update", event);
                    }
                }
            }
        });

        self.install_tracking_task(TrackingTask { handle, token }).await;
    }

    async fn install_tracking_task(&self, task: TrackingTask) {
        let mut guard = self.tracking.lock().await;
        if let Some(previous) = guard.take() {
            previous.token.cancel();
            previous.handle.abort();
        }
        *guard = Some(task);
    }

    /// Cancel the tracking loop and best-effort stop the AR session. Safe to
    /// call on every exit path, including when nothing is running.
    async fn stop_tracking(&self) {
        if let Some(task) = self.tracking.lock().await.take() {
            task.token.cancel();
            if let Err(err) = task.handle.await {
                if !err.is_cancelled() {
                    error!("tracking loop task failed to join: {err}");
                }
            }
        }

        if let Err(err) = self.ar.stop_real_time_processing().await {
            warn!("failed to stop AR real-time processing: {err:#}");
        }
        if let Err(err) = self.ar.stop_session().await {
            warn!("failed to stop AR session: {err:#}");
        }
    }

    async fn emit_state_changed(&self) {
        let state = self.get_state().await;
        let _ = self
            .app_handle
            .emit("capture-state-changed", CaptureStateChangedEvent { state });
    }
}
