pub mod commands;
mod controller;
mod state;

pub use controller::CaptureController;
pub use state::{CaptureAdvance, CapturePhase, CaptureState, TrackingQuality};
