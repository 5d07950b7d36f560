pub mod converter;
pub mod landmarks;
pub mod record;
pub mod simulate;

pub use converter::{convert, convert_at, MeasurementResult, View};
pub use landmarks::{BodyLandmarks, Landmark};
pub use record::{FrontMeasurement, MergedRecord, SideMeasurement, MEASUREMENT_TYPE_AR};
pub use simulate::SimulatedTracker;
