//! Services: validation, drawing, presentation state, and the gateway's
//! script runner and run tracker.

pub mod drawing;
pub mod presentation;
pub mod runner;
pub mod tracker;
pub mod validation;

pub use drawing::{DrawingController, DrawingInput, DrawingOutput, DrawingState, MapInteraction};
pub use presentation::{ImageTab, ResultTab, ResultView};
pub use runner::{AnalysisRunner, PythonRunner, RunnerError};
pub use tracker::{AnalysisStatus, AnalysisTracker, StatusReport};
pub use validation::{validate, ValidationReport};
