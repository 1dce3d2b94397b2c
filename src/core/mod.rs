//! Core functionality for the moving-average calculator.
//!
//! This module contains:
//! - The sliding window and the engine that drives its lifecycle
//! - The aggregate record format
//! - The run loop connecting an event stream to an output sink

pub mod orchestrator;
pub mod record;
pub mod window;

// Re-export commonly used types
pub use orchestrator::{run, run_files, RunOptions};
pub use record::{AggregateRecord, AverageDeliveryTime};
pub use window::{SlidingWindow, WindowEngine, WindowPhase};
