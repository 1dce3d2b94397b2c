//! Delivery SMA - moving average of translation delivery times.
//!
//! This library reads an ordered stream of delivery events and emits, for
//! every minute the stream spans, the average delivery duration over the
//! trailing window of `window_size` minutes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Delivery SMA                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────────┐   ┌─────────────┐     │
//! │  │   Input     │──▶│  Window Engine  │──▶│   Output    │     │
//! │  │ (JSON lines)│   │ (slide + evict) │   │ (JSON lines)│     │
//! │  └─────────────┘   └─────────────────┘   └─────────────┘     │
//! │         │                   │                                │
//! │         ▼                   ▼                                │
//! │  ┌─────────────┐     ┌─────────────┐                         │
//! │  │  Time Zone  │     │  Run Stats  │                         │
//! │  │   Policy    │     │             │                         │
//! │  └─────────────┘     └─────────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use delivery_sma::{core, TimeZonePolicy};
//!
//! let input = r#"{"timestamp": "2018-12-26 18:11:08.509654", "duration": 20}"#;
//! let mut output = Vec::new();
//! core::run(input.as_bytes(), 10, &TimeZonePolicy::Utc, &mut output).unwrap();
//!
//! assert_eq!(
//!     String::from_utf8(output).unwrap(),
//!     "{\"date\":\"2018-12-26 18:11:00\", \"average_delivery_time\":0}\n\
//!      {\"date\":\"2018-12-26 18:12:00\", \"average_delivery_time\":20.0}"
//! );
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod stats;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{
    run, run_files, AggregateRecord, AverageDeliveryTime, RunOptions, SlidingWindow,
    WindowEngine, WindowPhase,
};
pub use error::{ParseError, SmaError, WindowError};
pub use input::{Event, TimeZonePolicy};
pub use stats::RunStats;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
