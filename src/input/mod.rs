//! Input side of the pipeline: event records and the time-zone policy
//! used to interpret them.

pub mod event;
pub mod timezone;

// Re-export commonly used types
pub use event::{parse_line, parse_timestamp, Event};
pub use timezone::{TimeZonePolicy, DATE_FORMAT};
