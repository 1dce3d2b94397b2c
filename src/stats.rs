//! Counters describing what a run did.
//!
//! Nothing here affects the output; the numbers are reported through
//! `tracing` when a run completes and printed by the CLI on request.

/// Statistics for a single moving-average run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Number of input events parsed
    pub events_read: u64,
    /// Number of aggregate records written, including the final flush
    pub records_emitted: u64,
    /// Number of one-minute slides performed
    pub slides: u64,
    /// Number of events evicted from the window
    pub events_evicted: u64,
    /// Largest number of events held in the window at once
    pub peak_buffer_len: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a parsed event.
    pub fn record_event(&mut self) {
        self.events_read += 1;
    }

    /// Record an emitted aggregate.
    pub fn record_emitted(&mut self) {
        self.records_emitted += 1;
    }

    /// Record one slide and the number of events it evicted.
    pub fn record_slide(&mut self, evicted: usize) {
        self.slides += 1;
        self.events_evicted += evicted as u64;
    }

    /// Track the window's buffer length after an insert.
    pub fn observe_buffer_len(&mut self, len: usize) {
        self.peak_buffer_len = self.peak_buffer_len.max(len);
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "Run Statistics:\n\
             - Events read: {}\n\
             - Records emitted: {}\n\
             - Window slides: {}\n\
             - Events evicted: {}\n\
             - Peak window size: {} events",
            self.events_read,
            self.records_emitted,
            self.slides,
            self.events_evicted,
            self.peak_buffer_len
        )
    }
}
