//! Sliding-window aggregation of delivery durations.
//!
//! The window tracks the last `window_size` minutes of events. Each time an
//! incoming event lies beyond the window's right edge, the current average
//! is emitted and the window slides forward by one minute, so exactly one
//! record is produced per minute boundary crossed, including minutes in
//! which no event occurred.

use crate::core::record::{AggregateRecord, AverageDeliveryTime};
use crate::error::WindowError;
use crate::input::{Event, TimeZonePolicy};
use crate::stats::RunStats;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// The active window: the events of the trailing `window_size` minutes and
/// the running sum of their durations.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    /// Width of the window in minutes
    window_size: i64,
    /// Epoch minute one step before the window's left edge
    start: i64,
    /// Events inside the window, in arrival (= timestamp) order
    events: VecDeque<Event>,
    /// Sum of `duration` over `events`
    agg_duration: f64,
    /// Number of buffered events with a non-zero duration
    nonzero_events: usize,
}

impl SlidingWindow {
    /// Create a window anchored at the minute of the first event.
    pub fn new(window_size: u64, initial_epoch_minute: i64) -> Self {
        let window_size = i64::try_from(window_size).unwrap_or(i64::MAX);
        Self {
            window_size,
            start: initial_epoch_minute.saturating_sub(window_size),
            events: VecDeque::new(),
            agg_duration: 0.0,
            nonzero_events: 0,
        }
    }

    /// Check if an event lies strictly beyond the window's right edge.
    pub fn is_event_outside_window(&self, event: &Event) -> bool {
        event.epoch_minute > self.right_edge() - 1
    }

    /// Advance the window by one minute and evict stale events.
    ///
    /// Returns the number of events evicted. Eviction stops at the first
    /// event still inside the window: the buffer is ordered by minute, so no
    /// later event can be stale.
    pub fn slide(&mut self) -> usize {
        self.start += 1;

        let mut evicted = 0;
        while let Some(front) = self.events.front() {
            if front.epoch_minute >= self.start {
                break;
            }
            if front.duration != 0.0 {
                self.nonzero_events -= 1;
            }
            self.agg_duration -= front.duration;
            self.events.pop_front();
            evicted += 1;
        }

        // Subtraction can leave residue once every remaining duration is zero
        if self.nonzero_events == 0 {
            self.agg_duration = 0.0;
        }
        evicted
    }

    /// Add an event to the window. A zero-size window keeps no history.
    pub fn add_event(&mut self, event: Event) {
        if self.window_size == 0 {
            return;
        }

        if event.duration != 0.0 {
            self.nonzero_events += 1;
        }
        self.agg_duration += event.duration;
        self.events.push_back(event);
    }

    /// Average duration of the buffered events.
    pub fn average(&self) -> AverageDeliveryTime {
        if self.agg_duration == 0.0 || self.nonzero_events == 0 {
            return AverageDeliveryTime::Zero;
        }
        AverageDeliveryTime::Mean(self.agg_duration / self.events.len() as f64)
    }

    /// The most recent minute the window reports on (`start + window_size`).
    pub fn right_edge(&self) -> i64 {
        self.start.saturating_add(self.window_size)
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn agg_duration(&self) -> f64 {
        self.agg_duration
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Build the aggregate record for the window's current state.
    pub fn to_record(&self, policy: &TimeZonePolicy) -> AggregateRecord {
        AggregateRecord::new(
            policy.format_epoch_minute(self.right_edge()),
            self.average(),
        )
    }
}

/// Lifecycle phase of a [`WindowEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// No event seen yet
    Uninitialized,
    /// Anchored and accepting events
    Active,
    /// Flushed; no further operations are valid
    Done,
}

#[derive(Debug)]
enum WindowState {
    Uninitialized,
    Active {
        window: SlidingWindow,
        last_minute: i64,
    },
    Done,
}

/// Drives a [`SlidingWindow`] through its lifecycle.
///
/// The window is created lazily on the first event so that it is anchored
/// at that event's minute, and is consumed by [`WindowEngine::finish`].
#[derive(Debug)]
pub struct WindowEngine {
    window_size: u64,
    policy: TimeZonePolicy,
    state: WindowState,
    stats: RunStats,
}

impl WindowEngine {
    pub fn new(window_size: u64, policy: TimeZonePolicy) -> Self {
        Self {
            window_size,
            policy,
            state: WindowState::Uninitialized,
            stats: RunStats::new(),
        }
    }

    pub fn phase(&self) -> WindowPhase {
        match self.state {
            WindowState::Uninitialized => WindowPhase::Uninitialized,
            WindowState::Active { .. } => WindowPhase::Active,
            WindowState::Done => WindowPhase::Done,
        }
    }

    /// The active window, if any.
    pub fn window(&self) -> Option<&SlidingWindow> {
        match &self.state {
            WindowState::Active { window, .. } => Some(window),
            _ => None,
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Feed one event into the window.
    ///
    /// While the event lies beyond the window, the current record is passed
    /// to `emit` and the window slides by one minute. The event is then
    /// added. Returns the number of records emitted.
    pub fn ingest<F, E>(&mut self, event: Event, mut emit: F) -> Result<usize, E>
    where
        F: FnMut(&AggregateRecord) -> Result<(), E>,
        E: From<WindowError>,
    {
        if matches!(self.state, WindowState::Uninitialized) {
            debug!(
                epoch_minute = event.epoch_minute,
                window_size = self.window_size,
                "anchoring window on first event"
            );
            self.state = WindowState::Active {
                window: SlidingWindow::new(self.window_size, event.epoch_minute),
                last_minute: event.epoch_minute,
            };
        }
        let WindowState::Active {
            window,
            last_minute,
        } = &mut self.state
        else {
            return Err(WindowError::Finished.into());
        };

        if event.epoch_minute < *last_minute {
            return Err(WindowError::OutOfOrder {
                event_minute: event.epoch_minute,
                last_minute: *last_minute,
            }
            .into());
        }
        *last_minute = event.epoch_minute;
        self.stats.record_event();

        let mut emitted = 0;
        while window.is_event_outside_window(&event) {
            emit(&window.to_record(&self.policy))?;
            self.stats.record_emitted();
            emitted += 1;

            let evicted = window.slide();
            self.stats.record_slide(evicted);
            trace!(right_edge = window.right_edge(), evicted, "window slid");
        }
        if emitted > 1 {
            debug!(
                slides = emitted,
                right_edge = window.right_edge(),
                "filled gap before event"
            );
        }

        window.add_event(event);
        self.stats.observe_buffer_len(window.len());
        Ok(emitted)
    }

    /// Flush the window and end its lifecycle.
    ///
    /// Returns the final record, or `None` if no event was ever ingested.
    pub fn finish(&mut self) -> Result<Option<AggregateRecord>, WindowError> {
        match std::mem::replace(&mut self.state, WindowState::Done) {
            WindowState::Done => Err(WindowError::Finished),
            WindowState::Uninitialized => Ok(None),
            WindowState::Active { window, .. } => {
                self.stats.record_emitted();
                Ok(Some(window.to_record(&self.policy)))
            }
        }
    }

    /// Slide the active window by one minute without emitting.
    pub fn slide(&mut self) -> Result<usize, WindowError> {
        match &mut self.state {
            WindowState::Active { window, .. } => {
                let evicted = window.slide();
                self.stats.record_slide(evicted);
                Ok(evicted)
            }
            WindowState::Uninitialized => Err(WindowError::Uninitialized),
            WindowState::Done => Err(WindowError::Finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 25_764_131; // 2018-12-26 18:11 UTC

    fn collect(engine: &mut WindowEngine, event: Event) -> Vec<AggregateRecord> {
        let mut out = Vec::new();
        engine
            .ingest(event, |record| {
                out.push(record.clone());
                Ok::<(), WindowError>(())
            })
            .unwrap();
        out
    }

    #[test]
    fn test_window_anchoring() {
        let window = SlidingWindow::new(10, T);

        assert_eq!(window.start(), T - 10);
        assert_eq!(window.right_edge(), T);
        assert!(window.is_empty());
        // The anchoring event sits exactly on the right edge, which is outside
        assert!(window.is_event_outside_window(&Event::new(T, 1.0)));
        assert!(!window.is_event_outside_window(&Event::new(T - 1, 1.0)));
    }

    #[test]
    fn test_slide_evicts_stale_events() {
        let mut window = SlidingWindow::new(2, T);
        window.slide();
        window.add_event(Event::new(T, 10.0));
        window.add_event(Event::new(T, 20.0));
        window.add_event(Event::new(T + 1, 30.0));
        assert_eq!(window.agg_duration(), 60.0);
        assert_eq!(window.average(), AverageDeliveryTime::Mean(20.0));

        // start = T - 1 -> T, nothing stale yet
        assert_eq!(window.slide(), 0);
        // start = T + 1, both T events go
        assert_eq!(window.slide(), 2);
        assert_eq!(window.len(), 1);
        assert_eq!(window.agg_duration(), 30.0);
        assert_eq!(window.slide(), 1);
        assert!(window.is_empty());
        assert_eq!(window.average(), AverageDeliveryTime::Zero);
    }

    #[test]
    fn test_empty_buffer_resets_fractional_residue() {
        let mut window = SlidingWindow::new(1, T);
        window.slide();
        window.add_event(Event::new(T, 0.1));
        window.add_event(Event::new(T, 0.2));
        window.slide();
        assert!(window.is_empty());
        assert_eq!(window.agg_duration(), 0.0);
        assert_eq!(window.average(), AverageDeliveryTime::Zero);
    }

    #[test]
    fn test_zero_duration_survivor_drops_fractional_residue() {
        let mut engine = WindowEngine::new(2, TimeZonePolicy::Utc);
        collect(&mut engine, Event::new(T, 0.1));
        collect(&mut engine, Event::new(T, 0.2));
        collect(&mut engine, Event::new(T + 1, 0.0));

        let records = collect(&mut engine, Event::new(T + 3, 0.0));
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].date, "2018-12-26 18:14:00");
        assert_eq!(records[1].average_delivery_time, AverageDeliveryTime::Zero);

        let window = engine.window().unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window.agg_duration(), 0.0);
    }

    #[test]
    fn test_zero_duration_sum_reports_zero() {
        let mut window = SlidingWindow::new(5, T);
        window.add_event(Event::new(T, 0.0));
        window.add_event(Event::new(T, 0.0));
        assert_eq!(window.len(), 2);
        assert_eq!(window.average(), AverageDeliveryTime::Zero);
    }

    #[test]
    fn test_zero_size_window_keeps_no_history() {
        let mut window = SlidingWindow::new(0, T);
        window.add_event(Event::new(T, 42.0));
        assert!(window.is_empty());
        assert_eq!(window.average(), AverageDeliveryTime::Zero);
    }

    #[test]
    fn test_engine_fills_gaps() {
        let mut engine = WindowEngine::new(10, TimeZonePolicy::Utc);
        assert_eq!(engine.phase(), WindowPhase::Uninitialized);

        let first = collect(&mut engine, Event::new(T, 20.0));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].date, "2018-12-26 18:11:00");
        assert!(first[0].average_delivery_time.is_zero());
        assert_eq!(engine.phase(), WindowPhase::Active);

        let second = collect(&mut engine, Event::new(T + 4, 31.0));
        let averages: Vec<f64> = second
            .iter()
            .map(|r| r.average_delivery_time.value())
            .collect();
        assert_eq!(averages, vec![20.0, 20.0, 20.0, 20.0]);
        assert_eq!(second[3].date, "2018-12-26 18:15:00");

        let last = engine.finish().unwrap().unwrap();
        assert_eq!(last.date, "2018-12-26 18:16:00");
        assert_eq!(last.average_delivery_time, AverageDeliveryTime::Mean(25.5));
        assert_eq!(engine.phase(), WindowPhase::Done);
        assert_eq!(engine.stats().records_emitted, 6);
    }

    #[test]
    fn test_events_in_same_minute_emit_nothing() {
        let mut engine = WindowEngine::new(3, TimeZonePolicy::Utc);
        collect(&mut engine, Event::new(T, 1.0));
        assert!(collect(&mut engine, Event::new(T, 2.0)).is_empty());
        assert_eq!(engine.window().unwrap().len(), 2);
    }

    #[test]
    fn test_engine_rejects_out_of_order_events() {
        let mut engine = WindowEngine::new(10, TimeZonePolicy::Utc);
        collect(&mut engine, Event::new(T, 1.0));

        let result = engine.ingest(Event::new(T - 1, 1.0), |_| Ok::<(), WindowError>(()));
        assert_eq!(
            result,
            Err(WindowError::OutOfOrder {
                event_minute: T - 1,
                last_minute: T
            })
        );
    }

    #[test]
    fn test_engine_guards_transitions() {
        let mut engine = WindowEngine::new(10, TimeZonePolicy::Utc);
        assert_eq!(engine.slide(), Err(WindowError::Uninitialized));
        assert_eq!(engine.finish(), Ok(None));
        assert_eq!(engine.finish(), Err(WindowError::Finished));

        let result = engine.ingest(Event::new(T, 1.0), |_| Ok::<(), WindowError>(()));
        assert_eq!(result, Err(WindowError::Finished));
        assert_eq!(engine.slide(), Err(WindowError::Finished));
    }
}
