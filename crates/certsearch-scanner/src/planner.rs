//! Scan range planning.
//!
//! [`ScanCursor`] is the whole mutable state of a scan. [`ScanPlanner`] holds
//! the caller's bounds and turns a cursor into the next range to query, without
//! touching the backend, so every transition can be exercised directly.

use certsearch_core::{ScanBounds, ScanRange, LIVE_EDGE};
use std::time::Duration;

/// Delay between polls once the scan has caught up with the live edge.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Position of a scan in the record-ID keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    next_id: i64,
    known_max_id: i64,
    delay: Duration,
    awaiting_live_edge: bool,
    /// Set once the keyspace ends at `i64::MAX` and there is no next ID.
    exhausted: bool,
}

impl ScanCursor {
    /// Cursor positioned at the start of `bounds`.
    ///
    /// With a live-edge start, `next_id` is only known after the first
    /// successful bound discovery.
    #[must_use]
    pub fn new(bounds: &ScanBounds) -> Self {
        Self {
            next_id: bounds.start_id(),
            known_max_id: LIVE_EDGE,
            delay: Duration::ZERO,
            awaiting_live_edge: bounds.starts_at_live_edge(),
            exhausted: false,
        }
    }

    /// Next record ID that has not been fetched.
    #[must_use]
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// Most recently observed upper bound, clamped to the ceiling; `-1` until discovered.
    #[must_use]
    pub fn known_max_id(&self) -> i64 {
        self.known_max_id
    }

    /// Delay to wait before the next iteration.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether the start position still waits on the first bound discovery.
    #[must_use]
    pub fn awaiting_live_edge(&self) -> bool {
        self.awaiting_live_edge
    }

    /// Last record ID whose batch was fully processed.
    ///
    /// Restarting with `start_id = last_processed_id() + 1` resumes without a
    /// gap. `None` while a live-edge start has not been resolved.
    #[must_use]
    pub fn last_processed_id(&self) -> Option<i64> {
        if self.awaiting_live_edge {
            None
        } else if self.exhausted {
            Some(self.next_id)
        } else {
            Some(self.next_id - 1)
        }
    }

    /// Same position, different pending delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Move past a processed range. The stride is the range width, not the
    /// number of rows that matched.
    #[must_use]
    pub fn advanced_past(mut self, range: ScanRange) -> Self {
        self.move_past(range.end());
        self
    }

    /// Whether no record ID is left after the last processed one.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn move_past(&mut self, id: i64) {
        match id.checked_add(1) {
            Some(next_id) => self.next_id = next_id,
            None => {
                self.next_id = id;
                self.exhausted = true;
            }
        }
    }
}

/// What the next iteration should query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePlan {
    /// Query `range`, then wait `delay_after` before the next iteration.
    Batch {
        /// IDs to query
        range: ScanRange,
        /// Zero after a full-width batch, the poll interval after a partial one
        delay_after: Duration,
    },
    /// Nothing new is available yet.
    Idle,
}

/// Range sizing and live-edge rules for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPlanner {
    bounds: ScanBounds,
    poll_interval: Duration,
}

impl ScanPlanner {
    /// Planner with the default 15 second polling interval.
    #[must_use]
    pub fn new(bounds: ScanBounds) -> Self {
        Self {
            bounds,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the polling interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn bounds(&self) -> &ScanBounds {
        &self.bounds
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Fresh cursor at the start of the configured bounds.
    #[must_use]
    pub fn start(&self) -> ScanCursor {
        ScanCursor::new(&self.bounds)
    }

    /// Whether the cursor has passed the inclusive ceiling.
    #[must_use]
    pub fn is_finished(&self, cursor: &ScanCursor) -> bool {
        cursor.exhausted || cursor.next_id > self.bounds.end_id()
    }

    /// Whether the upper bound must be refreshed before planning.
    #[must_use]
    pub fn needs_discovery(&self, cursor: &ScanCursor) -> bool {
        cursor.next_id >= cursor.known_max_id
    }

    /// Fold a freshly discovered maximum record ID into the cursor.
    ///
    /// The first discovery of a live-edge scan skips everything up to and
    /// including `latest_id`.
    #[must_use]
    pub fn observe_latest(&self, mut cursor: ScanCursor, latest_id: i64) -> ScanCursor {
        if cursor.awaiting_live_edge {
            cursor.move_past(latest_id);
            cursor.awaiting_live_edge = false;
        }
        cursor.known_max_id = latest_id.min(self.bounds.end_id());
        cursor
    }

    /// Size the next batch: `min(batch_size, known_max_id - next_id + 1)`.
    #[must_use]
    pub fn plan(&self, cursor: &ScanCursor) -> RangePlan {
        if cursor.awaiting_live_edge {
            return RangePlan::Idle;
        }

        let available = cursor
            .known_max_id
            .saturating_sub(cursor.next_id)
            .saturating_add(1);
        if available <= 0 {
            return RangePlan::Idle;
        }

        let batch_size = self.bounds.batch_size();
        let (width, delay_after) = if available >= batch_size {
            (batch_size, Duration::ZERO)
        } else {
            (available, self.poll_interval)
        };

        match ScanRange::new(cursor.next_id, cursor.next_id + (width - 1)) {
            Ok(range) => RangePlan::Batch { range, delay_after },
            Err(_) => RangePlan::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner(start: i64, end: i64, batch: i64) -> ScanPlanner {
        ScanPlanner::new(ScanBounds::new(start, end, batch).expect("valid bounds"))
    }

    fn expect_batch(plan: RangePlan) -> (ScanRange, Duration) {
        match plan {
            RangePlan::Batch { range, delay_after } => (range, delay_after),
            RangePlan::Idle => panic!("expected a batch, got Idle"),
        }
    }

    #[test]
    fn test_fixed_start_cursor() {
        let planner = planner(100, 200, 10);
        let cursor = planner.start();

        assert_eq!(cursor.next_id(), 100);
        assert_eq!(cursor.known_max_id(), -1);
        assert_eq!(cursor.delay(), Duration::ZERO);
        assert_eq!(cursor.last_processed_id(), Some(99));
        assert!(planner.needs_discovery(&cursor));
    }

    #[test]
    fn test_live_edge_skips_history() {
        let planner = planner(LIVE_EDGE, i64::MAX, 100_000);
        let cursor = planner.start();
        assert!(cursor.awaiting_live_edge());
        assert_eq!(cursor.last_processed_id(), None);
        assert_eq!(planner.plan(&cursor), RangePlan::Idle);

        let cursor = planner.observe_latest(cursor, 500);
        assert_eq!(cursor.next_id(), 501);
        assert_eq!(cursor.known_max_id(), 500);
        assert_eq!(planner.plan(&cursor), RangePlan::Idle);

        // Later discoveries never move the cursor
        let cursor = planner.observe_latest(cursor, 650);
        assert_eq!(cursor.next_id(), 501);
        let (range, _) = expect_batch(planner.plan(&cursor));
        assert_eq!((range.start(), range.end()), (501, 650));
    }

    #[test]
    fn test_known_max_clamped_to_ceiling() {
        let planner = planner(0, 1_000, 100_000);
        let cursor = planner.observe_latest(planner.start(), 5_000_000);
        assert_eq!(cursor.known_max_id(), 1_000);

        let (range, delay) = expect_batch(planner.plan(&cursor));
        assert_eq!((range.start(), range.end()), (0, 1_000));
        assert_eq!(delay, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_range_sizing_law() {
        let batch = 1_000;

        for (next_id, known_max) in [(0, 0), (0, 999), (0, 1_000), (10, 5_000), (4_990, 5_000)] {
            let planner = planner(next_id, i64::MAX, batch);
            let cursor = planner.observe_latest(planner.start(), known_max);
            let (range, _) = expect_batch(planner.plan(&cursor));

            assert_eq!(range.start(), next_id);
            assert_eq!(range.width(), batch.min(known_max - next_id + 1));
            assert!(range.width() >= 1);
        }
    }

    #[test]
    fn test_full_batch_has_no_delay() {
        let planner = planner(0, i64::MAX, 100);
        let cursor = planner.observe_latest(planner.start(), 1_000);

        let (range, delay) = expect_batch(planner.plan(&cursor));
        assert_eq!(range.width(), 100);
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_partial_batch_waits_poll_interval() {
        let planner = planner(0, i64::MAX, 100).with_poll_interval(Duration::from_secs(3));
        let cursor = planner.observe_latest(planner.start(), 41);

        let (range, delay) = expect_batch(planner.plan(&cursor));
        assert_eq!(range.width(), 42);
        assert_eq!(delay, Duration::from_secs(3));
    }

    #[test]
    fn test_no_data_is_idle() {
        let planner = planner(600, i64::MAX, 100);
        let cursor = planner.observe_latest(planner.start(), 500);

        assert_eq!(planner.plan(&cursor), RangePlan::Idle);
        assert!(planner.needs_discovery(&cursor));
        assert_eq!(cursor.next_id(), 600);
    }

    #[test]
    fn test_advance_is_range_stride() {
        let planner = planner(0, i64::MAX, 100);
        let cursor = planner.observe_latest(planner.start(), 10_000);
        let (range, _) = expect_batch(planner.plan(&cursor));

        let cursor = cursor.advanced_past(range);
        assert_eq!(cursor.next_id(), 100);
        assert_eq!(cursor.last_processed_id(), Some(99));
        assert!(!planner.needs_discovery(&cursor));
    }

    #[test]
    fn test_single_id_scan_finishes() {
        let planner = planner(100, 100, 100_000);
        let cursor = planner.observe_latest(planner.start(), 9_999);
        assert!(!planner.is_finished(&cursor));

        let (range, _) = expect_batch(planner.plan(&cursor));
        assert_eq!((range.start(), range.end()), (100, 100));

        let cursor = cursor.advanced_past(range);
        assert!(planner.is_finished(&cursor));
    }

    #[test]
    fn test_last_id_of_keyspace_finishes() {
        let planner = planner(i64::MAX - 4, i64::MAX, 10);
        let cursor = planner.observe_latest(planner.start(), i64::MAX);

        let (range, _) = expect_batch(planner.plan(&cursor));
        assert_eq!((range.start(), range.end()), (i64::MAX - 4, i64::MAX));

        let cursor = cursor.advanced_past(range);
        assert!(cursor.is_exhausted());
        assert!(planner.is_finished(&cursor));
        assert_eq!(cursor.last_processed_id(), Some(i64::MAX));
    }

    #[test]
    fn test_live_edge_at_last_id_finishes() {
        let planner = planner(LIVE_EDGE, i64::MAX, 100);
        let cursor = planner.observe_latest(planner.start(), i64::MAX);

        assert!(planner.is_finished(&cursor));
        assert_eq!(cursor.last_processed_id(), Some(i64::MAX));
    }

    #[test]
    fn test_huge_ceiling_does_not_overflow() {
        let planner = planner(0, i64::MAX, 100_000);
        let cursor = planner.observe_latest(planner.start(), i64::MAX);

        let (range, delay) = expect_batch(planner.plan(&cursor));
        assert_eq!(range.width(), 100_000);
        assert_eq!(delay, Duration::ZERO);
    }
}
