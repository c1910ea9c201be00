//! Mass-accounting statistics for the water engine.
//!
//! Feeds on the [`TickReport`] each tick produces and aggregates it into
//! rolling metrics using [`Fixed64`] arithmetic: drainage rate, culling
//! rate, net change over a window, mass added or removed by edits between
//! ticks, and a leak flag for mass that disappears without being drained or
//! culled.
//!
//! # Usage
//!
//! ```ignore
//! let mut stats = MassStats::new(StatsConfig::default());
//! let result = sim.step();
//! for report in &result.reports {
//!     stats.record(report);
//! }
//! let rate = stats.drain_rate();
//! ```

use cawater_core::fixed::{Fixed64, Ticks};
use cawater_core::rules::TickReport;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the statistics module.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Window size in ticks for rolling averages.
    pub window_size: Ticks,
    /// Number of historical samples retained per series.
    pub history_capacity: usize,
    /// Unexplained loss over the window above which [`MassStats::is_leaking`]
    /// reports true.
    pub leak_tolerance: i64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window_size: 60,
            history_capacity: 256,
            leak_tolerance: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// A fixed-capacity ring buffer for trend data.
///
/// When full, the oldest entry is overwritten. Iterates oldest-to-newest.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    head: usize,
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a new ring buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            data: vec![T::default(); capacity],
            head: 0,
            len: 0,
        }
    }

    /// Push a value, overwriting the oldest entry if at capacity.
    pub fn push(&mut self, value: T) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The most recently pushed value, if any.
    pub fn latest(&self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let idx = if self.head == 0 {
            self.capacity() - 1
        } else {
            self.head - 1
        };
        Some(self.data[idx])
    }

    /// Iterate values from oldest to newest.
    pub fn iter(&self) -> RingBufferIter<'_, T> {
        let start = if self.len < self.capacity() {
            0
        } else {
            self.head
        };
        RingBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Drop all values without changing capacity.
    pub fn clear(&mut self) {
        self.data.fill(T::default());
        self.head = 0;
        self.len = 0;
    }
}

/// Iterator over [`RingBuffer`] values, oldest to newest.
pub struct RingBufferIter<'a, T> {
    buffer: &'a RingBuffer<T>,
    index: usize,
    remaining: usize,
}

impl<T: Copy + Default> Iterator for RingBufferIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.buffer.data[self.index];
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Copy + Default> ExactSizeIterator for RingBufferIter<'_, T> {}

// ---------------------------------------------------------------------------
// Rolling window
// ---------------------------------------------------------------------------

/// A signed per-tick quantity summed over the most recent N ticks.
#[derive(Debug, Clone)]
struct RollingWindow {
    samples: RingBuffer<i64>,
    total: i64,
}

impl RollingWindow {
    fn new(window_size: usize) -> Self {
        Self {
            samples: RingBuffer::new(window_size),
            total: 0,
        }
    }

    /// Record one tick's value, evicting the oldest if the window is full.
    fn push(&mut self, value: i64) {
        if self.samples.len() == self.samples.capacity() {
            let evicted = self.samples.iter().next().unwrap_or_default();
            self.total -= evicted;
        }
        self.samples.push(value);
        self.total += value;
    }

    fn total(&self) -> i64 {
        self.total
    }

    /// Average per tick over the ticks seen so far, up to the window size.
    fn rate(&self) -> Fixed64 {
        if self.samples.is_empty() {
            return Fixed64::ZERO;
        }
        Fixed64::saturating_from_num(self.total) / Fixed64::from_num(self.samples.len())
    }

    fn clear(&mut self) {
        self.samples.clear();
        self.total = 0;
    }
}

// ---------------------------------------------------------------------------
// MassStats
// ---------------------------------------------------------------------------

/// Rolling mass accounting for one grid.
#[derive(Debug, Clone)]
pub struct MassStats {
    config: StatsConfig,
    drained: RollingWindow,
    culled: RollingWindow,
    moved: RollingWindow,
    net: RollingWindow,
    external: RollingWindow,
    unexplained: RollingWindow,
    total_history: RingBuffer<i64>,
    drain_history: RingBuffer<Fixed64>,
    last_total: Option<i64>,
    ticks_recorded: Ticks,
    quiet_ticks: Ticks,
}

impl MassStats {
    /// # Panics
    ///
    /// Panics if `window_size` or `history_capacity` is zero.
    pub fn new(config: StatsConfig) -> Self {
        let window = config.window_size as usize;
        let history = config.history_capacity;
        Self {
            drained: RollingWindow::new(window),
            culled: RollingWindow::new(window),
            moved: RollingWindow::new(window),
            net: RollingWindow::new(window),
            external: RollingWindow::new(window),
            unexplained: RollingWindow::new(window),
            total_history: RingBuffer::new(history),
            drain_history: RingBuffer::new(history),
            last_total: None,
            ticks_recorded: 0,
            quiet_ticks: 0,
            config,
        }
    }

    /// Fold one tick's report into the statistics.
    pub fn record(&mut self, report: &TickReport) {
        // Mass that appeared or vanished between ticks came from edits.
        let external = self
            .last_total
            .map_or(0, |last| report.total_before - last);
        let unexplained = report.total_before - report.lost() - report.total_after;

        self.drained.push(report.drained);
        self.culled.push(report.culled_mass);
        self.moved.push(report.moved());
        self.net.push(report.net_change());
        self.external.push(external);
        self.unexplained.push(unexplained);

        self.total_history.push(report.total_after);
        self.drain_history.push(self.drained.rate());

        self.last_total = Some(report.total_after);
        self.ticks_recorded += 1;
        if report.is_quiescent() {
            self.quiet_ticks += 1;
        } else {
            self.quiet_ticks = 0;
        }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Ticks recorded since construction or the last reset.
    pub fn ticks_recorded(&self) -> Ticks {
        self.ticks_recorded
    }

    /// Total mass after the most recent tick.
    pub fn latest_total(&self) -> Option<i64> {
        self.last_total
    }

    /// Average mass drained to the void per tick over the window.
    pub fn drain_rate(&self) -> Fixed64 {
        self.drained.rate()
    }

    /// Average mass culled per tick over the window.
    pub fn cull_rate(&self) -> Fixed64 {
        self.culled.rate()
    }

    /// Average mass moved between cells per tick over the window.
    pub fn flow_rate(&self) -> Fixed64 {
        self.moved.rate()
    }

    /// Mass drained over the window.
    pub fn drained_in_window(&self) -> i64 {
        self.drained.total()
    }

    /// Change in total mass caused by ticks over the window.
    pub fn net_change(&self) -> i64 {
        self.net.total()
    }

    /// Mass added (positive) or removed by edits between ticks over the
    /// window.
    pub fn external_change(&self) -> i64 {
        self.external.total()
    }

    /// Mass lost over the window that neither drainage nor culling accounts
    /// for.
    ///
    /// Reports produced by [`Grid::tick`](cawater_core::grid::Grid::tick)
    /// always balance, so this stays zero for them. It is nonzero only for
    /// reports a host assembles or edits itself: merged frame totals, reports
    /// replayed from a log, or reports received from a peer.
    pub fn unexplained_loss(&self) -> i64 {
        self.unexplained.total()
    }

    /// True if unexplained loss over the window exceeds the tolerance. See
    /// [`MassStats::unexplained_loss`] for when this can fire.
    pub fn is_leaking(&self) -> bool {
        self.unexplained_loss() > self.config.leak_tolerance
    }

    /// Consecutive ticks, up to now, in which nothing moved or was lost.
    pub fn quiet_ticks(&self) -> Ticks {
        self.quiet_ticks
    }

    /// Total mass after each recorded tick, oldest to newest.
    pub fn total_history(&self) -> &RingBuffer<i64> {
        &self.total_history
    }

    /// Rolling drain rate after each recorded tick, oldest to newest.
    pub fn drain_history(&self) -> &RingBuffer<Fixed64> {
        &self.drain_history
    }

    /// Forget everything recorded so far.
    pub fn reset(&mut self) {
        for window in [
            &mut self.drained,
            &mut self.culled,
            &mut self.moved,
            &mut self.net,
            &mut self.external,
            &mut self.unexplained,
        ] {
            window.clear();
        }
        self.total_history.clear();
        self.drain_history.clear();
        self.last_total = None;
        self.ticks_recorded = 0;
        self.quiet_ticks = 0;
    }
}

impl Default for MassStats {
    fn default() -> Self {
        Self::new(StatsConfig::default())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
