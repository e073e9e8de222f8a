//! Scrolling real-time charts
//!
//! A [`Chart`] owns the buffers of its [`Series`] and handles the periodic
//! housekeeping a scrolling chart needs: dropping samples that have scrolled
//! off the left edge and recomputing bounds so a past spike does not pin the
//! vertical scale forever.
//!
//! Rendering is left to the consumer, which reads buffers through
//! [`Chart::buffers`] and the combined range through [`Chart::value_range`].

pub mod buffer;
pub mod series;

pub use buffer::{BufferOptions, SeriesBuffer, SeriesStyle};
pub use series::{number_at, value_at, Extractors, Series, SeriesOptions};

use crate::connection::lock;
use crate::types::{MAX_SERIES_POINTS, TIME_MARGIN_MILLIS};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, Weak};

/// Buffer shared between a series and its chart.
pub type SharedBuffer = Arc<Mutex<SeriesBuffer>>;

/// Chart geometry and retention settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    /// Plot width in pixels
    pub width_px: f64,
    /// Horizontal scale
    pub millis_per_pixel: f64,
    /// Leftward shift applied to every appended point
    pub time_margin_ms: f64,
    /// Points retained per series
    pub max_points: usize,
    /// Default interval for bound recomputation
    pub reset_bounds_interval_ms: f64,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width_px: 1260.0,
            millis_per_pixel: 15.0,
            time_margin_ms: TIME_MARGIN_MILLIS,
            max_points: MAX_SERIES_POINTS,
            reset_bounds_interval_ms: 3000.0,
        }
    }
}

impl ChartOptions {
    /// Milliseconds of history visible across the plot
    pub fn visible_window_ms(&self) -> f64 {
        self.width_px * self.millis_per_pixel
    }
}

pub(crate) struct ChartInner {
    options: ChartOptions,
    buffers: Mutex<Vec<SharedBuffer>>,
}

impl ChartInner {
    pub(crate) fn remove_buffer(&self, buffer: &SharedBuffer) -> bool {
        let mut buffers = lock(&self.buffers);
        let before = buffers.len();
        buffers.retain(|b| !Arc::ptr_eq(b, buffer));
        before != buffers.len()
    }
}

/// A chart and the buffers of the series drawn on it. Cheap to clone.
#[derive(Clone)]
pub struct Chart {
    inner: Arc<ChartInner>,
}

impl Chart {
    pub fn new(options: ChartOptions) -> Self {
        Self {
            inner: Arc::new(ChartInner {
                options,
                buffers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn options(&self) -> &ChartOptions {
        &self.inner.options
    }

    pub(crate) fn add_buffer(&self, buffer: SharedBuffer) {
        lock(&self.inner.buffers).push(buffer);
    }

    pub(crate) fn downgrade(&self) -> Weak<ChartInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn series_count(&self) -> usize {
        lock(&self.inner.buffers).len()
    }

    /// Buffers in the order their series were attached
    pub fn buffers(&self) -> Vec<SharedBuffer> {
        lock(&self.inner.buffers).clone()
    }

    /// Combined `(min, max)` over every series with bounds set.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.buffers()
            .iter()
            .filter_map(|b| lock(b).bounds())
            .reduce(|(lo, hi), (min, max)| (lo.min(min), hi.max(max)))
    }

    /// Drop samples that have scrolled out of view at `now_ms`.
    pub fn drop_old_data(&self, now_ms: f64) -> usize {
        let oldest_valid = now_ms - self.options().visible_window_ms();
        self.buffers()
            .iter()
            .map(|b| lock(b).drop_before(oldest_valid))
            .sum()
    }

    /// Recompute bounds on every series whose interval has elapsed.
    pub fn reset_bounds(&self, now_ms: f64) -> usize {
        self.buffers()
            .iter()
            .filter(|b| lock(b).maybe_reset_bounds(now_ms))
            .count()
    }

    /// Per-frame housekeeping
    pub fn tick(&self, now_ms: f64) {
        let dropped = self.drop_old_data(now_ms);
        let reset = self.reset_bounds(now_ms);
        if dropped > 0 || reset > 0 {
            tracing::trace!(dropped, reset, "chart tick");
        }
    }

    /// Total samples across all series
    pub fn total_points(&self) -> usize {
        self.buffers().iter().map(|b| lock(b).len()).sum()
    }
}

impl std::fmt::Debug for Chart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chart")
            .field("options", self.options())
            .field("series", &self.series_count())
            .finish()
    }
}
