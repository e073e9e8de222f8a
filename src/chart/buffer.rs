//! Ring buffer of chart samples with display bounds.

use crate::types::{TimePoint, MAX_SERIES_POINTS};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How a series line is drawn. Carried through to the renderer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesStyle {
    /// Line colour
    pub stroke_style: String,
    /// Optional fill under the line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,
    pub line_width: f64,
}

impl Default for SeriesStyle {
    fn default() -> Self {
        Self {
            stroke_style: "#3e8135".to_string(),
            fill_style: None,
            line_width: 1.0,
        }
    }
}

/// Buffer-level options
#[derive(Debug, Clone, PartialEq)]
pub struct BufferOptions {
    /// Points retained before the oldest is evicted
    pub capacity: usize,
    /// Whether periodic bound recomputation applies to this buffer
    pub reset_bounds: bool,
    /// Milliseconds between bound recomputations
    pub reset_bounds_interval_ms: f64,
    pub style: SeriesStyle,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            capacity: MAX_SERIES_POINTS,
            reset_bounds: true,
            reset_bounds_interval_ms: 3000.0,
            style: SeriesStyle::default(),
        }
    }
}

/// Time series samples for one chart line.
///
/// `min_value`/`max_value` start as NaN, meaning "no bounds". Appending a
/// point does not touch them; callers widen them with
/// [`include_in_bounds`](Self::include_in_bounds) or clear them with
/// [`clear_bounds`](Self::clear_bounds).
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    points: VecDeque<TimePoint>,
    min_value: f64,
    max_value: f64,
    options: BufferOptions,
    last_bounds_reset: Option<f64>,
}

impl SeriesBuffer {
    pub fn new(options: BufferOptions) -> Self {
        Self {
            points: VecDeque::with_capacity(options.capacity.min(1024)),
            min_value: f64::NAN,
            max_value: f64::NAN,
            options,
            last_bounds_reset: None,
        }
    }

    pub fn options(&self) -> &BufferOptions {
        &self.options
    }

    /// Append a sample, evicting the oldest when full.
    pub fn append(&mut self, point: TimePoint) {
        if self.options.capacity == 0 {
            return;
        }
        while self.points.len() >= self.options.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Widen the bounds to include `value`.
    ///
    /// A NaN bound never compares, so the first value replaces it.
    #[inline]
    pub fn include_in_bounds(&mut self, value: f64) {
        self.min_value = if self.min_value < value {
            self.min_value
        } else {
            value
        };
        self.max_value = if self.max_value > value {
            self.max_value
        } else {
            value
        };
    }

    #[inline]
    pub fn clear_bounds(&mut self) {
        self.min_value = f64::NAN;
        self.max_value = f64::NAN;
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// `(min, max)` when both bounds are set.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        if self.min_value.is_nan() || self.max_value.is_nan() {
            None
        } else {
            Some((self.min_value, self.max_value))
        }
    }

    /// Drop samples older than `oldest_valid_ms`, keeping the newest expired
    /// one so the line still reaches the left edge.
    pub fn drop_before(&mut self, oldest_valid_ms: f64) -> usize {
        let mut dropped = 0;
        while self.points.len() > 1
            && self
                .points
                .get(1)
                .is_some_and(|p| p.timestamp_millis < oldest_valid_ms)
        {
            self.points.pop_front();
            dropped += 1;
        }
        dropped
    }

    /// Recompute bounds from the retained samples.
    pub fn recompute_bounds(&mut self) {
        let (min, max) = self
            .points
            .iter()
            .map(|p| p.value)
            .filter(|v| !v.is_nan())
            .fold((f64::NAN, f64::NAN), |(min, max), v| {
                (if min < v { min } else { v }, if max > v { max } else { v })
            });
        self.min_value = min;
        self.max_value = max;
    }

    /// Recompute bounds if this buffer opts in and its interval has elapsed.
    pub fn maybe_reset_bounds(&mut self, now_ms: f64) -> bool {
        if !self.options.reset_bounds {
            return false;
        }
        let due = self
            .last_bounds_reset
            .map_or(true, |last| now_ms - last >= self.options.reset_bounds_interval_ms);
        if due {
            self.last_bounds_reset = Some(now_ms);
            self.recompute_bounds();
        }
        due
    }

    pub fn points(&self) -> &VecDeque<TimePoint> {
        &self.points
    }

    pub fn last(&self) -> Option<&TimePoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.clear_bounds();
        self.last_bounds_reset = None;
    }

    /// Samples as `[timestamp_ms, value]` pairs for plotting
    pub fn as_plot_points(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|p| [p.timestamp_millis, p.value])
            .collect()
    }

    /// First and last timestamps
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let first = self.points.front()?.timestamp_millis;
        let last = self.points.back()?.timestamp_millis;
        Some((first, last))
    }
}

impl Default for SeriesBuffer {
    fn default() -> Self {
        Self::new(BufferOptions::default())
    }
}
