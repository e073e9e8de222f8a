//! One chart line fed from connection events.
//!
//! A [`Series`] pulls a `(value, timestamp, trigger)` triple out of each model
//! it sees and appends a point only when the trigger changes, so redundant
//! re-broadcasts of the same reading never add duplicate points.

use super::buffer::{BufferOptions, SeriesBuffer, SeriesStyle};
use super::{Chart, ChartInner, SharedBuffer};
use crate::connection::{lock, BotModel, EventBus, Subscription};
use crate::store::Path;
use crate::types::TimePoint;
use serde_json::Value;
use std::sync::{Arc, Mutex, Weak};

/// Reads a number out of a model.
pub type NumberFn = Box<dyn Fn(&BotModel) -> Option<f64> + Send + Sync>;
/// Reads a trigger identity out of a model.
pub type TriggerFn = Box<dyn Fn(&BotModel) -> Option<Value> + Send + Sync>;

/// The three per-series extraction functions.
///
/// `None` from any of them means "no data yet" and skips the model.
pub struct Extractors {
    pub value: NumberFn,
    pub timestamp: NumberFn,
    pub trigger: TriggerFn,
}

impl Extractors {
    pub fn new(value: NumberFn, timestamp: NumberFn, trigger: TriggerFn) -> Self {
        Self {
            value,
            timestamp,
            trigger,
        }
    }

    /// Extractors that read each field at a path in the model.
    pub fn from_paths(
        value: impl Into<Path>,
        timestamp: impl Into<Path>,
        trigger: impl Into<Path>,
    ) -> Self {
        Self::new(number_at(value), number_at(timestamp), value_at(trigger))
    }

    /// Multiply every extracted value by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        let value = self.value;
        Self {
            value: Box::new(move |model: &BotModel| value(model).map(|v| v * factor)),
            ..self
        }
    }
}

/// Numeric value at `path`. Booleans read as 0/1.
pub fn number_at(path: impl Into<Path>) -> NumberFn {
    let path = path.into();
    Box::new(move |model: &BotModel| match model.lookup(&path)? {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    })
}

/// Any value at `path`.
pub fn value_at(path: impl Into<Path>) -> TriggerFn {
    let path = path.into();
    Box::new(move |model: &BotModel| model.lookup(&path).cloned())
}

/// Trigger identity: numbers compare by value so `1` and `1.0` match.
fn same_trigger(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Per-series options.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOptions {
    /// Never contribute to, or be constrained by, chart bounds
    pub no_bounds: bool,
    /// Process every raw message instead of one model per frame
    pub full_data_rate: bool,
    pub style: SeriesStyle,
    /// Overrides the chart's bound recomputation interval
    pub reset_bounds_interval_ms: Option<f64>,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            no_bounds: false,
            full_data_rate: false,
            style: SeriesStyle::default(),
            reset_bounds_interval_ms: None,
        }
    }
}

struct SeriesState {
    extractors: Extractors,
    last_trigger: Option<Value>,
    no_bounds: bool,
    time_margin_ms: f64,
    buffer: SharedBuffer,
    attached: bool,
}

impl SeriesState {
    fn update_from_model(&mut self, model: &BotModel) -> bool {
        if !self.attached {
            return false;
        }
        let Some((value, timestamp, trigger)) = self.extract(model) else {
            return false;
        };
        if trigger.is_null() {
            return false;
        }
        if self
            .last_trigger
            .as_ref()
            .is_some_and(|last| same_trigger(last, &trigger))
        {
            return false;
        }

        let mut buffer = lock(&self.buffer);
        buffer.append(TimePoint::new(timestamp - self.time_margin_ms, value));
        if self.no_bounds {
            buffer.clear_bounds();
        } else {
            buffer.include_in_bounds(value);
        }
        self.last_trigger = Some(trigger);
        true
    }

    fn extract(&self, model: &BotModel) -> Option<(f64, f64, Value)> {
        let value = (self.extractors.value)(model)?;
        let timestamp = (self.extractors.timestamp)(model)?;
        let trigger = (self.extractors.trigger)(model)?;
        Some((value, timestamp, trigger))
    }
}

/// A chart line bound to a connection's event stream.
///
/// Dropping the series detaches it.
pub struct Series {
    state: Arc<Mutex<SeriesState>>,
    buffer: SharedBuffer,
    chart: Weak<ChartInner>,
    subscription: Option<Subscription>,
}

impl Series {
    /// Create a series, register its buffer with `chart` and subscribe it to
    /// the frame or raw message event.
    pub fn attach(
        chart: &Chart,
        events: &EventBus,
        extractors: Extractors,
        options: SeriesOptions,
    ) -> Self {
        let mut series = Self::detached(chart, extractors, &options);
        let state = Arc::clone(&series.state);

        let subscription = if options.full_data_rate {
            events.messages.subscribe(move |batch| {
                let mut state = lock(&state);
                for model in batch.models() {
                    state.update_from_model(model);
                }
            })
        } else {
            events.frame.subscribe(move |model| {
                lock(&state).update_from_model(model);
            })
        };
        series.subscription = Some(subscription);
        series
    }

    /// A series registered with `chart` but fed only by explicit
    /// [`update_from_model`](Self::update_from_model) calls.
    pub fn detached(chart: &Chart, extractors: Extractors, options: &SeriesOptions) -> Self {
        let chart_options = chart.options();
        let buffer = Arc::new(Mutex::new(SeriesBuffer::new(BufferOptions {
            capacity: chart_options.max_points,
            reset_bounds: !options.no_bounds,
            reset_bounds_interval_ms: options
                .reset_bounds_interval_ms
                .unwrap_or(chart_options.reset_bounds_interval_ms),
            style: options.style.clone(),
        })));
        chart.add_buffer(Arc::clone(&buffer));

        let state = SeriesState {
            extractors,
            last_trigger: None,
            no_bounds: options.no_bounds,
            time_margin_ms: chart_options.time_margin_ms,
            buffer: Arc::clone(&buffer),
            attached: true,
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            buffer,
            chart: chart.downgrade(),
            subscription: None,
        }
    }

    /// Process one model. Returns whether a point was appended.
    pub fn update_from_model(&self, model: &BotModel) -> bool {
        lock(&self.state).update_from_model(model)
    }

    pub fn buffer(&self) -> SharedBuffer {
        Arc::clone(&self.buffer)
    }

    pub fn last_trigger(&self) -> Option<Value> {
        lock(&self.state).last_trigger.clone()
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.state).attached
    }

    /// Stop processing events and remove the buffer from the chart.
    ///
    /// Safe to call more than once. An event already being dispatched when
    /// this runs is ignored.
    pub fn detach(&mut self) {
        let was_attached = std::mem::replace(&mut lock(&self.state).attached, false);
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
        }
        if was_attached {
            if let Some(chart) = self.chart.upgrade() {
                chart.remove_buffer(&self.buffer);
            }
        }
    }
}

impl Drop for Series {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartOptions;
    use crate::connection::TimestampedMessage;
    use serde_json::json;

    fn model_with(value: Value, trigger: Value, ts: f64) -> BotModel {
        let mut model = BotModel::new();
        let message = json!({"Sample": {"value": value, "trigger": trigger}});
        model
            .update(&TimestampedMessage::new(ts, message))
            .unwrap();
        model
    }

    fn sample_extractors() -> Extractors {
        Extractors::from_paths(
            "Sample.message.Sample.value",
            "Sample.local_timestamp",
            "Sample.message.Sample.trigger",
        )
    }

    #[test]
    fn test_dedup_by_trigger() {
        let chart = Chart::new(ChartOptions::default());
        let series = Series::detached(&chart, sample_extractors(), &SeriesOptions::default());

        let appended: Vec<bool> = [1, 1, 2, 2, 3]
            .iter()
            .enumerate()
            .map(|(i, t)| series.update_from_model(&model_with(json!(i), json!(t), 1000.0 + i as f64)))
            .collect();

        assert_eq!(appended, vec![true, false, true, false, true]);
        let buffer = series.buffer();
        let times: Vec<f64> = lock(&buffer)
            .points()
            .iter()
            .map(|p| p.timestamp_millis)
            .collect();
        assert_eq!(times, vec![950.0, 952.0, 954.0]);
    }

    #[test]
    fn test_integer_and_float_triggers_match() {
        let chart = Chart::new(ChartOptions::default());
        let series = Series::detached(&chart, sample_extractors(), &SeriesOptions::default());
        assert!(series.update_from_model(&model_with(json!(1), json!(7), 0.0)));
        assert!(!series.update_from_model(&model_with(json!(2), json!(7.0), 1.0)));
    }

    #[test]
    fn test_missing_or_null_trigger_skips() {
        let chart = Chart::new(ChartOptions::default());
        let series = Series::detached(&chart, sample_extractors(), &SeriesOptions::default());

        assert!(!series.update_from_model(&BotModel::new()));
        assert!(!series.update_from_model(&model_with(json!(1), Value::Null, 0.0)));
        assert!(!series.update_from_model(&model_with(json!("text"), json!(1), 0.0)));
        assert_eq!(series.last_trigger(), None);
        assert!(lock(&series.buffer()).is_empty());
    }

    #[test]
    fn test_bounds_follow_values() {
        let chart = Chart::new(ChartOptions::default());
        let series = Series::detached(&chart, sample_extractors(), &SeriesOptions::default());
        for (i, v) in [5, -3, 10, 2].iter().enumerate() {
            series.update_from_model(&model_with(json!(v), json!(i), i as f64));
        }
        assert_eq!(lock(&series.buffer()).bounds(), Some((-3.0, 10.0)));
    }

    #[test]
    fn test_no_bounds_stays_unset() {
        let chart = Chart::new(ChartOptions::default());
        let options = SeriesOptions {
            no_bounds: true,
            ..Default::default()
        };
        let series = Series::detached(&chart, sample_extractors(), &options);
        for (i, v) in [5, -3, 10].iter().enumerate() {
            series.update_from_model(&model_with(json!(v), json!(i), i as f64));
        }
        let buffer = series.buffer();
        let buffer = lock(&buffer);
        assert_eq!(buffer.len(), 3);
        assert!(buffer.min_value().is_nan());
        assert!(buffer.max_value().is_nan());
    }

    #[test]
    fn test_scaled_extractor() {
        let chart = Chart::new(ChartOptions::default());
        let series = Series::detached(
            &chart,
            sample_extractors().scaled(1e-6),
            &SeriesOptions::default(),
        );
        series.update_from_model(&model_with(json!(2_000_000), json!(1), 0.0));
        assert_eq!(lock(&series.buffer()).last().map(|p| p.value), Some(2.0));
    }

    #[test]
    fn test_detach_unregisters_once() {
        let chart = Chart::new(ChartOptions::default());
        let mut series =
            Series::detached(&chart, sample_extractors(), &SeriesOptions::default());
        assert_eq!(chart.series_count(), 1);

        series.detach();
        series.detach();
        assert_eq!(chart.series_count(), 0);
        assert!(!series.update_from_model(&model_with(json!(1), json!(1), 0.0)));
    }
}
