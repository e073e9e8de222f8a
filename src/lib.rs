//! # Bot Dashboard
//!
//! Core of a live dashboard for a cable-driven camera robot: it aggregates the
//! bot's message stream into one model, feeds scrolling time-series charts from
//! that model, binds widgets to paths in the bot's configuration tree and polls
//! gimbal firmware parameters on timers.
//!
//! ## Architecture
//!
//! - **Store**: path-addressed get/set over `serde_json::Value` trees
//! - **Connection**: model aggregation, the frame/messages/config event bus and
//!   the outbound request sink
//! - **Chart**: per-series trigger deduplication into bounded ring buffers
//! - **Polling**: switchable tokio timers sending `GimbalValueRequests`
//!
//! ## Configuration
//!
//! Dashboard settings live in `dashboard.toml` under the platform config dir
//! (`dev.tucoflyer.bot-dashboard`). See [`config`].
//!
//! ## Example
//!
//! ```
//! use bot_dashboard::chart::{Chart, ChartOptions, Extractors, Series, SeriesOptions};
//! use bot_dashboard::connection::{BotConnection, ChannelSink};
//! use std::sync::Arc;
//!
//! let (sink, _outbound) = ChannelSink::new(64);
//! let connection = BotConnection::new(Arc::new(sink));
//! let chart = Chart::new(ChartOptions::default());
//! let _drift = Series::attach(
//!     &chart,
//!     connection.events(),
//!     Extractors::from_paths(
//!         "gimbal_status.message.GimbalControlStatus.drift_compensation.0",
//!         "gimbal_status.local_timestamp",
//!         "gimbal_status.local_timestamp",
//!     ),
//!     SeriesOptions::default(),
//! );
//!
//! connection
//!     .receive_json(r#"{"GimbalControlStatus": {"drift_compensation": [0.5, 0.1]}}"#)
//!     .unwrap();
//! connection.frame();
//! assert_eq!(chart.total_points(), 1);
//! ```

pub mod calibration;
pub mod chart;
pub mod config;
pub mod connection;
pub mod error;
pub mod gimbal;
pub mod polling;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use chart::{Chart, ChartOptions, Extractors, Series, SeriesOptions};
pub use config::DashboardConfig;
pub use connection::{BotConnection, BotModel, Request, TimestampedMessage};
pub use error::{DashboardError, Result};
pub use polling::{PollerBank, PollerToggle};
pub use store::{LiveConfig, Path, Segment};
pub use types::{GimbalAddr, PollDescriptor, Scope, TimePoint};
