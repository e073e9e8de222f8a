//! Path-addressed access to JSON configuration and model trees
//!
//! - [`path`] - [`Path`] and [`Segment`], with numeric coercion
//! - [`tree`] - `get`/`set` on `serde_json::Value`
//! - [`live`] - [`LiveConfig`], a configuration snapshot kept current by the
//!   connection's config event

pub mod live;
pub mod path;
pub mod tree;

pub use live::{ConfigFollow, LiveConfig};
pub use path::{Path, Segment};
pub use tree::{assign, get, lookup, partial, set};
