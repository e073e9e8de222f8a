//! Get and set by path on a `serde_json::Value` tree.

use super::path::{Path, Segment};
use crate::error::{DashboardError, Result};
use serde_json::{Map, Value};

/// Largest sequence `set` will grow to when padding a gap with nulls.
pub const MAX_SEQUENCE_LEN: usize = 1 << 16;

/// Look up `path` in `tree`.
///
/// Returns `None` as soon as a segment is missing, a sequence index is out of
/// range, or the walk reaches a scalar. The empty path yields the tree itself.
pub fn lookup<'a>(tree: &'a Value, path: &Path) -> Option<&'a Value> {
    path.iter().try_fold(tree, child)
}

/// Look up a path given in any accepted form.
pub fn get(tree: &Value, path: impl Into<Path>) -> Option<&Value> {
    lookup(tree, &path.into())
}

fn child<'a>(node: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match node {
        Value::Array(items) => items.get(segment.as_index()?),
        Value::Object(map) => map.get(segment.as_key().as_ref()),
        _ => None,
    }
}

/// Store `value` at `path`, creating missing intermediate containers.
///
/// A missing container is a sequence when the *following* segment is numeric
/// and a mapping otherwise, so `["a", 0, "b"]` makes `a` a sequence whose
/// element 0 is a mapping. Returns `tree` for chaining.
///
/// Containers created before a failing segment are kept.
pub fn assign<'a>(tree: &'a mut Value, path: &Path, value: Value) -> Result<&'a mut Value> {
    let segments = path.segments();
    let (last, parents) = segments.split_last().ok_or(DashboardError::InvalidPath)?;

    {
        if tree.is_null() {
            *tree = empty_container(&segments[0]);
        }
        let mut node = &mut *tree;
        for (i, segment) in parents.iter().enumerate() {
            let slot = slot_mut(node, segment, path, i)?;
            if slot.is_null() {
                *slot = empty_container(&segments[i + 1]);
            }
            if !matches!(slot, Value::Array(_) | Value::Object(_)) {
                return Err(DashboardError::NotAContainer {
                    prefix: path.prefix(i + 1),
                    found: kind(slot),
                });
            }
            node = slot;
        }
        *slot_mut(node, last, path, parents.len())? = value;
    }

    Ok(tree)
}

/// Store a value at a path given in any accepted form.
pub fn set(tree: &mut Value, path: impl Into<Path>, value: Value) -> Result<&mut Value> {
    assign(tree, &path.into(), value)
}

/// Build a fresh partial tree holding only `value` at `path`.
///
/// This is the payload shape of a configuration update.
pub fn partial(path: impl Into<Path>, value: Value) -> Result<Value> {
    let mut root = Value::Object(Map::new());
    assign(&mut root, &path.into(), value)?;
    Ok(root)
}

fn empty_container(next: &Segment) -> Value {
    if next.is_numeric() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// Child slot of `node` for `segment`, inserting a null placeholder if absent.
fn slot_mut<'a>(
    node: &'a mut Value,
    segment: &Segment,
    path: &Path,
    depth: usize,
) -> Result<&'a mut Value> {
    match node {
        Value::Object(map) => Ok(map
            .entry(segment.as_key().into_owned())
            .or_insert(Value::Null)),
        Value::Array(items) => {
            let index = segment
                .as_index()
                .ok_or_else(|| DashboardError::NotAContainer {
                    prefix: path.prefix(depth),
                    found: "a sequence",
                })?;
            if index >= MAX_SEQUENCE_LEN {
                return Err(DashboardError::IndexTooLarge {
                    prefix: path.prefix(depth),
                    index,
                });
            }
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        other => Err(DashboardError::NotAContainer {
            prefix: path.prefix(depth),
            found: kind(other),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
