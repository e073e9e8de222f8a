//! Paths into a configuration tree.
//!
//! A path is either written as a dotted string (`"gimbal.yaw_gains.0.p_gain"`)
//! or built from segments (`path!["gimbal", "yaw_gains", 0, "p_gain"]`). Both
//! forms coerce every component that reads as a finite number into a numeric
//! segment, so the two spellings above address the same location.

use std::borrow::Cow;
use std::fmt;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Mapping key
    Key(String),
    /// Numeric segment: a sequence index, or a numeric key in a mapping
    Number(f64),
}

impl Segment {
    /// Build a segment from text, turning anything that parses as a finite
    /// float into a number.
    pub fn coerce(text: &str) -> Self {
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Segment::Number(n),
            _ => Segment::Key(text.to_string()),
        }
    }

    /// Numeric segments decide that a freshly created parent is a sequence.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Segment::Number(_))
    }

    /// Position in a sequence, if this segment can address one.
    pub fn as_index(&self) -> Option<usize> {
        match *self {
            Segment::Number(n) if n >= 0.0 && n.fract() == 0.0 && n <= usize::MAX as f64 => {
                Some(n as usize)
            }
            _ => None,
        }
    }

    /// Key used when this segment addresses a mapping.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Segment::Key(key) => Cow::Borrowed(key.as_str()),
            Segment::Number(n) => Cow::Owned(format_number(*n)),
        }
    }
}

/// Canonical decimal text of a number: integers print without a fraction.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Segment::coerce(text)
    }
}

impl From<String> for Segment {
    fn from(text: String) -> Self {
        Segment::coerce(&text)
    }
}

impl From<f64> for Segment {
    fn from(n: f64) -> Self {
        Segment::Number(n)
    }
}

macro_rules! segment_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Segment {
                fn from(n: $t) -> Self {
                    Segment::Number(n as f64)
                }
            }
        )*
    };
}

segment_from_int!(u8, u16, u32, u64, usize, i32, i64);

/// An ordered list of segments addressing a node in a tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path(Vec<Segment>);

impl Path {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Split a dotted string and coerce each component.
    ///
    /// An empty string is one empty key, not the root.
    pub fn parse(text: &str) -> Self {
        Self(text.split('.').map(Segment::coerce).collect())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.0.iter()
    }

    /// Append a segment, returning the extended path.
    pub fn join(mut self, segment: impl Into<Segment>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Dotted rendering of the first `len` segments (for error messages).
    pub fn prefix(&self, len: usize) -> String {
        self.0
            .iter()
            .take(len)
            .map(|s| s.as_key().into_owned())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix(self.0.len()))
    }
}

impl From<&str> for Path {
    fn from(text: &str) -> Self {
        Path::parse(text)
    }
}

impl From<String> for Path {
    fn from(text: String) -> Self {
        Path::parse(&text)
    }
}

impl From<&String> for Path {
    fn from(text: &String) -> Self {
        Path::parse(text)
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Self {
        path.clone()
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        // Array form gets the same numeric coercion as the dotted form
        Self(
            segments
                .into_iter()
                .map(|s| match s {
                    Segment::Key(key) => Segment::coerce(&key),
                    number => number,
                })
                .collect(),
        )
    }
}

impl<S: Into<Segment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Path::from(iter.into_iter().map(Into::into).collect::<Vec<_>>())
    }
}

/// Build a [`Path`] from mixed string and integer segments.
///
/// ```
/// use bot_dashboard::path;
/// let p = path!["winches", 0, "calibration", "kg_force_per_count"];
/// assert_eq!(p, bot_dashboard::store::Path::parse("winches.0.calibration.kg_force_per_count"));
/// ```
#[macro_export]
macro_rules! path {
    () => { $crate::store::Path::root() };
    ($($seg:expr),+ $(,)?) => {
        $crate::store::Path::from(vec![$($crate::store::Segment::from($seg)),+])
    };
}
