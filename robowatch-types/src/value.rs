//! Parameter values reported by peripherals.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// A single parameter reading.
///
/// Controllers report booleans (switches, buttons), integers (encoder
/// counts), floats (axes, voltages), and occasionally free text. Values are
/// stored exactly as received; a text value in a numeric slot is kept and
/// simply reported as non-numeric by [`ParamValue::as_f64`]. Runtime log
/// context can also carry `null`, lists and objects, which are kept as
/// [`ParamValue::Null`], [`ParamValue::List`] and [`ParamValue::Map`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// Numeric view of the value, if it has one.
    ///
    /// Booleans map to `0.0`/`1.0` so switch states can share a plot with
    /// analog readings. Text, null, composites and non-finite floats have no
    /// numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) if f.is_finite() => Some(*f),
            ParamValue::Float(_)
            | ParamValue::Text(_)
            | ParamValue::Null
            | ParamValue::List(_)
            | ParamValue::Map(_) => None,
        }
    }

    /// Returns true if the value can be plotted.
    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.into())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{:.3}", x),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Null => f.write_str("null"),
            ParamValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            ParamValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}
