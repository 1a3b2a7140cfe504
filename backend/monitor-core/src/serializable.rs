//! Type-erased serializable values.
//!
//! The pipeline's action and state types are open-ended, so the monitor never
//! names them. Anything implementing [`Serializable`] can be boxed into an
//! [`AnySerializable`], which forwards to the wrapped value's wire form and
//! nothing else.
//!
//! The pipeline decides per value whether it can be monitored through
//! [`Monitored::snapshot`]; returning `None` is how a type opts out.

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::ser::Error as SerError;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A value that can produce a structured, self-describing wire form.
pub trait Serializable: Send + Sync + 'static {
    /// Structured wire form of the value.
    fn to_wire(&self) -> Result<Value, serde_json::Error>;

    /// Display label of the concrete type, used by the inspection tool to group actions.
    fn type_name(&self) -> Cow<'static, str>;
}

impl<T> Serializable for T
where
    T: Serialize + Send + Sync + 'static,
{
    fn to_wire(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn type_name(&self) -> Cow<'static, str> {
        short_type_name(type_name::<T>())
    }
}

/// Forwarding box over any [`Serializable`] value.
///
/// Cloning shares the wrapped value.
#[derive(Clone)]
pub struct AnySerializable {
    value: Arc<dyn Serializable>,
}

impl AnySerializable {
    pub fn new<T: Serializable>(value: T) -> Self {
        Self {
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> Cow<'static, str> {
        self.value.type_name()
    }

    pub fn to_wire(&self) -> Result<Value, serde_json::Error> {
        self.value.to_wire()
    }
}

impl fmt::Debug for AnySerializable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnySerializable")
            .field(&self.type_name())
            .finish()
    }
}

impl Serialize for AnySerializable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value
            .to_wire()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

/// Capability check the middleware runs on every action and state it observes.
pub trait Monitored: Send + Sync {
    /// Label used in log lines about this value.
    fn type_name(&self) -> Cow<'static, str> {
        short_type_name(type_name::<Self>())
    }

    /// An owned, serializable snapshot, or `None` when the value cannot be monitored.
    fn snapshot(&self) -> Option<AnySerializable>;
}

/// Strips module paths from every path in a `std::any::type_name` result.
///
/// `demo::store::SetName` becomes `SetName`. Generic arguments, arrays and
/// tuples keep their punctuation: `alloc::vec::Vec<demo::SetName>` becomes
/// `Vec<SetName>` and `(u8, demo::SetName)` becomes `(u8, SetName)`.
pub fn short_type_name(full: &'static str) -> Cow<'static, str> {
    if full.chars().all(is_path_char) {
        return Cow::Borrowed(last_segment(full));
    }

    let mut short = String::with_capacity(full.len());
    let mut path_start = None;
    for (index, c) in full.char_indices() {
        match (is_path_char(c), path_start) {
            (true, None) => path_start = Some(index),
            (true, Some(_)) => {}
            (false, start) => {
                if let Some(start) = start {
                    short.push_str(last_segment(&full[start..index]));
                    path_start = None;
                }
                short.push(c);
            }
        }
    }
    if let Some(start) = path_start {
        short.push_str(last_segment(&full[start..]));
    }
    Cow::Owned(short)
}

fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':'
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
