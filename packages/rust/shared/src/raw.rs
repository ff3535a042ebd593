//! JSON values of unbounded nesting depth.
//!
//! `serde_json` guards its parser with a recursion limit and its `Value`
//! clones, compares, serializes and drops recursively. Corpus trees can be
//! nested far deeper than either tolerates, so [`RawTree`] parses through
//! `serde_stacker`, grows the stack on demand while recursing, and tears
//! values down iteratively.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Grow the stack when less than this much remains.
const RED_ZONE: usize = 64 * 1024;
/// Size of each freshly allocated stack segment.
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Deserialize `text` without a nesting limit.
pub fn from_deep_str<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Drop `value` without recursing into it.
pub fn dismantle(value: Value) {
    let mut stack = vec![value];
    while let Some(item) = stack.pop() {
        match item {
            Value::Array(items) => stack.extend(items),
            Value::Object(map) => stack.extend(map.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}

fn deep_clone(value: &Value) -> Value {
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || match value {
        Value::Array(items) => Value::Array(items.iter().map(deep_clone).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| (key.clone(), deep_clone(v)))
                .collect(),
        ),
        scalar => scalar.clone(),
    })
}

fn deep_eq(a: &Value, b: &Value) -> bool {
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| deep_eq(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, v)| y.get(key).is_some_and(|w| deep_eq(v, w)))
        }
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        _ => a == b,
    })
}

/// Serializes a borrowed value one stack-checked level at a time.
struct Grow<'a>(&'a Value);

impl Serialize for Grow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || match self.0 {
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&Grow(item))?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, v) in map {
                    out.serialize_entry(key, &Grow(v))?;
                }
                out.end()
            }
            scalar => scalar.serialize(serializer),
        })
    }
}

// ---------------------------------------------------------------------------
// RawTree
// ---------------------------------------------------------------------------

/// A verbatim JSON sub-tree, safe to hold at any depth.
#[derive(Default)]
pub struct RawTree(Value);

impl RawTree {
    /// Parse JSON text of any depth.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        from_deep_str(text).map(Self)
    }

    /// Deep copy of `value`.
    pub fn copy_of(value: &Value) -> Self {
        Self(deep_clone(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Compact JSON text.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<Value> for RawTree {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl Drop for RawTree {
    fn drop(&mut self) {
        dismantle(std::mem::take(&mut self.0));
    }
}

impl Clone for RawTree {
    fn clone(&self) -> Self {
        Self::copy_of(&self.0)
    }
}

impl PartialEq for RawTree {
    fn eq(&self, other: &Self) -> bool {
        deep_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RawTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawTree").field(&self.to_json_string()).finish()
    }
}

impl Serialize for RawTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Grow(&self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self)
    }
}
