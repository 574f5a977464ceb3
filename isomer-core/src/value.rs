use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::identity::Identity;
use crate::record::{Record, RecordRef};

/// A datum handed to a comparator.
///
/// Scalars (`Null`, `Bool`, `Int`, `Float`, `Text`, `Bytes`) have no internal
/// structure. `Sequence`, `Map` and `Record` are composites whose sub-values
/// take part in the ordering.
///
/// Records are shared through `Arc`, which gives every record instance an
/// identity. Sequences and maps are plain owned values, so any reference
/// cycle necessarily passes through a record.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(ByteString),
    /// Ordered list of values.
    Sequence(Vec<Value>),
    /// Ordered mapping. Iteration order is the order of the entries.
    Map(Vec<(Value, Value)>),
    Record(RecordRef),
}

/// Shape of a value, used to rank values of unrelated shapes.
///
/// Variants are declared in rank order. Integers and floats share
/// `Number` so that they form a single numeric domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    Text,
    Bytes,
    Sequence,
    Map,
    Record,
}

impl Value {
    /// Wraps a record in a fresh `Arc`, giving it a new identity.
    pub fn record(record: impl Record) -> Self {
        Value::Record(Arc::new(record))
    }

    /// Builds a map value from `(key, value)` pairs, keeping their order.
    pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) | Value::Float(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Map(_) => ValueKind::Map,
            Value::Record(_) => ValueKind::Record,
        }
    }

    pub fn as_record(&self) -> Option<&RecordRef> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Text(s) => write!(f, "Text({s:?})"),
            Value::Bytes(b) => write!(f, "Bytes({} bytes)", b.0.len()),
            Value::Sequence(items) => f.debug_list().entries(items).finish(),
            Value::Map(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
            // Records may be cyclic, so only the type and identity are printed.
            Value::Record(record) => {
                write!(f, "{}@{}", record.type_name(), Identity::of(record))
            }
        }
    }
}

/// A wrapper for byte sequences to distinguish them from `Vec<T>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteString(pub Vec<u8>);

impl ByteString {
    pub fn new(data: Vec<u8>) -> Self {
        ByteString(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(v: Vec<u8>) -> Self {
        ByteString(v)
    }
}

impl From<&[u8]> for ByteString {
    fn from(v: &[u8]) -> Self {
        ByteString(v.to_vec())
    }
}

/// Conversion of a Rust field into a [`Value`].
///
/// The `Record` derive calls this on every field that is not skipped.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::Null
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! impl_to_value_int {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }

            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_to_value_int!(i8, i16, i32, i64, u8, u16, u32);

// Wide unsigned integers past i64::MAX degrade to floats.
macro_rules! impl_to_value_wide {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }

            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    match i64::try_from(v) {
                        Ok(i) => Value::Int(i),
                        Err(_) => Value::Float(v as f64),
                    }
                }
            }
        )*
    };
}

impl_to_value_wide!(u64, usize, isize);

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for ByteString {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::Sequence(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }
}

impl<K: ToValue, V: ToValue, S> ToValue for IndexMap<K, V, S> {
    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }
}

impl<T: Record> ToValue for Arc<T> {
    fn to_value(&self) -> Value {
        Value::Record(Arc::clone(self) as RecordRef)
    }
}

impl ToValue for RecordRef {
    fn to_value(&self) -> Value {
        Value::Record(Arc::clone(self))
    }
}

/// A late-bound slot. Unset slots read as `Null`.
///
/// Setting a slot after its owner has been shared is how self-referential
/// records are built.
impl ToValue for OnceLock<Value> {
    fn to_value(&self) -> Value {
        self.get().cloned().unwrap_or(Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<ByteString> for Value {
    fn from(v: ByteString) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Sequence(v)
    }
}

impl From<RecordRef> for Value {
    fn from(v: RecordRef) -> Self {
        Value::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_share_a_kind() {
        assert_eq!(Value::Int(3).kind(), ValueKind::Number);
        assert_eq!(Value::Float(3.5).kind(), ValueKind::Number);
        assert!(ValueKind::Number < ValueKind::Text);
    }

    #[test]
    fn wide_unsigned_degrades_to_float() {
        assert!(matches!(Value::from(7u64), Value::Int(7)));
        assert!(matches!(Value::from(u64::MAX), Value::Float(_)));
    }

    #[test]
    fn option_and_collections_convert() {
        assert!(matches!(None::<i32>.to_value(), Value::Null));
        assert!(matches!(Some(2u8).to_value(), Value::Int(2)));

        let mut map = IndexMap::new();
        map.insert("b".to_string(), 1);
        map.insert("a".to_string(), 2);
        match map.to_value() {
            Value::Map(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(matches!(&entries[0].0, Value::Text(k) if k == "b"));
            }
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn unset_slot_reads_null() {
        let slot: OnceLock<Value> = OnceLock::new();
        assert!(matches!(slot.to_value(), Value::Null));
        slot.set(Value::Int(1)).unwrap();
        assert!(matches!(slot.to_value(), Value::Int(1)));
    }
}
