//! Isomer is a deterministic total-order comparator for heterogeneous values.
//!
//! Core concepts:
//! - **Value**: a scalar, sequence, ordered map, or shared record
//! - **Record**: a structured value with ordered named fields and optional
//!   custom comparison capabilities
//! - **Dispatcher**: picks a record's custom comparison when one applies,
//!   otherwise falls back to structural comparison
//! - **DeepComparator**: lexicographic structural comparison that
//!   terminates on cyclic record graphs
//! - **ScalarComparator**: the leaf ordering (one numeric domain, strict
//!   kind ranking otherwise)
//!
//! # Example
//!
//! ```
//! use isomer_core::{compare, DynamicRecord, Value};
//! use std::cmp::Ordering;
//!
//! let short = Value::from(vec![Value::Int(1), Value::Int(2)]);
//! let long = Value::from(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
//! assert_eq!(compare(&short, &long).unwrap(), Ordering::Less);
//!
//! let a = Value::record(DynamicRecord::new("Point").with_field("x", 1i64));
//! let b = Value::record(DynamicRecord::new("Point").with_field("x", 2i64));
//! assert_eq!(compare(&a, &b).unwrap(), Ordering::Less);
//! ```

mod capability;
mod comparator;
mod deep;
mod dispatch;
mod identity;
mod record;
mod scalar;
mod value;

pub use capability::{resolve, Comparable, ProviderCache, RestrictedComparable, SelfComparable};
pub use comparator::{CompareError, Comparator};
pub use deep::{CompareConfig, DeepComparator};
pub use dispatch::Dispatcher;
pub use identity::{Identity, Ledger};
pub use record::{levels, DynamicRecord, FieldList, FieldName, Record, RecordRef};
pub use scalar::{compare_floats, compare_int_float, ScalarComparator};
pub use value::{ByteString, ToValue, Value, ValueKind};

#[cfg(feature = "derive")]
pub use isomer_derive::Record;

use std::cmp::Ordering;

/// Compares two values with the default [`Dispatcher`].
pub fn compare(lhs: &Value, rhs: &Value) -> Result<Ordering, CompareError> {
    Dispatcher::new().compare(lhs, rhs)
}
