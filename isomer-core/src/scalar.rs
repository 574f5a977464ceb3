use std::cmp::Ordering;

use crate::comparator::{CompareError, Comparator};
use crate::value::Value;

/// Reference comparator for leaves and mixed shapes.
///
/// Ordering rules:
/// 1. Integers and floats form one numeric domain, compared exactly.
/// 2. Values of the same scalar kind compare by value.
/// 3. Values of different kinds compare by [`ValueKind`](crate::ValueKind)
///    rank, with no coercion (`3 < "3"`).
///
/// Two composites of the same kind are not scalars and yield
/// [`CompareError::NotScalar`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarComparator;

impl Comparator for ScalarComparator {
    fn compare(&self, lhs: &Value, rhs: &Value) -> Result<Ordering, CompareError> {
        let ordering = match (lhs, rhs) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => compare_floats(*a, *b),
            (Value::Int(a), Value::Float(b)) => compare_int_float(*a, *b),
            (Value::Float(a), Value::Int(b)) => compare_int_float(*b, *a).reverse(),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            _ => {
                let (left, right) = (lhs.kind(), rhs.kind());
                if left == right {
                    return Err(CompareError::NotScalar { left, right });
                }
                left.cmp(&right)
            }
        };

        Ok(ordering)
    }
}

/// Total order on floats: NaN sorts after every number and equals itself.
pub fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Compares an integer with a float without losing integer precision.
pub fn compare_int_float(i: i64, f: f64) -> Ordering {
    // 2^63: the first float above every i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() || f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }

    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        ordering => ordering,
    }
}
