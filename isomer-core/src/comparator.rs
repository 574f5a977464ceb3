use std::cmp::Ordering;
use std::error::Error;

use crate::value::{Value, ValueKind};

/// Error type for comparisons.
///
/// Comparison itself is total; errors only originate in collaborators and
/// reach the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("not a scalar pair: {left:?} and {right:?}")]
    NotScalar { left: ValueKind, right: ValueKind },
    #[error(transparent)]
    Custom(Box<dyn Error + Send + Sync>),
}

impl CompareError {
    /// Wraps an error raised by a custom comparison.
    pub fn custom(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        CompareError::Custom(err.into())
    }
}

/// A three-way comparison over values.
pub trait Comparator {
    fn compare(&self, lhs: &Value, rhs: &Value) -> Result<Ordering, CompareError>;

    /// Sorts `values` in place (stable), stopping at the first error.
    ///
    /// Once an error is recorded, remaining comparisons report `Equal` and
    /// the slice is left in an unspecified order.
    ///
    /// # Panics
    ///
    /// Like [`slice::sort_by`], this may panic if `compare` is not a total
    /// order, for example a custom comparison that is not anti-symmetric or
    /// not transitive. It may also panic if `compare` itself panics.
    fn sort(&self, values: &mut [Value]) -> Result<(), CompareError> {
        let mut failure = None;
        values.sort_by(|a, b| {
            if failure.is_some() {
                return Ordering::Equal;
            }
            self.compare(a, b).unwrap_or_else(|err| {
                failure = Some(err);
                Ordering::Equal
            })
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<C: Comparator + ?Sized> Comparator for &C {
    fn compare(&self, lhs: &Value, rhs: &Value) -> Result<Ordering, CompareError> {
        (**self).compare(lhs, rhs)
    }
}

impl<C: Comparator + ?Sized> Comparator for Box<C> {
    fn compare(&self, lhs: &Value, rhs: &Value) -> Result<Ordering, CompareError> {
        (**self).compare(lhs, rhs)
    }
}
