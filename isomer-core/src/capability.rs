//! Custom comparison capabilities and their resolution.
//!
//! A record can declare one of three capabilities, consulted in this order:
//!
//! 1. [`Comparable`]: compares against any value.
//! 2. [`RestrictedComparable`]: compares against values it accepts.
//! 3. [`SelfComparable`]: compares only against records sharing the same
//!    self-comparison provider.
//!
//! [`resolve`] consults the left operand, then the right operand with the
//! result reversed. `None` means no capability applies and the caller falls
//! back to structural comparison.

use log::{debug, trace};
use std::any::TypeId;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::comparator::CompareError;
use crate::record::{levels, Record};
use crate::value::Value;

/// Custom comparison usable against any other value.
pub trait Comparable {
    fn compare(&self, other: &Value) -> Result<Ordering, CompareError>;
}

/// Custom comparison that first decides whether it applies.
pub trait RestrictedComparable {
    fn can_compare(&self, other: &Value) -> Result<bool, CompareError>;

    fn compare(&self, other: &Value) -> Result<Ordering, CompareError>;
}

/// Custom comparison between records of one provider type.
///
/// `other` is the level of the other record whose concrete type is the
/// provider, so implementations can downcast it to `Self` via
/// [`Record::as_any`].
pub trait SelfComparable {
    fn compare(&self, other: &dyn Record) -> Result<Ordering, CompareError>;
}

/// Memoized mapping from a concrete record type to the type that provides
/// its self comparison.
///
/// Entries are derived from type structure only, so concurrent first
/// lookups may both compute and write without harm.
#[derive(Debug, Default)]
pub struct ProviderCache {
    providers: RwLock<HashMap<TypeId, Option<TypeId>>>,
}

impl ProviderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by the comparators.
    pub fn global() -> &'static ProviderCache {
        static GLOBAL: OnceLock<ProviderCache> = OnceLock::new();
        GLOBAL.get_or_init(ProviderCache::new)
    }

    /// Returns the type of the nearest level of `record` that provides a
    /// self comparison.
    pub fn provider(&self, record: &dyn Record) -> Option<TypeId> {
        let ty = record.as_any().type_id();

        if let Ok(providers) = self.providers.read() {
            if let Some(provider) = providers.get(&ty) {
                return *provider;
            }
        }

        let provider = levels(record)
            .find(|level| level.as_self_comparable().is_some())
            .map(|level| level.as_any().type_id());

        // A poisoned lock only costs the memoization.
        if let Ok(mut providers) = self.providers.write() {
            debug!(
                "learned self-comparison provider for {}: {}",
                record.type_name(),
                if provider.is_some() { "found" } else { "none" }
            );
            providers.insert(ty, provider);
        }

        provider
    }

    pub fn len(&self) -> usize {
        self.providers.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves a pair through custom capabilities, if any applies.
pub fn resolve(
    lhs: &Value,
    rhs: &Value,
    cache: &ProviderCache,
) -> Result<Option<Ordering>, CompareError> {
    if let Some(left) = lhs.as_record() {
        if let Some(ordering) = consult(left.as_ref(), rhs, cache)? {
            return Ok(Some(ordering));
        }
    }

    if let Some(right) = rhs.as_record() {
        if let Some(ordering) = consult(right.as_ref(), lhs, cache)? {
            trace!("resolved {} from the right operand", right.type_name());
            return Ok(Some(ordering.reverse()));
        }
    }

    Ok(None)
}

/// Tries the capabilities of `subject` against `other`, in priority order.
fn consult(
    subject: &dyn Record,
    other: &Value,
    cache: &ProviderCache,
) -> Result<Option<Ordering>, CompareError> {
    if let Some(comparable) = levels(subject).find_map(|level| level.as_comparable()) {
        trace!("{} compares via unrestricted comparison", subject.type_name());
        return comparable.compare(other).map(Some);
    }

    if let Some(restricted) = levels(subject).find_map(|level| level.as_restricted()) {
        if restricted.can_compare(other)? {
            trace!("{} compares via restricted comparison", subject.type_name());
            return restricted.compare(other).map(Some);
        }
    }

    let Some(other) = other.as_record() else {
        return Ok(None);
    };
    let Some(provider) = cache.provider(subject) else {
        return Ok(None);
    };
    if cache.provider(other.as_ref()) != Some(provider) {
        return Ok(None);
    }

    let (Some(own), Some(theirs)) = (
        level_of(subject, provider),
        level_of(other.as_ref(), provider),
    ) else {
        return Ok(None);
    };
    let Some(comparable) = own.as_self_comparable() else {
        return Ok(None);
    };

    trace!("{} compares via self comparison", subject.type_name());
    comparable.compare(theirs).map(Some)
}

fn level_of(record: &dyn Record, ty: TypeId) -> Option<&dyn Record> {
    levels(record).find(|level| level.as_any().type_id() == ty)
}
