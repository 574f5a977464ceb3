use log::trace;
use std::cmp::Ordering;

use crate::capability::{self, ProviderCache};
use crate::comparator::{CompareError, Comparator};
use crate::deep::DeepComparator;
use crate::value::Value;

/// Entry point comparator: custom capabilities first, then a fallback.
///
/// Resolution order:
/// 1. left operand's unrestricted comparison;
/// 2. left operand's restricted comparison, if it accepts the right operand;
/// 3. left operand's self comparison, if both share a provider;
/// 4. steps 1-3 for the right operand, with the result reversed;
/// 5. the fallback comparator.
///
/// Reversing in step 4 keeps the result anti-symmetric as long as the custom
/// comparisons are themselves anti-symmetric.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher<F = DeepComparator> {
    fallback: F,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: Comparator> Dispatcher<F> {
    pub fn with_fallback(fallback: F) -> Self {
        Dispatcher { fallback }
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<F: Comparator> Comparator for Dispatcher<F> {
    fn compare(&self, lhs: &Value, rhs: &Value) -> Result<Ordering, CompareError> {
        if let Some(ordering) = capability::resolve(lhs, rhs, ProviderCache::global())? {
            return Ok(ordering);
        }

        trace!("no custom comparison applies, using fallback");
        self.fallback.compare(lhs, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Comparable, SelfComparable};
    use crate::record::{FieldList, Record};
    use crate::scalar::ScalarComparator;
    use std::any::Any;

    /// Always claims to be greater, regardless of the other operand.
    struct Greedy;

    impl Record for Greedy {
        fn type_name(&self) -> &str {
            "Greedy"
        }

        fn fields(&self) -> FieldList {
            FieldList::new()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_comparable(&self) -> Option<&dyn Comparable> {
            Some(self)
        }
    }

    impl Comparable for Greedy {
        fn compare(&self, _other: &Value) -> Result<Ordering, CompareError> {
            Ok(Ordering::Greater)
        }
    }

    /// Compares by `version` against other `Versioned` records only.
    struct Versioned {
        version: u32,
    }

    impl Record for Versioned {
        fn type_name(&self) -> &str {
            "Versioned"
        }

        fn fields(&self) -> FieldList {
            FieldList::new()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_self_comparable(&self) -> Option<&dyn SelfComparable> {
            Some(self)
        }
    }

    impl SelfComparable for Versioned {
        fn compare(&self, other: &dyn Record) -> Result<Ordering, CompareError> {
            let other = other
                .as_any()
                .downcast_ref::<Versioned>()
                .ok_or_else(|| CompareError::custom("foreign provider"))?;
            Ok(self.version.cmp(&other.version))
        }
    }

    #[test]
    fn custom_comparison_is_mirrored() {
        let dispatcher = Dispatcher::new();
        let greedy = Value::record(Greedy);

        assert_eq!(
            dispatcher.compare(&greedy, &Value::Int(1)).unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            dispatcher.compare(&Value::Int(1), &greedy).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn self_comparison_between_same_provider() {
        let dispatcher = Dispatcher::new();
        let v1 = Value::record(Versioned { version: 1 });
        let v2 = Value::record(Versioned { version: 2 });

        assert_eq!(dispatcher.compare(&v1, &v2).unwrap(), Ordering::Less);
        assert_eq!(dispatcher.compare(&v2, &v1).unwrap(), Ordering::Greater);
    }

    #[test]
    fn self_comparison_skips_other_types() {
        // Only the scalar ranking applies: a record ranks above an integer.
        let dispatcher = Dispatcher::with_fallback(ScalarComparator);
        let v1 = Value::record(Versioned { version: 1 });

        assert_eq!(
            dispatcher.compare(&v1, &Value::Int(7)).unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn plain_values_fall_back() {
        let dispatcher = Dispatcher::new();
        let a = Value::Sequence(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::Sequence(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(dispatcher.compare(&a, &b).unwrap(), Ordering::Less);
    }
}
