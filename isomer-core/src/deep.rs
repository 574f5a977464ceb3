use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::capability::{self, ProviderCache};
use crate::comparator::{CompareError, Comparator};
use crate::identity::{Identity, Ledger};
use crate::record::RecordRef;
use crate::scalar::ScalarComparator;
use crate::value::Value;

/// Settings for [`DeepComparator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Compare records of different types on field content alone.
    ///
    /// When false, differing type names decide before any field is read.
    pub relax_type_comparison: bool,
    /// Resolve nested pairs through custom comparison capabilities before
    /// comparing them structurally.
    pub resolve_nested: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            relax_type_comparison: false,
            resolve_nested: true,
        }
    }
}

/// Structural comparator for sequences, maps and records.
///
/// Composites are compared lexicographically element by element. Anything
/// else, including pairs of different shapes, goes to the scalar comparator.
///
/// Each top-level call owns a [`Ledger`] of record pairs already entered.
/// Meeting a pair a second time orders it by [`Identity`] instead of
/// descending again, which guarantees termination on cyclic graphs.
#[derive(Debug, Clone, Default)]
pub struct DeepComparator<S = ScalarComparator> {
    scalar: S,
    config: CompareConfig,
}

impl DeepComparator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Comparator> DeepComparator<S> {
    /// Creates a comparator that hands leaves to `scalar`.
    pub fn with_scalar(scalar: S) -> Self {
        DeepComparator {
            scalar,
            config: CompareConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompareConfig) -> Self {
        self.config = config;
        self
    }

    /// Shorthand for enabling `relax_type_comparison`.
    pub fn relaxed(mut self) -> Self {
        self.config.relax_type_comparison = true;
        self
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn scalar(&self) -> &S {
        &self.scalar
    }

    /// Compares a pair as part of an ongoing comparison.
    pub fn compare_within(
        &self,
        lhs: &Value,
        rhs: &Value,
        ledger: &mut Ledger,
    ) -> Result<Ordering, CompareError> {
        match (lhs, rhs) {
            (Value::Sequence(left), Value::Sequence(right)) => {
                lockstep(left.iter(), right.iter(), |l, r| self.compare_nested(l, r, ledger))
            }
            (Value::Map(left), Value::Map(right)) => {
                lockstep(left.iter(), right.iter(), |(lk, lv), (rk, rv)| {
                    match self.compare_nested(lk, rk, ledger)? {
                        Ordering::Equal => self.compare_nested(lv, rv, ledger),
                        ordering => Ok(ordering),
                    }
                })
            }
            (Value::Record(left), Value::Record(right)) => self.compare_records(left, right, ledger),
            _ => self.scalar.compare(lhs, rhs),
        }
    }

    fn compare_nested(
        &self,
        lhs: &Value,
        rhs: &Value,
        ledger: &mut Ledger,
    ) -> Result<Ordering, CompareError> {
        if self.config.resolve_nested {
            if let Some(ordering) = capability::resolve(lhs, rhs, ProviderCache::global())? {
                return Ok(ordering);
            }
        }
        self.compare_within(lhs, rhs, ledger)
    }

    fn compare_records(
        &self,
        lhs: &RecordRef,
        rhs: &RecordRef,
        ledger: &mut Ledger,
    ) -> Result<Ordering, CompareError> {
        let (left_id, right_id) = (Identity::of(lhs), Identity::of(rhs));
        if left_id == right_id {
            return Ok(Ordering::Equal);
        }

        if !ledger.enter(left_id, right_id) {
            debug!(
                "cycle between {} and {}, ordering by identity",
                lhs.type_name(),
                rhs.type_name()
            );
            return Ok(left_id.cmp(&right_id));
        }

        if !self.config.relax_type_comparison {
            let ordering = lhs.type_name().cmp(rhs.type_name());
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }

        let (left_fields, right_fields) = (lhs.fields(), rhs.fields());
        lockstep(
            left_fields.iter(),
            right_fields.iter(),
            |(left_name, left_value), (right_name, right_value)| match left_name.cmp(right_name) {
                Ordering::Equal => self.compare_nested(left_value, right_value, ledger),
                ordering => Ok(ordering),
            },
        )
    }
}

impl<S: Comparator> Comparator for DeepComparator<S> {
    fn compare(&self, lhs: &Value, rhs: &Value) -> Result<Ordering, CompareError> {
        let mut ledger = Ledger::new();
        self.compare_within(lhs, rhs, &mut ledger)
    }
}

/// Walks two sequences by position. The first unequal pair decides; a strict
/// prefix sorts before its extension.
fn lockstep<I, J, F>(mut left: I, mut right: J, mut compare: F) -> Result<Ordering, CompareError>
where
    I: Iterator,
    J: Iterator,
    F: FnMut(I::Item, J::Item) -> Result<Ordering, CompareError>,
{
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ok(Ordering::Equal),
            (None, Some(_)) => return Ok(Ordering::Less),
            (Some(_), None) => return Ok(Ordering::Greater),
            (Some(l), Some(r)) => match compare(l, r)? {
                Ordering::Equal => {}
                ordering => return Ok(ordering),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DynamicRecord, FieldList, Record};
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::{Arc, OnceLock};

    fn ints(values: &[i64]) -> Value {
        Value::Sequence(values.iter().copied().map(Value::Int).collect())
    }

    fn cmp(lhs: &Value, rhs: &Value) -> Ordering {
        DeepComparator::new().compare(lhs, rhs).unwrap()
    }

    /// Scalar comparator that counts its invocations.
    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl Comparator for Counting {
        fn compare(&self, lhs: &Value, rhs: &Value) -> Result<Ordering, CompareError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            ScalarComparator.compare(lhs, rhs)
        }
    }

    /// A node whose `next` slot is bound after construction.
    struct Node {
        next: OnceLock<Value>,
    }

    impl Node {
        fn looped() -> RecordRef {
            let node = Arc::new(Node {
                next: OnceLock::new(),
            });
            let _ = node.next.set(Value::Record(node.clone()));
            node
        }
    }

    impl Record for Node {
        fn type_name(&self) -> &str {
            "Node"
        }

        fn fields(&self) -> FieldList {
            let mut fields = FieldList::new();
            fields.push("next", self.next.get().cloned().unwrap_or(Value::Null));
            fields
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(cmp(&ints(&[1, 2]), &ints(&[1, 2, 3])), Ordering::Less);
        assert_eq!(cmp(&ints(&[1, 2, 3]), &ints(&[1, 2])), Ordering::Greater);
        assert_eq!(cmp(&ints(&[1, 2]), &ints(&[1, 2])), Ordering::Equal);
        assert_eq!(cmp(&ints(&[]), &ints(&[])), Ordering::Equal);
    }

    #[test]
    fn first_difference_beats_length() {
        assert_eq!(cmp(&ints(&[1, 2, 3]), &ints(&[1, 3])), Ordering::Less);
        assert_eq!(cmp(&ints(&[1, 3]), &ints(&[1, 2, 3])), Ordering::Greater);
    }

    #[test]
    fn map_keys_compare_by_position() {
        let a = Value::map([("a", 1i64)]);
        let b = Value::map([("b", 1i64)]);
        assert_eq!(cmp(&a, &b), Ordering::Less);
        assert_eq!(cmp(&b, &a), Ordering::Greater);

        let ab = Value::map([("a", 1i64), ("b", 2i64)]);
        let ba = Value::map([("b", 2i64), ("a", 1i64)]);
        assert_eq!(cmp(&ab, &ba), Ordering::Less);
    }

    #[test]
    fn map_values_break_key_ties() {
        let one = Value::map([("a", 1i64)]);
        let two = Value::map([("a", 2i64)]);
        assert_eq!(cmp(&one, &two), Ordering::Less);
    }

    #[test]
    fn mixed_shapes_go_to_scalar_ranking() {
        assert_eq!(cmp(&ints(&[1]), &Value::map([("a", 1i64)])), Ordering::Less);
        assert_eq!(cmp(&Value::Int(5), &ints(&[1])), Ordering::Less);
    }

    #[test]
    fn same_instance_skips_everything() {
        let counting = DeepComparator::with_scalar(Counting::default());
        let record: RecordRef = Arc::new(DynamicRecord::new("Point").with_field("x", 1i64));
        let value = Value::Record(record);

        assert_eq!(counting.compare(&value, &value).unwrap(), Ordering::Equal);
        assert_eq!(counting.scalar().calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn self_loops_terminate() {
        let x = Node::looped();
        let y = Node::looped();
        let (vx, vy) = (Value::Record(x.clone()), Value::Record(y.clone()));

        let forward = cmp(&vx, &vy);
        let backward = cmp(&vy, &vx);

        assert_ne!(forward, Ordering::Equal);
        assert_eq!(forward, backward.reverse());
        assert_eq!(forward, Identity::of(&x).cmp(&Identity::of(&y)));
    }

    #[test]
    fn strict_mode_orders_by_type_name() {
        let a = Value::record(DynamicRecord::new("Alpha").with_field("x", 2i64));
        let b = Value::record(DynamicRecord::new("Beta").with_field("x", 1i64));

        assert_eq!(cmp(&a, &b), Ordering::Less);

        let relaxed = DeepComparator::new().relaxed();
        assert_eq!(relaxed.compare(&a, &b).unwrap(), Ordering::Greater);
    }

    #[test]
    fn relaxed_mode_can_find_equality() {
        let a = Value::record(DynamicRecord::new("Alpha").with_field("x", 1i64));
        let b = Value::record(DynamicRecord::new("Beta").with_field("x", 1i64));

        let relaxed = DeepComparator::new().relaxed();
        assert_eq!(relaxed.compare(&a, &b).unwrap(), Ordering::Equal);
    }

    #[test]
    fn field_names_compare_before_values() {
        let a = Value::record(DynamicRecord::new("R").with_field("a", 9i64));
        let b = Value::record(DynamicRecord::new("R").with_field("b", 0i64));
        assert_eq!(cmp(&a, &b), Ordering::Less);
    }

    #[test]
    fn scalar_errors_propagate() {
        struct Refusing;

        impl Comparator for Refusing {
            fn compare(&self, _: &Value, _: &Value) -> Result<Ordering, CompareError> {
                Err(CompareError::custom("refused"))
            }
        }

        let deep = DeepComparator::with_scalar(Refusing);
        let err = deep.compare(&ints(&[1]), &ints(&[2])).unwrap_err();
        assert_eq!(err.to_string(), "refused");
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: CompareConfig = toml::from_str("relax_type_comparison = true").unwrap();
        assert!(config.relax_type_comparison);
        assert!(config.resolve_nested);
    }
}
