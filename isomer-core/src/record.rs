use indexmap::IndexMap;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::capability::{Comparable, RestrictedComparable, SelfComparable};
use crate::value::Value;

/// A shared record. The `Arc` allocation is the record's identity.
pub type RecordRef = Arc<dyn Record>;

/// A structured value with a fixed, ordered set of named fields.
///
/// Inheritance is expressed by composition: a record may embed its ancestor
/// level and expose it through [`Record::base`]. The ancestor's fields come
/// first in [`Record::fields`], qualified by the ancestor's type name.
///
/// The capability accessors default to `None`. A record opts into custom
/// comparison by returning `Some(self)` from one of them; the accessors are
/// looked up on the record and then along its `base` chain.
///
/// Usually implemented with `#[derive(Record)]`.
pub trait Record: Any + Send + Sync {
    /// Name used to order records of different types.
    fn type_name(&self) -> &str;

    /// All field slots, ancestor levels first.
    fn fields(&self) -> FieldList;

    /// The embedded ancestor level, if any.
    fn base(&self) -> Option<&dyn Record> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_comparable(&self) -> Option<&dyn Comparable> {
        None
    }

    fn as_restricted(&self) -> Option<&dyn RestrictedComparable> {
        None
    }

    /// Whether this level provides a self comparison.
    ///
    /// The answer must depend on the concrete type only: it is memoized per
    /// type.
    fn as_self_comparable(&self) -> Option<&dyn SelfComparable> {
        None
    }
}

/// Iterates a record and its ancestor levels, nearest first.
pub fn levels(record: &dyn Record) -> impl Iterator<Item = &dyn Record> {
    std::iter::successors(Some(record), |level| level.base())
}

/// A field name, qualified by the ancestor level that declares it.
///
/// Fields declared by the record itself carry no level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldName {
    level: Option<Cow<'static, str>>,
    name: Cow<'static, str>,
}

impl FieldName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        FieldName {
            level: None,
            name: name.into(),
        }
    }

    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.level {
            Some(level) => write!(f, "{}::{}", level, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Ordered `(qualified name, value)` list describing a record instance.
#[derive(Debug, Clone, Default)]
pub struct FieldList {
    entries: IndexMap<FieldName, Value>,
}

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field declared by the record itself.
    pub fn push(&mut self, name: impl Into<Cow<'static, str>>, value: Value) {
        self.entries.insert(FieldName::new(name), value);
    }

    /// Appends the fields of an ancestor level.
    ///
    /// Fields the ancestor declares itself are qualified by `level`; fields
    /// it already inherited keep their qualification.
    pub fn inherit(&mut self, level: &str, ancestor: FieldList) {
        for (mut name, value) in ancestor.entries {
            if name.level.is_none() {
                name.level = Some(Cow::Owned(level.to_owned()));
            }
            self.entries.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(field, _)| field.level.is_none() && field.name == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<Cow<'static, str>>> FromIterator<(N, Value)> for FieldList {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        let mut fields = FieldList::new();
        for (name, value) in iter {
            fields.push(name, value);
        }
        fields
    }
}

/// A record whose fields are supplied at runtime.
///
/// All instances with the same type name count as the same record type.
#[derive(Debug, Clone)]
pub struct DynamicRecord {
    type_name: Cow<'static, str>,
    fields: IndexMap<String, Value>,
}

impl DynamicRecord {
    pub fn new(type_name: impl Into<Cow<'static, str>>) -> Self {
        DynamicRecord {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Adds or replaces a field. New fields go last.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }
}

impl Record for DynamicRecord {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn fields(&self) -> FieldList {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Base;

    impl Record for Base {
        fn type_name(&self) -> &str {
            "Base"
        }

        fn fields(&self) -> FieldList {
            [("id", Value::Int(1))].into_iter().collect()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Derived {
        base: Base,
    }

    impl Record for Derived {
        fn type_name(&self) -> &str {
            "Derived"
        }

        fn fields(&self) -> FieldList {
            let mut fields = FieldList::new();
            fields.inherit(self.base.type_name(), self.base.fields());
            fields.push("name", Value::from("d"));
            fields
        }

        fn base(&self) -> Option<&dyn Record> {
            Some(&self.base)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn inherited_fields_come_first_and_qualified() {
        let derived = Derived { base: Base };
        let names: Vec<_> = derived.fields().iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["Base::id", "name"]);
    }

    #[test]
    fn levels_walk_the_base_chain() {
        let derived = Derived { base: Base };
        let names: Vec<_> = levels(&derived).map(|l| l.type_name().to_string()).collect();
        assert_eq!(names, ["Derived", "Base"]);
    }

    #[test]
    fn dynamic_record_keeps_insertion_order() {
        let record = DynamicRecord::new("Point")
            .with_field("y", 2i64)
            .with_field("x", 1i64);
        let names: Vec<_> = record.fields().iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["y", "x"]);
        assert!(matches!(record.fields().get("x"), Some(Value::Int(1))));
    }
}
