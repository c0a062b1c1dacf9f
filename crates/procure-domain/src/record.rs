//! Record module - one extracted row of output fields

use crate::Value;
use indexmap::IndexMap;

/// An ordered mapping of output field name → typed value
///
/// Field order follows insertion order, which in practice is the order the
/// labels appeared in the source document. Absent fields are omitted; there
/// is no null placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the previous value if one was present
    ///
    /// Overwriting keeps the field in its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether a field is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields present
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate field names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Copy every field of `other` into this record (other wins on clash)
    pub fn merge(&mut self, other: &Record) {
        for (k, v) in other.iter() {
            self.fields.insert(k.to_string(), v.clone());
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position_on_overwrite() {
        let mut r = Record::new();
        r.insert("a", 1);
        r.insert("b", 2);
        r.insert("a", 3);

        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(r.get("a"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_merge_other_wins() {
        let mut base = Record::new().with("item_name", "Widget").with("unit", "EA");
        let overlay = Record::new().with("unit", "Box").with("award_price", 10);
        base.merge(&overlay);

        assert_eq!(base.len(), 3);
        assert_eq!(base.get("unit"), Some(&Value::from("Box")));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: key order equals first-insertion order of distinct keys
        #[test]
        fn test_order_is_first_insertion(keys in proptest::collection::vec("[a-e]", 0..20)) {
            let mut record = Record::new();
            let mut expected: Vec<String> = Vec::new();
            for (i, k) in keys.iter().enumerate() {
                record.insert(k.clone(), i as i64);
                if !expected.contains(k) {
                    expected.push(k.clone());
                }
            }

            let actual: Vec<String> = record.keys().map(str::to_string).collect();
            prop_assert_eq!(actual, expected);
        }

        /// Property: the last write to a key is the one that sticks
        #[test]
        fn test_last_write_wins(values in proptest::collection::vec(any::<i64>(), 1..10)) {
            let mut record = Record::new();
            for v in &values {
                record.insert("k", *v);
            }
            prop_assert_eq!(record.get("k"), Some(&Value::Integer(*values.last().unwrap())));
            prop_assert_eq!(record.len(), 1);
        }
    }
}
