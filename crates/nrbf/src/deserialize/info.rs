//! Named-value view of a class record's members.

use crate::deserialize::graph::Value;

/// Member values of one class record, by name, in record order.
///
/// Population contracts and surrogates read from this view. Values that
/// arrive through fixups after population are written here first, so later
/// reads observe them.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    type_name: String,
    names: Vec<String>,
    values: Vec<Value>,
}

impl MemberInfo {
    /// Creates a view with every member null.
    pub fn new(type_name: impl Into<String>, names: Vec<String>) -> Self {
        let values = vec![Value::Null; names.len()];
        Self {
            type_name: type_name.into(),
            names,
            values,
        }
    }

    /// Returns the class name of the record.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns a member value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index_of(name).and_then(|i| self.values.get(i))
    }

    pub fn get_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the name of the member at `index`.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Replaces a member value by name. Returns false if there is no such member.
    pub fn update_value(&mut self, name: &str, value: Value) -> bool {
        match self.index_of(name) {
            Some(i) => self.set_at(i, value),
            None => false,
        }
    }

    /// Replaces the member value at `index`. Returns false if out of range.
    pub fn set_at(&mut self, index: usize, value: Value) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Iterates over (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PrimitiveValue;

    #[test]
    fn test_update_by_name() {
        let mut info = MemberInfo::new("Pair", vec!["X".to_string(), "Y".to_string()]);
        assert!(info.get("X").is_some_and(Value::is_null));
        assert!(info.update_value("Y", Value::Primitive(PrimitiveValue::Int32(7))));
        assert!(!info.update_value("Z", Value::Null));
        assert_eq!(info.get("Y").and_then(Value::as_i32), Some(7));
        assert_eq!(info.name_at(1), Some("Y"));
        assert!(!info.set_at(2, Value::Null));
    }
}
