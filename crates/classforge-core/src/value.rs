//! Dynamic runtime values.
//!
//! [`Value`] is the single currency of the engine: attribute slots, defaults,
//! method arguments, and interceptor payloads all carry it. Constructor
//! keyword arguments travel through the `__init__` pipeline as one ordered
//! [`Value::Map`].

use crate::instance::Instance;
use crate::type_hash::{TypeHash, primitives};

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null value.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// String.
    Str(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Ordered name → value pairs (insertion order preserved).
    Map(Vec<(String, Value)>),
    /// An instance of a synthesized class. Compares by identity.
    Object(Instance),
}

impl Value {
    /// Check for the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64, if this is an int.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as f64. Ints widen losslessly enough for accessor arithmetic.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get as a string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the list elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the map pairs, if this is a map.
    pub fn as_map(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Get the instance, if this is an object.
    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Human-readable type name, used in constraint error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Object(instance) => instance.class_name().to_string(),
        }
    }

    /// The type identity of this value, if it has one (`Null` does not).
    pub fn type_hash(&self) -> Option<TypeHash> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(primitives::BOOL),
            Value::Int(_) => Some(primitives::INT),
            Value::Float(_) => Some(primitives::FLOAT),
            Value::Str(_) => Some(primitives::STR),
            Value::List(_) => Some(primitives::LIST),
            Value::Map(_) => Some(primitives::MAP),
            Value::Object(instance) => Some(instance.class_hash()),
        }
    }
}

/// Check whether a value satisfies a resolved type constraint.
///
/// Primitive kinds match exactly. Objects match their own class or any
/// ancestor on the `extends` chain; interfaces do not satisfy constraints
/// (they only contribute contracts and `implements` queries).
pub fn value_conforms(value: &Value, target: TypeHash) -> bool {
    match value {
        Value::Null => false,
        Value::Object(instance) => instance.is_instance_of(target),
        other => other.type_hash() == Some(target),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<(String, Value)>> for Value {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Value::Map(pairs)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Object(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_round_trip() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(7).as_int(), Some(7));
        assert_eq!(Value::from(2.5).as_float(), Some(2.5));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
    }

    #[test]
    fn int_widens_to_float() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Float(3.0).as_int(), None);
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::Str("x".into()).type_name(), "str");
        assert_eq!(Value::List(vec![]).type_name(), "list");
    }

    #[test]
    fn type_hashes_match_primitives() {
        assert_eq!(Value::Bool(true).type_hash(), Some(primitives::BOOL));
        assert_eq!(Value::Int(1).type_hash(), Some(primitives::INT));
        assert_eq!(Value::Null.type_hash(), None);
    }

    #[test]
    fn map_preserves_order() {
        let map = Value::Map(vec![
            ("b".to_string(), Value::Int(2)),
            ("a".to_string(), Value::Int(1)),
        ]);
        let pairs = map.as_map().unwrap();
        assert_eq!(pairs[0].0, "b");
        assert_eq!(pairs[1].0, "a");
    }
}
