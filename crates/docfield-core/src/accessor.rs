// Nested read/write primitives over serde_json::Value, addressed by a list of
// object keys.
// - Reads return Ok(None) when any key is missing or an intermediate value is
//   not an object; Err only when the terminal value has the wrong shape.
// - List reads hand back owned copies; write them back with the setters.
// - Setters create missing intermediate objects and fail on non-object parents.
use serde_json::{Map, Value};
use thiserror::Error;

use crate::path::display_keys;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("{path}: expected {expected}, found {actual}")]
    WrongShape {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{path}: cannot descend into {actual}, expected an object")]
    NotAnObject { path: String, actual: &'static str },
}

pub fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn nested<'a>(root: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for k in keys {
        cur = cur.as_object()?.get(*k)?;
    }
    Some(cur)
}

fn wrong_shape(keys: &[&str], expected: &'static str, found: &Value) -> AccessError {
    AccessError::WrongShape {
        path: display_keys(keys),
        expected,
        actual: kind_name(found),
    }
}

pub fn nested_string(root: &Value, keys: &[&str]) -> Result<Option<String>, AccessError> {
    match nested(root, keys) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_shape(keys, "string", other)),
    }
}

pub fn nested_string_list(root: &Value, keys: &[&str]) -> Result<Option<Vec<String>>, AccessError> {
    let Some(node) = nested(root, keys) else { return Ok(None) };
    let arr = node.as_array().ok_or_else(|| wrong_shape(keys, "array", node))?;
    arr.iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.clone()),
            other => Err(wrong_shape(keys, "array of strings", other)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub fn nested_list(root: &Value, keys: &[&str]) -> Result<Option<Vec<Value>>, AccessError> {
    match nested(root, keys) {
        None => Ok(None),
        Some(Value::Array(arr)) => Ok(Some(arr.clone())),
        Some(other) => Err(wrong_shape(keys, "array", other)),
    }
}

fn set_nested(root: &mut Value, keys: &[&str], value: Value) -> Result<(), AccessError> {
    let Some((last, parents)) = keys.split_last() else {
        *root = value;
        return Ok(());
    };
    let mut cur = root;
    for (depth, k) in parents.iter().enumerate() {
        let obj = as_object_mut(cur, &keys[..depth])?;
        cur = obj
            .entry((*k).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    let obj = as_object_mut(cur, parents)?;
    obj.insert((*last).to_string(), value);
    Ok(())
}

fn as_object_mut<'a>(v: &'a mut Value, at: &[&str]) -> Result<&'a mut Map<String, Value>, AccessError> {
    let actual = kind_name(v);
    v.as_object_mut().ok_or_else(|| AccessError::NotAnObject {
        path: display_keys(at),
        actual,
    })
}

pub fn set_nested_string(root: &mut Value, keys: &[&str], value: String) -> Result<(), AccessError> {
    set_nested(root, keys, Value::String(value))
}

pub fn set_nested_string_list(root: &mut Value, keys: &[&str], values: Vec<String>) -> Result<(), AccessError> {
    set_nested(root, keys, Value::Array(values.into_iter().map(Value::String).collect()))
}

pub fn set_nested_list(root: &mut Value, keys: &[&str], values: Vec<Value>) -> Result<(), AccessError> {
    set_nested(root, keys, Value::Array(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_distinguish_absence_from_shape() {
        let doc = json!({"a": {"s": "x", "n": 1, "l": ["p", "q"], "m": ["p", 2]}, "flat": "str"});
        assert_eq!(nested_string(&doc, &["a", "s"]).unwrap(), Some("x".into()));
        assert_eq!(nested_string(&doc, &["a", "missing"]).unwrap(), None);
        // intermediate that is not an object reads as absent
        assert_eq!(nested_string(&doc, &["flat", "x"]).unwrap(), None);
        assert!(matches!(
            nested_string(&doc, &["a", "n"]),
            Err(AccessError::WrongShape { actual: "number", .. })
        ));
        assert_eq!(
            nested_string_list(&doc, &["a", "l"]).unwrap(),
            Some(vec!["p".to_string(), "q".to_string()])
        );
        assert!(nested_string_list(&doc, &["a", "m"]).is_err());
        assert!(nested_list(&doc, &["a", "s"]).is_err());
    }

    #[test]
    fn set_creates_missing_parents_and_rejects_scalars() {
        let mut doc = json!({"a": "scalar"});
        set_nested_string(&mut doc, &["b", "c"], "v".into()).unwrap();
        assert_eq!(doc, json!({"a": "scalar", "b": {"c": "v"}}));
        let err = set_nested_string(&mut doc, &["a", "c"], "v".into()).unwrap_err();
        assert_eq!(
            err,
            AccessError::NotAnObject {
                path: "a".into(),
                actual: "string"
            }
        );
    }
}
