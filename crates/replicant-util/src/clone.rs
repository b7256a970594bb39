use serde_json::{Map, Value};

/// Creates a deep structural copy of a JSON value.
///
/// Every nested sequence and mapping is rebuilt, so the result shares no
/// structure with the input.
pub fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => Value::Number(n.clone()),
        Value::String(s) => Value::String(s.clone()),
        Value::Array(items) => Value::Array(items.iter().map(deep_clone).collect()),
        Value::Object(fields) => {
            let mut out = Map::new();
            for (key, val) in fields {
                out.insert(key.clone(), deep_clone(val));
            }
            Value::Object(out)
        }
    }
}
