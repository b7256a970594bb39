use serde_json::Value;

/// Deep structural equality between two JSON values.
///
/// Mappings compare as unordered key→value associations; sequences compare
/// element by element in order. Values of different kinds are never equal
/// (`0 != null`, `1 != true`, `{} != []`).
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, va)| match b.get(key) {
                    Some(vb) => deep_equal(va, vb),
                    None => false,
                })
        }
        _ => false,
    }
}
