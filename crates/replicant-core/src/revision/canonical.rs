//! Deterministic JSON encoding for revision hashing.

use replicant_util::{escape, insertion_sort_by};
use serde_json::{Number, Value};

/// Serializes `value` to a deterministic JSON string.
///
/// Mapping keys are sorted, strings are escaped, and numeric forms are
/// normalized so that numerically-equal values encode identically (a float
/// with a zero fractional part prints as an integer). Two deeply-equal
/// values always produce the same encoding.
pub fn canonical_stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => format!("\"{}\"", escape(s)),
        Value::Array(items) => {
            let mut out = String::from('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&canonical_stringify(item));
            }
            out.push(']');
            out
        }
        Value::Object(fields) => {
            let mut keys: Vec<&str> = fields.keys().map(|k| k.as_str()).collect();
            insertion_sort_by(&mut keys, |a, b| a.cmp(b));
            let mut out = String::from('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push('"');
                out.push_str(&escape(key));
                out.push_str("\":");
                out.push_str(&canonical_stringify(&fields[*key]));
            }
            out.push('}');
            out
        }
    }
}

/// Largest magnitude at which every integer is exactly representable as a
/// double; integral floats beyond it keep their float rendering.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            format!("{}", f as i64)
        }
        Some(f) => format!("{f}"),
        None => n.to_string(),
    }
}
