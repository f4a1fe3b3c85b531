//! Canonical hashing of meta-skeletons and generated rigs.
//!
//! Values are rendered as canonical JSON (sorted object keys, no whitespace,
//! shortest round-trip numbers) and hashed with BLAKE3:
//!
//! ```text
//! hash = hex(BLAKE3(canonical_json(value)))
//! ```

use std::fmt::Write;

use serde::Serialize;
use serde_json::Value;

use crate::error::SpecError;
use crate::metarig::Metarig;

/// BLAKE3 hash of a meta-skeleton, 64 lowercase hex characters.
pub fn metarig_hash(metarig: &Metarig) -> Result<String, SpecError> {
    canonical_hash(metarig)
}

/// BLAKE3 hash of any serializable value's canonical JSON.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, SpecError> {
    let value = serde_json::to_value(value)?;
    Ok(canonical_value_hash(&value))
}

/// BLAKE3 hash of a JSON value's canonical form.
pub fn canonical_value_hash(value: &Value) -> String {
    blake3::hash(canonical_json(value).as_bytes())
        .to_hex()
        .to_string()
}

/// Canonical JSON rendering of `value`.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_number(out: &mut String, n: &serde_json::Number) {
    if let Some(i) = n.as_i64() {
        let _ = write!(out, "{}", i);
    } else if let Some(u) = n.as_u64() {
        let _ = write!(out, "{}", u);
    } else {
        match n.as_f64() {
            Some(f) if f.is_finite() => {
                if f == 0.0 {
                    // Negative zero and zero hash alike.
                    out.push('0');
                } else if f.fract() == 0.0 && f.abs() < 1e15 {
                    let _ = write!(out, "{}", f as i64);
                } else {
                    let _ = write!(out, "{}", f);
                }
            }
            _ => out.push_str("null"),
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::Bone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_keys() {
        let value = json!({"tail": [0, 0, 1.5], "head": [0, 0, 0], "name": "Bone"});
        assert_eq!(
            canonical_json(&value),
            r#"{"head":[0,0,0],"name":"Bone","tail":[0,0,1.5]}"#
        );
    }

    #[test]
    fn test_canonical_json_numbers_and_escapes() {
        let value = json!({"a": 2.0, "b": -0.0, "c": 0.25, "d": "tab\there"});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":2,"b":0,"c":0.25,"d":"tab\there"}"#
        );
    }

    #[test]
    fn test_hash_is_stable_and_sensitive() {
        let a = Metarig::new("m").with_bone(Bone::new("Bone", [0.0; 3], [0.0, 0.0, 1.0]));
        let b = a.clone();
        let mut c = a.clone();
        c.bones[0].roll = 0.1;

        let ha = metarig_hash(&a).unwrap();
        assert_eq!(ha.len(), 64);
        assert_eq!(ha, metarig_hash(&b).unwrap());
        assert_ne!(ha, metarig_hash(&c).unwrap());
    }
}
