//! Structural JSON equality for rule documents
//!
//! Security-group rules come back from the platform with keys and array
//! elements in whatever order the server chose. Two documents are equal here
//! when objects have the same keys with equal values, arrays hold the same
//! elements (as a multiset, by default) and scalars are equal. Numbers
//! compare by value, so `80` equals `80.0`.

use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;

/// How arrays are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrayMode {
    /// Same elements, any order, same multiplicities
    #[default]
    Unordered,
    /// Same elements in the same order
    Ordered,
    /// Every left element matches a distinct right element
    Subset,
}

/// Comparison options
///
/// `fields` overrides the array mode for arrays stored under a given object
/// key, at any depth.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    pub arrays: ArrayMode,
    pub fields: HashMap<String, ArrayMode>,
}

impl MatchOptions {
    /// Override the array mode for one field
    pub fn field(mut self, key: impl Into<String>, mode: ArrayMode) -> Self {
        self.fields.insert(key.into(), mode);
        self
    }

    fn mode_for(&self, key: Option<&str>) -> ArrayMode {
        key.and_then(|k| self.fields.get(k).copied())
            .unwrap_or(self.arrays)
    }
}

/// Parse two JSON documents and compare them with default options
pub fn structurally_equal(left: &str, right: &str) -> Result<bool> {
    let left: Value = serde_json::from_str(left)?;
    let right: Value = serde_json::from_str(right)?;
    Ok(values_equal(&left, &right, &MatchOptions::default()))
}

/// Compare two parsed JSON values
pub fn values_equal(left: &Value, right: &Value, opts: &MatchOptions) -> bool {
    equal_at(left, right, opts, None)
}

#[allow(clippy::float_cmp)]
fn equal_at(left: &Value, right: &Value, opts: &MatchOptions, key: Option<&str>) -> bool {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter().all(|(k, lv)| {
                    r.get(k)
                        .is_some_and(|rv| equal_at(lv, rv, opts, Some(k.as_str())))
                })
        }
        (Value::Array(l), Value::Array(r)) => match opts.mode_for(key) {
            ArrayMode::Ordered => {
                l.len() == r.len() && l.iter().zip(r).all(|(a, b)| equal_at(a, b, opts, None))
            }
            ArrayMode::Unordered => l.len() == r.len() && matches_all(l, r, opts),
            ArrayMode::Subset => l.len() <= r.len() && matches_all(l, r, opts),
        },
        (Value::Number(l), Value::Number(r)) => {
            l == r || matches!((l.as_f64(), r.as_f64()), (Some(a), Some(b)) if a == b)
        }
        _ => left == right,
    }
}

/// Pair every left element with a distinct right element
///
/// Element equality is not symmetric once a subset mode is involved, so a
/// first-fit pass can miss a valid pairing. This finds a maximum bipartite
/// matching with augmenting paths instead.
fn matches_all(left: &[Value], right: &[Value], opts: &MatchOptions) -> bool {
    let compatible: Vec<Vec<bool>> = left
        .iter()
        .map(|l| right.iter().map(|r| equal_at(l, r, opts, None)).collect())
        .collect();
    let mut owner: Vec<Option<usize>> = vec![None; right.len()];
    (0..left.len()).all(|l| {
        let mut visited = vec![false; right.len()];
        augment(l, &compatible, &mut owner, &mut visited)
    })
}

/// Try to give left element `l` a right element, re-seating earlier owners
fn augment(
    l: usize,
    compatible: &[Vec<bool>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for r in 0..owner.len() {
        if !compatible[l][r] || visited[r] {
            continue;
        }
        visited[r] = true;
        let free = match owner[r] {
            None => true,
            Some(other) => augment(other, compatible, owner, visited),
        };
        if free {
            owner[r] = Some(l);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_order_insensitive() {
        let a = r#"[{"protocol":"tcp","ports":"80"},{"protocol":"udp","ports":"53"}]"#;
        let b = r#"[{"ports":"53","protocol":"udp"},{"ports":"80","protocol":"tcp"}]"#;
        assert!(structurally_equal(a, b).unwrap());
    }

    #[test]
    fn test_rule_changed_port() {
        let a = r#"[{"protocol":"tcp","ports":"80"}]"#;
        let b = r#"[{"protocol":"tcp","ports":"443"}]"#;
        assert!(!structurally_equal(a, b).unwrap());
    }

    #[test]
    fn test_multiset_multiplicity_matters() {
        let a = json!([1, 1, 2]);
        let b = json!([1, 2, 2]);
        assert!(!values_equal(&a, &b, &MatchOptions::default()));
    }

    #[test]
    fn test_extra_key_is_unequal() {
        let a = json!({"protocol": "all"});
        let b = json!({"protocol": "all", "log": true});
        assert!(!values_equal(&a, &b, &MatchOptions::default()));
        assert!(!values_equal(&b, &a, &MatchOptions::default()));
    }

    #[test]
    fn test_type_mismatch_is_unequal() {
        assert!(!structurally_equal(r#"{"ports":"80"}"#, r#"{"ports":80}"#).unwrap());
        assert!(!structurally_equal("[]", "{}").unwrap());
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(structurally_equal(r#"{"code":80}"#, r#"{"code":80.0}"#).unwrap());
    }

    #[test]
    fn test_ordered_field_override() {
        let opts = MatchOptions::default().field("destinations", ArrayMode::Ordered);
        let a = json!({"destinations": ["10.0.0.1", "10.0.0.2"], "tags": ["a", "b"]});
        let b = json!({"destinations": ["10.0.0.2", "10.0.0.1"], "tags": ["b", "a"]});
        assert!(!values_equal(&a, &b, &opts));
        assert!(values_equal(&a, &b, &MatchOptions::default()));
    }

    #[test]
    fn test_subset_mode() {
        let opts = MatchOptions {
            arrays: ArrayMode::Subset,
            ..MatchOptions::default()
        };
        let small = json!([{"protocol": "tcp"}]);
        let big = json!([{"protocol": "udp"}, {"protocol": "tcp"}]);
        assert!(values_equal(&small, &big, &opts));
        assert!(!values_equal(&big, &small, &opts));
    }

    #[test]
    fn test_subset_pairing_independent_of_order() {
        let opts = MatchOptions {
            arrays: ArrayMode::Subset,
            ..MatchOptions::default()
        };
        let small = json!([[1], [1, 2]]);
        let big = json!([[1, 2], [1]]);
        assert!(values_equal(&small, &big, &opts));
        assert!(values_equal(&json!([[1, 2], [1]]), &json!([[1], [1, 2]]), &opts));
        assert!(!values_equal(&json!([[1, 2], [2]]), &json!([[1, 2], [1]]), &opts));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(structurally_equal("[", "[]").is_err());
    }
}
