//! Dynamic config values and command-line literal parsing.

use std::collections::BTreeMap;
use std::fmt;

/// A dynamically-typed configuration value.
///
/// Mappings are key-ordered (`BTreeMap`) so that iteration and
/// serialization are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short human-readable name of this value's type, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn empty_map() -> Value {
        Value::Map(BTreeMap::new())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Follows a dot-path into nested mappings.
    pub fn get_path(&self, segments: &[&str]) -> Option<&Value> {
        let mut current = self;
        for segment in segments {
            current = current.as_map()?.get(*segment)?;
        }
        Some(current)
    }

    /// Sets `value` at a dot-path, creating intermediate mappings as needed.
    ///
    /// An existing value at the full path is replaced. An existing non-map
    /// value at an intermediate segment is replaced by a fresh mapping so
    /// the deeper path can be created; sibling keys are never disturbed.
    pub fn set_path(&mut self, segments: &[&str], value: Value) {
        debug_assert!(!segments.is_empty());
        if !matches!(self, Value::Map(_)) {
            *self = Value::empty_map();
        }
        let Value::Map(map) = self else { unreachable!() };
        if segments.len() == 1 {
            map.insert(segments[0].to_string(), value);
            return;
        }
        let child = map
            .entry(segments[0].to_string())
            .or_insert_with(Value::empty_map);
        child.set_path(&segments[1..], value);
    }

    /// Deep-merges `overlay` onto `self`. Mappings merge recursively with
    /// overlay keys winning; every other pairing is replaced by the overlay.
    pub fn deep_merge(self, overlay: Value) -> Value {
        match (self, overlay) {
            (Value::Map(mut base), Value::Map(overlay)) => {
                for (key, overlay_val) in overlay {
                    let merged = match base.remove(&key) {
                        Some(base_val) => base_val.deep_merge(overlay_val),
                        None => overlay_val,
                    };
                    base.insert(key, merged);
                }
                Value::Map(base)
            }
            (_, overlay) => overlay,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, val)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {val}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Parses a command-line literal into a [`Value`].
///
/// Recognizes `null`/`~`, booleans, integers, floats, single- or
/// double-quoted strings (quotes stripped), and `[a,b,c]` lists whose items
/// are parsed recursively. Anything else is a bare string.
pub fn parse_literal(raw: &str) -> Value {
    let s = raw.trim();
    match s {
        "" | "null" | "~" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(x) = s.parse::<f64>() {
        return Value::Float(x);
    }
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        return Value::Str(s[1..s.len() - 1].to_string());
    }
    if s.starts_with('[') && s.ends_with(']') {
        let inner = &s[1..s.len() - 1];
        if inner.trim().is_empty() {
            return Value::List(Vec::new());
        }
        return Value::List(split_list_items(inner).into_iter().map(parse_literal).collect());
    }
    Value::Str(s.to_string())
}

/// Splits a bracketed list body on commas that are not nested inside
/// brackets or quotes.
fn split_list_items(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (i, ch) in inner.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    items.push(&inner[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    items.push(&inner[start..]);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, Value)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_parse_literal_scalars() {
        assert_eq!(parse_literal("null"), Value::Null);
        assert_eq!(parse_literal("~"), Value::Null);
        assert_eq!(parse_literal("true"), Value::Bool(true));
        assert_eq!(parse_literal("false"), Value::Bool(false));
        assert_eq!(parse_literal("42"), Value::Int(42));
        assert_eq!(parse_literal("-7"), Value::Int(-7));
        assert_eq!(parse_literal("3.14"), Value::Float(3.14));
        assert_eq!(parse_literal("hello"), Value::Str("hello".into()));
    }

    #[test]
    fn test_parse_literal_quoted_string_keeps_content_verbatim() {
        assert_eq!(parse_literal("\"42\""), Value::Str("42".into()));
        assert_eq!(parse_literal("'true'"), Value::Str("true".into()));
    }

    #[test]
    fn test_parse_literal_list() {
        assert_eq!(
            parse_literal("[1,2,3]"),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(parse_literal("[]"), Value::List(Vec::new()));
        assert_eq!(
            parse_literal("[a, [1,2], 'x,y']"),
            Value::List(vec![
                Value::Str("a".into()),
                Value::List(vec![Value::Int(1), Value::Int(2)]),
                Value::Str("x,y".into()),
            ])
        );
    }

    #[test]
    fn test_get_path() {
        let v = map(&[("a", map(&[("b", Value::Int(3))]))]);
        assert_eq!(v.get_path(&["a", "b"]), Some(&Value::Int(3)));
        assert_eq!(v.get_path(&["a", "missing"]), None);
        assert_eq!(v.get_path(&["a", "b", "c"]), None);
    }

    #[test]
    fn test_set_path_replaces_existing() {
        let mut v = map(&[("a", map(&[("b", Value::Int(3))]))]);
        v.set_path(&["a", "b"], Value::Int(4));
        assert_eq!(v, map(&[("a", map(&[("b", Value::Int(4))]))]));
    }

    #[test]
    fn test_set_path_merges_novel_key_without_disturbing_siblings() {
        let mut v = map(&[("a", map(&[("b", Value::Int(3))]))]);
        v.set_path(&["c"], Value::Int(5));
        assert_eq!(
            v,
            map(&[("a", map(&[("b", Value::Int(3))])), ("c", Value::Int(5))])
        );
    }

    #[test]
    fn test_set_path_replaces_scalar_intermediate() {
        let mut v = map(&[("a", Value::Int(1))]);
        v.set_path(&["a", "b"], Value::Int(2));
        assert_eq!(v, map(&[("a", map(&[("b", Value::Int(2))]))]));
    }

    #[test]
    fn test_deep_merge_tables() {
        let base = map(&[("a", map(&[("x", Value::Int(1)), ("y", Value::Int(2))]))]);
        let overlay = map(&[("a", map(&[("y", Value::Int(9))])), ("b", Value::Int(3))]);
        let merged = base.deep_merge(overlay);
        assert_eq!(
            merged,
            map(&[
                ("a", map(&[("x", Value::Int(1)), ("y", Value::Int(9))])),
                ("b", Value::Int(3)),
            ])
        );
    }

    #[test]
    fn test_deep_merge_list_replaces() {
        let base = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let overlay = Value::List(vec![Value::Int(3)]);
        assert_eq!(base.deep_merge(overlay), Value::List(vec![Value::Int(3)]));
    }

    #[test]
    fn test_display() {
        let v = map(&[("a", Value::List(vec![Value::Int(1), Value::Int(2)]))]);
        assert_eq!(v.to_string(), "{a: [1, 2]}");
    }
}
