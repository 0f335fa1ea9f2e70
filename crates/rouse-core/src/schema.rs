//! Declared config schemas and typed coercion.
//!
//! A schema is either an unstructured container (`List`, `Map`) or a
//! strongly-typed fixed field set (`Struct`). Coercion converts raw
//! command-line literals or file-loaded values into the declared field
//! types, reporting a reason string that callers wrap into
//! [`WakeError::TypeValidation`](crate::WakeError::TypeValidation).

use crate::value::{Value, parse_literal};

/// The annotation vocabulary for declared parameters and struct fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Struct(StructSchema),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Str => "str",
            FieldKind::List => "list",
            FieldKind::Map => "map",
            FieldKind::Struct(_) => "struct",
        }
    }

    /// The config schema this annotation denotes, if it is config-legal.
    ///
    /// Only container and struct annotations qualify; scalar annotations
    /// can appear on inline or regular parameters but never on configs.
    pub fn as_config_schema(&self) -> Option<Schema> {
        match self {
            FieldKind::List => Some(Schema::List),
            FieldKind::Map => Some(Schema::Map),
            FieldKind::Struct(schema) => Some(Schema::Struct(schema.clone())),
            _ => None,
        }
    }
}

/// One field of a strongly-typed schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    pub default: Value,
}

/// A strongly-typed schema with a fixed, ordered field set.
#[derive(Debug, Clone, PartialEq)]
pub struct StructSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl StructSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind, default: Value) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            kind,
            default,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The fully-populated default value: a mapping of every field's default.
    pub fn default_value(&self) -> Value {
        Value::Map(
            self.fields
                .iter()
                .map(|f| (f.name.clone(), f.default.clone()))
                .collect(),
        )
    }
}

/// The declared shape of a config: unstructured container or typed struct.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    List,
    Map,
    Struct(StructSchema),
}

impl Schema {
    pub fn name(&self) -> &'static str {
        match self {
            Schema::List => "list",
            Schema::Map => "map",
            Schema::Struct(_) => "struct",
        }
    }

    /// The base value a config of this schema starts from.
    pub fn default_value(&self) -> Value {
        match self {
            Schema::List => Value::List(Vec::new()),
            Schema::Map => Value::empty_map(),
            Schema::Struct(schema) => schema.default_value(),
        }
    }
}

/// Coerces a raw command-line literal into `kind`.
///
/// Container and struct fields cannot be assigned from a single scalar
/// literal (lists use bracket syntax; maps and structs are reached through
/// dot paths).
pub fn coerce_str(raw: &str, kind: &FieldKind) -> Result<Value, String> {
    match kind {
        FieldKind::Bool => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("'{raw}' is not a bool")),
        },
        FieldKind::Int => raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("'{raw}' is not an int")),
        FieldKind::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("'{raw}' is not a float")),
        FieldKind::Str => match parse_literal(raw) {
            Value::Str(s) => Ok(Value::Str(s)),
            // Unquoted scalars are still legal string content.
            _ => Ok(Value::Str(raw.to_string())),
        },
        FieldKind::List => match parse_literal(raw) {
            Value::List(items) => Ok(Value::List(items)),
            _ => Err(format!("'{raw}' is not a list")),
        },
        FieldKind::Map => Err("a map field cannot be assigned from a single literal".into()),
        FieldKind::Struct(_) => {
            Err("a struct field cannot be assigned from a single literal".into())
        }
    }
}

/// Coerces an already-typed value (e.g. loaded from file) into `kind`.
///
/// Integers widen to floats; struct maps are checked field-by-field and an
/// unknown field is an error (file contents are authored against the
/// schema, unlike command-line overrides).
pub fn coerce_value(value: &Value, kind: &FieldKind) -> Result<Value, String> {
    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldKind::Bool, Value::Bool(b)) => Ok(Value::Bool(*b)),
        (FieldKind::Int, Value::Int(i)) => Ok(Value::Int(*i)),
        (FieldKind::Float, Value::Float(x)) => Ok(Value::Float(*x)),
        (FieldKind::Float, Value::Int(i)) => Ok(Value::Float(*i as f64)),
        (FieldKind::Str, Value::Str(s)) => Ok(Value::Str(s.clone())),
        (FieldKind::List, Value::List(items)) => Ok(Value::List(items.clone())),
        (FieldKind::Map, Value::Map(map)) => Ok(Value::Map(map.clone())),
        (FieldKind::Struct(schema), Value::Map(map)) => {
            let mut out = std::collections::BTreeMap::new();
            for (key, val) in map {
                let field = schema
                    .get(key)
                    .ok_or_else(|| format!("unknown field '{key}' for struct '{}'", schema.name))?;
                let coerced = coerce_value(val, &field.kind)
                    .map_err(|reason| format!("field '{key}': {reason}"))?;
                out.insert(key.clone(), coerced);
            }
            Ok(Value::Map(out))
        }
        (kind, value) => Err(format!(
            "expected {}, found {}",
            kind.name(),
            value.kind_name()
        )),
    }
}
