//! Command-line override resolution.
//!
//! Leftover command-line tokens are parsed into dict-like (`key=value`) and
//! list-like (bare) overrides, optionally scoped with a config-identifier
//! prefix (`cfg::key=value`). Each override resolves to zero, one, or many
//! target configs, and the matched values merge into a fresh `Override`
//! variant on each target entry.

use rouse_core::{FieldKind, Schema, StructSchema, Value, WakeError, coerce_str, parse_literal};

use crate::entry::{ConfigSet, Variant};

/// Override grammar and matching options.
///
/// The grammar is `[<prefix><prefix_sep>]<key-path><eq><value>` for
/// dict-like tokens and `[<prefix><prefix_sep>]<token>` for list-like ones;
/// the token is split on the FIRST `eq`. Prefixes may be abbreviated to any
/// leading substring of a config identifier.
#[derive(Debug, Clone)]
pub struct Override {
    pub prefix_sep: String,
    pub eq: char,
    pub path_sep: char,
    /// A prefix matching more than one config identifier is an error.
    pub exclusive_prefixed: bool,
    /// An unprefixed override matching more than one config is an error.
    pub exclusive_shared: bool,
    /// The same key path applying twice to one config is an error.
    pub unique: bool,
}

impl Default for Override {
    fn default() -> Self {
        Self {
            prefix_sep: "::".to_string(),
            eq: '=',
            path_sep: '.',
            exclusive_prefixed: true,
            exclusive_shared: false,
            unique: true,
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    raw: String,
    prefix: Option<String>,
    body: Body,
}

#[derive(Debug, Clone)]
enum Body {
    Assign { path: Vec<String>, value: String },
    Item(String),
}

impl Override {
    /// Resolves `tokens` against `configs`, layering an `Override` variant
    /// onto every matched entry. Entries already carrying an override
    /// variant are left untouched, so resolution is idempotent.
    pub fn apply(&self, tokens: &[String], configs: &mut ConfigSet) -> Result<(), WakeError> {
        self.apply_filtered(tokens, configs, None)
    }

    /// Like [`Override::apply`], but only entries named in `only` receive
    /// override variants. Prefix matching and exclusivity checks still see
    /// the whole set.
    pub fn apply_filtered(
        &self,
        tokens: &[String],
        configs: &mut ConfigSet,
        only: Option<&[String]>,
    ) -> Result<(), WakeError> {
        let ids = configs.ids();
        let mut prefixed: Vec<(Token, Vec<String>)> = Vec::new();
        let mut shared: Vec<Token> = Vec::new();

        for raw in tokens {
            let token = self.parse_token(raw)?;
            match &token.prefix {
                Some(prefix) => {
                    let matches: Vec<String> = ids
                        .iter()
                        .filter(|id| id.starts_with(prefix.as_str()))
                        .cloned()
                        .collect();
                    if matches.is_empty() {
                        return Err(WakeError::UnknownConfig {
                            prefix: prefix.clone(),
                            options: ids.clone(),
                        });
                    }
                    if matches.len() > 1 && self.exclusive_prefixed {
                        return Err(WakeError::AmbiguousPrefix {
                            prefix: prefix.clone(),
                            matches,
                        });
                    }
                    prefixed.push((token, matches));
                }
                None => shared.push(token),
            }
        }

        if self.exclusive_shared {
            for token in &shared {
                let matches: Vec<String> = ids
                    .iter()
                    .filter(|id| {
                        configs
                            .get(id)
                            .is_some_and(|e| accepts(e.schema(), &token.body))
                    })
                    .cloned()
                    .collect();
                if matches.len() > 1 {
                    return Err(WakeError::NonExclusiveOverride {
                        token: token.raw.clone(),
                        matches,
                    });
                }
            }
        }

        for id in &ids {
            if let Some(only) = only {
                if !only.iter().any(|o| o == id) {
                    continue;
                }
            }
            let entry = configs.get(id).expect("ids come from the set");
            if entry.has(Variant::Override) {
                tracing::debug!(config = %id, "override variant already present, skipping");
                continue;
            }
            let schema = entry.schema().clone();
            let mut current = entry
                .latest()
                .cloned()
                .unwrap_or_else(|| schema.default_value());

            let mine: Vec<&Token> = prefixed
                .iter()
                .filter(|(_, matches)| matches.iter().any(|m| m == id))
                .map(|(t, _)| t)
                .collect();

            self.check_unique(id, &schema, &mine, &shared)?;

            match &schema {
                Schema::List => {
                    let mut items = Vec::new();
                    for token in &mine {
                        match &token.body {
                            Body::Item(raw) => items.push(parse_literal(raw)),
                            Body::Assign { .. } => {
                                return Err(WakeError::UnacceptedOverride {
                                    config: id.clone(),
                                    token: token.raw.clone(),
                                });
                            }
                        }
                    }
                    for token in &shared {
                        if let Body::Item(raw) = &token.body {
                            items.push(parse_literal(raw));
                        }
                    }
                    // The collected token values replace the sequence
                    // wholesale; there is no element-wise merge.
                    if !items.is_empty() {
                        current = Value::List(items);
                    }
                }
                Schema::Map => {
                    for token in &mine {
                        match &token.body {
                            Body::Assign { path, value } => {
                                let segments: Vec<&str> =
                                    path.iter().map(String::as_str).collect();
                                current.set_path(&segments, parse_literal(value));
                            }
                            Body::Item(_) => {
                                return Err(WakeError::UnacceptedOverride {
                                    config: id.clone(),
                                    token: token.raw.clone(),
                                });
                            }
                        }
                    }
                    for token in &shared {
                        if let Body::Assign { path, value } = &token.body {
                            let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                            current.set_path(&segments, parse_literal(value));
                        }
                    }
                }
                Schema::Struct(struct_schema) => {
                    for token in &mine {
                        match &token.body {
                            Body::Assign { path, value } => {
                                let segments: Vec<&str> =
                                    path.iter().map(String::as_str).collect();
                                apply_struct_path(
                                    id,
                                    &mut current,
                                    struct_schema,
                                    &segments,
                                    value,
                                )?;
                            }
                            Body::Item(_) => {
                                return Err(WakeError::UnacceptedOverride {
                                    config: id.clone(),
                                    token: token.raw.clone(),
                                });
                            }
                        }
                    }
                    for token in &shared {
                        if let Body::Assign { path, value } = &token.body {
                            let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                            apply_struct_path(id, &mut current, struct_schema, &segments, value)?;
                        }
                    }
                }
            }

            tracing::debug!(config = %id, "layered override variant");
            configs
                .get_mut(id)
                .expect("ids come from the set")
                .set(Variant::Override, current);
        }
        Ok(())
    }

    fn parse_token(&self, raw: &str) -> Result<Token, WakeError> {
        let token = match raw.find(self.eq) {
            Some(eq_pos) => {
                let head = &raw[..eq_pos];
                let value = raw[eq_pos + 1..].to_string();
                let (prefix, path_str) = self.split_prefix(raw, head)?;
                if path_str.is_empty() {
                    return Err(WakeError::OverrideSyntax {
                        token: raw.to_string(),
                        reason: "empty key path".to_string(),
                    });
                }
                let path: Vec<String> =
                    path_str.split(self.path_sep).map(str::to_string).collect();
                if path.iter().any(String::is_empty) {
                    return Err(WakeError::OverrideSyntax {
                        token: raw.to_string(),
                        reason: "empty key-path segment".to_string(),
                    });
                }
                Token {
                    raw: raw.to_string(),
                    prefix,
                    body: Body::Assign { path, value },
                }
            }
            None => {
                let (prefix, item) = self.split_prefix(raw, raw)?;
                Token {
                    raw: raw.to_string(),
                    prefix,
                    body: Body::Item(item),
                }
            }
        };
        Ok(token)
    }

    fn split_prefix(&self, raw: &str, head: &str) -> Result<(Option<String>, String), WakeError> {
        let mut parts = head.split(self.prefix_sep.as_str());
        let first = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            (None, _) => Ok((None, first.to_string())),
            (Some(rest), None) => Ok((Some(first.to_string()), rest.to_string())),
            (Some(_), Some(_)) => Err(WakeError::OverrideSyntax {
                token: raw.to_string(),
                reason: format!("too many '{}' separators", self.prefix_sep),
            }),
        }
    }

    fn check_unique(
        &self,
        id: &str,
        schema: &Schema,
        mine: &[&Token],
        shared: &[Token],
    ) -> Result<(), WakeError> {
        if !self.unique || matches!(schema, Schema::List) {
            return Ok(());
        }
        let mut seen: Vec<String> = Vec::new();
        let assigns = mine
            .iter()
            .map(|t| &t.body)
            .chain(shared.iter().map(|t| &t.body));
        for body in assigns {
            if let Body::Assign { path, .. } = body {
                let key = path.join(&self.path_sep.to_string());
                if seen.contains(&key) {
                    tracing::debug!(config = %id, key = %key, "duplicate override key");
                    return Err(WakeError::DuplicateOverride(key));
                }
                seen.push(key);
            }
        }
        Ok(())
    }
}

/// Whether a config schema accepts an override of this shape at all.
/// Dict-like tokens match container and struct schemas (struct: the root
/// segment must name a field); list-like tokens match only sequences.
fn accepts(schema: &Schema, body: &Body) -> bool {
    match (schema, body) {
        (Schema::List, Body::Item(_)) => true,
        (Schema::Map, Body::Assign { .. }) => true,
        (Schema::Struct(s), Body::Assign { path, .. }) => s.get(&path[0]).is_some(),
        _ => false,
    }
}

/// Applies one dict-like override to a struct-typed value.
///
/// Unknown fields (at any struct depth) are silently ignored: the override
/// may be intended for a different config. A value that cannot be coerced
/// to the declared field type raises.
fn apply_struct_path(
    config: &str,
    value: &mut Value,
    schema: &StructSchema,
    path: &[&str],
    raw: &str,
) -> Result<bool, WakeError> {
    let Some(field) = schema.get(path[0]) else {
        return Ok(false);
    };
    if path.len() == 1 {
        let coerced =
            coerce_str(raw, &field.kind).map_err(|_| WakeError::TypeValidation {
                config: config.to_string(),
                field: path[0].to_string(),
                value: raw.to_string(),
                expected: field.kind.name(),
            })?;
        value.set_path(&[path[0]], coerced);
        return Ok(true);
    }
    match &field.kind {
        FieldKind::Struct(nested) => {
            if !matches!(value, Value::Map(_)) {
                *value = Value::empty_map();
            }
            let Value::Map(map) = value else { unreachable!() };
            let sub = map
                .entry(path[0].to_string())
                .or_insert_with(|| field.default.clone());
            apply_struct_path(config, sub, nested, &path[1..], raw)
        }
        FieldKind::Map => {
            if !matches!(value, Value::Map(_)) {
                *value = Value::empty_map();
            }
            let Value::Map(map) = value else { unreachable!() };
            let sub = map
                .entry(path[0].to_string())
                .or_insert_with(Value::empty_map);
            sub.set_path(&path[1..], parse_literal(raw));
            Ok(true)
        }
        _ => Err(WakeError::TypeValidation {
            config: config.to_string(),
            field: path.join("."),
            value: raw.to_string(),
            expected: field.kind.name(),
        }),
    }
}

#[cfg(test)]
#[path = "overrides_tests.rs"]
mod tests;
