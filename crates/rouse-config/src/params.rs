//! Parameter classification and the call-argument collapse.
//!
//! Commands describe their parameters with an explicit
//! [`ParamSpec`] list (name, kind tag, optional annotation, optional
//! default) built once at declaration time. The classifier turns that list
//! into a [`ParamSet`]: every parameter gets a [`ParamKind`], config-like
//! parameters become [`ConfigEntry`]s, and inline parameters aggregate into
//! one synthetic struct-typed config that shares the override and
//! validation machinery without being serializable.

use std::collections::BTreeMap;

use rouse_core::{FieldKind, Schema, StructSchema, Value, WakeError, coerce_value};

use crate::entry::{ConfigEntry, ConfigSet};

/// How a parameter is declared in the command's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDecl {
    Named,
    VarPositional,
    VarKeyword,
}

/// One entry of a command's explicit parameter-description list.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub decl: ParamDecl,
    pub annotation: Option<FieldKind>,
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A parameter annotated as an unstructured sequence config.
    pub fn list(name: impl Into<String>) -> Self {
        Self::annotated(name, FieldKind::List, None)
    }

    /// A parameter annotated as an unstructured mapping config.
    pub fn map(name: impl Into<String>) -> Self {
        Self::annotated(name, FieldKind::Map, None)
    }

    /// A parameter annotated with a strongly-typed schema.
    pub fn structured(name: impl Into<String>, schema: StructSchema) -> Self {
        Self::annotated(name, FieldKind::Struct(schema), None)
    }

    /// A plain parameter with no annotation.
    pub fn regular(name: impl Into<String>, default: Option<Value>) -> Self {
        Self {
            name: name.into(),
            decl: ParamDecl::Named,
            annotation: None,
            default,
        }
    }

    /// A named parameter with an explicit annotation and optional default.
    pub fn annotated(
        name: impl Into<String>,
        annotation: FieldKind,
        default: Option<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            decl: ParamDecl::Named,
            annotation: Some(annotation),
            default,
        }
    }

    /// The variadic positional parameter.
    pub fn var_args(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decl: ParamDecl::VarPositional,
            annotation: None,
            default: None,
        }
    }

    /// The variadic keyword parameter.
    pub fn var_kwargs(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decl: ParamDecl::VarKeyword,
            annotation: None,
            default: None,
        }
    }
}

/// Marks a parameter as an inline one-off config field, optionally carrying
/// a default factory (mutually exclusive with a signature-level default).
#[derive(Debug, Clone)]
pub struct InlineParam {
    pub name: String,
    pub factory: Option<fn() -> Value>,
}

impl InlineParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            factory: None,
        }
    }

    pub fn with_factory(name: impl Into<String>, factory: fn() -> Value) -> Self {
        Self {
            name: name.into(),
            factory: Some(factory),
        }
    }
}

/// Options steering signature classification.
#[derive(Debug, Clone)]
pub struct SignatureOptions {
    /// Treat the variadic positional parameter (if any) as a list config.
    pub args_as_config: bool,
    /// Treat the variadic keyword parameter (if any) as a map config.
    pub kwargs_as_config: bool,
    /// Identifier of the synthetic inline config; reserved case-insensitively.
    pub inline_identifier: String,
    pub inline: Vec<InlineParam>,
    /// Extra configs not present in the signature. They share the override
    /// and persistence machinery but are never passed to the command.
    pub supplemental: Vec<(String, Schema)>,
}

impl Default for SignatureOptions {
    fn default() -> Self {
        Self {
            args_as_config: true,
            kwargs_as_config: true,
            inline_identifier: "inline".to_string(),
            inline: Vec::new(),
            supplemental: Vec::new(),
        }
    }
}

/// Classification of one parameter. Derived once; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Config(Schema),
    InlineConfig { kind: FieldKind, default: Value },
    Regular(Option<Value>),
    VariadicPositionalConfig,
    VariadicKeywordConfig,
}

/// Policy for a variadic-keyword override key that collides with a
/// declared parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverridePolicy {
    /// Raise [`WakeError::ParameterCollision`].
    #[default]
    Raise,
    /// The variadic value silently wins.
    Override,
    /// Like `Override`, logging the replacement at warn level.
    VerboseOverride,
    /// The declared parameter silently wins.
    Skip,
    /// Like `Skip`, logging the skipped value at warn level.
    VerboseSkip,
}

/// The fully-resolved arguments for instantiating a command.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    /// Declared parameters in signature order.
    pub named: Vec<(String, Value)>,
    /// Payload of the variadic positional parameter.
    pub args: Vec<Value>,
    /// Payload of the variadic keyword parameter, collisions resolved.
    pub kwargs: BTreeMap<String, Value>,
}

impl CallArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .or_else(|| self.kwargs.get(name))
    }
}

/// The classified parameters of one command.
#[derive(Debug, Clone)]
pub struct ParamSet {
    kinds: Vec<(String, ParamKind)>,
    configs: ConfigSet,
    inline_id: String,
    has_inline: bool,
    args_id: Option<String>,
    kwargs_id: Option<String>,
}

impl ParamSet {
    /// Classifies an explicit parameter list. Pure; fails fast at
    /// declaration time.
    pub fn classify(params: &[ParamSpec], options: &SignatureOptions) -> Result<Self, WakeError> {
        let inline_id = options.inline_identifier.to_lowercase();
        check_inline_duplicates(&options.inline)?;

        let mut set = ParamSet {
            kinds: Vec::new(),
            configs: ConfigSet::new(),
            inline_id: inline_id.clone(),
            has_inline: false,
            args_id: None,
            kwargs_id: None,
        };
        let mut inline_fields: Vec<(String, FieldKind, Value)> = Vec::new();

        for p in params {
            if p.name.to_lowercase() == inline_id {
                return Err(WakeError::ReservedIdentifier(p.name.clone()));
            }
            if set.kinds.iter().any(|(n, _)| *n == p.name) {
                return Err(WakeError::DuplicateParameter(p.name.clone()));
            }
            let marked_inline = options.inline.iter().any(|ip| ip.name == p.name);
            let kind = match p.decl {
                ParamDecl::VarPositional => {
                    if marked_inline {
                        return Err(inline_error(&p.name, "variadic parameters cannot be inline"));
                    }
                    set.args_id = Some(p.name.clone());
                    if options.args_as_config {
                        set.configs
                            .insert(ConfigEntry::new(&p.name, Schema::List, false))?;
                        ParamKind::VariadicPositionalConfig
                    } else {
                        ParamKind::Regular(Some(Value::List(Vec::new())))
                    }
                }
                ParamDecl::VarKeyword => {
                    if marked_inline {
                        return Err(inline_error(&p.name, "variadic parameters cannot be inline"));
                    }
                    set.kwargs_id = Some(p.name.clone());
                    if options.kwargs_as_config {
                        set.configs
                            .insert(ConfigEntry::new(&p.name, Schema::Map, false))?;
                        ParamKind::VariadicKeywordConfig
                    } else {
                        ParamKind::Regular(Some(Value::empty_map()))
                    }
                }
                ParamDecl::Named if marked_inline => {
                    let (kind, default) = resolve_inline(p, &options.inline)?;
                    inline_fields.push((p.name.clone(), kind.clone(), default.clone()));
                    ParamKind::InlineConfig { kind, default }
                }
                ParamDecl::Named => match p.annotation.as_ref().and_then(|a| a.as_config_schema())
                {
                    Some(schema) if p.default.is_none() => {
                        set.configs
                            .insert(ConfigEntry::new(&p.name, schema.clone(), true))?;
                        ParamKind::Config(schema)
                    }
                    _ => ParamKind::Regular(p.default.clone()),
                },
            };
            set.kinds.push((p.name.clone(), kind));
        }

        for ip in &options.inline {
            if !set.kinds.iter().any(|(n, _)| *n == ip.name) {
                return Err(inline_error(&ip.name, "missing from the parameter list"));
            }
        }

        for (id, schema) in &options.supplemental {
            if id.to_lowercase() == inline_id {
                return Err(WakeError::ReservedIdentifier(id.clone()));
            }
            if set.kinds.iter().any(|(n, _)| n == id) {
                return Err(WakeError::DuplicateConfig(id.clone()));
            }
            set.configs
                .insert(ConfigEntry::new(id, schema.clone(), true))?;
        }

        if !inline_fields.is_empty() {
            let mut schema = StructSchema::new(&set.inline_id);
            for (name, kind, default) in inline_fields {
                schema = schema.field(name, kind, default);
            }
            set.configs.insert(ConfigEntry::new(
                set.inline_id.clone(),
                Schema::Struct(schema),
                false,
            ))?;
            set.has_inline = true;
        }
        Ok(set)
    }

    pub fn kinds(&self) -> &[(String, ParamKind)] {
        &self.kinds
    }

    pub fn configs(&self) -> &ConfigSet {
        &self.configs
    }

    pub fn configs_mut(&mut self) -> &mut ConfigSet {
        &mut self.configs
    }

    pub fn inline_id(&self) -> &str {
        &self.inline_id
    }

    pub fn has_inline(&self) -> bool {
        self.has_inline
    }

    pub fn args_id(&self) -> Option<&str> {
        self.args_id.as_deref()
    }

    pub fn kwargs_id(&self) -> Option<&str> {
        self.kwargs_id.as_deref()
    }

    /// Collapses the classified parameters and their resolved config values
    /// into [`CallArgs`] for command instantiation.
    ///
    /// Variadic-keyword keys that collide with a declared parameter name
    /// are resolved per `policy`; the default raises
    /// [`WakeError::ParameterCollision`].
    pub fn collapse(&self, policy: OverridePolicy) -> Result<CallArgs, WakeError> {
        let inline_latest = self
            .configs
            .get(&self.inline_id)
            .and_then(|e| e.latest().cloned());

        let mut call = CallArgs::default();
        for (name, kind) in &self.kinds {
            let value = match kind {
                ParamKind::VariadicPositionalConfig | ParamKind::VariadicKeywordConfig => continue,
                ParamKind::Regular(_)
                    if Some(name.as_str()) == self.args_id.as_deref()
                        || Some(name.as_str()) == self.kwargs_id.as_deref() =>
                {
                    continue
                }
                ParamKind::Config(_) => self
                    .configs
                    .get(name)
                    .and_then(|e| e.latest().cloned())
                    .ok_or_else(|| WakeError::UnfilledParameter(name.clone()))?,
                ParamKind::InlineConfig { .. } => inline_latest
                    .as_ref()
                    .and_then(|v| v.as_map())
                    .and_then(|m| m.get(name).cloned())
                    .ok_or_else(|| WakeError::UnfilledParameter(name.clone()))?,
                ParamKind::Regular(default) => default
                    .clone()
                    .ok_or_else(|| WakeError::UnfilledParameter(name.clone()))?,
            };
            call.named.push((name.clone(), value));
        }

        if let Some(args_id) = &self.args_id {
            if let Some(entry) = self.configs.get(args_id) {
                if let Some(Value::List(items)) = entry.latest() {
                    call.args = items.clone();
                }
            }
        }

        if let Some(kwargs_id) = &self.kwargs_id {
            if let Some(entry) = self.configs.get(kwargs_id) {
                if let Some(Value::Map(map)) = entry.latest() {
                    for (key, value) in map {
                        merge_kwarg(&mut call, key, value.clone(), policy)?;
                    }
                }
            }
        }
        Ok(call)
    }
}

fn merge_kwarg(
    call: &mut CallArgs,
    key: &str,
    value: Value,
    policy: OverridePolicy,
) -> Result<(), WakeError> {
    let existing = call.named.iter_mut().find(|(n, _)| n == key);
    match existing {
        None => {
            call.kwargs.insert(key.to_string(), value);
            Ok(())
        }
        Some((_, current)) => match policy {
            OverridePolicy::Raise => Err(WakeError::ParameterCollision(key.to_string())),
            OverridePolicy::Override => {
                *current = value;
                Ok(())
            }
            OverridePolicy::VerboseOverride => {
                tracing::warn!(parameter = key, "overriding parameter: {current} -> {value}");
                *current = value;
                Ok(())
            }
            OverridePolicy::Skip => Ok(()),
            OverridePolicy::VerboseSkip => {
                tracing::warn!(
                    parameter = key,
                    "skipping override of parameter: current={current}; skipped={value}"
                );
                Ok(())
            }
        },
    }
}

fn resolve_inline(p: &ParamSpec, inline: &[InlineParam]) -> Result<(FieldKind, Value), WakeError> {
    let marker = inline
        .iter()
        .find(|ip| ip.name == p.name)
        .expect("caller checked the inline marker");
    let kind = p
        .annotation
        .clone()
        .ok_or_else(|| inline_error(&p.name, "missing mandatory type annotation"))?;
    let raw_default = match (&p.default, marker.factory) {
        (Some(_), Some(_)) => {
            return Err(inline_error(
                &p.name,
                "duplicate default declaration (signature default and default factory)",
            ));
        }
        (Some(value), None) => value.clone(),
        (None, Some(factory)) => factory(),
        (None, None) => return Err(inline_error(&p.name, "missing mandatory default value")),
    };
    let default = coerce_value(&raw_default, &kind).map_err(|reason| {
        inline_error(
            &p.name,
            &format!("default value is not a valid {}: {reason}", kind.name()),
        )
    })?;
    Ok((kind, default))
}

fn check_inline_duplicates(inline: &[InlineParam]) -> Result<(), WakeError> {
    for (i, ip) in inline.iter().enumerate() {
        if inline[..i].iter().any(|other| other.name == ip.name) {
            return Err(inline_error(&ip.name, "declared multiple times"));
        }
    }
    Ok(())
}

fn inline_error(name: &str, reason: &str) -> WakeError {
    WakeError::InlineDeclaration {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
