//! Config persistence: path resolution and JSON/TOML file I/O.
//!
//! The rest of the system treats persistence as opaque `load`/`write`
//! operations; "file not found" is distinguishable from any other I/O
//! failure so the config hook can tolerate missing files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use rouse_core::{Schema, Value, WakeError, coerce_value};

use crate::entry::{ConfigEntry, Variant};

/// Supported persisted-config formats, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileFormat {
    /// Default: a top-level sequence config is representable in JSON but
    /// not in TOML.
    #[default]
    Json,
    Toml,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Toml => "toml",
        }
    }

    pub fn from_path(path: &Path) -> Option<FileFormat> {
        match path.extension()?.to_str()? {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }
}

/// What the write-back step persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteBack {
    /// The loaded-or-base value. Overrides stay ephemeral.
    #[default]
    Declared,
    /// Whatever `latest()` resolves to, overrides included.
    Latest,
    Disabled,
}

#[derive(Debug, Clone, Default)]
struct PathSpec {
    flag: Option<String>,
    default_path: Option<PathBuf>,
    format: Option<FileFormat>,
}

/// Per-config file path and format registration.
#[derive(Debug, Clone, Default)]
pub struct PersistenceManager {
    default_format: FileFormat,
    registrations: BTreeMap<String, PathSpec>,
}

impl PersistenceManager {
    pub fn new(default_format: FileFormat) -> Self {
        Self {
            default_format,
            registrations: BTreeMap::new(),
        }
    }

    /// Overrides the command-line flag for a config's file path.
    pub fn with_flag(mut self, config_id: &str, flag: impl Into<String>) -> Self {
        self.spec_mut(config_id).flag = Some(flag.into());
        self
    }

    /// Overrides the default file path for a config.
    pub fn with_default_path(mut self, config_id: &str, path: impl Into<PathBuf>) -> Self {
        self.spec_mut(config_id).default_path = Some(path.into());
        self
    }

    /// Overrides the file format for a config.
    pub fn with_format(mut self, config_id: &str, format: FileFormat) -> Self {
        self.spec_mut(config_id).format = Some(format);
        self
    }

    fn spec_mut(&mut self, config_id: &str) -> &mut PathSpec {
        self.registrations.entry(config_id.to_string()).or_default()
    }

    fn spec(&self, config_id: &str) -> Option<&PathSpec> {
        self.registrations.get(config_id)
    }

    /// Long flag for the config's file path, e.g. `my_cfg` -> `my-cfg-path`.
    pub fn flag(&self, config_id: &str) -> String {
        self.spec(config_id)
            .and_then(|s| s.flag.clone())
            .unwrap_or_else(|| format!("{}-path", config_id.replace('_', "-")))
    }

    /// Argument id the flag value is stored under.
    pub fn arg_id(&self, config_id: &str) -> String {
        format!("{config_id}_path")
    }

    fn format_for(&self, config_id: &str) -> FileFormat {
        self.spec(config_id)
            .and_then(|s| s.format)
            .unwrap_or(self.default_format)
    }

    /// Resolves the effective file path: the recognized-flag value if the
    /// user gave one, else the registered or derived default. A path
    /// without an extension gets the config's format extension appended.
    pub fn resolve_path(&self, config_id: &str, cli_value: Option<&str>) -> PathBuf {
        let format = self.format_for(config_id);
        let path = match cli_value {
            Some(value) => PathBuf::from(value),
            None => self
                .spec(config_id)
                .and_then(|s| s.default_path.clone())
                .unwrap_or_else(|| PathBuf::from(config_id)),
        };
        if path.extension().is_some() {
            path
        } else {
            path.with_extension(format.extension())
        }
    }

    /// Loads a persisted value. `Ok(None)` means the file does not exist;
    /// every other failure is an error.
    pub fn load(&self, config_id: &str, path: &Path) -> Result<Option<Value>, WakeError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(WakeError::Persistence {
                    config: config_id.to_string(),
                    path: path.display().to_string(),
                    reason: err.to_string(),
                });
            }
        };
        let format =
            FileFormat::from_path(path).unwrap_or_else(|| self.format_for(config_id));
        let value = match format {
            FileFormat::Json => {
                let json: serde_json::Value =
                    serde_json::from_str(&text).map_err(|err| WakeError::Persistence {
                        config: config_id.to_string(),
                        path: path.display().to_string(),
                        reason: err.to_string(),
                    })?;
                from_json(&json)
            }
            FileFormat::Toml => {
                let toml: toml::Value =
                    toml::from_str(&text).map_err(|err| WakeError::Persistence {
                        config: config_id.to_string(),
                        path: path.display().to_string(),
                        reason: err.to_string(),
                    })?;
                from_toml(&toml)
            }
        };
        tracing::debug!(config = %config_id, path = %path.display(), "loaded config file");
        Ok(Some(value))
    }

    /// Serializes `value` to `path`, creating parent directories.
    pub fn write(&self, config_id: &str, path: &Path, value: &Value) -> Result<(), WakeError> {
        let persistence_err = |reason: String| WakeError::Persistence {
            config: config_id.to_string(),
            path: path.display().to_string(),
            reason,
        };
        let format =
            FileFormat::from_path(path).unwrap_or_else(|| self.format_for(config_id));
        let text = match format {
            FileFormat::Json => {
                let json = to_json(value);
                serde_json::to_string_pretty(&json).map_err(|e| persistence_err(e.to_string()))?
            }
            FileFormat::Toml => {
                let toml = to_toml(value).map_err(persistence_err)?;
                toml::to_string_pretty(&toml).map_err(|e| persistence_err(e.to_string()))?
            }
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| persistence_err(e.to_string()))?;
            }
        }
        std::fs::write(path, text + "\n").map_err(|e| persistence_err(e.to_string()))?;
        tracing::debug!(config = %config_id, path = %path.display(), "wrote config file");
        Ok(())
    }
}

/// Initializes a config entry: sets the base variant from the schema
/// default, then (for serializable entries with a path) layers a loaded
/// variant merged from file. A missing file is tolerated unless
/// `raise_on_fnf` is set.
pub fn initialize(
    entry: &mut ConfigEntry,
    manager: &PersistenceManager,
    path: Option<&Path>,
    raise_on_fnf: bool,
) -> Result<(), WakeError> {
    if !entry.has(Variant::Base) {
        entry.set(Variant::Base, entry.schema().default_value());
    }
    let Some(path) = path else {
        return Ok(());
    };
    if entry.has(Variant::Loaded) {
        return Ok(());
    }
    let id = entry.id().to_string();
    let Some(file_value) = manager.load(&id, path)? else {
        if raise_on_fnf {
            return Err(WakeError::FileNotFound {
                config: id,
                path: path.display().to_string(),
            });
        }
        return Ok(());
    };

    let base = entry
        .get(Variant::Base)
        .cloned()
        .expect("base variant was just set");
    let mismatch = |found: &Value| WakeError::Persistence {
        config: id.clone(),
        path: path.display().to_string(),
        reason: format!(
            "type mismatch: expected {}, found {}",
            entry.schema().name(),
            found.kind_name()
        ),
    };
    let loaded = match entry.schema() {
        Schema::List => match file_value {
            Value::List(items) => Value::List(items),
            // An empty mapping is what an empty file parses to; a sequence
            // config treats it as an empty sequence.
            Value::Map(map) if map.is_empty() => Value::List(Vec::new()),
            other => return Err(mismatch(&other)),
        },
        Schema::Map => match file_value {
            file_map @ Value::Map(_) => base.deep_merge(file_map),
            other => return Err(mismatch(&other)),
        },
        Schema::Struct(schema) => match &file_value {
            Value::Map(_) => {
                let coerced = coerce_value(&file_value, &rouse_core::FieldKind::Struct(schema.clone()))
                    .map_err(|reason| WakeError::Persistence {
                        config: id.clone(),
                        path: path.display().to_string(),
                        reason,
                    })?;
                base.deep_merge(coerced)
            }
            other => return Err(mismatch(other)),
        },
    };
    entry.set(Variant::Loaded, loaded);
    Ok(())
}

pub fn from_json(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect(),
        ),
    }
}

pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), to_json(v))).collect(),
        ),
    }
}

pub fn from_toml(value: &toml::Value) -> Value {
    match value {
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Integer(i) => Value::Int(*i),
        toml::Value::Float(x) => Value::Float(*x),
        toml::Value::String(s) => Value::Str(s.clone()),
        toml::Value::Datetime(dt) => Value::Str(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .iter()
                .map(|(k, v)| (k.clone(), from_toml(v)))
                .collect(),
        ),
    }
}

/// TOML cannot represent nulls; configs containing them must use JSON.
pub fn to_toml(value: &Value) -> Result<toml::Value, String> {
    match value {
        Value::Null => Err("null is not representable in TOML".to_string()),
        Value::Bool(b) => Ok(toml::Value::Boolean(*b)),
        Value::Int(i) => Ok(toml::Value::Integer(*i)),
        Value::Float(x) => Ok(toml::Value::Float(*x)),
        Value::Str(s) => Ok(toml::Value::String(s.clone())),
        Value::List(items) => Ok(toml::Value::Array(
            items.iter().map(to_toml).collect::<Result<_, _>>()?,
        )),
        Value::Map(map) => {
            let mut table = toml::map::Map::new();
            for (k, v) in map {
                table.insert(k.clone(), to_toml(v)?);
            }
            Ok(toml::Value::Table(table))
        }
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
