//! Config entries and their declaration-hierarchy variant chain.

use rouse_core::{Schema, Value, WakeError};

/// The three layers of the declaration hierarchy, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// From the code declaration (the schema's default value).
    Base,
    /// Loaded from a persisted file.
    Loaded,
    /// Result of applying command-line overrides.
    Override,
}

/// One named configuration bound to a command.
///
/// The variant chain is populated during the config phase of a single
/// invocation; `latest()` resolves override > loaded > base.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    id: String,
    schema: Schema,
    serializable: bool,
    base: Option<Value>,
    loaded: Option<Value>,
    overridden: Option<Value>,
}

impl ConfigEntry {
    pub fn new(id: impl Into<String>, schema: Schema, serializable: bool) -> Self {
        Self {
            id: id.into(),
            schema,
            serializable,
            base: None,
            loaded: None,
            overridden: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    pub fn has(&self, variant: Variant) -> bool {
        self.get(variant).is_some()
    }

    pub fn get(&self, variant: Variant) -> Option<&Value> {
        match variant {
            Variant::Base => self.base.as_ref(),
            Variant::Loaded => self.loaded.as_ref(),
            Variant::Override => self.overridden.as_ref(),
        }
    }

    pub fn set(&mut self, variant: Variant, value: Value) {
        match variant {
            Variant::Base => self.base = Some(value),
            Variant::Loaded => self.loaded = Some(value),
            Variant::Override => self.overridden = Some(value),
        }
    }

    /// The effective value: override if present, else loaded, else base.
    pub fn latest(&self) -> Option<&Value> {
        self.overridden
            .as_ref()
            .or(self.loaded.as_ref())
            .or(self.base.as_ref())
    }

    pub fn latest_variant(&self) -> Option<Variant> {
        if self.overridden.is_some() {
            Some(Variant::Override)
        } else if self.loaded.is_some() {
            Some(Variant::Loaded)
        } else if self.base.is_some() {
            Some(Variant::Base)
        } else {
            None
        }
    }

    /// The value the write-back step persists by default: loaded if present,
    /// else base. Overrides are ephemeral and never written by this policy.
    pub fn declared(&self) -> Option<&Value> {
        self.loaded.as_ref().or(self.base.as_ref())
    }
}

/// An ordered set of config entries with unique identifiers.
///
/// Order is declaration order; it drives positional command initialization
/// and the order override resolution visits configs.
#[derive(Debug, Clone, Default)]
pub struct ConfigSet {
    entries: Vec<ConfigEntry>,
}

impl ConfigSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: ConfigEntry) -> Result<(), WakeError> {
        if self.get(entry.id()).is_some() {
            return Err(WakeError::DuplicateConfig(entry.id().to_string()));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ConfigEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ConfigEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConfigEntry> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
