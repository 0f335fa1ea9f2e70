//! Config declaration, layering, and command-line override resolution.

pub mod entry;
pub mod overrides;
pub mod params;
pub mod persist;

pub use entry::{ConfigEntry, ConfigSet, Variant};
pub use overrides::Override;
pub use params::{
    CallArgs, InlineParam, OverridePolicy, ParamDecl, ParamKind, ParamSet, ParamSpec,
    SignatureOptions,
};
pub use persist::{FileFormat, PersistenceManager, WriteBack, initialize};
