//! The mutable state objects threaded through hook pipelines.

use std::path::PathBuf;

use rouse_config::{ParamSet, PersistenceManager};
use rouse_core::Value;

use crate::command::CommandObject;

/// Data handed to parser-phase hooks while a command's sub-parser is
/// assembled at registration time.
pub struct ParserData {
    pub name: String,
    pub parser: clap::Command,
    /// Config identifiers with their serializable flag, declaration order.
    pub config_ids: Vec<(String, bool)>,
    pub persistence: PersistenceManager,
}

impl ParserData {
    /// Applies a builder-style transformation to the sub-parser. The clap
    /// builder consumes `self`, so the command is swapped out and back.
    pub fn map_parser(&mut self, f: impl FnOnce(clap::Command) -> clap::Command) {
        let taken = std::mem::replace(&mut self.parser, clap::Command::new("swapping"));
        self.parser = f(taken);
    }
}

/// The single mutable object threaded through one invocation's hook
/// pipeline. Hooks receive `&mut ExecutionState` and read whichever subset
/// of fields they need; main hooks store their product into the matching
/// field (configs into `params`, the instance into `command`, the outcome
/// into `result`).
pub struct ExecutionState {
    pub name: String,
    /// `Spec` until the init phase instantiates it.
    pub command: CommandObject,
    pub params: ParamSet,
    /// Recognized flags from the argument parser.
    pub known_args: clap::ArgMatches,
    /// Leftover tokens; the override resolver's input.
    pub unknown_args: Vec<String>,
    pub persistence: PersistenceManager,
    pub result: Option<Value>,
}

impl ExecutionState {
    /// Effective file path for a config: the recognized `--<id>-path` flag
    /// value if the user passed one, else the registered default.
    pub fn path_for(&self, config_id: &str) -> PathBuf {
        let arg_id = self.persistence.arg_id(config_id);
        let cli_value = self
            .known_args
            .try_get_one::<String>(&arg_id)
            .ok()
            .flatten()
            .map(String::as_str);
        self.persistence.resolve_path(config_id, cli_value)
    }
}
