//! Waking the registry: parse, select, and run exactly one command.

use clap::error::{ContextKind, ContextValue, ErrorKind};

use rouse_core::{Value, WakeError};
use rouse_hooks::{CommandObject, ExecutionState, resolve_all, run_invocation};

use crate::registry::Registry;

impl Registry {
    /// Parses `args` (without the program name), selects the sub-command,
    /// and runs its invocation pipeline. Consumes the registry: one
    /// command runs per process lifetime, and nothing can be declared
    /// afterwards.
    pub fn wake<I, S>(mut self, args: I) -> Result<Value, WakeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv: Vec<String> = vec![self.program.clone()];
        argv.extend(args.into_iter().map(Into::into));

        let root = std::mem::replace(&mut self.root, clap::Command::new("swapping"));
        let matches = root.try_get_matches_from(argv).map_err(map_clap_error)?;
        let Some((name, sub_matches)) = matches.subcommand() else {
            return Err(WakeError::NoCommandSelected);
        };
        let position = self
            .commands
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| WakeError::UnknownCommand(name.to_string()))?;
        let command = self.commands.swap_remove(position);
        tracing::debug!(command = %command.name, "waking command");

        // Sentinel trees resolve lazily, once per invocation.
        let resolved = resolve_all(&self.shared_hooks, &command.hooks, &self.defaults)?;
        let unknown_args: Vec<String> = sub_matches
            .get_many::<String>("overrides")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        let mut state = ExecutionState {
            name: command.name,
            command: CommandObject::Spec(command.spec),
            params: command.param_set,
            known_args: sub_matches.clone(),
            unknown_args,
            persistence: self.persistence,
            result: None,
        };
        run_invocation(&resolved, &mut state)?;
        Ok(state.result.unwrap_or(Value::Null))
    }

    /// Wakes from the process arguments.
    pub fn wake_from_env(self) -> Result<Value, WakeError> {
        self.wake(std::env::args().skip(1))
    }
}

fn map_clap_error(err: clap::Error) -> WakeError {
    match err.kind() {
        ErrorKind::InvalidSubcommand | ErrorKind::UnknownArgument => {
            let offending = err
                .get(ContextKind::InvalidSubcommand)
                .or_else(|| err.get(ContextKind::InvalidArg))
                .and_then(|value| match value {
                    ContextValue::String(s) => Some(s.clone()),
                    _ => None,
                })
                .unwrap_or_default();
            WakeError::UnknownCommand(offending)
        }
        _ => WakeError::Other(anyhow::Error::new(err)),
    }
}
