//! The explicit command registry.
//!
//! Commands are declared against a `Registry` value; declaration order is
//! the registration order. The parser phase runs here, at registration
//! time, because the argument parser must know every sub-command's flags
//! before any command is selected. Invoking consumes the registry
//! ([`Registry::wake`](crate::Registry::wake)), so no command can be
//! declared after invocation has started.

use clap::Arg;

use rouse_config::{ParamSet, ParamSpec, PersistenceManager, SignatureOptions};
use rouse_core::WakeError;
use rouse_hooks::{
    CommandSpec, DefaultHooks, Hooks, ParserData, Runnable, resolve_all, run_parser,
};

/// A command declaration: the callable, its explicit parameter list, and
/// its locally-declared hook trees.
pub struct CommandDecl {
    pub name: String,
    pub spec: CommandSpec,
    pub params: Vec<ParamSpec>,
    pub options: SignatureOptions,
    pub hooks: Hooks,
    pub about: Option<String>,
}

impl CommandDecl {
    /// Declares a function-backed command.
    pub fn function(
        name: impl Into<String>,
        params: Vec<ParamSpec>,
        f: impl Fn(rouse_config::CallArgs) -> Result<rouse_core::Value, WakeError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            spec: CommandSpec::function(f),
            params,
            options: SignatureOptions::default(),
            hooks: Hooks::default(),
            about: None,
        }
    }

    /// Declares an instance-backed command (separate init and run).
    pub fn instance(
        name: impl Into<String>,
        params: Vec<ParamSpec>,
        init: impl Fn(rouse_config::CallArgs) -> Result<Box<dyn Runnable>, WakeError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            spec: CommandSpec::instance(init),
            params,
            options: SignatureOptions::default(),
            hooks: Hooks::default(),
            about: None,
        }
    }

    pub fn with_options(mut self, options: SignatureOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }
}

pub(crate) struct Registered {
    pub(crate) name: String,
    pub(crate) spec: CommandSpec,
    pub(crate) param_set: ParamSet,
    pub(crate) hooks: Hooks,
}

/// The process-wide declaration-time state: registered commands, shared
/// hook trees, and the persistence manager.
pub struct Registry {
    pub(crate) program: String,
    pub(crate) shared_hooks: Hooks,
    pub(crate) defaults: DefaultHooks,
    pub(crate) persistence: PersistenceManager,
    pub(crate) commands: Vec<Registered>,
    pub(crate) root: clap::Command,
}

impl Registry {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            root: clap::Command::new(program.clone()),
            program,
            shared_hooks: Hooks::shared_defaults(),
            defaults: DefaultHooks::standard(),
            persistence: PersistenceManager::default(),
            commands: Vec::new(),
        }
    }

    /// Replaces the shared-scope hook trees. Commands pick these up through
    /// the `Shared` sentinel.
    pub fn with_shared_hooks(mut self, hooks: Hooks) -> Self {
        self.shared_hooks = hooks;
        self
    }

    /// Replaces the slot defaults that the `Default` sentinel resolves to.
    pub fn with_defaults(mut self, defaults: DefaultHooks) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_persistence(mut self, persistence: PersistenceManager) -> Self {
        self.persistence = persistence;
        self
    }

    /// Registers a command: classifies its parameters (failing fast on a
    /// malformed declaration), assembles its sub-parser, and runs the
    /// parser hook slot.
    pub fn register(&mut self, decl: CommandDecl) -> Result<(), WakeError> {
        if self.commands.iter().any(|c| c.name == decl.name) {
            return Err(WakeError::DuplicateCommand(decl.name));
        }
        let param_set = ParamSet::classify(&decl.params, &decl.options)?;

        let mut sub = clap::Command::new(decl.name.clone());
        if let Some(about) = &decl.about {
            sub = sub.about(about.clone());
        }

        let resolved = resolve_all(&self.shared_hooks, &decl.hooks, &self.defaults)?;
        let mut data = ParserData {
            name: decl.name.clone(),
            parser: sub,
            config_ids: param_set
                .configs()
                .iter()
                .map(|e| (e.id().to_string(), e.is_serializable()))
                .collect(),
            persistence: self.persistence.clone(),
        };
        run_parser(&resolved, &mut data)?;

        // The leftover-token catch-all is parser machinery, not a hook:
        // every sub-command gets it regardless of hook configuration.
        let sub = data.parser.arg(
            Arg::new("overrides")
                .value_name("OVERRIDE")
                .num_args(0..)
                .allow_hyphen_values(true)
                .help("config overrides ([cfg::]key=value or [cfg::]item)"),
        );

        let root = std::mem::replace(&mut self.root, clap::Command::new("swapping"));
        self.root = root.subcommand(sub);
        tracing::debug!(command = %decl.name, "registered command");
        self.commands.push(Registered {
            name: decl.name,
            spec: decl.spec,
            param_set,
            hooks: decl.hooks,
        });
        Ok(())
    }

    pub fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rouse_config::InlineParam;
    use rouse_core::{FieldKind, Value};

    fn noop(name: &str) -> CommandDecl {
        CommandDecl::function(name, Vec::new(), |_| Ok(Value::Null))
    }

    #[test]
    fn test_duplicate_command_name_rejected() {
        let mut registry = Registry::new("app");
        registry.register(noop("cmd")).unwrap();
        let err = registry.register(noop("cmd")).unwrap_err();
        assert!(matches!(err, WakeError::DuplicateCommand(name) if name == "cmd"));
    }

    #[test]
    fn test_malformed_inline_fails_at_registration() {
        let mut registry = Registry::new("app");
        let decl = CommandDecl::function(
            "cmd",
            vec![ParamSpec::annotated("x", FieldKind::Int, None)],
            |_| Ok(Value::Null),
        )
        .with_options(SignatureOptions {
            inline: vec![InlineParam::new("x")],
            ..Default::default()
        });
        let err = registry.register(decl).unwrap_err();
        assert!(matches!(err, WakeError::InlineDeclaration { .. }));
        assert!(registry.command_names().is_empty());
    }

    #[test]
    fn test_registration_order_is_declaration_order() {
        let mut registry = Registry::new("app");
        registry.register(noop("second")).unwrap();
        registry.register(noop("first")).unwrap();
        assert_eq!(registry.command_names(), vec!["second", "first"]);
    }
}
