//! The command model: a tagged variant over plain functions and
//! init-then-run instances, behind one capability interface.

use std::sync::Arc;

use rouse_config::CallArgs;
use rouse_core::{Value, WakeError};

/// An instantiated command, ready to run.
pub trait Runnable: Send {
    fn invoke(&mut self) -> Result<Value, WakeError>;
}

type FuncFn = Arc<dyn Fn(CallArgs) -> Result<Value, WakeError> + Send + Sync>;
type InitFn = Arc<dyn Fn(CallArgs) -> Result<Box<dyn Runnable>, WakeError> + Send + Sync>;

/// How a command is declared: a single function, or an init function
/// producing a [`Runnable`] instance.
#[derive(Clone)]
pub enum CommandSpec {
    Function(FuncFn),
    Instance(InitFn),
}

impl CommandSpec {
    pub fn function(
        f: impl Fn(CallArgs) -> Result<Value, WakeError> + Send + Sync + 'static,
    ) -> Self {
        CommandSpec::Function(Arc::new(f))
    }

    pub fn instance(
        init: impl Fn(CallArgs) -> Result<Box<dyn Runnable>, WakeError> + Send + Sync + 'static,
    ) -> Self {
        CommandSpec::Instance(Arc::new(init))
    }

    /// Binds `args` and produces the runnable instance. Function commands
    /// wrap the call so that invocation happens in the run phase, exactly
    /// like instance commands.
    pub fn instantiate(&self, args: CallArgs) -> Result<Box<dyn Runnable>, WakeError> {
        match self {
            CommandSpec::Function(f) => Ok(Box::new(FnRunnable {
                f: f.clone(),
                args: Some(args),
            })),
            CommandSpec::Instance(init) => init(args),
        }
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandSpec::Function(_) => write!(f, "CommandSpec::Function"),
            CommandSpec::Instance(_) => write!(f, "CommandSpec::Instance"),
        }
    }
}

struct FnRunnable {
    f: FuncFn,
    args: Option<CallArgs>,
}

impl Runnable for FnRunnable {
    fn invoke(&mut self) -> Result<Value, WakeError> {
        let args = self.args.take().ok_or_else(|| WakeError::HookProtocol {
            slot: "run",
            position: 0,
            reason: "command instance was already invoked".to_string(),
        })?;
        (self.f)(args)
    }
}

/// The command as it travels through the pipeline: a spec before the init
/// phase, an instance after it.
pub enum CommandObject {
    Spec(CommandSpec),
    Instance(Box<dyn Runnable>),
}

impl CommandObject {
    pub fn is_instantiated(&self) -> bool {
        matches!(self, CommandObject::Instance(_))
    }
}

impl std::fmt::Debug for CommandObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandObject::Spec(spec) => write!(f, "CommandObject::Spec({spec:?})"),
            CommandObject::Instance(_) => write!(f, "CommandObject::Instance"),
        }
    }
}
