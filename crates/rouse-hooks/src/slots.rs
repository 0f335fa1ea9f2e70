//! The ten hook slots and per-command hook declarations.

use std::sync::Arc;

use rouse_core::WakeError;

use crate::defaults::DefaultHooks;
use crate::state::{ExecutionState, ParserData};
use crate::tree::{HookTree, resolve};

pub type ParserHookFn = Arc<dyn Fn(&mut ParserData) -> Result<(), WakeError> + Send + Sync>;
pub type InvokeHookFn = Arc<dyn Fn(&mut ExecutionState) -> Result<(), WakeError> + Send + Sync>;

/// Wraps a closure as a parser-phase hook tree leaf.
pub fn parser_hook(
    f: impl Fn(&mut ParserData) -> Result<(), WakeError> + Send + Sync + 'static,
) -> HookTree<ParserHookFn> {
    HookTree::Hook(Arc::new(f))
}

/// Wraps a closure as an invocation-phase hook tree leaf.
pub fn invoke_hook(
    f: impl Fn(&mut ExecutionState) -> Result<(), WakeError> + Send + Sync + 'static,
) -> HookTree<InvokeHookFn> {
    HookTree::Hook(Arc::new(f))
}

/// The ten extension points, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookSlot {
    Parser,
    PreConfig,
    Config,
    PostConfig,
    PreInit,
    Init,
    PostInit,
    PreRun,
    Run,
    PostRun,
}

impl HookSlot {
    pub fn name(&self) -> &'static str {
        match self {
            HookSlot::Parser => "parser",
            HookSlot::PreConfig => "pre-config",
            HookSlot::Config => "config",
            HookSlot::PostConfig => "post-config",
            HookSlot::PreInit => "pre-init",
            HookSlot::Init => "init",
            HookSlot::PostInit => "post-init",
            HookSlot::PreRun => "pre-run",
            HookSlot::Run => "run",
            HookSlot::PostRun => "post-run",
        }
    }

    /// The nine invocation slots, in execution order.
    pub const INVOCATION: [HookSlot; 9] = [
        HookSlot::PreConfig,
        HookSlot::Config,
        HookSlot::PostConfig,
        HookSlot::PreInit,
        HookSlot::Init,
        HookSlot::PostInit,
        HookSlot::PreRun,
        HookSlot::Run,
        HookSlot::PostRun,
    ];
}

/// One sentinel tree per slot.
///
/// The default for a command-level declaration is `Shared` on every slot
/// (defer to the enclosing scope); the default for the shared scope itself
/// is `Default` on every slot.
#[derive(Debug, Clone)]
pub struct Hooks {
    pub parser: HookTree<ParserHookFn>,
    pub pre_config: HookTree<InvokeHookFn>,
    pub config: HookTree<InvokeHookFn>,
    pub post_config: HookTree<InvokeHookFn>,
    pub pre_init: HookTree<InvokeHookFn>,
    pub init: HookTree<InvokeHookFn>,
    pub post_init: HookTree<InvokeHookFn>,
    pub pre_run: HookTree<InvokeHookFn>,
    pub run: HookTree<InvokeHookFn>,
    pub post_run: HookTree<InvokeHookFn>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            parser: HookTree::Shared,
            pre_config: HookTree::Shared,
            config: HookTree::Shared,
            post_config: HookTree::Shared,
            pre_init: HookTree::Shared,
            init: HookTree::Shared,
            post_init: HookTree::Shared,
            pre_run: HookTree::Shared,
            run: HookTree::Shared,
            post_run: HookTree::Shared,
        }
    }
}

impl Hooks {
    /// The shared-scope baseline: every slot defers to its default hook.
    pub fn shared_defaults() -> Self {
        Self {
            parser: HookTree::Default,
            pre_config: HookTree::Default,
            config: HookTree::Default,
            post_config: HookTree::Default,
            pre_init: HookTree::Default,
            init: HookTree::Default,
            post_init: HookTree::Default,
            pre_run: HookTree::Default,
            run: HookTree::Default,
            post_run: HookTree::Default,
        }
    }
}

/// The fully-resolved hook sequences for one command: sentinels are gone.
pub struct ResolvedHooks {
    pub parser: Vec<ParserHookFn>,
    pub pre_config: Vec<InvokeHookFn>,
    pub config: Vec<InvokeHookFn>,
    pub post_config: Vec<InvokeHookFn>,
    pub pre_init: Vec<InvokeHookFn>,
    pub init: Vec<InvokeHookFn>,
    pub post_init: Vec<InvokeHookFn>,
    pub pre_run: Vec<InvokeHookFn>,
    pub run: Vec<InvokeHookFn>,
    pub post_run: Vec<InvokeHookFn>,
}

impl std::fmt::Debug for ResolvedHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedHooks")
            .field("parser", &self.parser.len())
            .field("pre_config", &self.pre_config.len())
            .field("config", &self.config.len())
            .field("post_config", &self.post_config.len())
            .field("pre_init", &self.pre_init.len())
            .field("init", &self.init.len())
            .field("post_init", &self.post_init.len())
            .field("pre_run", &self.pre_run.len())
            .field("run", &self.run.len())
            .field("post_run", &self.post_run.len())
            .finish()
    }
}

impl ResolvedHooks {
    pub fn invocation_slots(&self) -> [(HookSlot, &[InvokeHookFn]); 9] {
        [
            (HookSlot::PreConfig, self.pre_config.as_slice()),
            (HookSlot::Config, self.config.as_slice()),
            (HookSlot::PostConfig, self.post_config.as_slice()),
            (HookSlot::PreInit, self.pre_init.as_slice()),
            (HookSlot::Init, self.init.as_slice()),
            (HookSlot::PostInit, self.post_init.as_slice()),
            (HookSlot::PreRun, self.pre_run.as_slice()),
            (HookSlot::Run, self.run.as_slice()),
            (HookSlot::PostRun, self.post_run.as_slice()),
        ]
    }
}

/// Resolves the command's trees against the shared scope and the slot
/// defaults. Pre/post slots have no default hook; their `Default`
/// sentinels resolve to nothing.
pub fn resolve_all(
    shared: &Hooks,
    command: &Hooks,
    defaults: &DefaultHooks,
) -> Result<ResolvedHooks, WakeError> {
    fn slot<F: Clone>(
        shared_tree: &HookTree<F>,
        command_tree: &HookTree<F>,
        default: Option<&F>,
        name: &'static str,
    ) -> Result<Vec<F>, WakeError> {
        let shared_seq = resolve(shared_tree, None, default, name)?;
        resolve(command_tree, Some(&shared_seq), default, name)
    }

    Ok(ResolvedHooks {
        parser: slot(
            &shared.parser,
            &command.parser,
            defaults.parser.as_ref(),
            "parser",
        )?,
        pre_config: slot(&shared.pre_config, &command.pre_config, None, "pre-config")?,
        config: slot(
            &shared.config,
            &command.config,
            defaults.config.as_ref(),
            "config",
        )?,
        post_config: slot(
            &shared.post_config,
            &command.post_config,
            None,
            "post-config",
        )?,
        pre_init: slot(&shared.pre_init, &command.pre_init, None, "pre-init")?,
        init: slot(&shared.init, &command.init, defaults.init.as_ref(), "init")?,
        post_init: slot(&shared.post_init, &command.post_init, None, "post-init")?,
        pre_run: slot(&shared.pre_run, &command.pre_run, None, "pre-run")?,
        run: slot(&shared.run, &command.run, defaults.run.as_ref(), "run")?,
        post_run: slot(&shared.post_run, &command.post_run, None, "post-run")?,
    })
}
