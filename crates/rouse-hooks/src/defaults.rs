//! The pre-built default hooks for the four main slots.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Arg;

use rouse_config::{Override, OverridePolicy, WriteBack, initialize};
use rouse_core::WakeError;

use crate::command::CommandObject;
use crate::slots::{InvokeHookFn, ParserHookFn};
use crate::state::{ExecutionState, ParserData};

/// Options for the default config hook.
#[derive(Debug, Clone)]
pub struct ConfigHookOptions {
    /// Restrict the hook to these configs; empty means all.
    pub config_ids: Vec<String>,
    /// Raise [`WakeError::FileNotFound`] instead of tolerating a missing
    /// config file.
    pub raise_on_fnf: bool,
    /// The override resolver; `None` disables command-line overrides.
    pub override_resolver: Option<Override>,
    pub write: WriteBack,
    /// Configs excluded from write-back even when `write` is enabled.
    pub skip_write: Vec<String>,
    /// Write even when the destination file already exists.
    pub overwrite: bool,
}

impl Default for ConfigHookOptions {
    fn default() -> Self {
        Self {
            config_ids: Vec::new(),
            raise_on_fnf: false,
            override_resolver: Some(Override::default()),
            write: WriteBack::Declared,
            skip_write: Vec::new(),
            overwrite: false,
        }
    }
}

/// Default parser hook: adds a `--<id>-path FILE` flag for every
/// serializable config of the command.
pub fn parser_hook_default() -> ParserHookFn {
    Arc::new(|data: &mut ParserData| {
        let ids: Vec<String> = data
            .config_ids
            .iter()
            .filter(|(_, serializable)| *serializable)
            .map(|(id, _)| id.clone())
            .collect();
        for id in ids {
            let flag = data.persistence.flag(&id);
            let arg_id = data.persistence.arg_id(&id);
            let help = format!("{id} file path");
            data.map_parser(|parser| {
                parser.arg(
                    Arg::new(arg_id)
                        .long(flag)
                        .value_name("FILE")
                        .help(help)
                        .required(false),
                )
            });
        }
        Ok(())
    })
}

/// Default config hook factory.
///
/// Three strictly sequential passes over the selected configs: initialize
/// all (base variant, then file load), then resolve command-line overrides,
/// then write back per policy. The declaration hierarchy is
/// override > file > code default, so the load always happens before the
/// override resolution layered on top of it.
pub fn config_hook_default(options: ConfigHookOptions) -> InvokeHookFn {
    Arc::new(move |state: &mut ExecutionState| {
        let ids = if options.config_ids.is_empty() {
            state.params.configs().ids()
        } else {
            options.config_ids.clone()
        };

        let mut paths: Vec<(String, Option<PathBuf>)> = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(entry) = state.params.configs().get(id) else {
                return Err(WakeError::UnknownConfig {
                    prefix: id.clone(),
                    options: state.params.configs().ids(),
                });
            };
            let path = entry.is_serializable().then(|| state.path_for(id));
            paths.push((id.clone(), path));
        }

        let persistence = state.persistence.clone();
        for (id, path) in &paths {
            let entry = state
                .params
                .configs_mut()
                .get_mut(id)
                .expect("checked above");
            initialize(entry, &persistence, path.as_deref(), options.raise_on_fnf)?;
        }

        if let Some(resolver) = &options.override_resolver {
            let only = (!options.config_ids.is_empty()).then(|| options.config_ids.clone());
            resolver.apply_filtered(
                &state.unknown_args,
                state.params.configs_mut(),
                only.as_deref(),
            )?;
        }

        if options.write != WriteBack::Disabled {
            for (id, path) in &paths {
                let Some(path) = path else { continue };
                if options.skip_write.iter().any(|s| s == id) {
                    continue;
                }
                if !options.overwrite && path.exists() {
                    continue;
                }
                let entry = state.params.configs().get(id).expect("checked above");
                let value = match options.write {
                    WriteBack::Declared => entry.declared(),
                    WriteBack::Latest => entry.latest(),
                    WriteBack::Disabled => unreachable!(),
                };
                if let Some(value) = value {
                    persistence.write(id, path, value)?;
                }
            }
        }
        Ok(())
    })
}

/// Default init hook: collapses the resolved configs into call arguments
/// and instantiates the command.
pub fn init_hook_default(policy: OverridePolicy) -> InvokeHookFn {
    Arc::new(move |state: &mut ExecutionState| {
        let spec = match &state.command {
            CommandObject::Spec(spec) => spec.clone(),
            CommandObject::Instance(_) => {
                return Err(WakeError::HookProtocol {
                    slot: "init",
                    position: 0,
                    reason: "command is already instantiated".to_string(),
                });
            }
        };
        let call = state.params.collapse(policy)?;
        state.command = CommandObject::Instance(spec.instantiate(call)?);
        Ok(())
    })
}

/// Default run hook: invokes the instantiated command and stores its result.
pub fn run_hook_default() -> InvokeHookFn {
    Arc::new(|state: &mut ExecutionState| {
        match &mut state.command {
            CommandObject::Instance(instance) => {
                state.result = Some(instance.invoke()?);
                Ok(())
            }
            CommandObject::Spec(_) => Err(WakeError::HookProtocol {
                slot: "run",
                position: 0,
                reason: "command was never instantiated".to_string(),
            }),
        }
    })
}

/// The pre-built default callables per main slot. Pre/post slots carry no
/// default.
pub struct DefaultHooks {
    pub parser: Option<ParserHookFn>,
    pub config: Option<InvokeHookFn>,
    pub init: Option<InvokeHookFn>,
    pub run: Option<InvokeHookFn>,
}

impl DefaultHooks {
    pub fn standard() -> Self {
        Self {
            parser: Some(parser_hook_default()),
            config: Some(config_hook_default(ConfigHookOptions::default())),
            init: Some(init_hook_default(OverridePolicy::default())),
            run: Some(run_hook_default()),
        }
    }
}

impl Default for DefaultHooks {
    fn default() -> Self {
        Self::standard()
    }
}
