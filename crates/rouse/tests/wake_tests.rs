//! End-to-end invocation scenarios.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rouse::{
    CommandDecl, ConfigHookOptions, DefaultHooks, FieldKind, HookTree, Hooks, InlineParam,
    ParamSpec, Registry, SignatureOptions, StructSchema, Value, Variant, WakeError, WriteBack,
    config_hook_default, invoke_hook,
};

fn xy_schema(name: &str) -> StructSchema {
    StructSchema::new(name).field("x", FieldKind::Int, Value::Int(1))
}

/// A registry whose default config hook never touches the filesystem.
fn registry() -> Registry {
    let defaults = DefaultHooks {
        config: Some(config_hook_default(ConfigHookOptions {
            write: WriteBack::Disabled,
            ..Default::default()
        })),
        ..DefaultHooks::standard()
    };
    Registry::new("app").with_defaults(defaults)
}

#[test]
fn test_wake_with_no_command_selected() {
    let err = registry().wake(Vec::<String>::new()).unwrap_err();
    assert!(matches!(err, WakeError::NoCommandSelected));
}

#[test]
fn test_wake_with_unknown_command() {
    let mut registry = registry();
    registry
        .register(CommandDecl::function("known", Vec::new(), |_| {
            Ok(Value::Null)
        }))
        .unwrap();
    let err = registry.wake(["bogus"]).unwrap_err();
    assert!(matches!(err, WakeError::UnknownCommand(_)));
}

#[test]
fn test_caller_level_retry_with_fallback_args() {
    // The registry is consumed per wake; a caller-level retry builds a
    // fresh one and re-invokes with a fallback argv.
    let build = || {
        let mut r = registry();
        r.register(CommandDecl::function("fallback", Vec::new(), |_| {
            Ok(Value::Int(1))
        }))
        .unwrap();
        r
    };
    let err = build().wake(Vec::<String>::new()).unwrap_err();
    assert!(matches!(err, WakeError::NoCommandSelected));
    let result = build().wake(["fallback"]).unwrap();
    assert_eq!(result, Value::Int(1));
}

#[test]
fn test_unprefixed_override_hits_every_accepting_config() {
    let mut registry = registry();
    registry
        .register(CommandDecl::function(
            "cmd",
            vec![
                ParamSpec::structured("config1", xy_schema("Config1")),
                ParamSpec::structured("config2", xy_schema("Config2")),
            ],
            |args| {
                let x1 = args.get("config1").unwrap().get_path(&["x"]).unwrap().clone();
                let x2 = args.get("config2").unwrap().get_path(&["x"]).unwrap().clone();
                Ok(Value::List(vec![x1, x2]))
            },
        ))
        .unwrap();
    let result = registry.wake(["cmd", "x=3"]).unwrap();
    assert_eq!(result, Value::List(vec![Value::Int(3), Value::Int(3)]));
}

#[test]
fn test_prefixed_overrides_target_distinct_configs() {
    let mut registry = registry();
    registry
        .register(CommandDecl::function(
            "cmd",
            vec![
                ParamSpec::structured("config1", xy_schema("Config1")),
                ParamSpec::structured("config2", xy_schema("Config2")),
            ],
            |args| {
                let x1 = args.get("config1").unwrap().get_path(&["x"]).unwrap().clone();
                let x2 = args.get("config2").unwrap().get_path(&["x"]).unwrap().clone();
                Ok(Value::List(vec![x1, x2]))
            },
        ))
        .unwrap();
    let result = registry
        .wake(["cmd", "config1::x=3", "config2::x=4"])
        .unwrap();
    assert_eq!(result, Value::List(vec![Value::Int(3), Value::Int(4)]));
}

#[test]
fn test_unambiguous_abbreviated_prefix() {
    let mut registry = registry();
    registry
        .register(CommandDecl::function(
            "enroll",
            vec![
                ParamSpec::structured(
                    "person",
                    StructSchema::new("Person").field(
                        "name",
                        FieldKind::Str,
                        Value::Str("anon".into()),
                    ),
                ),
                ParamSpec::structured(
                    "school",
                    StructSchema::new("School").field(
                        "name",
                        FieldKind::Str,
                        Value::Str("none".into()),
                    ),
                ),
            ],
            |args| {
                let person = args.get("person").unwrap().get_path(&["name"]).unwrap().clone();
                let school = args.get("school").unwrap().get_path(&["name"]).unwrap().clone();
                Ok(Value::List(vec![person, school]))
            },
        ))
        .unwrap();
    let result = registry
        .wake(["enroll", "p::name=alice", "s::name=mit"])
        .unwrap();
    assert_eq!(
        result,
        Value::List(vec![Value::Str("alice".into()), Value::Str("mit".into())])
    );
}

#[test]
fn test_typed_config_ignores_unknown_override_key() {
    let mut registry = registry();
    registry
        .register(CommandDecl::function(
            "cmd",
            vec![ParamSpec::structured("cfg", xy_schema("Cfg"))],
            |args| {
                let cfg = args.get("cfg").unwrap();
                assert_eq!(cfg.get_path(&["x"]), Some(&Value::Int(1)));
                assert_eq!(cfg.get_path(&["y"]), None);
                Ok(Value::Bool(true))
            },
        ))
        .unwrap();
    // y=2 matches nothing; no error, no y anywhere.
    let result = registry.wake(["cmd", "x=1", "y=2"]).unwrap();
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn test_typed_and_variadic_kwargs_share_an_override() {
    // A typed config and the keyword-variadic catch-all both accept y.
    let schema = StructSchema::new("Cfg").field("y", FieldKind::Float, Value::Float(3.14));
    let mut registry = registry();
    registry
        .register(CommandDecl::function(
            "cmd",
            vec![
                ParamSpec::structured("cfg", schema),
                ParamSpec::var_kwargs("kwargs"),
            ],
            |args| {
                assert_eq!(
                    args.get("cfg").unwrap().get_path(&["y"]),
                    Some(&Value::Float(2.0))
                );
                assert_eq!(args.kwargs.get("y"), Some(&Value::Int(2)));
                assert_eq!(args.kwargs.get("x"), Some(&Value::Int(1)));
                Ok(Value::Bool(true))
            },
        ))
        .unwrap();
    let result = registry.wake(["cmd", "x=1", "y=2"]).unwrap();
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn test_kwargs_override_colliding_with_declared_parameter() {
    let mut registry = registry();
    registry
        .register(CommandDecl::function(
            "cmd",
            vec![
                ParamSpec::regular("x", Some(Value::Int(0))),
                ParamSpec::var_kwargs("kwargs"),
            ],
            |_| Ok(Value::Null),
        ))
        .unwrap();
    let err = registry.wake(["cmd", "kwargs::x=1"]).unwrap_err();
    assert!(matches!(err, WakeError::ParameterCollision(name) if name == "x"));
}

#[test]
fn test_list_config_replaced_wholesale() {
    let seed = invoke_hook(|state| {
        state
            .params
            .configs_mut()
            .get_mut("items")
            .unwrap()
            .set(Variant::Base, Value::List(vec![Value::Int(1), Value::Int(2)]));
        Ok(())
    });
    let mut registry = registry();
    registry
        .register(
            CommandDecl::function("cmd", vec![ParamSpec::list("items")], |args| {
                Ok(args.get("items").unwrap().clone())
            })
            .with_hooks(Hooks {
                pre_config: seed,
                ..Default::default()
            }),
        )
        .unwrap();
    let result = registry.wake(["cmd", "3", "4", "5"]).unwrap();
    assert_eq!(
        result,
        Value::List(vec![Value::Int(3), Value::Int(4), Value::Int(5)])
    );
}

#[test]
fn test_inline_parameter_end_to_end() {
    let schema = StructSchema::new("Cfg").field("y", FieldKind::Float, Value::Float(3.14));
    let mut registry = registry();
    registry
        .register(
            CommandDecl::function(
                "cmd",
                vec![
                    ParamSpec::structured("cfg", schema),
                    ParamSpec::regular("data", Some(Value::Null)),
                    ParamSpec::annotated(
                        "out_file",
                        FieldKind::Str,
                        Some(Value::Str("out.txt".into())),
                    ),
                    ParamSpec::var_args("args"),
                    ParamSpec::var_kwargs("kwargs"),
                ],
                |args| {
                    assert_eq!(
                        args.get("cfg").unwrap().get_path(&["y"]),
                        Some(&Value::Float(2.0))
                    );
                    assert_eq!(args.get("data"), Some(&Value::Null));
                    assert_eq!(args.get("out_file"), Some(&Value::Str("foo.txt".into())));
                    assert!(args.args.is_empty());
                    assert_eq!(args.kwargs.get("x"), Some(&Value::Int(1)));
                    assert_eq!(args.kwargs.get("y"), Some(&Value::Int(2)));
                    Ok(Value::Bool(true))
                },
            )
            .with_options(SignatureOptions {
                args_as_config: false,
                inline: vec![InlineParam::new("out_file")],
                ..Default::default()
            }),
        )
        .unwrap();
    // The list-like token has no sequence config to land in; prefixing the
    // inline override keeps kwargs from also absorbing out_file.
    let result = registry
        .wake(["cmd", "x=1", "y=2", "z", "inline::out_file=foo.txt"])
        .unwrap();
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn test_hook_error_aborts_before_run() {
    let ran = Arc::new(AtomicBool::new(false));
    let ran_in_command = Arc::clone(&ran);
    let failing = invoke_hook(|_| {
        Err(WakeError::HookProtocol {
            slot: "pre-run",
            position: 0,
            reason: "halt".to_string(),
        })
    });
    let mut registry = registry();
    registry
        .register(
            CommandDecl::function("cmd", Vec::new(), move |_| {
                ran_in_command.store(true, Ordering::SeqCst);
                Ok(Value::Null)
            })
            .with_hooks(Hooks {
                pre_run: failing,
                ..Default::default()
            }),
        )
        .unwrap();
    let err = registry.wake(["cmd"]).unwrap_err();
    assert!(matches!(err, WakeError::HookProtocol { slot: "pre-run", .. }));
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn test_shared_hooks_reach_every_command() {
    let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let shared = Hooks {
        post_config: invoke_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        ..Hooks::shared_defaults()
    };
    let mut registry = Registry::new("app").with_shared_hooks(shared);
    registry
        .register(CommandDecl::function("cmd", Vec::new(), |_| Ok(Value::Null)))
        .unwrap();
    registry.wake(["cmd"]).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_skip_sentinel_disables_run_phase() {
    let mut registry = registry();
    registry
        .register(
            CommandDecl::function("cmd", Vec::new(), |_| Ok(Value::Int(9)))
                .with_hooks(Hooks {
                    run: HookTree::Skip,
                    ..Default::default()
                }),
        )
        .unwrap();
    // The run slot contributed nothing; there is no result.
    let result = registry.wake(["cmd"]).unwrap();
    assert_eq!(result, Value::Null);
}

#[test]
fn test_instance_command_init_and_run_phases() {
    struct Job {
        size: i64,
    }
    impl rouse::Runnable for Job {
        fn invoke(&mut self) -> Result<Value, WakeError> {
            Ok(Value::Int(self.size * 2))
        }
    }
    let schema = StructSchema::new("Job").field("size", FieldKind::Int, Value::Int(5));
    let mut registry = registry();
    registry
        .register(CommandDecl::instance(
            "job",
            vec![ParamSpec::structured("cfg", schema)],
            |args| {
                let size = args
                    .get("cfg")
                    .and_then(|c| c.get_path(&["size"]))
                    .and_then(Value::as_int)
                    .unwrap_or(0);
                Ok(Box::new(Job { size }) as Box<dyn rouse::Runnable>)
            },
        ))
        .unwrap();
    let result = registry.wake(["job", "size=21"]).unwrap();
    assert_eq!(result, Value::Int(42));
}
