//! Sentinel trees and their resolution into flat hook sequences.

use rouse_core::WakeError;

/// A hook declaration: a concrete callable, one of the three sentinels, or
/// an ordered sequence of further declarations (recursion unbounded).
///
/// Sentinels are interpreted in exactly one place, [`resolve`]; nothing
/// else in the system ever sees one.
#[derive(Clone)]
pub enum HookTree<F> {
    /// A concrete hook.
    Hook(F),
    /// Defer to the enclosing scope's resolved sequence for this slot.
    /// Not legal inside the shared scope itself.
    Shared,
    /// Use the slot's pre-built default hook (a no-op for pre/post slots,
    /// which have no default).
    Default,
    /// Contribute nothing, preserving phase ordering without effect.
    Skip,
    Seq(Vec<HookTree<F>>),
}

impl<F> HookTree<F> {
    pub fn hook(f: F) -> Self {
        HookTree::Hook(f)
    }

    pub fn seq(items: impl IntoIterator<Item = HookTree<F>>) -> Self {
        HookTree::Seq(items.into_iter().collect())
    }
}

impl<F> std::fmt::Debug for HookTree<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookTree::Hook(_) => write!(f, "Hook(..)"),
            HookTree::Shared => write!(f, "Shared"),
            HookTree::Default => write!(f, "Default"),
            HookTree::Skip => write!(f, "Skip"),
            HookTree::Seq(items) => f.debug_list().entries(items.iter()).finish(),
        }
    }
}

/// Flattens a sentinel tree into an ordered sequence of concrete hooks.
///
/// Depth-first, left-to-right; relative order of non-skipped leaves is
/// preserved exactly, and resolving twice with the same inputs yields the
/// same sequence. `shared` is `None` when resolving the shared scope
/// itself, where the `Shared` sentinel is illegal.
pub fn resolve<F: Clone>(
    tree: &HookTree<F>,
    shared: Option<&[F]>,
    default: Option<&F>,
    slot: &'static str,
) -> Result<Vec<F>, WakeError> {
    let mut out = Vec::new();
    let mut position = 0usize;
    flatten(tree, shared, default, slot, &mut out, &mut position)?;
    Ok(out)
}

fn flatten<F: Clone>(
    tree: &HookTree<F>,
    shared: Option<&[F]>,
    default: Option<&F>,
    slot: &'static str,
    out: &mut Vec<F>,
    position: &mut usize,
) -> Result<(), WakeError> {
    match tree {
        HookTree::Hook(f) => {
            out.push(f.clone());
            *position += 1;
        }
        HookTree::Skip => {
            *position += 1;
        }
        HookTree::Default => {
            if let Some(d) = default {
                out.push(d.clone());
            }
            *position += 1;
        }
        HookTree::Shared => {
            let Some(shared) = shared else {
                return Err(WakeError::HookProtocol {
                    slot,
                    position: *position,
                    reason: "SHARED sentinel is not legal in the shared scope".to_string(),
                });
            };
            out.extend_from_slice(shared);
            *position += 1;
        }
        HookTree::Seq(items) => {
            for item in items {
                flatten(item, shared, default, slot, out, position)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    type Tag = &'static str;

    fn resolve_tags(
        tree: &HookTree<Tag>,
        shared: Option<&[Tag]>,
        default: Option<&Tag>,
    ) -> Result<Vec<Tag>, WakeError> {
        resolve(tree, shared, default, "test")
    }

    #[test]
    fn test_single_hook() {
        let tree = HookTree::hook("a");
        assert_eq!(resolve_tags(&tree, None, None).unwrap(), vec!["a"]);
    }

    #[test]
    fn test_skip_contributes_nothing() {
        let tree = HookTree::seq([HookTree::hook("a"), HookTree::Skip, HookTree::hook("b")]);
        assert_eq!(resolve_tags(&tree, None, None).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_default_substitution() {
        let tree = HookTree::seq([HookTree::Default, HookTree::hook("a")]);
        assert_eq!(
            resolve_tags(&tree, None, Some(&"dflt")).unwrap(),
            vec!["dflt", "a"]
        );
    }

    #[test]
    fn test_default_without_default_contributes_nothing() {
        let tree: HookTree<Tag> = HookTree::Default;
        assert!(resolve_tags(&tree, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_shared_splices_sequence() {
        let tree = HookTree::seq([HookTree::hook("a"), HookTree::Shared, HookTree::hook("b")]);
        assert_eq!(
            resolve_tags(&tree, Some(&["s1", "s2"]), None).unwrap(),
            vec!["a", "s1", "s2", "b"]
        );
    }

    #[test]
    fn test_shared_in_shared_scope_is_an_error() {
        let tree: HookTree<Tag> = HookTree::seq([HookTree::hook("a"), HookTree::Shared]);
        let err = resolve_tags(&tree, None, None).unwrap_err();
        assert!(matches!(
            err,
            WakeError::HookProtocol { slot: "test", position: 1, .. }
        ));
    }

    #[test]
    fn test_nested_sequences_flatten_in_order() {
        let tree = HookTree::seq([
            HookTree::Default,
            HookTree::seq([
                HookTree::Shared,
                HookTree::seq([HookTree::hook("x"), HookTree::Skip]),
            ]),
            HookTree::hook("y"),
        ]);
        assert_eq!(
            resolve_tags(&tree, Some(&["s"]), Some(&"d")).unwrap(),
            vec!["d", "s", "x", "y"]
        );
    }

    #[test]
    fn test_empty_sequence_contributes_nothing() {
        let tree: HookTree<Tag> = HookTree::seq([]);
        assert!(resolve_tags(&tree, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let tree = HookTree::seq([
            HookTree::hook("a"),
            HookTree::Shared,
            HookTree::seq([HookTree::hook("b")]),
        ]);
        let first = resolve_tags(&tree, Some(&["s"]), None).unwrap();
        let second = resolve_tags(&tree, Some(&["s"]), None).unwrap();
        assert_eq!(first, second);
    }
}
