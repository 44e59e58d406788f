// ============================================================================
// spark-tree - Mutation Resolver
// Apply one queued record to the raw data and rewrap the node path
// ============================================================================
//
// For a path [k0, ..., kn]:
//
// 1. Walk k0..k(n-1) down the node tree. Each node's value is the raw
//    container at that position, so the node walk and the raw walk are the
//    same walk.
// 2. Apply the record to the parent's raw container under kn and build a
//    fresh node for the result.
// 3. On the way back up, replace the parent and every ancestor with a shallow
//    clone that has the one changed child swapped in. Siblings are shared.
//
// Every check happens before the raw write, so a record that fails leaves
// both the data and the node tree exactly as they were.
// ============================================================================

use std::cmp::Ordering;
use std::rc::Weak;

use crate::core::error::{TreeError, TreeResult};
use crate::primitives::node::{expected_kind, Node};
use crate::primitives::tree::TreeInner;
use crate::reactivity::batching::{Mutation, Op};
use crate::value::{Path, Seg, Value};

// =============================================================================
// RESOLVE
// =============================================================================

/// Apply `mutation` and return the new root node.
pub(crate) fn resolve(tree: &Weak<TreeInner>, root: &Node, mutation: Mutation) -> TreeResult<Node> {
    let Mutation { path, op } = mutation;
    match path.segments().split_last() {
        None => apply_to_root(tree, root, op),
        Some((last, ancestors)) => rewrap(root, ancestors, |parent| {
            apply_to_child(tree, parent, last, &path, op)
        }),
    }
}

/// Walk `ancestors` from `node`, let `apply` produce the new parent, and
/// shallow-clone every node on the way back up.
fn rewrap<F>(node: &Node, ancestors: &[Seg], apply: F) -> TreeResult<Node>
where
    F: FnOnce(&Node) -> TreeResult<Node>,
{
    match ancestors.split_first() {
        None => apply(node),
        Some((seg, rest)) => {
            let child = descend(node, seg)?;
            let next_child = rewrap(child, rest, apply)?;
            node.with_child(seg, next_child)
        }
    }
}

/// The existing child at `seg`, or why there is none.
fn descend<'a>(node: &'a Node, seg: &Seg) -> TreeResult<&'a Node> {
    let expected = expected_kind(seg);
    if node.kind() != expected {
        return Err(TreeError::type_mismatch(node.path().clone(), expected, node.kind()));
    }
    node.get(seg.clone())
        .ok_or_else(|| TreeError::path_not_found(node.path().child(seg.clone())))
}

// =============================================================================
// APPLY
// =============================================================================

/// Apply `op` to `parent[last]` and return the rewrapped parent.
fn apply_to_child(
    tree: &Weak<TreeInner>,
    parent: &Node,
    last: &Seg,
    path: &Path,
    op: Op,
) -> TreeResult<Node> {
    let expected = expected_kind(last);
    if parent.kind() != expected {
        return Err(TreeError::type_mismatch(parent.path().clone(), expected, parent.kind()));
    }

    let container = parent.value();
    let current = container.child(last);

    let next = match op {
        Op::Set(next) => {
            check_slot(container, last, path)?;
            write(container, last, next.clone());
            next
        }
        Op::Update(f) => {
            let current = current.ok_or_else(|| TreeError::path_not_found(path.clone()))?;
            let next = f(&current).map_err(|message| TreeError::update_failed(path.clone(), message))?;
            write(container, last, next.clone());
            next
        }
        Op::Push(item) => {
            let current = current.ok_or_else(|| TreeError::path_not_found(path.clone()))?;
            push_into(&current, item, path)?;
            current
        }
    };

    let child = Node::build(tree, next, path.clone());
    parent.with_child(last, child)
}

/// Apply `op` to the root itself.
fn apply_to_root(tree: &Weak<TreeInner>, root: &Node, op: Op) -> TreeResult<Node> {
    let next = match op {
        Op::Set(next) => next,
        Op::Update(f) => f(root.value())
            .map_err(|message| TreeError::update_failed(Path::root(), message))?,
        Op::Push(item) => {
            push_into(root.value(), item, &Path::root())?;
            root.value().clone()
        }
    };
    Ok(Node::build(tree, next, Path::root()))
}

// =============================================================================
// RAW WRITES
// =============================================================================

/// Fail unless `container[seg]` can be written: any map key, or a list index
/// up to and including the current length.
fn check_slot(container: &Value, seg: &Seg, path: &Path) -> TreeResult<()> {
    match (container, seg) {
        (Value::List(list), Seg::Index(i)) if *i > list.len() => Err(
            TreeError::index_out_of_bounds(path.parent().unwrap_or_default(), *i, list.len()),
        ),
        _ => Ok(()),
    }
}

/// Write `next` into `container[seg]` in place. Kinds are checked by the caller.
fn write(container: &Value, seg: &Seg, next: Value) {
    match (container, seg) {
        (Value::Map(map), Seg::Key(k)) => {
            map.insert(k.clone(), next);
        }
        (Value::List(list), Seg::Index(i)) => match i.cmp(&list.len()) {
            Ordering::Less => {
                list.replace(*i, next);
            }
            Ordering::Equal => list.push(next),
            Ordering::Greater => {}
        },
        _ => {}
    }
}

/// Append `item` to `target` in place; the list keeps its identity.
///
/// Failures are logged by the tree when it reports them.
fn push_into(target: &Value, item: Value, path: &Path) -> TreeResult<()> {
    match target {
        Value::List(list) => {
            list.push(item);
            Ok(())
        }
        other => Err(TreeError::invalid_push_target(path.clone(), other.kind())),
    }
}

// =============================================================================
// TESTS
// =============================================================================
