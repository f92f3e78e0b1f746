//! Transform System
//!
//! Propagates local transforms into world matrices. Decoupled from
//! [`Scene`](crate::scene::Scene) so it only borrows the node storage.
//!
//! Pose application relies on [`update_subtree`] running synchronously:
//! callers read world-space bone positions (camera framing, snapshots) right
//! after a pose is applied, before any render tick.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::NodeHandle;
use crate::scene::node::Node;

/// Updates the world matrices of every hierarchy reachable from `roots`.
///
/// Uses an explicit stack instead of recursion so deep skeletons (finger
/// chains under long spines) cannot overflow the call stack.
pub fn update_hierarchy(nodes: &mut SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) {
    // Work stack: (node, parent world matrix, parent changed)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false));
    }

    propagate(nodes, &mut stack);
}

/// Updates `root_handle` and its descendants, starting from the parent's
/// current world matrix. The subtree is always rewritten, dirty or not.
pub fn update_subtree(nodes: &mut SlotMap<NodeHandle, Node>, root_handle: NodeHandle) {
    let Some(node) = nodes.get(root_handle) else {
        return;
    };

    let parent_world = node
        .parent
        .and_then(|parent| nodes.get(parent))
        .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix);

    let mut stack = vec![(root_handle, parent_world, true)];
    propagate(nodes, &mut stack);
}

fn propagate(nodes: &mut SlotMap<NodeHandle, Node>, stack: &mut Vec<(NodeHandle, Affine3A, bool)>) {
    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        // 1. Local matrix (dirty-checked)
        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        // 2. World matrix
        if world_needs_update {
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);
        }

        // 3. Children, pushed in reverse to keep document order
        let current_world = node.transform.world_matrix;
        for &child_handle in node.children.iter().rev() {
            stack.push((child_handle, current_world, world_needs_update));
        }
    }
}

/// Composes local TRS up the parent chain without touching cached matrices.
///
/// Useful for read-only scenes (e.g. source motion rest poses) that were
/// never propagated.
#[must_use]
pub fn compute_world_matrix(nodes: &SlotMap<NodeHandle, Node>, handle: NodeHandle) -> Option<Affine3A> {
    let mut node = nodes.get(handle)?;
    let mut world = local_of(node);

    while let Some(parent) = node.parent.and_then(|p| nodes.get(p)) {
        world = local_of(parent) * world;
        node = parent;
    }

    Some(world)
}

fn local_of(node: &Node) -> Affine3A {
    let t = &node.transform;
    Affine3A::from_scale_rotation_translation(t.scale, t.rotation, t.position)
}
