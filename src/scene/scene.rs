use glam::{Affine3A, Quat};
use slotmap::SlotMap;

use crate::scene::bounds::BoundingBox;
use crate::scene::node::Node;
use crate::scene::transform_system;
use crate::scene::NodeHandle;

/// Scene graph container.
///
/// Stores nodes in a slot map and keeps the list of top-level nodes.
/// A rig, a source motion and a test fixture each own one `Scene`.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
        }
    }

    // ========================================================================
    // Node creation & hierarchy
    // ========================================================================

    /// Adds a node at the top level of the scene.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Creates a named top-level node with an identity transform.
    pub fn create_node_with_name(&mut self, name: &str) -> NodeHandle {
        self.add_node(Node::with_name(name))
    }

    /// Inserts `child` directly under `parent`.
    pub fn add_to_parent(&mut self, child: Node, parent: NodeHandle) -> NodeHandle {
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
            self.nodes[handle].parent = Some(parent);
        } else {
            self.root_nodes.push(handle);
        }
        handle
    }

    /// Re-parents `child` under `parent`, detaching it from its previous
    /// parent or from the top-level list. Attaching a node to itself or to
    /// one of its descendants is ignored.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent || !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            return;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Refusing to attach a node beneath its own descendant");
            return;
        }

        self.detach(child);

        self.nodes[parent].children.push(child);
        let node = &mut self.nodes[child];
        node.parent = Some(parent);
        node.transform.mark_dirty();
    }

    fn detach(&mut self, child: NodeHandle) {
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(old_parent) = old_parent {
            if let Some(p) = self.nodes.get_mut(old_parent)
                && let Some(pos) = p.children.iter().position(|&c| c == child)
            {
                p.children.remove(pos);
            }
        } else if let Some(pos) = self.root_nodes.iter().position(|&r| r == child) {
            self.root_nodes.remove(pos);
        }
    }

    /// Returns `true` if `ancestor` lies on the parent chain of `node`
    /// (a node is its own ancestor).
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(|n| n.parent);
        }
        false
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[must_use]
    pub fn get_name(&self, handle: NodeHandle) -> Option<&str> {
        self.nodes.get(handle).map(|n| n.name.as_str())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Depth-first pre-order search for the first node named `name` in the
    /// subtree rooted at `root` (the root itself included).
    #[must_use]
    pub fn find_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if node.name == name {
                return Some(handle);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Follows a slash-delimited path of node names downward from `root`.
    ///
    /// The path does not include the root's own name; the empty path
    /// resolves to `root`. Mirrors [`Scene::node_path`].
    #[must_use]
    pub fn find_by_path(&self, root: NodeHandle, path: &str) -> Option<NodeHandle> {
        let mut current = root;
        self.nodes.get(root)?;

        if path.is_empty() {
            return Some(root);
        }

        for segment in path.split('/') {
            let node = self.nodes.get(current)?;
            current = node
                .children
                .iter()
                .copied()
                .find(|&c| self.nodes.get(c).is_some_and(|n| n.name == segment))?;
        }
        Some(current)
    }

    /// Slash-delimited path of node names from `root` (exclusive) down to
    /// `node` (inclusive), e.g. `Armature/Hips/Spine`.
    ///
    /// Returns `None` when `node` is not a descendant of `root`, e.g. when it
    /// belongs to another hierarchy.
    #[must_use]
    pub fn node_path(&self, node: NodeHandle, root: NodeHandle) -> Option<String> {
        let mut segments: Vec<&str> = Vec::new();
        let mut current = Some(node);

        while let Some(handle) = current {
            if handle == root {
                segments.reverse();
                return Some(segments.join("/"));
            }
            let n = self.nodes.get(handle)?;
            segments.push(&n.name);
            current = n.parent;
        }

        None
    }

    /// All nodes of the subtree rooted at `root`, in depth-first pre-order.
    #[must_use]
    pub fn descendants(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            out.push(handle);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Propagates every hierarchy in the scene.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy(&mut self.nodes, &self.root_nodes);
    }

    /// Propagates the subtree rooted at `root`.
    pub fn update_subtree(&mut self, root: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, root);
    }

    /// World matrix composed from local transforms, independent of the
    /// propagation cache.
    #[must_use]
    pub fn compute_world_matrix(&self, node: NodeHandle) -> Option<Affine3A> {
        transform_system::compute_world_matrix(&self.nodes, node)
    }

    /// World rotation composed from local transforms.
    #[must_use]
    pub fn compute_world_rotation(&self, node: NodeHandle) -> Option<Quat> {
        let mut rotation = self.nodes.get(node)?.transform.rotation;
        let mut current = self.nodes[node].parent;
        while let Some(parent) = current.and_then(|p| self.nodes.get(p)) {
            rotation = parent.transform.rotation * rotation;
            current = parent.parent;
        }
        Some(rotation)
    }

    /// Tight world bounds over the node origins of the subtree at `root`,
    /// as of the last propagation.
    #[must_use]
    pub fn world_bounds(&self, root: NodeHandle) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.descendants(root)
                .into_iter()
                .filter_map(|h| self.nodes.get(h))
                .map(|n| n.transform.world_position()),
        )
    }
}
