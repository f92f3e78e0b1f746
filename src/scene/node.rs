use crate::scene::NodeHandle;
use crate::scene::transform::Transform;
use glam::Affine3A;

/// A minimal scene node: a name, hierarchy links and a transform.
///
/// Nodes form a tree through parent-child relationships:
/// - `parent`: optional handle to the parent node (`None` for root nodes)
/// - `children`: ordered list of child node handles
///
/// Names are not required to be unique. Name lookups in [`Scene`](crate::scene::Scene)
/// return the first match in depth-first pre-order.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node name as authored in the source asset
    pub name: String,

    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    // === Core Spatial Data ===
    /// Transform component
    pub transform: Transform,
}

impl Node {
    /// Creates a new unnamed node with an identity transform.
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("")
    }

    /// Creates a new node with the given name and an identity transform.
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Returns a reference to the world transformation matrix.
    ///
    /// Only valid after the transform system has propagated the hierarchy.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
