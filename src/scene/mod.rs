//! Scene graph module
//!
//! Hierarchical node storage shared by rigs and source motions:
//! - Node: scene node (name, parent/child links, transform)
//! - Transform: TRS component with cached local and world matrices
//! - Scene: slot-map backed node container with name and path queries
//! - TransformSystem: local-to-world propagation, decoupled from `Scene`
//! - Camera: perspective camera used for pose framing

pub mod bounds;
pub mod camera;
pub mod node;
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use bounds::BoundingBox;
pub use camera::{Camera, FramingConfig};
pub use node::Node;
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a node stored in a [`Scene`].
    pub struct NodeHandle;
}
