//! Asset loading
//!
//! Turns glTF, GLB and VRM bytes into the crate's runtime types:
//! - [`load_rig`]: an avatar with its humanoid layer bound
//! - [`load_source_motion`]: a motion skeleton with its clips
//!
//! Loaders work on bytes already in memory. Callers own file and network
//! access.

#[cfg(feature = "gltf")]
pub mod gltf;

#[cfg(feature = "gltf")]
pub use self::gltf::{GltfLoader, load_rig, load_source_motion};
