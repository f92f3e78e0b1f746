//! Transform & Transform System Tests
//!
//! Tests for:
//! - Transform dirty checking and TRS matrices
//! - Euler helpers
//! - Hierarchy propagation (full scene and subtree)
//! - Uncached world matrix composition
//! - Deep chains without recursion

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3};

use poselab::scene::{Node, NodeHandle, Scene, Transform};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Same rotation, either sign.
fn quat_approx(a: Quat, b: Quat) -> bool {
    a.dot(b).abs() > 1.0 - EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

/// Chain of `length` nodes, each offset +1 on X from its parent.
fn create_chain(length: usize) -> (Scene, Vec<NodeHandle>) {
    let mut scene = Scene::new();
    let mut handles: Vec<NodeHandle> = Vec::with_capacity(length);

    for i in 0..length {
        let mut node = Node::with_name(format!("Joint{i}"));
        node.transform.position = Vec3::X;
        let handle = match handles.last() {
            Some(&parent) => scene.add_to_parent(node, parent),
            None => scene.add_node(node),
        };
        handles.push(handle);
    }

    (scene, handles)
}

// ============================================================================
// Transform Unit Tests
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let t = Transform::new();
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);
}

#[test]
fn transform_update_local_matrix_dirty_check() {
    let mut t = Transform::new();

    // First call always rebuilds
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.position = Vec3::new(1.0, 2.0, 3.0);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.rotation = Quat::from_rotation_y(FRAC_PI_2);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.scale = Vec3::splat(2.0);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());
}

#[test]
fn transform_mark_dirty_forces_update() {
    let mut t = Transform::new();
    t.update_local_matrix();
    t.mark_dirty();
    assert!(t.update_local_matrix());
}

#[test]
fn transform_local_matrix_reflects_trs() {
    let mut t = Transform::from_trs(Vec3::new(10.0, 20.0, 30.0), Quat::IDENTITY, Vec3::splat(2.0));
    t.update_local_matrix();

    let mat = Mat4::from(*t.local_matrix());
    assert!(vec3_approx(mat.w_axis.truncate(), Vec3::new(10.0, 20.0, 30.0)));
    assert!(vec3_approx(mat.x_axis.truncate(), Vec3::new(2.0, 0.0, 0.0)));
}

#[test]
fn transform_euler_roundtrip() {
    let mut t = Transform::new();
    let (x, y, z) = (0.3, 0.7, 1.2);
    t.set_rotation_euler(x, y, z);

    let euler = t.rotation_euler();
    assert!(approx_eq(euler.x, x));
    assert!(approx_eq(euler.y, y));
    assert!(approx_eq(euler.z, z));
}

// ============================================================================
// Hierarchy Propagation
// ============================================================================

#[test]
fn hierarchy_chain_world_positions() {
    let (mut scene, handles) = create_chain(5);
    scene.update_matrix_world();

    for (i, &handle) in handles.iter().enumerate() {
        let world_x = scene.get_node(handle).unwrap().transform.world_position().x;
        let expected_x = (i + 1) as f32;
        assert!(approx_eq(world_x, expected_x), "Node {i}: expected x={expected_x}, got x={world_x}");
    }
}

#[test]
fn hierarchy_with_rotation_and_scale() {
    let (mut scene, handles) = create_chain(2);
    {
        let root = &mut scene.get_node_mut(handles[0]).unwrap().transform;
        root.rotation = Quat::from_rotation_z(FRAC_PI_2);
        root.scale = Vec3::splat(2.0);
    }
    scene.update_matrix_world();

    // Child offset (1,0,0) scaled by 2, turned onto +Y, plus root at (1,0,0)
    let child = scene.get_node(handles[1]).unwrap();
    assert!(vec3_approx(child.transform.world_position(), Vec3::new(1.0, 2.0, 0.0)));
    assert!(quat_approx(child.transform.world_rotation(), Quat::from_rotation_z(FRAC_PI_2)));
}

#[test]
fn hierarchy_subtree_update() {
    let (mut scene, handles) = create_chain(4);
    scene.update_matrix_world();

    // Change the middle node, then propagate only its subtree
    scene.get_node_mut(handles[1]).unwrap().transform.position = Vec3::new(1.0, 5.0, 0.0);
    scene.update_subtree(handles[1]);

    let last = scene.get_node(handles[3]).unwrap().transform.world_position();
    assert!(vec3_approx(last, Vec3::new(4.0, 5.0, 0.0)), "got {last}");
    let first = scene.get_node(handles[0]).unwrap().transform.world_position();
    assert!(vec3_approx(first, Vec3::X));
}

#[test]
fn unchanged_parent_does_not_rebuild_clean_children() {
    let (mut scene, handles) = create_chain(3);
    scene.update_matrix_world();

    scene.get_node_mut(handles[2]).unwrap().transform.position = Vec3::new(0.0, 1.0, 0.0);
    scene.update_matrix_world();

    let last = scene.get_node(handles[2]).unwrap().transform.world_position();
    assert!(vec3_approx(last, Vec3::new(2.0, 1.0, 0.0)));
}

#[test]
fn compute_world_matrix_ignores_stale_cache() {
    let (mut scene, handles) = create_chain(3);
    scene.update_matrix_world();

    scene.get_node_mut(handles[0]).unwrap().transform.rotation = Quat::from_rotation_y(FRAC_PI_2);

    let computed = scene.compute_world_matrix(handles[2]).unwrap();
    // (1,0,0) + R_y(90)*(2,0,0) = (1,0,-2)
    assert!(vec3_approx(computed.translation.into(), Vec3::new(1.0, 0.0, -2.0)));
    // Cache is still the pre-rotation result
    let cached = scene.get_node(handles[2]).unwrap().transform.world_position();
    assert!(vec3_approx(cached, Vec3::new(3.0, 0.0, 0.0)));

    let rotation = scene.compute_world_rotation(handles[2]).unwrap();
    assert!(quat_approx(rotation, Quat::from_rotation_y(FRAC_PI_2)));
}

#[test]
fn identity_hierarchy_produces_identity_world() {
    let mut scene = Scene::new();
    let root = scene.create_node_with_name("Root");
    let child = scene.add_to_parent(Node::with_name("Child"), root);
    scene.update_matrix_world();

    let world = *scene.get_node(child).unwrap().world_matrix();
    assert!(vec3_approx(world.translation.into(), Vec3::ZERO));
}

#[test]
fn deeply_nested_hierarchy_no_stack_overflow() {
    let depth = 500;
    let (mut scene, handles) = create_chain(depth);
    scene.update_matrix_world();

    let last = scene.get_node(*handles.last().unwrap()).unwrap();
    let expected = depth as f32;
    assert!(
        approx_eq(last.transform.world_position().x, expected),
        "expected {expected}, got {}",
        last.transform.world_position().x
    );
}
