use cgmath::{EuclideanSpace, Matrix4, Point3, Quaternion, Vector3};
use std::cell::Cell;

use super::InstanceId;
use crate::common::Aabb;

/// Unique identifier for a Node in the scene tree.
pub type NodeId = u32;

/// A node in the scene tree hierarchy.
///
/// Nodes carry a parent-relative TRS transform and may reference an instance
/// to be rendered. World transforms and subtree bounds are cached and
/// invalidated on mutation.
#[derive(Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: Option<String>,

    // Local transform components
    position: Point3<f32>,
    rotation: Quaternion<f32>,
    scale: Vector3<f32>,

    // Hierarchy
    parent: Option<NodeId>,
    children: Vec<NodeId>,

    // Content: This node can reference an instance to be rendered
    instance: Option<InstanceId>,

    // Cached computed values (for optimization)
    cached_world_transform: Cell<Option<Matrix4<f32>>>,
    cached_bounds: Cell<Option<Aabb>>,
}

impl Node {
    /// Creates a new node with the given transform components.
    pub fn new(
        id: NodeId,
        name: Option<String>,
        position: Point3<f32>,
        rotation: Quaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            id,
            name,
            position,
            rotation,
            scale,
            parent: None,
            children: Vec::new(),
            instance: None,
            cached_world_transform: Cell::new(None),
            cached_bounds: Cell::new(None),
        }
    }

    /// Creates a new node with default transform (identity).
    pub fn new_default(id: NodeId) -> Self {
        Self::new(
            id,
            None,
            Point3::new(0.0, 0.0, 0.0),
            Quaternion::new(1.0, 0.0, 0.0, 0.0), // Identity quaternion
            Vector3::new(1.0, 1.0, 1.0),
        )
    }

    /// Computes the local transform matrix from position, rotation, and scale.
    ///
    /// The order of operations is: Translation * Rotation * Scale (TRS)
    pub fn compute_local_transform(&self) -> Matrix4<f32> {
        let translation = Matrix4::from_translation(self.position.to_vec());
        let rotation = Matrix4::from(self.rotation);
        let scale = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);

        translation * rotation * scale
    }

    // Getters and setters for transform components

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Point3<f32>) {
        self.position = position;
        self.mark_transform_dirty();
        self.mark_bounds_dirty();
    }

    pub fn rotation(&self) -> Quaternion<f32> {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quaternion<f32>) {
        self.rotation = rotation;
        self.mark_transform_dirty();
        self.mark_bounds_dirty();
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
        self.mark_transform_dirty();
        self.mark_bounds_dirty();
    }

    // Hierarchy management

    /// Gets the parent node ID.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Sets the parent node ID (internal use only - use Scene methods to maintain consistency).
    pub(super) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
        self.mark_transform_dirty();
        self.mark_bounds_dirty();
    }

    /// Gets the list of child node IDs.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Adds a child node ID to this node's children list (internal use only - use Scene methods to maintain consistency).
    pub(super) fn add_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
            self.mark_bounds_dirty();
        }
    }

    /// Removes a child node ID from this node's children list (internal use only - use Scene methods to maintain consistency).
    pub(super) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&id| id != child);
        self.mark_bounds_dirty();
    }

    // Instance reference

    pub fn instance(&self) -> Option<InstanceId> {
        self.instance
    }

    pub fn set_instance(&mut self, instance: Option<InstanceId>) {
        self.instance = instance;
        // Only invalidate bounds, not transform (instance doesn't affect transform)
        self.cached_bounds.set(None);
    }

    /// Marks this node's world transform as dirty (needs recomputation).
    /// Note: This only marks this node, not descendants. The Scene is responsible
    /// for propagating dirty flags to children.
    pub(super) fn mark_transform_dirty(&self) {
        self.cached_world_transform.set(None);
    }

    /// Marks this node's bounds as dirty (needs recomputation).
    /// Note: This only marks this node, not descendants.
    pub(super) fn mark_bounds_dirty(&self) {
        self.cached_bounds.set(None);
    }

    pub fn transform_dirty(&self) -> bool {
        self.cached_world_transform.get().is_none()
    }

    pub fn bounds_dirty(&self) -> bool {
        self.cached_bounds.get().is_none()
    }

    /// Gets the cached world transform if valid
    /// You probably want [crate::Scene::nodes_transform]
    pub fn cached_world_transform(&self) -> Option<Matrix4<f32>> {
        self.cached_world_transform.get()
    }

    /// Sets the cached world transform
    pub(super) fn set_cached_world_transform(&self, transform: Matrix4<f32>) {
        self.cached_world_transform.set(Some(transform));
    }

    /// Gets the cached bounding box if valid
    /// You probably want [crate::Scene::nodes_bounding]
    pub(super) fn cached_bounds(&self) -> Option<Aabb> {
        self.cached_bounds.get()
    }

    /// Sets the cached bounding box
    pub(super) fn set_cached_bounds(&self, bounds: Option<Aabb>) {
        self.cached_bounds.set(bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::EPSILON;
    use cgmath::{Deg, EuclideanSpace, Quaternion, Rotation3, Vector3};

    #[test]
    fn test_node_new() {
        let position = Point3::new(1.0, 2.0, 3.0);
        let rotation = Quaternion::new(1.0, 0.0, 0.0, 0.0);
        let scale = Vector3::new(2.0, 2.0, 2.0);

        let node = Node::new(42, None, position, rotation, scale);

        assert_eq!(node.id, 42);
        assert_eq!(node.position(), position);
        assert_eq!(node.rotation(), rotation);
        assert_eq!(node.scale(), scale);
    }

    #[test]
    fn test_node_default_values() {
        let node = Node::new_default(7);

        assert_eq!(node.id, 7);
        assert_eq!(node.name, None);
        assert_eq!(node.parent(), None);
        assert_eq!(node.children().len(), 0);
        assert_eq!(node.instance(), None);
    }

    #[test]
    fn test_compute_local_transform_translation_only() {
        let position = Point3::new(5.0, 10.0, 15.0);
        let rotation = Quaternion::new(1.0, 0.0, 0.0, 0.0); // Identity
        let scale = Vector3::new(1.0, 1.0, 1.0);

        let node = Node::new(0, None, position, rotation, scale);
        let transform = node.compute_local_transform();

        // Check translation components (last column)
        assert!((transform[3][0] - 5.0).abs() < EPSILON);
        assert!((transform[3][1] - 10.0).abs() < EPSILON);
        assert!((transform[3][2] - 15.0).abs() < EPSILON);
        assert!((transform[3][3] - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_compute_local_transform_scale_only() {
        let position = Point3::new(0.0, 0.0, 0.0);
        let rotation = Quaternion::new(1.0, 0.0, 0.0, 0.0);
        let scale = Vector3::new(2.0, 3.0, 4.0);

        let node = Node::new(0, None, position, rotation, scale);
        let transform = node.compute_local_transform();

        // Check diagonal elements (scale factors)
        assert!((transform[0][0] - 2.0).abs() < EPSILON);
        assert!((transform[1][1] - 3.0).abs() < EPSILON);
        assert!((transform[2][2] - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_compute_local_transform_trs_composition() {
        let position = Point3::new(10.0, 20.0, 30.0);
        let rotation = Quaternion::from_angle_y(Deg(45.0));
        let scale = Vector3::new(2.0, 2.0, 2.0);

        let node = Node::new(0, None, position, rotation, scale);
        let transform = node.compute_local_transform();

        // Manually compute expected transform
        let translation_matrix = Matrix4::from_translation(position.to_vec());
        let rotation_matrix = Matrix4::from(rotation);
        let scale_matrix = Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);
        let expected = translation_matrix * rotation_matrix * scale_matrix;

        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    (transform[i][j] - expected[i][j]).abs() < EPSILON,
                    "Transform element [{i}][{j}] = {}, expected {}",
                    transform[i][j],
                    expected[i][j]
                );
            }
        }
    }

    #[test]
    fn test_add_child_duplicate_ignored() {
        let mut node = Node::new_default(1);

        node.add_child(5);
        node.add_child(5); // Duplicate
        node.add_child(5); // Duplicate

        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0], 5);
    }

    #[test]
    fn test_remove_child() {
        let mut node = Node::new_default(1);

        node.add_child(5);
        node.add_child(10);
        node.add_child(15);

        node.remove_child(10);
        assert_eq!(node.children().len(), 2);
        assert!(node.children().contains(&5));
        assert!(!node.children().contains(&10));
        assert!(node.children().contains(&15));
    }

    #[test]
    fn test_remove_child_nonexistent() {
        let mut node = Node::new_default(1);
        node.add_child(5);

        // Removing non-existent child should not panic
        node.remove_child(999);
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn test_set_position_marks_dirty() {
        let mut node = Node::new_default(0);

        node.set_cached_world_transform(Matrix4::from_scale(1.0));
        assert!(!node.transform_dirty());

        node.set_position(Point3::new(5.0, 5.0, 5.0));
        assert!(node.transform_dirty());
    }

    #[test]
    fn test_set_rotation_marks_dirty() {
        let mut node = Node::new_default(0);

        node.set_cached_world_transform(Matrix4::from_scale(1.0));
        assert!(!node.transform_dirty());

        node.set_rotation(Quaternion::from_angle_z(Deg(45.0)));
        assert!(node.transform_dirty());
    }

    #[test]
    fn test_set_scale_marks_dirty() {
        let mut node = Node::new_default(0);

        node.set_cached_world_transform(Matrix4::from_scale(1.0));
        assert!(!node.transform_dirty());

        node.set_scale(Vector3::new(2.0, 2.0, 2.0));
        assert!(node.transform_dirty());
    }

    #[test]
    fn test_set_instance_marks_bounds_dirty_only() {
        let mut node = Node::new_default(0);

        node.set_cached_world_transform(Matrix4::from_scale(1.0));
        node.set_cached_bounds(Some(Aabb::new(
            Point3::new(-1., -1., -1.),
            Point3::new(1., 1., 1.),
        )));
        assert!(!node.transform_dirty());

        node.set_instance(Some(42));
        assert!(!node.transform_dirty()); // instance doesn't affect transform
        assert!(node.bounds_dirty()); // instance affects bounds
    }

    #[test]
    fn test_dirty_flags_are_independent() {
        let node = Node::new_default(0);

        node.set_cached_world_transform(Matrix4::from_scale(1.0));
        node.set_cached_bounds(Some(Aabb::new(
            Point3::new(-1., -1., -1.),
            Point3::new(1., 1., 1.),
        )));

        assert!(!node.transform_dirty());
        assert!(!node.bounds_dirty());

        node.mark_transform_dirty();
        assert!(node.transform_dirty());
        assert!(!node.bounds_dirty());

        node.set_cached_world_transform(Matrix4::from_scale(1.0));
        node.mark_bounds_dirty();
        assert!(!node.transform_dirty());
        assert!(node.bounds_dirty());
    }
}
