mod instance;
mod light;
mod material;
mod mesh;
mod node;
mod tree;

use cgmath::{Matrix4, SquareMatrix};
use std::collections::HashMap;

// Public API exports
pub use instance::{Instance, InstanceId};
pub use light::{Light, LightType, LightsArrayUniform, MAX_LIGHTS};
pub use material::{Material, MaterialFlags, MaterialId, MaterialUniform, DEFAULT_MATERIAL_ID};
pub use mesh::{Mesh, MeshHit, MeshId, MeshIndex, MeshPrimitive, PrimitiveType, Vertex};
pub use node::{Node, NodeId};
pub use tree::{collect_instance_transforms, walk_tree, InstanceTransform, TreeVisitor};

// Crate-internal exports
pub(crate) use instance::InstanceRaw;
pub(crate) use material::MaterialGpuResources;

use crate::common::{Aabb, RgbaColor};

/// Scene-wide atmosphere parameters consumed by the renderer.
#[derive(Debug, Clone, Copy)]
pub struct Environment {
    /// Clear color, also used as the fog color.
    pub background: RgbaColor,
    /// Distance at which fog starts.
    pub fog_near: f32,
    /// Distance at which fog fully obscures geometry.
    pub fog_far: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            background: RgbaColor::from_hex(0x0a0e27),
            fog_near: 10.0,
            fog_far: 50.0,
        }
    }
}

/// Represents a batch of instances that share the same mesh, material, and primitive type.
///
/// Batching minimizes draw calls and state changes by grouping instances
/// that can be rendered together.
pub struct DrawBatch {
    pub mesh_id: MeshId,
    pub material_id: MaterialId,
    pub primitive_type: PrimitiveType,
    pub instances: Vec<InstanceTransform>,
}

impl DrawBatch {
    pub fn new(mesh_id: MeshId, material_id: MaterialId, primitive_type: PrimitiveType) -> Self {
        Self {
            mesh_id,
            material_id,
            primitive_type,
            instances: Vec::new(),
        }
    }

    pub fn add_instance(&mut self, instance_transform: InstanceTransform) {
        self.instances.push(instance_transform);
    }
}

/// The scene container holding all meshes, materials, instances, nodes, and lights.
///
/// Scene provides device-free APIs for creating and managing scene objects;
/// GPU resources are created lazily by the renderer.
///
/// # Examples
///
/// ```
/// use candletree::scene::{Scene, Mesh, Material};
/// use candletree::common::RgbaColor;
/// use cgmath::{Point3, Quaternion, Vector3};
///
/// let mut scene = Scene::new();
///
/// let mesh_id = scene.add_mesh(Mesh::sphere(0.5, 16, 8));
/// let mat_id = scene.add_material(Material::new().with_base_color_factor(RgbaColor::from_hex(0xff0000)));
///
/// let node_id = scene.add_instance_node(
///     None,
///     mesh_id,
///     mat_id,
///     None,
///     Point3::new(0.0, 0.0, 0.0),
///     Quaternion::new(1.0, 0.0, 0.0, 0.0),
///     Vector3::new(1.0, 1.0, 1.0),
/// ).unwrap();
/// assert!(scene.get_node(node_id).is_some());
/// ```
pub struct Scene {
    pub meshes: HashMap<MeshId, Mesh>,
    pub instances: HashMap<InstanceId, Instance>,
    pub lights: Vec<Light>,

    // Scene tree
    pub nodes: HashMap<NodeId, Node>,
    pub root_nodes: Vec<NodeId>,

    pub materials: HashMap<MaterialId, Material>,

    /// Background and fog parameters.
    pub environment: Environment,

    next_mesh_id: MeshId,
    next_instance_id: InstanceId,
    next_node_id: NodeId,
    next_material_id: MaterialId,
}

impl Scene {
    /// Creates a new empty scene with a default material.
    ///
    /// The scene is initialized with one default material (ID 0) that renders
    /// magenta, to make unassigned faces stand out.
    pub fn new() -> Self {
        let mut scene = Self {
            meshes: HashMap::new(),
            instances: HashMap::new(),
            lights: Vec::new(),

            nodes: HashMap::new(),
            root_nodes: Vec::new(),

            materials: HashMap::new(),

            environment: Environment::default(),

            next_mesh_id: 0,
            next_instance_id: 0,
            next_node_id: 0,
            next_material_id: 0,
        };

        // Create default material (ID 0)
        scene.add_material(Material::new().with_base_color_factor(RgbaColor::new(1.0, 0.0, 1.0)));

        scene
    }

    // ========== Mesh API ==========

    /// Adds a mesh to the scene.
    ///
    /// # Returns
    /// The unique ID assigned to this mesh
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = self.next_mesh_id;
        self.next_mesh_id += 1;

        let mut mesh = mesh;
        mesh.id = id;
        self.meshes.insert(id, mesh);
        id
    }

    /// Removes a mesh from the scene, dropping its CPU and GPU data.
    ///
    /// Instances referencing the mesh become dangling and are skipped during
    /// batching; callers should remove those instances' nodes first.
    pub fn remove_mesh(&mut self, id: MeshId) -> Option<Mesh> {
        self.meshes.remove(&id)
    }

    /// Gets a reference to a mesh by ID.
    pub fn get_mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id)
    }

    /// Gets a mutable reference to a mesh by ID.
    pub fn get_mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(&id)
    }

    // ========== Material API ==========

    /// Adds a material to the scene.
    ///
    /// # Returns
    /// The unique ID assigned to this material
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = self.next_material_id;
        self.next_material_id += 1;

        let mut material = material;
        material.id = id;
        self.materials.insert(id, material);
        id
    }

    /// Removes a material from the scene. The default material cannot be removed.
    pub fn remove_material(&mut self, id: MaterialId) -> Option<Material> {
        if id == DEFAULT_MATERIAL_ID {
            return None;
        }
        self.materials.remove(&id)
    }

    /// Gets a reference to a material by ID.
    pub fn get_material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// Gets a mutable reference to a material by ID.
    pub fn get_material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(&id)
    }

    // ========== Instance API ==========

    pub fn add_instance(&mut self, mesh: MeshId, material: MaterialId) -> InstanceId {
        let id = self.next_instance_id;
        self.next_instance_id += 1;

        let instance = Instance::new(id, mesh, material);
        self.instances.insert(id, instance);
        id
    }

    // ========== Node API ==========

    /// Gets a reference to a node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Gets a mutable reference to a node by ID.
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Returns a slice of root node IDs.
    pub fn root_nodes(&self) -> &[NodeId] {
        &self.root_nodes
    }

    /// Adds a new node to the scene tree.
    ///
    /// # Arguments
    /// * `parent` - Optional parent node ID. If `Some`, the parent must exist in the scene.
    /// * `name` - Optional name for the node.
    /// * `position` - Local position of the node.
    /// * `rotation` - Local rotation of the node.
    /// * `scale` - Local scale of the node.
    ///
    /// # Errors
    /// Returns an error if `parent` is `Some` but the specified node doesn't exist.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: Option<String>,
        position: cgmath::Point3<f32>,
        rotation: cgmath::Quaternion<f32>,
        scale: cgmath::Vector3<f32>,
    ) -> anyhow::Result<NodeId> {
        // Validate parent exists if specified
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(&parent_id) {
                anyhow::bail!("Parent node with ID {} not found in scene", parent_id);
            }
        }

        let id = self.next_node_id;
        self.next_node_id += 1;

        let mut node = Node::new(id, name, position, rotation, scale);

        // Set up parent-child relationship
        if let Some(parent_id) = parent {
            node.set_parent(Some(parent_id));
            // Safe to unwrap since we validated parent exists above
            self.nodes.get_mut(&parent_id).unwrap().add_child(id);
            self.invalidate_ancestor_bounds(parent_id);
        } else {
            // No parent, so this is a root node
            self.root_nodes.push(id);
        }

        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Adds a new node with an instance attached.
    ///
    /// This is a convenience method that creates both an instance and a node
    /// in one call.
    ///
    /// # Errors
    /// Returns an error if `parent` is `Some` but the specified node doesn't exist.
    #[allow(clippy::too_many_arguments)]
    pub fn add_instance_node(
        &mut self,
        parent: Option<NodeId>,
        mesh: MeshId,
        material: MaterialId,
        name: Option<String>,
        position: cgmath::Point3<f32>,
        rotation: cgmath::Quaternion<f32>,
        scale: cgmath::Vector3<f32>,
    ) -> anyhow::Result<NodeId> {
        // Create the instance
        let instance_id = self.add_instance(mesh, material);

        // Create the node (validates parent exists)
        let node_id = self.add_node(parent, name, position, rotation, scale)?;

        // Attach instance to node
        // Safe to unwrap since we just created the node above
        self.nodes
            .get_mut(&node_id)
            .unwrap()
            .set_instance(Some(instance_id));

        Ok(node_id)
    }

    /// Adds a node with default transform (identity).
    ///
    /// # Errors
    /// Returns an error if `parent` is `Some` but the specified node doesn't exist.
    pub fn add_default_node(
        &mut self,
        parent: Option<NodeId>,
        name: Option<String>,
    ) -> anyhow::Result<NodeId> {
        use cgmath::{Point3, Quaternion, Vector3};

        self.add_node(
            parent,
            name,
            Point3::new(0.0, 0.0, 0.0),
            Quaternion::new(1.0, 0.0, 0.0, 0.0), // Identity quaternion
            Vector3::new(1.0, 1.0, 1.0),
        )
    }

    /// Removes a node and all its children from the scene tree.
    ///
    /// This recursively removes all descendant nodes (and their instances)
    /// and cleans up parent-child relationships. Cached bounds in all
    /// ancestor nodes are invalidated since the removed subtree affects
    /// their bounds.
    pub fn remove_node(&mut self, node_id: NodeId) {
        // Store the parent before removal so we can invalidate ancestors
        let parent = self.nodes.get(&node_id).and_then(|node| node.parent());

        // Perform the recursive removal
        self.remove_node_recursive(node_id);

        // Invalidate cached bounds for all ancestors
        if let Some(parent_id) = parent {
            self.invalidate_ancestor_bounds(parent_id);
        }
    }

    /// Recursive helper for removing a node and all its children.
    ///
    /// This does NOT invalidate ancestor bounds. The caller is responsible
    /// for invalidating bounds after the entire removal is complete.
    fn remove_node_recursive(&mut self, node_id: NodeId) {
        // Get the node to find its parent and children
        let Some(node) = self.nodes.get(&node_id) else {
            return; // Node doesn't exist
        };

        let parent = node.parent();
        let children: Vec<NodeId> = node.children().to_vec();
        let instance = node.instance();

        // Recursively remove all children first
        for child_id in children {
            self.remove_node_recursive(child_id);
        }

        // Remove this node from its parent's children list
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                parent_node.remove_child(node_id);
            }
        } else {
            // This is a root node, remove from root_nodes list
            self.root_nodes.retain(|&id| id != node_id);
        }

        // The node exclusively owns its instance
        if let Some(instance_id) = instance {
            self.instances.remove(&instance_id);
        }

        // Finally, remove the node itself
        self.nodes.remove(&node_id);
    }

    /// Invalidates cached bounds for a node and all its ancestors.
    ///
    /// Walks up the parent chain from the given node to the root,
    /// clearing cached bounds on each node. This should be called
    /// when a subtree's bounds change (e.g., after removing nodes).
    fn invalidate_ancestor_bounds(&self, node_id: NodeId) {
        let mut current_id = Some(node_id);

        while let Some(id) = current_id {
            let Some(node) = self.get_node(id) else {
                break;
            };

            node.mark_bounds_dirty();

            // Move to parent
            current_id = node.parent();
        }
    }

    // ========== Transforms and bounds ==========

    /// Gets the world transform of a node.
    ///
    /// This returns the cached transform if valid, otherwise computes it by
    /// walking from the root to the node, computing and caching transforms
    /// along the way.
    pub fn nodes_transform(&self, node_id: NodeId) -> Matrix4<f32> {
        let node = self.get_node(node_id).expect("Node not found");

        // If cached and valid, return it
        if let Some(cached) = node.cached_world_transform() {
            return cached;
        }

        // Need to compute: build path from root to node
        let mut path = Vec::new();
        let mut current_id = node_id;

        // Walk up to root
        loop {
            path.push(current_id);
            let current = self.get_node(current_id).unwrap();
            if let Some(parent_id) = current.parent() {
                current_id = parent_id;
            } else {
                // Reached root
                break;
            }
        }

        // Reverse to get root-to-node path
        path.reverse();

        // Walk down the path, computing transforms
        let mut world_transform = Matrix4::identity();

        for &id in &path {
            let node = self.get_node(id).expect("Node not found");

            // Check if this node has cached transform
            if let Some(cached) = node.cached_world_transform() {
                world_transform = cached;
            } else {
                // Compute: world = parent_world * local
                let local_transform = node.compute_local_transform();
                world_transform = world_transform * local_transform;

                // Cache it
                node.set_cached_world_transform(world_transform);
            }
        }

        world_transform
    }

    /// Invalidates the cached world transform of a node's entire subtree.
    ///
    /// Must be called after mutating a node's local transform so descendants
    /// pick up the change on the next `nodes_transform` query.
    pub fn invalidate_subtree_transforms(&self, node_id: NodeId) {
        let Some(node) = self.get_node(node_id) else {
            return;
        };

        node.mark_transform_dirty();
        node.mark_bounds_dirty();

        for &child_id in node.children() {
            self.invalidate_subtree_transforms(child_id);
        }
    }

    /// Gets the world-space bounding box of the entire scene.
    ///
    /// Computes bounds by merging the bounds of all root nodes and their subtrees.
    /// Returns None if the scene has no geometry.
    pub fn bounding(&self) -> Option<Aabb> {
        let mut merged_bounds: Option<Aabb> = None;

        for &root_id in &self.root_nodes {
            if let Some(root_bounds) = self.nodes_bounding(root_id) {
                merged_bounds = match merged_bounds {
                    Some(existing) => Some(existing.merge(&root_bounds)),
                    None => Some(root_bounds),
                };
            }
        }

        merged_bounds
    }

    /// Gets the world-space bounding box of a node and its subtree.
    ///
    /// This returns the cached bounds if valid, otherwise recursively computes
    /// them bottom-up for the entire subtree rooted at this node.
    ///
    /// The bounds include both the node's instance (if any) and all descendants.
    pub fn nodes_bounding(&self, node_id: NodeId) -> Option<Aabb> {
        let node = self.get_node(node_id).expect("Node not found");

        // If cached and valid, return it
        if !node.bounds_dirty() {
            return node.cached_bounds();
        }

        // Need to compute: first ensure transform is valid
        let world_transform = self.nodes_transform(node_id);

        // Recursively compute bounds for children
        let mut merged_bounds: Option<Aabb> = None;

        for &child_id in node.children() {
            if let Some(child_bounds) = self.nodes_bounding(child_id) {
                merged_bounds = match merged_bounds {
                    Some(existing) => Some(existing.merge(&child_bounds)),
                    None => Some(child_bounds),
                };
            }
        }

        // If this node has an instance, get its mesh bounds and transform to world space
        let node_bounds = if let Some(instance_id) = node.instance() {
            let world_bounds = self
                .instances
                .get(&instance_id)
                .and_then(|instance| self.meshes.get(&instance.mesh))
                .and_then(|mesh| mesh.bounding())
                .map(|bounds| bounds.transform(&world_transform));

            // Merge with child bounds
            match (world_bounds, merged_bounds) {
                (Some(wb), Some(cb)) => Some(wb.merge(&cb)),
                (Some(wb), None) => Some(wb),
                (None, cb) => cb,
            }
        } else {
            // Branch node - just use merged child bounds
            merged_bounds
        };

        // Cache it
        node.set_cached_bounds(node_bounds);

        node_bounds
    }

    // ========== Lights ==========

    /// Adds a light to the scene, returning its index into `lights`.
    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    // ========== Draw batching ==========

    /// Collects all instances grouped into batches by mesh, material, and primitive type.
    ///
    /// This walks the scene tree, computes world transforms, and groups
    /// instances that share the same mesh, material, and primitive type into
    /// batches. Batches are sorted to minimize state changes during rendering:
    /// 1. By material ID (to minimize bind group changes)
    /// 2. By primitive type (to minimize pipeline changes)
    /// 3. By mesh ID (for GPU cache locality)
    pub(crate) fn collect_draw_batches(&self) -> Vec<DrawBatch> {
        let instance_transforms = collect_instance_transforms(self);
        let mut batch_map: HashMap<(MeshId, MaterialId, PrimitiveType), DrawBatch> = HashMap::new();

        for inst_transform in instance_transforms {
            let Some(instance) = self.instances.get(&inst_transform.instance_id) else {
                continue;
            };
            let Some(mesh) = self.meshes.get(&instance.mesh) else {
                continue;
            };

            // Create a separate batch for each primitive type the mesh supports
            for primitive_type in [PrimitiveType::TriangleList, PrimitiveType::PointList] {
                if !mesh.has_primitive_type(primitive_type) {
                    continue;
                }

                let key = (instance.mesh, instance.material, primitive_type);
                batch_map
                    .entry(key)
                    .or_insert_with(|| {
                        DrawBatch::new(instance.mesh, instance.material, primitive_type)
                    })
                    .add_instance(inst_transform.clone());
            }
        }

        // Convert to Vec and sort for optimal rendering
        let mut batches: Vec<DrawBatch> = batch_map.into_values().collect();
        batches.sort_by_key(|b| (b.material_id, b.primitive_type as u8, b.mesh_id));
        batches
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::EPSILON;
    use cgmath::{Point3, Quaternion, Vector3};

    #[test]
    fn test_scene_new() {
        let scene = Scene::new();

        assert_eq!(scene.meshes.len(), 0);
        assert_eq!(scene.instances.len(), 0);
        assert_eq!(scene.nodes.len(), 0);
        assert_eq!(scene.root_nodes.len(), 0);
        assert_eq!(scene.lights.len(), 0);

        // The default material is always present
        assert!(scene.get_material(DEFAULT_MATERIAL_ID).is_some());
    }

    #[test]
    fn test_add_root_node() {
        let mut scene = Scene::new();

        let node_id = scene.add_default_node(None, None).unwrap();

        assert_eq!(node_id, 0);
        assert_eq!(scene.nodes.len(), 1);
        assert_eq!(scene.root_nodes.len(), 1);
        assert_eq!(scene.root_nodes[0], node_id);

        let node = scene.get_node(node_id).unwrap();
        assert_eq!(node.parent(), None);
        assert_eq!(node.children().len(), 0);
    }

    #[test]
    fn test_add_child_node_bidirectional() {
        let mut scene = Scene::new();

        let root = scene.add_default_node(None, None).unwrap();
        let child = scene.add_default_node(Some(root), None).unwrap();

        assert_eq!(scene.nodes.len(), 2);
        assert_eq!(scene.root_nodes.len(), 1);

        // Verify parent-child relationship is bidirectional
        let root_node = scene.get_node(root).unwrap();
        assert_eq!(root_node.children().len(), 1);
        assert_eq!(root_node.children()[0], child);

        let child_node = scene.get_node(child).unwrap();
        assert_eq!(child_node.parent(), Some(root));
    }

    #[test]
    fn test_add_node_with_invalid_parent_fails() {
        let mut scene = Scene::new();

        let result = scene.add_default_node(Some(999), None);
        assert!(result.is_err());
        assert_eq!(scene.nodes.len(), 0);
    }

    #[test]
    fn test_add_instance_node() {
        let mut scene = Scene::new();

        let node_id = scene
            .add_instance_node(
                None,
                10,
                5,
                None,
                Point3::new(0.0, 0.0, 0.0),
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
            )
            .unwrap();

        assert_eq!(scene.nodes.len(), 1);
        assert_eq!(scene.instances.len(), 1);

        let node = scene.get_node(node_id).unwrap();
        let instance_id = node.instance().unwrap();
        let instance = scene.instances.get(&instance_id).unwrap();
        assert_eq!(instance.mesh, 10);
        assert_eq!(instance.material, 5);
    }

    #[test]
    fn test_child_transform_accumulation() {
        let mut scene = Scene::new();

        // Root at (10, 0, 0)
        let root = scene
            .add_node(
                None,
                None,
                Point3::new(10.0, 0.0, 0.0),
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
            )
            .unwrap();

        // Child at (5, 0, 0) relative to parent
        let child = scene
            .add_node(
                Some(root),
                None,
                Point3::new(5.0, 0.0, 0.0),
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
            )
            .unwrap();

        let child_transform = scene.nodes_transform(child);

        // Child should be at (15, 0, 0) in world space
        assert!((child_transform[3][0] - 15.0).abs() < EPSILON);
        assert!((child_transform[3][1] - 0.0).abs() < EPSILON);
        assert!((child_transform[3][2] - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_transform_with_parent_scale() {
        let mut scene = Scene::new();

        let parent = scene
            .add_node(
                None,
                None,
                Point3::new(0.0, 0.0, 0.0),
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(2.0, 2.0, 2.0),
            )
            .unwrap();

        let child = scene
            .add_node(
                Some(parent),
                None,
                Point3::new(1.0, 0.0, 0.0),
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
            )
            .unwrap();

        let child_transform = scene.nodes_transform(child);

        // Child should be at (2, 0, 0) due to parent's scale
        assert!((child_transform[3][0] - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_transform_caching_and_invalidation() {
        let mut scene = Scene::new();
        let node_id = scene.add_default_node(None, None).unwrap();

        let _transform = scene.nodes_transform(node_id);
        assert!(!scene.get_node(node_id).unwrap().transform_dirty());

        let node = scene.get_node_mut(node_id).unwrap();
        node.set_position(Point3::new(5.0, 5.0, 5.0));
        assert!(scene.get_node(node_id).unwrap().transform_dirty());

        let transform = scene.nodes_transform(node_id);
        assert!((transform[3][0] - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_invalidate_subtree_transforms() {
        let mut scene = Scene::new();

        let root = scene.add_default_node(None, None).unwrap();
        let child = scene.add_default_node(Some(root), None).unwrap();

        // Prime the caches
        let _ = scene.nodes_transform(child);
        assert!(!scene.get_node(child).unwrap().transform_dirty());

        // Mutating the root must invalidate the child's cached world transform
        scene
            .get_node_mut(root)
            .unwrap()
            .set_position(Point3::new(0.0, 3.0, 0.0));
        scene.invalidate_subtree_transforms(root);
        assert!(scene.get_node(child).unwrap().transform_dirty());

        let child_transform = scene.nodes_transform(child);
        assert!((child_transform[3][1] - 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_remove_node_removes_subtree() {
        let mut scene = Scene::new();

        let root = scene.add_default_node(None, None).unwrap();
        let child = scene.add_default_node(Some(root), None).unwrap();
        let grandchild = scene.add_default_node(Some(child), None).unwrap();
        let sibling = scene.add_default_node(Some(root), None).unwrap();

        scene.remove_node(child);

        assert!(scene.get_node(child).is_none());
        assert!(scene.get_node(grandchild).is_none());
        assert!(scene.get_node(root).is_some());
        assert!(scene.get_node(sibling).is_some());

        let root_node = scene.get_node(root).unwrap();
        assert_eq!(root_node.children(), &[sibling]);
    }

    #[test]
    fn test_remove_root_node() {
        let mut scene = Scene::new();

        let root = scene.add_default_node(None, None).unwrap();
        let other = scene.add_default_node(None, None).unwrap();

        scene.remove_node(root);

        assert!(scene.get_node(root).is_none());
        assert_eq!(scene.root_nodes(), &[other]);
    }

    #[test]
    fn test_remove_node_releases_instance() {
        let mut scene = Scene::new();

        let node = scene
            .add_instance_node(
                None,
                1,
                1,
                None,
                Point3::new(0.0, 0.0, 0.0),
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
            )
            .unwrap();
        assert_eq!(scene.instances.len(), 1);

        scene.remove_node(node);
        assert_eq!(scene.instances.len(), 0);
    }

    #[test]
    fn test_remove_material_keeps_default() {
        let mut scene = Scene::new();
        let id = scene.add_material(Material::new());

        assert!(scene.remove_material(id).is_some());
        assert!(scene.remove_material(DEFAULT_MATERIAL_ID).is_none());
        assert!(scene.get_material(DEFAULT_MATERIAL_ID).is_some());
    }

    #[test]
    fn test_nodes_bounding_includes_children() {
        let mut scene = Scene::new();

        let mesh_id = scene.add_mesh(Mesh::sphere(1.0, 8, 4));
        let mat_id = scene.add_material(Material::new());

        let root = scene.add_default_node(None, None).unwrap();
        let _child = scene
            .add_instance_node(
                Some(root),
                mesh_id,
                mat_id,
                None,
                Point3::new(5.0, 0.0, 0.0),
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
            )
            .unwrap();

        let bounds = scene.nodes_bounding(root).unwrap();
        assert!((bounds.min.x - 4.0).abs() < 0.01);
        assert!((bounds.max.x - 6.0).abs() < 0.01);
    }

    #[test]
    fn test_nodes_bounding_none_without_geometry() {
        let mut scene = Scene::new();
        let root = scene.add_default_node(None, None).unwrap();

        assert!(scene.nodes_bounding(root).is_none());
        assert!(scene.bounding().is_none());
    }

    #[test]
    fn test_collect_draw_batches_groups_by_mesh_and_material() {
        let mut scene = Scene::new();

        let mesh_id = scene.add_mesh(Mesh::sphere(1.0, 8, 4));
        let mat_a = scene.add_material(Material::new());
        let mat_b = scene.add_material(Material::new());

        for i in 0..3 {
            scene
                .add_instance_node(
                    None,
                    mesh_id,
                    mat_a,
                    None,
                    Point3::new(i as f32, 0.0, 0.0),
                    Quaternion::new(1.0, 0.0, 0.0, 0.0),
                    Vector3::new(1.0, 1.0, 1.0),
                )
                .unwrap();
        }
        scene
            .add_instance_node(
                None,
                mesh_id,
                mat_b,
                None,
                Point3::new(9.0, 0.0, 0.0),
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
            )
            .unwrap();

        let batches = scene.collect_draw_batches();

        assert_eq!(batches.len(), 2);
        // Sorted by material ID
        assert_eq!(batches[0].material_id, mat_a);
        assert_eq!(batches[0].instances.len(), 3);
        assert_eq!(batches[1].material_id, mat_b);
        assert_eq!(batches[1].instances.len(), 1);
    }

    #[test]
    fn test_collect_draw_batches_empty_scene() {
        let scene = Scene::new();
        assert!(scene.collect_draw_batches().is_empty());
    }

    #[test]
    fn test_tree_consistency_after_multiple_operations() {
        let mut scene = Scene::new();

        let root = scene.add_default_node(None, None).unwrap();
        let child1 = scene.add_default_node(Some(root), None).unwrap();
        let _child2 = scene.add_default_node(Some(root), None).unwrap();
        let _grandchild = scene.add_default_node(Some(child1), None).unwrap();

        // Verify every parent reference is valid
        for node in scene.nodes.values() {
            if let Some(parent_id) = node.parent() {
                assert!(
                    scene.get_node(parent_id).is_some(),
                    "Node references non-existent parent"
                );
            }
        }

        // Verify every child reference is valid
        for node in scene.nodes.values() {
            for &child_id in node.children() {
                assert!(
                    scene.get_node(child_id).is_some(),
                    "Node references non-existent child"
                );
            }
        }

        // Verify all root nodes are actually roots
        for &root_id in &scene.root_nodes {
            let node = scene.get_node(root_id).unwrap();
            assert!(node.parent().is_none(), "Root node has a parent");
        }
    }
}
