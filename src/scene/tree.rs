use cgmath::Matrix4;

use super::{InstanceId, Node, NodeId, Scene};

/// Trait for implementing tree traversal operations.
///
/// Implementors of this trait can be passed to tree walking functions
/// to perform arbitrary operations on each node during traversal.
///
/// The visitor receives callbacks when entering and exiting nodes.
pub trait TreeVisitor {
    /// Called when entering a node (before processing its children).
    ///
    /// Returns true to continue traversing children, false to skip the subtree.
    fn enter_node(&mut self, node: &Node) -> bool;

    /// Called when exiting a node (after processing its children).
    fn exit_node(&mut self, node: &Node);
}

/// Walks the scene tree starting from a given node.
pub fn walk_tree<V: TreeVisitor>(scene: &Scene, node_id: NodeId, visitor: &mut V) {
    // Get the node (return early if not found)
    let node = match scene.get_node(node_id) {
        Some(n) => n,
        None => return,
    };

    // Enter this node
    let should_visit_children = visitor.enter_node(node);

    // Recurse for all children if enter_node returned true
    if should_visit_children {
        for &child_id in node.children() {
            walk_tree(scene, child_id, visitor);
        }
    }

    // Exit this node
    visitor.exit_node(node);
}

/// An instance paired with the world transform of its owning node.
///
/// Produced by scene traversal and consumed by draw batching.
#[derive(Clone)]
pub struct InstanceTransform {
    pub instance_id: InstanceId,
    pub node_id: NodeId,
    pub world_transform: Matrix4<f32>,
}

impl InstanceTransform {
    pub fn new(instance_id: InstanceId, node_id: NodeId, world_transform: Matrix4<f32>) -> Self {
        Self {
            instance_id,
            node_id,
            world_transform,
        }
    }
}

/// Collects every instance in the scene with its resolved world transform.
///
/// Walks the tree from all roots; world transforms come from the scene's
/// cached transform computation. Read-only with respect to graph topology.
pub fn collect_instance_transforms(scene: &Scene) -> Vec<InstanceTransform> {
    struct Collector<'s> {
        scene: &'s Scene,
        out: Vec<InstanceTransform>,
    }

    impl TreeVisitor for Collector<'_> {
        fn enter_node(&mut self, node: &Node) -> bool {
            if let Some(instance_id) = node.instance() {
                let world = self.scene.nodes_transform(node.id);
                self.out
                    .push(InstanceTransform::new(instance_id, node.id, world));
            }
            true
        }

        fn exit_node(&mut self, _node: &Node) {}
    }

    let mut collector = Collector {
        scene,
        out: Vec::new(),
    };

    for &root_id in scene.root_nodes() {
        walk_tree(scene, root_id, &mut collector);
    }

    collector.out
}
