//! Short-lived sparkle bursts.
//!
//! A burst is a point-cloud node spawned at a world position with opacity
//! 1.0. Every render tick the opacity drops by a fixed step and the cloud
//! spins; when the opacity reaches zero the node and its mesh and material
//! are removed from the scene and dropped.

use cgmath::{Point3, Quaternion, Rad, Rotation3, Vector3};
use rand::Rng;

use crate::common::{RgbaColor, EPSILON};
use crate::scene::{Material, MaterialFlags, MaterialId, Mesh, MeshId, NodeId, Scene};

/// Points per burst.
pub const PARTICLES_PER_BURST: usize = 20;

/// Opacity lost per render tick.
pub const FADE_STEP: f32 = 0.02;

/// Yaw added per render tick, in radians.
pub const SPIN_STEP: f32 = 0.1;

/// Sparkle point color.
const SPARKLE_COLOR: u32 = 0xffd700;

/// Half-extent of the jitter cube around the spawn position.
const JITTER_EXTENT: f32 = 0.25;

struct Sparkle {
    node: NodeId,
    mesh: MeshId,
    material: MaterialId,
    opacity: f32,
    spin: f32,
}

/// Owns every live sparkle burst and steps their fade each tick.
pub struct SparkleSystem {
    active: Vec<Sparkle>,
}

impl SparkleSystem {
    pub fn new() -> Self {
        Self { active: Vec::new() }
    }

    /// Number of bursts currently alive.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Spawns a burst of jittered points at a world position.
    ///
    /// Points scatter within a small cube around the position: up to
    /// `JITTER_EXTENT` sideways and up to twice that upward.
    pub fn spawn(&mut self, scene: &mut Scene, position: Point3<f32>, rng: &mut impl Rng) {
        let mut points = Vec::with_capacity(PARTICLES_PER_BURST);
        for _ in 0..PARTICLES_PER_BURST {
            points.push(Point3::new(
                rng.gen_range(-JITTER_EXTENT..=JITTER_EXTENT),
                rng.gen_range(0.0..=2.0 * JITTER_EXTENT),
                rng.gen_range(-JITTER_EXTENT..=JITTER_EXTENT),
            ));
        }

        let mesh = scene.add_mesh(Mesh::point_cloud(&points));
        let material = scene.add_material(
            Material::new()
                .with_base_color_factor(RgbaColor::from_hex(SPARKLE_COLOR))
                .with_flags(MaterialFlags::UNLIT | MaterialFlags::ALPHA_BLEND),
        );

        let node = scene
            .add_instance_node(
                None,
                mesh,
                material,
                Some("sparkle".to_string()),
                position,
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
            )
            .expect("adding a root node cannot fail");

        self.active.push(Sparkle {
            node,
            mesh,
            material,
            opacity: 1.0,
            spin: 0.0,
        });
    }

    /// Advances every burst by one tick.
    ///
    /// Opacity after k ticks is `max(0, 1 - FADE_STEP * k)`; a burst is
    /// removed from the scene on the first tick that reaches zero. Surviving
    /// bursts gain a constant spin.
    pub fn tick(&mut self, scene: &mut Scene) {
        self.active.retain_mut(|sparkle| {
            sparkle.opacity -= FADE_STEP;

            // Accumulated f32 steps land within EPSILON of zero, not at it
            if sparkle.opacity <= EPSILON {
                scene.remove_node(sparkle.node);
                scene.remove_mesh(sparkle.mesh);
                scene.remove_material(sparkle.material);
                return false;
            }

            sparkle.spin += SPIN_STEP;

            if let Some(node) = scene.get_node_mut(sparkle.node) {
                node.set_rotation(Quaternion::from_angle_y(Rad(sparkle.spin)));
            }
            if let Some(material) = scene.get_material_mut(sparkle.material) {
                material.set_opacity(sparkle.opacity);
            }

            true
        });
    }
}

impl Default for SparkleSystem {
    fn default() -> Self {
        Self::new()
    }
}
