use std::collections::HashMap;

use cgmath::{Point3, Rad, Rotation3, Vector3};

use crate::common::RgbaColor;
use crate::scene::{MaterialId, NodeId, Scene};

/// Hue applied to the flame and wick when a candle ignites.
pub const IGNITED_COLOR: u32 = 0xff6600;

/// Point light intensity of a lit candle before flicker modulation.
pub const LIT_LIGHT_INTENSITY: f32 = 1.5;

/// Point light range of a lit candle.
pub const LIT_LIGHT_RANGE: f32 = 3.0;

/// Height of the flame (and its light) above the candle group origin.
pub const FLAME_LOCAL_HEIGHT: f32 = 0.4;

/// Delay between lighting the last candle and the celebration, in milliseconds.
pub const CELEBRATION_DELAY_MS: u64 = 500;

// ========== Flicker functions ==========
//
// Deterministic functions of the elapsed clock, shared by all candles.

/// Flame mesh scale at elapsed time `t` seconds.
pub fn flame_scale(t: f32) -> Vector3<f32> {
    Vector3::new(
        1.0 + 0.1 * (t * 10.0).sin(),
        1.0,
        1.0 + 0.1 * (t * 10.0).cos(),
    )
}

/// Flame roll angle about the Z axis at elapsed time `t` seconds.
pub fn flame_roll(t: f32) -> Rad<f32> {
    Rad(0.1 * (t * 5.0).sin())
}

/// Point light intensity of a lit candle at elapsed time `t` seconds.
pub fn flame_light_intensity(t: f32) -> f32 {
    LIT_LIGHT_INTENSITY + 0.3 * (t * 8.0).sin()
}

/// One candle: its scene nodes, mutable materials, light, and lit state.
///
/// The lit flag only ever transitions false -> true; there is no way to
/// extinguish a candle.
pub struct Candle {
    /// Position of the candle in the set (0-based).
    pub index: usize,
    /// Base position of the candle group, local to the tree.
    pub base_position: Point3<f32>,
    /// Group node holding the candle's sub-meshes.
    pub group: NodeId,
    /// Candle body mesh node.
    pub body: NodeId,
    /// Wick mesh node.
    pub wick: NodeId,
    /// Flame mesh node (invisible until lit).
    pub flame: NodeId,
    /// Material driving the wick color.
    pub wick_material: MaterialId,
    /// Material driving flame color and opacity.
    pub flame_material: MaterialId,
    /// Index of the candle's point light in `Scene::lights`.
    pub light: usize,

    pub(crate) lit: bool,
}

impl Candle {
    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

/// Result of asking a candle set to ignite a candle.
pub enum IgniteOutcome {
    /// The candle transitioned to lit.
    Ignited {
        /// World-space position for the sparkle burst.
        sparkle_position: Point3<f32>,
        /// True if this transition lit the final candle.
        all_lit: bool,
    },
    /// The candle was already lit; nothing changed.
    AlreadyLit,
}

/// The fixed collection of candles plus celebration bookkeeping.
///
/// Size is fixed at construction. The lit count is always derived from the
/// candles themselves rather than tracked separately, so it cannot drift.
pub struct CandleSet {
    candles: Vec<Candle>,
    /// Maps every candle-owned node to its candle's index.
    owners: HashMap<NodeId, usize>,
    /// Set once the celebration has been scheduled.
    celebration_armed: bool,
    /// Terminal flag: set once the celebration has run.
    celebrated: bool,
}

impl CandleSet {
    /// Builds a set from candles, indexing every candle-owned node.
    pub fn new(candles: Vec<Candle>) -> Self {
        let mut owners = HashMap::new();
        for candle in &candles {
            for node in [candle.group, candle.body, candle.wick, candle.flame] {
                owners.insert(node, candle.index);
            }
        }

        Self {
            candles,
            owners,
            celebration_armed: false,
            celebrated: false,
        }
    }

    /// Number of candles in the set (fixed at construction).
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// Number of lit candles, derived by counting.
    pub fn lit_count(&self) -> usize {
        self.candles.iter().filter(|c| c.is_lit()).count()
    }

    /// True when every candle is lit.
    pub fn all_lit(&self) -> bool {
        self.lit_count() == self.candles.len()
    }

    /// Resolves a candle-owned node to the index of its owning candle.
    pub fn owner_of(&self, node: NodeId) -> Option<usize> {
        self.owners.get(&node).copied()
    }

    /// Root nodes of every candle subtree, for restricted hit testing.
    pub fn group_nodes(&self) -> Vec<NodeId> {
        self.candles.iter().map(|c| c.group).collect()
    }

    /// Ignites the candle at `index`, applying all visual side effects.
    ///
    /// Lighting an already-lit candle is a no-op (`AlreadyLit`); the lit flag
    /// never reverts. On transition the flame becomes visible and recolored,
    /// the wick is recolored, and the candle's point light turns on at the
    /// flame's world position.
    pub fn ignite(&mut self, index: usize, scene: &mut Scene) -> IgniteOutcome {
        let Some(candle) = self.candles.get_mut(index) else {
            log::warn!("Ignoring ignite request for unknown candle index {index}");
            return IgniteOutcome::AlreadyLit;
        };

        if candle.lit {
            return IgniteOutcome::AlreadyLit;
        }
        candle.lit = true;

        let ignited = RgbaColor::from_hex(IGNITED_COLOR);

        // Show the flame
        if let Some(flame) = scene.get_material_mut(candle.flame_material) {
            flame.set_base_color_factor(ignited.with_alpha(1.0));
        }

        // Recolor the wick
        if let Some(wick) = scene.get_material_mut(candle.wick_material) {
            wick.set_base_color_factor(ignited);
        }

        // Turn on the light at the flame's position
        let flame_position = flame_world_position(scene, candle);
        if let Some(light) = scene.lights.get_mut(candle.light) {
            light.set_intensity(LIT_LIGHT_INTENSITY);
            light.set_range(LIT_LIGHT_RANGE);
            light.set_position(Vector3::new(
                flame_position.x,
                flame_position.y,
                flame_position.z,
            ));
        }

        log::info!("Candle {} lit ({}/{})", index, self.lit_count(), self.len());

        IgniteOutcome::Ignited {
            sparkle_position: flame_position,
            all_lit: self.all_lit(),
        }
    }

    /// Advances the flame flicker for every lit candle.
    ///
    /// `t` is the elapsed time in seconds from a monotonic clock; all motion
    /// is a pure function of it, so skipped ticks cannot accumulate error.
    /// Light positions track the candles' world positions as the tree spins.
    pub fn animate_flames(&self, scene: &mut Scene, t: f32) {
        for candle in self.candles.iter().filter(|c| c.is_lit()) {
            let light_position = flame_world_position(scene, candle);

            if let Some(flame) = scene.get_node_mut(candle.flame) {
                flame.set_scale(flame_scale(t));
                flame.set_rotation(cgmath::Quaternion::from_angle_z(flame_roll(t)));
            }

            if let Some(light) = scene.lights.get_mut(candle.light) {
                light.set_intensity(flame_light_intensity(t));
                light.set_position(Vector3::new(
                    light_position.x,
                    light_position.y,
                    light_position.z,
                ));
            }
        }
    }

    // ========== Celebration bookkeeping ==========

    /// Arms the celebration. Returns true only the first time, and only once
    /// every candle is lit; the caller schedules the deferred trigger.
    pub fn try_arm_celebration(&mut self) -> bool {
        if self.all_lit() && !self.celebration_armed && !self.celebrated {
            self.celebration_armed = true;
            true
        } else {
            false
        }
    }

    /// Marks the celebration as having run. Returns true only the first time;
    /// the flag is terminal, so a hypothetical reset cannot re-trigger it.
    pub fn mark_celebrated(&mut self) -> bool {
        if self.celebrated {
            false
        } else {
            self.celebrated = true;
            true
        }
    }

    pub fn has_celebrated(&self) -> bool {
        self.celebrated
    }
}

/// World-space position of a candle's flame (and light).
fn flame_world_position(scene: &Scene, candle: &Candle) -> Point3<f32> {
    let world = scene.nodes_transform(candle.group);
    let local = Point3::new(0.0, FLAME_LOCAL_HEIGHT, 0.0);
    Point3::from_homogeneous(world * local.to_homogeneous())
}
