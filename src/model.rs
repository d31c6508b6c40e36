//! Builds the tree-and-candles scene graph from a declarative configuration.
//!
//! Construction is deterministic: the same configuration always produces the
//! same subgraph. Configurations are validated up front; bad geometry is a
//! [`ConfigError`], never a silently clamped value.

use cgmath::{Deg, Point3, Quaternion, Rotation3, Vector3};
use thiserror::Error;

use crate::candles::{Candle, CandleSet, FLAME_LOCAL_HEIGHT, IGNITED_COLOR};
use crate::common::RgbaColor;
use crate::scene::{Light, Material, MaterialFlags, Mesh, NodeId, Scene};

/// Radial offset pushing candles slightly outside their tree layer.
pub const CANDLE_RADIAL_OFFSET: f32 = -0.5;

const CANDLE_BODY_RADIUS: f32 = 0.08;
const CANDLE_BODY_HEIGHT: f32 = 0.3;
const WICK_RADIUS: f32 = 0.01;
const WICK_HEIGHT: f32 = 0.05;
const FLAME_RADIUS: f32 = 0.04;
const FLAME_HEIGHT: f32 = 0.1;

/// A configuration value failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be positive (got {value})")]
    NonPositive { name: &'static str, value: f32 },
    #[error("tree must have at least one layer")]
    NoLayers,
    #[error("at least one candle slot is required")]
    NoCandles,
}

fn require_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

/// Ground plane parameters.
#[derive(Debug, Clone)]
pub struct GroundConfig {
    pub size: f32,
    pub color: RgbaColor,
}

/// Trunk cylinder parameters.
#[derive(Debug, Clone)]
pub struct TrunkConfig {
    pub radius: f32,
    pub height: f32,
    pub y: f32,
    pub color: RgbaColor,
}

/// One foliage cone of the tree.
#[derive(Debug, Clone)]
pub struct TreeLayer {
    pub radius: f32,
    pub height: f32,
    pub y: f32,
    pub color: RgbaColor,
}

/// Star topper parameters.
#[derive(Debug, Clone)]
pub struct StarConfig {
    pub radius: f32,
    pub height: f32,
    pub y: f32,
    pub color: RgbaColor,
}

/// A decorative ball hung at a fixed position on the tree.
#[derive(Debug, Clone)]
pub struct Ornament {
    pub position: Point3<f32>,
    pub radius: f32,
    pub color: RgbaColor,
}

/// Placement of one candle: a tree layer's radius, an angle around the
/// trunk, and the height of the candle base.
#[derive(Debug, Clone)]
pub struct CandleSlot {
    pub layer_radius: f32,
    pub angle: f32,
    pub y: f32,
}

impl CandleSlot {
    /// Base position of the candle group, local to the tree.
    pub fn base_position(&self, radial_offset: f32) -> Point3<f32> {
        let r = self.layer_radius + radial_offset;
        Point3::new(r * self.angle.cos(), self.y, r * self.angle.sin())
    }
}

/// Declarative description of the whole scene.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub ground: GroundConfig,
    pub trunk: TrunkConfig,
    pub layers: Vec<TreeLayer>,
    pub star: StarConfig,
    pub ornaments: Vec<Ornament>,
    pub candles: Vec<CandleSlot>,
    pub candle_radial_offset: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        use std::f32::consts::PI;

        Self {
            ground: GroundConfig {
                size: 50.0,
                color: RgbaColor::from_hex(0x1a3a2e),
            },
            trunk: TrunkConfig {
                radius: 0.35,
                height: 2.0,
                y: 1.0,
                color: RgbaColor::from_hex(0x8b4513),
            },
            layers: vec![
                TreeLayer { radius: 3.0, height: 1.5, y: 2.5, color: RgbaColor::from_hex(0x228b22) },
                TreeLayer { radius: 2.5, height: 1.5, y: 4.0, color: RgbaColor::from_hex(0x2d9a2d) },
                TreeLayer { radius: 2.0, height: 1.5, y: 5.5, color: RgbaColor::from_hex(0x32cd32) },
                TreeLayer { radius: 1.5, height: 1.5, y: 7.0, color: RgbaColor::from_hex(0x228b22) },
                TreeLayer { radius: 1.0, height: 1.5, y: 8.5, color: RgbaColor::from_hex(0x2d9a2d) },
            ],
            star: StarConfig {
                radius: 0.3,
                height: 1.0,
                y: 9.5,
                color: RgbaColor::from_hex(0xffd700),
            },
            ornaments: vec![
                Ornament {
                    position: Point3::new(1.5, 3.0, 0.5),
                    radius: 0.15,
                    color: RgbaColor::from_hex(0xff0000),
                },
                Ornament {
                    position: Point3::new(-1.2, 4.5, 0.8),
                    radius: 0.15,
                    color: RgbaColor::from_hex(0x0000ff),
                },
                Ornament {
                    position: Point3::new(0.8, 6.0, -0.6),
                    radius: 0.15,
                    color: RgbaColor::from_hex(0xffff00),
                },
                Ornament {
                    position: Point3::new(-0.7, 7.5, 0.4),
                    radius: 0.15,
                    color: RgbaColor::from_hex(0xff00ff),
                },
            ],
            candles: vec![
                CandleSlot { layer_radius: 3.0, angle: 0.0, y: 3.2 },
                CandleSlot { layer_radius: 2.5, angle: PI / 2.0, y: 4.7 },
                CandleSlot { layer_radius: 2.0, angle: PI, y: 6.2 },
                CandleSlot { layer_radius: 1.5, angle: 3.0 * PI / 2.0, y: 7.7 },
            ],
            candle_radial_offset: CANDLE_RADIAL_OFFSET,
        }
    }
}

impl SceneConfig {
    /// Validates every geometric parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("ground size", self.ground.size)?;
        require_positive("trunk radius", self.trunk.radius)?;
        require_positive("trunk height", self.trunk.height)?;

        if self.layers.is_empty() {
            return Err(ConfigError::NoLayers);
        }
        for layer in &self.layers {
            require_positive("layer radius", layer.radius)?;
            require_positive("layer height", layer.height)?;
        }

        require_positive("star radius", self.star.radius)?;
        require_positive("star height", self.star.height)?;

        for ornament in &self.ornaments {
            require_positive("ornament radius", ornament.radius)?;
        }

        if self.candles.is_empty() {
            return Err(ConfigError::NoCandles);
        }
        for slot in &self.candles {
            require_positive("candle layer radius", slot.layer_radius)?;
        }

        Ok(())
    }
}

/// Everything the builder hands back to the caller.
pub struct BuiltScene {
    /// Root node of the rotating tree group.
    pub tree_root: NodeId,
    /// The candle set, ready for interaction.
    pub candles: CandleSet,
}

/// Populates `scene` with the ground, tree, decorations, and candles.
///
/// The configuration is validated first; on error the scene is untouched.
pub fn build_scene(scene: &mut Scene, config: &SceneConfig) -> Result<BuiltScene, ConfigError> {
    config.validate()?;

    let identity = Quaternion::new(1.0, 0.0, 0.0, 0.0);
    let unit = Vector3::new(1.0, 1.0, 1.0);
    let origin = Point3::new(0.0, 0.0, 0.0);

    // Key light, matching a sun high to the side
    scene.add_light(Light::directional(
        Vector3::new(-10.0, -10.0, -5.0),
        RgbaColor::WHITE,
        0.8,
    ));

    // Ground
    let ground_mesh = scene.add_mesh(Mesh::plane(config.ground.size, config.ground.size, 1, 1));
    let ground_mat = scene.add_material(Material::new().with_base_color_factor(config.ground.color));
    scene
        .add_instance_node(
            None,
            ground_mesh,
            ground_mat,
            Some("ground".to_string()),
            origin,
            identity,
            unit,
        )
        .expect("adding a root node cannot fail");

    // Tree group (rotated as a whole by the render loop)
    let tree_root = scene
        .add_node(None, Some("tree".to_string()), origin, identity, unit)
        .expect("adding a root node cannot fail");

    // Trunk
    let trunk_mesh = scene.add_mesh(Mesh::cylinder(
        config.trunk.radius,
        config.trunk.height,
        8,
        true,
    ));
    let trunk_mat = scene.add_material(Material::new().with_base_color_factor(config.trunk.color));
    scene
        .add_instance_node(
            Some(tree_root),
            trunk_mesh,
            trunk_mat,
            Some("trunk".to_string()),
            Point3::new(0.0, config.trunk.y, 0.0),
            identity,
            unit,
        )
        .expect("tree root exists");

    // Foliage layers, bottom to top
    for (i, layer) in config.layers.iter().enumerate() {
        let mesh = scene.add_mesh(Mesh::cone(layer.radius, layer.height, 8, true));
        let mat = scene.add_material(Material::new().with_base_color_factor(layer.color));
        scene
            .add_instance_node(
                Some(tree_root),
                mesh,
                mat,
                Some(format!("layer-{i}")),
                Point3::new(0.0, layer.y, 0.0),
                identity,
                unit,
            )
            .expect("tree root exists");
    }

    // Star on top
    let star_mesh = scene.add_mesh(Mesh::cone(config.star.radius, config.star.height, 4, true));
    let star_mat = scene.add_material(
        Material::new()
            .with_base_color_factor(config.star.color)
            .with_emissive(config.star.color, 0.5),
    );
    scene
        .add_instance_node(
            Some(tree_root),
            star_mesh,
            star_mat,
            Some("star".to_string()),
            Point3::new(0.0, config.star.y, 0.0),
            Quaternion::from_angle_y(Deg(45.0)),
            unit,
        )
        .expect("tree root exists");

    // Ornaments share one sphere mesh
    if !config.ornaments.is_empty() {
        let radius = config.ornaments[0].radius;
        let ornament_mesh = scene.add_mesh(Mesh::sphere(radius, 16, 16));

        for (i, ornament) in config.ornaments.iter().enumerate() {
            // Differently sized ornaments get their own mesh
            let mesh = if (ornament.radius - radius).abs() < f32::EPSILON {
                ornament_mesh
            } else {
                scene.add_mesh(Mesh::sphere(ornament.radius, 16, 16))
            };
            let mat = scene.add_material(
                Material::new()
                    .with_base_color_factor(ornament.color)
                    .with_emissive(ornament.color, 0.3),
            );
            scene
                .add_instance_node(
                    Some(tree_root),
                    mesh,
                    mat,
                    Some(format!("ornament-{i}")),
                    ornament.position,
                    identity,
                    unit,
                )
                .expect("tree root exists");
        }
    }

    // Candles: shared meshes, shared body material, per-candle wick/flame
    let body_mesh = scene.add_mesh(Mesh::cylinder(CANDLE_BODY_RADIUS, CANDLE_BODY_HEIGHT, 16, true));
    let wick_mesh = scene.add_mesh(Mesh::cylinder(WICK_RADIUS, WICK_HEIGHT, 8, true));
    let flame_mesh = scene.add_mesh(Mesh::cone(FLAME_RADIUS, FLAME_HEIGHT, 8, true));
    let body_mat = scene.add_material(
        Material::new().with_base_color_factor(RgbaColor::from_hex(0xf5f5dc)),
    );

    let mut candles = Vec::with_capacity(config.candles.len());
    for (index, slot) in config.candles.iter().enumerate() {
        let base_position = slot.base_position(config.candle_radial_offset);

        let group = scene
            .add_node(
                Some(tree_root),
                Some(format!("candle-{index}")),
                base_position,
                identity,
                unit,
            )
            .expect("tree root exists");

        let body = scene
            .add_instance_node(
                Some(group),
                body_mesh,
                body_mat,
                None,
                Point3::new(0.0, CANDLE_BODY_HEIGHT / 2.0, 0.0),
                identity,
                unit,
            )
            .expect("candle group exists");

        let wick_material = scene.add_material(
            Material::new().with_base_color_factor(RgbaColor::from_hex(0x2a2a2a)),
        );
        let wick = scene
            .add_instance_node(
                Some(group),
                wick_mesh,
                wick_material,
                None,
                Point3::new(0.0, CANDLE_BODY_HEIGHT + WICK_HEIGHT / 2.0, 0.0),
                identity,
                unit,
            )
            .expect("candle group exists");

        // Flame starts fully transparent; ignition raises the opacity
        let flame_material = scene.add_material(
            Material::new()
                .with_base_color_factor(RgbaColor::from_hex(IGNITED_COLOR).with_alpha(0.0))
                .with_flags(MaterialFlags::UNLIT | MaterialFlags::ALPHA_BLEND),
        );
        let flame = scene
            .add_instance_node(
                Some(group),
                flame_mesh,
                flame_material,
                None,
                Point3::new(0.0, FLAME_LOCAL_HEIGHT, 0.0),
                identity,
                unit,
            )
            .expect("candle group exists");

        // Point light starts dark; ignition sets intensity and range
        let light_position = Vector3::new(
            base_position.x,
            base_position.y + FLAME_LOCAL_HEIGHT,
            base_position.z,
        );
        let light = scene.add_light(Light::point_with_range(
            light_position,
            RgbaColor::from_hex(0xffaa00),
            0.0,
            2.0,
        ));

        candles.push(Candle {
            index,
            base_position,
            group,
            body,
            wick,
            flame,
            wick_material,
            flame_material,
            light,
            lit: false,
        });
    }

    Ok(BuiltScene {
        tree_root,
        candles: CandleSet::new(candles),
    })
}
