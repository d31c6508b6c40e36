//! Pointer-to-candle resolution.
//!
//! A pointer event becomes a world-space ray, the ray is intersected against
//! the candle subtrees only, and the nearest hit resolves to its owning
//! candle through the candle set's node index. The full pipeline runs on CPU
//! data, so it is testable without a window or GPU device.

use std::time::Duration;

use rand::Rng;
use web_time::Instant;

use crate::candles::{CandleSet, IgniteOutcome, CELEBRATION_DELAY_MS};
use crate::common::Ray;
use crate::geom_query::pick_roots_from_ray;
use crate::scene::Scene;
use crate::schedule::{Task, TaskQueue};
use crate::sparkle::SparkleSystem;

/// Resolves a ray to the candle it hits, if any.
///
/// Only candle-owned geometry is tested; the rest of the scene never
/// occludes a candle. The nearest hit wins. A hit on a mesh with no owning
/// candle is logged and treated as a miss.
pub fn resolve_candle_hit(scene: &Scene, candles: &CandleSet, ray: &Ray) -> Option<usize> {
    let groups = candles.group_nodes();
    let hits = pick_roots_from_ray(ray, scene, &groups);
    let nearest = hits.first()?;

    match candles.owner_of(nearest.node_id) {
        Some(index) => Some(index),
        None => {
            log::warn!(
                "Hit node {} has no owning candle; ignoring",
                nearest.node_id
            );
            None
        }
    }
}

/// Resolves a ray and, on a hit, runs the full lighting transition.
///
/// On an UNLIT hit: the candle ignites, a sparkle burst spawns at its world
/// position, and - if this was the final candle - the celebration is armed
/// and scheduled [`CELEBRATION_DELAY_MS`] in the future. A hit on a lit
/// candle (or no hit) changes nothing and returns `None`.
pub fn light_candle_at(
    ray: &Ray,
    now: Instant,
    scene: &mut Scene,
    candles: &mut CandleSet,
    sparkles: &mut SparkleSystem,
    tasks: &mut TaskQueue,
    rng: &mut impl Rng,
) -> Option<usize> {
    let index = resolve_candle_hit(scene, candles, ray)?;

    match candles.ignite(index, scene) {
        IgniteOutcome::Ignited {
            sparkle_position,
            all_lit,
        } => {
            sparkles.spawn(scene, sparkle_position, rng);

            if all_lit && candles.try_arm_celebration() {
                tasks.schedule(
                    now,
                    Duration::from_millis(CELEBRATION_DELAY_MS),
                    Task::Celebration,
                );
            }

            Some(index)
        }
        IgniteOutcome::AlreadyLit => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::model::{build_scene, SceneConfig};
    use cgmath::{Point3, Vector3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const WIDTH: u32 = 800;
    const HEIGHT: u32 = 600;

    struct Fixture {
        scene: Scene,
        candles: CandleSet,
        sparkles: SparkleSystem,
        tasks: TaskQueue,
        camera: Camera,
        rng: StdRng,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let built = build_scene(&mut scene, &SceneConfig::default()).unwrap();

        let camera = Camera {
            eye: cgmath::point3(8.0, 6.0, 12.0),
            target: cgmath::point3(0.0, 5.0, 0.0),
            up: Vector3::unit_y(),
            aspect: WIDTH as f32 / HEIGHT as f32,
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
        };

        Fixture {
            scene,
            candles: built.candles,
            sparkles: SparkleSystem::new(),
            tasks: TaskQueue::new(),
            camera,
            rng: StdRng::seed_from_u64(42),
        }
    }

    /// Builds the ray a pointer event at the candle's on-screen position
    /// would produce.
    fn ray_at_candle(fix: &Fixture, index: usize) -> Ray {
        let candle = fix.candles.get(index).unwrap();
        let body_center = Point3::new(
            candle.base_position.x,
            candle.base_position.y + 0.15,
            candle.base_position.z,
        );

        let screen = fix.camera.project_point_screen(body_center, WIDTH, HEIGHT);
        Ray::from_screen_point(screen.x, screen.y, WIDTH, HEIGHT, &fix.camera).unwrap()
    }

    fn click(fix: &mut Fixture, ray: &Ray, now: Instant) -> Option<usize> {
        light_candle_at(
            ray,
            now,
            &mut fix.scene,
            &mut fix.candles,
            &mut fix.sparkles,
            &mut fix.tasks,
            &mut fix.rng,
        )
    }

    #[test]
    fn test_click_on_candle_lights_it() {
        let mut fix = fixture();
        let ray = ray_at_candle(&fix, 0);

        let lit = click(&mut fix, &ray, Instant::now());

        assert_eq!(lit, Some(0));
        assert!(fix.candles.get(0).unwrap().is_lit());
        assert_eq!(fix.candles.lit_count(), 1);
        assert_eq!(fix.sparkles.active_count(), 1);
        assert!(fix.tasks.is_empty());
    }

    #[test]
    fn test_click_on_lit_candle_is_noop() {
        let mut fix = fixture();
        let ray = ray_at_candle(&fix, 1);
        let now = Instant::now();

        assert_eq!(click(&mut fix, &ray, now), Some(1));
        let sparkles_after_first = fix.sparkles.active_count();

        // Second click on the same candle: no state change, no new burst
        assert_eq!(click(&mut fix, &ray, now), None);
        assert_eq!(fix.candles.lit_count(), 1);
        assert_eq!(fix.sparkles.active_count(), sparkles_after_first);
        assert!(fix.tasks.is_empty());
    }

    #[test]
    fn test_click_on_sky_is_noop() {
        let mut fix = fixture();

        // Top-left corner of the viewport looks at empty sky
        let ray = Ray::from_screen_point(1.0, 1.0, WIDTH, HEIGHT, &fix.camera).unwrap();
        assert_eq!(click(&mut fix, &ray, Instant::now()), None);
        assert_eq!(fix.candles.lit_count(), 0);
        assert_eq!(fix.sparkles.active_count(), 0);
    }

    #[test]
    fn test_tree_does_not_capture_candle_clicks() {
        let mut fix = fixture();

        // A ray toward a candle passes near tree foliage; only candle
        // geometry may resolve.
        let ray = ray_at_candle(&fix, 2);
        let resolved = resolve_candle_hit(&fix.scene, &fix.candles, &ray);
        assert_eq!(resolved, Some(2));
    }

    #[test]
    fn test_final_candle_schedules_deferred_celebration() {
        let mut fix = fixture();
        let now = Instant::now();

        for index in 0..4 {
            let ray = ray_at_candle(&fix, index);
            assert_eq!(click(&mut fix, &ray, now), Some(index));
        }

        assert!(fix.candles.all_lit());

        // Deferred, not immediate: the task is queued but has not run
        assert_eq!(fix.tasks.len(), 1);
        assert!(!fix.candles.has_celebrated());
        assert!(fix.tasks.drain_due(now).is_empty());

        // At +500ms the celebration comes due
        let due = fix
            .tasks
            .drain_due(now + Duration::from_millis(CELEBRATION_DELAY_MS));
        assert_eq!(due, vec![Task::Celebration]);
    }

    #[test]
    fn test_celebration_scheduled_exactly_once() {
        let mut fix = fixture();
        let now = Instant::now();

        for index in 0..4 {
            let ray = ray_at_candle(&fix, index);
            click(&mut fix, &ray, now);
        }
        assert_eq!(fix.tasks.len(), 1);

        // Clicking lit candles afterwards must not re-arm the celebration
        for index in 0..4 {
            let ray = ray_at_candle(&fix, index);
            assert_eq!(click(&mut fix, &ray, now), None);
        }
        assert_eq!(fix.tasks.len(), 1);
    }

    #[test]
    fn test_resolution_unaffected_by_other_lit_candles() {
        let mut fix = fixture();
        let now = Instant::now();

        // Light candles out of order; each click resolves to its own candle
        for &index in &[3, 0, 2, 1] {
            let ray = ray_at_candle(&fix, index);
            assert_eq!(click(&mut fix, &ray, now), Some(index));
        }
        assert!(fix.candles.all_lit());
    }
}
