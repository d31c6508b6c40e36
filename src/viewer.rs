use std::time::Duration;

use cgmath::{Point3, Quaternion, Rad, Rotation3};
use rand::Rng;
use web_time::Instant;

use crate::candles::CandleSet;
use crate::event::{Event, EventContext, EventDispatcher, EventKind};
use crate::hud::{Hud, HudState};
use crate::model::{build_scene, SceneConfig};
use crate::operator::{BuiltinOperatorId, IgniteOperator, NavigationOperator, OperatorManager};
use crate::renderer::Renderer;
use crate::rig::OrbitRig;
use crate::scene::{NodeId, Scene};
use crate::schedule::{Task, TaskQueue};
use crate::sparkle::SparkleSystem;

/// Tree yaw rate in radians per second.
const TREE_SPIN_RATE: f32 = 0.12;

/// Number of sparkle bursts in the celebration volley.
const CELEBRATION_BURSTS: usize = 50;

/// Spacing between celebration bursts, in milliseconds.
const CELEBRATION_STAGGER_MS: u64 = 50;

/// Main viewer that ties together the renderer, scene, candles, sparkles,
/// task queue, orbit rig, and event handling.
pub struct Viewer<'a> {
    renderer: Renderer<'a>,
    scene: Scene,
    candles: CandleSet,
    sparkles: SparkleSystem,
    tasks: TaskQueue,
    rig: OrbitRig,
    dispatcher: EventDispatcher,
    operator_manager: OperatorManager,

    /// Root node of the slowly rotating tree group.
    tree_root: NodeId,
    /// Whether the celebration message is currently shown.
    celebration_visible: bool,

    /// Monotonic origin for all clock-driven animation.
    started_at: Instant,
    /// Last time update() was called, for delta_time calculation.
    last_update_time: Option<Instant>,
}

impl<'a> Viewer<'a> {
    /// Creates a new Viewer with the given surface target and scene config.
    ///
    /// Fails if the configuration does not validate.
    pub async fn new<T>(
        surface_target: T,
        width: u32,
        height: u32,
        config: &SceneConfig,
    ) -> anyhow::Result<Self>
    where
        T: Into<wgpu::SurfaceTarget<'a>>,
    {
        let renderer = Renderer::new(surface_target, width, height).await;

        let mut scene = Scene::new();
        let built = build_scene(&mut scene, config)?;

        let rig = OrbitRig::from_camera(&renderer.camera);

        let mut dispatcher = EventDispatcher::new();
        let mut operator_manager = OperatorManager::new();

        // Ignite operator first: a click on a candle must not also orbit
        let ignite_operator = Box::new(IgniteOperator::new(BuiltinOperatorId::Ignite.into()));
        operator_manager.add_operator(ignite_operator, 0, &mut dispatcher);

        // Navigation operator for orbit/zoom
        let nav_operator = Box::new(NavigationOperator::new(BuiltinOperatorId::Navigation.into()));
        operator_manager.add_operator(nav_operator, 1, &mut dispatcher);

        let mut viewer = Self {
            renderer,
            scene,
            candles: built.candles,
            sparkles: SparkleSystem::new(),
            tasks: TaskQueue::new(),
            rig,
            dispatcher,
            operator_manager,
            tree_root: built.tree_root,
            celebration_visible: false,
            started_at: Instant::now(),
            last_update_time: None,
        };

        viewer.register_default_handlers();

        Ok(viewer)
    }

    /// Register default event handlers for common viewer operations
    fn register_default_handlers(&mut self) {
        // Resized handler: reconfigure the surface and projection
        self.dispatcher.register(EventKind::Resized, |event, ctx| {
            if let Event::Resized(physical_size) = event {
                ctx.renderer.resize(*physical_size);
            }
            true
        });

        // CursorMoved handler to track cursor position
        self.dispatcher
            .register(EventKind::CursorMoved, |event, ctx| {
                if let Event::CursorMoved { position } = event {
                    ctx.renderer.cursor_position = Some((position.0 as f32, position.1 as f32));
                }
                false // Don't stop propagation - other handlers may need cursor position too
            });
    }

    /// Handle a single event by dispatching it to registered handlers
    pub fn handle_event(&mut self, event: &Event) {
        let mut ctx = EventContext {
            renderer: &mut self.renderer,
            scene: &mut self.scene,
            candles: &mut self.candles,
            sparkles: &mut self.sparkles,
            tasks: &mut self.tasks,
            rig: &mut self.rig,
        };
        self.dispatcher.dispatch(event, &mut ctx);
    }

    /// Advances one animation tick.
    ///
    /// Call once per frame before rendering. In order: the camera damping
    /// integrates (via the Update event), lit flames flicker, the tree spins,
    /// due delayed tasks run, and active sparkles fade. Flicker and rotation
    /// are functions of the absolute clock, so skipped ticks cannot drift the
    /// animation.
    pub fn update(&mut self) {
        let now = Instant::now();
        let t = now.duration_since(self.started_at).as_secs_f32();

        // 1. Camera damping (handled by the navigation operator)
        let delta_time = match self.last_update_time {
            Some(last) => now.duration_since(last).as_secs_f32(),
            None => 1.0 / 60.0, // Assume 60 FPS on first frame
        };
        self.last_update_time = Some(now);
        self.handle_event(&Event::Update { delta_time });

        // 2. Flame flicker for lit candles
        self.candles.animate_flames(&mut self.scene, t);

        // 3. Whole-tree slow rotation, set absolutely from the clock
        if let Some(tree) = self.scene.get_node_mut(self.tree_root) {
            tree.set_rotation(Quaternion::from_angle_y(Rad(TREE_SPIN_RATE * t)));
        }
        self.scene.invalidate_subtree_transforms(self.tree_root);

        // 4. Deferred work whose deadline has passed
        for task in self.tasks.drain_due(now) {
            match task {
                Task::Celebration => self.run_celebration(now),
                Task::SparkleBurst { position } => {
                    self.sparkles
                        .spawn(&mut self.scene, position, &mut rand::thread_rng());
                }
            }
        }

        // 5. Sparkle fade and cleanup
        self.sparkles.tick(&mut self.scene);
    }

    /// Shows the celebration and queues its staggered sparkle volley.
    fn run_celebration(&mut self, now: Instant) {
        // Terminal flag: the celebration can never run twice
        if !self.candles.mark_celebrated() {
            return;
        }

        self.celebration_visible = true;
        log::info!("All candles lit!");

        let mut rng = rand::thread_rng();
        for i in 0..CELEBRATION_BURSTS {
            let position = Point3::new(
                rng.gen_range(-5.0..5.0),
                rng.gen_range(0.0..10.0),
                rng.gen_range(-5.0..5.0),
            );
            self.tasks.schedule(
                now,
                Duration::from_millis(CELEBRATION_STAGGER_MS * i as u64),
                Task::SparkleBurst { position },
            );
        }
    }

    /// Renders the scene with the HUD overlay on top.
    ///
    /// Surface losses are recovered by reconfiguring; only unrecoverable
    /// errors are logged as such.
    pub fn render_with_hud(&mut self, hud: &mut Hud, window: &winit::window::Window) {
        let hud_state = HudState::from_candles(&self.candles, self.celebration_visible);
        let size = self.renderer.size;

        let result = self
            .renderer
            .render_with_overlay(&mut self.scene, |device, queue, encoder, view| {
                hud.draw(window, device, queue, encoder, view, size, &hud_state);
            });

        if let Err(err) = result {
            if let Some(surface_err) = err.downcast_ref::<wgpu::SurfaceError>() {
                match surface_err {
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                        self.renderer.resize(self.renderer.size);
                    }
                    wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other => {
                        log::error!("Fatal surface error: {}", surface_err);
                    }
                    wgpu::SurfaceError::Timeout => {
                        log::warn!("Surface timeout: {}", surface_err);
                    }
                }
            } else {
                log::error!("Render error: {}", err);
            }
        }
    }

    // ========== Accessors ==========

    /// Get a reference to the current camera
    pub fn camera(&self) -> &crate::camera::Camera {
        &self.renderer.camera
    }

    /// Get a reference to the scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Get a reference to the candle set
    pub fn candles(&self) -> &CandleSet {
        &self.candles
    }

    /// Get the current viewport size as (width, height)
    pub fn size(&self) -> (u32, u32) {
        self.renderer.size
    }

    /// Get the surface texture format, for overlay renderers
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.renderer.config.format
    }

    /// Get references to the wgpu device and queue for creating GPU resources
    pub fn wgpu_resources(&self) -> (&wgpu::Device, &wgpu::Queue) {
        (&self.renderer.device, &self.renderer.queue)
    }

    /// Get a reference to the operator manager
    pub fn operator_manager(&self) -> &OperatorManager {
        &self.operator_manager
    }
}
