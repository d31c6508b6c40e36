use web_time::Instant;

use crate::common::Ray;
use crate::event::{CallbackId, Event, EventContext, EventDispatcher, EventKind};
use crate::input::MouseButton;
use crate::interact::light_candle_at;
use crate::operator::{Operator, OperatorId};

/// Operator that lights candles from pointer input.
///
/// Listens for left-button clicks and touch starts, casts a ray through the
/// pointer position, and runs the candle lighting pipeline on the nearest
/// candle hit. Clicks on lit candles and empty space do nothing.
pub struct IgniteOperator {
    id: OperatorId,
    callback_ids: Vec<CallbackId>,
}

impl IgniteOperator {
    /// Creates a new ignite operator with the given ID.
    pub fn new(id: OperatorId) -> Self {
        Self {
            id,
            callback_ids: Vec::new(),
        }
    }

    /// Casts a ray through the pointer position and lights the candle it hits.
    fn ignite_at(pointer_x: f32, pointer_y: f32, ctx: &mut EventContext) {
        let (width, height) = ctx.renderer.size;

        let Some(ray) =
            Ray::from_screen_point(pointer_x, pointer_y, width, height, &ctx.renderer.camera)
        else {
            log::warn!("Camera projection not invertible; ignoring pointer event");
            return;
        };

        light_candle_at(
            &ray,
            Instant::now(),
            ctx.scene,
            ctx.candles,
            ctx.sparkles,
            ctx.tasks,
            &mut rand::thread_rng(),
        );
    }
}

impl Operator for IgniteOperator {
    fn activate(&mut self, dispatcher: &mut EventDispatcher) {
        // Light candles on left click
        let click_callback = dispatcher.register(EventKind::MouseClick, |event, ctx| {
            let Event::MouseClick {
                button, position, ..
            } = event
            else {
                return false;
            };

            if matches!(button, MouseButton::Left) {
                IgniteOperator::ignite_at(position.0, position.1, ctx);
                true // Stop event propagation (we handled the click)
            } else {
                false
            }
        });

        // The first touch point acts like a click
        let touch_callback = dispatcher.register(EventKind::TouchStart, |event, ctx| {
            let Event::TouchStart { position } = event else {
                return false;
            };

            IgniteOperator::ignite_at(position.0, position.1, ctx);
            true
        });

        self.callback_ids = vec![click_callback, touch_callback];
    }

    fn deactivate(&mut self, dispatcher: &mut EventDispatcher) {
        for id in &self.callback_ids {
            dispatcher.unregister(*id);
        }
        self.callback_ids.clear();
    }

    fn id(&self) -> OperatorId {
        self.id
    }

    fn name(&self) -> &str {
        "Ignite"
    }

    fn callback_ids(&self) -> &[CallbackId] {
        &self.callback_ids
    }

    fn is_active(&self) -> bool {
        !self.callback_ids.is_empty()
    }
}
