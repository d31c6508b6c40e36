use crate::event::{CallbackId, Event, EventDispatcher, EventKind};
use crate::input::{MouseButton, MouseScrollDelta};
use crate::operator::{Operator, OperatorId};

/// Radians of orbit per pixel of drag.
const DRAG_SENSITIVITY: f32 = 0.005;

/// Operator for camera navigation via the mouse.
///
/// Dragging with the left mouse button orbits the camera around the rig's
/// target; the wheel zooms. Input only adjusts the rig's desired
/// coordinates - the actual camera motion happens in the per-frame Update
/// handler, which integrates the rig's damping.
pub struct NavigationOperator {
    id: OperatorId,
    callback_ids: Vec<CallbackId>,
}

impl NavigationOperator {
    /// Creates a new navigation operator with the given ID.
    pub fn new(id: OperatorId) -> Self {
        Self {
            id,
            callback_ids: Vec::new(),
        }
    }
}

impl Operator for NavigationOperator {
    fn activate(&mut self, dispatcher: &mut EventDispatcher) {
        // Orbit on left-button drag
        let drag_callback = dispatcher.register(EventKind::MouseDrag, |event, ctx| {
            let Event::MouseDrag { button, delta, .. } = event else {
                return false;
            };

            if !matches!(button, MouseButton::Left) {
                return false;
            }

            ctx.rig
                .rotate(delta.0 * DRAG_SENSITIVITY, delta.1 * DRAG_SENSITIVITY);
            true
        });

        // Zoom on wheel
        let wheel_callback = dispatcher.register(EventKind::MouseWheel, |event, ctx| {
            let Event::MouseWheel { delta } = event else {
                return false;
            };

            // Positive = zoom in, negative = zoom out
            let scroll_amount = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(_, y) => y / 10.0, // Scale pixel delta
            };

            ctx.rig.zoom(scroll_amount);
            true
        });

        // Integrate damping toward the desired coordinates every frame
        let update_callback = dispatcher.register(EventKind::Update, |event, ctx| {
            let Event::Update { .. } = event else {
                return false;
            };

            ctx.rig.update(&mut ctx.renderer.camera);
            false // Other operators may also use the update tick
        });

        self.callback_ids = vec![drag_callback, wheel_callback, update_callback];
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
        "Navigation"
    }

    fn callback_ids(&self) -> &[CallbackId] {
        &self.callback_ids
    }

    fn is_active(&self) -> bool {
        !self.callback_ids.is_empty()
    }
}
