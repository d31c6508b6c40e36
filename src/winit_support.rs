//! Winit integration - conversion functions between winit types and our
//! input/event types, keeping the rest of the crate windowing-agnostic.

use crate::event::Event;
use crate::input::{ElementState, Key, KeyEvent, MouseButton, MouseScrollDelta, NamedKey, PhysicalKey};

/// Converts a winit ElementState to our ElementState
pub fn convert_element_state(state: winit::event::ElementState) -> ElementState {
    match state {
        winit::event::ElementState::Pressed => ElementState::Pressed,
        winit::event::ElementState::Released => ElementState::Released,
    }
}

/// Converts a winit MouseButton to our MouseButton
pub fn convert_mouse_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Left,
        winit::event::MouseButton::Right => MouseButton::Right,
        winit::event::MouseButton::Middle => MouseButton::Middle,
        winit::event::MouseButton::Back => MouseButton::Back,
        winit::event::MouseButton::Forward => MouseButton::Forward,
        winit::event::MouseButton::Other(id) => MouseButton::Other(id),
    }
}

/// Converts a winit MouseScrollDelta to our MouseScrollDelta
pub fn convert_mouse_scroll_delta(delta: winit::event::MouseScrollDelta) -> MouseScrollDelta {
    match delta {
        winit::event::MouseScrollDelta::LineDelta(x, y) => MouseScrollDelta::LineDelta(x, y),
        winit::event::MouseScrollDelta::PixelDelta(pos) => {
            MouseScrollDelta::PixelDelta(pos.x as f32, pos.y as f32)
        }
    }
}

/// Converts a winit KeyEvent to our KeyEvent (simplified version)
pub fn convert_key_event(event: &winit::event::KeyEvent) -> KeyEvent {
    let physical_key = match event.physical_key {
        winit::keyboard::PhysicalKey::Code(code) => PhysicalKey::Code(code as u32),
        winit::keyboard::PhysicalKey::Unidentified(_code) => PhysicalKey::Unidentified,
    };

    let logical_key = match &event.logical_key {
        winit::keyboard::Key::Named(named) => match convert_named_key(*named) {
            Some(key) => Key::Named(key),
            None => Key::Unidentified,
        },
        winit::keyboard::Key::Character(s) => {
            if let Some(c) = s.chars().next() {
                Key::Character(c)
            } else {
                Key::Unidentified
            }
        }
        _ => Key::Unidentified,
    };

    KeyEvent {
        physical_key,
        logical_key,
        state: convert_element_state(event.state),
        repeat: event.repeat,
    }
}

/// Converts a winit NamedKey to our NamedKey (partial mapping)
fn convert_named_key(key: winit::keyboard::NamedKey) -> Option<NamedKey> {
    use winit::keyboard::NamedKey as WK;
    match key {
        WK::Escape => Some(NamedKey::Escape),
        WK::Enter => Some(NamedKey::Enter),
        WK::Tab => Some(NamedKey::Tab),
        WK::Backspace => Some(NamedKey::Backspace),
        WK::Delete => Some(NamedKey::Delete),
        WK::Space => Some(NamedKey::Space),
        WK::ArrowLeft => Some(NamedKey::ArrowLeft),
        WK::ArrowRight => Some(NamedKey::ArrowRight),
        WK::ArrowUp => Some(NamedKey::ArrowUp),
        WK::ArrowDown => Some(NamedKey::ArrowDown),
        WK::Home => Some(NamedKey::Home),
        WK::End => Some(NamedKey::End),
        WK::PageUp => Some(NamedKey::PageUp),
        WK::PageDown => Some(NamedKey::PageDown),
        WK::Control => Some(NamedKey::Control),
        WK::Alt => Some(NamedKey::Alt),
        WK::Shift => Some(NamedKey::Shift),
        WK::Super => Some(NamedKey::Super),
        _ => None,
    }
}

/// Converts a winit WindowEvent to our Event
///
/// Returns `None` if the event is not supported or should be ignored.
/// Touch-start events are consumed here and surfaced as [`Event::TouchStart`];
/// no default scroll or zoom gesture is derived from them.
pub fn convert_window_event(wevent: winit::event::WindowEvent) -> Option<Event> {
    use winit::event::WindowEvent as WEvent;

    match wevent {
        WEvent::Resized(size) => Some(Event::Resized((size.width, size.height))),
        WEvent::KeyboardInput {
            event,
            is_synthetic,
            ..
        } => Some(Event::KeyboardInput {
            event: convert_key_event(&event),
            is_synthetic,
        }),
        WEvent::CursorMoved { position, .. } => Some(Event::CursorMoved {
            position: (position.x, position.y),
        }),
        WEvent::MouseInput { state, button, .. } => Some(Event::MouseInput {
            state: convert_element_state(state),
            button: convert_mouse_button(button),
        }),
        WEvent::MouseWheel { delta, .. } => Some(Event::MouseWheel {
            delta: convert_mouse_scroll_delta(delta),
        }),
        WEvent::Touch(touch) if touch.phase == winit::event::TouchPhase::Started => {
            Some(Event::TouchStart {
                position: (touch.location.x as f32, touch.location.y as f32),
            })
        }
        _ => None,
    }
}

/// Converts a winit DeviceEvent to our Event
///
/// Returns `None` if the event is not supported or should be ignored.
pub fn convert_device_event(wevent: winit::event::DeviceEvent) -> Option<Event> {
    use winit::event::DeviceEvent as DEvent;

    match wevent {
        DEvent::MouseMotion { delta } => Some(Event::MouseMotion { delta }),
        _ => None,
    }
}
