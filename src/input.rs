//! Input types that are independent of any specific windowing library.
//! These types mirror common windowing system input abstractions.

/// Element state (pressed or released)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementState {
    Pressed,
    Released,
}

/// Mouse button identifier
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

/// Mouse scroll delta
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseScrollDelta {
    /// Scroll delta in lines
    LineDelta(f32, f32),
    /// Scroll delta in pixels
    PixelDelta(f32, f32),
}

/// Phase of a touch interaction
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// Keyboard physical key code (scancode)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PhysicalKey {
    /// A known key code
    Code(u32),
    /// An unidentified key
    Unidentified,
}

/// Keyboard logical key (with consideration for layout)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A named key
    Named(NamedKey),
    /// A character key
    Character(char),
    /// An unidentified key
    Unidentified,
}

/// Named keyboard keys
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Escape,
    Enter,
    Tab,
    Backspace,
    Delete,
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
    Control,
    Alt,
    Shift,
    Super,
}

/// Keyboard event
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    /// Physical key (scancode)
    pub physical_key: PhysicalKey,
    /// Logical key (with layout consideration)
    pub logical_key: Key,
    /// Whether the key was pressed or released
    pub state: ElementState,
    /// Whether this is a repeat event from holding the key
    pub repeat: bool,
}
