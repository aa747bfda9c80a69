//! Canonical events and the event sink.
//!
//! Backends never talk to the host directly. Everything they observe is
//! normalized into an [`Event`] and delivered to an [`EventSink`]; the default
//! sink is an [`EventQueue`] the host drains at its own pace.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::handle::Handle;
use crate::input::{KeyCode, ModifierFlags, MouseButton};

// =============================================================================
// Lifecycle
// =============================================================================

/// Window and application lifecycle notifications. Discriminants are the
/// wire ids used by `ng_invoke_lifecycle_callback`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    DidEnterBackground = 0,
    WillEnterForeground = 1,
    Paused = 2,
    Resumed = 3,
    Destroyed = 4,
    WindowWillClose = 5,
    Minimized = 6,
    Restored = 7,
    MemoryWarning = 8,
    SurfaceLost = 9,
    SurfaceRecreated = 10,
    WindowMoved = 11,
    WindowResized = 12,
}

impl LifecycleEvent {
    pub fn from_id(id: u32) -> Option<LifecycleEvent> {
        use LifecycleEvent::*;
        Some(match id {
            0 => DidEnterBackground,
            1 => WillEnterForeground,
            2 => Paused,
            3 => Resumed,
            4 => Destroyed,
            5 => WindowWillClose,
            6 => Minimized,
            7 => Restored,
            8 => MemoryWarning,
            9 => SurfaceLost,
            10 => SurfaceRecreated,
            11 => WindowMoved,
            12 => WindowResized,
            _ => return None,
        })
    }

    pub fn id(self) -> u32 {
        self as u32
    }
}

// =============================================================================
// Canonical Events
// =============================================================================

/// An input or lifecycle occurrence on one window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Lifecycle(LifecycleEvent),
    Key {
        key: KeyCode,
        pressed: bool,
        modifiers: ModifierFlags,
    },
    MouseButton {
        button: MouseButton,
        pressed: bool,
        modifiers: ModifierFlags,
    },
    MouseMove {
        x: f64,
        y: f64,
    },
    MouseWheel {
        delta_x: f64,
        delta_y: f64,
        modifiers: ModifierFlags,
    },
    /// Relative pointer motion, only produced while the cursor is locked.
    RawMouseMotion {
        delta_x: f64,
        delta_y: f64,
    },
    TextInput(String),
    FocusChanged(bool),
    CursorEntered(bool),
    ScaleFactorChanged(f32),
}

/// Interaction with a widget, identified by the id the host assigned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    MenuItem { id: u32 },
    Button { id: u32 },
    TabSelected { id: u32, index: i32 },
    TabDetachRequested { id: u32, index: i32 },
    SidebarSelected { id: u32, index: i32 },
    /// Full current content of a single-line text field.
    TextChanged { id: u32, text: String },
    /// Full current content of a multi-line text view.
    TextViewChanged { id: u32, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Window { window: Handle, event: WindowEvent },
    Widget(WidgetEvent),
}

// =============================================================================
// Sinks
// =============================================================================

/// Receiver of canonical events.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: Event);
}

/// FIFO channel between the UI thread and the host.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events.lock().push_back(event);
    }

    pub fn poll(&self) -> Option<Event> {
        self.events.lock().pop_front()
    }

    pub fn drain(&self) -> Vec<Event> {
        self.events.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for EventQueue {
    fn deliver(&self, event: Event) {
        self.push(event);
    }
}
