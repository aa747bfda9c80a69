//! Backend-facing half of event delivery.
//!
//! Backends hand raw native values to the [`EventForwarder`], which decodes
//! them with the active [`NativeInput`] vocabulary, consults the per-window
//! registries and delivers canonical events to the sink. Native code that has
//! already normalized an event calls the canonical methods directly.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::{Event, EventSink, LifecycleEvent, WidgetEvent, WindowEvent};
use crate::handle::Handle;
use crate::input::{
    CursorTracker, GrabMode, KeyCode, ModifierFlags, MotionOutput, MouseButton, NativeFamily,
};
use crate::registry::{Registration, RegistryMode, WindowRegistry};

/// Host callback invoked when a window's scale factor changes.
pub type ScaleCallback = Arc<dyn Fn(Handle, f32) + Send + Sync>;

// =============================================================================
// Per-window State
// =============================================================================

#[derive(Clone, Default)]
pub struct ScaleEntry {
    pub callback: Option<ScaleCallback>,
    /// Last factor delivered; repeats are suppressed.
    pub last_scale: Option<f32>,
}

impl fmt::Debug for ScaleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaleEntry")
            .field("callback", &self.callback.is_some())
            .field("last_scale", &self.last_scale)
            .finish()
    }
}

/// Marks a window as subscribed to lifecycle events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleEntry;

/// Registries holding per-window callback state.
#[derive(Debug)]
pub struct State {
    pub scale: WindowRegistry<ScaleEntry>,
    pub lifecycle: WindowRegistry<LifecycleEntry>,
    pub cursor: WindowRegistry<CursorTracker>,
}

impl State {
    pub fn new(mode: RegistryMode) -> Self {
        Self {
            scale: WindowRegistry::new("scale factor", mode),
            lifecycle: WindowRegistry::new("lifecycle", mode),
            cursor: WindowRegistry::new("cursor grab", mode),
        }
    }

    /// Drop everything recorded for a destroyed window.
    pub fn forget(&mut self, window: Handle) {
        self.scale.forget(window);
        self.lifecycle.forget(window);
        self.cursor.forget(window);
    }
}

// =============================================================================
// Native Events
// =============================================================================

/// An event as a backend observed it, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    Key { window: Handle, key: u32, pressed: bool, modifiers: u64 },
    MouseButton { window: Handle, button: u32, pressed: bool, modifiers: u64 },
    MouseMove { window: Handle, x: f64, y: f64 },
    MouseWheel { window: Handle, delta_x: f64, delta_y: f64, modifiers: u64 },
    RawMouseMotion { window: Handle, delta_x: f64, delta_y: f64 },
    TextInput { window: Handle, text: String },
    Focus { window: Handle, focused: bool },
    CursorEntered { window: Handle, entered: bool },
    ScaleFactor { window: Handle, scale: f32 },
    Lifecycle { window: Handle, event: LifecycleEvent },
    Widget(WidgetEvent),
}

// =============================================================================
// Forwarder
// =============================================================================

pub struct EventForwarder {
    family: Mutex<NativeFamily>,
    state: Mutex<State>,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for EventForwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventForwarder")
            .field("family", &*self.family.lock())
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl EventForwarder {
    pub fn new(sink: Arc<dyn EventSink>, mode: RegistryMode, family: NativeFamily) -> Self {
        Self {
            family: Mutex::new(family),
            state: Mutex::new(State::new(mode)),
            sink,
        }
    }

    pub fn family(&self) -> NativeFamily {
        *self.family.lock()
    }

    pub fn set_family(&self, family: NativeFamily) {
        *self.family.lock() = family;
    }

    /// Run `f` with exclusive access to the registries.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock())
    }

    // =========================================================================
    // Registration
    // =========================================================================

    pub fn register_scale(&self, window: Handle, callback: Option<ScaleCallback>, current: f32) -> Registration {
        self.state.lock().scale.register(
            window,
            ScaleEntry { callback, last_scale: Some(current) },
        )
    }

    pub fn register_lifecycle(&self, window: Handle) -> Registration {
        self.state.lock().lifecycle.register(window, LifecycleEntry)
    }

    /// Record a grab mode the backend accepted. Returns false when the cursor
    /// registry is full and the window's motion stays absolute.
    pub fn set_cursor_grab(&self, window: Handle, mode: GrabMode) -> bool {
        let mut state = self.state.lock();
        match state.cursor.get_or_insert_with(window, CursorTracker::new) {
            Some(tracker) => {
                tracker.set_mode(mode);
                true
            }
            None => false,
        }
    }

    pub fn forget(&self, window: Handle) {
        self.state.lock().forget(window);
    }

    // =========================================================================
    // Native input
    // =========================================================================

    /// Normalize and deliver one native event.
    pub fn dispatch(&self, event: NativeEvent) {
        let input = self.family().input();
        match event {
            NativeEvent::Key { window, key, pressed, modifiers } => {
                self.key(window, input.keycode(key), pressed, input.modifiers(modifiers))
            }
            NativeEvent::MouseButton { window, button, pressed, modifiers } => self.mouse_button(
                window,
                input.mouse_button(button),
                pressed,
                input.modifiers(modifiers),
            ),
            NativeEvent::MouseMove { window, x, y } => self.mouse_move(window, x, y),
            NativeEvent::MouseWheel { window, delta_x, delta_y, modifiers } => {
                self.mouse_wheel(window, delta_x, delta_y, input.modifiers(modifiers))
            }
            NativeEvent::RawMouseMotion { window, delta_x, delta_y } => {
                self.raw_mouse_motion(window, delta_x, delta_y)
            }
            NativeEvent::TextInput { window, text } => self.text_input(window, text),
            NativeEvent::Focus { window, focused } => self.focus_changed(window, focused),
            NativeEvent::CursorEntered { window, entered } => self.cursor_entered(window, entered),
            NativeEvent::ScaleFactor { window, scale } => self.scale_factor_changed(window, scale),
            NativeEvent::Lifecycle { window, event } => self.lifecycle(window, event),
            NativeEvent::Widget(event) => self.widget(event),
        }
    }

    // =========================================================================
    // Canonical delivery
    // =========================================================================

    fn deliver(&self, window: Handle, event: WindowEvent) {
        self.sink.deliver(Event::Window { window, event });
    }

    /// Delivered only for windows subscribed with `register_lifecycle`.
    pub fn lifecycle(&self, window: Handle, event: LifecycleEvent) {
        if !self.state.lock().lifecycle.contains(window) {
            log::trace!("lifecycle {:?} for unsubscribed window {}", event, window);
            return;
        }
        self.deliver(window, WindowEvent::Lifecycle(event));
    }

    pub fn key(&self, window: Handle, key: KeyCode, pressed: bool, modifiers: ModifierFlags) {
        self.deliver(window, WindowEvent::Key { key, pressed, modifiers });
    }

    pub fn mouse_button(&self, window: Handle, button: MouseButton, pressed: bool, modifiers: ModifierFlags) {
        self.deliver(window, WindowEvent::MouseButton { button, pressed, modifiers });
    }

    /// Absolute motion. While the window's cursor is locked this becomes a
    /// relative delta, unless native relative motion already owns the lock.
    pub fn mouse_move(&self, window: Handle, x: f64, y: f64) {
        let output = {
            let mut state = self.state.lock();
            match state.cursor.lookup_mut(window) {
                Some(tracker) => tracker.on_motion(x, y),
                None => Some(MotionOutput::Absolute { x, y }),
            }
        };
        let Some(output) = output else {
            return;
        };
        let event = match output {
            MotionOutput::Absolute { x, y } => WindowEvent::MouseMove { x, y },
            MotionOutput::Relative { dx, dy } => WindowEvent::RawMouseMotion { delta_x: dx, delta_y: dy },
        };
        self.deliver(window, event);
    }

    pub fn mouse_wheel(&self, window: Handle, delta_x: f64, delta_y: f64, modifiers: ModifierFlags) {
        self.deliver(window, WindowEvent::MouseWheel { delta_x, delta_y, modifiers });
    }

    /// Relative motion reported natively. Dropped unless the cursor is locked
    /// and absolute positions have not already claimed the lock.
    pub fn raw_mouse_motion(&self, window: Handle, delta_x: f64, delta_y: f64) {
        let forwarded = self
            .state
            .lock()
            .cursor
            .lookup_mut(window)
            .and_then(|tracker| tracker.on_raw_motion(delta_x, delta_y));
        if let Some((dx, dy)) = forwarded {
            self.deliver(window, WindowEvent::RawMouseMotion { delta_x: dx, delta_y: dy });
        }
    }

    pub fn text_input(&self, window: Handle, text: String) {
        if text.is_empty() {
            return;
        }
        self.deliver(window, WindowEvent::TextInput(text));
    }

    pub fn focus_changed(&self, window: Handle, focused: bool) {
        self.deliver(window, WindowEvent::FocusChanged(focused));
    }

    pub fn cursor_entered(&self, window: Handle, entered: bool) {
        self.deliver(window, WindowEvent::CursorEntered(entered));
    }

    /// Delivered only for registered windows and only when the factor changed.
    /// The registered host callback runs after the registry lock is released.
    pub fn scale_factor_changed(&self, window: Handle, scale: f32) {
        let callback = {
            let mut state = self.state.lock();
            let Some(entry) = state.scale.lookup_mut(window) else {
                log::trace!("scale change for unregistered window {}", window);
                return;
            };
            if entry.last_scale == Some(scale) {
                return;
            }
            entry.last_scale = Some(scale);
            entry.callback.clone()
        };
        self.deliver(window, WindowEvent::ScaleFactorChanged(scale));
        if let Some(callback) = callback {
            callback(window, scale);
        }
    }

    pub fn widget(&self, event: WidgetEvent) {
        self.sink.deliver(Event::Widget(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventQueue;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn h(raw: usize) -> Handle {
        Handle::from_raw(raw).unwrap()
    }

    fn forwarder(family: NativeFamily) -> (Arc<EventQueue>, EventForwarder) {
        let queue = Arc::new(EventQueue::new());
        let fwd = EventForwarder::new(queue.clone(), RegistryMode::default(), family);
        (queue, fwd)
    }

    fn window_events(queue: &EventQueue) -> Vec<WindowEvent> {
        queue
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                Event::Window { event, .. } => Some(event),
                Event::Widget(_) => None,
            })
            .collect()
    }

    // =========================================================================
    // Normalization
    // =========================================================================

    #[test]
    fn test_native_key_is_normalized() {
        let (queue, fwd) = forwarder(NativeFamily::Gdk);
        fwd.dispatch(NativeEvent::Key { window: h(1), key: 0x61, pressed: true, modifiers: 1 | 4 });
        assert_eq!(
            window_events(&queue),
            vec![WindowEvent::Key {
                key: KeyCode::A,
                pressed: true,
                modifiers: ModifierFlags::SHIFT | ModifierFlags::CONTROL,
            }]
        );
    }

    #[test]
    fn test_family_switch_changes_vocabulary() {
        let (queue, fwd) = forwarder(NativeFamily::Gdk);
        fwd.set_family(NativeFamily::Win32);
        fwd.dispatch(NativeEvent::MouseButton { window: h(1), button: 0x04, pressed: false, modifiers: 0 });
        assert_eq!(
            window_events(&queue),
            vec![WindowEvent::MouseButton {
                button: MouseButton::Middle,
                pressed: false,
                modifiers: ModifierFlags::empty(),
            }]
        );
    }

    // =========================================================================
    // Cursor grab
    // =========================================================================

    #[test]
    fn test_locked_motion_becomes_deltas() {
        let (queue, fwd) = forwarder(NativeFamily::Canonical);
        let w = h(1);
        fwd.mouse_move(w, 5.0, 5.0);
        assert!(fwd.set_cursor_grab(w, GrabMode::Confined));
        fwd.mouse_move(w, 10.0, 10.0);
        assert!(fwd.set_cursor_grab(w, GrabMode::None));
        assert!(fwd.set_cursor_grab(w, GrabMode::Locked));
        fwd.mouse_move(w, 100.0, 100.0);
        fwd.mouse_move(w, 103.0, 96.0);
        assert_eq!(
            window_events(&queue),
            vec![
                WindowEvent::MouseMove { x: 5.0, y: 5.0 },
                WindowEvent::MouseMove { x: 10.0, y: 10.0 },
                WindowEvent::RawMouseMotion { delta_x: 0.0, delta_y: 0.0 },
                WindowEvent::RawMouseMotion { delta_x: 3.0, delta_y: -4.0 },
            ]
        );
    }

    #[test]
    fn test_raw_motion_requires_lock() {
        let (queue, fwd) = forwarder(NativeFamily::Canonical);
        let w = h(1);
        fwd.raw_mouse_motion(w, 1.0, 1.0);
        fwd.set_cursor_grab(w, GrabMode::Confined);
        fwd.raw_mouse_motion(w, 1.0, 1.0);
        fwd.set_cursor_grab(w, GrabMode::Locked);
        fwd.raw_mouse_motion(w, 2.0, -1.0);
        assert_eq!(
            window_events(&queue),
            vec![WindowEvent::RawMouseMotion { delta_x: 2.0, delta_y: -1.0 }]
        );
    }

    #[test]
    fn test_locked_motion_reported_once_when_both_streams_arrive() {
        let (queue, fwd) = forwarder(NativeFamily::Canonical);
        let w = h(1);
        assert!(fwd.set_cursor_grab(w, GrabMode::Locked));
        fwd.mouse_move(w, 100.0, 100.0);
        fwd.mouse_move(w, 105.0, 103.0);
        fwd.raw_mouse_motion(w, 5.0, 3.0);
        assert_eq!(
            window_events(&queue),
            vec![
                WindowEvent::RawMouseMotion { delta_x: 0.0, delta_y: 0.0 },
                WindowEvent::RawMouseMotion { delta_x: 5.0, delta_y: 3.0 },
            ]
        );
    }

    #[test]
    fn test_native_deltas_suppress_position_deltas() {
        let (queue, fwd) = forwarder(NativeFamily::Canonical);
        let w = h(1);
        assert!(fwd.set_cursor_grab(w, GrabMode::Locked));
        fwd.raw_mouse_motion(w, 5.0, 3.0);
        fwd.mouse_move(w, 100.0, 100.0);
        fwd.mouse_move(w, 105.0, 103.0);
        fwd.raw_mouse_motion(w, 1.0, 0.0);
        assert_eq!(
            window_events(&queue),
            vec![
                WindowEvent::RawMouseMotion { delta_x: 5.0, delta_y: 3.0 },
                WindowEvent::RawMouseMotion { delta_x: 1.0, delta_y: 0.0 },
            ]
        );
    }

    #[test]
    fn test_cursor_grab_is_per_window() {
        let (queue, fwd) = forwarder(NativeFamily::Canonical);
        fwd.set_cursor_grab(h(1), GrabMode::Locked);
        fwd.mouse_move(h(2), 1.0, 2.0);
        assert_eq!(window_events(&queue), vec![WindowEvent::MouseMove { x: 1.0, y: 2.0 }]);
    }

    // =========================================================================
    // Lifecycle and scale
    // =========================================================================

    #[test]
    fn test_lifecycle_only_for_subscribed_windows() {
        let (queue, fwd) = forwarder(NativeFamily::Canonical);
        fwd.lifecycle(h(1), LifecycleEvent::Minimized);
        fwd.register_lifecycle(h(1));
        fwd.dispatch(NativeEvent::Lifecycle { window: h(1), event: LifecycleEvent::Restored });
        assert_eq!(window_events(&queue), vec![WindowEvent::Lifecycle(LifecycleEvent::Restored)]);
    }

    #[test]
    fn test_scale_changes_are_deduplicated_and_call_back() {
        let (queue, fwd) = forwarder(NativeFamily::Canonical);
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let callback: ScaleCallback = Arc::new(move |_: Handle, scale: f32| {
            assert_eq!(scale, 2.0);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        fwd.scale_factor_changed(h(1), 2.0); // not registered
        fwd.register_scale(h(1), Some(callback), 1.0);
        fwd.scale_factor_changed(h(1), 1.0); // unchanged
        fwd.scale_factor_changed(h(1), 2.0);
        fwd.scale_factor_changed(h(1), 2.0);

        assert_eq!(window_events(&queue), vec![WindowEvent::ScaleFactorChanged(2.0)]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_forget_clears_every_registry() {
        let (queue, fwd) = forwarder(NativeFamily::Canonical);
        let w = h(7);
        fwd.register_lifecycle(w);
        fwd.register_scale(w, None, 1.0);
        fwd.set_cursor_grab(w, GrabMode::Locked);
        fwd.forget(w);
        fwd.lifecycle(w, LifecycleEvent::Destroyed);
        fwd.mouse_move(w, 1.0, 1.0);
        assert_eq!(window_events(&queue), vec![WindowEvent::MouseMove { x: 1.0, y: 1.0 }]);
        fwd.with_state(|state| {
            assert!(state.scale.is_empty());
            assert!(state.cursor.is_empty());
        });
    }

    #[test]
    fn test_full_cursor_registry_keeps_motion_absolute() {
        let queue = Arc::new(EventQueue::new());
        let fwd = EventForwarder::new(queue.clone(), RegistryMode::Bounded(1), NativeFamily::Canonical);
        assert!(fwd.set_cursor_grab(h(1), GrabMode::Locked));
        assert!(!fwd.set_cursor_grab(h(2), GrabMode::Locked));
        fwd.mouse_move(h(2), 4.0, 4.0);
        assert_eq!(window_events(&queue), vec![WindowEvent::MouseMove { x: 4.0, y: 4.0 }]);
    }

    #[test]
    fn test_widget_events_and_empty_text() {
        let (queue, fwd) = forwarder(NativeFamily::Canonical);
        fwd.text_input(h(1), String::new());
        fwd.dispatch(NativeEvent::Widget(WidgetEvent::TabSelected { id: 3, index: 1 }));
        assert_eq!(
            queue.drain(),
            vec![Event::Widget(WidgetEvent::TabSelected { id: 3, index: 1 })]
        );
    }
}
