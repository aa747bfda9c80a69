//! winit-backed desktop windows.
//!
//! The widget model lives in a [`HeadlessBackend`]; this backend adds real
//! top-level windows. Windows created before the loop starts are realized in
//! `resumed`, later ones on the next `about_to_wait`. Window-level state
//! changes are mirrored onto the native window when it exists.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::window::{CursorGrabMode, Window, WindowId};

use super::HeadlessBackend;
use crate::config::Config;
use crate::error::{NgError, NgResult};
use crate::events::LifecycleEvent;
use crate::forward::{EventForwarder, NativeEvent};
use crate::handle::{Handle, MenuHandle};
use crate::input::{from_winit_button, from_winit_key, GrabMode, ModifierFlags};
use crate::layout::{CosmicTextMeasurer, Orientation};
use crate::ops::{CanvasBuffer, PlatformOps};

#[derive(Default)]
struct NativeWindows {
    windows: HashMap<Handle, Arc<Window>>,
    ids: HashMap<WindowId, Handle>,
}

pub struct WinitBackend {
    model: HeadlessBackend,
    native: Mutex<NativeWindows>,
}

impl WinitBackend {
    pub fn new(config: &Config) -> Self {
        Self {
            model: HeadlessBackend::with_measurer(config, Box::new(CosmicTextMeasurer::new())),
            native: Mutex::new(NativeWindows::default()),
        }
    }

    /// The widget model behind the native windows.
    pub fn model(&self) -> &HeadlessBackend {
        &self.model
    }

    fn native_window(&self, window: Handle) -> Option<Arc<Window>> {
        self.native.lock().windows.get(&window).cloned()
    }

    fn handle_for(&self, id: WindowId) -> Option<Handle> {
        self.native.lock().ids.get(&id).copied()
    }

    fn apply_grab(window: &Window, mode: GrabMode) -> NgResult<()> {
        let native = match mode {
            GrabMode::None => CursorGrabMode::None,
            GrabMode::Confined => CursorGrabMode::Confined,
            GrabMode::Locked => CursorGrabMode::Locked,
        };
        match window.set_cursor_grab(native) {
            Ok(()) => Ok(()),
            // Some platforms can only confine. The tracker then derives deltas
            // from cursor positions and ignores device motion for this lock.
            Err(_) if mode == GrabMode::Locked => window
                .set_cursor_grab(CursorGrabMode::Confined)
                .map_err(|e| NgError::PlatformSpecific(e.to_string())),
            Err(e) => Err(NgError::PlatformSpecific(e.to_string())),
        }
    }

    #[cfg(not(test))]
    fn realize_windows(&self, event_loop: &winit::event_loop::ActiveEventLoop) {
        for handle in self.model.windows() {
            if self.native.lock().windows.contains_key(&handle) {
                continue;
            }
            let (Some(record), Ok((width, height))) =
                (self.model.window(handle), self.model.window_get_size(handle))
            else {
                continue;
            };

            let attrs = Window::default_attributes()
                .with_title(record.title.clone())
                .with_inner_size(winit::dpi::PhysicalSize::new(width as u32, height as u32))
                .with_position(winit::dpi::PhysicalPosition::new(record.position.0, record.position.1))
                .with_visible(record.visible);

            match event_loop.create_window(attrs) {
                Ok(window) => {
                    let window = Arc::new(window);
                    window.set_cursor_visible(record.cursor_visible);
                    if record.grab != GrabMode::None {
                        if let Err(e) = Self::apply_grab(&window, record.grab) {
                            log::error!("WinitBackend: cursor grab on {} failed: {}", handle, e);
                        }
                    }
                    let mut native = self.native.lock();
                    native.ids.insert(window.id(), handle);
                    native.windows.insert(handle, window);
                    log::debug!("WinitBackend: realized window {}", handle);
                }
                Err(e) => log::error!("WinitBackend: window creation failed: {}", e),
            }
        }
    }

    /// Model bookkeeping for events that change window geometry.
    fn track(&self, window: Handle, event: &WindowEvent) {
        let result = match event {
            WindowEvent::Resized(size) => self.model.client_resized(window, size.width, size.height),
            WindowEvent::Moved(position) => self.model.window_moved(window, position.x, position.y),
            _ => Ok(()),
        };
        if let Err(e) = result {
            log::debug!("WinitBackend: untracked window {}: {}", window, e);
        }
    }

    /// Raw device motion belongs to whichever window has focus.
    fn focused_window(&self) -> Option<Handle> {
        self.model
            .windows()
            .into_iter()
            .find(|w| self.model.window(*w).is_some_and(|r| r.focused))
    }
}

/// Translate a winit window event into native events for `window`.
/// `modifiers` is the latest modifier state reported by winit.
pub(crate) fn translate_window_event(
    window: Handle,
    event: &WindowEvent,
    modifiers: ModifierFlags,
) -> Vec<NativeEvent> {
    let mods = u64::from(modifiers.bits());
    let lifecycle = |event| vec![NativeEvent::Lifecycle { window, event }];
    match event {
        WindowEvent::CloseRequested => lifecycle(LifecycleEvent::WindowWillClose),
        WindowEvent::Destroyed => lifecycle(LifecycleEvent::Destroyed),
        WindowEvent::Resized(_) => lifecycle(LifecycleEvent::WindowResized),
        WindowEvent::Moved(_) => lifecycle(LifecycleEvent::WindowMoved),
        WindowEvent::Occluded(true) => lifecycle(LifecycleEvent::Minimized),
        WindowEvent::Occluded(false) => lifecycle(LifecycleEvent::Restored),
        WindowEvent::Focused(focused) => vec![NativeEvent::Focus { window, focused: *focused }],
        WindowEvent::CursorEntered { .. } => vec![NativeEvent::CursorEntered { window, entered: true }],
        WindowEvent::CursorLeft { .. } => vec![NativeEvent::CursorEntered { window, entered: false }],
        WindowEvent::CursorMoved { position, .. } => {
            vec![NativeEvent::MouseMove { window, x: position.x, y: position.y }]
        }
        WindowEvent::MouseInput { state, button, .. } => vec![NativeEvent::MouseButton {
            window,
            button: from_winit_button(*button).index(),
            pressed: *state == ElementState::Pressed,
            modifiers: mods,
        }],
        WindowEvent::MouseWheel { delta, .. } => {
            let (delta_x, delta_y) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (f64::from(*x), f64::from(*y)),
                MouseScrollDelta::PixelDelta(p) => (p.x, p.y),
            };
            vec![NativeEvent::MouseWheel { window, delta_x, delta_y, modifiers: mods }]
        }
        WindowEvent::KeyboardInput { event, .. } => {
            let pressed = event.state == ElementState::Pressed;
            let mut out = vec![NativeEvent::Key {
                window,
                key: from_winit_key(event.physical_key).to_raw(),
                pressed,
                modifiers: mods,
            }];
            if let (true, Some(text)) = (pressed, event.text.as_ref()) {
                out.push(NativeEvent::TextInput { window, text: text.to_string() });
            }
            out
        }
        WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
            vec![NativeEvent::ScaleFactor { window, scale: *scale_factor as f32 }]
        }
        _ => Vec::new(),
    }
}

macro_rules! delegate {
    ($($name:ident($($arg:ident: $ty:ty),*) -> $ret:ty;)*) => {
        $(
            fn $name(&self, $($arg: $ty),*) -> $ret {
                self.model.$name($($arg),*)
            }
        )*
    };
}

impl PlatformOps for WinitBackend {
    fn name(&self) -> &'static str {
        "winit"
    }

    fn init(&self, forwarder: Arc<EventForwarder>) -> NgResult<()> {
        self.model.init(forwarder)
    }

    fn cleanup(&self) {
        let mut native = self.native.lock();
        native.ids.clear();
        native.windows.clear();
        drop(native);
        self.model.cleanup();
    }

    fn run(&self) -> NgResult<()> {
        #[cfg(test)]
        {
            log::debug!("WinitBackend::run: no-op in test mode");
            return self.model.poll_events();
        }

        #[cfg(not(test))]
        {
            run_event_loop(self)
        }
    }

    fn poll_events(&self) -> NgResult<()> {
        self.model.poll_events()
    }

    // =========================================================================
    // Windows, mirrored onto native windows
    // =========================================================================

    fn destroy_window(&self, window: Handle) -> NgResult<()> {
        self.model.destroy_window(window)?;
        let mut native = self.native.lock();
        if let Some(w) = native.windows.remove(&window) {
            native.ids.remove(&w.id());
        }
        Ok(())
    }

    fn window_set_title(&self, window: Handle, title: &str) -> NgResult<()> {
        self.model.window_set_title(window, title)?;
        if let Some(w) = self.native_window(window) {
            w.set_title(title);
        }
        Ok(())
    }

    fn window_set_size(&self, window: Handle, width: i32, height: i32) -> NgResult<()> {
        self.model.window_set_size(window, width, height)?;
        if let Some(w) = self.native_window(window) {
            let _ = w.request_inner_size(winit::dpi::PhysicalSize::new(width as u32, height as u32));
        }
        Ok(())
    }

    fn window_request_close(&self, window: Handle) -> NgResult<()> {
        self.model.window_request_close(window)
    }

    fn window_is_focused(&self, window: Handle) -> NgResult<bool> {
        let modelled = self.model.window_is_focused(window)?;
        Ok(self.native_window(window).map_or(modelled, |w| w.has_focus()))
    }

    fn window_set_cursor_visible(&self, window: Handle, visible: bool) -> NgResult<()> {
        self.model.window_set_cursor_visible(window, visible)?;
        if let Some(w) = self.native_window(window) {
            w.set_cursor_visible(visible);
        }
        Ok(())
    }

    fn window_set_cursor_grab(&self, window: Handle, mode: GrabMode) -> NgResult<()> {
        if let Some(w) = self.native_window(window) {
            Self::apply_grab(&w, mode)?;
        }
        self.model.window_set_cursor_grab(window, mode)
    }

    fn window_show(&self, window: Handle) -> NgResult<()> {
        self.model.window_show(window)?;
        if let Some(w) = self.native_window(window) {
            w.set_visible(true);
            w.focus_window();
        }
        Ok(())
    }

    fn window_hide(&self, window: Handle) -> NgResult<()> {
        self.model.window_hide(window)?;
        if let Some(w) = self.native_window(window) {
            w.set_visible(false);
        }
        Ok(())
    }

    fn window_is_visible(&self, window: Handle) -> NgResult<bool> {
        let modelled = self.model.window_is_visible(window)?;
        Ok(self
            .native_window(window)
            .and_then(|w| w.is_visible())
            .unwrap_or(modelled))
    }

    fn window_set_position(&self, window: Handle, x: i32, y: i32) -> NgResult<()> {
        self.model.window_set_position(window, x, y)?;
        if let Some(w) = self.native_window(window) {
            w.set_outer_position(winit::dpi::PhysicalPosition::new(x, y));
        }
        Ok(())
    }

    fn get_scale_factor(&self, window: Handle) -> NgResult<f32> {
        let modelled = self.model.get_scale_factor(window)?;
        Ok(self
            .native_window(window)
            .map_or(modelled, |w| w.scale_factor() as f32))
    }

    delegate! {
        create_window(title: &str, width: i32, height: i32) -> NgResult<Handle>;
        create_window_with_type(title: &str, width: i32, height: i32, window_type: i32) -> NgResult<Handle>;
        window_get_size(window: Handle) -> NgResult<(i32, i32)>;
        window_get_content_view(window: Handle) -> NgResult<Handle>;
        window_get_position(window: Handle) -> NgResult<(i32, i32)>;
        window_set_scale_factor_callback(window: Handle) -> NgResult<()>;
        window_set_lifecycle_callback(window: Handle) -> NgResult<()>;

        create_menu() -> NgResult<MenuHandle>;
        destroy_menu(menu: MenuHandle) -> NgResult<()>;
        attach_menu(window: Handle, menu: MenuHandle) -> NgResult<()>;
        add_menu_item(menu: MenuHandle, title: &str, id: u32) -> NgResult<()>;
        add_menu_separator(menu: MenuHandle) -> NgResult<()>;
        create_submenu(parent: MenuHandle, title: &str) -> NgResult<MenuHandle>;

        create_button(title: &str, id: u32) -> NgResult<Handle>;
        button_invalidate(button: Handle) -> NgResult<()>;
        create_label(text: &str) -> NgResult<Handle>;
        label_invalidate(label: Handle) -> NgResult<()>;
        create_box(orientation: Orientation) -> NgResult<Handle>;
        box_invalidate(container: Handle) -> NgResult<()>;
        box_add(container: Handle, element: Handle, weight: f32) -> NgResult<()>;
        set_window_content(window: Handle, content: Handle) -> NgResult<()>;
        create_split_view(orientation: Orientation) -> NgResult<Handle>;
        split_view_add(split: Handle, element: Handle) -> NgResult<()>;
        split_view_set_divider_position(split: Handle, index: i32, position: f32) -> NgResult<()>;

        create_text_editor(id: u32) -> NgResult<Handle>;
        text_editor_invalidate(editor: Handle) -> NgResult<()>;
        create_text_view(editable: bool, id: u32) -> NgResult<Handle>;
        text_view_invalidate(view: Handle) -> NgResult<()>;
        create_text_field() -> NgResult<Handle>;
        set_text_content(widget: Handle, content: &str) -> NgResult<()>;
        get_text_content(widget: Handle) -> NgResult<String>;

        create_canvas(width: i32, height: i32) -> NgResult<Handle>;
        canvas_invalidate(canvas: Handle) -> NgResult<()>;
        canvas_invalidate_rect(canvas: Handle, x: f32, y: f32, width: f32, height: f32) -> NgResult<()>;
        canvas_update_buffer(canvas: Handle, buffer: CanvasBuffer) -> NgResult<()>;
        canvas_get_size(canvas: Handle) -> NgResult<(u32, u32)>;
        canvas_get_window(canvas: Handle) -> NgResult<Handle>;
        canvas_get_native_handle(canvas: Handle) -> NgResult<Handle>;
    }
}

// =============================================================================
// Event Loop
// =============================================================================

/// Run the winit event loop until every window is gone (production only).
#[cfg(not(test))]
fn run_event_loop(backend: &WinitBackend) -> NgResult<()> {
    use winit::application::ApplicationHandler;
    use winit::event::{DeviceEvent, DeviceId};
    use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};

    use crate::input::from_winit_modifiers;

    struct App<'a> {
        backend: &'a WinitBackend,
        modifiers: ModifierFlags,
        realized_any: bool,
    }

    impl App<'_> {
        fn realize(&mut self, event_loop: &ActiveEventLoop) {
            self.backend.realize_windows(event_loop);
            self.realized_any |= !self.backend.native.lock().windows.is_empty();
        }
    }

    impl ApplicationHandler for App<'_> {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            self.realize(event_loop);
        }

        fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
            let Some(window) = self.backend.handle_for(window_id) else {
                return;
            };
            if let WindowEvent::ModifiersChanged(modifiers) = &event {
                self.modifiers = from_winit_modifiers(modifiers.state());
                return;
            }
            self.backend.track(window, &event);
            // Native lock is released; handlers may call back into the backend.
            for native in translate_window_event(window, &event, self.modifiers) {
                self.backend.model.deliver(native);
            }
        }

        fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
            if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
                if let Some(window) = self.backend.focused_window() {
                    self.backend.model.deliver(NativeEvent::RawMouseMotion {
                        window,
                        delta_x: dx,
                        delta_y: dy,
                    });
                }
            }
        }

        fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
            if let Err(e) = self.backend.model.poll_events() {
                log::error!("WinitBackend: poll_events failed: {}", e);
            }
            self.realize(event_loop);
            if self.realized_any && self.backend.model.windows().is_empty() {
                log::debug!("WinitBackend: last window destroyed, leaving event loop");
                event_loop.exit();
            }
        }
    }

    let event_loop = EventLoop::new().map_err(|e| NgError::PlatformSpecific(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App {
        backend,
        modifiers: ModifierFlags::empty(),
        realized_any: false,
    };
    event_loop
        .run_app(&mut app)
        .map_err(|e| NgError::PlatformSpecific(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventQueue, WindowEvent as CanonicalEvent};
    use crate::input::NativeFamily;
    use crate::registry::RegistryMode;

    fn h(raw: usize) -> Handle {
        Handle::from_raw(raw).unwrap()
    }

    #[test]
    fn test_translate_lifecycle_and_focus() {
        let w = h(3);
        let none = ModifierFlags::empty();
        assert_eq!(
            translate_window_event(w, &WindowEvent::CloseRequested, none),
            vec![NativeEvent::Lifecycle { window: w, event: LifecycleEvent::WindowWillClose }]
        );
        assert_eq!(
            translate_window_event(w, &WindowEvent::Occluded(true), none),
            vec![NativeEvent::Lifecycle { window: w, event: LifecycleEvent::Minimized }]
        );
        assert_eq!(
            translate_window_event(
                w,
                &WindowEvent::Moved(winit::dpi::PhysicalPosition::new(4, 5)),
                none
            ),
            vec![NativeEvent::Lifecycle { window: w, event: LifecycleEvent::WindowMoved }]
        );
        assert_eq!(
            translate_window_event(w, &WindowEvent::Focused(false), none),
            vec![NativeEvent::Focus { window: w, focused: false }]
        );
        assert!(translate_window_event(w, &WindowEvent::RedrawRequested, none).is_empty());
    }

    #[test]
    fn test_model_without_event_loop() {
        let queue = Arc::new(EventQueue::new());
        let forwarder = Arc::new(EventForwarder::new(
            queue.clone(),
            RegistryMode::default(),
            NativeFamily::Canonical,
        ));
        let backend = WinitBackend {
            model: HeadlessBackend::new(&Config::headless()),
            native: Mutex::new(NativeWindows::default()),
        };
        backend.init(forwarder).unwrap();

        let w = backend.create_window("Main", 320, 240).unwrap();
        backend.window_set_title(w, "Renamed").unwrap();
        backend.window_set_cursor_grab(w, GrabMode::Locked).unwrap();
        backend.track(w, &WindowEvent::Resized(winit::dpi::PhysicalSize::new(640, 480)));

        assert_eq!(backend.window_get_size(w), Ok((640, 480)));
        assert_eq!(backend.model().window(w).unwrap().grab, GrabMode::Locked);
        assert_eq!(backend.get_scale_factor(w), Ok(1.0));

        backend.model().inject(NativeEvent::Focus { window: w, focused: true });
        backend.run().unwrap();
        assert_eq!(backend.focused_window(), Some(w));
        assert_eq!(
            queue.drain(),
            vec![Event::Window { window: w, event: CanonicalEvent::FocusChanged(true) }]
        );
    }
}
