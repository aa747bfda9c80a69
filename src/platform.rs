//! Dispatch facade.
//!
//! A [`Platform`] is one UI context: the injected backend, the event
//! forwarder with its per-window registries, and the queue the host drains.
//! Cloning is cheap and every method takes `&self`, so callers never hold a
//! lock across a backend call and backends may re-enter the facade from
//! event handlers.

use std::fmt;
use std::sync::Arc;

use crate::backend::HeadlessBackend;
use crate::config::Config;
use crate::error::NgResult;
use crate::events::{Event, EventQueue, EventSink};
use crate::forward::{EventForwarder, ScaleCallback};
use crate::handle::{Handle, MenuHandle};
use crate::input::GrabMode;
use crate::layout::Orientation;
use crate::ops::{CanvasBuffer, OpsRegistry, PlatformOps};
use crate::registry::Registration;

#[derive(Clone)]
pub struct Platform {
    config: Config,
    ops: Arc<dyn PlatformOps>,
    forwarder: Arc<EventForwarder>,
    queue: Arc<EventQueue>,
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("backend", &self.ops.name())
            .field("config", &self.config)
            .field("pending_events", &self.queue.len())
            .finish()
    }
}

/// Generates pass-through methods for operations without facade-side state.
macro_rules! forward_ops {
    ($($(#[$meta:meta])* $name:ident($($arg:ident: $ty:ty),*) -> $ret:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self, $($arg: $ty),*) -> $ret {
                self.ops.$name($($arg),*)
            }
        )*
    };
}

impl Platform {
    /// A context whose canonical events collect in its own queue.
    pub fn new(config: Config, ops: Arc<dyn PlatformOps>) -> Self {
        let queue = Arc::new(EventQueue::new());
        Self::build(config, ops, queue.clone(), queue)
    }

    /// A context delivering canonical events to `sink` instead of the queue.
    pub fn with_sink(config: Config, ops: Arc<dyn PlatformOps>, sink: Arc<dyn EventSink>) -> Self {
        Self::build(config, ops, sink, Arc::new(EventQueue::new()))
    }

    /// A context over whatever backend `registry` holds, selecting one from
    /// `config` if none was registered.
    pub fn from_registry(registry: &OpsRegistry, config: Config) -> Self {
        let ops = registry.ensure(&config);
        Self::new(config, ops)
    }

    pub fn headless() -> Self {
        let config = Config::headless();
        let ops = Arc::new(HeadlessBackend::new(&config));
        Self::new(config, ops)
    }

    fn build(config: Config, ops: Arc<dyn PlatformOps>, sink: Arc<dyn EventSink>, queue: Arc<EventQueue>) -> Self {
        let forwarder = Arc::new(EventForwarder::new(sink, config.registry, ops.input_family()));
        log::debug!("Platform: using `{}` backend", ops.name());
        Self { config, ops, forwarder, queue }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ops(&self) -> &Arc<dyn PlatformOps> {
        &self.ops
    }

    pub fn forwarder(&self) -> &Arc<EventForwarder> {
        &self.forwarder
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn init(&self) -> NgResult<()> {
        self.ops.init(self.forwarder.clone())
    }

    pub fn cleanup(&self) {
        self.ops.cleanup();
        self.forwarder.with_state(|state| {
            state.scale.clear();
            state.lifecycle.clear();
            state.cursor.clear();
        });
        self.queue.clear();
    }

    pub fn run(&self) -> NgResult<()> {
        self.ops.run()
    }

    pub fn poll_events(&self) -> NgResult<()> {
        self.ops.poll_events()
    }

    /// Next queued canonical event. Always `None` for contexts built with
    /// [`Platform::with_sink`].
    pub fn poll_event(&self) -> Option<Event> {
        self.queue.poll()
    }

    pub fn drain_events(&self) -> Vec<Event> {
        self.queue.drain()
    }

    // =========================================================================
    // Operations with per-window state
    // =========================================================================

    /// Destroy `window` and drop everything registered for it.
    pub fn destroy_window(&self, window: Handle) -> NgResult<()> {
        self.ops.destroy_window(window)?;
        self.forwarder.forget(window);
        Ok(())
    }

    /// Grab or release the cursor. State is tracked only once the backend
    /// accepted the mode.
    pub fn window_set_cursor_grab(&self, window: Handle, mode: GrabMode) -> NgResult<()> {
        self.ops.window_set_cursor_grab(window, mode)?;
        if !self.forwarder.set_cursor_grab(window, mode) {
            log::debug!("Platform: cursor state for {} not tracked, motion stays absolute", window);
        }
        Ok(())
    }

    /// Deliver scale-factor changes for `window`, also calling `callback`.
    pub fn window_set_scale_factor_callback(
        &self,
        window: Handle,
        callback: Option<ScaleCallback>,
    ) -> NgResult<()> {
        self.ops.window_set_scale_factor_callback(window)?;
        let current = self.ops.get_scale_factor(window).unwrap_or(1.0);
        if self.forwarder.register_scale(window, callback, current) == Registration::Dropped {
            log::debug!("Platform: {} will not receive scale changes", window);
        }
        Ok(())
    }

    /// Deliver lifecycle notifications for `window`.
    pub fn window_set_lifecycle_callback(&self, window: Handle) -> NgResult<()> {
        self.ops.window_set_lifecycle_callback(window)?;
        if self.forwarder.register_lifecycle(window) == Registration::Dropped {
            log::debug!("Platform: {} will not receive lifecycle events", window);
        }
        Ok(())
    }

    // =========================================================================
    // Pass-through operations
    // =========================================================================

    forward_ops! {
        create_window(title: &str, width: i32, height: i32) -> NgResult<Handle>;
        create_window_with_type(title: &str, width: i32, height: i32, window_type: i32) -> NgResult<Handle>;
        window_set_title(window: Handle, title: &str) -> NgResult<()>;
        window_set_size(window: Handle, width: i32, height: i32) -> NgResult<()>;
        window_get_size(window: Handle) -> NgResult<(i32, i32)>;
        window_request_close(window: Handle) -> NgResult<()>;
        window_is_focused(window: Handle) -> NgResult<bool>;
        window_set_cursor_visible(window: Handle, visible: bool) -> NgResult<()>;
        window_get_content_view(window: Handle) -> NgResult<Handle>;
        window_show(window: Handle) -> NgResult<()>;
        window_hide(window: Handle) -> NgResult<()>;
        window_is_visible(window: Handle) -> NgResult<bool>;
        window_set_position(window: Handle, x: i32, y: i32) -> NgResult<()>;
        window_get_position(window: Handle) -> NgResult<(i32, i32)>;
        get_scale_factor(window: Handle) -> NgResult<f32>;

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
        /// The caller keeps the pixels alive until the next update.
        canvas_update_buffer(canvas: Handle, buffer: CanvasBuffer) -> NgResult<()>;
        canvas_get_size(canvas: Handle) -> NgResult<(u32, u32)>;
        canvas_get_window(canvas: Handle) -> NgResult<Handle>;
        canvas_get_native_handle(canvas: Handle) -> NgResult<Handle>;

        create_image_view() -> NgResult<Handle>;
        image_view_load_from_path(view: Handle, path: &str) -> NgResult<()>;
        image_view_load_from_data(view: Handle, data: &[u8]) -> NgResult<()>;
        image_view_set_scaling(view: Handle, mode: i32) -> NgResult<()>;
        image_view_invalidate(view: Handle) -> NgResult<()>;

        create_slider(min: f64, max: f64) -> NgResult<Handle>;
        slider_set_value(slider: Handle, value: f64) -> NgResult<()>;
        slider_get_value(slider: Handle) -> NgResult<f64>;
        slider_set_enabled(slider: Handle, enabled: bool) -> NgResult<()>;
        slider_invalidate(slider: Handle) -> NgResult<()>;
        create_checkbox(label: &str) -> NgResult<Handle>;
        checkbox_set_checked(checkbox: Handle, checked: bool) -> NgResult<()>;
        checkbox_get_checked(checkbox: Handle) -> NgResult<bool>;
        checkbox_set_enabled(checkbox: Handle, enabled: bool) -> NgResult<()>;
        checkbox_invalidate(checkbox: Handle) -> NgResult<()>;
        create_progress_bar() -> NgResult<Handle>;
        progress_bar_set_value(bar: Handle, value: f64) -> NgResult<()>;
        progress_bar_set_indeterminate(bar: Handle, indeterminate: bool) -> NgResult<()>;
        progress_bar_set_enabled(bar: Handle, enabled: bool) -> NgResult<()>;
        progress_bar_invalidate(bar: Handle) -> NgResult<()>;

        create_combo_box() -> NgResult<Handle>;
        combo_box_add_item(combo: Handle, item: &str) -> NgResult<()>;
        combo_box_set_selected(combo: Handle, index: i32) -> NgResult<()>;
        combo_box_get_selected(combo: Handle) -> NgResult<i32>;
        combo_box_clear(combo: Handle) -> NgResult<()>;
        combo_box_set_enabled(combo: Handle, enabled: bool) -> NgResult<()>;
        combo_box_invalidate(combo: Handle) -> NgResult<()>;
        create_tab_bar(id: u32) -> NgResult<Handle>;
        tab_bar_add_tab(tabs: Handle, title: &str) -> NgResult<()>;
        tab_bar_remove_tab(tabs: Handle, index: i32) -> NgResult<()>;
        tab_bar_set_selected(tabs: Handle, index: i32) -> NgResult<()>;
        tab_bar_get_selected(tabs: Handle) -> NgResult<i32>;
        tab_bar_invalidate(tabs: Handle) -> NgResult<()>;
        create_sidebar_list(id: u32) -> NgResult<Handle>;
        sidebar_list_add_section(list: Handle, title: &str) -> NgResult<()>;
        sidebar_list_add_item(list: Handle, title: &str, indent: i32) -> NgResult<()>;
        sidebar_list_set_selected(list: Handle, index: i32) -> NgResult<()>;
        sidebar_list_get_selected(list: Handle) -> NgResult<i32>;
        sidebar_list_clear(list: Handle) -> NgResult<()>;
        sidebar_list_invalidate(list: Handle) -> NgResult<()>;
    }
}
