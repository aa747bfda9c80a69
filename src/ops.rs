//! The backend operation set and the process-wide ops registry.
//!
//! A backend implements [`PlatformOps`] for whatever subset of operations its
//! toolkit supports. Everything it leaves out reports
//! [`NgError::Unsupported`] through the default bodies, so a partial port
//! degrades instead of failing to link.

use std::ffi::c_void;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::{BackendKind, Config};
use crate::error::{NgError, NgResult};
use crate::forward::EventForwarder;
use crate::handle::{Handle, MenuHandle};
use crate::input::{GrabMode, NativeFamily};
use crate::layout::Orientation;

/// Non-owning reference to caller pixel memory handed to a canvas.
///
/// The caller keeps the memory alive until the next update or until the
/// canvas is destroyed. This crate never reads through `ptr`; it only hands
/// it back to native code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasBuffer {
    pub ptr: *const u8,
    pub len: usize,
    pub width: u32,
    pub height: u32,
}

// SAFETY: the pointer is an opaque token that is never dereferenced here.
unsafe impl Send for CanvasBuffer {}
unsafe impl Sync for CanvasBuffer {}

impl CanvasBuffer {
    pub fn from_slice(pixels: &[u8], width: u32, height: u32) -> Self {
        Self { ptr: pixels.as_ptr(), len: pixels.len(), width, height }
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.ptr.cast()
    }

    /// Bytes needed for `width * height` RGBA pixels, or `None` when that
    /// does not fit in `usize`.
    pub fn required_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
    }

    /// Non-null and at least `required_len` bytes long.
    pub fn is_complete(&self) -> bool {
        !self.ptr.is_null() && self.required_len().is_some_and(|required| self.len >= required)
    }
}

/// One method per native operation.
///
/// Handles arriving here are never null; the facade rejects null before the
/// call. Methods take `&self` so a backend can be shared behind an `Arc` and
/// re-entered from event handlers; backends keep their mutable state behind
/// their own locks.
#[allow(unused_variables)]
pub trait PlatformOps: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Vocabulary the backend's native events are reported in.
    fn input_family(&self) -> NativeFamily {
        NativeFamily::Canonical
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn init(&self, forwarder: Arc<EventForwarder>) -> NgResult<()> {
        Ok(())
    }
    fn cleanup(&self) {}
    fn run(&self) -> NgResult<()> {
        Ok(())
    }
    fn poll_events(&self) -> NgResult<()> {
        Ok(())
    }

    // =========================================================================
    // Windows
    // =========================================================================

    fn create_window(&self, title: &str, width: i32, height: i32) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_window"))
    }
    fn create_window_with_type(&self, title: &str, width: i32, height: i32, window_type: i32) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_window_with_type"))
    }
    fn destroy_window(&self, window: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("destroy_window"))
    }
    fn window_set_title(&self, window: Handle, title: &str) -> NgResult<()> {
        Err(NgError::Unsupported("window_set_title"))
    }
    fn window_set_size(&self, window: Handle, width: i32, height: i32) -> NgResult<()> {
        Err(NgError::Unsupported("window_set_size"))
    }
    fn window_get_size(&self, window: Handle) -> NgResult<(i32, i32)> {
        Err(NgError::Unsupported("window_get_size"))
    }
    fn window_request_close(&self, window: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("window_request_close"))
    }
    fn window_is_focused(&self, window: Handle) -> NgResult<bool> {
        Err(NgError::Unsupported("window_is_focused"))
    }
    fn window_set_cursor_visible(&self, window: Handle, visible: bool) -> NgResult<()> {
        Err(NgError::Unsupported("window_set_cursor_visible"))
    }
    fn window_set_cursor_grab(&self, window: Handle, mode: GrabMode) -> NgResult<()> {
        Err(NgError::Unsupported("window_set_cursor_grab"))
    }
    fn window_get_content_view(&self, window: Handle) -> NgResult<Handle> {
        Err(NgError::Unsupported("window_get_content_view"))
    }
    fn window_show(&self, window: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("window_show"))
    }
    fn window_hide(&self, window: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("window_hide"))
    }
    fn window_is_visible(&self, window: Handle) -> NgResult<bool> {
        Err(NgError::Unsupported("window_is_visible"))
    }
    fn window_set_position(&self, window: Handle, x: i32, y: i32) -> NgResult<()> {
        Err(NgError::Unsupported("window_set_position"))
    }
    fn window_get_position(&self, window: Handle) -> NgResult<(i32, i32)> {
        Err(NgError::Unsupported("window_get_position"))
    }
    fn get_scale_factor(&self, window: Handle) -> NgResult<f32> {
        Err(NgError::Unsupported("get_scale_factor"))
    }
    /// Start observing native scale changes for `window`.
    fn window_set_scale_factor_callback(&self, window: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("window_set_scale_factor_callback"))
    }
    /// Start observing native lifecycle notifications for `window`.
    fn window_set_lifecycle_callback(&self, window: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("window_set_lifecycle_callback"))
    }

    // =========================================================================
    // Menus
    // =========================================================================

    fn create_menu(&self) -> NgResult<MenuHandle> {
        Err(NgError::Unsupported("create_menu"))
    }
    fn destroy_menu(&self, menu: MenuHandle) -> NgResult<()> {
        Err(NgError::Unsupported("destroy_menu"))
    }
    fn attach_menu(&self, window: Handle, menu: MenuHandle) -> NgResult<()> {
        Err(NgError::Unsupported("attach_menu"))
    }
    fn add_menu_item(&self, menu: MenuHandle, title: &str, id: u32) -> NgResult<()> {
        Err(NgError::Unsupported("add_menu_item"))
    }
    fn add_menu_separator(&self, menu: MenuHandle) -> NgResult<()> {
        Err(NgError::Unsupported("add_menu_separator"))
    }
    fn create_submenu(&self, parent: MenuHandle, title: &str) -> NgResult<MenuHandle> {
        Err(NgError::Unsupported("create_submenu"))
    }

    // =========================================================================
    // Containers and basic widgets
    // =========================================================================

    fn create_button(&self, title: &str, id: u32) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_button"))
    }
    fn button_invalidate(&self, button: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("button_invalidate"))
    }
    fn create_label(&self, text: &str) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_label"))
    }
    fn label_invalidate(&self, label: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("label_invalidate"))
    }
    fn create_box(&self, orientation: Orientation) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_box"))
    }
    fn box_invalidate(&self, container: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("box_invalidate"))
    }
    fn box_add(&self, container: Handle, element: Handle, weight: f32) -> NgResult<()> {
        Err(NgError::Unsupported("box_add"))
    }
    fn set_window_content(&self, window: Handle, content: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("set_window_content"))
    }
    fn create_split_view(&self, orientation: Orientation) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_split_view"))
    }
    fn split_view_add(&self, split: Handle, element: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("split_view_add"))
    }
    fn split_view_set_divider_position(&self, split: Handle, index: i32, position: f32) -> NgResult<()> {
        Err(NgError::Unsupported("split_view_set_divider_position"))
    }

    // =========================================================================
    // Text
    // =========================================================================

    fn create_text_editor(&self, id: u32) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_text_editor"))
    }
    fn text_editor_invalidate(&self, editor: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("text_editor_invalidate"))
    }
    fn create_text_view(&self, editable: bool, id: u32) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_text_view"))
    }
    fn text_view_invalidate(&self, view: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("text_view_invalidate"))
    }
    fn create_text_field(&self) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_text_field"))
    }
    fn set_text_content(&self, widget: Handle, content: &str) -> NgResult<()> {
        Err(NgError::Unsupported("set_text_content"))
    }
    fn get_text_content(&self, widget: Handle) -> NgResult<String> {
        Err(NgError::Unsupported("get_text_content"))
    }

    // =========================================================================
    // Canvas
    // =========================================================================

    fn create_canvas(&self, width: i32, height: i32) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_canvas"))
    }
    fn canvas_invalidate(&self, canvas: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("canvas_invalidate"))
    }
    fn canvas_invalidate_rect(&self, canvas: Handle, x: f32, y: f32, width: f32, height: f32) -> NgResult<()> {
        Err(NgError::Unsupported("canvas_invalidate_rect"))
    }
    fn canvas_update_buffer(&self, canvas: Handle, buffer: CanvasBuffer) -> NgResult<()> {
        Err(NgError::Unsupported("canvas_update_buffer"))
    }
    fn canvas_get_size(&self, canvas: Handle) -> NgResult<(u32, u32)> {
        Err(NgError::Unsupported("canvas_get_size"))
    }
    fn canvas_get_window(&self, canvas: Handle) -> NgResult<Handle> {
        Err(NgError::Unsupported("canvas_get_window"))
    }
    fn canvas_get_native_handle(&self, canvas: Handle) -> NgResult<Handle> {
        Err(NgError::Unsupported("canvas_get_native_handle"))
    }

    // =========================================================================
    // Image view
    // =========================================================================

    fn create_image_view(&self) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_image_view"))
    }
    fn image_view_load_from_path(&self, view: Handle, path: &str) -> NgResult<()> {
        Err(NgError::Unsupported("image_view_load_from_path"))
    }
    fn image_view_load_from_data(&self, view: Handle, data: &[u8]) -> NgResult<()> {
        Err(NgError::Unsupported("image_view_load_from_data"))
    }
    fn image_view_set_scaling(&self, view: Handle, mode: i32) -> NgResult<()> {
        Err(NgError::Unsupported("image_view_set_scaling"))
    }
    fn image_view_invalidate(&self, view: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("image_view_invalidate"))
    }

    // =========================================================================
    // Slider, checkbox, progress bar
    // =========================================================================

    fn create_slider(&self, min: f64, max: f64) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_slider"))
    }
    fn slider_set_value(&self, slider: Handle, value: f64) -> NgResult<()> {
        Err(NgError::Unsupported("slider_set_value"))
    }
    fn slider_get_value(&self, slider: Handle) -> NgResult<f64> {
        Err(NgError::Unsupported("slider_get_value"))
    }
    fn slider_set_enabled(&self, slider: Handle, enabled: bool) -> NgResult<()> {
        Err(NgError::Unsupported("slider_set_enabled"))
    }
    fn slider_invalidate(&self, slider: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("slider_invalidate"))
    }
    fn create_checkbox(&self, label: &str) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_checkbox"))
    }
    fn checkbox_set_checked(&self, checkbox: Handle, checked: bool) -> NgResult<()> {
        Err(NgError::Unsupported("checkbox_set_checked"))
    }
    fn checkbox_get_checked(&self, checkbox: Handle) -> NgResult<bool> {
        Err(NgError::Unsupported("checkbox_get_checked"))
    }
    fn checkbox_set_enabled(&self, checkbox: Handle, enabled: bool) -> NgResult<()> {
        Err(NgError::Unsupported("checkbox_set_enabled"))
    }
    fn checkbox_invalidate(&self, checkbox: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("checkbox_invalidate"))
    }
    fn create_progress_bar(&self) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_progress_bar"))
    }
    fn progress_bar_set_value(&self, bar: Handle, value: f64) -> NgResult<()> {
        Err(NgError::Unsupported("progress_bar_set_value"))
    }
    fn progress_bar_set_indeterminate(&self, bar: Handle, indeterminate: bool) -> NgResult<()> {
        Err(NgError::Unsupported("progress_bar_set_indeterminate"))
    }
    fn progress_bar_set_enabled(&self, bar: Handle, enabled: bool) -> NgResult<()> {
        Err(NgError::Unsupported("progress_bar_set_enabled"))
    }
    fn progress_bar_invalidate(&self, bar: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("progress_bar_invalidate"))
    }

    // =========================================================================
    // Combo box, tab bar, sidebar list
    // =========================================================================

    fn create_combo_box(&self) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_combo_box"))
    }
    fn combo_box_add_item(&self, combo: Handle, item: &str) -> NgResult<()> {
        Err(NgError::Unsupported("combo_box_add_item"))
    }
    fn combo_box_set_selected(&self, combo: Handle, index: i32) -> NgResult<()> {
        Err(NgError::Unsupported("combo_box_set_selected"))
    }
    fn combo_box_get_selected(&self, combo: Handle) -> NgResult<i32> {
        Err(NgError::Unsupported("combo_box_get_selected"))
    }
    fn combo_box_clear(&self, combo: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("combo_box_clear"))
    }
    fn combo_box_set_enabled(&self, combo: Handle, enabled: bool) -> NgResult<()> {
        Err(NgError::Unsupported("combo_box_set_enabled"))
    }
    fn combo_box_invalidate(&self, combo: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("combo_box_invalidate"))
    }
    fn create_tab_bar(&self, id: u32) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_tab_bar"))
    }
    fn tab_bar_add_tab(&self, tabs: Handle, title: &str) -> NgResult<()> {
        Err(NgError::Unsupported("tab_bar_add_tab"))
    }
    fn tab_bar_remove_tab(&self, tabs: Handle, index: i32) -> NgResult<()> {
        Err(NgError::Unsupported("tab_bar_remove_tab"))
    }
    fn tab_bar_set_selected(&self, tabs: Handle, index: i32) -> NgResult<()> {
        Err(NgError::Unsupported("tab_bar_set_selected"))
    }
    fn tab_bar_get_selected(&self, tabs: Handle) -> NgResult<i32> {
        Err(NgError::Unsupported("tab_bar_get_selected"))
    }
    fn tab_bar_invalidate(&self, tabs: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("tab_bar_invalidate"))
    }
    fn create_sidebar_list(&self, id: u32) -> NgResult<Handle> {
        Err(NgError::Unsupported("create_sidebar_list"))
    }
    fn sidebar_list_add_section(&self, list: Handle, title: &str) -> NgResult<()> {
        Err(NgError::Unsupported("sidebar_list_add_section"))
    }
    fn sidebar_list_add_item(&self, list: Handle, title: &str, indent: i32) -> NgResult<()> {
        Err(NgError::Unsupported("sidebar_list_add_item"))
    }
    fn sidebar_list_set_selected(&self, list: Handle, index: i32) -> NgResult<()> {
        Err(NgError::Unsupported("sidebar_list_set_selected"))
    }
    fn sidebar_list_get_selected(&self, list: Handle) -> NgResult<i32> {
        Err(NgError::Unsupported("sidebar_list_get_selected"))
    }
    fn sidebar_list_clear(&self, list: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("sidebar_list_clear"))
    }
    fn sidebar_list_invalidate(&self, list: Handle) -> NgResult<()> {
        Err(NgError::Unsupported("sidebar_list_invalidate"))
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Holds the one active backend. Selection happens at most once.
#[derive(Default)]
pub struct OpsRegistry {
    active: OnceCell<Arc<dyn PlatformOps>>,
}

impl OpsRegistry {
    pub const fn new() -> Self {
        Self { active: OnceCell::new() }
    }

    /// Install `ops` as the active backend. Returns false if one was already
    /// selected; the earlier selection stays.
    pub fn register(&self, ops: Arc<dyn PlatformOps>) -> bool {
        let name = ops.name();
        match self.active.set(ops) {
            Ok(()) => {
                log::debug!("OpsRegistry: registered backend `{}`", name);
                true
            }
            Err(_) => {
                log::warn!(
                    "OpsRegistry: backend `{}` ignored, `{}` already active",
                    name,
                    self.get().map_or("?", |ops| ops.name())
                );
                false
            }
        }
    }

    /// The registered backend, or the built-in one `config` names.
    pub fn ensure(&self, config: &Config) -> Arc<dyn PlatformOps> {
        self.active
            .get_or_init(|| {
                let kind = if config.backend.is_builtin() {
                    config.backend
                } else {
                    log::warn!(
                        "OpsRegistry: {:?} backend must be registered by native code, using winit",
                        config.backend
                    );
                    BackendKind::Winit
                };
                log::debug!("OpsRegistry: selected {:?} backend", kind);
                crate::backend::create(kind, config)
            })
            .clone()
    }

    pub fn get(&self) -> Option<Arc<dyn PlatformOps>> {
        self.active.get().cloned()
    }
}

impl std::fmt::Debug for OpsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpsRegistry")
            .field("active", &self.active.get().map(|ops| ops.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl PlatformOps for Bare {
        fn name(&self) -> &'static str {
            "bare"
        }
    }

    struct Other;

    impl PlatformOps for Other {
        fn name(&self) -> &'static str {
            "other"
        }
    }

    #[test]
    fn test_defaults_report_unsupported() {
        let ops = Bare;
        let h = Handle::from_raw(1).unwrap();
        assert!(ops.init(Arc::new(crate::forward::EventForwarder::new(
            Arc::new(crate::events::EventQueue::new()),
            Default::default(),
            NativeFamily::Canonical,
        )))
        .is_ok());
        assert!(ops.run().is_ok());
        assert!(ops.poll_events().is_ok());
        assert_eq!(ops.create_window("t", 10, 10), Err(NgError::Unsupported("create_window")));
        assert_eq!(ops.slider_get_value(h), Err(NgError::Unsupported("slider_get_value")));
        assert!(ops.box_add(h, h, 1.0).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_canvas_buffer_length_check() {
        let pixels = [0u8; 16];
        assert!(CanvasBuffer::from_slice(&pixels, 2, 2).is_complete());
        assert!(!CanvasBuffer::from_slice(&pixels, 3, 2).is_complete());
        let null = CanvasBuffer { ptr: std::ptr::null(), len: 16, width: 2, height: 2 };
        assert!(!null.is_complete());
        let wrapping = CanvasBuffer { ptr: pixels.as_ptr(), len: 16, width: u32::MAX, height: u32::MAX };
        assert_eq!(wrapping.required_len(), None);
        assert!(!wrapping.is_complete());
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = OpsRegistry::new();
        assert!(registry.get().is_none());
        assert!(registry.register(Arc::new(Bare)));
        assert!(!registry.register(Arc::new(Other)));
        assert_eq!(registry.get().unwrap().name(), "bare");
        assert_eq!(registry.ensure(&Config::headless()).name(), "bare");
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let registry = OpsRegistry::new();
        let first = registry.ensure(&Config::headless());
        let second = registry.ensure(&Config::default().with_backend(BackendKind::Winit));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "headless");
        assert!(!registry.register(Arc::new(Bare)));
    }

    #[test]
    fn test_canvas_buffer_keeps_caller_memory() {
        let pixels = vec![0u8; 16];
        let buffer = CanvasBuffer::from_slice(&pixels, 2, 2);
        assert_eq!(buffer.len, 16);
        assert_eq!(buffer.as_ptr(), pixels.as_ptr().cast());
    }
}
