//! C ABI.
//!
//! Every `ng_platform_*` function resolves the process-wide [`Platform`],
//! rejects NULL handles before reaching the backend and maps results to the
//! C conventions: NULL for failed handle-returning calls, a negative status
//! for fallible calls, and a per-operation default for getters.
//!
//! `ng_invoke_*` is the callback boundary for native backend code: it feeds
//! already-canonical events into the same forwarder the Rust backends use.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::{c_char, c_double, c_float, c_int, c_uint};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{status, NgError, NgResult, NG_SUCCESS};
use crate::events::{Event, LifecycleEvent, WidgetEvent, WindowEvent};
use crate::forward::{NativeEvent, ScaleCallback};
use crate::handle::{Handle, MenuHandle};
use crate::input::{GrabMode, KeyCode, ModifierFlags, MouseButton, NativeFamily};
use crate::layout::Orientation;
use crate::ops::{CanvasBuffer, OpsRegistry, PlatformOps};
use crate::platform::Platform;

pub type NGHandle = *mut c_void;
pub type NGMenuHandle = *mut c_void;
pub type NGScaleFactorCallback = Option<extern "C" fn(window: *mut c_void, scale_factor: c_float)>;

// =============================================================================
// Global State
// =============================================================================

static REGISTRY: OpsRegistry = OpsRegistry::new();

static PLATFORM: Lazy<Mutex<Platform>> =
    Lazy::new(|| Mutex::new(Platform::from_registry(&REGISTRY, default_config())));

fn default_config() -> Config {
    #[cfg(test)]
    {
        Config::headless()
    }
    #[cfg(not(test))]
    {
        Config::from_env()
    }
}

/// Install a backend for the C ABI. Must run before the first `ng_platform_*`
/// call; returns false once a backend has been selected.
pub fn register_ops(ops: Arc<dyn PlatformOps>) -> bool {
    REGISTRY.register(ops)
}

/// Replace the context behind the C ABI.
pub fn install_platform(platform: Platform) {
    *PLATFORM.lock() = platform;
}

/// The context behind the C ABI. The global lock is released on return, so
/// backends may call back in while an operation is running.
pub fn platform() -> Platform {
    PLATFORM.lock().clone()
}

// Thread-local buffer for text events (persists until next poll_event call)
thread_local! {
    static TEXT_BUFFER: std::cell::RefCell<CString> = std::cell::RefCell::new(CString::default());
}

// =============================================================================
// Argument Helpers
// =============================================================================

/// Validate an out-pointer before writing through it.
fn validate_ptr_for_write<T>(ptr: *mut T, location: &str) -> bool {
    if ptr.is_null() {
        log::debug!("{}: null pointer", location);
        return false;
    }
    if (ptr as usize) % std::mem::align_of::<T>() != 0 {
        log::error!(
            "{}: misaligned pointer {:p} (alignment {})",
            location,
            ptr,
            std::mem::align_of::<T>()
        );
        return false;
    }
    true
}

fn c_str_to_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // Safety: non-null; the caller guarantees a valid NUL-terminated string.
    unsafe { CStr::from_ptr(ptr).to_string_lossy().into_owned() }
}

/// Required string argument; NULL is an invalid parameter.
fn required_str(ptr: *const c_char, what: &'static str) -> NgResult<String> {
    if ptr.is_null() {
        return Err(NgError::InvalidParameter(what));
    }
    Ok(c_str_to_string(ptr))
}

fn handle(ptr: NGHandle) -> NgResult<Handle> {
    Handle::from_ptr(ptr).ok_or(NgError::InvalidHandle)
}

fn menu_handle(ptr: NGMenuHandle) -> NgResult<MenuHandle> {
    MenuHandle::from_ptr(ptr).ok_or(NgError::InvalidHandle)
}

fn log_failure(op: &str, error: &NgError) {
    if error.is_unsupported() {
        log::debug!("{}: not supported by the active backend", op);
    } else {
        log::debug!("{}: {}", op, error);
    }
}

/// Status-code convention.
fn report(op: &str, result: NgResult<()>) -> c_int {
    if let Err(e) = &result {
        log_failure(op, e);
    }
    status(result)
}

/// Void convention: failures are only logged.
fn discard(op: &str, result: NgResult<()>) {
    if let Err(e) = result {
        log_failure(op, &e);
    }
}

/// Handle-returning convention: NULL on failure.
fn handle_out(op: &str, result: NgResult<Handle>) -> NGHandle {
    match result {
        Ok(h) => h.as_ptr(),
        Err(e) => {
            log_failure(op, &e);
            std::ptr::null_mut()
        }
    }
}

fn menu_out(op: &str, result: NgResult<MenuHandle>) -> NGMenuHandle {
    match result {
        Ok(m) => m.as_ptr(),
        Err(e) => {
            log_failure(op, &e);
            std::ptr::null_mut()
        }
    }
}

/// Getter convention: `default` on failure.
fn value_or<T>(op: &str, result: NgResult<T>, default: T) -> T {
    result.unwrap_or_else(|e| {
        log_failure(op, &e);
        default
    })
}

fn write_pair<T: Copy>(op: &str, out_a: *mut T, out_b: *mut T, pair: Option<(T, T)>, zero: T) {
    let (a, b) = pair.unwrap_or((zero, zero));
    if validate_ptr_for_write(out_a, op) {
        unsafe { *out_a = a };
    }
    if validate_ptr_for_write(out_b, op) {
        unsafe { *out_b = b };
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_init() -> c_int {
    report("ng_platform_init", platform().init())
}

#[no_mangle]
pub extern "C" fn ng_platform_cleanup() {
    platform().cleanup();
}

/// Blocks in the backend's run loop.
#[no_mangle]
pub extern "C" fn ng_platform_run() -> c_int {
    report("ng_platform_run", platform().run())
}

#[no_mangle]
pub extern "C" fn ng_platform_poll_events() -> c_int {
    report("ng_platform_poll_events", platform().poll_events())
}

// =============================================================================
// Windows
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_create_window(title: *const c_char, width: c_int, height: c_int) -> NGHandle {
    let result = required_str(title, "window title")
        .and_then(|title| platform().create_window(&title, width, height));
    handle_out("ng_platform_create_window", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_create_window_with_type(
    title: *const c_char,
    width: c_int,
    height: c_int,
    window_type: c_int,
) -> NGHandle {
    let result = required_str(title, "window title")
        .and_then(|title| platform().create_window_with_type(&title, width, height, window_type));
    handle_out("ng_platform_create_window_with_type", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_destroy_window(window: NGHandle) {
    discard(
        "ng_platform_destroy_window",
        handle(window).and_then(|w| platform().destroy_window(w)),
    );
}

#[no_mangle]
pub extern "C" fn ng_platform_window_set_title(window: NGHandle, title: *const c_char) {
    let result = handle(window).and_then(|w| {
        let title = required_str(title, "window title")?;
        platform().window_set_title(w, &title)
    });
    discard("ng_platform_window_set_title", result);
}

#[no_mangle]
pub extern "C" fn ng_platform_window_set_size(window: NGHandle, width: c_int, height: c_int) {
    discard(
        "ng_platform_window_set_size",
        handle(window).and_then(|w| platform().window_set_size(w, width, height)),
    );
}

/// Writes 0x0 for invalid windows.
#[no_mangle]
pub extern "C" fn ng_platform_window_get_size(window: NGHandle, width: *mut c_int, height: *mut c_int) {
    let size = handle(window).and_then(|w| platform().window_get_size(w));
    write_pair("ng_platform_window_get_size", width, height, size.ok(), 0);
}

#[no_mangle]
pub extern "C" fn ng_platform_window_request_close(window: NGHandle) {
    discard(
        "ng_platform_window_request_close",
        handle(window).and_then(|w| platform().window_request_close(w)),
    );
}

#[no_mangle]
pub extern "C" fn ng_platform_window_is_focused(window: NGHandle) -> c_int {
    let focused = handle(window).and_then(|w| platform().window_is_focused(w));
    c_int::from(value_or("ng_platform_window_is_focused", focused, false))
}

#[no_mangle]
pub extern "C" fn ng_platform_window_set_cursor_visible(window: NGHandle, visible: c_int) -> c_int {
    report(
        "ng_platform_window_set_cursor_visible",
        handle(window).and_then(|w| platform().window_set_cursor_visible(w, visible != 0)),
    )
}

/// `mode`: 0 = none, 1 = confined, 2 = locked.
#[no_mangle]
pub extern "C" fn ng_platform_window_set_cursor_grab(window: NGHandle, mode: c_int) -> c_int {
    let result = handle(window).and_then(|w| {
        let mode = GrabMode::from_raw(mode)?;
        platform().window_set_cursor_grab(w, mode)
    });
    report("ng_platform_window_set_cursor_grab", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_window_get_content_view(window: NGHandle) -> NGHandle {
    handle_out(
        "ng_platform_window_get_content_view",
        handle(window).and_then(|w| platform().window_get_content_view(w)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_window_show(window: NGHandle) {
    discard("ng_platform_window_show", handle(window).and_then(|w| platform().window_show(w)));
}

#[no_mangle]
pub extern "C" fn ng_platform_window_hide(window: NGHandle) {
    discard("ng_platform_window_hide", handle(window).and_then(|w| platform().window_hide(w)));
}

#[no_mangle]
pub extern "C" fn ng_platform_window_is_visible(window: NGHandle) -> c_int {
    let visible = handle(window).and_then(|w| platform().window_is_visible(w));
    c_int::from(value_or("ng_platform_window_is_visible", visible, false))
}

#[no_mangle]
pub extern "C" fn ng_platform_window_set_position(window: NGHandle, x: c_int, y: c_int) {
    discard(
        "ng_platform_window_set_position",
        handle(window).and_then(|w| platform().window_set_position(w, x, y)),
    );
}

#[no_mangle]
pub extern "C" fn ng_platform_window_get_position(window: NGHandle, x: *mut c_int, y: *mut c_int) {
    let position = handle(window).and_then(|w| platform().window_get_position(w));
    write_pair("ng_platform_window_get_position", x, y, position.ok(), 0);
}

/// 1.0 when the backend cannot tell.
#[no_mangle]
pub extern "C" fn ng_platform_get_scale_factor(window: NGHandle) -> c_float {
    let scale = handle(window).and_then(|w| platform().get_scale_factor(w));
    value_or("ng_platform_get_scale_factor", scale, 1.0)
}

/// Scale changes are queued as events; `callback`, when given, is also
/// called with the window and the new factor.
#[no_mangle]
pub extern "C" fn ng_platform_window_set_scale_factor_callback(window: NGHandle, callback: NGScaleFactorCallback) {
    let callback: Option<ScaleCallback> = callback.map(|cb| {
        Arc::new(move |w: Handle, scale: f32| cb(w.as_ptr(), scale)) as ScaleCallback
    });
    discard(
        "ng_platform_window_set_scale_factor_callback",
        handle(window).and_then(|w| platform().window_set_scale_factor_callback(w, callback)),
    );
}

#[no_mangle]
pub extern "C" fn ng_platform_window_set_lifecycle_callback(window: NGHandle) {
    discard(
        "ng_platform_window_set_lifecycle_callback",
        handle(window).and_then(|w| platform().window_set_lifecycle_callback(w)),
    );
}

// =============================================================================
// Menus
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_create_menu() -> NGMenuHandle {
    menu_out("ng_platform_create_menu", platform().create_menu())
}

#[no_mangle]
pub extern "C" fn ng_platform_destroy_menu(menu: NGMenuHandle) {
    discard(
        "ng_platform_destroy_menu",
        menu_handle(menu).and_then(|m| platform().destroy_menu(m)),
    );
}

#[no_mangle]
pub extern "C" fn ng_platform_attach_menu(window: NGHandle, menu: NGMenuHandle) -> c_int {
    let result = handle(window)
        .and_then(|w| Ok((w, menu_handle(menu)?)))
        .and_then(|(w, m)| platform().attach_menu(w, m));
    report("ng_platform_attach_menu", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_add_menu_item(menu: NGMenuHandle, title: *const c_char, id: c_uint) -> c_int {
    let result = menu_handle(menu).and_then(|m| {
        let title = required_str(title, "menu item title")?;
        platform().add_menu_item(m, &title, id)
    });
    report("ng_platform_add_menu_item", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_add_menu_separator(menu: NGMenuHandle) -> c_int {
    report(
        "ng_platform_add_menu_separator",
        menu_handle(menu).and_then(|m| platform().add_menu_separator(m)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_create_submenu(parent: NGMenuHandle, title: *const c_char) -> NGMenuHandle {
    let result = menu_handle(parent).and_then(|m| {
        let title = required_str(title, "submenu title")?;
        platform().create_submenu(m, &title)
    });
    menu_out("ng_platform_create_submenu", result)
}

// =============================================================================
// Containers and basic widgets
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_create_button(title: *const c_char, id: c_uint) -> NGHandle {
    let result = required_str(title, "button title").and_then(|t| platform().create_button(&t, id));
    handle_out("ng_platform_create_button", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_button_invalidate(button: NGHandle) {
    discard("ng_platform_button_invalidate", handle(button).and_then(|b| platform().button_invalidate(b)));
}

#[no_mangle]
pub extern "C" fn ng_platform_create_label(text: *const c_char) -> NGHandle {
    let result = required_str(text, "label text").and_then(|t| platform().create_label(&t));
    handle_out("ng_platform_create_label", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_label_invalidate(label: NGHandle) {
    discard("ng_platform_label_invalidate", handle(label).and_then(|l| platform().label_invalidate(l)));
}

#[no_mangle]
pub extern "C" fn ng_platform_create_box(is_vertical: c_int) -> NGHandle {
    handle_out(
        "ng_platform_create_box",
        platform().create_box(Orientation::from_vertical_flag(is_vertical)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_box_invalidate(container: NGHandle) {
    discard("ng_platform_box_invalidate", handle(container).and_then(|b| platform().box_invalidate(b)));
}

#[no_mangle]
pub extern "C" fn ng_platform_box_add(container: NGHandle, element: NGHandle, weight: c_float) -> c_int {
    let result = handle(container)
        .and_then(|b| Ok((b, handle(element)?)))
        .and_then(|(b, e)| platform().box_add(b, e, weight));
    report("ng_platform_box_add", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_set_window_content(window: NGHandle, content: NGHandle) -> c_int {
    let result = handle(window)
        .and_then(|w| Ok((w, handle(content)?)))
        .and_then(|(w, c)| platform().set_window_content(w, c));
    report("ng_platform_set_window_content", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_create_split_view(is_vertical: c_int) -> NGHandle {
    handle_out(
        "ng_platform_create_split_view",
        platform().create_split_view(Orientation::from_vertical_flag(is_vertical)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_split_view_add(split: NGHandle, element: NGHandle) -> c_int {
    let result = handle(split)
        .and_then(|s| Ok((s, handle(element)?)))
        .and_then(|(s, e)| platform().split_view_add(s, e));
    report("ng_platform_split_view_add", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_split_view_set_divider_position(split: NGHandle, index: c_int, position: c_float) -> c_int {
    report(
        "ng_platform_split_view_set_divider_position",
        handle(split).and_then(|s| platform().split_view_set_divider_position(s, index, position)),
    )
}

// =============================================================================
// Text
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_create_text_editor(id: c_uint) -> NGHandle {
    handle_out("ng_platform_create_text_editor", platform().create_text_editor(id))
}

#[no_mangle]
pub extern "C" fn ng_platform_text_editor_invalidate(editor: NGHandle) {
    discard(
        "ng_platform_text_editor_invalidate",
        handle(editor).and_then(|e| platform().text_editor_invalidate(e)),
    );
}

#[no_mangle]
pub extern "C" fn ng_platform_create_text_view(is_editable: c_int, id: c_uint) -> NGHandle {
    handle_out("ng_platform_create_text_view", platform().create_text_view(is_editable != 0, id))
}

#[no_mangle]
pub extern "C" fn ng_platform_text_view_invalidate(view: NGHandle) {
    discard(
        "ng_platform_text_view_invalidate",
        handle(view).and_then(|v| platform().text_view_invalidate(v)),
    );
}

#[no_mangle]
pub extern "C" fn ng_platform_create_text_field() -> NGHandle {
    handle_out("ng_platform_create_text_field", platform().create_text_field())
}

#[no_mangle]
pub extern "C" fn ng_platform_set_text_content(widget: NGHandle, content: *const c_char) -> c_int {
    let result = handle(widget).and_then(|w| {
        let content = required_str(content, "text content")?;
        platform().set_text_content(w, &content)
    });
    report("ng_platform_set_text_content", result)
}

/// Caller frees the result with `ng_platform_free_text_content`. NULL on
/// failure.
#[no_mangle]
pub extern "C" fn ng_platform_get_text_content(widget: NGHandle) -> *mut c_char {
    let result = handle(widget).and_then(|w| platform().get_text_content(w)).and_then(|text| {
        CString::new(text).map_err(|_| NgError::PlatformSpecific("text contains NUL".into()))
    });
    match result {
        Ok(text) => text.into_raw(),
        Err(e) => {
            log_failure("ng_platform_get_text_content", &e);
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "C" fn ng_platform_free_text_content(content: *mut c_char) {
    if content.is_null() {
        return;
    }
    // Safety: only pointers from ng_platform_get_text_content are accepted.
    unsafe { drop(CString::from_raw(content)) };
}

// =============================================================================
// Canvas
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_create_canvas(width: c_int, height: c_int) -> NGHandle {
    handle_out("ng_platform_create_canvas", platform().create_canvas(width, height))
}

#[no_mangle]
pub extern "C" fn ng_platform_canvas_invalidate(canvas: NGHandle) {
    discard("ng_platform_canvas_invalidate", handle(canvas).and_then(|c| platform().canvas_invalidate(c)));
}

#[no_mangle]
pub extern "C" fn ng_platform_canvas_invalidate_rect(canvas: NGHandle, x: c_float, y: c_float, w: c_float, h: c_float) {
    discard(
        "ng_platform_canvas_invalidate_rect",
        handle(canvas).and_then(|c| platform().canvas_invalidate_rect(c, x, y, w, h)),
    );
}

/// `buffer` stays owned by the caller and must outlive the next update.
#[no_mangle]
pub extern "C" fn ng_platform_canvas_update_buffer(
    canvas: NGHandle,
    buffer: *const u8,
    size: c_uint,
    width: c_uint,
    height: c_uint,
) {
    let result = handle(canvas).and_then(|c| {
        let buffer = CanvasBuffer { ptr: buffer, len: size as usize, width, height };
        platform().canvas_update_buffer(c, buffer)
    });
    discard("ng_platform_canvas_update_buffer", result);
}

#[no_mangle]
pub extern "C" fn ng_platform_canvas_get_size(canvas: NGHandle, width: *mut c_uint, height: *mut c_uint) {
    let size = handle(canvas).and_then(|c| platform().canvas_get_size(c));
    write_pair("ng_platform_canvas_get_size", width, height, size.ok(), 0);
}

#[no_mangle]
pub extern "C" fn ng_platform_canvas_get_window(canvas: NGHandle) -> NGHandle {
    handle_out(
        "ng_platform_canvas_get_window",
        handle(canvas).and_then(|c| platform().canvas_get_window(c)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_canvas_get_native_handle(canvas: NGHandle) -> NGHandle {
    handle_out(
        "ng_platform_canvas_get_native_handle",
        handle(canvas).and_then(|c| platform().canvas_get_native_handle(c)),
    )
}

// =============================================================================
// Image view
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_create_image_view() -> NGHandle {
    handle_out("ng_platform_create_image_view", platform().create_image_view())
}

#[no_mangle]
pub extern "C" fn ng_platform_image_view_load_from_path(view: NGHandle, path: *const c_char) -> c_int {
    let result = handle(view).and_then(|v| {
        let path = required_str(path, "image path")?;
        platform().image_view_load_from_path(v, &path)
    });
    report("ng_platform_image_view_load_from_path", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_image_view_load_from_data(view: NGHandle, data: *const u8, size: c_uint) -> c_int {
    let result = handle(view).and_then(|v| {
        if data.is_null() || size == 0 {
            return Err(NgError::InvalidParameter("image data"));
        }
        // Safety: non-null; the caller guarantees `size` readable bytes.
        let bytes = unsafe { std::slice::from_raw_parts(data, size as usize) };
        platform().image_view_load_from_data(v, bytes)
    });
    report("ng_platform_image_view_load_from_data", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_image_view_set_scaling(view: NGHandle, mode: c_int) {
    discard(
        "ng_platform_image_view_set_scaling",
        handle(view).and_then(|v| platform().image_view_set_scaling(v, mode)),
    );
}

#[no_mangle]
pub extern "C" fn ng_platform_image_view_invalidate(view: NGHandle) {
    discard(
        "ng_platform_image_view_invalidate",
        handle(view).and_then(|v| platform().image_view_invalidate(v)),
    );
}

// =============================================================================
// Slider, checkbox, progress bar
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_create_slider(min: c_double, max: c_double) -> NGHandle {
    handle_out("ng_platform_create_slider", platform().create_slider(min, max))
}

#[no_mangle]
pub extern "C" fn ng_platform_slider_set_value(slider: NGHandle, value: c_double) -> c_int {
    report(
        "ng_platform_slider_set_value",
        handle(slider).and_then(|s| platform().slider_set_value(s, value)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_slider_get_value(slider: NGHandle) -> c_double {
    let value = handle(slider).and_then(|s| platform().slider_get_value(s));
    value_or("ng_platform_slider_get_value", value, 0.0)
}

#[no_mangle]
pub extern "C" fn ng_platform_slider_set_enabled(slider: NGHandle, enabled: c_int) -> c_int {
    report(
        "ng_platform_slider_set_enabled",
        handle(slider).and_then(|s| platform().slider_set_enabled(s, enabled != 0)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_slider_invalidate(slider: NGHandle) {
    discard("ng_platform_slider_invalidate", handle(slider).and_then(|s| platform().slider_invalidate(s)));
}

#[no_mangle]
pub extern "C" fn ng_platform_create_checkbox(label: *const c_char) -> NGHandle {
    let result = required_str(label, "checkbox label").and_then(|l| platform().create_checkbox(&l));
    handle_out("ng_platform_create_checkbox", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_checkbox_set_checked(checkbox: NGHandle, checked: c_int) -> c_int {
    report(
        "ng_platform_checkbox_set_checked",
        handle(checkbox).and_then(|c| platform().checkbox_set_checked(c, checked != 0)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_checkbox_get_checked(checkbox: NGHandle) -> c_int {
    let checked = handle(checkbox).and_then(|c| platform().checkbox_get_checked(c));
    c_int::from(value_or("ng_platform_checkbox_get_checked", checked, false))
}

#[no_mangle]
pub extern "C" fn ng_platform_checkbox_set_enabled(checkbox: NGHandle, enabled: c_int) -> c_int {
    report(
        "ng_platform_checkbox_set_enabled",
        handle(checkbox).and_then(|c| platform().checkbox_set_enabled(c, enabled != 0)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_checkbox_invalidate(checkbox: NGHandle) {
    discard(
        "ng_platform_checkbox_invalidate",
        handle(checkbox).and_then(|c| platform().checkbox_invalidate(c)),
    );
}

#[no_mangle]
pub extern "C" fn ng_platform_create_progress_bar() -> NGHandle {
    handle_out("ng_platform_create_progress_bar", platform().create_progress_bar())
}

#[no_mangle]
pub extern "C" fn ng_platform_progress_bar_set_value(bar: NGHandle, value: c_double) -> c_int {
    report(
        "ng_platform_progress_bar_set_value",
        handle(bar).and_then(|b| platform().progress_bar_set_value(b, value)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_progress_bar_set_indeterminate(bar: NGHandle, indeterminate: c_int) -> c_int {
    report(
        "ng_platform_progress_bar_set_indeterminate",
        handle(bar).and_then(|b| platform().progress_bar_set_indeterminate(b, indeterminate != 0)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_progress_bar_set_enabled(bar: NGHandle, enabled: c_int) -> c_int {
    report(
        "ng_platform_progress_bar_set_enabled",
        handle(bar).and_then(|b| platform().progress_bar_set_enabled(b, enabled != 0)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_progress_bar_invalidate(bar: NGHandle) {
    discard(
        "ng_platform_progress_bar_invalidate",
        handle(bar).and_then(|b| platform().progress_bar_invalidate(b)),
    );
}

// =============================================================================
// Combo box
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_create_combo_box() -> NGHandle {
    handle_out("ng_platform_create_combo_box", platform().create_combo_box())
}

#[no_mangle]
pub extern "C" fn ng_platform_combo_box_add_item(combo: NGHandle, item: *const c_char) -> c_int {
    let result = handle(combo).and_then(|c| {
        let item = required_str(item, "combo box item")?;
        platform().combo_box_add_item(c, &item)
    });
    report("ng_platform_combo_box_add_item", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_combo_box_set_selected(combo: NGHandle, index: c_int) -> c_int {
    report(
        "ng_platform_combo_box_set_selected",
        handle(combo).and_then(|c| platform().combo_box_set_selected(c, index)),
    )
}

/// -1 when nothing is selected or the call failed.
#[no_mangle]
pub extern "C" fn ng_platform_combo_box_get_selected(combo: NGHandle) -> c_int {
    let selected = handle(combo).and_then(|c| platform().combo_box_get_selected(c));
    value_or("ng_platform_combo_box_get_selected", selected, -1)
}

#[no_mangle]
pub extern "C" fn ng_platform_combo_box_clear(combo: NGHandle) -> c_int {
    report("ng_platform_combo_box_clear", handle(combo).and_then(|c| platform().combo_box_clear(c)))
}

#[no_mangle]
pub extern "C" fn ng_platform_combo_box_set_enabled(combo: NGHandle, enabled: c_int) -> c_int {
    report(
        "ng_platform_combo_box_set_enabled",
        handle(combo).and_then(|c| platform().combo_box_set_enabled(c, enabled != 0)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_combo_box_invalidate(combo: NGHandle) {
    discard(
        "ng_platform_combo_box_invalidate",
        handle(combo).and_then(|c| platform().combo_box_invalidate(c)),
    );
}

// =============================================================================
// Tab bar
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_create_tab_bar(id: c_uint) -> NGHandle {
    handle_out("ng_platform_create_tab_bar", platform().create_tab_bar(id))
}

#[no_mangle]
pub extern "C" fn ng_platform_tab_bar_add_tab(tabs: NGHandle, title: *const c_char) -> c_int {
    let result = handle(tabs).and_then(|t| {
        let title = required_str(title, "tab title")?;
        platform().tab_bar_add_tab(t, &title)
    });
    report("ng_platform_tab_bar_add_tab", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_tab_bar_remove_tab(tabs: NGHandle, index: c_int) -> c_int {
    report(
        "ng_platform_tab_bar_remove_tab",
        handle(tabs).and_then(|t| platform().tab_bar_remove_tab(t, index)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_tab_bar_set_selected(tabs: NGHandle, index: c_int) -> c_int {
    report(
        "ng_platform_tab_bar_set_selected",
        handle(tabs).and_then(|t| platform().tab_bar_set_selected(t, index)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_tab_bar_get_selected(tabs: NGHandle) -> c_int {
    let selected = handle(tabs).and_then(|t| platform().tab_bar_get_selected(t));
    value_or("ng_platform_tab_bar_get_selected", selected, -1)
}

#[no_mangle]
pub extern "C" fn ng_platform_tab_bar_invalidate(tabs: NGHandle) {
    discard("ng_platform_tab_bar_invalidate", handle(tabs).and_then(|t| platform().tab_bar_invalidate(t)));
}

// =============================================================================
// Sidebar list
// =============================================================================

#[no_mangle]
pub extern "C" fn ng_platform_create_sidebar_list(id: c_uint) -> NGHandle {
    handle_out("ng_platform_create_sidebar_list", platform().create_sidebar_list(id))
}

#[no_mangle]
pub extern "C" fn ng_platform_sidebar_list_add_section(list: NGHandle, title: *const c_char) -> c_int {
    let result = handle(list).and_then(|l| {
        let title = required_str(title, "section title")?;
        platform().sidebar_list_add_section(l, &title)
    });
    report("ng_platform_sidebar_list_add_section", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_sidebar_list_add_item(list: NGHandle, title: *const c_char, indent: c_int) -> c_int {
    let result = handle(list).and_then(|l| {
        let title = required_str(title, "item title")?;
        platform().sidebar_list_add_item(l, &title, indent)
    });
    report("ng_platform_sidebar_list_add_item", result)
}

#[no_mangle]
pub extern "C" fn ng_platform_sidebar_list_set_selected(list: NGHandle, index: c_int) -> c_int {
    report(
        "ng_platform_sidebar_list_set_selected",
        handle(list).and_then(|l| platform().sidebar_list_set_selected(l, index)),
    )
}

#[no_mangle]
pub extern "C" fn ng_platform_sidebar_list_get_selected(list: NGHandle) -> c_int {
    let selected = handle(list).and_then(|l| platform().sidebar_list_get_selected(l));
    value_or("ng_platform_sidebar_list_get_selected", selected, -1)
}

#[no_mangle]
pub extern "C" fn ng_platform_sidebar_list_clear(list: NGHandle) -> c_int {
    report("ng_platform_sidebar_list_clear", handle(list).and_then(|l| platform().sidebar_list_clear(l)))
}

#[no_mangle]
pub extern "C" fn ng_platform_sidebar_list_invalidate(list: NGHandle) {
    discard(
        "ng_platform_sidebar_list_invalidate",
        handle(list).and_then(|l| platform().sidebar_list_invalidate(l)),
    );
}

// =============================================================================
// Event Polling
// =============================================================================

pub const NG_EVENT_NONE: c_int = -1;
pub const NG_EVENT_LIFECYCLE: c_int = 0;
pub const NG_EVENT_KEY: c_int = 1;
pub const NG_EVENT_MOUSE_BUTTON: c_int = 2;
pub const NG_EVENT_MOUSE_MOVE: c_int = 3;
pub const NG_EVENT_MOUSE_WHEEL: c_int = 4;
pub const NG_EVENT_RAW_MOUSE_MOTION: c_int = 5;
pub const NG_EVENT_TEXT_INPUT: c_int = 6;
pub const NG_EVENT_FOCUS: c_int = 7;
pub const NG_EVENT_CURSOR_ENTERED: c_int = 8;
pub const NG_EVENT_SCALE_FACTOR: c_int = 9;
pub const NG_EVENT_MENU_ITEM: c_int = 10;
pub const NG_EVENT_BUTTON: c_int = 11;
pub const NG_EVENT_TAB_SELECTED: c_int = 12;
pub const NG_EVENT_TAB_DETACH: c_int = 13;
pub const NG_EVENT_SIDEBAR_SELECTED: c_int = 14;
pub const NG_EVENT_TEXT_CHANGED: c_int = 15;
pub const NG_EVENT_TEXT_VIEW_CHANGED: c_int = 16;

/// Flat event record for C hosts.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NGEventData {
    /// `NG_EVENT_*`; -1 when no event was pending.
    pub event_type: c_int,
    /// Window for window events, NULL for widget events.
    pub window: NGHandle,
    /// Host-assigned widget id for widget events.
    pub widget_id: c_uint,
    /// Tab or sidebar row for selection events.
    pub index: c_int,
    /// Canonical key code.
    pub key: c_uint,
    /// Canonical button index. Unrecognized buttons start at 5.
    pub button: c_uint,
    /// Key/button pressed, focus gained, cursor entered.
    pub active: c_int,
    pub modifiers: c_uint,
    pub lifecycle: c_uint,
    pub x: c_double,
    pub y: c_double,
    pub delta_x: c_double,
    pub delta_y: c_double,
    pub scale_factor: c_float,
    /// UTF-8 text. **Only valid until the next poll on this thread.**
    pub text_ptr: *const c_char,
    pub text_len: usize,
}

impl Default for NGEventData {
    fn default() -> Self {
        Self {
            event_type: NG_EVENT_NONE,
            window: std::ptr::null_mut(),
            widget_id: 0,
            index: 0,
            key: 0,
            button: 0,
            active: 0,
            modifiers: 0,
            lifecycle: 0,
            x: 0.0,
            y: 0.0,
            delta_x: 0.0,
            delta_y: 0.0,
            scale_factor: 0.0,
            text_ptr: std::ptr::null(),
            text_len: 0,
        }
    }
}

/// Park `text` in the thread-local buffer and point at it.
fn stash_text(text: &str) -> (*const c_char, usize) {
    TEXT_BUFFER.with(|buf| {
        let cstring = CString::new(text).unwrap_or_else(|e| {
            // Truncate at the first interior NUL.
            let end = e.nul_position();
            CString::new(&text.as_bytes()[..end]).unwrap_or_default()
        });
        let len = cstring.as_bytes().len();
        *buf.borrow_mut() = cstring;
        (buf.borrow().as_ptr(), len)
    })
}

fn event_data(event: &Event) -> NGEventData {
    match event {
        Event::Window { window, event } => {
            let base = NGEventData { window: window.as_ptr(), ..Default::default() };
            match event {
                WindowEvent::Lifecycle(e) => NGEventData {
                    event_type: NG_EVENT_LIFECYCLE,
                    lifecycle: e.id(),
                    ..base
                },
                WindowEvent::Key { key, pressed, modifiers } => NGEventData {
                    event_type: NG_EVENT_KEY,
                    key: key.to_raw(),
                    active: c_int::from(*pressed),
                    modifiers: modifiers.bits(),
                    ..base
                },
                WindowEvent::MouseButton { button, pressed, modifiers } => NGEventData {
                    event_type: NG_EVENT_MOUSE_BUTTON,
                    button: button.index(),
                    active: c_int::from(*pressed),
                    modifiers: modifiers.bits(),
                    ..base
                },
                WindowEvent::MouseMove { x, y } => NGEventData {
                    event_type: NG_EVENT_MOUSE_MOVE,
                    x: *x,
                    y: *y,
                    ..base
                },
                WindowEvent::MouseWheel { delta_x, delta_y, modifiers } => NGEventData {
                    event_type: NG_EVENT_MOUSE_WHEEL,
                    delta_x: *delta_x,
                    delta_y: *delta_y,
                    modifiers: modifiers.bits(),
                    ..base
                },
                WindowEvent::RawMouseMotion { delta_x, delta_y } => NGEventData {
                    event_type: NG_EVENT_RAW_MOUSE_MOTION,
                    delta_x: *delta_x,
                    delta_y: *delta_y,
                    ..base
                },
                WindowEvent::TextInput(text) => {
                    let (text_ptr, text_len) = stash_text(text);
                    NGEventData { event_type: NG_EVENT_TEXT_INPUT, text_ptr, text_len, ..base }
                }
                WindowEvent::FocusChanged(focused) => NGEventData {
                    event_type: NG_EVENT_FOCUS,
                    active: c_int::from(*focused),
                    ..base
                },
                WindowEvent::CursorEntered(entered) => NGEventData {
                    event_type: NG_EVENT_CURSOR_ENTERED,
                    active: c_int::from(*entered),
                    ..base
                },
                WindowEvent::ScaleFactorChanged(scale) => NGEventData {
                    event_type: NG_EVENT_SCALE_FACTOR,
                    scale_factor: *scale,
                    ..base
                },
            }
        }
        Event::Widget(event) => {
            let base = NGEventData::default();
            match event {
                WidgetEvent::MenuItem { id } => NGEventData { event_type: NG_EVENT_MENU_ITEM, widget_id: *id, ..base },
                WidgetEvent::Button { id } => NGEventData { event_type: NG_EVENT_BUTTON, widget_id: *id, ..base },
                WidgetEvent::TabSelected { id, index } => NGEventData {
                    event_type: NG_EVENT_TAB_SELECTED,
                    widget_id: *id,
                    index: *index,
                    ..base
                },
                WidgetEvent::TabDetachRequested { id, index } => NGEventData {
                    event_type: NG_EVENT_TAB_DETACH,
                    widget_id: *id,
                    index: *index,
                    ..base
                },
                WidgetEvent::SidebarSelected { id, index } => NGEventData {
                    event_type: NG_EVENT_SIDEBAR_SELECTED,
                    widget_id: *id,
                    index: *index,
                    ..base
                },
                WidgetEvent::TextChanged { id, text } => {
                    let (text_ptr, text_len) = stash_text(text);
                    NGEventData { event_type: NG_EVENT_TEXT_CHANGED, widget_id: *id, text_ptr, text_len, ..base }
                }
                WidgetEvent::TextViewChanged { id, text } => {
                    let (text_ptr, text_len) = stash_text(text);
                    NGEventData { event_type: NG_EVENT_TEXT_VIEW_CHANGED, widget_id: *id, text_ptr, text_len, ..base }
                }
            }
        }
    }
}

/// Dequeue one canonical event into `out_event`. Returns its type, or -1.
#[no_mangle]
pub extern "C" fn ng_platform_poll_event(out_event: *mut NGEventData) -> c_int {
    let data = platform().poll_event().map(|e| event_data(&e)).unwrap_or_default();
    if validate_ptr_for_write(out_event, "ng_platform_poll_event") {
        unsafe { *out_event = data };
    }
    data.event_type
}

// =============================================================================
// Native Callbacks
// =============================================================================

fn with_window(op: &str, window: *mut c_void, f: impl FnOnce(&Platform, Handle)) {
    match Handle::from_ptr(window) {
        Some(w) => f(&platform(), w),
        None => log::debug!("{}: null window", op),
    }
}

#[no_mangle]
pub extern "C" fn ng_invoke_menu_callback(id: c_uint) {
    platform().forwarder().widget(WidgetEvent::MenuItem { id });
}

#[no_mangle]
pub extern "C" fn ng_invoke_button_callback(id: c_uint) {
    platform().forwarder().widget(WidgetEvent::Button { id });
}

#[no_mangle]
pub extern "C" fn ng_invoke_tab_bar_selected(id: c_uint, index: c_int) {
    platform().forwarder().widget(WidgetEvent::TabSelected { id, index });
}

#[no_mangle]
pub extern "C" fn ng_invoke_tab_bar_detach(id: c_uint, index: c_int) {
    platform().forwarder().widget(WidgetEvent::TabDetachRequested { id, index });
}

#[no_mangle]
pub extern "C" fn ng_invoke_sidebar_list_selected(id: c_uint, index: c_int) {
    platform().forwarder().widget(WidgetEvent::SidebarSelected { id, index });
}

#[no_mangle]
pub extern "C" fn ng_invoke_text_callback(id: c_uint, content: *const c_char) {
    let text = c_str_to_string(content);
    platform().forwarder().widget(WidgetEvent::TextChanged { id, text });
}

#[no_mangle]
pub extern "C" fn ng_invoke_textview_callback(id: c_uint, content: *const c_char) {
    let text = c_str_to_string(content);
    platform().forwarder().widget(WidgetEvent::TextViewChanged { id, text });
}

#[no_mangle]
pub extern "C" fn ng_invoke_lifecycle_callback(window: *mut c_void, event_id: c_uint) {
    let Some(event) = LifecycleEvent::from_id(event_id) else {
        log::debug!("ng_invoke_lifecycle_callback: unknown event id {}", event_id);
        return;
    };
    with_window("ng_invoke_lifecycle_callback", window, |p, w| p.forwarder().lifecycle(w, event));
}

/// `keycode` and `modifiers` are canonical values.
#[no_mangle]
pub extern "C" fn ng_invoke_key_event(window: *mut c_void, keycode: c_uint, pressed: c_int, modifiers: c_uint) {
    with_window("ng_invoke_key_event", window, |p, w| {
        p.forwarder().key(
            w,
            KeyCode::from_raw(keycode),
            pressed != 0,
            ModifierFlags::from_bits_truncate(modifiers),
        )
    });
}

/// `button` is the canonical index (0 primary, 1 secondary, 2 middle,
/// 3 back, 4 forward, 5 and up unrecognized).
#[no_mangle]
pub extern "C" fn ng_invoke_mouse_button(window: *mut c_void, button: c_int, pressed: c_int, modifiers: c_uint) {
    let Ok(index) = u32::try_from(button) else {
        log::debug!("ng_invoke_mouse_button: negative button {}", button);
        return;
    };
    with_window("ng_invoke_mouse_button", window, |p, w| {
        p.forwarder().mouse_button(
            w,
            MouseButton::from_index(index),
            pressed != 0,
            ModifierFlags::from_bits_truncate(modifiers),
        )
    });
}

#[no_mangle]
pub extern "C" fn ng_invoke_mouse_move(window: *mut c_void, x: c_double, y: c_double) {
    with_window("ng_invoke_mouse_move", window, |p, w| p.forwarder().mouse_move(w, x, y));
}

#[no_mangle]
pub extern "C" fn ng_invoke_mouse_wheel(window: *mut c_void, delta_x: c_double, delta_y: c_double, modifiers: c_uint) {
    with_window("ng_invoke_mouse_wheel", window, |p, w| {
        p.forwarder()
            .mouse_wheel(w, delta_x, delta_y, ModifierFlags::from_bits_truncate(modifiers))
    });
}

#[no_mangle]
pub extern "C" fn ng_invoke_text_input(window: *mut c_void, text: *const c_char) {
    let text = c_str_to_string(text);
    with_window("ng_invoke_text_input", window, |p, w| p.forwarder().text_input(w, text));
}

#[no_mangle]
pub extern "C" fn ng_invoke_focus_changed(window: *mut c_void, focused: c_int) {
    with_window("ng_invoke_focus_changed", window, |p, w| p.forwarder().focus_changed(w, focused != 0));
}

#[no_mangle]
pub extern "C" fn ng_invoke_cursor_entered(window: *mut c_void, entered: c_int) {
    with_window("ng_invoke_cursor_entered", window, |p, w| p.forwarder().cursor_entered(w, entered != 0));
}

#[no_mangle]
pub extern "C" fn ng_invoke_raw_mouse_motion(window: *mut c_void, delta_x: c_double, delta_y: c_double) {
    with_window("ng_invoke_raw_mouse_motion", window, |p, w| {
        p.forwarder().raw_mouse_motion(w, delta_x, delta_y)
    });
}

#[no_mangle]
pub extern "C" fn ng_invoke_scale_factor_changed(window: *mut c_void, scale_factor: c_float) {
    with_window("ng_invoke_scale_factor_changed", window, |p, w| {
        p.forwarder().scale_factor_changed(w, scale_factor)
    });
}

/// Native key event in the active backend's own vocabulary.
#[no_mangle]
pub extern "C" fn ng_invoke_native_key_event(window: *mut c_void, native_key: c_uint, pressed: c_int, native_modifiers: u64) {
    with_window("ng_invoke_native_key_event", window, |p, w| {
        p.forwarder().dispatch(NativeEvent::Key {
            window: w,
            key: native_key,
            pressed: pressed != 0,
            modifiers: native_modifiers,
        })
    });
}

/// Native mouse button in the active backend's own vocabulary.
#[no_mangle]
pub extern "C" fn ng_invoke_native_mouse_button(
    window: *mut c_void,
    native_button: c_uint,
    pressed: c_int,
    native_modifiers: u64,
) {
    with_window("ng_invoke_native_mouse_button", window, |p, w| {
        p.forwarder().dispatch(NativeEvent::MouseButton {
            window: w,
            button: native_button,
            pressed: pressed != 0,
            modifiers: native_modifiers,
        })
    });
}

/// Select the vocabulary `ng_invoke_native_*` decodes: 0 canonical, 1 GDK,
/// 2 Win32, 3 Android, 4 UIKit.
#[no_mangle]
pub extern "C" fn ng_platform_set_input_family(family: c_int) -> c_int {
    let family = match family {
        0 => NativeFamily::Canonical,
        1 => NativeFamily::Gdk,
        2 => NativeFamily::Win32,
        3 => NativeFamily::Android,
        4 => NativeFamily::UiKit,
        other => {
            log::debug!("ng_platform_set_input_family: unknown family {}", other);
            return NgError::InvalidParameter("input family").code();
        }
    };
    platform().forwarder().set_family(family);
    NG_SUCCESS
}

// =============================================================================
// Logging
// =============================================================================

const NATIVE_TARGET: &str = "ng_platform::native";

#[no_mangle]
pub extern "C" fn ng_log_error(msg: *const c_char) {
    log::error!(target: NATIVE_TARGET, "{}", c_str_to_string(msg));
}

#[no_mangle]
pub extern "C" fn ng_log_warn(msg: *const c_char) {
    log::warn!(target: NATIVE_TARGET, "{}", c_str_to_string(msg));
}

#[no_mangle]
pub extern "C" fn ng_log_info(msg: *const c_char) {
    log::info!(target: NATIVE_TARGET, "{}", c_str_to_string(msg));
}

#[no_mangle]
pub extern "C" fn ng_log_debug(msg: *const c_char) {
    log::debug!(target: NATIVE_TARGET, "{}", c_str_to_string(msg));
}

#[no_mangle]
pub extern "C" fn ng_log_trace(msg: *const c_char) {
    log::trace!(target: NATIVE_TARGET, "{}", c_str_to_string(msg));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{
        NG_ERROR_INVALID_HANDLE, NG_ERROR_INVALID_PARAMETER, NG_ERROR_UNSUPPORTED,
    };
    use serial_test::serial;

    fn cstr(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    /// Fresh headless context for each test.
    fn reset_state() {
        let platform = Platform::headless();
        platform.init().unwrap();
        install_platform(platform);
    }

    fn poll() -> NGEventData {
        let mut data = NGEventData::default();
        ng_platform_poll_event(&mut data);
        data
    }

    fn text_of(data: &NGEventData) -> String {
        unsafe { CStr::from_ptr(data.text_ptr).to_string_lossy().into_owned() }
    }

    // =========================================================================
    // Phase 1: Windows
    // =========================================================================

    #[test]
    #[serial]
    fn test_create_window_returns_non_null() {
        reset_state();
        let title = cstr("Test Window");
        let window = ng_platform_create_window(title.as_ptr(), 800, 600);
        assert!(!window.is_null());

        let (mut w, mut h): (c_int, c_int) = (0, 0);
        ng_platform_window_get_size(window, &mut w, &mut h);
        assert_eq!((w, h), (800, 600));
    }

    #[test]
    #[serial]
    fn test_null_arguments_are_rejected() {
        reset_state();
        assert!(ng_platform_create_window(std::ptr::null(), 800, 600).is_null());
        assert_eq!(
            ng_platform_window_set_cursor_grab(std::ptr::null_mut(), 1),
            NG_ERROR_INVALID_HANDLE
        );
        assert_eq!(
            ng_platform_box_add(std::ptr::null_mut(), std::ptr::null_mut(), 1.0),
            NG_ERROR_INVALID_HANDLE
        );

        let title = cstr("W");
        let window = ng_platform_create_window(title.as_ptr(), 100, 100);
        assert_eq!(ng_platform_window_set_cursor_grab(window, 3), NG_ERROR_INVALID_PARAMETER);

        let (mut w, mut h): (c_int, c_int) = (7, 7);
        ng_platform_window_get_size(std::ptr::null_mut(), &mut w, &mut h);
        assert_eq!((w, h), (0, 0));
        ng_platform_window_get_size(window, std::ptr::null_mut(), std::ptr::null_mut());
    }

    #[test]
    #[serial]
    fn test_destroyed_window_reads_as_zero() {
        reset_state();
        let title = cstr("Gone");
        let window = ng_platform_create_window(title.as_ptr(), 640, 480);
        ng_platform_destroy_window(window);
        let (mut w, mut h): (c_int, c_int) = (1, 1);
        ng_platform_window_get_size(window, &mut w, &mut h);
        assert_eq!((w, h), (0, 0));
    }

    // =========================================================================
    // Phase 2: Defaults for unsupported operations
    // =========================================================================

    #[test]
    #[serial]
    fn test_unsupported_defaults() {
        reset_state();
        let title = cstr("W");
        let window = ng_platform_create_window(title.as_ptr(), 100, 100);
        assert!(ng_platform_create_slider(0.0, 1.0).is_null());
        assert_eq!(ng_platform_slider_get_value(window), 0.0);
        assert_eq!(ng_platform_slider_set_value(window, 0.5), NG_ERROR_UNSUPPORTED);
        assert_eq!(ng_platform_checkbox_get_checked(window), 0);
        assert_eq!(ng_platform_combo_box_get_selected(window), -1);
        assert_eq!(ng_platform_tab_bar_get_selected(window), -1);
        assert_eq!(ng_platform_sidebar_list_get_selected(window), -1);
        assert_eq!(ng_platform_get_scale_factor(std::ptr::null_mut()), 1.0);
    }

    // =========================================================================
    // Phase 3: Layout through the C ABI
    // =========================================================================

    #[test]
    #[serial]
    fn test_form_layout() {
        reset_state();
        let title = cstr("Form");
        let window = ng_platform_create_window(title.as_ptr(), 500, 400);
        let form = ng_platform_create_box(1);
        let name = cstr("Name:");
        let label = ng_platform_create_label(name.as_ptr());
        let field = ng_platform_create_text_field();
        assert_eq!(ng_platform_box_add(form, label, 0.0), NG_SUCCESS);
        assert_eq!(ng_platform_box_add(form, field, 1.0), NG_SUCCESS);
        assert_eq!(ng_platform_set_window_content(window, form), NG_SUCCESS);
        assert_eq!(ng_platform_window_get_content_view(window), form);

        let split = ng_platform_create_split_view(0);
        assert_eq!(ng_platform_split_view_set_divider_position(split, 1, 10.0), NG_ERROR_INVALID_PARAMETER);
    }

    #[test]
    #[serial]
    fn test_text_content_round_trip() {
        reset_state();
        let field = ng_platform_create_text_field();
        let content = cstr("héllo");
        assert_eq!(ng_platform_set_text_content(field, content.as_ptr()), NG_SUCCESS);
        let out = ng_platform_get_text_content(field);
        assert!(!out.is_null());
        assert_eq!(unsafe { CStr::from_ptr(out) }.to_str().unwrap(), "héllo");
        ng_platform_free_text_content(out);
        ng_platform_free_text_content(std::ptr::null_mut());
        assert!(ng_platform_get_text_content(std::ptr::null_mut()).is_null());
    }

    #[test]
    #[serial]
    fn test_canvas_buffer_and_size() {
        reset_state();
        let canvas = ng_platform_create_canvas(2, 2);
        let pixels = [0u8; 16];
        ng_platform_canvas_update_buffer(canvas, pixels.as_ptr(), 16, 2, 2);
        let (mut w, mut h): (c_uint, c_uint) = (0, 0);
        ng_platform_canvas_get_size(canvas, &mut w, &mut h);
        assert_eq!((w, h), (2, 2));
        assert_eq!(ng_platform_canvas_get_native_handle(canvas), canvas);
        assert!(ng_platform_canvas_get_window(canvas).is_null());
    }

    #[test]
    #[serial]
    fn test_menus() {
        reset_state();
        let title = cstr("W");
        let window = ng_platform_create_window(title.as_ptr(), 100, 100);
        let menu = ng_platform_create_menu();
        let item = cstr("Open");
        assert_eq!(ng_platform_add_menu_item(menu, item.as_ptr(), 1), NG_SUCCESS);
        assert_eq!(ng_platform_add_menu_item(menu, std::ptr::null(), 2), NG_ERROR_INVALID_PARAMETER);
        assert_eq!(ng_platform_add_menu_separator(menu), NG_SUCCESS);
        assert!(!ng_platform_create_submenu(menu, item.as_ptr()).is_null());
        assert_eq!(ng_platform_attach_menu(window, menu), NG_SUCCESS);
        assert_eq!(ng_platform_attach_menu(window, std::ptr::null_mut()), NG_ERROR_INVALID_HANDLE);
    }

    // =========================================================================
    // Phase 4: Events
    // =========================================================================

    #[test]
    #[serial]
    fn test_poll_empty_queue() {
        reset_state();
        let data = poll();
        assert_eq!(data.event_type, NG_EVENT_NONE);
        assert_eq!(ng_platform_poll_event(std::ptr::null_mut()), NG_EVENT_NONE);
    }

    #[test]
    #[serial]
    fn test_invoked_events_are_polled_in_order() {
        reset_state();
        let title = cstr("W");
        let window = ng_platform_create_window(title.as_ptr(), 100, 100);
        ng_invoke_key_event(window, KeyCode::Escape.to_raw(), 1, ModifierFlags::SHIFT.bits());
        let text = cstr("é");
        ng_invoke_text_input(window, text.as_ptr());
        ng_invoke_button_callback(7);
        ng_invoke_key_event(std::ptr::null_mut(), 0, 1, 0);

        let key = poll();
        assert_eq!(key.event_type, NG_EVENT_KEY);
        assert_eq!(key.window, window);
        assert_eq!(key.key, KeyCode::Escape.to_raw());
        assert_eq!((key.active, key.modifiers), (1, 1));

        let input = poll();
        assert_eq!(input.event_type, NG_EVENT_TEXT_INPUT);
        assert_eq!(text_of(&input), "é");
        assert_eq!(input.text_len, "é".len());

        let button = poll();
        assert_eq!((button.event_type, button.widget_id), (NG_EVENT_BUTTON, 7));
        assert!(button.window.is_null());
        assert_eq!(poll().event_type, NG_EVENT_NONE);
    }

    #[test]
    #[serial]
    fn test_lifecycle_requires_subscription() {
        reset_state();
        let title = cstr("W");
        let window = ng_platform_create_window(title.as_ptr(), 100, 100);
        ng_invoke_lifecycle_callback(window, LifecycleEvent::Minimized.id());
        assert_eq!(poll().event_type, NG_EVENT_NONE);

        ng_platform_window_set_lifecycle_callback(window);
        ng_invoke_lifecycle_callback(window, LifecycleEvent::Minimized.id());
        ng_invoke_lifecycle_callback(window, 99);
        let data = poll();
        assert_eq!(data.event_type, NG_EVENT_LIFECYCLE);
        assert_eq!(data.lifecycle, LifecycleEvent::Minimized.id());
        assert_eq!(poll().event_type, NG_EVENT_NONE);
    }

    static SCALE_SEEN: Mutex<Vec<f32>> = parking_lot::const_mutex(Vec::new());

    extern "C" fn record_scale(_window: *mut c_void, scale: c_float) {
        SCALE_SEEN.lock().push(scale);
    }

    #[test]
    #[serial]
    fn test_scale_factor_callback() {
        reset_state();
        SCALE_SEEN.lock().clear();
        let title = cstr("W");
        let window = ng_platform_create_window(title.as_ptr(), 100, 100);
        ng_platform_window_set_scale_factor_callback(window, Some(record_scale));
        ng_invoke_scale_factor_changed(window, 1.0);
        ng_invoke_scale_factor_changed(window, 1.5);

        let data = poll();
        assert_eq!(data.event_type, NG_EVENT_SCALE_FACTOR);
        assert_eq!(data.scale_factor, 1.5);
        assert_eq!(*SCALE_SEEN.lock(), vec![1.5]);
    }

    #[test]
    #[serial]
    fn test_locked_cursor_reports_raw_motion() {
        reset_state();
        let title = cstr("W");
        let window = ng_platform_create_window(title.as_ptr(), 100, 100);
        ng_invoke_raw_mouse_motion(window, 1.0, 1.0);
        assert_eq!(poll().event_type, NG_EVENT_NONE);

        assert_eq!(ng_platform_window_set_cursor_grab(window, 2), NG_SUCCESS);
        ng_invoke_raw_mouse_motion(window, 3.0, -2.0);
        let data = poll();
        assert_eq!(data.event_type, NG_EVENT_RAW_MOUSE_MOTION);
        assert_eq!((data.delta_x, data.delta_y), (3.0, -2.0));
    }

    #[test]
    #[serial]
    fn test_native_vocabulary_switch() {
        reset_state();
        let title = cstr("W");
        let window = ng_platform_create_window(title.as_ptr(), 100, 100);
        assert_eq!(ng_platform_set_input_family(2), NG_SUCCESS);
        assert_eq!(ng_platform_set_input_family(9), NG_ERROR_INVALID_PARAMETER);
        // Win32 VK_RETURN with MOD_CONTROL.
        ng_invoke_native_key_event(window, 0x0D, 1, 0x0002);
        let data = poll();
        assert_eq!(data.key, KeyCode::Enter.to_raw());
        assert_eq!(data.modifiers, ModifierFlags::CONTROL.bits());
    }

    #[test]
    #[serial]
    fn test_widget_selection_events() {
        reset_state();
        ng_invoke_tab_bar_selected(3, 1);
        ng_invoke_sidebar_list_selected(4, 2);
        let content = cstr("abc");
        ng_invoke_text_callback(5, content.as_ptr());

        let tab = poll();
        assert_eq!((tab.event_type, tab.widget_id, tab.index), (NG_EVENT_TAB_SELECTED, 3, 1));
        let side = poll();
        assert_eq!((side.event_type, side.widget_id, side.index), (NG_EVENT_SIDEBAR_SELECTED, 4, 2));
        let text = poll();
        assert_eq!(text.event_type, NG_EVENT_TEXT_CHANGED);
        assert_eq!(text_of(&text), "abc");
    }

    #[test]
    #[serial]
    fn test_logging_accepts_null() {
        let msg = cstr("from native");
        ng_log_info(msg.as_ptr());
        ng_log_error(std::ptr::null());
        ng_log_trace(msg.as_ptr());
    }

    #[test]
    #[serial]
    fn test_register_after_selection_is_ignored() {
        reset_state();
        assert!(!register_ops(Arc::new(crate::backend::HeadlessBackend::new(&Config::headless()))));
    }
}
