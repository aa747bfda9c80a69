//! In-memory backend.
//!
//! Models windows, menus and the widget kinds the layout engine knows about
//! on top of a [`LayoutTree`]. Computed geometry goes to an optional
//! [`GeometryAdapter`]. Native input can be injected and is delivered on the
//! next `poll_events`, which makes the whole event path testable without a
//! windowing system. The winit backend keeps its model here too.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{NgError, NgResult};
use crate::events::{LifecycleEvent, WidgetEvent};
use crate::forward::{EventForwarder, NativeEvent};
use crate::handle::{Handle, HandleAllocator, MenuHandle};
use crate::input::GrabMode;
use crate::layout::{
    apply_geometry, FixedAdvanceMeasurer, Frame, GeometryAdapter, LayoutEngine, LayoutTree, Node,
    NodeKind, Orientation, Size, SplitLayout, SplitState, TextMeasurer, WindowChrome,
};
use crate::ops::{CanvasBuffer, PlatformOps};

// =============================================================================
// Model
// =============================================================================

/// Window state that is not geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRecord {
    pub title: String,
    pub window_type: i32,
    pub position: (i32, i32),
    pub visible: bool,
    pub focused: bool,
    pub cursor_visible: bool,
    pub grab: GrabMode,
    pub scale: f32,
    pub menu: Option<MenuHandle>,
    pub observes_scale: bool,
    pub observes_lifecycle: bool,
}

impl WindowRecord {
    fn new(title: &str, window_type: i32) -> Self {
        Self {
            title: title.to_string(),
            window_type,
            position: (0, 0),
            visible: false,
            focused: false,
            cursor_visible: true,
            grab: GrabMode::None,
            scale: 1.0,
            menu: None,
            observes_scale: false,
            observes_lifecycle: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuEntry {
    Item { title: String, id: u32 },
    Separator,
    Submenu { title: String, menu: MenuHandle },
}

/// Host-assigned id and flags of an interactive widget.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct WidgetRecord {
    id: Option<u32>,
    editable: bool,
    multiline: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CanvasRecord {
    pub buffer: Option<CanvasBuffer>,
    /// Regions invalidated since the last redraw; `None` entries are full redraws.
    pub damage: Vec<Option<Frame>>,
}

struct Model {
    handles: HandleAllocator,
    tree: LayoutTree,
    engine: LayoutEngine,
    windows: HashMap<Handle, WindowRecord>,
    menus: HashMap<MenuHandle, Vec<MenuEntry>>,
    widgets: HashMap<Handle, WidgetRecord>,
    canvases: HashMap<Handle, CanvasRecord>,
    adapter: Option<Box<dyn GeometryAdapter>>,
}

impl Model {
    fn window(&self, window: Handle) -> NgResult<&WindowRecord> {
        self.windows.get(&window).ok_or(NgError::InvalidHandle)
    }

    fn window_mut(&mut self, window: Handle) -> NgResult<&mut WindowRecord> {
        self.windows.get_mut(&window).ok_or(NgError::InvalidHandle)
    }

    fn kind_of(&self, handle: Handle, matches: impl Fn(&NodeKind) -> bool) -> NgResult<NodeKind> {
        match self.tree.kind(handle) {
            Some(kind) if matches(&kind) => Ok(kind),
            _ => Err(NgError::InvalidHandle),
        }
    }

    fn create_node(&mut self, kind: NodeKind, text: &str) -> Handle {
        let size = self.engine.natural_size(kind, text);
        let handle = self.handles.handle();
        self.tree.insert(handle, Node::new(kind, size).with_text(text));
        handle
    }

    fn create_widget(&mut self, kind: NodeKind, text: &str, record: WidgetRecord) -> Handle {
        let handle = self.create_node(kind, text);
        self.widgets.insert(handle, record);
        handle
    }

    /// Re-lay out the container holding `handle`, if any.
    fn relayout_parent(&mut self, handle: Handle) {
        if let Some(parent) = self.tree.parent(handle) {
            self.engine.relayout(&mut self.tree, parent);
        }
    }

    /// Hand changed frames to the adapter, or discard them when none is set.
    fn settle(&mut self) {
        match self.adapter.as_deref_mut() {
            Some(adapter) => apply_geometry(&mut self.tree, adapter),
            None => {
                self.tree.take_changes();
                self.tree.clear_wrap_switches();
            }
        }
    }

    /// Keep model state in line with what the native side reported.
    fn observe(&mut self, event: &NativeEvent) {
        match *event {
            NativeEvent::Focus { window, focused } => {
                if let Some(record) = self.windows.get_mut(&window) {
                    record.focused = focused;
                }
            }
            NativeEvent::ScaleFactor { window, scale } => {
                if let Some(record) = self.windows.get_mut(&window) {
                    record.scale = scale;
                }
            }
            _ => {}
        }
    }
}

// =============================================================================
// Backend
// =============================================================================

pub struct HeadlessBackend {
    model: Mutex<Model>,
    forwarder: Mutex<Option<Arc<EventForwarder>>>,
    pending: Mutex<VecDeque<NativeEvent>>,
}

impl HeadlessBackend {
    /// Fixed-advance text measurement keeps geometry deterministic.
    pub fn new(config: &Config) -> Self {
        Self::with_measurer(config, Box::new(FixedAdvanceMeasurer::default()))
    }

    pub fn with_measurer(config: &Config, measurer: Box<dyn TextMeasurer>) -> Self {
        Self {
            model: Mutex::new(Model {
                handles: HandleAllocator::new(),
                tree: LayoutTree::new(),
                engine: LayoutEngine::new(config.layout, measurer),
                windows: HashMap::new(),
                menus: HashMap::new(),
                widgets: HashMap::new(),
                canvases: HashMap::new(),
                adapter: None,
            }),
            forwarder: Mutex::new(None),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn set_geometry_adapter(&self, adapter: Box<dyn GeometryAdapter>) {
        self.model.lock().adapter = Some(adapter);
    }

    // =========================================================================
    // Event injection
    // =========================================================================

    /// Queue a native event for the next `poll_events`.
    pub fn inject(&self, event: NativeEvent) {
        self.pending.lock().push_back(event);
    }

    /// Apply a native event to the model and forward it now.
    pub fn deliver(&self, event: NativeEvent) {
        self.model.lock().observe(&event);
        let forwarder = self.forwarder.lock().clone();
        match forwarder {
            Some(forwarder) => forwarder.dispatch(event),
            None => log::debug!("HeadlessBackend: dropping {:?}, backend not initialized", event),
        }
    }

    /// Queue what the native toolkit reports when the user activates a widget.
    pub fn activate(&self, widget: Handle) -> NgResult<()> {
        let model = self.model.lock();
        let record = model.widgets.get(&widget).copied().ok_or(NgError::InvalidHandle)?;
        let id = record.id.ok_or(NgError::InvalidParameter("widget has no id"))?;
        let event = match model.tree.kind(widget) {
            Some(NodeKind::Button) => WidgetEvent::Button { id },
            Some(NodeKind::TextInput) if !record.editable => {
                return Err(NgError::InvalidParameter("text view is read-only"));
            }
            Some(NodeKind::TextInput) => {
                let text = model.tree.get(widget).map(|n| n.text.clone()).unwrap_or_default();
                if record.multiline {
                    WidgetEvent::TextViewChanged { id, text }
                } else {
                    WidgetEvent::TextChanged { id, text }
                }
            }
            _ => return Err(NgError::InvalidParameter("widget cannot be activated")),
        };
        drop(model);
        self.inject(NativeEvent::Widget(event));
        Ok(())
    }

    /// Queue a menu activation for item `id` of `menu`.
    pub fn activate_menu_item(&self, menu: MenuHandle, id: u32) -> NgResult<()> {
        let model = self.model.lock();
        let entries = model.menus.get(&menu).ok_or(NgError::InvalidHandle)?;
        if !entries.iter().any(|e| matches!(e, MenuEntry::Item { id: item, .. } if *item == id)) {
            return Err(NgError::InvalidParameter("no such menu item"));
        }
        drop(model);
        self.inject(NativeEvent::Widget(WidgetEvent::MenuItem { id }));
        Ok(())
    }

    /// Simulate the window moving to a display with another scale factor.
    pub fn set_scale_factor(&self, window: Handle, scale: f32) -> NgResult<()> {
        self.model.lock().window(window)?;
        self.inject(NativeEvent::ScaleFactor { window, scale });
        Ok(())
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn frame(&self, handle: Handle) -> Option<Frame> {
        self.model.lock().tree.get(handle).map(|n| n.frame)
    }

    pub fn children(&self, handle: Handle) -> Vec<Handle> {
        self.model.lock().tree.children(handle).to_vec()
    }

    pub fn window(&self, window: Handle) -> Option<WindowRecord> {
        self.model.lock().windows.get(&window).cloned()
    }

    pub fn windows(&self) -> Vec<Handle> {
        let mut handles: Vec<Handle> = self.model.lock().windows.keys().copied().collect();
        handles.sort();
        handles
    }

    pub fn menu_entries(&self, menu: MenuHandle) -> Option<Vec<MenuEntry>> {
        self.model.lock().menus.get(&menu).cloned()
    }

    pub fn canvas(&self, canvas: Handle) -> Option<CanvasRecord> {
        self.model.lock().canvases.get(&canvas).cloned()
    }

    /// Record a client size reported by the native window, without echoing it
    /// back to the native side.
    pub fn client_resized(&self, window: Handle, width: u32, height: u32) -> NgResult<()> {
        let mut model = self.model.lock();
        let Model { engine, tree, .. } = &mut *model;
        engine.resize_window(tree, window, width as f32, height as f32)?;
        model.settle();
        Ok(())
    }

    pub fn window_moved(&self, window: Handle, x: i32, y: i32) -> NgResult<()> {
        self.model.lock().window_mut(window)?.position = (x, y);
        Ok(())
    }

    fn invalidate(&self, handle: Handle, op: &'static str, matches: impl Fn(&NodeKind) -> bool) -> NgResult<()> {
        self.model.lock().kind_of(handle, matches)?;
        log::trace!("HeadlessBackend::{}: {}", op, handle);
        Ok(())
    }
}

fn positive_size(width: i32, height: i32) -> NgResult<Size<f32>> {
    if width <= 0 || height <= 0 {
        return Err(NgError::InvalidParameter("size must be positive"));
    }
    Ok(Size { width: width as f32, height: height as f32 })
}

fn is_text(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::TextInput)
}

fn is_label(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Label { .. })
}

impl PlatformOps for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn init(&self, forwarder: Arc<EventForwarder>) -> NgResult<()> {
        *self.forwarder.lock() = Some(forwarder);
        log::debug!("HeadlessBackend: initialized");
        Ok(())
    }

    fn cleanup(&self) {
        self.pending.lock().clear();
        *self.forwarder.lock() = None;
    }

    /// There is no native loop; pending input is delivered and control returns.
    fn run(&self) -> NgResult<()> {
        log::debug!("HeadlessBackend::run: no native loop");
        self.poll_events()
    }

    fn poll_events(&self) -> NgResult<()> {
        loop {
            // Popped one at a time so handlers may inject more.
            let Some(event) = self.pending.lock().pop_front() else {
                return Ok(());
            };
            self.deliver(event);
        }
    }

    // =========================================================================
    // Windows
    // =========================================================================

    fn create_window(&self, title: &str, width: i32, height: i32) -> NgResult<Handle> {
        self.create_window_with_type(title, width, height, 0)
    }

    fn create_window_with_type(&self, title: &str, width: i32, height: i32, window_type: i32) -> NgResult<Handle> {
        let size = positive_size(width, height)?;
        let mut model = self.model.lock();
        let handle = model.handles.handle();
        let chrome = WindowChrome::new(size.width, size.height);
        model.tree.insert(handle, Node::new(NodeKind::Window(chrome), size).with_text(title));
        model.windows.insert(handle, WindowRecord::new(title, window_type));
        model.settle();
        log::debug!("HeadlessBackend: created window {} ({}x{})", handle, width, height);
        Ok(handle)
    }

    fn destroy_window(&self, window: Handle) -> NgResult<()> {
        let mut model = self.model.lock();
        model.windows.remove(&window).ok_or(NgError::InvalidHandle)?;
        for removed in model.tree.remove(window) {
            model.widgets.remove(&removed);
            model.canvases.remove(&removed);
        }
        Ok(())
    }

    fn window_set_title(&self, window: Handle, title: &str) -> NgResult<()> {
        let mut model = self.model.lock();
        model.window_mut(window)?.title = title.to_string();
        if let Some(node) = model.tree.get_mut(window) {
            node.text = title.to_string();
        }
        Ok(())
    }

    fn window_set_size(&self, window: Handle, width: i32, height: i32) -> NgResult<()> {
        let size = positive_size(width, height)?;
        let mut model = self.model.lock();
        let Model { engine, tree, .. } = &mut *model;
        engine.resize_window(tree, window, size.width, size.height)?;
        model.settle();
        Ok(())
    }

    fn window_get_size(&self, window: Handle) -> NgResult<(i32, i32)> {
        let chrome = self.model.lock().tree.chrome(window).ok_or(NgError::InvalidHandle)?;
        Ok((chrome.client.width as i32, chrome.client.height as i32))
    }

    fn window_request_close(&self, window: Handle) -> NgResult<()> {
        self.model.lock().window(window)?;
        self.inject(NativeEvent::Lifecycle { window, event: LifecycleEvent::WindowWillClose });
        Ok(())
    }

    fn window_is_focused(&self, window: Handle) -> NgResult<bool> {
        Ok(self.model.lock().window(window)?.focused)
    }

    fn window_set_cursor_visible(&self, window: Handle, visible: bool) -> NgResult<()> {
        self.model.lock().window_mut(window)?.cursor_visible = visible;
        Ok(())
    }

    fn window_set_cursor_grab(&self, window: Handle, mode: GrabMode) -> NgResult<()> {
        self.model.lock().window_mut(window)?.grab = mode;
        Ok(())
    }

    fn window_get_content_view(&self, window: Handle) -> NgResult<Handle> {
        let model = self.model.lock();
        model.window(window)?;
        model
            .tree
            .children(window)
            .first()
            .copied()
            .ok_or(NgError::InvalidParameter("window has no content view"))
    }

    fn window_show(&self, window: Handle) -> NgResult<()> {
        let mut model = self.model.lock();
        let record = model.window_mut(window)?;
        record.visible = true;
        record.focused = true;
        Ok(())
    }

    fn window_hide(&self, window: Handle) -> NgResult<()> {
        let mut model = self.model.lock();
        let record = model.window_mut(window)?;
        record.visible = false;
        record.focused = false;
        Ok(())
    }

    fn window_is_visible(&self, window: Handle) -> NgResult<bool> {
        Ok(self.model.lock().window(window)?.visible)
    }

    fn window_set_position(&self, window: Handle, x: i32, y: i32) -> NgResult<()> {
        self.window_moved(window, x, y)
    }

    fn window_get_position(&self, window: Handle) -> NgResult<(i32, i32)> {
        Ok(self.model.lock().window(window)?.position)
    }

    fn get_scale_factor(&self, window: Handle) -> NgResult<f32> {
        Ok(self.model.lock().window(window)?.scale)
    }

    fn window_set_scale_factor_callback(&self, window: Handle) -> NgResult<()> {
        self.model.lock().window_mut(window)?.observes_scale = true;
        Ok(())
    }

    fn window_set_lifecycle_callback(&self, window: Handle) -> NgResult<()> {
        self.model.lock().window_mut(window)?.observes_lifecycle = true;
        Ok(())
    }

    // =========================================================================
    // Menus
    // =========================================================================

    fn create_menu(&self) -> NgResult<MenuHandle> {
        let mut model = self.model.lock();
        let menu = model.handles.menu();
        model.menus.insert(menu, Vec::new());
        Ok(menu)
    }

    fn destroy_menu(&self, menu: MenuHandle) -> NgResult<()> {
        let mut model = self.model.lock();
        let entries = model.menus.remove(&menu).ok_or(NgError::InvalidHandle)?;
        let mut orphans: Vec<MenuHandle> = entries
            .iter()
            .filter_map(|e| match e {
                MenuEntry::Submenu { menu, .. } => Some(*menu),
                _ => None,
            })
            .collect();
        while let Some(sub) = orphans.pop() {
            if let Some(entries) = model.menus.remove(&sub) {
                orphans.extend(entries.iter().filter_map(|e| match e {
                    MenuEntry::Submenu { menu, .. } => Some(*menu),
                    _ => None,
                }));
            }
        }

        let attached: Vec<Handle> = model
            .windows
            .iter()
            .filter(|(_, record)| record.menu == Some(menu))
            .map(|(handle, _)| *handle)
            .collect();
        for window in attached {
            if let Some(record) = model.windows.get_mut(&window) {
                record.menu = None;
            }
            if let Some(chrome) = model.tree.chrome_mut(window) {
                chrome.has_menu = false;
                chrome.menu_height = None;
            }
            let Model { engine, tree, .. } = &mut *model;
            engine.relayout(tree, window);
        }
        model.settle();
        Ok(())
    }

    fn attach_menu(&self, window: Handle, menu: MenuHandle) -> NgResult<()> {
        let mut model = self.model.lock();
        if !model.menus.contains_key(&menu) {
            return Err(NgError::InvalidHandle);
        }
        model.window_mut(window)?.menu = Some(menu);
        let Model { engine, tree, .. } = &mut *model;
        // No rendered menu bar to measure here.
        engine.set_menu_bar(tree, window, None)?;
        model.settle();
        Ok(())
    }

    fn add_menu_item(&self, menu: MenuHandle, title: &str, id: u32) -> NgResult<()> {
        let mut model = self.model.lock();
        let entries = model.menus.get_mut(&menu).ok_or(NgError::InvalidHandle)?;
        entries.push(MenuEntry::Item { title: title.to_string(), id });
        Ok(())
    }

    fn add_menu_separator(&self, menu: MenuHandle) -> NgResult<()> {
        let mut model = self.model.lock();
        model.menus.get_mut(&menu).ok_or(NgError::InvalidHandle)?.push(MenuEntry::Separator);
        Ok(())
    }

    fn create_submenu(&self, parent: MenuHandle, title: &str) -> NgResult<MenuHandle> {
        let mut model = self.model.lock();
        if !model.menus.contains_key(&parent) {
            return Err(NgError::InvalidHandle);
        }
        let submenu = model.handles.menu();
        model.menus.insert(submenu, Vec::new());
        if let Some(entries) = model.menus.get_mut(&parent) {
            entries.push(MenuEntry::Submenu { title: title.to_string(), menu: submenu });
        }
        Ok(submenu)
    }

    // =========================================================================
    // Containers and basic widgets
    // =========================================================================

    fn create_button(&self, title: &str, id: u32) -> NgResult<Handle> {
        let mut model = self.model.lock();
        let record = WidgetRecord { id: Some(id), ..Default::default() };
        Ok(model.create_widget(NodeKind::Button, title, record))
    }

    fn button_invalidate(&self, button: Handle) -> NgResult<()> {
        self.invalidate(button, "button_invalidate", |k| matches!(k, NodeKind::Button))
    }

    fn create_label(&self, text: &str) -> NgResult<Handle> {
        Ok(self.model.lock().create_node(NodeKind::Label { wraps: false }, text))
    }

    fn label_invalidate(&self, label: Handle) -> NgResult<()> {
        self.invalidate(label, "label_invalidate", is_label)
    }

    fn create_box(&self, orientation: Orientation) -> NgResult<Handle> {
        Ok(self.model.lock().create_node(NodeKind::Box(orientation), ""))
    }

    fn box_invalidate(&self, container: Handle) -> NgResult<()> {
        let mut model = self.model.lock();
        model.kind_of(container, |k| matches!(k, NodeKind::Box(_)))?;
        let Model { engine, tree, .. } = &mut *model;
        engine.relayout(tree, container);
        model.settle();
        Ok(())
    }

    fn box_add(&self, container: Handle, element: Handle, weight: f32) -> NgResult<()> {
        let mut model = self.model.lock();
        model.kind_of(container, |k| matches!(k, NodeKind::Box(_)))?;
        log::trace!("HeadlessBackend::box_add: {} <- {} (weight {})", container, element, weight);
        model.tree.attach(container, element)?;
        let Model { engine, tree, .. } = &mut *model;
        engine.relayout(tree, container);
        model.settle();
        Ok(())
    }

    fn set_window_content(&self, window: Handle, content: Handle) -> NgResult<()> {
        let mut model = self.model.lock();
        let Model { engine, tree, .. } = &mut *model;
        engine.set_window_content(tree, window, content)?;
        model.settle();
        Ok(())
    }

    fn create_split_view(&self, orientation: Orientation) -> NgResult<Handle> {
        let kind = NodeKind::Split(SplitState { orientation, divider: 0.0 });
        Ok(self.model.lock().create_node(kind, ""))
    }

    fn split_view_add(&self, split: Handle, element: Handle) -> NgResult<()> {
        let mut model = self.model.lock();
        SplitLayout::add(&mut model.tree, split, element)?;
        let Model { engine, tree, .. } = &mut *model;
        engine.relayout(tree, split);
        model.settle();
        Ok(())
    }

    fn split_view_set_divider_position(&self, split: Handle, index: i32, position: f32) -> NgResult<()> {
        let mut model = self.model.lock();
        SplitLayout::set_divider(&mut model.tree, split, index, position)?;
        let Model { engine, tree, .. } = &mut *model;
        engine.relayout(tree, split);
        model.settle();
        Ok(())
    }

    // =========================================================================
    // Text
    // =========================================================================

    fn create_text_editor(&self, id: u32) -> NgResult<Handle> {
        let record = WidgetRecord { id: Some(id), editable: true, multiline: true };
        Ok(self.model.lock().create_widget(NodeKind::TextInput, "", record))
    }

    fn text_editor_invalidate(&self, editor: Handle) -> NgResult<()> {
        self.invalidate(editor, "text_editor_invalidate", is_text)
    }

    fn create_text_view(&self, editable: bool, id: u32) -> NgResult<Handle> {
        let record = WidgetRecord { id: Some(id), editable, multiline: true };
        Ok(self.model.lock().create_widget(NodeKind::TextInput, "", record))
    }

    fn text_view_invalidate(&self, view: Handle) -> NgResult<()> {
        self.invalidate(view, "text_view_invalidate", is_text)
    }

    fn create_text_field(&self) -> NgResult<Handle> {
        let record = WidgetRecord { id: None, editable: true, multiline: false };
        Ok(self.model.lock().create_widget(NodeKind::TextInput, "", record))
    }

    fn set_text_content(&self, widget: Handle, content: &str) -> NgResult<()> {
        let mut model = self.model.lock();
        let kind = model.kind_of(widget, |k| is_text(k) || is_label(k))?;
        if let Some(node) = model.tree.get_mut(widget) {
            node.text = content.to_string();
        }
        if is_label(&kind) {
            // A label's natural size follows its text; its box decides the rest.
            let size = model.engine.natural_size(kind, content);
            model.tree.set_size(widget, size);
            model.relayout_parent(widget);
            model.settle();
        }
        Ok(())
    }

    fn get_text_content(&self, widget: Handle) -> NgResult<String> {
        let model = self.model.lock();
        model.kind_of(widget, |k| is_text(k) || is_label(k))?;
        Ok(model.tree.get(widget).map(|n| n.text.clone()).unwrap_or_default())
    }

    // =========================================================================
    // Canvas
    // =========================================================================

    fn create_canvas(&self, width: i32, height: i32) -> NgResult<Handle> {
        let size = positive_size(width, height)?;
        let mut model = self.model.lock();
        let handle = model.handles.handle();
        model.tree.insert(handle, Node::new(NodeKind::Canvas, size));
        model.canvases.insert(handle, CanvasRecord::default());
        Ok(handle)
    }

    fn canvas_invalidate(&self, canvas: Handle) -> NgResult<()> {
        let mut model = self.model.lock();
        let record = model.canvases.get_mut(&canvas).ok_or(NgError::InvalidHandle)?;
        record.damage.push(None);
        Ok(())
    }

    fn canvas_invalidate_rect(&self, canvas: Handle, x: f32, y: f32, width: f32, height: f32) -> NgResult<()> {
        if width < 0.0 || height < 0.0 {
            return Err(NgError::InvalidParameter("negative invalidation rectangle"));
        }
        let mut model = self.model.lock();
        let record = model.canvases.get_mut(&canvas).ok_or(NgError::InvalidHandle)?;
        record.damage.push(Some(Frame::new(x, y, width, height)));
        Ok(())
    }

    fn canvas_update_buffer(&self, canvas: Handle, buffer: CanvasBuffer) -> NgResult<()> {
        if !buffer.is_complete() {
            return Err(NgError::InvalidParameter("pixel buffer smaller than width * height * 4"));
        }
        let mut model = self.model.lock();
        let record = model.canvases.get_mut(&canvas).ok_or(NgError::InvalidHandle)?;
        record.buffer = Some(buffer);
        record.damage.push(None);
        Ok(())
    }

    fn canvas_get_size(&self, canvas: Handle) -> NgResult<(u32, u32)> {
        let model = self.model.lock();
        model.kind_of(canvas, |k| matches!(k, NodeKind::Canvas))?;
        let frame = model.tree.get(canvas).map(|n| n.frame).unwrap_or_default();
        Ok((frame.width.max(0.0) as u32, frame.height.max(0.0) as u32))
    }

    fn canvas_get_window(&self, canvas: Handle) -> NgResult<Handle> {
        let model = self.model.lock();
        model.kind_of(canvas, |k| matches!(k, NodeKind::Canvas))?;
        model
            .tree
            .window_of(canvas)
            .ok_or(NgError::InvalidParameter("canvas is not in a window"))
    }

    /// There is no native view; the canvas stands for itself.
    fn canvas_get_native_handle(&self, canvas: Handle) -> NgResult<Handle> {
        self.model.lock().kind_of(canvas, |k| matches!(k, NodeKind::Canvas))?;
        Ok(canvas)
    }
}
