//! Box and split layout over an abstract widget tree.
//!
//! # Architecture
//!
//! ```text
//! box_add / set_window_content / resize
//!         ↓
//!   LayoutTree (kind, frame, text, children)
//!         ↓
//!   BoxLayout / SplitLayout  ←  TextMeasurer (cosmic-text)
//!         ↓
//!   dirty frames → GeometryAdapter → native widgets
//! ```
//!
//! The engines only read and write frames in the tree. Pushing those frames
//! onto real widgets is the adapter's job, so every layout rule can be tested
//! without a windowing system.

mod boxes;
mod split;
mod text;
mod tree;

pub use boxes::BoxLayout;
pub use split::{clamp_divider, SplitLayout, SPLIT_MIN_PANE};
pub use text::{CosmicTextMeasurer, FixedAdvanceMeasurer, TextMeasurer};
pub use tree::{LayoutTree, Node, NodeKind, SplitState, WindowChrome};

pub use taffy::geometry::Size;

use crate::error::{NgError, NgResult};
use crate::handle::Handle;

// =============================================================================
// Geometry
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

impl Orientation {
    /// C ABI convention: non-zero means vertical.
    pub fn from_vertical_flag(is_vertical: i32) -> Self {
        if is_vertical != 0 {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }
}

/// Position relative to the parent's origin plus size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn sized(size: Size<f32>) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn size(&self) -> Size<f32> {
        Size { width: self.width, height: self.height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Constants driving the box layout rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub padding: f32,
    pub spacing: f32,
    pub min_button: Size<f32>,
    /// Added above and below a wrapped label's measured text.
    pub label_padding: f32,
    pub min_text_input_width: f32,
    pub min_label_width: f32,
    pub min_label_height: f32,
    /// Used when text cannot be measured.
    pub fallback_text: Size<f32>,
    /// Used when a menu bar's rendered height is unknown.
    pub fallback_menu_height: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            padding: 12.0,
            spacing: 8.0,
            min_button: Size { width: 80.0, height: 32.0 },
            label_padding: 4.0,
            min_text_input_width: 100.0,
            min_label_width: 50.0,
            min_label_height: 20.0,
            fallback_text: Size { width: 100.0, height: 20.0 },
            fallback_menu_height: 20.0,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Default extent of a freshly created container or unmeasured widget.
const DEFAULT_WIDGET_SIZE: Size<f32> = Size { width: 100.0, height: 100.0 };
const TEXT_INPUT_SIZE: Size<f32> = Size { width: 200.0, height: 24.0 };
/// Space around a button caption.
const BUTTON_INSET: Size<f32> = Size { width: 16.0, height: 8.0 };

/// Owns the layout metrics and text measurer and routes layout triggers to
/// the box or split rules.
pub struct LayoutEngine {
    metrics: LayoutMetrics,
    measurer: Box<dyn TextMeasurer>,
}

impl LayoutEngine {
    pub fn new(metrics: LayoutMetrics, measurer: Box<dyn TextMeasurer>) -> Self {
        Self { metrics, measurer }
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn set_measurer(&mut self, measurer: Box<dyn TextMeasurer>) {
        self.measurer = measurer;
    }

    /// Single-line text extent, falling back to the default size.
    pub fn measure(&mut self, text: &str) -> Size<f32> {
        self.measurer.measure(text).unwrap_or_else(|| {
            log::debug!("LayoutEngine: text measurement unavailable, using fallback size");
            self.metrics.fallback_text
        })
    }

    /// Size a widget of `kind` gets when it is created.
    pub fn natural_size(&mut self, kind: NodeKind, text: &str) -> Size<f32> {
        match kind {
            NodeKind::Button => {
                let caption = self.measure(text);
                Size {
                    width: caption.width + BUTTON_INSET.width,
                    height: caption.height + BUTTON_INSET.height,
                }
            }
            NodeKind::Label { .. } => self.measure(text),
            NodeKind::TextInput => TEXT_INPUT_SIZE,
            _ => DEFAULT_WIDGET_SIZE,
        }
    }

    /// Re-run layout for a container after a child was added or it resized.
    /// Non-containers and stale handles are ignored.
    pub fn relayout(&mut self, tree: &mut LayoutTree, container: Handle) {
        match tree.kind(container) {
            Some(NodeKind::Box(_)) => {
                BoxLayout::new(&self.metrics, self.measurer.as_mut()).layout(tree, container);
            }
            Some(NodeKind::Split(_)) => {
                SplitLayout::layout(tree, container);
                // Panes were resized; containers among them re-justify.
                for pane in tree.children(container).to_vec() {
                    if tree.kind(pane).is_some_and(|k| k.is_container()) {
                        self.relayout(tree, pane);
                    }
                }
            }
            Some(NodeKind::Window(chrome)) => {
                let content = chrome.content_size(&self.metrics);
                for child in tree.children(container).to_vec() {
                    tree.set_frame(child, Frame::sized(content));
                    self.relayout(tree, child);
                }
            }
            Some(_) => log::debug!("LayoutEngine::relayout: {} is not a container", container),
            None => log::warn!("LayoutEngine::relayout: invalid container {}", container),
        }
    }

    /// Make `content` the single content view of `window`, filling its
    /// client area below any menu bar.
    pub fn set_window_content(
        &mut self,
        tree: &mut LayoutTree,
        window: Handle,
        content: Handle,
    ) -> NgResult<()> {
        if tree.chrome(window).is_none() || !tree.contains(content) {
            return Err(NgError::InvalidHandle);
        }
        for old in tree.children(window).to_vec() {
            if old != content {
                tree.detach(old);
            }
        }
        tree.attach(window, content)?;
        self.relayout(tree, window);
        Ok(())
    }

    /// Record a new client size for `window` and re-lay out its content.
    pub fn resize_window(
        &mut self,
        tree: &mut LayoutTree,
        window: Handle,
        width: f32,
        height: f32,
    ) -> NgResult<()> {
        let chrome = tree.chrome_mut(window).ok_or(NgError::InvalidHandle)?;
        chrome.client = Size { width, height };
        tree.set_frame(window, Frame::new(0.0, 0.0, width, height));
        self.relayout(tree, window);
        Ok(())
    }

    /// Reserve (or release) menu bar height on `window` and re-lay out.
    pub fn set_menu_bar(
        &mut self,
        tree: &mut LayoutTree,
        window: Handle,
        rendered_height: Option<f32>,
    ) -> NgResult<()> {
        let chrome = tree.chrome_mut(window).ok_or(NgError::InvalidHandle)?;
        chrome.has_menu = true;
        chrome.menu_height = rendered_height;
        self.relayout(tree, window);
        Ok(())
    }
}

// =============================================================================
// Geometry Adapter
// =============================================================================

/// Applies computed geometry to real widgets.
pub trait GeometryAdapter: Send {
    fn set_frame(&mut self, node: Handle, frame: Frame);

    /// A label was switched from single-line to word-wrapping.
    fn enable_wrapping(&mut self, _node: Handle) {}
}

/// Push every frame changed since the last flush through `adapter`.
pub fn apply_geometry(tree: &mut LayoutTree, adapter: &mut dyn GeometryAdapter) {
    for change in tree.take_changes() {
        match tree.get(change) {
            Some(node) => {
                if node.wrap_switched {
                    adapter.enable_wrapping(change);
                }
                adapter.set_frame(change, node.frame);
            }
            None => log::trace!("apply_geometry: {} removed before flush", change),
        }
    }
    tree.clear_wrap_switches();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_edges() {
        let frame = Frame::new(12.0, 20.0, 100.0, 32.0);
        assert_eq!(frame.right(), 112.0);
        assert_eq!(frame.bottom(), 52.0);
        assert_eq!(frame.size(), Size { width: 100.0, height: 32.0 });
    }

    #[test]
    fn test_orientation_flag() {
        assert_eq!(Orientation::from_vertical_flag(1), Orientation::Vertical);
        assert_eq!(Orientation::from_vertical_flag(0), Orientation::Horizontal);
    }

    // =========================================================================
    // Engine
    // =========================================================================

    fn h(raw: usize) -> Handle {
        Handle::from_raw(raw).unwrap()
    }

    fn engine() -> LayoutEngine {
        LayoutEngine::new(LayoutMetrics::default(), Box::new(FixedAdvanceMeasurer::default()))
    }

    fn insert(engine: &mut LayoutEngine, tree: &mut LayoutTree, raw: usize, kind: NodeKind, text: &str) {
        let size = engine.natural_size(kind, text);
        tree.insert(h(raw), Node::new(kind, size).with_text(text));
    }

    #[test]
    fn test_name_field_form_fills_window() {
        let mut engine = engine();
        let mut tree = LayoutTree::new();
        tree.insert(h(1), Node::new(NodeKind::Window(WindowChrome::new(500.0, 400.0)), Size { width: 500.0, height: 400.0 }));
        insert(&mut engine, &mut tree, 2, NodeKind::Box(Orientation::Vertical), "");
        insert(&mut engine, &mut tree, 3, NodeKind::Label { wraps: false }, "Name:");
        insert(&mut engine, &mut tree, 4, NodeKind::TextInput, "");

        tree.attach(h(2), h(3)).unwrap();
        engine.relayout(&mut tree, h(2));
        tree.attach(h(2), h(4)).unwrap();
        engine.relayout(&mut tree, h(2));
        engine.set_window_content(&mut tree, h(1), h(2)).unwrap();

        let label = tree.get(h(3)).unwrap().frame;
        let field = tree.get(h(4)).unwrap().frame;
        assert_eq!((label.x, label.width), (0.0, 500.0));
        assert_eq!((field.x, field.width), (0.0, 500.0));
        // single 16px line plus 4px above and below
        assert_eq!(label.height, 16.0 + 2.0 * 4.0);
        assert_eq!(field.y, 12.0 + label.height + 8.0);
        assert_eq!(tree.get(h(2)).unwrap().frame, Frame::new(0.0, 0.0, 500.0, 400.0));
    }

    #[test]
    fn test_window_resize_rejustifies_content() {
        let mut engine = engine();
        let mut tree = LayoutTree::new();
        tree.insert(h(1), Node::new(NodeKind::Window(WindowChrome::new(500.0, 400.0)), Size { width: 500.0, height: 400.0 }));
        insert(&mut engine, &mut tree, 2, NodeKind::Box(Orientation::Vertical), "");
        insert(&mut engine, &mut tree, 3, NodeKind::TextInput, "");
        tree.attach(h(2), h(3)).unwrap();
        engine.set_window_content(&mut tree, h(1), h(2)).unwrap();

        engine.resize_window(&mut tree, h(1), 640.0, 480.0).unwrap();
        assert_eq!(tree.get(h(2)).unwrap().frame.size(), Size { width: 640.0, height: 480.0 });
        assert_eq!(tree.get(h(3)).unwrap().frame.width, 640.0);

        engine.set_menu_bar(&mut tree, h(1), None).unwrap();
        assert_eq!(tree.get(h(2)).unwrap().frame.height, 460.0);
    }

    #[test]
    fn test_split_content_relayouts_box_panes() {
        let mut engine = engine();
        let mut tree = LayoutTree::new();
        tree.insert(h(1), Node::new(NodeKind::Window(WindowChrome::new(600.0, 400.0)), Size { width: 600.0, height: 400.0 }));
        let split = NodeKind::Split(SplitState { orientation: Orientation::Horizontal, divider: 0.0 });
        insert(&mut engine, &mut tree, 2, split, "");
        insert(&mut engine, &mut tree, 3, NodeKind::Box(Orientation::Vertical), "");
        insert(&mut engine, &mut tree, 4, NodeKind::TextInput, "");
        insert(&mut engine, &mut tree, 5, NodeKind::Canvas, "");
        tree.attach(h(3), h(4)).unwrap();
        SplitLayout::add(&mut tree, h(2), h(3)).unwrap();
        SplitLayout::add(&mut tree, h(2), h(5)).unwrap();
        engine.set_window_content(&mut tree, h(1), h(2)).unwrap();

        assert_eq!(tree.get(h(3)).unwrap().frame, Frame::new(0.0, 0.0, 300.0, 400.0));
        assert_eq!(tree.get(h(4)).unwrap().frame.width, 300.0);
        assert_eq!(tree.get(h(5)).unwrap().frame, Frame::new(300.0, 0.0, 300.0, 400.0));
    }

    #[test]
    fn test_set_window_content_rejects_non_windows() {
        let mut engine = engine();
        let mut tree = LayoutTree::new();
        insert(&mut engine, &mut tree, 1, NodeKind::Box(Orientation::Vertical), "");
        insert(&mut engine, &mut tree, 2, NodeKind::Button, "OK");
        assert_eq!(engine.set_window_content(&mut tree, h(1), h(2)), Err(NgError::InvalidHandle));
        assert_eq!(engine.resize_window(&mut tree, h(1), 1.0, 1.0), Err(NgError::InvalidHandle));
    }

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(Handle, Frame)>,
        wrapped: Vec<Handle>,
    }

    impl GeometryAdapter for Recorder {
        fn set_frame(&mut self, node: Handle, frame: Frame) {
            self.frames.push((node, frame));
        }

        fn enable_wrapping(&mut self, node: Handle) {
            self.wrapped.push(node);
        }
    }

    #[test]
    fn test_apply_geometry_flushes_changes_once() {
        let mut engine = engine();
        let mut tree = LayoutTree::new();
        insert(&mut engine, &mut tree, 1, NodeKind::Box(Orientation::Vertical), "");
        insert(&mut engine, &mut tree, 2, NodeKind::Label { wraps: false }, "Hi");
        tree.attach(h(1), h(2)).unwrap();
        engine.relayout(&mut tree, h(1));

        let mut recorder = Recorder::default();
        apply_geometry(&mut tree, &mut recorder);
        assert!(recorder.frames.iter().any(|(n, f)| *n == h(2) && f.x == 0.0));
        assert_eq!(recorder.wrapped, vec![h(2)]);

        let mut again = Recorder::default();
        apply_geometry(&mut tree, &mut again);
        assert!(again.frames.is_empty());
        assert!(again.wrapped.is_empty());
    }
}
