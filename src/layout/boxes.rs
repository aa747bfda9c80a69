//! Vertical/horizontal box layout by direct child positioning.
//!
//! Children are walked in sibling order with a cursor starting at
//! (padding, padding). In a vertical box, text inputs and labels are stretched
//! to the box width at x = 0 and labels are re-measured with word wrap at that
//! width. Buttons never go below the minimum control size. In a horizontal box
//! a canvas takes the remaining width and the full inner height.
//!
//! A box whose parent is a window is forced to the window's content area and
//! laid out a second time so wrapped labels see the final width. A box nested
//! in another box shrink-wraps around its children and then re-lays out the
//! parent.

use super::{Frame, LayoutMetrics, LayoutTree, NodeKind, Orientation, Size, TextMeasurer};
use crate::handle::Handle;

/// Right and bottom content edges reached by a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Extents {
    max_x: f32,
    max_y: f32,
}

pub struct BoxLayout<'a> {
    metrics: &'a LayoutMetrics,
    measurer: &'a mut dyn TextMeasurer,
}

impl<'a> BoxLayout<'a> {
    pub fn new(metrics: &'a LayoutMetrics, measurer: &'a mut dyn TextMeasurer) -> Self {
        Self { metrics, measurer }
    }

    /// Re-run layout for `container` after a child was added or it was resized.
    /// Anything that is not a live box is ignored.
    pub fn layout(&mut self, tree: &mut LayoutTree, container: Handle) {
        let Some(node) = tree.get(container) else {
            log::warn!("BoxLayout::layout: invalid box {}", container);
            return;
        };
        let NodeKind::Box(orientation) = node.kind else {
            log::warn!("BoxLayout::layout: {} is not a box", container);
            return;
        };
        let frame = node.frame;
        let parent = node.parent;
        log::trace!("BoxLayout::layout: {} {:?} {:?}", container, orientation, frame);

        match parent.and_then(|p| tree.kind(p).map(|k| (p, k))) {
            Some((_, NodeKind::Window(chrome))) => {
                let content = chrome.content_size(self.metrics);
                if frame.width != content.width {
                    tree.set_size(container, Size { width: content.width, height: frame.height });
                }
                self.pass(tree, container, orientation, content.width, frame.height);

                // Root content always fills the window; re-justify at the final size.
                tree.set_frame(container, Frame::sized(content));
                self.pass(tree, container, orientation, content.width, content.height);
            }
            Some((parent, NodeKind::Box(_))) => {
                let extents = self.pass(tree, container, orientation, frame.width, frame.height);
                let pad = self.metrics.padding;
                if extents.max_x > pad || extents.max_y > pad {
                    let wrapped = Size {
                        width: extents.max_x + pad,
                        height: extents.max_y + pad,
                    };
                    if wrapped != frame.size() {
                        tree.set_size(container, wrapped);
                        self.layout(tree, parent);
                    }
                }
            }
            _ => {
                self.pass(tree, container, orientation, frame.width, frame.height);
            }
        }
    }

    fn pass(
        &mut self,
        tree: &mut LayoutTree,
        container: Handle,
        orientation: Orientation,
        box_width: f32,
        box_height: f32,
    ) -> Extents {
        let m = *self.metrics;
        let mut x = m.padding;
        let mut y = m.padding;
        let mut extents = Extents { max_x: m.padding, max_y: m.padding };

        let children: Vec<Handle> = tree.children(container).to_vec();
        for child in children {
            let Some(node) = tree.get(child) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let kind = node.kind;
            let mut width = node.frame.width;
            let mut height = node.frame.height;
            let mut child_x = x;
            // Stretched children span the box edge to edge.
            let mut stretched = false;

            if orientation == Orientation::Horizontal && kind == NodeKind::Canvas {
                let remaining = box_width - child_x - m.padding;
                if remaining > 0.0 {
                    width = remaining;
                }
                let available = box_height - m.padding * 2.0;
                if available > 0.0 {
                    height = available;
                }
            }

            if orientation == Orientation::Vertical {
                match kind {
                    NodeKind::TextInput => {
                        width = box_width.max(m.min_text_input_width);
                        child_x = 0.0;
                        stretched = true;
                    }
                    NodeKind::Label { .. } => {
                        width = box_width.max(m.min_label_width);
                        child_x = 0.0;
                        stretched = true;
                        tree.switch_to_wrapping(child);
                        let text = tree.get(child).map(|n| n.text.clone()).unwrap_or_default();
                        if !text.is_empty() {
                            let measured = self.wrapped(&text, width);
                            height = (measured.height + m.label_padding * 2.0).max(m.min_label_height);
                        }
                    }
                    _ => {}
                }
            }

            if kind == NodeKind::Button {
                width = width.max(m.min_button.width);
                height = height.max(m.min_button.height);
            }

            let placed = Frame::new(child_x, y, width, height);
            tree.set_frame(child, placed);

            let right = if stretched { placed.width - m.padding } else { placed.right() };
            extents.max_x = extents.max_x.max(right);
            extents.max_y = extents.max_y.max(placed.bottom());

            match orientation {
                Orientation::Vertical => {
                    y += height + m.spacing;
                    x = m.padding;
                }
                Orientation::Horizontal => x += width + m.spacing,
            }
        }

        extents
    }

    fn wrapped(&mut self, text: &str, width: f32) -> Size<f32> {
        self.measurer.measure_wrapped(text, width).unwrap_or_else(|| {
            log::debug!("BoxLayout: text measurement unavailable, using fallback size");
            self.metrics.fallback_text
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FixedAdvanceMeasurer, Node, WindowChrome};

    const LONG_LABEL: &str = "Hello world, a fairly long label that should wrap";

    struct Fixture {
        tree: LayoutTree,
        metrics: LayoutMetrics,
        measurer: FixedAdvanceMeasurer,
        next: usize,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tree: LayoutTree::new(),
                metrics: LayoutMetrics::default(),
                measurer: FixedAdvanceMeasurer::default(),
                next: 1,
            }
        }

        fn add(&mut self, kind: NodeKind, width: f32, height: f32, text: &str) -> Handle {
            let h = Handle::from_raw(self.next).unwrap();
            self.next += 1;
            self.tree.insert(h, Node::new(kind, Size { width, height }).with_text(text));
            h
        }

        fn window(&mut self, width: f32, height: f32) -> Handle {
            self.add(NodeKind::Window(WindowChrome::new(width, height)), width, height, "")
        }

        fn vbox(&mut self, width: f32) -> Handle {
            self.add(NodeKind::Box(Orientation::Vertical), width, 100.0, "")
        }

        fn layout(&mut self, container: Handle) {
            BoxLayout::new(&self.metrics, &mut self.measurer).layout(&mut self.tree, container);
        }

        fn frame(&self, h: Handle) -> Frame {
            self.tree.get(h).unwrap().frame
        }

        fn frames(&self, handles: &[Handle]) -> Vec<Frame> {
            handles.iter().map(|h| self.frame(*h)).collect()
        }
    }

    // =========================================================================
    // Per-kind sizing
    // =========================================================================

    #[test]
    fn test_vertical_stacks_with_padding_and_spacing() {
        let mut fx = Fixture::new();
        let b = fx.vbox(300.0);
        let ok = fx.add(NodeKind::Button, 30.0, 20.0, "OK");
        let other = fx.add(NodeKind::Other, 40.0, 40.0, "");
        fx.tree.attach(b, ok).unwrap();
        fx.tree.attach(b, other).unwrap();
        fx.layout(b);

        assert_eq!(fx.frame(ok), Frame::new(12.0, 12.0, 80.0, 32.0));
        assert_eq!(fx.frame(other), Frame::new(12.0, 52.0, 40.0, 40.0));
    }

    #[test]
    fn test_button_keeps_natural_size_above_minimum() {
        let mut fx = Fixture::new();
        let b = fx.vbox(300.0);
        let big = fx.add(NodeKind::Button, 120.0, 40.0, "A much longer caption");
        fx.tree.attach(b, big).unwrap();
        fx.layout(b);
        assert_eq!(fx.frame(big).size(), Size { width: 120.0, height: 40.0 });
    }

    #[test]
    fn test_text_input_fills_available_width() {
        let mut fx = Fixture::new();
        let b = fx.vbox(300.0);
        let input = fx.add(NodeKind::TextInput, 150.0, 24.0, "");
        fx.tree.attach(b, input).unwrap();
        fx.layout(b);
        assert_eq!(fx.frame(input), Frame::new(0.0, 12.0, 300.0, 24.0));
    }

    #[test]
    fn test_narrow_box_applies_minimum_widths() {
        let mut fx = Fixture::new();
        let b = fx.vbox(30.0);
        let input = fx.add(NodeKind::TextInput, 10.0, 24.0, "");
        let label = fx.add(NodeKind::Label { wraps: false }, 10.0, 16.0, "");
        fx.tree.attach(b, input).unwrap();
        fx.tree.attach(b, label).unwrap();
        fx.layout(b);
        assert_eq!(fx.frame(input).width, 100.0);
        assert_eq!(fx.frame(label).width, 50.0);
        // empty label keeps its height
        assert_eq!(fx.frame(label).height, 16.0);
    }

    #[test]
    fn test_label_wraps_and_gets_padded_height() {
        let mut fx = Fixture::new();
        let b = fx.vbox(300.0);
        let label = fx.add(NodeKind::Label { wraps: false }, 343.0, 16.0, LONG_LABEL);
        fx.tree.attach(b, label).unwrap();
        fx.layout(b);

        let expected = FixedAdvanceMeasurer::default()
            .measure_wrapped(LONG_LABEL, 300.0)
            .unwrap();
        assert!(expected.height > 16.0);
        assert_eq!(fx.frame(label), Frame::new(0.0, 12.0, 300.0, expected.height + 8.0));
        assert_eq!(fx.tree.kind(label), Some(NodeKind::Label { wraps: true }));
    }

    #[test]
    fn test_label_height_floor() {
        let mut fx = Fixture::new();
        fx.measurer.line_height = 6.0;
        let b = fx.vbox(300.0);
        let label = fx.add(NodeKind::Label { wraps: true }, 20.0, 6.0, "Hi");
        fx.tree.attach(b, label).unwrap();
        fx.layout(b);
        assert_eq!(fx.frame(label).height, 20.0);
    }

    #[test]
    fn test_horizontal_advances_x_and_leaves_text_alone() {
        let mut fx = Fixture::new();
        let b = fx.add(NodeKind::Box(Orientation::Horizontal), 400.0, 100.0, "");
        let label = fx.add(NodeKind::Label { wraps: false }, 35.0, 16.0, "Name:");
        let input = fx.add(NodeKind::TextInput, 150.0, 24.0, "");
        fx.tree.attach(b, label).unwrap();
        fx.tree.attach(b, input).unwrap();
        fx.layout(b);
        assert_eq!(fx.frame(label), Frame::new(12.0, 12.0, 35.0, 16.0));
        assert_eq!(fx.frame(input), Frame::new(55.0, 12.0, 150.0, 24.0));
        assert_eq!(fx.tree.kind(label), Some(NodeKind::Label { wraps: false }));
    }

    #[test]
    fn test_horizontal_canvas_takes_remaining_space() {
        let mut fx = Fixture::new();
        let b = fx.add(NodeKind::Box(Orientation::Horizontal), 400.0, 200.0, "");
        let side = fx.add(NodeKind::Other, 100.0, 50.0, "");
        let canvas = fx.add(NodeKind::Canvas, 10.0, 10.0, "");
        fx.tree.attach(b, side).unwrap();
        fx.tree.attach(b, canvas).unwrap();
        fx.layout(b);
        // x = 12 + 100 + 8 = 120; width = 400 - 120 - 12
        assert_eq!(fx.frame(canvas), Frame::new(120.0, 12.0, 268.0, 176.0));
    }

    #[test]
    fn test_hidden_children_are_skipped() {
        let mut fx = Fixture::new();
        let b = fx.vbox(300.0);
        let hidden = fx.add(NodeKind::Button, 80.0, 32.0, "");
        let shown = fx.add(NodeKind::Button, 80.0, 32.0, "");
        fx.tree.attach(b, hidden).unwrap();
        fx.tree.attach(b, shown).unwrap();
        fx.tree.get_mut(hidden).unwrap().visible = false;
        fx.layout(b);
        assert_eq!(fx.frame(shown).y, 12.0);
    }

    // =========================================================================
    // Determinism
    // =========================================================================

    #[test]
    fn test_layout_is_idempotent() {
        let mut fx = Fixture::new();
        let b = fx.vbox(300.0);
        let ok = fx.add(NodeKind::Button, 14.0, 16.0, "OK");
        let label = fx.add(NodeKind::Label { wraps: false }, 343.0, 16.0, LONG_LABEL);
        fx.tree.attach(b, ok).unwrap();
        fx.tree.attach(b, label).unwrap();

        fx.layout(b);
        let first = fx.frames(&[b, ok, label]);
        fx.tree.take_changes();
        fx.layout(b);
        assert_eq!(fx.frames(&[b, ok, label]), first);
        assert!(fx.tree.take_changes().is_empty());
    }

    #[test]
    fn test_nested_box_is_idempotent() {
        let mut fx = Fixture::new();
        let outer = fx.vbox(300.0);
        let inner = fx.vbox(100.0);
        let input = fx.add(NodeKind::TextInput, 10.0, 24.0, "");
        fx.tree.attach(outer, inner).unwrap();
        fx.tree.attach(inner, input).unwrap();
        fx.layout(inner);
        let first = fx.frames(&[outer, inner, input]);
        fx.layout(inner);
        fx.layout(outer);
        assert_eq!(fx.frames(&[outer, inner, input]), first);
    }

    // =========================================================================
    // Root and nested containers
    // =========================================================================

    #[test]
    fn test_root_box_rejustifies_to_window_width() {
        let mut fx = Fixture::new();
        let win = fx.window(400.0, 300.0);
        let b = fx.vbox(100.0);
        let input = fx.add(NodeKind::TextInput, 100.0, 24.0, "");
        let label = fx.add(NodeKind::Label { wraps: false }, 100.0, 16.0, LONG_LABEL);
        fx.tree.attach(b, input).unwrap();
        fx.tree.attach(b, label).unwrap();
        fx.tree.attach(win, b).unwrap();
        fx.layout(b);

        assert_eq!(fx.frame(b), Frame::new(0.0, 0.0, 400.0, 300.0));
        assert_eq!(fx.frame(input).width, 400.0);
        assert_eq!(fx.frame(label).width, 400.0);
        let at_400 = FixedAdvanceMeasurer::default()
            .measure_wrapped(LONG_LABEL, 400.0)
            .unwrap();
        assert_eq!(fx.frame(label).height, at_400.height + 8.0);
    }

    #[test]
    fn test_root_box_reserves_menu_bar() {
        let mut fx = Fixture::new();
        let win = fx.window(400.0, 300.0);
        fx.tree.chrome_mut(win).unwrap().has_menu = true;
        let b = fx.vbox(100.0);
        fx.tree.attach(win, b).unwrap();
        fx.layout(b);
        assert_eq!(fx.frame(b).size(), Size { width: 400.0, height: 280.0 });
    }

    #[test]
    fn test_nested_box_shrink_wraps_and_relayouts_parent() {
        let mut fx = Fixture::new();
        let outer = fx.vbox(300.0);
        let inner = fx.vbox(100.0);
        let after = fx.add(NodeKind::Other, 20.0, 20.0, "");
        fx.tree.attach(outer, inner).unwrap();
        fx.tree.attach(outer, after).unwrap();
        fx.layout(outer);
        assert_eq!(fx.frame(after).y, 12.0 + 100.0 + 8.0);

        let b1 = fx.add(NodeKind::Button, 80.0, 32.0, "");
        let b2 = fx.add(NodeKind::Button, 80.0, 32.0, "");
        fx.tree.attach(inner, b1).unwrap();
        fx.tree.attach(inner, b2).unwrap();
        fx.layout(inner);

        // 12 + 32 + 8 + 32 = 84 → +12
        assert_eq!(fx.frame(inner).size(), Size { width: 104.0, height: 96.0 });
        assert_eq!(fx.frame(after).y, 12.0 + 96.0 + 8.0);
    }

    #[test]
    fn test_empty_nested_box_keeps_size() {
        let mut fx = Fixture::new();
        let outer = fx.vbox(300.0);
        let inner = fx.vbox(100.0);
        fx.tree.attach(outer, inner).unwrap();
        fx.layout(inner);
        assert_eq!(fx.frame(inner).size(), Size { width: 100.0, height: 100.0 });
    }

    #[test]
    fn test_invalid_container_is_a_no_op() {
        let mut fx = Fixture::new();
        let button = fx.add(NodeKind::Button, 10.0, 10.0, "");
        fx.tree.take_changes();
        fx.layout(button);
        fx.layout(Handle::from_raw(999).unwrap());
        assert!(fx.tree.take_changes().is_empty());
    }

    struct Unmeasurable;

    impl TextMeasurer for Unmeasurable {
        fn measure(&mut self, _text: &str) -> Option<Size<f32>> {
            None
        }
        fn measure_wrapped(&mut self, _text: &str, _max_width: f32) -> Option<Size<f32>> {
            None
        }
    }

    #[test]
    fn test_measurement_failure_uses_fallback() {
        let mut tree = LayoutTree::new();
        let metrics = LayoutMetrics::default();
        let b = Handle::from_raw(1).unwrap();
        let label = Handle::from_raw(2).unwrap();
        tree.insert(b, Node::new(NodeKind::Box(Orientation::Vertical), Size { width: 300.0, height: 100.0 }));
        tree.insert(
            label,
            Node::new(NodeKind::Label { wraps: false }, Size { width: 10.0, height: 10.0 }).with_text("x"),
        );
        tree.attach(b, label).unwrap();
        let mut measurer = Unmeasurable;
        BoxLayout::new(&metrics, &mut measurer).layout(&mut tree, b);
        assert_eq!(tree.get(label).unwrap().frame.height, 20.0 + 8.0);
    }
}
