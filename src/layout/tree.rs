//! Arena of layout nodes keyed by handle.

use std::collections::HashMap;

use super::{Frame, LayoutMetrics, Orientation, Size};
use crate::error::{NgError, NgResult};
use crate::handle::Handle;

/// Top-level window client area and menu bar chrome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowChrome {
    pub client: Size<f32>,
    pub has_menu: bool,
    /// Rendered menu bar height, when the platform can report it.
    pub menu_height: Option<f32>,
}

impl WindowChrome {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            client: Size { width, height },
            has_menu: false,
            menu_height: None,
        }
    }

    /// Client area left for content once the menu bar is reserved.
    pub fn content_size(&self, metrics: &LayoutMetrics) -> Size<f32> {
        let menu = if self.has_menu {
            self.menu_height.unwrap_or(metrics.fallback_menu_height)
        } else {
            0.0
        };
        Size {
            width: self.client.width,
            height: (self.client.height - menu).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitState {
    pub orientation: Orientation,
    /// Leading pane extent in pixels; zero or less means "not set yet".
    pub divider: f32,
}

/// Semantic kind of a node, as far as layout cares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Window(WindowChrome),
    Box(Orientation),
    Split(SplitState),
    /// Single- or multi-line editable text.
    TextInput,
    Label { wraps: bool },
    Button,
    Canvas,
    Other,
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Window(_) | NodeKind::Box(_) | NodeKind::Split(_))
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub frame: Frame,
    pub visible: bool,
    pub text: String,
    pub parent: Option<Handle>,
    pub children: Vec<Handle>,
    pub(crate) wrap_switched: bool,
}

impl Node {
    pub fn new(kind: NodeKind, size: Size<f32>) -> Self {
        Self {
            kind,
            frame: Frame::sized(size),
            visible: true,
            text: String::new(),
            parent: None,
            children: Vec::new(),
            wrap_switched: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

#[derive(Debug, Default)]
pub struct LayoutTree {
    nodes: HashMap<Handle, Node>,
    changes: Vec<Handle>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: Handle, node: Node) {
        if self.nodes.insert(handle, node).is_some() {
            // Native handle reuse: the old object is gone.
            log::debug!("LayoutTree::insert: replacing stale node {}", handle);
        }
        self.mark(handle);
    }

    pub fn get(&self, handle: Handle) -> Option<&Node> {
        self.nodes.get(&handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Node> {
        self.nodes.get_mut(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.nodes.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, handle: Handle) -> Option<NodeKind> {
        self.nodes.get(&handle).map(|n| n.kind)
    }

    pub fn parent(&self, handle: Handle) -> Option<Handle> {
        self.nodes.get(&handle).and_then(|n| n.parent)
    }

    pub fn children(&self, handle: Handle) -> &[Handle] {
        self.nodes
            .get(&handle)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Reparent `child` under `parent`, appending it after existing siblings.
    pub fn attach(&mut self, parent: Handle, child: Handle) -> NgResult<()> {
        if !self.contains(parent) || !self.contains(child) {
            return Err(NgError::InvalidHandle);
        }
        if matches!(self.kind(child), Some(NodeKind::Window(_))) {
            return Err(NgError::InvalidParameter("a window cannot be attached to a parent"));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(NgError::InvalidParameter("cannot attach a node inside itself"));
        }
        self.detach(child);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
            c.visible = true;
        }
        Ok(())
    }

    pub fn detach(&mut self, child: Handle) {
        let Some(old) = self.nodes.get_mut(&child).and_then(|c| c.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&old) {
            p.children.retain(|c| *c != child);
        }
    }

    /// Remove a node and its whole subtree. Returns every removed handle.
    pub fn remove(&mut self, handle: Handle) -> Vec<Handle> {
        self.detach(handle);
        let mut removed = Vec::new();
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            if let Some(node) = self.nodes.remove(&h) {
                stack.extend(node.children);
                removed.push(h);
            }
        }
        self.changes.retain(|h| !removed.contains(h));
        removed
    }

    fn is_ancestor_or_self(&self, ancestor: Handle, mut node: Handle) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(p) => node = p,
                None => return false,
            }
        }
    }

    /// Nearest enclosing top-level window.
    pub fn window_of(&self, handle: Handle) -> Option<Handle> {
        let mut current = self.parent(handle);
        while let Some(h) = current {
            if matches!(self.kind(h), Some(NodeKind::Window(_))) {
                return Some(h);
            }
            current = self.parent(h);
        }
        None
    }

    pub fn chrome(&self, window: Handle) -> Option<WindowChrome> {
        match self.kind(window)? {
            NodeKind::Window(chrome) => Some(chrome),
            _ => None,
        }
    }

    pub fn chrome_mut(&mut self, window: Handle) -> Option<&mut WindowChrome> {
        match &mut self.nodes.get_mut(&window)?.kind {
            NodeKind::Window(chrome) => Some(chrome),
            _ => None,
        }
    }

    /// Update a frame, recording the node for the next geometry flush when it
    /// actually moved or resized.
    pub fn set_frame(&mut self, handle: Handle, frame: Frame) {
        let Some(node) = self.nodes.get_mut(&handle) else {
            return;
        };
        if node.frame != frame {
            node.frame = frame;
            self.mark(handle);
        }
    }

    pub fn set_size(&mut self, handle: Handle, size: Size<f32>) {
        if let Some(frame) = self.get(handle).map(|n| n.frame) {
            self.set_frame(handle, Frame { width: size.width, height: size.height, ..frame });
        }
    }

    pub(crate) fn switch_to_wrapping(&mut self, handle: Handle) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            if let NodeKind::Label { wraps: false } = node.kind {
                node.kind = NodeKind::Label { wraps: true };
                node.wrap_switched = true;
                self.mark(handle);
            }
        }
    }

    fn mark(&mut self, handle: Handle) {
        if !self.changes.contains(&handle) {
            self.changes.push(handle);
        }
    }

    pub fn take_changes(&mut self) -> Vec<Handle> {
        std::mem::take(&mut self.changes)
    }

    pub(crate) fn clear_wrap_switches(&mut self) {
        for node in self.nodes.values_mut() {
            node.wrap_switched = false;
        }
    }
}
