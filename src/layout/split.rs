//! Two-pane split container.

use super::{Frame, LayoutTree, NodeKind, Orientation};
use crate::error::{NgError, NgResult};
use crate::handle::Handle;

/// Smallest extent either pane may be squeezed to.
pub const SPLIT_MIN_PANE: f32 = 50.0;

/// Keep both panes at least [`SPLIT_MIN_PANE`]. Containers too small for two
/// minimum panes are split in half.
pub fn clamp_divider(position: f32, total: f32) -> f32 {
    if total <= 0.0 {
        return 0.0;
    }
    if total < SPLIT_MIN_PANE * 2.0 {
        return (total / 2.0).floor();
    }
    position.clamp(SPLIT_MIN_PANE, total - SPLIT_MIN_PANE)
}

pub struct SplitLayout;

impl SplitLayout {
    /// Append a pane. A split holds at most two.
    pub fn add(tree: &mut LayoutTree, split: Handle, child: Handle) -> NgResult<()> {
        if !matches!(tree.kind(split), Some(NodeKind::Split(_))) {
            return Err(NgError::InvalidHandle);
        }
        if tree.children(split).len() >= 2 {
            return Err(NgError::InvalidParameter("split view already has two panes"));
        }
        tree.attach(split, child)?;
        Self::layout(tree, split);
        Ok(())
    }

    /// Move divider `index` (only 0 exists) to `position` pixels.
    pub fn set_divider(tree: &mut LayoutTree, split: Handle, index: i32, position: f32) -> NgResult<()> {
        if index != 0 {
            return Err(NgError::InvalidParameter("split view has a single divider"));
        }
        match tree.get_mut(split).map(|n| &mut n.kind) {
            Some(NodeKind::Split(state)) => state.divider = position,
            _ => return Err(NgError::InvalidHandle),
        }
        Self::layout(tree, split);
        Ok(())
    }

    /// Position the panes inside the split's current frame.
    pub fn layout(tree: &mut LayoutTree, split: Handle) {
        let Some(node) = tree.get(split) else {
            log::warn!("SplitLayout::layout: invalid split {}", split);
            return;
        };
        let NodeKind::Split(mut state) = node.kind else {
            log::warn!("SplitLayout::layout: {} is not a split", split);
            return;
        };
        let (width, height) = (node.frame.width, node.frame.height);
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let panes: Vec<Handle> = node.children.clone();

        match panes.as_slice() {
            [] => {}
            [only] => tree.set_frame(*only, Frame::new(0.0, 0.0, width, height)),
            [first, second, ..] => {
                let total = match state.orientation {
                    Orientation::Vertical => height,
                    Orientation::Horizontal => width,
                };
                // An unset divider stays unset so the panes keep halving on resize.
                let pos = if state.divider <= 0.0 {
                    clamp_divider((total / 2.0).floor(), total)
                } else {
                    let pos = clamp_divider(state.divider, total);
                    state.divider = pos;
                    if let Some(n) = tree.get_mut(split) {
                        n.kind = NodeKind::Split(state);
                    }
                    pos
                };

                let (a, b) = match state.orientation {
                    Orientation::Vertical => (
                        Frame::new(0.0, 0.0, width, pos),
                        Frame::new(0.0, pos, width, height - pos),
                    ),
                    Orientation::Horizontal => (
                        Frame::new(0.0, 0.0, pos, height),
                        Frame::new(pos, 0.0, width - pos, height),
                    ),
                };
                tree.set_frame(*first, a);
                tree.set_frame(*second, b);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Node, Size, SplitState};

    fn h(raw: usize) -> Handle {
        Handle::from_raw(raw).unwrap()
    }

    fn split_tree(orientation: Orientation, width: f32, height: f32) -> LayoutTree {
        let mut tree = LayoutTree::new();
        tree.insert(
            h(1),
            Node::new(
                NodeKind::Split(SplitState { orientation, divider: 0.0 }),
                Size { width, height },
            ),
        );
        for raw in 2..=4 {
            tree.insert(h(raw), Node::new(NodeKind::Other, Size { width: 10.0, height: 10.0 }));
        }
        tree
    }

    #[test]
    fn test_clamp_divider() {
        assert_eq!(clamp_divider(10.0, 0.0), 0.0);
        assert_eq!(clamp_divider(10.0, 80.0), 40.0);
        assert_eq!(clamp_divider(10.0, 400.0), 50.0);
        assert_eq!(clamp_divider(390.0, 400.0), 350.0);
        assert_eq!(clamp_divider(123.0, 400.0), 123.0);
    }

    #[test]
    fn test_single_pane_fills() {
        let mut tree = split_tree(Orientation::Horizontal, 400.0, 300.0);
        SplitLayout::add(&mut tree, h(1), h(2)).unwrap();
        assert_eq!(tree.get(h(2)).unwrap().frame, Frame::new(0.0, 0.0, 400.0, 300.0));
    }

    #[test]
    fn test_unset_divider_splits_in_half() {
        let mut tree = split_tree(Orientation::Horizontal, 400.0, 300.0);
        SplitLayout::add(&mut tree, h(1), h(2)).unwrap();
        SplitLayout::add(&mut tree, h(1), h(3)).unwrap();
        assert_eq!(tree.get(h(2)).unwrap().frame, Frame::new(0.0, 0.0, 200.0, 300.0));
        assert_eq!(tree.get(h(3)).unwrap().frame, Frame::new(200.0, 0.0, 200.0, 300.0));
    }

    #[test]
    fn test_vertical_divider_is_clamped() {
        let mut tree = split_tree(Orientation::Vertical, 400.0, 300.0);
        SplitLayout::add(&mut tree, h(1), h(2)).unwrap();
        SplitLayout::add(&mut tree, h(1), h(3)).unwrap();
        SplitLayout::set_divider(&mut tree, h(1), 0, 290.0).unwrap();
        assert_eq!(tree.get(h(2)).unwrap().frame, Frame::new(0.0, 0.0, 400.0, 250.0));
        assert_eq!(tree.get(h(3)).unwrap().frame, Frame::new(0.0, 250.0, 400.0, 50.0));
    }

    #[test]
    fn test_third_pane_and_bad_index_rejected() {
        let mut tree = split_tree(Orientation::Horizontal, 400.0, 300.0);
        SplitLayout::add(&mut tree, h(1), h(2)).unwrap();
        SplitLayout::add(&mut tree, h(1), h(3)).unwrap();
        assert!(matches!(
            SplitLayout::add(&mut tree, h(1), h(4)),
            Err(NgError::InvalidParameter(_))
        ));
        assert!(matches!(
            SplitLayout::set_divider(&mut tree, h(1), 1, 100.0),
            Err(NgError::InvalidParameter(_))
        ));
        assert_eq!(SplitLayout::add(&mut tree, h(2), h(4)), Err(NgError::InvalidHandle));
    }
}
