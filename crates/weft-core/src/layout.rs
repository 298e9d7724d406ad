//! Layout bridge — wraps the flexbox solver behind an engine-facing style model.
//!
//! The solver is configured with no web defaults beyond flexbox itself:
//! column is the default direction, output is rounded to integer cells, and
//! text-bearing nodes size intrinsically through measure callbacks.

use std::collections::HashMap;

use taffy::prelude::TaffyMaxContent;
use taffy::{AvailableSpace, TaffyTree};

use crate::error::{Result, WeftError};
use crate::node::NodeNum;

/// A sizing dimension: automatic, absolute cells, or a percentage of the
/// parent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Dimension {
    /// Size from content / flex rules.
    #[default]
    Auto,
    /// Absolute size in cells.
    Cells(u16),
    /// Percentage of the parent's size (0-100).
    Percent(f32),
}

impl Dimension {
    /// Parse a dimension from text: `"auto"`, `"12"`, or `"50%"`.
    pub fn parse(text: &str) -> Result<Dimension> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("auto") {
            return Ok(Dimension::Auto);
        }
        if let Some(pct) = text.strip_suffix('%') {
            let value: f32 = pct
                .trim()
                .parse()
                .map_err(|_| WeftError::InvalidArgument(format!("malformed percentage: {text:?}")))?;
            if !(0.0..=100.0).contains(&value) {
                return Err(WeftError::InvalidArgument(format!(
                    "percentage out of range: {text:?}"
                )));
            }
            return Ok(Dimension::Percent(value));
        }
        let cells: u16 = text
            .parse()
            .map_err(|_| WeftError::InvalidArgument(format!("malformed dimension: {text:?}")))?;
        Ok(Dimension::Cells(cells))
    }
}

/// Per-edge values (top, right, bottom, left).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edges<T> {
    /// Top edge.
    pub top: T,
    /// Right edge.
    pub right: T,
    /// Bottom edge.
    pub bottom: T,
    /// Left edge.
    pub left: T,
}

impl<T: Copy> Edges<T> {
    /// The same value on all four edges.
    pub fn uniform(value: T) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// Positioning scheme for a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PositionKind {
    /// Normal flow, offset by insets.
    #[default]
    Relative,
    /// Taken out of flow, positioned by insets against the parent.
    Absolute,
    /// Normal flow; insets are ignored.
    Static,
}

/// Main-axis direction of a flex container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlexDirection {
    /// Children stack vertically (the engine default).
    #[default]
    Column,
    /// Children flow horizontally.
    Row,
    /// Horizontal, reversed.
    RowReverse,
    /// Vertical, reversed.
    ColumnReverse,
}

/// Wrapping behavior of a flex container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlexWrap {
    /// Single line.
    #[default]
    NoWrap,
    /// Wrap onto additional lines.
    Wrap,
    /// Wrap in reverse order.
    WrapReverse,
}

/// Cross-axis alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum AlignItems {
    Stretch,
    FlexStart,
    Center,
    FlexEnd,
    Baseline,
}

/// Main-axis content distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum JustifyContent {
    FlexStart,
    Center,
    FlexEnd,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

/// Overflow behavior of a node's content area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overflow {
    /// Content may paint outside the node's box.
    #[default]
    Visible,
    /// Content is clipped to the node's box.
    Hidden,
    /// Clipped, with scrolling driven by the translate offset.
    Scroll,
}

/// All layout-affecting attributes of a renderable node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
    /// Preferred width.
    pub width: Dimension,
    /// Preferred height.
    pub height: Dimension,
    /// Minimum width.
    pub min_width: Dimension,
    /// Minimum height.
    pub min_height: Dimension,
    /// Maximum width.
    pub max_width: Dimension,
    /// Maximum height.
    pub max_height: Dimension,
    /// Flex grow factor.
    pub flex_grow: f32,
    /// Flex shrink factor.
    pub flex_shrink: f32,
    /// Flex basis.
    pub flex_basis: Dimension,
    /// Main-axis direction for children.
    pub flex_direction: FlexDirection,
    /// Wrapping behavior for children.
    pub flex_wrap: FlexWrap,
    /// Cross-axis alignment of children.
    pub align_items: Option<AlignItems>,
    /// Cross-axis alignment override for this node.
    pub align_self: Option<AlignItems>,
    /// Main-axis distribution of children.
    pub justify_content: Option<JustifyContent>,
    /// Positioning scheme.
    pub position: PositionKind,
    /// Inset from each edge (used by relative/absolute positioning).
    pub inset: Edges<Dimension>,
    /// Outer margin per edge.
    pub margin: Edges<Dimension>,
    /// Inner padding per edge, in cells.
    pub padding: Edges<u16>,
    /// Border thickness per edge, in cells.
    pub border: Edges<u16>,
    /// Overflow behavior.
    pub overflow: Overflow,
    /// Stacking order among siblings (absolute values, stable ties).
    pub z_index: i32,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            min_height: Dimension::Auto,
            max_width: Dimension::Auto,
            max_height: Dimension::Auto,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Dimension::Auto,
            flex_direction: FlexDirection::Column,
            flex_wrap: FlexWrap::NoWrap,
            align_items: None,
            align_self: None,
            justify_content: None,
            position: PositionKind::Relative,
            inset: Edges::uniform(Dimension::Auto),
            margin: Edges::uniform(Dimension::Cells(0)),
            padding: Edges::uniform(0),
            border: Edges::uniform(0),
            overflow: Overflow::Visible,
            z_index: 0,
        }
    }
}

/// A computed box in cell coordinates, relative to the parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComputedBox {
    /// X offset from the parent's content origin.
    pub x: i32,
    /// Y offset from the parent's content origin.
    pub y: i32,
    /// Width in cells.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

/// The flexbox solver wrapper: one solver node per renderable.
pub struct LayoutTree {
    taffy: TaffyTree<NodeNum>,
    to_node: HashMap<NodeNum, taffy::NodeId>,
    from_node: HashMap<taffy::NodeId, NodeNum>,
}

impl LayoutTree {
    /// Create an empty layout tree.
    pub fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
            to_node: HashMap::new(),
            from_node: HashMap::new(),
        }
    }

    /// Number of solver nodes.
    pub fn node_count(&self) -> usize {
        self.to_node.len()
    }

    /// Whether a solver node exists for `num`.
    pub fn has_node(&self, num: NodeNum) -> bool {
        self.to_node.contains_key(&num)
    }

    /// Add a solver node for `num` with the given style.
    pub fn add_node(&mut self, num: NodeNum, style: &NodeStyle) -> Result<()> {
        let node = self
            .taffy
            .new_leaf_with_context(to_taffy(style), num)
            .map_err(|e| WeftError::Layout(e.to_string()))?;
        self.to_node.insert(num, node);
        self.from_node.insert(node, num);
        Ok(())
    }

    /// Remove the solver node for `num`.
    pub fn remove_node(&mut self, num: NodeNum) -> Result<()> {
        let node = self
            .to_node
            .remove(&num)
            .ok_or_else(|| WeftError::UnknownRenderable(format!("{num:?}")))?;
        self.from_node.remove(&node);
        self.taffy
            .remove(node)
            .map_err(|e| WeftError::Layout(e.to_string()))?;
        Ok(())
    }

    /// Replace the child list of `num`, in layout order.
    pub fn set_children(&mut self, num: NodeNum, children: &[NodeNum]) -> Result<()> {
        let parent = self.node_of(num)?;
        let child_nodes: Vec<taffy::NodeId> = children
            .iter()
            .map(|c| self.node_of(*c))
            .collect::<Result<Vec<_>>>()?;
        self.taffy
            .set_children(parent, &child_nodes)
            .map_err(|e| WeftError::Layout(e.to_string()))?;
        Ok(())
    }

    /// The child list of `num` as seen by the solver, in layout order.
    pub fn children(&self, num: NodeNum) -> Result<Vec<NodeNum>> {
        let node = self.node_of(num)?;
        let children = self
            .taffy
            .children(node)
            .map_err(|e| WeftError::Layout(e.to_string()))?;
        Ok(children
            .iter()
            .filter_map(|n| self.from_node.get(n).copied())
            .collect())
    }

    /// Push a style change for `num` into the solver (marks it dirty).
    pub fn update_style(&mut self, num: NodeNum, style: &NodeStyle) -> Result<()> {
        let node = self.node_of(num)?;
        self.taffy
            .set_style(node, to_taffy(style))
            .map_err(|e| WeftError::Layout(e.to_string()))?;
        Ok(())
    }

    /// Mark `num` dirty so the next solve re-evaluates it.
    pub fn mark_dirty(&mut self, num: NodeNum) -> Result<()> {
        let node = self.node_of(num)?;
        self.taffy
            .mark_dirty(node)
            .map_err(|e| WeftError::Layout(e.to_string()))?;
        Ok(())
    }

    /// Whether `num` needs a solve.
    pub fn is_dirty(&self, num: NodeNum) -> bool {
        self.node_of(num)
            .and_then(|node| {
                self.taffy
                    .dirty(node)
                    .map_err(|e| WeftError::Layout(e.to_string()))
            })
            .unwrap_or(false)
    }

    /// Run a single global solve from `root` with the given available space.
    ///
    /// `measure` is consulted for intrinsically sized leaves; it receives
    /// the node and the proposed width (when one is known) and returns the
    /// content size, or `None` for nodes without intrinsic content.
    pub fn compute<F>(&mut self, root: NodeNum, width: u16, height: u16, mut measure: F) -> Result<()>
    where
        F: FnMut(NodeNum, Option<u16>) -> Option<(u16, u16)>,
    {
        let root_node = self.node_of(root)?;
        let available = taffy::Size {
            width: AvailableSpace::Definite(f32::from(width)),
            height: AvailableSpace::Definite(f32::from(height)),
        };
        self.taffy
            .compute_layout_with_measure(
                root_node,
                available,
                |known: taffy::Size<Option<f32>>,
                 avail: taffy::Size<AvailableSpace>,
                 _id,
                 ctx: Option<&mut NodeNum>,
                 _style: &taffy::Style| {
                    let Some(&mut num) = ctx else {
                        return taffy::Size::ZERO;
                    };
                    let proposed = known
                        .width
                        .or(match avail.width {
                            AvailableSpace::Definite(w) => Some(w),
                            _ => None,
                        })
                        .map(|w| w.max(0.0).round() as u16);
                    match measure(num, proposed) {
                        Some((w, h)) => taffy::Size {
                            width: known.width.unwrap_or(f32::from(w)),
                            height: known.height.unwrap_or(f32::from(h)),
                        },
                        None => taffy::Size::ZERO,
                    }
                },
            )
            .map_err(|e| WeftError::Layout(e.to_string()))?;
        Ok(())
    }

    /// Solve with unbounded space (used by tests and measurement probes).
    pub fn compute_unbounded(&mut self, root: NodeNum) -> Result<()> {
        let root_node = self.node_of(root)?;
        self.taffy
            .compute_layout(root_node, taffy::Size::MAX_CONTENT)
            .map_err(|e| WeftError::Layout(e.to_string()))?;
        Ok(())
    }

    /// The computed box of `num`, relative to its parent, in integer cells.
    pub fn computed_box(&self, num: NodeNum) -> Result<ComputedBox> {
        let node = self.node_of(num)?;
        let layout = self
            .taffy
            .layout(node)
            .map_err(|e| WeftError::Layout(e.to_string()))?;
        Ok(ComputedBox {
            x: layout.location.x.round() as i32,
            y: layout.location.y.round() as i32,
            width: clamp_size(layout.size.width),
            height: clamp_size(layout.size.height),
        })
    }

    fn node_of(&self, num: NodeNum) -> Result<taffy::NodeId> {
        self.to_node
            .get(&num)
            .copied()
            .ok_or_else(|| WeftError::UnknownRenderable(format!("{num:?}")))
    }
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_size(value: f32) -> u16 {
    if value <= 0.0 {
        0
    } else if value >= f32::from(u16::MAX) {
        u16::MAX
    } else {
        value.round() as u16
    }
}

fn to_dimension(dim: Dimension) -> taffy::Dimension {
    match dim {
        Dimension::Auto => taffy::Dimension::Auto,
        Dimension::Cells(n) => taffy::Dimension::Length(f32::from(n)),
        Dimension::Percent(p) => taffy::Dimension::Percent(p / 100.0),
    }
}

fn to_lpa(dim: Dimension) -> taffy::LengthPercentageAuto {
    match dim {
        Dimension::Auto => taffy::LengthPercentageAuto::Auto,
        Dimension::Cells(n) => taffy::LengthPercentageAuto::Length(f32::from(n)),
        Dimension::Percent(p) => taffy::LengthPercentageAuto::Percent(p / 100.0),
    }
}

fn to_taffy(style: &NodeStyle) -> taffy::Style {
    let mut out = taffy::Style {
        display: taffy::Display::Flex,
        ..taffy::Style::default()
    };

    out.size = taffy::Size {
        width: to_dimension(style.width),
        height: to_dimension(style.height),
    };
    out.min_size = taffy::Size {
        width: to_dimension(style.min_width),
        height: to_dimension(style.min_height),
    };
    out.max_size = taffy::Size {
        width: to_dimension(style.max_width),
        height: to_dimension(style.max_height),
    };

    out.flex_grow = style.flex_grow;
    out.flex_shrink = style.flex_shrink;
    out.flex_basis = to_dimension(style.flex_basis);
    out.flex_direction = match style.flex_direction {
        FlexDirection::Row => taffy::FlexDirection::Row,
        FlexDirection::Column => taffy::FlexDirection::Column,
        FlexDirection::RowReverse => taffy::FlexDirection::RowReverse,
        FlexDirection::ColumnReverse => taffy::FlexDirection::ColumnReverse,
    };
    out.flex_wrap = match style.flex_wrap {
        FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
        FlexWrap::Wrap => taffy::FlexWrap::Wrap,
        FlexWrap::WrapReverse => taffy::FlexWrap::WrapReverse,
    };
    out.align_items = style.align_items.map(to_align);
    out.align_self = style.align_self.map(to_align);
    out.justify_content = style.justify_content.map(|j| match j {
        JustifyContent::FlexStart => taffy::JustifyContent::FlexStart,
        JustifyContent::Center => taffy::JustifyContent::Center,
        JustifyContent::FlexEnd => taffy::JustifyContent::FlexEnd,
        JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
        JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
        JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
    });

    out.position = match style.position {
        PositionKind::Absolute => taffy::Position::Absolute,
        PositionKind::Relative | PositionKind::Static => taffy::Position::Relative,
    };
    // Static positioning ignores insets entirely.
    out.inset = if style.position == PositionKind::Static {
        taffy::Rect {
            top: taffy::LengthPercentageAuto::Auto,
            right: taffy::LengthPercentageAuto::Auto,
            bottom: taffy::LengthPercentageAuto::Auto,
            left: taffy::LengthPercentageAuto::Auto,
        }
    } else {
        taffy::Rect {
            top: to_lpa(style.inset.top),
            right: to_lpa(style.inset.right),
            bottom: to_lpa(style.inset.bottom),
            left: to_lpa(style.inset.left),
        }
    };

    out.margin = taffy::Rect {
        top: to_lpa(style.margin.top),
        right: to_lpa(style.margin.right),
        bottom: to_lpa(style.margin.bottom),
        left: to_lpa(style.margin.left),
    };
    out.padding = taffy::Rect {
        top: taffy::LengthPercentage::Length(f32::from(style.padding.top)),
        right: taffy::LengthPercentage::Length(f32::from(style.padding.right)),
        bottom: taffy::LengthPercentage::Length(f32::from(style.padding.bottom)),
        left: taffy::LengthPercentage::Length(f32::from(style.padding.left)),
    };
    out.border = taffy::Rect {
        top: taffy::LengthPercentage::Length(f32::from(style.border.top)),
        right: taffy::LengthPercentage::Length(f32::from(style.border.right)),
        bottom: taffy::LengthPercentage::Length(f32::from(style.border.bottom)),
        left: taffy::LengthPercentage::Length(f32::from(style.border.left)),
    };

    let overflow = match style.overflow {
        Overflow::Visible => taffy::Overflow::Visible,
        Overflow::Hidden => taffy::Overflow::Hidden,
        Overflow::Scroll => taffy::Overflow::Scroll,
    };
    out.overflow = taffy::Point {
        x: overflow,
        y: overflow,
    };

    out
}

fn to_align(align: AlignItems) -> taffy::AlignItems {
    match align {
        AlignItems::Stretch => taffy::AlignItems::Stretch,
        AlignItems::FlexStart => taffy::AlignItems::FlexStart,
        AlignItems::Center => taffy::AlignItems::Center,
        AlignItems::FlexEnd => taffy::AlignItems::FlexEnd,
        AlignItems::Baseline => taffy::AlignItems::Baseline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeNum;

    fn num(n: u64) -> NodeNum {
        NodeNum::from_raw(n)
    }

    #[test]
    fn parse_dimensions() {
        assert_eq!(Dimension::parse("auto").ok(), Some(Dimension::Auto));
        assert_eq!(Dimension::parse("12").ok(), Some(Dimension::Cells(12)));
        assert_eq!(Dimension::parse("50%").ok(), Some(Dimension::Percent(50.0)));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(Dimension::parse("wide").is_err());
        assert!(Dimension::parse("12px").is_err());
        assert!(Dimension::parse("150%").is_err());
        assert!(Dimension::parse("-3").is_err());
    }

    #[test]
    fn row_split_between_two_growing_children() {
        let mut lt = LayoutTree::new();
        let root = num(1);
        let a = num(2);
        let b = num(3);

        let mut root_style = NodeStyle {
            width: Dimension::Cells(10),
            height: Dimension::Cells(3),
            flex_direction: FlexDirection::Row,
            ..NodeStyle::default()
        };
        root_style.align_items = Some(AlignItems::Stretch);
        let child_style = NodeStyle {
            flex_grow: 1.0,
            ..NodeStyle::default()
        };

        assert!(lt.add_node(a, &child_style).is_ok());
        assert!(lt.add_node(b, &child_style).is_ok());
        assert!(lt.add_node(root, &root_style).is_ok());
        assert!(lt.set_children(root, &[a, b]).is_ok());
        assert!(lt.compute(root, 10, 3, |_, _| None).is_ok());

        let ba = lt.computed_box(a).unwrap_or_default();
        let bb = lt.computed_box(b).unwrap_or_default();
        assert_eq!((ba.x, ba.y, ba.width, ba.height), (0, 0, 5, 3));
        assert_eq!((bb.x, bb.y, bb.width, bb.height), (5, 0, 5, 3));
    }

    #[test]
    fn percent_width_resolves_against_parent() {
        let mut lt = LayoutTree::new();
        let root = num(1);
        let child = num(2);
        let root_style = NodeStyle {
            width: Dimension::Cells(20),
            height: Dimension::Cells(4),
            ..NodeStyle::default()
        };
        let child_style = NodeStyle {
            width: Dimension::Percent(50.0),
            height: Dimension::Cells(2),
            ..NodeStyle::default()
        };
        assert!(lt.add_node(child, &child_style).is_ok());
        assert!(lt.add_node(root, &root_style).is_ok());
        assert!(lt.set_children(root, &[child]).is_ok());
        assert!(lt.compute(root, 20, 4, |_, _| None).is_ok());
        let cb = lt.computed_box(child).unwrap_or_default();
        assert_eq!(cb.width, 10);
    }

    #[test]
    fn absolute_position_uses_insets() {
        let mut lt = LayoutTree::new();
        let root = num(1);
        let child = num(2);
        let root_style = NodeStyle {
            width: Dimension::Cells(10),
            height: Dimension::Cells(10),
            ..NodeStyle::default()
        };
        let child_style = NodeStyle {
            position: PositionKind::Absolute,
            width: Dimension::Cells(3),
            height: Dimension::Cells(2),
            inset: Edges {
                top: Dimension::Cells(4),
                left: Dimension::Cells(5),
                right: Dimension::Auto,
                bottom: Dimension::Auto,
            },
            ..NodeStyle::default()
        };
        assert!(lt.add_node(child, &child_style).is_ok());
        assert!(lt.add_node(root, &root_style).is_ok());
        assert!(lt.set_children(root, &[child]).is_ok());
        assert!(lt.compute(root, 10, 10, |_, _| None).is_ok());
        let cb = lt.computed_box(child).unwrap_or_default();
        assert_eq!((cb.x, cb.y), (5, 4));
    }

    #[test]
    fn measure_callback_sizes_leaf() {
        let mut lt = LayoutTree::new();
        let root = num(1);
        let text = num(2);
        let root_style = NodeStyle {
            width: Dimension::Cells(12),
            height: Dimension::Cells(6),
            align_items: Some(AlignItems::FlexStart),
            ..NodeStyle::default()
        };
        assert!(lt.add_node(text, &NodeStyle::default()).is_ok());
        assert!(lt.add_node(root, &root_style).is_ok());
        assert!(lt.set_children(root, &[text]).is_ok());
        assert!(lt
            .compute(root, 12, 6, |n, _| (n == text).then_some((5, 2)))
            .is_ok());
        let cb = lt.computed_box(text).unwrap_or_default();
        assert_eq!((cb.width, cb.height), (5, 2));
    }

    #[test]
    fn style_update_marks_dirty() {
        let mut lt = LayoutTree::new();
        let root = num(1);
        let style = NodeStyle {
            width: Dimension::Cells(4),
            height: Dimension::Cells(2),
            ..NodeStyle::default()
        };
        assert!(lt.add_node(root, &style).is_ok());
        assert!(lt.compute(root, 4, 2, |_, _| None).is_ok());
        assert!(!lt.is_dirty(root));
        let wider = NodeStyle {
            width: Dimension::Cells(6),
            ..style
        };
        assert!(lt.update_style(root, &wider).is_ok());
        assert!(lt.is_dirty(root));
    }

    #[test]
    fn children_round_trip_in_order() {
        let mut lt = LayoutTree::new();
        let root = num(1);
        for n in 2..=4 {
            assert!(lt.add_node(num(n), &NodeStyle::default()).is_ok());
        }
        assert!(lt.add_node(root, &NodeStyle::default()).is_ok());
        assert!(lt.set_children(root, &[num(3), num(2), num(4)]).is_ok());
        assert_eq!(
            lt.children(root).unwrap_or_default(),
            vec![num(3), num(2), num(4)]
        );
    }

    #[test]
    fn remove_node_forgets_mapping() {
        let mut lt = LayoutTree::new();
        let n = num(7);
        assert!(lt.add_node(n, &NodeStyle::default()).is_ok());
        assert!(lt.has_node(n));
        assert!(lt.remove_node(n).is_ok());
        assert!(!lt.has_node(n));
        assert!(lt.remove_node(n).is_err());
    }
}
