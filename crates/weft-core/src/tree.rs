//! The renderable tree: an arena of nodes with layout-order and z-order
//! child lists, dirty tracking, and live-count propagation.
//!
//! The arena owns every node; edges are plain ids. Parent lookups are
//! id-based, never owning, so there are no reference cycles to manage.

use std::collections::HashMap;

use crate::error::{Result, WeftError};
use crate::layout::{LayoutTree, NodeStyle};
use crate::node::{NodeNum, NodeOptions, NodeState};
use crate::renderable::Renderable;

/// One arena slot: engine state + behavior + edges.
pub struct Node {
    pub(crate) state: NodeState,
    pub(crate) behavior: Box<dyn Renderable>,
    pub(crate) parent: Option<NodeNum>,
    pub(crate) children: Vec<NodeNum>,
    pub(crate) by_id: HashMap<String, NodeNum>,
    z_sorted: Vec<NodeNum>,
    z_dirty: bool,
}

impl Node {
    fn new(state: NodeState, behavior: Box<dyn Renderable>) -> Self {
        Self {
            state,
            behavior,
            parent: None,
            children: Vec::new(),
            by_id: HashMap::new(),
            z_sorted: Vec::new(),
            z_dirty: false,
        }
    }
}

/// The renderable tree and its paired layout solver.
pub struct Tree {
    nodes: HashMap<NodeNum, Node>,
    root: NodeNum,
    next_num: u64,
    pub(crate) layout: LayoutTree,
    frame_requested: bool,
}

impl Tree {
    /// Create a tree whose root has the given options and behavior.
    pub fn new(opts: NodeOptions, behavior: Box<dyn Renderable>) -> Result<Self> {
        let mut tree = Self {
            nodes: HashMap::new(),
            root: NodeNum::from_raw(0),
            next_num: 1,
            layout: LayoutTree::new(),
            frame_requested: true,
        };
        let root = tree.create_node(opts, behavior)?;
        tree.root = root;
        tree.recompute_live(root);
        Ok(tree)
    }

    /// The root node.
    pub fn root(&self) -> NodeNum {
        self.root
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty (never true: the root always exists).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `num` names a live node.
    pub fn contains(&self, num: NodeNum) -> bool {
        self.nodes.contains_key(&num)
    }

    /// Create a detached node. It joins the tree via [`Tree::add`] or
    /// [`Tree::insert_before`].
    pub fn create_node(
        &mut self,
        opts: NodeOptions,
        behavior: Box<dyn Renderable>,
    ) -> Result<NodeNum> {
        let num = NodeNum::from_raw(self.next_num);
        self.next_num += 1;
        let state = NodeState::new(num, opts);
        self.layout.add_node(num, &state.style)?;
        let mut node = Node::new(state, behavior);
        node.state.live_count = u32::from(node.state.live && node.state.visible);
        self.nodes.insert(num, node);
        Ok(num)
    }

    /// Append `child` under `parent` (or insert at `index`).
    ///
    /// The child is detached from any previous parent first. A sibling with
    /// the same id is detached and replaced, with a warning.
    pub fn add(&mut self, parent: NodeNum, child: NodeNum, index: Option<usize>) -> Result<()> {
        if !self.contains(parent) {
            return Err(WeftError::UnknownRenderable(format!("{parent:?}")));
        }
        if !self.contains(child) {
            return Err(WeftError::UnknownRenderable(format!("{child:?}")));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(WeftError::InvalidArgument(
                "cannot add a node under itself".into(),
            ));
        }

        self.detach(child)?;

        let child_id = self
            .nodes
            .get(&child)
            .map(|n| n.state.id.clone())
            .unwrap_or_default();
        if !child_id.is_empty()
            && let Some(dup) = self.nodes.get(&parent).and_then(|p| p.by_id.get(&child_id)).copied()
        {
            tracing::warn!(id = %child_id, "duplicate child id; replacing existing child");
            self.detach(dup)?;
        }

        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            return Err(WeftError::UnknownRenderable(format!("{parent:?}")));
        };
        let at = index
            .unwrap_or(parent_node.children.len())
            .min(parent_node.children.len());
        parent_node.children.insert(at, child);
        if !child_id.is_empty() {
            parent_node.by_id.insert(child_id, child);
        }
        parent_node.z_dirty = true;

        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = Some(parent);
        }

        self.sync_layout_children(parent)?;
        self.recompute_live(parent);
        self.request_render(parent);
        Ok(())
    }

    /// Insert `child` immediately before `anchor` under `parent`.
    ///
    /// The anchor must be a current child of `parent`.
    pub fn insert_before(&mut self, parent: NodeNum, child: NodeNum, anchor: NodeNum) -> Result<()> {
        let index = self
            .nodes
            .get(&parent)
            .ok_or_else(|| WeftError::UnknownRenderable(format!("{parent:?}")))?
            .children
            .iter()
            .position(|&c| c == anchor)
            .ok_or_else(|| WeftError::UnknownAnchor(format!("{anchor:?}")))?;
        self.add(parent, child, Some(index))
    }

    /// Detach the child with the given id from `parent` and return it.
    ///
    /// The child is not destroyed; the caller may re-insert it elsewhere.
    pub fn remove(&mut self, parent: NodeNum, id: &str) -> Result<NodeNum> {
        let child = self
            .nodes
            .get(&parent)
            .ok_or_else(|| WeftError::UnknownRenderable(format!("{parent:?}")))?
            .by_id
            .get(id)
            .copied()
            .ok_or_else(|| WeftError::UnknownRenderable(format!("no child with id {id:?}")))?;
        self.detach(child)?;
        self.request_render(parent);
        Ok(child)
    }

    /// Destroy a node and its whole subtree.
    ///
    /// Irreversible and idempotent: destroying an already-destroyed node is
    /// a logged no-op. Owned framebuffers and solver nodes are released.
    pub fn destroy(&mut self, num: NodeNum) {
        if !self.contains(num) {
            tracing::debug!(?num, "destroy on unknown or already-destroyed node");
            return;
        }
        if num == self.root {
            tracing::warn!("destroy called on the root node; ignoring");
            return;
        }
        if self.detach(num).is_err() {
            return;
        }

        let mut stack = vec![num];
        let mut order = Vec::new();
        while let Some(n) = stack.pop() {
            order.push(n);
            if let Some(node) = self.nodes.get(&n) {
                stack.extend(node.children.iter().copied());
            }
        }
        // Children after parents in `order`; release in reverse (leaves first).
        for n in order.into_iter().rev() {
            if let Some(mut node) = self.nodes.remove(&n) {
                node.state.destroyed = true;
                node.state.frame = None;
                if let Err(err) = self.layout.remove_node(n) {
                    tracing::warn!(?n, %err, "failed to release layout node");
                }
            }
        }
    }

    /// First node with the given id in pre-order below `from` (inclusive).
    pub fn find_descendant_by_id(&self, from: NodeNum, id: &str) -> Option<NodeNum> {
        let node = self.nodes.get(&from)?;
        if node.state.id == id {
            return Some(from);
        }
        for &child in &node.children {
            if let Some(found) = self.find_descendant_by_id(child, id) {
                return Some(found);
            }
        }
        None
    }

    /// The parent of `num`, if attached.
    pub fn parent(&self, num: NodeNum) -> Option<NodeNum> {
        self.nodes.get(&num).and_then(|n| n.parent)
    }

    /// Children of `num` in layout (insertion) order.
    pub fn children(&self, num: NodeNum) -> &[NodeNum] {
        self.nodes
            .get(&num)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Children of `num` in z-order: ascending z-index, ties in insertion
    /// order. Re-sorts lazily when a child z-index changed.
    pub fn z_children(&mut self, num: NodeNum) -> Vec<NodeNum> {
        let Some(node) = self.nodes.get(&num) else {
            return Vec::new();
        };
        if !node.z_dirty && node.z_sorted.len() == node.children.len() {
            return node.z_sorted.clone();
        }
        let mut keyed: Vec<(i32, usize, NodeNum)> = node
            .children
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let z = self
                    .nodes
                    .get(&c)
                    .map(|n| n.state.style.z_index)
                    .unwrap_or(0);
                (z, i, c)
            })
            .collect();
        keyed.sort_by_key(|&(z, i, _)| (z, i));
        let sorted: Vec<NodeNum> = keyed.into_iter().map(|(_, _, c)| c).collect();
        if let Some(node) = self.nodes.get_mut(&num) {
            node.z_sorted = sorted.clone();
            node.z_dirty = false;
        }
        sorted
    }

    /// Ancestor chain of `num`, nearest first.
    pub fn ancestors(&self, num: NodeNum) -> Vec<NodeNum> {
        let mut out = Vec::new();
        let mut cur = self.parent(num);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    /// Whether `ancestor` is on the parent chain of `num` (or equal to it).
    pub fn is_ancestor(&self, ancestor: NodeNum, num: NodeNum) -> bool {
        if ancestor == num {
            return true;
        }
        self.ancestors(num).contains(&ancestor)
    }

    /// Whether `num` and all its ancestors are visible.
    pub fn is_effectively_visible(&self, num: NodeNum) -> bool {
        let Some(node) = self.nodes.get(&num) else {
            return false;
        };
        if !node.state.visible {
            return false;
        }
        self.ancestors(num)
            .iter()
            .all(|a| self.nodes.get(a).is_some_and(|n| n.state.visible))
    }

    /// Immutable node state.
    pub fn state(&self, num: NodeNum) -> Result<&NodeState> {
        self.nodes
            .get(&num)
            .map(|n| &n.state)
            .ok_or_else(|| WeftError::UnknownRenderable(format!("{num:?}")))
    }

    /// Mutable node state. Layout-affecting attributes must go through
    /// [`Tree::set_style`] instead so the solver is kept in sync.
    pub fn state_mut(&mut self, num: NodeNum) -> Result<&mut NodeState> {
        self.nodes
            .get_mut(&num)
            .map(|n| &mut n.state)
            .ok_or_else(|| WeftError::UnknownRenderable(format!("{num:?}")))
    }

    pub(crate) fn node_mut(&mut self, num: NodeNum) -> Option<&mut Node> {
        self.nodes.get_mut(&num)
    }

    pub(crate) fn node(&self, num: NodeNum) -> Option<&Node> {
        self.nodes.get(&num)
    }

    /// All node numbers currently in the arena (unordered).
    pub fn node_nums(&self) -> Vec<NodeNum> {
        self.nodes.keys().copied().collect()
    }

    /// The solver's child list for `num`, in layout order.
    pub fn solver_children(&self, num: NodeNum) -> Result<Vec<NodeNum>> {
        self.layout.children(num)
    }

    /// The currently selected text of a node's behavior, if any.
    pub fn selected_text(&self, num: NodeNum) -> Option<String> {
        self.nodes.get(&num).and_then(|n| n.behavior.selected_text())
    }

    /// Concatenated selected text of the given nodes, newline separated.
    pub fn collect_selected_text(&self, nums: &[NodeNum]) -> String {
        let parts: Vec<String> = nums
            .iter()
            .filter_map(|&n| self.selected_text(n))
            .collect();
        parts.join("\n")
    }

    /// Mutate the layout style of `num` and push it into the solver.
    pub fn set_style(&mut self, num: NodeNum, f: impl FnOnce(&mut NodeStyle)) -> Result<()> {
        let parent = self.parent(num);
        let node = self
            .nodes
            .get_mut(&num)
            .ok_or_else(|| WeftError::UnknownRenderable(format!("{num:?}")))?;
        let before_z = node.state.style.z_index;
        f(&mut node.state.style);
        let style = node.state.style.clone();
        let z_changed = style.z_index != before_z;
        self.layout.update_style(num, &style)?;
        if z_changed && let Some(p) = parent
            && let Some(parent_node) = self.nodes.get_mut(&p)
        {
            parent_node.z_dirty = true;
        }
        self.request_render(num);
        Ok(())
    }

    /// Set the post-layout translate offset (cheap scrolling, no re-solve).
    pub fn set_translate(&mut self, num: NodeNum, dx: i32, dy: i32) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&num)
            .ok_or_else(|| WeftError::UnknownRenderable(format!("{num:?}")))?;
        node.state.translate = (dx, dy);
        self.request_render(num);
        Ok(())
    }

    /// Show or hide a node, updating live counts along the parent chain.
    pub fn set_visible(&mut self, num: NodeNum, visible: bool) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&num)
            .ok_or_else(|| WeftError::UnknownRenderable(format!("{num:?}")))?;
        if node.state.visible == visible {
            return Ok(());
        }
        node.state.visible = visible;
        self.recompute_live(num);
        self.request_render(num);
        Ok(())
    }

    /// Mark a node live (needs per-frame ticking) or not.
    pub fn set_live(&mut self, num: NodeNum, live: bool) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&num)
            .ok_or_else(|| WeftError::UnknownRenderable(format!("{num:?}")))?;
        if node.state.live == live {
            return Ok(());
        }
        node.state.live = live;
        self.recompute_live(num);
        self.request_render(num);
        Ok(())
    }

    /// Live, visible nodes in the subtree of `num` (itself included).
    pub fn live_count(&self, num: NodeNum) -> u32 {
        self.nodes.get(&num).map(|n| n.state.live_count).unwrap_or(0)
    }

    /// Mark `num` dirty and signal that a frame is wanted.
    pub fn request_render(&mut self, num: NodeNum) {
        if let Some(node) = self.nodes.get_mut(&num) {
            node.state.dirty = true;
        }
        self.frame_requested = true;
    }

    /// Consume the pending frame request flag.
    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }

    /// Run the flexbox solve if anything is dirty.
    pub fn solve_layout(&mut self, width: u16, height: u16) -> Result<()> {
        let root = self.root;
        if !self.layout.is_dirty(root) {
            return Ok(());
        }
        let nodes = &self.nodes;
        self.layout
            .compute(root, width, height, |num, proposed| {
                nodes.get(&num).and_then(|n| n.behavior.measure(proposed))
            })
    }

    /// Detach `num` from its parent, updating id maps, z cache, layout
    /// edges, and live counts. Detaching a parentless node is a no-op.
    fn detach(&mut self, num: NodeNum) -> Result<()> {
        let Some(parent) = self.parent(num) else {
            return Ok(());
        };
        let child_id = self
            .nodes
            .get(&num)
            .map(|n| n.state.id.clone())
            .unwrap_or_default();
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|&c| c != num);
            parent_node.z_sorted.retain(|&c| c != num);
            if parent_node.by_id.get(&child_id) == Some(&num) {
                parent_node.by_id.remove(&child_id);
            }
        }
        if let Some(node) = self.nodes.get_mut(&num) {
            node.parent = None;
        }
        self.sync_layout_children(parent)?;
        self.recompute_live(parent);
        Ok(())
    }

    /// Mirror a node's child list into the solver, preserving order.
    fn sync_layout_children(&mut self, num: NodeNum) -> Result<()> {
        let children = self
            .nodes
            .get(&num)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        self.layout.set_children(num, &children)
    }

    /// Recompute live counts from `num` up to the root.
    ///
    /// A hidden node contributes zero regardless of its subtree; counts of
    /// untouched subtrees are reused from cache.
    fn recompute_live(&mut self, num: NodeNum) {
        let mut cur = Some(num);
        while let Some(n) = cur {
            let computed = match self.nodes.get(&n) {
                Some(node) => {
                    if node.state.visible {
                        let own = u32::from(node.state.live);
                        let kids: u32 = node
                            .children
                            .iter()
                            .filter_map(|c| self.nodes.get(c))
                            .map(|c| c.state.live_count)
                            .sum();
                        own + kids
                    } else {
                        0
                    }
                }
                None => break,
            };
            if let Some(node) = self.nodes.get_mut(&n) {
                node.state.live_count = computed;
            }
            cur = self.parent(n);
        }
    }
}
