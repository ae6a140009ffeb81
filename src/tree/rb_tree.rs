use super::{Color, Node, NodeId, Piece, SENTINEL};
use crate::apply_delta;

/// An order-statistics red-black tree of pieces.
///
/// Nodes live in an arena, with slot 0 holding the shared sentinel.  Each
/// node caches the total length and line feeds of its left subtree, which
/// is enough to locate any offset or line in O(log N) time.  Removed
/// nodes are recycled through a free list.
#[derive(Debug, Clone)]
pub(crate) struct RbTree {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
    count: usize,
}

impl RbTree {
    pub fn new() -> Self {
        RbTree {
            nodes: vec![Node::sentinel()],
            free: Vec::new(),
            root: SENTINEL,
            count: 0,
        }
    }

    //---------------------------------------------------------
    // Accessors.

    #[inline(always)]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the tree.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.root.is_sentinel()
    }

    #[inline(always)]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline(always)]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline(always)]
    pub fn piece(&self, id: NodeId) -> &Piece {
        &self.node(id).piece
    }

    #[inline(always)]
    pub fn left(&self, id: NodeId) -> NodeId {
        self.node(id).left
    }

    #[inline(always)]
    pub fn right(&self, id: NodeId) -> NodeId {
        self.node(id).right
    }

    #[inline(always)]
    pub fn parent(&self, id: NodeId) -> NodeId {
        self.node(id).parent
    }

    #[inline(always)]
    fn color(&self, id: NodeId) -> Color {
        self.node(id).color
    }

    #[inline(always)]
    fn set_color(&mut self, id: NodeId, color: Color) {
        // The sentinel is only ever painted black.
        if !id.is_sentinel() || color == Color::Black {
            self.node_mut(id).color = color;
        }
    }

    #[inline(always)]
    fn is_red(&self, id: NodeId) -> bool {
        self.color(id) == Color::Red
    }

    /// Whether `id` currently refers to a node in the tree.
    #[inline(always)]
    pub fn is_live(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).map(|n| n.live).unwrap_or(false)
    }

    //---------------------------------------------------------
    // Navigation.

    pub fn leftmost(&self, mut id: NodeId) -> NodeId {
        while !self.left(id).is_sentinel() {
            id = self.left(id);
        }
        id
    }

    pub fn rightmost(&self, mut id: NodeId) -> NodeId {
        while !self.right(id).is_sentinel() {
            id = self.right(id);
        }
        id
    }

    /// The first node in document order, or the sentinel.
    #[inline]
    pub fn first(&self) -> NodeId {
        if self.is_empty() {
            SENTINEL
        } else {
            self.leftmost(self.root)
        }
    }

    /// In-order successor, or the sentinel.
    pub fn next(&self, id: NodeId) -> NodeId {
        if !self.right(id).is_sentinel() {
            return self.leftmost(self.right(id));
        }
        let mut node = id;
        while !self.parent(node).is_sentinel() {
            let parent = self.parent(node);
            if self.left(parent) == node {
                return parent;
            }
            node = parent;
        }
        SENTINEL
    }

    /// In-order predecessor, or the sentinel.
    pub fn prev(&self, id: NodeId) -> NodeId {
        if !self.left(id).is_sentinel() {
            return self.rightmost(self.left(id));
        }
        let mut node = id;
        while !self.parent(node).is_sentinel() {
            let parent = self.parent(node);
            if self.right(parent) == node {
                return parent;
            }
            node = parent;
        }
        SENTINEL
    }

    /// Iterates over the nodes in document order.
    pub fn iter(&self) -> InOrder<'_> {
        InOrder {
            tree: self,
            stack: Vec::new(),
            current: self.root,
        }
    }

    //---------------------------------------------------------
    // Aggregates.

    /// Total length of the subtree rooted at `id`.  Walks the right spine.
    pub fn subtree_len(&self, mut id: NodeId) -> usize {
        let mut len = 0;
        while !id.is_sentinel() {
            let node = self.node(id);
            len += node.size_left + node.piece.length;
            id = node.right;
        }
        len
    }

    /// Total line feeds of the subtree rooted at `id`.
    pub fn subtree_line_feeds(&self, mut id: NodeId) -> usize {
        let mut lf = 0;
        while !id.is_sentinel() {
            let node = self.node(id);
            lf += node.lf_left + node.piece.line_feed_count;
            id = node.right;
        }
        lf
    }

    /// Document offset at which the node's piece starts.
    pub fn offset_of(&self, id: NodeId) -> usize {
        let mut offset = self.node(id).size_left;
        let mut node = id;
        while node != self.root {
            let parent = self.parent(node);
            if self.right(parent) == node {
                offset += self.node(parent).size_left + self.piece(parent).length;
            }
            node = parent;
        }
        offset
    }

    /// Number of line feeds in the document before the node's piece.
    pub fn line_feeds_before(&self, id: NodeId) -> usize {
        let mut lf = self.node(id).lf_left;
        let mut node = id;
        while node != self.root {
            let parent = self.parent(node);
            if self.right(parent) == node {
                lf += self.node(parent).lf_left + self.piece(parent).line_feed_count;
            }
            node = parent;
        }
        lf
    }

    /// Propagates a change of `delta` in the length of `id`'s piece (and
    /// `lf_delta` in its line feeds) to every ancestor that has `id` in its
    /// left subtree.
    pub fn update_metadata(&mut self, id: NodeId, delta: isize, lf_delta: isize) {
        if delta == 0 && lf_delta == 0 {
            return;
        }
        let mut node = id;
        while node != self.root && !node.is_sentinel() {
            let parent = self.parent(node);
            if self.left(parent) == node {
                let p = self.node_mut(parent);
                p.size_left = apply_delta(p.size_left, delta);
                p.lf_left = apply_delta(p.lf_left, lf_delta);
            }
            node = parent;
        }
    }

    /// Replaces the piece of `id`, keeping the aggregates up to date.
    pub fn replace_piece(&mut self, id: NodeId, piece: Piece) {
        let old = self.node(id).piece;
        self.node_mut(id).piece = piece;
        self.update_metadata(
            id,
            piece.length as isize - old.length as isize,
            piece.line_feed_count as isize - old.line_feed_count as isize,
        );
    }

    /// Recomputes the aggregates of `id` and all of its ancestors from
    /// their left subtrees.
    fn recompute_upwards(&mut self, mut id: NodeId) {
        while !id.is_sentinel() {
            let left = self.left(id);
            let size_left = self.subtree_len(left);
            let lf_left = self.subtree_line_feeds(left);
            let node = self.node_mut(id);
            node.size_left = size_left;
            node.lf_left = lf_left;
            id = node.parent;
        }
    }

    //---------------------------------------------------------
    // Insertion.

    /// Inserts `piece` immediately after `anchor` in document order.  On an
    /// empty tree `anchor` is ignored and the piece becomes the root.
    pub fn insert_right(&mut self, anchor: NodeId, piece: Piece) -> NodeId {
        let z = self.alloc(piece);
        if self.root.is_sentinel() {
            self.root = z;
        } else if self.right(anchor).is_sentinel() {
            self.node_mut(anchor).right = z;
            self.node_mut(z).parent = anchor;
        } else {
            let next = self.leftmost(self.right(anchor));
            self.node_mut(next).left = z;
            self.node_mut(z).parent = next;
        }
        self.update_metadata(z, piece.length as isize, piece.line_feed_count as isize);
        self.insert_fixup(z);
        z
    }

    /// Inserts `piece` immediately before `anchor` in document order.  On an
    /// empty tree `anchor` is ignored and the piece becomes the root.
    pub fn insert_left(&mut self, anchor: NodeId, piece: Piece) -> NodeId {
        let z = self.alloc(piece);
        if self.root.is_sentinel() {
            self.root = z;
        } else if self.left(anchor).is_sentinel() {
            self.node_mut(anchor).left = z;
            self.node_mut(z).parent = anchor;
        } else {
            let prev = self.rightmost(self.left(anchor));
            self.node_mut(prev).right = z;
            self.node_mut(z).parent = prev;
        }
        self.update_metadata(z, piece.length as isize, piece.line_feed_count as isize);
        self.insert_fixup(z);
        z
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while z != self.root && self.is_red(self.parent(z)) {
            let parent = self.parent(z);
            let grandparent = self.parent(parent);
            if parent == self.left(grandparent) {
                let uncle = self.right(grandparent);
                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    z = grandparent;
                } else {
                    if z == self.right(parent) {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.parent(z);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.left(grandparent);
                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    z = grandparent;
                } else {
                    if z == self.left(parent) {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.parent(z);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_left(grandparent);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    //---------------------------------------------------------
    // Removal.

    /// Unlinks `z` from the tree and frees its slot.
    pub fn remove(&mut self, z: NodeId) {
        debug_assert!(self.is_live(z));

        let (y, x) = if self.left(z).is_sentinel() {
            (z, self.right(z))
        } else if self.right(z).is_sentinel() {
            (z, self.left(z))
        } else {
            let y = self.leftmost(self.right(z));
            (y, self.right(y))
        };

        if y == self.root {
            self.root = x;
            if !x.is_sentinel() {
                self.node_mut(x).parent = SENTINEL;
                self.set_color(x, Color::Black);
            }
            self.free_node(z);
            return;
        }

        let y_was_red = self.is_red(y);
        let y_parent = self.parent(y);
        if self.left(y_parent) == y {
            self.node_mut(y_parent).left = x;
        } else {
            self.node_mut(y_parent).right = x;
        }

        let x_parent = if y != z && y_parent == z { y } else { y_parent };
        if !x.is_sentinel() {
            self.node_mut(x).parent = x_parent;
        }

        if y != z {
            // Move `y` into `z`'s place.
            let (z_left, z_right, z_parent, z_color) = {
                let n = self.node(z);
                (n.left, n.right, n.parent, n.color)
            };
            {
                let n = self.node_mut(y);
                n.left = z_left;
                n.right = z_right;
                n.parent = z_parent;
                n.color = z_color;
            }
            if z == self.root {
                self.root = y;
            } else if self.left(z_parent) == z {
                self.node_mut(z_parent).left = y;
            } else {
                self.node_mut(z_parent).right = y;
            }
            if !z_left.is_sentinel() {
                self.node_mut(z_left).parent = y;
            }
            if !z_right.is_sentinel() {
                self.node_mut(z_right).parent = y;
            }
        }

        self.free_node(z);
        self.recompute_upwards(x_parent);

        if !y_was_red {
            self.delete_fixup(x, x_parent);
        }
    }

    fn delete_fixup(&mut self, mut x: NodeId, mut x_parent: NodeId) {
        while x != self.root && !self.is_red(x) {
            if x == self.left(x_parent) {
                let mut w = self.right(x_parent);
                if self.is_red(w) {
                    self.set_color(w, Color::Black);
                    self.set_color(x_parent, Color::Red);
                    self.rotate_left(x_parent);
                    w = self.right(x_parent);
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.set_color(w, Color::Red);
                    x = x_parent;
                    x_parent = self.parent(x);
                } else {
                    if !self.is_red(self.right(w)) {
                        let w_left = self.left(w);
                        self.set_color(w_left, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right(x_parent);
                    }
                    let parent_color = self.color(x_parent);
                    self.set_color(w, parent_color);
                    self.set_color(x_parent, Color::Black);
                    let w_right = self.right(w);
                    self.set_color(w_right, Color::Black);
                    self.rotate_left(x_parent);
                    x = self.root;
                }
            } else {
                let mut w = self.left(x_parent);
                if self.is_red(w) {
                    self.set_color(w, Color::Black);
                    self.set_color(x_parent, Color::Red);
                    self.rotate_right(x_parent);
                    w = self.left(x_parent);
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.set_color(w, Color::Red);
                    x = x_parent;
                    x_parent = self.parent(x);
                } else {
                    if !self.is_red(self.left(w)) {
                        let w_right = self.right(w);
                        self.set_color(w_right, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left(x_parent);
                    }
                    let parent_color = self.color(x_parent);
                    self.set_color(w, parent_color);
                    self.set_color(x_parent, Color::Black);
                    let w_left = self.left(w);
                    self.set_color(w_left, Color::Black);
                    self.rotate_right(x_parent);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    //---------------------------------------------------------
    // Rotations.  Both keep `size_left`/`lf_left` exact in O(1).

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right(x);
        let (x_size_left, x_lf_left, x_len, x_lf) = {
            let n = self.node(x);
            (n.size_left, n.lf_left, n.piece.length, n.piece.line_feed_count)
        };
        {
            let n = self.node_mut(y);
            n.size_left += x_size_left + x_len;
            n.lf_left += x_lf_left + x_lf;
        }

        let y_left = self.left(y);
        self.node_mut(x).right = y_left;
        if !y_left.is_sentinel() {
            self.node_mut(y_left).parent = x;
        }
        let x_parent = self.parent(x);
        self.node_mut(y).parent = x_parent;
        if x_parent.is_sentinel() {
            self.root = y;
        } else if self.left(x_parent) == x {
            self.node_mut(x_parent).left = y;
        } else {
            self.node_mut(x_parent).right = y;
        }
        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;
    }

    fn rotate_right(&mut self, y: NodeId) {
        let x = self.left(y);
        let x_right = self.right(x);
        self.node_mut(y).left = x_right;
        if !x_right.is_sentinel() {
            self.node_mut(x_right).parent = y;
        }
        let y_parent = self.parent(y);
        self.node_mut(x).parent = y_parent;

        let (x_size_left, x_lf_left, x_len, x_lf) = {
            let n = self.node(x);
            (n.size_left, n.lf_left, n.piece.length, n.piece.line_feed_count)
        };
        {
            let n = self.node_mut(y);
            n.size_left -= x_size_left + x_len;
            n.lf_left -= x_lf_left + x_lf;
        }

        if y_parent.is_sentinel() {
            self.root = x;
        } else if self.right(y_parent) == y {
            self.node_mut(y_parent).right = x;
        } else {
            self.node_mut(y_parent).left = x;
        }
        self.node_mut(x).right = y;
        self.node_mut(y).parent = x;
    }

    //---------------------------------------------------------
    // Arena.

    fn alloc(&mut self, piece: Piece) -> NodeId {
        self.count += 1;
        let node = Node::new(piece);
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            id
        } else {
            self.nodes.push(node);
            NodeId(self.nodes.len() - 1)
        }
    }

    fn free_node(&mut self, id: NodeId) {
        self.count -= 1;
        let node = self.node_mut(id);
        node.live = false;
        node.parent = SENTINEL;
        node.left = SENTINEL;
        node.right = SENTINEL;
        node.size_left = 0;
        node.lf_left = 0;
        self.free.push(id);
    }

    //---------------------------------------------------------
    // Debugging.

    /// Checks the red-black, parent-link and aggregate invariants.
    ///
    /// Iterative, so it works even on a badly unbalanced tree.
    pub fn check_invariants(&self) -> Result<(), String> {
        let sentinel = self.node(SENTINEL);
        if sentinel.color != Color::Black
            || sentinel.piece.length != 0
            || sentinel.size_left != 0
            || sentinel.lf_left != 0
        {
            return Err("sentinel was modified".into());
        }
        if self.root.is_sentinel() {
            return if self.count == 0 {
                Ok(())
            } else {
                Err(format!("empty tree reports {} nodes", self.count))
            };
        }
        if !self.parent(self.root).is_sentinel() {
            return Err("root has a parent".into());
        }
        if self.is_red(self.root) {
            return Err("root is red".into());
        }

        // (subtree length, subtree line feeds, black height)
        let mut info: Vec<(usize, usize, usize)> = vec![(0, 0, 0); self.nodes.len()];
        let mut stack = vec![(self.root, false)];
        let mut visited = 0;
        while let Some((id, expanded)) = stack.pop() {
            let node = self.node(id);
            if !node.live {
                return Err(format!("node {} is reachable but freed", id.index()));
            }
            if !expanded {
                stack.push((id, true));
                for child in [node.left, node.right] {
                    if child.is_sentinel() {
                        continue;
                    }
                    if self.parent(child) != id {
                        return Err(format!("node {} has a bad parent link", child.index()));
                    }
                    stack.push((child, false));
                }
                continue;
            }

            let (left_len, left_lf, left_bh) = info[node.left.index()];
            let (right_len, right_lf, right_bh) = info[node.right.index()];
            if node.size_left != left_len || node.lf_left != left_lf {
                return Err(format!(
                    "node {} caches ({}, {}) for its left subtree, actual ({}, {})",
                    id.index(),
                    node.size_left,
                    node.lf_left,
                    left_len,
                    left_lf
                ));
            }
            if node.color == Color::Red && (self.is_red(node.left) || self.is_red(node.right)) {
                return Err(format!("red node {} has a red child", id.index()));
            }
            if left_bh != right_bh {
                return Err(format!("black height mismatch under node {}", id.index()));
            }
            let own_black = (node.color == Color::Black) as usize;
            info[id.index()] = (
                left_len + node.piece.length + right_len,
                left_lf + node.piece.line_feed_count + right_lf,
                left_bh + own_black,
            );
            visited += 1;
        }

        if visited != self.count {
            return Err(format!(
                "{} nodes reachable, {} recorded",
                visited, self.count
            ));
        }
        Ok(())
    }
}

//=============================================================

/// In-order traversal with an explicit stack.
#[derive(Clone)]
pub(crate) struct InOrder<'a> {
    tree: &'a RbTree,
    stack: Vec<NodeId>,
    current: NodeId,
}

impl<'a> Iterator for InOrder<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while !self.current.is_sentinel() {
            self.stack.push(self.current);
            self.current = self.tree.left(self.current);
        }
        let id = self.stack.pop()?;
        self.current = self.tree.right(id);
        Some(id)
    }
}

//=============================================================
