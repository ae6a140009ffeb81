use super::Piece;

/// Red-black node color.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Index of a node in the tree's arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

/// The shared leaf/null node.  Always black, never holds text.
pub(crate) const SENTINEL: NodeId = NodeId(0);

impl NodeId {
    #[inline(always)]
    pub(crate) fn index(self) -> usize {
        self.0
    }

    #[inline(always)]
    pub(crate) fn is_sentinel(self) -> bool {
        self == SENTINEL
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) piece: Piece,
    pub(crate) color: Color,
    pub(crate) parent: NodeId,
    pub(crate) left: NodeId,
    pub(crate) right: NodeId,
    /// Total length of the left subtree.
    pub(crate) size_left: usize,
    /// Total line feeds of the left subtree.
    pub(crate) lf_left: usize,
    /// False once the node has been removed from the tree.
    pub(crate) live: bool,
}

impl Node {
    /// A fresh red node with no links.
    pub(crate) fn new(piece: Piece) -> Node {
        Node {
            piece,
            color: Color::Red,
            parent: SENTINEL,
            left: SENTINEL,
            right: SENTINEL,
            size_left: 0,
            lf_left: 0,
            live: true,
        }
    }

    pub(crate) fn sentinel() -> Node {
        Node {
            color: Color::Black,
            live: false,
            ..Node::new(Piece::default())
        }
    }
}
