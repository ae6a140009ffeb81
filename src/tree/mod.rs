mod node;
mod piece;
mod rb_tree;

pub use self::node::Color;
pub(crate) use self::node::{Node, NodeId, SENTINEL};
pub use self::piece::Piece;
pub(crate) use self::rb_tree::{InOrder, RbTree};
