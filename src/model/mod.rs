//! Document model: typed field values and the node arena.

pub(crate) mod tree;
pub(crate) mod value;

pub(crate) use tree::{ContainerBody, Design, Direction, Node, NodeId};
pub(crate) use value::{Fields, Size, TextStyle, Value};
