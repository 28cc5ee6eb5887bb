//! Persistent B+ tree index: node layout and tree operations

pub mod btree;
pub mod node;

pub use btree::BPlusTree;
pub use node::{node_capacity, Node, NODE_HEADER_SIZE};
