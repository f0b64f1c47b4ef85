//! Disk-resident B+ tree index.
//!
//! Each node is exactly one page of the index file. Page layout:
//!
//! ```text
//! +---------------------------+ 0
//! | Node Header (32 bytes)    |
//! |  node_type, is_root,      |
//! |  parent, num_keys, next   |
//! +---------------------------+ 32
//! | Leaf payload:             |     | Internal payload:          |
//! |  key_0: i64               |     |  child_0: i64              |
//! |  offset_0: i64            |     |  key_0: i64                |
//! |  key_1: i64               |     |  child_1: i64              |
//! |  ...                      |     |  ...                       |
//! +---------------------------+ 4096
//! ```
//!
//! Leaves are chained through `next_leaf_page_id` in ascending key
//! order, so range scans walk siblings without re-descending. Inserts
//! split full nodes bottom-up: a leaf split copies its separator up, an
//! internal split moves its middle key up, and a root split allocates a
//! fresh root, growing the tree by one level.

pub mod constants;
pub mod node;
pub mod tree;

pub use constants::{ENTRY_SIZE, MAX_DEGREE, MIN_DEGREE};
pub use node::{InternalPage, LeafEntry, LeafPage, NodePage};
pub use tree::BPlusTree;
