//! Page primitives for the Quarry index file.

use serde::{Deserialize, Serialize};

/// Page size in bytes (4 KB).
pub const PAGE_SIZE: usize = 4096;

/// Unique identifier for a page: its 0-based index within the index file.
///
/// On disk a page id is a little-endian signed 64-bit integer; the sentinel
/// value -1 denotes "no page" (absent parent, end of the leaf chain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(i64);

impl PageId {
    /// Sentinel for "no page".
    pub const NONE: PageId = PageId(-1);

    /// Creates a new PageId.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Returns true if this is the "no page" sentinel.
    pub fn is_none(&self) -> bool {
        self.0 < 0
    }

    /// Byte offset of this page within the index file.
    ///
    /// Only meaningful for non-sentinel ids.
    pub fn file_offset(&self) -> u64 {
        self.0.max(0) as u64 * PAGE_SIZE as u64
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node kinds stored in the index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    /// Leaf node holding (key, record offset) entries.
    Leaf = 0,
    /// Internal node holding separator keys and child page ids.
    Internal = 1,
}

impl NodeType {
    /// Decodes a node type byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(NodeType::Leaf),
            1 => Some(NodeType::Internal),
            _ => None,
        }
    }
}

/// Header structure at the beginning of every node page.
///
/// Layout (32 bytes total, integers little-endian):
/// - node_type: 1 byte (0 = leaf, 1 = internal)
/// - is_root: 1 byte
/// - reserved: 6 bytes (zero)
/// - parent_page_id: 8 bytes signed (-1 if none)
/// - num_keys: 2 bytes unsigned
/// - reserved: 6 bytes (zero)
/// - next_leaf_page_id: 8 bytes signed (leaf only; -1 if none)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    /// Kind of this node.
    pub node_type: NodeType,
    /// True if this page is the current root.
    pub is_root: bool,
    /// Page id of the parent node; NONE for the root.
    pub parent_page_id: PageId,
    /// Number of live keys in this node.
    pub num_keys: u16,
    /// Page id of the next leaf in key order; NONE at the chain end.
    pub next_leaf_page_id: PageId,
}

impl NodeHeader {
    /// Size of the node header in bytes.
    pub const SIZE: usize = 32;

    /// Creates a new header for an empty, non-root node.
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            is_root: false,
            parent_page_id: PageId::NONE,
            num_keys: 0,
            next_leaf_page_id: PageId::NONE,
        }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.node_type as u8;
        buf[1] = self.is_root as u8;
        // bytes 2-7 are reserved (already zeroed)
        buf[8..16].copy_from_slice(&self.parent_page_id.as_i64().to_le_bytes());
        buf[16..18].copy_from_slice(&self.num_keys.to_le_bytes());
        // bytes 18-23 are reserved (already zeroed)
        buf[24..32].copy_from_slice(&self.next_leaf_page_id.as_i64().to_le_bytes());
        buf
    }

    /// Deserializes the header from bytes.
    pub fn from_bytes(buf: &[u8]) -> Self {
        let node_type = NodeType::from_u8(buf[0]).unwrap_or(NodeType::Leaf);
        let is_root = buf[1] == 1;
        let parent_page_id = PageId::new(i64::from_le_bytes([
            buf[8], buf[9], buf[10], buf[11], buf[12], buf[13], buf[14], buf[15],
        ]));
        let num_keys = u16::from_le_bytes([buf[16], buf[17]]);
        let next_leaf_page_id = PageId::new(i64::from_le_bytes([
            buf[24], buf[25], buf[26], buf[27], buf[28], buf[29], buf[30], buf[31],
        ]));

        Self {
            node_type,
            is_root,
            parent_page_id,
            num_keys,
            next_leaf_page_id,
        }
    }
}
