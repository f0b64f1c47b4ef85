//! Metadata page: durable root discovery for the index file.
//!
//! Page 0 of every index file is a metadata block rather than a tree
//! node. It records which page currently holds the root, so reopening a
//! file whose root has migrated through splits lands on the right page.
//! The first tree node is therefore always allocated at page 1.

use quarry_common::page::{PageId, PAGE_SIZE};
use quarry_common::{QuarryError, Result};

/// Page id of the metadata block.
pub const META_PAGE_ID: PageId = PageId::new(0);

/// Magic bytes identifying a Quarry index file.
const META_MAGIC: [u8; 4] = *b"QRYI";

/// Current on-disk format version.
const META_VERSION: u16 = 1;

/// In-memory view of the metadata page.
///
/// Layout (little-endian):
/// - magic: 4 bytes (`QRYI`)
/// - version: 2 bytes
/// - reserved: 2 bytes (zero)
/// - root_page_id: 8 bytes signed
/// - degree: 4 bytes unsigned
/// - remainder of the page zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaPage {
    /// Page currently holding the tree root.
    pub root_page_id: PageId,
    /// Branching factor the file was created with.
    pub degree: u32,
}

impl MetaPage {
    /// Creates a new metadata view.
    pub fn new(root_page_id: PageId, degree: u32) -> Self {
        Self {
            root_page_id,
            degree,
        }
    }

    /// Serializes the metadata to a full page.
    pub fn to_bytes(&self) -> [u8; PAGE_SIZE] {
        let mut buf = [0u8; PAGE_SIZE];
        buf[0..4].copy_from_slice(&META_MAGIC);
        buf[4..6].copy_from_slice(&META_VERSION.to_le_bytes());
        // bytes 6-7 are reserved (already zeroed)
        buf[8..16].copy_from_slice(&self.root_page_id.as_i64().to_le_bytes());
        buf[16..20].copy_from_slice(&self.degree.to_le_bytes());
        buf
    }

    /// Deserializes the metadata from a full page, validating magic and
    /// version.
    pub fn from_bytes(buf: &[u8; PAGE_SIZE]) -> Result<Self> {
        if buf[0..4] != META_MAGIC {
            return Err(QuarryError::Corrupted(format!(
                "bad magic in metadata page: {:02x?}",
                &buf[0..4]
            )));
        }

        let version = u16::from_le_bytes([buf[4], buf[5]]);
        if version != META_VERSION {
            return Err(QuarryError::Corrupted(format!(
                "unsupported format version {version}"
            )));
        }

        let root_page_id = PageId::new(i64::from_le_bytes([
            buf[8], buf[9], buf[10], buf[11], buf[12], buf[13], buf[14], buf[15],
        ]));
        let degree = u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]);

        Ok(Self {
            root_page_id,
            degree,
        })
    }
}
