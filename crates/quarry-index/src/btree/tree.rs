//! Disk-backed B+ tree over the Pager.

use log::debug;

use quarry_common::page::PageId;
use quarry_common::{QuarryError, Result};

use super::constants::{MAX_DEGREE, MIN_DEGREE};
use super::node::{InternalPage, LeafEntry, LeafPage, NodePage};
use crate::meta::{MetaPage, META_PAGE_ID};
use crate::pager::Pager;

/// Persistent B+ tree index mapping `i64` keys to the byte offsets of
/// rows in an external data file.
///
/// Every node occupies one page; inter-node references are page ids
/// resolved through the [`Pager`] on each traversal. There is no page
/// cache: operations re-read the pages they touch and write mutations
/// back immediately.
///
/// The tree assumes a single accessor. A mid-insert I/O failure can
/// leave the on-disk structure inconsistent; there is no rollback.
pub struct BPlusTree {
    pager: Pager,
    root_page_id: PageId,
    degree: usize,
}

impl BPlusTree {
    /// Opens a tree over `pager`, bootstrapping an empty index if the
    /// file is new.
    ///
    /// A new file gets a metadata block at page 0 and an empty leaf
    /// root at page 1. An existing file must carry the same `degree` it
    /// was created with.
    pub fn open(pager: Pager, degree: usize) -> Result<Self> {
        if degree < MIN_DEGREE {
            return Err(QuarryError::DegreeTooSmall {
                degree,
                min: MIN_DEGREE,
            });
        }
        if degree > MAX_DEGREE {
            return Err(QuarryError::DegreeTooLarge {
                degree,
                max: MAX_DEGREE,
            });
        }

        if pager.num_pages() == 0 {
            let meta_id = pager.allocate_page()?;
            debug_assert_eq!(meta_id, META_PAGE_ID);
            let root_id = pager.allocate_page()?;

            let mut root = LeafPage::new(PageId::NONE);
            root.set_is_root(true);
            pager.write_page(root_id, root.as_bytes())?;

            let meta = MetaPage::new(root_id, degree as u32);
            pager.write_page(META_PAGE_ID, &meta.to_bytes())?;

            debug!("initialized empty index: root is leaf page {}", root_id);
            return Ok(Self {
                pager,
                root_page_id: root_id,
                degree,
            });
        }

        let meta = MetaPage::from_bytes(&pager.read_page(META_PAGE_ID)?)?;
        if meta.degree as usize != degree {
            return Err(QuarryError::DegreeMismatch {
                stored: meta.degree as usize,
                requested: degree,
            });
        }

        debug!("opened existing index: root is page {}", meta.root_page_id);
        Ok(Self {
            pager,
            root_page_id: meta.root_page_id,
            degree,
        })
    }

    /// Returns the page currently holding the root.
    pub fn root_page_id(&self) -> PageId {
        self.root_page_id
    }

    /// Returns the branching factor.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Returns the underlying pager.
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    fn max_keys(&self) -> usize {
        self.degree - 1
    }

    /// Descends from the root to the leaf that owns `key`.
    fn find_leaf(&self, key: i64) -> Result<(PageId, LeafPage)> {
        let mut current = self.root_page_id;
        loop {
            match NodePage::from_bytes(self.pager.read_page(current)?)? {
                NodePage::Leaf(leaf) => return Ok((current, leaf)),
                NodePage::Internal(node) => current = node.find_child(key),
            }
        }
    }

    /// Point lookup. `Ok(None)` means the key is absent.
    pub fn search(&self, key: i64) -> Result<Option<i64>> {
        let (_, leaf) = self.find_leaf(key)?;
        Ok(leaf.get(key))
    }

    /// Returns the record offsets of all keys in `[start, end]`, in
    /// ascending key order. An inverted range is empty.
    pub fn search_range(&self, start: i64, end: i64) -> Result<Vec<i64>> {
        if start > end {
            return Ok(Vec::new());
        }

        let (leaf_id, mut leaf) = self.find_leaf(start)?;
        let mut current = leaf_id;
        let mut offsets = Vec::new();

        loop {
            for i in 0..leaf.num_keys() as usize {
                let entry = leaf.entry(i);
                if entry.key > end {
                    return Ok(offsets);
                }
                if entry.key >= start {
                    offsets.push(entry.offset);
                }
            }

            match leaf.next_leaf() {
                None => return Ok(offsets),
                Some(next) => {
                    leaf = match NodePage::from_bytes(self.pager.read_page(next)?)? {
                        NodePage::Leaf(leaf) => leaf,
                        NodePage::Internal(_) => {
                            return Err(QuarryError::Corrupted(format!(
                                "leaf chain of page {current} points at internal page {next}"
                            )))
                        }
                    };
                    current = next;
                }
            }
        }
    }

    /// Inserts `(key, offset)`. Duplicate keys are rejected.
    pub fn insert(&mut self, key: i64, offset: i64) -> Result<()> {
        let (leaf_id, mut leaf) = self.find_leaf(key)?;

        if leaf.get(key).is_some() {
            return Err(QuarryError::DuplicateKey { key });
        }

        if (leaf.num_keys() as usize) < self.max_keys() {
            leaf.insert(key, offset);
            return self.pager.write_page(leaf_id, leaf.as_bytes());
        }

        self.split_leaf(leaf_id, leaf, key, offset)
    }

    /// Splits a full leaf around an incoming entry and pushes the
    /// separator up to the parent.
    fn split_leaf(&mut self, old_id: PageId, mut old: LeafPage, key: i64, offset: i64) -> Result<()> {
        let new_id = self.pager.allocate_page()?;

        // The existing degree - 1 entries plus the new one, sorted.
        let mut entries = old.entries();
        let position = entries
            .iter()
            .position(|entry| key < entry.key)
            .unwrap_or(entries.len());
        entries.insert(position, LeafEntry { key, offset });

        let split = self.degree / 2;
        let right_entries = entries.split_off(split);
        let promoted = right_entries[0].key;

        let mut new = LeafPage::new(old.parent());
        new.write_entries(&right_entries);
        new.set_next_leaf(old.next_leaf());

        old.write_entries(&entries);
        old.set_next_leaf(Some(new_id));

        self.pager.write_page(old_id, old.as_bytes())?;
        self.pager.write_page(new_id, new.as_bytes())?;

        debug!(
            "split leaf {} -> {}, promoting key {}",
            old_id, new_id, promoted
        );

        self.insert_into_parent(old.parent(), old_id, promoted, new_id)
    }

    /// Inserts a promoted separator into the parent of a freshly split
    /// pair, splitting the parent in turn if it is full.
    fn insert_into_parent(
        &mut self,
        parent_id: PageId,
        left_id: PageId,
        key: i64,
        right_id: PageId,
    ) -> Result<()> {
        if parent_id.is_none() {
            return self.create_new_root(left_id, key, right_id);
        }

        let mut parent = match NodePage::from_bytes(self.pager.read_page(parent_id)?)? {
            NodePage::Internal(node) => node,
            NodePage::Leaf(_) => {
                return Err(QuarryError::Corrupted(format!(
                    "parent page {parent_id} is a leaf"
                )))
            }
        };

        if (parent.num_keys() as usize) < self.max_keys() {
            parent.insert_separator(key, right_id);
            return self.pager.write_page(parent_id, parent.as_bytes());
        }

        self.split_internal(parent_id, parent, key, right_id)
    }

    /// Replaces a split root with a new internal root over both halves.
    fn create_new_root(&mut self, left_id: PageId, key: i64, right_id: PageId) -> Result<()> {
        let new_root_id = self.pager.allocate_page()?;

        let mut root = InternalPage::new(PageId::NONE);
        root.set_is_root(true);
        root.write_all(&[key], &[left_id, right_id]);

        // Demote both halves before the new root becomes reachable.
        for child_id in [left_id, right_id] {
            let mut child = NodePage::from_bytes(self.pager.read_page(child_id)?)?;
            child.set_is_root(false);
            child.set_parent(new_root_id);
            self.pager.write_page(child_id, child.as_bytes())?;
        }

        self.pager.write_page(new_root_id, root.as_bytes())?;

        let meta = MetaPage::new(new_root_id, self.degree as u32);
        self.pager.write_page(META_PAGE_ID, &meta.to_bytes())?;
        self.root_page_id = new_root_id;

        debug!("root split: new root is internal page {}", new_root_id);
        Ok(())
    }

    /// Splits a full internal node around an incoming separator and
    /// recurses into its parent with the middle key.
    fn split_internal(
        &mut self,
        old_id: PageId,
        mut old: InternalPage,
        key: i64,
        right_child: PageId,
    ) -> Result<()> {
        let new_id = self.pager.allocate_page()?;

        // The existing separators and children plus the new pair,
        // sorted: degree keys and degree + 1 children.
        let (mut keys, mut children) = old.keys_and_children();
        let position = keys.iter().position(|&k| key < k).unwrap_or(keys.len());
        keys.insert(position, key);
        children.insert(position + 1, right_child);

        let split = self.degree / 2;
        let promoted = keys[split];

        let right_keys = keys.split_off(split + 1);
        keys.truncate(split); // the promoted key moves up, not into either half
        let right_children = children.split_off(split + 1);

        let mut new = InternalPage::new(old.parent());
        new.write_all(&right_keys, &right_children);

        old.write_all(&keys, &children);

        // Children handed to the new right node must point back at it.
        for &child_id in &right_children {
            let mut child = NodePage::from_bytes(self.pager.read_page(child_id)?)?;
            child.set_parent(new_id);
            self.pager.write_page(child_id, child.as_bytes())?;
        }

        self.pager.write_page(old_id, old.as_bytes())?;
        self.pager.write_page(new_id, new.as_bytes())?;

        debug!(
            "split internal {} -> {}, promoting key {}",
            old_id, new_id, promoted
        );

        self.insert_into_parent(old.parent(), old_id, promoted, new_id)
    }
}
