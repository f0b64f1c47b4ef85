//! Human-readable dump of the index file structure.

use std::fmt::Write as _;

use quarry_common::page::PageId;
use quarry_common::Result;

use crate::btree::NodePage;
use crate::meta::{MetaPage, META_PAGE_ID};
use crate::pager::Pager;

/// Renders the structure of every page in the index file.
///
/// Intended for debugging and demonstrations; the output format is not
/// stable.
pub fn dump_index(pager: &Pager) -> Result<String> {
    let mut out = String::new();
    let num_pages = pager.num_pages();

    if num_pages == 0 {
        out.push_str("index file is empty\n");
        return Ok(out);
    }

    let meta = MetaPage::from_bytes(&pager.read_page(META_PAGE_ID)?)?;
    let _ = writeln!(
        out,
        "[ page 0 | META | root: {} | degree: {} ]",
        meta.root_page_id, meta.degree
    );

    for i in 1..num_pages {
        let page_id = PageId::new(i);
        match NodePage::from_bytes(pager.read_page(page_id)?)? {
            NodePage::Leaf(leaf) => {
                let _ = writeln!(
                    out,
                    "[ page {} | LEAF | keys: {} | parent: {} | next: {} ]",
                    page_id,
                    leaf.num_keys(),
                    leaf.parent(),
                    leaf.next_leaf().unwrap_or(PageId::NONE),
                );
                for entry in leaf.entries() {
                    let _ = writeln!(out, "  {} -> {}", entry.key, entry.offset);
                }
            }
            NodePage::Internal(node) => {
                let _ = writeln!(
                    out,
                    "[ page {} | INTERNAL | keys: {} | parent: {} ]",
                    page_id,
                    node.num_keys(),
                    node.parent(),
                );
                let (keys, children) = node.keys_and_children();
                let _ = writeln!(out, "  ptr -> {}", children[0]);
                for (key, child) in keys.iter().zip(&children[1..]) {
                    let _ = writeln!(out, "  key {}", key);
                    let _ = writeln!(out, "  ptr -> {}", child);
                }
            }
        }
    }

    Ok(out)
}
