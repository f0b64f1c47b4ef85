//! CSV ingestion: build the index from a data file keyed by its first
//! column.
//!
//! The index never interprets record offsets itself; these helpers are
//! the collaborator that produces offsets while loading and resolves
//! them back to row bytes afterwards.

use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use quarry_common::Result;

use crate::btree::BPlusTree;

/// Builds the index from a CSV data file.
///
/// The first line is treated as a header and skipped. Every following
/// row is inserted as `(first column parsed as i64, byte offset of the
/// row start)`. Rows whose first field is not an integer are skipped.
/// Returns the number of rows indexed.
pub fn build_from_csv(tree: &mut BPlusTree, data_path: impl AsRef<Path>) -> Result<usize> {
    let file = File::open(data_path.as_ref())?;
    let mut reader = BufReader::new(file);

    let mut line = String::new();
    let mut offset = reader.read_line(&mut line)? as i64; // header line
    let mut indexed = 0;

    loop {
        line.clear();
        let consumed = reader.read_line(&mut line)?;
        if consumed == 0 {
            break;
        }

        let field = line.split(',').next().unwrap_or("").trim();
        match field.parse::<i64>() {
            Ok(key) => {
                tree.insert(key, offset)?;
                indexed += 1;
            }
            Err(_) => debug!("skipping row at offset {offset}: non-integer key {field:?}"),
        }

        offset += consumed as i64;
    }

    Ok(indexed)
}

/// Reads the single data-file row starting at `offset`, without its
/// line terminator.
pub fn read_row_at(data_path: impl AsRef<Path>, offset: i64) -> Result<String> {
    if offset < 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("negative row offset {offset}"),
        )
        .into());
    }

    let mut file = File::open(data_path.as_ref())?;
    file.seek(SeekFrom::Start(offset as u64))?;

    let mut line = String::new();
    BufReader::new(file).read_line(&mut line)?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::Pager;
    use std::io::Write as _;
    use tempfile::tempdir;

    const CSV: &str = "id,name,email\n\
                       1,alice,alice@example.com\n\
                       2,bob,bob@example.com\n\
                       5,eve,eve@example.com\n";

    fn write_csv(dir: &Path, contents: &str) -> std::path::PathBuf {
        let path = dir.join("users.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_build_from_csv() {
        let dir = tempdir().unwrap();
        let csv_path = write_csv(dir.path(), CSV);

        let pager = Pager::open(dir.path().join("users_pk.idx"), false).unwrap();
        let mut tree = BPlusTree::open(pager, 4).unwrap();

        let indexed = build_from_csv(&mut tree, &csv_path).unwrap();
        assert_eq!(indexed, 3);

        // Offsets point at the start of each row.
        let header_len = "id,name,email\n".len() as i64;
        assert_eq!(tree.search(1).unwrap(), Some(header_len));
        assert_eq!(tree.search(3).unwrap(), None);
    }

    #[test]
    fn test_build_then_resolve_rows() {
        let dir = tempdir().unwrap();
        let csv_path = write_csv(dir.path(), CSV);

        let pager = Pager::open(dir.path().join("users_pk.idx"), false).unwrap();
        let mut tree = BPlusTree::open(pager, 4).unwrap();
        build_from_csv(&mut tree, &csv_path).unwrap();

        let offset = tree.search(2).unwrap().unwrap();
        assert_eq!(read_row_at(&csv_path, offset).unwrap(), "2,bob,bob@example.com");

        let offset = tree.search(5).unwrap().unwrap();
        assert_eq!(read_row_at(&csv_path, offset).unwrap(), "5,eve,eve@example.com");
    }

    #[test]
    fn test_build_skips_non_integer_keys() {
        let dir = tempdir().unwrap();
        let csv_path = write_csv(
            dir.path(),
            "id,name\n1,alice\nnot-a-number,mallory\n2,bob\n",
        );

        let pager = Pager::open(dir.path().join("users_pk.idx"), false).unwrap();
        let mut tree = BPlusTree::open(pager, 4).unwrap();

        let indexed = build_from_csv(&mut tree, &csv_path).unwrap();
        assert_eq!(indexed, 2);
        assert_eq!(tree.search_range(i64::MIN, i64::MAX).unwrap().len(), 2);
    }

    #[test]
    fn test_read_row_at_negative_offset() {
        let dir = tempdir().unwrap();
        let csv_path = write_csv(dir.path(), CSV);
        assert!(read_row_at(&csv_path, -1).is_err());
    }
}
