//! Pager for page-level file I/O over the index file.

use log::debug;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use quarry_common::page::{PageId, PAGE_SIZE};
use quarry_common::{IndexConfig, QuarryError, Result};

/// Treats a regular file as a growable array of fixed-size pages and
/// mediates all disk I/O for the index.
///
/// A successful [`Pager::write_page`] has synced its bytes to stable
/// storage before returning (unless fsync is disabled, e.g. in tests).
/// The pager never frees pages.
pub struct Pager {
    /// Path of the index file.
    path: PathBuf,
    /// Sync writes to stable storage before returning.
    fsync_enabled: bool,
    /// File handle and derived counters.
    state: Mutex<PagerState>,
}

struct PagerState {
    file: File,
    file_size: u64,
    num_pages: i64,
}

impl Pager {
    /// Opens or creates the index file at `path`.
    pub fn open(path: impl AsRef<Path>, fsync_enabled: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|source| QuarryError::IoOpen {
                path: path.clone(),
                source,
            })?;

        let file_size = file
            .metadata()
            .map_err(|source| QuarryError::IoOpen {
                path: path.clone(),
                source,
            })?
            .len();
        let num_pages = (file_size / PAGE_SIZE as u64) as i64;

        debug!("opened index file {} ({} pages)", path.display(), num_pages);

        Ok(Self {
            path,
            fsync_enabled,
            state: Mutex::new(PagerState {
                file,
                file_size,
                num_pages,
            }),
        })
    }

    /// Opens a pager from an index configuration.
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        Self::open(&config.path, config.fsync_enabled)
    }

    /// Returns the path of the index file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads page `page_id` in full.
    pub fn read_page(&self, page_id: PageId) -> Result<[u8; PAGE_SIZE]> {
        let mut state = self.state.lock();

        let offset = page_id.file_offset();
        if page_id.is_none() || offset >= state.file_size {
            return Err(QuarryError::ReadPastEnd {
                page_id,
                offset,
                file_size: state.file_size,
            });
        }

        state
            .file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| QuarryError::IoRead {
                page_id,
                offset,
                source,
            })?;

        let mut buffer = [0u8; PAGE_SIZE];
        state
            .file
            .read_exact(&mut buffer)
            .map_err(|source| QuarryError::IoRead {
                page_id,
                offset,
                source,
            })?;

        Ok(buffer)
    }

    /// Writes page `page_id` in full and flushes it to stable storage.
    pub fn write_page(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        debug_assert!(!page_id.is_none());

        let mut state = self.state.lock();
        let offset = page_id.file_offset();

        state
            .file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| state.file.write_all(data))
            .map_err(|source| QuarryError::IoWrite {
                page_id,
                offset,
                source,
            })?;

        if self.fsync_enabled {
            state
                .file
                .sync_all()
                .map_err(|source| QuarryError::IoWrite {
                    page_id,
                    offset,
                    source,
                })?;
        }

        // Update the size and page count if we extended the file
        if offset + PAGE_SIZE as u64 > state.file_size {
            state.file_size = offset + PAGE_SIZE as u64;
            state.num_pages = (state.file_size / PAGE_SIZE as u64) as i64;
        }

        Ok(())
    }

    /// Allocates the next page, zero-filled and persisted.
    ///
    /// Returns the PageId of the newly allocated page. Callers are
    /// expected to follow up with a `write_page` carrying initialized
    /// content.
    pub fn allocate_page(&self) -> Result<PageId> {
        let mut state = self.state.lock();

        let page_id = PageId::new(state.num_pages);
        let offset = page_id.file_offset();

        state
            .file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| state.file.write_all(&[0u8; PAGE_SIZE]))
            .map_err(|source| QuarryError::IoWrite {
                page_id,
                offset,
                source,
            })?;

        if self.fsync_enabled {
            state
                .file
                .sync_all()
                .map_err(|source| QuarryError::IoWrite {
                    page_id,
                    offset,
                    source,
                })?;
        }

        state.num_pages += 1;
        state.file_size = state.file_size.max(offset + PAGE_SIZE as u64);

        debug!("allocated page {}", page_id);
        Ok(page_id)
    }

    /// Returns the number of pages in the index file.
    pub fn num_pages(&self) -> i64 {
        self.state.lock().num_pages
    }

    /// Flushes pending writes to disk.
    pub fn sync(&self) -> Result<()> {
        self.state.lock().file.sync_all()?;
        Ok(())
    }

    /// Syncs and releases the file handle.
    pub fn close(self) -> Result<()> {
        self.sync()
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        let _ = self.state.lock().file.sync_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_pager() -> (Pager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let pager = Pager::open(dir.path().join("test.idx"), false).unwrap();
        (pager, dir)
    }

    #[test]
    fn test_pager_open_empty() {
        let (pager, _dir) = create_test_pager();
        assert_eq!(pager.num_pages(), 0);
    }

    #[test]
    fn test_pager_allocate_page() {
        let (pager, _dir) = create_test_pager();

        let page1 = pager.allocate_page().unwrap();
        assert_eq!(page1.as_i64(), 0);

        let page2 = pager.allocate_page().unwrap();
        assert_eq!(page2.as_i64(), 1);

        assert_eq!(pager.num_pages(), 2);
    }

    #[test]
    fn test_pager_allocate_zero_fills() {
        let (pager, _dir) = create_test_pager();

        let page_id = pager.allocate_page().unwrap();
        let data = pager.read_page(page_id).unwrap();
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pager_write_read() {
        let (pager, _dir) = create_test_pager();

        let page_id = pager.allocate_page().unwrap();

        let mut data = [0u8; PAGE_SIZE];
        data[0] = 0xAB;
        data[100] = 0xCD;
        data[PAGE_SIZE - 1] = 0xEF;
        pager.write_page(page_id, &data).unwrap();

        let read_data = pager.read_page(page_id).unwrap();
        assert_eq!(read_data[0], 0xAB);
        assert_eq!(read_data[100], 0xCD);
        assert_eq!(read_data[PAGE_SIZE - 1], 0xEF);
    }

    #[test]
    fn test_pager_write_extends_file() {
        let (pager, _dir) = create_test_pager();

        // Writing page 0 directly (without allocate) grows the file.
        let data = [0x11u8; PAGE_SIZE];
        pager.write_page(PageId::new(0), &data).unwrap();
        assert_eq!(pager.num_pages(), 1);

        pager.write_page(PageId::new(1), &data).unwrap();
        assert_eq!(pager.num_pages(), 2);
    }

    #[test]
    fn test_pager_overwrite_page() {
        let (pager, _dir) = create_test_pager();

        let page_id = pager.allocate_page().unwrap();

        let mut data1 = [0u8; PAGE_SIZE];
        data1[0] = 0xAA;
        pager.write_page(page_id, &data1).unwrap();

        let mut data2 = [0u8; PAGE_SIZE];
        data2[0] = 0xBB;
        pager.write_page(page_id, &data2).unwrap();

        let read_data = pager.read_page(page_id).unwrap();
        assert_eq!(read_data[0], 0xBB);
    }

    #[test]
    fn test_pager_read_past_end() {
        let (pager, _dir) = create_test_pager();

        pager.allocate_page().unwrap();

        let result = pager.read_page(PageId::new(99));
        assert!(matches!(
            result,
            Err(QuarryError::ReadPastEnd { page_id, .. }) if page_id == PageId::new(99)
        ));
    }

    #[test]
    fn test_pager_read_sentinel() {
        let (pager, _dir) = create_test_pager();

        pager.allocate_page().unwrap();

        let result = pager.read_page(PageId::NONE);
        assert!(matches!(result, Err(QuarryError::ReadPastEnd { .. })));
    }

    #[test]
    fn test_pager_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persist.idx");
        let page_id;

        {
            let pager = Pager::open(&path, true).unwrap();
            page_id = pager.allocate_page().unwrap();

            let mut data = [0u8; PAGE_SIZE];
            data[0] = 0xFF;
            pager.write_page(page_id, &data).unwrap();
            pager.close().unwrap();
        }

        {
            let pager = Pager::open(&path, true).unwrap();
            assert_eq!(pager.num_pages(), 1);

            let read_data = pager.read_page(page_id).unwrap();
            assert_eq!(read_data[0], 0xFF);
        }
    }

    #[test]
    fn test_pager_from_config() {
        let dir = tempdir().unwrap();
        let config = IndexConfig {
            path: dir.path().join("cfg.idx"),
            degree: 4,
            fsync_enabled: false,
        };

        let pager = Pager::from_config(&config).unwrap();
        assert_eq!(pager.num_pages(), 0);
        assert_eq!(pager.path(), config.path.as_path());
    }

    #[test]
    fn test_pager_open_bad_path() {
        let dir = tempdir().unwrap();
        let result = Pager::open(dir.path().join("missing").join("test.idx"), false);
        assert!(matches!(result, Err(QuarryError::IoOpen { .. })));
    }

    #[test]
    fn test_pager_sync() {
        let (pager, _dir) = create_test_pager();

        pager.allocate_page().unwrap();
        pager.sync().unwrap();
    }
}
