//! The row heap (spec.md §4.3): a flat file of fixed-width records,
//! appended in order and never rewritten.
//!
//! Grounded in `common::disk_manager::DiskManager`'s positioned I/O, the
//! same way `node_store` is, but without a node's structural concerns —
//! this is a plain array-of-records file. Row width is carried as a
//! `const` generic (`W`) rather than a runtime field or a single global
//! constant (see SPEC_FULL.md §2), so a short or long read is a compile
//! error, not a runtime surprise.

use common::{RowIndex, Result};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

/// Owns the table file for a row width of `W` bytes.
pub struct RowStore<const W: usize> {
    file: File,
}

impl<const W: usize> RowStore<W> {
    /// Creates a fresh, empty table file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Opens an existing table file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    /// Appends `row` at the slot for `row_index`. Rows are never rewritten
    /// by the core; it is the caller's responsibility to pass a fresh,
    /// monotonically increasing `row_index`.
    pub fn append(&mut self, row_index: RowIndex, row: &[u8; W]) -> Result<()> {
        let offset = row_index * W as u64;
        self.file.write_all_at(row, offset)?;
        Ok(())
    }

    /// Reads the row at `row_index`.
    pub fn fetch(&self, row_index: RowIndex) -> Result<[u8; W]> {
        let offset = row_index * W as u64;
        let mut buf = [0u8; W];
        self.file.read_exact_at(&mut buf, offset)?;
        Ok(buf)
    }
}
