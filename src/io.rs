//! Positioned file I/O for extent and map files
//!
//! Extent files are opened and closed per operation; no descriptor outlives
//! a read or write. Writes may land past the current end of file, which
//! leaves the intervening bytes as filesystem holes — the sparse-fold model
//! never reads them.

use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Read exactly `buf.len()` bytes at `offset`.
pub fn read_at(path: &Path, offset: u64, buf: &mut [u8]) -> Result<()> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(buf)?;
    Ok(())
}

/// Write `buf` at `offset`, creating the file when absent.
pub fn write_at(path: &Path, offset: u64, buf: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new().write(true).create(true).open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(buf)?;
    Ok(())
}

/// Overwrite a whole file with `buf`.
pub fn write_all(path: &Path, buf: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_positioned_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extent0");

        write_at(&path, 0, b"0123456789").unwrap();
        write_at(&path, 4, b"QQQQ").unwrap();

        let mut buf = [0u8; 10];
        read_at(&path, 0, &mut buf).unwrap();
        assert_eq!(&buf, b"0123QQQQ89");

        let mut tail = [0u8; 2];
        read_at(&path, 8, &mut tail).unwrap();
        assert_eq!(&tail, b"89");
    }

    #[test]
    fn test_write_past_end_leaves_hole() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extent1");

        write_at(&path, 100, b"xy").unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 102);

        let mut buf = [1u8; 4];
        read_at(&path, 98, &mut buf).unwrap();
        assert_eq!(&buf, &[0, 0, b'x', b'y']);
    }

    #[test]
    fn test_short_read_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extent2");
        write_all(&path, b"abc").unwrap();

        let mut buf = [0u8; 8];
        assert!(read_at(&path, 0, &mut buf).is_err());
    }
}
