//! Filesystem operations

use std::fs;
use std::io;
use std::path::Path;

use super::entry::FileEntry;

/// Read directory contents and return a list of FileEntry, unsorted and
/// unclassified. Entries whose metadata cannot be read are skipped, the
/// same way a panel skips them rather than failing the whole listing.
pub fn read_directory(path: &Path) -> io::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if let Ok(file_entry) = FileEntry::from_path(&entry.path()) {
            entries.push(file_entry);
        }
    }

    Ok(entries)
}
