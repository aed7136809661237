//! Directory entry representation

use std::fs;
use std::path::Path;

use crate::dispatch::NodeClass;

/// A single child of a directory, real or virtual.
///
/// Listings are metadata only; a child becomes a live node when the
/// navigator resolves it by name.
#[derive(Clone, Debug)]
pub struct FileEntry {
    /// Entry name (one path segment, not a full path)
    pub name: String,
    /// Whether this entry lists as a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Hidden flag (leading '.' on the name)
    pub is_hidden: bool,
    /// Dispatch classification for files; `None` for plain directories
    pub class: Option<NodeClass>,
}

impl FileEntry {
    /// Build an entry from an OS path by reading its metadata.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        // Symlinks list as whatever they point at
        let is_dir = if metadata.is_symlink() {
            fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
        } else {
            metadata.is_dir()
        };

        let size = if is_dir { 0 } else { metadata.len() };
        let is_hidden = name.starts_with('.');

        Ok(Self {
            name,
            is_dir,
            size,
            is_hidden,
            class: None,
        })
    }

    /// Build a synthetic entry for a computed child (archive members).
    pub fn synthetic(name: &str, is_dir: bool, size: u64) -> Self {
        Self {
            name: name.to_string(),
            is_dir,
            size,
            is_hidden: name.starts_with('.'),
            class: None,
        }
    }

    pub fn with_class(mut self, class: NodeClass) -> Self {
        self.class = Some(class);
        self
    }
}

/// Sort a listing in place: directories before files, then by name
/// case-insensitively, with a case-sensitive tiebreak so the order is total.
pub fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| {
        match (a.is_dir, b.is_dir) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
        }
    });
}
