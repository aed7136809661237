//! Real filesystem directory node

use std::path::PathBuf;
use std::rc::Rc;

use crate::dispatch::NodeClass;
use crate::errors::{BrowseError, BrowseResult};
use crate::fs::{read_directory, sort_entries, FileEntry};

use super::archive::ArchiveDir;
use super::file::{file_node, FileSource};
use super::{Ctx, DirNode, NodeKind, Resolved};

/// A directory backed by the OS. Holds nothing but its absolute path;
/// children are re-read on every listing, so two instances for the same
/// path are interchangeable.
pub struct DirPath {
    name: String,
    path: PathBuf,
    ctx: Rc<Ctx>,
}

impl DirPath {
    pub fn new(path: PathBuf, ctx: Rc<Ctx>) -> Self {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path, ctx }
    }
}

impl DirNode for DirPath {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Directory
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn list_children(&self) -> BrowseResult<Vec<FileEntry>> {
        if !self.path.is_dir() {
            return Err(BrowseError::NotADirectory(self.display_path()));
        }

        let mut entries = read_directory(&self.path)
            .map_err(|e| BrowseError::from_io(e, &self.display_path()))?;

        if !self.ctx.show_hidden {
            entries.retain(|e| !e.is_hidden);
        }
        for entry in entries.iter_mut() {
            if !entry.is_dir {
                entry.class = Some(self.ctx.dispatch.classify(&entry.name));
            }
        }

        sort_entries(&mut entries);
        Ok(entries)
    }

    fn resolve(&self, name: &str) -> BrowseResult<Resolved> {
        let child = self.path.join(name);
        let metadata = std::fs::symlink_metadata(&child)
            .map_err(|e| BrowseError::from_io(e, &child.display().to_string()))?;

        // Follow symlinks for the directory decision
        let is_dir = if metadata.is_symlink() {
            std::fs::metadata(&child).map(|m| m.is_dir()).unwrap_or(false)
        } else {
            metadata.is_dir()
        };

        if is_dir {
            return Ok(Resolved::Dir(Box::new(DirPath::new(child, self.ctx.clone()))));
        }

        match self.ctx.dispatch.classify(name) {
            NodeClass::Archive(format) => {
                let anchor_path = child.display().to_string();
                Ok(Resolved::Dir(Box::new(ArchiveDir::anchor(
                    name,
                    format,
                    FileSource::Fs(child),
                    anchor_path,
                    self.ctx.clone(),
                ))))
            }
            class => Ok(Resolved::File(file_node(name, class, FileSource::Fs(child)))),
        }
    }

    fn parent_dir(&self) -> Option<Box<dyn DirNode>> {
        self.path
            .parent()
            .map(|p| Box::new(DirPath::new(p.to_path_buf(), self.ctx.clone())) as Box<dyn DirNode>)
    }

    fn source_intact(&self) -> bool {
        self.path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchTable;
    use std::fs;

    fn ctx() -> Rc<Ctx> {
        Ctx::new(DispatchTable::defaults(), true)
    }

    #[test]
    fn listing_is_sorted_and_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let node = DirPath::new(dir.path().to_path_buf(), ctx());
        let first: Vec<String> = node
            .list_children()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        let second: Vec<String> = node
            .list_children()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();

        assert_eq!(first, vec!["sub", "a.txt", "b.txt"]);
        assert_eq!(first, second);
    }

    #[test]
    fn resolve_missing_child_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let node = DirPath::new(dir.path().to_path_buf(), ctx());

        match node.resolve("ghost.txt") {
            Err(BrowseError::NotFound(_)) => {}
            other => panic!(
                "expected NotFound, got {:?}",
                other.err().map(|e| e.to_string())
            ),
        }
    }

    #[test]
    fn resolve_dispatches_subdir_file_and_archive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("note.txt"), "x").unwrap();
        fs::write(dir.path().join("data.zip"), "not really a zip").unwrap();

        let node = DirPath::new(dir.path().to_path_buf(), ctx());

        assert!(matches!(node.resolve("sub"), Ok(Resolved::Dir(_))));
        assert!(matches!(node.resolve("note.txt"), Ok(Resolved::File(_))));
        // Classified as an archive by name; the bogus content only fails
        // later, when the handle is actually opened.
        assert!(matches!(node.resolve("data.zip"), Ok(Resolved::Dir(_))));
    }
}
