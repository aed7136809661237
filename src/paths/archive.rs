//! Virtual directory over an archive
//!
//! One `ArchiveDir` is the *anchor* of an entered archive: it owns the
//! lazily-opened handle. Directories deeper inside the same container are
//! non-anchor nodes sharing that handle. An archive member that is itself
//! an archive becomes a fresh anchor whose byte source is the outer
//! handle, which is all the nesting support there is — nothing assumes a
//! container lives on disk.

use std::cell::RefCell;
use std::rc::Rc;

use crate::archive::{ArchiveFormat, ArchiveHandle, ByteSource};
use crate::dispatch::NodeClass;
use crate::errors::{BrowseError, BrowseResult};
use crate::fs::{sort_entries, FileEntry};

use super::file::{file_node, FileSource};
use super::{Ctx, DirNode, NodeKind, Resolved};

pub struct ArchiveDir {
    name: String,
    format: ArchiveFormat,
    /// Display path of the container file; also the password cache key
    anchor_path: String,
    /// Internal prefix this node represents, "" at the archive root
    prefix: String,
    /// Backing bytes of the container; anchors only
    source: Option<FileSource>,
    /// Closed (`None`) until first enter/listing
    handle: RefCell<Option<Rc<ArchiveHandle>>>,
    ctx: Rc<Ctx>,
}

impl ArchiveDir {
    /// Root node of a container, in the Closed state.
    pub fn anchor(
        name: &str,
        format: ArchiveFormat,
        source: FileSource,
        anchor_path: String,
        ctx: Rc<Ctx>,
    ) -> Self {
        Self {
            name: name.to_string(),
            format,
            anchor_path,
            prefix: String::new(),
            source: Some(source),
            handle: RefCell::new(None),
            ctx,
        }
    }

    /// A directory one level deeper inside an already-open container.
    fn nested(&self, name: &str, prefix: String, handle: Rc<ArchiveHandle>) -> Self {
        Self {
            name: name.to_string(),
            format: self.format,
            anchor_path: self.anchor_path.clone(),
            prefix,
            source: None,
            handle: RefCell::new(Some(handle)),
            ctx: self.ctx.clone(),
        }
    }

    /// Closed → Open: decode the member index once and cache the handle.
    fn open_handle(&self) -> BrowseResult<Rc<ArchiveHandle>> {
        if let Some(handle) = self.handle.borrow().as_ref() {
            return Ok(handle.clone());
        }

        let source = self
            .source
            .as_ref()
            .ok_or_else(|| BrowseError::BrokenReference(self.display_path()))?;

        let bytes = match source {
            FileSource::Fs(path) => ByteSource::File(path.clone()),
            FileSource::Member { handle, path } => ByteSource::Buffer(handle.extract(path)?),
        };

        let password = self.ctx.passwords.borrow().get(&self.anchor_path).cloned();
        let handle = Rc::new(ArchiveHandle::open(
            self.format,
            bytes,
            password.as_deref(),
            &self.anchor_path,
        )?);

        *self.handle.borrow_mut() = Some(handle.clone());
        Ok(handle)
    }

    fn member_path(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }
}

impl DirNode for ArchiveDir {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::VirtualDirectory
    }

    fn class(&self) -> Option<NodeClass> {
        Some(NodeClass::Archive(self.format))
    }

    fn display_path(&self) -> String {
        if self.prefix.is_empty() {
            self.anchor_path.clone()
        } else {
            format!("{}/{}", self.anchor_path, self.prefix)
        }
    }

    fn list_children(&self) -> BrowseResult<Vec<FileEntry>> {
        let handle = self.open_handle()?;

        let mut entries: Vec<FileEntry> = handle
            .children_at(&self.prefix)
            .into_iter()
            .map(|child| {
                let entry =
                    FileEntry::synthetic(child.name, child.member.is_dir, child.member.size);
                if child.member.is_dir {
                    entry
                } else {
                    entry.with_class(self.ctx.dispatch.classify(child.name))
                }
            })
            .collect();

        if !self.ctx.show_hidden {
            entries.retain(|e| !e.is_hidden);
        }

        sort_entries(&mut entries);
        Ok(entries)
    }

    fn resolve(&self, name: &str) -> BrowseResult<Resolved> {
        let handle = self.open_handle()?;

        let is_dir = {
            let children = handle.children_at(&self.prefix);
            match children.iter().find(|c| c.name == name) {
                Some(child) => child.member.is_dir,
                None => {
                    return Err(BrowseError::NotFound(format!(
                        "{}/{}",
                        self.display_path(),
                        name
                    )));
                }
            }
        };

        let member_path = self.member_path(name);

        if is_dir {
            return Ok(Resolved::Dir(Box::new(
                self.nested(name, member_path, handle),
            )));
        }

        match self.ctx.dispatch.classify(name) {
            NodeClass::Archive(format) => {
                // An archive inside an archive: a new anchor fed from this
                // handle instead of the filesystem.
                let anchor_path = format!("{}/{}", self.display_path(), name);
                Ok(Resolved::Dir(Box::new(ArchiveDir::anchor(
                    name,
                    format,
                    FileSource::Member {
                        handle,
                        path: member_path,
                    },
                    anchor_path,
                    self.ctx.clone(),
                ))))
            }
            class => Ok(Resolved::File(file_node(
                name,
                class,
                FileSource::Member {
                    handle,
                    path: member_path,
                },
            ))),
        }
    }

    fn enter(&self) -> BrowseResult<()> {
        self.open_handle().map(|_| ())
    }

    fn source_intact(&self) -> bool {
        match &self.source {
            Some(FileSource::Fs(path)) => path.is_file(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchTable;
    use crate::paths::FileNode;
    use std::io::Write;

    fn ctx() -> Rc<Ctx> {
        Ctx::new(DispatchTable::defaults(), true)
    }

    fn make_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn anchor_for(path: std::path::PathBuf, ctx: Rc<Ctx>) -> ArchiveDir {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let display = path.display().to_string();
        ArchiveDir::anchor(
            &name,
            ArchiveFormat::Zip,
            FileSource::Fs(path),
            display,
            ctx,
        )
    }

    #[test]
    fn listing_groups_members_one_level_deep() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("docs.zip");
        std::fs::write(
            &zip_path,
            make_zip(&[
                ("readme.txt", b"top"),
                ("guide/intro.txt", b"one"),
                ("guide/deep/more.txt", b"two"),
            ]),
        )
        .unwrap();

        let node = anchor_for(zip_path, ctx());
        let names: Vec<String> = node
            .list_children()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();

        // "guide" inferred from its members, listed before the file
        assert_eq!(names, vec!["guide", "readme.txt"]);

        match node.resolve("guide").unwrap() {
            Resolved::Dir(guide) => {
                let inner: Vec<String> = guide
                    .list_children()
                    .unwrap()
                    .into_iter()
                    .map(|e| e.name)
                    .collect();
                assert_eq!(inner, vec!["deep", "intro.txt"]);
            }
            Resolved::File(_) => panic!("guide should resolve as a directory"),
        }
    }

    #[test]
    fn nested_archive_resolves_without_disk_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let inner = make_zip(&[("doc.txt", b"nested hello")]);
        let outer_path = dir.path().join("outer.zip");
        std::fs::write(&outer_path, make_zip(&[("inner.zip", &inner)])).unwrap();

        let outer = anchor_for(outer_path, ctx());

        let inner_dir = match outer.resolve("inner.zip").unwrap() {
            Resolved::Dir(d) => d,
            Resolved::File(_) => panic!("inner.zip should resolve as an enterable archive"),
        };

        let doc = match inner_dir.resolve("doc.txt").unwrap() {
            Resolved::File(f) => f,
            Resolved::Dir(_) => panic!("doc.txt should resolve as a file"),
        };

        assert_eq!(doc.read_bytes().unwrap(), b"nested hello");
        // Round trip: a second read yields identical bytes
        assert_eq!(doc.read_bytes().unwrap(), b"nested hello");
    }

    #[test]
    fn corrupt_container_fails_on_enter() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("broken.zip");
        std::fs::write(&zip_path, b"this is no zip at all").unwrap();

        let node = anchor_for(zip_path, ctx());
        assert!(matches!(
            node.enter(),
            Err(BrowseError::UnreadableArchive(..))
        ));
    }

    #[test]
    fn missing_member_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("one.zip");
        std::fs::write(&zip_path, make_zip(&[("only.txt", b"x")])).unwrap();

        let node = anchor_for(zip_path, ctx());
        assert!(matches!(
            node.resolve("absent.txt"),
            Err(BrowseError::NotFound(_))
        ));
    }
}
