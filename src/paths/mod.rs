//! The polymorphic node model
//!
//! Every location in the composite tree is a node: real directories
//! ([`dir::DirPath`]), virtual directories computed from an archive index
//! ([`archive::ArchiveDir`]), and openable files ([`file`]). The navigator
//! only ever talks to the [`DirNode`] and [`FileNode`] contracts, which is
//! what lets one tree span both addressing schemes.

pub mod archive;
pub mod dir;
pub mod file;

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;
use std::rc::Rc;

use crate::dispatch::{DispatchTable, NodeClass};
use crate::errors::BrowseResult;
use crate::fs::FileEntry;
use crate::launcher::Launcher;

pub use file::FileSource;

/// Session-wide state every node carries: the read-only dispatch table and
/// the password cache keyed by container path.
pub struct Ctx {
    pub dispatch: DispatchTable,
    pub passwords: RefCell<HashMap<String, String>>,
    pub show_hidden: bool,
}

impl Ctx {
    pub fn new(dispatch: DispatchTable, show_hidden: bool) -> Rc<Self> {
        Rc::new(Self {
            dispatch,
            passwords: RefCell::new(HashMap::new()),
            show_hidden,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum NodeKind {
    Directory,
    VirtualDirectory,
    /// Files carry their own classification; the kind tag is reserved for
    /// callers that need a uniform answer across node types
    File,
}

/// Result of resolving one name inside a directory.
pub enum Resolved {
    Dir(Box<dyn DirNode>),
    File(Box<dyn FileNode>),
}

/// Directory contract: listing plus single-segment resolution. Multi-segment
/// paths are the navigator's loop, not the directory's.
pub trait DirNode {
    fn name(&self) -> &str;

    fn kind(&self) -> NodeKind;

    /// Class for prompt/listing color; `None` for a plain real directory.
    fn class(&self) -> Option<NodeClass> {
        None
    }

    /// Full display path of this node (OS path, extended with in-container
    /// segments for virtual nodes).
    fn display_path(&self) -> String;

    /// Ordered children: directories first, then names case-insensitively.
    /// Deterministic while the backing source is unchanged.
    fn list_children(&self) -> BrowseResult<Vec<FileEntry>>;

    /// Look up one child by name.
    fn resolve(&self, name: &str) -> BrowseResult<Resolved>;

    /// Identity for real directories. Archive anchors open their handle
    /// here, so corrupt containers fail before navigation commits.
    fn enter(&self) -> BrowseResult<()> {
        Ok(())
    }

    /// The directory above this one outside the navigation stack. Only
    /// real directories have one; virtual nodes are left via the stack.
    fn parent_dir(&self) -> Option<Box<dyn DirNode>> {
        None
    }

    /// Whether the backing source still exists. A stacked node whose
    /// source vanished makes the full path a broken reference.
    fn source_intact(&self) -> bool {
        true
    }
}

/// File contract: readable content plus external launch.
pub trait FileNode {
    fn name(&self) -> &str;

    fn class(&self) -> NodeClass;

    fn source(&self) -> &FileSource;

    /// A fresh reader over the file's bytes, positioned at the start.
    /// Members of archives are extracted on demand; no temp files appear.
    fn open_for_read(&self) -> BrowseResult<Box<dyn Read>> {
        self.source().open_reader()
    }

    fn read_bytes(&self) -> BrowseResult<Vec<u8>> {
        self.source().read_bytes()
    }

    /// Decode the content as text. Only text-class files decode; the rest
    /// refuse rather than guess.
    fn read_text(&self) -> BrowseResult<String>;

    /// Hand the file to an external program. Never fatal to the session.
    fn launch_external(&self, launcher: &mut Launcher) -> BrowseResult<()> {
        launcher.launch(self.name(), self.source())
    }
}
