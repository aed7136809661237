//! File nodes: text, binary, and externally-opened files
//!
//! A file node is a name, a classification, and a backing source. The
//! source is the piece that unifies the two addressing schemes: an OS path
//! or a member of an open archive, read through on-demand extraction.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::rc::Rc;

use crate::archive::ArchiveHandle;
use crate::dispatch::NodeClass;
use crate::errors::{BrowseError, BrowseResult};

use super::FileNode;

/// Where a file's bytes live.
pub enum FileSource {
    /// A real file on disk
    Fs(PathBuf),
    /// A member inside an open archive
    Member {
        handle: Rc<ArchiveHandle>,
        path: String,
    },
}

impl FileSource {
    pub fn read_bytes(&self) -> BrowseResult<Vec<u8>> {
        match self {
            FileSource::Fs(path) => std::fs::read(path)
                .map_err(|e| BrowseError::from_io(e, &path.display().to_string())),
            FileSource::Member { handle, path } => handle.extract(path),
        }
    }

    pub fn open_reader(&self) -> BrowseResult<Box<dyn Read>> {
        match self {
            FileSource::Fs(path) => {
                let file = File::open(path)
                    .map_err(|e| BrowseError::from_io(e, &path.display().to_string()))?;
                Ok(Box::new(file))
            }
            FileSource::Member { handle, path } => {
                Ok(Box::new(Cursor::new(handle.extract(path)?)))
            }
        }
    }

}

/// UTF-8 text file.
pub struct TextFile {
    name: String,
    source: FileSource,
}

/// Raw bytes, never decoded.
pub struct BinaryFile {
    name: String,
    source: FileSource,
}

/// Opened by an external program chosen from the handler rules.
pub struct ViewerFile {
    name: String,
    source: FileSource,
}

/// Construct the concrete node for a classification. Archive-classified
/// names become directory nodes before this is reached; if one slips
/// through it is treated as opaque bytes.
pub fn file_node(name: &str, class: NodeClass, source: FileSource) -> Box<dyn FileNode> {
    let name = name.to_string();
    match class {
        NodeClass::Text => Box::new(TextFile { name, source }),
        NodeClass::Viewer => Box::new(ViewerFile { name, source }),
        NodeClass::Binary | NodeClass::Archive(_) => Box::new(BinaryFile { name, source }),
    }
}

impl FileNode for TextFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> NodeClass {
        NodeClass::Text
    }

    fn source(&self) -> &FileSource {
        &self.source
    }

    fn read_text(&self) -> BrowseResult<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| BrowseError::Decode(self.name.clone(), format!("{e}")))
    }
}

impl FileNode for BinaryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> NodeClass {
        NodeClass::Binary
    }

    fn source(&self) -> &FileSource {
        &self.source
    }

    fn read_text(&self) -> BrowseResult<String> {
        Err(BrowseError::Decode(
            self.name.clone(),
            "binary file is not decoded as text".to_string(),
        ))
    }
}

impl FileNode for ViewerFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> NodeClass {
        NodeClass::Viewer
    }

    fn source(&self) -> &FileSource {
        &self.source
    }

    fn read_text(&self) -> BrowseResult<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| BrowseError::Decode(self.name.clone(), format!("{e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn fs_text_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greeting.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all("hello".as_bytes())
            .unwrap();

        let node = file_node("greeting.txt", NodeClass::Text, FileSource::Fs(path));
        let first = node.read_text().unwrap();
        let second = node.read_text().unwrap();
        assert_eq!(first, "hello");
        assert_eq!(first, second);

        let mut via_reader = String::new();
        node.open_for_read()
            .unwrap()
            .read_to_string(&mut via_reader)
            .unwrap();
        assert_eq!(via_reader, "hello");
    }

    #[test]
    fn text_decode_failure_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[0xff, 0xfe, 0x00])
            .unwrap();

        let node = file_node("bad.txt", NodeClass::Text, FileSource::Fs(path));
        match node.read_text() {
            Err(BrowseError::Decode(name, _)) => assert_eq!(name, "bad.txt"),
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[test]
    fn binary_file_refuses_text_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let node = file_node("blob.bin", NodeClass::Binary, FileSource::Fs(path));
        assert!(matches!(node.read_text(), Err(BrowseError::Decode(..))));
        assert_eq!(node.read_bytes().unwrap(), vec![1, 2, 3]);
    }
}
