//! Archive handles and the codec contract
//!
//! An archive appears in the tree as a virtual directory. One
//! [`ArchiveHandle`] per entered archive owns the decoded member index and
//! the codec used for extraction; every node inside that subtree shares the
//! handle. The index is read once and treated read-only — archives are
//! never mutated through the browser.

mod sevenz;
mod tar;
mod zip;

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::PathBuf;

use crate::errors::{BrowseError, BrowseResult};

/// Container formats with a built-in backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    SevenZip,
    Zip,
    Tar,
    TarGz,
    TarBz2,
    TarXz,
}

impl ArchiveFormat {
    /// Detect a format from a file name. Longer suffixes win, so
    /// `foo.tar.gz` is a tarball rather than a bare gzip stream.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") || name.ends_with(".tbz") {
            Some(ArchiveFormat::TarBz2)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(ArchiveFormat::TarXz)
        } else if name.ends_with(".tar") {
            Some(ArchiveFormat::Tar)
        } else if name.ends_with(".7z") {
            Some(ArchiveFormat::SevenZip)
        } else if name.ends_with(".zip") || name.ends_with(".jar") {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArchiveFormat::SevenZip => "7Z",
            ArchiveFormat::Zip => "ZIP",
            ArchiveFormat::Tar => "TAR",
            ArchiveFormat::TarGz => "TAR.GZ",
            ArchiveFormat::TarBz2 => "TAR.BZ2",
            ArchiveFormat::TarXz => "TAR.XZ",
        }
    }
}

/// One entry of an archive's flat member index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Internal path, `/`-separated, no leading or trailing separator
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
}

/// Normalize a member path: backslashes to `/`, strip leading `./` and
/// any surrounding separators.
pub fn normalize_member_path(p: &str) -> String {
    p.replace('\\', "/")
        .trim_start_matches("./")
        .trim_matches('/')
        .to_string()
}

/// Where an archive's raw bytes come from. A `Buffer` source is what makes
/// nested archives work: the inner container is extracted into memory by
/// the outer handle and decoded from there.
pub enum ByteSource {
    File(PathBuf),
    Buffer(Vec<u8>),
}

pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

impl ByteSource {
    /// Open a fresh reader positioned at the start.
    pub fn open(&self) -> std::io::Result<Box<dyn ReadSeek + '_>> {
        match self {
            ByteSource::File(path) => Ok(Box::new(File::open(path)?)),
            ByteSource::Buffer(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
        }
    }

    pub fn len(&self) -> std::io::Result<u64> {
        match self {
            ByteSource::File(path) => Ok(std::fs::metadata(path)?.len()),
            ByteSource::Buffer(bytes) => Ok(bytes.len() as u64),
        }
    }
}

/// Contract a container backend must satisfy to appear as a browsable
/// directory: decode the member index once, extract one member on demand.
pub trait ArchiveCodec {
    fn read_index(&mut self) -> BrowseResult<Vec<Member>>;
    fn extract(&mut self, member: &str) -> BrowseResult<Vec<u8>>;
}

/// Construct the codec for a format over a byte source.
pub fn open_codec(
    format: ArchiveFormat,
    source: ByteSource,
    password: Option<&str>,
    label: &str,
) -> Box<dyn ArchiveCodec> {
    match format {
        ArchiveFormat::SevenZip => Box::new(sevenz::SevenZipCodec::new(source, password, label)),
        ArchiveFormat::Zip => Box::new(zip::ZipCodec::new(source, password, label)),
        ArchiveFormat::Tar => Box::new(tar::TarCodec::new(source, None, label)),
        ArchiveFormat::TarGz => Box::new(tar::TarCodec::new(source, Some(tar::Compression::Gzip), label)),
        ArchiveFormat::TarBz2 => {
            Box::new(tar::TarCodec::new(source, Some(tar::Compression::Bzip2), label))
        }
        ArchiveFormat::TarXz => Box::new(tar::TarCodec::new(source, Some(tar::Compression::Xz), label)),
    }
}

/// A child of a virtual directory, borrowed from the member index.
pub struct Child<'a> {
    /// Final path segment, relative to the queried prefix
    pub name: &'a str,
    pub member: &'a Member,
}

/// An open archive: decoded index plus the codec for extraction.
pub struct ArchiveHandle {
    label: String,
    codec: RefCell<Box<dyn ArchiveCodec>>,
    index: Vec<Member>,
}

impl ArchiveHandle {
    /// Decode the member index and return an open handle.
    pub fn open(
        format: ArchiveFormat,
        source: ByteSource,
        password: Option<&str>,
        label: &str,
    ) -> BrowseResult<Self> {
        let codec = open_codec(format, source, password, label);
        Self::from_codec(codec, label)
    }

    /// Open over an already-constructed codec. Tests inject fakes here.
    pub fn from_codec(mut codec: Box<dyn ArchiveCodec>, label: &str) -> BrowseResult<Self> {
        let raw = codec.read_index()?;
        Ok(Self {
            label: label.to_string(),
            codec: RefCell::new(codec),
            index: build_index(raw),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Members exactly one level below `prefix` (`""` for the archive
    /// root). Implicit directories were synthesized at index build time, so
    /// a plain filter suffices; order follows the index, which is itself
    /// derivation-order independent of the container's member order.
    pub fn children_at(&self, prefix: &str) -> Vec<Child<'_>> {
        let prefix = prefix.trim_matches('/');
        self.index
            .iter()
            .filter_map(|m| {
                let rel = if prefix.is_empty() {
                    m.path.as_str()
                } else {
                    m.path
                        .strip_prefix(prefix)?
                        .strip_prefix('/')?
                };
                if rel.is_empty() || rel.contains('/') {
                    None
                } else {
                    Some(Child { name: rel, member: m })
                }
            })
            .collect()
    }

    /// Look up one member by full internal path.
    pub fn member(&self, path: &str) -> Option<&Member> {
        self.index.iter().find(|m| m.path == path)
    }

    /// The full normalized index.
    pub fn members(&self) -> &[Member] {
        &self.index
    }

    /// Extract one member's bytes. A member present in the index but gone
    /// from the container is a race against external modification and
    /// surfaces as `MemberNotFound`.
    pub fn extract(&self, member_path: &str) -> BrowseResult<Vec<u8>> {
        match self.member(member_path) {
            Some(m) if !m.is_dir => {}
            Some(_) => {
                return Err(BrowseError::NotAFile(member_path.to_string()));
            }
            None => {
                return Err(BrowseError::MemberNotFound {
                    archive: self.label.clone(),
                    member: member_path.to_string(),
                });
            }
        }
        self.codec.borrow_mut().extract(member_path)
    }
}

/// Normalize raw members into the canonical index: paths cleaned, entries
/// deduplicated, and parent directories synthesized for formats that omit
/// them (a member `a/b/c` implies directories `a` and `a/b`).
fn build_index(raw: Vec<Member>) -> Vec<Member> {
    let mut seen_dirs: HashSet<String> = HashSet::new();
    let mut seen_files: HashSet<String> = HashSet::new();
    let mut index: Vec<Member> = Vec::new();

    for member in raw {
        let path = normalize_member_path(&member.path);
        if path.is_empty() || path == "." {
            continue;
        }

        let mut current = String::new();
        for component in path.split('/') {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(component);

            if current != path && seen_dirs.insert(current.clone()) {
                index.push(Member {
                    path: current.clone(),
                    size: 0,
                    is_dir: true,
                });
            }
        }

        if member.is_dir {
            if seen_dirs.insert(path.clone()) {
                index.push(Member { path, size: 0, is_dir: true });
            }
        } else if seen_files.insert(path.clone()) {
            index.push(Member {
                path,
                size: member.size,
                is_dir: false,
            });
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeCodec {
        members: Vec<Member>,
    }

    impl ArchiveCodec for FakeCodec {
        fn read_index(&mut self) -> BrowseResult<Vec<Member>> {
            Ok(self.members.clone())
        }

        fn extract(&mut self, member: &str) -> BrowseResult<Vec<u8>> {
            Ok(member.as_bytes().to_vec())
        }
    }

    fn file(path: &str, size: u64) -> Member {
        Member { path: path.to_string(), size, is_dir: false }
    }

    fn handle(members: Vec<Member>) -> ArchiveHandle {
        ArchiveHandle::from_codec(Box::new(FakeCodec { members }), "test.zip").unwrap()
    }

    #[test]
    fn implicit_directories_are_synthesized() {
        // No explicit entry for "a" or "a/b" — only the deep file
        let h = handle(vec![file("a/b/c", 3)]);

        let root: Vec<&str> = h.children_at("").iter().map(|c| c.name).collect();
        assert_eq!(root, vec!["a"]);

        let nested: Vec<&str> = h.children_at("a/b").iter().map(|c| c.name).collect();
        assert_eq!(nested, vec!["c"]);
        assert!(h.member("a/b").unwrap().is_dir);
    }

    #[test]
    fn derivation_is_independent_of_member_order() {
        let forward = handle(vec![file("x/one", 1), file("x/two", 2), file("y", 3)]);
        let reverse = handle(vec![file("y", 3), file("x/two", 2), file("x/one", 1)]);

        let mut a: Vec<String> = forward.children_at("x").iter().map(|c| c.name.to_string()).collect();
        let mut b: Vec<String> = reverse.children_at("x").iter().map(|c| c.name.to_string()).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn listing_is_deterministic() {
        let h = handle(vec![file("d/f1", 1), file("d/f2", 2), file("top", 0)]);
        let first: Vec<String> = h.children_at("d").iter().map(|c| c.name.to_string()).collect();
        let second: Vec<String> = h.children_at("d").iter().map(|c| c.name.to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn paths_are_normalized() {
        let h = handle(vec![file("dir\\sub\\file.txt", 9), file("./plain.txt", 1)]);
        assert!(h.member("dir/sub/file.txt").is_some());
        assert!(h.member("plain.txt").is_some());

        let root: Vec<&str> = h.children_at("").iter().map(|c| c.name).collect();
        assert!(root.contains(&"dir"));
        assert!(root.contains(&"plain.txt"));
    }

    #[test]
    fn extract_of_unknown_member_is_member_not_found() {
        let h = handle(vec![file("present.txt", 1)]);
        match h.extract("absent.txt") {
            Err(BrowseError::MemberNotFound { member, .. }) => assert_eq!(member, "absent.txt"),
            other => panic!("expected MemberNotFound, got {other:?}"),
        }
    }

    #[test]
    fn format_detection_prefers_longest_suffix() {
        assert_eq!(ArchiveFormat::from_name("a.tar.gz"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_name("a.tgz"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_name("a.tar"), Some(ArchiveFormat::Tar));
        assert_eq!(ArchiveFormat::from_name("A.7Z"), Some(ArchiveFormat::SevenZip));
        assert_eq!(ArchiveFormat::from_name("a.txt"), None);
    }
}
