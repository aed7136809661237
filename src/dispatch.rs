//! Extension → node-class dispatch
//!
//! Built once at session start from the builtin defaults plus config
//! overrides, then read-only. Consulted during listing and resolution to
//! decide which concrete node type backs a name.

use std::collections::{BTreeMap, HashMap};

use crate::archive::ArchiveFormat;
use crate::errors::{BrowseError, BrowseResult};

/// Which concrete node type represents a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// UTF-8 text, printed on open
    Text,
    /// Raw bytes, no decoding
    Binary,
    /// Handed to an external program on open
    Viewer,
    /// Enterable container
    Archive(ArchiveFormat),
}

impl NodeClass {
    /// Parse a config-facing class name. Archive classes are named by
    /// their format ("7z", "zip", "tar.gz", ...) so the extension alone
    /// never has to imply one.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(NodeClass::Text),
            "binary" => Some(NodeClass::Binary),
            "viewer" => Some(NodeClass::Viewer),
            other => ArchiveFormat::from_name(&format!("x.{other}")).map(NodeClass::Archive),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeClass::Text => "text",
            NodeClass::Binary => "binary",
            NodeClass::Viewer => "viewer",
            NodeClass::Archive(_) => "archive",
        }
    }
}

fn builtin() -> Vec<(&'static str, NodeClass)> {
    use ArchiveFormat::*;
    use NodeClass::*;

    vec![
        (".txt", Text),
        (".md", Text),
        (".log", Text),
        (".toml", Text),
        (".json", Text),
        (".cfg", Text),
        (".rs", Text),
        (".bin", Binary),
        (".dat", Binary),
        (".exe", Binary),
        (".so", Binary),
        (".o", Binary),
        (".jpg", Viewer),
        (".jpeg", Viewer),
        (".png", Viewer),
        (".gif", Viewer),
        (".bmp", Viewer),
        (".webp", Viewer),
        (".svg", Viewer),
        (".pdf", Viewer),
        (".mp4", Viewer),
        (".mkv", Viewer),
        (".webm", Viewer),
        (".mp3", Viewer),
        (".flac", Viewer),
        (".ogg", Viewer),
        (".wav", Viewer),
        (".7z", Archive(SevenZip)),
        (".zip", Archive(Zip)),
        (".jar", Archive(Zip)),
        (".tar", Archive(Tar)),
        (".tgz", Archive(TarGz)),
        (".tar.gz", Archive(TarGz)),
        (".tbz", Archive(TarBz2)),
        (".tbz2", Archive(TarBz2)),
        (".tar.bz2", Archive(TarBz2)),
        (".txz", Archive(TarXz)),
        (".tar.xz", Archive(TarXz)),
    ]
}

/// The extension → class lookup table.
#[derive(Debug)]
pub struct DispatchTable {
    map: HashMap<String, NodeClass>,
}

impl DispatchTable {
    /// Build the table: builtin defaults, then caller overrides layered on
    /// top (override wins on collision). An unknown class name in an
    /// override is a startup error.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> BrowseResult<Self> {
        let mut map: HashMap<String, NodeClass> = builtin()
            .into_iter()
            .map(|(ext, class)| (ext.to_string(), class))
            .collect();

        for (ext, value) in overrides {
            let class = NodeClass::parse(value).ok_or_else(|| {
                BrowseError::Config(format!(
                    "unknown node class {value:?} for extension {ext:?} \
                     (expected text, binary, viewer, 7z, zip, tar, tar.gz, tar.bz2, or tar.xz)"
                ))
            })?;
            map.insert(normalize_extension(ext), class);
        }

        Ok(Self { map })
    }

    pub fn defaults() -> Self {
        Self::with_overrides(&BTreeMap::new()).expect("builtin table is well formed")
    }

    /// Classify a file name. The longest matching suffix wins, so
    /// `foo.tar.gz` hits `.tar.gz` before `.gz`. A miss is never an error;
    /// it falls back to the default class.
    pub fn classify(&self, name: &str) -> NodeClass {
        let lower = name.to_lowercase();
        for (idx, _) in lower.char_indices().filter(|&(_, c)| c == '.') {
            if let Some(class) = self.map.get(&lower[idx..]) {
                return *class;
            }
        }
        NodeClass::Text
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_classification() {
        let table = DispatchTable::defaults();
        assert_eq!(table.classify("notes.txt"), NodeClass::Text);
        assert_eq!(table.classify("photo.JPG"), NodeClass::Viewer);
        assert_eq!(
            table.classify("backup.7z"),
            NodeClass::Archive(ArchiveFormat::SevenZip)
        );
    }

    #[test]
    fn longest_suffix_wins() {
        let table = DispatchTable::defaults();
        assert_eq!(
            table.classify("dump.tar.gz"),
            NodeClass::Archive(ArchiveFormat::TarGz)
        );
    }

    #[test]
    fn miss_falls_back_to_default_class() {
        let table = DispatchTable::defaults();
        assert_eq!(table.classify("mystery.qqq"), NodeClass::Text);
        assert_eq!(table.classify("no_extension"), NodeClass::Text);
    }

    #[test]
    fn override_beats_builtin() {
        let mut overrides = BTreeMap::new();
        overrides.insert(".txt".to_string(), "binary".to_string());
        overrides.insert("foo".to_string(), "7z".to_string());

        let table = DispatchTable::with_overrides(&overrides).unwrap();
        assert_eq!(table.classify("notes.txt"), NodeClass::Binary);
        assert_eq!(
            table.classify("odd.foo"),
            NodeClass::Archive(ArchiveFormat::SevenZip)
        );
    }

    #[test]
    fn unknown_override_class_is_a_config_error() {
        let mut overrides = BTreeMap::new();
        overrides.insert(".x".to_string(), "sparkly".to_string());

        match DispatchTable::with_overrides(&overrides) {
            Err(BrowseError::Config(msg)) => assert!(msg.contains("sparkly")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}
