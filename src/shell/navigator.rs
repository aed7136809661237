//! Current location and path resolution
//!
//! The navigator owns a stack of entered directory nodes, root first.
//! There are no parent back-references anywhere in the node model; `..`
//! pops the stack, and below the stack bottom a real directory supplies
//! its OS parent. Multi-segment resolution is staged against the live
//! stack and committed only when every segment resolved, so a failed
//! navigation leaves the current location exactly where it was.

use std::path::PathBuf;
use std::rc::Rc;

use crate::errors::{BrowseError, BrowseResult};
use crate::fs::FileEntry;
use crate::paths::dir::DirPath;
use crate::paths::{Ctx, DirNode, FileNode, Resolved};

pub struct Navigator {
    start: PathBuf,
    stack: Vec<Box<dyn DirNode>>,
    ctx: Rc<Ctx>,
}

/// Outcome of an `open` on a path: directories are entered, files are
/// handed back for the caller's open policy.
pub enum Opened {
    Entered,
    File(Box<dyn FileNode>),
}

/// Pending navigation state; nothing touches the stack until commit.
#[derive(Default)]
struct Stage {
    popped: usize,
    pushed: Vec<Box<dyn DirNode>>,
    new_bottom: Option<Box<dyn DirNode>>,
}

impl Navigator {
    pub fn new(start: PathBuf, ctx: Rc<Ctx>) -> BrowseResult<Self> {
        let start = start
            .canonicalize()
            .map_err(|e| BrowseError::from_io(e, &start.display().to_string()))?;
        if !start.is_dir() {
            return Err(BrowseError::NotADirectory(start.display().to_string()));
        }

        let root = DirPath::new(start.clone(), ctx.clone());
        Ok(Self {
            start,
            stack: vec![Box::new(root)],
            ctx,
        })
    }

    pub fn current(&self) -> &dyn DirNode {
        self.stack
            .last()
            .expect("navigation stack is never empty")
            .as_ref()
    }

    /// Full path of the current location. Verifies the whole stack is
    /// still backed by something real first.
    pub fn location(&self) -> BrowseResult<String> {
        for node in &self.stack {
            if !node.source_intact() {
                return Err(BrowseError::BrokenReference(node.display_path()));
            }
        }
        Ok(self.current().display_path())
    }

    pub fn list(&self) -> BrowseResult<Vec<FileEntry>> {
        self.current().list_children()
    }

    /// List a directory given by path, without moving the current location.
    pub fn list_path(&self, path: &str) -> BrowseResult<Vec<FileEntry>> {
        if path.is_empty() {
            return self.list();
        }
        let stage = self.walk(path)?;
        self.stage_view(&stage).list_children()
    }

    /// Jump back to the directory the session started in.
    pub fn go_to_start(&mut self) -> BrowseResult<()> {
        let root = DirPath::new(self.start.clone(), self.ctx.clone());
        self.stack = vec![Box::new(root)];
        Ok(())
    }

    /// Resolve a path string against the current location and move there.
    pub fn navigate_to(&mut self, path: &str) -> BrowseResult<()> {
        let stage = self.walk(path)?;
        self.commit(stage);
        Ok(())
    }

    /// Resolve a path; enter it if it is a directory, hand the file node
    /// back otherwise. Resolution of a file commits nothing.
    pub fn open_path(&mut self, path: &str) -> BrowseResult<Opened> {
        let normalized = path.replace('\\', "/");
        let (dir_part, leaf) = match normalized.rfind('/') {
            Some(i) => (&normalized[..=i], &normalized[i + 1..]),
            None => ("", normalized.as_str()),
        };

        if leaf.is_empty() || leaf == "." || leaf == ".." {
            self.navigate_to(&normalized)?;
            return Ok(Opened::Entered);
        }

        let mut stage = self.walk(dir_part)?;
        let resolved = self.stage_view(&stage).resolve(leaf)?;
        match resolved {
            Resolved::Dir(dir) => {
                dir.enter()?;
                stage.pushed.push(dir);
                self.commit(stage);
                Ok(Opened::Entered)
            }
            Resolved::File(file) => Ok(Opened::File(file)),
        }
    }

    /// Resolve a path without entering or opening anything; used for
    /// inspection (the `type` command). Archive handles stay closed.
    pub fn peek(&self, path: &str) -> BrowseResult<Resolved> {
        let normalized = path.replace('\\', "/");
        let (dir_part, leaf) = match normalized.rfind('/') {
            Some(i) => (&normalized[..=i], &normalized[i + 1..]),
            None => ("", normalized.as_str()),
        };
        if leaf.is_empty() || leaf == "." || leaf == ".." {
            return Err(BrowseError::NotFound(path.to_string()));
        }

        let stage = self.walk(dir_part)?;
        self.stage_view(&stage).resolve(leaf)
    }

    /// Child names of the current location, for completion. Failures are
    /// not interesting here; completion just goes empty.
    pub fn completion_candidates(&self) -> Vec<String> {
        self.list()
            .map(|entries| entries.into_iter().map(|e| e.name).collect())
            .unwrap_or_default()
    }

    fn walk(&self, path: &str) -> BrowseResult<Stage> {
        let normalized = path.replace('\\', "/");
        let mut stage = Stage::default();

        if normalized.starts_with('/') {
            // Absolute: restart from the filesystem root, then descend
            stage.popped = self.stack.len();
            stage.new_bottom = Some(Box::new(DirPath::new(
                PathBuf::from("/"),
                self.ctx.clone(),
            )));
        }

        for segment in normalized.split('/') {
            match segment {
                "" | "." => {}
                ".." => self.stage_up(&mut stage)?,
                name => {
                    let resolved = self.stage_view(&stage).resolve(name)?;
                    match resolved {
                        Resolved::Dir(dir) => {
                            dir.enter()?;
                            stage.pushed.push(dir);
                        }
                        Resolved::File(_) => {
                            return Err(BrowseError::NotADirectory(name.to_string()));
                        }
                    }
                }
            }
        }

        Ok(stage)
    }

    /// The directory a partially-resolved stage currently points at.
    fn stage_view<'a>(&'a self, stage: &'a Stage) -> &'a dyn DirNode {
        if let Some(dir) = stage.pushed.last() {
            return dir.as_ref();
        }
        if let Some(bottom) = &stage.new_bottom {
            return bottom.as_ref();
        }
        self.stack[self.stack.len() - 1 - stage.popped].as_ref()
    }

    fn stage_up(&self, stage: &mut Stage) -> BrowseResult<()> {
        if stage.pushed.pop().is_some() {
            return Ok(());
        }

        if let Some(bottom) = stage.new_bottom.take() {
            match bottom.parent_dir() {
                Some(parent) => {
                    stage.new_bottom = Some(parent);
                    return Ok(());
                }
                None => {
                    return Err(BrowseError::NotFound(
                        "no parent above the filesystem root".to_string(),
                    ));
                }
            }
        }

        if self.stack.len() - stage.popped > 1 {
            stage.popped += 1;
            return Ok(());
        }

        // At the stack bottom: ask the node for an OS parent
        match self.stack[0].parent_dir() {
            Some(parent) => {
                stage.popped = self.stack.len();
                stage.new_bottom = Some(parent);
                Ok(())
            }
            None => Err(BrowseError::NotFound(
                "no parent above the filesystem root".to_string(),
            )),
        }
    }

    fn commit(&mut self, stage: Stage) {
        self.stack.truncate(self.stack.len() - stage.popped);
        if let Some(bottom) = stage.new_bottom {
            debug_assert!(self.stack.is_empty());
            self.stack.push(bottom);
        }
        self.stack.extend(stage.pushed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchTable;
    use crate::paths::NodeKind;
    use std::fs;
    use std::io::Write;

    fn navigator(root: &std::path::Path) -> Navigator {
        let ctx = Ctx::new(DispatchTable::defaults(), true);
        Navigator::new(root.to_path_buf(), ctx).unwrap()
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

    #[test]
    fn navigate_down_and_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();

        let start = dir.path().canonicalize().unwrap().display().to_string();
        let mut nav = navigator(dir.path());
        nav.navigate_to("a/b").unwrap();
        assert!(nav.location().unwrap().ends_with("a/b"));

        nav.navigate_to("../..").unwrap();
        assert_eq!(nav.location().unwrap(), start);
    }

    #[test]
    fn failed_navigation_leaves_location_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();

        let mut nav = navigator(dir.path());
        let before = nav.location().unwrap();

        match nav.navigate_to("real/ghost/deeper") {
            Err(BrowseError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.err()),
        }
        assert_eq!(nav.location().unwrap(), before);
    }

    #[test]
    fn navigate_into_file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plain.txt"), "x").unwrap();

        let mut nav = navigator(dir.path());
        assert!(matches!(
            nav.navigate_to("plain.txt"),
            Err(BrowseError::NotADirectory(_))
        ));
    }

    #[test]
    fn dot_dot_above_start_reaches_the_os_parent() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("inner")).unwrap();

        let mut nav = navigator(&dir.path().join("inner"));
        nav.navigate_to("..").unwrap();

        let expected = dir.path().canonicalize().unwrap().display().to_string();
        assert_eq!(nav.location().unwrap(), expected);
    }

    #[test]
    fn archive_members_navigate_like_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("bundle.zip"),
            make_zip(&[("docs/guide/intro.txt", b"inside")]),
        )
        .unwrap();

        let mut nav = navigator(dir.path());
        nav.navigate_to("bundle.zip/docs/guide").unwrap();
        assert_eq!(nav.current().kind(), NodeKind::VirtualDirectory);

        let names: Vec<String> = nav.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["intro.txt"]);

        // Popping out of the archive subtree drops back onto the real fs
        nav.navigate_to("../../..").unwrap();
        assert_eq!(nav.current().kind(), NodeKind::Directory);
    }

    #[test]
    fn nested_archives_open_through_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let inner = make_zip(&[("doc.txt", b"doc body")]);
        fs::write(
            dir.path().join("outer.zip"),
            make_zip(&[("inner.zip", &inner)]),
        )
        .unwrap();

        let mut nav = navigator(dir.path());
        nav.navigate_to("outer.zip/inner.zip").unwrap();

        match nav.open_path("doc.txt").unwrap() {
            Opened::File(file) => assert_eq!(file.read_bytes().unwrap(), b"doc body"),
            Opened::Entered => panic!("doc.txt should be a file"),
        }
    }

    #[test]
    fn open_path_enters_directories_and_returns_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/leaf.txt"), "leaf").unwrap();

        let mut nav = navigator(dir.path());

        match nav.open_path("sub/leaf.txt").unwrap() {
            Opened::File(file) => assert_eq!(file.read_bytes().unwrap(), b"leaf"),
            Opened::Entered => panic!("leaf.txt should be a file"),
        }
        // Resolving the file must not have moved the location
        assert!(!nav.location().unwrap().ends_with("sub"));

        assert!(matches!(nav.open_path("sub").unwrap(), Opened::Entered));
        assert!(nav.location().unwrap().ends_with("sub"));
    }

    #[test]
    fn list_path_does_not_move_location() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/one.txt"), "1").unwrap();

        let nav = navigator(dir.path());
        let names: Vec<String> = nav
            .list_path("sub")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["one.txt"]);
        assert!(!nav.location().unwrap().ends_with("sub"));
    }

    #[test]
    fn peek_reports_kind_without_opening() {
        let dir = tempfile::tempdir().unwrap();
        // Bogus content: peek must classify by name without decoding
        fs::write(dir.path().join("corrupt.zip"), "not a zip").unwrap();

        let nav = navigator(dir.path());
        match nav.peek("corrupt.zip").unwrap() {
            Resolved::Dir(node) => assert_eq!(node.kind(), NodeKind::VirtualDirectory),
            Resolved::File(_) => panic!("archives peek as directories"),
        }
    }
}
