//! Built-in command set
//!
//! Each command is an opaque operation on (session, argument tokens).
//! The registry is just a name → function map; anything the session
//! exposes (`navigate`, `list`, `open`) can be composed into new commands
//! without the core knowing about them.

use std::collections::HashMap;

use crossterm::style::Stylize;

use crate::dispatch::NodeClass;
use crate::errors::{BrowseError, BrowseResult};
use crate::fs::FileEntry;
use crate::paths::{NodeKind, Resolved};

use super::navigator::Opened;
use super::Session;

pub type CommandFn = fn(&mut Session, &[&str]) -> BrowseResult<()>;

pub fn builtin_commands() -> HashMap<&'static str, CommandFn> {
    let mut commands: HashMap<&'static str, CommandFn> = HashMap::new();
    commands.insert("ls", ls);
    commands.insert("cd", cd);
    commands.insert("pwd", pwd);
    commands.insert("open", open);
    commands.insert("type", kind);
    commands.insert("echo", echo);
    commands
}

/// List the contents of the current directory, or of the given path.
fn ls(session: &mut Session, args: &[&str]) -> BrowseResult<()> {
    let target = args.join(" ");
    let entries = session.with_password_retry(|nav| nav.list_path(&target))?;
    let color = session.color();
    let rendered: Vec<String> = entries.iter().map(|e| render_entry(e, color)).collect();
    session.console().print(&rendered.join("  "));
    Ok(())
}

fn render_entry(entry: &FileEntry, color: bool) -> String {
    let name = if entry.name.contains(' ') {
        format!("'{}'", entry.name)
    } else {
        entry.name.clone()
    };
    if !color {
        return name;
    }
    match entry.class {
        Some(NodeClass::Archive(_)) => name.as_str().red().bold().to_string(),
        _ if entry.is_dir => name.as_str().blue().bold().to_string(),
        Some(NodeClass::Viewer) => name.as_str().magenta().to_string(),
        Some(NodeClass::Binary) => name.as_str().yellow().to_string(),
        _ => name,
    }
}

/// Move into the given directory; with no argument, back to the start
/// directory.
fn cd(session: &mut Session, args: &[&str]) -> BrowseResult<()> {
    let target = args.join(" ");
    if target.is_empty() {
        return session.navigator_mut().go_to_start();
    }
    session.with_password_retry(|nav| nav.navigate_to(&target))
}

/// Print the full path of the current directory.
fn pwd(session: &mut Session, _args: &[&str]) -> BrowseResult<()> {
    let location = session.navigator().location()?;
    session.console().print(&location);
    Ok(())
}

/// Open a path: enter directories and archives, print text, launch
/// external handlers for viewer files.
fn open(session: &mut Session, args: &[&str]) -> BrowseResult<()> {
    let target = args.join(" ");
    if target.is_empty() {
        return Err(BrowseError::NotFound("no path given".to_string()));
    }

    match session.with_password_retry(|nav| nav.open_path(&target))? {
        Opened::Entered => Ok(()),
        Opened::File(file) => match file.class() {
            NodeClass::Text => {
                let text = file.read_text()?;
                session.console().print(&text);
                Ok(())
            }
            NodeClass::Viewer => session.launch(file.as_ref()),
            NodeClass::Binary | NodeClass::Archive(_) => {
                let bytes = file.read_bytes()?;
                session.console().print(&String::from_utf8_lossy(&bytes));
                Ok(())
            }
        },
    }
}

/// Report what a path would resolve to, without entering or opening it.
fn kind(session: &mut Session, args: &[&str]) -> BrowseResult<()> {
    let target = args.join(" ");
    if target.is_empty() {
        return Err(BrowseError::NotFound("no path given".to_string()));
    }

    let resolved = session.with_password_retry(|nav| nav.peek(&target))?;
    let description = match &resolved {
        Resolved::Dir(dir) => match (dir.kind(), dir.class()) {
            (_, Some(NodeClass::Archive(format))) => format!("archive [{}]", format.label()),
            (NodeKind::VirtualDirectory, _) => "virtual directory".to_string(),
            _ => "directory".to_string(),
        },
        Resolved::File(file) => file.class().name().to_string(),
    };
    session.console().print(&description);
    Ok(())
}

fn echo(session: &mut Session, args: &[&str]) -> BrowseResult<()> {
    let line = args.join(" ");
    session.console().print(&line);
    Ok(())
}
