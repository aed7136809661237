//! External program launch
//!
//! Handler rules come from config: the first pattern matching the file
//! name decides the command, with the OS default opener as fallback.
//! Archive members are extracted to a managed temp file first; the temp
//! files live as long as the launcher (the whole session), so a slow
//! viewer never races the cleanup.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use regex::{Regex, RegexBuilder};
use tempfile::NamedTempFile;

use crate::config::{Config, FileHandler};
use crate::errors::{BrowseError, BrowseResult};
use crate::paths::FileSource;

pub struct Launcher {
    handlers: Vec<(Regex, String)>,
    fallback: String,
    wait: bool,
    temps: Vec<NamedTempFile>,
}

impl Launcher {
    /// Compile the configured handler rules. A malformed pattern is a
    /// startup error, reported before the interactive loop begins.
    pub fn from_config(config: &Config) -> BrowseResult<Self> {
        let mut handlers = Vec::with_capacity(config.handlers.len());
        for FileHandler { pattern, command } in &config.handlers {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    BrowseError::Config(format!("bad handler pattern {pattern:?}: {e}"))
                })?;
            handlers.push((regex, command.clone()));
        }

        Ok(Self {
            handlers,
            fallback: crate::config::default_open_command().to_string(),
            wait: config.general.wait_for_handler,
            temps: Vec::new(),
        })
    }

    /// Launch the handler for `name` on the file's bytes. Foreground or
    /// fire-and-forget per config; either way the session state is
    /// untouched by a failure.
    pub fn launch(&mut self, name: &str, source: &FileSource) -> BrowseResult<()> {
        let command = self
            .handlers
            .iter()
            .find(|(regex, _)| regex.is_match(name))
            .map(|(_, command)| command.clone())
            .unwrap_or_else(|| self.fallback.clone());

        if command.trim().is_empty() {
            return Err(BrowseError::NoHandler(name.to_string()));
        }

        let path = self.materialize(name, source)?;
        let path_str = path.display().to_string();

        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| BrowseError::NoHandler(name.to_string()))?;
        let mut args: Vec<String> = parts
            .map(|arg| if arg == "{}" { path_str.clone() } else { arg.to_string() })
            .collect();
        if !command.contains("{}") {
            args.push(path_str);
        }

        let mut cmd = Command::new(program);
        cmd.args(&args);

        if self.wait {
            let status = cmd.status().map_err(|e| spawn_error(name, e))?;
            if !status.success() {
                return Err(BrowseError::Launch(
                    name.to_string(),
                    format!("handler exited with {status}"),
                ));
            }
        } else {
            cmd.stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| spawn_error(name, e))?;
        }

        Ok(())
    }

    /// A real path for the handler: fs files as-is, members extracted to a
    /// temp file that keeps the original extension so openers can sniff it.
    fn materialize(&mut self, name: &str, source: &FileSource) -> BrowseResult<PathBuf> {
        match source {
            FileSource::Fs(path) => Ok(path.clone()),
            FileSource::Member { .. } => {
                let bytes = source.read_bytes()?;
                let suffix = name
                    .rfind('.')
                    .map(|i| name[i..].to_string())
                    .unwrap_or_default();

                let mut temp = tempfile::Builder::new()
                    .prefix("burrow-")
                    .suffix(&suffix)
                    .tempfile()?;
                temp.write_all(&bytes)?;
                temp.flush()?;

                let path = temp.path().to_path_buf();
                self.temps.push(temp);
                Ok(path)
            }
        }
    }
}

fn spawn_error(name: &str, err: std::io::Error) -> BrowseError {
    if err.kind() == std::io::ErrorKind::NotFound {
        BrowseError::NoHandler(name.to_string())
    } else {
        BrowseError::Launch(name.to_string(), format!("{err}"))
    }
}
