//! Interactive shell: session state, command dispatch, prompt loop

pub mod commands;
pub mod console;
mod navigator;

pub use console::{Console, StdConsole};
pub use navigator::{Navigator, Opened};

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crossterm::style::Stylize;

use crate::config::Config;
use crate::dispatch::{DispatchTable, NodeClass};
use crate::errors::{BrowseError, BrowseResult};
use crate::launcher::Launcher;
use crate::paths::{Ctx, FileNode, NodeKind};

use commands::{builtin_commands, CommandFn};

/// One interactive session: the navigator, the console, the command
/// registry, and the launcher with its temp files. Dropping the session
/// releases any open archive handles and removes the temp files.
pub struct Session {
    navigator: Navigator,
    console: Box<dyn Console>,
    commands: HashMap<&'static str, CommandFn>,
    launcher: Launcher,
    ctx: Rc<Ctx>,
    color: bool,
}

impl Session {
    /// Wire up a session from config. Dispatch overrides and handler
    /// patterns are validated here; a bad one aborts before the loop.
    pub fn new(
        config: &Config,
        start_override: Option<PathBuf>,
        console: Box<dyn Console>,
    ) -> BrowseResult<Self> {
        let dispatch = DispatchTable::with_overrides(&config.dispatch)?;
        let ctx = Ctx::new(dispatch, config.general.show_hidden);

        let start = match start_override
            .or_else(|| config.general.start_path.as_ref().map(PathBuf::from))
        {
            Some(path) => path,
            None => std::env::current_dir()?,
        };
        let navigator = Navigator::new(start, ctx.clone())?;
        let launcher = Launcher::from_config(config)?;

        Ok(Self {
            navigator,
            console,
            commands: builtin_commands(),
            launcher,
            ctx,
            color: config.general.color,
        })
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn console(&mut self) -> &mut dyn Console {
        self.console.as_mut()
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// The interactive loop. Ends on `exit` or end of input.
    pub fn run(&mut self) {
        loop {
            let prompt = self.prompt();

            let mut candidates: Vec<String> =
                self.commands.keys().map(|name| name.to_string()).collect();
            candidates.push("exit".to_string());
            candidates.extend(self.navigator.completion_candidates());
            self.console.set_completions(candidates);

            let line = match self.console.read_line(&prompt) {
                Ok(Some(line)) => line,
                Ok(None) | Err(_) => break,
            };
            let line = line.trim().to_string();
            if line == "exit" {
                break;
            }
            self.execute(&line);
        }
        self.console.print("Exiting...");
    }

    /// Dispatch one command line. Errors are reported, never propagated:
    /// whatever failed, the current location is still valid.
    pub fn execute(&mut self, line: &str) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = tokens.split_first() else {
            return;
        };
        let Some(&command) = self.commands.get(name) else {
            self.console.error("Invalid command.");
            return;
        };
        if let Err(err) = command(self, args) {
            let message = err.to_string();
            self.console.error(&message);
        }
    }

    fn prompt(&self) -> String {
        let current = self.navigator.current();
        let name = current.name().to_string();
        let tag = match (current.kind(), current.class()) {
            (_, Some(NodeClass::Archive(format))) => format.label().to_lowercase(),
            (NodeKind::VirtualDirectory, _) => "virtual".to_string(),
            _ => "dir".to_string(),
        };

        if self.color {
            let styled = match (current.kind(), current.class()) {
                (_, Some(NodeClass::Archive(_))) => tag.as_str().red().bold().to_string(),
                (NodeKind::VirtualDirectory, _) => tag.as_str().cyan().bold().to_string(),
                _ => tag.as_str().blue().bold().to_string(),
            };
            format!("<{styled}> {name}$ ")
        } else {
            format!("<{tag}> {name}$ ")
        }
    }

    /// Run a navigator operation, prompting for archive passwords when one
    /// is required. Three attempts, then the error stands.
    pub(crate) fn with_password_retry<T>(
        &mut self,
        mut operation: impl FnMut(&mut Navigator) -> BrowseResult<T>,
    ) -> BrowseResult<T> {
        let mut attempts = 0;
        loop {
            match operation(&mut self.navigator) {
                Err(BrowseError::PasswordRequired { archive }) => {
                    attempts += 1;
                    if attempts >= 3 {
                        return Err(BrowseError::PasswordRequired { archive });
                    }
                    if self.ctx.passwords.borrow().contains_key(&archive) {
                        self.console.error("Incorrect password.");
                    }
                    let password = self
                        .console
                        .password(&format!("{archive} requires a password: "))?;
                    self.ctx.passwords.borrow_mut().insert(archive, password);
                }
                other => return other,
            }
        }
    }

    pub(crate) fn launch(&mut self, file: &dyn FileNode) -> BrowseResult<()> {
        file.launch_external(&mut self.launcher)
    }
}
