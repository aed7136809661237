//! Line front end contract and the built-in stdin implementation
//!
//! The browser core only needs "read a line", "print", and "ask for a
//! password". A richer line editor (history, completion) plugs in by
//! implementing [`Console`]; `set_completions` feeds it candidates, and
//! the built-in plain-stdin console simply ignores them.

use std::io::{self, BufRead, Write};

pub trait Console {
    /// Read one line, prompting first. `None` means end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    fn print(&mut self, text: &str);

    fn error(&mut self, text: &str);

    /// Read a password with echo disabled.
    fn password(&mut self, prompt: &str) -> io::Result<String>;

    /// Completion candidates for the next read: command names plus the
    /// current location's children.
    fn set_completions(&mut self, _candidates: Vec<String>) {}
}

/// Plain stdin/stdout console.
pub struct StdConsole;

impl StdConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdConsole {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    fn print(&mut self, text: &str) {
        println!("{text}");
    }

    fn error(&mut self, text: &str) {
        eprintln!("{text}");
    }

    fn password(&mut self, prompt: &str) -> io::Result<String> {
        rpassword::prompt_password(prompt)
    }
}
