//! burrow — an interactive file browser that walks into archives
//!
//! `bw [start-dir]` drops into a prompt over the given directory (or the
//! current one). Archives list and navigate like directories, nested
//! archives included; files open according to the type-dispatch table.

use std::path::PathBuf;
use std::process::ExitCode;

mod archive;
mod config;
mod dispatch;
mod errors;
mod fs;
mod launcher;
mod paths;
mod shell;

use config::Config;
use shell::{Session, StdConsole};

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let start = match args.next() {
        Some(arg) if arg == "-h" || arg == "--help" => {
            println!("Usage: bw [start-dir]");
            return ExitCode::SUCCESS;
        }
        other => other.map(PathBuf::from),
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("bw: {err}");
            return ExitCode::FAILURE;
        }
    };

    let console = StdConsole::new();
    let mut session = match Session::new(&config, start, Box::new(console)) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("bw: {err}");
            return ExitCode::FAILURE;
        }
    };

    session.run();
    ExitCode::SUCCESS
}
