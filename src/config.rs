//! Configuration management

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{BrowseError, BrowseResult};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// File handler rules (pattern -> command)
    #[serde(default = "default_handlers")]
    pub handlers: Vec<FileHandler>,
    /// Type-dispatch overrides: extension -> node class name
    pub dispatch: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            handlers: default_handlers(),
            dispatch: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Colored prompt and listings
    pub color: bool,
    /// Show hidden files (starting with .)
    pub show_hidden: bool,
    /// Block on external handlers instead of fire-and-forget
    pub wait_for_handler: bool,
    /// Directory to start in (default: where the browser was launched)
    pub start_path: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_hidden: true,
            wait_for_handler: false,
            start_path: None,
        }
    }
}

/// File handler rule: maps a regex pattern to a command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHandler {
    /// Regex pattern to match against filename (e.g., "\\.mp4$", "\\.pdf$")
    pub pattern: String,
    /// Command to run. Use {} as placeholder for the file path.
    /// Example: "vlc {}" or "xdg-open {}"
    pub command: String,
}

pub fn default_open_command() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "setsid xdg-open {}"
    }
    #[cfg(target_os = "macos")]
    {
        "open {}"
    }
    #[cfg(target_os = "windows")]
    {
        "explorer {}"
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        "setsid xdg-open {}"
    }
}

/// Default file handlers
pub fn default_handlers() -> Vec<FileHandler> {
    let cmd = default_open_command().to_string();
    vec![
        FileHandler {
            pattern: r"\.(jpg|jpeg|png|gif|bmp|webp|svg)$".to_string(),
            command: cmd.clone(),
        },
        FileHandler {
            pattern: r"\.(mp4|mkv|webm)$".to_string(),
            command: cmd.clone(),
        },
        FileHandler {
            pattern: r"\.(mp3|flac|ogg|wav)$".to_string(),
            command: cmd.clone(),
        },
        FileHandler {
            pattern: r"\.pdf$".to_string(),
            command: cmd,
        },
    ]
}

/// Get the config directory path for the current platform
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("burrow"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        // XDG_CONFIG_HOME first, then ~/.config
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|p| PathBuf::from(p).join(".config")))
            .map(|p| p.join("burrow"))
    }
}

/// Get the config file path
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Default config file content with comments
fn default_config() -> String {
    let open_cmd = default_open_command();
    format!(
        r##"# burrow configuration
# This file is auto-generated. Edit as needed.

[general]
# Colored prompt and listings
color = true
# Show hidden files
show_hidden = true
# Wait for external handlers to exit before returning to the prompt
wait_for_handler = false
# Start directory; leave unset to start where the browser is launched
# start_path = "/home/me"

# File handlers: map filename patterns (regex) to commands.
# {{}} is replaced with the file path.
[[handlers]]
pattern = "\\.(jpg|jpeg|png|gif|bmp|webp|svg)$"
command = "{open_cmd}"

[[handlers]]
pattern = "\\.(mp4|mkv|webm)$"
command = "{open_cmd}"

[[handlers]]
pattern = "\\.(mp3|flac|ogg|wav)$"
command = "{open_cmd}"

[[handlers]]
pattern = "\\.pdf$"
command = "{open_cmd}"

# Type-dispatch overrides: extension -> node class.
# Classes: text, binary, viewer, 7z, zip, tar, tar.gz, tar.bz2, tar.xz
[dispatch]
# ".nfo" = "text"
# ".cbz" = "zip"
"##
    )
}

impl Config {
    /// Load configuration from file, creating a commented default if it
    /// doesn't exist. A file that exists but fails to parse is a startup
    /// error rather than something to silently paper over: a malformed
    /// dispatch override changing meaning mid-session is worse than not
    /// starting.
    pub fn load() -> BrowseResult<Self> {
        let Some(config_path) = config_file() else {
            eprintln!("Warning: could not determine config directory, using defaults");
            return Ok(Config::default());
        };

        if let Some(config_dir) = config_path.parent()
            && !config_dir.exists()
            && let Err(e) = fs::create_dir_all(config_dir)
        {
            eprintln!("Warning: could not create config directory: {e}");
            return Ok(Config::default());
        }

        if !config_path.exists() {
            if let Err(e) = fs::write(&config_path, default_config()) {
                eprintln!("Warning: could not create config file: {e}");
            }
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| {
            BrowseError::Config(format!("could not read {}: {e}", config_path.display()))
        })?;
        toml_edit::de::from_str(&content).map_err(|e| {
            BrowseError::Config(format!("could not parse {}: {e}", config_path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_text_parses_back() {
        let config: Config = toml_edit::de::from_str(&default_config()).unwrap();
        assert!(config.general.color);
        assert!(!config.general.wait_for_handler);
        assert_eq!(config.handlers.len(), 4);
        assert!(config.dispatch.is_empty());
    }

    #[test]
    fn dispatch_overrides_deserialize() {
        let config: Config = toml_edit::de::from_str(
            r#"
[dispatch]
".cbz" = "zip"
".nfo" = "text"
"#,
        )
        .unwrap();
        assert_eq!(config.dispatch.get(".cbz").map(String::as_str), Some("zip"));
    }
}
