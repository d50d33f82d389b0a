//! Key configuration: built-in defaults overridable from
//! `$XDG_CONFIG_HOME/taskdeck/config.toml`, loaded once into an immutable
//! snapshot that is threaded through the screen constructors.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::menu::KeyPress;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The full key binding snapshot.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct KeyConfig {
    #[serde(default)]
    pub navigation: NavigationKeys,
    #[serde(default)]
    pub actions: ActionKeys,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NavigationKeys {
    #[serde(default, rename = "move")]
    pub movement: MoveKeys,
    #[serde(default)]
    pub scroll: ScrollKeys,
    #[serde(default = "default_toggle_selected")]
    pub toggle_selected: KeyPress,
}

/// Cursor movement: active-line steps and jumps.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MoveKeys {
    #[serde(default = "default_next")]
    pub next: KeyPress,
    #[serde(default = "default_previous")]
    pub previous: KeyPress,
    #[serde(default = "default_first")]
    pub first: KeyPress,
    #[serde(default = "default_last")]
    pub last: KeyPress,
}

/// Viewport scrolling, independent of the cursor.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScrollKeys {
    #[serde(default = "default_scroll_up")]
    pub up: KeyPress,
    #[serde(default = "default_scroll_down")]
    pub down: KeyPress,
    #[serde(default = "default_scroll_left")]
    pub left: KeyPress,
    #[serde(default = "default_scroll_right")]
    pub right: KeyPress,
    #[serde(default = "default_scroll_begin")]
    pub begin: KeyPress,
    #[serde(default = "default_scroll_end")]
    pub end: KeyPress,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ActionKeys {
    #[serde(default = "default_quit")]
    pub quit: KeyPress,
}

fn default_next() -> KeyPress {
    KeyPress::char('j')
}
fn default_previous() -> KeyPress {
    KeyPress::char('k')
}
fn default_first() -> KeyPress {
    KeyPress::char('g')
}
fn default_last() -> KeyPress {
    KeyPress::char('G')
}
fn default_scroll_up() -> KeyPress {
    KeyPress::code(crossterm::event::KeyCode::Up)
}
fn default_scroll_down() -> KeyPress {
    KeyPress::code(crossterm::event::KeyCode::Down)
}
fn default_scroll_left() -> KeyPress {
    KeyPress::char('h')
}
fn default_scroll_right() -> KeyPress {
    KeyPress::char('l')
}
fn default_scroll_begin() -> KeyPress {
    KeyPress::char('0')
}
fn default_scroll_end() -> KeyPress {
    KeyPress::char('$')
}
fn default_toggle_selected() -> KeyPress {
    KeyPress::char(' ')
}
fn default_quit() -> KeyPress {
    KeyPress::char('q')
}

impl Default for NavigationKeys {
    fn default() -> Self {
        NavigationKeys {
            movement: MoveKeys::default(),
            scroll: ScrollKeys::default(),
            toggle_selected: default_toggle_selected(),
        }
    }
}

impl Default for MoveKeys {
    fn default() -> Self {
        MoveKeys {
            next: default_next(),
            previous: default_previous(),
            first: default_first(),
            last: default_last(),
        }
    }
}

impl Default for ScrollKeys {
    fn default() -> Self {
        ScrollKeys {
            up: default_scroll_up(),
            down: default_scroll_down(),
            left: default_scroll_left(),
            right: default_scroll_right(),
            begin: default_scroll_begin(),
            end: default_scroll_end(),
        }
    }
}

impl Default for ActionKeys {
    fn default() -> Self {
        ActionKeys {
            quit: default_quit(),
        }
    }
}

/// `$XDG_CONFIG_HOME/taskdeck/config.toml`, falling back to
/// `$HOME/.config/taskdeck/config.toml`.
pub fn config_file() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("taskdeck").join("config.toml"))
}

/// Load the key configuration, or the built-in defaults when no config file
/// exists. A malformed file is an error, not a silent fallback.
pub fn load() -> Result<KeyConfig, ConfigError> {
    match config_file() {
        Some(path) => load_from(&path),
        None => Ok(KeyConfig::default()),
    }
}

pub fn load_from(path: &Path) -> Result<KeyConfig, ConfigError> {
    if !path.exists() {
        return Ok(KeyConfig::default());
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}
