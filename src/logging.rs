//! Tracing initialization. Logs go to a file: stdout is the UI, so users
//! watch diagnostics with `tail -f` in another terminal.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("could not create log directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid log file path {0:?}")]
    InvalidPath(PathBuf),
    #[error("tracing subscriber already initialized")]
    AlreadyInitialized,
}

/// `$XDG_STATE_HOME/taskdeck/taskdeck.log`, falling back to
/// `$HOME/.local/state/taskdeck/taskdeck.log`.
pub fn default_log_file() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
        })?;
    Some(base.join("taskdeck").join("taskdeck.log"))
}

/// Initialize the file-backed subscriber. Respects `RUST_LOG`, defaults to
/// "info". Creates the log directory when missing.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;

    let directory = log_path
        .parent()
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;
    let file_name = log_path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    std::fs::create_dir_all(directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.to_path_buf(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_the_log_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let log_file = dir.path().join("logs").join("taskdeck.log");

        init(&log_file).unwrap();
        assert!(log_file.parent().unwrap().is_dir());

        // a second subscriber cannot take over the process
        assert!(matches!(
            init(&log_file),
            Err(LoggingError::AlreadyInitialized)
        ));
    }

    #[test]
    fn a_bare_file_name_is_rejected() {
        assert!(matches!(
            init(Path::new("")),
            Err(LoggingError::InvalidPath(_))
        ));
    }
}
