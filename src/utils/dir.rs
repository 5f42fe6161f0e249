use std::{env, io, path::PathBuf};

use anyhow::{anyhow, Result};

pub const APPLICATION_NAME: &str = "worklogger";

/// Settings, reminder state and logs all live here. By default tries `%APPDATA%` on Windows and
/// `$XDG_STATE_HOME` or `$HOME/.local/state` elsewhere.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = platform_state_dir()?;
    path.push(APPLICATION_NAME);
    ensure_dir(path)
}

/// Creates `path` if needed and hands it back.
pub fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

fn platform_state_dir() -> Result<PathBuf> {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            env::var("APPDATA")
                .map(PathBuf::from)
                .map_err(|_| anyhow!("APPDATA should be present on Windows"))
        } else {
            env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))
        }
    }
}
