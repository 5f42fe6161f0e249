use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, warn};

/// Reads a JSON document guarded by a shared lock. A missing file yields the default value, so
/// a fresh installation behaves like an empty store.
pub async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    debug!("Reading {path:?}");
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e).with_context(|| format!("Failed to open {path:?}")),
    };

    file.lock_shared()?;
    let mut content = String::new();
    let read = file.read_to_string(&mut content).await;
    file.unlock_async().await?;
    read?;

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content)
        .inspect_err(|e| warn!("Found illegal json in {path:?}: {e}"))
        .with_context(|| format!("Failed to parse {path:?}"))
}

/// Replaces the document at `path` while holding an exclusive lock.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    debug!("Writing {path:?}");
    let content = serde_json::to_string_pretty(value)?;

    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {path:?} for writing"))?;

    file.lock_exclusive()?;
    let written = async {
        file.set_len(0).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await
    }
    .await;
    file.unlock_async().await?;
    written?;
    Ok(())
}

/// Removes the document. Removing a file that never existed is fine.
pub async fn remove_json(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
