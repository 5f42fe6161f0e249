use anyhow::Result;

/// Both binaries run on one cooperative thread, so every session mutation completes before the
/// next input is read.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
