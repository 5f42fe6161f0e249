use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancels `cancelation` on Ctrl-C, or on SIGTERM which is what `worklogger stop` sends.
///
/// On Windows detached processes can't detect signals sent to them, so there the daemon is
/// simply terminated.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            cancelation.cancel();
        },
        _ = terminate() => {
            info!("Received SIGTERM, shutting down");
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => {},
    };
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(_) => std::future::pending::<()>().await,
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await
}
