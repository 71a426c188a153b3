//! Process signal handling.
//!
//! SIGINT, SIGTERM and SIGHUP all request a graceful stop: the scan loop
//! finishes any in-flight query and exits at its next throttle point.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Wait for a shutdown signal (SIGINT, SIGTERM or SIGHUP).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(err) => error!("failed to install Ctrl+C handler: {}", err),
        }
    };

    #[cfg(unix)]
    let terminate = unix_signal(signal::unix::SignalKind::terminate());
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    #[cfg(unix)]
    let hangup = unix_signal(signal::unix::SignalKind::hangup());
    #[cfg(not(unix))]
    let hangup = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, stopping scan"),
        () = terminate => info!("received SIGTERM, stopping scan"),
        () = hangup => info!("received SIGHUP, stopping scan"),
    }
}

#[cfg(unix)]
async fn unix_signal(kind: signal::unix::SignalKind) {
    match signal::unix::signal(kind) {
        Ok(mut sig) => {
            sig.recv().await;
        }
        Err(err) => {
            error!("failed to install signal handler: {}", err);
            std::future::pending::<()>().await;
        }
    }
}

/// Spawn a task that cancels the returned token on the first shutdown signal.
///
/// Must be called from within a Tokio runtime.
#[must_use]
pub fn cancel_on_shutdown() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            () = shutdown_signal() => trigger.cancel(),
            () = trigger.cancelled() => {}
        }
    });

    token
}
