use std::future::Future;

use log::{error, info};
use tokio::signal;

use crate::error::{CciError, Result};

/// Runs `work` until it completes or the process receives SIGINT/SIGTERM.
///
/// On interrupt the work future is dropped, which aborts its in-flight
/// requests, and `CciError::Cancelled` is returned.
pub async fn until_interrupted<F, T>(work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    race_cancel(work, interrupted()).await
}

/// Runs `work` unless `cancel` resolves first.
pub async fn race_cancel<F, C, T>(work: F, cancel: C) -> Result<T>
where
    F: Future<Output = Result<T>>,
    C: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = cancel => Err(CciError::Cancelled),
        result = work => result,
    }
}

/// Resolves on SIGINT or SIGTERM. A handler that cannot be installed never
/// fires.
async fn interrupted() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(err) => {
                error!("failed to install Ctrl+C handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, cancelling"),
        _ = terminate => info!("received SIGTERM, cancelling"),
    }
}
