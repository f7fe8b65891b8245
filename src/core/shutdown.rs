//! Shutdown signal handling.

/// Completes when the process receives a termination signal.
///
/// On Unix this listens for `SIGINT`, `SIGTERM` and `SIGQUIT` (systemd,
/// Kubernetes and terminal use); elsewhere it falls back to Ctrl-C. Each
/// call registers independent listeners.
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigquit = signal(SignalKind::quit())?;

        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
            _ = sigquit.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
