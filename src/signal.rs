use std::io;

use crossbeam_channel::{Receiver, bounded};

/// Start a background thread that waits for Ctrl-C (or SIGTERM on unix).
///
/// The returned receiver gets one message when a signal arrives.
pub fn shutdown_on_signal() -> io::Result<Receiver<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (tx, rx) = bounded(1);

    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            let name = runtime.block_on(wait_for_signal());
            log::info!("Received {}, finishing queued notes", name);
            let _ = tx.send(());
        })?;

    Ok(rx)
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Cannot listen for SIGTERM: {}", e);
            return ctrl_c().await;
        }
    };
    tokio::select! {
        name = ctrl_c() => name,
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Cannot listen for Ctrl-C: {}", e);
        // Never resolve, rather than shutting down right away.
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
