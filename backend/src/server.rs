use std::io;
use std::path::Path;
use std::time::Duration;

use actix_web::dev::{Server, ServerHandle};
use log::{info, warn};

/// Owns process signal handling and the graceful-stop policy.
///
/// The server must be built with `disable_signals()`; the coordinator is the
/// only place that reacts to SIGINT/SIGTERM. In-flight requests get `grace` to
/// finish before the server is stopped forcefully.
pub struct ShutdownCoordinator {
    grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// Drives `server` until it exits on its own or a termination signal arrives.
    pub async fn run(self, server: Server) -> io::Result<()> {
        self.run_until(server, wait_for_signal()).await
    }

    pub async fn run_until<S>(self, server: Server, shutdown: S) -> io::Result<()>
    where
        S: Future<Output = io::Result<&'static str>>,
    {
        let handle = server.handle();
        let mut running = actix_web::rt::spawn(server);

        let signal = tokio::select! {
            finished = &mut running => return flatten(finished),
            signal = shutdown => signal,
        };
        match &signal {
            Ok(name) => info!("received {}, shutting down gracefully", name),
            Err(err) => warn!("signal listener failed: {}, shutting down", err),
        }

        self.stop(&handle).await;
        flatten(running.await)?;
        signal.map(|_| ())
    }

    async fn stop(&self, handle: &ServerHandle) {
        if tokio::time::timeout(self.grace, handle.stop(true)).await.is_err() {
            warn!(
                "in-flight requests did not finish within {:?}, shutting down forcefully",
                self.grace
            );
            handle.stop(false).await;
        } else {
            info!("server stopped");
        }
    }
}

fn flatten(joined: Result<io::Result<()>, tokio::task::JoinError>) -> io::Result<()> {
    joined.map_err(io::Error::other)?
}

#[cfg(unix)]
async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
}

/// Removes a leftover socket file so a restart can bind the same path.
pub fn remove_stale_socket(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("removed stale socket {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
