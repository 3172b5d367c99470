use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::proxy::handler::{handle_request, SharedService};

// How long open connections get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub struct ProxyServer {
    listener: TcpListener,
    service: SharedService,
    semaphore: Arc<Semaphore>,
}

impl ProxyServer {
    pub async fn bind(
        addr: SocketAddr,
        service: SharedService,
        max_connections: usize,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            service,
            semaphore: Arc::new(Semaphore::new(max_connections)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until Ctrl-C.
    pub async fn run(self) -> io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        let addr = self.local_addr()?;
        info!(
            "Trailer server listening on http://{} (max concurrent requests: {})",
            addr,
            self.semaphore.available_permits()
        );

        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            warn!(error = %err, "failed to accept connection");
                            continue;
                        }
                    };

                    let service = self.service.clone();
                    let semaphore = self.semaphore.clone();
                    let svc = service_fn(move |req| {
                        handle_request(req, service.clone(), semaphore.clone())
                    });
                    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), svc);
                    let conn = graceful.watch(conn);

                    tokio::spawn(async move {
                        if let Err(err) = conn.await {
                            debug!(%peer, error = %err, "connection ended with error");
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, draining connections");
                    break;
                }
            }
        }

        drop(self.listener);
        tokio::select! {
            _ = graceful.shutdown() => info!("All connections closed"),
            _ = tokio::time::sleep(SHUTDOWN_GRACE) => {
                warn!("Timed out after {:?} waiting for connections to close", SHUTDOWN_GRACE)
            }
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
