//! JSON API server
//!
//! An axum [`Router`] served over hyper's HTTP/1.1 connection driver on a
//! tokio `TcpListener`. Each connection carries one request and is closed
//! after the response. A connection that has not finished within
//! [`ViewerConfig::connection_timeout`] is dropped, slow header reads
//! included.
//!
//! # Routes
//!
//! - `GET /api/fetch-idl?programId=<id>`: explorer download link for a program
//! - `POST /api/idl`: normalize the uploaded IDL and make it the current program
//! - `GET /api/program`: the current program model
//! - `GET /api/diagram?kind=<kind>`: mermaid diagrams for the current program
//!
//! Errors are JSON objects of the form `{"error": "..."}`.
//!
//! # Shutdown
//!
//! The server stops accepting connections when the `watch` sender passed to
//! [`spawn_server`] changes or is dropped.

pub mod routes;
#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ViewerConfig;
pub use self::routes::{router, AppState, MAX_BODY_BYTES};

/// Read buffer limit per connection, which bounds the request head
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Errors that can occur in the API server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind to the address.
    #[error("bind error: {0}")]
    Bind(std::io::Error),
    /// Protocol or I/O error on a connection.
    #[error("connection error: {0}")]
    Http(#[from] hyper::Error),
    /// The connection outlived its deadline.
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),
}

/// Bind the configured address and run the server until shutdown.
pub async fn run_server(
    state: AppState,
    config: &ViewerConfig,
    shutdown_rx: watch::Receiver<()>,
) -> Result<(), ServerError> {
    let listener = bind(config.bind_addr).await?;
    run_server_with_listener(state, listener, config.connection_timeout, shutdown_rx).await
}

/// Spawn the server and return the bound address.
///
/// Binding to port 0 picks a free port, which is what tests use.
pub async fn spawn_server(
    state: AppState,
    config: &ViewerConfig,
    shutdown_rx: watch::Receiver<()>,
) -> Result<(JoinHandle<()>, SocketAddr), ServerError> {
    let listener = bind(config.bind_addr).await?;
    let local_addr = listener.local_addr().map_err(ServerError::Bind)?;
    let connection_timeout = config.connection_timeout;

    let handle = tokio::spawn(async move {
        if let Err(e) =
            run_server_with_listener(state, listener, connection_timeout, shutdown_rx).await
        {
            error!("API server error: {}", e);
        }
    });

    Ok((handle, local_addr))
}

async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;
    let local_addr = listener.local_addr().map_err(ServerError::Bind)?;
    info!("API server listening on http://{}", local_addr);
    Ok(listener)
}

/// Run the accept loop on an existing listener.
pub async fn run_server_with_listener(
    state: AppState,
    listener: TcpListener,
    connection_timeout: Duration,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), ServerError> {
    let app = router(state);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        let app = app.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_connection(stream, app, connection_timeout).await {
                                debug!("Connection from {} error: {}", peer_addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        warn!("Accept error: {}", e);
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                info!("API server shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    app: Router,
    connection_timeout: Duration,
) -> Result<(), ServerError> {
    let connection = http1::Builder::new()
        .timer(TokioTimer::new())
        .header_read_timeout(connection_timeout)
        .max_buf_size(MAX_HEADER_BYTES)
        .keep_alive(false)
        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(app));

    match tokio::time::timeout(connection_timeout, connection).await {
        Ok(result) => result.map_err(ServerError::from),
        Err(_) => Err(ServerError::Timeout(connection_timeout)),
    }
}
