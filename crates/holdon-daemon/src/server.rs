//! Unix-socket server: accept loop and frame codec.
//!
//! One task per connection; each connection carries a sequence of
//! length-prefixed JSON frames (see [`holdon_core::ipc`]). A malformed
//! request gets an `Error` reply on the same connection rather than a
//! disconnect, so a buggy client can keep its socket.

use std::path::{Path, PathBuf};

use holdon_core::ipc::{self, ErrorCode, IpcRequest, IpcResponse, MAX_FRAME_SIZE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use crate::handlers;
use crate::state::SharedState;

/// The daemon's IPC server.
pub struct Server {
    listener: UnixListener,
    socket_path: PathBuf,
    state: SharedState,
}

impl Server {
    /// Bind the Unix socket, removing a stale socket file from a previous
    /// run if one is in the way.
    ///
    /// # Errors
    ///
    /// Returns an error if the stale file cannot be removed or the bind
    /// fails.
    pub fn bind(socket_path: &Path, state: SharedState) -> std::io::Result<Self> {
        if socket_path.exists() {
            debug!(path = %socket_path.display(), "removing stale socket file");
            std::fs::remove_file(socket_path)?;
        }
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let listener = UnixListener::bind(socket_path)?;
        info!(path = %socket_path.display(), "listening");
        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            state,
        })
    }

    /// Run the accept loop until shutdown is requested, then remove the
    /// socket file.
    pub async fn run(self) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => {
                            let state = self.state.clone();
                            tokio::spawn(async move {
                                handle_connection(stream, state).await;
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                        }
                    }
                }
                () = self.state.shutdown_requested() => {
                    info!("accept loop stopping");
                    break;
                }
            }
        }
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %e, "failed to remove socket file");
            }
        }
    }
}

/// Serve one connection until the peer hangs up or a framing violation.
async fn handle_connection(mut stream: UnixStream, state: SharedState) {
    loop {
        let mut len_buf = [0u8; 4];
        match stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                debug!(error = %e, "connection read failed");
                break;
            }
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_FRAME_SIZE {
            warn!(len, max = MAX_FRAME_SIZE, "oversized frame, closing connection");
            break;
        }

        let mut payload = vec![0u8; len];
        if let Err(e) = stream.read_exact(&mut payload).await {
            debug!(error = %e, "connection truncated mid-frame");
            break;
        }

        let response = match serde_json::from_slice::<IpcRequest>(&payload) {
            Ok(request) => handlers::dispatch(request, &state).await,
            Err(e) => IpcResponse::Error {
                code: ErrorCode::InvalidRequest,
                message: format!("malformed request: {e}"),
            },
        };

        let bytes = match serde_json::to_vec(&response) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to encode response");
                break;
            }
        };
        if let Err(e) = stream.write_all(&ipc::frame_message(&bytes)).await {
            debug!(error = %e, "connection write failed");
            break;
        }
    }
}
