//! Daemon client for UDS communication.
//!
//! Synchronous request/response over the daemon's Unix socket, one framed
//! JSON message each way per call (see [`holdon_core::ipc`] for the frame
//! format).

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use holdon_core::ipc::{self, IpcError, IpcRequest, IpcResponse, MAX_FRAME_SIZE};

/// Default connection/read timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client for one daemon socket.
pub struct DaemonClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl DaemonClient {
    /// Create a client for the daemon at `socket_path`.
    #[must_use]
    pub fn new(socket_path: &Path) -> Self {
        Self {
            socket_path: socket_path.to_path_buf(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Send one request and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::DaemonNotRunning`] when the socket is absent or
    /// refusing connections, and I/O, framing, or serialization errors
    /// otherwise.
    pub fn request(&self, request: &IpcRequest) -> Result<IpcResponse, IpcError> {
        let mut stream = UnixStream::connect(&self.socket_path).map_err(map_connect_error)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let payload = serde_json::to_vec(request)?;
        stream.write_all(&ipc::frame_message(&payload))?;

        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_FRAME_SIZE {
            return Err(IpcError::FrameTooLarge {
                size: len,
                max: MAX_FRAME_SIZE,
            });
        }

        let mut response = vec![0u8; len];
        stream.read_exact(&mut response)?;
        Ok(serde_json::from_slice(&response)?)
    }
}

fn map_connect_error(err: std::io::Error) -> IpcError {
    match err.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused => {
            IpcError::DaemonNotRunning
        }
        _ => IpcError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixListener;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn absent_and_refused_sockets_map_to_daemon_not_running() {
        let not_found = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(
            map_connect_error(not_found),
            IpcError::DaemonNotRunning
        ));

        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert!(matches!(
            map_connect_error(refused),
            IpcError::DaemonNotRunning
        ));

        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(map_connect_error(denied), IpcError::Io(_)));
    }

    #[test]
    fn request_to_missing_socket_reports_daemon_not_running() {
        let dir = TempDir::new().unwrap();
        let client = DaemonClient::new(&dir.path().join("absent.sock"));

        let err = client.request(&IpcRequest::Ping).unwrap_err();
        assert!(matches!(err, IpcError::DaemonNotRunning));
    }

    #[test]
    fn framed_request_round_trips_against_a_fixture_socket() {
        let dir = TempDir::new().unwrap();
        let socket = dir.path().join("holdon.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            let mut len_buf = [0u8; 4];
            stream.read_exact(&mut len_buf).unwrap();
            let len = u32::from_be_bytes(len_buf) as usize;
            let mut payload = vec![0u8; len];
            stream.read_exact(&mut payload).unwrap();
            let request: IpcRequest = serde_json::from_slice(&payload).unwrap();
            assert!(matches!(request, IpcRequest::Ping));

            let response = IpcResponse::Pong {
                version: "0.0.0".to_string(),
                uptime_secs: 1,
            };
            let bytes = serde_json::to_vec(&response).unwrap();
            stream.write_all(&ipc::frame_message(&bytes)).unwrap();
        });

        let client = DaemonClient::new(&socket);
        let response = client.request(&IpcRequest::Ping).unwrap();
        assert!(matches!(response, IpcResponse::Pong { .. }));
        server.join().unwrap();
    }

    #[test]
    fn oversized_response_frame_is_rejected() {
        let dir = TempDir::new().unwrap();
        let socket = dir.path().join("holdon.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            let mut len_buf = [0u8; 4];
            stream.read_exact(&mut len_buf).unwrap();
            let len = u32::from_be_bytes(len_buf) as usize;
            let mut payload = vec![0u8; len];
            stream.read_exact(&mut payload).unwrap();

            // A length prefix past the cap, no payload behind it.
            stream.write_all(&u32::MAX.to_be_bytes()).unwrap();
        });

        let client = DaemonClient::new(&socket);
        let err = client.request(&IpcRequest::Ping).unwrap_err();
        assert!(matches!(err, IpcError::FrameTooLarge { .. }));
        server.join().unwrap();
    }
}
