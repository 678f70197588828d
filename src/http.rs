//! HTTP status server.
//!
//! Serves the [`status_page`](crate::status_page) to anything that connects.
//! There is no routing: every method and path gets `200` and the same page.
//!
//! Clients are handled one at a time on a single background thread, so the
//! relay loop never waits on a slow client. Each client gets at most
//! [`REQUEST_TIMEOUT`] to finish its request head; after that the page is
//! sent anyway and the connection is closed.

use crate::reading::ReadingStore;
use crate::status_page;
use log::{debug, error, info, warn};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default port for the status page.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// How long a client may take to send its request head.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// How often the idle accept loop checks the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Request bytes kept while looking for the end of the head. The rest is
/// ignored; the answer never depends on it.
const MAX_REQUEST_HEAD: usize = 1024;

/// Stack size for the serving thread. The ESP32 default is too small for
/// formatting the page.
const SERVER_STACK_SIZE: usize = 8 * 1024;

/// HTTP status server.
///
/// Runs in a background thread. Drop it to stop the server.
pub struct StatusServer {
    /// Server thread handle.
    handle: Option<thread::JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Address actually bound (resolves port 0).
    local_addr: SocketAddr,
}

impl StatusServer {
    /// Start the status server.
    ///
    /// # Arguments
    ///
    /// * `bind_addr` - IP address to bind to (use `None` for 0.0.0.0)
    /// * `port` - Port to listen on (0 picks a free port)
    /// * `store` - Reading store the page is rendered from
    pub fn start(bind_addr: Option<IpAddr>, port: u16, store: ReadingStore) -> io::Result<Self> {
        let addr = match bind_addr {
            Some(ip) => SocketAddr::new(ip, port),
            None => SocketAddr::from(([0, 0, 0, 0], port)),
        };

        let listener = TcpListener::bind(addr)?;
        // Non-blocking accept so the loop can see the shutdown flag
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        info!("Status page listening on http://{}/", local_addr);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("http".into())
            .stack_size(SERVER_STACK_SIZE)
            .spawn(move || {
                Self::run_server(listener, store, shutdown_clone);
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            local_addr,
        })
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the accept loop.
    fn run_server(listener: TcpListener, store: ReadingStore, shutdown: Arc<AtomicBool>) {
        loop {
            // Use Acquire ordering to ensure we see the shutdown flag from stop()
            if shutdown.load(Ordering::Acquire) {
                info!("Status server shutting down");
                break;
            }

            match listener.accept() {
                Ok((stream, peer)) => {
                    debug!("Status page request from {}", peer);
                    if let Err(e) = Self::serve_client(stream, &store) {
                        warn!("Failed to send status page to {}: {}", peer, e);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    error!("Server error: {}", e);
                    break;
                }
            }
        }
    }

    /// Wait for the request head, then answer with the page and close.
    fn serve_client(mut stream: TcpStream, store: &ReadingStore) -> io::Result<()> {
        // Accepted sockets may inherit the listener's non-blocking mode
        stream.set_nonblocking(false)?;
        stream.set_write_timeout(Some(REQUEST_TIMEOUT))?;

        let complete = read_request_head(&mut stream, Instant::now() + REQUEST_TIMEOUT);
        if !complete {
            debug!("Request head incomplete, answering anyway");
        }

        let page = status_page::render(store.latest().as_ref());
        let head = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: text/html; charset=utf-8\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n",
            page.len()
        );
        stream.write_all(head.as_bytes())?;
        stream.write_all(page.as_bytes())?;
        stream.flush()?;
        // Peer may already be gone
        let _ = stream.shutdown(Shutdown::Write);
        Ok(())
    }

    /// Stop the server.
    ///
    /// May take up to [`REQUEST_TIMEOUT`] if a client is being served.
    pub fn stop(&mut self) {
        // Use Release ordering to ensure the server thread sees this write
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read from `stream` until a blank line ends the request head, the peer
/// closes, or `deadline` passes. Returns whether the head was complete.
fn read_request_head<S: Read + SetReadTimeout>(stream: &mut S, deadline: Instant) -> bool {
    let mut head = Vec::with_capacity(256);
    let mut chunk = [0u8; 128];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() || stream.set_timeout(remaining).is_err() {
            return false;
        }

        match stream.read(&mut chunk) {
            Ok(0) => return false,
            Ok(n) => {
                let take = n.min(MAX_REQUEST_HEAD.saturating_sub(head.len()));
                head.extend_from_slice(&chunk[..take]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    return true;
                }
                if head.len() >= MAX_REQUEST_HEAD {
                    return false;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(_) => return false,
        }
    }
}

/// Per-read timeout on a client connection.
trait SetReadTimeout {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl SetReadTimeout for TcpStream {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.set_read_timeout(Some(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::Ipv4Addr;

    impl SetReadTimeout for Cursor<Vec<u8>> {
        fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
            Ok(())
        }
    }

    fn start_local(store: ReadingStore) -> (StatusServer, SocketAddr) {
        let server =
            StatusServer::start(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), 0, store).unwrap();
        let addr = server.local_addr();
        (server, addr)
    }

    fn fetch(addr: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.write_all(request.as_bytes()).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[test]
    fn test_binds_free_port() {
        let (server, addr) = start_local(ReadingStore::new());
        assert_ne!(addr.port(), 0);
        drop(server);
    }

    #[test]
    fn test_serves_latest_reading() {
        let store = ReadingStore::new();
        store.ingest(b"distance:3.5").unwrap();
        let (_server, addr) = start_local(store);

        let response = fetch(addr, "GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Connection: close\r\n"));
        assert!(response.contains("distance:3.5"));
    }

    #[test]
    fn test_unterminated_request_still_gets_page() {
        let store = ReadingStore::new();
        store.ingest(b"distance:2").unwrap();
        let (_server, addr) = start_local(store);

        let started = Instant::now();
        // No blank line; the socket stays open for writing
        let response = fetch(addr, "GET / HTTP/1.1\r\nHost: x\r\n");
        let waited = started.elapsed();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("distance:2"));
        assert!(waited >= REQUEST_TIMEOUT - Duration::from_millis(200));
        assert!(waited < REQUEST_TIMEOUT + Duration::from_secs(2));
    }

    #[test]
    fn test_silent_client_is_cut_off() {
        let (_server, addr) = start_local(ReadingStore::new());

        let silent = TcpStream::connect(addr).unwrap();
        let response = fetch(addr, "GET / HTTP/1.1\r\n\r\n");
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        drop(silent);
    }

    #[test]
    fn test_content_length_matches_body() {
        let (_server, addr) = start_local(ReadingStore::new());
        let response = fetch(addr, "GET / HTTP/1.1\r\n\r\n");
        let (head, body) = response.split_once("\r\n\r\n").unwrap();
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("Content-Length: "))
            .unwrap();
        assert_eq!(length.parse::<usize>().unwrap(), body.len());
    }

    #[test]
    fn test_read_head_stops_at_blank_line() {
        let mut stream = Cursor::new(b"GET / HTTP/1.1\r\nHost: x\r\n\r\nbody".to_vec());
        assert!(read_request_head(&mut stream, far_deadline()));
    }

    #[test]
    fn test_read_head_closed_early() {
        let mut stream = Cursor::new(b"GET / HTTP/1.1\r\n".to_vec());
        assert!(!read_request_head(&mut stream, far_deadline()));
    }

    #[test]
    fn test_read_head_past_deadline() {
        let mut stream = Cursor::new(b"GET / HTTP/1.1\r\n\r\n".to_vec());
        assert!(!read_request_head(&mut stream, Instant::now()));
    }

    #[test]
    fn test_read_head_gives_up_on_oversized_head() {
        let mut stream = Cursor::new(vec![b'a'; MAX_REQUEST_HEAD * 2]);
        assert!(!read_request_head(&mut stream, far_deadline()));
    }

    #[test]
    fn test_stop_joins_thread() {
        let (mut server, _addr) = start_local(ReadingStore::new());
        server.stop();
        assert!(server.handle.is_none());
    }
}
