//! End-to-end checks of the status page over a loopback socket.

use distance_relay::status_page::ALERT_MARKER;
use distance_relay::{ReadingStore, StatusServer};
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;

fn start(store: &ReadingStore) -> (StatusServer, SocketAddr) {
    let server = StatusServer::start(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), 0, store.clone())
        .expect("bind loopback");
    let addr = server.local_addr();
    (server, addr)
}

fn request(addr: SocketAddr, head: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");
    stream
        .write_all(format!("{}\r\nHost: relay\r\nConnection: close\r\n\r\n", head).as_bytes())
        .expect("send request");
    let mut response = String::new();
    stream.read_to_string(&mut response).expect("read response");
    response
}

#[test]
fn any_method_and_path_gets_the_page() {
    let store = ReadingStore::new();
    store.ingest(b"distance:7").unwrap();
    let (_server, addr) = start(&store);

    for head in [
        "GET / HTTP/1.1",
        "GET /anything/else?x=1 HTTP/1.1",
        "POST /submit HTTP/1.1",
        "HEAD /stats HTTP/1.0",
    ] {
        let response = request(addr, head);
        assert!(response.starts_with("HTTP/1."), "{}: {}", head, response);
        assert!(response.contains(" 200 "), "{}: {}", head, response);
        assert!(
            response.to_ascii_lowercase().contains("content-type: text/html"),
            "{}",
            head
        );
    }

    let body = request(addr, "GET /whatever HTTP/1.1");
    assert!(body.contains("distance:7"));
}

#[test]
fn page_tracks_store_and_alert() {
    let store = ReadingStore::new();
    let (_server, addr) = start(&store);

    assert!(!request(addr, "GET / HTTP/1.1").contains(ALERT_MARKER));

    store.ingest(b"distance:0.3").unwrap();
    let response = request(addr, "GET / HTTP/1.1");
    assert!(response.contains("distance:0.3"));
    assert!(response.contains(ALERT_MARKER));

    // Negative writes are refused; the page keeps the previous value
    assert!(store.ingest(b"distance:-0.3").is_err());
    let response = request(addr, "GET / HTTP/1.1");
    assert!(response.contains("distance:0.3"));
    assert!(response.contains(ALERT_MARKER));

    store.ingest(b"distance:4").unwrap();
    let response = request(addr, "GET / HTTP/1.1");
    assert!(response.contains("distance:4"));
    assert!(!response.contains(ALERT_MARKER));
}
