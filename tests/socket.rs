use vigilia::{Endpoint, Family, Kind, Socket};

use std::io::ErrorKind;
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_tcp_lifecycle_over_loopback() {
    let listener = Socket::new(Family::Inet, Kind::Stream).expect("Failed to create socket");
    listener.set_reuseaddr().expect("Failed to set reuseaddr");

    let endpoint = Endpoint::from_str("127.0.0.1:0").expect("Failed to parse endpoint");
    listener.bind(&endpoint).expect("Failed to bind");
    listener.listen(16).expect("Failed to listen");

    let local = listener.local_endpoint().expect("Failed to get local endpoint");
    assert_eq!(local.family(), Family::Inet);

    let handle = thread::spawn(move || {
        let client = Socket::new(Family::Inet, Kind::Stream).expect("Failed to create socket");
        client.connect(&local).expect("Failed to connect");

        client.write(b"ping").expect("Failed to write");

        let mut buffer = [0; 4];
        let n = client.read(&mut buffer).expect("Failed to read");
        assert_eq!(&buffer[..n], b"pong");
    });

    let (accepted, peer) = listener.accept().expect("Failed to accept connection");
    assert_eq!(peer.family(), Family::Inet);

    let mut buffer = [0; 4];
    let n = accepted.read(&mut buffer).expect("Failed to read");
    assert_eq!(&buffer[..n], b"ping");

    accepted.write(b"pong").expect("Failed to write");

    handle.join().expect("Client thread panicked");
}

#[test]
fn test_datagram_round_trip() {
    let receiver = Socket::new(Family::Inet, Kind::Datagram).expect("Failed to create socket");
    receiver
        .bind(&Endpoint::from_str("127.0.0.1:0").expect("Failed to parse endpoint"))
        .expect("Failed to bind");

    let target = receiver.local_endpoint().expect("Failed to get local endpoint");

    let sender = Socket::new(Family::Inet, Kind::Datagram).expect("Failed to create socket");
    sender.connect(&target).expect("Failed to connect");
    sender.write(b"datagram").expect("Failed to write");

    let mut buffer = [0; 16];
    let n = receiver.read(&mut buffer).expect("Failed to read");
    assert_eq!(&buffer[..n], b"datagram");
}

#[test]
fn test_unix_domain_lifecycle() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("vigilia.sock");

    let listener = Socket::new(Family::Unix, Kind::Stream).expect("Failed to create socket");
    listener
        .bind(&Endpoint::unix(&path))
        .expect("Failed to bind unix socket");
    listener.listen(4).expect("Failed to listen");

    let local = listener.local_endpoint().expect("Failed to get local endpoint");
    assert_eq!(local.family(), Family::Unix);

    let client_path = path.clone();
    let handle = thread::spawn(move || {
        let client = Socket::new(Family::Unix, Kind::Stream).expect("Failed to create socket");
        client
            .connect(&Endpoint::unix(&client_path))
            .expect("Failed to connect");
        client.write(b"local").expect("Failed to write");
    });

    let (accepted, _) = listener.accept().expect("Failed to accept connection");

    let mut buffer = [0; 8];
    let n = accepted.read(&mut buffer).expect("Failed to read");
    assert_eq!(&buffer[..n], b"local");

    handle.join().expect("Client thread panicked");
}

#[test]
fn test_nonblocking_mode_round_trip() {
    let socket = Socket::new(Family::Inet, Kind::Stream).expect("Failed to create socket");

    assert!(
        !socket.nonblocking().expect("Failed to read mode"),
        "Sockets start in blocking mode"
    );

    socket.set_nonblocking(true).expect("Failed to set mode");
    assert!(socket.nonblocking().expect("Failed to read mode"));

    socket.set_nonblocking(false).expect("Failed to set mode");
    assert!(!socket.nonblocking().expect("Failed to read mode"));
}

#[test]
fn test_linger_round_trip() {
    let socket = Socket::new(Family::Inet, Kind::Stream).expect("Failed to create socket");

    assert_eq!(socket.linger().expect("Failed to read linger"), None);

    socket
        .set_linger(Some(Duration::from_secs(5)))
        .expect("Failed to set linger");
    assert_eq!(
        socket.linger().expect("Failed to read linger"),
        Some(Duration::from_secs(5))
    );

    socket.set_linger(None).expect("Failed to clear linger");
    assert_eq!(socket.linger().expect("Failed to read linger"), None);
}

#[test]
fn test_timeout_options_round_trip() {
    let socket = Socket::new(Family::Inet, Kind::Datagram).expect("Failed to create socket");

    assert_eq!(socket.read_timeout().expect("Failed to read timeout"), None);

    socket
        .set_read_timeout(Some(Duration::from_millis(250)))
        .expect("Failed to set read timeout");
    assert_eq!(
        socket.read_timeout().expect("Failed to read timeout"),
        Some(Duration::from_millis(250))
    );

    socket
        .set_write_timeout(Some(Duration::from_millis(750)))
        .expect("Failed to set write timeout");
    assert_eq!(
        socket.write_timeout().expect("Failed to read timeout"),
        Some(Duration::from_millis(750))
    );

    socket
        .set_read_timeout(None)
        .expect("Failed to clear read timeout");
    assert_eq!(socket.read_timeout().expect("Failed to read timeout"), None);
}

#[test]
fn test_read_timeout_bounds_a_blocking_read() {
    let socket = Socket::new(Family::Inet, Kind::Datagram).expect("Failed to create socket");
    socket
        .bind(&Endpoint::from_str("127.0.0.1:0").expect("Failed to parse endpoint"))
        .expect("Failed to bind");

    let timeout = Duration::from_millis(100);
    socket
        .set_read_timeout(Some(timeout))
        .expect("Failed to set read timeout");

    let mut buffer = [0; 8];
    let start = Instant::now();
    let err = socket
        .read(&mut buffer)
        .expect_err("A read with no data must time out");

    assert!(
        err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut,
        "Unexpected error kind: {:?}",
        err.kind()
    );
    assert!(start.elapsed() >= timeout);
}

#[test]
fn test_explicit_close_reports_success() {
    let socket = Socket::new(Family::Inet, Kind::Stream).expect("Failed to create socket");
    socket.close().expect("Failed to close socket");
}
