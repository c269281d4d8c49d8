use vigilia::{Endpoint, Family};

use std::str::FromStr;

#[test]
fn test_parse_ipv4_endpoint() {
    let endpoint = Endpoint::from_str("127.0.0.1:8080").expect("Failed to parse endpoint");

    assert_eq!(endpoint.family(), Family::Inet);
    assert_eq!(endpoint.port(), Some(8080));
    assert_eq!(endpoint.to_string(), "127.0.0.1:8080");
}

#[test]
fn test_parse_ipv6_endpoint() {
    let endpoint = Endpoint::from_str("[::1]:9090").expect("Failed to parse endpoint");

    assert_eq!(endpoint.family(), Family::Inet6);
    assert_eq!(endpoint.port(), Some(9090));
    assert_eq!(endpoint.to_string(), "[::1]:9090");
}

#[test]
fn test_unix_endpoint_classification() {
    let endpoint = Endpoint::unix("/tmp/vigilia.sock");

    assert_eq!(endpoint.family(), Family::Unix);
    assert_eq!(endpoint.port(), None);
    assert_eq!(endpoint.to_string(), "/tmp/vigilia.sock");
}

#[test]
fn test_endpoint_equality() {
    let a = Endpoint::from_str("10.0.0.1:80").expect("Failed to parse endpoint");
    let b = Endpoint::from_str("10.0.0.1:80").expect("Failed to parse endpoint");
    let c = Endpoint::from_str("10.0.0.1:81").expect("Failed to parse endpoint");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, Endpoint::unix("/tmp/vigilia.sock"));
}

#[test]
fn test_rejects_malformed_address() {
    assert!(Endpoint::from_str("not an address").is_err());
    assert!(Endpoint::from_str("127.0.0.1").is_err());
}
