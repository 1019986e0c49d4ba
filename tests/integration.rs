//! Integration tests against the real AF_KEY socket.
//!
//! These need CAP_NET_ADMIN and mutate the kernel SA database, so they are
//! gated behind the `integration` feature.
//! Run with: `sudo cargo test --test integration --features integration`

#![cfg(feature = "integration")]

use std::net::Ipv4Addr;

use pfkey::build::SaBuilder;
use pfkey::{Endpoint, Session, build};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn connect() -> Session {
    Session::open().expect("failed to open AF_KEY socket (need CAP_NET_ADMIN)")
}

#[test]
fn test_register_lists_algorithms() {
    init_tracing();
    let mut session = connect();

    let registration = session.register().unwrap();
    // Any kernel with ESP support announces at least one cipher.
    assert!(!registration.encrypt_algorithms.is_empty());
}

#[test]
fn test_flush_then_dump_is_empty() {
    init_tracing();
    let mut session = connect();

    session.send_flush().unwrap();
    // The kernel acks the flush before the dump is answered.
    session.recv().unwrap();

    let messages = session.dump().unwrap();
    assert!(messages.is_empty());
}

#[test]
fn test_add_and_delete_roundtrip() {
    init_tracing();
    let mut session = connect();

    let src = Endpoint::new(Ipv4Addr::new(127, 0, 0, 1));
    let dst = Endpoint::new(Ipv4Addr::new(127, 0, 0, 2));
    let spi: u32 = 0x1000_0000;

    let mut add = SaBuilder::new(spi, src, dst)
        .seq(1)
        .encrypt_key(vec![0x42u8; 32])
        .build_add();
    session.send(&mut add).unwrap();
    let reply = session.recv().unwrap();
    assert_eq!(reply.header.sadb_msg_errno, 0, "ADD rejected: {reply}");

    let messages = session.dump().unwrap();
    assert!(
        messages
            .iter()
            .any(|m| m.sa().is_some_and(|sa| sa.sadb_sa_spi == spi)),
        "added SA not present in dump"
    );

    let mut del = build::delete(spi, src, dst);
    session.send(&mut del).unwrap();
    let reply = session.recv().unwrap();
    assert_eq!(reply.header.sadb_msg_errno, 0, "DELETE rejected: {reply}");
}
