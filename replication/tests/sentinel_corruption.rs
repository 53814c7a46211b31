//! Integrity scenarios: corrupted framing must abandon the rest of the
//! message without disturbing what was already applied or the connection.

mod common;

use common::{address, spawn_command, ChannelTransport, RecordingVariable, TestHost, SERVER_ID};
use tickframe_replication::{ReceiveError, SnapshotSystem};

/// One server message carrying a variable and a spawn.
fn captured_message() -> Vec<u8> {
    let mut server = SnapshotSystem::default();
    let mut server_host = TestHost::server(&[1]);
    let mut transport = ChannelTransport::new();

    server_host.tick = 10;
    server
        .store_variable(
            &server_host,
            address(7, 0, 0),
            &RecordingVariable::holding(b"AB"),
        )
        .unwrap();
    server.spawn(&server_host, spawn_command(42)).unwrap();
    server.early_tick(&server_host, &mut transport);

    transport.last_message(1)
}

#[test]
fn corrupt_spawn_table_sentinel_suppresses_spawns_only() {
    let message = captured_message();

    // the message tail is sentinel2, the u16 ack, sentinel3
    let mut corrupted = message.clone();
    let sentinel2_at = corrupted.len() - 6;
    corrupted[sentinel2_at] ^= 0xFF;

    let mut client = SnapshotSystem::default();
    let mut client_host = TestHost::client(1);
    client_host.register_variable(address(7, 0, 0));

    let result = client.receive_snapshot(&mut client_host, SERVER_ID, &corrupted);
    assert!(matches!(
        result,
        Err(ReceiveError::BadSentinel {
            section: "spawn table",
            ..
        })
    ));

    // the earlier sections were applied, the spawn was not
    assert_eq!(client_host.variable(&address(7, 0, 0)).value, b"AB");
    assert!(client_host.applied.is_empty());

    // the connection survives: an intact copy still applies the spawn
    client
        .receive_snapshot(&mut client_host, SERVER_ID, &message)
        .unwrap();
    assert_eq!(client_host.applied.len(), 1);
}

#[test]
fn corrupt_header_sentinel_rejects_the_whole_message() {
    let message = captured_message();

    // the header sentinel sits after the packed tick and the u16 sequence
    let mut corrupted = message.clone();
    corrupted[3] ^= 0xFF;

    let mut client = SnapshotSystem::default();
    let mut client_host = TestHost::client(1);
    client_host.register_variable(address(7, 0, 0));

    let result = client.receive_snapshot(&mut client_host, SERVER_ID, &corrupted);
    assert!(matches!(
        result,
        Err(ReceiveError::BadSentinel { section: "header", .. })
    ));

    assert!(client_host.variable(&address(7, 0, 0)).decoded.is_empty());
    assert!(client_host.applied.is_empty());
    assert!(client.store().entries().is_empty());
}

#[test]
fn truncated_message_is_a_serde_error() {
    let message = captured_message();

    let mut client = SnapshotSystem::default();
    let mut client_host = TestHost::client(1);

    let result = client.receive_snapshot(&mut client_host, SERVER_ID, &message[..10]);
    assert!(matches!(result, Err(ReceiveError::Serde(_))));
}

#[test]
fn oversized_buffer_section_is_rejected() {
    let mut server = SnapshotSystem::default();
    let mut server_host = TestHost::server(&[1]);
    let mut transport = ChannelTransport::new();
    server_host.tick = 1;
    server.early_tick(&server_host, &mut transport);
    let message = transport.last_message(1);

    // grow the buffer length field beyond any staging capacity
    let mut corrupted = message;
    // packed tick 1 is one byte, sequence two: buffer length lives at 5..7
    corrupted[5..7].copy_from_slice(&u16::MAX.to_le_bytes());

    let mut client = SnapshotSystem::default();
    let mut client_host = TestHost::client(1);

    let result = client.receive_snapshot(&mut client_host, SERVER_ID, &corrupted);
    assert!(matches!(result, Err(ReceiveError::BufferTooLarge { .. })));
}
