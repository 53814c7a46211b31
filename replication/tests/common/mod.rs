//! Test doubles for the snapshot system: a recording host runtime and a
//! loopback transport.

// not every test file uses every helper
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use glam::{Quat, Vec3};

use tickframe_replication::{
    ByteReader, ByteWriter, ClientId, ObjectId, PackedInt, ReplicationHost, Serde, SerdeErr,
    SnapshotTransport, SpawnCommand, Tick, VariableAddress, VariableDelta, VariableEntry,
};

pub const SERVER_ID: ClientId = 0;

/// Replicated variable double: serializes its byte payload verbatim and
/// records every payload decoded into it.
#[derive(Default)]
pub struct RecordingVariable {
    pub value: Vec<u8>,
    pub decoded: Vec<Vec<u8>>,
}

impl RecordingVariable {
    pub fn holding(value: &[u8]) -> Self {
        Self {
            value: value.to_vec(),
            decoded: Vec::new(),
        }
    }
}

impl VariableDelta for RecordingVariable {
    fn write_delta(&self, writer: &mut ByteWriter) {
        writer.write_bytes(&self.value);
    }

    fn read_delta(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        let bytes = reader.read_bytes(reader.remaining())?.to_vec();
        self.value = bytes.clone();
        self.decoded.push(bytes);
        Ok(())
    }
}

/// Host runtime double: fixed topology, settable tick, recorded spawns.
pub struct TestHost {
    pub server: bool,
    pub local_id: ClientId,
    pub peers: Vec<ClientId>,
    pub tick: Tick,
    pub variables: HashMap<VariableAddress, RecordingVariable>,
    pub applied: Vec<(SpawnCommand, Option<ObjectId>)>,
}

impl TestHost {
    pub fn server(clients: &[ClientId]) -> Self {
        Self {
            server: true,
            local_id: SERVER_ID,
            peers: clients.to_vec(),
            tick: 0,
            variables: HashMap::new(),
            applied: Vec::new(),
        }
    }

    pub fn client(local_id: ClientId) -> Self {
        Self {
            server: false,
            local_id,
            peers: vec![SERVER_ID],
            tick: 0,
            variables: HashMap::new(),
            applied: Vec::new(),
        }
    }

    pub fn register_variable(&mut self, address: VariableAddress) {
        self.variables.insert(address, RecordingVariable::default());
    }

    pub fn variable(&self, address: &VariableAddress) -> &RecordingVariable {
        &self.variables[address]
    }
}

impl ReplicationHost for TestHost {
    fn variable_mut(&mut self, address: &VariableAddress) -> Option<&mut dyn VariableDelta> {
        self.variables
            .get_mut(address)
            .map(|variable| variable as &mut dyn VariableDelta)
    }

    fn apply_spawn(&mut self, command: &SpawnCommand, parent: Option<ObjectId>) {
        self.applied.push((command.clone(), parent));
    }

    fn peer_ids(&self) -> Vec<ClientId> {
        self.peers.clone()
    }

    fn is_server(&self) -> bool {
        self.server
    }

    fn local_client_id(&self) -> ClientId {
        self.local_id
    }

    fn server_client_id(&self) -> ClientId {
        SERVER_ID
    }

    fn current_tick(&self) -> Tick {
        self.tick
    }
}

/// Loopback transport: captures every framed message per recipient.
/// Recipients in `blocked` get no message context, as a saturated wire
/// would behave.
#[derive(Default)]
pub struct ChannelTransport {
    pub sent: HashMap<ClientId, Vec<Vec<u8>>>,
    pub blocked: HashSet<ClientId>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages captured for `recipient`, oldest first.
    pub fn messages(&self, recipient: ClientId) -> &[Vec<u8>] {
        self.sent
            .get(&recipient)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn last_message(&self, recipient: ClientId) -> Vec<u8> {
        self.messages(recipient)
            .last()
            .expect("no message was captured for this recipient")
            .clone()
    }
}

impl SnapshotTransport for ChannelTransport {
    fn send_snapshot(
        &mut self,
        recipient: ClientId,
        body: &mut dyn FnMut(&mut ByteWriter),
    ) -> bool {
        if self.blocked.contains(&recipient) {
            return false;
        }
        let mut writer = ByteWriter::new();
        body(&mut writer);
        self.sent.entry(recipient).or_default().push(writer.to_bytes());
        true
    }
}

pub fn address(object_id: u64, behaviour_index: u16, variable_index: u16) -> VariableAddress {
    VariableAddress::new(object_id, behaviour_index, variable_index)
}

pub fn spawn_command(object_id: ObjectId) -> SpawnCommand {
    SpawnCommand {
        object_id,
        archetype_hash: 0xABCD_1234,
        is_scene_object: false,
        is_player_object: false,
        owner_client_id: SERVER_ID,
        parent_network_id: object_id,
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        tick_written: 0,
    }
}

/// Walk a captured snapshot message up to the spawn section and return its
/// spawn count.
pub fn spawn_count(payload: &[u8]) -> i16 {
    let mut reader = ByteReader::new(payload);

    let _tick = PackedInt::de(&mut reader).unwrap();
    let _sequence = u16::de(&mut reader).unwrap();
    let _sentinel = u16::de(&mut reader).unwrap();

    let buffer_length = u16::de(&mut reader).unwrap();
    let _arena = reader.read_bytes(usize::from(buffer_length)).unwrap();

    let entry_count = i16::de(&mut reader).unwrap();
    for _ in 0..entry_count {
        VariableEntry::de(&mut reader).unwrap();
    }
    let _sentinel = u16::de(&mut reader).unwrap();

    i16::de(&mut reader).unwrap()
}
