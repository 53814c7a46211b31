use std::collections::HashMap;

use log::{error, trace, warn};

use tickframe_serde::{ByteReader, ByteWriter, PackedInt, Serde};

use crate::client::ClientRecord;
use crate::config::SnapshotConfig;
use crate::constants::SECTION_SENTINEL;
use crate::entry::VariableAddress;
use crate::error::{ReceiveError, StoreError};
use crate::host::{ReplicationHost, SnapshotTransport, VariableDelta};
use crate::spawn::SpawnCommand;
use crate::store::SnapshotStore;
use crate::types::{ClientId, SpawnTick, Tick};

/// Drives snapshot replication for one host.
///
/// The system owns the [`SnapshotStore`] and one [`ClientRecord`] per peer.
/// The outer runtime funnels variable writes through
/// [`Self::store_variable`] and spawns through [`Self::spawn`], calls
/// [`Self::early_tick`] once per simulation step, and hands every received
/// snapshot message to [`Self::receive_snapshot`].
pub struct SnapshotSystem {
    config: SnapshotConfig,
    store: SnapshotStore,
    clients: HashMap<ClientId, ClientRecord>,
    last_sent_tick: Option<Tick>,
}

impl SnapshotSystem {
    pub fn new(config: SnapshotConfig) -> Self {
        let store = SnapshotStore::new(&config);
        Self {
            config,
            store,
            clients: HashMap::new(),
            last_sent_tick: None,
        }
    }

    // Capture

    /// Record the current value of one replicated variable for the next
    /// snapshot.
    pub fn store_variable(
        &mut self,
        host: &dyn ReplicationHost,
        address: VariableAddress,
        variable: &dyn VariableDelta,
    ) -> Result<(), StoreError> {
        let result = self
            .store
            .store_variable(address, host.current_tick(), variable);
        if let Err(store_error) = &result {
            warn!("variable {:?} not captured: {}", address, store_error);
        }
        result
    }

    /// Queue `command` for replication: a server fans out to every
    /// connected client, a client targets the server alone.
    pub fn spawn(
        &mut self,
        host: &dyn ReplicationHost,
        mut command: SpawnCommand,
    ) -> Result<(), StoreError> {
        command.tick_written = host.current_tick() as SpawnTick;

        let server_id = host.server_client_id();
        let targets = if host.is_server() {
            host.peer_ids()
                .into_iter()
                .filter(|id| *id != server_id)
                .collect()
        } else {
            std::iter::once(server_id).collect()
        };

        let result = self.store.add_spawn(command, targets);
        if let Err(store_error) = &result {
            warn!("spawn not queued: {}", store_error);
        }
        result
    }

    // Tick

    /// Early-tick hook: on the first call for each new tick, send one
    /// snapshot to every recipient this host replicates to.
    pub fn early_tick(&mut self, host: &dyn ReplicationHost, transport: &mut dyn SnapshotTransport) {
        if !self.config.send_variables && !self.config.send_spawns {
            return;
        }

        let tick = host.current_tick();
        if self.last_sent_tick == Some(tick) {
            return;
        }
        self.last_sent_tick = Some(tick);

        if host.is_server() {
            let local_id = host.local_client_id();
            for client_id in host.peer_ids() {
                if client_id == local_id {
                    continue;
                }
                self.send_to(client_id, tick, transport);
            }
        } else {
            let server_id = host.server_client_id();
            if host.peer_ids().contains(&server_id) {
                self.send_to(server_id, tick, transport);
            }
        }
    }

    fn send_to(&mut self, recipient: ClientId, tick: Tick, transport: &mut dyn SnapshotTransport) {
        let record = self.clients.entry(recipient).or_default();
        let store = &self.store;

        let sent = transport.send_snapshot(recipient, &mut |writer| {
            Self::compose(store, record, recipient, tick, writer);
        });

        if sent {
            record.finish_snapshot();
            trace!("snapshot for tick {} sent to client {}", tick, recipient);
        } else {
            trace!("no message context for client {}, skipped this tick", recipient);
        }
    }

    /// Frame one snapshot body: header, arena, variable table, spawns, ack,
    /// with a sentinel after each section.
    fn compose(
        store: &SnapshotStore,
        record: &mut ClientRecord,
        recipient: ClientId,
        tick: Tick,
        writer: &mut ByteWriter,
    ) {
        PackedInt::new(tick).ser(writer);
        record.next_sequence.ser(writer);
        SECTION_SENTINEL.ser(writer);

        store.write_buffer(writer);
        store.write_index(writer);
        (SECTION_SENTINEL + 1).ser(writer);

        store.write_spawns(record, recipient, writer);
        (SECTION_SENTINEL + 2).ser(writer);

        record.last_received_sequence.ser(writer);
        (SECTION_SENTINEL + 3).ser(writer);
    }

    // Receive

    /// Parse and apply one snapshot message from `sender`.
    ///
    /// Sections are parsed in their fixed order; a sentinel or framing
    /// failure logs a critical integrity event and abandons the rest of the
    /// message. Sections already applied stay applied, and the connection
    /// state is left intact.
    pub fn receive_snapshot(
        &mut self,
        host: &mut dyn ReplicationHost,
        sender: ClientId,
        payload: &[u8],
    ) -> Result<(), ReceiveError> {
        let result = self.parse_snapshot(host, sender, payload);
        if let Err(receive_error) = &result {
            error!("corrupt snapshot from client {}: {}", sender, receive_error);
        }
        result
    }

    fn parse_snapshot(
        &mut self,
        host: &mut dyn ReplicationHost,
        sender: ClientId,
        payload: &[u8],
    ) -> Result<(), ReceiveError> {
        let mut reader = ByteReader::new(payload);

        let sender_tick = PackedInt::de(&mut reader)?.get();
        let sequence = u16::de(&mut reader)?;
        let record = self.clients.entry(sender).or_default();
        record.last_received_sequence = sequence;
        verify_sentinel(&mut reader, SECTION_SENTINEL, "header")?;

        self.store.read_buffer(&mut reader)?;
        self.store.read_index(&mut reader, host)?;
        verify_sentinel(&mut reader, SECTION_SENTINEL + 1, "variable table")?;

        // spawns are parsed here but applied only once their trailing
        // sentinel validates: instantiation is not undoable
        let commands = self.store.read_spawns(&mut reader)?;
        verify_sentinel(&mut reader, SECTION_SENTINEL + 2, "spawn table")?;
        self.store.apply_spawns(commands, host);

        let record = self.clients.entry(sender).or_default();
        self.store.read_acks(sender, record, &mut reader)?;
        verify_sentinel(&mut reader, SECTION_SENTINEL + 3, "ack")?;

        trace!(
            "snapshot for tick {} from client {} applied",
            sender_tick,
            sender
        );
        Ok(())
    }

    // Maintenance

    /// Drop all per-client records and reset the store. The arena stays
    /// allocated for reuse.
    pub fn clear(&mut self) {
        self.clients.clear();
        self.store.clear();
        self.last_sent_tick = None;
    }

    // Inspection

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn client(&self, client_id: &ClientId) -> Option<&ClientRecord> {
        self.clients.get(client_id)
    }
}

impl Default for SnapshotSystem {
    fn default() -> Self {
        Self::new(SnapshotConfig::default())
    }
}

fn verify_sentinel(
    reader: &mut ByteReader,
    expected: u16,
    section: &'static str,
) -> Result<(), ReceiveError> {
    let found = u16::de(reader)?;
    if found != expected {
        return Err(ReceiveError::BadSentinel {
            section,
            expected: u32::from(expected),
            found: u32::from(found),
        });
    }
    Ok(())
}
