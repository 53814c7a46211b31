use tickframe_serde::{ByteReader, ByteWriter, SerdeErr};

use crate::entry::VariableAddress;
use crate::spawn::SpawnCommand;
use crate::types::{ClientId, ObjectId, Tick};

/// Serialization handle for one replicated variable, provided by the host
/// runtime. The payload format is the variable's own business; the core
/// only moves the bytes.
pub trait VariableDelta {
    /// Serialize the variable's current value.
    fn write_delta(&self, writer: &mut ByteWriter);

    /// Decode a received value into the live variable.
    fn read_delta(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr>;
}

/// Everything the snapshot core needs from the outer runtime: variable
/// lookup, object instantiation, peer topology, and the tick clock.
pub trait ReplicationHost {
    /// The live variable at `address`, or `None` when its object does not
    /// exist locally yet.
    fn variable_mut(&mut self, address: &VariableAddress) -> Option<&mut dyn VariableDelta>;

    /// Create and register the local object described by `command`,
    /// parented under `parent` or at the root.
    fn apply_spawn(&mut self, command: &SpawnCommand, parent: Option<ObjectId>);

    /// Ids of every live connection. On a server this is its clients (the
    /// server's own id may appear when it hosts a local player); on a
    /// client it contains the server id once connected.
    fn peer_ids(&self) -> Vec<ClientId>;

    fn is_server(&self) -> bool;

    fn local_client_id(&self) -> ClientId;

    fn server_client_id(&self) -> ClientId;

    /// Monotone simulation tick.
    fn current_tick(&self) -> Tick;
}

/// Outgoing framed-message access.
///
/// Implementations own the message context and must release it on every
/// exit path; the core only ever writes the body.
pub trait SnapshotTransport {
    /// Frame and deliver one snapshot message to `recipient`, invoking
    /// `body` exactly once to fill it. Returns `false` without invoking
    /// `body` when no message context is available this tick.
    fn send_snapshot(
        &mut self,
        recipient: ClientId,
        body: &mut dyn FnMut(&mut ByteWriter),
    ) -> bool;
}
