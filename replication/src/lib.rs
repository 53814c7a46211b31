//! # Tickframe Replication
//! Snapshot replication core for a networked game-object runtime.
//!
//! On each simulation tick the [`SnapshotSystem`] captures the latest value
//! of every replicated variable and every pending object spawn into its
//! [`SnapshotStore`], then frames one snapshot message per recipient.
//! Received snapshots are applied with last-writer-wins tick filtering, and
//! acknowledgements returned by peers stop already-delivered spawns from
//! being retransmitted.
//!
//! The outer runtime stays behind the [`ReplicationHost`] and
//! [`SnapshotTransport`] traits: object instantiation, variable lookup, the
//! tick clock, and the wire itself are all collaborators, not residents.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use tickframe_serde::{ByteReader, ByteWriter, PackedInt, Serde, SerdeErr};

mod allocator;
mod client;
mod config;
mod constants;
mod entry;
mod error;
mod host;
mod spawn;
mod store;
mod system;
mod types;
mod wrapping_number;

pub use allocator::{AllocError, IndexAllocator};
pub use client::{ClientRecord, SentSpawn};
pub use config::SnapshotConfig;
pub use constants::{
    MAX_ENTRIES, MAX_SPAWNS, SECTION_SENTINEL, SENT_SPAWN_WINDOW, SNAPSHOT_BUFFER_BYTES,
    SPAWN_SENTINEL,
};
pub use entry::{VariableAddress, VariableEntry};
pub use error::{ReceiveError, StoreError};
pub use host::{ReplicationHost, SnapshotTransport, VariableDelta};
pub use spawn::{PendingSpawn, SpawnCommand};
pub use store::SnapshotStore;
pub use system::SnapshotSystem;
pub use types::{ClientId, ObjectId, Sequence, SpawnTick, Tick};
pub use wrapping_number::{sequence_greater_than, sequence_less_than, wrapping_diff};
