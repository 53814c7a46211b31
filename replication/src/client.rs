use std::collections::HashMap;

use crate::constants::SENT_SPAWN_WINDOW;
use crate::types::{ObjectId, Sequence, SpawnTick};
use crate::wrapping_number::wrapping_diff;

/// One spawn written into an outgoing snapshot, kept until acknowledged or
/// pruned. Retransmissions append fresh records so every carrying sequence
/// can be acknowledged independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentSpawn {
    pub sequence: Sequence,
    pub object_id: ObjectId,
    pub tick: SpawnTick,
}

/// Replication bookkeeping for one remote peer.
#[derive(Debug, Default)]
pub struct ClientRecord {
    /// Sequence stamped on the next outgoing snapshot for this peer.
    pub next_sequence: Sequence,
    /// Sequence of the most recent snapshot received from this peer.
    pub last_received_sequence: Sequence,
    spawn_acks: HashMap<ObjectId, SpawnTick>,
    sent_spawns: Vec<SentSpawn>,
}

impl ClientRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a spawn written into the snapshot currently being composed.
    pub fn record_sent_spawn(&mut self, object_id: ObjectId, tick: SpawnTick) {
        self.sent_spawns.push(SentSpawn {
            sequence: self.next_sequence,
            object_id,
            tick,
        });
    }

    /// Remove and return every sent record carried by `sequence`.
    pub fn take_acknowledged(&mut self, sequence: Sequence) -> Vec<SentSpawn> {
        let mut acknowledged = Vec::new();
        self.sent_spawns.retain(|sent| {
            if sent.sequence == sequence {
                acknowledged.push(*sent);
                false
            } else {
                true
            }
        });
        acknowledged
    }

    /// Record that this peer has acknowledged the spawn of `object_id`
    /// stamped with `tick`, overwriting any older acknowledgement.
    pub fn mark_acknowledged(&mut self, object_id: ObjectId, tick: SpawnTick) {
        self.spawn_acks.insert(object_id, tick);
    }

    /// The newest spawn tick this peer has acknowledged for `object_id`.
    pub fn acknowledged_tick(&self, object_id: &ObjectId) -> Option<SpawnTick> {
        self.spawn_acks.get(object_id).copied()
    }

    /// Called once per successfully composed snapshot: advance the sequence
    /// and drop sent records too far behind to ever be acknowledged.
    pub fn finish_snapshot(&mut self) {
        self.next_sequence = self.next_sequence.wrapping_add(1);
        let next = self.next_sequence;
        self.sent_spawns
            .retain(|sent| wrapping_diff(sent.sequence, next) <= SENT_SPAWN_WINDOW as i16);
    }

    pub fn sent_spawn_count(&self) -> usize {
        self.sent_spawns.len()
    }
}
