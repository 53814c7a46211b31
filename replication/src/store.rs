use std::collections::{HashMap, HashSet};

use log::{trace, warn};

use tickframe_serde::{ByteReader, ByteWriter, Serde};

use crate::allocator::IndexAllocator;
use crate::client::ClientRecord;
use crate::config::SnapshotConfig;
use crate::entry::{VariableAddress, VariableEntry};
use crate::error::{ReceiveError, StoreError};
use crate::host::{ReplicationHost, VariableDelta};
use crate::spawn::{PendingSpawn, SpawnCommand};
use crate::types::{ClientId, ObjectId, SpawnTick, Tick};
use crate::wrapping_number::sequence_greater_than;

/// Owns the variable arena, the entry table, the spawn table, and the
/// per-object record of spawn ticks already applied locally.
///
/// The arena is one fixed allocation for the life of the store. Serialized
/// values are overwritten in place as variables change and relocated within
/// the arena only when a value outgrows its region. [`Self::clear`] resets
/// the logical contents without releasing anything.
pub struct SnapshotStore {
    arena: Vec<u8>,
    staging: Vec<u8>,
    staging_length: u16,
    allocator: IndexAllocator,
    entries: Vec<VariableEntry>,
    spawns: Vec<PendingSpawn>,
    applied_spawn_ticks: HashMap<ObjectId, SpawnTick>,
    max_entries: usize,
    max_spawns: usize,
}

impl SnapshotStore {
    pub fn new(config: &SnapshotConfig) -> Self {
        assert!(
            config.buffer_bytes <= usize::from(u16::MAX),
            "arena capacity must fit the u16 wire offsets"
        );
        let capacity = config.buffer_bytes as u16;
        Self {
            arena: vec![0; config.buffer_bytes],
            staging: vec![0; config.buffer_bytes],
            staging_length: 0,
            // double the handle space: transient churn can leave one free
            // gap between each pair of live regions
            allocator: IndexAllocator::new(capacity, config.max_entries * 2),
            entries: Vec::with_capacity(config.max_entries),
            spawns: Vec::with_capacity(config.max_spawns),
            applied_spawn_ticks: HashMap::new(),
            max_entries: config.max_entries,
            max_spawns: config.max_spawns,
        }
    }

    // Lookup

    /// The table slot holding `address`, if any. Linear scan: the table is
    /// dense, small, and holds at most one slot per address.
    pub fn find(&self, address: &VariableAddress) -> Option<usize> {
        self.entries.iter().position(|entry| entry.address == *address)
    }

    /// Append an empty entry for `address`.
    pub fn add_entry(
        &mut self,
        address: VariableAddress,
        tick_written: Tick,
    ) -> Result<usize, StoreError> {
        if self.entries.len() == self.max_entries {
            return Err(StoreError::EntryTableFull {
                max_entries: self.max_entries,
            });
        }
        self.entries.push(VariableEntry::empty(address, tick_written));
        Ok(self.entries.len() - 1)
    }

    /// Give `slot` an arena region of `length` bytes, releasing any region
    /// it already holds. The entry's `position` always ends up addressing
    /// the local arena.
    pub fn allocate_entry(&mut self, slot: usize, length: u16) -> Result<(), StoreError> {
        // releasing a slot without a region is a no-op inside the allocator
        self.allocator.deallocate(slot);
        let position = self.allocator.allocate(slot, length)?;
        let entry = &mut self.entries[slot];
        entry.position = position;
        entry.length = length;
        Ok(())
    }

    // Capture

    /// Capture the current value of one replicated variable at `tick`.
    pub fn store_variable(
        &mut self,
        address: VariableAddress,
        tick: Tick,
        variable: &dyn VariableDelta,
    ) -> Result<(), StoreError> {
        let slot = match self.find(&address) {
            Some(slot) => slot,
            None => self.add_entry(address, tick)?,
        };
        self.entries[slot].tick_written = tick;

        let mut scratch = ByteWriter::new();
        variable.write_delta(&mut scratch);
        let value = scratch.as_slice();
        if value.len() > usize::from(u16::MAX) {
            return Err(StoreError::ValueTooLarge { length: value.len() });
        }
        let length = value.len() as u16;

        if length > self.entries[slot].length {
            self.allocate_entry(slot, length)?;
        }

        let position = usize::from(self.entries[slot].position);
        self.arena[position..position + value.len()].copy_from_slice(value);
        // a shrinking value keeps its region but must not report the stale
        // tail of the previous write
        self.entries[slot].length = length;
        Ok(())
    }

    /// Queue a spawn for delivery to `targets`. A spawn with no recipients
    /// is not queued.
    pub fn add_spawn(
        &mut self,
        command: SpawnCommand,
        targets: HashSet<ClientId>,
    ) -> Result<(), StoreError> {
        if targets.is_empty() {
            return Ok(());
        }
        if self.spawns.len() == self.max_spawns {
            return Err(StoreError::SpawnTableFull {
                max_spawns: self.max_spawns,
            });
        }
        self.spawns.push(PendingSpawn { command, targets });
        Ok(())
    }

    // Outgoing sections

    /// Arena section: the live prefix of the arena, length-prefixed.
    pub fn write_buffer(&self, writer: &mut ByteWriter) {
        let range = self.allocator.range();
        range.ser(writer);
        writer.write_bytes(&self.arena[..usize::from(range)]);
    }

    /// Variable table section: every entry, count-prefixed.
    pub fn write_index(&self, writer: &mut ByteWriter) {
        (self.entries.len() as i16).ser(writer);
        for entry in &self.entries {
            entry.ser(writer);
        }
    }

    /// Spawn section for one recipient. Spawns the recipient has already
    /// acknowledged, or is not targeted by, are omitted; since omission is
    /// per-recipient the count is patched in after the walk.
    pub fn write_spawns(
        &self,
        record: &mut ClientRecord,
        recipient: ClientId,
        writer: &mut ByteWriter,
    ) {
        let count_at = writer.position();
        0i16.ser(writer);

        let mut written: i16 = 0;
        for spawn in &self.spawns {
            let command = &spawn.command;
            if record.acknowledged_tick(&command.object_id) == Some(command.tick_written) {
                continue;
            }
            if !spawn.targets.contains(&recipient) {
                continue;
            }
            // every transmission gets its own sent record, so each carrying
            // sequence is independently acknowledgeable
            record.record_sent_spawn(command.object_id, command.tick_written);
            command.ser(writer);
            written += 1;
        }

        writer.patch_i16(count_at, written);
    }

    // Incoming sections

    /// Stage the sender's arena bytes for the entry section that follows.
    pub fn read_buffer(&mut self, reader: &mut ByteReader) -> Result<(), ReceiveError> {
        let length = u16::de(reader)?;
        if usize::from(length) > self.staging.len() {
            return Err(ReceiveError::BufferTooLarge {
                length: usize::from(length),
                capacity: self.staging.len(),
            });
        }
        let bytes = reader.read_bytes(usize::from(length))?;
        self.staging[..bytes.len()].copy_from_slice(bytes);
        self.staging_length = length;
        Ok(())
    }

    /// Apply the sender's variable table: copy fresh payloads out of the
    /// staged buffer into the arena and decode them into live variables.
    ///
    /// An entry is applied when it is new here, was reallocated to fit, or
    /// carries a newer tick than the value already held. Capacity misses
    /// drop the single update and keep parsing.
    pub fn read_index(
        &mut self,
        reader: &mut ByteReader,
        host: &mut dyn ReplicationHost,
    ) -> Result<(), ReceiveError> {
        let count = i16::de(reader)?;
        if count < 0 {
            return Err(ReceiveError::NegativeCount {
                section: "entry",
                count,
            });
        }

        for _ in 0..count {
            let incoming = VariableEntry::de(reader)?;

            let (slot, mut fresh) = match self.find(&incoming.address) {
                Some(slot) => (slot, false),
                None => match self.add_entry(incoming.address, incoming.tick_written) {
                    Ok(slot) => (slot, true),
                    Err(error) => {
                        warn!("dropping received variable update: {}", error);
                        continue;
                    }
                },
            };

            if self.entries[slot].length < incoming.length {
                if let Err(error) = self.allocate_entry(slot, incoming.length) {
                    warn!("dropping received variable update: {}", error);
                    continue;
                }
                fresh = true;
            }

            if !fresh && incoming.tick_written <= self.entries[slot].tick_written {
                continue;
            }

            let length = usize::from(incoming.length);
            let source = usize::from(incoming.position);
            if source + length > usize::from(self.staging_length) {
                return Err(ReceiveError::EntryOutOfBounds {
                    position: incoming.position,
                    length: incoming.length,
                    buffer_length: self.staging_length,
                });
            }

            // the region was placed locally; everything else comes from the
            // sender
            let position = self.entries[slot].position;
            let destination = usize::from(position);
            self.arena[destination..destination + length]
                .copy_from_slice(&self.staging[source..source + length]);

            let entry = &mut self.entries[slot];
            entry.tick_written = incoming.tick_written;
            entry.length = incoming.length;
            entry.position = position;

            match host.variable_mut(&incoming.address) {
                Some(variable) => {
                    let mut value = ByteReader::new(&self.arena[destination..destination + length]);
                    variable.read_delta(&mut value)?;
                }
                None => {
                    // the object may not have spawned here yet; the payload
                    // stays in the arena for when it does
                    trace!("no live variable for {:?}, stored without decode", incoming.address);
                }
            }
        }
        Ok(())
    }

    /// Parse the sender's spawn section. Application is separate
    /// ([`Self::apply_spawns`]) so a framing failure later in the message
    /// can still suppress the whole section.
    pub fn read_spawns(
        &mut self,
        reader: &mut ByteReader,
    ) -> Result<Vec<SpawnCommand>, ReceiveError> {
        let count = i16::de(reader)?;
        if count < 0 {
            return Err(ReceiveError::NegativeCount {
                section: "spawn",
                count,
            });
        }

        let mut commands = Vec::with_capacity(count.unsigned_abs().into());
        for _ in 0..count {
            commands.push(SpawnCommand::de(reader)?);
        }
        Ok(commands)
    }

    /// Apply parsed spawn commands, once per object per spawn tick.
    pub fn apply_spawns(&mut self, commands: Vec<SpawnCommand>, host: &mut dyn ReplicationHost) {
        for command in commands {
            if let Some(applied) = self.applied_spawn_ticks.get(&command.object_id) {
                // the stamp wraps, so the monotone filter compares wrapping
                if !sequence_greater_than(command.tick_written, *applied) {
                    continue;
                }
            }
            self.applied_spawn_ticks
                .insert(command.object_id, command.tick_written);
            host.apply_spawn(&command, command.parent());
        }
    }

    /// Reconcile one acknowledged sequence from `client_id`: stop
    /// retransmitting every spawn that sequence carried.
    pub fn read_acks(
        &mut self,
        client_id: ClientId,
        record: &mut ClientRecord,
        reader: &mut ByteReader,
    ) -> Result<(), ReceiveError> {
        let ack_sequence = u16::de(reader)?;

        for sent in record.take_acknowledged(ack_sequence) {
            record.mark_acknowledged(sent.object_id, sent.tick);

            let Some(index) = self.spawns.iter().position(|spawn| {
                spawn.command.object_id == sent.object_id
                    && spawn.command.tick_written == sent.tick
            }) else {
                continue;
            };

            let spawn = &mut self.spawns[index];
            spawn.targets.remove(&client_id);
            if spawn.targets.is_empty() {
                // unordered removal keeps the table dense
                self.spawns.swap_remove(index);
            }
        }
        Ok(())
    }

    // Maintenance

    /// Reset the logical contents; the underlying buffers stay allocated.
    pub fn clear(&mut self) {
        self.allocator.reset();
        self.entries.clear();
        self.spawns.clear();
        self.applied_spawn_ticks.clear();
        self.staging_length = 0;
    }

    // Inspection

    pub fn entries(&self) -> &[VariableEntry] {
        &self.entries
    }

    pub fn spawns(&self) -> &[PendingSpawn] {
        &self.spawns
    }

    /// The arena prefix covering every live region.
    pub fn live_arena(&self) -> &[u8] {
        &self.arena[..usize::from(self.allocator.range())]
    }

    pub fn arena_range(&self) -> u16 {
        self.allocator.range()
    }

    /// The allocator region backing `slot`, as `(offset, length)`.
    pub fn region(&self, slot: usize) -> Option<(u16, u16)> {
        self.allocator.region(slot)
    }

    /// The serialized value currently held for `slot`.
    pub fn value(&self, slot: usize) -> &[u8] {
        let entry = &self.entries[slot];
        let position = usize::from(entry.position);
        &self.arena[position..position + usize::from(entry.length)]
    }
}
