use thiserror::Error;

use tickframe_serde::SerdeErr;

use crate::allocator::AllocError;

/// Errors from the local capture paths: storing a variable or queueing a
/// spawn. The affected update is dropped; nothing else is disturbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The variable table is at capacity; the variable was not recorded
    #[error("variable table is full ({max_entries} entries)")]
    EntryTableFull { max_entries: usize },

    /// The spawn table is at capacity; the spawn was not queued
    #[error("spawn table is full ({max_spawns} spawns)")]
    SpawnTableFull { max_spawns: usize },

    /// The arena could not place the serialized value
    #[error("arena allocation failed: {0}")]
    Alloc(#[from] AllocError),

    /// A serialized value does not fit the wire's u16 length field
    #[error("serialized value of {length} bytes exceeds the u16 wire limit")]
    ValueTooLarge { length: usize },
}

/// Errors from parsing one received snapshot message. Sections parsed before
/// the failure stay applied; the remainder of the message is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReceiveError {
    /// The byte stream ended early or held a malformed primitive
    #[error("snapshot truncated or malformed: {0}")]
    Serde(#[from] SerdeErr),

    /// A framing sentinel did not match (SECURITY: corrupt or malicious message)
    #[error("bad {section} sentinel: expected {expected:#06x}, found {found:#06x}")]
    BadSentinel {
        section: &'static str,
        expected: u32,
        found: u32,
    },

    /// A section count was negative
    #[error("negative {section} count {count}")]
    NegativeCount { section: &'static str, count: i16 },

    /// The sender's arena section exceeds the local staging capacity
    #[error("snapshot buffer of {length} bytes exceeds capacity {capacity}")]
    BufferTooLarge { length: usize, capacity: usize },

    /// An incoming entry addresses bytes outside the received arena section
    #[error("entry range {position}+{length} exceeds received buffer of {buffer_length} bytes")]
    EntryOutOfBounds {
        position: u16,
        length: u16,
        buffer_length: u16,
    },
}
