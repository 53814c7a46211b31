// Snapshot capacities and framing constants

/// Default arena capacity in bytes. Arena offsets and lengths travel as u16,
/// so the arena can never exceed 65535 bytes.
pub const SNAPSHOT_BUFFER_BYTES: usize = 30_000;

/// Default variable table capacity.
pub const MAX_ENTRIES: usize = 2_000;

/// Default spawn table capacity.
pub const MAX_SPAWNS: usize = 100;

/// Sentinel written after the snapshot header; each later section uses the
/// next value, so framing corruption surfaces at the very next check.
pub const SECTION_SENTINEL: u16 = 0x4246;

/// Trailing sentinel on each spawn body, widened to 32 bits on the wire.
pub const SPAWN_SENTINEL: u32 = SECTION_SENTINEL as u32;

/// Sent-spawn records further than this many sequences behind the next
/// outgoing sequence can no longer be usefully acknowledged and are pruned.
pub const SENT_SPAWN_WINDOW: u16 = 512;
