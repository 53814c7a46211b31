use crate::constants::{MAX_ENTRIES, MAX_SPAWNS, SNAPSHOT_BUFFER_BYTES};

/// Feature toggles and capacities for the snapshot system.
///
/// Capacities are fixed for the life of the system; only the construction
/// defaults are overridable here.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Replicate variable values. With `send_spawns` also off, the tick
    /// hook does nothing.
    pub send_variables: bool,
    /// Replicate object spawns.
    pub send_spawns: bool,
    /// Arena capacity in bytes. Must fit the u16 wire offsets.
    pub buffer_bytes: usize,
    /// Variable table capacity.
    pub max_entries: usize,
    /// Spawn table capacity.
    pub max_spawns: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            send_variables: true,
            send_spawns: true,
            buffer_bytes: SNAPSHOT_BUFFER_BYTES,
            max_entries: MAX_ENTRIES,
            max_spawns: MAX_SPAWNS,
        }
    }
}
