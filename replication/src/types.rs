/// Network-wide identifier of one replicated object.
pub type ObjectId = u64;

/// Identifier of one connection, client or server side.
pub type ClientId = u64;

/// Simulation tick stamped on variable captures.
pub type Tick = i32;

/// Wrapping tick stamp carried by spawn commands on the wire.
pub type SpawnTick = u16;

/// Per-recipient wrapping message sequence.
pub type Sequence = u16;
