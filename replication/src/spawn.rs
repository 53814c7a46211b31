use std::collections::HashSet;

use glam::{Quat, Vec3};

use tickframe_serde::{ByteReader, ByteWriter, Serde};

use crate::constants::SPAWN_SENTINEL;
use crate::error::ReceiveError;
use crate::types::{ClientId, ObjectId, SpawnTick};

/// Instructions for creating one replicated object on a peer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnCommand {
    pub object_id: ObjectId,
    /// Tells the receiver which kind of object to instantiate.
    pub archetype_hash: u32,
    pub is_scene_object: bool,
    pub is_player_object: bool,
    pub owner_client_id: ClientId,
    pub parent_network_id: ObjectId,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub tick_written: SpawnTick,
}

impl SpawnCommand {
    /// The parent to instantiate under, or `None` when the command names
    /// itself (a root object).
    pub fn parent(&self) -> Option<ObjectId> {
        if self.parent_network_id == self.object_id {
            None
        } else {
            Some(self.parent_network_id)
        }
    }

    pub fn ser(&self, writer: &mut ByteWriter) {
        self.object_id.ser(writer);
        // the archetype hash travels widened; only the low 32 bits carry
        u64::from(self.archetype_hash).ser(writer);
        self.is_scene_object.ser(writer);
        self.is_player_object.ser(writer);
        self.owner_client_id.ser(writer);
        self.parent_network_id.ser(writer);
        write_vec3(writer, self.position);
        write_quat(writer, self.rotation);
        write_vec3(writer, self.scale);
        self.tick_written.ser(writer);
        SPAWN_SENTINEL.ser(writer);
    }

    pub fn de(reader: &mut ByteReader) -> Result<Self, ReceiveError> {
        let object_id = ObjectId::de(reader)?;
        let archetype_hash = u64::de(reader)? as u32;
        let is_scene_object = bool::de(reader)?;
        let is_player_object = bool::de(reader)?;
        let owner_client_id = ClientId::de(reader)?;
        let parent_network_id = ObjectId::de(reader)?;
        let position = read_vec3(reader)?;
        let rotation = read_quat(reader)?;
        let scale = read_vec3(reader)?;
        let tick_written = SpawnTick::de(reader)?;

        let sentinel = u32::de(reader)?;
        if sentinel != SPAWN_SENTINEL {
            return Err(ReceiveError::BadSentinel {
                section: "spawn body",
                expected: SPAWN_SENTINEL,
                found: sentinel,
            });
        }

        Ok(Self {
            object_id,
            archetype_hash,
            is_scene_object,
            is_player_object,
            owner_client_id,
            parent_network_id,
            position,
            rotation,
            scale,
            tick_written,
        })
    }
}

fn write_vec3(writer: &mut ByteWriter, value: Vec3) {
    value.x.ser(writer);
    value.y.ser(writer);
    value.z.ser(writer);
}

fn read_vec3(reader: &mut ByteReader) -> Result<Vec3, ReceiveError> {
    Ok(Vec3::new(
        f32::de(reader)?,
        f32::de(reader)?,
        f32::de(reader)?,
    ))
}

fn write_quat(writer: &mut ByteWriter, value: Quat) {
    value.x.ser(writer);
    value.y.ser(writer);
    value.z.ser(writer);
    value.w.ser(writer);
}

fn read_quat(reader: &mut ByteReader) -> Result<Quat, ReceiveError> {
    Ok(Quat::from_xyzw(
        f32::de(reader)?,
        f32::de(reader)?,
        f32::de(reader)?,
        f32::de(reader)?,
    ))
}

/// A spawn waiting in the store until every recipient has acknowledged it.
#[derive(Debug, Clone)]
pub struct PendingSpawn {
    pub command: SpawnCommand,
    /// Recipients that have not yet acknowledged this spawn. Never empty: a
    /// spawn whose last target acknowledges is removed from the table.
    pub targets: HashSet<ClientId>,
}
