use tickframe_serde::{ByteReader, ByteWriter, PackedInt, Serde, SerdeErr};

use crate::types::{ObjectId, Tick};

/// Identifies one replicated variable: the owning object, the behaviour on
/// that object, and the variable's index within that behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableAddress {
    pub object_id: ObjectId,
    pub behaviour_index: u16,
    pub variable_index: u16,
}

impl VariableAddress {
    pub fn new(object_id: ObjectId, behaviour_index: u16, variable_index: u16) -> Self {
        Self {
            object_id,
            behaviour_index,
            variable_index,
        }
    }
}

/// One row of the snapshot store's variable table.
///
/// `position` and `length` locate the serialized value inside the arena;
/// `length == 0` means the slot exists but holds no payload yet. Table
/// lookup matches on the address alone, `tick_written` is an attribute of
/// the currently held value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableEntry {
    pub address: VariableAddress,
    pub tick_written: Tick,
    pub position: u16,
    pub length: u16,
}

impl VariableEntry {
    pub fn empty(address: VariableAddress, tick_written: Tick) -> Self {
        Self {
            address,
            tick_written,
            position: 0,
            length: 0,
        }
    }

    pub fn ser(&self, writer: &mut ByteWriter) {
        self.address.object_id.ser(writer);
        self.address.behaviour_index.ser(writer);
        self.address.variable_index.ser(writer);
        PackedInt::new(self.tick_written).ser(writer);
        self.position.ser(writer);
        self.length.ser(writer);
    }

    pub fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let object_id = ObjectId::de(reader)?;
        let behaviour_index = u16::de(reader)?;
        let variable_index = u16::de(reader)?;
        let tick_written = PackedInt::de(reader)?.get();
        let position = u16::de(reader)?;
        let length = u16::de(reader)?;
        Ok(Self {
            address: VariableAddress::new(object_id, behaviour_index, variable_index),
            tick_written,
            position,
            length,
        })
    }
}
