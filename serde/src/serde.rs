use crate::{error::SerdeErr, reader::ByteReader, writer::ByteWriter};

/// Two-way wire codec for a value with a fixed little-endian layout.
pub trait Serde: Sized {
    fn ser(&self, writer: &mut ByteWriter);
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}

macro_rules! impl_serde_number {
    ($number:ty) => {
        impl Serde for $number {
            fn ser(&self, writer: &mut ByteWriter) {
                writer.write_bytes(&self.to_le_bytes());
            }

            fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                let bytes = reader.read_bytes(std::mem::size_of::<$number>())?;
                let mut raw = [0u8; std::mem::size_of::<$number>()];
                raw.copy_from_slice(bytes);
                Ok(<$number>::from_le_bytes(raw))
            }
        }
    };
}

impl_serde_number!(u8);
impl_serde_number!(u16);
impl_serde_number!(u32);
impl_serde_number!(u64);
impl_serde_number!(i16);
impl_serde_number!(i32);
impl_serde_number!(f32);

impl Serde for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(SerdeErr::InvalidBool { value }),
        }
    }
}
