use crate::error::SerdeErr;

/// A borrowing little-endian cursor over one received message.
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    cursor: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    /// Borrow the next `length` bytes without copying.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'b [u8], SerdeErr> {
        if length > self.remaining() {
            return Err(SerdeErr::UnexpectedEnd {
                needed: length,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buffer[self.cursor..self.cursor + length];
        self.cursor += length;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::ByteReader;
    use crate::error::SerdeErr;

    #[test]
    fn reads_advance_the_cursor() {
        let buffer = [0x01, 0x02, 0x03];
        let mut reader = ByteReader::new(&buffer);

        assert_eq!(reader.read_byte().unwrap(), 0x01);
        assert_eq!(reader.read_bytes(2).unwrap(), &[0x02, 0x03]);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn reading_past_the_end_errors() {
        let buffer = [0x01];
        let mut reader = ByteReader::new(&buffer);

        let result = reader.read_bytes(2);

        assert_eq!(
            result,
            Err(SerdeErr::UnexpectedEnd {
                needed: 2,
                remaining: 1
            })
        );
        // the cursor did not move
        assert_eq!(reader.position(), 0);
    }
}
