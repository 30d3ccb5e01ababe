use crate::error::FormatError;
use crate::parser::Endianness;

/// Bounded cursor over a byte slice
///
/// Every read is checked against the end of the slice, so a bogus length
/// field turns into [`FormatError::Truncated`] instead of an overrun.
/// Positions are reported relative to the start of the whole buffer.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader whose first byte sits at `base` in the full buffer
    pub fn new(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Absolute position of the next byte
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Looks at the next `n` bytes without consuming them
    pub fn peek(&self, n: usize) -> Option<&'a [u8]> {
        self.data.get(self.pos..self.pos.checked_add(n)?)
    }

    /// Steps back over bytes already consumed
    pub fn rewind(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    /// Consumes `n` bytes
    pub fn take<F>(&mut self, n: usize, context: F) -> Result<&'a [u8], FormatError>
    where
        F: FnOnce() -> String,
    {
        if n > self.remaining() {
            return Err(FormatError::Truncated {
                context: context(),
                offset: self.position(),
                needed: n as u64,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consumes a 32-bit length-prefixed region as its own reader
    pub fn sub_reader<F>(&mut self, len: u32, context: F) -> Result<ByteReader<'a>, FormatError>
    where
        F: FnOnce() -> String,
    {
        let base = self.position();
        let slice = self.take(len as usize, context)?;
        Ok(ByteReader::new(slice, base))
    }

    pub fn read_u16(&mut self, order: Endianness, what: &'static str) -> Result<u16, FormatError> {
        let bytes = self.take(2, || what.to_string())?;
        Ok(order.read_u16(bytes))
    }

    pub fn read_u32(&mut self, order: Endianness, what: &'static str) -> Result<u32, FormatError> {
        let bytes = self.take(4, || what.to_string())?;
        Ok(order.read_u32(bytes))
    }
}
