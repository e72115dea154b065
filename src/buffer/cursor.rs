// Byte/bit cursor over an owned buffer.
//
// One type serves both directions: decoders wrap the input bytes and read,
// encoders start empty and write. Writes grow the backing storage by exactly
// the shortfall; `trim()` cuts it back to the write position.
//
// Bit reads model the LZX bitstream: a sequence of 16-bit little-endian
// words, consumed MSB-first. `pos` always points at the current word while
// `bit_pos` (0..16) counts bits already consumed from it.

use std::mem::size_of;

use super::varint::{self, MAX_VARUINT_LEN};
use crate::error::{Result, XnbError};

/// Byte order for multi-byte numeric reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Reference point for [`ByteCursor::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeekOrigin {
    Start,
    #[default]
    Current,
}

/// Growable byte buffer with a byte offset, a 16-bit-frame bit offset and an
/// endianness flag.
#[derive(Debug, Clone, Default)]
pub struct ByteCursor {
    buf: Vec<u8>,
    pos: usize,
    bit_pos: u32,
    endian: Endian,
}

macro_rules! numeric_codecs {
    ($($ty:ty => $read:ident, $peek:ident, $write:ident;)*) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` and advance.")]
            #[inline]
            pub fn $read(&mut self) -> Result<$ty> {
                let v = self.$peek()?;
                self.pos += size_of::<$ty>();
                Ok(v)
            }

            #[doc = concat!("Read a `", stringify!($ty), "` without advancing.")]
            #[inline]
            pub fn $peek(&self) -> Result<$ty> {
                let mut raw = [0u8; size_of::<$ty>()];
                raw.copy_from_slice(self.peek_bytes(size_of::<$ty>())?);
                Ok(match self.endian {
                    Endian::Little => <$ty>::from_le_bytes(raw),
                    Endian::Big => <$ty>::from_be_bytes(raw),
                })
            }

            #[doc = concat!("Write a `", stringify!($ty), "` and advance.")]
            #[inline]
            pub fn $write(&mut self, value: $ty) {
                match self.endian {
                    Endian::Little => self.write_bytes(&value.to_le_bytes()),
                    Endian::Big => self.write_bytes(&value.to_be_bytes()),
                }
            }
        )*
    };
}

impl ByteCursor {
    /// Wrap existing bytes for reading; the position starts at 0.
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            buf,
            ..Self::default()
        }
    }

    /// Empty cursor for writing.
    pub fn writer() -> Self {
        Self::default()
    }

    /// Switch the byte order used by numeric codecs.
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to an absolute byte offset and restart the bit stream there.
    pub fn set_position(&mut self, pos: usize) -> Result<()> {
        self.seek(pos as i64, SeekOrigin::Start)?;
        self.bit_pos = 0;
        Ok(())
    }

    /// Bits consumed from the current 16-bit word (always `< 16`).
    pub fn bit_position(&self) -> u32 {
        self.bit_pos
    }

    /// Length of the backing storage.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes between the current offset and the end of storage.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    // -----------------------------------------------------------------------
    // Positioning
    // -----------------------------------------------------------------------

    /// Move the byte offset by `delta` relative to `origin`.
    ///
    /// Returns the actual change in position. Fails with `OutOfBounds` if the
    /// result would be negative or past the end of the buffer.
    pub fn seek(&mut self, delta: i64, origin: SeekOrigin) -> Result<i64> {
        let base = match origin {
            SeekOrigin::Start => 0,
            SeekOrigin::Current => self.pos as i64,
        };
        let target = base + delta;
        if target < 0 || target > self.buf.len() as i64 {
            return Err(XnbError::OutOfBounds {
                offset: target,
                len: self.buf.len(),
            });
        }
        let moved = target - self.pos as i64;
        self.pos = target as usize;
        Ok(moved)
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.pos + n > self.buf.len() {
            return Err(XnbError::OutOfBounds {
                offset: (self.pos + n) as i64,
                len: self.buf.len(),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Byte-level reads
    // -----------------------------------------------------------------------

    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.ensure(n)?;
        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..start + n])
    }

    pub fn peek_bytes(&self, n: usize) -> Result<&[u8]> {
        self.ensure(n)?;
        Ok(&self.buf[self.pos..self.pos + n])
    }

    numeric_codecs! {
        u8 => read_u8, peek_u8, write_u8;
        i8 => read_i8, peek_i8, write_i8;
        u16 => read_u16, peek_u16, write_u16;
        i16 => read_i16, peek_i16, write_i16;
        u32 => read_u32, peek_u32, write_u32;
        i32 => read_i32, peek_i32, write_i32;
        f32 => read_f32, peek_f32, write_f32;
        f64 => read_f64, peek_f64, write_f64;
    }

    /// Read a 16-bit value stored high byte first, as in LZX chunk headers.
    pub fn read_be_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a 7-bit encoded unsigned integer.
    pub fn read_varuint(&mut self) -> Result<u32> {
        let (value, len) = varint::decode_u32(&self.buf[self.pos.min(self.buf.len())..])
            .map_err(|e| match e {
                XnbError::OutOfBounds { .. } => XnbError::OutOfBounds {
                    offset: self.buf.len() as i64 + 1,
                    len: self.buf.len(),
                },
                other => other,
            })?;
        self.pos += len;
        Ok(value)
    }

    /// Read a string.
    ///
    /// With `len == 0`, reads up to a NUL terminator (consuming it);
    /// otherwise reads exactly `len` bytes. Either way the bytes must be UTF-8.
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let s = self.peek_string(len)?;
        self.pos += if len == 0 { s.len() + 1 } else { len };
        Ok(s)
    }

    /// Like [`read_string`](Self::read_string) without advancing.
    pub fn peek_string(&self, len: usize) -> Result<String> {
        let bytes = if len == 0 {
            let rest = self.buf.get(self.pos..).unwrap_or_default();
            let end = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or(XnbError::OutOfBounds {
                    offset: self.buf.len() as i64 + 1,
                    len: self.buf.len(),
                })?;
            &rest[..end]
        } else {
            self.peek_bytes(len)?
        };
        utf8(bytes)
    }

    /// Read a varuint byte length followed by that many UTF-8 bytes.
    pub fn read_prefixed_string(&mut self) -> Result<String> {
        let len = self.read_varuint()? as usize;
        let bytes = self.read_bytes(len)?;
        utf8(bytes)
    }

    // -----------------------------------------------------------------------
    // Bit-level reads (LZX bitstream)
    // -----------------------------------------------------------------------

    /// Little-endian 16-bit word at `offset`, zero past the end of storage.
    #[inline]
    fn word_at(&self, offset: usize) -> u32 {
        let lo = self.buf.get(offset).copied().unwrap_or(0);
        let hi = self.buf.get(offset + 1).copied().unwrap_or(0);
        u32::from(u16::from_le_bytes([lo, hi]))
    }

    /// Look at the next `n` (<= 16) bits without consuming them.
    ///
    /// The stream is treated as zero-padded past the end of the buffer so
    /// that Huffman lookahead near the end of input is possible.
    #[inline]
    pub fn peek_bits(&self, n: u32) -> Result<u32> {
        if n > 16 {
            return Err(XnbError::CorruptCompressedData(format!(
                "cannot read {n} bits at once"
            )));
        }
        if n == 0 {
            return Ok(0);
        }
        let window = (self.word_at(self.pos) << 16) | self.word_at(self.pos + 2);
        Ok((window << self.bit_pos) >> (32 - n))
    }

    /// Read the next `n` (<= 16) bits.
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        let value = self.peek_bits(n)?;
        self.skip_bits(n)?;
        Ok(value)
    }

    /// Consume `n` (<= 16) bits, folding whole words into the byte offset.
    pub fn skip_bits(&mut self, n: u32) -> Result<()> {
        let total = self.bit_pos + n;
        let words_touched = total.div_ceil(16) as usize;
        if self.pos + 2 * words_touched > self.buf.len() {
            return Err(XnbError::OutOfBounds {
                offset: (self.pos + 2 * words_touched) as i64,
                len: self.buf.len(),
            });
        }
        self.pos += 2 * (total / 16) as usize;
        self.bit_pos = total % 16;
        Ok(())
    }

    /// Advance to the next 16-bit boundary; no-op when already aligned.
    pub fn align(&mut self) -> Result<()> {
        if self.bit_pos > 0 {
            self.skip_bits(16 - self.bit_pos)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Make room for `n` more bytes at the write position, growing storage by
    /// exactly the shortfall.
    pub fn alloc(&mut self, n: usize) -> &mut Self {
        let needed = self.pos + n;
        if needed > self.buf.len() {
            self.buf.resize(needed, 0);
        }
        self
    }

    /// Shrink storage to exactly the bytes written so far.
    pub fn trim(&mut self) {
        self.buf.truncate(self.pos);
    }

    /// Trim, then append `bytes`.
    pub fn concat(&mut self, bytes: &[u8]) {
        self.trim();
        self.buf.extend_from_slice(bytes);
        self.pos += bytes.len();
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let start = self.pos;
        self.alloc(bytes.len());
        self.buf[start..start + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    pub fn write_varuint(&mut self, value: u32) {
        let mut scratch = [0u8; MAX_VARUINT_LEN];
        let len = varint::encode_u32(value, &mut scratch);
        self.write_bytes(&scratch[..len]);
    }

    /// Write a varuint byte length followed by the UTF-8 bytes of `s`.
    pub fn write_prefixed_string(&mut self, s: &str) {
        self.write_varuint(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    /// Overwrite a little-endian `u32` at a fixed offset (size back-patching).
    pub fn patch_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        let len = self.buf.len();
        let slot = self
            .buf
            .get_mut(offset..offset + 4)
            .ok_or(XnbError::OutOfBounds {
                offset: (offset + 4) as i64,
                len,
            })?;
        slot.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Replace everything from `offset` to the end with `bytes`.
    ///
    /// The position moves to the new end of storage.
    pub fn replace_tail(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        if offset > self.buf.len() {
            return Err(XnbError::OutOfBounds {
                offset: offset as i64,
                len: self.buf.len(),
            });
        }
        self.buf.truncate(offset);
        self.buf.extend_from_slice(bytes);
        self.pos = self.buf.len();
        self.bit_pos = 0;
        Ok(())
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| XnbError::CorruptData(format!("invalid UTF-8 string: {e}")))
}
