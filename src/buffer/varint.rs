// 7-bit variable-length unsigned integers (the .NET `Write7BitEncodedInt`
// layout).
//
// Little-endian groups: least-significant 7 bits first. Each byte has bit 7
// set except the final byte. Encoding is always minimal length.

use crate::error::{Result, XnbError};

/// Maximum encoded length for a 32-bit value (ceil(32/7) = 5).
pub const MAX_VARUINT_LEN: usize = 5;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a `u32` into `buf`, returning the number of bytes used (1..=5).
#[inline]
pub fn encode_u32(mut num: u32, buf: &mut [u8; MAX_VARUINT_LEN]) -> usize {
    let mut i = 0;
    loop {
        let byte = (num & 0x7F) as u8;
        num >>= 7;
        if num == 0 {
            buf[i] = byte;
            return i + 1;
        }
        buf[i] = byte | 0x80;
        i += 1;
    }
}

/// Encoded byte-length of a `u32`.
#[inline]
pub fn sizeof_u32(num: u32) -> usize {
    let bits = 32 - num.leading_zeros();
    bits.max(1).div_ceil(7) as usize
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a `u32` from the front of `data`.
/// Returns `(value, bytes_consumed)`.
pub fn decode_u32(data: &[u8]) -> Result<(u32, usize)> {
    let mut val: u32 = 0;
    for (i, &byte) in data.iter().enumerate() {
        let shift = 7 * i as u32;
        let group = u32::from(byte & 0x7F);
        // The fifth byte may only contribute the top four bits.
        if shift >= 32 || (shift == 28 && group > 0x0F) {
            return Err(XnbError::CorruptData("varuint overflows 32 bits".into()));
        }
        val |= group << shift;
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    Err(XnbError::OutOfBounds {
        offset: data.len() as i64,
        len: data.len(),
    })
}
