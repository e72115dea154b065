// Chunk framing around the LZX bitstream.
//
// The compressed region is a sequence of chunks, each holding one
// independently aligned bitstream segment:
//
//   0xFF, frame_size (u16 BE), block_size (u16 BE), block bytes   explicit
//   block_size (u16 BE), block bytes                              implicit
//
// An implicit chunk always decodes to 0x8000 bytes. The decoder state is
// shared by every chunk of one region.

use log::{debug, trace};

use super::lzx::LzxDecoder;
use crate::buffer::{ByteCursor, SeekOrigin};
use crate::error::{Result, XnbError};

/// Window size used by XNA content builds (64 KiB).
pub const WINDOW_BITS: u32 = 16;

/// Output size of an implicit chunk.
const DEFAULT_FRAME_SIZE: usize = 0x8000;

/// Upper bound for either size field.
const MAX_CHUNK_SIZE: usize = 0x10000;

const EXPLICIT_CHUNK: u8 = 0xFF;

/// Decode every chunk in `data`.
///
/// Stops at the end of the region or at a chunk declaring a zero size. The
/// caller checks the total against the size it expects.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut lzx = LzxDecoder::new(WINDOW_BITS)?;
    let mut c = ByteCursor::new(data.to_vec());
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut consumed = 0usize;

    while consumed < data.len() {
        let (frame_size, block_size) = if c.read_u8()? == EXPLICIT_CHUNK {
            let frame = usize::from(c.read_be_u16()?);
            let block = usize::from(c.read_be_u16()?);
            consumed += 5;
            (frame, block)
        } else {
            c.seek(-1, SeekOrigin::Current)?;
            let block = usize::from(c.read_be_u16()?);
            consumed += 2;
            (DEFAULT_FRAME_SIZE, block)
        };

        if block_size == 0 || frame_size == 0 {
            trace!("zero-sized chunk at {consumed}, stopping");
            break;
        }
        if block_size > MAX_CHUNK_SIZE || frame_size > MAX_CHUNK_SIZE {
            return Err(XnbError::CorruptCompressedData(format!(
                "chunk sizes out of range: frame {frame_size}, block {block_size}"
            )));
        }
        if consumed + block_size > data.len() {
            return Err(XnbError::CorruptCompressedData(format!(
                "chunk of {block_size} bytes at offset {consumed} overruns the \
                 {} byte compressed region",
                data.len()
            )));
        }

        debug!("LZX chunk at {consumed}: {block_size} -> {frame_size} bytes");
        let chunk_start = c.position();
        lzx.decompress(&mut c, frame_size, &mut out)?;

        consumed += block_size;
        c.set_position(chunk_start + block_size)?;
    }

    Ok(out)
}
