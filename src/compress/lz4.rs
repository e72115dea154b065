// LZ4 block codec for the mobile platforms.
//
// Payloads are raw LZ4 blocks with no size prefix; the decompressed length
// is carried by the container header instead.

use crate::error::{Result, XnbError};

/// Upper bound on how far one input byte of an LZ4 block can expand.
#[cfg(feature = "lz4")]
const MAX_EXPANSION: usize = 255;

#[cfg(feature = "lz4")]
pub fn decompress(data: &[u8], size: usize) -> Result<Vec<u8>> {
    // `size` comes straight from the header and sizes the output buffer.
    if size > data.len().saturating_mul(MAX_EXPANSION) {
        return Err(XnbError::CorruptCompressedData(format!(
            "LZ4 block of {} bytes cannot expand to {size}",
            data.len()
        )));
    }
    lz4_flex::block::decompress(data, size)
        .map_err(|e| XnbError::CorruptCompressedData(format!("LZ4 decompression failed: {e}")))
}

#[cfg(feature = "lz4")]
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    Ok(lz4_flex::block::compress(data))
}

#[cfg(not(feature = "lz4"))]
pub fn decompress(_data: &[u8], _size: usize) -> Result<Vec<u8>> {
    Err(XnbError::UnsupportedFeature(
        "LZ4 content requires the 'lz4' feature".into(),
    ))
}

#[cfg(not(feature = "lz4"))]
pub fn compress(_data: &[u8]) -> Result<Vec<u8>> {
    Err(XnbError::UnsupportedFeature(
        "LZ4 content requires the 'lz4' feature".into(),
    ))
}
