// Content-region compression.
//
// - `lzx`:    LzxDecoder, the stateful LZX bitstream decoder (decode only)
// - `frames`: chunk framing that drives the LZX decoder over a region
// - `lz4`:    raw LZ4 blocks (feature-gated `lz4`)

pub mod frames;
pub mod lz4;
pub mod lzx;

pub use lzx::LzxDecoder;

use crate::error::{Result, XnbError};

/// The compression applied to the content region of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    /// LZX in XNA chunk framing. Decode only.
    Lzx,
    /// Raw LZ4 block (Android / iOS targets).
    Lz4,
}

impl Compression {
    pub fn is_compressed(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Expand `data` into exactly `size` bytes.
    pub fn decompress(self, data: &[u8], size: usize) -> Result<Vec<u8>> {
        let out = match self {
            Self::None => data.to_vec(),
            Self::Lzx => frames::decompress(data)?,
            Self::Lz4 => lz4::decompress(data, size)?,
        };
        if out.len() != size {
            return Err(XnbError::CorruptCompressedData(format!(
                "decompressed {} bytes, header declares {size}",
                out.len()
            )));
        }
        Ok(out)
    }

    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Lzx => Err(XnbError::UnsupportedFeature(
                "LZX compression is decode-only".into(),
            )),
            Self::Lz4 => lz4::compress(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_checks_size() {
        assert_eq!(Compression::None.decompress(b"abc", 3).unwrap(), b"abc");
        assert!(Compression::None.decompress(b"abc", 4).is_err());
    }

    #[test]
    fn lzx_is_decode_only() {
        assert!(matches!(
            Compression::Lzx.compress(b"data"),
            Err(XnbError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn lzx_short_output_is_corrupt() {
        // A zero-size chunk ends the region immediately.
        assert!(matches!(
            Compression::Lzx.decompress(&[0, 0], 10),
            Err(XnbError::CorruptCompressedData(_))
        ));
    }
}
