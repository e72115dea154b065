// Byte-stream primitives shared by every other layer.
//
// - `cursor`: ByteCursor with byte/bit reads, little-endian codecs, writers
// - `varint`: 7-bit variable-length unsigned integers

pub mod cursor;
pub mod varint;

pub use cursor::{ByteCursor, Endian, SeekOrigin};
