// Container header.
//
// Layout (little-endian):
//
//   0   magic "XNB"
//   3   platform code
//   4   format version
//   5   flags
//   6   total file size (u32)
//   10  decompressed content size (u32), compressed files only
//
// Content starts at offset 10, or 14 when compressed.

use std::fmt;

use bitflags::bitflags;
use log::{debug, warn};

use crate::buffer::ByteCursor;
use crate::compress::Compression;
use crate::error::{Result, XnbError};

pub const MAGIC: &[u8; 3] = b"XNB";

/// Offset of the total-size field.
pub const FILE_SIZE_OFFSET: usize = 6;
/// Offset of the decompressed-size field.
pub const DECOMPRESSED_SIZE_OFFSET: usize = 10;
/// Header length of an uncompressed file.
pub const PROLOGUE_LEN: usize = 10;
/// Header length of a compressed file.
pub const COMPRESSED_PROLOGUE_LEN: usize = 14;

bitflags! {
    /// The flag byte at offset 5.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HeaderFlags: u8 {
        const HIDEF = 0x01;
        const LZ4 = 0x40;
        const LZX = 0x80;
    }
}

/// Target platform code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    WindowsPhone,
    Xbox360,
    Android,
    Ios,
    Unknown(u8),
}

impl Platform {
    /// Platform codes are case-insensitive.
    pub fn from_code(code: u8) -> Self {
        match code.to_ascii_lowercase() {
            b'w' => Self::Windows,
            b'm' => Self::WindowsPhone,
            b'x' => Self::Xbox360,
            b'a' => Self::Android,
            b'i' => Self::Ios,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Windows => b'w',
            Self::WindowsPhone => b'm',
            Self::Xbox360 => b'x',
            Self::Android => b'a',
            Self::Ios => b'i',
            Self::Unknown(code) => code,
        }
    }

    /// Mobile targets always carry LZ4-compressed content.
    pub fn is_mobile(self) -> bool {
        matches!(self, Self::Android | Self::Ios)
    }

    fn description(self) -> &'static str {
        match self {
            Self::Windows => "Microsoft Windows",
            Self::WindowsPhone => "Windows Phone 7",
            Self::Xbox360 => "Xbox 360",
            Self::Android => "Android",
            Self::Ios => "iOS",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.code()))
    }
}

fn describe_version(version: u8) -> Option<&'static str> {
    match version {
        3 => Some("XNA Game Studio 3.0"),
        4 => Some("XNA Game Studio 3.1"),
        5 => Some("XNA Game Studio 4.0"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub platform: Platform,
    pub format_version: u8,
    pub flags: HeaderFlags,
    pub file_size: u32,
    pub decompressed_size: Option<u32>,
}

impl Header {
    /// Parse the header from the start of `c`, leaving the cursor at the
    /// first content byte.
    ///
    /// With `strict_size` the declared file size must equal the buffer
    /// length.
    pub fn parse(c: &mut ByteCursor, strict_size: bool) -> Result<Self> {
        let magic = c.read_bytes(3)?;
        if magic != MAGIC {
            return Err(XnbError::InvalidMagic {
                found: [magic[0], magic[1], magic[2]],
            });
        }

        let platform = Platform::from_code(c.read_u8()?);
        match platform {
            Platform::Unknown(code) => warn!("invalid target platform {:?} found", char::from(code)),
            p => debug!("target platform: {}", p.description()),
        }

        let format_version = c.read_u8()?;
        match describe_version(format_version) {
            Some(name) => debug!("format version: {name}"),
            None => warn!("format version {format_version:#04x} unknown"),
        }

        let flags = HeaderFlags::from_bits_retain(c.read_u8()?);
        let file_size = c.read_u32()?;
        if file_size as usize != c.len() {
            if strict_size {
                return Err(XnbError::TruncatedFile {
                    declared: file_size,
                    actual: c.len(),
                });
            }
            warn!(
                "header declares {file_size} bytes but input has {}, continuing",
                c.len()
            );
        }

        let mut header = Self {
            platform,
            format_version,
            flags,
            file_size,
            decompressed_size: None,
        };
        if header.compression().is_compressed() {
            header.decompressed_size = Some(c.read_u32()?);
        }
        debug!(
            "content: {}, compression: {:?}, file size: {file_size}",
            if header.hidef() { "HiDef" } else { "Reach" },
            header.compression()
        );
        Ok(header)
    }

    /// LZX takes precedence when both compression bits are set.
    pub fn compression(&self) -> Compression {
        if self.flags.contains(HeaderFlags::LZX) {
            Compression::Lzx
        } else if self.flags.contains(HeaderFlags::LZ4) {
            Compression::Lz4
        } else {
            Compression::None
        }
    }

    pub fn hidef(&self) -> bool {
        self.flags.contains(HeaderFlags::HIDEF)
    }

    /// Header for encoding. Mobile platforms always get LZ4; LZX is never
    /// produced.
    pub fn for_encoding(platform: Platform, format_version: u8, hidef: bool) -> Self {
        let mut flags = HeaderFlags::empty();
        flags.set(HeaderFlags::HIDEF, hidef);
        flags.set(HeaderFlags::LZ4, platform.is_mobile());
        Self {
            platform,
            format_version,
            flags,
            file_size: 0,
            decompressed_size: platform.is_mobile().then_some(0),
        }
    }

    /// Write the header with its size fields as they currently stand.
    pub fn write(&self, c: &mut ByteCursor) {
        c.write_bytes(MAGIC);
        c.write_u8(self.platform.code());
        c.write_u8(self.format_version);
        c.write_u8(self.flags.bits());
        c.write_u32(self.file_size);
        if let Some(size) = self.decompressed_size {
            c.write_u32(size);
        }
    }

    pub fn prologue_len(&self) -> usize {
        if self.decompressed_size.is_some() {
            COMPRESSED_PROLOGUE_LEN
        } else {
            PROLOGUE_LEN
        }
    }
}
