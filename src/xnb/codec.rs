// Container codec: bytes <-> Document.
//
// Decode order: header, content decompression (in place, after the 14-byte
// prologue), reader table, shared-resource count, root content.
// Encode writes the same sequence with zeroed size fields, then patches
// them once the body (and its compressed form, if any) is known.

use log::{debug, info, warn};

use super::document::{Document, HeaderInfo, ReaderDescriptor};
use super::header::{
    COMPRESSED_PROLOGUE_LEN, DECOMPRESSED_SIZE_OFFSET, FILE_SIZE_OFFSET, Header,
};
use crate::buffer::ByteCursor;
use crate::compress::Compression;
use crate::error::{Result, XnbError};
use crate::readers::resolver::{read_shared_resources, write_shared_resources};
use crate::readers::{ContentResolver, TypeReader};

/// Options for [`unpack_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackOptions {
    /// Reject input whose length differs from the header's declared size.
    pub strict_size: bool,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self { strict_size: true }
    }
}

/// Decode a complete XNB file.
pub fn unpack(bytes: &[u8]) -> Result<Document> {
    unpack_with(bytes, &UnpackOptions::default())
}

pub fn unpack_with(bytes: &[u8], options: &UnpackOptions) -> Result<Document> {
    let mut c = ByteCursor::new(bytes.to_vec());
    let header = Header::parse(&mut c, options.strict_size)?;
    debug!("XNB header validated");

    let compression = header.compression();
    if let Some(size) = header.decompressed_size {
        let end = (header.file_size as usize).min(c.len());
        let region = c
            .as_slice()
            .get(COMPRESSED_PROLOGUE_LEN..end)
            .ok_or_else(|| {
                XnbError::CorruptCompressedData(format!(
                    "declared file size {} is smaller than the prologue",
                    header.file_size
                ))
            })?;
        debug!(
            "decompressing {} bytes of {compression:?} into {size}",
            region.len()
        );
        let content = compression.decompress(region, size as usize)?;
        c.replace_tail(COMPRESSED_PROLOGUE_LEN, &content)?;
        c.set_position(COMPRESSED_PROLOGUE_LEN)?;
    }
    debug!("reading content from byte {}", c.position());

    let count = c.read_varuint()?;
    debug!("readers: {count}");
    let mut descriptors = Vec::new();
    let mut readers = Vec::new();
    for _ in 0..count {
        let type_name = c.read_prefixed_string()?;
        let version = c.read_i32()?;
        let reader = TypeReader::from_type_name(&type_name)?;
        debug!("reader {}: {} (version {version})", readers.len() + 1, reader.tag());
        readers.push(reader);
        descriptors.push(ReaderDescriptor { type_name, version });
    }

    read_shared_resources(&mut c)?;

    let resolver = ContentResolver::new(readers);
    let content = resolver.read(&mut c)?;
    if c.remaining() > 0 {
        warn!("{} trailing bytes after content", c.remaining());
    }
    info!("read XNB file ({} readers)", descriptors.len());

    Ok(Document {
        header: HeaderInfo {
            platform: header.platform,
            format_version: header.format_version,
            hidef: header.hidef(),
            compressed: compression.is_compressed(),
        },
        readers: descriptors,
        content,
    })
}

fn size_field(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| XnbError::UnsupportedFeature(format!("output of {len} bytes exceeds 4 GiB")))
}

/// Encode a document. Mobile platforms are LZ4-compressed; everything else
/// is written uncompressed.
pub fn pack(doc: &Document) -> Result<Vec<u8>> {
    let info = &doc.header;
    let header = Header::for_encoding(info.platform, info.format_version, info.hidef);
    let mut c = ByteCursor::writer();
    header.write(&mut c);

    c.write_varuint(size_field(doc.readers.len())?);
    let mut readers = Vec::with_capacity(doc.readers.len());
    for desc in &doc.readers {
        readers.push(TypeReader::from_type_name(&desc.type_name)?);
        c.write_prefixed_string(&desc.type_name);
        c.write_i32(desc.version);
    }
    write_shared_resources(&mut c);

    ContentResolver::new(readers).write(&mut c, &doc.content)?;
    c.trim();

    let compression = header.compression();
    if compression != Compression::None {
        let prologue = header.prologue_len();
        let content_len = c.len() - prologue;
        let packed = compression.compress(&c.as_slice()[prologue..])?;
        debug!("{compression:?} packed {content_len} content bytes into {}", packed.len());
        c.replace_tail(prologue, &packed)?;
        c.patch_u32(DECOMPRESSED_SIZE_OFFSET, size_field(content_len)?)?;
    }
    let total = size_field(c.len())?;
    c.patch_u32(FILE_SIZE_OFFSET, total)?;
    info!("packed XNB file ({total} bytes)");
    Ok(c.into_inner())
}
