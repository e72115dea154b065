// Decoded container: header summary, reader table and the content tree.

use super::header::Platform;

/// Header fields that survive a decode/encode round trip.
///
/// Sizes are derived on encode and the compression flag is informational:
/// `pack` chooses compression from the platform alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub platform: Platform,
    pub format_version: u8,
    pub hidef: bool,
    pub compressed: bool,
}

impl Default for HeaderInfo {
    fn default() -> Self {
        Self {
            platform: Platform::Windows,
            format_version: 5,
            hidef: false,
            compressed: false,
        }
    }
}

/// One reader-table entry, kept verbatim so re-encoding reproduces the
/// exact type names of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderDescriptor {
    pub type_name: String,
    pub version: i32,
}

impl ReaderDescriptor {
    pub fn new(type_name: impl Into<String>, version: i32) -> Self {
        Self {
            type_name: type_name.into(),
            version,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub header: HeaderInfo,
    /// Position `i` is dispatch index `i + 1`; entry 0 is the root type.
    pub readers: Vec<ReaderDescriptor>,
    pub content: Value,
}

/// A node of the content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An absent `Nullable<T>`.
    Null,
    Boolean(bool),
    Char(char),
    Int32(i32),
    UInt32(u32),
    Single(f32),
    Double(f64),
    String(String),
    /// Elements of an `Array<T>` or `List<T>`.
    Array(Vec<Value>),
    /// Entries in stream order. Keys are unique.
    Dictionary(Vec<(Value, Value)>),
    /// Named fields of a math struct or a sprite font, in stream order.
    Struct(Vec<(String, Value)>),
    Export(Export),
}

impl Value {
    /// Short name of the variant, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Char(_) => "Char",
            Self::Int32(_) => "Int32",
            Self::UInt32(_) => "UInt32",
            Self::Single(_) => "Single",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::Array(_) => "Array",
            Self::Dictionary(_) => "Dictionary",
            Self::Struct(_) => "Struct",
            Self::Export(e) => e.kind(),
        }
    }

    pub fn structure<const N: usize>(fields: [(&str, Value); N]) -> Self {
        Self::Struct(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    /// Look up a field of a `Struct` value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Single(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// An opaque sub-asset, kept as raw bytes for an external tool to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Export {
    /// Surface format code, dimensions and raw pixel data per mip level.
    Texture2D {
        format: i32,
        width: u32,
        height: u32,
        mips: Vec<Vec<u8>>,
    },
    /// Compiled shader bytecode.
    Effect(Vec<u8>),
    /// xTile binary map.
    TBin(Vec<u8>),
    /// BMFont XML descriptor.
    BmFont(String),
}

impl Export {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Texture2D { .. } => "Texture2D",
            Self::Effect(_) => "Effect",
            Self::TBin(_) => "TBin",
            Self::BmFont(_) => "BmFont",
        }
    }

    /// File extension of the side file an exporter writes for this blob.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Texture2D { .. } => "bin",
            Self::Effect(_) => "cso",
            Self::TBin(_) => "tbin",
            Self::BmFont(_) => "xml",
        }
    }
}
