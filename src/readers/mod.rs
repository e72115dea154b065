// Type readers: the codecs behind each reader-table entry.
//
// - `type_name`:   verbose .NET type names -> TypeTag
// - `resolver`:    ContentResolver, index dispatch over one file's table
// - `primitive`:   Boolean, Char, numbers, String
// - `math`:        Vector2/3/4, Rectangle
// - `generic`:     Array, List, Dictionary, Nullable
// - `sprite_font`: SpriteFont
// - `blob`:        Texture2D, Effect, TBin, BmFont export placeholders
//
// Value-typed readers are encoded inline inside their parent. Reference-typed
// readers are preceded by their 1-based index in the reader table whenever
// they appear as an element.

mod blob;
mod generic;
mod math;
mod primitive;
pub mod resolver;
mod sprite_font;
pub mod type_name;

pub use resolver::ContentResolver;
pub use type_name::TypeTag;

use crate::buffer::ByteCursor;
use crate::error::Result;
use crate::xnb::Value;

/// A codec for one content type. Parametric readers own their element
/// readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeReader {
    Boolean,
    Char,
    Int32,
    UInt32,
    Single,
    Double,
    String,
    Vector2,
    Vector3,
    Vector4,
    Rectangle,
    Texture2D,
    SpriteFont,
    Effect,
    TBin,
    BmFont,
    Array(Box<TypeReader>),
    List(Box<TypeReader>),
    Nullable(Box<TypeReader>),
    Dictionary(Box<TypeReader>, Box<TypeReader>),
}

impl TypeReader {
    pub fn from_tag(tag: &TypeTag) -> Self {
        let boxed = |t: &TypeTag| Box::new(Self::from_tag(t));
        match tag {
            TypeTag::Boolean => Self::Boolean,
            TypeTag::Char => Self::Char,
            TypeTag::Int32 => Self::Int32,
            TypeTag::UInt32 => Self::UInt32,
            TypeTag::Single => Self::Single,
            TypeTag::Double => Self::Double,
            TypeTag::String => Self::String,
            TypeTag::Vector2 => Self::Vector2,
            TypeTag::Vector3 => Self::Vector3,
            TypeTag::Vector4 => Self::Vector4,
            TypeTag::Rectangle => Self::Rectangle,
            TypeTag::Texture2D => Self::Texture2D,
            TypeTag::SpriteFont => Self::SpriteFont,
            TypeTag::Effect => Self::Effect,
            TypeTag::TBin => Self::TBin,
            TypeTag::BmFont => Self::BmFont,
            TypeTag::Array(t) => Self::Array(boxed(t)),
            TypeTag::List(t) => Self::List(boxed(t)),
            TypeTag::Nullable(t) => Self::Nullable(boxed(t)),
            TypeTag::Dictionary(k, v) => Self::Dictionary(boxed(k), boxed(v)),
        }
    }

    /// Resolve a verbose type name and build its reader.
    pub fn from_type_name(name: &str) -> Result<Self> {
        TypeTag::parse(name).map(|tag| Self::from_tag(&tag))
    }

    pub fn tag(&self) -> TypeTag {
        let boxed = |r: &TypeReader| Box::new(r.tag());
        match self {
            Self::Boolean => TypeTag::Boolean,
            Self::Char => TypeTag::Char,
            Self::Int32 => TypeTag::Int32,
            Self::UInt32 => TypeTag::UInt32,
            Self::Single => TypeTag::Single,
            Self::Double => TypeTag::Double,
            Self::String => TypeTag::String,
            Self::Vector2 => TypeTag::Vector2,
            Self::Vector3 => TypeTag::Vector3,
            Self::Vector4 => TypeTag::Vector4,
            Self::Rectangle => TypeTag::Rectangle,
            Self::Texture2D => TypeTag::Texture2D,
            Self::SpriteFont => TypeTag::SpriteFont,
            Self::Effect => TypeTag::Effect,
            Self::TBin => TypeTag::TBin,
            Self::BmFont => TypeTag::BmFont,
            Self::Array(r) => TypeTag::Array(boxed(r)),
            Self::List(r) => TypeTag::List(boxed(r)),
            Self::Nullable(r) => TypeTag::Nullable(boxed(r)),
            Self::Dictionary(k, v) => TypeTag::Dictionary(boxed(k), boxed(v)),
        }
    }

    /// Whether elements of this type are written inline, without a reader
    /// index.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            Self::Boolean
                | Self::Char
                | Self::Int32
                | Self::UInt32
                | Self::Single
                | Self::Double
                | Self::Vector2
                | Self::Vector3
                | Self::Vector4
                | Self::Rectangle
        )
    }

    /// Decode one value of this type (the body only; any reader index has
    /// already been consumed).
    pub fn read(&self, c: &mut ByteCursor, resolver: &ContentResolver) -> Result<Value> {
        match self {
            Self::Boolean => primitive::read_bool(c),
            Self::Char => primitive::read_char(c),
            Self::Int32 => Ok(Value::Int32(c.read_i32()?)),
            Self::UInt32 => Ok(Value::UInt32(c.read_u32()?)),
            Self::Single => Ok(Value::Single(c.read_f32()?)),
            Self::Double => Ok(Value::Double(c.read_f64()?)),
            Self::String => Ok(Value::String(c.read_prefixed_string()?)),
            Self::Vector2 => math::read_vector(c, 2),
            Self::Vector3 => math::read_vector(c, 3),
            Self::Vector4 => math::read_vector(c, 4),
            Self::Rectangle => math::read_rectangle(c),
            Self::Texture2D => blob::read_texture(c),
            Self::SpriteFont => sprite_font::read(c, resolver),
            Self::Effect => blob::read_effect(c),
            Self::TBin => blob::read_tbin(c),
            Self::BmFont => blob::read_bmfont(c),
            Self::Array(elem) | Self::List(elem) => generic::read_sequence(elem, c, resolver),
            Self::Nullable(inner) => generic::read_nullable(inner, c, resolver),
            Self::Dictionary(k, v) => generic::read_dictionary(k, v, c, resolver),
        }
    }

    /// Encode one value of this type (the body only).
    pub fn write(&self, c: &mut ByteCursor, value: &Value, resolver: &ContentResolver) -> Result<()> {
        match self {
            Self::Boolean => primitive::write_bool(c, value),
            Self::Char => primitive::write_char(c, value),
            Self::Int32 => primitive::write_i32(c, value),
            Self::UInt32 => primitive::write_u32(c, value),
            Self::Single => primitive::write_f32(c, value),
            Self::Double => primitive::write_f64(c, value),
            Self::String => primitive::write_string(c, value),
            Self::Vector2 => math::write_vector(c, value, 2),
            Self::Vector3 => math::write_vector(c, value, 3),
            Self::Vector4 => math::write_vector(c, value, 4),
            Self::Rectangle => math::write_rectangle(c, value),
            Self::Texture2D => blob::write_texture(c, value),
            Self::SpriteFont => sprite_font::write(c, value, resolver),
            Self::Effect => blob::write_effect(c, value),
            Self::TBin => blob::write_tbin(c, value),
            Self::BmFont => blob::write_bmfont(c, value),
            Self::Array(elem) | Self::List(elem) => {
                generic::write_sequence(elem, c, value, resolver)
            }
            Self::Nullable(inner) => generic::write_nullable(inner, c, value, resolver),
            Self::Dictionary(k, v) => generic::write_dictionary(k, v, c, value, resolver),
        }
    }
}
