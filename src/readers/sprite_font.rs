// SpriteFont: a texture atlas plus glyph metrics.
//
// Stream order: texture, glyph rectangles, cropping rectangles, character
// map, line spacing (i32), horizontal spacing (f32), kerning, default
// character. All but the scalars and the trailing Nullable<Char> go through
// index dispatch.

use super::{ContentResolver, TypeReader};
use crate::buffer::ByteCursor;
use crate::error::{Result, XnbError};
use crate::xnb::Value;

fn list_of(elem: TypeReader) -> TypeReader {
    TypeReader::List(Box::new(elem))
}

fn default_char_reader() -> TypeReader {
    TypeReader::Nullable(Box::new(TypeReader::Char))
}

pub(super) fn read(c: &mut ByteCursor, resolver: &ContentResolver) -> Result<Value> {
    let texture = resolver.read(c)?;
    let glyphs = resolver.read(c)?;
    let cropping = resolver.read(c)?;
    let character_map = resolver.read(c)?;
    let vertical_line_spacing = Value::Int32(c.read_i32()?);
    let horizontal_spacing = Value::Single(c.read_f32()?);
    let kerning = resolver.read(c)?;
    let default_character = default_char_reader().read(c, resolver)?;

    Ok(Value::structure([
        ("texture", texture),
        ("glyphs", glyphs),
        ("cropping", cropping),
        ("characterMap", character_map),
        ("verticalLineSpacing", vertical_line_spacing),
        ("horizontalSpacing", horizontal_spacing),
        ("kerning", kerning),
        ("defaultCharacter", default_character),
    ]))
}

pub(super) fn write(c: &mut ByteCursor, value: &Value, resolver: &ContentResolver) -> Result<()> {
    let field = |name: &str| {
        value
            .field(name)
            .ok_or_else(|| XnbError::mismatch(format!("SpriteFont.{name}"), value.kind()))
    };

    resolver.write_with(&TypeReader::Texture2D, c, field("texture")?)?;
    resolver.write_with(&list_of(TypeReader::Rectangle), c, field("glyphs")?)?;
    resolver.write_with(&list_of(TypeReader::Rectangle), c, field("cropping")?)?;
    resolver.write_with(&list_of(TypeReader::Char), c, field("characterMap")?)?;
    TypeReader::Int32.write(c, field("verticalLineSpacing")?, resolver)?;
    TypeReader::Single.write(c, field("horizontalSpacing")?, resolver)?;
    resolver.write_with(&list_of(TypeReader::Vector3), c, field("kerning")?)?;
    default_char_reader().write(c, field("defaultCharacter")?, resolver)
}
