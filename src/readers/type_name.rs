// Foreign type-name resolution.
//
// Reader tables carry fully qualified .NET names such as
//
//   Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.String, mscorlib,
//     Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089],
//     [System.Int32, mscorlib, ...]]
//
// Grammar handled by the parser:
//
//   qualified := name [ "," assembly ]
//   name      := simple [ "`" arity [ "[" args "]" ] ] { "[]" }
//   args      := arg { "," arg }
//   arg       := "[" qualified "]" | name

use std::fmt;

use log::trace;

use crate::error::{Result, XnbError};

/// Canonical type of a reader, independent of how the file spelled it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
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
    Array(Box<TypeTag>),
    List(Box<TypeTag>),
    Nullable(Box<TypeTag>),
    Dictionary(Box<TypeTag>, Box<TypeTag>),
}

impl TypeTag {
    /// Resolve a verbose type name.
    pub fn parse(name: &str) -> Result<Self> {
        let tag = parse_qualified(name.trim(), 0)?;
        trace!("resolved type {name:?} -> {tag}");
        Ok(tag)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = match self {
            Self::Boolean => "Boolean",
            Self::Char => "Char",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Single => "Single",
            Self::Double => "Double",
            Self::String => "String",
            Self::Vector2 => "Vector2",
            Self::Vector3 => "Vector3",
            Self::Vector4 => "Vector4",
            Self::Rectangle => "Rectangle",
            Self::Texture2D => "Texture2D",
            Self::SpriteFont => "SpriteFont",
            Self::Effect => "Effect",
            Self::TBin => "TBin",
            Self::BmFont => "BmFont",
            Self::Array(t) => return write!(f, "Array<{t}>"),
            Self::List(t) => return write!(f, "List<{t}>"),
            Self::Nullable(t) => return write!(f, "Nullable<{t}>"),
            Self::Dictionary(k, v) => return write!(f, "Dictionary<{k},{v}>"),
        };
        f.write_str(simple)
    }
}

// ---------------------------------------------------------------------------
// Name tables
// ---------------------------------------------------------------------------

const CONTENT: &str = "Microsoft.Xna.Framework.Content.";

fn simple_tag(name: &str) -> Option<TypeTag> {
    let tag = match name {
        "System.Boolean" => TypeTag::Boolean,
        "System.Char" => TypeTag::Char,
        "System.Int32" => TypeTag::Int32,
        "System.UInt32" => TypeTag::UInt32,
        "System.Single" => TypeTag::Single,
        "System.Double" => TypeTag::Double,
        "System.String" => TypeTag::String,
        "Microsoft.Xna.Framework.Vector2" => TypeTag::Vector2,
        "Microsoft.Xna.Framework.Vector3" => TypeTag::Vector3,
        "Microsoft.Xna.Framework.Vector4" => TypeTag::Vector4,
        "Microsoft.Xna.Framework.Rectangle" => TypeTag::Rectangle,
        "Microsoft.Xna.Framework.Graphics.Texture2D" => TypeTag::Texture2D,
        "Microsoft.Xna.Framework.Graphics.SpriteFont" => TypeTag::SpriteFont,
        "Microsoft.Xna.Framework.Graphics.Effect" => TypeTag::Effect,
        "xTile.Pipeline.TideReader" => TypeTag::TBin,
        "BmFont.XmlSourceReader" => TypeTag::BmFont,
        _ => {
            let reader = name.strip_prefix(CONTENT)?.strip_suffix("Reader")?;
            match reader {
                "Boolean" => TypeTag::Boolean,
                "Char" => TypeTag::Char,
                "Int32" => TypeTag::Int32,
                "UInt32" => TypeTag::UInt32,
                "Single" => TypeTag::Single,
                "Double" => TypeTag::Double,
                "String" => TypeTag::String,
                "Vector2" => TypeTag::Vector2,
                "Vector3" => TypeTag::Vector3,
                "Vector4" => TypeTag::Vector4,
                "Rectangle" => TypeTag::Rectangle,
                "Texture2D" => TypeTag::Texture2D,
                "SpriteFont" => TypeTag::SpriteFont,
                "Effect" => TypeTag::Effect,
                _ => return None,
            }
        }
    };
    Some(tag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Generic {
    Array,
    List,
    Nullable,
    Dictionary,
}

impl Generic {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "System.Collections.Generic.List" => Some(Self::List),
            "System.Collections.Generic.Dictionary" => Some(Self::Dictionary),
            "System.Nullable" => Some(Self::Nullable),
            _ => match name.strip_prefix(CONTENT)? {
                "ArrayReader" => Some(Self::Array),
                "ListReader" => Some(Self::List),
                "NullableReader" => Some(Self::Nullable),
                "DictionaryReader" => Some(Self::Dictionary),
                _ => None,
            },
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::Dictionary => 2,
            _ => 1,
        }
    }

    fn build(self, mut args: Vec<TypeTag>) -> TypeTag {
        // Arity was checked by the caller.
        let first = Box::new(args.remove(0));
        match self {
            Self::Array => TypeTag::Array(first),
            Self::List => TypeTag::List(first),
            Self::Nullable => TypeTag::Nullable(first),
            Self::Dictionary => TypeTag::Dictionary(first, Box::new(args.remove(0))),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Deepest nesting of generic arguments and `[]` suffixes accepted.
const MAX_DEPTH: usize = 64;

fn unsupported(name: &str) -> XnbError {
    XnbError::UnsupportedType(name.to_string())
}

/// Split `s` at commas outside any brackets.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Drop the assembly qualification: everything after the first top-level
/// comma.
fn parse_qualified(name: &str, depth: usize) -> Result<TypeTag> {
    let bare = split_top_level(name)[0].trim();
    parse_name(bare, depth)
}

fn parse_name(name: &str, depth: usize) -> Result<TypeTag> {
    if name.is_empty() {
        return Err(unsupported(name));
    }
    if depth > MAX_DEPTH {
        return Err(XnbError::UnsupportedType(format!(
            "type name nested deeper than {MAX_DEPTH} levels"
        )));
    }
    if let Some(element) = name.strip_suffix("[]") {
        return Ok(TypeTag::Array(Box::new(parse_name(element, depth + 1)?)));
    }

    let Some((base, rest)) = name.split_once('`') else {
        return simple_tag(name).ok_or_else(|| unsupported(name));
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let arity: usize = rest[..digits].parse().map_err(|_| unsupported(name))?;
    let rest = &rest[digits..];

    let args = if rest.is_empty() {
        Vec::new()
    } else {
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .ok_or_else(|| unsupported(name))?;
        split_top_level(inner)
            .into_iter()
            .map(|arg| {
                let arg = arg.trim();
                match arg.strip_prefix('[').and_then(|a| a.strip_suffix(']')) {
                    Some(qualified) => parse_qualified(qualified.trim(), depth + 1),
                    None => parse_name(arg, depth + 1),
                }
            })
            .collect::<Result<Vec<_>>>()?
    };

    let generic = Generic::lookup(base).ok_or_else(|| unsupported(name))?;
    if args.len() != generic.arity() || arity != generic.arity() {
        return Err(XnbError::UnsupportedType(format!(
            "{name} (expected {} type argument(s), found {})",
            generic.arity(),
            args.len()
        )));
    }
    Ok(generic.build(args))
}
