// JSON import/export of decoded documents.
//
// A document becomes
//
//   { "header":  { "target", "formatVersion", "hidef", "compressed" },
//     "readers": [ { "type", "version" }, ... ],
//     "content": ... }
//
// Exports are objects tagged with "type". In memory their payload is inline
// (base64, or plain text for BmFont); on disk it goes to a side file next to
// the JSON and the object records the file name under "export".
//
// Import is driven by the root reader's type, so every JSON node is read
// back as exactly the value its reader expects.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info};
use serde_json::{Map, Value as Json, json};

use crate::error::{Result, XnbError};
use crate::readers::TypeTag;
use crate::xnb::{Document, Export, HeaderInfo, Platform, ReaderDescriptor, Value};

fn bad(msg: impl Into<String>) -> XnbError {
    XnbError::Json(msg.into())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Convert a document to JSON with every blob inline.
pub fn document_to_json(doc: &Document) -> Result<Json> {
    Encoder { side: None }.document(doc)
}

/// Rebuild a document from [`document_to_json`] output.
pub fn document_from_json(json: &Json) -> Result<Document> {
    Decoder { dir: None }.document(json)
}

/// Write `doc` as JSON to `json_path`, blobs as side files beside it.
pub fn export_file(json_path: &Path, doc: &Document) -> Result<()> {
    let dir = json_path.parent().unwrap_or(Path::new("")).to_path_buf();
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(&dir)?;
    }
    let stem = json_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| bad(format!("{} has no usable file name", json_path.display())))?
        .to_string();

    let mut encoder = Encoder {
        side: Some(SideFiles {
            dir,
            stem,
            written: 0,
        }),
    };
    let json = encoder.document(doc)?;
    let text = serde_json::to_string_pretty(&json).map_err(|e| bad(e.to_string()))?;
    fs::write(json_path, text)?;
    info!("exported {}", json_path.display());
    Ok(())
}

/// Read a document written by [`export_file`], loading its side files.
pub fn import_file(json_path: &Path) -> Result<Document> {
    let text = fs::read_to_string(json_path)?;
    let json: Json = serde_json::from_str(&text).map_err(|e| bad(e.to_string()))?;
    let dir = json_path.parent().unwrap_or(Path::new("")).to_path_buf();
    Decoder { dir: Some(dir) }.document(&json)
}

// ---------------------------------------------------------------------------
// Value -> JSON
// ---------------------------------------------------------------------------

struct SideFiles {
    dir: PathBuf,
    stem: String,
    written: usize,
}

impl SideFiles {
    /// `<stem>.<ext>` for the first export, `<stem>.<n>.<ext>` after that.
    fn write(&mut self, ext: &str, bytes: &[u8]) -> Result<String> {
        let name = match self.written {
            0 => format!("{}.{ext}", self.stem),
            n => format!("{}.{n}.{ext}", self.stem),
        };
        self.written += 1;
        let path = self.dir.join(&name);
        fs::write(&path, bytes)?;
        debug!("wrote side file {}", path.display());
        Ok(name)
    }
}

struct Encoder {
    side: Option<SideFiles>,
}

fn float(v: f64) -> Json {
    if v.is_finite() {
        json!(v)
    } else if v.is_nan() {
        json!("NaN")
    } else if v > 0.0 {
        json!("Infinity")
    } else {
        json!("-Infinity")
    }
}

/// Key types written as JSON object keys; every other dictionary is a list
/// of `[key, value]` pairs.
fn object_keys(key: &TypeTag) -> bool {
    matches!(
        key,
        TypeTag::String | TypeTag::Char | TypeTag::Int32 | TypeTag::UInt32 | TypeTag::Boolean
    )
}

/// Field names and types of the struct-shaped values, in wire order.
fn struct_layout(tag: &TypeTag) -> Option<Vec<(&'static str, TypeTag)>> {
    let list = |t: TypeTag| TypeTag::List(Box::new(t));
    Some(match tag {
        TypeTag::Vector2 => ["x", "y"].map(|n| (n, TypeTag::Single)).to_vec(),
        TypeTag::Vector3 => ["x", "y", "z"].map(|n| (n, TypeTag::Single)).to_vec(),
        TypeTag::Vector4 => ["x", "y", "z", "w"].map(|n| (n, TypeTag::Single)).to_vec(),
        TypeTag::Rectangle => ["x", "y", "width", "height"]
            .map(|n| (n, TypeTag::Int32))
            .to_vec(),
        TypeTag::SpriteFont => vec![
            ("texture", TypeTag::Texture2D),
            ("glyphs", list(TypeTag::Rectangle)),
            ("cropping", list(TypeTag::Rectangle)),
            ("characterMap", list(TypeTag::Char)),
            ("verticalLineSpacing", TypeTag::Int32),
            ("horizontalSpacing", TypeTag::Single),
            ("kerning", list(TypeTag::Vector3)),
            ("defaultCharacter", TypeTag::Nullable(Box::new(TypeTag::Char))),
        ],
        _ => return None,
    })
}

fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Char(c) => Some(c.to_string()),
        Value::Int32(i) => Some(i.to_string()),
        Value::UInt32(u) => Some(u.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Encoder {
    fn document(&mut self, doc: &Document) -> Result<Json> {
        let root_tag = doc
            .readers
            .first()
            .map(|r| TypeTag::parse(&r.type_name))
            .transpose()?;
        let readers: Vec<Json> = doc
            .readers
            .iter()
            .map(|r| json!({ "type": r.type_name, "version": r.version }))
            .collect();
        Ok(json!({
            "header": {
                "target": doc.header.platform.to_string(),
                "formatVersion": doc.header.format_version,
                "hidef": doc.header.hidef,
                "compressed": doc.header.compressed,
            },
            "readers": readers,
            "content": self.value(root_tag.as_ref(), &doc.content)?,
        }))
    }

    /// `tag` is the type the reader expects here, when known; it decides the
    /// JSON layout of dictionaries.
    fn value(&mut self, tag: Option<&TypeTag>, value: &Value) -> Result<Json> {
        if let (Some(TypeTag::Nullable(inner)), false) = (tag, matches!(value, Value::Null)) {
            return self.value(Some(&**inner), value);
        }
        Ok(match value {
            Value::Null => Json::Null,
            Value::Boolean(b) => json!(b),
            Value::Char(c) => json!(c.to_string()),
            Value::Int32(i) => json!(i),
            Value::UInt32(u) => json!(u),
            // Widen through the shortest decimal form so 0.1f32 stays 0.1.
            Value::Single(f) => float(f.to_string().parse().unwrap_or(f64::from(*f))),
            Value::Double(f) => float(*f),
            Value::String(s) => json!(s),
            Value::Array(items) => {
                let elem = match tag {
                    Some(TypeTag::Array(e) | TypeTag::List(e)) => Some(&**e),
                    _ => None,
                };
                Json::Array(
                    items
                        .iter()
                        .map(|v| self.value(elem, v))
                        .collect::<Result<_>>()?,
                )
            }
            Value::Dictionary(entries) => {
                let (key_tag, val_tag) = match tag {
                    Some(TypeTag::Dictionary(k, v)) => (Some(&**k), Some(&**v)),
                    _ => (None, None),
                };
                let keys: Option<Vec<String>> = match key_tag {
                    Some(k) if !object_keys(k) => None,
                    _ => entries.iter().map(|(k, _)| scalar_key(k)).collect(),
                };
                match keys {
                    Some(keys) => {
                        let mut map = Map::new();
                        for (key, (_, v)) in keys.into_iter().zip(entries) {
                            map.insert(key, self.value(val_tag, v)?);
                        }
                        Json::Object(map)
                    }
                    None => {
                        let mut pairs = Vec::with_capacity(entries.len());
                        for (k, v) in entries {
                            pairs.push(json!([self.value(key_tag, k)?, self.value(val_tag, v)?]));
                        }
                        Json::Array(pairs)
                    }
                }
            }
            Value::Struct(fields) => {
                let layout = tag.and_then(struct_layout);
                let mut map = Map::new();
                for (name, v) in fields {
                    let field_tag = layout
                        .as_ref()
                        .and_then(|l| l.iter().find(|(n, _)| *n == name.as_str()))
                        .map(|(_, t)| t);
                    map.insert(name.clone(), self.value(field_tag, v)?);
                }
                Json::Object(map)
            }
            Value::Export(export) => self.export(export)?,
        })
    }

    fn export(&mut self, export: &Export) -> Result<Json> {
        let mut obj = Map::new();
        obj.insert("type".into(), json!(export.kind()));

        if let Export::Texture2D {
            format,
            width,
            height,
            ..
        } = export
        {
            obj.insert("format".into(), json!(format));
            obj.insert("width".into(), json!(width));
            obj.insert("height".into(), json!(height));
        }

        match (&mut self.side, export) {
            (Some(side), Export::Texture2D { mips, .. }) => {
                let sizes: Vec<usize> = mips.iter().map(Vec::len).collect();
                let name = side.write(export.extension(), &mips.concat())?;
                obj.insert("export".into(), json!(name));
                obj.insert("mipSizes".into(), json!(sizes));
            }
            (Some(side), Export::Effect(data) | Export::TBin(data)) => {
                let name = side.write(export.extension(), data)?;
                obj.insert("export".into(), json!(name));
            }
            (Some(side), Export::BmFont(xml)) => {
                let name = side.write(export.extension(), xml.as_bytes())?;
                obj.insert("export".into(), json!(name));
            }
            (None, Export::Texture2D { mips, .. }) => {
                let mips: Vec<String> = mips.iter().map(|m| STANDARD.encode(m)).collect();
                obj.insert("mips".into(), json!(mips));
            }
            (None, Export::Effect(data) | Export::TBin(data)) => {
                obj.insert("data".into(), json!(STANDARD.encode(data)));
            }
            (None, Export::BmFont(xml)) => {
                obj.insert("data".into(), json!(xml));
            }
        }
        Ok(Json::Object(obj))
    }
}

// ---------------------------------------------------------------------------
// JSON -> Value
// ---------------------------------------------------------------------------

struct Decoder {
    /// Directory holding side files; `None` for in-memory documents.
    dir: Option<PathBuf>,
}

fn field<'a>(obj: &'a Map<String, Json>, name: &str, ctx: &str) -> Result<&'a Json> {
    obj.get(name)
        .ok_or_else(|| bad(format!("{ctx} is missing \"{name}\"")))
}

fn as_object<'a>(json: &'a Json, ctx: &str) -> Result<&'a Map<String, Json>> {
    json.as_object()
        .ok_or_else(|| bad(format!("{ctx} must be an object")))
}

fn parse_float(json: &Json, ctx: &str) -> Result<f64> {
    match json {
        Json::Number(n) => n.as_f64().ok_or_else(|| bad(format!("{ctx}: bad number"))),
        Json::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => Err(bad(format!("{ctx}: expected a number, found {s:?}"))),
        },
        other => Err(bad(format!("{ctx}: expected a number, found {other}"))),
    }
}

fn parse_int<T: TryFrom<i64>>(json: &Json, ctx: &str) -> Result<T> {
    json.as_i64()
        .and_then(|i| T::try_from(i).ok())
        .ok_or_else(|| bad(format!("{ctx}: expected an integer in range, found {json}")))
}

fn parse_char(s: &str, ctx: &str) -> Result<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(bad(format!("{ctx}: expected a single character, found {s:?}"))),
    }
}

/// A dictionary key given as a JSON object key.
fn parse_key(key: &str, tag: &TypeTag) -> Result<Value> {
    let ctx = "dictionary key";
    Ok(match tag {
        TypeTag::String => Value::String(key.to_string()),
        TypeTag::Char => Value::Char(parse_char(key, ctx)?),
        TypeTag::Int32 => Value::Int32(key.parse().map_err(|_| bad(format!("{ctx}: {key:?}")))?),
        TypeTag::UInt32 => Value::UInt32(key.parse().map_err(|_| bad(format!("{ctx}: {key:?}")))?),
        TypeTag::Boolean => Value::Boolean(key.parse().map_err(|_| bad(format!("{ctx}: {key:?}")))?),
        other => return Err(bad(format!("{other} keys must be written as [key, value] pairs"))),
    })
}

fn decode_base64(text: &Json, ctx: &str) -> Result<Vec<u8>> {
    let s = text
        .as_str()
        .ok_or_else(|| XnbError::InvalidExport(format!("{ctx} must be a base64 string")))?;
    STANDARD
        .decode(s)
        .map_err(|e| XnbError::InvalidExport(format!("{ctx}: {e}")))
}

impl Decoder {
    fn document(&self, json: &Json) -> Result<Document> {
        let root = as_object(json, "document")?;
        let header = as_object(field(root, "header", "document")?, "header")?;
        let target = field(header, "target", "header")?
            .as_str()
            .and_then(|s| s.bytes().next())
            .ok_or_else(|| bad("header.target must be a platform letter"))?;
        let info = HeaderInfo {
            platform: Platform::from_code(target),
            format_version: parse_int(field(header, "formatVersion", "header")?, "formatVersion")?,
            hidef: field(header, "hidef", "header")?.as_bool().unwrap_or(false),
            compressed: header.get("compressed").and_then(Json::as_bool).unwrap_or(false),
        };

        let readers = field(root, "readers", "document")?
            .as_array()
            .ok_or_else(|| bad("readers must be an array"))?
            .iter()
            .map(|r| -> Result<ReaderDescriptor> {
                let r = as_object(r, "reader")?;
                let type_name = field(r, "type", "reader")?
                    .as_str()
                    .ok_or_else(|| bad("reader type must be a string"))?;
                let version = parse_int(field(r, "version", "reader")?, "reader version")?;
                Ok(ReaderDescriptor::new(type_name, version))
            })
            .collect::<Result<Vec<_>>>()?;

        let first = readers
            .first()
            .ok_or_else(|| bad("document declares no readers"))?;
        let root_tag = TypeTag::parse(&first.type_name)?;
        let content = self.value(&root_tag, field(root, "content", "document")?)?;

        Ok(Document {
            header: info,
            readers,
            content,
        })
    }

    fn value(&self, tag: &TypeTag, json: &Json) -> Result<Value> {
        let ctx = tag.to_string();
        Ok(match tag {
            TypeTag::Boolean => Value::Boolean(
                json.as_bool()
                    .ok_or_else(|| bad(format!("{ctx}: expected true or false")))?,
            ),
            TypeTag::Char => {
                let s = json
                    .as_str()
                    .ok_or_else(|| bad(format!("{ctx}: expected a string")))?;
                Value::Char(parse_char(s, &ctx)?)
            }
            TypeTag::Int32 => Value::Int32(parse_int(json, &ctx)?),
            TypeTag::UInt32 => Value::UInt32(parse_int(json, &ctx)?),
            TypeTag::Single => Value::Single(parse_float(json, &ctx)? as f32),
            TypeTag::Double => Value::Double(parse_float(json, &ctx)?),
            TypeTag::String => Value::String(
                json.as_str()
                    .ok_or_else(|| bad(format!("{ctx}: expected a string")))?
                    .to_string(),
            ),
            TypeTag::Vector2
            | TypeTag::Vector3
            | TypeTag::Vector4
            | TypeTag::Rectangle
            | TypeTag::SpriteFont => {
                let layout = struct_layout(tag).ok_or_else(|| bad(format!("{ctx} has no fields")))?;
                self.fields(json, &ctx, &layout)?
            }
            TypeTag::Texture2D | TypeTag::Effect | TypeTag::TBin | TypeTag::BmFont => {
                Value::Export(self.export(tag, json)?)
            }
            TypeTag::Array(elem) | TypeTag::List(elem) => Value::Array(
                json.as_array()
                    .ok_or_else(|| bad(format!("{ctx}: expected an array")))?
                    .iter()
                    .map(|item| self.value(elem, item))
                    .collect::<Result<_>>()?,
            ),
            TypeTag::Nullable(inner) => match json {
                Json::Null => Value::Null,
                other => self.value(inner, other)?,
            },
            TypeTag::Dictionary(k, v) => match json {
                Json::Object(map) => Value::Dictionary(
                    map.iter()
                        .map(|(key, val)| -> Result<(Value, Value)> {
                            Ok((parse_key(key, k)?, self.value(v, val)?))
                        })
                        .collect::<Result<_>>()?,
                ),
                Json::Array(pairs) => Value::Dictionary(
                    pairs
                        .iter()
                        .map(|pair| match pair.as_array().map(Vec::as_slice) {
                            Some([key, val]) => Ok((self.value(k, key)?, self.value(v, val)?)),
                            _ => Err(bad(format!("{ctx}: entries must be [key, value] pairs"))),
                        })
                        .collect::<Result<_>>()?,
                ),
                _ => return Err(bad(format!("{ctx}: expected an object or an array"))),
            },
        })
    }

    fn fields(&self, json: &Json, ctx: &str, layout: &[(&str, TypeTag)]) -> Result<Value> {
        let obj = as_object(json, ctx)?;
        let mut fields = Vec::with_capacity(layout.len());
        for (name, tag) in layout {
            fields.push((name.to_string(), self.value(tag, field(obj, name, ctx)?)?));
        }
        Ok(Value::Struct(fields))
    }

    fn side_file(&self, obj: &Map<String, Json>) -> Result<Option<Vec<u8>>> {
        let Some(name) = obj.get("export") else {
            return Ok(None);
        };
        let name = name
            .as_str()
            .ok_or_else(|| XnbError::InvalidExport("\"export\" must be a file name".into()))?;
        let dir = self.dir.as_ref().ok_or_else(|| {
            XnbError::InvalidExport(format!("{name} is a side file; load the document from disk"))
        })?;
        let plain = !name.contains('\\')
            && Path::new(name)
                .file_name()
                .is_some_and(|f| f == std::ffi::OsStr::new(name));
        if !plain {
            return Err(XnbError::InvalidExport(format!(
                "side file {name:?} must be a plain file name"
            )));
        }
        Ok(Some(fs::read(dir.join(name))?))
    }

    fn export(&self, tag: &TypeTag, json: &Json) -> Result<Export> {
        let obj = json
            .as_object()
            .ok_or_else(|| XnbError::InvalidExport(format!("{tag} export must be an object")))?;
        let kind = obj.get("type").and_then(Json::as_str);
        if kind != Some(tag.to_string().as_str()) {
            return Err(XnbError::InvalidExport(format!(
                "expected a {tag} export, found {kind:?}"
            )));
        }
        let side = self.side_file(obj)?;
        let missing = |what: &str| XnbError::InvalidExport(format!("{tag} export is missing \"{what}\""));

        Ok(match tag {
            TypeTag::Texture2D => {
                let dim = |name: &str| -> Result<u32> {
                    parse_int(obj.get(name).ok_or_else(|| missing(name))?, name)
                        .map_err(|e| XnbError::InvalidExport(e.to_string()))
                };
                let format = parse_int(obj.get("format").unwrap_or(&json!(0)), "format")?;
                let mips = match side {
                    Some(bytes) => split_mips(bytes, obj.get("mipSizes"))?,
                    None => obj
                        .get("mips")
                        .and_then(Json::as_array)
                        .ok_or_else(|| missing("mips"))?
                        .iter()
                        .map(|m| decode_base64(m, "mip"))
                        .collect::<Result<_>>()?,
                };
                Export::Texture2D {
                    format,
                    width: dim("width")?,
                    height: dim("height")?,
                    mips,
                }
            }
            TypeTag::Effect | TypeTag::TBin => {
                let data = match side {
                    Some(bytes) => bytes,
                    None => decode_base64(obj.get("data").ok_or_else(|| missing("data"))?, "data")?,
                };
                if *tag == TypeTag::Effect {
                    Export::Effect(data)
                } else {
                    Export::TBin(data)
                }
            }
            _ => {
                let xml = match side {
                    Some(bytes) => String::from_utf8(bytes)
                        .map_err(|e| XnbError::InvalidExport(format!("BmFont XML: {e}")))?,
                    None => obj
                        .get("data")
                        .and_then(Json::as_str)
                        .ok_or_else(|| missing("data"))?
                        .to_string(),
                };
                Export::BmFont(xml)
            }
        })
    }
}

/// Split a concatenated texture side file back into mip levels. Without
/// recorded sizes the whole file is one level.
fn split_mips(bytes: Vec<u8>, sizes: Option<&Json>) -> Result<Vec<Vec<u8>>> {
    let Some(sizes) = sizes else {
        return Ok(vec![bytes]);
    };
    let sizes: Vec<usize> = sizes
        .as_array()
        .ok_or_else(|| XnbError::InvalidExport("mipSizes must be an array".into()))?
        .iter()
        .map(|s| parse_int(s, "mipSizes"))
        .collect::<Result<_>>()?;
    if sizes.iter().sum::<usize>() != bytes.len() {
        return Err(XnbError::InvalidExport(format!(
            "mipSizes add up to {} but the side file has {} bytes",
            sizes.iter().sum::<usize>(),
            bytes.len()
        )));
    }
    let mut rest = bytes.as_slice();
    Ok(sizes
        .into_iter()
        .map(|n| {
            let (mip, tail) = rest.split_at(n);
            rest = tail;
            mip.to_vec()
        })
        .collect())
}
