use xnbkit::buffer::ByteCursor;
use xnbkit::xnb::{HeaderInfo, Platform, ReaderDescriptor};
use xnbkit::{Document, Export, UnpackOptions, Value, XnbError, pack, unpack, unpack_with};

const INT32_READER: &str = "Microsoft.Xna.Framework.Content.Int32Reader";

fn minimal_int32(value: i32) -> Vec<u8> {
    let mut v = b"XNBw\x05\x00".to_vec();
    v.extend_from_slice(&0u32.to_le_bytes());
    v.push(1);
    v.push(INT32_READER.len() as u8);
    v.extend_from_slice(INT32_READER.as_bytes());
    v.extend_from_slice(&0i32.to_le_bytes());
    v.push(0);
    v.push(1);
    v.extend_from_slice(&value.to_le_bytes());
    let len = v.len() as u32;
    v[6..10].copy_from_slice(&len.to_le_bytes());
    v
}

fn document(readers: &[&str], content: Value) -> Document {
    Document {
        header: HeaderInfo::default(),
        readers: readers.iter().map(|r| ReaderDescriptor::new(*r, 0)).collect(),
        content,
    }
}

fn roundtrip(doc: &Document) -> Document {
    let bytes = pack(doc).unwrap();
    let declared = u32::from_le_bytes(bytes[6..10].try_into().unwrap());
    assert_eq!(declared as usize, bytes.len());
    unpack(&bytes).unwrap()
}

// ===========================================================================
// End-to-end
// ===========================================================================

#[test]
fn minimal_file_unpacks_to_42() {
    let bytes = minimal_int32(42);
    let doc = unpack(&bytes).unwrap();
    assert_eq!(doc.content, Value::Int32(42));
    assert_eq!(doc.header.platform, Platform::Windows);
    assert_eq!(doc.header.platform.to_string(), "w");
    assert_eq!(doc.header.format_version, 5);
    assert!(!doc.header.hidef);
    assert!(!doc.header.compressed);
    assert_eq!(doc.readers, vec![ReaderDescriptor::new(INT32_READER, 0)]);
}

#[test]
fn repack_is_byte_identical() {
    let bytes = minimal_int32(42);
    let repacked = pack(&unpack(&bytes).unwrap()).unwrap();
    assert_eq!(repacked, bytes);
}

#[test]
fn hidef_flag_survives() {
    let mut doc = document(&["System.Boolean"], Value::Boolean(true));
    doc.header.hidef = true;
    let bytes = pack(&doc).unwrap();
    assert_eq!(bytes[5], 0x01);
    assert!(unpack(&bytes).unwrap().header.hidef);
}

// ===========================================================================
// Error cases
// ===========================================================================

#[test]
fn wrong_magic_is_rejected() {
    let mut bytes = minimal_int32(1);
    bytes[..3].copy_from_slice(b"PNG");
    assert!(matches!(
        unpack(&bytes),
        Err(XnbError::InvalidMagic { found }) if &found == b"PNG"
    ));
}

#[test]
fn declared_size_larger_than_input_is_truncated() {
    let mut bytes = minimal_int32(1);
    bytes.resize(50, 0);
    bytes[6..10].copy_from_slice(&100u32.to_le_bytes());
    assert!(matches!(
        unpack(&bytes),
        Err(XnbError::TruncatedFile {
            declared: 100,
            actual: 50
        })
    ));
}

#[test]
fn lenient_unpack_ignores_size_mismatch() {
    let mut bytes = minimal_int32(9);
    bytes.extend_from_slice(&[0, 0]);
    assert!(unpack(&bytes).is_err());
    let doc = unpack_with(&bytes, &UnpackOptions { strict_size: false }).unwrap();
    assert_eq!(doc.content, Value::Int32(9));
}

#[test]
fn root_index_out_of_range() {
    // Two readers, root references index 3.
    let mut bytes = b"XNBw\x05\x00\0\0\0\0\x02".to_vec();
    for name in [INT32_READER, "Microsoft.Xna.Framework.Content.BooleanReader"] {
        bytes.push(name.len() as u8);
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
    }
    bytes.push(0);
    bytes.push(3);
    let len = bytes.len() as u32;
    bytes[6..10].copy_from_slice(&len.to_le_bytes());
    assert!(matches!(
        unpack(&bytes),
        Err(XnbError::InvalidReaderIndex { index: 3, count: 2 })
    ));

    // Index 0 (null) at the top level is invalid too.
    let last = bytes.len() - 1;
    bytes[last] = 0;
    assert!(matches!(
        unpack(&bytes),
        Err(XnbError::InvalidReaderIndex { index: 0, .. })
    ));
}

#[test]
fn shared_resources_are_unsupported() {
    let mut bytes = minimal_int32(1);
    let shared = bytes.len() - 6;
    bytes[shared] = 1;
    assert!(matches!(
        unpack(&bytes),
        Err(XnbError::UnsupportedFeature(_))
    ));
}

#[test]
fn unknown_reader_name_is_unsupported() {
    let doc = document(&["Game.Custom.MonsterReader"], Value::Null);
    assert!(matches!(pack(&doc), Err(XnbError::UnsupportedType(_))));
}

#[test]
fn deeply_nested_reader_name_fails_cleanly() {
    let name = format!("System.Int32{}", "[]".repeat(20_000));
    let mut w = ByteCursor::writer();
    w.write_bytes(b"XNBw\x05\x00");
    w.write_u32(0);
    w.write_varuint(1);
    w.write_prefixed_string(&name);
    w.write_i32(0);
    w.write_bytes(&[0, 1]);
    w.write_i32(0);
    let len = w.len() as u32;
    w.patch_u32(6, len).unwrap();
    assert!(matches!(
        unpack(w.as_slice()),
        Err(XnbError::UnsupportedType(_))
    ));
}

#[test]
fn value_of_the_wrong_shape_is_a_mismatch() {
    let doc = document(&[INT32_READER], Value::String("nope".into()));
    assert!(matches!(pack(&doc), Err(XnbError::ValueMismatch { .. })));
}

#[test]
fn compressed_size_bound_is_checked() {
    // LZX flag with a declared size far beyond what the region yields.
    let mut bytes = b"XNBw\x05\x80".to_vec();
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&1000u32.to_le_bytes());
    bytes.extend_from_slice(&[0x00, 0x00]);
    let len = bytes.len() as u32;
    bytes[6..10].copy_from_slice(&len.to_le_bytes());
    assert!(matches!(
        unpack(&bytes),
        Err(XnbError::CorruptCompressedData(_))
    ));
}

// ===========================================================================
// Content round-trips
// ===========================================================================

#[test]
fn string_dictionary_roundtrip() {
    let doc = document(
        &[
            "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.String, mscorlib],[System.String, mscorlib]]",
            "Microsoft.Xna.Framework.Content.StringReader",
        ],
        Value::Dictionary(vec![
            ("Pufferfish".into(), "128/float/1/4/summer/Gold".into()),
            ("Anchovy".into(), "17/dart/1/1/spring fall/Silver".into()),
            ("Empty".into(), "".into()),
        ]),
    );
    assert_eq!(roundtrip(&doc), doc);
}

#[test]
fn empty_dictionary_stays_present() {
    let doc = document(
        &[
            "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.String],[System.Int32]]",
            "Microsoft.Xna.Framework.Content.StringReader",
        ],
        Value::Dictionary(Vec::new()),
    );
    assert_eq!(roundtrip(&doc).content, Value::Dictionary(Vec::new()));
}

#[test]
fn nested_generics_roundtrip() {
    let doc = document(
        &[
            "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.Int32],[System.Collections.Generic.List`1[[System.String]]]]",
            "Microsoft.Xna.Framework.Content.ListReader`1[[System.String]]",
            "Microsoft.Xna.Framework.Content.StringReader",
        ],
        Value::Dictionary(vec![
            (1.into(), Value::Array(vec!["a".into(), "b".into()])),
            (2.into(), Value::Array(Vec::new())),
        ]),
    );
    assert_eq!(roundtrip(&doc), doc);
}

#[test]
fn math_structs_roundtrip() {
    let doc = document(
        &[
            "Microsoft.Xna.Framework.Content.ArrayReader`1[[Microsoft.Xna.Framework.Rectangle]]",
        ],
        Value::Array(vec![Value::structure([
            ("x", 1.into()),
            ("y", (-2).into()),
            ("width", 16.into()),
            ("height", 32.into()),
        ])]),
    );
    assert_eq!(roundtrip(&doc), doc);
}

#[test]
fn nullable_absent_and_present() {
    let readers = ["Microsoft.Xna.Framework.Content.NullableReader`1[[System.Int32]]"];
    for content in [Value::Null, Value::Int32(7)] {
        let doc = document(&readers, content);
        assert_eq!(roundtrip(&doc), doc);
    }
}

#[test]
fn tbin_export_roundtrip() {
    let doc = document(
        &["xTile.Pipeline.TideReader"],
        Value::Export(Export::TBin(b"tBIN10\x00\x01".to_vec())),
    );
    assert_eq!(roundtrip(&doc), doc);
}

#[test]
fn sprite_font_roundtrip() {
    let rect = |x: i32| {
        Value::structure([
            ("x", x.into()),
            ("y", 0.into()),
            ("width", 6.into()),
            ("height", 9.into()),
        ])
    };
    let font = Value::structure([
        (
            "texture",
            Value::Export(Export::Texture2D {
                format: 0,
                width: 2,
                height: 1,
                mips: vec![vec![0xFF; 8]],
            }),
        ),
        ("glyphs", Value::Array(vec![rect(0), rect(6)])),
        ("cropping", Value::Array(vec![rect(0), rect(0)])),
        ("characterMap", Value::Array(vec![Value::Char('x'), Value::Char('y')])),
        ("verticalLineSpacing", 10.into()),
        ("horizontalSpacing", 0.0f32.into()),
        ("kerning", Value::Array(Vec::new())),
        ("defaultCharacter", Value::Null),
    ]);
    let doc = document(
        &[
            "Microsoft.Xna.Framework.Content.SpriteFontReader",
            "Microsoft.Xna.Framework.Content.Texture2DReader",
            "Microsoft.Xna.Framework.Content.ListReader`1[[Microsoft.Xna.Framework.Rectangle]]",
            "Microsoft.Xna.Framework.Content.RectangleReader",
            "Microsoft.Xna.Framework.Content.ListReader`1[[System.Char]]",
            "Microsoft.Xna.Framework.Content.CharReader",
            "Microsoft.Xna.Framework.Content.ListReader`1[[Microsoft.Xna.Framework.Vector3]]",
            "Microsoft.Xna.Framework.Content.Vector3Reader",
        ],
        font,
    );
    assert_eq!(roundtrip(&doc), doc);
}

// ===========================================================================
// Mobile platforms
// ===========================================================================

#[cfg(feature = "lz4")]
#[test]
fn android_documents_are_lz4_packed() {
    let mut doc = document(
        &[
            "Microsoft.Xna.Framework.Content.ListReader`1[[System.String]]",
            "Microsoft.Xna.Framework.Content.StringReader",
        ],
        Value::Array(vec!["repeat repeat repeat repeat".into(); 32]),
    );
    doc.header.platform = Platform::Android;

    let bytes = pack(&doc).unwrap();
    assert_eq!(bytes[3], b'a');
    assert_eq!(bytes[5] & 0x40, 0x40);
    let declared = u32::from_le_bytes(bytes[6..10].try_into().unwrap());
    assert_eq!(declared as usize, bytes.len());
    let decompressed = u32::from_le_bytes(bytes[10..14].try_into().unwrap());
    assert!(decompressed as usize > bytes.len() - 14);

    let back = unpack(&bytes).unwrap();
    assert!(back.header.compressed);
    assert_eq!(back.content, doc.content);
}
