#![cfg(feature = "json")]

use std::fs;

use serde_json::Value as Json;
use tempfile::tempdir;
use xnbkit::porter::{export_file, import_file};
use xnbkit::xnb::{HeaderInfo, Platform, ReaderDescriptor};
use xnbkit::{Document, Export, Value, XnbError, pack, unpack};

fn document(readers: &[&str], content: Value) -> Document {
    Document {
        header: HeaderInfo::default(),
        readers: readers.iter().map(|r| ReaderDescriptor::new(*r, 0)).collect(),
        content,
    }
}

fn read_json(path: &std::path::Path) -> Json {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ===========================================================================
// Side files
// ===========================================================================

#[test]
fn texture_export_survives_side_files() {
    let dir = tempdir().unwrap();
    let json_path = dir.path().join("portrait.json");
    let doc = document(
        &["Microsoft.Xna.Framework.Content.Texture2DReader, Microsoft.Xna.Framework.Graphics"],
        Value::Export(Export::Texture2D {
            format: 0,
            width: 2,
            height: 2,
            mips: vec![vec![7; 16], vec![9; 4]],
        }),
    );

    export_file(&json_path, &doc).unwrap();
    assert_eq!(fs::read(dir.path().join("portrait.bin")).unwrap().len(), 20);

    let json = read_json(&json_path);
    assert_eq!(json["content"]["export"], "portrait.bin");
    assert_eq!(json["content"]["width"], 2);
    assert_eq!(json["content"]["mipSizes"], serde_json::json!([16, 4]));

    assert_eq!(import_file(&json_path).unwrap(), doc);
}

#[test]
fn several_exports_get_numbered_names() {
    let dir = tempdir().unwrap();
    let json_path = dir.path().join("shaders.json");
    let doc = document(
        &[
            "Microsoft.Xna.Framework.Content.ListReader`1[[Microsoft.Xna.Framework.Graphics.Effect]]",
            "Microsoft.Xna.Framework.Content.EffectReader",
        ],
        Value::Array(vec![
            Value::Export(Export::Effect(vec![1, 2, 3])),
            Value::Export(Export::Effect(vec![4, 5])),
        ]),
    );

    export_file(&json_path, &doc).unwrap();
    assert_eq!(fs::read(dir.path().join("shaders.cso")).unwrap(), [1, 2, 3]);
    assert_eq!(fs::read(dir.path().join("shaders.1.cso")).unwrap(), [4, 5]);
    assert_eq!(import_file(&json_path).unwrap(), doc);
}

#[test]
fn bmfont_is_written_as_xml() {
    let dir = tempdir().unwrap();
    let json_path = dir.path().join("font.json");
    let xml = "<?xml version=\"1.0\"?><font><info face=\"Arial\" size=\"32\"/></font>";
    let doc = document(
        &["BmFont.XmlSourceReader, BmFont, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"],
        Value::Export(Export::BmFont(xml.into())),
    );

    export_file(&json_path, &doc).unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("font.xml")).unwrap(), xml);
    assert_eq!(import_file(&json_path).unwrap(), doc);
}

#[test]
fn missing_side_file_is_an_error() {
    let dir = tempdir().unwrap();
    let json_path = dir.path().join("map.json");
    let doc = document(
        &["xTile.Pipeline.TideReader, xTile"],
        Value::Export(Export::TBin(b"tBIN10".to_vec())),
    );
    export_file(&json_path, &doc).unwrap();
    fs::remove_file(dir.path().join("map.tbin")).unwrap();
    assert!(matches!(import_file(&json_path), Err(XnbError::Io(_))));
}

#[test]
fn escaping_side_file_name_is_rejected() {
    let dir = tempdir().unwrap();
    let json_path = dir.path().join("map.json");
    let json = serde_json::json!({
        "header": { "target": "w", "formatVersion": 5, "hidef": false, "compressed": false },
        "readers": [{ "type": "xTile.Pipeline.TideReader", "version": 0 }],
        "content": { "type": "TBin", "export": "../../etc/passwd" },
    });
    fs::write(&json_path, json.to_string()).unwrap();
    assert!(matches!(
        import_file(&json_path),
        Err(XnbError::InvalidExport(_))
    ));
}

// ===========================================================================
// Full pipeline
// ===========================================================================

#[test]
fn xnb_to_json_to_xnb_is_lossless() {
    let mut doc = document(
        &[
            "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.Int32, mscorlib],[System.String, mscorlib]]",
            "Microsoft.Xna.Framework.Content.StringReader",
        ],
        Value::Dictionary(vec![
            (Value::Int32(128), "Pufferfish/1200/-40/Fish -4".into()),
            (Value::Int32(-1), "".into()),
        ]),
    );
    doc.header.platform = Platform::Xbox360;
    let original = pack(&doc).unwrap();

    let dir = tempdir().unwrap();
    let json_path = dir.path().join("nested").join("ObjectInformation.json");
    export_file(&json_path, &unpack(&original).unwrap()).unwrap();

    let json = read_json(&json_path);
    assert_eq!(json["header"]["target"], "x");
    assert_eq!(json["content"]["128"], "Pufferfish/1200/-40/Fish -4");

    assert_eq!(pack(&import_file(&json_path).unwrap()).unwrap(), original);
}
