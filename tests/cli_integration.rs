#![cfg(feature = "cli")]

use std::fs;
use std::process::Command;

use tempfile::tempdir;
use xnbkit::xnb::{HeaderInfo, ReaderDescriptor};
use xnbkit::{Document, Value, pack};

fn bin() -> String {
    env!("CARGO_BIN_EXE_xnbkit").to_string()
}

fn sample(content: &[(&str, i32)]) -> Vec<u8> {
    let doc = Document {
        header: HeaderInfo::default(),
        readers: vec![
            ReaderDescriptor::new(
                "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.String],[System.Int32]]",
                0,
            ),
            ReaderDescriptor::new("Microsoft.Xna.Framework.Content.StringReader", 0),
        ],
        content: Value::Dictionary(
            content
                .iter()
                .map(|(k, v)| (Value::from(*k), Value::Int32(*v)))
                .collect(),
        ),
    };
    pack(&doc).unwrap()
}

#[test]
fn cli_unpack_pack_directory_roundtrip() {
    let dir = tempdir().unwrap();
    let content = dir.path().join("Content");
    let unpacked = dir.path().join("unpacked");
    let packed = dir.path().join("packed");
    fs::create_dir_all(content.join("Data")).unwrap();

    let fish = sample(&[("Carp", 30), ("Sturgeon", 200)]);
    let crops = sample(&[("Parsnip", 35)]);
    fs::write(content.join("Data").join("Fish.xnb"), &fish).unwrap();
    fs::write(content.join("Crops.xnb"), &crops).unwrap();
    fs::write(content.join("readme.txt"), b"ignored").unwrap();

    let st = Command::new(bin())
        .arg("unpack")
        .arg(&content)
        .arg(&unpacked)
        .status()
        .unwrap();
    assert!(st.success());
    assert!(unpacked.join("Data").join("Fish.json").is_file());
    assert!(!unpacked.join("readme.json").exists());

    let st = Command::new(bin())
        .arg("pack")
        .arg(&unpacked)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(fs::read(packed.join("Data").join("Fish.xnb")).unwrap(), fish);
    assert_eq!(fs::read(packed.join("Crops.xnb")).unwrap(), crops);
}

#[test]
fn cli_single_file_defaults_to_sibling_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("Tools.xnb");
    fs::write(&input, sample(&[("Axe", 1)])).unwrap();

    let st = Command::new(bin()).arg("unpack").arg(&input).status().unwrap();
    assert!(st.success());
    let json = fs::read_to_string(dir.path().join("Tools.json")).unwrap();
    assert!(json.contains("\"Axe\": 1"));
}

#[test]
fn cli_reports_failures_and_tally() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("good.xnb"), sample(&[("a", 1)])).unwrap();
    fs::write(dir.path().join("bad.xnb"), b"XNA!").unwrap();

    let out = Command::new(bin())
        .args(["--json", "unpack"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(!out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Success 1"));
    assert!(stdout.contains("Fail 1"));

    let stderr = String::from_utf8_lossy(&out.stderr);
    let start = stderr.find("{\n").unwrap();
    let stats: serde_json::Value = serde_json::from_str(&stderr[start..]).unwrap();
    assert_eq!(stats["command"], "unpack");
    assert_eq!(stats["success"], 1);
    assert_eq!(stats["fail"], 1);
}

#[test]
fn cli_without_arguments_shows_help() {
    let out = Command::new(bin()).output().unwrap();
    assert!(!out.status.success());
    let text = String::from_utf8_lossy(&out.stderr);
    assert!(text.contains("unpack"));
}
