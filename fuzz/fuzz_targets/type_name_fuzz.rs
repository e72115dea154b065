#![no_main]
use libfuzzer_sys::fuzz_target;
use xnbkit::readers::{TypeReader, TypeTag};

fuzz_target!(|data: &[u8]| {
    let name = String::from_utf8_lossy(data);
    if let Ok(tag) = TypeTag::parse(&name) {
        assert_eq!(TypeReader::from_tag(&tag).tag(), tag);
    }
});
