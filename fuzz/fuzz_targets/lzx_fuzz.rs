#![no_main]
use libfuzzer_sys::fuzz_target;
use xnbkit::compress::frames;

fuzz_target!(|data: &[u8]| {
    let _ = frames::decompress(data);
});
