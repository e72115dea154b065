#![no_main]
use libfuzzer_sys::fuzz_target;
use xnbkit::UnpackOptions;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must only ever produce errors, never panics.
    let _ = xnbkit::unpack(data);

    // Skip the size check so the fuzzer reaches the reader table sooner.
    let lenient = UnpackOptions { strict_size: false };
    if let Ok(doc) = xnbkit::unpack_with(data, &lenient) {
        let _ = xnbkit::pack(&doc);
    }
});
