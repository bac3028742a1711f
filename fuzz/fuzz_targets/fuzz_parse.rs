#![no_main]

use libfuzzer_sys::fuzz_target;
use squash_core::parser::parser::{ParseOptions, parse};

// Arbitrary UTF-8 must produce a program or a positioned error, never a
// panic.  The first byte picks script or module goal.
fuzz_target!(|data: &[u8]| {
    let Some((&goal, rest)) = data.split_first() else {
        return;
    };
    let Ok(source) = std::str::from_utf8(rest) else {
        return;
    };
    let options = ParseOptions {
        module: goal & 1 == 1,
        ..ParseOptions::default()
    };
    if let Err(err) = parse(source, &options) {
        assert!(err.position().is_some(), "parse error without position: {err}");
    }
});
