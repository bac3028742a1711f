#![no_main]

use libfuzzer_sys::fuzz_target;
use squash_core::parser::parser::{ParseOptions, parse};
use squash_core::printer::{OutputOptions, print};
use squash_core::{MinifyOptions, minify};

// Whatever the parser accepts must print to text it accepts again, both
// verbatim and after the full pipeline.
fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let options = ParseOptions::default();
    let Ok(program) = parse(source, &options) else {
        return;
    };

    let printed = print(&program, &OutputOptions::default(), None);
    if let Err(err) = parse(&printed, &options) {
        panic!("printed output does not re-parse: {err}\n{printed}");
    }

    let out = minify(&[("fuzz.js".to_string(), source.to_string())], &MinifyOptions::default());
    if let Some(err) = out.error {
        // Redeclarations are only detected during resolution.
        assert!(matches!(err, squash_core::SquashError::Syntax { .. }), "{err}");
        return;
    }
    if let Err(err) = parse(&out.code, &options) {
        panic!("minified output does not re-parse: {err}\n{}", out.code);
    }
});
