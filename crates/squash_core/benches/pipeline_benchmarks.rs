use criterion::{Criterion, criterion_group, criterion_main};
use squash_core::compress::compress;
use squash_core::compress::options::CompressOptions;
use squash_core::parser::parser::{ParseOptions, parse};
use squash_core::parser::scope::ResolveOptions;
use squash_core::{MinifyOptions, minify};

/// A few hundred lines of typical library code.
fn corpus() -> String {
    let unit = r#"
var Registry = (function () {
    "use strict";
    function Registry(options) {
        this.entries = {};
        this.debug = options && options.debug === true;
        this.limit = typeof options.limit !== "undefined" ? options.limit : 100;
    }
    Registry.prototype.add = function (name, value) {
        if (this.count() >= this.limit) {
            throw new Error("registry full: " + name);
        }
        if (this.debug) {
            console.log("add", name);
        }
        this.entries[name] = { value: value, created: Date.now(), hits: 0 };
        return this;
    };
    Registry.prototype.get = function (name) {
        var entry = this.entries[name];
        if (!entry) {
            return undefined;
        } else {
            entry.hits += 1;
            return entry.value;
        }
    };
    Registry.prototype.count = function () {
        var total = 0;
        for (var key in this.entries) {
            if (Object.prototype.hasOwnProperty.call(this.entries, key)) {
                total++;
            }
        }
        return total;
    };
    return Registry;
})();
"#;
    unit.repeat(20)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let source = corpus();
    c.bench_function("parse_corpus", |b| {
        b.iter(|| parse(std::hint::black_box(&source), &ParseOptions::default()));
    });
}

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

fn bench_compress(c: &mut Criterion) {
    let source = corpus();
    let Ok(program) = parse(&source, &ParseOptions::default()) else {
        return;
    };
    c.bench_function("compress_corpus", |b| {
        b.iter_batched(
            || program.clone(),
            |mut program| compress(&mut program, &CompressOptions::default(), &ResolveOptions::default()),
            criterion::BatchSize::LargeInput,
        );
    });
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

fn bench_minify(c: &mut Criterion) {
    let sources = vec![("corpus.js".to_string(), corpus())];
    c.bench_function("minify_corpus", |b| {
        b.iter(|| minify(std::hint::black_box(&sources), &MinifyOptions::default()));
    });

    let toplevel = MinifyOptions {
        toplevel: true,
        ..MinifyOptions::default()
    };
    c.bench_function("minify_corpus_toplevel", |b| {
        b.iter(|| minify(std::hint::black_box(&sources), &toplevel));
    });
}

// ---------------------------------------------------------------------------
// Group & main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_parse, bench_compress, bench_minify);
criterion_main!(benches);
