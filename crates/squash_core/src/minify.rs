//! The one-call pipeline: parse every input unit, compress, mangle and
//! print.
//!
//! [`minify`] never fails: a fatal error ends the run early and is reported
//! through [`MinifyOutput::error`] with empty `code`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compress::compress;
use crate::compress::options::{CompressOptions, Toggle};
use crate::error::{SquashError, SquashResult, Warning};
use crate::mangle::{MangleOptions, NameCache, mangle_names, mangle_properties};
use crate::parser::ast::Program;
use crate::parser::parser::{ParseOptions, parse_with_file};
use crate::parser::scope::{ResolveOptions, resolve};
use crate::printer::{InputSourceMap, OutputOptions, OxcSourceMap, SourceMapSink, print};

/// Source-map generation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceMapOptions {
    /// Value of the map's `file` field.
    pub filename: Option<String>,
    /// An existing map (JSON) of the input; output positions are traced
    /// through it back to its sources.
    pub content: Option<String>,
    /// Embed every input's text in `sourcesContent`.
    pub include_sources: bool,
    /// Appended to the code as a `//# sourceMappingURL=` comment.
    pub url: Option<String>,
}

/// Everything [`minify`] can be told.
///
/// `toplevel`, `ie8` and `safari10` are switched on in every sub-record
/// that has the same setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MinifyOptions {
    pub parse: ParseOptions,
    pub compress: Toggle<CompressOptions>,
    pub mangle: Toggle<MangleOptions>,
    pub output: OutputOptions,
    #[serde(alias = "sourceMap")]
    pub source_map: Toggle<SourceMapOptions>,
    /// Top-level bindings may be dropped, inlined and renamed.
    pub toplevel: bool,
    /// Keep the output working on IE 6-8.
    pub ie8: bool,
    /// Work around Safari 10 scoping bugs.
    pub safari10: bool,
    /// Names from an earlier run; the updated cache is returned in
    /// [`MinifyOutput::name_cache`].
    pub name_cache: Option<NameCache>,
    /// Return compressor warnings in [`MinifyOutput::warnings`].
    pub warnings: bool,
    /// Return the final tree in [`MinifyOutput::ast`].
    pub keep_ast: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        MinifyOptions {
            parse: ParseOptions::default(),
            compress: Toggle::Enabled(true),
            mangle: Toggle::Enabled(true),
            output: OutputOptions::default(),
            source_map: Toggle::Enabled(false),
            toplevel: false,
            ie8: false,
            safari10: false,
            name_cache: None,
            warnings: false,
            keep_ast: false,
        }
    }
}

/// The result of [`minify`].
#[derive(Debug, Default)]
pub struct MinifyOutput {
    /// The minified program; empty when `error` is set.
    pub code: String,
    /// The source map as JSON, when requested.
    pub map: Option<String>,
    /// The final tree, with `keep_ast`.
    pub ast: Option<Program>,
    /// Compressor warnings, with `warnings`.
    pub warnings: Vec<Warning>,
    /// The fatal error that stopped the run.
    pub error: Option<SquashError>,
    /// The name cache after this run, when one was passed in.
    pub name_cache: Option<NameCache>,
}

/// Minify `sources`, a list of `(name, text)` input units concatenated in
/// order.
///
/// # Example
///
/// ```
/// use squash_core::minify::{MinifyOptions, minify};
///
/// let sources = vec![("in.js".to_string(), "function f(longName) { return longName * 2; }".to_string())];
/// let out = minify(&sources, &MinifyOptions::default());
/// assert!(out.error.is_none());
/// assert!(out.code.starts_with("function f("));
/// assert!(!out.code.contains("longName"));
/// ```
pub fn minify(sources: &[(String, String)], options: &MinifyOptions) -> MinifyOutput {
    let mut out = MinifyOutput::default();
    if let Err(error) = run(sources, options, &mut out) {
        warn!(%error, "minify failed");
        out = MinifyOutput {
            error: Some(error),
            warnings: out.warnings,
            ..MinifyOutput::default()
        };
    }
    out
}

fn run(sources: &[(String, String)], options: &MinifyOptions, out: &mut MinifyOutput) -> SquashResult<()> {
    let resolve_options = ResolveOptions { ie8: options.ie8 };

    let mut program = Program::empty();
    for (index, (name, text)) in sources.iter().enumerate() {
        let file = u32::try_from(index).map_err(|_| SquashError::Options("too many input units".into()))?;
        let mut unit = parse_with_file(text, file, &options.parse).map_err(|e| e.in_file(name))?;
        unit.files.push(name.clone());
        program.append(unit);
    }
    debug!(units = sources.len(), statements = program.body.len(), "parse stage done");

    if let Some(mut compress_options) = options.compress.resolve() {
        compress_options.toplevel |= options.toplevel;
        let warnings = compress(&mut program, &compress_options, &resolve_options)?;
        debug!(warnings = warnings.len(), "compress stage done");
        if options.warnings {
            out.warnings = warnings;
        }
    }

    if let Some(mut mangle_options) = options.mangle.resolve() {
        mangle_options.toplevel |= options.toplevel;
        mangle_options.ie8 |= options.ie8;
        mangle_options.safari10 |= options.safari10;
        let mut cache = options.name_cache.clone().unwrap_or_default();
        let mut tree = resolve(&mut program, &resolve_options)?;
        mangle_names(&mut program, &mut tree, &mangle_options, &mut cache)?;
        if let Some(property_options) = mangle_options.properties.resolve() {
            mangle_properties(&mut program, &property_options, &mut cache)?;
        }
        debug!(vars = cache.vars.len(), props = cache.props.len(), "mangle stage done");
        if options.name_cache.is_some() {
            out.name_cache = Some(cache);
        }
    }

    match options.source_map.resolve() {
        Some(map_options) => {
            let mut sink = OxcSourceMap::new(map_options.filename.as_deref());
            if map_options.include_sources {
                sink = sink.with_contents(sources.iter().cloned());
            }
            if let Some(content) = &map_options.content {
                sink = sink.with_input_map(InputSourceMap::from_json(content)?);
            }
            out.code = print(&program, &options.output, Some(&mut sink));
            out.map = Some(sink.get());
            if let Some(url) = &map_options.url {
                out.code.push_str("\n//# sourceMappingURL=");
                out.code.push_str(url);
            }
        }
        None => out.code = print(&program, &options.output, None),
    }
    debug!(bytes = out.code.len(), "output stage done");

    if options.keep_ast {
        out.ast = Some(program);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mangle::PropertyMangleOptions;
    use crate::parser::parser::parse;
    use proptest::prelude::*;

    fn sources(code: &str) -> Vec<(String, String)> {
        vec![("input.js".to_string(), code.to_string())]
    }

    fn no_mangle() -> MinifyOptions {
        MinifyOptions {
            mangle: Toggle::Enabled(false),
            ..MinifyOptions::default()
        }
    }

    #[test]
    fn test_toplevel_program_vanishes() {
        let options = MinifyOptions {
            toplevel: true,
            ..no_mangle()
        };
        let out = minify(&sources("var a = 1; var b = 2; function f(){ return a + b; } f();"), &options);
        assert!(out.error.is_none());
        assert_eq!(out.code, "");
    }

    #[test]
    fn test_constant_branch_selected() {
        let options = MinifyOptions {
            compress: Toggle::Config(CompressOptions {
                conditionals: true,
                dead_code: true,
                ..CompressOptions::default()
            }),
            ..no_mangle()
        };
        let out = minify(&sources("if (true) { console.log(1); } else { console.log(2); }"), &options);
        assert_eq!(out.code, "console.log(1);");
    }

    #[test]
    fn test_syntax_error_reported() {
        let out = minify(&sources("var = ;"), &MinifyOptions::default());
        assert!(out.code.is_empty());
        match out.error {
            Some(SquashError::Syntax { file, line, col, .. }) => {
                assert_eq!(file, "input.js");
                assert_eq!((line, col), (1, 4));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_mangle_only() {
        let options = MinifyOptions {
            compress: Toggle::Enabled(false),
            ..MinifyOptions::default()
        };
        let out = minify(&sources("function outer(){ var longName = 1; return longName; }"), &options);
        assert!(out.code.starts_with("function outer(){var "));
        assert!(!out.code.contains("longName"));
    }

    #[test]
    fn test_units_concatenated_in_order() {
        let units = vec![
            ("a.js".to_string(), "first();".to_string()),
            ("b.js".to_string(), "second();".to_string()),
        ];
        let out = minify(&units, &no_mangle());
        assert_eq!(out.code, "first(),second();");
    }

    #[test]
    fn test_error_names_failing_unit() {
        let units = vec![
            ("a.js".to_string(), "ok();".to_string()),
            ("b.js".to_string(), "\"unterminated".to_string()),
        ];
        let out = minify(&units, &MinifyOptions::default());
        match out.error {
            Some(SquashError::Lexical { file, .. }) => assert_eq!(file, "b.js"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_source_map_and_url() {
        let options = MinifyOptions {
            source_map: Toggle::Config(SourceMapOptions {
                filename: Some("out.js".into()),
                include_sources: true,
                url: Some("out.js.map".into()),
                ..SourceMapOptions::default()
            }),
            ..no_mangle()
        };
        let out = minify(&sources("foo(1);\nbar(2);"), &options);
        assert!(out.code.ends_with("\n//# sourceMappingURL=out.js.map"));
        let map: serde_json::Value = serde_json::from_str(out.map.as_deref().unwrap()).unwrap();
        assert_eq!(map["file"], "out.js");
        assert_eq!(map["sources"][0], "input.js");
        assert_eq!(map["sourcesContent"][0], "foo(1);\nbar(2);");
    }

    #[test]
    fn test_bad_input_map_is_fatal() {
        let options = MinifyOptions {
            source_map: Toggle::Config(SourceMapOptions {
                content: Some("{".into()),
                ..SourceMapOptions::default()
            }),
            ..MinifyOptions::default()
        };
        let out = minify(&sources("a();"), &options);
        assert!(matches!(out.error, Some(SquashError::SourceMap(_))));
        assert!(out.code.is_empty());
    }

    #[test]
    fn test_name_cache_round_trip() {
        let options = MinifyOptions {
            toplevel: true,
            compress: Toggle::Enabled(false),
            name_cache: Some(NameCache::default()),
            ..MinifyOptions::default()
        };
        let first = minify(&sources("var counter = 0; counter++;"), &options);
        let cache = first.name_cache.unwrap();
        let renamed = cache.vars["counter"].clone();
        assert!(first.code.contains(&renamed));

        let again = MinifyOptions {
            name_cache: Some(cache),
            ..options
        };
        let second = minify(&sources("var counter; counter--;"), &again);
        assert_eq!(second.code, format!("var {renamed};{renamed}--;"));
    }

    #[test]
    fn test_properties_mangled() {
        let options = MinifyOptions {
            compress: Toggle::Enabled(false),
            mangle: Toggle::Config(MangleOptions {
                properties: Toggle::Config(PropertyMangleOptions::default()),
                ..MangleOptions::default()
            }),
            ..MinifyOptions::default()
        };
        let out = minify(&sources("o.secret = o.length;"), &options);
        assert_eq!(out.code, "o.a=o.length;");
    }

    #[test]
    fn test_warnings_and_ast_on_request() {
        let src = "function f(){ return 1; g(); }";
        let quiet = minify(&sources(src), &MinifyOptions::default());
        assert!(quiet.warnings.is_empty());
        assert!(quiet.ast.is_none());

        let options = MinifyOptions {
            warnings: true,
            keep_ast: true,
            ..MinifyOptions::default()
        };
        let out = minify(&sources(src), &options);
        assert!(out.warnings.iter().any(|w| w.message == "Dropping unreachable code"));
        assert_eq!(out.ast.map(|p| p.body.len()), Some(1));
    }

    #[test]
    fn test_options_from_json() {
        let options: MinifyOptions = serde_json::from_str(
            r#"{"compress": {"passes": 3}, "mangle": false, "sourceMap": true, "toplevel": true}"#,
        )
        .unwrap();
        assert!(!options.mangle.is_enabled());
        assert_eq!(options.compress.resolve().map(|c| c.passes), Some(3));
        assert!(options.source_map.is_enabled());
        assert!(options.toplevel);
        assert!(serde_json::from_str::<MinifyOptions>(r#"{"bogus": 1}"#).is_err());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Properties
    // ─────────────────────────────────────────────────────────────────────────

    fn statement() -> impl Strategy<Value = String> {
        let name = prop::sample::select(vec!["a", "b", "c", "d"]);
        let expr = (name.clone(), 0u32..100, name.clone()).prop_flat_map(|(x, n, y)| {
            prop::sample::select(vec![
                format!("{x} + {n} * {y}"),
                format!("({x} || {y}) && {n}"),
                format!("{x} ? {y} : {n}"),
                format!("{x}.p[{n}]"),
                format!("f({x}, -{n}, typeof {y})"),
                format!("!{x} === {y} - -{n}"),
                format!("{x} = {y} ** {n} / 2"),
            ])
        });
        (name, expr).prop_flat_map(|(x, e)| {
            prop::sample::select(vec![
                format!("var {x} = {e};"),
                format!("if ({e}) {x}(); else {{ g(); }}"),
                format!("for (var i = 0; i < {x}; i++) {{ {e}; }}"),
                format!("function {x}(b, c) {{ return {e}; }}"),
                format!("while ({x}) {{ if ({e}) break; }}"),
                format!("{e};"),
            ])
        })
    }

    proptest! {
        #[test]
        fn prop_output_reparses(body in prop::collection::vec(statement(), 1..8)) {
            let src = body.join("\n");
            for options in [MinifyOptions::default(), no_mangle(), MinifyOptions { toplevel: true, ..MinifyOptions::default() }] {
                let out = minify(&sources(&src), &options);
                prop_assert!(out.error.is_none(), "{:?} for {}", out.error, src);
                let again = parse(&out.code, &ParseOptions::default());
                prop_assert!(again.is_ok(), "{} does not re-parse: {:?}", out.code, again.err());
            }
        }

        #[test]
        fn prop_recompression_never_grows(body in prop::collection::vec(statement(), 1..8)) {
            let src = body.join("\n");
            let once = minify(&sources(&src), &no_mangle());
            let twice = minify(&sources(&once.code), &no_mangle());
            prop_assert!(twice.code.len() <= once.code.len(), "{} grew to {}", once.code, twice.code);
        }
    }
}
