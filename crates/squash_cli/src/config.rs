//! Option loading: an optional JSON file, then command-line flags on top.

use std::path::Path;

use anyhow::Context;
use squash_core::compress::options::Toggle;
use squash_core::mangle::{NameCache, PropertyMangleOptions};
use squash_core::minify::MinifyOptions;
use squash_core::printer::CommentsOption;

use crate::Cli;

/// Read `path` as a JSON [`MinifyOptions`] object, or start from the
/// defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<MinifyOptions> {
    let Some(path) = path else {
        return Ok(MinifyOptions::default());
    };
    let content = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Layer the explicit flags of `cli` over `options`.
pub fn apply_flags(mut options: MinifyOptions, cli: &Cli) -> anyhow::Result<MinifyOptions> {
    if cli.no_compress {
        options.compress = Toggle::Enabled(false);
    }
    if cli.no_mangle {
        options.mangle = Toggle::Enabled(false);
    }
    if cli.mangle_props {
        let mut mangle = options.mangle.resolve().unwrap_or_default();
        if !mangle.properties.is_enabled() {
            mangle.properties = Toggle::Config(PropertyMangleOptions::default());
        }
        options.mangle = Toggle::Config(mangle);
    }
    options.toplevel |= cli.toplevel;
    options.ie8 |= cli.ie8;
    options.safari10 |= cli.safari10;
    options.parse.module |= cli.module;
    options.output.beautify |= cli.beautify;
    options.warnings |= cli.warn;
    if let Some(ecma) = cli.ecma {
        options.output.ecma = ecma;
    }
    if let Some(comments) = &cli.comments {
        options.output.comments = match comments.as_str() {
            "none" => CommentsOption::None,
            "all" => CommentsOption::All,
            _ => CommentsOption::Some,
        };
    }
    if let Some(preamble) = &cli.preamble {
        options.output.preamble = Some(preamble.clone());
    }

    if let Some(map_path) = &cli.source_map {
        let mut map = options.source_map.resolve().unwrap_or_default();
        map.include_sources |= cli.source_map_include_sources;
        if map.filename.is_none() {
            map.filename = cli.output.as_ref().map(|p| file_name(p));
        }
        if map.url.is_none() {
            map.url = Some(file_name(map_path));
        }
        if let Some(input) = &cli.in_source_map {
            let content = std::fs::read_to_string(input).with_context(|| format!("cannot read {}", input.display()))?;
            map.content = Some(content);
        }
        options.source_map = Toggle::Config(map);
    } else if cli.in_source_map.is_some() || cli.source_map_include_sources {
        anyhow::bail!("--in-source-map and --source-map-include-sources need --source-map");
    }

    if let Some(cache_path) = &cli.name_cache {
        options.name_cache = Some(read_name_cache(cache_path)?);
    }
    Ok(options)
}

/// A missing cache file is an empty cache.
fn read_name_cache(path: &Path) -> anyhow::Result<NameCache> {
    if !path.exists() {
        return Ok(NameCache::default());
    }
    let content = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse name cache {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("squash").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_config() {
        let options = apply_flags(load_config(None).unwrap(), &cli(&["in.js"])).unwrap();
        assert!(options.compress.is_enabled());
        assert!(options.mangle.is_enabled());
        assert!(!options.source_map.is_enabled());
    }

    #[test]
    fn test_flags_override_config() {
        let base: MinifyOptions = serde_json::from_str(r#"{"compress": {"passes": 3}, "toplevel": false}"#).unwrap();
        let options = apply_flags(base, &cli(&["--toplevel", "--no-mangle", "-b", "in.js"])).unwrap();
        assert!(options.toplevel);
        assert!(!options.mangle.is_enabled());
        assert!(options.output.beautify);
        assert_eq!(options.compress.resolve().map(|c| c.passes), Some(3));
    }

    #[test]
    fn test_source_map_flags() {
        let options = apply_flags(
            MinifyOptions::default(),
            &cli(&["-o", "dist/out.js", "--source-map", "dist/out.js.map", "in.js"]),
        )
        .unwrap();
        let map = options.source_map.resolve().unwrap();
        assert_eq!(map.filename.as_deref(), Some("out.js"));
        assert_eq!(map.url.as_deref(), Some("out.js.map"));
    }

    #[test]
    fn test_input_map_needs_output_map() {
        let err = apply_flags(MinifyOptions::default(), &cli(&["--in-source-map", "x.map", "in.js"]));
        assert!(err.is_err());
    }

    #[test]
    fn test_mangle_props_flag() {
        let options = apply_flags(MinifyOptions::default(), &cli(&["--mangle-props", "in.js"])).unwrap();
        let mangle = options.mangle.resolve().unwrap();
        assert!(mangle.properties.is_enabled());
    }
}
