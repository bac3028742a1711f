//! `squash`: command-line JavaScript minifier.
//!
//! Reads one or more input files (or stdin), runs them through
//! [`squash_core::minify`] and writes the result to a file or stdout.
//! Options come from an optional JSON file (`--config`, the same shape as
//! [`squash_core::MinifyOptions`]) with explicit flags layered on top.

mod config;

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "squash", version, about = "JavaScript minifier")]
pub struct Cli {
    /// Input files, concatenated in order; stdin when none are given.
    pub inputs: Vec<PathBuf>,

    /// Output file; stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON options file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Skip the compressor.
    #[arg(long)]
    pub no_compress: bool,

    /// Skip name mangling.
    #[arg(long)]
    pub no_mangle: bool,

    /// Mangle property names as well.
    #[arg(long)]
    pub mangle_props: bool,

    /// Drop, inline and rename top-level bindings.
    #[arg(long)]
    pub toplevel: bool,

    /// Parse the inputs as ES modules.
    #[arg(long)]
    pub module: bool,

    /// Keep the output working on IE 6-8.
    #[arg(long)]
    pub ie8: bool,

    /// Work around Safari 10 bugs.
    #[arg(long)]
    pub safari10: bool,

    /// Pretty-print the output.
    #[arg(short, long)]
    pub beautify: bool,

    /// Which comments to keep.
    #[arg(long, value_parser = ["none", "some", "all"])]
    pub comments: Option<String>,

    /// Target ECMAScript edition for output syntax.
    #[arg(long)]
    pub ecma: Option<u32>,

    /// Text prepended to the output.
    #[arg(long)]
    pub preamble: Option<String>,

    /// Write a source map to this file.
    #[arg(long)]
    pub source_map: Option<PathBuf>,

    /// Embed the input text in the source map.
    #[arg(long)]
    pub source_map_include_sources: bool,

    /// Source map of the input to compose with.
    #[arg(long)]
    pub in_source_map: Option<PathBuf>,

    /// JSON name cache, read before and written after the run.
    #[arg(long)]
    pub name_cache: Option<PathBuf>,

    /// Print compressor warnings to stderr.
    #[arg(long)]
    pub warn: bool,

    /// Log pipeline stages (overridden by `SQUASH_LOG`).
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("SQUASH_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let options = config::apply_flags(config::load_config(cli.config.as_deref())?, &cli)?;
    let sources = read_inputs(&cli.inputs)?;
    debug!(inputs = sources.len(), "read inputs");

    let out = squash_core::minify(&sources, &options);
    for warning in &out.warnings {
        eprintln!("{warning}");
    }
    if let Some(error) = out.error {
        return Err(error).context("minification failed");
    }

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &out.code).with_context(|| format!("cannot write {}", path.display()))?;
            info!(path = %path.display(), bytes = out.code.len(), "wrote output");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(out.code.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    if let (Some(path), Some(map)) = (&cli.source_map, &out.map) {
        std::fs::write(path, map).with_context(|| format!("cannot write {}", path.display()))?;
    }
    if let (Some(path), Some(cache)) = (&cli.name_cache, &out.name_cache) {
        let json = serde_json::to_string_pretty(cache)?;
        std::fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    }
    Ok(())
}

fn read_inputs(inputs: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if inputs.is_empty() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("cannot read stdin")?;
        return Ok(vec![("stdin".to_string(), text)]);
    }
    inputs
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
            Ok((path.display().to_string(), text))
        })
        .collect()
}
