//! Source-map plumbing.
//!
//! The printer reports mappings through the [`SourceMapSink`] trait and
//! never encodes anything itself.  [`OxcSourceMap`] is the sink backed by
//! `oxc_sourcemap`; it can compose every mapping with an [`InputSourceMap`]
//! so the result points at the sources the input was generated from.

use oxc_sourcemap::{SourceMap, SourceMapBuilder};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::{SquashError, SquashResult};

/// Receiver of the position mappings produced while printing.
///
/// Lines are 1-based and columns 0-based on both sides.
pub trait SourceMapSink {
    /// Record that `generated_line:generated_col` came from
    /// `source:original_line:original_col`.
    fn add(
        &mut self,
        source: &str,
        generated_line: u32,
        generated_col: u32,
        original_line: u32,
        original_col: u32,
        name: Option<&str>,
    );

    /// The accumulated map, serialized as JSON.
    fn get(&mut self) -> String;
}

/// A position in an original source, as found through an input map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPosition {
    /// Original source name.
    pub source: String,
    /// 1-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
    /// Original identifier name, if recorded.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Mapping {
    dst: (u32, u32),
    src: (u32, u32),
    source: Option<u32>,
    name: Option<u32>,
}

/// A decoded source map the input was produced with.
pub struct InputSourceMap {
    map: SourceMap,
    /// Every mapping, sorted by generated position.
    index: Vec<Mapping>,
}

impl std::fmt::Debug for InputSourceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSourceMap")
            .field("tokens", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl InputSourceMap {
    /// Decode a JSON source map.
    ///
    /// # Errors
    ///
    /// Returns [`SquashError::SourceMap`] when the text is not a valid map.
    pub fn from_json(json: &str) -> SquashResult<Self> {
        let map = SourceMap::from_json_string(json).map_err(|e| SquashError::SourceMap(format!("{e:?}")))?;
        let mut index: Vec<Mapping> = map
            .get_tokens()
            .map(|t| Mapping {
                dst: (t.get_dst_line(), t.get_dst_col()),
                src: (t.get_src_line(), t.get_src_col()),
                source: t.get_source_id(),
                name: t.get_name_id(),
            })
            .collect();
        index.sort_by_key(|m| m.dst);
        Ok(InputSourceMap { map, index })
    }

    /// Where `line:column` of the generated file came from: the closest
    /// mapping at or before the position on the same line.
    pub fn original_position_for(&self, line: u32, column: u32) -> Option<OriginalPosition> {
        let line = line.checked_sub(1)?;
        let after = self.index.partition_point(|m| m.dst <= (line, column));
        let found = self.index.get(after.checked_sub(1)?)?;
        if found.dst.0 != line {
            return None;
        }
        let source = found.source.and_then(|id| self.map.get_source(id))?;
        Some(OriginalPosition {
            source: source.to_string(),
            line: found.src.0 + 1,
            column: found.src.1,
            name: found.name.and_then(|id| self.map.get_name(id)).map(|n| n.to_string()),
        })
    }
}

/// [`SourceMapSink`] that builds an `oxc_sourcemap` map.
pub struct OxcSourceMap {
    builder: SourceMapBuilder,
    sources: FxHashMap<String, u32>,
    names: FxHashMap<String, u32>,
    contents: FxHashMap<String, String>,
    input: Option<InputSourceMap>,
    last: Option<(u32, u32)>,
}

impl OxcSourceMap {
    /// A sink for output file `file` (the map's `file` field), if known.
    pub fn new(file: Option<&str>) -> Self {
        let mut builder = SourceMapBuilder::default();
        if let Some(file) = file {
            builder.set_file(file);
        }
        OxcSourceMap {
            builder,
            sources: FxHashMap::default(),
            names: FxHashMap::default(),
            contents: FxHashMap::default(),
            input: None,
            last: None,
        }
    }

    /// Embed the text of each source in `sourcesContent`.
    pub fn with_contents(mut self, contents: impl IntoIterator<Item = (String, String)>) -> Self {
        self.contents.extend(contents);
        self
    }

    /// Route every mapping through `input` before recording it.
    pub fn with_input_map(mut self, input: InputSourceMap) -> Self {
        self.input = Some(input);
        self
    }

    fn source_id(&mut self, source: &str) -> u32 {
        if let Some(id) = self.sources.get(source) {
            return *id;
        }
        let content = self.contents.get(source).map(String::as_str).unwrap_or("");
        let id = self.builder.set_source_and_content(source, content);
        self.sources.insert(source.to_string(), id);
        id
    }

    fn name_id(&mut self, name: &str) -> u32 {
        if let Some(id) = self.names.get(name) {
            return *id;
        }
        let id = self.builder.add_name(name);
        self.names.insert(name.to_string(), id);
        id
    }
}

impl SourceMapSink for OxcSourceMap {
    fn add(
        &mut self,
        source: &str,
        generated_line: u32,
        generated_col: u32,
        original_line: u32,
        original_col: u32,
        name: Option<&str>,
    ) {
        if self.last == Some((generated_line, generated_col)) || generated_line == 0 {
            return;
        }
        self.last = Some((generated_line, generated_col));
        let (source, line, col, name) = match &self.input {
            Some(input) => match input.original_position_for(original_line, original_col) {
                Some(pos) => (pos.source, pos.line, pos.column, pos.name.or(name.map(str::to_string))),
                None => return,
            },
            None => (source.to_string(), original_line, original_col, name.map(str::to_string)),
        };
        let src_id = self.source_id(&source);
        let name_id = name.map(|n| self.name_id(&n));
        self.builder.add_token(
            generated_line - 1,
            generated_col,
            line.saturating_sub(1),
            col,
            Some(src_id),
            name_id,
        );
    }

    fn get(&mut self) -> String {
        let builder = std::mem::take(&mut self.builder);
        let map = builder.into_sourcemap();
        trace!(sources = self.sources.len(), "source map built");
        map.to_json_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_produces_json_map() {
        let mut sink = OxcSourceMap::new(Some("out.js"));
        sink.add("in.js", 1, 0, 1, 0, None);
        sink.add("in.js", 1, 4, 2, 2, Some("foo"));
        let json = sink.get();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 3);
        assert_eq!(value["sources"][0], "in.js");
        assert_eq!(value["names"][0], "foo");
        assert_eq!(value["file"], "out.js");
    }

    #[test]
    fn test_duplicate_positions_ignored() {
        let mut sink = OxcSourceMap::new(None);
        sink.add("a.js", 1, 0, 1, 0, None);
        sink.add("a.js", 1, 0, 5, 0, None);
        let json = sink.get();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mappings"], "AAAA");
    }

    #[test]
    fn test_input_map_lookup() {
        let mut first = OxcSourceMap::new(None);
        first.add("orig.ts", 1, 0, 10, 2, Some("x"));
        let input = InputSourceMap::from_json(&first.get()).unwrap();
        let pos = input.original_position_for(1, 0).unwrap();
        assert_eq!(pos.source, "orig.ts");
        assert_eq!((pos.line, pos.column), (10, 2));
        assert_eq!(pos.name.as_deref(), Some("x"));
    }

    #[test]
    fn test_bad_input_map_rejected() {
        assert!(matches!(
            InputSourceMap::from_json("not a map"),
            Err(SquashError::SourceMap(_))
        ));
    }
}
