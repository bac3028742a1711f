//! Compressor configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Toggle
// ─────────────────────────────────────────────────────────────────────────────

/// An option that is either switched on/off wholesale or configured with a
/// record: `"compress": false`, `"compress": true` or `"compress": {…}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle<T> {
    /// `true` enables with the record's defaults, `false` disables.
    Enabled(bool),
    /// Enabled with an explicit record.
    Config(T),
}

impl<T: Default + Clone> Toggle<T> {
    /// The effective record, or `None` when disabled.
    pub fn resolve(&self) -> Option<T> {
        match self {
            Toggle::Enabled(false) => None,
            Toggle::Enabled(true) => Some(T::default()),
            Toggle::Config(c) => Some(c.clone()),
        }
    }

    /// `true` unless explicitly switched off.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Toggle::Enabled(false))
    }
}

impl<T> Default for Toggle<T> {
    fn default() -> Self {
        Toggle::Enabled(true)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CompressOptions
// ─────────────────────────────────────────────────────────────────────────────

/// Every rewrite toggle consulted by the compressor.
///
/// Deserializes from a JSON object; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressOptions {
    /// `true` → `!0`, `false` → `!1`, `!!x` → `x` in boolean context.
    pub booleans: bool,
    /// Substitute single-use variables into the following statement.
    pub collapse_vars: bool,
    /// Negate and simplify comparisons (`!(a === b)` → `a !== b`).
    pub comparisons: bool,
    /// Turn `if` statements into `&&`, `||` and `?:` expressions.
    pub conditionals: bool,
    /// Remove unreachable code.
    pub dead_code: bool,
    /// Remove `console.*` calls.
    pub drop_console: bool,
    /// Remove `debugger;` statements.
    pub drop_debugger: bool,
    /// Fold constant expressions.
    pub evaluate: bool,
    /// Merge `if (x) return …;` into conditional returns.
    pub if_return: bool,
    /// Inlining tier: `0` off, `1` single-use zero-argument functions.
    #[serde(deserialize_with = "bool_or_level")]
    pub inline: u8,
    /// Merge consecutive variable declarations.
    pub join_vars: bool,
    /// Never drop unused function parameters.
    pub keep_fargs: bool,
    /// Keep the names of unused function expressions.
    pub keep_fnames: bool,
    /// Keep the names of unused class expressions.
    pub keep_classnames: bool,
    /// Loop canonicalization (`while` → `for`, `if (x) break` → loop test).
    pub loops: bool,
    /// `(function(){})()` → `!function(){}()` when the value is unused.
    pub negate_iife: bool,
    /// `a["b"]` → `a.b`, quoted object keys unquoted.
    pub properties: bool,
    /// Property reads never have side effects.
    pub pure_getters: bool,
    /// Calls to these functions have no side effects.
    pub pure_funcs: Vec<String>,
    /// Propagate constant values of single-assignment variables.
    pub reduce_vars: bool,
    /// Join consecutive expression statements with the comma operator.
    pub sequences: bool,
    /// Drop expressions whose value is unused and which have no effects.
    pub side_effects: bool,
    /// Prune `switch` statements.
    pub switches: bool,
    /// Treat top-level bindings as local: they may be dropped or inlined.
    pub toplevel: bool,
    /// `typeof x == "undefined"` shortening.
    pub typeofs: bool,
    /// Drop unreferenced bindings.
    pub unused: bool,
    /// Evaluate built-in method calls assuming unmodified built-ins.
    #[serde(rename = "unsafe")]
    pub unsafe_: bool,
    /// Arithmetic rewrites that are exact only up to floating-point rounding.
    pub unsafe_math: bool,
    /// Global names replaced by a literal value.
    pub global_defs: IndexMap<String, serde_json::Value>,
    /// Maximum number of full compression passes.
    pub passes: u32,
    /// Maximum number of expressions joined into one comma sequence.
    pub sequences_limit: usize,
    /// Longest printed literal a constant variable is copied into each of
    /// several references.
    pub reduce_vars_inline_max_len: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        CompressOptions {
            booleans: true,
            collapse_vars: true,
            comparisons: true,
            conditionals: true,
            dead_code: true,
            drop_console: false,
            drop_debugger: true,
            evaluate: true,
            if_return: true,
            inline: 1,
            join_vars: true,
            keep_fargs: true,
            keep_fnames: false,
            keep_classnames: false,
            loops: true,
            negate_iife: true,
            properties: true,
            pure_getters: false,
            pure_funcs: Vec::new(),
            reduce_vars: true,
            sequences: true,
            side_effects: true,
            switches: true,
            toplevel: false,
            typeofs: true,
            unused: true,
            unsafe_: false,
            unsafe_math: false,
            global_defs: IndexMap::new(),
            passes: 2,
            sequences_limit: 200,
            reduce_vars_inline_max_len: 16,
        }
    }
}

fn bool_or_level<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Level {
        Flag(bool),
        Tier(u8),
    }
    Ok(match Level::deserialize(deserializer)? {
        Level::Flag(true) => 1,
        Level::Flag(false) => 0,
        Level::Tier(n) => n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = CompressOptions::default();
        assert_eq!(opts.passes, 2);
        assert_eq!(opts.sequences_limit, 200);
        assert_eq!(opts.inline, 1);
        assert!(!opts.unsafe_);
        assert!(opts.dead_code);
    }

    #[test]
    fn test_deserialize_partial_record() {
        let opts: CompressOptions =
            serde_json::from_str(r#"{"unsafe": true, "inline": false, "passes": 3}"#).unwrap();
        assert!(opts.unsafe_);
        assert_eq!(opts.inline, 0);
        assert_eq!(opts.passes, 3);
        assert!(opts.booleans);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let res: Result<CompressOptions, _> = serde_json::from_str(r#"{"bogus": 1}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_toggle_forms() {
        let off: Toggle<CompressOptions> = serde_json::from_str("false").unwrap();
        assert!(off.resolve().is_none());
        let on: Toggle<CompressOptions> = serde_json::from_str("true").unwrap();
        assert_eq!(on.resolve(), Some(CompressOptions::default()));
        let cfg: Toggle<CompressOptions> = serde_json::from_str(r#"{"toplevel": true}"#).unwrap();
        assert!(cfg.resolve().unwrap().toplevel);
    }

    #[test]
    fn test_global_defs_keep_order() {
        let opts: CompressOptions =
            serde_json::from_str(r#"{"global_defs": {"DEBUG": false, "VERSION": "1.0"}}"#).unwrap();
        let keys: Vec<&str> = opts.global_defs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["DEBUG", "VERSION"]);
    }
}
