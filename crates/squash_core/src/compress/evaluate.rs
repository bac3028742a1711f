//! Compile-time evaluation of constant expressions.
//!
//! [`evaluate`] folds an expression to a primitive [`Value`] when every
//! operand is known: literals, `void`, arithmetic, string concatenation,
//! comparisons, template literals without substitutions of unknown value and
//! references to symbols the compressor proved constant.  With `unsafe`
//! enabled, calls to a small set of built-in methods are evaluated too,
//! assuming the built-ins were not tampered with.
//!
//! A built-in call that would throw at run time (e.g. `"a".repeat(-1)`) is
//! reported as an [`EvalError`] so the caller can warn and leave the
//! expression alone.

use crate::parser::ast::*;
use crate::parser::scanner::Span;
use crate::parser::scope::ScopeTree;

/// Maximum nesting the evaluator descends before giving up.
const MAX_EVAL_DEPTH: usize = 64;

/// Longest string (in UTF-16 units) the evaluator will build.
const MAX_STRING_LEN: usize = 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Value
// ─────────────────────────────────────────────────────────────────────────────

/// A primitive value known at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
}

impl Value {
    /// ToBoolean.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// ToNumber.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Num(n) => *n,
            Value::Str(s) => string_to_number(s),
        }
    }

    /// ToString.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Num(n) => number_to_string(*n),
            Value::Str(s) => s.clone(),
        }
    }

    /// The `typeof` result.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
        }
    }

    /// ToInt32.
    pub fn to_int32(&self) -> i32 {
        to_uint32(self.to_number()) as i32
    }

    /// ToUint32.
    pub fn to_uint32(&self) -> u32 {
        to_uint32(self.to_number())
    }

    fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Build the shortest literal expression for this value.
    ///
    /// With `booleans`, `true`/`false` become `!0`/`!1`.
    pub fn to_expr(&self, loc: Span, booleans: bool) -> Expr {
        match self {
            Value::Undefined => Expr::undefined(loc),
            Value::Null => Expr::Null(NullLit { loc }),
            Value::Bool(b) if booleans => Expr::not(Expr::num(if *b { 0.0 } else { 1.0 }, loc)),
            Value::Bool(b) => Expr::bool(*b, loc),
            Value::Num(n) => number_expr(*n, loc),
            Value::Str(s) => Expr::str(s.clone(), loc),
        }
    }
}

/// A numeric literal expression for any `f64`, including `NaN`, the
/// infinities and negative zero.
pub fn number_expr(n: f64, loc: Span) -> Expr {
    if n.is_nan() {
        return Expr::binary(BinaryOp::Div, Expr::num(0.0, loc), Expr::num(0.0, loc));
    }
    if n.is_infinite() {
        let inf = Expr::binary(BinaryOp::Div, Expr::num(1.0, loc), Expr::num(0.0, loc));
        return if n < 0.0 {
            Expr::unary(UnaryOp::Minus, inf, loc)
        } else {
            inf
        };
    }
    if n < 0.0 || (n == 0.0 && n.is_sign_negative()) {
        return Expr::unary(UnaryOp::Minus, Expr::num(-n, loc), loc);
    }
    Expr::num(n, loc)
}

fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let int = n.trunc() % 4_294_967_296.0;
    let int = if int < 0.0 { int + 4_294_967_296.0 } else { int };
    int as u32
}

/// Number::toString(10): the shortest digits that round-trip, laid out as
/// decimal or exponent notation by magnitude.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let sign = if n < 0.0 { "-" } else { "" };
    let sci = format!("{:e}", n.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let point = exp.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let e = point - 1;
        let exp_sign = if e >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{exp_sign}{}", e.abs())
        } else {
            format!("{first}.{rest}e{exp_sign}{}", e.abs())
        }
    };
    format!("{sign}{body}")
}

/// StringToNumber.
fn string_to_number(s: &str) -> f64 {
    let t = s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if t.is_empty() {
        return 0.0;
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(rest) = t.strip_prefix(prefix) {
            if rest.is_empty() || !rest.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            return rest
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
        }
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if !t.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

/// A constant built-in call that would throw when run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError(pub String);

/// What the evaluator may assume.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalEnv<'a> {
    /// Resolved scopes; enables constant symbols and the `undefined`,
    /// `NaN` and `Infinity` globals.
    pub tree: Option<&'a ScopeTree>,
    /// Evaluate built-in method calls.
    pub unsafe_: bool,
}

/// Evaluate `expr` to a constant, `Ok(None)` when it is not one.
///
/// # Errors
///
/// Returns [`EvalError`] when the expression is a constant built-in call
/// that throws.
pub fn evaluate(expr: &Expr, env: &EvalEnv<'_>) -> Result<Option<Value>, EvalError> {
    eval_depth(expr, env, 0)
}

/// Static truthiness of `expr`, including non-primitive literals that are
/// always truthy (functions, empty arrays and objects, regexps).
pub fn truthiness(expr: &Expr, env: &EvalEnv<'_>) -> Option<bool> {
    if is_object_literal(expr) {
        return Some(true);
    }
    evaluate(expr, env).ok().flatten().map(|v| v.to_boolean())
}

/// Side-effect-free literal forms that always produce a fresh object.
fn is_object_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Fn(_) | Expr::Arrow(_) | Expr::Regexp(_) => true,
        Expr::Array(a) => a.elements.is_empty(),
        Expr::Object(o) => o.properties.is_empty(),
        _ => false,
    }
}

macro_rules! known {
    ($e:expr) => {
        match $e? {
            Some(v) => v,
            None => return Ok(None),
        }
    };
}

fn eval_depth(expr: &Expr, env: &EvalEnv<'_>, depth: usize) -> Result<Option<Value>, EvalError> {
    if depth > MAX_EVAL_DEPTH {
        return Ok(None);
    }
    let d = depth + 1;
    let value = match expr {
        Expr::Null(_) => Value::Null,
        Expr::Bool(b) => Value::Bool(b.value),
        Expr::Num(n) => Value::Num(n.value),
        Expr::Str(s) if s.raw.is_none() => Value::Str(s.value.clone()),
        Expr::Ident(i) => return Ok(eval_ident(i, env, d)),
        Expr::Template(t) => {
            let mut out = String::new();
            for (i, q) in t.quasis.iter().enumerate() {
                let Some(cooked) = &q.cooked else { return Ok(None) };
                out.push_str(cooked);
                if let Some(e) = t.expressions.get(i) {
                    out.push_str(&known!(eval_depth(e, env, d)).to_js_string());
                }
            }
            if utf16_len(&out) > MAX_STRING_LEN {
                return Ok(None);
            }
            Value::Str(out)
        }
        Expr::Unary(u) => return eval_unary(u, env, d),
        Expr::Binary(b) => {
            if matches!(b.op, BinaryOp::In | BinaryOp::Instanceof) {
                return Ok(None);
            }
            let l = known!(eval_depth(&b.left, env, d));
            let r = known!(eval_depth(&b.right, env, d));
            return Ok(binary(b.op, &l, &r));
        }
        Expr::Logical(l) => {
            let left = known!(eval_depth(&l.left, env, d));
            let take_left = match l.op {
                LogicalOp::And => !left.to_boolean(),
                LogicalOp::Or => left.to_boolean(),
                LogicalOp::NullishCoalesce => !left.is_nullish(),
            };
            if take_left {
                left
            } else {
                known!(eval_depth(&l.right, env, d))
            }
        }
        Expr::Conditional(c) => {
            let test = match truthiness(&c.test, env) {
                Some(t) => t,
                None => return Ok(None),
            };
            if !is_object_literal(&c.test) {
                known!(eval_depth(&c.test, env, d));
            }
            let branch = if test { &c.consequent } else { &c.alternate };
            known!(eval_depth(branch, env, d))
        }
        Expr::Sequence(s) => {
            let mut last = None;
            for e in &s.expressions {
                last = Some(known!(eval_depth(e, env, d)));
            }
            match last {
                Some(v) => v,
                None => return Ok(None),
            }
        }
        Expr::Member(m) => return eval_member(m, env, d),
        Expr::Call(c) if env.unsafe_ && !c.optional => return eval_call(c, env, d),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn eval_ident(ident: &Ident, env: &EvalEnv<'_>, depth: usize) -> Option<Value> {
    let tree = env.tree?;
    let def = tree.symbol_of(ident)?;
    if def.undeclared {
        if def.assignments > 0 {
            return None;
        }
        return match def.name.as_str() {
            "undefined" => Some(Value::Undefined),
            "NaN" => Some(Value::Num(f64::NAN)),
            "Infinity" => Some(Value::Num(f64::INFINITY)),
            _ => None,
        };
    }
    let fixed = def.fixed.as_ref()?;
    eval_depth(fixed, env, depth).ok().flatten()
}

fn eval_unary(u: &UnaryExpr, env: &EvalEnv<'_>, depth: usize) -> Result<Option<Value>, EvalError> {
    match u.op {
        UnaryOp::Delete => return Ok(None),
        UnaryOp::Typeof => {
            let ty = match &*u.argument {
                Expr::Fn(_) | Expr::Arrow(_) => Some("function"),
                Expr::BigInt(_) => Some("bigint"),
                e if is_object_literal(e) => Some("object"),
                _ => None,
            };
            if let Some(ty) = ty {
                return Ok(Some(Value::Str(ty.to_string())));
            }
        }
        UnaryOp::Not if is_object_literal(&u.argument) => return Ok(Some(Value::Bool(false))),
        _ => {}
    }
    let v = known!(eval_depth(&u.argument, env, depth));
    Ok(Some(match u.op {
        UnaryOp::Minus => Value::Num(-v.to_number()),
        UnaryOp::Plus => Value::Num(v.to_number()),
        UnaryOp::Not => Value::Bool(!v.to_boolean()),
        UnaryOp::BitNot => Value::Num(f64::from(!v.to_int32())),
        UnaryOp::Typeof => Value::Str(v.type_of().to_string()),
        UnaryOp::Void => Value::Undefined,
        UnaryOp::Delete => return Ok(None),
    }))
}

fn eval_member(m: &MemberExpr, env: &EvalEnv<'_>, depth: usize) -> Result<Option<Value>, EvalError> {
    let prop = match &m.property {
        MemberProp::Ident(i) => i.name.clone(),
        MemberProp::Computed(e) => known!(eval_depth(e, env, depth)).to_js_string(),
        MemberProp::Private(_) => return Ok(None),
    };
    if env.unsafe_
        && let Expr::Ident(obj) = &*m.object
        && obj.name == "Math"
        && env.tree.and_then(|t| t.symbol_of(obj)).is_some_and(|d| d.undeclared)
    {
        let value = match prop.as_str() {
            "PI" => std::f64::consts::PI,
            "E" => std::f64::consts::E,
            "LN2" => std::f64::consts::LN_2,
            "LN10" => std::f64::consts::LN_10,
            "SQRT2" => std::f64::consts::SQRT_2,
            _ => return Ok(None),
        };
        return Ok(Some(Value::Num(value)));
    }
    if env.unsafe_
        && prop == "length"
        && let Expr::Array(a) = &*m.object
    {
        if a.elements.iter().all(|e| e.as_ref().is_some_and(|e| !matches!(e, Expr::Spread(_)))) {
            for e in a.elements.iter().flatten() {
                known!(eval_depth(e, env, depth));
            }
            return Ok(Some(Value::Num(a.elements.len() as f64)));
        }
        return Ok(None);
    }
    let obj = known!(eval_depth(&m.object, env, depth));
    match (&obj, prop.as_str()) {
        (Value::Str(s), "length") => Ok(Some(Value::Num(utf16_len(s) as f64))),
        _ => Ok(None),
    }
}

fn eval_args(args: &[Expr], env: &EvalEnv<'_>, depth: usize) -> Result<Option<Vec<Value>>, EvalError> {
    let mut out = Vec::with_capacity(args.len());
    for a in args {
        if matches!(a, Expr::Spread(_)) {
            return Ok(None);
        }
        out.push(known!(eval_depth(a, env, depth)));
    }
    Ok(Some(out))
}

fn eval_call(c: &CallExpr, env: &EvalEnv<'_>, depth: usize) -> Result<Option<Value>, EvalError> {
    let Expr::Member(m) = &*c.callee else { return Ok(None) };
    let MemberProp::Ident(method) = &m.property else { return Ok(None) };
    let args = known!(eval_args(&c.arguments, env, depth));

    if let Expr::Ident(obj) = &*m.object
        && obj.name == "Math"
        && env.tree.and_then(|t| t.symbol_of(obj)).is_some_and(|d| d.undeclared)
    {
        return Ok(math_call(&method.name, &args).map(Value::Num));
    }
    if let Expr::Array(a) = &*m.object
        && method.name == "join"
    {
        let mut parts = Vec::with_capacity(a.elements.len());
        for el in &a.elements {
            match el {
                None => parts.push(String::new()),
                Some(Expr::Spread(_)) => return Ok(None),
                Some(e) => match known!(eval_depth(e, env, depth)) {
                    Value::Undefined | Value::Null => parts.push(String::new()),
                    v => parts.push(v.to_js_string()),
                },
            }
        }
        let sep = match args.first() {
            None | Some(Value::Undefined) => ",".to_string(),
            Some(v) => v.to_js_string(),
        };
        return Ok(Some(Value::Str(parts.join(&sep))));
    }
    let this = known!(eval_depth(&m.object, env, depth));
    match this {
        Value::Str(s) => string_call(&s, &method.name, &args),
        Value::Num(n) => number_call(n, &method.name, &args),
        _ => Ok(None),
    }
}

fn arg_num(args: &[Value], i: usize, default: f64) -> f64 {
    args.get(i).map_or(default, |v| match v {
        Value::Undefined => default,
        v => v.to_number(),
    })
}

/// ToIntegerOrInfinity clamped into `0..=len`.
fn clamp_index(n: f64, len: usize) -> usize {
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let len_f = len as f64;
    let idx = if n < 0.0 { (len_f + n).max(0.0) } else { n.min(len_f) };
    idx as usize
}

fn string_call(s: &str, method: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let from_units = |u: &[u16]| String::from_utf16_lossy(u);
    let value = match method {
        "charAt" => {
            let i = arg_num(args, 0, 0.0);
            if i < 0.0 || i >= units.len() as f64 || i.is_nan() && units.is_empty() {
                Value::Str(String::new())
            } else {
                let i = if i.is_nan() { 0 } else { i.trunc() as usize };
                Value::Str(from_units(&units[i..=i]))
            }
        }
        "charCodeAt" => {
            let i = arg_num(args, 0, 0.0);
            let i = if i.is_nan() { 0.0 } else { i.trunc() };
            if i < 0.0 || i >= units.len() as f64 {
                Value::Num(f64::NAN)
            } else {
                Value::Num(f64::from(units[i as usize]))
            }
        }
        "indexOf" | "lastIndexOf" | "includes" | "startsWith" | "endsWith" => {
            let needle = args.first().map_or("undefined".to_string(), Value::to_js_string);
            if args.len() > 1 {
                return Ok(None);
            }
            match method {
                "indexOf" => Value::Num(find_units(&units, &needle, false)),
                "lastIndexOf" => Value::Num(find_units(&units, &needle, true)),
                "includes" => Value::Bool(s.contains(needle.as_str())),
                "startsWith" => Value::Bool(s.starts_with(needle.as_str())),
                _ => Value::Bool(s.ends_with(needle.as_str())),
            }
        }
        "slice" => {
            let len = units.len();
            let start = clamp_index(arg_num(args, 0, 0.0), len);
            let end = clamp_index(arg_num(args, 1, len as f64), len);
            Value::Str(if start < end { from_units(&units[start..end]) } else { String::new() })
        }
        "substring" => {
            let len = units.len() as f64;
            let clamp = |n: f64| if n.is_nan() { 0.0 } else { n.trunc().clamp(0.0, len) } as usize;
            let a = clamp(arg_num(args, 0, 0.0));
            let b = clamp(arg_num(args, 1, len));
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            Value::Str(from_units(&units[lo..hi]))
        }
        "toUpperCase" => Value::Str(s.to_uppercase()),
        "toLowerCase" => Value::Str(s.to_lowercase()),
        "trim" => Value::Str(s.trim().to_string()),
        "concat" => {
            let mut out = s.to_string();
            for a in args {
                out.push_str(&a.to_js_string());
            }
            Value::Str(out)
        }
        "repeat" => {
            let n = arg_num(args, 0, 0.0);
            if n < 0.0 || n.is_infinite() {
                return Err(EvalError(format!("Invalid count value: {}", number_to_string(n))));
            }
            let n = if n.is_nan() { 0 } else { n.trunc() as usize };
            if units.len().saturating_mul(n) > MAX_STRING_LEN {
                return Ok(None);
            }
            Value::Str(s.repeat(n))
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn find_units(haystack: &[u16], needle: &str, last: bool) -> f64 {
    let needle: Vec<u16> = needle.encode_utf16().collect();
    if needle.is_empty() {
        return if last { haystack.len() as f64 } else { 0.0 };
    }
    if needle.len() > haystack.len() {
        return -1.0;
    }
    let mut positions = (0..=haystack.len() - needle.len())
        .filter(|&i| haystack[i..i + needle.len()] == needle[..]);
    let found = if last { positions.next_back() } else { positions.next() };
    found.map_or(-1.0, |i| i as f64)
}

fn number_call(n: f64, method: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    match method {
        "toString" if args.is_empty() => Ok(Some(Value::Str(number_to_string(n)))),
        "toFixed" => {
            let digits = arg_num(args, 0, 0.0);
            if !(0.0..=100.0).contains(&digits) {
                return Err(EvalError("toFixed() digits argument must be between 0 and 100".into()));
            }
            // Only integral receivers: no rounding ties to disagree on.
            if n.fract() != 0.0 || n.abs() >= 1e21 {
                return Ok(None);
            }
            Ok(Some(Value::Str(format!("{:.*}", digits as usize, n))))
        }
        _ => Ok(None),
    }
}

fn math_call(method: &str, args: &[Value]) -> Option<f64> {
    let x = arg_num(args, 0, f64::NAN);
    Some(match method {
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "trunc" => x.trunc(),
        "abs" => x.abs(),
        "sqrt" => x.sqrt(),
        "sign" => {
            if x.is_nan() || x == 0.0 {
                x
            } else {
                x.signum()
            }
        }
        "round" => {
            if !x.is_finite() || x == 0.0 {
                x
            } else if (-0.5..0.0).contains(&x) {
                -0.0
            } else {
                (x + 0.5).floor()
            }
        }
        "pow" => js_pow(x, arg_num(args, 1, f64::NAN)),
        "min" | "max" => {
            let mut acc = if method == "min" { f64::INFINITY } else { f64::NEG_INFINITY };
            for a in args {
                let v = a.to_number();
                if v.is_nan() {
                    return Some(f64::NAN);
                }
                acc = if method == "min" { acc.min(v) } else { acc.max(v) };
            }
            acc
        }
        _ => return None,
    })
}

fn js_pow(l: f64, r: f64) -> f64 {
    if r.is_nan() || (l.abs() == 1.0 && r.is_infinite()) {
        f64::NAN
    } else {
        l.powf(r)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

/// Strict equality (`===`).
pub fn strict_equals(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Num(a), Value::Num(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// Abstract equality (`==`) between primitives.
pub fn loose_equals(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
        (Value::Num(_), Value::Num(_))
        | (Value::Str(_), Value::Str(_))
        | (Value::Bool(_), Value::Bool(_)) => strict_equals(l, r),
        _ => l.to_number() == r.to_number(),
    }
}

/// `l < r`, `None` when either side is `NaN`.
fn less_than(l: &Value, r: &Value) -> Option<bool> {
    if let (Value::Str(a), Value::Str(b)) = (l, r) {
        return Some(a.encode_utf16().lt(b.encode_utf16()));
    }
    let (a, b) = (l.to_number(), r.to_number());
    if a.is_nan() || b.is_nan() {
        None
    } else {
        Some(a < b)
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Option<Value> {
    let num = |f: fn(f64, f64) -> f64| Some(Value::Num(f(l.to_number(), r.to_number())));
    let int = |f: fn(i32, i32) -> i32| Some(Value::Num(f64::from(f(l.to_int32(), r.to_int32()))));
    match op {
        BinaryOp::Add => {
            if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
                let s = format!("{}{}", l.to_js_string(), r.to_js_string());
                if utf16_len(&s) > MAX_STRING_LEN {
                    return None;
                }
                Some(Value::Str(s))
            } else {
                num(|a, b| a + b)
            }
        }
        BinaryOp::Sub => num(|a, b| a - b),
        BinaryOp::Mul => num(|a, b| a * b),
        BinaryOp::Div => num(|a, b| a / b),
        BinaryOp::Rem => num(|a, b| a % b),
        BinaryOp::Exp => num(js_pow),
        BinaryOp::BitAnd => int(|a, b| a & b),
        BinaryOp::BitOr => int(|a, b| a | b),
        BinaryOp::BitXor => int(|a, b| a ^ b),
        BinaryOp::Shl => Some(Value::Num(f64::from(l.to_int32().wrapping_shl(r.to_uint32() & 31)))),
        BinaryOp::Shr => Some(Value::Num(f64::from(l.to_int32().wrapping_shr(r.to_uint32() & 31)))),
        BinaryOp::UShr => Some(Value::Num(f64::from(l.to_uint32().wrapping_shr(r.to_uint32() & 31)))),
        BinaryOp::StrictEq => Some(Value::Bool(strict_equals(l, r))),
        BinaryOp::StrictNotEq => Some(Value::Bool(!strict_equals(l, r))),
        BinaryOp::Eq => Some(Value::Bool(loose_equals(l, r))),
        BinaryOp::NotEq => Some(Value::Bool(!loose_equals(l, r))),
        BinaryOp::Lt => Some(Value::Bool(less_than(l, r).unwrap_or(false))),
        BinaryOp::Gt => Some(Value::Bool(less_than(r, l).unwrap_or(false))),
        BinaryOp::LtEq => Some(Value::Bool(less_than(r, l).is_some_and(|gt| !gt))),
        BinaryOp::GtEq => Some(Value::Bool(less_than(l, r).is_some_and(|lt| !lt))),
        BinaryOp::In | BinaryOp::Instanceof => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::{parse, ParseOptions};
    use crate::parser::scope::{resolve, ResolveOptions};

    fn eval_with(src: &str, unsafe_: bool) -> Result<Option<Value>, EvalError> {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        let tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
        let Some(Stmt::Expr(e)) = program.body.last() else { panic!("expected expression") };
        let env = EvalEnv {
            tree: Some(&tree),
            unsafe_,
        };
        evaluate(&e.expr, &env)
    }

    fn eval(src: &str) -> Option<Value> {
        eval_with(src, false).unwrap()
    }

    fn eval_unsafe(src: &str) -> Option<Value> {
        eval_with(src, true).unwrap()
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.5), "0.5");
        assert_eq!(number_to_string(123.456), "123.456");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(1.5e-10), "1.5e-10");
        assert_eq!(number_to_string(-2.5), "-2.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number("  42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12px").is_nan());
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Some(Value::Num(7.0)));
        assert_eq!(eval("7 % -3"), Some(Value::Num(1.0)));
        assert_eq!(eval("2 ** 10"), Some(Value::Num(1024.0)));
        assert_eq!(eval("-1 >>> 28"), Some(Value::Num(15.0)));
        assert_eq!(eval("1 << 33"), Some(Value::Num(2.0)));
        assert_eq!(eval("~5"), Some(Value::Num(-6.0)));
        assert!(matches!(eval("1 ** NaN"), Some(Value::Num(n)) if n.is_nan()));
    }

    #[test]
    fn test_strings_and_templates() {
        assert_eq!(eval("'a' + 1 + 2"), Some(Value::Str("a12".into())));
        assert_eq!(eval("1 + 2 + 'a'"), Some(Value::Str("3a".into())));
        assert_eq!(eval("`x${1 + 1}y`"), Some(Value::Str("x2y".into())));
        assert_eq!(eval("'abc'.length"), Some(Value::Num(3.0)));
        assert_eq!(eval("'' + null"), Some(Value::Str("null".into())));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("1 == '1'"), Some(Value::Bool(true)));
        assert_eq!(eval("null == void 0"), Some(Value::Bool(true)));
        assert_eq!(eval("null == 0"), Some(Value::Bool(false)));
        assert_eq!(eval("'b' > 'a'"), Some(Value::Bool(true)));
        assert_eq!(eval("NaN <= 1"), Some(Value::Bool(false)));
        assert_eq!(eval("typeof 'x'"), Some(Value::Str("string".into())));
        assert_eq!(eval("typeof function(){}"), Some(Value::Str("function".into())));
    }

    #[test]
    fn test_logical_and_conditional() {
        assert_eq!(eval("0 || 'x'"), Some(Value::Str("x".into())));
        assert_eq!(eval("null ?? 5"), Some(Value::Num(5.0)));
        assert_eq!(eval("1 ? 'a' : 'b'"), Some(Value::Str("a".into())));
        assert_eq!(eval("![] "), Some(Value::Bool(false)));
        assert_eq!(eval("x + 1"), None);
        assert_eq!(eval("f() && 1"), None);
    }

    #[test]
    fn test_shadowed_globals_not_folded() {
        assert!(matches!(eval("NaN"), Some(Value::Num(n)) if n.is_nan()));
        assert_eq!(eval("var undefined = 1; undefined"), None);
    }

    #[test]
    fn test_unsafe_builtins() {
        assert_eq!(eval("'abc'.charAt(1)"), None);
        assert_eq!(eval_unsafe("'abc'.charAt(1)"), Some(Value::Str("b".into())));
        assert_eq!(eval_unsafe("'hello'.slice(-3)"), Some(Value::Str("llo".into())));
        assert_eq!(eval_unsafe("'hello'.indexOf('l')"), Some(Value::Num(2.0)));
        assert_eq!(eval_unsafe("Math.max(1, 5, 3)"), Some(Value::Num(5.0)));
        assert_eq!(eval_unsafe("Math.round(-2.5)"), Some(Value::Num(-2.0)));
        assert_eq!(eval_unsafe("[1, null, 'a'].join('-')"), Some(Value::Str("1--a".into())));
        assert_eq!(eval_unsafe("(5).toFixed(2)"), Some(Value::Str("5.00".into())));
        assert_eq!(eval_unsafe("var Math = {}; Math.max(1, 2)"), None);
    }

    #[test]
    fn test_throwing_builtin_is_error() {
        let err = eval_with("'a'.repeat(-1)", true).unwrap_err();
        assert!(err.0.contains("Invalid count value"));
        assert!(eval_with("(1).toFixed(101)", true).is_err());
    }

    #[test]
    fn test_to_expr_shapes() {
        let loc = Span::dummy();
        assert!(Value::Undefined.to_expr(loc, true).is_undefined());
        assert!(matches!(Value::Bool(true).to_expr(loc, true), Expr::Unary(_)));
        assert!(matches!(Value::Bool(true).to_expr(loc, false), Expr::Bool(_)));
        assert!(matches!(Value::Num(-1.0).to_expr(loc, true), Expr::Unary(_)));
        assert!(matches!(Value::Num(f64::INFINITY).to_expr(loc, true), Expr::Binary(_)));
    }
}
