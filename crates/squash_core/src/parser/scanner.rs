//! ES2022+ JavaScript lexer (scanner).
//!
//! See [`Scanner`] for the main entry point.  The scanner decodes literal
//! values eagerly (string escapes, numeric radices, template cooked text) so
//! later stages never touch raw source again, and attaches every skipped
//! comment to the token that follows it.

use crate::error::{SquashError, SquashResult};

// ─────────────────────────────────────────────────────────────────────────────
// Position / Span
// ─────────────────────────────────────────────────────────────────────────────

/// A byte offset + line/column location in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct Position {
    /// Byte offset from the beginning of the source string.
    pub offset: usize,
    /// 1-based line number (incremented on every *LineTerminator*).
    pub line: u32,
    /// 0-based column number, measured in Unicode scalar values.
    pub column: u32,
}

/// A half-open `[start, end)` source span inside one input unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Inclusive start of the span.
    pub start: Position,
    /// Exclusive end of the span.
    pub end: Position,
    /// Index of the input unit (see `Program::files`).
    pub file: u32,
}

impl Span {
    /// A span that points nowhere; used for synthesized nodes.
    pub fn dummy() -> Self {
        Span::default()
    }

    /// `true` for spans produced by [`Span::dummy`].
    pub fn is_dummy(&self) -> bool {
        self.start.line == 0
    }

    /// The span covering `self` through `other`.
    pub fn to(self, other: Span) -> Span {
        if self.is_dummy() {
            return other;
        }
        Span {
            start: self.start,
            end: if other.is_dummy() { self.end } else { other.end },
            file: self.file,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────────────

/// Every syntactic category the scanner can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ── Numeric literals ──────────────────────────────────────────────────
    /// `42`, `0x2A`, `1e3`, `017` …
    NumericLiteral,
    /// `42n`
    BigIntLiteral,

    // ── String literals ───────────────────────────────────────────────────
    /// `"…"` or `'…'`
    StringLiteral,

    // ── Template literals ─────────────────────────────────────────────────
    /// `` `…` `` with no substitutions.
    NoSubstitutionTemplate,
    /// `` `…${ ``
    TemplateHead,
    /// `}…${`
    TemplateMiddle,
    /// `` }…` ``
    TemplateTail,

    // ── Regular-expression literals ───────────────────────────────────────
    /// `/pattern/flags`
    RegExpLiteral,

    // ── Identifiers ───────────────────────────────────────────────────────
    /// Plain identifier (may have been written with unicode escapes).
    Identifier,
    /// `#name` inside a class body.
    PrivateIdentifier,

    // ── Reserved words ────────────────────────────────────────────────────
    Await,
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Null,
    Of,
    Return,
    Static,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    Yield,

    // ── Contextual keywords ───────────────────────────────────────────────
    Async,
    From,
    As,
    Get,
    Set,
    Target,
    Meta,

    // ── Punctuators ───────────────────────────────────────────────────────
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Dot,
    DotDotDot,
    Semicolon,
    Comma,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    EqualEqual,
    BangEqual,
    EqualEqualEqual,
    BangEqualEqual,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    LessLess,
    GreaterGreater,
    GreaterGreaterGreater,
    Ampersand,
    Pipe,
    Caret,
    Bang,
    Tilde,
    AmpersandAmpersand,
    PipePipe,
    QuestionQuestion,
    Question,
    Colon,
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    StarStarEqual,
    SlashEqual,
    PercentEqual,
    LessLessEqual,
    GreaterGreaterEqual,
    GreaterGreaterGreaterEqual,
    AmpersandEqual,
    PipeEqual,
    CaretEqual,
    AmpersandAmpersandEqual,
    PipePipeEqual,
    QuestionQuestionEqual,
    Arrow,
    QuestionDot,

    // ── End of file ───────────────────────────────────────────────────────
    Eof,
}

impl TokenKind {
    /// Source spelling of keyword and punctuator kinds; a category name for
    /// the literal kinds.  Used in diagnostics and for keywords appearing in
    /// property-name position.
    pub fn as_str(self) -> &'static str {
        use TokenKind::*;
        match self {
            NumericLiteral | BigIntLiteral => "number",
            StringLiteral => "string",
            NoSubstitutionTemplate | TemplateHead | TemplateMiddle | TemplateTail => "template",
            RegExpLiteral => "regexp",
            Identifier => "name",
            PrivateIdentifier => "private name",
            Await => "await",
            Break => "break",
            Case => "case",
            Catch => "catch",
            Class => "class",
            Const => "const",
            Continue => "continue",
            Debugger => "debugger",
            Default => "default",
            Delete => "delete",
            Do => "do",
            Else => "else",
            Enum => "enum",
            Export => "export",
            Extends => "extends",
            False => "false",
            Finally => "finally",
            For => "for",
            Function => "function",
            If => "if",
            Import => "import",
            In => "in",
            Instanceof => "instanceof",
            Let => "let",
            New => "new",
            Null => "null",
            Of => "of",
            Return => "return",
            Static => "static",
            Super => "super",
            Switch => "switch",
            This => "this",
            Throw => "throw",
            True => "true",
            Try => "try",
            Typeof => "typeof",
            Var => "var",
            Void => "void",
            While => "while",
            With => "with",
            Yield => "yield",
            Async => "async",
            From => "from",
            As => "as",
            Get => "get",
            Set => "set",
            Target => "target",
            Meta => "meta",
            LeftBrace => "{",
            RightBrace => "}",
            LeftParen => "(",
            RightParen => ")",
            LeftBracket => "[",
            RightBracket => "]",
            Dot => ".",
            DotDotDot => "...",
            Semicolon => ";",
            Comma => ",",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            EqualEqual => "==",
            BangEqual => "!=",
            EqualEqualEqual => "===",
            BangEqualEqual => "!==",
            Plus => "+",
            Minus => "-",
            Star => "*",
            StarStar => "**",
            Slash => "/",
            Percent => "%",
            PlusPlus => "++",
            MinusMinus => "--",
            LessLess => "<<",
            GreaterGreater => ">>",
            GreaterGreaterGreater => ">>>",
            Ampersand => "&",
            Pipe => "|",
            Caret => "^",
            Bang => "!",
            Tilde => "~",
            AmpersandAmpersand => "&&",
            PipePipe => "||",
            QuestionQuestion => "??",
            Question => "?",
            Colon => ":",
            Equal => "=",
            PlusEqual => "+=",
            MinusEqual => "-=",
            StarEqual => "*=",
            StarStarEqual => "**=",
            SlashEqual => "/=",
            PercentEqual => "%=",
            LessLessEqual => "<<=",
            GreaterGreaterEqual => ">>=",
            GreaterGreaterGreaterEqual => ">>>=",
            AmpersandEqual => "&=",
            PipeEqual => "|=",
            CaretEqual => "^=",
            AmpersandAmpersandEqual => "&&=",
            PipePipeEqual => "||=",
            QuestionQuestionEqual => "??=",
            Arrow => "=>",
            QuestionDot => "?.",
            Eof => "end of input",
        }
    }

    /// `true` for reserved and contextual keywords.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Await
                | Break
                | Case
                | Catch
                | Class
                | Const
                | Continue
                | Debugger
                | Default
                | Delete
                | Do
                | Else
                | Enum
                | Export
                | Extends
                | False
                | Finally
                | For
                | Function
                | If
                | Import
                | In
                | Instanceof
                | Let
                | New
                | Null
                | Of
                | Return
                | Static
                | Super
                | Switch
                | This
                | Throw
                | True
                | Try
                | Typeof
                | Var
                | Void
                | While
                | With
                | Yield
                | Async
                | From
                | As
                | Get
                | Set
                | Target
                | Meta
        )
    }

    /// `true` for words that are only keywords in particular positions and
    /// otherwise behave as plain identifiers.
    pub fn is_contextual(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Async | From | As | Get | Set | Target | Meta | Of | Let | Static | Yield | Await
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenValue / Comment
// ─────────────────────────────────────────────────────────────────────────────

/// The payload value associated with a [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// No semantic value (punctuators, reserved words, EOF, …).
    None,
    /// Decoded identifier name or cooked string value.
    Str(String),
    /// A string whose cooked value contains a lone surrogate; `cooked` is the
    /// lossy decoding and `raw` the literal as written, quotes included.
    LossyStr {
        /// Lossy cooked text.
        cooked: String,
        /// Source text of the literal.
        raw: String,
    },
    /// Template chunk.  `cooked` is `None` when the chunk contains an escape
    /// that is only legal in tagged templates.
    Template {
        /// Cooked text.
        cooked: Option<String>,
        /// Raw text with line terminators normalised to `\n`.
        raw: String,
    },
    /// Regular-expression body and flags.
    Regex {
        /// Text between the slashes.
        pattern: String,
        /// Flag letters.
        flags: String,
    },
    /// Parsed numeric value for [`TokenKind::NumericLiteral`].
    Number(f64),
    /// Digits of a [`TokenKind::BigIntLiteral`] (radix prefix kept, separators
    /// and the `n` suffix removed).
    BigInt(String),
}

/// The two comment syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// …`
    Line,
    /// `/* … */`
    Block,
}

/// A comment skipped by the scanner, kept for the printer and for
/// annotation detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Line or block comment.
    pub kind: CommentKind,
    /// Text between the delimiters.
    pub text: String,
    /// Location, delimiters included.
    pub span: Span,
}

impl Comment {
    /// `true` for comments that carry license text (`/*!`, `@license`,
    /// `@preserve`, `@cc_on`).
    pub fn is_license(&self) -> bool {
        (self.kind == CommentKind::Block && self.text.starts_with('!'))
            || self.text.contains("@license")
            || self.text.contains("@preserve")
            || self.text.contains("@cc_on")
    }

    /// `true` for `@__PURE__` / `#__PURE__` call annotations.
    pub fn is_pure_annotation(&self) -> bool {
        self.kind == CommentKind::Block
            && (self.text.contains("@__PURE__") || self.text.contains("#__PURE__"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────────────

/// A single lexical token produced by the [`Scanner`].
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The syntactic category.
    pub kind: TokenKind,
    /// The associated value, if any.
    pub value: TokenValue,
    /// Source location of this token.
    pub span: Span,
    /// `true` when at least one *LineTerminator* appeared between the previous
    /// token and this one (including inside a skipped block comment).
    ///
    /// The parser uses this flag for Automatic Semicolon Insertion (ASI).
    pub had_line_terminator_before: bool,
    /// Comments skipped between the previous token and this one.
    pub comments_before: Vec<Comment>,
}

impl Token {
    /// Identifier name, cooked string value or keyword spelling.
    pub fn text(&self) -> &str {
        match &self.value {
            TokenValue::Str(s) => s,
            TokenValue::LossyStr { cooked, .. } => cooked,
            _ => self.kind.as_str(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Character-classification helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `true` for ES *LineTerminator* code points.
pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Returns `true` for ES *WhiteSpace* **or** *LineTerminator* characters.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t'                      // CHARACTER TABULATION
        | '\x0B'                  // LINE TABULATION
        | '\x0C'                  // FORM FEED
        | ' '                     // SPACE
        | '\u{00A0}'              // NO-BREAK SPACE
        | '\u{FEFF}'              // ZERO WIDTH NO-BREAK SPACE (BOM)
        | '\u{1680}'              // OGHAM SPACE MARK
        | '\u{2000}'
            ..='\u{200A}' // EN QUAD … HAIR SPACE
        | '\u{202F}'              // NARROW NO-BREAK SPACE
        | '\u{205F}'              // MEDIUM MATHEMATICAL SPACE
        | '\u{3000}'              // IDEOGRAPHIC SPACE
        | '\n'
        | '\r'
        | '\u{2028}'
        | '\u{2029}'
    )
}

/// Returns `true` for characters that may *start* a JS identifier.
pub fn is_id_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

/// Returns `true` for characters that may *continue* a JS identifier.
pub fn is_id_continue(c: char) -> bool {
    c == '$' || c == '_' || c == '\u{200C}' || c == '\u{200D}' || c.is_alphanumeric()
}

/// `true` when `name` is spelled as a valid identifier name (keywords
/// included).
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_id_start(c) => chars.all(is_id_continue),
        _ => false,
    }
}

/// `true` for words that can never be used as a binding or reference name.
pub fn is_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "enum"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "new"
            | "null"
            | "return"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
    )
}

/// Map an identifier string to a reserved-word/contextual-keyword
/// [`TokenKind`], or return `None` for plain identifiers.
fn keyword_kind(s: &str) -> Option<TokenKind> {
    match s {
        "await" => Some(TokenKind::Await),
        "break" => Some(TokenKind::Break),
        "case" => Some(TokenKind::Case),
        "catch" => Some(TokenKind::Catch),
        "class" => Some(TokenKind::Class),
        "const" => Some(TokenKind::Const),
        "continue" => Some(TokenKind::Continue),
        "debugger" => Some(TokenKind::Debugger),
        "default" => Some(TokenKind::Default),
        "delete" => Some(TokenKind::Delete),
        "do" => Some(TokenKind::Do),
        "else" => Some(TokenKind::Else),
        "enum" => Some(TokenKind::Enum),
        "export" => Some(TokenKind::Export),
        "extends" => Some(TokenKind::Extends),
        "false" => Some(TokenKind::False),
        "finally" => Some(TokenKind::Finally),
        "for" => Some(TokenKind::For),
        "function" => Some(TokenKind::Function),
        "if" => Some(TokenKind::If),
        "import" => Some(TokenKind::Import),
        "in" => Some(TokenKind::In),
        "instanceof" => Some(TokenKind::Instanceof),
        "let" => Some(TokenKind::Let),
        "new" => Some(TokenKind::New),
        "null" => Some(TokenKind::Null),
        "of" => Some(TokenKind::Of),
        "return" => Some(TokenKind::Return),
        "static" => Some(TokenKind::Static),
        "super" => Some(TokenKind::Super),
        "switch" => Some(TokenKind::Switch),
        "this" => Some(TokenKind::This),
        "throw" => Some(TokenKind::Throw),
        "true" => Some(TokenKind::True),
        "try" => Some(TokenKind::Try),
        "typeof" => Some(TokenKind::Typeof),
        "var" => Some(TokenKind::Var),
        "void" => Some(TokenKind::Void),
        "while" => Some(TokenKind::While),
        "with" => Some(TokenKind::With),
        "yield" => Some(TokenKind::Yield),
        "async" => Some(TokenKind::Async),
        "from" => Some(TokenKind::From),
        "as" => Some(TokenKind::As),
        "get" => Some(TokenKind::Get),
        "set" => Some(TokenKind::Set),
        "target" => Some(TokenKind::Target),
        "meta" => Some(TokenKind::Meta),
        _ => None,
    }
}

/// Returns `true` when a `/` should open a regular-expression literal rather
/// than act as a division operator, given the most recent significant token.
///
/// `/` is *division* only after tokens that end a value.  The parser corrects
/// the remaining ambiguous cases with [`Scanner::rescan_as_regexp`] and
/// [`Scanner::rescan_as_division`].
fn slash_is_regexp(last: Option<TokenKind>) -> bool {
    match last {
        None => true,
        Some(k) => !(k.is_contextual()
            || matches!(
                k,
                TokenKind::Identifier
                    | TokenKind::PrivateIdentifier
                    | TokenKind::NumericLiteral
                    | TokenKind::BigIntLiteral
                    | TokenKind::StringLiteral
                    | TokenKind::NoSubstitutionTemplate
                    | TokenKind::TemplateTail
                    | TokenKind::RegExpLiteral
                    | TokenKind::RightParen
                    | TokenKind::RightBracket
                    | TokenKind::PlusPlus
                    | TokenKind::MinusMinus
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::Null
                    | TokenKind::This
                    | TokenKind::Super
            )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

/// JavaScript lexer.
///
/// Produces a stream of [`Token`]s from a UTF-8 source string.  Call
/// [`Scanner::next_token`] repeatedly until a token with
/// [`TokenKind::Eof`] is returned.  The scanner is cheap to clone, which is
/// how the parser performs speculative lookahead.
///
/// # Example
///
/// ```
/// use squash_core::parser::scanner::{Scanner, TokenKind};
///
/// let mut sc = Scanner::new("let x = 42;");
/// loop {
///     let tok = sc.next_token().unwrap();
///     if tok.kind == TokenKind::Eof { break; }
///     println!("{:?}", tok.kind);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Scanner<'src> {
    /// The complete source string.
    source: &'src str,
    /// Current byte position within `source`.
    pos: usize,
    /// Current 1-based line number.
    line: u32,
    /// Current 0-based column number.
    column: u32,
    /// Index of the input unit, copied into every span.
    file: u32,
    /// Stack of `brace_depth` values recorded when entering each template
    /// substitution (`` `…${ ``).  When we see `}` and `brace_depth` equals
    /// the value at the top of this stack, the `}` closes the substitution.
    template_stack: Vec<usize>,
    /// Nesting depth of plain `{…}` braces (not template-substitution openers).
    brace_depth: usize,
    /// The most recent *significant* token kind.  Used for regexp / division
    /// disambiguation.
    last_significant_kind: Option<TokenKind>,
    /// Strict-mode code rejects legacy octal literals and escapes.
    strict: bool,
    /// `#!` line at the very start of the input, without the newline.
    shebang: Option<String>,
}

impl<'src> Scanner<'src> {
    /// Create a new scanner for the given UTF-8 source string.
    pub fn new(source: &'src str) -> Self {
        Self::with_file(source, 0)
    }

    /// Create a scanner whose spans carry the input-unit index `file`.
    pub fn with_file(source: &'src str, file: u32) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 0,
            file,
            template_stack: Vec::new(),
            brace_depth: 0,
            last_significant_kind: None,
            strict: false,
            shebang: None,
        }
    }

    /// Returns `true` when all input has been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Enable or disable strict-mode lexing.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Whether strict-mode lexing is active.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// The `#!` line, if the input started with one.
    pub fn take_shebang(&mut self) -> Option<String> {
        self.shebang.take()
    }

    /// The complete source text.
    pub fn source(&self) -> &'src str {
        self.source
    }

    // ── Low-level character helpers ─────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut it = self.source[self.pos..].chars();
        it.next();
        it.next()
    }

    fn peek3(&self) -> Option<char> {
        let mut it = self.source[self.pos..].chars();
        it.next();
        it.next();
        it.next()
    }

    /// Advance past the current character and update line/column tracking.
    ///
    /// `\r\n` is treated as a single line terminator; the `\n` is consumed
    /// automatically so callers never see a stray `\r`.  Returns `'\0'` at
    /// end of input.
    fn advance(&mut self) -> char {
        let Some(ch) = self.peek() else {
            return '\0';
        };
        self.pos += ch.len_utf8();
        match ch {
            '\r' => {
                if self.source[self.pos..].starts_with('\n') {
                    self.pos += 1;
                }
                self.line += 1;
                self.column = 0;
            }
            '\n' | '\u{2028}' | '\u{2029}' => {
                self.line += 1;
                self.column = 0;
            }
            _ => {
                self.column += 1;
            }
        }
        ch
    }

    fn current_pos(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn reset_to(&mut self, pos: Position) {
        self.pos = pos.offset;
        self.line = pos.line;
        self.column = pos.column;
    }

    fn span_from(&self, start: Position) -> Span {
        Span {
            start,
            end: self.current_pos(),
            file: self.file,
        }
    }

    fn error_here(&self, message: impl Into<String>) -> SquashError {
        SquashError::lexical(message, self.current_pos())
    }

    // ── Whitespace and comments ─────────────────────────────────────────────

    /// Consume whitespace and comments.  Returns whether a line terminator was
    /// crossed, plus the comments that were skipped.
    fn skip_trivia(&mut self) -> SquashResult<(bool, Vec<Comment>)> {
        let mut had_lt = false;
        let mut comments = Vec::new();
        if self.pos == 0 && self.source.starts_with("#!") {
            let end = self.source.find(is_line_terminator).unwrap_or(self.source.len());
            self.shebang = Some(self.source[2..end].to_string());
            while self.pos < end {
                self.advance();
            }
        }
        loop {
            match self.peek() {
                Some(c) if is_js_whitespace(c) => {
                    if is_line_terminator(c) {
                        had_lt = true;
                    }
                    self.advance();
                }
                Some('/') if self.peek2() == Some('/') => {
                    let start = self.current_pos();
                    self.advance();
                    self.advance();
                    let text_start = self.pos;
                    while matches!(self.peek(), Some(c) if !is_line_terminator(c)) {
                        self.advance();
                    }
                    comments.push(Comment {
                        kind: CommentKind::Line,
                        text: self.source[text_start..self.pos].to_string(),
                        span: self.span_from(start),
                    });
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.current_pos();
                    self.advance();
                    self.advance();
                    let text_start = self.pos;
                    loop {
                        match self.peek() {
                            None => {
                                return Err(SquashError::lexical(
                                    "Unterminated multiline comment",
                                    start,
                                ));
                            }
                            Some('*') if self.peek2() == Some('/') => {
                                let text = self.source[text_start..self.pos].to_string();
                                self.advance();
                                self.advance();
                                comments.push(Comment {
                                    kind: CommentKind::Block,
                                    text,
                                    span: self.span_from(start),
                                });
                                break;
                            }
                            Some(ch) => {
                                if is_line_terminator(ch) {
                                    had_lt = true;
                                }
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok((had_lt, comments))
    }

    // ── Digit-run helpers ───────────────────────────────────────────────────

    fn scan_digits(&mut self, radix: u32) {
        while matches!(self.peek(), Some(c) if c.is_digit(radix) || c == '_') {
            self.advance();
        }
    }

    // ── String / template escape helper ─────────────────────────────────────

    fn scan_hex_value(&mut self, count: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let d = self.peek()?.to_digit(16)?;
            self.advance();
            value = value * 16 + d;
        }
        Some(value)
    }

    /// Consume `\u` escape body (after the `u`) and return the code point.
    fn scan_unicode_escape_value(&mut self) -> Option<u32> {
        if self.peek() == Some('{') {
            self.advance();
            let mut value = 0u32;
            let mut count = 0usize;
            while let Some(d) = self.peek().and_then(|c| c.to_digit(16)) {
                self.advance();
                value = value.checked_mul(16)?.checked_add(d)?;
                count += 1;
            }
            if count == 0 || value > 0x10FFFF || self.peek() != Some('}') {
                return None;
            }
            self.advance();
            Some(value)
        } else {
            self.scan_hex_value(4)
        }
    }

    /// Decode one escape sequence starting *after* the leading `\`, pushing
    /// UTF-16 code units onto `out`.
    ///
    /// `template` forbids legacy octal escapes; the error is reported as
    /// `Ok(false)` so tagged templates can keep an undefined cooked value.
    fn scan_escape_sequence(&mut self, out: &mut Vec<u16>, template: bool) -> SquashResult<bool> {
        let esc_start = self.current_pos();
        let Some(c) = self.peek() else {
            return Err(self.error_here("Unterminated escape sequence"));
        };
        self.advance();
        let push_char = |out: &mut Vec<u16>, ch: char| {
            let mut buf = [0u16; 2];
            out.extend_from_slice(ch.encode_utf16(&mut buf));
        };
        match c {
            'n' => out.push(0x0A),
            't' => out.push(0x09),
            'r' => out.push(0x0D),
            'b' => out.push(0x08),
            'f' => out.push(0x0C),
            'v' => out.push(0x0B),
            '\r' | '\n' | '\u{2028}' | '\u{2029}' => {}
            'x' => match self.scan_hex_value(2) {
                Some(v) => out.push(v as u16),
                None if template => return Ok(false),
                None => {
                    return Err(SquashError::lexical("Invalid hex-character pattern", esc_start));
                }
            },
            'u' => match self.scan_unicode_escape_value() {
                Some(v) if v > 0xFFFF => match char::from_u32(v) {
                    Some(ch) => push_char(out, ch),
                    None => return Err(SquashError::lexical("Invalid Unicode escape", esc_start)),
                },
                Some(v) => out.push(v as u16),
                None if template => return Ok(false),
                None => return Err(SquashError::lexical("Invalid Unicode escape", esc_start)),
            },
            '0' if !matches!(self.peek(), Some('0'..='9')) => out.push(0),
            '0'..='7' => {
                if template {
                    return Ok(false);
                }
                if self.strict {
                    return Err(SquashError::lexical(
                        "Legacy octal escape sequences are not allowed in strict mode",
                        esc_start,
                    ));
                }
                let mut value = c as u32 - '0' as u32;
                let max_len = if c <= '3' { 3 } else { 2 };
                let mut len = 1;
                while len < max_len {
                    match self.peek() {
                        Some(d @ '0'..='7') => {
                            self.advance();
                            value = value * 8 + (d as u32 - '0' as u32);
                            len += 1;
                        }
                        _ => break,
                    }
                }
                out.push(value as u16);
            }
            '8' | '9' => {
                if template {
                    return Ok(false);
                }
                if self.strict {
                    return Err(SquashError::lexical(
                        "\\8 and \\9 are not allowed in strict mode",
                        esc_start,
                    ));
                }
                push_char(out, c);
            }
            other => push_char(out, other),
        }
        Ok(true)
    }

    // ── String literal ──────────────────────────────────────────────────────

    fn scan_string(&mut self, quote: char, start: Position) -> SquashResult<(TokenValue, Span)> {
        let mut units: Vec<u16> = Vec::new();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(SquashError::lexical("Unterminated string constant", start));
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    self.scan_escape_sequence(&mut units, false)?;
                }
                Some(c) => {
                    self.advance();
                    let mut buf = [0u16; 2];
                    units.extend_from_slice(c.encode_utf16(&mut buf));
                }
            }
        }
        let value = match String::from_utf16(&units) {
            Ok(s) => TokenValue::Str(s),
            Err(_) => TokenValue::LossyStr {
                cooked: String::from_utf16_lossy(&units),
                raw: self.source[start.offset..self.pos].to_string(),
            },
        };
        Ok((value, self.span_from(start)))
    }

    // ── Template literal body ───────────────────────────────────────────────

    /// Scan template characters after the opening `` ` `` or after a `}` that
    /// closes a substitution.  Returns the chunk value and whether the body
    /// was terminated by `${`.
    fn scan_template_body(&mut self, start: Position) -> SquashResult<(TokenValue, bool)> {
        let mut raw = String::new();
        let mut cooked: Vec<u16> = Vec::new();
        let mut valid = true;
        loop {
            match self.peek() {
                None => {
                    return Err(SquashError::lexical("Unterminated template", start));
                }
                Some('`') => {
                    self.advance();
                    return Ok((template_value(raw, cooked, valid), false));
                }
                Some('$') if self.peek2() == Some('{') => {
                    self.advance();
                    self.advance();
                    return Ok((template_value(raw, cooked, valid), true));
                }
                Some('\\') => {
                    let esc_start = self.pos;
                    self.advance();
                    if !self.scan_escape_sequence(&mut cooked, true)? {
                        valid = false;
                    }
                    let text = &self.source[esc_start..self.pos];
                    raw.push_str(&text.replace("\r\n", "\n").replace('\r', "\n"));
                }
                Some(c) => {
                    self.advance();
                    let c = if c == '\r' { '\n' } else { c };
                    raw.push(c);
                    let mut buf = [0u16; 2];
                    cooked.extend_from_slice(c.encode_utf16(&mut buf));
                }
            }
        }
    }

    // ── Regular-expression literal ──────────────────────────────────────────

    fn scan_regexp(&mut self, start: Position) -> SquashResult<TokenValue> {
        // Opening '/' already consumed by the caller.
        let body_start = self.pos;
        let mut in_class = false;
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') | Some('\u{2028}') | Some('\u{2029}') => {
                    return Err(SquashError::lexical("Unterminated regular expression", start));
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => break,
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        None | Some('\n') | Some('\r') | Some('\u{2028}') | Some('\u{2029}') => {
                            return Err(SquashError::lexical(
                                "Unterminated regular expression",
                                start,
                            ));
                        }
                        _ => {
                            self.advance();
                        }
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        let pattern = self.source[body_start..self.pos].to_string();
        self.advance(); // closing /

        let flags_start = self.pos;
        while matches!(self.peek(), Some(c) if is_id_continue(c)) {
            self.advance();
        }
        let flags = self.source[flags_start..self.pos].to_string();
        let mut seen = String::new();
        for f in flags.chars() {
            if !"dgimsuyv".contains(f) || seen.contains(f) {
                return Err(SquashError::lexical("Invalid regular expression flags", start));
            }
            seen.push(f);
        }
        Ok(TokenValue::Regex { pattern, flags })
    }

    // ── Numeric literal ─────────────────────────────────────────────────────

    /// Scan a numeric literal given that `first` has already been consumed.
    fn scan_numeric(&mut self, first: char, start: Position) -> SquashResult<(TokenKind, TokenValue)> {
        let num_start = start.offset;
        let mut radix = 10;
        let mut legacy_octal = false;
        let mut is_integer = true;

        if first == '0' {
            match self.peek() {
                Some('x') | Some('X') => {
                    self.advance();
                    radix = 16;
                    self.scan_digits(16);
                }
                Some('o') | Some('O') => {
                    self.advance();
                    radix = 8;
                    self.scan_digits(8);
                }
                Some('b') | Some('B') => {
                    self.advance();
                    radix = 2;
                    self.scan_digits(2);
                }
                Some(c) if c.is_ascii_digit() => {
                    if self.strict {
                        return Err(SquashError::lexical(
                            "Legacy octal literals are not allowed in strict mode",
                            start,
                        ));
                    }
                    self.scan_digits(10);
                    let digits = &self.source[num_start + 1..self.pos];
                    if digits.chars().all(|d| matches!(d, '0'..='7')) {
                        legacy_octal = true;
                    } else if self.peek() == Some('.') {
                        self.advance();
                        self.scan_digits(10);
                        self.scan_exponent()?;
                        is_integer = false;
                    } else {
                        is_integer = !self.scan_exponent()?;
                    }
                }
                Some('.') => {
                    self.advance();
                    self.scan_digits(10);
                    self.scan_exponent()?;
                    is_integer = false;
                }
                Some('e') | Some('E') => {
                    self.scan_exponent()?;
                    is_integer = false;
                }
                _ => {}
            }
        } else if first == '.' {
            self.scan_digits(10);
            self.scan_exponent()?;
            is_integer = false;
        } else {
            self.scan_digits(10);
            if self.peek() == Some('.') {
                self.advance();
                self.scan_digits(10);
                is_integer = false;
            }
            if self.scan_exponent()? {
                is_integer = false;
            }
        }

        if is_integer && !legacy_octal && self.peek() == Some('n') {
            self.advance();
            let digits: String = self.source[num_start..self.pos - 1]
                .chars()
                .filter(|&c| c != '_')
                .collect();
            self.check_after_number()?;
            return Ok((TokenKind::BigIntLiteral, TokenValue::BigInt(digits)));
        }
        self.check_after_number()?;

        let raw = &self.source[num_start..self.pos];
        let value = if legacy_octal {
            parse_radix_digits(&raw[1..], 8)
        } else {
            parse_numeric_raw(raw, radix)
        };
        if value.is_nan() {
            return Err(SquashError::lexical("Invalid number", start));
        }
        Ok((TokenKind::NumericLiteral, TokenValue::Number(value)))
    }

    /// An identifier character directly after a number is an error (`3in`).
    fn check_after_number(&self) -> SquashResult<()> {
        match self.peek() {
            Some(c) if is_id_start(c) || c.is_ascii_digit() || c == '\\' => {
                Err(self.error_here("Invalid or unexpected token"))
            }
            _ => Ok(()),
        }
    }

    /// Consume an optional exponent part (`e` / `E`, optional sign, digits).
    fn scan_exponent(&mut self) -> SquashResult<bool> {
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if !matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                return Err(self.error_here("Invalid exponent in numeric literal"));
            }
            self.scan_digits(10);
            return Ok(true);
        }
        Ok(false)
    }

    // ── Identifier / keyword ────────────────────────────────────────────────

    /// Scan an identifier whose first character `first` has already been
    /// consumed (`\\` when it started with a unicode escape).
    fn scan_identifier(&mut self, first: char, start: Position) -> SquashResult<(TokenKind, TokenValue)> {
        let mut name = String::new();
        let mut escaped = false;
        if first == '\\' {
            escaped = true;
            let c = self.scan_identifier_escape(start)?;
            if !is_id_start(c) {
                return Err(SquashError::lexical("Invalid identifier start character", start));
            }
            name.push(c);
        } else {
            name.push(first);
        }
        loop {
            match self.peek() {
                Some(c) if is_id_continue(c) => {
                    self.advance();
                    name.push(c);
                }
                Some('\\') => {
                    let esc_start = self.current_pos();
                    self.advance();
                    let c = self.scan_identifier_escape(esc_start)?;
                    if !is_id_continue(c) {
                        return Err(SquashError::lexical("Invalid identifier part character", esc_start));
                    }
                    escaped = true;
                    name.push(c);
                }
                _ => break,
            }
        }
        // An escaped keyword spelling is an ordinary identifier.
        let kind = if escaped {
            TokenKind::Identifier
        } else {
            keyword_kind(&name).unwrap_or(TokenKind::Identifier)
        };
        let value = if kind == TokenKind::Identifier {
            TokenValue::Str(name)
        } else {
            TokenValue::None
        };
        Ok((kind, value))
    }

    /// After consuming `\`, consume and decode a `\uXXXX` or `\u{…}` escape.
    fn scan_identifier_escape(&mut self, start: Position) -> SquashResult<char> {
        if self.peek() != Some('u') {
            return Err(SquashError::lexical("Expecting UnicodeEscapeSequence", start));
        }
        self.advance();
        self.scan_unicode_escape_value()
            .and_then(char::from_u32)
            .ok_or_else(|| SquashError::lexical("Invalid Unicode escape", start))
    }

    // ── Main public API ─────────────────────────────────────────────────────

    /// Scan and return the next [`Token`].
    ///
    /// Returns a token with [`TokenKind::Eof`] when the input is exhausted.
    pub fn next_token(&mut self) -> SquashResult<Token> {
        let (had_lt, comments) = self.skip_trivia()?;
        let start = self.current_pos();

        if self.is_eof() {
            return Ok(Token {
                kind: TokenKind::Eof,
                value: TokenValue::None,
                span: self.span_from(start),
                had_line_terminator_before: had_lt,
                comments_before: comments,
            });
        }

        let c = self.advance();
        let (kind, value) = match c {
            '/' => {
                if slash_is_regexp(self.last_significant_kind) {
                    // Regexp scanning only moves the cursor.
                    let (pos, line, column) = (self.pos, self.line, self.column);
                    match self.scan_regexp(start) {
                        Ok(v) => (TokenKind::RegExpLiteral, v),
                        Err(_) => {
                            (self.pos, self.line, self.column) = (pos, line, column);
                            (self.scan_slash_operator(), TokenValue::None)
                        }
                    }
                } else {
                    (self.scan_slash_operator(), TokenValue::None)
                }
            }

            '"' | '\'' => {
                let (value, _) = self.scan_string(c, start)?;
                (TokenKind::StringLiteral, value)
            }

            '`' => {
                let (value, has_sub) = self.scan_template_body(start)?;
                let kind = if has_sub {
                    self.template_stack.push(self.brace_depth);
                    TokenKind::TemplateHead
                } else {
                    TokenKind::NoSubstitutionTemplate
                };
                (kind, value)
            }

            c if c.is_ascii_digit() => self.scan_numeric(c, start)?,

            '.' => {
                if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.scan_numeric('.', start)?
                } else if self.peek() == Some('.') && self.peek2() == Some('.') {
                    self.advance();
                    self.advance();
                    (TokenKind::DotDotDot, TokenValue::None)
                } else {
                    (TokenKind::Dot, TokenValue::None)
                }
            }

            '#' => {
                let first = match self.peek() {
                    Some(nc) if is_id_start(nc) || nc == '\\' => self.advance(),
                    _ => {
                        return Err(SquashError::lexical("Invalid or unexpected token '#'", start));
                    }
                };
                let (_, value) = self.scan_identifier(first, start)?;
                let name = match value {
                    TokenValue::Str(s) => s,
                    // `#if` and friends scan as keywords; keep their spelling.
                    _ => self.source[start.offset + 1..self.pos].to_string(),
                };
                (TokenKind::PrivateIdentifier, TokenValue::Str(name))
            }

            c if is_id_start(c) => self.scan_identifier(c, start)?,
            '\\' => self.scan_identifier('\\', start)?,

            '}' => {
                if let Some(&depth) = self.template_stack.last()
                    && self.brace_depth == depth
                {
                    self.template_stack.pop();
                    let (value, has_sub) = self.scan_template_body(start)?;
                    let kind = if has_sub {
                        self.template_stack.push(self.brace_depth);
                        TokenKind::TemplateMiddle
                    } else {
                        TokenKind::TemplateTail
                    };
                    (kind, value)
                } else {
                    self.brace_depth = self.brace_depth.saturating_sub(1);
                    (TokenKind::RightBrace, TokenValue::None)
                }
            }
            '{' => {
                self.brace_depth += 1;
                (TokenKind::LeftBrace, TokenValue::None)
            }
            '(' => (TokenKind::LeftParen, TokenValue::None),
            ')' => (TokenKind::RightParen, TokenValue::None),
            '[' => (TokenKind::LeftBracket, TokenValue::None),
            ']' => (TokenKind::RightBracket, TokenValue::None),
            ';' => (TokenKind::Semicolon, TokenValue::None),
            ',' => (TokenKind::Comma, TokenValue::None),
            '~' => (TokenKind::Tilde, TokenValue::None),
            ':' => (TokenKind::Colon, TokenValue::None),

            '<' => {
                let kind = if self.eat('<') {
                    if self.eat('=') { TokenKind::LessLessEqual } else { TokenKind::LessLess }
                } else if self.eat('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                (kind, TokenValue::None)
            }
            '>' => {
                let kind = if self.eat('>') {
                    if self.eat('>') {
                        if self.eat('=') {
                            TokenKind::GreaterGreaterGreaterEqual
                        } else {
                            TokenKind::GreaterGreaterGreater
                        }
                    } else if self.eat('=') {
                        TokenKind::GreaterGreaterEqual
                    } else {
                        TokenKind::GreaterGreater
                    }
                } else if self.eat('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                (kind, TokenValue::None)
            }
            '=' => {
                let kind = if self.eat('=') {
                    if self.eat('=') { TokenKind::EqualEqualEqual } else { TokenKind::EqualEqual }
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Equal
                };
                (kind, TokenValue::None)
            }
            '!' => {
                let kind = if self.eat('=') {
                    if self.eat('=') { TokenKind::BangEqualEqual } else { TokenKind::BangEqual }
                } else {
                    TokenKind::Bang
                };
                (kind, TokenValue::None)
            }
            '+' => {
                let kind = if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                };
                (kind, TokenValue::None)
            }
            '-' => {
                let kind = if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEqual
                } else {
                    TokenKind::Minus
                };
                (kind, TokenValue::None)
            }
            '*' => {
                let kind = if self.eat('*') {
                    if self.eat('=') { TokenKind::StarStarEqual } else { TokenKind::StarStar }
                } else if self.eat('=') {
                    TokenKind::StarEqual
                } else {
                    TokenKind::Star
                };
                (kind, TokenValue::None)
            }
            '%' => {
                let kind = if self.eat('=') { TokenKind::PercentEqual } else { TokenKind::Percent };
                (kind, TokenValue::None)
            }
            '&' => {
                let kind = if self.eat('&') {
                    if self.eat('=') {
                        TokenKind::AmpersandAmpersandEqual
                    } else {
                        TokenKind::AmpersandAmpersand
                    }
                } else if self.eat('=') {
                    TokenKind::AmpersandEqual
                } else {
                    TokenKind::Ampersand
                };
                (kind, TokenValue::None)
            }
            '|' => {
                let kind = if self.eat('|') {
                    if self.eat('=') { TokenKind::PipePipeEqual } else { TokenKind::PipePipe }
                } else if self.eat('=') {
                    TokenKind::PipeEqual
                } else {
                    TokenKind::Pipe
                };
                (kind, TokenValue::None)
            }
            '^' => {
                let kind = if self.eat('=') { TokenKind::CaretEqual } else { TokenKind::Caret };
                (kind, TokenValue::None)
            }
            '?' => {
                let kind = if self.eat('?') {
                    if self.eat('=') {
                        TokenKind::QuestionQuestionEqual
                    } else {
                        TokenKind::QuestionQuestion
                    }
                } else if self.peek() == Some('.')
                    && !matches!(self.peek2(), Some(d) if d.is_ascii_digit())
                {
                    // `?.` but not `?.0`, which is `?` followed by `.0`.
                    self.advance();
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                };
                (kind, TokenValue::None)
            }

            other => {
                return Err(SquashError::lexical(
                    format!("Unexpected character '{other}'"),
                    start,
                ));
            }
        };

        self.last_significant_kind = Some(kind);
        Ok(Token {
            kind,
            value,
            span: self.span_from(start),
            had_line_terminator_before: had_lt,
            comments_before: comments,
        })
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn scan_slash_operator(&mut self) -> TokenKind {
        if self.eat('=') { TokenKind::SlashEqual } else { TokenKind::Slash }
    }

    /// Re-read a `/` or `/=` token as a regular-expression literal.  Must be
    /// called before any further token has been scanned.
    pub fn rescan_as_regexp(&mut self, tok: &Token) -> SquashResult<Token> {
        let start = tok.span.start;
        self.reset_to(start);
        self.advance();
        let value = self.scan_regexp(start)?;
        self.last_significant_kind = Some(TokenKind::RegExpLiteral);
        Ok(Token {
            kind: TokenKind::RegExpLiteral,
            value,
            span: self.span_from(start),
            had_line_terminator_before: tok.had_line_terminator_before,
            comments_before: tok.comments_before.clone(),
        })
    }

    /// Re-read a regular-expression token as a `/` or `/=` operator.  Must be
    /// called before any further token has been scanned.
    pub fn rescan_as_division(&mut self, tok: &Token) -> Token {
        let start = tok.span.start;
        self.reset_to(start);
        self.advance();
        let kind = self.scan_slash_operator();
        self.last_significant_kind = Some(kind);
        Token {
            kind,
            value: TokenValue::None,
            span: self.span_from(start),
            had_line_terminator_before: tok.had_line_terminator_before,
            comments_before: tok.comments_before.clone(),
        }
    }

    /// Re-read `tok` from its start, e.g. after strictness changed.  `prev` is
    /// the kind of the token before it.  Must be called before any further
    /// token has been scanned.
    pub fn rescan(&mut self, tok: &Token, prev: Option<TokenKind>) -> SquashResult<Token> {
        if matches!(
            tok.kind,
            TokenKind::TemplateMiddle | TokenKind::TemplateTail
        ) {
            // The closing `}` of the substitution was already popped.
            return Ok(tok.clone());
        }
        self.reset_to(tok.span.start);
        self.last_significant_kind = prev;
        if tok.kind == TokenKind::TemplateHead {
            self.template_stack.pop();
        }
        match tok.kind {
            TokenKind::LeftBrace => self.brace_depth = self.brace_depth.saturating_sub(1),
            TokenKind::RightBrace => self.brace_depth += 1,
            _ => {}
        }
        let mut fresh = self.next_token()?;
        fresh.had_line_terminator_before = tok.had_line_terminator_before;
        fresh.comments_before = tok.comments_before.clone();
        Ok(fresh)
    }

    /// Convenience: tokenize the entire `source` string and return all tokens
    /// (the [`TokenKind::Eof`] sentinel is **not** included).
    ///
    /// # Errors
    ///
    /// Returns the first [`SquashError::Lexical`] encountered.
    pub fn tokenize_all(source: &'src str) -> SquashResult<Vec<Token>> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = scanner.next_token()?;
            if tok.kind == TokenKind::Eof {
                break;
            }
            tokens.push(tok);
        }
        Ok(tokens)
    }
}

fn template_value(raw: String, cooked: Vec<u16>, valid: bool) -> TokenValue {
    let cooked = valid.then(|| String::from_utf16_lossy(&cooked));
    TokenValue::Template { cooked, raw }
}

// ─────────────────────────────────────────────────────────────────────────────
// Numeric parsing helper
// ─────────────────────────────────────────────────────────────────────────────

/// Parse the raw text of a numeric literal to an `f64`.
///
/// Numeric separators (`_`) are stripped before parsing; radix-prefixed
/// literals are folded digit by digit so values beyond `u64` stay exact to
/// `f64` precision.
fn parse_numeric_raw(raw: &str, radix: u32) -> f64 {
    let clean: String = raw.chars().filter(|&c| c != '_').collect();
    if radix == 10 {
        clean.parse::<f64>().unwrap_or(f64::NAN)
    } else if clean.len() <= 2 {
        f64::NAN
    } else {
        parse_radix_digits(&clean[2..], radix)
    }
}

fn parse_radix_digits(digits: &str, radix: u32) -> f64 {
    let mut value = 0f64;
    for c in digits.chars().filter(|&c| c != '_') {
        match c.to_digit(radix) {
            Some(d) => value = value * radix as f64 + d as f64,
            None => return f64::NAN,
        }
    }
    value
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Tokenise `src` and return a list of token kinds.
    fn kinds(src: &str) -> Vec<TokenKind> {
        Scanner::tokenize_all(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn tokens(src: &str) -> Vec<Token> {
        Scanner::tokenize_all(src).unwrap()
    }

    fn str_value(src: &str) -> String {
        match &tokens(src)[0].value {
            TokenValue::Str(s) => s.clone(),
            other => panic!("expected string value, got {other:?}"),
        }
    }

    fn number(src: &str) -> f64 {
        match tokens(src)[0].value {
            TokenValue::Number(n) => n,
            ref other => panic!("expected number, got {other:?}"),
        }
    }

    // ── Keywords ─────────────────────────────────────────────────────────────

    #[test]
    fn test_keywords_reserved() {
        let toks = kinds("break case typeof var void while with yield await");
        assert_eq!(
            toks,
            vec![
                TokenKind::Break,
                TokenKind::Case,
                TokenKind::Typeof,
                TokenKind::Var,
                TokenKind::Void,
                TokenKind::While,
                TokenKind::With,
                TokenKind::Yield,
                TokenKind::Await,
            ]
        );
    }

    #[test]
    fn test_keywords_contextual() {
        let toks = kinds("async from as get set target meta");
        assert!(toks.iter().all(|k| k.is_contextual()));
        assert_eq!(TokenKind::Instanceof.as_str(), "instanceof");
    }

    // ── Identifiers ───────────────────────────────────────────────────────────

    #[test]
    fn test_identifier_simple() {
        let toks = tokens("foo _bar $baz");
        assert_eq!(toks[0].kind, TokenKind::Identifier);
        assert_eq!(toks[0].value, TokenValue::Str("foo".into()));
        assert_eq!(toks[2].text(), "$baz");
    }

    #[test]
    fn test_identifier_unicode() {
        assert_eq!(str_value("café"), "café");
    }

    #[test]
    fn test_identifier_escape_decoded() {
        let toks = tokens("\\u0061b \\u{63}");
        assert_eq!(toks[0].value, TokenValue::Str("ab".into()));
        assert_eq!(toks[1].value, TokenValue::Str("c".into()));
    }

    #[test]
    fn test_escaped_keyword_is_identifier() {
        let toks = tokens("\\u0076ar");
        assert_eq!(toks[0].kind, TokenKind::Identifier);
        assert_eq!(toks[0].text(), "var");
    }

    #[test]
    fn test_private_identifier() {
        let toks = tokens("#foo #_bar");
        assert_eq!(toks[0].kind, TokenKind::PrivateIdentifier);
        assert_eq!(toks[0].value, TokenValue::Str("foo".into()));
        assert_eq!(toks[1].value, TokenValue::Str("_bar".into()));
    }

    // ── Numeric literals ──────────────────────────────────────────────────────

    #[test]
    fn test_numeric_forms() {
        assert_eq!(number("42"), 42.0);
        assert_eq!(number("3.25"), 3.25);
        assert_eq!(number(".5"), 0.5);
        assert_eq!(number("1e3"), 1000.0);
        assert_eq!(number("0x1F"), 31.0);
        assert_eq!(number("0b101"), 5.0);
        assert_eq!(number("0o17"), 15.0);
        assert_eq!(number("1_000_000"), 1_000_000.0);
    }

    #[test]
    fn test_numeric_legacy_octal() {
        assert_eq!(number("017"), 15.0);
        assert_eq!(number("019"), 19.0);
    }

    #[test]
    fn test_numeric_legacy_octal_rejected_in_strict_mode() {
        let mut sc = Scanner::new("017");
        sc.set_strict(true);
        let err = sc.next_token().unwrap_err();
        assert!(matches!(err, SquashError::Lexical { .. }));
    }

    #[test]
    fn test_numeric_large_hex_does_not_overflow() {
        assert_eq!(number("0xFFFFFFFFFFFFFFFFFF"), 4722366482869645213695.0);
    }

    #[test]
    fn test_numeric_bigint() {
        let toks = tokens("123n 0x1fn");
        assert_eq!(toks[0].kind, TokenKind::BigIntLiteral);
        assert_eq!(toks[0].value, TokenValue::BigInt("123".into()));
        assert_eq!(toks[1].value, TokenValue::BigInt("0x1f".into()));
    }

    #[test]
    fn test_numeric_followed_by_identifier_is_error() {
        assert!(Scanner::tokenize_all("3in x").is_err());
    }

    #[test]
    fn test_member_access_on_number_with_dot_dot() {
        assert_eq!(
            kinds("1..toString"),
            vec![TokenKind::NumericLiteral, TokenKind::Dot, TokenKind::Identifier]
        );
    }

    // ── String literals ───────────────────────────────────────────────────────

    #[test]
    fn test_string_escape_sequences() {
        assert_eq!(str_value(r#""a\nb""#), "a\nb");
        assert_eq!(str_value(r#"'\x41B\u{43}'"#), "ABC");
        assert_eq!(str_value(r#""\101""#), "A");
        assert_eq!(str_value("\"a\\\nb\""), "ab");
        assert_eq!(str_value(r#""😀""#), "\u{1F600}");
        assert_eq!(str_value(r#""\0""#), "\0");
    }

    #[test]
    fn test_string_lone_surrogate_keeps_raw() {
        let toks = tokens(r#""\uD800""#);
        match &toks[0].value {
            TokenValue::LossyStr { raw, .. } => assert_eq!(raw, r#""\uD800""#),
            other => panic!("expected lossy string, got {other:?}"),
        }
    }

    #[test]
    fn test_string_octal_escape_rejected_in_strict_mode() {
        let mut sc = Scanner::new(r#""\07""#);
        sc.set_strict(true);
        assert!(sc.next_token().is_err());
    }

    #[test]
    fn test_string_unterminated_error() {
        let err = Scanner::tokenize_all("x = 'abc").unwrap_err();
        assert_eq!(err.position(), Some((1, 4)));
    }

    // ── Template literals ─────────────────────────────────────────────────────

    #[test]
    fn test_template_with_substitution() {
        let toks = tokens("`a${x}b\\n`");
        assert_eq!(toks[0].kind, TokenKind::TemplateHead);
        assert_eq!(toks[1].kind, TokenKind::Identifier);
        assert_eq!(toks[2].kind, TokenKind::TemplateTail);
        assert_eq!(
            toks[2].value,
            TokenValue::Template {
                cooked: Some("b\n".into()),
                raw: "b\\n".into()
            }
        );
    }

    #[test]
    fn test_template_expression_with_braces() {
        let toks = kinds("`a ${{k:1}} b`");
        assert_eq!(
            toks,
            vec![
                TokenKind::TemplateHead,
                TokenKind::LeftBrace,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::NumericLiteral,
                TokenKind::RightBrace,
                TokenKind::TemplateTail,
            ]
        );
    }

    #[test]
    fn test_template_invalid_escape_has_no_cooked_value() {
        let toks = tokens("`\\unicode`");
        assert_eq!(
            toks[0].value,
            TokenValue::Template {
                cooked: None,
                raw: "\\unicode".into()
            }
        );
    }

    // ── Regular expressions ───────────────────────────────────────────────────

    #[test]
    fn test_regexp_basic() {
        let toks = tokens("/fo[/]o/gi");
        assert_eq!(toks[0].kind, TokenKind::RegExpLiteral);
        assert_eq!(
            toks[0].value,
            TokenValue::Regex {
                pattern: "fo[/]o".into(),
                flags: "gi".into()
            }
        );
    }

    #[test]
    fn test_regexp_bad_flags() {
        use crate::parser::parser::{ParseOptions, parse};

        // An unscannable regexp rescans as division from the same spot.
        assert_eq!(kinds("/a/gg")[..2], [TokenKind::Slash, TokenKind::Identifier]);
        assert!(parse("x = /a/gg;", &ParseOptions::default()).is_err());
        assert!(parse("x = /a/g;", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_division_after_identifier() {
        assert_eq!(
            kinds("x / y"),
            vec![TokenKind::Identifier, TokenKind::Slash, TokenKind::Identifier]
        );
        assert_eq!(
            kinds("of / 2"),
            vec![TokenKind::Of, TokenKind::Slash, TokenKind::NumericLiteral]
        );
    }

    #[test]
    fn test_failed_regexp_falls_back_to_division() {
        assert_eq!(
            kinds("} / 2"),
            vec![TokenKind::RightBrace, TokenKind::Slash, TokenKind::NumericLiteral]
        );
    }

    #[test]
    fn test_rescan_as_regexp() {
        let mut sc = Scanner::new(") /a/g");
        sc.next_token().unwrap();
        let slash = sc.next_token().unwrap();
        assert_eq!(slash.kind, TokenKind::Slash);
        let re = sc.rescan_as_regexp(&slash).unwrap();
        assert_eq!(re.kind, TokenKind::RegExpLiteral);
        assert_eq!(sc.next_token().unwrap().kind, TokenKind::Eof);
    }

    // ── Comments ──────────────────────────────────────────────────────────────

    #[test]
    fn test_comments_attach_to_next_token() {
        let toks = tokens("a /*! keep */ // line\n b");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[1].comments_before.len(), 2);
        assert!(toks[1].comments_before[0].is_license());
        assert_eq!(toks[1].comments_before[1].kind, CommentKind::Line);
        assert!(toks[1].had_line_terminator_before);
    }

    #[test]
    fn test_block_comment_with_newline_sets_flag() {
        let toks = tokens("a /*\n*/ b");
        assert!(toks[1].had_line_terminator_before);
    }

    #[test]
    fn test_pure_annotation() {
        let toks = tokens("/*#__PURE__*/ f()");
        assert!(toks[0].comments_before[0].is_pure_annotation());
    }

    #[test]
    fn test_shebang_is_captured() {
        let mut sc = Scanner::new("#!/usr/bin/env node\nx");
        let tok = sc.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(sc.take_shebang().as_deref(), Some("/usr/bin/env node"));
    }

    // ── Punctuators ───────────────────────────────────────────────────────────

    #[test]
    fn test_punctuators_assignment() {
        let toks = kinds("= += **= >>>= &&= ||= ??=");
        assert_eq!(
            toks,
            vec![
                TokenKind::Equal,
                TokenKind::PlusEqual,
                TokenKind::StarStarEqual,
                TokenKind::GreaterGreaterGreaterEqual,
                TokenKind::AmpersandAmpersandEqual,
                TokenKind::PipePipeEqual,
                TokenKind::QuestionQuestionEqual,
            ]
        );
    }

    #[test]
    fn test_optional_chain_vs_conditional_number() {
        assert_eq!(
            kinds("a?.b"),
            vec![TokenKind::Identifier, TokenKind::QuestionDot, TokenKind::Identifier]
        );
        assert_eq!(
            kinds("a?.5:1"),
            vec![
                TokenKind::Identifier,
                TokenKind::Question,
                TokenKind::NumericLiteral,
                TokenKind::Colon,
                TokenKind::NumericLiteral
            ]
        );
    }

    // ── Line tracking ─────────────────────────────────────────────────────────

    #[test]
    fn test_line_column_tracking() {
        let toks = tokens("x\n  y");
        assert_eq!(toks[0].span.start.line, 1);
        assert_eq!(toks[0].span.start.column, 0);
        assert_eq!(toks[1].span.start.line, 2);
        assert_eq!(toks[1].span.start.column, 2);
        assert_eq!(toks[1].span.start.offset, 4);
    }

    #[test]
    fn test_crlf_counts_as_one_line() {
        let toks = tokens("x\r\ny");
        assert_eq!(toks[1].span.start.line, 2);
    }

    #[test]
    fn test_span_file_index() {
        let mut sc = Scanner::with_file("x", 3);
        assert_eq!(sc.next_token().unwrap().span.file, 3);
    }

    // ── Error cases ───────────────────────────────────────────────────────────

    #[test]
    fn test_error_unterminated_block_comment() {
        assert!(Scanner::tokenize_all("/* oops").is_err());
    }

    #[test]
    fn test_error_unterminated_template() {
        assert!(Scanner::tokenize_all("`oops").is_err());
    }

    #[test]
    fn test_error_unexpected_character() {
        let err = Scanner::tokenize_all("a @ b").unwrap_err();
        assert_eq!(err.position(), Some((1, 2)));
    }
}
