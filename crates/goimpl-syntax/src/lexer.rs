// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Go tokenizer with automatic semicolon insertion.
//!
//! The raw token set is a [`logos`] DFA. [`Lexer`] wraps it and applies the
//! Go rule: a newline (or a block comment spanning one, or end of input)
//! terminates a statement when the line's last token is an identifier, a
//! literal, one of the keywords `break continue fallthrough return`, or one
//! of `++ -- ) ] }`. Inserted semicolons have an empty span at the newline.

use goimpl_core::patch::Span;
use logos::{Lexer as LogosLexer, Logos};

use crate::error::{LexErrorKind, SyntaxError};

// ============================================================================
// Raw scanners
// ============================================================================

fn lex_block_comment(lex: &mut LogosLexer<'_, Tok>) -> Result<(), LexErrorKind> {
    use memchr::memchr;

    let rem = lex.remainder().as_bytes();
    let mut search_start = 0;

    while let Some(star_pos) = memchr(b'*', &rem[search_start..]) {
        let abs_pos = search_start + star_pos;
        if rem.get(abs_pos + 1) == Some(&b'/') {
            lex.bump(abs_pos + 2);
            return Ok(());
        }
        search_start = abs_pos + 1;
    }

    lex.bump(rem.len());
    Err(LexErrorKind::UnterminatedComment)
}

/// Munch the rest of a numeric literal: digits, `_`, radix prefixes,
/// fraction, exponent with sign, and the imaginary suffix.
fn lex_number(lex: &mut LogosLexer<'_, Tok>) {
    let head = lex.slice().as_bytes();
    let rem = lex.remainder().as_bytes();
    let hex = head == b"0" && matches!(rem.first(), Some(b'x' | b'X'));
    let mut prev = head.last().copied().unwrap_or(b'0');
    let mut n = 0;

    while let Some(&b) = rem.get(n) {
        let signed_exponent = matches!(b, b'+' | b'-')
            && (matches!(prev, b'p' | b'P') || (!hex && matches!(prev, b'e' | b'E')));
        let fraction = b == b'.' && rem.get(n + 1) != Some(&b'.');
        if b.is_ascii_alphanumeric() || b == b'_' || fraction || signed_exponent {
            prev = b;
            n += 1;
        } else {
            break;
        }
    }

    lex.bump(n);
}

fn classify_number(text: &str) -> Tok {
    let bytes = text.as_bytes();
    if bytes.last() == Some(&b'i') {
        return Tok::ImagLit;
    }
    let hex = bytes.len() > 1 && bytes[0] == b'0' && matches!(bytes[1], b'x' | b'X');
    let float = text.contains('.')
        || if hex {
            text.contains(['p', 'P'])
        } else {
            text.contains(['e', 'E'])
        };
    if float {
        Tok::FloatLit
    } else {
        Tok::IntLit
    }
}

// ============================================================================
// Token kinds
// ============================================================================

/// Go token kinds.
///
/// `Bom`, `Newline`, `LineComment`, `BlockComment` and `Number` are internal to
/// the lexer and never appear in [`Lexer`] output; numbers are reported as
/// `IntLit`, `FloatLit` or `ImagLit`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\f]+")]
#[rustfmt::skip]
pub enum Tok {
    #[token("\u{FEFF}")] Bom,
    #[regex(r"\r\n|\n|\r")] Newline,
    #[regex(r"//[^\n\r]*", logos::skip)] LineComment,
    #[token("/*", lex_block_comment)] BlockComment,

    #[token("break")] KwBreak,
    #[token("case")] KwCase,
    #[token("chan")] KwChan,
    #[token("const")] KwConst,
    #[token("continue")] KwContinue,
    #[token("default")] KwDefault,
    #[token("defer")] KwDefer,
    #[token("else")] KwElse,
    #[token("fallthrough")] KwFallthrough,
    #[token("for")] KwFor,
    #[token("func")] KwFunc,
    #[token("go")] KwGo,
    #[token("goto")] KwGoto,
    #[token("if")] KwIf,
    #[token("import")] KwImport,
    #[token("interface")] KwInterface,
    #[token("map")] KwMap,
    #[token("package")] KwPackage,
    #[token("range")] KwRange,
    #[token("return")] KwReturn,
    #[token("select")] KwSelect,
    #[token("struct")] KwStruct,
    #[token("switch")] KwSwitch,
    #[token("type")] KwType,
    #[token("var")] KwVar,

    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,
    #[regex(r"[0-9]", lex_number)]
    #[regex(r"\.[0-9]", lex_number)]
    Number,
    IntLit,
    FloatLit,
    ImagLit,
    #[regex(r"'([^'\\\n\r]|\\.)+'")] CharLit,
    #[regex(r#""([^"\\\n\r]|\\.)*""#)] StringLit,
    #[regex(r"`[^`]*`")] RawStringLit,

    #[token("...")] Ellipsis,
    #[token("<<=")] ShlAssign,
    #[token(">>=")] ShrAssign,
    #[token("&^=")] AndNotAssign,
    #[token("+=")] AddAssign,
    #[token("-=")] SubAssign,
    #[token("*=")] MulAssign,
    #[token("/=")] DivAssign,
    #[token("%=")] ModAssign,
    #[token("&=")] AndAssign,
    #[token("|=")] OrAssign,
    #[token("^=")] XorAssign,
    #[token("<<")] Shl,
    #[token(">>")] Shr,
    #[token("&^")] AndNot,
    #[token("&&")] LAnd,
    #[token("||")] LOr,
    #[token("==")] EqEq,
    #[token("!=")] NotEq,
    #[token("<=")] Le,
    #[token(">=")] Ge,
    #[token("++")] Inc,
    #[token("--")] Dec,
    #[token(":=")] Define,
    #[token("<-")] Arrow,
    #[token("=")] Assign,
    #[token("+")] Plus,
    #[token("-")] Minus,
    #[token("*")] Star,
    #[token("/")] Slash,
    #[token("%")] Percent,
    #[token("&")] Amp,
    #[token("|")] Pipe,
    #[token("^")] Caret,
    #[token("~")] Tilde,
    #[token("!")] Bang,
    #[token("<")] Lt,
    #[token(">")] Gt,

    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semi,
    #[token(":")] Colon,
    #[token(".")] Dot,
}

impl Tok {
    /// Whether a newline after this token ends the statement.
    fn ends_statement(self) -> bool {
        matches!(
            self,
            Tok::Ident
                | Tok::IntLit
                | Tok::FloatLit
                | Tok::ImagLit
                | Tok::CharLit
                | Tok::StringLit
                | Tok::RawStringLit
                | Tok::KwBreak
                | Tok::KwContinue
                | Tok::KwFallthrough
                | Tok::KwReturn
                | Tok::Inc
                | Tok::Dec
                | Tok::RParen
                | Tok::RBrack
                | Tok::RBrace
        )
    }

    /// Whether this token can begin a type expression.
    pub fn starts_type(self) -> bool {
        matches!(
            self,
            Tok::Ident
                | Tok::Star
                | Tok::LBrack
                | Tok::LParen
                | Tok::KwFunc
                | Tok::KwMap
                | Tok::KwChan
                | Tok::KwInterface
                | Tok::KwStruct
                | Tok::Arrow
        )
    }
}

/// A token and its byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: Tok,
    pub span: Span,
}

impl Token {
    /// Source text of this token. Inserted semicolons have empty text.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source).unwrap_or("")
    }
}

// ============================================================================
// Lexer wrapper: semicolon insertion
// ============================================================================

/// Iterator over Go tokens with automatic semicolons.
pub struct Lexer<'src> {
    logos: LogosLexer<'src, Tok>,
    pending: Option<Token>,
    can_insert_semi: bool,
    eof_done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            logos: Tok::lexer(source),
            pending: None,
            can_insert_semi: false,
            eof_done: false,
        }
    }

    fn semi_at(pos: usize) -> Token {
        Token {
            kind: Tok::Semi,
            span: Span::empty_at(pos),
        }
    }

    fn error(&self, kind: LexErrorKind) -> SyntaxError {
        let range = self.logos.span();
        SyntaxError::at(
            self.logos.source(),
            Span::new(range.start, range.end),
            kind.to_string(),
        )
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tok) = self.pending.take() {
                return Some(Ok(tok));
            }
            if self.eof_done {
                return None;
            }

            let raw = match self.logos.next() {
                None => {
                    self.eof_done = true;
                    if std::mem::take(&mut self.can_insert_semi) {
                        self.pending = Some(Self::semi_at(self.logos.source().len()));
                    }
                    continue;
                }
                Some(Err(kind)) => {
                    self.eof_done = true;
                    return Some(Err(self.error(kind)));
                }
                Some(Ok(raw)) => raw,
            };

            let range = self.logos.span();
            match raw {
                Tok::Bom if range.start == 0 => continue,
                Tok::Bom => {
                    self.eof_done = true;
                    return Some(Err(self.error(LexErrorKind::MisplacedBom)));
                }
                Tok::Newline => {
                    if std::mem::take(&mut self.can_insert_semi) {
                        return Some(Ok(Self::semi_at(range.start)));
                    }
                }
                Tok::BlockComment => {
                    if self.can_insert_semi {
                        if let Some(off) = memchr::memchr2(b'\n', b'\r', self.logos.slice().as_bytes())
                        {
                            self.can_insert_semi = false;
                            return Some(Ok(Self::semi_at(range.start + off)));
                        }
                    }
                }
                _ => {
                    let kind = if raw == Tok::Number {
                        classify_number(self.logos.slice())
                    } else {
                        raw
                    };
                    self.can_insert_semi = kind.ends_statement();
                    return Some(Ok(Token {
                        kind,
                        span: Span::new(range.start, range.end),
                    }));
                }
            }
        }
    }
}

/// Tokenize a whole file, stopping at the first lexical error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source).collect()
}

// ============================================================================
// Tests
// ============================================================================
