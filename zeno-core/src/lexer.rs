//! Lexer for Zeno source text.
//!
//! Tokens are produced lazily by [`Lexer::next_token`]. The lexer never
//! fails: unexpected characters and unterminated strings come back as
//! [`TokenKind::Illegal`] tokens and the parser reports them.

use core::fmt;

use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Special
    Eof,
    Illegal,

    // Identifiers and literals
    Ident,
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    // Keywords
    Let,
    Mut,
    Pub,
    Import,
    From,
    As,
    If,
    Else,
    While,
    Loop,
    Break,
    Continue,
    Fn,
    Return,
    True,
    False,

    // Operators
    Assign,   // =
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    Percent,  // %
    Bang,     // !
    EqEq,     // ==
    NotEq,    // !=
    Less,     // <
    LessEq,   // <=
    Greater,  // >
    GreaterEq,// >=
    AndAnd,   // &&
    OrOr,     // ||
    Ellipsis, // ...

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Colon,    // :
    Semi,     // ;
}

impl TokenKind {
    /// Keywords that open a statement. The parser resynchronizes on these.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Mut
                | TokenKind::Pub
                | TokenKind::Fn
                | TokenKind::Import
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Loop
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Return
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Eof => "end of input",
            TokenKind::Illegal => "illegal token",
            TokenKind::Ident => "identifier",
            TokenKind::IntLiteral => "integer",
            TokenKind::FloatLiteral => "float",
            TokenKind::StringLiteral => "string",
            TokenKind::Let => "'let'",
            TokenKind::Mut => "'mut'",
            TokenKind::Pub => "'pub'",
            TokenKind::Import => "'import'",
            TokenKind::From => "'from'",
            TokenKind::As => "'as'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::Loop => "'loop'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Fn => "'fn'",
            TokenKind::Return => "'return'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Bang => "'!'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Less => "'<'",
            TokenKind::LessEq => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEq => "'>='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semi => "';'",
        };
        f.write_str(text)
    }
}

/// A single token.
///
/// `literal` borrows from the source. For string literals it is the raw
/// text between the quotes, escapes not yet processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub literal: &'src str,
    pub span: Span,
    /// A line break separates this token from the previous one.
    pub newline_before: bool,
}

/// Result of lexing a whole source file.
#[derive(Debug)]
pub struct LexResult<'src> {
    pub tokens: Vec<Token<'src>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lex a source string into tokens, ending with exactly one `Eof`.
pub fn lex(source: &str) -> LexResult<'_> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.kind == TokenKind::Illegal {
            diagnostics.push(illegal_token_diagnostic(&token));
        }
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    LexResult {
        tokens,
        diagnostics,
    }
}

/// Diagnostic describing an illegal token.
pub fn illegal_token_diagnostic(token: &Token<'_>) -> Diagnostic {
    if token.literal.starts_with('"') {
        Diagnostic::error("unterminated string literal", token.span)
            .with_code("E0002")
            .with_help("add a closing '\"'")
            .with_secondary("文字列リテラルが閉じられていません")
    } else {
        Diagnostic::error(format!("illegal token '{}'", token.literal), token.span)
            .with_code("E0001")
            .with_secondary(format!("不正なトークン '{}'", token.literal))
    }
}

pub struct Lexer<'src> {
    source: &'src str,
    chars: &'src [u8],
    len: usize,
    index: usize,
    line: u32,
    column: u32,
    saw_newline: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source,
            chars: source.as_bytes(),
            len: source.len(),
            index: 0,
            line: 1,
            column: 1,
            saw_newline: false,
        }
    }

    /// Produce the next token. Once the input is exhausted every call
    /// returns `Eof`.
    pub fn next_token(&mut self) -> Token<'src> {
        self.skip_trivia();
        let newline_before = core::mem::take(&mut self.saw_newline);
        let start = self.index;
        let (line, column) = (self.line, self.column);

        let Some(ch) = self.peek_char() else {
            return self.token(TokenKind::Eof, start, start, start, line, column, newline_before);
        };

        let kind = match ch {
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b',' => self.single(TokenKind::Comma),
            b':' => self.single(TokenKind::Colon),
            b';' => self.single(TokenKind::Semi),
            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b'*' => self.single(TokenKind::Star),
            b'/' => self.single(TokenKind::Slash),
            b'%' => self.single(TokenKind::Percent),
            b'=' => self.with_equals(TokenKind::Assign, TokenKind::EqEq),
            b'!' => self.with_equals(TokenKind::Bang, TokenKind::NotEq),
            b'<' => self.with_equals(TokenKind::Less, TokenKind::LessEq),
            b'>' => self.with_equals(TokenKind::Greater, TokenKind::GreaterEq),
            b'&' => self.doubled(b'&', TokenKind::AndAnd),
            b'|' => self.doubled(b'|', TokenKind::OrOr),
            b'.' => {
                // "..." needs two characters of lookahead past the first dot
                if self.peek_next() == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.consume_char();
                    self.consume_char();
                    self.consume_char();
                    TokenKind::Ellipsis
                } else {
                    self.single(TokenKind::Illegal)
                }
            }
            b'"' => return self.lex_string(start, line, column, newline_before),
            b'0'..=b'9' => self.lex_number(),
            _ if is_ident_start(ch) => self.lex_ident_or_keyword(start),
            _ => {
                self.consume_unknown();
                TokenKind::Illegal
            }
        };

        self.token(kind, start, self.index, start, line, column, newline_before)
    }

    #[allow(clippy::too_many_arguments)]
    fn token(
        &self,
        kind: TokenKind,
        literal_start: usize,
        literal_end: usize,
        start: usize,
        line: u32,
        column: u32,
        newline_before: bool,
    ) -> Token<'src> {
        Token {
            kind,
            literal: &self.source[literal_start..literal_end],
            span: Span::new(start as u32, self.index as u32, line, column),
            newline_before,
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.consume_char();
        kind
    }

    fn with_equals(&mut self, short: TokenKind, long: TokenKind) -> TokenKind {
        self.consume_char();
        if self.peek_char() == Some(b'=') {
            self.consume_char();
            long
        } else {
            short
        }
    }

    fn doubled(&mut self, second: u8, kind: TokenKind) -> TokenKind {
        self.consume_char();
        if self.peek_char() == Some(second) {
            self.consume_char();
            kind
        } else {
            TokenKind::Illegal
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.peek_char().is_some_and(is_whitespace) {
                self.consume_char();
            }
            match (self.peek_char(), self.peek_next()) {
                (Some(b'/'), Some(b'/')) => {
                    while self.peek_char().is_some_and(|ch| ch != b'\n') {
                        self.consume_char();
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    self.consume_char();
                    self.consume_char();
                    // Unterminated block comments run to end of input.
                    loop {
                        match (self.peek_char(), self.peek_next()) {
                            (None, _) => break,
                            (Some(b'*'), Some(b'/')) => {
                                self.consume_char();
                                self.consume_char();
                                break;
                            }
                            _ => self.consume_char(),
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_string(&mut self, start: usize, line: u32, column: u32, newline_before: bool) -> Token<'src> {
        // Consume the opening quote
        self.consume_char();

        let content_start = self.index;
        while let Some(ch) = self.peek_char() {
            match ch {
                b'"' => {
                    let content_end = self.index;
                    self.consume_char(); // closing quote
                    return self.token(
                        TokenKind::StringLiteral,
                        content_start,
                        content_end,
                        start,
                        line,
                        column,
                        newline_before,
                    );
                }
                b'\\' => {
                    // Skip over escape sequence: backslash + next char (if any)
                    self.consume_char();
                    if self.peek_char().is_some() {
                        self.consume_char();
                    }
                }
                _ => self.consume_char(),
            }
        }

        // Unterminated string
        self.token(TokenKind::Illegal, start, self.index, start, line, column, newline_before)
    }

    fn lex_number(&mut self) -> TokenKind {
        while self.peek_char().is_some_and(|ch| ch.is_ascii_digit()) {
            self.consume_char();
        }

        // A '.' only belongs to the number when a digit follows it.
        if self.peek_char() == Some(b'.') && self.peek_next().is_some_and(|ch| ch.is_ascii_digit()) {
            self.consume_char();
            while self.peek_char().is_some_and(|ch| ch.is_ascii_digit()) {
                self.consume_char();
            }
            return TokenKind::FloatLiteral;
        }
        TokenKind::IntLiteral
    }

    fn lex_ident_or_keyword(&mut self, start: usize) -> TokenKind {
        while self.peek_char().is_some_and(is_ident_continue) {
            self.consume_char();
        }
        lookup_keyword(&self.source[start..self.index]).unwrap_or(TokenKind::Ident)
    }

    /// Consume one whole character, which may span several bytes.
    fn consume_unknown(&mut self) {
        let width = self.source[self.index..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        for _ in 0..width {
            self.consume_char();
        }
    }

    fn peek_char(&self) -> Option<u8> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.peek_at(1)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.chars.get(self.index + offset).copied()
    }

    fn consume_char(&mut self) {
        if self.index >= self.len {
            return;
        }
        let ch = self.chars[self.index];
        self.index += 1;
        if ch == b'\n' {
            self.line += 1;
            self.column = 1;
            self.saw_newline = true;
        } else if ch & 0xC0 != 0x80 {
            // UTF-8 continuation bytes do not advance the column
            self.column += 1;
        }
    }
}

pub fn lookup_keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "let" => TokenKind::Let,
        "mut" => TokenKind::Mut,
        "pub" => TokenKind::Pub,
        "import" => TokenKind::Import,
        "from" => TokenKind::From,
        "as" => TokenKind::As,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "loop" => TokenKind::Loop,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "fn" => TokenKind::Fn,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

/// Interpret the escape sequences of a raw string literal.
///
/// Unknown escapes and incomplete `\u`/`\x` sequences are kept verbatim,
/// so this never fails.
pub fn process_escapes(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch != '\\' {
            out.push(ch);
            i += 1;
            continue;
        }
        let Some(&next) = chars.get(i + 1) else {
            out.push('\\');
            break;
        };
        i += 2;
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'u' | 'x' => {
                let digits = if next == 'u' { 4 } else { 2 };
                match decode_hex(&chars[i..], digits) {
                    Some(decoded) => {
                        out.push(decoded);
                        i += digits;
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn decode_hex(chars: &[char], digits: usize) -> Option<char> {
    let hex = chars.get(..digits)?;
    let mut value = 0u32;
    for ch in hex {
        value = value * 16 + ch.to_digit(16)?;
    }
    char::from_u32(value)
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}
