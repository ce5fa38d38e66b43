//! The JavaScript lexer.
//!
//! A single pass over padded source bytes. Tokens are produced one at a time;
//! `peek` returns the current token and `skip` advances. The parser re-enters
//! the lexer for context-sensitive forms: a leading `/` can be re-lexed as a
//! regular expression, `}` can be re-lexed as a template continuation, and
//! automatic semicolon insertion can rewind the current token.
//!
//! Identifiers written with `\u` escapes are normalized into the analysis
//! arena; their token spans keep covering the raw source bytes.

use bumpalo::Bump;
use unicode_xid::UnicodeXID;

use nitpick_core::{PaddedStringView, SourceSpan};
use nitpick_diagnostics::{Diag, DiagnosticSink, FatalError, FatalErrorKind};

use crate::token::{Token, TokenFlags, TokenKind};

/// The lexer reads JavaScript source code one token at a time.
pub struct Lexer<'code, 'reporter> {
    source: PaddedStringView<'code>,
    allocator: &'code Bump,
    reporter: &'reporter mut dyn DiagnosticSink<'code>,
    /// Position of the next unscanned byte.
    pos: usize,
    token: Token<'code>,
    previous_token_end: u32,
    /// Flags accumulated while scanning the token in progress.
    pending_flags: TokenFlags,
    /// Normalized name of the identifier token in progress.
    pending_name: Option<&'code str>,
}

impl<'code, 'reporter> Lexer<'code, 'reporter> {
    /// Create a lexer and scan the first token.
    ///
    /// `allocator` receives normalized copies of escape-bearing identifiers;
    /// it must outlive every token handed out.
    pub fn new(
        source: PaddedStringView<'code>,
        allocator: &'code Bump,
        reporter: &'reporter mut dyn DiagnosticSink<'code>,
    ) -> Self {
        let mut lexer = Self {
            source,
            allocator,
            reporter,
            pos: 0,
            token: Token {
                kind: TokenKind::EndOfFile,
                begin: 0,
                end: 0,
                flags: TokenFlags::empty(),
                normalized_name: None,
            },
            previous_token_end: 0,
            pending_flags: TokenFlags::empty(),
            pending_name: None,
        };
        lexer.parse_current_token();
        lexer
    }

    /// The current token.
    #[inline]
    pub fn peek(&self) -> &Token<'code> {
        &self.token
    }

    /// Advance to the next token.
    ///
    /// Precondition: `peek().kind != TokenKind::EndOfFile`.
    pub fn skip(&mut self) {
        self.parse_current_token();
    }

    /// The diagnostic channel shared by the lexer and the parser layered on
    /// top of it.
    #[inline]
    pub fn reporter(&mut self) -> &mut dyn DiagnosticSink<'code> {
        &mut *self.reporter
    }

    /// End offset of the token before the current one.
    #[inline]
    pub fn end_of_previous_token(&self) -> u32 {
        self.previous_token_end
    }

    /// Rewind the current token to a synthetic `;` at the previous token's
    /// end. The replaced token is re-scanned by the next `skip`.
    pub fn insert_semicolon(&mut self) {
        self.pos = self.token.begin as usize;
        self.token = Token {
            kind: TokenKind::Semicolon,
            begin: self.previous_token_end,
            end: self.previous_token_end,
            flags: TokenFlags::empty(),
            normalized_name: None,
        };
    }

    /// Re-lex the current `/` or `/=` token as a regular expression literal.
    ///
    /// Precondition: `peek().kind` is `Slash` or `SlashEqual`.
    pub fn reparse_as_regexp(&mut self) {
        debug_assert!(matches!(
            self.token.kind,
            TokenKind::Slash | TokenKind::SlashEqual
        ));
        let begin = self.token.begin as usize;
        self.pos = begin + 1;
        let mut in_character_class = false;
        loop {
            let byte = self.source.byte_at(self.pos);
            if self.is_eof() || is_line_terminator_start(byte) {
                self.reporter.report(Diag::UnclosedRegexpLiteral {
                    regexp_literal: SourceSpan::new(begin as u32, self.pos as u32),
                });
                break;
            }
            match byte {
                b'\\' => {
                    self.pos += 1;
                    if !self.is_eof() && !is_line_terminator_start(self.source.byte_at(self.pos)) {
                        self.pos += 1;
                    }
                }
                b'[' => {
                    in_character_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_character_class = false;
                    self.pos += 1;
                }
                b'/' if !in_character_class => {
                    self.pos += 1;
                    // Flags
                    while is_ascii_identifier_part(self.source.byte_at(self.pos)) {
                        self.pos += 1;
                    }
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.token.kind = TokenKind::Regexp;
        self.token.end = self.pos as u32;
        self.token.normalized_name = None;
    }

    /// Like `skip`, but re-lex the current `}` as a template continuation so
    /// that it closes the enclosing interpolation instead of starting a new
    /// token. `template_begin` is the opening back-tick, for error reporting.
    ///
    /// Precondition: `peek().kind == TokenKind::CloseBrace`.
    pub fn skip_in_template(&mut self, template_begin: u32) {
        debug_assert_eq!(self.token.kind, TokenKind::CloseBrace);
        let begin = self.token.begin;
        self.previous_token_end = self.token.end;
        self.pos = begin as usize + 1;
        let kind = self.parse_template_body(template_begin as usize);
        self.token = Token {
            kind,
            begin,
            end: self.pos as u32,
            flags: TokenFlags::empty(),
            normalized_name: None,
        };
    }

    // ========================================================================
    // Core scanning
    // ========================================================================

    #[inline]
    fn byte(&self, offset: usize) -> u8 {
        self.source.byte_at(self.pos + offset)
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn parse_current_token(&mut self) {
        self.previous_token_end = self.token.end;
        let mut flags = TokenFlags::empty();
        loop {
            if self.skip_whitespace_and_comments() {
                flags |= TokenFlags::PRECEDING_LINE_BREAK;
            }
            let begin = self.pos;
            if self.is_eof() {
                self.set_token(TokenKind::EndOfFile, begin, flags);
                return;
            }

            let byte = self.byte(0);
            let kind = match byte {
                b'(' => self.single(TokenKind::OpenParen),
                b')' => self.single(TokenKind::CloseParen),
                b'{' => self.single(TokenKind::OpenBrace),
                b'}' => self.single(TokenKind::CloseBrace),
                b'[' => self.single(TokenKind::OpenBracket),
                b']' => self.single(TokenKind::CloseBracket),
                b';' => self.single(TokenKind::Semicolon),
                b',' => self.single(TokenKind::Comma),
                b':' => self.single(TokenKind::Colon),
                b'?' => self.single(TokenKind::Question),
                b'~' => self.single(TokenKind::Tilde),

                b'.' => self.scan_dot(),
                b'=' => self.scan_equal(),
                b'!' => self.scan_bang(),
                b'<' => self.scan_less(),
                b'>' => self.scan_greater(),
                b'+' => self.scan_plus(),
                b'-' => self.scan_minus(),
                b'*' => self.scan_star(),
                b'/' => self.scan_slash(),
                b'%' => self.scan_percent(),
                b'&' => self.scan_ampersand(),
                b'|' => self.scan_pipe(),
                b'^' => self.scan_caret(),

                b'"' | b'\'' => self.scan_string(),
                b'`' => {
                    self.pos += 1;
                    self.parse_template_body(begin)
                }
                b'0'..=b'9' => self.scan_number(),
                b'#' => {
                    self.reporter.report(Diag::UnexpectedHashCharacter {
                        hash: SourceSpan::new(begin as u32, begin as u32 + 1),
                    });
                    self.pos += 1;
                    continue;
                }
                _ if is_ascii_identifier_start(byte) || byte == b'\\' || byte >= 0x80 => {
                    match self.scan_identifier() {
                        Some(kind) => kind,
                        None => {
                            // A fatal report was emitted; end the analysis.
                            self.pos = self.source.len();
                            self.set_token(TokenKind::EndOfFile, self.pos, flags);
                            return;
                        }
                    }
                }
                _ => {
                    self.report_fatal_character(begin);
                    self.pos = self.source.len();
                    self.set_token(TokenKind::EndOfFile, self.pos, flags);
                    return;
                }
            };

            self.token = Token {
                kind,
                begin: begin as u32,
                end: self.pos as u32,
                flags: flags | self.pending_flags,
                normalized_name: self.pending_name.take(),
            };
            self.pending_flags = TokenFlags::empty();
            return;
        }
    }

    #[inline]
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn set_token(&mut self, kind: TokenKind, begin: usize, flags: TokenFlags) {
        self.token = Token {
            kind,
            begin: begin as u32,
            end: self.pos as u32,
            flags,
            normalized_name: None,
        };
    }

    // ========================================================================
    // Punctuators
    // ========================================================================

    fn scan_dot(&mut self) -> TokenKind {
        if self.byte(1).is_ascii_digit() {
            self.scan_number()
        } else if self.byte(1) == b'.' && self.byte(2) == b'.' {
            self.pos += 3;
            TokenKind::DotDotDot
        } else {
            self.pos += 1;
            TokenKind::Dot
        }
    }

    fn scan_equal(&mut self) -> TokenKind {
        if self.byte(1) == b'=' {
            if self.byte(2) == b'=' {
                self.pos += 3;
                TokenKind::EqualEqualEqual
            } else {
                self.pos += 2;
                TokenKind::EqualEqual
            }
        } else if self.byte(1) == b'>' {
            self.pos += 2;
            TokenKind::Arrow
        } else {
            self.pos += 1;
            TokenKind::Equal
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.byte(1) == b'=' {
            if self.byte(2) == b'=' {
                self.pos += 3;
                TokenKind::BangEqualEqual
            } else {
                self.pos += 2;
                TokenKind::BangEqual
            }
        } else {
            self.pos += 1;
            TokenKind::Bang
        }
    }

    fn scan_less(&mut self) -> TokenKind {
        if self.byte(1) == b'<' {
            if self.byte(2) == b'=' {
                self.pos += 3;
                TokenKind::LessLessEqual
            } else {
                self.pos += 2;
                TokenKind::LessLess
            }
        } else if self.byte(1) == b'=' {
            self.pos += 2;
            TokenKind::LessEqual
        } else {
            self.pos += 1;
            TokenKind::Less
        }
    }

    fn scan_greater(&mut self) -> TokenKind {
        if self.byte(1) == b'>' {
            if self.byte(2) == b'>' {
                if self.byte(3) == b'=' {
                    self.pos += 4;
                    TokenKind::GreaterGreaterGreaterEqual
                } else {
                    self.pos += 3;
                    TokenKind::GreaterGreaterGreater
                }
            } else if self.byte(2) == b'=' {
                self.pos += 3;
                TokenKind::GreaterGreaterEqual
            } else {
                self.pos += 2;
                TokenKind::GreaterGreater
            }
        } else if self.byte(1) == b'=' {
            self.pos += 2;
            TokenKind::GreaterEqual
        } else {
            self.pos += 1;
            TokenKind::Greater
        }
    }

    fn scan_plus(&mut self) -> TokenKind {
        if self.byte(1) == b'+' {
            self.pos += 2;
            TokenKind::PlusPlus
        } else if self.byte(1) == b'=' {
            self.pos += 2;
            TokenKind::PlusEqual
        } else {
            self.pos += 1;
            TokenKind::Plus
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        if self.byte(1) == b'-' {
            self.pos += 2;
            TokenKind::MinusMinus
        } else if self.byte(1) == b'=' {
            self.pos += 2;
            TokenKind::MinusEqual
        } else {
            self.pos += 1;
            TokenKind::Minus
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        if self.byte(1) == b'*' {
            if self.byte(2) == b'=' {
                self.pos += 3;
                TokenKind::StarStarEqual
            } else {
                self.pos += 2;
                TokenKind::StarStar
            }
        } else if self.byte(1) == b'=' {
            self.pos += 2;
            TokenKind::StarEqual
        } else {
            self.pos += 1;
            TokenKind::Star
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        // Comments were consumed as trivia, so this is division (or the start
        // of a regexp, which the parser requests explicitly).
        if self.byte(1) == b'=' {
            self.pos += 2;
            TokenKind::SlashEqual
        } else {
            self.pos += 1;
            TokenKind::Slash
        }
    }

    fn scan_percent(&mut self) -> TokenKind {
        if self.byte(1) == b'=' {
            self.pos += 2;
            TokenKind::PercentEqual
        } else {
            self.pos += 1;
            TokenKind::Percent
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        if self.byte(1) == b'&' {
            self.pos += 2;
            TokenKind::AmpersandAmpersand
        } else if self.byte(1) == b'=' {
            self.pos += 2;
            TokenKind::AmpersandEqual
        } else {
            self.pos += 1;
            TokenKind::Ampersand
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        if self.byte(1) == b'|' {
            self.pos += 2;
            TokenKind::PipePipe
        } else if self.byte(1) == b'=' {
            self.pos += 2;
            TokenKind::PipeEqual
        } else {
            self.pos += 1;
            TokenKind::Pipe
        }
    }

    fn scan_caret(&mut self) -> TokenKind {
        if self.byte(1) == b'=' {
            self.pos += 2;
            TokenKind::CaretEqual
        } else {
            self.pos += 1;
            TokenKind::Caret
        }
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    /// Skip whitespace and comments. Returns true if a line terminator was
    /// crossed.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        let mut saw_newline = false;
        loop {
            let byte = self.byte(0);
            match byte {
                b'\n' => {
                    saw_newline = true;
                    self.pos += 1;
                }
                b'\r' => {
                    saw_newline = true;
                    self.pos += 1;
                    if self.byte(0) == b'\n' {
                        self.pos += 1;
                    }
                }
                b' ' | b'\t' | 0x0B | 0x0C => {
                    self.pos += 1;
                }
                b'/' => {
                    if self.byte(1) == b'/' {
                        self.pos += 2;
                        while !self.is_eof() && !is_line_terminator_start(self.byte(0)) {
                            self.pos += 1;
                        }
                    } else if self.byte(1) == b'*' {
                        if self.skip_block_comment() {
                            saw_newline = true;
                        }
                    } else {
                        return saw_newline;
                    }
                }
                0x01..=0x08 | 0x0E..=0x1F | 0x7F => {
                    // Stray control characters are treated as blank space.
                    self.pos += 1;
                }
                _ if byte >= 0x80 => {
                    let Some(c) = self.current_char() else {
                        return saw_newline;
                    };
                    match c {
                        '\u{2028}' | '\u{2029}' => {
                            saw_newline = true;
                            self.pos += c.len_utf8();
                        }
                        '\u{00A0}' | '\u{FEFF}' => {
                            self.pos += c.len_utf8();
                        }
                        c if c.is_whitespace() => {
                            self.pos += c.len_utf8();
                        }
                        _ => return saw_newline,
                    }
                }
                _ => return saw_newline,
            }
        }
    }

    /// Skip a `/* ... */` comment. Returns true if it spanned a line break.
    fn skip_block_comment(&mut self) -> bool {
        let comment_open = self.pos;
        self.pos += 2;
        let mut saw_newline = false;
        loop {
            if self.is_eof() {
                self.reporter.report(Diag::UnclosedBlockComment {
                    comment_open: SourceSpan::new(comment_open as u32, comment_open as u32 + 2),
                });
                return saw_newline;
            }
            match self.byte(0) {
                b'*' if self.byte(1) == b'/' => {
                    self.pos += 2;
                    return saw_newline;
                }
                b'\n' | b'\r' => {
                    saw_newline = true;
                    self.pos += 1;
                }
                b if b >= 0x80 => {
                    if let Some(c) = self.current_char() {
                        if c == '\u{2028}' || c == '\u{2029}' {
                            saw_newline = true;
                        }
                        self.pos += c.len_utf8();
                    } else {
                        self.pos += 1;
                    }
                }
                _ => self.pos += 1,
            }
        }
    }

    // ========================================================================
    // Literals
    // ========================================================================

    fn scan_string(&mut self) -> TokenKind {
        let begin = self.pos;
        let quote = self.byte(0);
        self.pos += 1;
        loop {
            let byte = self.byte(0);
            if self.is_eof() || is_line_terminator_start(byte) {
                self.reporter.report(Diag::UnclosedStringLiteral {
                    string_literal: SourceSpan::new(begin as u32, self.pos as u32),
                });
                self.pending_flags |= TokenFlags::UNTERMINATED;
                break;
            }
            if byte == quote {
                self.pos += 1;
                break;
            }
            if byte == b'\\' {
                self.pos += 1;
                // Line continuations are legal inside strings.
                if self.byte(0) == b'\r' {
                    self.pos += 1;
                    if self.byte(0) == b'\n' {
                        self.pos += 1;
                    }
                } else if !self.is_eof() {
                    self.pos += 1;
                }
                continue;
            }
            self.pos += 1;
        }
        TokenKind::String
    }

    /// Scan a template literal body starting at `self.pos` (just past the
    /// back-tick or the interpolation-closing `}`). Returns
    /// `CompleteTemplate` when the closing back-tick was reached and
    /// `IncompleteTemplate` when a `${` interpolation begins.
    fn parse_template_body(&mut self, template_begin: usize) -> TokenKind {
        loop {
            if self.is_eof() {
                self.reporter.report(Diag::UnclosedTemplate {
                    incomplete_template: SourceSpan::new(template_begin as u32, self.pos as u32),
                });
                self.pending_flags |= TokenFlags::UNTERMINATED;
                return TokenKind::CompleteTemplate;
            }
            match self.byte(0) {
                b'`' => {
                    self.pos += 1;
                    return TokenKind::CompleteTemplate;
                }
                b'$' if self.byte(1) == b'{' => {
                    self.pos += 2;
                    return TokenKind::IncompleteTemplate;
                }
                b'\\' => {
                    self.pos += 1;
                    if !self.is_eof() {
                        self.pos += 1;
                    }
                }
                _ => self.pos += 1,
            }
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        let begin = self.pos;
        if self.byte(0) == b'0' {
            match self.byte(1) {
                b'x' | b'X' => return self.scan_radix_number(is_hex_digit),
                b'b' | b'B' => return self.scan_radix_number(is_binary_digit),
                b'o' | b'O' => return self.scan_radix_number(is_octal_digit),
                b'0'..=b'9' => return self.scan_sloppy_octal_number(begin),
                _ => {}
            }
        }

        // Decimal
        self.scan_digits_and_separators(u8::is_ascii_digit);
        let mut has_decimal_point = false;
        if self.byte(0) == b'.' {
            has_decimal_point = true;
            self.pos += 1;
            self.scan_digits_and_separators(u8::is_ascii_digit);
        }
        let mut has_exponent = false;
        if matches!(self.byte(0), b'e' | b'E') {
            has_exponent = true;
            self.pos += 1;
            if matches!(self.byte(0), b'+' | b'-') {
                self.pos += 1;
            }
            self.scan_digits_and_separators(u8::is_ascii_digit);
        }
        if self.byte(0) == b'n' {
            self.pos += 1;
            let literal = SourceSpan::new(begin as u32, self.pos as u32);
            if has_decimal_point {
                self.reporter
                    .report(Diag::BigIntLiteralContainsDecimalPoint { literal });
            } else if has_exponent {
                self.reporter
                    .report(Diag::BigIntLiteralContainsExponent { literal });
            } else if self.source.byte_at(begin) == b'0' && begin + 1 < self.pos - 1 {
                self.reporter
                    .report(Diag::BigIntLiteralContainsLeadingZero { literal });
            }
        }
        self.check_garbage_in_number_literal(false);
        TokenKind::Number
    }

    fn scan_radix_number(&mut self, is_digit: fn(u8) -> bool) -> TokenKind {
        self.pos += 2; // radix prefix
        loop {
            let byte = self.byte(0);
            if byte == b'_' {
                self.pending_flags |= TokenFlags::CONTAINS_SEPARATOR;
                self.pos += 1;
            } else if is_digit(byte) {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.byte(0) == b'n' {
            self.pos += 1; // BigInt suffix; legal for radix literals
        }
        self.check_garbage_in_number_literal(false);
        TokenKind::Number
    }

    fn scan_sloppy_octal_number(&mut self, begin: usize) -> TokenKind {
        loop {
            let byte = self.byte(0);
            if byte == b'_' {
                self.pending_flags |= TokenFlags::CONTAINS_SEPARATOR;
                self.pos += 1;
            } else if is_octal_digit(byte) {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.byte(0) == b'n' {
            self.pos += 1;
            self.reporter.report(Diag::BigIntLiteralContainsLeadingZero {
                literal: SourceSpan::new(begin as u32, self.pos as u32),
            });
        }
        self.check_garbage_in_number_literal(true);
        TokenKind::Number
    }

    /// Consume identifier or digit characters trailing a numeric literal and
    /// report them.
    fn check_garbage_in_number_literal(&mut self, octal: bool) {
        let garbage_begin = self.pos;
        loop {
            let byte = self.byte(0);
            if byte.is_ascii_digit() || is_ascii_identifier_part(byte) {
                self.pos += 1;
            } else if byte >= 0x80 {
                match self.current_char() {
                    Some(c) if c.is_xid_continue() => self.pos += c.len_utf8(),
                    _ => break,
                }
            } else {
                break;
            }
        }
        if self.pos != garbage_begin {
            let characters = SourceSpan::new(garbage_begin as u32, self.pos as u32);
            if octal {
                self.reporter
                    .report(Diag::UnexpectedCharactersInOctalNumber { characters });
            } else {
                self.reporter
                    .report(Diag::UnexpectedCharactersInNumber { characters });
            }
        }
    }

    fn scan_digits_and_separators(&mut self, is_digit: fn(&u8) -> bool) {
        loop {
            let byte = self.byte(0);
            if byte == b'_' {
                self.pending_flags |= TokenFlags::CONTAINS_SEPARATOR;
                self.pos += 1;
            } else if is_digit(&byte) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    /// Scan an identifier or keyword. Returns `None` after a fatal report.
    fn scan_identifier(&mut self) -> Option<TokenKind> {
        let begin = self.pos;
        while is_ascii_identifier_part(self.byte(0)) {
            self.pos += 1;
        }

        let next = self.byte(0);
        let name: &'code str = if next == b'\\' || next >= 0x80 || self.pos == begin {
            self.scan_identifier_slow(begin)?
        } else {
            self.source.slice(SourceSpan::new(begin as u32, self.pos as u32))
        };
        Some(self.finish_identifier(name))
    }

    fn finish_identifier(&mut self, name: &'code str) -> TokenKind {
        self.pending_name = Some(name);
        TokenKind::from_keyword(name).unwrap_or(TokenKind::Identifier)
    }

    /// Slow path: the identifier contains `\u` escapes or non-ASCII
    /// characters. Builds the normalized text; escape-bearing names are
    /// copied into the arena. Returns `None` after a fatal report.
    fn scan_identifier_slow(&mut self, begin: usize) -> Option<&'code str> {
        let mut normalized = String::new();
        normalized.push_str(self.source.slice(SourceSpan::new(begin as u32, self.pos as u32)));
        let mut has_escape = false;

        loop {
            let byte = self.byte(0);
            if is_ascii_identifier_part(byte) {
                normalized.push(byte as char);
                self.pos += 1;
            } else if byte == b'\\' {
                let escape_begin = self.pos;
                match self.scan_unicode_escape() {
                    Some(c)
                        if (normalized.is_empty() && is_identifier_start_char(c))
                            || (!normalized.is_empty() && is_identifier_part_char(c)) =>
                    {
                        has_escape = true;
                        normalized.push(c);
                    }
                    _ => {
                        self.report_fatal_character(escape_begin);
                        return None;
                    }
                }
            } else if byte >= 0x80 {
                let Some(c) = self.current_char() else {
                    break;
                };
                let valid = if normalized.is_empty() {
                    is_identifier_start_char(c)
                } else {
                    is_identifier_part_char(c)
                };
                if !valid {
                    if normalized.is_empty() {
                        self.report_fatal_character(self.pos);
                        return None;
                    }
                    break;
                }
                normalized.push(c);
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        if normalized.is_empty() {
            self.report_fatal_character(begin);
            return None;
        }

        if has_escape {
            Some(self.allocator.alloc_str(&normalized))
        } else {
            Some(self.source.slice(SourceSpan::new(begin as u32, self.pos as u32)))
        }
    }

    /// Scan `\u{HEX}` or `\uXXXX` at `self.pos` (pointing at the backslash).
    /// On success the position is left after the escape.
    fn scan_unicode_escape(&mut self) -> Option<char> {
        debug_assert_eq!(self.byte(0), b'\\');
        if self.byte(1) != b'u' {
            return None;
        }
        if self.byte(2) == b'{' {
            let mut i = 3;
            let mut value: u32 = 0;
            let mut digit_count = 0;
            while is_hex_digit(self.byte(i)) {
                value = value.wrapping_mul(16) + hex_digit_value(self.byte(i));
                digit_count += 1;
                i += 1;
                if digit_count > 6 {
                    return None;
                }
            }
            if digit_count == 0 || self.byte(i) != b'}' {
                return None;
            }
            let c = char::from_u32(value)?;
            self.pos += i + 1;
            Some(c)
        } else {
            let mut value: u32 = 0;
            for i in 2..6 {
                if !is_hex_digit(self.byte(i)) {
                    return None;
                }
                value = value * 16 + hex_digit_value(self.byte(i));
            }
            let c = char::from_u32(value)?;
            self.pos += 6;
            Some(c)
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn current_char(&self) -> Option<char> {
        if self.is_eof() {
            None
        } else {
            self.source.text_from(self.pos).chars().next()
        }
    }

    fn report_fatal_character(&mut self, offset: usize) {
        let end = (offset + 1).min(self.source.len());
        self.reporter.report_fatal(FatalError {
            origin_file: file!(),
            origin_line: line!(),
            origin_function: "Lexer::parse_current_token",
            kind: FatalErrorKind::UnimplementedCharacter,
            span: SourceSpan::new(offset as u32, end as u32),
        });
    }
}

#[inline]
fn is_ascii_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$'
}

#[inline]
fn is_ascii_identifier_part(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

fn is_identifier_start_char(c: char) -> bool {
    c == '_' || c == '$' || c.is_xid_start()
}

fn is_identifier_part_char(c: char) -> bool {
    c == '_' || c == '$' || c.is_xid_continue() || c == '\u{200C}' || c == '\u{200D}'
}

#[inline]
fn is_line_terminator_start(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

#[inline]
fn is_hex_digit(byte: u8) -> bool {
    byte.is_ascii_hexdigit()
}

#[inline]
fn is_binary_digit(byte: u8) -> bool {
    byte == b'0' || byte == b'1'
}

#[inline]
fn is_octal_digit(byte: u8) -> bool {
    (b'0'..=b'7').contains(&byte)
}

#[inline]
fn hex_digit_value(byte: u8) -> u32 {
    match byte {
        b'0'..=b'9' => (byte - b'0') as u32,
        b'a'..=b'f' => (byte - b'a' + 10) as u32,
        _ => (byte - b'A' + 10) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nitpick_core::PaddedString;
    use nitpick_diagnostics::DiagnosticCollection;

    fn kinds_of(source: &str) -> Vec<TokenKind> {
        let code = PaddedString::new(source);
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        let mut kinds = Vec::new();
        while lexer.peek().kind != TokenKind::EndOfFile {
            kinds.push(lexer.peek().kind);
            lexer.skip();
        }
        kinds
    }

    fn lex_with_diagnostics(source: &str, f: impl FnOnce(&DiagnosticCollection<'_>)) {
        let code = PaddedString::new(source);
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        while lexer.peek().kind != TokenKind::EndOfFile {
            lexer.skip();
        }
        drop(lexer);
        f(&diagnostics);
    }

    #[test]
    fn punctuators() {
        use TokenKind::*;
        assert_eq!(
            kinds_of("( ) { } [ ] ; , : ? ~ ."),
            vec![
                OpenParen,
                CloseParen,
                OpenBrace,
                CloseBrace,
                OpenBracket,
                CloseBracket,
                Semicolon,
                Comma,
                Colon,
                Question,
                Tilde,
                Dot,
            ]
        );
    }

    #[test]
    fn operators_longest_match() {
        use TokenKind::*;
        assert_eq!(
            kinds_of("+ ++ += - -- -= * ** *= **= / /= % %="),
            vec![
                Plus, PlusPlus, PlusEqual, Minus, MinusMinus, MinusEqual, Star, StarStar,
                StarEqual, StarStarEqual, Slash, SlashEqual, Percent, PercentEqual,
            ]
        );
        assert_eq!(
            kinds_of("== === != !== <= >= << >> >>> <<= >>= >>>= && || => ..."),
            vec![
                EqualEqual,
                EqualEqualEqual,
                BangEqual,
                BangEqualEqual,
                LessEqual,
                GreaterEqual,
                LessLess,
                GreaterGreater,
                GreaterGreaterGreater,
                LessLessEqual,
                GreaterGreaterEqual,
                GreaterGreaterGreaterEqual,
                AmpersandAmpersand,
                PipePipe,
                Arrow,
                DotDotDot,
            ]
        );
        assert_eq!(
            kinds_of("& &= | |= ^ ^= ! = < >"),
            vec![
                Ampersand, AmpersandEqual, Pipe, PipeEqual, Caret, CaretEqual, Bang, Equal,
                Less, Greater,
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        let code = PaddedString::new("let wat = null;");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        assert_eq!(lexer.peek().kind, TokenKind::LetKeyword);
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::Identifier);
        assert_eq!(lexer.peek().identifier_name().normalized_name(), "wat");
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::Equal);
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::NullKeyword);
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::Semicolon);
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::EndOfFile);
        // peek after end-of-file is idempotent
        assert_eq!(lexer.peek().kind, TokenKind::EndOfFile);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn token_spans_stay_in_bounds() {
        let source = "let x = f(a, `t${b}c`) / 2;";
        let code = PaddedString::new(source);
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        loop {
            let token = *lexer.peek();
            assert!(token.begin <= token.end);
            assert!((token.end as usize) <= source.len());
            if token.kind == TokenKind::EndOfFile {
                break;
            }
            lexer.skip();
        }
    }

    #[test]
    fn escaped_identifier_is_normalized() {
        let code = PaddedString::new(r"w\u{61}t");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        let token = lexer.peek();
        assert_eq!(token.kind, TokenKind::Identifier);
        let identifier = token.identifier_name();
        assert_eq!(identifier.normalized_name(), "wat");
        // The span still covers the raw escape bytes.
        assert_eq!(identifier.span(), SourceSpan::new(0, 8));
    }

    #[test]
    fn escaped_identifier_four_digit_form() {
        let code = PaddedString::new(r"abc");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        assert_eq!(lexer.peek().kind, TokenKind::Identifier);
        assert_eq!(lexer.peek().identifier_name().normalized_name(), "abc");
    }

    #[test]
    fn unescaped_identifier_borrows_source() {
        let code = PaddedString::new("hello");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        let identifier = lexer.peek().identifier_name();
        assert_eq!(identifier.span().len() as usize, identifier.normalized_name().len());
    }

    #[test]
    fn leading_newline_flag() {
        let code = PaddedString::new("a\nb c");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        assert!(!lexer.peek().has_leading_newline());
        lexer.skip();
        assert!(lexer.peek().has_leading_newline());
        lexer.skip();
        assert!(!lexer.peek().has_leading_newline());
    }

    #[test]
    fn newline_inside_block_comment_counts() {
        let code = PaddedString::new("a /* \n */ b");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        lexer.skip();
        assert!(lexer.peek().has_leading_newline());
    }

    #[test]
    fn number_formats() {
        use TokenKind::*;
        assert_eq!(
            kinds_of("42 3.14 .5 0xff 0b1010 0o777 0777 1_000 6e2 1e-3 42n 0x10n"),
            vec![
                Number, Number, Number, Number, Number, Number, Number, Number, Number, Number,
                Number, Number,
            ]
        );
        lex_with_diagnostics("42 0xff 1_000 0777 42n", |diagnostics| {
            assert!(diagnostics.is_empty());
        });
    }

    #[test]
    fn number_garbage_is_reported() {
        lex_with_diagnostics("123abc", |diagnostics| {
            assert_eq!(diagnostics.len(), 1);
            assert!(matches!(
                diagnostics.diagnostics()[0],
                Diag::UnexpectedCharactersInNumber { characters }
                    if characters == SourceSpan::new(3, 6)
            ));
        });
    }

    #[test]
    fn octal_with_eight_is_reported() {
        lex_with_diagnostics("0778", |diagnostics| {
            assert_eq!(diagnostics.len(), 1);
            assert!(matches!(
                diagnostics.diagnostics()[0],
                Diag::UnexpectedCharactersInOctalNumber { characters }
                    if characters == SourceSpan::new(3, 4)
            ));
        });
    }

    #[test]
    fn big_int_diagnostics() {
        lex_with_diagnostics("1.2n", |diagnostics| {
            assert!(matches!(
                diagnostics.diagnostics()[0],
                Diag::BigIntLiteralContainsDecimalPoint { literal }
                    if literal == SourceSpan::new(0, 4)
            ));
        });
        lex_with_diagnostics("1e3n", |diagnostics| {
            assert!(matches!(
                diagnostics.diagnostics()[0],
                Diag::BigIntLiteralContainsExponent { .. }
            ));
        });
        lex_with_diagnostics("0123n", |diagnostics| {
            assert!(matches!(
                diagnostics.diagnostics()[0],
                Diag::BigIntLiteralContainsLeadingZero { .. }
            ));
        });
        lex_with_diagnostics("0n 1n 0xFFn", |diagnostics| {
            assert!(diagnostics.is_empty());
        });
    }

    #[test]
    fn strings() {
        assert_eq!(
            kinds_of(r#""hello" 'world' "es\"cape""#),
            vec![TokenKind::String, TokenKind::String, TokenKind::String]
        );
    }

    #[test]
    fn unclosed_string_spans_to_end_of_line() {
        lex_with_diagnostics("'abc\nd", |diagnostics| {
            assert!(matches!(
                diagnostics.diagnostics()[0],
                Diag::UnclosedStringLiteral { string_literal }
                    if string_literal == SourceSpan::new(0, 4)
            ));
        });
    }

    #[test]
    fn unclosed_block_comment() {
        lex_with_diagnostics("a /* b", |diagnostics| {
            assert!(matches!(
                diagnostics.diagnostics()[0],
                Diag::UnclosedBlockComment { comment_open }
                    if comment_open == SourceSpan::new(2, 4)
            ));
        });
    }

    #[test]
    fn templates() {
        assert_eq!(kinds_of("`hello`"), vec![TokenKind::CompleteTemplate]);

        let code = PaddedString::new("`a${b}c`");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        assert_eq!(lexer.peek().kind, TokenKind::IncompleteTemplate);
        let template_begin = lexer.peek().begin;
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::Identifier);
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::CloseBrace);
        lexer.skip_in_template(template_begin);
        assert_eq!(lexer.peek().kind, TokenKind::CompleteTemplate);
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::EndOfFile);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unclosed_template() {
        lex_with_diagnostics("`abc", |diagnostics| {
            assert!(matches!(
                diagnostics.diagnostics()[0],
                Diag::UnclosedTemplate { incomplete_template }
                    if incomplete_template == SourceSpan::new(0, 4)
            ));
        });
    }

    #[test]
    fn reparse_slash_as_regexp() {
        let code = PaddedString::new("/re[g/]exp/gi ");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        assert_eq!(lexer.peek().kind, TokenKind::Slash);
        lexer.reparse_as_regexp();
        let token = lexer.peek();
        assert_eq!(token.kind, TokenKind::Regexp);
        assert_eq!(token.span(), SourceSpan::new(0, 13));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn reparse_slash_equal_as_regexp() {
        let code = PaddedString::new("/=re/");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        assert_eq!(lexer.peek().kind, TokenKind::SlashEqual);
        lexer.reparse_as_regexp();
        assert_eq!(lexer.peek().span(), SourceSpan::new(0, 5));
    }

    #[test]
    fn unclosed_regexp() {
        let code = PaddedString::new("/abc\n");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        lexer.reparse_as_regexp();
        assert_eq!(lexer.peek().kind, TokenKind::Regexp);
        assert!(matches!(
            diagnostics.diagnostics()[0],
            Diag::UnclosedRegexpLiteral { .. }
        ));
    }

    #[test]
    fn insert_semicolon_rewinds() {
        let code = PaddedString::new("x\n++\ny");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        assert_eq!(lexer.peek().kind, TokenKind::Identifier);
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::PlusPlus);
        assert!(lexer.peek().has_leading_newline());
        lexer.insert_semicolon();
        let token = lexer.peek();
        assert_eq!(token.kind, TokenKind::Semicolon);
        assert_eq!(token.span(), SourceSpan::new(1, 1));
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::PlusPlus);
        lexer.skip();
        assert_eq!(lexer.peek().kind, TokenKind::Identifier);
    }

    #[test]
    fn hash_is_reported_and_skipped() {
        lex_with_diagnostics("# x", |diagnostics| {
            assert!(matches!(
                diagnostics.diagnostics()[0],
                Diag::UnexpectedHashCharacter { hash } if hash == SourceSpan::new(0, 1)
            ));
        });
        assert_eq!(kinds_of("# x"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn unknown_character_is_fatal() {
        lex_with_diagnostics("a @ b", |diagnostics| {
            assert_eq!(diagnostics.fatal_errors().len(), 1);
        });
    }

    #[test]
    fn unicode_identifier() {
        let code = PaddedString::new("café");
        let arena = Bump::new();
        let mut diagnostics = DiagnosticCollection::new();
        let lexer = Lexer::new(code.view(), &arena, &mut diagnostics);
        assert_eq!(lexer.peek().kind, TokenKind::Identifier);
        assert_eq!(lexer.peek().identifier_name().normalized_name(), "café");
    }
}
