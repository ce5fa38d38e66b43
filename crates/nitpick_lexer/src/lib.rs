//! nitpick_lexer: tokenization of JavaScript source text.
//!
//! The lexer reads source bytes one token at a time with single-token
//! lookahead. The parser drives it through `peek`/`skip` and the
//! context-sensitive re-lex entry points (`reparse_as_regexp`,
//! `skip_in_template`, `insert_semicolon`).

mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenFlags, TokenKind};
