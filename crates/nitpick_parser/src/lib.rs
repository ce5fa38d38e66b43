//! nitpick_parser: the expression parser and statement dispatcher.
//!
//! The parser pulls tokens from the lexer, builds an arena-allocated
//! expression AST, and emits scope/variable visit events into a
//! [`visit::ParseVisitor`] as it goes. Function-expression bodies are parsed
//! eagerly but their visit events are buffered and replayed when the
//! surrounding expression is committed, so the linter observes events in
//! evaluation order.

pub mod expression;
mod parser;
mod precedence;
pub mod visit;

pub use expression::{Expression, ExpressionKind, ExpressionRef, ObjectEntry};
pub use parser::Parser;
pub use visit::{BufferingVisitor, ParseVisitor, VisitEvent};
