//! nitpick_linter: scope resolution over the parser's visit stream.
//!
//! The linter maintains a stack of lexical scopes, resolves variable
//! references against declarations (`var`/`function` hoist to the enclosing
//! function scope; `let`/`const`/`class` stay in their block), and reports
//! name-resolution mistakes.

mod globals;
mod linter;
mod scope;

pub use linter::Linter;
pub use scope::{DeclaredVariable, DeclaredVariableScope, Scope, UsedVariable, UsedVariableKind};
