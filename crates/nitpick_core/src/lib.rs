//! nitpick_core: Core source-text types for the nitpick JavaScript linter.
//!
//! Provides the padded source buffer, byte spans, the lazy line/column
//! locator, and the identifier/variable-kind vocabulary shared by the
//! lexer, parser, and linter.

pub mod language;
pub mod padded;
pub mod text;

// Re-export commonly used types
pub use language::{FunctionAttributes, Identifier, VariableKind};
pub use padded::{PaddedString, PaddedStringView};
pub use text::{Locator, SourceSpan};
