//! nitpick_diagnostics: the diagnostic catalogue and reporting channel.
//!
//! Every programmer mistake the analyzer can detect is one variant of
//! [`Diag`]. Components hand diagnostics to a [`DiagnosticSink`]; the default
//! [`DiagnosticCollection`] stores them in emission order for inspection.
//! The catalogue is closed: downstream consumers can match exhaustively.

use std::fmt;

use nitpick_core::{Identifier, SourceSpan, VariableKind};

/// A diagnostic describing one mistake in the analyzed source.
///
/// Variants carry their semantically named locations; [`Diag::primary_span`],
/// [`Diag::secondary_span`], and [`Diag::variable_kind`] provide the uniform
/// view used by reporters and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Diag<'code> {
    // ------------------------------------------------------------------
    // Lexer
    // ------------------------------------------------------------------
    UnclosedBlockComment { comment_open: SourceSpan },
    UnclosedStringLiteral { string_literal: SourceSpan },
    UnclosedTemplate { incomplete_template: SourceSpan },
    UnclosedRegexpLiteral { regexp_literal: SourceSpan },
    UnexpectedCharactersInNumber { characters: SourceSpan },
    UnexpectedCharactersInOctalNumber { characters: SourceSpan },
    UnexpectedHashCharacter { hash: SourceSpan },
    BigIntLiteralContainsDecimalPoint { literal: SourceSpan },
    BigIntLiteralContainsExponent { literal: SourceSpan },
    BigIntLiteralContainsLeadingZero { literal: SourceSpan },

    // ------------------------------------------------------------------
    // Parser
    // ------------------------------------------------------------------
    MissingOperandForOperator { operator: SourceSpan },
    MissingSemicolonAfterExpression { expression_end: SourceSpan },
    MissingCommaBetweenObjectLiteralEntries { entry_boundary: SourceSpan },
    UnmatchedParenthesis { opener: SourceSpan },
    InvalidExpressionLeftOfAssignment { lhs: SourceSpan },
    InvalidBindingInLetStatement { binding: SourceSpan },
    LetWithNoBindings { let_keyword: SourceSpan },
    StrayCommaInLetStatement { comma: SourceSpan },
    UnexpectedIdentifier { identifier: SourceSpan },

    // ------------------------------------------------------------------
    // Linter
    // ------------------------------------------------------------------
    UseOfUndeclaredVariable {
        name: Identifier<'code>,
    },
    AssignmentToUndeclaredVariable {
        assignment: Identifier<'code>,
    },
    AssignmentToConstVariable {
        declaration: Identifier<'code>,
        assignment: Identifier<'code>,
        var_kind: VariableKind,
    },
    AssignmentToConstGlobalVariable {
        assignment: Identifier<'code>,
    },
    AssignmentBeforeVariableDeclaration {
        assignment: Identifier<'code>,
        declaration: Identifier<'code>,
    },
    VariableUsedBeforeDeclaration {
        use_site: Identifier<'code>,
        declaration: Identifier<'code>,
    },
    RedeclarationOfVariable {
        redeclaration: Identifier<'code>,
        original_declaration: Identifier<'code>,
    },
    RedeclarationOfGlobalVariable {
        redeclaration: Identifier<'code>,
    },
}

impl<'code> Diag<'code> {
    /// The span a reporter should point at.
    pub fn primary_span(&self) -> SourceSpan {
        use Diag::*;
        match self {
            UnclosedBlockComment { comment_open: span }
            | UnclosedStringLiteral { string_literal: span }
            | UnclosedTemplate { incomplete_template: span }
            | UnclosedRegexpLiteral { regexp_literal: span }
            | UnexpectedCharactersInNumber { characters: span }
            | UnexpectedCharactersInOctalNumber { characters: span }
            | UnexpectedHashCharacter { hash: span }
            | BigIntLiteralContainsDecimalPoint { literal: span }
            | BigIntLiteralContainsExponent { literal: span }
            | BigIntLiteralContainsLeadingZero { literal: span }
            | MissingOperandForOperator { operator: span }
            | MissingSemicolonAfterExpression { expression_end: span }
            | MissingCommaBetweenObjectLiteralEntries { entry_boundary: span }
            | UnmatchedParenthesis { opener: span }
            | InvalidExpressionLeftOfAssignment { lhs: span }
            | InvalidBindingInLetStatement { binding: span }
            | LetWithNoBindings { let_keyword: span }
            | StrayCommaInLetStatement { comma: span }
            | UnexpectedIdentifier { identifier: span } => *span,
            UseOfUndeclaredVariable { name } => name.span(),
            AssignmentToUndeclaredVariable { assignment }
            | AssignmentToConstGlobalVariable { assignment }
            | AssignmentToConstVariable { assignment, .. }
            | AssignmentBeforeVariableDeclaration { assignment, .. } => assignment.span(),
            VariableUsedBeforeDeclaration { use_site, .. } => use_site.span(),
            RedeclarationOfVariable { redeclaration, .. }
            | RedeclarationOfGlobalVariable { redeclaration } => redeclaration.span(),
        }
    }

    /// A related location (e.g. the original declaration), if any.
    pub fn secondary_span(&self) -> Option<SourceSpan> {
        use Diag::*;
        match self {
            AssignmentToConstVariable { declaration, .. }
            | AssignmentBeforeVariableDeclaration { declaration, .. }
            | VariableUsedBeforeDeclaration { declaration, .. } => Some(declaration.span()),
            RedeclarationOfVariable {
                original_declaration,
                ..
            } => Some(original_declaration.span()),
            _ => None,
        }
    }

    /// The kind of the involved declaration, if the diagnostic carries one.
    pub fn variable_kind(&self) -> Option<VariableKind> {
        match self {
            Diag::AssignmentToConstVariable { var_kind, .. } => Some(*var_kind),
            _ => None,
        }
    }

    /// The note text attached to the secondary span, if any.
    pub fn note(&self) -> Option<&'static str> {
        use Diag::*;
        match self {
            AssignmentToConstVariable { .. } => Some("const variable declared here"),
            AssignmentBeforeVariableDeclaration { .. }
            | VariableUsedBeforeDeclaration { .. } => Some("variable declared here"),
            RedeclarationOfVariable { .. } => Some("variable already declared here"),
            _ => None,
        }
    }
}

impl fmt::Display for Diag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Diag::*;
        match self {
            UnclosedBlockComment { .. } => f.write_str("unclosed block comment"),
            UnclosedStringLiteral { .. } => f.write_str("unclosed string literal"),
            UnclosedTemplate { .. } => f.write_str("unclosed template"),
            UnclosedRegexpLiteral { .. } => f.write_str("unclosed regexp literal"),
            UnexpectedCharactersInNumber { .. } => {
                f.write_str("unexpected characters in number literal")
            }
            UnexpectedCharactersInOctalNumber { .. } => {
                f.write_str("unexpected characters in octal literal")
            }
            UnexpectedHashCharacter { .. } => f.write_str("unexpected '#'"),
            BigIntLiteralContainsDecimalPoint { .. } => {
                f.write_str("BigInt literal contains decimal point")
            }
            BigIntLiteralContainsExponent { .. } => {
                f.write_str("BigInt literal contains exponent")
            }
            BigIntLiteralContainsLeadingZero { .. } => {
                f.write_str("BigInt literal has a leading 0 digit")
            }
            MissingOperandForOperator { .. } => f.write_str("missing operand for operator"),
            MissingSemicolonAfterExpression { .. } => {
                f.write_str("missing semicolon after expression")
            }
            MissingCommaBetweenObjectLiteralEntries { .. } => {
                f.write_str("missing comma between object literal entries")
            }
            UnmatchedParenthesis { .. } => f.write_str("unmatched parenthesis"),
            InvalidExpressionLeftOfAssignment { .. } => {
                f.write_str("invalid expression left of assignment")
            }
            InvalidBindingInLetStatement { .. } => {
                f.write_str("invalid binding in let statement")
            }
            LetWithNoBindings { .. } => f.write_str("let with no bindings"),
            StrayCommaInLetStatement { .. } => f.write_str("stray comma in let statement"),
            UnexpectedIdentifier { .. } => f.write_str("unexpected identifier"),
            UseOfUndeclaredVariable { name } => {
                write!(f, "use of undeclared variable: {}", name.normalized_name())
            }
            AssignmentToUndeclaredVariable { .. } => {
                f.write_str("assignment to undeclared variable")
            }
            AssignmentToConstVariable { .. } => f.write_str("assignment to const variable"),
            AssignmentToConstGlobalVariable { .. } => {
                f.write_str("assignment to const global variable")
            }
            AssignmentBeforeVariableDeclaration { .. } => {
                f.write_str("variable assigned before its declaration")
            }
            VariableUsedBeforeDeclaration { use_site, .. } => write!(
                f,
                "variable used before declaration: {}",
                use_site.normalized_name()
            ),
            RedeclarationOfVariable { redeclaration, .. } => write!(
                f,
                "redeclaration of variable: {}",
                redeclaration.normalized_name()
            ),
            RedeclarationOfGlobalVariable { .. } => {
                f.write_str("redeclaration of global variable")
            }
        }
    }
}

/// A fatal report for a construct the analyzer cannot tokenize or parse.
///
/// This is the one condition under which an analysis ends early. It records
/// where in the analyzer the limit was hit and what input triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct FatalError {
    /// Analyzer source file (`file!()`).
    pub origin_file: &'static str,
    /// Analyzer source line (`line!()`).
    pub origin_line: u32,
    /// Analyzer function name.
    pub origin_function: &'static str,
    /// What was encountered.
    pub kind: FatalErrorKind,
    /// Where in the analyzed source it was encountered.
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FatalErrorKind {
    /// A character the lexer has no rule for.
    UnimplementedCharacter,
    /// A token the parser has no production for, described by its token text.
    UnimplementedToken,
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            FatalErrorKind::UnimplementedCharacter => "character",
            FatalErrorKind::UnimplementedToken => "token",
        };
        write!(
            f,
            "{}:{}: {}: unimplemented {} at offset {}",
            self.origin_file, self.origin_line, self.origin_function, what, self.span.begin
        )
    }
}

/// Receives diagnostics as they are produced.
///
/// Implementations must not block and must not panic; analysis continues
/// after every `report` call (and stops after `report_fatal`).
pub trait DiagnosticSink<'code> {
    fn report(&mut self, diagnostic: Diag<'code>);
    fn report_fatal(&mut self, fatal: FatalError);
}

/// The default sink: stores diagnostics in emission order.
#[derive(Default)]
pub struct DiagnosticCollection<'code> {
    diagnostics: Vec<Diag<'code>>,
    fatal_errors: Vec<FatalError>,
}

impl<'code> DiagnosticCollection<'code> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diag<'code>] {
        &self.diagnostics
    }

    pub fn fatal_errors(&self) -> &[FatalError] {
        &self.fatal_errors
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty() && self.fatal_errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diag<'code>> {
        self.diagnostics.iter()
    }

    /// Append everything from another collection, preserving order.
    pub fn extend(&mut self, other: DiagnosticCollection<'code>) {
        self.diagnostics.extend(other.diagnostics);
        self.fatal_errors.extend(other.fatal_errors);
    }
}

impl<'code> DiagnosticSink<'code> for DiagnosticCollection<'code> {
    fn report(&mut self, diagnostic: Diag<'code>) {
        self.diagnostics.push(diagnostic);
    }

    fn report_fatal(&mut self, fatal: FatalError) {
        self.fatal_errors.push(fatal);
    }
}

/// A sink that only counts, for callers that need a pass/fail answer.
#[derive(Default)]
pub struct CountingSink {
    pub diagnostic_count: usize,
    pub fatal_count: usize,
}

impl<'code> DiagnosticSink<'code> for CountingSink {
    fn report(&mut self, _diagnostic: Diag<'code>) {
        self.diagnostic_count += 1;
    }

    fn report_fatal(&mut self, _fatal: FatalError) {
        self.fatal_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_preserves_order() {
        let mut collection = DiagnosticCollection::new();
        collection.report(Diag::UnmatchedParenthesis {
            opener: SourceSpan::new(4, 5),
        });
        collection.report(Diag::MissingOperandForOperator {
            operator: SourceSpan::new(9, 10),
        });
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.diagnostics()[0].primary_span(), SourceSpan::new(4, 5));
        assert_eq!(collection.diagnostics()[1].primary_span(), SourceSpan::new(9, 10));
    }

    #[test]
    fn secondary_span_and_kind() {
        let declaration = Identifier::new(SourceSpan::new(6, 7), "y");
        let assignment = Identifier::new(SourceSpan::new(14, 15), "y");
        let diag = Diag::AssignmentToConstVariable {
            declaration,
            assignment,
            var_kind: VariableKind::Const,
        };
        assert_eq!(diag.primary_span(), SourceSpan::new(14, 15));
        assert_eq!(diag.secondary_span(), Some(SourceSpan::new(6, 7)));
        assert_eq!(diag.variable_kind(), Some(VariableKind::Const));
        assert_eq!(diag.to_string(), "assignment to const variable");
    }

    #[test]
    fn counting_sink() {
        let mut sink = CountingSink::default();
        sink.report(Diag::LetWithNoBindings {
            let_keyword: SourceSpan::new(0, 3),
        });
        assert_eq!(sink.diagnostic_count, 1);
        assert_eq!(sink.fatal_count, 0);
    }
}
