//! Linter integration tests.
//!
//! Each test drives the full parse-and-visit pipeline over a source snippet
//! and inspects the diagnostics the linter produced.

use bumpalo::Bump;
use nitpick_core::{PaddedString, SourceSpan, VariableKind};
use nitpick_diagnostics::{Diag, DiagnosticCollection};
use nitpick_linter::Linter;
use nitpick_parser::Parser;

/// Lint `source` (which must be syntactically clean) and hand the linter's
/// diagnostics to `check`.
fn lint(source: &str, check: impl FnOnce(&[Diag<'_>])) {
    let code = PaddedString::new(source);
    let arena = Bump::new();
    let mut parser_diagnostics = DiagnosticCollection::new();
    let mut linter_diagnostics = DiagnosticCollection::new();
    {
        let mut linter = Linter::new(&mut linter_diagnostics);
        let mut parser = Parser::new(&arena, code.view(), &mut parser_diagnostics);
        parser.parse_and_visit_module(&mut linter);
        assert_eq!(linter.scope_count(), 0, "source: {source}");
    }
    assert!(
        parser_diagnostics.is_empty(),
        "unexpected parser diagnostics for {source:?}: {:?}",
        parser_diagnostics.diagnostics()
    );
    check(linter_diagnostics.diagnostics());
}

fn lint_no_errors(source: &str) {
    lint(source, |diagnostics| {
        assert!(
            diagnostics.is_empty(),
            "source: {source}, diagnostics: {diagnostics:?}"
        );
    });
}

// ============================================================================
// Uses and declarations
// ============================================================================

#[test]
fn empty_module() {
    lint_no_errors("");
}

#[test]
fn declared_variables_are_usable() {
    lint_no_errors("let x; x;");
    lint_no_errors("var x; x;");
    lint_no_errors("const x = 1; x;");
    lint_no_errors("let x = 1; let y = x + 1; y;");
}

#[test]
fn use_of_undeclared_variable() {
    lint("missingVar;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::UseOfUndeclaredVariable { name }]
                if name.normalized_name() == "missingVar"
                    && name.span() == SourceSpan::new(0, 10)
        ));
    });
}

#[test]
fn typeof_of_undeclared_variable_is_silent() {
    lint_no_errors("typeof missingVar;");
    // Other undeclared uses in the same operand still report.
    lint("typeof missingVar.property;", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::UseOfUndeclaredVariable { .. }]));
    });
}

#[test]
fn assignment_to_undeclared_variable() {
    lint("someVar = 1;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::AssignmentToUndeclaredVariable { assignment }]
                if assignment.normalized_name() == "someVar"
        ));
    });
}

#[test]
fn assignment_to_const_variable() {
    lint("let x; x = 1; const y = 2; y = 3;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::AssignmentToConstVariable {
                declaration,
                assignment,
                var_kind: VariableKind::Const,
            }]
            if assignment.span() == SourceSpan::new(27, 28)
                && declaration.span() == SourceSpan::new(20, 21)
        ));
    });
}

#[test]
fn compound_assignment_to_const_variable() {
    lint("const n = 1; n += 2;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::AssignmentToConstVariable { .. }]
        ));
    });
}

#[test]
fn increment_of_const_variable() {
    lint("const n = 1; n++;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::AssignmentToConstVariable { .. }]
        ));
    });
}

// ============================================================================
// Temporal dead zone
// ============================================================================

#[test]
fn use_before_declaration() {
    lint("x; let x;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::VariableUsedBeforeDeclaration {
                use_site,
                declaration,
            }]
            if use_site.span() == SourceSpan::new(0, 1)
                && declaration.span() == SourceSpan::new(7, 8)
        ));
    });
}

#[test]
fn let_initialized_from_itself() {
    lint("let x = x;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::VariableUsedBeforeDeclaration {
                use_site,
                declaration,
            }]
            if use_site.span() == SourceSpan::new(8, 9)
                && declaration.span() == SourceSpan::new(4, 5)
        ));
    });
}

#[test]
fn assignment_before_declaration() {
    lint("x = 1; let x;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::AssignmentBeforeVariableDeclaration { .. }]
        ));
    });
}

#[test]
fn use_before_declaration_in_block() {
    lint("{ x; let x; }", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::VariableUsedBeforeDeclaration { .. }]
        ));
    });
}

#[test]
fn function_scopes_permit_use_before_declaration() {
    // The function body may run after the declaration is reached.
    lint_no_errors("function f() { x; let x; }");
}

#[test]
fn var_use_before_declaration_is_hoisted() {
    lint_no_errors("x = 1; var x;");
    lint_no_errors("x; var x;");
}

// ============================================================================
// Hoisting
// ============================================================================

#[test]
fn function_use_before_declaration() {
    lint_no_errors("f(); function f() {}");
}

#[test]
fn var_hoists_out_of_block() {
    lint_no_errors("{ var x; } x;");
    lint_no_errors("x; { var x; }");
    lint_no_errors("function f() { { var x; } x; }");
}

#[test]
fn function_hoists_out_of_block() {
    lint_no_errors("g(); { function g() {} }");
}

#[test]
fn let_does_not_escape_its_block() {
    lint("{ let x; } x;", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::UseOfUndeclaredVariable { .. }]));
    });
}

#[test]
fn var_does_not_escape_its_function() {
    lint("function f() { var x; } x;", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::UseOfUndeclaredVariable { .. }]));
    });
}

#[test]
fn forward_reference_from_function_body() {
    lint_no_errors("function f() { x; } let x;");
    lint_no_errors("let f = () => captured; let captured;");
}

#[test]
fn const_assignment_from_function_body_reports() {
    lint("function f() { y = 3; } const y = 2;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::AssignmentToConstVariable { var_kind: VariableKind::Const, .. }]
        ));
    });
}

// ============================================================================
// Redeclarations
// ============================================================================

#[test]
fn redeclaration_of_variable() {
    lint("function f() { let x; let x; }", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::RedeclarationOfVariable {
                redeclaration,
                original_declaration,
            }]
            if redeclaration.span() == SourceSpan::new(26, 27)
                && original_declaration.span() == SourceSpan::new(19, 20)
        ));
    });
    lint("function f() { var x; let x; }", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::RedeclarationOfVariable { .. }]));
    });
    lint("function f() { let x; var x; }", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::RedeclarationOfVariable { .. }]));
    });
}

#[test]
fn redeclaration_in_module_scope_is_global() {
    lint("let x; let x;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::RedeclarationOfGlobalVariable { redeclaration }]
                if redeclaration.span() == SourceSpan::new(11, 12)
        ));
    });
    lint("class C {} class C {}", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::RedeclarationOfGlobalVariable { .. }]
        ));
    });
}

#[test]
fn legal_redeclarations() {
    lint_no_errors("var x; var x;");
    lint_no_errors("function f() {} function f() {}");
    lint_no_errors("var f; function f() {}");
    lint_no_errors("function f(a, a) {}");
    lint_no_errors("function f(a) { var a; }");
    lint_no_errors("try {} catch (e) { var e; }");
}

#[test]
fn parameter_let_conflict() {
    lint("function f(a) { let a; }", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::RedeclarationOfVariable { .. }]));
    });
}

// ============================================================================
// Globals
// ============================================================================

#[test]
fn globals_are_predeclared() {
    lint_no_errors("Math.sqrt(4); console.log(NaN, Infinity, undefined);");
}

#[test]
fn assignment_to_const_global() {
    lint("Math = 5;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::AssignmentToConstGlobalVariable { assignment }]
                if assignment.normalized_name() == "Math"
        ));
    });
}

#[test]
fn redeclaring_a_global_reports() {
    lint("let Array;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::RedeclarationOfGlobalVariable { .. }]
        ));
    });
}

// ============================================================================
// Functions, parameters, arguments
// ============================================================================

#[test]
fn parameters_are_declared() {
    lint_no_errors("function f(a, b) { a + b; }");
    lint_no_errors("function f({x, y: z}, [w]) { x; z; w; }");
    lint_no_errors("let g = (a) => a;");
    lint_no_errors("let h = ({a, b}) => a + b;");
}

#[test]
fn parameter_default_uses_are_resolved() {
    lint_no_errors("let fallback = 1; function f(a = fallback) { a; }");
    lint("function f(a = missingDefault) {}", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::UseOfUndeclaredVariable { .. }]));
    });
}

#[test]
fn arguments_is_implicit_in_functions() {
    lint_no_errors("function f() { arguments; }");
    lint_no_errors("function f() { arguments[0] = 1; }");
    lint("arguments;", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::UseOfUndeclaredVariable { .. }]));
    });
}

#[test]
fn named_function_expression_self_binding() {
    lint_no_errors("(function recur() { recur(); });");
    lint("(function recur() {}); recur();", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::UseOfUndeclaredVariable { name }]
                if name.normalized_name() == "recur"
        ));
    });
}

#[test]
fn function_expression_bodies_are_visited() {
    lint("let f = function() { missingInBody; };", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::UseOfUndeclaredVariable { name }]
                if name.normalized_name() == "missingInBody"
        ));
    });
}

// ============================================================================
// Statement scoping
// ============================================================================

#[test]
fn catch_binding_is_scoped_to_the_catch_block() {
    lint_no_errors("try {} catch (error) { error; }");
    lint("try {} catch (error) {} error;", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::UseOfUndeclaredVariable { .. }]));
    });
}

#[test]
fn for_scope() {
    lint_no_errors("for (let i = 0; i < 10; i = i + 1) { i; }");
    lint_no_errors("let xs = []; for (const x of xs) { x; }");
    lint_no_errors("let o = {}; for (let key in o) { key; }");
    lint("for (let i = 0; i < 3; i = i + 1) {} i;", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::UseOfUndeclaredVariable { .. }]));
    });
}

#[test]
fn for_over_existing_binding() {
    lint_no_errors("let x; let xs = []; for (x of xs) { x; }");
}

#[test]
fn var_in_for_scope_hoists() {
    lint_no_errors("for (var i = 0; i < 3; i = i + 1) {} i;");
}

#[test]
fn switch_body_is_a_block_scope() {
    lint_no_errors("let v = 1; switch (v) { case 1: let inCase; inCase; }");
    lint("switch (0) { case 1: let x; } x;", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::UseOfUndeclaredVariable { .. }]));
    });
}

#[test]
fn shadowing_is_legal() {
    lint_no_errors("let x; { let x; x; }");
    lint_no_errors("let x; function f(x) { x; }");
}

#[test]
fn class_names_and_scopes() {
    lint_no_errors("class Point {} new Point();");
    lint_no_errors("class Counter { increment(amount) { amount; } }");
    lint_no_errors("class Base {} class Derived extends Base {}");
    lint_no_errors("let shared = 1; class User { touch() { shared; } }");
}

// ============================================================================
// Imports and exports
// ============================================================================

#[test]
fn import_bindings() {
    lint_no_errors("import { readFile } from 'fs'; readFile;");
    lint_no_errors("import { readFile as read } from 'fs'; read;");
    lint_no_errors("import fs from 'fs'; fs;");
    lint_no_errors("import * as path from 'path'; path;");
}

#[test]
fn assignment_to_import_binding() {
    lint("import cfg from 'cfg'; cfg = 1;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::AssignmentToConstVariable {
                var_kind: VariableKind::Import,
                ..
            }]
        ));
    });
}

#[test]
fn export_references_are_uses() {
    lint_no_errors("let a = 1; export { a };");
    lint("export { missing };", |diagnostics| {
        assert!(matches!(diagnostics, [Diag::UseOfUndeclaredVariable { .. }]));
    });
}

// ============================================================================
// Diagnostic ordering and determinism
// ============================================================================

#[test]
fn sibling_scopes_report_in_exit_order() {
    lint("{ let a; let a; } { let b; let b; }", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [
                Diag::RedeclarationOfVariable { redeclaration: first, .. },
                Diag::RedeclarationOfVariable { redeclaration: second, .. },
            ]
            if first.normalized_name() == "a" && second.normalized_name() == "b"
        ));
    });
}

#[test]
fn every_reported_name_is_unresolvable() {
    lint("let declared; declared; missing;", |diagnostics| {
        for diagnostic in diagnostics {
            if let Diag::UseOfUndeclaredVariable { name } = diagnostic {
                assert_ne!(name.normalized_name(), "declared");
            }
        }
        assert_eq!(diagnostics.len(), 1);
    });
}

#[test]
fn escaped_identifiers_resolve_by_normalized_name() {
    lint_no_errors("let wat; w\\u{61}t;");
    lint("let wat; w\\u{61}tt;", |diagnostics| {
        assert!(matches!(
            diagnostics,
            [Diag::UseOfUndeclaredVariable { name }]
                if name.normalized_name() == "watt"
        ));
    });
}
