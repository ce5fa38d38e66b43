//! The linter: a `ParseVisitor` that resolves variable references.
//!
//! Scopes form a stack. References are recorded as pending uses; a use
//! resolves either when a matching declaration arrives in its own scope
//! (which is how use-before-declaration is detected), when its scope exits,
//! or at end of module. Unresolved uses escape to the parent scope's
//! descendant list, which is exempt from order checks because the inner
//! scope may execute after the declaration is reached.

use nitpick_core::{Identifier, VariableKind};
use nitpick_diagnostics::{Diag, DiagnosticSink};
use nitpick_parser::ParseVisitor;

use crate::globals::GLOBAL_VARIABLES;
use crate::scope::{
    DeclaredVariable, DeclaredVariableScope, Scope, UsedVariable, UsedVariableKind,
};

pub struct Linter<'code, 'reporter> {
    scopes: Vec<Scope<'code>>,
    reporter: &'reporter mut dyn DiagnosticSink<'code>,
}

impl<'code, 'reporter> Linter<'code, 'reporter> {
    /// Create a linter whose module scope is seeded with the ECMAScript
    /// global names as `const` declarations.
    pub fn new(reporter: &'reporter mut dyn DiagnosticSink<'code>) -> Self {
        let mut module_scope = Scope::new();
        for name in GLOBAL_VARIABLES {
            module_scope.add_predefined_variable_declaration(name, VariableKind::Const);
        }
        Self {
            scopes: vec![module_scope],
            reporter,
        }
    }

    /// The current scope-stack depth. Zero after `visit_end_of_module`.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    fn current_scope(&mut self) -> &mut Scope<'code> {
        self.scopes.last_mut().expect("scope stack is empty")
    }

    fn record_use(&mut self, name: Identifier<'code>, kind: UsedVariableKind) {
        self.current_scope()
            .variables_used
            .push(UsedVariable::new(name, kind));
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn declare_variable(
        &mut self,
        name: Identifier<'code>,
        kind: VariableKind,
        declaration_scope: DeclaredVariableScope,
    ) {
        self.report_error_if_variable_declaration_conflicts_in_scope(
            name,
            kind,
            declaration_scope,
        );
        self.resolve_pending_uses_at_declaration(name, kind, declaration_scope);
        self.current_scope().add_variable_declaration(
            name.normalized_name(),
            DeclaredVariable {
                kind,
                declaration: Some(name),
                declaration_scope,
            },
        );
    }

    /// Consume pending same-scope uses of a newly declared name. For
    /// block-scoped kinds these references sit in the temporal dead zone.
    fn resolve_pending_uses_at_declaration(
        &mut self,
        name: Identifier<'code>,
        kind: VariableKind,
        declaration_scope: DeclaredVariableScope,
    ) {
        let scope = self.scopes.last_mut().expect("scope stack is empty");
        let mut resolved = Vec::new();
        scope.variables_used.retain(|used| {
            if used.name.normalized_name() == name.normalized_name() {
                resolved.push(*used);
                false
            } else {
                true
            }
        });

        let checks_use_order = declaration_scope == DeclaredVariableScope::DeclaredInCurrentScope
            && matches!(
                kind,
                VariableKind::Let | VariableKind::Const | VariableKind::Class
            )
            && !scope.allows_use_before_declaration;
        for used in resolved {
            if checks_use_order {
                match used.kind {
                    UsedVariableKind::Assignment => {
                        self.reporter.report(Diag::AssignmentBeforeVariableDeclaration {
                            assignment: used.name,
                            declaration: name,
                        });
                    }
                    UsedVariableKind::Use | UsedVariableKind::Typeof => {
                        self.reporter.report(Diag::VariableUsedBeforeDeclaration {
                            use_site: used.name,
                            declaration: name,
                        });
                    }
                }
            } else if matches!(kind, VariableKind::Const | VariableKind::Import)
                && used.kind == UsedVariableKind::Assignment
            {
                self.reporter.report(Diag::AssignmentToConstVariable {
                    declaration: name,
                    assignment: used.name,
                    var_kind: kind,
                });
            }
        }
    }

    fn report_error_if_variable_declaration_conflicts_in_scope(
        &mut self,
        name: Identifier<'code>,
        kind: VariableKind,
        declaration_scope: DeclaredVariableScope,
    ) {
        let in_module_scope = self.scopes.len() == 1;
        let scope = self.scopes.last().expect("scope stack is empty");
        let Some(existing) = scope.find_declared_variable(name.normalized_name()) else {
            return;
        };

        use DeclaredVariableScope::DeclaredInDescendantScope;
        use VariableKind::*;
        let other_kind = existing.kind;
        let redeclaration_ok = (other_kind == Function && kind == Parameter)
            || (other_kind == Function && kind == Function)
            || (other_kind == Parameter && kind == Function)
            || (other_kind == Var && kind == Function)
            || (other_kind == Parameter && kind == Parameter)
            || (other_kind == Catch && kind == Var)
            || (other_kind == Function && kind == Var)
            || (other_kind == Parameter && kind == Var)
            || (other_kind == Var && kind == Var)
            || (other_kind == Function
                && existing.declaration_scope == DeclaredInDescendantScope)
            || (kind == Function && declaration_scope == DeclaredInDescendantScope);
        if redeclaration_ok {
            return;
        }

        match existing.declaration {
            Some(original_declaration) if !in_module_scope => {
                self.reporter.report(Diag::RedeclarationOfVariable {
                    redeclaration: name,
                    original_declaration,
                });
            }
            _ => {
                self.reporter.report(Diag::RedeclarationOfGlobalVariable {
                    redeclaration: name,
                });
            }
        }
    }

    // ========================================================================
    // Scope exit
    // ========================================================================

    /// Resolve the exiting scope's pending uses and move the rest to the
    /// parent; optionally hoist `var`/`function` declarations up.
    fn propagate_to_parent_scope(&mut self, hoist_declarations: bool, consume_arguments: bool) {
        let mut exiting = self.scopes.pop().expect("scope stack is empty");

        if consume_arguments {
            let references_arguments = exiting
                .variables_used
                .iter()
                .chain(exiting.variables_used_in_descendant_scope.iter())
                .any(|used| used.name.normalized_name() == "arguments");
            if references_arguments && exiting.find_declared_variable("arguments").is_none() {
                exiting.add_predefined_variable_declaration("arguments", VariableKind::Var);
            }
        }

        let used = std::mem::take(&mut exiting.variables_used);
        let used_in_descendants = std::mem::take(&mut exiting.variables_used_in_descendant_scope);
        for used in used.into_iter().chain(used_in_descendants) {
            match exiting.find_declared_variable(used.name.normalized_name()) {
                Some(declared) => {
                    let declared = declared.clone();
                    self.report_error_if_assignment_is_illegal(&declared, used);
                }
                None => {
                    self.scopes
                        .last_mut()
                        .expect("scope stack is empty")
                        .variables_used_in_descendant_scope
                        .push(used);
                }
            }
        }

        if hoist_declarations {
            for set in exiting.declared_variables.values() {
                for declared in set.iter() {
                    if !matches!(declared.kind, VariableKind::Var | VariableKind::Function) {
                        continue;
                    }
                    let Some(declaration) = declared.declaration else {
                        continue;
                    };
                    self.declare_variable(
                        declaration,
                        declared.kind,
                        DeclaredVariableScope::DeclaredInDescendantScope,
                    );
                }
            }
        }
    }

    fn report_error_if_assignment_is_illegal(
        &mut self,
        declared: &DeclaredVariable<'code>,
        used: UsedVariable<'code>,
    ) {
        if used.kind != UsedVariableKind::Assignment {
            return;
        }
        if !matches!(declared.kind, VariableKind::Const | VariableKind::Import) {
            return;
        }
        match declared.declaration {
            Some(declaration) => self.reporter.report(Diag::AssignmentToConstVariable {
                declaration,
                assignment: used.name,
                var_kind: declared.kind,
            }),
            None => self.reporter.report(Diag::AssignmentToConstGlobalVariable {
                assignment: used.name,
            }),
        }
    }
}

impl<'code, 'reporter> ParseVisitor<'code> for Linter<'code, 'reporter> {
    fn visit_enter_block_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    fn visit_enter_class_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    fn visit_enter_for_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    fn visit_enter_function_scope(&mut self) {
        let mut scope = Scope::new();
        scope.allows_use_before_declaration = true;
        self.scopes.push(scope);
    }

    fn visit_enter_function_scope_body(&mut self) {
        // Parameters and body share one scope; this is a marker only.
    }

    fn visit_enter_named_function_scope(&mut self, name: Identifier<'code>) {
        let mut scope = Scope::new();
        scope.allows_use_before_declaration = true;
        scope.function_expression_declaration = Some(DeclaredVariable {
            kind: VariableKind::Function,
            declaration: Some(name),
            declaration_scope: DeclaredVariableScope::DeclaredInCurrentScope,
        });
        self.scopes.push(scope);
    }

    fn visit_exit_block_scope(&mut self) {
        self.propagate_to_parent_scope(true, false);
    }

    fn visit_exit_class_scope(&mut self) {
        self.propagate_to_parent_scope(false, false);
    }

    fn visit_exit_for_scope(&mut self) {
        self.propagate_to_parent_scope(true, false);
    }

    fn visit_exit_function_scope(&mut self) {
        self.propagate_to_parent_scope(false, true);
    }

    fn visit_property_declaration(&mut self, _name: Identifier<'code>) {
        // Properties are not variables.
    }

    fn visit_variable_declaration(&mut self, name: Identifier<'code>, kind: VariableKind) {
        self.declare_variable(name, kind, DeclaredVariableScope::DeclaredInCurrentScope);
    }

    fn visit_variable_assignment(&mut self, name: Identifier<'code>) {
        self.record_use(name, UsedVariableKind::Assignment);
    }

    fn visit_variable_typeof_use(&mut self, name: Identifier<'code>) {
        self.record_use(name, UsedVariableKind::Typeof);
    }

    fn visit_variable_use(&mut self, name: Identifier<'code>) {
        self.record_use(name, UsedVariableKind::Use);
    }

    fn visit_end_of_module(&mut self) {
        let mut module_scope = self.scopes.pop().expect("scope stack is empty");
        debug_assert!(self.scopes.is_empty(), "unbalanced scope stack at end of module");

        let used = std::mem::take(&mut module_scope.variables_used);
        let used_in_descendants =
            std::mem::take(&mut module_scope.variables_used_in_descendant_scope);
        for used in used.into_iter().chain(used_in_descendants) {
            match module_scope.find_declared_variable(used.name.normalized_name()) {
                Some(declared) => {
                    let declared = declared.clone();
                    self.report_error_if_assignment_is_illegal(&declared, used);
                }
                None => match used.kind {
                    UsedVariableKind::Assignment => {
                        self.reporter.report(Diag::AssignmentToUndeclaredVariable {
                            assignment: used.name,
                        });
                    }
                    UsedVariableKind::Use => {
                        self.reporter
                            .report(Diag::UseOfUndeclaredVariable { name: used.name });
                    }
                    // `typeof someUndefinedName` is a JavaScript idiom.
                    UsedVariableKind::Typeof => {}
                },
            }
        }
    }
}
