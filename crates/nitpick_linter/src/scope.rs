//! Scopes and the variables they track.

use nitpick_core::{Identifier, VariableKind};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Where a declaration entered the scope that holds it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeclaredVariableScope {
    DeclaredInCurrentScope,
    /// A `var`/`function` declaration hoisted up from an inner block.
    DeclaredInDescendantScope,
}

/// One declaration of a variable.
#[derive(Debug, Clone)]
pub struct DeclaredVariable<'code> {
    pub kind: VariableKind,
    /// The declaring identifier. Seeded globals and the implicit
    /// `arguments` binding have none.
    pub declaration: Option<Identifier<'code>>,
    pub declaration_scope: DeclaredVariableScope,
}

/// Every declaration of one name in one scope. The first entry is the
/// primary declaration; later entries are legal redeclarations (e.g.
/// repeated `var`s). One entry is the overwhelmingly common case.
#[derive(Debug)]
pub struct DeclaredVariableSet<'code> {
    entries: SmallVec<[DeclaredVariable<'code>; 1]>,
}

impl<'code> DeclaredVariableSet<'code> {
    pub fn new(primary: DeclaredVariable<'code>) -> Self {
        let mut entries = SmallVec::new();
        entries.push(primary);
        Self { entries }
    }

    pub fn primary(&self) -> &DeclaredVariable<'code> {
        &self.entries[0]
    }

    pub fn push(&mut self, declaration: DeclaredVariable<'code>) {
        self.entries.push(declaration);
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeclaredVariable<'code>> {
        self.entries.iter()
    }
}

/// How a variable reference uses the variable.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UsedVariableKind {
    Use,
    Typeof,
    Assignment,
}

/// One not-yet-resolved variable reference.
#[derive(Debug, Copy, Clone)]
pub struct UsedVariable<'code> {
    pub name: Identifier<'code>,
    pub kind: UsedVariableKind,
}

impl<'code> UsedVariable<'code> {
    pub fn new(name: Identifier<'code>, kind: UsedVariableKind) -> Self {
        Self { name, kind }
    }
}

/// One lexical scope on the linter's stack.
#[derive(Default)]
pub struct Scope<'code> {
    pub declared_variables: FxHashMap<&'code str, DeclaredVariableSet<'code>>,
    /// References made directly in this scope, pending resolution.
    pub variables_used: Vec<UsedVariable<'code>>,
    /// References that escaped an inner scope. These resolve like uses but
    /// are exempt from use-before-declaration checks: the inner scope may
    /// run after the declaration is reached.
    pub variables_used_in_descendant_scope: Vec<UsedVariable<'code>>,
    /// The self-binding of a named function expression.
    pub function_expression_declaration: Option<DeclaredVariable<'code>>,
    /// Function scopes tolerate references textually before a declaration;
    /// the function body may run after the declaration is reached.
    pub allows_use_before_declaration: bool,
}

impl<'code> Scope<'code> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration, merging with prior declarations of the name.
    pub fn add_variable_declaration(
        &mut self,
        name: &'code str,
        declaration: DeclaredVariable<'code>,
    ) {
        match self.declared_variables.get_mut(name) {
            Some(set) => set.push(declaration),
            None => {
                self.declared_variables
                    .insert(name, DeclaredVariableSet::new(declaration));
            }
        }
    }

    /// Seed a predefined (identifier-less) declaration.
    pub fn add_predefined_variable_declaration(&mut self, name: &'code str, kind: VariableKind) {
        self.add_variable_declaration(
            name,
            DeclaredVariable {
                kind,
                declaration: None,
                declaration_scope: DeclaredVariableScope::DeclaredInCurrentScope,
            },
        );
    }

    /// Find the primary declaration visible for `name` in this scope,
    /// including a named function expression's self-binding.
    pub fn find_declared_variable(&self, name: &str) -> Option<&DeclaredVariable<'code>> {
        if let Some(set) = self.declared_variables.get(name) {
            return Some(set.primary());
        }
        match &self.function_expression_declaration {
            Some(declaration)
                if declaration
                    .declaration
                    .is_some_and(|identifier| identifier.normalized_name() == name) =>
            {
                Some(declaration)
            }
            _ => None,
        }
    }
}
