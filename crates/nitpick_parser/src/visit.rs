//! Scope and variable visit events.
//!
//! The parser narrates declarations, uses, and scope boundaries into a
//! [`ParseVisitor`] while it parses. Function-expression bodies are recorded
//! into a [`BufferingVisitor`] and replayed when the surrounding expression
//! commits, so downstream consumers observe events in evaluation order.

use nitpick_core::{Identifier, VariableKind};

/// Receives scope and variable events in source order.
pub trait ParseVisitor<'code> {
    fn visit_enter_block_scope(&mut self);
    fn visit_enter_class_scope(&mut self);
    fn visit_enter_for_scope(&mut self);
    fn visit_enter_function_scope(&mut self);
    fn visit_enter_function_scope_body(&mut self);
    fn visit_enter_named_function_scope(&mut self, name: Identifier<'code>);
    fn visit_exit_block_scope(&mut self);
    fn visit_exit_class_scope(&mut self);
    fn visit_exit_for_scope(&mut self);
    fn visit_exit_function_scope(&mut self);
    fn visit_property_declaration(&mut self, name: Identifier<'code>);
    fn visit_variable_declaration(&mut self, name: Identifier<'code>, kind: VariableKind);
    fn visit_variable_assignment(&mut self, name: Identifier<'code>);
    fn visit_variable_typeof_use(&mut self, name: Identifier<'code>);
    fn visit_variable_use(&mut self, name: Identifier<'code>);
    fn visit_end_of_module(&mut self);
}

/// One recorded visit event.
#[derive(Debug, Copy, Clone)]
pub enum VisitEvent<'code> {
    EnterBlockScope,
    EnterClassScope,
    EnterForScope,
    EnterFunctionScope,
    EnterFunctionScopeBody,
    EnterNamedFunctionScope(Identifier<'code>),
    ExitBlockScope,
    ExitClassScope,
    ExitForScope,
    ExitFunctionScope,
    PropertyDeclaration(Identifier<'code>),
    VariableDeclaration(Identifier<'code>, VariableKind),
    VariableAssignment(Identifier<'code>),
    VariableTypeofUse(Identifier<'code>),
    VariableUse(Identifier<'code>),
    EndOfModule,
}

/// A visitor that records events for later replay.
#[derive(Default)]
pub struct BufferingVisitor<'code> {
    events: Vec<VisitEvent<'code>>,
}

impl<'code> BufferingVisitor<'code> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay every recorded event into `target`, in order.
    pub fn move_into<V: ParseVisitor<'code> + ?Sized>(self, target: &mut V) {
        for event in self.events {
            match event {
                VisitEvent::EnterBlockScope => target.visit_enter_block_scope(),
                VisitEvent::EnterClassScope => target.visit_enter_class_scope(),
                VisitEvent::EnterForScope => target.visit_enter_for_scope(),
                VisitEvent::EnterFunctionScope => target.visit_enter_function_scope(),
                VisitEvent::EnterFunctionScopeBody => target.visit_enter_function_scope_body(),
                VisitEvent::EnterNamedFunctionScope(name) => {
                    target.visit_enter_named_function_scope(name)
                }
                VisitEvent::ExitBlockScope => target.visit_exit_block_scope(),
                VisitEvent::ExitClassScope => target.visit_exit_class_scope(),
                VisitEvent::ExitForScope => target.visit_exit_for_scope(),
                VisitEvent::ExitFunctionScope => target.visit_exit_function_scope(),
                VisitEvent::PropertyDeclaration(name) => {
                    target.visit_property_declaration(name)
                }
                VisitEvent::VariableDeclaration(name, kind) => {
                    target.visit_variable_declaration(name, kind)
                }
                VisitEvent::VariableAssignment(name) => target.visit_variable_assignment(name),
                VisitEvent::VariableTypeofUse(name) => target.visit_variable_typeof_use(name),
                VisitEvent::VariableUse(name) => target.visit_variable_use(name),
                VisitEvent::EndOfModule => target.visit_end_of_module(),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<'code> ParseVisitor<'code> for BufferingVisitor<'code> {
    fn visit_enter_block_scope(&mut self) {
        self.events.push(VisitEvent::EnterBlockScope);
    }

    fn visit_enter_class_scope(&mut self) {
        self.events.push(VisitEvent::EnterClassScope);
    }

    fn visit_enter_for_scope(&mut self) {
        self.events.push(VisitEvent::EnterForScope);
    }

    fn visit_enter_function_scope(&mut self) {
        self.events.push(VisitEvent::EnterFunctionScope);
    }

    fn visit_enter_function_scope_body(&mut self) {
        self.events.push(VisitEvent::EnterFunctionScopeBody);
    }

    fn visit_enter_named_function_scope(&mut self, name: Identifier<'code>) {
        self.events.push(VisitEvent::EnterNamedFunctionScope(name));
    }

    fn visit_exit_block_scope(&mut self) {
        self.events.push(VisitEvent::ExitBlockScope);
    }

    fn visit_exit_class_scope(&mut self) {
        self.events.push(VisitEvent::ExitClassScope);
    }

    fn visit_exit_for_scope(&mut self) {
        self.events.push(VisitEvent::ExitForScope);
    }

    fn visit_exit_function_scope(&mut self) {
        self.events.push(VisitEvent::ExitFunctionScope);
    }

    fn visit_property_declaration(&mut self, name: Identifier<'code>) {
        self.events.push(VisitEvent::PropertyDeclaration(name));
    }

    fn visit_variable_declaration(&mut self, name: Identifier<'code>, kind: VariableKind) {
        self.events.push(VisitEvent::VariableDeclaration(name, kind));
    }

    fn visit_variable_assignment(&mut self, name: Identifier<'code>) {
        self.events.push(VisitEvent::VariableAssignment(name));
    }

    fn visit_variable_typeof_use(&mut self, name: Identifier<'code>) {
        self.events.push(VisitEvent::VariableTypeofUse(name));
    }

    fn visit_variable_use(&mut self, name: Identifier<'code>) {
        self.events.push(VisitEvent::VariableUse(name));
    }

    fn visit_end_of_module(&mut self) {
        self.events.push(VisitEvent::EndOfModule);
    }
}
