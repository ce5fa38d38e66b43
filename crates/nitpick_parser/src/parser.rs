//! The parser.
//!
//! An operator-precedence expression parser and a statement dispatcher. The
//! parser owns the lexer, allocates AST nodes from the caller's arena, and
//! narrates declarations, uses, and scope boundaries into a `ParseVisitor`.
//!
//! Chains of one left-associative operator family collapse into a single
//! variadic node (`a+b-c` has three children); different families nest by
//! precedence. Error productions never abort: a missing operand becomes an
//! `Invalid` node, an unmatched opener is reported and parsing continues as
//! if the closer were present.

use bumpalo::Bump;

use nitpick_core::{FunctionAttributes, Identifier, PaddedStringView, SourceSpan, VariableKind};
use nitpick_diagnostics::{Diag, DiagnosticSink, FatalError, FatalErrorKind};
use nitpick_lexer::{Lexer, Token, TokenKind};

use crate::expression::{Expression, ExpressionRef, ObjectEntry, VisitsHandle};
use crate::precedence::{
    binary_operator_precedence, is_compound_assignment_operator, OperatorPrecedence,
};
use crate::visit::{BufferingVisitor, ParseVisitor};

/// Result of parsing the head of a `for` statement's declaration.
enum ForHead {
    Classic,
    InOrOf,
}

pub struct Parser<'code, 'reporter> {
    arena: &'code Bump,
    lexer: Lexer<'code, 'reporter>,
    /// Buffered visit events of function-expression bodies, addressed by the
    /// `VisitsHandle` stored in the owning node.
    buffered_visits: Vec<BufferingVisitor<'code>>,
    /// A primary expression already materialized by the statement layer.
    pending_primary: Option<ExpressionRef<'code>>,
    /// The identifier-like token of the most recent object-literal key.
    key_token: Option<Token<'code>>,
    /// `in` is a binary operator except in a `for` head.
    allow_in_operator: bool,
    fatal: bool,
}

impl<'code, 'reporter> Parser<'code, 'reporter> {
    pub fn new(
        arena: &'code Bump,
        source: PaddedStringView<'code>,
        reporter: &'reporter mut dyn DiagnosticSink<'code>,
    ) -> Self {
        Self {
            arena,
            lexer: Lexer::new(source, arena, reporter),
            buffered_visits: Vec::new(),
            pending_primary: None,
            key_token: None,
            allow_in_operator: true,
            fatal: false,
        }
    }

    pub fn lexer(&self) -> &Lexer<'code, 'reporter> {
        &self.lexer
    }

    pub fn lexer_mut(&mut self) -> &mut Lexer<'code, 'reporter> {
        &mut self.lexer
    }

    /// Whether a fatal report ended the analysis early.
    pub fn hit_fatal_error(&self) -> bool {
        self.fatal
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    #[inline]
    fn peek_kind(&self) -> TokenKind {
        self.lexer.peek().kind
    }

    #[inline]
    fn peek_span(&self) -> SourceSpan {
        self.lexer.peek().span()
    }

    fn report(&mut self, diagnostic: Diag<'code>) {
        self.lexer.reporter().report(diagnostic);
    }

    fn report_fatal_token(&mut self, origin_function: &'static str) {
        let span = self.peek_span();
        self.lexer.reporter().report_fatal(FatalError {
            origin_file: file!(),
            origin_line: line!(),
            origin_function,
            kind: FatalErrorKind::UnimplementedToken,
            span,
        });
        self.fatal = true;
    }

    /// Whether the current token can serve as an identifier (a plain
    /// identifier or a contextual keyword).
    fn peek_is_identifier_like(&self) -> bool {
        let kind = self.peek_kind();
        kind == TokenKind::Identifier
            || kind == TokenKind::LetKeyword
            || kind.is_contextual_keyword()
    }

    /// Consume the current identifier-like token.
    fn eat_identifier(&mut self) -> Identifier<'code> {
        let name = self.lexer.peek().identifier_name();
        self.lexer.skip();
        name
    }

    fn alloc(&self, expression: Expression<'code>) -> ExpressionRef<'code> {
        self.arena.alloc(expression)
    }

    fn alloc_children(
        &self,
        children: Vec<ExpressionRef<'code>>,
    ) -> &'code [ExpressionRef<'code>] {
        self.arena.alloc_slice_copy(&children)
    }

    fn invalid_here(&self) -> ExpressionRef<'code> {
        let pos = self.lexer.peek().begin;
        self.alloc(Expression::Invalid {
            span: SourceSpan::empty(pos),
        })
    }

    fn store_visits(&mut self, buffer: BufferingVisitor<'code>) -> VisitsHandle {
        self.buffered_visits.push(buffer);
        VisitsHandle(self.buffered_visits.len() - 1)
    }

    fn take_visits(&mut self, handle: VisitsHandle) -> BufferingVisitor<'code> {
        std::mem::take(&mut self.buffered_visits[handle.0])
    }

    /// Consume a statement terminator, applying automatic semicolon
    /// insertion: a line break before the next token, a `}`, or end of input
    /// all count as a terminator.
    fn consume_semicolon(&mut self) {
        match self.peek_kind() {
            TokenKind::Semicolon => self.lexer.skip(),
            TokenKind::CloseBrace | TokenKind::EndOfFile => {}
            _ => {
                if !self.lexer.peek().has_leading_newline() {
                    let end = self.lexer.end_of_previous_token();
                    self.report(Diag::MissingSemicolonAfterExpression {
                        expression_end: SourceSpan::empty(end),
                    });
                }
            }
        }
    }

    // ========================================================================
    // Module and statements
    // ========================================================================

    /// Parse the whole module, narrating into `v`, and emit `end_of_module`.
    pub fn parse_and_visit_module<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        while self.peek_kind() != TokenKind::EndOfFile && !self.fatal {
            let before = (self.lexer.peek().begin, self.peek_kind());
            self.parse_and_visit_statement(v);
            let after = (self.lexer.peek().begin, self.peek_kind());
            if after == before && after.1 != TokenKind::EndOfFile {
                // The statement made no progress; the construct is outside
                // the supported grammar.
                self.report_fatal_token("Parser::parse_and_visit_module");
            }
        }
        v.visit_end_of_module();
    }

    pub fn parse_and_visit_statement<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        match self.peek_kind() {
            TokenKind::Semicolon => self.lexer.skip(),
            TokenKind::OpenBrace => self.parse_and_visit_block(v),
            TokenKind::VarKeyword => {
                self.parse_and_visit_let_bindings(v, VariableKind::Var, false);
                self.consume_semicolon();
            }
            TokenKind::LetKeyword => {
                self.parse_and_visit_let_bindings(v, VariableKind::Let, false);
                self.consume_semicolon();
            }
            TokenKind::ConstKeyword => {
                self.parse_and_visit_let_bindings(v, VariableKind::Const, false);
                self.consume_semicolon();
            }
            TokenKind::FunctionKeyword => {
                self.parse_and_visit_function_declaration(v, FunctionAttributes::Normal)
            }
            TokenKind::AsyncKeyword => {
                let async_span = self.peek_span();
                self.lexer.skip();
                if self.peek_kind() == TokenKind::FunctionKeyword {
                    self.parse_and_visit_function_declaration(v, FunctionAttributes::Async);
                } else {
                    let primary = self.parse_async_tail(async_span);
                    self.pending_primary = Some(primary);
                    let ast = self.parse_expression();
                    self.visit_expression(ast, v);
                    self.consume_semicolon();
                }
            }
            TokenKind::ClassKeyword => self.parse_and_visit_class_declaration(v),
            TokenKind::IfKeyword => {
                self.lexer.skip();
                self.parse_and_visit_parenthesized_condition(v);
                self.parse_and_visit_statement(v);
                if self.peek_kind() == TokenKind::ElseKeyword {
                    self.lexer.skip();
                    self.parse_and_visit_statement(v);
                }
            }
            TokenKind::WhileKeyword => {
                self.lexer.skip();
                self.parse_and_visit_parenthesized_condition(v);
                self.parse_and_visit_statement(v);
            }
            TokenKind::DoKeyword => {
                self.lexer.skip();
                self.parse_and_visit_statement(v);
                if self.peek_kind() == TokenKind::WhileKeyword {
                    self.lexer.skip();
                    self.parse_and_visit_parenthesized_condition(v);
                    self.consume_semicolon();
                } else {
                    self.report_fatal_token("Parser::parse_and_visit_statement");
                }
            }
            TokenKind::ForKeyword => self.parse_and_visit_for(v),
            TokenKind::ReturnKeyword | TokenKind::ThrowKeyword => {
                self.lexer.skip();
                match self.peek_kind() {
                    TokenKind::Semicolon => self.lexer.skip(),
                    TokenKind::CloseBrace | TokenKind::EndOfFile => {}
                    _ if self.lexer.peek().has_leading_newline() => {}
                    _ => {
                        let ast = self.parse_expression();
                        self.visit_expression(ast, v);
                        self.consume_semicolon();
                    }
                }
            }
            TokenKind::BreakKeyword | TokenKind::ContinueKeyword => {
                self.lexer.skip();
                if self.peek_kind() == TokenKind::Identifier
                    && !self.lexer.peek().has_leading_newline()
                {
                    self.lexer.skip(); // label
                }
                self.consume_semicolon();
            }
            TokenKind::TryKeyword => self.parse_and_visit_try(v),
            TokenKind::SwitchKeyword => self.parse_and_visit_switch(v),
            TokenKind::DebuggerKeyword => {
                self.lexer.skip();
                self.consume_semicolon();
            }
            TokenKind::ImportKeyword => self.parse_and_visit_import(v),
            TokenKind::ExportKeyword => self.parse_and_visit_export(v),
            TokenKind::WithKeyword => {
                self.lexer.skip();
                self.parse_and_visit_parenthesized_condition(v);
                self.parse_and_visit_statement(v);
            }
            TokenKind::EndOfFile => {}
            _ => {
                let ast = self.parse_expression();
                if ast.kind() == crate::expression::ExpressionKind::Variable
                    && self.peek_kind() == TokenKind::Colon
                {
                    // A labelled statement; the label is not a variable use.
                    self.lexer.skip();
                    self.parse_and_visit_statement(v);
                    return;
                }
                self.visit_expression(ast, v);
                self.consume_semicolon();
            }
        }
    }

    fn parse_and_visit_block<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        let open_span = self.peek_span();
        self.lexer.skip();
        v.visit_enter_block_scope();
        while self.peek_kind() != TokenKind::CloseBrace
            && self.peek_kind() != TokenKind::EndOfFile
            && !self.fatal
        {
            self.parse_and_visit_statement(v);
        }
        if self.peek_kind() == TokenKind::CloseBrace {
            self.lexer.skip();
        } else if !self.fatal {
            self.report(Diag::UnmatchedParenthesis { opener: open_span });
        }
        v.visit_exit_block_scope();
    }

    fn parse_and_visit_parenthesized_condition<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        if self.peek_kind() != TokenKind::OpenParen {
            self.report_fatal_token("Parser::parse_and_visit_parenthesized_condition");
            return;
        }
        let open_span = self.peek_span();
        self.lexer.skip();
        let condition = self.parse_expression();
        self.visit_expression(condition, v);
        if self.peek_kind() == TokenKind::CloseParen {
            self.lexer.skip();
        } else {
            self.report(Diag::UnmatchedParenthesis { opener: open_span });
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Parse the binding list of a `var`/`let`/`const` statement or `for`
    /// head. The declaring keyword is the current token.
    fn parse_and_visit_let_bindings<V: ParseVisitor<'code>>(
        &mut self,
        v: &mut V,
        kind: VariableKind,
        in_for_head: bool,
    ) -> ForHead {
        let let_span = self.peek_span();
        self.lexer.skip();
        let mut first = true;
        loop {
            match self.peek_kind() {
                TokenKind::Comma => {
                    let comma = self.peek_span();
                    self.report(Diag::StrayCommaInLetStatement { comma });
                    self.lexer.skip();
                    first = false;
                }
                TokenKind::Semicolon | TokenKind::EndOfFile | TokenKind::CloseParen => {
                    if first {
                        self.report(Diag::LetWithNoBindings {
                            let_keyword: let_span,
                        });
                    }
                    return ForHead::Classic;
                }
                _ if self.peek_is_identifier_like()
                    || self.peek_kind() == TokenKind::OpenBrace
                    || self.peek_kind() == TokenKind::OpenBracket =>
                {
                    if first && in_for_head && self.peek_is_identifier_like() {
                        let name = self.eat_identifier();
                        if matches!(
                            self.peek_kind(),
                            TokenKind::InKeyword | TokenKind::OfKeyword
                        ) {
                            v.visit_variable_declaration(name, kind);
                            self.lexer.skip();
                            let enumerable = self.parse_assignment_expression();
                            self.visit_expression(enumerable, v);
                            return ForHead::InOrOf;
                        }
                        // An ordinary first binding; finish it here.
                        if self.peek_kind() == TokenKind::Equal {
                            self.lexer.skip();
                            let init = self.parse_assignment_expression();
                            self.visit_expression(init, v);
                        }
                        v.visit_variable_declaration(name, kind);
                    } else if first
                        && in_for_head
                        && matches!(self.peek_kind(), TokenKind::OpenBrace | TokenKind::OpenBracket)
                    {
                        self.parse_and_visit_binding(v, kind);
                        if matches!(
                            self.peek_kind(),
                            TokenKind::InKeyword | TokenKind::OfKeyword
                        ) {
                            self.lexer.skip();
                            let enumerable = self.parse_assignment_expression();
                            self.visit_expression(enumerable, v);
                            return ForHead::InOrOf;
                        }
                    } else {
                        self.parse_and_visit_binding(v, kind);
                    }
                    first = false;
                    match self.peek_kind() {
                        TokenKind::Comma => {
                            let comma = self.peek_span();
                            self.lexer.skip();
                            if matches!(
                                self.peek_kind(),
                                TokenKind::Semicolon
                                    | TokenKind::EndOfFile
                                    | TokenKind::CloseParen
                            ) {
                                self.report(Diag::StrayCommaInLetStatement { comma });
                                return ForHead::Classic;
                            }
                        }
                        _ if self.peek_is_identifier_like()
                            && !self.lexer.peek().has_leading_newline() =>
                        {
                            // Two bindings with no comma between them.
                            self.report(Diag::UnexpectedIdentifier {
                                identifier: self.peek_span(),
                            });
                        }
                        _ => return ForHead::Classic,
                    }
                }
                _ => {
                    self.report(Diag::InvalidBindingInLetStatement {
                        binding: self.peek_span(),
                    });
                    self.lexer.skip();
                    first = false;
                    if self.peek_kind() == TokenKind::Comma {
                        self.lexer.skip();
                    }
                }
            }
        }
    }

    /// Parse one binding (identifier or destructuring pattern) with an
    /// optional `= initializer`, declaring every bound name with `kind`.
    fn parse_and_visit_binding<V: ParseVisitor<'code>>(&mut self, v: &mut V, kind: VariableKind) {
        match self.peek_kind() {
            _ if self.peek_is_identifier_like() => {
                let name = self.eat_identifier();
                if self.peek_kind() == TokenKind::Equal {
                    self.lexer.skip();
                    let init = self.parse_assignment_expression();
                    self.visit_expression(init, v);
                }
                v.visit_variable_declaration(name, kind);
            }
            TokenKind::OpenBrace => {
                self.parse_and_visit_object_binding_pattern(v, kind);
                if self.peek_kind() == TokenKind::Equal {
                    self.lexer.skip();
                    let init = self.parse_assignment_expression();
                    self.visit_expression(init, v);
                }
            }
            TokenKind::OpenBracket => {
                self.parse_and_visit_array_binding_pattern(v, kind);
                if self.peek_kind() == TokenKind::Equal {
                    self.lexer.skip();
                    let init = self.parse_assignment_expression();
                    self.visit_expression(init, v);
                }
            }
            _ => {
                self.report(Diag::InvalidBindingInLetStatement {
                    binding: self.peek_span(),
                });
                self.lexer.skip();
            }
        }
    }

    fn parse_and_visit_object_binding_pattern<V: ParseVisitor<'code>>(
        &mut self,
        v: &mut V,
        kind: VariableKind,
    ) {
        let open_span = self.peek_span();
        self.lexer.skip();
        loop {
            match self.peek_kind() {
                TokenKind::CloseBrace => {
                    self.lexer.skip();
                    return;
                }
                TokenKind::EndOfFile => {
                    self.report(Diag::UnmatchedParenthesis { opener: open_span });
                    return;
                }
                TokenKind::Comma => self.lexer.skip(),
                TokenKind::DotDotDot => {
                    self.lexer.skip();
                    self.parse_and_visit_binding(v, kind);
                }
                TokenKind::OpenBracket => {
                    // Computed key: the key expression is evaluated.
                    self.lexer.skip();
                    let key = self.parse_expression();
                    self.visit_expression(key, v);
                    if self.peek_kind() == TokenKind::CloseBracket {
                        self.lexer.skip();
                    }
                    if self.peek_kind() == TokenKind::Colon {
                        self.lexer.skip();
                        self.parse_and_visit_binding(v, kind);
                    }
                }
                _ if self.peek_is_identifier_like()
                    || self.peek_kind().is_keyword()
                    || matches!(self.peek_kind(), TokenKind::String | TokenKind::Number) =>
                {
                    let key_is_identifier = self.peek_is_identifier_like();
                    let key = *self.lexer.peek();
                    self.lexer.skip();
                    if self.peek_kind() == TokenKind::Colon {
                        self.lexer.skip();
                        self.parse_and_visit_binding(v, kind);
                    } else if key_is_identifier {
                        // Shorthand, with an optional default value.
                        if self.peek_kind() == TokenKind::Equal {
                            self.lexer.skip();
                            let init = self.parse_assignment_expression();
                            self.visit_expression(init, v);
                        }
                        v.visit_variable_declaration(key.identifier_name(), kind);
                    } else {
                        self.report(Diag::InvalidBindingInLetStatement {
                            binding: key.span(),
                        });
                    }
                }
                _ => {
                    self.report(Diag::InvalidBindingInLetStatement {
                        binding: self.peek_span(),
                    });
                    self.lexer.skip();
                }
            }
        }
    }

    fn parse_and_visit_array_binding_pattern<V: ParseVisitor<'code>>(
        &mut self,
        v: &mut V,
        kind: VariableKind,
    ) {
        let open_span = self.peek_span();
        self.lexer.skip();
        loop {
            match self.peek_kind() {
                TokenKind::CloseBracket => {
                    self.lexer.skip();
                    return;
                }
                TokenKind::EndOfFile => {
                    self.report(Diag::UnmatchedParenthesis { opener: open_span });
                    return;
                }
                TokenKind::Comma => self.lexer.skip(), // elision
                TokenKind::DotDotDot => {
                    self.lexer.skip();
                    self.parse_and_visit_binding(v, kind);
                }
                _ => self.parse_and_visit_binding(v, kind),
            }
        }
    }

    fn parse_and_visit_function_declaration<V: ParseVisitor<'code>>(
        &mut self,
        v: &mut V,
        _attributes: FunctionAttributes,
    ) {
        self.lexer.skip(); // 'function'
        if !self.peek_is_identifier_like() {
            self.report_fatal_token("Parser::parse_and_visit_function_declaration");
            return;
        }
        let name = self.eat_identifier();
        v.visit_variable_declaration(name, VariableKind::Function);
        v.visit_enter_function_scope();
        self.parse_and_visit_function_parameters_and_body(v);
        v.visit_exit_function_scope();
    }

    /// Parse `( params ) { body }`, emitting parameter declarations, the
    /// function-body boundary marker, and body statements into `v`. The
    /// caller wraps this in enter/exit function scope events. Returns the
    /// end offset of the closing brace.
    fn parse_and_visit_function_parameters_and_body<V: ParseVisitor<'code>>(
        &mut self,
        v: &mut V,
    ) -> u32 {
        if self.peek_kind() != TokenKind::OpenParen {
            self.report_fatal_token("Parser::parse_and_visit_function_parameters_and_body");
            return self.lexer.end_of_previous_token();
        }
        let paren_span = self.peek_span();
        self.lexer.skip();
        loop {
            match self.peek_kind() {
                TokenKind::CloseParen => {
                    self.lexer.skip();
                    break;
                }
                TokenKind::EndOfFile => {
                    self.report(Diag::UnmatchedParenthesis { opener: paren_span });
                    break;
                }
                TokenKind::Comma => self.lexer.skip(),
                TokenKind::DotDotDot => {
                    self.lexer.skip();
                    self.parse_and_visit_binding(v, VariableKind::Parameter);
                }
                _ => self.parse_and_visit_binding(v, VariableKind::Parameter),
            }
        }
        v.visit_enter_function_scope_body();
        if self.peek_kind() != TokenKind::OpenBrace {
            self.report_fatal_token("Parser::parse_and_visit_function_parameters_and_body");
            return self.lexer.end_of_previous_token();
        }
        let brace_span = self.peek_span();
        self.lexer.skip();
        while self.peek_kind() != TokenKind::CloseBrace
            && self.peek_kind() != TokenKind::EndOfFile
            && !self.fatal
        {
            self.parse_and_visit_statement(v);
        }
        let body_end;
        if self.peek_kind() == TokenKind::CloseBrace {
            body_end = self.lexer.peek().end;
            self.lexer.skip();
        } else {
            if !self.fatal {
                self.report(Diag::UnmatchedParenthesis { opener: brace_span });
            }
            body_end = self.lexer.end_of_previous_token();
        }
        body_end
    }

    fn parse_and_visit_class_declaration<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        self.lexer.skip(); // 'class'
        if !self.peek_is_identifier_like() {
            self.report_fatal_token("Parser::parse_and_visit_class_declaration");
            return;
        }
        let name = self.eat_identifier();
        if self.peek_kind() == TokenKind::ExtendsKeyword {
            self.lexer.skip();
            let heritage = {
                let primary = self.parse_primary_expression();
                self.parse_postfix_expression(primary)
            };
            self.visit_expression(heritage, v);
        }
        v.visit_variable_declaration(name, VariableKind::Class);
        v.visit_enter_class_scope();
        if self.peek_kind() != TokenKind::OpenBrace {
            self.report_fatal_token("Parser::parse_and_visit_class_declaration");
            v.visit_exit_class_scope();
            return;
        }
        let brace_span = self.peek_span();
        self.lexer.skip();
        while self.peek_kind() != TokenKind::CloseBrace
            && self.peek_kind() != TokenKind::EndOfFile
            && !self.fatal
        {
            self.parse_and_visit_class_member(v);
        }
        if self.peek_kind() == TokenKind::CloseBrace {
            self.lexer.skip();
        } else if !self.fatal {
            self.report(Diag::UnmatchedParenthesis { opener: brace_span });
        }
        v.visit_exit_class_scope();
    }

    fn parse_and_visit_class_member<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        if self.peek_kind() == TokenKind::Semicolon {
            self.lexer.skip();
            return;
        }
        if self.peek_kind() == TokenKind::StaticKeyword {
            let static_token = *self.lexer.peek();
            self.lexer.skip();
            if self.peek_kind() == TokenKind::OpenParen {
                // A method named `static`.
                v.visit_property_declaration(static_token.identifier_name());
                self.parse_and_visit_method_tail(v);
                return;
            }
        }
        // 'get'/'set' introduce an accessor unless they are themselves the
        // method name.
        if matches!(self.peek_kind(), TokenKind::GetKeyword | TokenKind::SetKeyword) {
            let accessor = *self.lexer.peek();
            self.lexer.skip();
            if self.peek_kind() == TokenKind::OpenParen {
                v.visit_property_declaration(accessor.identifier_name());
                self.parse_and_visit_method_tail(v);
            } else {
                self.parse_and_visit_class_method_with_name(v);
            }
            return;
        }
        self.parse_and_visit_class_method_with_name(v);
    }

    fn parse_and_visit_class_method_with_name<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        match self.peek_kind() {
            TokenKind::OpenBracket => {
                self.lexer.skip();
                let key = self.parse_expression();
                self.visit_expression(key, v);
                if self.peek_kind() == TokenKind::CloseBracket {
                    self.lexer.skip();
                }
            }
            TokenKind::String | TokenKind::Number => {
                self.lexer.skip();
            }
            _ if self.peek_kind().is_keyword() || self.peek_kind() == TokenKind::Identifier => {
                let name = *self.lexer.peek();
                self.lexer.skip();
                v.visit_property_declaration(name.identifier_name());
            }
            _ => {
                self.report_fatal_token("Parser::parse_and_visit_class_member");
                return;
            }
        }
        self.parse_and_visit_method_tail(v);
    }

    fn parse_and_visit_method_tail<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        if self.peek_kind() != TokenKind::OpenParen {
            self.report_fatal_token("Parser::parse_and_visit_method_tail");
            return;
        }
        v.visit_enter_function_scope();
        self.parse_and_visit_function_parameters_and_body(v);
        v.visit_exit_function_scope();
    }

    fn parse_and_visit_for<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        self.lexer.skip(); // 'for'
        v.visit_enter_for_scope();
        if self.peek_kind() != TokenKind::OpenParen {
            self.report_fatal_token("Parser::parse_and_visit_for");
            v.visit_exit_for_scope();
            return;
        }
        let paren_span = self.peek_span();
        self.lexer.skip();

        let mut classic = true;
        match self.peek_kind() {
            TokenKind::Semicolon => self.lexer.skip(),
            TokenKind::VarKeyword | TokenKind::LetKeyword | TokenKind::ConstKeyword => {
                let kind = match self.peek_kind() {
                    TokenKind::VarKeyword => VariableKind::Var,
                    TokenKind::LetKeyword => VariableKind::Let,
                    _ => VariableKind::Const,
                };
                match self.parse_and_visit_let_bindings(v, kind, true) {
                    ForHead::InOrOf => classic = false,
                    ForHead::Classic => {
                        if self.peek_kind() == TokenKind::Semicolon {
                            self.lexer.skip();
                        }
                    }
                }
            }
            _ => {
                self.allow_in_operator = false;
                let init = self.parse_expression();
                self.allow_in_operator = true;
                if matches!(self.peek_kind(), TokenKind::InKeyword | TokenKind::OfKeyword) {
                    self.lexer.skip();
                    self.visit_assignment_target(init, v);
                    let enumerable = self.parse_expression();
                    self.visit_expression(enumerable, v);
                    classic = false;
                } else {
                    self.visit_expression(init, v);
                    if self.peek_kind() == TokenKind::Semicolon {
                        self.lexer.skip();
                    }
                }
            }
        }

        if classic {
            if self.peek_kind() != TokenKind::Semicolon {
                if self.peek_kind() != TokenKind::CloseParen {
                    let condition = self.parse_expression();
                    self.visit_expression(condition, v);
                }
                if self.peek_kind() == TokenKind::Semicolon {
                    self.lexer.skip();
                }
            } else {
                self.lexer.skip();
            }
            if self.peek_kind() != TokenKind::CloseParen {
                let update = self.parse_expression();
                self.visit_expression(update, v);
            }
        }

        if self.peek_kind() == TokenKind::CloseParen {
            self.lexer.skip();
        } else {
            self.report(Diag::UnmatchedParenthesis { opener: paren_span });
        }
        self.parse_and_visit_statement(v);
        v.visit_exit_for_scope();
    }

    fn parse_and_visit_try<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        self.lexer.skip(); // 'try'
        if self.peek_kind() != TokenKind::OpenBrace {
            self.report_fatal_token("Parser::parse_and_visit_try");
            return;
        }
        self.parse_and_visit_block(v);
        if self.peek_kind() == TokenKind::CatchKeyword {
            self.lexer.skip();
            v.visit_enter_block_scope();
            if self.peek_kind() == TokenKind::OpenParen {
                let paren_span = self.peek_span();
                self.lexer.skip();
                self.parse_and_visit_binding(v, VariableKind::Catch);
                if self.peek_kind() == TokenKind::CloseParen {
                    self.lexer.skip();
                } else {
                    self.report(Diag::UnmatchedParenthesis { opener: paren_span });
                }
            }
            if self.peek_kind() == TokenKind::OpenBrace {
                let brace_span = self.peek_span();
                self.lexer.skip();
                while self.peek_kind() != TokenKind::CloseBrace
                    && self.peek_kind() != TokenKind::EndOfFile
                    && !self.fatal
                {
                    self.parse_and_visit_statement(v);
                }
                if self.peek_kind() == TokenKind::CloseBrace {
                    self.lexer.skip();
                } else if !self.fatal {
                    self.report(Diag::UnmatchedParenthesis { opener: brace_span });
                }
            } else {
                self.report_fatal_token("Parser::parse_and_visit_try");
            }
            v.visit_exit_block_scope();
        }
        if self.peek_kind() == TokenKind::FinallyKeyword {
            self.lexer.skip();
            if self.peek_kind() == TokenKind::OpenBrace {
                self.parse_and_visit_block(v);
            } else {
                self.report_fatal_token("Parser::parse_and_visit_try");
            }
        }
    }

    fn parse_and_visit_switch<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        self.lexer.skip(); // 'switch'
        self.parse_and_visit_parenthesized_condition(v);
        if self.peek_kind() != TokenKind::OpenBrace {
            self.report_fatal_token("Parser::parse_and_visit_switch");
            return;
        }
        let brace_span = self.peek_span();
        self.lexer.skip();
        v.visit_enter_block_scope();
        while self.peek_kind() != TokenKind::CloseBrace
            && self.peek_kind() != TokenKind::EndOfFile
            && !self.fatal
        {
            match self.peek_kind() {
                TokenKind::CaseKeyword => {
                    self.lexer.skip();
                    let test = self.parse_expression();
                    self.visit_expression(test, v);
                    if self.peek_kind() == TokenKind::Colon {
                        self.lexer.skip();
                    }
                }
                TokenKind::DefaultKeyword => {
                    self.lexer.skip();
                    if self.peek_kind() == TokenKind::Colon {
                        self.lexer.skip();
                    }
                }
                _ => self.parse_and_visit_statement(v),
            }
        }
        if self.peek_kind() == TokenKind::CloseBrace {
            self.lexer.skip();
        } else if !self.fatal {
            self.report(Diag::UnmatchedParenthesis { opener: brace_span });
        }
        v.visit_exit_block_scope();
    }

    fn parse_and_visit_import<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        let import_span = self.peek_span();
        self.lexer.skip();
        match self.peek_kind() {
            TokenKind::String => {
                // Side-effect import.
                self.lexer.skip();
                self.consume_semicolon();
                return;
            }
            TokenKind::OpenParen | TokenKind::Dot => {
                // `import(...)` or `import.meta` in expression position.
                self.pending_primary = Some(self.alloc(Expression::Import { span: import_span }));
                let ast = self.parse_expression();
                self.visit_expression(ast, v);
                self.consume_semicolon();
                return;
            }
            TokenKind::OpenBrace => self.parse_and_visit_named_imports(v),
            TokenKind::Star => {
                self.lexer.skip();
                if self.peek_kind() == TokenKind::AsKeyword {
                    self.lexer.skip();
                }
                if self.peek_is_identifier_like() {
                    let name = self.eat_identifier();
                    v.visit_variable_declaration(name, VariableKind::Import);
                }
            }
            _ if self.peek_is_identifier_like() => {
                let name = self.eat_identifier();
                v.visit_variable_declaration(name, VariableKind::Import);
                if self.peek_kind() == TokenKind::Comma {
                    self.lexer.skip();
                    match self.peek_kind() {
                        TokenKind::OpenBrace => self.parse_and_visit_named_imports(v),
                        TokenKind::Star => {
                            self.lexer.skip();
                            if self.peek_kind() == TokenKind::AsKeyword {
                                self.lexer.skip();
                            }
                            if self.peek_is_identifier_like() {
                                let name = self.eat_identifier();
                                v.visit_variable_declaration(name, VariableKind::Import);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {
                self.report_fatal_token("Parser::parse_and_visit_import");
                return;
            }
        }
        if self.peek_kind() == TokenKind::FromKeyword {
            self.lexer.skip();
            if self.peek_kind() == TokenKind::String {
                self.lexer.skip();
            }
        }
        self.consume_semicolon();
    }

    fn parse_and_visit_named_imports<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        self.lexer.skip(); // '{'
        loop {
            match self.peek_kind() {
                TokenKind::CloseBrace => {
                    self.lexer.skip();
                    return;
                }
                TokenKind::EndOfFile => return,
                TokenKind::Comma => self.lexer.skip(),
                _ if self.peek_kind() == TokenKind::Identifier
                    || self.peek_kind().is_keyword() =>
                {
                    let imported = *self.lexer.peek();
                    self.lexer.skip();
                    if self.peek_kind() == TokenKind::AsKeyword {
                        self.lexer.skip();
                        if self.peek_is_identifier_like() {
                            let local = self.eat_identifier();
                            v.visit_variable_declaration(local, VariableKind::Import);
                        }
                    } else {
                        v.visit_variable_declaration(
                            imported.identifier_name(),
                            VariableKind::Import,
                        );
                    }
                }
                _ => {
                    self.report_fatal_token("Parser::parse_and_visit_named_imports");
                    return;
                }
            }
        }
    }

    fn parse_and_visit_export<V: ParseVisitor<'code>>(&mut self, v: &mut V) {
        self.lexer.skip(); // 'export'
        match self.peek_kind() {
            TokenKind::DefaultKeyword => {
                self.lexer.skip();
                match self.peek_kind() {
                    TokenKind::ClassKeyword => self.parse_and_visit_class_declaration(v),
                    TokenKind::FunctionKeyword | TokenKind::AsyncKeyword => {
                        let ast = self.parse_expression();
                        if let Expression::NamedFunction { name, .. } = ast {
                            // The default-exported function's name is also
                            // bound in the module scope.
                            v.visit_variable_declaration(*name, VariableKind::Function);
                        }
                        self.visit_expression(ast, v);
                        self.consume_semicolon();
                    }
                    _ => {
                        let ast = self.parse_assignment_expression();
                        self.visit_expression(ast, v);
                        self.consume_semicolon();
                    }
                }
            }
            TokenKind::VarKeyword => {
                self.parse_and_visit_let_bindings(v, VariableKind::Var, false);
                self.consume_semicolon();
            }
            TokenKind::LetKeyword => {
                self.parse_and_visit_let_bindings(v, VariableKind::Let, false);
                self.consume_semicolon();
            }
            TokenKind::ConstKeyword => {
                self.parse_and_visit_let_bindings(v, VariableKind::Const, false);
                self.consume_semicolon();
            }
            TokenKind::FunctionKeyword => {
                self.parse_and_visit_function_declaration(v, FunctionAttributes::Normal)
            }
            TokenKind::AsyncKeyword => {
                self.lexer.skip();
                if self.peek_kind() == TokenKind::FunctionKeyword {
                    self.parse_and_visit_function_declaration(v, FunctionAttributes::Async);
                } else {
                    self.report_fatal_token("Parser::parse_and_visit_export");
                }
            }
            TokenKind::ClassKeyword => self.parse_and_visit_class_declaration(v),
            TokenKind::OpenBrace => {
                self.lexer.skip();
                let mut exported = Vec::new();
                loop {
                    match self.peek_kind() {
                        TokenKind::CloseBrace => {
                            self.lexer.skip();
                            break;
                        }
                        TokenKind::EndOfFile => break,
                        TokenKind::Comma => self.lexer.skip(),
                        _ if self.peek_kind() == TokenKind::Identifier
                            || self.peek_kind().is_keyword() =>
                        {
                            let name = self.lexer.peek().identifier_name();
                            self.lexer.skip();
                            if self.peek_kind() == TokenKind::AsKeyword {
                                self.lexer.skip();
                                if self.peek_is_identifier_like()
                                    || self.peek_kind() == TokenKind::DefaultKeyword
                                {
                                    self.lexer.skip();
                                }
                            }
                            exported.push(name);
                        }
                        _ => {
                            self.report_fatal_token("Parser::parse_and_visit_export");
                            return;
                        }
                    }
                }
                if self.peek_kind() == TokenKind::FromKeyword {
                    // A re-export; the names are not local references.
                    self.lexer.skip();
                    if self.peek_kind() == TokenKind::String {
                        self.lexer.skip();
                    }
                } else {
                    for name in exported {
                        v.visit_variable_use(name);
                    }
                }
                self.consume_semicolon();
            }
            TokenKind::Star => {
                self.lexer.skip();
                if self.peek_kind() == TokenKind::AsKeyword {
                    self.lexer.skip();
                    if self.peek_is_identifier_like() {
                        self.lexer.skip();
                    }
                }
                if self.peek_kind() == TokenKind::FromKeyword {
                    self.lexer.skip();
                    if self.peek_kind() == TokenKind::String {
                        self.lexer.skip();
                    }
                }
                self.consume_semicolon();
            }
            _ => self.report_fatal_token("Parser::parse_and_visit_export"),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Parse a full expression (comma level).
    pub fn parse_expression(&mut self) -> ExpressionRef<'code> {
        let first = self.parse_assignment_expression();
        if self.peek_kind() != TokenKind::Comma {
            return first;
        }
        let mut children = vec![first];
        while self.peek_kind() == TokenKind::Comma {
            let comma_span = self.peek_span();
            self.lexer.skip();
            let rhs = self.parse_assignment_expression();
            if rhs.is_invalid() {
                self.report(Diag::MissingOperandForOperator {
                    operator: comma_span,
                });
            }
            children.push(rhs);
        }
        self.alloc(Expression::BinaryOperator {
            children: self.alloc_children(children),
        })
    }

    fn parse_assignment_expression(&mut self) -> ExpressionRef<'code> {
        if self.peek_kind() == TokenKind::DotDotDot {
            let operator_span = self.peek_span();
            self.lexer.skip();
            let child = self.parse_assignment_expression();
            if child.is_invalid() {
                self.report(Diag::MissingOperandForOperator {
                    operator: operator_span,
                });
            }
            return self.alloc(Expression::Spread {
                child,
                operator_begin: operator_span.begin,
            });
        }

        let lhs = self.parse_conditional_expression();

        // A lone identifier followed by `=>` is an arrow function parameter.
        if self.peek_kind() == TokenKind::Arrow
            && lhs.kind() == crate::expression::ExpressionKind::Variable
        {
            self.lexer.skip();
            return self.parse_arrow_function_body(
                vec![lhs],
                FunctionAttributes::Normal,
                None,
            );
        }

        match self.peek_kind() {
            TokenKind::Equal => {
                let operator_span = self.peek_span();
                self.lexer.skip();
                if !is_valid_assignment_target(lhs) {
                    self.report(Diag::InvalidExpressionLeftOfAssignment { lhs: lhs.span() });
                }
                let rhs = self.parse_assignment_expression();
                if rhs.is_invalid() {
                    self.report(Diag::MissingOperandForOperator {
                        operator: operator_span,
                    });
                }
                self.alloc(Expression::Assignment { lhs, rhs })
            }
            kind if is_compound_assignment_operator(kind) => {
                let operator_span = self.peek_span();
                self.lexer.skip();
                let rhs = self.parse_assignment_expression();
                if rhs.is_invalid() {
                    self.report(Diag::MissingOperandForOperator {
                        operator: operator_span,
                    });
                }
                self.alloc(Expression::CompoundAssignment { lhs, rhs })
            }
            _ => lhs,
        }
    }

    fn parse_conditional_expression(&mut self) -> ExpressionRef<'code> {
        let condition = self.parse_binary_expression(OperatorPrecedence::LogicalOr as u8);
        if self.peek_kind() != TokenKind::Question {
            return condition;
        }
        let question_span = self.peek_span();
        self.lexer.skip();
        let true_branch = self.parse_assignment_expression();
        if true_branch.is_invalid() {
            self.report(Diag::MissingOperandForOperator {
                operator: question_span,
            });
        }
        if self.peek_kind() == TokenKind::Colon {
            self.lexer.skip();
        } else {
            self.report_fatal_token("Parser::parse_conditional_expression");
            let false_branch = self.invalid_here();
            return self.alloc(Expression::Conditional {
                condition,
                true_branch,
                false_branch,
            });
        }
        let false_branch = self.parse_assignment_expression();
        if false_branch.is_invalid() {
            self.report(Diag::MissingOperandForOperator {
                operator: question_span,
            });
        }
        self.alloc(Expression::Conditional {
            condition,
            true_branch,
            false_branch,
        })
    }

    fn parse_binary_expression(&mut self, min_precedence: u8) -> ExpressionRef<'code> {
        let mut lhs = self.parse_unary_expression();
        loop {
            let Some(precedence) = self.peek_binary_precedence() else {
                break;
            };
            let precedence = precedence as u8;
            if precedence < min_precedence {
                break;
            }

            if precedence == OperatorPrecedence::Exponentiation as u8 {
                // Right-associative; the right operand swallows the rest of
                // the chain.
                let operator_span = self.peek_span();
                self.lexer.skip();
                let rhs = self.parse_binary_expression(precedence);
                if lhs.is_invalid() || rhs.is_invalid() {
                    self.report(Diag::MissingOperandForOperator {
                        operator: operator_span,
                    });
                }
                lhs = self.alloc(Expression::BinaryOperator {
                    children: self.alloc_children(vec![lhs, rhs]),
                });
                continue;
            }

            // A left-associative family: flatten the whole same-precedence
            // chain into one variadic node.
            let lhs_was_invalid = lhs.is_invalid();
            let mut children = vec![lhs];
            let mut first_operator = true;
            while let Some(chain_precedence) = self.peek_binary_precedence() {
                if chain_precedence as u8 != precedence {
                    break;
                }
                let operator_span = self.peek_span();
                self.lexer.skip();
                let rhs = self.parse_binary_expression(precedence + 1);
                if rhs.is_invalid() || (first_operator && lhs_was_invalid) {
                    self.report(Diag::MissingOperandForOperator {
                        operator: operator_span,
                    });
                }
                first_operator = false;
                children.push(rhs);
            }
            lhs = self.alloc(Expression::BinaryOperator {
                children: self.alloc_children(children),
            });
        }
        lhs
    }

    fn peek_binary_precedence(&self) -> Option<OperatorPrecedence> {
        if self.peek_kind() == TokenKind::InKeyword && !self.allow_in_operator {
            return None;
        }
        binary_operator_precedence(self.peek_kind())
    }

    fn parse_unary_expression(&mut self) -> ExpressionRef<'code> {
        // A primary handed down by the statement layer short-circuits the
        // prefix-operator dispatch; only postfix forms may extend it.
        if let Some(primary) = self.pending_primary.take() {
            return self.parse_postfix_expression(primary);
        }
        let operator_span = self.peek_span();
        match self.peek_kind() {
            TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::VoidKeyword
            | TokenKind::DeleteKeyword => {
                self.lexer.skip();
                let child = self.parse_unary_expression();
                if child.is_invalid() {
                    self.report(Diag::MissingOperandForOperator {
                        operator: operator_span,
                    });
                }
                self.alloc(Expression::UnaryOperator {
                    child,
                    operator_begin: operator_span.begin,
                })
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                self.lexer.skip();
                let child = self.parse_unary_expression();
                if child.is_invalid() {
                    self.report(Diag::MissingOperandForOperator {
                        operator: operator_span,
                    });
                }
                self.alloc(Expression::RwUnaryPrefix {
                    child,
                    operator_begin: operator_span.begin,
                })
            }
            TokenKind::TypeofKeyword => {
                self.lexer.skip();
                let child = self.parse_unary_expression();
                if child.is_invalid() {
                    self.report(Diag::MissingOperandForOperator {
                        operator: operator_span,
                    });
                }
                self.alloc(Expression::Typeof {
                    child,
                    operator_begin: operator_span.begin,
                })
            }
            TokenKind::AwaitKeyword => {
                self.lexer.skip();
                let child = self.parse_unary_expression();
                if child.is_invalid() {
                    self.report(Diag::MissingOperandForOperator {
                        operator: operator_span,
                    });
                }
                self.alloc(Expression::Await {
                    child,
                    operator_begin: operator_span.begin,
                })
            }
            _ => {
                let primary = self.parse_primary_expression();
                self.parse_postfix_expression(primary)
            }
        }
    }

    fn parse_postfix_expression(
        &mut self,
        mut expression: ExpressionRef<'code>,
    ) -> ExpressionRef<'code> {
        loop {
            match self.peek_kind() {
                TokenKind::OpenParen => {
                    expression = self.parse_call_expression(expression);
                }
                TokenKind::Dot => {
                    self.lexer.skip();
                    if self.peek_kind() == TokenKind::Identifier
                        || self.peek_kind().is_keyword()
                    {
                        let property = self.eat_identifier();
                        expression = self.alloc(Expression::Dot {
                            object: expression,
                            property,
                        });
                    } else {
                        self.report_fatal_token("Parser::parse_postfix_expression");
                        return expression;
                    }
                }
                TokenKind::OpenBracket => {
                    let open_span = self.peek_span();
                    self.lexer.skip();
                    let subscript = self.parse_expression();
                    let subscript_end;
                    if self.peek_kind() == TokenKind::CloseBracket {
                        subscript_end = self.lexer.peek().end;
                        self.lexer.skip();
                    } else {
                        self.report(Diag::UnmatchedParenthesis { opener: open_span });
                        subscript_end = self.lexer.end_of_previous_token();
                    }
                    expression = self.alloc(Expression::Index {
                        object: expression,
                        subscript,
                        subscript_end,
                    });
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    if self.lexer.peek().has_leading_newline() {
                        // A suffix operator may not follow a line break; the
                        // prior expression ends here via semicolon insertion.
                        self.lexer.insert_semicolon();
                        return expression;
                    }
                    let operator_end = self.lexer.peek().end;
                    self.lexer.skip();
                    expression = self.alloc(Expression::RwUnarySuffix {
                        child: expression,
                        operator_end,
                    });
                }
                TokenKind::CompleteTemplate => {
                    let template_end = self.lexer.peek().end;
                    self.lexer.skip();
                    expression = self.alloc(Expression::TaggedTemplateLiteral {
                        children: self.alloc_children(vec![expression]),
                        template_span_end: template_end,
                    });
                }
                TokenKind::IncompleteTemplate => {
                    expression = self.parse_template(Some(expression));
                }
                _ => return expression,
            }
        }
    }

    fn parse_call_expression(
        &mut self,
        callee: ExpressionRef<'code>,
    ) -> ExpressionRef<'code> {
        let open_span = self.peek_span();
        self.lexer.skip();
        let mut children = vec![callee];
        let right_paren_end;
        loop {
            match self.peek_kind() {
                TokenKind::CloseParen => {
                    right_paren_end = self.lexer.peek().end;
                    self.lexer.skip();
                    break;
                }
                TokenKind::Comma => self.lexer.skip(),
                TokenKind::EndOfFile => {
                    self.report(Diag::UnmatchedParenthesis { opener: open_span });
                    right_paren_end = self.lexer.end_of_previous_token();
                    break;
                }
                _ => {
                    let argument = self.parse_assignment_expression();
                    if argument.is_invalid() {
                        // Unparseable argument; bail out of the list.
                        self.report(Diag::UnmatchedParenthesis { opener: open_span });
                        right_paren_end = self.lexer.end_of_previous_token();
                        children.push(argument);
                        break;
                    }
                    children.push(argument);
                }
            }
        }
        self.alloc(Expression::Call {
            children: self.alloc_children(children),
            right_paren_end,
        })
    }

    fn parse_primary_expression(&mut self) -> ExpressionRef<'code> {
        let span = self.peek_span();
        match self.peek_kind() {
            TokenKind::Identifier | TokenKind::LetKeyword => {
                let name = self.eat_identifier();
                self.alloc(Expression::Variable { name })
            }
            kind if kind.is_contextual_keyword() && kind != TokenKind::AsyncKeyword => {
                let name = self.eat_identifier();
                self.alloc(Expression::Variable { name })
            }
            TokenKind::Number
            | TokenKind::String
            | TokenKind::NullKeyword
            | TokenKind::TrueKeyword
            | TokenKind::FalseKeyword
            | TokenKind::ThisKeyword => {
                self.lexer.skip();
                self.alloc(Expression::Literal { span })
            }
            TokenKind::Slash | TokenKind::SlashEqual => {
                self.lexer.reparse_as_regexp();
                let span = self.peek_span();
                self.lexer.skip();
                self.alloc(Expression::Literal { span })
            }
            TokenKind::CompleteTemplate => {
                self.lexer.skip();
                self.alloc(Expression::Literal { span })
            }
            TokenKind::IncompleteTemplate => self.parse_template(None),
            TokenKind::OpenParen => self.parse_parenthesized_expression(),
            TokenKind::OpenBracket => self.parse_array_literal(),
            TokenKind::OpenBrace => self.parse_object_literal(),
            TokenKind::FunctionKeyword => {
                self.parse_function_expression(FunctionAttributes::Normal, span.begin)
            }
            TokenKind::AsyncKeyword => {
                self.lexer.skip();
                self.parse_async_tail(span)
            }
            TokenKind::NewKeyword => self.parse_new_expression(),
            TokenKind::SuperKeyword => {
                self.lexer.skip();
                self.alloc(Expression::Super { span })
            }
            TokenKind::ImportKeyword => {
                self.lexer.skip();
                self.alloc(Expression::Import { span })
            }
            _ => {
                // Not an expression start (likely a stranded operator); the
                // caller reports the missing operand.
                self.invalid_here()
            }
        }
    }

    fn parse_parenthesized_expression(&mut self) -> ExpressionRef<'code> {
        let open_span = self.peek_span();
        self.lexer.skip();
        if self.peek_kind() == TokenKind::CloseParen {
            self.lexer.skip();
            if self.peek_kind() == TokenKind::Arrow {
                self.lexer.skip();
                return self.parse_arrow_function_body(
                    Vec::new(),
                    FunctionAttributes::Normal,
                    Some(open_span.begin),
                );
            }
            self.report(Diag::MissingOperandForOperator {
                operator: open_span,
            });
            return self.invalid_here();
        }

        let inner = self.parse_expression();
        if self.peek_kind() == TokenKind::CloseParen {
            self.lexer.skip();
        } else {
            self.report(Diag::UnmatchedParenthesis { opener: open_span });
        }
        if self.peek_kind() == TokenKind::Arrow {
            self.lexer.skip();
            let parameters = flatten_comma_children(inner);
            return self.parse_arrow_function_body(
                parameters,
                FunctionAttributes::Normal,
                Some(open_span.begin),
            );
        }
        inner
    }

    fn parse_arrow_function_body(
        &mut self,
        parameters: Vec<ExpressionRef<'code>>,
        attributes: FunctionAttributes,
        parameter_list_begin: Option<u32>,
    ) -> ExpressionRef<'code> {
        let parameters = self.alloc_children(parameters);
        if self.peek_kind() == TokenKind::OpenBrace {
            let brace_span = self.peek_span();
            self.lexer.skip();
            let mut buffer = BufferingVisitor::new();
            while self.peek_kind() != TokenKind::CloseBrace
                && self.peek_kind() != TokenKind::EndOfFile
                && !self.fatal
            {
                self.parse_and_visit_statement(&mut buffer);
            }
            let span_end;
            if self.peek_kind() == TokenKind::CloseBrace {
                span_end = self.lexer.peek().end;
                self.lexer.skip();
            } else {
                if !self.fatal {
                    self.report(Diag::UnmatchedParenthesis { opener: brace_span });
                }
                span_end = self.lexer.end_of_previous_token();
            }
            let visits = self.store_visits(buffer);
            self.alloc(Expression::ArrowFunctionWithStatements {
                attributes,
                parameters,
                visits,
                parameter_list_begin,
                span_end,
            })
        } else {
            let arrow_end = self.lexer.end_of_previous_token();
            let body = self.parse_assignment_expression();
            if body.is_invalid() {
                self.report(Diag::MissingOperandForOperator {
                    operator: SourceSpan::new(arrow_end.saturating_sub(2), arrow_end),
                });
            }
            self.alloc(Expression::ArrowFunctionWithExpression {
                attributes,
                parameters,
                body,
                parameter_list_begin,
            })
        }
    }

    /// Parse the remainder of an `async ...` expression. The `async` token
    /// has been consumed; `async_span` is its span.
    fn parse_async_tail(&mut self, async_span: SourceSpan) -> ExpressionRef<'code> {
        match self.peek_kind() {
            TokenKind::FunctionKeyword => {
                self.parse_function_expression(FunctionAttributes::Async, async_span.begin)
            }
            _ if self.peek_is_identifier_like() => {
                let parameter_name = self.eat_identifier();
                let parameter = self.alloc(Expression::Variable {
                    name: parameter_name,
                });
                if self.peek_kind() == TokenKind::Arrow {
                    self.lexer.skip();
                    self.parse_arrow_function_body(
                        vec![parameter],
                        FunctionAttributes::Async,
                        Some(async_span.begin),
                    )
                } else {
                    // `async` was an ordinary variable after all.
                    self.report(Diag::UnexpectedIdentifier {
                        identifier: parameter_name.span(),
                    });
                    self.alloc(Expression::Variable {
                        name: Identifier::new(async_span, "async"),
                    })
                }
            }
            TokenKind::OpenParen => {
                let open_span = self.peek_span();
                self.lexer.skip();
                // Either an async arrow's parameter list or the argument
                // list of a call of a variable named `async`.
                let mut items = Vec::new();
                let right_paren_end;
                loop {
                    match self.peek_kind() {
                        TokenKind::CloseParen => {
                            right_paren_end = self.lexer.peek().end;
                            self.lexer.skip();
                            break;
                        }
                        TokenKind::EndOfFile => {
                            self.report(Diag::UnmatchedParenthesis { opener: open_span });
                            right_paren_end = self.lexer.end_of_previous_token();
                            break;
                        }
                        TokenKind::Comma => self.lexer.skip(),
                        _ => {
                            let item = self.parse_assignment_expression();
                            items.push(item);
                            if item.is_invalid() {
                                self.report(Diag::UnmatchedParenthesis { opener: open_span });
                                right_paren_end = self.lexer.end_of_previous_token();
                                break;
                            }
                        }
                    }
                }
                if self.peek_kind() == TokenKind::Arrow {
                    self.lexer.skip();
                    return self.parse_arrow_function_body(
                        items,
                        FunctionAttributes::Async,
                        Some(async_span.begin),
                    );
                }
                let callee = self.alloc(Expression::Variable {
                    name: Identifier::new(async_span, "async"),
                });
                let mut children = vec![callee];
                children.extend(items);
                self.alloc(Expression::Call {
                    children: self.alloc_children(children),
                    right_paren_end,
                })
            }
            _ => self.alloc(Expression::Variable {
                name: Identifier::new(async_span, "async"),
            }),
        }
    }

    /// Parse a function expression: `function [name] ( params ) { body }`.
    /// `begin` is the start offset (`function` or `async`).
    fn parse_function_expression(
        &mut self,
        attributes: FunctionAttributes,
        begin: u32,
    ) -> ExpressionRef<'code> {
        self.lexer.skip(); // 'function'
        let name = if self.peek_is_identifier_like() {
            Some(self.eat_identifier())
        } else {
            None
        };
        let mut buffer = BufferingVisitor::new();
        let body_end = self.parse_and_visit_function_parameters_and_body(&mut buffer);
        let visits = self.store_visits(buffer);
        let span = SourceSpan::new(begin, body_end);
        match name {
            Some(name) => self.alloc(Expression::NamedFunction {
                attributes,
                name,
                visits,
                span,
            }),
            None => self.alloc(Expression::Function {
                attributes,
                visits,
                span,
            }),
        }
    }

    fn parse_new_expression(&mut self) -> ExpressionRef<'code> {
        let new_span = self.peek_span();
        self.lexer.skip();
        if self.peek_kind() == TokenKind::Dot {
            self.lexer.skip();
            if self.peek_kind() == TokenKind::Identifier
                && self.lexer.peek().identifier_name().normalized_name() == "target"
            {
                let target_end = self.lexer.peek().end;
                self.lexer.skip();
                return self.alloc(Expression::NewTarget {
                    span: SourceSpan::new(new_span.begin, target_end),
                });
            }
            self.report_fatal_token("Parser::parse_new_expression");
            return self.invalid_here();
        }

        // The constructed expression binds member accesses but not calls.
        let mut callee = self.parse_primary_expression();
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.lexer.skip();
                    if self.peek_kind() == TokenKind::Identifier
                        || self.peek_kind().is_keyword()
                    {
                        let property = self.eat_identifier();
                        callee = self.alloc(Expression::Dot {
                            object: callee,
                            property,
                        });
                    } else {
                        self.report_fatal_token("Parser::parse_new_expression");
                        break;
                    }
                }
                TokenKind::OpenBracket => {
                    let open_span = self.peek_span();
                    self.lexer.skip();
                    let subscript = self.parse_expression();
                    let subscript_end;
                    if self.peek_kind() == TokenKind::CloseBracket {
                        subscript_end = self.lexer.peek().end;
                        self.lexer.skip();
                    } else {
                        self.report(Diag::UnmatchedParenthesis { opener: open_span });
                        subscript_end = self.lexer.end_of_previous_token();
                    }
                    callee = self.alloc(Expression::Index {
                        object: callee,
                        subscript,
                        subscript_end,
                    });
                }
                _ => break,
            }
        }

        let mut children = vec![callee];
        let end;
        if self.peek_kind() == TokenKind::OpenParen {
            let open_span = self.peek_span();
            self.lexer.skip();
            loop {
                match self.peek_kind() {
                    TokenKind::CloseParen | TokenKind::EndOfFile => break,
                    TokenKind::Comma => self.lexer.skip(),
                    _ => {
                        let argument = self.parse_assignment_expression();
                        children.push(argument);
                        if argument.is_invalid() {
                            break;
                        }
                    }
                }
            }
            if self.peek_kind() == TokenKind::CloseParen {
                end = self.lexer.peek().end;
                self.lexer.skip();
            } else {
                self.report(Diag::UnmatchedParenthesis { opener: open_span });
                end = self.lexer.end_of_previous_token();
            }
        } else {
            end = callee.span().end;
        }
        self.alloc(Expression::New {
            children: self.alloc_children(children),
            span: SourceSpan::new(new_span.begin, end),
        })
    }

    /// Parse a template literal with interpolations. The current token is
    /// `IncompleteTemplate`. A tag expression makes this a tagged template.
    fn parse_template(
        &mut self,
        tag: Option<ExpressionRef<'code>>,
    ) -> ExpressionRef<'code> {
        let template_begin = self.lexer.peek().begin;
        self.lexer.skip();
        let mut children: Vec<ExpressionRef<'code>> = Vec::new();
        if let Some(tag) = tag {
            children.push(tag);
        }
        let span_end;
        loop {
            let interpolation = self.parse_expression();
            children.push(interpolation);
            if self.peek_kind() == TokenKind::CloseBrace {
                self.lexer.skip_in_template(template_begin);
                match self.peek_kind() {
                    TokenKind::CompleteTemplate => {
                        span_end = self.lexer.peek().end;
                        self.lexer.skip();
                        break;
                    }
                    _ => {
                        // IncompleteTemplate: another interpolation follows.
                        self.lexer.skip();
                    }
                }
            } else {
                let end = self.lexer.end_of_previous_token();
                self.report(Diag::UnclosedTemplate {
                    incomplete_template: SourceSpan::new(template_begin, end),
                });
                span_end = end;
                break;
            }
        }
        match tag {
            Some(_) => self.alloc(Expression::TaggedTemplateLiteral {
                children: self.alloc_children(children),
                template_span_end: span_end,
            }),
            None => self.alloc(Expression::Template {
                children: self.alloc_children(children),
                span: SourceSpan::new(template_begin, span_end),
            }),
        }
    }

    fn parse_array_literal(&mut self) -> ExpressionRef<'code> {
        let open_span = self.peek_span();
        self.lexer.skip();
        let mut children = Vec::new();
        let end;
        loop {
            match self.peek_kind() {
                TokenKind::CloseBracket => {
                    end = self.lexer.peek().end;
                    self.lexer.skip();
                    break;
                }
                TokenKind::EndOfFile => {
                    self.report(Diag::UnmatchedParenthesis { opener: open_span });
                    end = self.lexer.end_of_previous_token();
                    break;
                }
                TokenKind::Comma => self.lexer.skip(), // elision
                _ => {
                    let element = self.parse_assignment_expression();
                    if element.is_invalid() {
                        self.report(Diag::UnmatchedParenthesis { opener: open_span });
                        end = self.lexer.end_of_previous_token();
                        break;
                    }
                    children.push(element);
                }
            }
        }
        self.alloc(Expression::Array {
            children: self.alloc_children(children),
            span: SourceSpan::new(open_span.begin, end),
        })
    }

    fn parse_object_literal(&mut self) -> ExpressionRef<'code> {
        let open_span = self.peek_span();
        self.lexer.skip();
        let mut entries: Vec<ObjectEntry<'code>> = Vec::new();
        let end;
        loop {
            match self.peek_kind() {
                TokenKind::CloseBrace => {
                    end = self.lexer.peek().end;
                    self.lexer.skip();
                    break;
                }
                TokenKind::EndOfFile => {
                    self.report(Diag::UnmatchedParenthesis { opener: open_span });
                    end = self.lexer.end_of_previous_token();
                    break;
                }
                TokenKind::Comma => {
                    self.lexer.skip();
                    continue;
                }
                _ => {}
            }

            let Some(entry) = self.parse_object_literal_entry() else {
                end = self.lexer.end_of_previous_token();
                break;
            };
            entries.push(entry);

            if !matches!(
                self.peek_kind(),
                TokenKind::Comma | TokenKind::CloseBrace | TokenKind::EndOfFile
            ) {
                let boundary = self.lexer.end_of_previous_token();
                self.report(Diag::MissingCommaBetweenObjectLiteralEntries {
                    entry_boundary: SourceSpan::empty(boundary),
                });
            }
        }
        self.alloc(Expression::Object {
            entries: self.arena.alloc_slice_copy(&entries),
            span: SourceSpan::new(open_span.begin, end),
        })
    }

    fn parse_object_literal_entry(&mut self) -> Option<ObjectEntry<'code>> {
        match self.peek_kind() {
            TokenKind::DotDotDot => {
                let operator_span = self.peek_span();
                self.lexer.skip();
                let child = self.parse_assignment_expression();
                if child.is_invalid() {
                    self.report(Diag::MissingOperandForOperator {
                        operator: operator_span,
                    });
                }
                let value = self.alloc(Expression::Spread {
                    child,
                    operator_begin: operator_span.begin,
                });
                Some(ObjectEntry {
                    property: None,
                    value,
                })
            }
            TokenKind::GetKeyword | TokenKind::SetKeyword => {
                let accessor = *self.lexer.peek();
                self.lexer.skip();
                match self.peek_kind() {
                    TokenKind::Colon => {
                        // `get`/`set` used as an ordinary key.
                        self.lexer.skip();
                        let property =
                            self.alloc(Expression::Literal { span: accessor.span() });
                        let value = self.parse_assignment_expression();
                        Some(ObjectEntry {
                            property: Some(property),
                            value,
                        })
                    }
                    TokenKind::OpenParen => {
                        // A method named `get`/`set`.
                        let property =
                            self.alloc(Expression::Literal { span: accessor.span() });
                        let value = self.parse_method_function(accessor.begin);
                        Some(ObjectEntry {
                            property: Some(property),
                            value,
                        })
                    }
                    TokenKind::Comma | TokenKind::CloseBrace => {
                        // Shorthand `{get}`.
                        let property =
                            self.alloc(Expression::Literal { span: accessor.span() });
                        let value = self.alloc(Expression::Variable {
                            name: accessor.identifier_name(),
                        });
                        Some(ObjectEntry {
                            property: Some(property),
                            value,
                        })
                    }
                    _ => {
                        // An accessor; the value function's span starts at
                        // the property name.
                        let property = self.parse_object_property_key()?;
                        let value = self.parse_method_function(property.span().begin);
                        Some(ObjectEntry {
                            property: Some(property),
                            value,
                        })
                    }
                }
            }
            _ => {
                let property = self.parse_object_property_key()?;
                match self.peek_kind() {
                    TokenKind::Colon => {
                        self.lexer.skip();
                        let value = self.parse_assignment_expression();
                        Some(ObjectEntry {
                            property: Some(property),
                            value,
                        })
                    }
                    TokenKind::OpenParen => {
                        let value = self.parse_method_function(property.span().begin);
                        Some(ObjectEntry {
                            property: Some(property),
                            value,
                        })
                    }
                    TokenKind::Equal => {
                        // `{key = value}`: a shorthand with a default, as in
                        // destructuring assignment.
                        let name = self.object_key_as_identifier(property)?;
                        self.lexer.skip();
                        let rhs = self.parse_assignment_expression();
                        let lhs = self.alloc(Expression::Variable { name });
                        let value = self.alloc(Expression::Assignment { lhs, rhs });
                        Some(ObjectEntry {
                            property: Some(property),
                            value,
                        })
                    }
                    _ => {
                        // Shorthand `{thing}`.
                        let name = self.object_key_as_identifier(property)?;
                        let value = self.alloc(Expression::Variable { name });
                        Some(ObjectEntry {
                            property: Some(property),
                            value,
                        })
                    }
                }
            }
        }
    }

    /// Parse an object property key: a name, string, number, or computed
    /// `[expression]`. Returns `None` after a fatal report.
    fn parse_object_property_key(&mut self) -> Option<ExpressionRef<'code>> {
        match self.peek_kind() {
            TokenKind::String | TokenKind::Number => {
                let span = self.peek_span();
                self.lexer.skip();
                Some(self.alloc(Expression::Literal { span }))
            }
            TokenKind::OpenBracket => {
                let open_span = self.peek_span();
                self.lexer.skip();
                let key = self.parse_expression();
                if self.peek_kind() == TokenKind::CloseBracket {
                    self.lexer.skip();
                } else {
                    self.report(Diag::UnmatchedParenthesis { opener: open_span });
                }
                Some(key)
            }
            kind if kind == TokenKind::Identifier || kind.is_keyword() => {
                let span = self.peek_span();
                self.key_token = Some(*self.lexer.peek());
                self.lexer.skip();
                Some(self.alloc(Expression::Literal { span }))
            }
            _ => {
                self.report_fatal_token("Parser::parse_object_property_key");
                None
            }
        }
    }

    /// Recover the identifier for a shorthand entry whose key was just
    /// parsed by `parse_object_property_key`.
    fn object_key_as_identifier(
        &mut self,
        property: ExpressionRef<'code>,
    ) -> Option<Identifier<'code>> {
        match self.key_token.take() {
            Some(token) if token.span() == property.span() => Some(token.identifier_name()),
            _ => {
                self.report_fatal_token("Parser::parse_object_literal_entry");
                None
            }
        }
    }

    /// Parse `( params ) { body }` as a method value function whose span
    /// starts at `begin` (the property name).
    fn parse_method_function(&mut self, begin: u32) -> ExpressionRef<'code> {
        let mut buffer = BufferingVisitor::new();
        let body_end = self.parse_and_visit_function_parameters_and_body(&mut buffer);
        let visits = self.store_visits(buffer);
        self.alloc(Expression::Function {
            attributes: FunctionAttributes::Normal,
            visits,
            span: SourceSpan::new(begin, body_end),
        })
    }

    // ========================================================================
    // Expression visiting
    // ========================================================================

    /// Emit the variable uses, assignments, and function scopes of a parsed
    /// expression into `v`, in evaluation order.
    pub fn visit_expression<V: ParseVisitor<'code>>(
        &mut self,
        expression: ExpressionRef<'code>,
        v: &mut V,
    ) {
        match expression {
            Expression::Invalid { .. }
            | Expression::Literal { .. }
            | Expression::NewTarget { .. }
            | Expression::Super { .. }
            | Expression::Import { .. } => {}
            Expression::Variable { name } => v.visit_variable_use(*name),
            Expression::Typeof { child, .. } => match child {
                Expression::Variable { name } => v.visit_variable_typeof_use(*name),
                _ => self.visit_expression(child, v),
            },
            Expression::UnaryOperator { child, .. }
            | Expression::Await { child, .. }
            | Expression::Spread { child, .. } => self.visit_expression(child, v),
            Expression::RwUnaryPrefix { child, .. }
            | Expression::RwUnarySuffix { child, .. } => match child {
                Expression::Variable { name } => v.visit_variable_assignment(*name),
                _ => self.visit_expression(child, v),
            },
            Expression::BinaryOperator { children }
            | Expression::Call { children, .. }
            | Expression::New { children, .. }
            | Expression::Array { children, .. }
            | Expression::Template { children, .. }
            | Expression::TaggedTemplateLiteral { children, .. } => {
                for &child in *children {
                    self.visit_expression(child, v);
                }
            }
            Expression::Assignment { lhs, rhs }
            | Expression::CompoundAssignment { lhs, rhs } => {
                self.visit_expression(rhs, v);
                self.visit_assignment_target(lhs, v);
            }
            Expression::Conditional {
                condition,
                true_branch,
                false_branch,
            } => {
                self.visit_expression(condition, v);
                self.visit_expression(true_branch, v);
                self.visit_expression(false_branch, v);
            }
            Expression::Dot { object, .. } => self.visit_expression(object, v),
            Expression::Index {
                object, subscript, ..
            } => {
                self.visit_expression(object, v);
                self.visit_expression(subscript, v);
            }
            Expression::Object { entries, .. } => {
                for entry in *entries {
                    if let Some(property) = entry.property {
                        self.visit_expression(property, v);
                    }
                    self.visit_expression(entry.value, v);
                }
            }
            Expression::Function { visits, .. } => {
                v.visit_enter_function_scope();
                self.take_visits(*visits).move_into(v);
                v.visit_exit_function_scope();
            }
            Expression::NamedFunction { name, visits, .. } => {
                v.visit_enter_named_function_scope(*name);
                self.take_visits(*visits).move_into(v);
                v.visit_exit_function_scope();
            }
            Expression::ArrowFunctionWithExpression {
                parameters, body, ..
            } => {
                v.visit_enter_function_scope();
                for &parameter in *parameters {
                    self.visit_parameter(parameter, v);
                }
                v.visit_enter_function_scope_body();
                self.visit_expression(body, v);
                v.visit_exit_function_scope();
            }
            Expression::ArrowFunctionWithStatements {
                parameters, visits, ..
            } => {
                v.visit_enter_function_scope();
                for &parameter in *parameters {
                    self.visit_parameter(parameter, v);
                }
                v.visit_enter_function_scope_body();
                self.take_visits(*visits).move_into(v);
                v.visit_exit_function_scope();
            }
        }
    }

    /// Declare an arrow-function parameter expression.
    fn visit_parameter<V: ParseVisitor<'code>>(
        &mut self,
        parameter: ExpressionRef<'code>,
        v: &mut V,
    ) {
        match parameter {
            Expression::Variable { name } => {
                v.visit_variable_declaration(*name, VariableKind::Parameter)
            }
            Expression::Assignment { lhs, rhs } => {
                // A default value: evaluated, then the target is bound.
                self.visit_expression(rhs, v);
                self.visit_parameter(lhs, v);
            }
            Expression::Spread { child, .. } => self.visit_parameter(child, v),
            Expression::Array { children, .. } => {
                for child in *children {
                    self.visit_parameter(child, v);
                }
            }
            Expression::Object { entries, .. } => {
                for entry in *entries {
                    if let Some(property) = entry.property {
                        if property.kind() != crate::expression::ExpressionKind::Literal {
                            self.visit_expression(property, v);
                        }
                    }
                    self.visit_parameter(entry.value, v);
                }
            }
            _ => self.visit_expression(parameter, v),
        }
    }

    /// Emit assignment events for the target side of an assignment.
    fn visit_assignment_target<V: ParseVisitor<'code>>(
        &mut self,
        target: ExpressionRef<'code>,
        v: &mut V,
    ) {
        match target {
            Expression::Variable { name } => v.visit_variable_assignment(*name),
            Expression::Dot { object, .. } => self.visit_expression(object, v),
            Expression::Index {
                object, subscript, ..
            } => {
                self.visit_expression(object, v);
                self.visit_expression(subscript, v);
            }
            Expression::Array { children, .. } => {
                for child in *children {
                    self.visit_assignment_target(child, v);
                }
            }
            Expression::Object { entries, .. } => {
                for entry in *entries {
                    if let Some(property) = entry.property {
                        if property.kind() != crate::expression::ExpressionKind::Literal {
                            self.visit_expression(property, v);
                        }
                    }
                    self.visit_assignment_target(entry.value, v);
                }
            }
            Expression::Spread { child, .. } => self.visit_assignment_target(child, v),
            Expression::Assignment { lhs, rhs } => {
                // A destructuring default.
                self.visit_expression(rhs, v);
                self.visit_assignment_target(lhs, v);
            }
            _ => self.visit_expression(target, v),
        }
    }
}

/// Whether `expression` may legally appear left of `=`.
fn is_valid_assignment_target(expression: ExpressionRef<'_>) -> bool {
    use crate::expression::ExpressionKind::*;
    matches!(
        expression.kind(),
        Variable | Dot | Index | Array | Object
    )
}

/// The children of a comma chain, or the expression itself.
fn flatten_comma_children<'code>(
    expression: ExpressionRef<'code>,
) -> Vec<ExpressionRef<'code>> {
    match expression {
        Expression::BinaryOperator { children } => children.to_vec(),
        _ => vec![expression],
    }
}
