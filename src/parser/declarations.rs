//! Declaration parsing implementation
//!
//! Statement handlers for the two declaration forms of the struct subset:
//!
//! - Struct declarations, with optional body and typedef alias
//! - Member declarations, one handler shared by every primitive type keyword
//!
//! # Grammar
//!
//! ```text
//! struct_decl ::= "struct" identifier? ( ";" | "{" member_decl* "}" identifier? ";" )
//! member_decl ::= type declarator ( "," declarator )* ";"
//! declarator  ::= identifier ( "[" expression "]" )?
//! ```
//!
//! A leading `typedef` is an undeclared name parsed as an expression
//! statement, so `typedef struct a { ... } b;` needs no special handling.
//!
//! All handlers report problems and keep going; none of them stop the parse.

use super::ast::{Declaration, SymbolId, SymbolKind};
use super::parse::Parser;
use super::symbols::{Std, END};

impl Parser<'_> {
    pub(crate) fn statement_denotation(&mut self, keyword: SymbolId, std: Std) -> Option<SymbolId> {
        match std {
            Std::Struct => self.parse_struct(keyword),
            Std::Member => {
                self.parse_members(keyword);
                None
            }
        }
    }

    /// Parse the rest of a `struct` statement. Returns the struct's primary
    /// name symbol when the statement declared one.
    fn parse_struct(&mut self, keyword: SymbolId) -> Option<SymbolId> {
        let name = self.is_name().then_some(self.token);
        if name.is_some() {
            self.advance();
        }

        // Forward declaration
        if self.check(";") {
            self.advance();
            let Some(name) = name else {
                self.error(keyword, "Expected a struct name");
                return None;
            };
            if self.is_struct_declared(name) {
                return None;
            }
            return Some(self.define(name, keyword));
        }

        if let Some(name) = name {
            self.define(name, keyword);
        }

        self.expect("{");
        let inner = self.open_scope();
        self.parse_statements();
        // Leave the body before reading past `}` so the alias resolves outside.
        self.close_scope();
        self.expect("}");

        let mut primary = name;
        if let Some(name) = name {
            if let Some(declaration) = self.declaration_mut(name) {
                declaration.inner_scope = Some(inner);
            }
        }

        if self.is_name() {
            let alias = self.token;
            match primary {
                Some(primary) => self.define_alias(alias, keyword, primary),
                None => {
                    self.define(alias, keyword);
                    if let Some(declaration) = self.declaration_mut(alias) {
                        declaration.inner_scope = Some(inner);
                    }
                    primary = Some(alias);
                }
            }
            self.advance();
        }

        if primary.is_none() {
            self.error(keyword, "Anonymous struct requires a typedef name");
        }

        self.expect(";");
        primary
    }

    /// Parse the declarators following a primitive type keyword.
    fn parse_members(&mut self, keyword: SymbolId) {
        if self.is_global_scope() {
            // The remaining declarators are parsed as ordinary statements.
            self.error(keyword, "Members must be declared inside a struct");
            return;
        }

        loop {
            if self.is_name() {
                let name = self.token;
                self.define(name, keyword);
                self.advance();

                if self.check("[") {
                    self.advance();
                    let dimension = self.parse_expression(0);
                    if self.symbol(dimension).kind != SymbolKind::Literal {
                        self.error(dimension, "Array dimension must be an integer literal");
                    }
                    self.expect("]");
                    if let Some(declaration) = self.declaration_mut(name) {
                        declaration.dimension = Some(dimension);
                    }
                }
            } else {
                let token = self.token;
                self.error(token, "Expected a new variable name");
                if self.check(";") || self.check("}") || self.check(END) {
                    break;
                }
                self.advance();
            }

            if !self.check(",") {
                break;
            }
            self.advance();
        }

        // Leave `}` for the enclosing struct.
        if self.check("}") || self.check(END) {
            self.report_expected(";");
        } else {
            self.expect(";");
        }
    }

    fn is_name(&self) -> bool {
        self.current().kind == SymbolKind::Name
    }

    /// Whether `name` already names a struct in the current scope.
    fn is_struct_declared(&self, name: SymbolId) -> bool {
        let value = &self.symbol(name).value;
        self.scopes[self.scope.0].get(value).is_some_and(|existing| {
            let existing = self.symbol(existing);
            existing.is_declaration()
                && existing
                    .declared_type()
                    .is_some_and(|declared| self.symbol(declared).value == "struct")
        })
    }

    fn declaration_mut(&mut self, id: SymbolId) -> Option<&mut Declaration> {
        self.symbol_mut(id).declaration.as_mut()
    }
}
