//! Scope chain and symbol resolution
//!
//! The global scope is `scopes[0]`; every struct body opens one child scope.
//! Lookups walk the chain outwards and then fall back to the prototype table,
//! so an undeclared identifier still resolves (to the generic `(name)`
//! prototype) and parsing can go on.

use super::ast::{Declaration, Scope, ScopeId, Symbol, SymbolId, SymbolKind};
use super::parse::Parser;
use super::symbols::{Handlers, NAME};
use log::debug;

impl Parser<'_> {
    /// Declare `name` in the current scope with the given type keyword.
    ///
    /// A name already defined in this scope is reported, and the new
    /// definition replaces it for later lookups.
    pub(crate) fn define(&mut self, name: SymbolId, declared_type: SymbolId) -> SymbolId {
        let value = self.symbol(name).value.clone();

        if let Some(existing) = self.scopes[self.scope.0].get(&value) {
            if !self.completes_forward_declaration(existing, declared_type) {
                self.warn(name, format!("Already defined: {value}"));
            }
        }

        self.declare(name, declared_type);
        self.scopes[self.scope.0].definitions.insert(value, name);
        name
    }

    /// Declare `alias` as the typedef name of `primary`.
    ///
    /// Any clash is reported. An alias spelled like its own struct is linked
    /// but never takes the struct's slot in the scope.
    pub(crate) fn define_alias(&mut self, alias: SymbolId, declared_type: SymbolId, primary: SymbolId) {
        let value = self.symbol(alias).value.clone();
        let existing = self.scopes[self.scope.0].get(&value);
        if existing.is_some() {
            self.warn(alias, format!("Already defined: {value}"));
        }

        self.declare(alias, declared_type);
        if let Some(declaration) = self.symbol_mut(alias).declaration.as_mut() {
            declaration.is_alias = true;
        }
        if let Some(declaration) = self.symbol_mut(primary).declaration.as_mut() {
            declaration.alias = Some(alias);
        }

        if existing != Some(primary) {
            self.scopes[self.scope.0].definitions.insert(value, alias);
        }
    }

    /// Turn `name` into a declaration owned by the current scope.
    fn declare(&mut self, name: SymbolId, declared_type: SymbolId) {
        let scope = self.scope;
        let symbol = self.symbol_mut(name);
        symbol.kind = SymbolKind::Name;
        symbol.handlers = Handlers::itself();
        symbol.binding_power = 0;
        symbol.reserved = false;
        symbol.scope = Some(scope);
        symbol.declaration = Some(Declaration::new(declared_type));
    }

    /// Resolve a spelling through the scope chain, then the prototype table.
    pub(crate) fn find(&self, name: &str) -> Symbol {
        let mut scope = Some(self.scope);
        while let Some(id) = scope {
            let current = &self.scopes[id.0];
            if let Some(symbol) = current.get(name) {
                return self.symbol(symbol).clone();
            }
            scope = current.parent;
        }

        self.table
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.table.prototype(NAME))
    }

    /// Mark a keyword as reserved in the current scope.
    pub(crate) fn reserve(&mut self, token: SymbolId) {
        let value = self.symbol(token).value.clone();

        if let Some(existing) = self.scopes[self.scope.0].get(&value) {
            let existing = self.symbol(existing);
            if existing.reserved {
                return;
            }
            if existing.kind == SymbolKind::Name {
                self.warn(token, format!("Already defined: {value}"));
            }
        }

        self.symbol_mut(token).reserved = true;
        self.scopes[self.scope.0].definitions.insert(value, token);
    }

    /// Create a child of the current scope and make it current.
    pub(crate) fn open_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(Some(self.scope)));
        self.enter_scope(id);
        id
    }

    /// Make `id` current. It must be a direct child of the current scope.
    pub(crate) fn enter_scope(&mut self, id: ScopeId) {
        assert_eq!(
            self.scopes[id.0].parent,
            Some(self.scope),
            "bad scope pushed"
        );
        debug!("enter scope {} (parent {})", id.0, self.scope.0);
        self.scope = id;
    }

    pub(crate) fn close_scope(&mut self) {
        if let Some(parent) = self.scopes[self.scope.0].parent {
            debug!("leave scope {}", self.scope.0);
            self.scope = parent;
        }
    }

    pub(crate) fn is_global_scope(&self) -> bool {
        self.scopes[self.scope.0].is_global()
    }

    /// `struct A { ... }` after `struct A;` in the same scope.
    fn completes_forward_declaration(&self, existing: SymbolId, declared_type: SymbolId) -> bool {
        let existing = self.symbol(existing);
        let is_struct = |id: SymbolId| self.symbol(id).value == "struct";

        existing.is_declaration()
            && existing.inner_scope().is_none()
            && !existing.is_alias()
            && existing.declared_type().is_some_and(is_struct)
            && is_struct(declared_type)
    }
}
