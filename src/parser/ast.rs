//! Parse tree definitions for the C struct front end
//!
//! Every token the parser materializes becomes a [`Symbol`] stored in a flat
//! arena owned by the [`ParseResult`]. Cross references (a member's declared
//! type, a struct's alias, the scope a name lives in) are plain indices into
//! that arena or into the scope list, so the whole tree can be handed to a
//! code generator without lifetimes or reference counting.

use super::diagnostics::Diagnostic;
use super::lexer::Lexeme;
use super::symbols::Handlers;
use indexmap::IndexMap;
use std::fmt;

/// Zero-based line/character position in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// Span between two positions. `end` is exclusive for lexemes, but
/// [`Range::contains`] treats both ends as inside the range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// An empty range sitting at `position`.
    pub fn empty(position: Position) -> Self {
        Self::new(position, position)
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<((usize, usize), (usize, usize))> for Range {
    fn from(((sl, sc), (el, ec)): ((usize, usize), (usize, usize))) -> Self {
        Range::new(Position::new(sl, sc), Position::new(el, ec))
    }
}

/// Index of a [`Symbol`] in [`ParseResult::symbols`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub usize);

/// Index of a [`Scope`] in [`ParseResult::scopes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub usize);

/// Grammatical role of a symbol (its arity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Name,
    Literal,
    Type,
    Operator,
    Unary,
    Binary,
    Statement,
    End,
}

/// Fields only a declared name carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The keyword symbol (`struct`, `int`, ...) the name was declared with.
    pub declared_type: SymbolId,
    /// Body scope of a struct. `None` for members and forward declarations.
    pub inner_scope: Option<ScopeId>,
    /// Array length expression of a member declared as `name[N]`.
    pub dimension: Option<SymbolId>,
    /// Typedef alias of a struct (`typedef struct a { ... } b;`).
    pub alias: Option<SymbolId>,
    pub is_alias: bool,
}

impl Declaration {
    pub fn new(declared_type: SymbolId) -> Self {
        Self {
            declared_type,
            inner_scope: None,
            dimension: None,
            alias: None,
            is_alias: false,
        }
    }
}

/// A parsed token, created by cloning a prototype and stamping it with the
/// concrete spelling and range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Spelling of the prototype this symbol was cloned from, e.g. `"struct"`,
    /// `";"`, `"(name)"` or `"(literal)"`.
    pub id: String,
    pub value: String,
    pub kind: SymbolKind,
    pub range: Range,
    /// Left binding power.
    pub binding_power: u32,
    pub reserved: bool,
    pub handlers: Handlers,
    pub scope: Option<ScopeId>,
    /// Operands of unary/binary expressions.
    pub first: Option<SymbolId>,
    pub second: Option<SymbolId>,
    pub declaration: Option<Declaration>,
}

impl Symbol {
    /// A bare prototype with no handlers.
    pub fn prototype(id: &str, binding_power: u32) -> Self {
        Self {
            id: id.to_string(),
            value: id.to_string(),
            kind: SymbolKind::Operator,
            range: Range::default(),
            binding_power,
            reserved: false,
            handlers: Handlers::default(),
            scope: None,
            first: None,
            second: None,
            declaration: None,
        }
    }

    /// Clone this prototype into a fresh token occurrence.
    pub(crate) fn instantiate(&self, value: &str, kind: SymbolKind, range: Range) -> Self {
        let mut token = self.clone();
        token.value = value.to_string();
        token.kind = kind;
        token.range = range;
        token.first = None;
        token.second = None;
        token.declaration = None;
        token
    }

    /// True for names that went through `define`.
    pub fn is_declaration(&self) -> bool {
        self.kind == SymbolKind::Name && self.declaration.is_some()
    }

    /// Whether an expression statement rooted here produced something usable.
    pub fn is_expression(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Name
                | SymbolKind::Literal
                | SymbolKind::Type
                | SymbolKind::Unary
                | SymbolKind::Binary
        )
    }

    pub fn declared_type(&self) -> Option<SymbolId> {
        self.declaration.as_ref().map(|d| d.declared_type)
    }

    pub fn inner_scope(&self) -> Option<ScopeId> {
        self.declaration.as_ref().and_then(|d| d.inner_scope)
    }

    pub fn dimension(&self) -> Option<SymbolId> {
        self.declaration.as_ref().and_then(|d| d.dimension)
    }

    pub fn alias(&self) -> Option<SymbolId> {
        self.declaration.as_ref().and_then(|d| d.alias)
    }

    pub fn is_alias(&self) -> bool {
        self.declaration.as_ref().is_some_and(|d| d.is_alias)
    }
}

/// A declaration namespace: the global scope or one struct body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    /// Declarations and reserved keywords, in first-definition order.
    pub definitions: IndexMap<String, SymbolId>,
    pub parent: Option<ScopeId>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>) -> Self {
        Self {
            definitions: IndexMap::new(),
            parent,
        }
    }

    pub fn is_global(&self) -> bool {
        self.parent.is_none()
    }

    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.definitions.get(name).copied()
    }
}

/// Everything one `parse` call produces.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Top-level statements that declared something (struct names).
    pub ast: Vec<SymbolId>,
    pub root_scope: ScopeId,
    pub scopes: Vec<Scope>,
    /// Every symbol created, in source order.
    pub symbols: Vec<Symbol>,
    pub diagnostics: Vec<Diagnostic>,
    pub comments: Vec<Lexeme>,
}

impl ParseResult {
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn root(&self) -> &Scope {
        self.scope(self.root_scope)
    }

    /// Spelling of a symbol's declared type, e.g. `"struct"` or `"unsigned int"`.
    pub fn type_name(&self, id: SymbolId) -> Option<&str> {
        self.symbol(id)
            .declared_type()
            .map(|t| self.symbol(t).value.as_str())
    }

    /// Looks a declared name up in one scope.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(scope)
            .get(name)
            .filter(|id| self.symbol(*id).is_declaration())
    }

    /// Struct symbols with a body, excluding typedef aliases, in declaration order.
    pub fn structs(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.root().definitions.values().copied().filter(|id| {
            let symbol = self.symbol(*id);
            symbol.is_declaration()
                && !symbol.is_alias()
                && symbol.inner_scope().is_some()
                && self.type_name(*id) == Some("struct")
        })
    }

    /// Member symbols of a struct, in declaration order.
    pub fn members(&self, structure: SymbolId) -> Vec<SymbolId> {
        match self.symbol(structure).inner_scope() {
            Some(scope) => self
                .scope(scope)
                .definitions
                .values()
                .copied()
                .filter(|id| self.symbol(*id).is_declaration())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}
