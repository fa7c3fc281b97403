//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct: the caller-owned parsing
//! context holding the token stream, the symbol arena, the scope chain and the
//! diagnostic sink. Nothing is shared between parses, so independent sources
//! can be parsed concurrently on separate threads.
//!
//! # Parser Architecture
//!
//! - This module: Parser struct, token materialization, statement dispatch
//! - `scope`: define / find / reserve and scope push/pop
//! - `expressions`: the Pratt loop (null and left denotations)
//! - `declarations`: the `struct` and member declaration statements
//!
//! # Grammar
//!
//! ```text
//! program    ::= statement*
//! statement  ::= keyword std | expression
//! expression ::= nud led*
//! ```
//!
//! Parser methods are split across multiple files using `impl Parser` blocks.

use super::ast::{ParseResult, Range, Scope, ScopeId, Symbol, SymbolId, SymbolKind};
use super::diagnostics::Diagnostics;
use super::lexer::{new_lexer, LexError, Lexeme, LexemeKind, Lexer};
use super::symbols::{SymbolTable, END, LITERAL};
use log::{debug, trace};

/// Pratt parser over a pull-based lexer.
pub struct Parser<'a> {
    lexer: Lexer<'a, Lexeme>,
    pub(crate) table: SymbolTable,
    /// The current (lookahead) token.
    pub(crate) token: SymbolId,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) scope: ScopeId,
    pub(crate) diagnostics: Diagnostics,
    comments: Vec<Lexeme>,
    end: Option<SymbolId>,
}

impl<'a> Parser<'a> {
    /// Parser for C struct declarations.
    pub fn new(source: &'a str) -> Result<Self, LexError> {
        Self::with_grammar(new_lexer(source)?, SymbolTable::c_structs())
    }

    /// Parser driven by a custom lexer and prototype table.
    pub fn with_grammar(mut lexer: Lexer<'a, Lexeme>, table: SymbolTable) -> Result<Self, LexError> {
        lexer.start()?;

        let mut parser = Self {
            lexer,
            table,
            token: SymbolId(0),
            symbols: Vec::new(),
            scopes: vec![Scope::new(None)],
            scope: ScopeId(0),
            diagnostics: Diagnostics::new(),
            comments: Vec::new(),
            end: None,
        };
        parser.advance();
        Ok(parser)
    }

    /// Parse the whole input. Never fails: problems end up in
    /// [`ParseResult::diagnostics`].
    pub fn parse(mut self) -> ParseResult {
        let mut ast = Vec::new();

        loop {
            ast.extend(self.parse_statements());
            if self.check(END) {
                break;
            }
            // Only `}` stops a statement list before the end of input.
            let stray = self.token;
            let message = format!("Unexpected: \"{}\"", self.symbol(stray).value);
            self.error(stray, message);
            self.advance();
        }

        ParseResult {
            ast,
            root_scope: ScopeId(0),
            scopes: self.scopes,
            symbols: self.symbols,
            diagnostics: self.diagnostics.into_vec(),
            comments: self.comments,
        }
    }

    // ===== Statements =====

    /// Parse one statement. Returns the declared symbol for statements that
    /// declare something at this level.
    pub(crate) fn parse_statement(&mut self) -> Option<SymbolId> {
        let token = self.token;

        if let Some(std) = self.symbol(token).handlers.std {
            debug!("statement {:?} at {}", self.symbol(token).value, self.symbol(token).range.start);
            self.advance();
            self.reserve(token);
            self.symbol_mut(token).kind = SymbolKind::Statement;
            return self.statement_denotation(token, std);
        }

        let expression = self.parse_expression(0);
        if !self.symbol(expression).is_expression() {
            self.error(expression, "Bad expression statement.");
        }
        None
    }

    /// Parse statements until `}` or the end of input.
    pub(crate) fn parse_statements(&mut self) -> Vec<SymbolId> {
        let mut statements = Vec::new();
        while !self.check("}") && !self.check(END) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
        }
        statements
    }

    // ===== Token stream =====

    /// Materialize the next token, recording comments on the way.
    pub(crate) fn advance(&mut self) -> SymbolId {
        let token = loop {
            match self.lexer.lex() {
                Ok(Some(lexeme)) if lexeme.kind == LexemeKind::Comment => self.comments.push(lexeme),
                Ok(Some(lexeme)) => break self.materialize(lexeme),
                Ok(None) => break self.end_token(),
                Err(error) => {
                    self.diagnostics
                        .error(Range::empty(self.lexer.position()), error.to_string());
                    break self.end_token();
                }
            }
        };
        self.token = token;
        token
    }

    fn materialize(&mut self, lexeme: Lexeme) -> SymbolId {
        let (prototype, kind) = match lexeme.kind {
            LexemeKind::Name => (self.find(&lexeme.text), SymbolKind::Name),
            LexemeKind::Type => (self.find(&lexeme.text), SymbolKind::Type),
            LexemeKind::Number => (self.table.prototype(LITERAL), SymbolKind::Literal),
            LexemeKind::Operator | LexemeKind::Comment => match self.table.get(&lexeme.text) {
                Some(prototype) => (prototype.clone(), SymbolKind::Operator),
                None => {
                    self.diagnostics
                        .error(lexeme.range, format!("Unknown operator: \"{}\"", lexeme.text));
                    (Symbol::prototype(&lexeme.text, 0), SymbolKind::Operator)
                }
            },
        };

        let mut symbol = prototype.instantiate(&lexeme.text, kind, lexeme.range);
        symbol.scope = (kind == SymbolKind::Name).then_some(self.scope);
        trace!("token {:?} ({:?}) at {}", symbol.value, kind, symbol.range.start);
        self.push(symbol)
    }

    /// The `(end)` sentinel. Created once, returned for every later request.
    fn end_token(&mut self) -> SymbolId {
        if let Some(end) = self.end {
            return end;
        }
        let range = Range::empty(self.lexer.position());
        let symbol = self.table.prototype(END).instantiate(END, SymbolKind::End, range);
        let end = self.push(symbol);
        self.end = Some(end);
        end
    }

    // ===== Helper methods =====

    pub(crate) fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(symbol);
        id
    }

    pub(crate) fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub(crate) fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    pub(crate) fn current(&self) -> &Symbol {
        self.symbol(self.token)
    }

    /// Whether the current token was cloned from the prototype `id`.
    pub(crate) fn check(&self, id: &str) -> bool {
        self.current().id == id
    }

    /// Consume the current token, reporting it first unless it is `id`.
    pub(crate) fn expect(&mut self, id: &str) -> SymbolId {
        if !self.check(id) {
            self.report_expected(id);
        }
        self.advance()
    }

    pub(crate) fn report_expected(&mut self, id: &str) {
        let actual = self.current();
        let message = format!("Expected: \"{id}\" Actual: \"{}\"", actual.value);
        let range = actual.range;
        self.diagnostics.error(range, message);
    }

    pub(crate) fn error(&mut self, at: SymbolId, message: impl Into<String>) {
        let range = self.symbol(at).range;
        self.diagnostics.error(range, message);
    }

    pub(crate) fn warn(&mut self, at: SymbolId, message: impl Into<String>) {
        let range = self.symbol(at).range;
        self.diagnostics.warn(range, message);
    }
}

/// Parse C struct declarations.
///
/// Only a broken lexer configuration is an `Err`; everything wrong with the
/// input itself is reported through [`ParseResult::diagnostics`].
pub fn parse(source: &str) -> Result<ParseResult, LexError> {
    Ok(Parser::new(source)?.parse())
}
