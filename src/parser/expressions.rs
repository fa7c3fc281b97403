//! Expression parsing implementation
//!
//! Top-down operator precedence (Pratt) parsing. Every symbol carries a left
//! binding power and optional null/left denotation tags; this module turns
//! those tags into parse actions.
//!
//! # Precedence
//!
//! ```text
//! expression(rbp) ::= nud { led  while rbp < lbp(current) }
//! ```
//!
//! The C struct grammar only uses expressions for array dimensions (a single
//! integer literal), but the engine handles any operator table, see
//! [`SymbolTable::infix`](super::symbols::SymbolTable::infix).

use super::ast::{SymbolId, SymbolKind};
use super::parse::Parser;
use super::symbols::{Led, Nud, PREFIX_BINDING_POWER};

impl Parser<'_> {
    /// Parse an expression whose operators bind tighter than `right_binding_power`.
    pub(crate) fn parse_expression(&mut self, right_binding_power: u32) -> SymbolId {
        let token = self.token;
        self.advance();
        let mut left = self.null_denotation(token);

        while right_binding_power < self.current().binding_power {
            let token = self.token;
            self.advance();
            left = self.left_denotation(token, left);
        }

        left
    }

    fn null_denotation(&mut self, token: SymbolId) -> SymbolId {
        match self.symbol(token).handlers.nud {
            Some(Nud::Itself) => token,
            Some(Nud::Prefix) => {
                self.reserve(token);
                let operand = self.parse_expression(PREFIX_BINDING_POWER);
                let symbol = self.symbol_mut(token);
                symbol.first = Some(operand);
                symbol.kind = SymbolKind::Unary;
                token
            }
            None => {
                self.error(token, "Undefined");
                token
            }
        }
    }

    fn left_denotation(&mut self, token: SymbolId, left: SymbolId) -> SymbolId {
        let symbol = self.symbol(token);
        let binding_power = symbol.binding_power;

        let right = match symbol.handlers.led {
            Some(Led::Infix) => self.parse_expression(binding_power),
            Some(Led::InfixRight) => self.parse_expression(binding_power.saturating_sub(1)),
            None => {
                self.error(token, "Missing operator");
                return token;
            }
        };

        let symbol = self.symbol_mut(token);
        symbol.first = Some(left);
        symbol.second = Some(right);
        symbol.kind = SymbolKind::Binary;
        token
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::{SymbolId, SymbolKind};
    use crate::parser::lexer::{Lexeme, LexemeKind, Lexer};
    use crate::parser::parse::Parser;
    use crate::parser::symbols::SymbolTable;
    use test_log::test;

    /// Arithmetic grammar: `+` and `-` at 50, `*` at 60, `^` right-assoc at 70,
    /// prefix `-`.
    fn arithmetic(source: &str) -> Parser<'_> {
        let mut lexer = Lexer::new(source);
        lexer
            .add_rule(r"[0-9]+", |text, range| Some(Lexeme::new(LexemeKind::Number, text, range)))
            .unwrap();
        lexer
            .add_rule(r"[-+*^@]", |text, range| Some(Lexeme::new(LexemeKind::Operator, text, range)))
            .unwrap();
        lexer.add_rule(r"\s+", |_, _| None).unwrap();

        let mut table = SymbolTable::new();
        table.infix("+", 50);
        table.infix("-", 50);
        table.infix("*", 60);
        table.infix_right("^", 70);
        table.prefix("-");
        table.symbol("@", 10);

        Parser::with_grammar(lexer, table).unwrap()
    }

    /// Render a tree as a fully parenthesized string.
    fn render(parser: &Parser<'_>, id: SymbolId) -> String {
        let symbol = parser.symbol(id);
        match symbol.kind {
            SymbolKind::Binary => format!(
                "({} {} {})",
                render(parser, symbol.first.unwrap()),
                symbol.value,
                render(parser, symbol.second.unwrap())
            ),
            SymbolKind::Unary => format!("({}{})", symbol.value, render(parser, symbol.first.unwrap())),
            _ => symbol.value.clone(),
        }
    }

    fn parse(source: &str) -> String {
        let mut parser = arithmetic(source);
        let root = parser.parse_expression(0);
        assert!(parser.diagnostics.is_empty(), "{:?}", parser.diagnostics);
        render(&parser, root)
    }

    #[test]
    fn test_literal() {
        assert_eq!(parse("42"), "42");
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(parse("1 * 2 + 3"), "((1 * 2) + 3)");
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(parse("1 - 2 - 3"), "((1 - 2) - 3)");
    }

    #[test]
    fn test_right_associative() {
        assert_eq!(parse("2 ^ 3 ^ 4"), "(2 ^ (3 ^ 4))");
    }

    #[test]
    fn test_prefix() {
        assert_eq!(parse("- 1 + 2"), "((-1) + 2)");
        assert_eq!(parse("2 * - 3"), "(2 * (-3))");
    }

    #[test]
    fn test_missing_operator() {
        let mut parser = arithmetic("1 @ 2");
        let root = parser.parse_expression(0);

        let messages: Vec<_> = parser.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["Missing operator"]);
        assert_eq!(parser.symbol(root).value, "@");
    }

    #[test]
    fn test_undefined_prefix() {
        let mut parser = arithmetic("* 2");
        let root = parser.parse_expression(0);

        let messages: Vec<_> = parser.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["Undefined"]);
        assert_eq!(parser.symbol(root).value, "*");
    }
}
