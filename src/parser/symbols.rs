//! Prototype registry
//!
//! A [`SymbolTable`] maps a spelling (`"struct"`, `"{"`, or a category
//! placeholder such as `"(name)"`) to a prototype [`Symbol`]. The parser clones
//! the matching prototype for every token it reads, so per-occurrence data
//! never leaks back into the table.
//!
//! Parsing behavior is not stored as code on the symbol. Each prototype
//! carries small tags ([`Nud`], [`Led`], [`Std`]) and the parser dispatches on
//! them, see `expressions.rs` and `declarations.rs`.

use super::ast::Symbol;
use rustc_hash::FxHashMap;

pub const END: &str = "(end)";
pub const NAME: &str = "(name)";
pub const LITERAL: &str = "(literal)";
pub const TYPE: &str = "(type)";

/// Binding power a prefix operator parses its operand with.
pub const PREFIX_BINDING_POWER: u32 = 70;

/// Primitive type keywords accepted in member declarations.
pub const TYPE_KEYWORDS: [&str; 14] = [
    "char",
    "signed char",
    "unsigned char",
    "bool",
    "short",
    "unsigned short",
    "int",
    "unsigned int",
    "long",
    "unsigned long",
    "long long",
    "unsigned long long",
    "float",
    "double",
];

/// Null denotation: behavior when the symbol starts an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nud {
    /// Literals and names evaluate to themselves.
    Itself,
    /// Prefix operator taking one operand.
    Prefix,
}

/// Left denotation: behavior when the symbol follows a parsed operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Led {
    /// Left-associative infix operator.
    Infix,
    /// Right-associative infix operator.
    InfixRight,
}

/// Statement denotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Std {
    Struct,
    Member,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Handlers {
    pub nud: Option<Nud>,
    pub led: Option<Led>,
    pub std: Option<Std>,
}

impl Handlers {
    /// Handlers of a resolved name: it only ever evaluates to itself.
    pub fn itself() -> Self {
        Self {
            nud: Some(Nud::Itself),
            led: None,
            std: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    prototypes: FxHashMap<String, Symbol>,
}

impl SymbolTable {
    /// A table holding only the category placeholders and `(end)`.
    pub fn new() -> Self {
        let mut table = Self::default();
        table.symbol(END, 0);
        table.symbol(LITERAL, 0).handlers.nud = Some(Nud::Itself);
        table.symbol(TYPE, 0).handlers.nud = Some(Nud::Itself);
        table.symbol(NAME, 0).handlers.nud = Some(Nud::Itself);
        table
    }

    /// The grammar for C struct declarations.
    pub fn c_structs() -> Self {
        let mut table = Self::new();

        for id in [",", ";", "{", "}", "[", "]"] {
            table.symbol(id, 0);
        }
        for keyword in TYPE_KEYWORDS {
            table.statement(keyword, Std::Member);
        }
        table.statement("struct", Std::Struct);

        table
    }

    pub fn get(&self, id: &str) -> Option<&Symbol> {
        self.prototypes.get(id)
    }

    /// Prototype for `id`, or a bare one when the table has none.
    pub fn prototype(&self, id: &str) -> Symbol {
        self.get(id)
            .cloned()
            .unwrap_or_else(|| Symbol::prototype(id, 0))
    }

    /// Define a symbol. Redefining keeps the existing handlers and raises the
    /// binding power if the new one is larger.
    pub fn symbol(&mut self, id: &str, binding_power: u32) -> &mut Symbol {
        let symbol = self
            .prototypes
            .entry(id.to_string())
            .or_insert_with(|| Symbol::prototype(id, binding_power));
        symbol.binding_power = symbol.binding_power.max(binding_power);
        symbol
    }

    pub fn infix(&mut self, id: &str, binding_power: u32) -> &mut Symbol {
        let symbol = self.symbol(id, binding_power);
        symbol.handlers.led = Some(Led::Infix);
        symbol
    }

    pub fn infix_right(&mut self, id: &str, binding_power: u32) -> &mut Symbol {
        let symbol = self.symbol(id, binding_power);
        symbol.handlers.led = Some(Led::InfixRight);
        symbol
    }

    pub fn prefix(&mut self, id: &str) -> &mut Symbol {
        let symbol = self.symbol(id, 0);
        symbol.handlers.nud = Some(Nud::Prefix);
        symbol
    }

    pub fn statement(&mut self, id: &str, std: Std) -> &mut Symbol {
        let symbol = self.symbol(id, 0);
        symbol.handlers.std = Some(std);
        symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redefinition_keeps_larger_binding_power() {
        let mut table = SymbolTable::new();
        table.infix("+", 50);
        table.symbol("+", 10);
        assert_eq!(table.get("+").map(|s| s.binding_power), Some(50));

        table.symbol("+", 60);
        let plus = table.get("+").expect("`+` should be defined");
        assert_eq!(plus.binding_power, 60);
        assert_eq!(plus.handlers.led, Some(Led::Infix));
    }

    #[test]
    fn test_c_struct_grammar() {
        let table = SymbolTable::c_structs();

        assert_eq!(table.get("struct").and_then(|s| s.handlers.std), Some(Std::Struct));
        for keyword in TYPE_KEYWORDS {
            assert_eq!(table.get(keyword).and_then(|s| s.handlers.std), Some(Std::Member));
        }
        assert_eq!(table.get(NAME).and_then(|s| s.handlers.nud), Some(Nud::Itself));
        assert!(table.get(";").is_some_and(|s| s.handlers == Handlers::default()));
    }

    #[test]
    fn test_prototype_clones_are_independent() {
        let table = SymbolTable::c_structs();
        let mut occurrence = table.prototype("struct");
        occurrence.value = "changed".to_string();
        occurrence.handlers.std = None;

        let prototype = table.get("struct").expect("`struct` should be defined");
        assert_eq!(prototype.value, "struct");
        assert_eq!(prototype.handlers.std, Some(Std::Struct));
    }
}
