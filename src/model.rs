//! Program model
//!
//! The resolved view of a [`ParseResult`] that code generators consume: one
//! [`Struct`] per struct definition, each with its documented [`Member`]s and
//! a computed binary layout.
//!
//! # Layout
//!
//! Sizes follow the selected [`DataModel`]. With [`Packing::Natural`] every
//! member is aligned to its element alignment and the struct size is rounded
//! up to the largest member alignment. [`Packing::Packed`] lays members out
//! back to back.

use crate::parser::ast::{Range, SymbolId};
use crate::parser::diagnostics::{Diagnostic, Severity};
use crate::parser::lexer::LexError;
use crate::parser::{parse, ParseResult};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{} parse error(s), first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    Parse(Vec<Diagnostic>),

    #[error("Unknown type `{type_name}` for member `{member}`")]
    UnknownType { member: String, type_name: String },

    #[error("Invalid array dimension `{dimension}` for member `{member}`")]
    InvalidDimension { member: String, dimension: String },

    #[error("Layout of `{name}` does not fit in the address space")]
    LayoutOverflow { name: String },
}

/// A spelling that names no known keyword.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} `{spelling}`")]
pub struct UnknownKeyword {
    pub kind: &'static str,
    pub spelling: String,
}

/// Integer width conventions of the target platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DataModel {
    /// 64-bit Unix: `long` is 8 bytes.
    #[default]
    Lp64,
    /// 64-bit Windows: `long` is 4 bytes.
    Llp64,
    /// 32-bit targets: `long` is 4 bytes and 8-byte types align to 4.
    Ilp32,
}

impl fmt::Display for DataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataModel::Lp64 => "lp64",
            DataModel::Llp64 => "llp64",
            DataModel::Ilp32 => "ilp32",
        };
        f.write_str(name)
    }
}

impl FromStr for DataModel {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lp64" => Ok(DataModel::Lp64),
            "llp64" => Ok(DataModel::Llp64),
            "ilp32" => Ok(DataModel::Ilp32),
            _ => Err(UnknownKeyword {
                kind: "data model",
                spelling: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Packing {
    #[default]
    Natural,
    Packed,
}

/// Layout configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelOptions {
    pub data_model: DataModel,
    pub packing: Packing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Char,
    SignedChar,
    UnsignedChar,
    Bool,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 14] = [
        PrimitiveType::Char,
        PrimitiveType::SignedChar,
        PrimitiveType::UnsignedChar,
        PrimitiveType::Bool,
        PrimitiveType::Short,
        PrimitiveType::UnsignedShort,
        PrimitiveType::Int,
        PrimitiveType::UnsignedInt,
        PrimitiveType::Long,
        PrimitiveType::UnsignedLong,
        PrimitiveType::LongLong,
        PrimitiveType::UnsignedLongLong,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    /// C spelling of the type.
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Char => "char",
            PrimitiveType::SignedChar => "signed char",
            PrimitiveType::UnsignedChar => "unsigned char",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Short => "short",
            PrimitiveType::UnsignedShort => "unsigned short",
            PrimitiveType::Int => "int",
            PrimitiveType::UnsignedInt => "unsigned int",
            PrimitiveType::Long => "long",
            PrimitiveType::UnsignedLong => "unsigned long",
            PrimitiveType::LongLong => "long long",
            PrimitiveType::UnsignedLongLong => "unsigned long long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Size in bytes.
    pub fn size(self, data_model: DataModel) -> usize {
        match self {
            PrimitiveType::Char
            | PrimitiveType::SignedChar
            | PrimitiveType::UnsignedChar
            | PrimitiveType::Bool => 1,
            PrimitiveType::Short | PrimitiveType::UnsignedShort => 2,
            PrimitiveType::Int | PrimitiveType::UnsignedInt | PrimitiveType::Float => 4,
            PrimitiveType::Long | PrimitiveType::UnsignedLong => match data_model {
                DataModel::Lp64 => 8,
                DataModel::Llp64 | DataModel::Ilp32 => 4,
            },
            PrimitiveType::LongLong | PrimitiveType::UnsignedLongLong | PrimitiveType::Double => 8,
        }
    }

    /// Natural alignment in bytes.
    pub fn alignment(self, data_model: DataModel) -> usize {
        let size = self.size(data_model);
        match data_model {
            DataModel::Ilp32 => size.min(4),
            DataModel::Lp64 | DataModel::Llp64 => size,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for PrimitiveType {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|primitive| primitive.keyword() == s)
            .ok_or_else(|| UnknownKeyword {
                kind: "primitive type",
                spelling: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub primitive_type: PrimitiveType,
    pub array_length: Option<usize>,
    /// Range of the member's identifier.
    pub range: Range,
    pub description: String,
    pub offset: usize,
    pub size: usize,
}

impl Member {
    /// Type with its array suffix, e.g. `char[32]`.
    pub fn type_name(&self) -> String {
        match self.array_length {
            Some(length) => format!("{}[{length}]", self.primitive_type),
            None => self.primitive_type.to_string(),
        }
    }

    /// Element count; 1 for scalars.
    pub fn length(&self) -> usize {
        self.array_length.unwrap_or(1)
    }

    fn from_symbol(result: &ParseResult, id: SymbolId, data_model: DataModel) -> Result<Self, ModelError> {
        let symbol = result.symbol(id);
        let type_name = result.type_name(id).unwrap_or_default();
        let primitive_type = type_name
            .parse::<PrimitiveType>()
            .map_err(|_| ModelError::UnknownType {
                member: symbol.value.clone(),
                type_name: type_name.to_string(),
            })?;

        let array_length = symbol
            .dimension()
            .map(|dimension| {
                let text = &result.symbol(dimension).value;
                text.parse::<usize>()
                    .ok()
                    .filter(|length| *length > 0)
                    .ok_or_else(|| ModelError::InvalidDimension {
                        member: symbol.value.clone(),
                        dimension: text.clone(),
                    })
            })
            .transpose()?;

        let size = primitive_type
            .size(data_model)
            .checked_mul(array_length.unwrap_or(1))
            .ok_or_else(|| ModelError::LayoutOverflow {
                name: symbol.value.clone(),
            })?;

        Ok(Self {
            name: symbol.value.clone(),
            primitive_type,
            array_length,
            range: symbol.range,
            description: result.comment_for(id).unwrap_or_default(),
            offset: 0,
            size,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Struct {
    pub name: String,
    /// Typedef alias, if the struct was declared with one.
    pub alias: Option<String>,
    pub description: String,
    pub range: Range,
    pub members: Vec<Member>,
    pub size: usize,
    pub alignment: usize,
}

impl Struct {
    fn from_symbol(result: &ParseResult, id: SymbolId, options: &ModelOptions) -> Result<Self, ModelError> {
        let symbol = result.symbol(id);
        let members = result
            .members(id)
            .into_iter()
            .map(|member| Member::from_symbol(result, member, options.data_model))
            .collect::<Result<Vec<_>, _>>()?;

        let mut structure = Self {
            name: symbol.value.clone(),
            alias: symbol.alias().map(|alias| result.symbol(alias).value.clone()),
            description: result.comment_for(id).unwrap_or_default(),
            range: symbol.range,
            members,
            size: 0,
            alignment: 1,
        };
        structure.lay_out(options)?;
        Ok(structure)
    }

    fn lay_out(&mut self, options: &ModelOptions) -> Result<(), ModelError> {
        let overflow = || ModelError::LayoutOverflow {
            name: self.name.clone(),
        };
        let mut offset = 0;
        let mut alignment = 1;

        for member in &mut self.members {
            let member_alignment = match options.packing {
                Packing::Natural => member.primitive_type.alignment(options.data_model),
                Packing::Packed => 1,
            };
            member.offset = align_up(offset, member_alignment).ok_or_else(overflow)?;
            offset = member.offset.checked_add(member.size).ok_or_else(overflow)?;
            alignment = alignment.max(member_alignment);
        }

        self.alignment = alignment;
        self.size = align_up(offset, alignment).ok_or_else(overflow)?;
        Ok(())
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.name == name)
    }
}

impl fmt::Display for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "struct {}", self.name)?;
        if let Some(alias) = &self.alias {
            write!(f, " (typedef {alias})")?;
        }
        writeln!(f, ": {} bytes, align {}", self.size, self.alignment)?;
        if !self.description.is_empty() {
            writeln!(f, "  // {}", self.description.replace('\n', " "))?;
        }
        for member in &self.members {
            write!(
                f,
                "  {:>4}  {:>4}  {:<22} {}",
                member.offset,
                member.size,
                member.type_name(),
                member.name
            )?;
            if !member.description.is_empty() {
                write!(f, "  // {}", member.description.replace('\n', " "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// All struct definitions of one source, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub structs: Vec<Struct>,
}

impl Program {
    /// Build the model from a finished parse. Forward declarations and
    /// typedef aliases contribute no struct of their own.
    pub fn from_parse_result(result: &ParseResult, options: &ModelOptions) -> Result<Self, ModelError> {
        let structs = result
            .structs()
            .map(|id| Struct::from_symbol(result, id, options))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { structs })
    }

    /// Parse `source` and build its model. Any error diagnostic fails the build.
    pub fn from_source(source: &str, options: &ModelOptions) -> Result<Self, ModelError> {
        let result = parse(source)?;
        let errors: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == Severity::Error)
            .cloned()
            .collect();
        if !errors.is_empty() {
            return Err(ModelError::Parse(errors));
        }
        Self::from_parse_result(&result, options)
    }

    pub fn get(&self, name: &str) -> Option<&Struct> {
        self.structs
            .iter()
            .find(|structure| structure.name == name || structure.alias.as_deref() == Some(name))
    }
}

/// `None` when rounding up overflows.
fn align_up(offset: usize, alignment: usize) -> Option<usize> {
    offset.div_ceil(alignment).checked_mul(alignment)
}
