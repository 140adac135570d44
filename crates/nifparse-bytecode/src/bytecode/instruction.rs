//! Decoded schema instructions.

use nifparse_core::Symbol;

use super::opcode::{Opcode, PrimitiveKind};

/// One opcode with its operands decoded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instruction {
    /// Opcode without operands.
    Simple(Opcode),
    NamedType(Symbol),
    Field(Symbol),
    StaticArray(u32),
    FieldIndirection(Symbol),
    FieldValue(Symbol),
    Literal(u32),
    HeaderField(Symbol),
    Begin(Symbol),
    Option {
        name: Symbol,
        value: u32,
    },
    /// `BRANCHUNLESS`, `BRANCHIF` or `BRANCH`. The displacement is measured
    /// from the first byte of the displacement field itself.
    Branch {
        opcode: Opcode,
        displacement: u16,
    },
}

impl Instruction {
    pub fn opcode(self) -> Opcode {
        match self {
            Self::Simple(op) => op,
            Self::NamedType(_) => Opcode::NamedType,
            Self::Field(_) => Opcode::Field,
            Self::StaticArray(_) => Opcode::StaticArray,
            Self::FieldIndirection(_) => Opcode::FieldIndirection,
            Self::FieldValue(_) => Opcode::FieldValue,
            Self::Literal(_) => Opcode::Literal,
            Self::HeaderField(_) => Opcode::HeaderField,
            Self::Begin(_) => Opcode::Begin,
            Self::Option { .. } => Opcode::Option,
            Self::Branch { opcode, .. } => opcode,
        }
    }

    /// Primitive kind if this is a primitive type opcode.
    pub fn primitive_kind(self) -> Option<PrimitiveKind> {
        match self {
            Self::Simple(op) => op.primitive_kind(),
            _ => None,
        }
    }

    /// Whether this instruction names a type (primitive, named or template argument).
    pub fn is_type(self) -> bool {
        matches!(
            self,
            Self::NamedType(_) | Self::Simple(Opcode::TemplateArgument)
        ) || self.primitive_kind().is_some()
    }
}
