//! Schema bytecode format.
//!
//! A schema blob holds a symbol table, an index from type symbols to program
//! offsets, and one program per type. Programs are read with a
//! [`BytecodeCursor`] and disassembled with [`dump`].

mod builder;
mod cursor;
mod dump;
mod instruction;
mod opcode;
mod schema;

#[cfg(test)]
mod cursor_tests;

pub use builder::{Label, ProgramBuilder, SchemaBuilder};
pub use cursor::{BytecodeCursor, write_varint};
pub use dump::{dump, dump_type, width_for_count};
pub use instruction::Instruction;
pub use opcode::{Opcode, PrimitiveKind};
pub use schema::{Schema, SchemaError};
