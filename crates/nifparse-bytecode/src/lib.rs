//! Bytecode schema format for nifparse.
//!
//! This crate contains:
//! - The opcode set and instruction decoding (Opcode, Instruction, BytecodeCursor)
//! - The schema loader (Schema: symbol table, type index, programs)
//! - A schema assembler for tests and tools (SchemaBuilder)
//! - The schema disassembler (dump)

pub mod bytecode;

// Re-export commonly used items at crate root
pub use bytecode::{
    BytecodeCursor, Instruction, Label, Opcode, PrimitiveKind, ProgramBuilder, Schema,
    SchemaBuilder, SchemaError, dump, dump_type, width_for_count, write_varint,
};
pub use nifparse_core::{Colors, Symbol};
