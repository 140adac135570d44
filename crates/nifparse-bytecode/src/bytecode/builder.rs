//! Low-level schema assembler.
//!
//! Emits blobs in the layout [`Schema::from_bytes`] loads, one opcode at a
//! time. No validation is performed: the builder writes exactly what it is
//! told, which is what tests of error paths need.

use nifparse_core::{Interner, Symbol};

use super::cursor::write_varint;
use super::opcode::Opcode;
use super::schema::{Schema, SchemaError};

/// Assembles a schema blob from type programs.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    interner: Interner,
    programs: Vec<(Symbol, Vec<u8>)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning its symbol.
    pub fn symbol(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// Start a program with an empty body.
    pub fn program(&mut self, name: &str) -> ProgramBuilder<'_> {
        let sym = self.symbol(name);
        let mut program = ProgramBuilder {
            schema: self,
            name: sym,
            code: Vec::new(),
        };
        program.op(Opcode::Begin).varint(sym.as_u32());
        program
    }

    /// Start a `COMPOUND` program.
    pub fn compound(&mut self, name: &str) -> ProgramBuilder<'_> {
        let mut program = self.program(name);
        program.op(Opcode::Compound);
        program
    }

    /// Start an `ENUM` program stored as `storage`.
    pub fn enumeration(&mut self, name: &str, storage: Opcode) -> ProgramBuilder<'_> {
        let mut program = self.program(name);
        program.op(Opcode::Enum).op(storage);
        program
    }

    /// Start a `BITFLAGS` program stored as `storage`.
    pub fn bitflags(&mut self, name: &str, storage: Opcode) -> ProgramBuilder<'_> {
        let mut program = self.program(name);
        program.op(Opcode::Bitflags).op(storage);
        program
    }

    /// Serialize to the blob layout.
    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();

        write_varint(&mut out, self.programs.len() as u32);
        let mut offset = 0u32;
        for (sym, code) in &self.programs {
            write_varint(&mut out, sym.as_u32());
            write_varint(&mut out, offset);
            offset += code.len() as u32;
        }

        let strings = self.interner.to_asciiz_blob();
        write_varint(&mut out, strings.len() as u32);
        write_varint(&mut out, self.interner.len() as u32);
        out.extend_from_slice(&strings);

        for (_, code) in &self.programs {
            out.extend_from_slice(code);
        }
        out
    }

    pub fn build_schema(self) -> Result<Schema, SchemaError> {
        Schema::from_bytes(self.build())
    }
}

/// Unbound branch displacement, patched by [`ProgramBuilder::bind`].
#[derive(Clone, Copy, Debug)]
#[must_use]
pub struct Label(usize);

/// Appends instructions to one type program.
pub struct ProgramBuilder<'b> {
    schema: &'b mut SchemaBuilder,
    name: Symbol,
    code: Vec<u8>,
}

impl ProgramBuilder<'_> {
    pub fn op(&mut self, op: Opcode) -> &mut Self {
        self.code.push(op as u8);
        self
    }

    pub fn byte(&mut self, byte: u8) -> &mut Self {
        self.code.push(byte);
        self
    }

    pub fn varint(&mut self, value: u32) -> &mut Self {
        write_varint(&mut self.code, value);
        self
    }

    fn op_symbol(&mut self, op: Opcode, name: &str) -> &mut Self {
        let sym = self.schema.symbol(name);
        self.op(op).varint(sym.as_u32())
    }

    /// `NAMED_TYPE name`.
    pub fn named(&mut self, name: &str) -> &mut Self {
        self.op_symbol(Opcode::NamedType, name)
    }

    /// `FIELD name`.
    pub fn field(&mut self, name: &str) -> &mut Self {
        self.op_symbol(Opcode::Field, name)
    }

    /// Type opcode followed by `FIELD name`.
    pub fn field_of(&mut self, ty: Opcode, name: &str) -> &mut Self {
        self.op(ty).field(name)
    }

    /// `NAMED_TYPE ty` followed by `FIELD name`.
    pub fn named_field(&mut self, ty: &str, name: &str) -> &mut Self {
        self.named(ty).field(name)
    }

    /// `INHERIT NAMED_TYPE base`.
    pub fn inherit(&mut self, base: &str) -> &mut Self {
        self.op(Opcode::Inherit).named(base)
    }

    /// `SPECIALIZE NAMED_TYPE target`.
    pub fn specialize(&mut self, target: &str) -> &mut Self {
        self.op(Opcode::Specialize).named(target)
    }

    pub fn literal(&mut self, value: u32) -> &mut Self {
        self.op(Opcode::Literal).varint(value)
    }

    pub fn static_array(&mut self, len: u32) -> &mut Self {
        self.op(Opcode::StaticArray).varint(len)
    }

    pub fn field_value(&mut self, name: &str) -> &mut Self {
        self.op_symbol(Opcode::FieldValue, name)
    }

    pub fn field_indirection(&mut self, name: &str) -> &mut Self {
        self.op_symbol(Opcode::FieldIndirection, name)
    }

    pub fn header_field(&mut self, name: &str) -> &mut Self {
        self.op_symbol(Opcode::HeaderField, name)
    }

    /// `OPTION name value` inside an enum or bitflags body.
    pub fn option(&mut self, name: &str, value: u32) -> &mut Self {
        let sym = self.schema.symbol(name);
        self.op(Opcode::Option).varint(sym.as_u32()).varint(value)
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.code.extend_from_slice(bytes);
        self
    }

    fn branch_op(&mut self, op: Opcode) -> Label {
        self.op(op);
        let label = Label(self.code.len());
        self.code.extend_from_slice(&[0, 0]);
        label
    }

    pub fn branch_unless(&mut self) -> Label {
        self.branch_op(Opcode::BranchUnless)
    }

    pub fn branch_if(&mut self) -> Label {
        self.branch_op(Opcode::BranchIf)
    }

    pub fn branch(&mut self) -> Label {
        self.branch_op(Opcode::Branch)
    }

    /// Point `label` at the next instruction to be emitted.
    pub fn bind(&mut self, label: Label) -> &mut Self {
        let displacement = (self.code.len() - label.0) as u16;
        self.code[label.0..label.0 + 2].copy_from_slice(&displacement.to_le_bytes());
        self
    }

    /// Append `END` and register the program.
    pub fn finish(mut self) -> Symbol {
        self.op(Opcode::End);
        let name = self.name;
        self.schema.programs.push((name, self.code));
        name
    }

    /// Register the program as written, without appending `END`.
    pub fn finish_raw(self) -> Symbol {
        let name = self.name;
        self.schema.programs.push((name, self.code));
        name
    }
}
