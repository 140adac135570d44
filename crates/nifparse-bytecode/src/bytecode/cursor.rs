//! Forward reader over schema bytecode.

use nifparse_core::Symbol;

use super::instruction::Instruction;
use super::opcode::Opcode;
use super::schema::SchemaError;

/// Sequential, bounds-checked reader over a schema blob.
///
/// Each interpreter invocation owns its own cursor; the blob itself is
/// borrowed from the [`Schema`](super::Schema).
#[derive(Clone, Debug)]
pub struct BytecodeCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BytecodeCursor<'a> {
    pub fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    /// Absolute offset of the next byte.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn read_byte(&mut self) -> Result<u8, SchemaError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(SchemaError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read a varint: 7-bit groups, most significant group first, high bit
    /// set on every byte except the last.
    pub fn read_varint(&mut self) -> Result<u32, SchemaError> {
        let mut value: u32 = 0;
        loop {
            let byte = self.read_byte()?;
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
    }

    pub fn read_symbol(&mut self) -> Result<Symbol, SchemaError> {
        self.read_varint().map(Symbol::from_raw)
    }

    /// Borrow the bytes up to the next NUL and step past the terminator.
    pub fn read_asciiz(&mut self) -> Result<&'a [u8], SchemaError> {
        let rest = self
            .bytes
            .get(self.pos..)
            .ok_or(SchemaError::Truncated { offset: self.pos })?;
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(SchemaError::Truncated {
                offset: self.bytes.len(),
            })?;
        let s = &rest[..len];
        self.pos += len + 1;
        Ok(s)
    }

    pub fn read_u16(&mut self) -> Result<u16, SchemaError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], SchemaError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(SchemaError::Truncated {
                offset: self.bytes.len(),
            })?;
        let span = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(span)
    }

    /// Seek relative to the current position.
    pub fn branch(&mut self, displacement: i32) -> Result<(), SchemaError> {
        let target = self.pos as i64 + i64::from(displacement);
        if target < 0 || target > self.bytes.len() as i64 {
            return Err(SchemaError::BranchOutOfRange {
                from: self.pos,
                displacement,
            });
        }
        self.pos = target as usize;
        Ok(())
    }

    pub fn read_opcode(&mut self) -> Result<Opcode, SchemaError> {
        let offset = self.pos;
        let byte = self.read_byte()?;
        Opcode::from_u8(byte).ok_or(SchemaError::UnknownOpcode { byte, offset })
    }

    /// Decode one instruction together with its operands.
    pub fn read_instruction(&mut self) -> Result<Instruction, SchemaError> {
        let opcode = self.read_opcode()?;
        let instr = match opcode {
            Opcode::NamedType => Instruction::NamedType(self.read_symbol()?),
            Opcode::Field => Instruction::Field(self.read_symbol()?),
            Opcode::StaticArray => Instruction::StaticArray(self.read_varint()?),
            Opcode::FieldIndirection => Instruction::FieldIndirection(self.read_symbol()?),
            Opcode::FieldValue => Instruction::FieldValue(self.read_symbol()?),
            Opcode::Literal => Instruction::Literal(self.read_varint()?),
            Opcode::HeaderField => Instruction::HeaderField(self.read_symbol()?),
            Opcode::Begin => Instruction::Begin(self.read_symbol()?),
            Opcode::Option => Instruction::Option {
                name: self.read_symbol()?,
                value: self.read_varint()?,
            },
            Opcode::BranchUnless | Opcode::BranchIf | Opcode::Branch => Instruction::Branch {
                opcode,
                displacement: self.read_u16()?,
            },
            _ => Instruction::Simple(opcode),
        };
        Ok(instr)
    }
}

/// Append `value` in the varint encoding read by [`BytecodeCursor::read_varint`].
pub fn write_varint(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut count = 0;
    let mut rest = value;
    loop {
        groups[count] = (rest & 0x7F) as u8;
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}
