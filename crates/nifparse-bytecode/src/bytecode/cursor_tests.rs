use nifparse_core::Symbol;

use super::cursor::{BytecodeCursor, write_varint};
use super::instruction::Instruction;
use super::opcode::Opcode;
use super::schema::SchemaError;

fn encode(value: u32) -> Vec<u8> {
    let mut out = Vec::new();
    write_varint(&mut out, value);
    out
}

#[test]
fn varint_most_significant_group_first() {
    assert_eq!(encode(0), [0x00]);
    assert_eq!(encode(127), [0x7F]);
    assert_eq!(encode(128), [0x81, 0x00]);
    assert_eq!(encode(300), [0x82, 0x2C]);
    assert_eq!(encode(u32::MAX), [0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
}

#[test]
fn varint_decodes_own_encoding() {
    for value in [0, 1, 127, 128, 300, 16_384, 0x0A00_0100, u32::MAX] {
        let bytes = encode(value);
        let mut cursor = BytecodeCursor::new(&bytes, 0);
        assert_eq!(cursor.read_varint().unwrap(), value);
        assert!(cursor.is_at_end());
    }
}

#[test]
fn varint_truncated() {
    let bytes = [0x81, 0x80];
    let mut cursor = BytecodeCursor::new(&bytes, 0);
    let err = cursor.read_varint().unwrap_err();
    assert!(matches!(err, SchemaError::Truncated { offset: 2 }));
}

#[test]
fn read_asciiz_borrows_up_to_nul() {
    let bytes = b"Header\0Footer\0";
    let mut cursor = BytecodeCursor::new(bytes, 0);

    assert_eq!(cursor.read_asciiz().unwrap(), b"Header");
    assert_eq!(cursor.position(), 7);
    assert_eq!(cursor.read_asciiz().unwrap(), b"Footer");
    assert!(cursor.is_at_end());
}

#[test]
fn read_asciiz_without_terminator() {
    let bytes = b"abc";
    let mut cursor = BytecodeCursor::new(bytes, 0);
    assert!(matches!(
        cursor.read_asciiz(),
        Err(SchemaError::Truncated { offset: 3 })
    ));
}

#[test]
fn read_u16_little_endian() {
    let bytes = [0x34, 0x12, 0xFF];
    let mut cursor = BytecodeCursor::new(&bytes, 0);
    assert_eq!(cursor.read_u16().unwrap(), 0x1234);
    assert!(matches!(
        cursor.read_u16(),
        Err(SchemaError::Truncated { offset: 3 })
    ));
}

#[test]
fn read_bytes_span() {
    let bytes = [1, 2, 3, 4];
    let mut cursor = BytecodeCursor::new(&bytes, 1);
    assert_eq!(cursor.read_bytes(2).unwrap(), &[2, 3]);
    assert_eq!(cursor.position(), 3);
    assert!(cursor.read_bytes(2).is_err());
}

#[test]
fn branch_is_relative() {
    let bytes = [0u8; 8];
    let mut cursor = BytecodeCursor::new(&bytes, 4);

    cursor.branch(2).unwrap();
    assert_eq!(cursor.position(), 6);
    cursor.branch(-6).unwrap();
    assert_eq!(cursor.position(), 0);

    let err = cursor.branch(-1).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::BranchOutOfRange {
            from: 0,
            displacement: -1
        }
    ));
    assert!(cursor.branch(9).is_err());
}

#[test]
fn read_opcode_rejects_unassigned() {
    let bytes = [Opcode::Field as u8, 0];
    let mut cursor = BytecodeCursor::new(&bytes, 0);
    assert_eq!(cursor.read_opcode().unwrap(), Opcode::Field);
    assert!(matches!(
        cursor.read_opcode(),
        Err(SchemaError::UnknownOpcode { byte: 0, offset: 1 })
    ));
}

#[test]
fn read_instruction_operands() {
    let bytes = [
        Opcode::Option as u8,
        3,
        0x81,
        0x00,
        Opcode::BranchIf as u8,
        5,
        0,
        Opcode::Dup as u8,
        Opcode::Field as u8,
        7,
    ];
    let mut cursor = BytecodeCursor::new(&bytes, 0);

    assert_eq!(
        cursor.read_instruction().unwrap(),
        Instruction::Option {
            name: Symbol::from_raw(3),
            value: 128
        }
    );
    assert_eq!(
        cursor.read_instruction().unwrap(),
        Instruction::Branch {
            opcode: Opcode::BranchIf,
            displacement: 5
        }
    );
    assert_eq!(
        cursor.read_instruction().unwrap(),
        Instruction::Simple(Opcode::Dup)
    );
    let field = cursor.read_instruction().unwrap();
    assert_eq!(field, Instruction::Field(Symbol::from_raw(7)));
    assert_eq!(field.opcode(), Opcode::Field);
    assert!(cursor.is_at_end());
}

#[test]
fn instruction_type_classification() {
    assert!(Instruction::Simple(Opcode::Float).is_type());
    assert!(Instruction::Simple(Opcode::TemplateArgument).is_type());
    assert!(Instruction::NamedType(Symbol::from_raw(0)).is_type());
    assert!(!Instruction::Simple(Opcode::Dup).is_type());
    assert!(!Instruction::Field(Symbol::from_raw(0)).is_type());
}
