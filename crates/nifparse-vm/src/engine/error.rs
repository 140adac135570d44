//! Errors that can occur while reading or writing NIF data.

use std::io;

use nifparse_bytecode::SchemaError;

/// Parse, serialize and link failures. All are fatal to the current operation.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("program for {expected} begins with type id {found}")]
    TypeIdMismatch { expected: String, found: String },

    #[error("unexpected opcode {opcode} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("stack underflow")]
    StackUnderflow,

    #[error("required field is not in dictionary: {0}")]
    MissingRequiredField(String),

    #[error("invalid specialization: {0}")]
    InvalidSpecialization(String),

    #[error("{ty} inherits {base}, which is not a compound type")]
    InvalidInheritance { ty: String, base: String },

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("malformed header string {0:?}, not a NIF file?")]
    MalformedHeaderString(String),

    #[error("expected {expected} value, found {found}")]
    ValueKindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("array has {found} elements, dimension requires {expected}")]
    ArrayLengthMismatch { expected: u32, found: usize },

    #[error("array dimension {len} exceeds limit {max}")]
    ArrayTooLarge { len: u32, max: u32 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("recursion limit of {0} nested types exceeded")]
    RecursionLimitExceeded(u32),

    #[error("block {index} ({type_name}): expected {expected} bytes, consumed {actual}")]
    BlockLengthMismatch {
        index: usize,
        type_name: String,
        expected: u32,
        actual: u64,
    },

    #[error("block {index}: type index {type_index} out of range ({count} block types)")]
    BlockTypeIndexOutOfRange {
        index: usize,
        type_index: u32,
        count: usize,
    },

    #[error("reference to block {index}, but only {block_count} blocks exist")]
    DanglingReference { index: i32, block_count: usize },

    #[error("unexpected end of stream at offset {position}")]
    UnexpectedEof { position: u64 },

    #[error("stream is not writable")]
    StreamNotWritable,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
