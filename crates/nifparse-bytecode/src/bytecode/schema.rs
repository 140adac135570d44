//! Loaded schema blob: symbol table, type index and type programs.
//!
//! Blob layout:
//!
//! ```text
//! varint type_count
//! (varint type_symbol, varint program_offset) * type_count
//! varint strings_len              ; bytes following the symbol count
//! varint symbol_count
//! asciiz * symbol_count           ; index = symbol
//! programs...                     ; program_offset is relative to here
//! ```

use std::collections::HashMap;
use std::io;
use std::path::Path;

use nifparse_core::{Interner, Symbol};

use super::cursor::BytecodeCursor;

/// Schema load and bytecode decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema truncated at offset {offset}")]
    Truncated { offset: usize },
    #[error("branch by {displacement} from offset {from} leaves the schema")]
    BranchOutOfRange { from: usize, displacement: i32 },
    #[error("symbol {index} is not valid UTF-8")]
    InvalidUtf8 { index: u32 },
    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),
    #[error("symbol does not represent a type: {0}")]
    NotATypeName(String),
    #[error("unknown opcode {byte} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// A loaded bytecode schema.
///
/// Shared read-only by every interpreter invocation.
#[derive(Debug)]
pub struct Schema {
    storage: Vec<u8>,
    interner: Interner,
    /// Program offset (relative to `programs_start`) per type symbol.
    type_offsets: HashMap<Symbol, u32>,
    /// Type symbols in preamble order.
    type_order: Vec<Symbol>,
    programs_start: usize,
}

impl Schema {
    /// Load a schema from owned bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SchemaError> {
        let mut cursor = BytecodeCursor::new(&bytes, 0);

        let type_count = cursor.read_varint()?;
        let mut type_offsets = HashMap::new();
        let mut type_order = Vec::new();
        for _ in 0..type_count {
            let sym = cursor.read_symbol()?;
            let offset = cursor.read_varint()?;
            if type_offsets.insert(sym, offset).is_none() {
                type_order.push(sym);
            }
        }

        let strings_len = cursor.read_varint()? as usize;
        let symbol_count = cursor.read_varint()?;
        let programs_start = cursor.position() + strings_len;
        if programs_start > bytes.len() {
            return Err(SchemaError::Truncated {
                offset: bytes.len(),
            });
        }

        let mut interner = Interner::new();
        for index in 0..symbol_count {
            let raw = cursor.read_asciiz()?;
            if cursor.position() > programs_start {
                return Err(SchemaError::Truncated {
                    offset: programs_start,
                });
            }
            let text = std::str::from_utf8(raw).map_err(|_| SchemaError::InvalidUtf8 { index })?;
            if interner.get(text).is_some() {
                return Err(SchemaError::DuplicateSymbol(text.to_string()));
            }
            interner.intern(text);
        }

        for &offset in type_offsets.values() {
            if programs_start + offset as usize >= bytes.len() {
                return Err(SchemaError::Truncated {
                    offset: programs_start + offset as usize,
                });
            }
        }

        Ok(Self {
            storage: bytes,
            interner,
            type_offsets,
            type_order,
            programs_start,
        })
    }

    /// Load a schema from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.storage
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Absolute offset at which type programs begin.
    pub fn programs_start(&self) -> usize {
        self.programs_start
    }

    /// Find the symbol for `name`.
    pub fn lookup(&self, name: &str) -> Result<Symbol, SchemaError> {
        self.try_lookup(name)
            .ok_or_else(|| SchemaError::SymbolNotFound(name.to_string()))
    }

    pub fn try_lookup(&self, name: &str) -> Option<Symbol> {
        self.interner.get(name)
    }

    /// Display name of a symbol: `<NIL>` for the null symbol, `<INVALID>`
    /// for an index outside the symbol table.
    pub fn name(&self, sym: Symbol) -> &str {
        if sym.is_null() {
            return "<NIL>";
        }
        self.interner.try_resolve(sym).unwrap_or("<INVALID>")
    }

    pub fn is_type_name(&self, sym: Symbol) -> bool {
        self.type_offsets.contains_key(&sym)
    }

    /// Absolute offset of the program for type `sym`.
    pub fn type_program_offset(&self, sym: Symbol) -> Result<usize, SchemaError> {
        self.type_offsets
            .get(&sym)
            .map(|&offset| self.programs_start + offset as usize)
            .ok_or_else(|| SchemaError::NotATypeName(self.name(sym).to_string()))
    }

    /// A fresh cursor positioned at the program for type `sym`.
    pub fn program(&self, sym: Symbol) -> Result<BytecodeCursor<'_>, SchemaError> {
        let offset = self.type_program_offset(sym)?;
        Ok(BytecodeCursor::new(&self.storage, offset))
    }

    /// Type symbols with their relative program offsets, in preamble order.
    pub fn types(&self) -> impl Iterator<Item = (Symbol, u32)> + '_ {
        self.type_order
            .iter()
            .map(|sym| (*sym, self.type_offsets[sym]))
    }

    pub fn type_count(&self) -> usize {
        self.type_order.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.interner.len()
    }
}
