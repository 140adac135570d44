//! The value tree produced by deserialization.

use indexmap::IndexMap;
use nifparse_core::Symbol;

/// Index of a top-level block in a [`NifFile`](crate::NifFile).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Block reference as stored in the file, plus its resolution.
///
/// `resolved` is filled in by the linking pass; it stays `None` for a
/// `target_index` of -1.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub declared_type: Symbol,
    pub target_index: i32,
    pub resolved: Option<BlockId>,
}

impl Link {
    pub fn new(declared_type: Symbol, target_index: i32) -> Self {
        Self {
            declared_type,
            target_index,
            resolved: None,
        }
    }
}

/// Fields of a compound value.
///
/// `type_chain` lists the requested type first, followed by the types it
/// inherits in execution order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dictionary {
    pub fields: IndexMap<Symbol, Value>,
    pub type_chain: Vec<Symbol>,
    pub is_ni_object: bool,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, name: Symbol) -> Option<&Value> {
        self.fields.get(&name)
    }

    #[inline]
    pub fn get_mut(&mut self, name: Symbol) -> Option<&mut Value> {
        self.fields.get_mut(&name)
    }

    /// Store `value` under `name` unless the name is already present.
    pub fn insert(&mut self, name: Symbol, value: Value) {
        self.fields.entry(name).or_insert(value);
    }

    /// Most-derived type, `NULL` for a dictionary never deserialized.
    pub fn type_name(&self) -> Symbol {
        self.type_chain.first().copied().unwrap_or(Symbol::NULL)
    }

    /// The most-derived type is exactly `ty`.
    pub fn is_a(&self, ty: Symbol) -> bool {
        self.type_chain.first() == Some(&ty)
    }

    /// `ty` is the most-derived type or one of its ancestors.
    pub fn kind_of(&self, ty: Symbol) -> bool {
        self.type_chain.contains(&ty)
    }
}

/// Self-describing value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    /// Every integral read (bool, byte, char, short, int, flags, string index).
    UInt(u32),
    Float(f32),
    Dictionary(Dictionary),
    Array(Vec<Value>),
    ByteArray(Vec<u8>),
    /// Raw text bytes, no particular encoding.
    String(Vec<u8>),
    Enum {
        raw_value: u32,
        /// `NULL` when no option matched.
        symbolic_value: Symbol,
    },
    Bitflags {
        raw_value: u32,
        symbolic_values: Vec<Symbol>,
    },
    /// Owning reference to another block.
    Reference(Link),
    /// Non-owning back-reference to another block.
    Pointer(Link),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Dictionary(_) => "dictionary",
            Value::Array(_) => "array",
            Value::ByteArray(_) => "byte array",
            Value::String(_) => "string",
            Value::Enum { .. } => "enum",
            Value::Bitflags { .. } => "bitflags",
            Value::Reference(_) => "reference",
            Value::Pointer(_) => "pointer",
        }
    }

    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integral view used by the expression stack: enums and bitflags
    /// contribute their raw value.
    pub fn coerce_scalar(&self) -> Option<u32> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::Enum { raw_value, .. } | Value::Bitflags { raw_value, .. } => Some(*raw_value),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(bytes) | Value::ByteArray(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Value::Reference(link) | Value::Pointer(link) => Some(link),
            _ => None,
        }
    }
}
