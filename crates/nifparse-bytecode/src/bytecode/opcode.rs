//! Schema opcode set.
//!
//! Every opcode is a single byte. Opcodes 1..=19 name primitive storage
//! types, 20..=31 describe compound structure, 32..=54 form the expression
//! language, and the rest delimit programs and control flow.

macro_rules! opcodes {
    ($($variant:ident = $value:literal => $mnemonic:literal,)*) => {
        /// Schema instruction opcodes.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        #[repr(u8)]
        pub enum Opcode {
            $($variant = $value,)*
        }

        impl Opcode {
            /// Decode an opcode byte, `None` for unassigned values.
            pub fn from_u8(v: u8) -> Option<Self> {
                match v {
                    $($value => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Upper-case mnemonic used by the disassembler and error messages.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Self::$variant => $mnemonic,)*
                }
            }
        }
    };
}

opcodes! {
    Bool = 1 => "BOOL",
    Byte = 2 => "BYTE",
    UInt = 3 => "UINT",
    ULittle32 = 4 => "ULITTLE32",
    UShort = 5 => "USHORT",
    Int = 6 => "INT",
    Short = 7 => "SHORT",
    BlockTypeIndex = 8 => "BLOCKTYPEINDEX",
    Char = 9 => "CHAR",
    FileVersion = 10 => "FILEVERSION",
    Flags = 11 => "FLAGS",
    Float = 12 => "FLOAT",
    HFloat = 13 => "HFLOAT",
    HeaderString = 14 => "HEADER_STRING",
    LineString = 15 => "LINE_STRING",
    Ptr = 16 => "PTR",
    Ref = 17 => "REF",
    StringOffset = 18 => "STRINGOFFSET",
    StringIndex = 19 => "STRINGINDEX",
    IsNiObject = 20 => "IS_NIOBJECT",
    Inherit = 21 => "INHERIT",
    IsTemplate = 22 => "IS_TEMPLATE",
    NamedType = 23 => "NAMED_TYPE",
    Specialize = 24 => "SPECIALIZE",
    Field = 25 => "FIELD",
    TemplateArgument = 26 => "TEMPLATE_ARGUMENT",
    StaticArray = 27 => "STATIC_ARRAY",
    DynamicArray = 28 => "DYNAMIC_ARRAY",
    FieldIndirection = 29 => "FIELD_INDIRECTION",
    FieldValue = 30 => "FIELD_VALUE",
    Literal = 31 => "LITERAL",
    Not = 32 => "NOT",
    Mul = 33 => "MUL",
    Div = 34 => "DIV",
    Mod = 35 => "MOD",
    Add = 36 => "ADD",
    Sub = 37 => "SUB",
    LShift = 38 => "LSHIFT",
    RShift = 39 => "RSHIFT",
    LessThan = 40 => "LESSTHAN",
    LessOrEqual = 41 => "LESSOREQUAL",
    GreaterThan = 42 => "GREATERTHAN",
    GreaterOrEqual = 43 => "GREATEROREQUAL",
    Equal = 44 => "EQUAL",
    NotEqual = 45 => "NOTEQUAL",
    BitAnd = 46 => "BITAND",
    Xor = 47 => "XOR",
    BitOr = 48 => "BITOR",
    LogAnd = 49 => "LOGAND",
    LogOr = 50 => "LOGOR",
    HeaderField = 51 => "HEADER_FIELD",
    Condition = 52 => "CONDITION",
    Arg = 53 => "ARG",
    SetArg = 54 => "SETARG",
    Begin = 55 => "BEGIN",
    Bitflags = 56 => "BITFLAGS",
    Enum = 57 => "ENUM",
    Compound = 58 => "COMPOUND",
    Option = 59 => "OPTION",
    Dup = 60 => "DUP",
    BranchUnless = 61 => "BRANCHUNLESS",
    BranchIf = 62 => "BRANCHIF",
    Branch = 63 => "BRANCH",
    FieldDefault = 64 => "FIELD_DEFAULT",
    End = 255 => "END",
}

/// Storage kind of a primitive type opcode.
///
/// `FILEVERSION` stores as [`PrimitiveKind::ULittle32`] and `BLOCKTYPEINDEX`
/// as [`PrimitiveKind::UShort`]; every other type opcode maps one to one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PrimitiveKind {
    Bool,
    Byte,
    UInt,
    ULittle32,
    UShort,
    Int,
    Short,
    Char,
    Flags,
    Float,
    HFloat,
    HeaderString,
    LineString,
    Ptr,
    Ref,
    StringOffset,
    StringIndex,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::UInt => "uint",
            Self::ULittle32 => "ulittle32",
            Self::UShort => "ushort",
            Self::Int => "int",
            Self::Short => "short",
            Self::Char => "char",
            Self::Flags => "flags",
            Self::Float => "float",
            Self::HFloat => "hfloat",
            Self::HeaderString => "header-string",
            Self::LineString => "line-string",
            Self::Ptr => "ptr",
            Self::Ref => "ref",
            Self::StringOffset => "string-offset",
            Self::StringIndex => "string-index",
        }
    }
}

impl Opcode {
    /// Primitive storage kind for type opcodes.
    pub fn primitive_kind(self) -> Option<PrimitiveKind> {
        let kind = match self {
            Self::Bool => PrimitiveKind::Bool,
            Self::Byte => PrimitiveKind::Byte,
            Self::UInt => PrimitiveKind::UInt,
            Self::ULittle32 | Self::FileVersion => PrimitiveKind::ULittle32,
            Self::UShort | Self::BlockTypeIndex => PrimitiveKind::UShort,
            Self::Int => PrimitiveKind::Int,
            Self::Short => PrimitiveKind::Short,
            Self::Char => PrimitiveKind::Char,
            Self::Flags => PrimitiveKind::Flags,
            Self::Float => PrimitiveKind::Float,
            Self::HFloat => PrimitiveKind::HFloat,
            Self::HeaderString => PrimitiveKind::HeaderString,
            Self::LineString => PrimitiveKind::LineString,
            Self::Ptr => PrimitiveKind::Ptr,
            Self::Ref => PrimitiveKind::Ref,
            Self::StringOffset => PrimitiveKind::StringOffset,
            Self::StringIndex => PrimitiveKind::StringIndex,
            _ => return None,
        };
        Some(kind)
    }

    /// Binary operators of the expression language (pop right, pop left, push).
    pub fn is_binary(self) -> bool {
        (Self::Mul as u8..=Self::LogOr as u8).contains(&(self as u8))
    }
}
