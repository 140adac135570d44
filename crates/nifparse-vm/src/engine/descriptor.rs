//! Type descriptors accumulated by a compound program before each `FIELD`.

use std::sync::LazyLock;

use half::f16;
use nifparse_bytecode::{Instruction, Opcode, PrimitiveKind};
use nifparse_core::Symbol;
use regex::Regex;

use crate::stream::DataStream;

use super::error::ParseError;
use super::interpreter::{Frame, Interpreter, Slot, kind_mismatch};
use super::trace::Tracer;
use super::value::{Dictionary, Link, Value};

/// Version from which bools take a single byte.
const ONE_BYTE_BOOL_AFTER: u32 = 0x0400_0002;

/// Version from which written header strings say "Gamebryo".
const GAMEBRYO_SINCE: u32 = 0x0A01_0000;

static HEADER_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:NetImmerse|Gamebryo) File Format, Version ([0-9]+)\.([0-9]+)\.([0-9]+)\.([0-9]+)$")
        .expect("valid regex")
});

/// What a descriptor reads: nothing yet, a primitive, or a schema type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TypeKind {
    #[default]
    Null,
    Primitive(PrimitiveKind),
    Named(Symbol),
}

/// Type, array dimensions, argument and specialization of the next field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    /// Outermost dimension first.
    pub dims: Vec<u32>,
    pub arg: u32,
    pub specialization: Option<Box<TypeDescriptor>>,
}

impl TypeDescriptor {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Apply a type instruction. Returns `false` if `instr` does not name a type.
    pub(crate) fn set_kind(&mut self, instr: Instruction, frame: Frame<'_>) -> Result<bool, ParseError> {
        match instr {
            Instruction::NamedType(sym) => self.kind = TypeKind::Named(sym),
            Instruction::Simple(Opcode::TemplateArgument) => {
                let template = frame.template.ok_or_else(|| {
                    ParseError::InvalidSpecialization(
                        "template argument used outside a specialized type".to_string(),
                    )
                })?;
                self.kind = template.kind;
                if self.specialization.is_none() {
                    self.specialization = template.specialization.clone();
                }
            }
            other => match other.primitive_kind() {
                Some(kind) => self.kind = TypeKind::Primitive(kind),
                None => return Ok(false),
            },
        }
        Ok(true)
    }

    /// Clear everything for the next field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn read_value<S: DataStream, T: Tracer>(
        &self,
        interp: &mut Interpreter<'_, S>,
        header: &Dictionary,
        tracer: &mut T,
    ) -> Result<Value, ParseError> {
        self.read_dims(interp, &self.dims, header, tracer)
    }

    pub(crate) fn write_value<S: DataStream, T: Tracer>(
        &self,
        interp: &mut Interpreter<'_, S>,
        value: &Value,
        header: &Dictionary,
        tracer: &mut T,
    ) -> Result<(), ParseError> {
        self.write_dims(interp, &self.dims, value, header, tracer)
    }

    fn read_dims<S: DataStream, T: Tracer>(
        &self,
        interp: &mut Interpreter<'_, S>,
        dims: &[u32],
        header: &Dictionary,
        tracer: &mut T,
    ) -> Result<Value, ParseError> {
        let Some((&len, rest)) = dims.split_first() else {
            return self.read_single(interp, header, tracer);
        };
        interp.check_array_len(len)?;

        if rest.is_empty() {
            match self.kind {
                TypeKind::Primitive(PrimitiveKind::Byte) => {
                    return Ok(Value::ByteArray(interp.stream.read_vec(len as usize)?));
                }
                TypeKind::Primitive(PrimitiveKind::Char) => {
                    return Ok(Value::String(interp.stream.read_vec(len as usize)?));
                }
                _ => {}
            }
        }

        // Lengths come from the file; grow as elements actually arrive.
        let mut items = Vec::with_capacity(len.min(4096) as usize);
        for _ in 0..len {
            items.push(self.read_dims(interp, rest, header, tracer)?);
        }
        Ok(Value::Array(items))
    }

    fn write_dims<S: DataStream, T: Tracer>(
        &self,
        interp: &mut Interpreter<'_, S>,
        dims: &[u32],
        value: &Value,
        header: &Dictionary,
        tracer: &mut T,
    ) -> Result<(), ParseError> {
        let Some((&len, rest)) = dims.split_first() else {
            return self.write_single(interp, value, header, tracer);
        };

        if rest.is_empty()
            && matches!(
                self.kind,
                TypeKind::Primitive(PrimitiveKind::Byte | PrimitiveKind::Char)
            )
        {
            let bytes = match value {
                Value::ByteArray(bytes) | Value::String(bytes) => bytes,
                other => return Err(kind_mismatch("byte array", other)),
            };
            check_len(len, bytes.len())?;
            return interp.stream.write_bytes(bytes);
        }

        let items = value
            .as_array()
            .ok_or_else(|| kind_mismatch("array", value))?;
        check_len(len, items.len())?;
        for item in items {
            self.write_dims(interp, rest, item, header, tracer)?;
        }
        Ok(())
    }

    fn read_single<S: DataStream, T: Tracer>(
        &self,
        interp: &mut Interpreter<'_, S>,
        header: &Dictionary,
        tracer: &mut T,
    ) -> Result<Value, ParseError> {
        let kind = match self.kind {
            TypeKind::Null => return Err(ParseError::UnsupportedType("NULL".to_string())),
            TypeKind::Named(sym) => {
                let mut value = Value::Null;
                let frame = Frame {
                    arg: self.arg,
                    template: self.specialization.as_deref(),
                };
                interp.execute(sym, Slot::Read(&mut value), frame, Some(header), tracer)?;
                return Ok(value);
            }
            TypeKind::Primitive(kind) => kind,
        };

        let value = match kind {
            PrimitiveKind::Bool => {
                if bool_is_byte(interp, header)? {
                    Value::UInt(u32::from(interp.stream.read_u8()?))
                } else {
                    Value::UInt(interp.stream.read_u32()?)
                }
            }
            PrimitiveKind::Ref => {
                let declared_type = self.link_target()?;
                Value::Reference(Link::new(declared_type, interp.stream.read_u32()? as i32))
            }
            PrimitiveKind::Ptr => {
                let declared_type = self.link_target()?;
                Value::Pointer(Link::new(declared_type, interp.stream.read_u32()? as i32))
            }
            PrimitiveKind::Byte | PrimitiveKind::Char => Value::UInt(u32::from(interp.stream.read_u8()?)),
            PrimitiveKind::UInt
            | PrimitiveKind::ULittle32
            | PrimitiveKind::Int
            | PrimitiveKind::StringOffset
            | PrimitiveKind::StringIndex => Value::UInt(interp.stream.read_u32()?),
            PrimitiveKind::Short => Value::UInt(interp.stream.read_u16()? as i16 as i32 as u32),
            PrimitiveKind::UShort | PrimitiveKind::Flags => {
                Value::UInt(u32::from(interp.stream.read_u16()?))
            }
            PrimitiveKind::Float => Value::Float(interp.stream.read_f32()?),
            PrimitiveKind::HFloat => Value::Float(f16::from_bits(interp.stream.read_u16()?).to_f32()),
            PrimitiveKind::HeaderString => Value::UInt(parse_header_string(&interp.stream.read_line()?)?),
            PrimitiveKind::LineString => Value::String(interp.stream.read_line()?),
        };
        Ok(value)
    }

    fn write_single<S: DataStream, T: Tracer>(
        &self,
        interp: &mut Interpreter<'_, S>,
        value: &Value,
        header: &Dictionary,
        tracer: &mut T,
    ) -> Result<(), ParseError> {
        let kind = match self.kind {
            TypeKind::Null => return Err(ParseError::UnsupportedType("NULL".to_string())),
            TypeKind::Named(sym) => {
                let frame = Frame {
                    arg: self.arg,
                    template: self.specialization.as_deref(),
                };
                return interp.execute(sym, Slot::Write(value), frame, Some(header), tracer);
            }
            TypeKind::Primitive(kind) => kind,
        };

        match kind {
            PrimitiveKind::Float | PrimitiveKind::HFloat => {
                let v = value
                    .as_float()
                    .ok_or_else(|| kind_mismatch("float", value))?;
                if kind == PrimitiveKind::Float {
                    interp.stream.write_f32(v)
                } else {
                    interp.stream.write_u16(f16::from_f32(v).to_bits())
                }
            }
            PrimitiveKind::LineString => {
                let bytes = match value {
                    Value::String(bytes) => bytes,
                    other => return Err(kind_mismatch("string", other)),
                };
                interp.stream.write_bytes(bytes)?;
                interp.stream.write_u8(b'\n')
            }
            PrimitiveKind::Ref | PrimitiveKind::Ptr => {
                let link = match (kind, value) {
                    (PrimitiveKind::Ref, Value::Reference(link))
                    | (PrimitiveKind::Ptr, Value::Pointer(link)) => link,
                    (PrimitiveKind::Ref, other) => return Err(kind_mismatch("reference", other)),
                    (_, other) => return Err(kind_mismatch("pointer", other)),
                };
                self.link_target()?;
                interp.stream.write_u32(link.target_index as u32)
            }
            _ => {
                let v = value
                    .as_uint()
                    .ok_or_else(|| kind_mismatch("uint", value))?;
                match kind {
                    PrimitiveKind::Bool => {
                        if bool_is_byte(interp, header)? {
                            interp.stream.write_u8(v as u8)
                        } else {
                            interp.stream.write_u32(v)
                        }
                    }
                    PrimitiveKind::Byte | PrimitiveKind::Char => interp.stream.write_u8(v as u8),
                    PrimitiveKind::Short | PrimitiveKind::UShort | PrimitiveKind::Flags => {
                        interp.stream.write_u16(v as u16)
                    }
                    PrimitiveKind::HeaderString => {
                        let line = format_header_string(v);
                        interp.stream.write_bytes(line.as_bytes())
                    }
                    _ => interp.stream.write_u32(v),
                }
            }
        }
    }

    /// Block type a `REF`/`PTR` points at, from its specialization.
    fn link_target(&self) -> Result<Symbol, ParseError> {
        match self.specialization.as_deref().map(|s| s.kind) {
            Some(TypeKind::Named(sym)) => Ok(sym),
            Some(TypeKind::Primitive(kind)) => Err(ParseError::InvalidSpecialization(format!(
                "links must target a named type, not {}",
                kind.name()
            ))),
            _ => Err(ParseError::InvalidSpecialization(
                "link without a target type".to_string(),
            )),
        }
    }
}

/// Bools are one byte after 4.0.0.2 unless constant lengths are forced.
fn bool_is_byte<S: DataStream>(
    interp: &Interpreter<'_, S>,
    header: &Dictionary,
) -> Result<bool, ParseError> {
    if interp.options.constant_lengths {
        return Ok(false);
    }
    Ok(interp.header_version(header)? > ONE_BYTE_BOOL_AFTER)
}

fn check_len(expected: u32, found: usize) -> Result<(), ParseError> {
    if found != expected as usize {
        return Err(ParseError::ArrayLengthMismatch { expected, found });
    }
    Ok(())
}

/// Parse `"<NetImmerse|Gamebryo> File Format, Version A.B.C.D"` into `0xAABBCCDD`.
pub fn parse_header_string(line: &[u8]) -> Result<u32, ParseError> {
    let text = String::from_utf8_lossy(line);
    let malformed = || ParseError::MalformedHeaderString(text.to_string());
    let caps = HEADER_STRING.captures(&text).ok_or_else(malformed)?;

    let mut version = 0u32;
    for group in 1..=4 {
        let part: u32 = caps[group].parse().map_err(|_| malformed())?;
        version = (version << 8) | (part & 0xFF);
    }
    Ok(version)
}

/// Header line for `version`, newline included.
pub fn format_header_string(version: u32) -> String {
    let prefix = if version >= GAMEBRYO_SINCE {
        "Gamebryo"
    } else {
        "NetImmerse"
    };
    format!(
        "{prefix} File Format, Version {}.{}.{}.{}\n",
        version >> 24,
        (version >> 16) & 0xFF,
        (version >> 8) & 0xFF,
        version & 0xFF
    )
}
