//! Schema interpreter: executes type programs against a byte stream.

use nifparse_bytecode::{BytecodeCursor, Instruction, Opcode, Schema};
use nifparse_core::Symbol;

use crate::stream::DataStream;

use super::descriptor::TypeDescriptor;
use super::error::ParseError;
use super::stack::EvalStack;
use super::trace::{NoopTracer, Tracer};
use super::value::{Dictionary, Value};

/// Resource limits for one interpreter.
#[derive(Clone, Copy, Debug)]
pub struct ParseLimits {
    /// Maximum nesting of type programs (default: 256).
    pub(crate) recursion_limit: u32,
    /// Maximum length of a single array dimension (default: 16 Mi).
    pub(crate) max_array_len: u32,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            recursion_limit: 256,
            max_array_len: 16 * 1024 * 1024,
        }
    }
}

impl ParseLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recursion limit.
    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Set the maximum array dimension.
    pub fn max_array_len(mut self, len: u32) -> Self {
        self.max_array_len = len;
        self
    }

    pub fn get_recursion_limit(&self) -> u32 {
        self.recursion_limit
    }
    pub fn get_max_array_len(&self) -> u32 {
        self.max_array_len
    }
}

/// Options controlling how values are read and written.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
    pub(crate) limits: ParseLimits,
    /// Read every bool as 4 bytes regardless of file version.
    pub(crate) constant_lengths: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn constant_lengths(mut self, enabled: bool) -> Self {
        self.constant_lengths = enabled;
        self
    }

    pub fn get_limits(&self) -> ParseLimits {
        self.limits
    }
    pub fn get_constant_lengths(&self) -> bool {
        self.constant_lengths
    }
}

/// Template context of the program being executed.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Frame<'f> {
    /// Value pushed by `ARG`.
    pub arg: u32,
    /// Descriptor substituted for `TEMPLATE_ARGUMENT`.
    pub template: Option<&'f TypeDescriptor>,
}

/// Value being produced or consumed by a program.
pub(crate) enum Slot<'v> {
    Read(&'v mut Value),
    Write(&'v Value),
}

/// Dictionary a compound program runs against.
enum Target<'v> {
    Read(&'v mut Dictionary),
    Write(&'v Dictionary),
}

impl Target<'_> {
    fn dict(&self) -> &Dictionary {
        match self {
            Target::Read(d) => d,
            Target::Write(d) => d,
        }
    }

    fn reborrow(&mut self) -> Target<'_> {
        match self {
            Target::Read(d) => Target::Read(&mut **d),
            Target::Write(d) => Target::Write(*d),
        }
    }
}

/// Builder for [`Interpreter`] instances.
pub struct InterpreterBuilder<'s, S> {
    schema: &'s Schema,
    stream: S,
    options: ParseOptions,
}

impl<'s, S: DataStream> InterpreterBuilder<'s, S> {
    pub fn new(schema: &'s Schema, stream: S) -> Self {
        Self {
            schema,
            stream,
            options: ParseOptions::default(),
        }
    }

    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn limits(mut self, limits: ParseLimits) -> Self {
        self.options = self.options.limits(limits);
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.options.limits = self.options.limits.recursion_limit(limit);
        self
    }

    pub fn constant_lengths(mut self, enabled: bool) -> Self {
        self.options = self.options.constant_lengths(enabled);
        self
    }

    pub fn build(self) -> Interpreter<'s, S> {
        Interpreter {
            schema: self.schema,
            stream: self.stream,
            options: self.options,
            depth: 0,
            version: self.schema.try_lookup("Version"),
            header_string: self.schema.try_lookup("Header String"),
        }
    }
}

/// Executes schema programs, reading values from or writing them to a stream.
///
/// `header` arguments name the file header dictionary consulted by
/// `HEADER_FIELD` and version-dependent encodings. `None` means the value
/// being processed is the header itself.
pub struct Interpreter<'s, S> {
    pub(crate) schema: &'s Schema,
    pub(crate) stream: S,
    pub(crate) options: ParseOptions,
    depth: u32,
    version: Option<Symbol>,
    header_string: Option<Symbol>,
}

impl<'s, S: DataStream> Interpreter<'s, S> {
    /// Create an interpreter builder.
    pub fn builder(schema: &'s Schema, stream: S) -> InterpreterBuilder<'s, S> {
        InterpreterBuilder::new(schema, stream)
    }

    /// Interpreter with default options.
    pub fn new(schema: &'s Schema, stream: S) -> Self {
        InterpreterBuilder::new(schema, stream).build()
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Current stream position.
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_stream(self) -> S {
        self.stream
    }

    /// Read one value of type `ty`.
    pub fn deserialize(
        &mut self,
        ty: Symbol,
        header: Option<&Dictionary>,
    ) -> Result<Value, ParseError> {
        self.deserialize_with(ty, header, &mut NoopTracer)
    }

    /// Read one value of type `ty`, reporting progress to `tracer`.
    pub fn deserialize_with<T: Tracer>(
        &mut self,
        ty: Symbol,
        header: Option<&Dictionary>,
        tracer: &mut T,
    ) -> Result<Value, ParseError> {
        let mut value = Value::Null;
        self.execute(ty, Slot::Read(&mut value), Frame::default(), header, tracer)?;
        Ok(value)
    }

    /// Write `value` as type `ty`.
    pub fn serialize(
        &mut self,
        ty: Symbol,
        value: &Value,
        header: Option<&Dictionary>,
    ) -> Result<(), ParseError> {
        self.serialize_with(ty, value, header, &mut NoopTracer)
    }

    /// Write `value` as type `ty`, reporting progress to `tracer`.
    pub fn serialize_with<T: Tracer>(
        &mut self,
        ty: Symbol,
        value: &Value,
        header: Option<&Dictionary>,
        tracer: &mut T,
    ) -> Result<(), ParseError> {
        self.execute(ty, Slot::Write(value), Frame::default(), header, tracer)
    }

    pub(crate) fn execute<T: Tracer>(
        &mut self,
        ty: Symbol,
        slot: Slot<'_>,
        frame: Frame<'_>,
        header: Option<&Dictionary>,
        tracer: &mut T,
    ) -> Result<(), ParseError> {
        self.enter()?;
        let result = self.run_program(ty, slot, frame, header, tracer);
        self.depth -= 1;
        result
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        let limit = self.options.limits.recursion_limit;
        if self.depth >= limit {
            return Err(ParseError::RecursionLimitExceeded(limit));
        }
        self.depth += 1;
        Ok(())
    }

    /// Position a cursor after `BEGIN ty`, returning the body opcode and its offset.
    fn open_program(&self, ty: Symbol) -> Result<(BytecodeCursor<'s>, Opcode, usize), ParseError> {
        let mut cursor = self.schema.program(ty)?;
        let begin_offset = cursor.position();
        match cursor.read_instruction()? {
            Instruction::Begin(id) if id == ty => {}
            Instruction::Begin(id) => {
                return Err(ParseError::TypeIdMismatch {
                    expected: self.schema.name(ty).to_string(),
                    found: self.schema.name(id).to_string(),
                });
            }
            other => {
                return Err(ParseError::UnknownOpcode {
                    opcode: other.opcode() as u8,
                    offset: begin_offset,
                });
            }
        }
        let body_offset = cursor.position();
        let body = cursor.read_opcode()?;
        Ok((cursor, body, body_offset))
    }

    fn run_program<T: Tracer>(
        &mut self,
        ty: Symbol,
        slot: Slot<'_>,
        frame: Frame<'_>,
        header: Option<&Dictionary>,
        tracer: &mut T,
    ) -> Result<(), ParseError> {
        let (mut cursor, body, body_offset) = self.open_program(ty)?;

        match body {
            Opcode::Compound => {
                let target = match slot {
                    Slot::Read(value) => {
                        if matches!(value, Value::Null) {
                            *value = Value::Dictionary(Dictionary::new());
                        }
                        match value {
                            Value::Dictionary(d) => Target::Read(d),
                            other => return Err(kind_mismatch("dictionary", other)),
                        }
                    }
                    Slot::Write(value) => match value {
                        Value::Dictionary(d) => Target::Write(d),
                        other => return Err(kind_mismatch("dictionary", other)),
                    },
                };
                self.run_compound(&mut cursor, ty, target, header, frame, tracer)
            }
            Opcode::Enum | Opcode::Bitflags => {
                self.run_enum(&mut cursor, ty, body, slot, header, frame, tracer)
            }
            other => Err(ParseError::UnknownOpcode {
                opcode: other as u8,
                offset: body_offset,
            }),
        }
    }

    /// Run base type `base` against the dictionary of the derived type `ty`.
    fn inherit<T: Tracer>(
        &mut self,
        ty: Symbol,
        base: Symbol,
        target: Target<'_>,
        header: Option<&Dictionary>,
        tracer: &mut T,
    ) -> Result<(), ParseError> {
        tracer.trace_inherit(base);
        self.enter()?;
        let result = self.run_base(ty, base, target, header, tracer);
        self.depth -= 1;
        result
    }

    fn run_base<T: Tracer>(
        &mut self,
        ty: Symbol,
        base: Symbol,
        target: Target<'_>,
        header: Option<&Dictionary>,
        tracer: &mut T,
    ) -> Result<(), ParseError> {
        let (mut cursor, body, _) = self.open_program(base)?;
        if body != Opcode::Compound {
            return Err(ParseError::InvalidInheritance {
                ty: self.schema.name(ty).to_string(),
                base: self.schema.name(base).to_string(),
            });
        }
        self.run_compound(&mut cursor, base, target, header, Frame::default(), tracer)
    }

    fn run_compound<T: Tracer>(
        &mut self,
        cursor: &mut BytecodeCursor<'s>,
        ty: Symbol,
        mut target: Target<'_>,
        header: Option<&Dictionary>,
        frame: Frame<'_>,
        tracer: &mut T,
    ) -> Result<(), ParseError> {
        if let Target::Read(dict) = &mut target {
            dict.is_ni_object = false;
            dict.type_chain.push(ty);
        }
        tracer.trace_enter_type(ty, self.stream.position());

        let mut desc = TypeDescriptor::default();
        let mut present = true;
        let mut stack = EvalStack::new();
        // Field path from the target dictionary, set by FIELD_INDIRECTION.
        let mut indirection: Option<Vec<Symbol>> = None;

        loop {
            let offset = cursor.position();
            let instr = cursor.read_instruction()?;

            match instr {
                Instruction::Simple(Opcode::End) => break,

                Instruction::Simple(Opcode::Inherit) => match cursor.read_instruction()? {
                    Instruction::NamedType(base) => {
                        self.inherit(ty, base, target.reborrow(), header, tracer)?;
                    }
                    other => {
                        return Err(ParseError::InvalidInheritance {
                            ty: self.schema.name(ty).to_string(),
                            base: other.opcode().mnemonic().to_string(),
                        });
                    }
                },

                Instruction::Simple(Opcode::IsNiObject) => {
                    if let Target::Read(dict) = &mut target {
                        dict.is_ni_object = true;
                    }
                }

                Instruction::Simple(Opcode::IsTemplate) => {}

                Instruction::Simple(Opcode::Specialize) => {
                    let next = cursor.read_instruction()?;
                    let mut specialization = TypeDescriptor::default();
                    if !specialization.set_kind(next, frame)? {
                        return Err(ParseError::InvalidSpecialization(format!(
                            "{} cannot specialize a type",
                            next.opcode().mnemonic()
                        )));
                    }
                    desc.specialization = Some(Box::new(specialization));
                }

                Instruction::Field(name) => {
                    if present {
                        match &mut target {
                            Target::Read(dict) => {
                                let value = {
                                    let hdr = header.unwrap_or(&**dict);
                                    desc.read_value(self, hdr, tracer)?
                                };
                                tracer.trace_field(name, Some(&value));
                                dict.insert(name, value);
                            }
                            Target::Write(dict) => {
                                let dict: &Dictionary = dict;
                                let value = dict.get(name).ok_or_else(|| self.missing(name))?;
                                let hdr = header.unwrap_or(dict);
                                desc.write_value(self, value, hdr, tracer)?;
                                tracer.trace_field(name, Some(value));
                            }
                        }
                    } else {
                        tracer.trace_field(name, None);
                    }
                    present = true;
                    desc.reset();
                }

                Instruction::StaticArray(len) => desc.dims.push(len),

                Instruction::Simple(Opcode::DynamicArray) => {
                    let len = stack.pop()?;
                    desc.dims.push(len);
                }

                Instruction::FieldIndirection(name) => {
                    let mut path = indirection.take().unwrap_or_default();
                    let dict = self.resolve_path(target.dict(), &path)?;
                    if dict.get(name).is_none() {
                        return Err(self.missing(name));
                    }
                    path.push(name);
                    indirection = Some(path);
                }

                Instruction::FieldValue(name) => {
                    let path = indirection.take().unwrap_or_default();
                    let dict = self.resolve_path(target.dict(), &path)?;
                    let value = if self.schema.is_type_name(name) {
                        u32::from(dict.kind_of(name))
                    } else {
                        let field = dict.get(name).ok_or_else(|| self.missing(name))?;
                        field
                            .coerce_scalar()
                            .ok_or_else(|| kind_mismatch("uint", field))?
                    };
                    stack.push(value);
                    tracer.trace_push(Opcode::FieldValue, value);
                }

                Instruction::Literal(value) => {
                    stack.push(value);
                    tracer.trace_push(Opcode::Literal, value);
                }

                Instruction::Simple(Opcode::Not) => {
                    let value = stack.apply_not()?;
                    tracer.trace_push(Opcode::Not, value);
                }

                Instruction::Simple(op) if op.is_binary() => {
                    let value = stack.apply_binary(op)?;
                    tracer.trace_push(op, value);
                }

                Instruction::HeaderField(name) => {
                    let value = self.header_field(header.unwrap_or(target.dict()), name)?;
                    stack.push(value);
                    tracer.trace_push(Opcode::HeaderField, value);
                }

                Instruction::Simple(Opcode::Condition) => present = stack.pop()? != 0,

                Instruction::Simple(Opcode::Arg) => {
                    stack.push(frame.arg);
                    tracer.trace_push(Opcode::Arg, frame.arg);
                }

                Instruction::Simple(Opcode::SetArg) => desc.arg = stack.pop()?,

                Instruction::Simple(Opcode::Dup) => {
                    let value = stack.dup()?;
                    tracer.trace_push(Opcode::Dup, value);
                }

                Instruction::Branch {
                    opcode,
                    displacement,
                } => {
                    let taken = match opcode {
                        Opcode::BranchUnless => stack.pop()? == 0,
                        Opcode::BranchIf => stack.pop()? != 0,
                        _ => true,
                    };
                    if taken {
                        cursor.branch(i32::from(displacement) - 2)?;
                    }
                }

                other => {
                    if !desc.set_kind(other, frame)? {
                        return Err(ParseError::UnknownOpcode {
                            opcode: other.opcode() as u8,
                            offset,
                        });
                    }
                }
            }
        }

        tracer.trace_exit_type(ty, self.stream.position());
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_enum<T: Tracer>(
        &mut self,
        cursor: &mut BytecodeCursor<'s>,
        ty: Symbol,
        body: Opcode,
        slot: Slot<'_>,
        header: Option<&Dictionary>,
        frame: Frame<'_>,
        tracer: &mut T,
    ) -> Result<(), ParseError> {
        let storage_offset = cursor.position();
        let storage_instr = cursor.read_instruction()?;
        let mut storage = TypeDescriptor::default();
        if !storage.set_kind(storage_instr, frame)? {
            return Err(ParseError::UnknownOpcode {
                opcode: storage_instr.opcode() as u8,
                offset: storage_offset,
            });
        }

        let options = read_options(cursor)?;
        let bitflags = body == Opcode::Bitflags;
        let empty = Dictionary::new();
        let hdr = header.unwrap_or(&empty);

        match slot {
            Slot::Read(value) => {
                let stored = storage.read_value(self, hdr, tracer)?;
                let raw_value = stored
                    .coerce_scalar()
                    .ok_or_else(|| kind_mismatch("uint", &stored))?;

                *value = if bitflags {
                    let symbolic_values = options
                        .iter()
                        .filter(|(_, bit)| bit_mask(*bit).is_some_and(|m| raw_value & m != 0))
                        .map(|(name, _)| *name)
                        .collect();
                    Value::Bitflags {
                        raw_value,
                        symbolic_values,
                    }
                } else {
                    let symbolic_value = options
                        .iter()
                        .rfind(|(_, option)| *option == raw_value)
                        .map_or(Symbol::NULL, |(name, _)| *name);
                    Value::Enum {
                        raw_value,
                        symbolic_value,
                    }
                };
                tracer.trace_enum(ty, value);
            }
            Slot::Write(value) => {
                let physical = match (bitflags, value) {
                    (
                        false,
                        Value::Enum {
                            raw_value,
                            symbolic_value,
                        },
                    ) => options
                        .iter()
                        .rfind(|(name, _)| name == symbolic_value)
                        .map_or(*raw_value, |(_, option)| *option),
                    (
                        true,
                        Value::Bitflags {
                            raw_value,
                            symbolic_values,
                        },
                    ) => {
                        let mut known = 0;
                        let mut named = 0;
                        for (name, bit) in &options {
                            if let Some(mask) = bit_mask(*bit) {
                                known |= mask;
                                if symbolic_values.contains(name) {
                                    named |= mask;
                                }
                            }
                        }
                        (raw_value & !known) | named
                    }
                    (false, other) => return Err(kind_mismatch("enum", other)),
                    (true, other) => return Err(kind_mismatch("bitflags", other)),
                };
                storage.write_value(self, &Value::UInt(physical), hdr, tracer)?;
                tracer.trace_enum(ty, value);
            }
        }
        Ok(())
    }

    /// Follow a field path from `root`; every step must be a dictionary.
    fn resolve_path<'d>(
        &self,
        root: &'d Dictionary,
        path: &[Symbol],
    ) -> Result<&'d Dictionary, ParseError> {
        let mut dict = root;
        for &name in path {
            let value = dict.get(name).ok_or_else(|| self.missing(name))?;
            dict = value
                .as_dictionary()
                .ok_or_else(|| kind_mismatch("dictionary", value))?;
        }
        Ok(dict)
    }

    /// Integral header field; `Version` falls back to `Header String`.
    pub(crate) fn header_field(&self, header: &Dictionary, name: Symbol) -> Result<u32, ParseError> {
        let value = header
            .get(name)
            .or_else(|| {
                if Some(name) == self.version {
                    self.header_string.and_then(|hs| header.get(hs))
                } else {
                    None
                }
            })
            .ok_or_else(|| self.missing(name))?;
        value
            .coerce_scalar()
            .ok_or_else(|| kind_mismatch("uint", value))
    }

    /// File version from the header.
    pub(crate) fn header_version(&self, header: &Dictionary) -> Result<u32, ParseError> {
        match (self.version, self.header_string) {
            (Some(version), _) => self.header_field(header, version),
            (None, Some(header_string)) => self.header_field(header, header_string),
            (None, None) => Err(ParseError::MissingRequiredField("Version".to_string())),
        }
    }

    pub(crate) fn check_array_len(&self, len: u32) -> Result<(), ParseError> {
        let max = self.options.limits.max_array_len;
        if len > max {
            return Err(ParseError::ArrayTooLarge { len, max });
        }
        Ok(())
    }

    fn missing(&self, name: Symbol) -> ParseError {
        ParseError::MissingRequiredField(self.schema.name(name).to_string())
    }
}

/// Read `OPTION` entries up to the closing `END`.
fn read_options(cursor: &mut BytecodeCursor<'_>) -> Result<Vec<(Symbol, u32)>, ParseError> {
    let mut options = Vec::new();
    loop {
        let offset = cursor.position();
        match cursor.read_instruction()? {
            Instruction::Option { name, value } => options.push((name, value)),
            Instruction::Simple(Opcode::End) => return Ok(options),
            other => {
                return Err(ParseError::UnknownOpcode {
                    opcode: other.opcode() as u8,
                    offset,
                });
            }
        }
    }
}

/// `1 << bit`, `None` for bits past 31.
fn bit_mask(bit: u32) -> Option<u32> {
    1u32.checked_shl(bit)
}

pub(crate) fn kind_mismatch(expected: &'static str, found: &Value) -> ParseError {
    ParseError::ValueKindMismatch {
        expected,
        found: found.kind_name(),
    }
}
