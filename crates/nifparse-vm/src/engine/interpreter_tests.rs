//! Tests for the schema interpreter.

use nifparse_bytecode::{Opcode, Schema, SchemaBuilder};
use nifparse_core::Symbol;

use crate::stream::{DataStream, SliceStream, VecStream};

use super::error::ParseError;
use super::interpreter::{Interpreter, ParseLimits};
use super::value::{Dictionary, Link, Value};

fn read(schema: &Schema, ty: &str, bytes: &[u8]) -> Result<Value, ParseError> {
    let mut interp = Interpreter::new(schema, SliceStream::new(bytes));
    interp.deserialize(schema.lookup(ty).unwrap(), None)
}

fn write(schema: &Schema, ty: &str, value: &Value) -> Result<Vec<u8>, ParseError> {
    let mut interp = Interpreter::new(schema, VecStream::new());
    interp.serialize(schema.lookup(ty).unwrap(), value, None)?;
    Ok(interp.into_stream().into_inner())
}

fn get<'v>(schema: &Schema, value: &'v Value, name: &str) -> Option<&'v Value> {
    value.as_dictionary().unwrap().get(schema.lookup(name).unwrap())
}

fn uint(schema: &Schema, value: &Value, name: &str) -> u32 {
    get(schema, value, name).and_then(Value::as_uint).unwrap()
}

fn pair_schema() -> Schema {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Pair");
    p.field_of(Opcode::UInt, "A")
        .field_of(Opcode::UShort, "B")
        .field_of(Opcode::Byte, "C");
    p.finish();
    b.build_schema().unwrap()
}

#[test]
fn fields_read_in_order() {
    let schema = pair_schema();
    let bytes = [1, 0, 0, 0, 2, 0, 3];

    let mut interp = Interpreter::new(&schema, SliceStream::new(&bytes));
    let value = interp
        .deserialize(schema.lookup("Pair").unwrap(), None)
        .unwrap();

    assert_eq!(interp.position(), 7);
    assert!(interp.stream().remaining().is_empty());
    assert_eq!(uint(&schema, &value, "A"), 1);
    assert_eq!(uint(&schema, &value, "B"), 2);
    assert_eq!(uint(&schema, &value, "C"), 3);

    let dict = value.as_dictionary().unwrap();
    assert_eq!(dict.type_chain, vec![schema.lookup("Pair").unwrap()]);
    assert!(!dict.is_ni_object);
    let names: Vec<_> = dict.fields.keys().map(|&k| schema.name(k)).collect();
    assert_eq!(names, ["A", "B", "C"]);
}

#[test]
fn read_then_write_reproduces_bytes() {
    let schema = pair_schema();
    let bytes = [0x78, 0x56, 0x34, 0x12, 0xCD, 0xAB, 0xEF];

    let value = read(&schema, "Pair", &bytes).unwrap();
    let written = write(&schema, "Pair", &value).unwrap();

    assert_eq!(written, bytes);
}

#[test]
fn write_requires_every_field() {
    let schema = pair_schema();
    let mut dict = Dictionary::new();
    dict.insert(schema.lookup("A").unwrap(), Value::UInt(1));

    let err = write(&schema, "Pair", &Value::Dictionary(dict)).unwrap_err();

    assert_eq!(err.to_string(), "required field is not in dictionary: B");
}

#[test]
fn write_checks_value_kind() {
    let schema = pair_schema();
    let err = write(&schema, "Pair", &Value::UInt(3)).unwrap_err();
    assert_eq!(err.to_string(), "expected dictionary value, found uint");
}

#[test]
fn signed_types_are_sign_extended() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Signed");
    p.field_of(Opcode::Short, "S")
        .field_of(Opcode::Int, "I")
        .field_of(Opcode::UShort, "U");
    p.finish();
    let schema = b.build_schema().unwrap();

    let value = read(&schema, "Signed", &[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF]).unwrap();

    assert_eq!(uint(&schema, &value, "S"), 0xFFFF_FFFE);
    assert_eq!(uint(&schema, &value, "I"), 0xFFFF_FFFF);
    assert_eq!(uint(&schema, &value, "U"), 0xFFFE);
}

#[test]
fn floats_and_half_floats() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Floats");
    p.field_of(Opcode::Float, "F").field_of(Opcode::HFloat, "H");
    p.finish();
    let schema = b.build_schema().unwrap();

    let mut bytes = 1.5f32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[0x00, 0x3C]);
    let value = read(&schema, "Floats", &bytes).unwrap();

    assert_eq!(get(&schema, &value, "F"), Some(&Value::Float(1.5)));
    assert_eq!(get(&schema, &value, "H"), Some(&Value::Float(1.0)));
    assert_eq!(write(&schema, "Floats", &value).unwrap(), bytes);
}

#[test]
fn condition_skips_next_field() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Opt");
    p.field_of(Opcode::UInt, "Has Extra");
    p.field_value("Has Extra").op(Opcode::Condition);
    p.field_of(Opcode::UInt, "Extra");
    p.field_of(Opcode::Byte, "Tail");
    p.finish();
    let schema = b.build_schema().unwrap();

    let absent = read(&schema, "Opt", &[0, 0, 0, 0, 9]).unwrap();
    assert_eq!(get(&schema, &absent, "Extra"), None);
    assert_eq!(uint(&schema, &absent, "Tail"), 9);

    let present = read(&schema, "Opt", &[1, 0, 0, 0, 5, 0, 0, 0, 9]).unwrap();
    assert_eq!(uint(&schema, &present, "Extra"), 5);
    assert_eq!(uint(&schema, &present, "Tail"), 9);
}

#[test]
fn dynamic_array_sized_by_earlier_field() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("List");
    p.field_of(Opcode::UInt, "Count");
    p.field_value("Count").op(Opcode::DynamicArray);
    p.field_of(Opcode::UShort, "Items");
    p.finish();
    let schema = b.build_schema().unwrap();

    let bytes = [2, 0, 0, 0, 1, 0, 2, 0];
    let value = read(&schema, "List", &bytes).unwrap();

    assert_eq!(
        get(&schema, &value, "Items"),
        Some(&Value::Array(vec![Value::UInt(1), Value::UInt(2)]))
    );
    assert_eq!(write(&schema, "List", &value).unwrap(), bytes);
}

#[test]
fn write_checks_array_length() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Fixed");
    p.static_array(2).field_of(Opcode::UInt, "Pair");
    p.finish();
    let schema = b.build_schema().unwrap();

    let mut dict = Dictionary::new();
    dict.insert(schema.lookup("Pair").unwrap(), Value::Array(vec![Value::UInt(1)]));
    let err = write(&schema, "Fixed", &Value::Dictionary(dict)).unwrap_err();

    assert_eq!(err.to_string(), "array has 1 elements, dimension requires 2");
}

#[test]
fn multidimensional_arrays_nest_outermost_first() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Grid");
    p.static_array(2).static_array(3);
    p.field_of(Opcode::Byte, "Cells");
    p.finish();
    let schema = b.build_schema().unwrap();

    let value = read(&schema, "Grid", &[1, 2, 3, 4, 5, 6]).unwrap();

    assert_eq!(
        get(&schema, &value, "Cells"),
        Some(&Value::Array(vec![
            Value::ByteArray(vec![1, 2, 3]),
            Value::ByteArray(vec![4, 5, 6]),
        ]))
    );
}

#[test]
fn byte_and_char_arrays() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Blob");
    p.static_array(3).field_of(Opcode::Byte, "Data");
    p.static_array(4).field_of(Opcode::Char, "Tag");
    p.field_of(Opcode::LineString, "Line");
    p.finish();
    let schema = b.build_schema().unwrap();

    let bytes = b"\x01\x02\x03NIF!hello\n";
    let value = read(&schema, "Blob", bytes).unwrap();

    assert_eq!(get(&schema, &value, "Data"), Some(&Value::ByteArray(vec![1, 2, 3])));
    assert_eq!(get(&schema, &value, "Tag"), Some(&Value::String(b"NIF!".to_vec())));
    assert_eq!(get(&schema, &value, "Line"), Some(&Value::String(b"hello".to_vec())));
    assert_eq!(write(&schema, "Blob", &value).unwrap(), bytes);
}

#[test]
fn array_limit_checked_before_reading() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Big");
    p.field_of(Opcode::UInt, "Count");
    p.field_value("Count").op(Opcode::DynamicArray);
    p.field_of(Opcode::Byte, "Data");
    p.finish();
    let schema = b.build_schema().unwrap();

    let bytes = [5, 0, 0, 0, 1, 2, 3, 4, 5];
    let mut interp = Interpreter::builder(&schema, SliceStream::new(&bytes))
        .limits(ParseLimits::new().max_array_len(4))
        .build();
    let err = interp
        .deserialize(schema.lookup("Big").unwrap(), None)
        .unwrap_err();

    assert!(matches!(err, ParseError::ArrayTooLarge { len: 5, max: 4 }));
}

#[test]
fn division_by_zero_fails() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Div");
    p.literal(1).literal(0).op(Opcode::Div).op(Opcode::Condition);
    p.field_of(Opcode::Byte, "X");
    p.finish();
    let schema = b.build_schema().unwrap();

    let err = read(&schema, "Div", &[0]).unwrap_err();
    assert!(matches!(err, ParseError::DivisionByZero));
}

#[test]
fn modulo_drives_condition() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Mod");
    p.literal(7).literal(3).op(Opcode::Mod);
    p.literal(1).op(Opcode::Equal).op(Opcode::Condition);
    p.field_of(Opcode::Byte, "Seven Mod Three Is One");
    p.literal(6).literal(3).op(Opcode::Mod).op(Opcode::Condition);
    p.field_of(Opcode::Byte, "Six Mod Three Is Nonzero");
    p.finish();
    let schema = b.build_schema().unwrap();

    let value = read(&schema, "Mod", &[4]).unwrap();

    assert_eq!(uint(&schema, &value, "Seven Mod Three Is One"), 4);
    assert_eq!(get(&schema, &value, "Six Mod Three Is Nonzero"), None);
}

#[test]
fn stack_underflow_fails() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Empty");
    p.op(Opcode::Condition);
    p.finish();
    let schema = b.build_schema().unwrap();

    let err = read(&schema, "Empty", &[]).unwrap_err();
    assert!(matches!(err, ParseError::StackUnderflow));
}

#[test]
fn branches_select_alternatives() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Choice");
    p.field_of(Opcode::Byte, "Wide");
    p.field_value("Wide");
    let wide = p.branch_if();
    p.field_of(Opcode::UShort, "Narrow Value");
    let done = p.branch();
    p.bind(wide);
    p.field_of(Opcode::UInt, "Wide Value");
    p.bind(done);
    p.finish();
    let schema = b.build_schema().unwrap();

    let narrow = read(&schema, "Choice", &[0, 7, 0]).unwrap();
    assert_eq!(uint(&schema, &narrow, "Narrow Value"), 7);
    assert_eq!(get(&schema, &narrow, "Wide Value"), None);

    let wide = read(&schema, "Choice", &[1, 8, 0, 0, 0]).unwrap();
    assert_eq!(uint(&schema, &wide, "Wide Value"), 8);
    assert_eq!(get(&schema, &wide, "Narrow Value"), None);
}

#[test]
fn header_version_falls_back_to_header_string() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Header");
    p.field_of(Opcode::HeaderString, "Header String");
    p.header_field("Version")
        .literal(0x1400_0005)
        .op(Opcode::GreaterOrEqual)
        .op(Opcode::Condition);
    p.field_of(Opcode::UInt, "User Version");
    p.finish();
    let schema = b.build_schema().unwrap();

    let mut bytes = b"Gamebryo File Format, Version 20.0.0.5\n".to_vec();
    bytes.extend_from_slice(&[11, 0, 0, 0]);
    let value = read(&schema, "Header", &bytes).unwrap();

    assert_eq!(uint(&schema, &value, "Header String"), 0x1400_0005);
    assert_eq!(uint(&schema, &value, "User Version"), 11);
    assert_eq!(write(&schema, "Header", &value).unwrap(), bytes);
}

#[test]
fn malformed_header_string() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Header");
    p.field_of(Opcode::HeaderString, "Header String");
    p.finish();
    let schema = b.build_schema().unwrap();

    let err = read(&schema, "Header", b"Not a model\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"malformed header string "Not a model", not a NIF file?"#
    );
}

fn bool_schema() -> Schema {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Header");
    p.field_of(Opcode::FileVersion, "Version")
        .field_of(Opcode::Bool, "Flag")
        .field_of(Opcode::Byte, "After");
    p.finish();
    b.build_schema().unwrap()
}

#[test]
fn bool_width_follows_version() {
    let schema = bool_schema();

    let old = read(&schema, "Header", &[2, 0, 0, 4, 1, 0, 0, 0, 7]).unwrap();
    assert_eq!(uint(&schema, &old, "Flag"), 1);
    assert_eq!(uint(&schema, &old, "After"), 7);

    let new = read(&schema, "Header", &[5, 0, 0, 20, 1, 7]).unwrap();
    assert_eq!(uint(&schema, &new, "Flag"), 1);
    assert_eq!(uint(&schema, &new, "After"), 7);
}

#[test]
fn constant_lengths_force_wide_bools() {
    let schema = bool_schema();
    let bytes = [5, 0, 0, 20, 1, 0, 0, 0, 7];

    let mut interp = Interpreter::builder(&schema, SliceStream::new(&bytes))
        .constant_lengths(true)
        .build();
    let value = interp
        .deserialize(schema.lookup("Header").unwrap(), None)
        .unwrap();

    assert_eq!(uint(&schema, &value, "After"), 7);
    assert_eq!(interp.position(), 9);
}

#[test]
fn nested_types_see_file_header() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Header");
    p.field_of(Opcode::FileVersion, "Version");
    p.finish();
    let mut p = b.compound("Block");
    p.header_field("Version")
        .literal(0x0A00_0000)
        .op(Opcode::GreaterThan)
        .op(Opcode::Condition);
    p.field_of(Opcode::UInt, "New Field");
    p.finish();
    let schema = b.build_schema().unwrap();

    let header = read(&schema, "Header", &[0, 0, 0, 20]).unwrap();
    let header = header.as_dictionary().unwrap();

    let bytes = [3, 0, 0, 0];
    let mut interp = Interpreter::new(&schema, SliceStream::new(&bytes));
    let block = interp
        .deserialize(schema.lookup("Block").unwrap(), Some(header))
        .unwrap();

    assert_eq!(uint(&schema, &block, "New Field"), 3);
}

#[test]
fn header_field_missing() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Block");
    p.header_field("User Version").op(Opcode::Condition);
    p.field_of(Opcode::Byte, "X");
    p.finish();
    let schema = b.build_schema().unwrap();

    let err = read(&schema, "Block", &[1]).unwrap_err();
    assert_eq!(err.to_string(), "required field is not in dictionary: User Version");
}

fn inheritance_schema() -> Schema {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Base");
    p.field_of(Opcode::UInt, "Id");
    p.finish();
    b.compound("Other").finish();
    let mut p = b.compound("Derived");
    p.inherit("Base").op(Opcode::IsNiObject);
    p.field_value("Base").op(Opcode::Condition);
    p.field_of(Opcode::Byte, "If Base");
    p.field_value("Other").op(Opcode::Condition);
    p.field_of(Opcode::Byte, "If Other");
    p.field_of(Opcode::UShort, "Extra");
    p.finish();
    b.build_schema().unwrap()
}

#[test]
fn inherit_extends_type_chain() {
    let schema = inheritance_schema();
    let value = read(&schema, "Derived", &[1, 0, 0, 0, 2, 3, 0]).unwrap();

    let dict = value.as_dictionary().unwrap();
    let chain: Vec<_> = dict.type_chain.iter().map(|&t| schema.name(t)).collect();
    assert_eq!(chain, ["Derived", "Base"]);
    assert!(dict.is_ni_object);
    assert!(dict.is_a(schema.lookup("Derived").unwrap()));
    assert!(!dict.is_a(schema.lookup("Base").unwrap()));
    assert!(dict.kind_of(schema.lookup("Base").unwrap()));

    let names: Vec<_> = dict.fields.keys().map(|&k| schema.name(k)).collect();
    assert_eq!(names, ["Id", "If Base", "Extra"]);
}

#[test]
fn field_value_on_type_name_tests_type_chain() {
    let schema = inheritance_schema();
    let value = read(&schema, "Derived", &[1, 0, 0, 0, 2, 3, 0]).unwrap();

    assert_eq!(uint(&schema, &value, "If Base"), 2);
    assert_eq!(get(&schema, &value, "If Other"), None);
    assert_eq!(uint(&schema, &value, "Extra"), 3);
}

#[test]
fn inherit_round_trip() {
    let schema = inheritance_schema();
    let bytes = [1, 0, 0, 0, 2, 3, 0];
    let value = read(&schema, "Derived", &bytes).unwrap();
    assert_eq!(write(&schema, "Derived", &value).unwrap(), bytes);
}

#[test]
fn inherit_requires_compound_base() {
    let mut b = SchemaBuilder::new();
    let mut p = b.enumeration("Mode", Opcode::Byte);
    p.option("Off", 0);
    p.finish();
    let mut p = b.compound("Broken");
    p.inherit("Mode");
    p.finish();
    let schema = b.build_schema().unwrap();

    let err = read(&schema, "Broken", &[0]).unwrap_err();
    assert_eq!(err.to_string(), "Broken inherits Mode, which is not a compound type");
}

#[test]
fn self_inheritance_hits_recursion_limit() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Loop");
    p.inherit("Loop");
    p.finish();
    let schema = b.build_schema().unwrap();

    assert_eq!(ParseLimits::default().get_recursion_limit(), 256);

    let mut interp = Interpreter::builder(&schema, SliceStream::new(&[]))
        .recursion_limit(8)
        .build();
    let err = interp
        .deserialize(schema.lookup("Loop").unwrap(), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "recursion limit of 8 nested types exceeded");
}

#[test]
fn field_indirection_reads_nested_value() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Inner");
    p.field_of(Opcode::UInt, "Count");
    p.finish();
    let mut p = b.compound("Outer");
    p.named_field("Inner", "In");
    p.field_indirection("In")
        .field_value("Count")
        .op(Opcode::DynamicArray);
    p.field_of(Opcode::Byte, "Data");
    p.finish();
    let schema = b.build_schema().unwrap();

    let value = read(&schema, "Outer", &[2, 0, 0, 0, 0xAA, 0xBB]).unwrap();

    assert_eq!(get(&schema, &value, "Data"), Some(&Value::ByteArray(vec![0xAA, 0xBB])));
    let inner = get(&schema, &value, "In").unwrap();
    assert_eq!(uint(&schema, inner, "Count"), 2);
}

#[test]
fn arg_passes_into_nested_type() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Row");
    p.op(Opcode::Arg).op(Opcode::DynamicArray);
    p.field_of(Opcode::Byte, "Cells");
    p.finish();
    let mut p = b.compound("Table");
    p.field_of(Opcode::Byte, "Width");
    p.field_value("Width").op(Opcode::SetArg);
    p.named_field("Row", "First");
    p.finish();
    let schema = b.build_schema().unwrap();

    let value = read(&schema, "Table", &[3, 7, 8, 9]).unwrap();
    let row = get(&schema, &value, "First").unwrap();

    assert_eq!(get(&schema, row, "Cells"), Some(&Value::ByteArray(vec![7, 8, 9])));
}

#[test]
fn dup_keeps_top_for_reuse() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Twice");
    p.literal(1).op(Opcode::Dup).op(Opcode::Condition);
    p.field_of(Opcode::Byte, "First");
    p.op(Opcode::Condition);
    p.field_of(Opcode::Byte, "Second");
    p.finish();
    let schema = b.build_schema().unwrap();

    let value = read(&schema, "Twice", &[1, 2]).unwrap();
    assert_eq!(uint(&schema, &value, "First"), 1);
    assert_eq!(uint(&schema, &value, "Second"), 2);
}

fn template_schema() -> Schema {
    let mut b = SchemaBuilder::new();
    b.compound("Node").finish();
    let mut p = b.compound("Key");
    p.op(Opcode::IsTemplate);
    p.op(Opcode::TemplateArgument).field("Value");
    p.finish();
    let mut p = b.compound("Holder");
    p.op(Opcode::Specialize).op(Opcode::Float);
    p.named_field("Key", "Key");
    p.specialize("Node").field_of(Opcode::Ref, "Child");
    p.specialize("Node").field_of(Opcode::Ptr, "Parent");
    p.finish();
    b.build_schema().unwrap()
}

#[test]
fn template_argument_takes_specialization() {
    let schema = template_schema();
    let mut bytes = 2.5f32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[3, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);

    let value = read(&schema, "Holder", &bytes).unwrap();
    let key = get(&schema, &value, "Key").unwrap();
    let node = schema.lookup("Node").unwrap();

    assert_eq!(get(&schema, key, "Value"), Some(&Value::Float(2.5)));
    assert_eq!(
        get(&schema, &value, "Child"),
        Some(&Value::Reference(Link::new(node, 3)))
    );
    assert_eq!(
        get(&schema, &value, "Parent"),
        Some(&Value::Pointer(Link::new(node, -1)))
    );
    assert_eq!(write(&schema, "Holder", &value).unwrap(), bytes);
}

#[test]
fn template_argument_without_specialization() {
    let schema = template_schema();
    let err = read(&schema, "Key", &[0, 0, 0, 0]).unwrap_err();
    assert!(matches!(err, ParseError::InvalidSpecialization(_)));
}

#[test]
fn reference_requires_target_type() {
    let mut b = SchemaBuilder::new();
    let mut p = b.compound("Loose");
    p.field_of(Opcode::Ref, "Target");
    p.finish();
    let schema = b.build_schema().unwrap();

    let err = read(&schema, "Loose", &[0, 0, 0, 0]).unwrap_err();
    assert_eq!(err.to_string(), "invalid specialization: link without a target type");
}

#[test]
fn type_id_mismatch() {
    // Type index says Foo, program begins with Bar.
    let blob = vec![
        1, 0, 0, // type index
        8, 2, b'F', b'o', b'o', 0, b'B', b'a', b'r', 0, // symbols
        55, 1, 58, 255, // program
    ];
    let schema = Schema::from_bytes(blob).unwrap();

    let err = read(&schema, "Foo", &[]).unwrap_err();
    assert_eq!(err.to_string(), "program for Foo begins with type id Bar");
}

#[test]
fn unexpected_body_opcode() {
    let mut b = SchemaBuilder::new();
    let mut p = b.program("Odd");
    p.op(Opcode::Field);
    p.finish();
    let schema = b.build_schema().unwrap();

    let err = read(&schema, "Odd", &[]).unwrap_err();
    assert!(matches!(err, ParseError::UnknownOpcode { opcode: 25, .. }));
}

#[test]
fn short_read_is_eof() {
    let schema = pair_schema();
    let err = read(&schema, "Pair", &[1, 0, 0, 0, 2]).unwrap_err();
    assert_eq!(err.to_string(), "unexpected end of stream at offset 4");
}

fn flags_schema() -> Schema {
    let mut b = SchemaBuilder::new();
    let mut p = b.bitflags("Flags", Opcode::Byte);
    p.option("A", 0).option("B", 1).option("C", 4);
    p.finish();
    let mut p = b.enumeration("Mode", Opcode::UInt);
    p.option("Off", 0).option("On", 1).option("Alias", 1);
    p.finish();
    let mut p = b.compound("Holder");
    p.named_field("Flags", "F").named_field("Mode", "M");
    p.finish();
    b.build_schema().unwrap()
}

fn sym(schema: &Schema, name: &str) -> Symbol {
    schema.lookup(name).unwrap()
}

#[test]
fn bitflags_decode_set_bits() {
    let schema = flags_schema();
    let value = read(&schema, "Flags", &[3]).unwrap();

    assert_eq!(
        value,
        Value::Bitflags {
            raw_value: 3,
            symbolic_values: vec![sym(&schema, "A"), sym(&schema, "B")],
        }
    );
    assert_eq!(write(&schema, "Flags", &value).unwrap(), [3]);
}

#[test]
fn bitflags_keep_unknown_bits_on_write() {
    let schema = flags_schema();
    let value = Value::Bitflags {
        raw_value: 0x83,
        symbolic_values: vec![sym(&schema, "C")],
    };
    assert_eq!(write(&schema, "Flags", &value).unwrap(), [0x90]);
}

#[test]
fn enum_last_matching_option_wins() {
    let schema = flags_schema();
    let value = read(&schema, "Mode", &[1, 0, 0, 0]).unwrap();
    assert_eq!(
        value,
        Value::Enum {
            raw_value: 1,
            symbolic_value: sym(&schema, "Alias"),
        }
    );

    let unmatched = read(&schema, "Mode", &[9, 0, 0, 0]).unwrap();
    assert_eq!(
        unmatched,
        Value::Enum {
            raw_value: 9,
            symbolic_value: Symbol::NULL,
        }
    );
    assert_eq!(write(&schema, "Mode", &unmatched).unwrap(), [9, 0, 0, 0]);
}

#[test]
fn enum_symbol_overrides_raw_value_on_write() {
    let schema = flags_schema();
    let value = Value::Enum {
        raw_value: 0,
        symbolic_value: sym(&schema, "On"),
    };
    assert_eq!(write(&schema, "Mode", &value).unwrap(), [1, 0, 0, 0]);
}

#[test]
fn enum_fields_drive_conditions() {
    let mut b = SchemaBuilder::new();
    let mut p = b.enumeration("Mode", Opcode::Byte);
    p.option("Off", 0).option("On", 1);
    p.finish();
    let mut p = b.compound("Switch");
    p.named_field("Mode", "State");
    p.field_value("State").op(Opcode::Condition);
    p.field_of(Opcode::Byte, "Level");
    p.finish();
    let schema = b.build_schema().unwrap();

    let on = read(&schema, "Switch", &[1, 5]).unwrap();
    assert_eq!(uint(&schema, &on, "Level"), 5);

    let off = read(&schema, "Switch", &[0]).unwrap();
    assert_eq!(get(&schema, &off, "Level"), None);
}

#[test]
fn enum_in_compound_round_trip() {
    let schema = flags_schema();
    let bytes = [0x13, 1, 0, 0, 0];
    let value = read(&schema, "Holder", &bytes).unwrap();

    assert_eq!(
        get(&schema, &value, "F"),
        Some(&Value::Bitflags {
            raw_value: 0x13,
            symbolic_values: vec![sym(&schema, "A"), sym(&schema, "B"), sym(&schema, "C")],
        })
    );
    assert_eq!(write(&schema, "Holder", &value).unwrap(), bytes);
}

#[test]
fn stream_is_shared_between_values() {
    let schema = pair_schema();
    let bytes = [1, 0, 0, 0, 2, 0, 3, 0xAA, 9, 0, 0, 0, 8, 0, 7];

    let mut interp = Interpreter::new(&schema, SliceStream::new(&bytes));
    let pair = schema.lookup("Pair").unwrap();
    let first = interp.deserialize(pair, None).unwrap();
    assert_eq!(interp.stream_mut().read_u8().unwrap(), 0xAA);
    let second = interp.deserialize(pair, None).unwrap();

    assert_eq!(uint(&schema, &first, "C"), 3);
    assert_eq!(uint(&schema, &second, "A"), 9);
    assert_eq!(uint(&schema, &second, "C"), 7);
    assert_eq!(interp.position(), 15);
}
