//! Human-readable and JSON renderings of value trees.
//!
//! Text layout, one item per line, two spaces per nesting level:
//!
//! ```text
//! NIOBJECT:NiNode -> NiAVObject -> NiObjectNET -> NiObject
//!   Name = "Scene Root"
//!   Flags = 14
//!   Children = ARRAY
//!     REF<NiAVObject> 1
//!       NIOBJECT:NiTriShape -> ...
//! ```
//!
//! A resolved link prints its target block nested below it, the first time
//! that block is reached only.

use std::collections::HashSet;
use std::fmt::Write as _;

use nifparse_bytecode::Schema;
use nifparse_core::{Colors, Symbol};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::value::{BlockId, Dictionary, Link, Value};

/// Streaming pretty printer; keeps track of blocks already printed.
pub struct Printer<'a> {
    schema: &'a Schema,
    blocks: &'a [Value],
    colors: Colors,
    out: String,
    level: usize,
    in_line: bool,
    printed: HashSet<BlockId>,
}

impl<'a> Printer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            blocks: &[],
            colors: Colors::OFF,
            out: String::new(),
            level: 0,
            in_line: false,
            printed: HashSet::new(),
        }
    }

    /// Blocks that resolved links point into.
    pub fn blocks(mut self, blocks: &'a [Value]) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn colors(mut self, colors: Colors) -> Self {
        self.colors = colors;
        self
    }

    /// Output accumulated so far.
    pub fn finish(self) -> String {
        self.out
    }

    /// Mark a block as printed so links to it print only their header line.
    pub fn mark_printed(&mut self, id: BlockId) {
        self.printed.insert(id);
    }

    pub fn is_printed(&self, id: BlockId) -> bool {
        self.printed.contains(&id)
    }

    /// Print a heading line at the current level.
    pub fn heading(&mut self, text: &str) {
        let text = self.colors.paint(self.colors.blue, text);
        self.line(&text);
    }

    pub fn print(&mut self, value: &Value) {
        let c = self.colors;
        match value {
            Value::Null => self.line("NULL"),
            Value::UInt(v) => self.line(&c.paint(c.yellow, &v.to_string())),
            Value::Float(v) => self.line(&c.paint(c.yellow, &format!("{v:.6}"))),
            Value::Dictionary(dict) => self.print_dictionary(dict),
            Value::Array(items) => {
                self.line("ARRAY");
                self.level += 1;
                for item in items {
                    self.print(item);
                }
                self.level -= 1;
            }
            Value::ByteArray(bytes) => self.print_bytes(bytes),
            Value::String(bytes) => {
                let text = c.paint(c.green, &display_string(bytes));
                self.line(&format!("\"{text}\""));
            }
            Value::Enum {
                raw_value,
                symbolic_value,
            } => {
                let name = self.schema.name(*symbolic_value);
                self.line(&format!("ENUM[{raw_value}]:{}", c.paint(c.green, name)));
            }
            Value::Bitflags {
                raw_value,
                symbolic_values,
            } => {
                let mut text = format!("BITFLAGS[{raw_value}]: ");
                for &name in symbolic_values {
                    text.push_str(&c.paint(c.green, self.schema.name(name)));
                    text.push(' ');
                }
                self.line(&text);
            }
            Value::Reference(link) => self.print_link("REF", link),
            Value::Pointer(link) => self.print_link("PTR", link),
        }
    }

    fn print_dictionary(&mut self, dict: &Dictionary) {
        let c = self.colors;
        let mut text = String::from(if dict.is_ni_object {
            "NIOBJECT:"
        } else {
            "DICTIONARY:"
        });
        let chain: Vec<_> = dict
            .type_chain
            .iter()
            .map(|&ty| c.paint(c.blue, self.schema.name(ty)))
            .collect();
        text.push_str(&chain.join(" -> "));
        self.line(&text);

        self.level += 1;
        for (name, value) in sorted_fields(dict) {
            let key = c.paint(c.blue, self.schema.name(name));
            self.start_line();
            write!(self.out, "{key} = ").unwrap();
            self.print(value);
        }
        self.level -= 1;
    }

    fn print_bytes(&mut self, bytes: &[u8]) {
        self.line("BYTEARRAY");
        self.level += 1;
        for (index, chunk) in bytes.chunks(16).enumerate() {
            let mut text = format!("{:04X} ", index * 16);
            for byte in chunk {
                write!(text, "{byte:02X} ").unwrap();
            }
            for _ in chunk.len()..16 {
                text.push_str("   ");
            }
            text.push_str(" | ");
            text.extend(chunk.iter().map(|&b| {
                if (0x20..0x7F).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            }));
            self.line(&text);
        }
        self.level -= 1;
    }

    fn print_link(&mut self, tag: &str, link: &Link) {
        let c = self.colors;
        let ty = c.paint(c.blue, self.schema.name(link.declared_type));
        self.line(&format!("{tag}<{ty}> {}", link.target_index));

        let Some(id) = link.resolved else {
            return;
        };
        let Some(target) = self.blocks.get(id.index()) else {
            return;
        };
        if self.printed.insert(id) {
            self.level += 1;
            self.print(target);
            self.level -= 1;
        }
    }

    fn start_line(&mut self) {
        if !self.in_line {
            for _ in 0..self.level {
                self.out.push_str("  ");
            }
            self.in_line = true;
        }
    }

    /// Finish the current line with `text`.
    fn line(&mut self, text: &str) {
        self.start_line();
        self.out.push_str(text);
        self.out.push('\n');
        self.in_line = false;
    }
}

impl Value {
    /// Render this value alone; links print without their targets.
    pub fn format(&self, schema: &Schema, colors: Colors) -> String {
        let mut printer = Printer::new(schema).colors(colors);
        printer.print(self);
        printer.finish()
    }
}

/// Fields in symbol order, which is stable across runs of the same schema.
fn sorted_fields(dict: &Dictionary) -> Vec<(Symbol, &Value)> {
    let mut fields: Vec<_> = dict.fields.iter().map(|(&k, v)| (k, v)).collect();
    fields.sort_by_key(|(k, _)| *k);
    fields
}

/// String contents up to the first NUL.
fn display_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// One-line description used in trace output.
pub fn summarize(value: &Value, schema: &Schema) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Float(v) => format!("{v:.6}"),
        Value::Dictionary(dict) => format!("<{}>", schema.name(dict.type_name())),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::ByteArray(bytes) => format!("<{} bytes>", bytes.len()),
        Value::String(bytes) => format!("{:?}", display_string(bytes)),
        Value::Enum {
            raw_value,
            symbolic_value,
        } => format!("ENUM[{raw_value}]:{}", schema.name(*symbolic_value)),
        Value::Bitflags {
            raw_value,
            symbolic_values,
        } => {
            let names: Vec<_> = symbolic_values.iter().map(|&s| schema.name(s)).collect();
            format!("BITFLAGS[{raw_value}]: {}", names.join(" "))
        }
        Value::Reference(link) => {
            format!("REF<{}> {}", schema.name(link.declared_type), link.target_index)
        }
        Value::Pointer(link) => {
            format!("PTR<{}> {}", schema.name(link.declared_type), link.target_index)
        }
    }
}

/// Serializes a value with symbol names resolved through a schema.
pub struct ValueJson<'a> {
    value: &'a Value,
    schema: &'a Schema,
}

impl<'a> ValueJson<'a> {
    pub fn new(value: &'a Value, schema: &'a Schema) -> Self {
        Self { value, schema }
    }

    fn nested(&self, value: &'a Value) -> Self {
        Self::new(value, self.schema)
    }
}

impl Serialize for ValueJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let schema = self.schema;
        match self.value {
            Value::Null => serializer.serialize_unit(),
            Value::UInt(v) => serializer.serialize_u32(*v),
            Value::Float(v) => serializer.serialize_f32(*v),
            Value::Dictionary(dict) => {
                let mut map = serializer.serialize_map(Some(dict.fields.len() + 1))?;
                let chain: Vec<_> = dict.type_chain.iter().map(|&t| schema.name(t)).collect();
                map.serialize_entry("$type", &chain)?;
                for (name, value) in sorted_fields(dict) {
                    map.serialize_entry(schema.name(name), &self.nested(value))?;
                }
                map.end()
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&self.nested(item))?;
                }
                seq.end()
            }
            Value::ByteArray(bytes) => serializer.collect_seq(bytes),
            Value::String(bytes) => serializer.serialize_str(&display_string(bytes)),
            Value::Enum {
                raw_value,
                symbolic_value,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("raw", raw_value)?;
                let name = (!symbolic_value.is_null()).then(|| schema.name(*symbolic_value));
                map.serialize_entry("name", &name)?;
                map.end()
            }
            Value::Bitflags {
                raw_value,
                symbolic_values,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("raw", raw_value)?;
                let names: Vec<_> = symbolic_values.iter().map(|&s| schema.name(s)).collect();
                map.serialize_entry("flags", &names)?;
                map.end()
            }
            Value::Reference(link) | Value::Pointer(link) => {
                let tag = if matches!(self.value, Value::Reference(_)) {
                    "ref"
                } else {
                    "ptr"
                };
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(tag, &link.target_index)?;
                map.serialize_entry("type", schema.name(link.declared_type))?;
                map.end()
            }
        }
    }
}
