//! Whole-file parsing: header, blocks, footer, then linking.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use nifparse_bytecode::{Schema, SchemaError};
use nifparse_core::Symbol;

use crate::engine::{
    BlockId, Dictionary, Interpreter, Link, NoopTracer, ParseError, ParseOptions, Tracer, Value,
    link_value,
};
use crate::stream::{DataStream, ReadStream, SliceStream};

/// A parsed NIF file. Blocks are addressed by their position.
#[derive(Clone, Debug, PartialEq)]
pub struct NifFile {
    header: Value,
    blocks: Vec<Value>,
    footer: Value,
}

impl NifFile {
    pub fn parse<S: DataStream>(
        schema: &Schema,
        stream: S,
        options: ParseOptions,
    ) -> Result<Self, ParseError> {
        Self::parse_with(schema, stream, options, &mut NoopTracer)
    }

    pub fn parse_with<S: DataStream, T: Tracer>(
        schema: &Schema,
        stream: S,
        options: ParseOptions,
        tracer: &mut T,
    ) -> Result<Self, ParseError> {
        let mut interp = Interpreter::builder(schema, stream)
            .options(options)
            .build();

        let mut header = interp.deserialize_with(schema.lookup("Header")?, None, tracer)?;
        let header_dict = header.as_dictionary().ok_or(ParseError::ValueKindMismatch {
            expected: "dictionary",
            found: header.kind_name(),
        })?;

        let block_count = field(schema, header_dict, "Num Blocks")?;
        let block_count = block_count
            .coerce_scalar()
            .ok_or(ParseError::ValueKindMismatch {
                expected: "uint",
                found: block_count.kind_name(),
            })? as usize;

        let type_index = schema
            .try_lookup("Block Type Index")
            .and_then(|sym| header_dict.get(sym));
        let mut blocks = Vec::with_capacity(block_count.min(4096));
        match type_index {
            Some(type_index) => {
                let type_index = array(type_index)?;
                let types = array(field(schema, header_dict, "Block Types")?)?;
                let sizes = array(field(schema, header_dict, "Block Size")?)?;
                check_count(block_count, type_index.len())?;
                check_count(block_count, sizes.len())?;

                for index in 0..block_count {
                    let entry = scalar(&type_index[index])?;
                    let name = types.get(entry as usize).ok_or(
                        ParseError::BlockTypeIndexOutOfRange {
                            index,
                            type_index: entry,
                            count: types.len(),
                        },
                    )?;
                    let ty = block_type(schema, name)?;
                    let expected = scalar(&sizes[index])?;

                    let start = interp.position();
                    tracer.trace_block(index, ty, start);
                    let block = interp.deserialize_with(ty, Some(header_dict), tracer)?;
                    let end = interp.position();
                    tracer.trace_block_end(index, end);

                    if end - start != u64::from(expected) {
                        return Err(ParseError::BlockLengthMismatch {
                            index,
                            type_name: schema.name(ty).to_string(),
                            expected,
                            actual: end - start,
                        });
                    }
                    blocks.push(block);
                }
            }
            None => {
                // Older files name each block's type inline.
                let sized_string = schema.lookup("SizedString")?;
                for index in 0..block_count {
                    let name = interp.deserialize_with(sized_string, Some(header_dict), tracer)?;
                    let ty = block_type(schema, &name)?;

                    let start = interp.position();
                    tracer.trace_block(index, ty, start);
                    let block = interp.deserialize_with(ty, Some(header_dict), tracer)?;
                    tracer.trace_block_end(index, interp.position());
                    blocks.push(block);
                }
            }
        }

        let mut footer = interp.deserialize_with(schema.lookup("Footer")?, Some(header_dict), tracer)?;

        link_value(&mut header, blocks.len())?;
        let count = blocks.len();
        for block in &mut blocks {
            link_value(block, count)?;
        }
        link_value(&mut footer, count)?;

        Ok(Self {
            header,
            blocks,
            footer,
        })
    }

    pub fn from_bytes(
        schema: &Schema,
        bytes: &[u8],
        options: ParseOptions,
    ) -> Result<Self, ParseError> {
        Self::parse(schema, SliceStream::new(bytes), options)
    }

    pub fn from_path(
        schema: &Schema,
        path: impl AsRef<Path>,
        options: ParseOptions,
    ) -> Result<Self, ParseError> {
        let file = File::open(path)?;
        Self::parse(schema, ReadStream::new(BufReader::new(file)), options)
    }

    pub fn header(&self) -> &Value {
        &self.header
    }

    pub fn blocks(&self) -> &[Value] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Value> {
        self.blocks.get(id.index())
    }

    pub fn footer(&self) -> &Value {
        &self.footer
    }

    /// Block a link resolved to.
    pub fn resolve(&self, link: &Link) -> Option<&Value> {
        link.resolved.and_then(|id| self.block(id))
    }

    /// Resolved entries of the footer's `Roots` list.
    pub fn roots(&self, schema: &Schema) -> Vec<BlockId> {
        let Some(roots) = schema
            .try_lookup("Roots")
            .and_then(|sym| self.footer.as_dictionary()?.get(sym))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };
        roots
            .iter()
            .filter_map(|v| v.as_link()?.resolved)
            .collect()
    }
}

fn field<'d>(schema: &Schema, dict: &'d Dictionary, name: &str) -> Result<&'d Value, ParseError> {
    schema
        .try_lookup(name)
        .and_then(|sym| dict.get(sym))
        .ok_or_else(|| ParseError::MissingRequiredField(name.to_string()))
}

fn array(value: &Value) -> Result<&[Value], ParseError> {
    value.as_array().ok_or(ParseError::ValueKindMismatch {
        expected: "array",
        found: value.kind_name(),
    })
}

fn scalar(value: &Value) -> Result<u32, ParseError> {
    value.coerce_scalar().ok_or(ParseError::ValueKindMismatch {
        expected: "uint",
        found: value.kind_name(),
    })
}

fn check_count(block_count: usize, found: usize) -> Result<(), ParseError> {
    if found < block_count {
        return Err(ParseError::ArrayLengthMismatch {
            expected: block_count as u32,
            found,
        });
    }
    Ok(())
}

/// Block type named by a string or a `SizedString` dictionary.
fn block_type(schema: &Schema, name: &Value) -> Result<Symbol, ParseError> {
    let value = match name {
        Value::Dictionary(dict) => field(schema, dict, "Value")?,
        other => other,
    };
    let bytes = value.as_bytes().ok_or(ParseError::ValueKindMismatch {
        expected: "string",
        found: value.kind_name(),
    })?;
    let name = String::from_utf8_lossy(bytes);
    let ty = schema.lookup(&name)?;
    if !schema.is_type_name(ty) {
        return Err(SchemaError::NotATypeName(name.into_owned()).into());
    }
    Ok(ty)
}
