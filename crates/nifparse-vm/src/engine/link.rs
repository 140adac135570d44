//! Resolution of block references after all blocks are read.

use super::error::ParseError;
use super::value::{BlockId, Link, Value};

/// Resolve every reference and pointer inside `value` against `block_count` blocks.
///
/// A negative index is a null link. Any other index must name an existing block.
pub fn link_value(value: &mut Value, block_count: usize) -> Result<(), ParseError> {
    match value {
        Value::Reference(link) | Value::Pointer(link) => resolve(link, block_count),
        Value::Dictionary(dict) => {
            for field in dict.fields.values_mut() {
                link_value(field, block_count)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                link_value(item, block_count)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn resolve(link: &mut Link, block_count: usize) -> Result<(), ParseError> {
    if link.target_index < 0 {
        link.resolved = None;
        return Ok(());
    }
    let index = link.target_index as usize;
    if index >= block_count {
        return Err(ParseError::DanglingReference {
            index: link.target_index,
            block_count,
        });
    }
    link.resolved = Some(BlockId(index as u32));
    Ok(())
}
