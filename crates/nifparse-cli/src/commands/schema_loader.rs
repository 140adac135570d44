//! Loading the schema blob shared by every command.

use std::path::Path;

use nifparse_bytecode::Schema;

/// Load a schema blob, or exit with an error message.
pub fn load_schema(path: &Path) -> Schema {
    Schema::from_path(path).unwrap_or_else(|e| {
        eprintln!("error: failed to load schema '{}': {}", path.display(), e);
        std::process::exit(1);
    })
}
