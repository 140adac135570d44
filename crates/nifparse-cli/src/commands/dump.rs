use std::path::PathBuf;

use nifparse_bytecode::{dump, dump_type};
use nifparse_core::Colors;

use super::schema_loader::load_schema;

pub struct DumpArgs {
    pub schema: PathBuf,
    pub type_name: Option<String>,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    let schema = load_schema(&args.schema);
    let colors = Colors::new(args.color);

    let Some(name) = args.type_name else {
        print!("{}", dump(&schema, colors));
        return;
    };

    let ty = match schema.lookup(&name) {
        Ok(ty) if schema.is_type_name(ty) => ty,
        _ => {
            eprintln!("error: '{}' is not a type in this schema", name);
            std::process::exit(1);
        }
    };
    print!("{}", dump_type(&schema, ty, colors));
}
