//! Parse a NIF file and print it.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use nifparse_bytecode::Schema;
use nifparse_core::Colors;
use nifparse_vm::{
    BlockId, NifFile, NoopTracer, ParseLimits, ParseOptions, PrintTracer, Printer, ReadStream,
    Tracer, ValueJson, Verbosity,
};

use super::schema_loader::load_schema;

pub struct ParseArgs {
    pub file: PathBuf,
    pub schema: PathBuf,
    pub json: bool,
    pub trace: bool,
    pub verbosity: Verbosity,
    pub constant_lengths: bool,
    pub recursion_limit: u32,
    pub color: bool,
}

pub fn run(args: ParseArgs) {
    let schema = load_schema(&args.schema);
    let colors = Colors::new(args.color);
    let options = ParseOptions::new()
        .limits(ParseLimits::new().recursion_limit(args.recursion_limit))
        .constant_lengths(args.constant_lengths);

    let nif = if args.trace {
        let mut tracer = PrintTracer::new(&schema, args.verbosity, colors);
        let result = parse_file(&schema, &args, options, &mut tracer);
        tracer.print();
        println!("{}---{}", colors.dim, colors.reset);
        result
    } else {
        parse_file(&schema, &args, options, &mut NoopTracer)
    };

    let nif = nif.unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(1);
    });

    if args.json {
        print_json(&nif, &schema);
    } else {
        print!("{}", render(&nif, &schema, colors));
    }
}

fn parse_file<T: Tracer>(
    schema: &Schema,
    args: &ParseArgs,
    options: ParseOptions,
    tracer: &mut T,
) -> Result<NifFile, String> {
    let file = File::open(&args.file)
        .map_err(|e| format!("failed to read '{}': {}", args.file.display(), e))?;
    let stream = ReadStream::new(BufReader::new(file));
    NifFile::parse_with(schema, stream, options, tracer).map_err(|e| e.to_string())
}

/// Header, then every block not already shown under a link, then footer.
fn render(nif: &NifFile, schema: &Schema, colors: Colors) -> String {
    let mut printer = Printer::new(schema).blocks(nif.blocks()).colors(colors);

    printer.heading("header");
    printer.print(nif.header());

    for (index, block) in nif.blocks().iter().enumerate() {
        let id = BlockId(index as u32);
        if printer.is_printed(id) {
            continue;
        }
        printer.mark_printed(id);
        printer.heading(&format!("block {index}"));
        printer.print(block);
    }

    printer.heading("footer");
    printer.print(nif.footer());
    printer.finish()
}

fn print_json(nif: &NifFile, schema: &Schema) {
    let blocks: Vec<_> = nif
        .blocks()
        .iter()
        .map(|block| ValueJson::new(block, schema))
        .collect();
    let document = serde_json::json!({
        "header": ValueJson::new(nif.header(), schema),
        "blocks": blocks,
        "footer": ValueJson::new(nif.footer(), schema),
    });
    match serde_json::to_string_pretty(&document) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
