//! Command builders for the CLI.
//!
//! Each command is built using the shared arg builders from `args.rs`.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("nifparse")
        .about("Read NIF files through a compiled bytecode schema")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(parse_command())
        .subcommand(dump_command())
}

/// Parse a NIF file and print its header, blocks and footer.
pub fn parse_command() -> Command {
    Command::new("parse")
        .about("Parse a NIF file")
        .override_usage(
            "\
  nifparse parse <FILE> --schema <BLOB>
  nifparse parse <FILE> --schema <BLOB> --json
  nifparse parse <FILE> --schema <BLOB> --trace [-v]",
        )
        .after_help(
            r#"EXAMPLES:
  nifparse parse mesh.nif --schema nif.bin            # text tree
  nifparse parse mesh.nif --schema nif.bin --json     # JSON
  nifparse parse mesh.nif --schema nif.bin --trace -v # trace every field and push"#,
        )
        .arg(file_arg())
        .arg(schema_arg())
        .arg(json_arg())
        .arg(trace_arg())
        .arg(verbose_arg())
        .arg(constant_lengths_arg())
        .arg(recursion_limit_arg())
        .arg(color_arg())
}

/// Disassemble a schema blob.
pub fn dump_command() -> Command {
    Command::new("dump")
        .about("Show schema bytecode")
        .override_usage(
            "\
  nifparse dump --schema <BLOB>
  nifparse dump --schema <BLOB> --type <NAME>",
        )
        .after_help(
            r#"EXAMPLES:
  nifparse dump --schema nif.bin                # symbols, type index, programs
  nifparse dump --schema nif.bin --type NiNode  # one type program"#,
        )
        .arg(schema_arg())
        .arg(type_arg())
        .arg(color_arg())
}
