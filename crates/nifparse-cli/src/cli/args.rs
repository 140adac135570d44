//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` that can be composed into commands.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// NIF file to parse (positional).
pub fn file_arg() -> Arg {
    Arg::new("file")
        .value_name("FILE")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("NIF file to parse")
}

/// Compiled schema blob (--schema).
pub fn schema_arg() -> Arg {
    Arg::new("schema")
        .long("schema")
        .value_name("BLOB")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Compiled schema blob")
}

/// Restrict a dump to one type (--type).
pub fn type_arg() -> Arg {
    Arg::new("type")
        .long("type")
        .value_name("NAME")
        .help("Only disassemble this type")
}

/// Emit JSON instead of the text tree (--json).
pub fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the parsed file as JSON")
}

/// Trace schema execution (--trace).
pub fn trace_arg() -> Arg {
    Arg::new("trace")
        .long("trace")
        .action(ArgAction::SetTrue)
        .help("Print an execution trace before the result")
}

/// Verbosity level (-v).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Trace skipped fields and expression stack pushes")
}

/// Length-constant mode (--constant-lengths).
pub fn constant_lengths_arg() -> Arg {
    Arg::new("constant_lengths")
        .long("constant-lengths")
        .action(ArgAction::SetTrue)
        .help("Read every bool as 4 bytes regardless of file version")
}

/// Type program nesting limit (--recursion-limit).
pub fn recursion_limit_arg() -> Arg {
    Arg::new("recursion_limit")
        .long("recursion-limit")
        .value_name("N")
        .default_value("256")
        .value_parser(value_parser!(u32))
        .help("Maximum nesting of type programs")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}
