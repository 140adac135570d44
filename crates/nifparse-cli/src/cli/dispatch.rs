//! Dispatch logic: extract params from ArgMatches and convert to command args.

use std::path::PathBuf;

use clap::ArgMatches;
use nifparse_vm::Verbosity;

use super::ColorChoice;
use crate::commands::dump::DumpArgs;
use crate::commands::parse::ParseArgs;

pub struct ParseParams {
    pub file: PathBuf,
    pub schema: PathBuf,
    pub json: bool,
    pub trace: bool,
    pub verbose: u8,
    pub constant_lengths: bool,
    pub recursion_limit: u32,
    pub color: ColorChoice,
}

impl ParseParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            file: required_path(m, "file"),
            schema: required_path(m, "schema"),
            json: m.get_flag("json"),
            trace: m.get_flag("trace"),
            verbose: m.get_count("verbose"),
            constant_lengths: m.get_flag("constant_lengths"),
            recursion_limit: m.get_one::<u32>("recursion_limit").copied().unwrap_or(256),
            color: parse_color(m),
        }
    }
}

impl From<ParseParams> for ParseArgs {
    fn from(p: ParseParams) -> Self {
        Self {
            file: p.file,
            schema: p.schema,
            json: p.json,
            trace: p.trace,
            verbosity: verbosity(p.verbose),
            constant_lengths: p.constant_lengths,
            recursion_limit: p.recursion_limit,
            color: p.color.should_colorize(),
        }
    }
}

pub struct DumpParams {
    pub schema: PathBuf,
    pub type_name: Option<String>,
    pub color: ColorChoice,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            schema: required_path(m, "schema"),
            type_name: m.get_one::<String>("type").cloned(),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            schema: p.schema,
            type_name: p.type_name,
            color: p.color.should_colorize(),
        }
    }
}

/// Required args are enforced by clap; an absent one yields an empty path.
fn required_path(m: &ArgMatches, id: &str) -> PathBuf {
    m.get_one::<PathBuf>(id).cloned().unwrap_or_default()
}

fn verbosity(count: u8) -> Verbosity {
    if count > 0 {
        Verbosity::Verbose
    } else {
        Verbosity::Default
    }
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
