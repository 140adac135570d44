//! Tracing infrastructure for debugging schema execution.
//!
//! # Design: Zero-Cost Abstraction
//!
//! The interpreter is generic over [`Tracer`]. With [`NoopTracer`] every
//! method is an `#[inline(always)]` empty function, so the calls and their
//! arguments compile away. [`PrintTracer`] renders an indented log of type
//! programs, fields, enum decodes and blocks.

use nifparse_bytecode::{Opcode, Schema};
use nifparse_core::{Colors, Symbol};

use super::printer::summarize;
use super::value::Value;

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Types, fields read, enum decodes, blocks.
    #[default]
    Default,
    /// Also skipped fields and every value pushed on the expression stack.
    Verbose,
}

/// Tracer trait for interpreter instrumentation.
///
/// Methods receive raw data (symbols, values, stream positions). Name
/// resolution and formatting happen in the implementation.
pub trait Tracer {
    /// Called when a type program starts executing.
    fn trace_enter_type(&mut self, ty: Symbol, position: u64);

    /// Called when a type program reaches `END`.
    fn trace_exit_type(&mut self, ty: Symbol, position: u64);

    /// Called before a compound runs its base type against the same dictionary.
    fn trace_inherit(&mut self, base: Symbol);

    /// Called for each `FIELD`; `value` is `None` when the condition skipped it.
    fn trace_field(&mut self, name: Symbol, value: Option<&Value>);

    /// Called after an expression opcode pushed `value`.
    fn trace_push(&mut self, opcode: Opcode, value: u32);

    /// Called after an enum or bitflags value was decoded or encoded.
    fn trace_enum(&mut self, ty: Symbol, value: &Value);

    /// Called before a top-level block is read.
    fn trace_block(&mut self, index: usize, ty: Symbol, position: u64);

    /// Called after a top-level block is read.
    fn trace_block_end(&mut self, index: usize, position: u64);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_enter_type(&mut self, _ty: Symbol, _position: u64) {}

    #[inline(always)]
    fn trace_exit_type(&mut self, _ty: Symbol, _position: u64) {}

    #[inline(always)]
    fn trace_inherit(&mut self, _base: Symbol) {}

    #[inline(always)]
    fn trace_field(&mut self, _name: Symbol, _value: Option<&Value>) {}

    #[inline(always)]
    fn trace_push(&mut self, _opcode: Opcode, _value: u32) {}

    #[inline(always)]
    fn trace_enum(&mut self, _ty: Symbol, _value: &Value) {}

    #[inline(always)]
    fn trace_block(&mut self, _index: usize, _ty: Symbol, _position: u64) {}

    #[inline(always)]
    fn trace_block_end(&mut self, _index: usize, _position: u64) {}
}

/// Tracer that collects an execution log for debugging.
pub struct PrintTracer<'s> {
    schema: &'s Schema,
    verbosity: Verbosity,
    colors: Colors,
    lines: Vec<String>,
    /// Nesting depth of type programs.
    depth: usize,
    /// Start position of the block being read.
    block_start: u64,
}

impl<'s> PrintTracer<'s> {
    pub fn new(schema: &'s Schema, verbosity: Verbosity, colors: Colors) -> Self {
        Self {
            schema,
            verbosity,
            colors,
            lines: Vec::new(),
            depth: 0,
            block_start: 0,
        }
    }

    /// Print all trace lines to stdout.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{}", line);
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with newlines.
    pub fn output(&self) -> String {
        self.lines.join("\n")
    }

    fn push_line(&mut self, content: String) {
        let indent = "  ".repeat(self.depth);
        self.lines.push(format!("{indent}{content}"));
    }

    fn type_name(&self, ty: Symbol) -> String {
        let c = &self.colors;
        format!("{}{}{}", c.blue, self.schema.name(ty), c.reset)
    }
}

impl Tracer for PrintTracer<'_> {
    fn trace_enter_type(&mut self, ty: Symbol, position: u64) {
        let c = self.colors;
        let line = format!("{} {}@{position}{}", self.type_name(ty), c.dim, c.reset);
        self.push_line(line);
        self.depth += 1;
    }

    fn trace_exit_type(&mut self, ty: Symbol, position: u64) {
        self.depth = self.depth.saturating_sub(1);
        // Only verbose output closes each type explicitly.
        if self.verbosity == Verbosity::Default {
            return;
        }
        let c = self.colors;
        let line = format!(
            "{}end {}{}@{position}{}",
            c.dim,
            self.type_name(ty),
            c.dim,
            c.reset
        );
        self.push_line(line);
    }

    fn trace_inherit(&mut self, base: Symbol) {
        let line = format!("inherit {}", self.type_name(base));
        self.push_line(line);
    }

    fn trace_field(&mut self, name: Symbol, value: Option<&Value>) {
        let c = self.colors;
        let name = self.schema.name(name);
        match value {
            Some(value) => {
                let summary = summarize(value, self.schema);
                self.push_line(format!("{name} = {}{summary}{}", c.yellow, c.reset));
            }
            None => {
                if self.verbosity == Verbosity::Default {
                    return;
                }
                self.push_line(format!("{}{name} (skipped){}", c.dim, c.reset));
            }
        }
    }

    fn trace_push(&mut self, opcode: Opcode, value: u32) {
        if self.verbosity == Verbosity::Default {
            return;
        }
        let c = self.colors;
        self.push_line(format!(
            "{}{} -> {value}{}",
            c.dim,
            opcode.mnemonic(),
            c.reset
        ));
    }

    fn trace_enum(&mut self, ty: Symbol, value: &Value) {
        let summary = summarize(value, self.schema);
        let line = format!("{} {summary}", self.type_name(ty));
        self.push_line(line);
    }

    fn trace_block(&mut self, index: usize, ty: Symbol, position: u64) {
        self.block_start = position;
        let line = format!("block {index}: {}", self.type_name(ty));
        self.push_line(line);
        self.depth += 1;
    }

    fn trace_block_end(&mut self, index: usize, position: u64) {
        self.depth = self.depth.saturating_sub(1);
        let c = self.colors;
        let start = self.block_start;
        self.push_line(format!(
            "{}block {index} ends, bytes {start}..{position} ({}){}",
            c.dim,
            position - start,
            c.reset
        ));
    }
}
