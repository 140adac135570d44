//! Schema execution engine.
//!
//! The interpreter runs a type program against a stream, accumulating a
//! [`TypeDescriptor`] per field and evaluating conditions on a `u32` stack.
//! Reads build a [`Value`] tree; writes consume one.

mod descriptor;
mod error;
mod interpreter;
mod link;
mod printer;
mod stack;
mod trace;
mod value;

#[cfg(test)]
mod interpreter_tests;

pub use descriptor::{TypeDescriptor, TypeKind, format_header_string, parse_header_string};
pub use error::ParseError;
pub use interpreter::{Interpreter, InterpreterBuilder, ParseLimits, ParseOptions};
pub use link::link_value;
pub use printer::{Printer, ValueJson, summarize};
pub use stack::EvalStack;
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use value::{BlockId, Dictionary, Link, Value};
