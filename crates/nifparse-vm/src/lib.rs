//! Runtime for reading and writing NIF files through a bytecode schema.
//!
//! The [`Interpreter`] executes schema type programs against a
//! [`DataStream`], producing [`Value`] trees. [`NifFile`] drives a whole file:
//! header, blocks, footer, then reference linking.

pub mod engine;
mod file;
pub mod stream;


// Re-export commonly used items at crate root
pub use engine::{
    BlockId, Dictionary, Interpreter, InterpreterBuilder, Link, NoopTracer, ParseError,
    ParseLimits, ParseOptions, PrintTracer, Printer, Tracer, TypeDescriptor, TypeKind, Value,
    ValueJson, Verbosity, link_value,
};
pub use file::NifFile;
pub use stream::{DataStream, ReadStream, SliceStream, VecStream, WriteStream};
