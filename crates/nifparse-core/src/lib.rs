#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures shared by the nifparse crates.
//!
//! - [`Symbol`] / [`Interner`]: compact integer handles for schema strings
//!   (type names, field names, enum option names).
//! - [`Colors`]: ANSI palette used by dumps, printers and tracers.

mod colors;
mod interner;

#[cfg(test)]
mod colors_tests;
#[cfg(test)]
mod interner_tests;

pub use colors::Colors;
pub use interner::{Interner, Symbol};
