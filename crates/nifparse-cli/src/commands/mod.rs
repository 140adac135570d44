pub mod dump;
pub mod parse;
pub mod schema_loader;
