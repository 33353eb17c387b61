//! Parsers for the different sample-set file formats.

pub mod parser;
pub use parser::FormatParser;

pub mod ron_format;
pub use ron_format::RonFormatParser;
