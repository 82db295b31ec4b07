//! Readers for patch configuration documents.

pub mod patch_xml;

pub use patch_xml::{ParseError, ParseResult, parse_file, parse_str};
