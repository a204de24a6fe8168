pub mod ast;
pub mod columns;
pub mod conversion;
pub mod error;
pub mod grammar;
pub mod parser;

pub use error::ParseError;
pub use parser::{parse_selection, parse_statement};
