//! OCCI text rendering: lexer and parser for the four header grammars,
//! payload splitting, binding of parsed records onto the model, and the
//! renderers that produce the same text back.

pub mod bind;
pub mod document;
pub mod lexer;
pub mod parser;
pub mod record;
pub mod render;

pub use document::{LineError, ParsedText, parse_headers, parse_text};
pub use lexer::{LexError, Lexer, Token, TokenKind, tokenize};
pub use parser::{
    ParseError, Parser, Statement, parse_category, parse_link, parse_statement,
    parse_x_occi_attribute, parse_x_occi_location,
};
pub use record::{Number, Record, Value};
pub use render::Rendering;
