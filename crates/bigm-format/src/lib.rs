pub mod lexer;
pub mod parser;
pub mod writer;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::{LpInput, ParseError, Parser, parse_input, parse_reference};
pub use writer::write_reference;
