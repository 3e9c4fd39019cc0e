pub mod assembler;
pub mod config;
pub mod error;
pub mod fsm;
pub mod label;
pub mod lexer;
pub mod memory;
pub mod parser;
pub mod token;
pub mod util;

pub use assembler::{assemble_str, AsmOptions, Assembler, Program};
pub use config::{load_binary, write_binary, PipelineSettings, RunConfig};
pub use error::{AsmError, Error, ErrorKind};
pub use label::Labels;
pub use lexer::{Lexer, LexerOptions, LineLexer};
pub use memory::{Endian, MemSegment, MemoryBuffer};
pub use token::{Pos, Token, TokenKind};
pub use util::print_dump;
