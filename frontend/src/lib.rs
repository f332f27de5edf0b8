//! Boundary contract with the fu compiler front-end.
//!
//! The front-end itself (lexer, parser, symbol table, type resolution) is an
//! external collaborator. This crate fixes the narrow contract it is driven
//! through:
//!
//! ```text
//! FrontEnd::new_system()   once per session      -> System (built-ins)
//! FrontEnd::new_program()  once per parse        -> Program
//! ParseContext::new(&mut system, program)        parent == system
//! Parser::new(front_end, sink, context).parse(filename, bytes, len)
//!     -> ErrorSink::report(..) zero or more times, synchronously
//! ```
//!
//! [`CommandFrontEnd`] implements the contract on top of an external
//! compiler executable.

mod command;
mod parser;
mod sink;

pub use command::{CommandFrontEnd, FrontEndConfig, FrontEndError, ReportLine, Toolchain};
pub use parser::{FrontEnd, ParseContext, Parser};
pub use sink::ErrorSink;
