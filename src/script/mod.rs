//! Script engine for the Run button
//!
//! A small Python subset: ints, floats, strings, lists, dicts, functions
//! with defaults and closures, `if`/`while`/`for`, `try`/`except`, and the
//! common builtins. Programs are tokenized, parsed into an AST and executed
//! by a tree-walking interpreter.
//!
//! ## Architecture
//!
//! ```text
//! source → lexer::tokenize → parser::Parser → ast::Program
//!        → interpreter::Interpreter ⇄ host::ScriptHost (output, input, stop)
//! ```
//!
//! All values are `Rc`-based, so a program and its interpreter live on one
//! thread. The editor runs them on a worker thread and talks to it through
//! a [`ScriptHost`] implementation.

pub mod ast;
pub mod builtins;
pub mod error;
pub mod format;
pub mod host;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::Program;
pub use error::{ErrorKind, ScriptError, ScriptResult};
pub use host::{CaptureHost, ScriptHost};
pub use interpreter::{Interpreter, RECURSION_LIMIT};
pub use parser::parse_program;

/// Parse and execute `source` against `host`
pub fn run_source(source: &str, host: &mut dyn ScriptHost) -> ScriptResult<()> {
    let program = parse_program(source)?;
    run_program(&program, host)
}

/// Execute an already parsed program
pub fn run_program(program: &Program, host: &mut dyn ScriptHost) -> ScriptResult<()> {
    Interpreter::new(host).run(program)
}
