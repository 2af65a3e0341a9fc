//! An optimizing Brainfuck interpreter library.
//!
//! Source text is compiled once into a [`Program`] and then executed
//! against a [`Machine`] (a fixed-size tape of bytes and a data pointer).
//!
//! Features and behaviors:
//! - Runs of `>`, `<`, `+`, `-` are merged into single instructions, even
//!   across comments and line breaks.
//! - Loop targets are resolved while parsing; execution never scans for a
//!   matching bracket.
//! - Strict pointer bounds: moving left of cell 0 or past the last cell is a
//!   fault reported with its line and column.
//! - Cells wrap around on overflow and underflow.
//! - Output `.` writes one byte to a caller-supplied [`std::io::Write`].
//! - Input `,` reads from an optional pre-supplied byte buffer. Without one
//!   the cell is left unchanged; once the buffer is exhausted the final byte
//!   is read again on every `,`.
//! - Any character outside `><+-.,[]` is a comment.
//!
//! Quick start:
//!
//! ```
//! use fooked::{execute, parse, Machine};
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let program = parse(code).expect("program should parse");
//! let mut machine = Machine::new(30_000, None);
//! let mut out = Vec::new();
//! execute(&program, &mut machine, &mut out).expect("program should run");
//! assert_eq!(out, b"Hello World!\n");
//! ```

pub mod cli_util;
pub mod config;
pub mod engine;
pub mod error;
pub mod instruction;
pub mod logging;
pub mod machine;
pub mod parser;
pub mod repl;
mod theme;

pub use engine::{execute, execute_traced};
pub use error::{Error, Position, Result, StatusKind};
pub use instruction::{InstrId, Instruction, InstructionKind, Program};
pub use machine::Machine;
pub use parser::parse;

/// Tape size used when neither the command line nor the config file sets one.
pub const DEFAULT_MEM_SIZE: usize = 30_000;

/// Parse `source` and run it against `machine` in one call.
pub fn run_source<W>(source: &str, machine: &mut Machine, output: &mut W) -> Result<()>
where
    W: std::io::Write + ?Sized,
{
    let program = parse(source)?;
    execute(&program, machine, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_source_reports_parse_errors_before_running() {
        let mut machine = Machine::new(4, None);
        let mut out = Vec::new();
        let result = run_source("+.]", &mut machine, &mut out);
        assert!(matches!(result, Err(Error::UnmatchedLoopEnd { .. })));
        assert!(out.is_empty());
        assert_eq!(machine.tape()[0], 0);
    }

    #[test]
    fn machine_state_persists_between_runs() {
        let mut machine = Machine::new(4, None);
        let mut out = Vec::new();
        run_source("+++>", &mut machine, &mut out).unwrap();
        run_source("++<.", &mut machine, &mut out).unwrap();
        assert_eq!(out, vec![3]);
        assert_eq!(machine.tape()[1], 2);
    }
}
