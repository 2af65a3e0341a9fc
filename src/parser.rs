//! Single-pass parser and optimizer.
//!
//! Turns source text into a [`Program`] in one left-to-right scan:
//! - runs of `>`, `<`, `+`, `-` collapse into one instruction with a repeat
//!   count. Comment text and line breaks do not break a run; any other
//!   command does.
//! - loop brackets are matched with a stack of pending `[` indices, and
//!   each `]` has its jump targets back-patched as soon as its successor is
//!   known, so no second resolution pass is needed.

use tracing::{debug, trace};

use crate::error::{Error, Position, Result};
use crate::instruction::{InstrId, Instruction, InstructionKind, Program};

/// Parse `source` into an optimized program.
///
/// Fails with [`Error::UnmatchedLoopEnd`] at the first `]` with no pending
/// `[`, or [`Error::UnclosedLoopStart`] at the end of input if any `[` is
/// left open. Nothing allocated for a failed parse outlives the call.
pub fn parse(source: &str) -> Result<Program> {
    let mut builder = Builder::default();
    for ch in source.chars() {
        builder.feed(ch)?;
    }
    let program = builder.finish()?;
    debug!(
        source_chars = source.chars().count(),
        instructions = program.len(),
        "parsed program"
    );
    Ok(program)
}

#[derive(Debug)]
struct Builder {
    instructions: Vec<Instruction>,
    // Pending `[` instructions, innermost last.
    brackets: Vec<InstrId>,
    // Kind of the last command character seen; comments don't reset it.
    prev_kind: Option<InstructionKind>,
    // A `]` whose targets are fixed once the next instruction is known.
    unpatched_end: Option<InstrId>,
    line: usize,
    column: usize,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            instructions: Vec::new(),
            brackets: Vec::new(),
            prev_kind: None,
            unpatched_end: None,
            line: 1,
            column: 0,
        }
    }
}

impl Builder {
    fn feed(&mut self, ch: char) -> Result<()> {
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
            return Ok(());
        }
        self.column += 1;

        let Some(kind) = InstructionKind::from_char(ch) else {
            return Ok(());
        };
        let position = Position::new(self.line, self.column);

        if kind.is_mergeable() && self.prev_kind == Some(kind) {
            if let Some(last) = self.instructions.last_mut() {
                last.repeat += 1;
                return Ok(());
            }
        }

        let id = self.instructions.len();
        let mut instr = Instruction::new(kind, position);
        match kind {
            InstructionKind::LoopStart => self.brackets.push(id),
            InstructionKind::LoopEnd => {
                let Some(open) = self.brackets.pop() else {
                    debug!(%position, "unmatched loop end");
                    return Err(Error::UnmatchedLoopEnd { position });
                };
                instr.jump_target = Some(open);
            }
            _ => {}
        }

        self.back_patch(Some(id));
        if kind == InstructionKind::LoopEnd {
            self.unpatched_end = Some(id);
        }
        self.instructions.push(instr);
        self.prev_kind = Some(kind);
        Ok(())
    }

    /// Resolve the pending `]` now that its successor (`next`) is known.
    ///
    /// The matching `[` gets `next` (where to go when the loop is skipped),
    /// the `]` gets the first instruction of the body.
    fn back_patch(&mut self, next: Option<InstrId>) {
        let Some(end) = self.unpatched_end.take() else {
            return;
        };
        let Some(start) = self.instructions[end].jump_target else {
            return;
        };
        self.instructions[start].jump_target = next;
        self.instructions[end].jump_target = Some(start + 1);
        trace!(start, end, ?next, "back-patched loop");
    }

    fn finish(mut self) -> Result<Program> {
        if !self.brackets.is_empty() {
            let position = Position::new(self.line, self.column.max(1));
            debug!(%position, open = self.brackets.len(), "unclosed loop start");
            return Err(Error::UnclosedLoopStart { position });
        }
        self.back_patch(None);
        Ok(Program::from_instructions(self.instructions))
    }
}
