//! Decoded instructions and the arena that owns them.

use std::fmt;

use crate::error::Position;

/// Index of an instruction inside its [`Program`].
pub type InstrId = usize;

/// The eight operations of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    MoveRight,
    MoveLeft,
    Increment,
    Decrement,
    Output,
    Input,
    LoopStart,
    LoopEnd,
}

impl InstructionKind {
    /// Map a source character to its operation; anything else is a comment.
    pub fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            '>' => InstructionKind::MoveRight,
            '<' => InstructionKind::MoveLeft,
            '+' => InstructionKind::Increment,
            '-' => InstructionKind::Decrement,
            '.' => InstructionKind::Output,
            ',' => InstructionKind::Input,
            '[' => InstructionKind::LoopStart,
            ']' => InstructionKind::LoopEnd,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            InstructionKind::MoveRight => '>',
            InstructionKind::MoveLeft => '<',
            InstructionKind::Increment => '+',
            InstructionKind::Decrement => '-',
            InstructionKind::Output => '.',
            InstructionKind::Input => ',',
            InstructionKind::LoopStart => '[',
            InstructionKind::LoopEnd => ']',
        }
    }

    /// Runs of these collapse into a single instruction with a repeat count.
    pub fn is_mergeable(self) -> bool {
        matches!(
            self,
            InstructionKind::MoveRight
                | InstructionKind::MoveLeft
                | InstructionKind::Increment
                | InstructionKind::Decrement
        )
    }
}

/// A single decoded operation.
///
/// `repeat` is the run length for mergeable kinds, 1 for I/O and 0 for loop
/// brackets. `jump_target` is only set on loop brackets:
/// - on `LoopStart`, where to resume when the loop is skipped (absent when
///   the loop is the last thing in the program);
/// - on `LoopEnd`, the first instruction of the loop body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub kind: InstructionKind,
    pub repeat: usize,
    pub position: Position,
    pub jump_target: Option<InstrId>,
}

impl Instruction {
    pub fn new(kind: InstructionKind, position: Position) -> Self {
        let repeat = match kind {
            InstructionKind::LoopStart | InstructionKind::LoopEnd => 0,
            _ => 1,
        };
        Self { kind, repeat, position, jump_target: None }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_char())?;
        if self.kind.is_mergeable() && self.repeat > 1 {
            write!(f, "x{}", self.repeat)?;
        }
        match (self.kind, self.jump_target) {
            (InstructionKind::LoopStart | InstructionKind::LoopEnd, Some(t)) => write!(f, " -> {t}"),
            (InstructionKind::LoopStart, None) => write!(f, " -> end"),
            _ => Ok(()),
        }
    }
}

/// An owned, parsed program.
///
/// Instructions live in one contiguous arena in program order, so the
/// successor of instruction `i` is `i + 1`. Jump targets are indices into
/// the same arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub(crate) fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The first instruction, if any.
    pub fn root(&self) -> Option<InstrId> {
        if self.instructions.is_empty() { None } else { Some(0) }
    }

    pub fn get(&self, id: InstrId) -> Option<&Instruction> {
        self.instructions.get(id)
    }

    /// The instruction following `id` in program order.
    pub fn next(&self, id: InstrId) -> Option<InstrId> {
        let next = id + 1;
        (next < self.instructions.len()).then_some(next)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instr) in self.instructions.iter().enumerate() {
            let loc = format!("{}:{}", instr.position.line, instr.position.column);
            writeln!(f, "{i:>4}  {loc:<8} {instr}")?;
        }
        Ok(())
    }
}
