//! Execution engine.
//!
//! Walks a parsed [`Program`] against a [`Machine`]:
//! - `>`/`<` move the pointer by the run length and fault instead of
//!   leaving the tape;
//! - `+`/`-` use 8-bit wrapping arithmetic;
//! - `.` writes one byte to the caller's sink;
//! - `,` copies the next input byte, or leaves the cell alone when no input
//!   is configured;
//! - loop brackets jump straight to their pre-resolved targets.

use std::io::Write;

use tracing::debug;

use crate::error::{Error, Result};
use crate::instruction::{InstructionKind, Program};
use crate::machine::Machine;

/// Execute `program` until it falls off the end or faults.
///
/// Output bytes go to `output` one at a time. On a fault the machine is
/// left in whatever state it reached.
pub fn execute<W>(program: &Program, machine: &mut Machine, output: &mut W) -> Result<()>
where
    W: Write + ?Sized,
{
    let mut output = output;
    let output: &mut dyn Write = &mut output;
    run(program, machine, output, None)
}

/// Like [`execute`], additionally writing a step-by-step table of every
/// executed instruction to `trace`.
pub fn execute_traced<W, T>(
    program: &Program,
    machine: &mut Machine,
    output: &mut W,
    trace: &mut T,
) -> Result<()>
where
    W: Write + ?Sized,
    T: Write + ?Sized,
{
    let mut output = output;
    let mut trace = trace;
    let output: &mut dyn Write = &mut output;
    let trace: &mut dyn Write = &mut trace;
    run(program, machine, output, Some(trace))
}

fn run(
    program: &Program,
    machine: &mut Machine,
    output: &mut dyn Write,
    mut trace: Option<&mut dyn Write>,
) -> Result<()> {
    debug!(instructions = program.len(), tape_len = machine.tape_len(), "execution started");

    let mut cursor = program.root();
    let mut step: usize = 0;

    while let Some(ip) = cursor {
        let instr = &program.instructions()[ip];
        let position = instr.position;
        let repeat = instr.repeat;
        let ptr_before = machine.pointer();
        let cell_before = machine.tape().get(ptr_before).copied().unwrap_or(0);
        let mut action: Option<String> = trace.as_ref().map(|_| String::new());
        let mut next = program.next(ip);

        if step == 0 {
            if let Some(t) = trace.as_deref_mut() {
                writeln!(t, "STEP | IP   | PTR   | CELL | INSTR   | ACTION")
                    .and_then(|_| {
                        writeln!(
                            t,
                            "-----+------+-------+------+---------+------------------------------------------"
                        )
                    })
                    .map_err(|source| Error::Io { position, source })?;
            }
        }

        match instr.kind {
            InstructionKind::MoveRight => {
                let Some(target) = ptr_before
                    .checked_add(repeat)
                    .filter(|&p| p < machine.tape_len())
                else {
                    debug!(%position, pointer = ptr_before, repeat, "data pointer out of bounds");
                    return Err(Error::DataPointerOutOfBounds { position });
                };
                machine.set_pointer(target);
                if let Some(a) = action.as_mut() {
                    *a = format!("Moved pointer right to index {target}");
                }
            }
            InstructionKind::MoveLeft => {
                if repeat > ptr_before {
                    debug!(%position, pointer = ptr_before, repeat, "data pointer out of bounds");
                    return Err(Error::DataPointerOutOfBounds { position });
                }
                machine.set_pointer(ptr_before - repeat);
                if let Some(a) = action.as_mut() {
                    *a = format!("Moved pointer left to index {}", ptr_before - repeat);
                }
            }
            InstructionKind::Increment => {
                let cell = machine.cell_mut();
                *cell = cell.wrapping_add((repeat % 256) as u8);
                let after = *cell;
                if let Some(a) = action.as_mut() {
                    *a = format!("Increment cell[{ptr_before}] from {cell_before} to {after}");
                }
            }
            InstructionKind::Decrement => {
                let cell = machine.cell_mut();
                *cell = cell.wrapping_sub((repeat % 256) as u8);
                let after = *cell;
                if let Some(a) = action.as_mut() {
                    *a = format!("Decrement cell[{ptr_before}] from {cell_before} to {after}");
                }
            }
            InstructionKind::Output => {
                output
                    .write_all(&[cell_before])
                    .map_err(|source| Error::Io { position, source })?;
                if let Some(a) = action.as_mut() {
                    *a = format!("Output byte {cell_before}");
                }
            }
            InstructionKind::Input => match machine.read_input() {
                Some(byte) => {
                    *machine.cell_mut() = byte;
                    if let Some(a) = action.as_mut() {
                        *a = format!("Read input byte {byte} into cell[{ptr_before}]");
                    }
                }
                None => {
                    if let Some(a) = action.as_mut() {
                        *a = "No input configured; cell unchanged".to_string();
                    }
                }
            },
            InstructionKind::LoopStart => {
                if cell_before == 0 {
                    next = instr.jump_target;
                    if let Some(a) = action.as_mut() {
                        *a = match next {
                            Some(t) => format!("Cell is 0; skip loop to IP {t}"),
                            None => "Cell is 0; skip loop to end of program".to_string(),
                        };
                    }
                } else if let Some(a) = action.as_mut() {
                    *a = "Enter loop (cell != 0)".to_string();
                }
            }
            InstructionKind::LoopEnd => {
                if cell_before != 0 {
                    next = instr.jump_target;
                    if let Some(a) = action.as_mut() {
                        *a = format!("Cell != 0; repeat loop body at IP {}", next.unwrap_or(ip));
                    }
                } else if let Some(a) = action.as_mut() {
                    *a = "Exit loop (cell is 0)".to_string();
                }
            }
        }

        if let Some(t) = trace.as_deref_mut() {
            let op = match instr.kind {
                k if k.is_mergeable() => format!("{}x{}", k.as_char(), repeat),
                k => k.as_char().to_string(),
            };
            writeln!(
                t,
                "{:<4} | {:<4} | {:<5} | {:<4} | {:<7} | {}",
                step,
                ip,
                ptr_before,
                cell_before,
                op,
                action.unwrap_or_default()
            )
            .map_err(|source| Error::Io { position, source })?;
        }

        step += 1;
        cursor = next;
    }

    debug!(steps = step, pointer = machine.pointer(), "execution finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Position;
    use crate::parser::parse;

    fn run_src(src: &str, tape_size: usize, input: Option<&[u8]>) -> (Result<()>, Machine, Vec<u8>) {
        let program = parse(src).expect("program should parse");
        let mut machine = Machine::new(tape_size, input.map(<[u8]>::to_vec));
        let mut out = Vec::new();
        let result = execute(&program, &mut machine, &mut out);
        (result, machine, out)
    }

    #[test]
    fn empty_program_is_ok() {
        let (result, machine, out) = run_src("", 4, None);
        assert!(result.is_ok());
        assert_eq!(machine.pointer(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn move_and_add_loop() {
        let (result, machine, _) = run_src("++>++<[->+<]", 3, None);
        assert!(result.is_ok());
        assert_eq!(machine.tape()[0], 0);
        assert_eq!(machine.tape()[1], 4);
        assert_eq!(machine.pointer(), 0);
    }

    #[test]
    fn output_writes_exactly_one_byte() {
        let src = format!("{}.", "+".repeat(33));
        let (result, _, out) = run_src(&src, 1, None);
        assert!(result.is_ok());
        assert_eq!(out, vec![33]);
    }

    #[test]
    fn right_pointer_out_of_bounds_errors() {
        let (result, machine, _) = run_src(">", 1, None);
        assert!(matches!(result, Err(Error::DataPointerOutOfBounds { position }) if position == Position::new(1, 1)));
        assert_eq!(machine.pointer(), 0);
    }

    #[test]
    fn merged_move_right_checks_the_whole_run() {
        // Three moves on a three-cell tape would land on index 3.
        let (result, machine, _) = run_src("+>>>", 3, None);
        assert!(matches!(result, Err(Error::DataPointerOutOfBounds { position }) if position == Position::new(1, 2)));
        assert_eq!(machine.tape()[0], 1);
        let (result, machine, _) = run_src(">>", 3, None);
        assert!(result.is_ok());
        assert_eq!(machine.pointer(), 2);
    }

    #[test]
    fn left_pointer_out_of_bounds_errors() {
        let (result, machine, _) = run_src("<", 10, None);
        assert!(matches!(result, Err(Error::DataPointerOutOfBounds { .. })));
        assert_eq!(machine.tape(), &[0; 10]);

        let (result, _, _) = run_src(">><<<", 10, None);
        assert!(matches!(result, Err(Error::DataPointerOutOfBounds { position }) if position == Position::new(1, 3)));
    }

    #[test]
    fn wrapping_subtraction() {
        let (result, machine, _) = run_src("-", 1, None);
        assert!(result.is_ok());
        assert_eq!(machine.tape()[0], 255);
    }

    #[test]
    fn wrapping_addition() {
        let (result, machine, _) = run_src(&"+".repeat(256), 1, None);
        assert!(result.is_ok());
        assert_eq!(machine.tape()[0], 0);

        let (_, machine, _) = run_src(&"+".repeat(300), 1, None);
        assert_eq!(machine.tape()[0], 44);
    }

    #[test]
    fn input_repeats_final_byte() {
        let (result, machine, out) = run_src(",.>,.", 2, Some(&b"a"[..]));
        assert!(result.is_ok());
        assert_eq!(out, b"aa");
        assert_eq!(machine.input_cursor(), 0);
    }

    #[test]
    fn input_without_source_leaves_cell_unchanged() {
        let (result, machine, _) = run_src("+++,", 1, None);
        assert!(result.is_ok());
        assert_eq!(machine.tape()[0], 3);
    }

    #[test]
    fn echo_loop_over_input() {
        // Copies input to output until a zero byte is read.
        let (result, _, out) = run_src(",[.,]", 1, Some(&b"hi\0"[..]));
        assert!(result.is_ok());
        assert_eq!(out, b"hi");
    }

    #[test]
    fn empty_loop_on_zero_cell_is_ok() {
        let (result, _, _) = run_src("[]", 10, None);
        assert!(result.is_ok());
    }

    #[test]
    fn trailing_loop_skip_ends_program() {
        let (result, _, out) = run_src(".[.]", 1, None);
        assert!(result.is_ok());
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn nested_loops_multiply() {
        // 3 * 4 into cell 2
        let (result, machine, _) = run_src("+++[>++++[>+<-]<-]", 3, None);
        assert!(result.is_ok());
        assert_eq!(machine.tape(), &[0, 0, 12]);
    }

    #[test]
    fn hello_world() {
        let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
        let (result, _, out) = run_src(code, 30_000, None);
        assert!(result.is_ok());
        assert_eq!(out, b"Hello World!\n");
    }

    #[test]
    fn fault_keeps_prior_mutations() {
        let (result, machine, out) = run_src("+++.<", 2, None);
        assert!(result.is_err());
        assert_eq!(machine.tape()[0], 3);
        assert_eq!(out, vec![3]);
    }

    #[test]
    fn traced_run_matches_plain_run_and_writes_table() {
        let program = parse("++[->+<]>.").unwrap();
        let mut plain = Machine::new(4, None);
        let mut plain_out = Vec::new();
        execute(&program, &mut plain, &mut plain_out).unwrap();

        let mut traced = Machine::new(4, None);
        let mut traced_out = Vec::new();
        let mut table = Vec::new();
        execute_traced(&program, &mut traced, &mut traced_out, &mut table).unwrap();

        assert_eq!(plain, traced);
        assert_eq!(plain_out, traced_out);
        let table = String::from_utf8(table).unwrap();
        assert!(table.starts_with("STEP"));
        assert!(table.contains("Exit loop (cell is 0)"));
        assert!(table.contains("Output byte 2"));
    }

    #[test]
    fn failing_sink_reports_io_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let program = parse("+\n.").unwrap();
        let mut machine = Machine::new(1, None);
        let result = execute(&program, &mut machine, &mut Broken);
        assert!(matches!(result, Err(Error::Io { position, .. }) if position == Position::new(2, 1)));
    }

    #[test]
    fn failing_trace_sink_reports_first_instruction_position() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let program = parse("\n  >+").unwrap();
        let mut machine = Machine::new(2, None);
        let mut out: Vec<u8> = Vec::new();
        let result = execute_traced(&program, &mut machine, &mut out, &mut Broken);
        assert!(matches!(result, Err(Error::Io { position, .. }) if position == Position::new(2, 3)));
        assert_eq!(machine.pointer(), 0);
    }

    #[test]
    fn empty_program_writes_no_trace() {
        let program = parse("no commands here").unwrap();
        let mut machine = Machine::new(1, None);
        let mut out: Vec<u8> = Vec::new();
        let mut table: Vec<u8> = Vec::new();
        execute_traced(&program, &mut machine, &mut out, &mut table).unwrap();
        assert!(table.is_empty());
    }
}
