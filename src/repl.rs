//! Interactive mode: a line-at-a-time session over one shared machine.
//!
//! Every submitted line is parsed and run against the same [`Machine`], so
//! tape contents, pointer and input cursor carry over between lines. A
//! faulting line is reported and the session goes on. `exit` ends it.

use std::env;
use std::io::{self, BufRead, IsTerminal, Write};

use nu_ansi_term::Style;
use reedline::{DefaultPrompt, DefaultPromptSegment, Highlighter, Signal, StyledText};
use tracing::debug;

use crate::config::{self, Colors};
use crate::{cli_util, engine, parser, Machine};

/// What a single submitted line asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission<'a> {
    Exit,
    Empty,
    Code(&'a str),
}

pub fn classify(line: &str) -> Submission<'_> {
    let trimmed = line.trim();
    if trimmed == "exit" {
        Submission::Exit
    } else if trimmed.is_empty() {
        Submission::Empty
    } else {
        Submission::Code(line.trim_end_matches(['\r', '\n']))
    }
}

/// Run one line against `machine`.
///
/// Program output goes to `output`, followed by a newline so the next
/// prompt starts at column 0. Faults are printed to stderr. With `trace`,
/// the step table is printed to stderr as well.
pub fn execute_line<W: Write>(code: &str, machine: &mut Machine, output: &mut W, trace: bool) -> io::Result<()> {
    let result = match parser::parse(code) {
        Ok(program) if trace => {
            let mut stderr = io::stderr().lock();
            engine::execute_traced(&program, machine, output, &mut stderr)
        }
        Ok(program) => engine::execute(&program, machine, output),
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        debug!(error = %err, "interactive line failed");
        cli_util::print_error(None, code, &err);
    }
    writeln!(output)?;
    output.flush()
}

/// Bare mode: read `input` line by line, run each line, print no prompts.
pub fn bare_loop<R: BufRead, W: Write>(input: R, machine: &mut Machine, output: &mut W, trace: bool) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        match classify(&line) {
            Submission::Exit => break,
            Submission::Empty => continue,
            Submission::Code(code) => execute_line(code, machine, output, trace)?,
        }
    }
    Ok(())
}

/// Editor mode: a `reedline` prompt showing the pointer and current cell.
pub fn repl_loop(machine: &mut Machine, trace: bool) -> io::Result<()> {
    let mut editor = init_line_editor()?;

    loop {
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(prompt_label(machine)),
            DefaultPromptSegment::Empty,
        );

        let line = match editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => buffer,
            Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => break,
            Err(e) => {
                eprintln!("repl: editor error: {e}");
                let _ = io::stderr().flush();
                break;
            }
        };

        match classify(&line) {
            Submission::Exit => break,
            Submission::Empty => continue,
            Submission::Code(code) => {
                let mut stdout = io::stdout().lock();
                execute_line(code, machine, &mut stdout, trace)?;
            }
        }
    }

    println!();
    io::stdout().flush()
}

/// `p{pointer} v{value}`, the state shown before each line.
pub fn prompt_label(machine: &Machine) -> String {
    let value = machine.tape().get(machine.pointer()).copied().unwrap_or(0);
    format!("p{} v{}", machine.pointer(), value)
}

fn init_line_editor() -> io::Result<reedline::Reedline> {
    use reedline::{default_emacs_keybindings, Emacs, FileBackedHistory, Reedline};

    let history = FileBackedHistory::new(1_000).map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(BrainfuckHighlighter::new(&config::settings().colors)))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(default_emacs_keybindings())));

    Ok(editor)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

/// Pick the interactive mode: flags, then `FOOKED_REPL_MODE`, then whether
/// stdin is a terminal.
pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    let stdin_is_tty = io::stdin().is_terminal();
    resolve_mode(flag, env::var("FOOKED_REPL_MODE").ok().as_deref(), stdin_is_tty)
}

fn resolve_mode(flag: ModeFlagOverride, env_mode: Option<&str>, stdin_is_tty: bool) -> Result<ReplMode, String> {
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !stdin_is_tty {
                return Err("cannot start editor: stdin is not a TTY (use --bare or FOOKED_REPL_MODE=bare)".to_string());
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    if let Some(val) = env_mode {
        let v = val.trim().to_ascii_lowercase();
        return match v.as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" => {
                if !stdin_is_tty {
                    return Err("cannot start editor: stdin is not a TTY (use FOOKED_REPL_MODE=bare)".to_string());
                }
                Ok(ReplMode::Editor)
            }
            _ => Err(format!("invalid FOOKED_REPL_MODE value: {val}, must be 'bare' or 'editor'")),
        };
    }

    if stdin_is_tty { Ok(ReplMode::Editor) } else { Ok(ReplMode::Bare) }
}

struct BrainfuckHighlighter {
    colors: Colors,
}

impl BrainfuckHighlighter {
    fn new(colors: &Colors) -> Self {
        Self { colors: colors.clone() }
    }

    #[inline]
    fn style_for(&self, ch: char) -> Style {
        let c = &self.colors;
        let color = match ch {
            '>' => c.move_right,
            '<' => c.move_left,
            '+' => c.increment,
            '-' => c.decrement,
            '.' => c.output,
            ',' => c.input,
            '[' | ']' => c.loop_bracket,
            _ => return Style::new().fg(c.comment),
        };
        Style::new().fg(color).bold()
    }
}

impl Highlighter for BrainfuckHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out: StyledText = StyledText::new();
        let mut current_style: Option<Style> = None;
        let mut buffer = String::new();

        for ch in line.chars() {
            let style = self.style_for(ch);

            match current_style {
                Some(s) if s == style => buffer.push(ch),
                Some(s) => {
                    out.push((s, std::mem::take(&mut buffer)));
                    current_style = Some(style);
                    buffer.push(ch);
                }
                None => {
                    current_style = Some(style);
                    buffer.push(ch);
                }
            }
        }

        if let Some(s) = current_style {
            if !buffer.is_empty() {
                out.push((s, buffer));
            }
        }
        out
    }
}
