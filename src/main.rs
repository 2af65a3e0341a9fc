use clap::Parser;
use fooked::repl::{self, ModeFlagOverride, ReplMode};
use fooked::{cli_util, config, logging, Machine, DEFAULT_MEM_SIZE};
use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage(program: &str) -> String {
    format!(
        r#"Usage:
  {0} [FILE] [-i <input> | --input <input>] [-s <size> | --mem-size <size>] [-I | --interactive]
  {0} -v | --version
  {0} -h | --help

Options:
  -i --input          Passes an input string.
  -s --mem-size       Sets the memory size.
  -I --interactive    Enables interactive mode.
  -d --debug          Print a step-by-step table of operations to stderr.
     --dump           Print the compiled instruction listing and exit.
     --bare           Interactive mode without a line editor (no prompts).
     --editor         Interactive mode with a line editor (stdin must be a TTY).
  -v --version        Prints the version and exits.
  -h --help           Prints this help message.

Notes:
- Input (`,`) reads from the --input string. Without one the cell is left
  unchanged; after the last byte the final byte is read again.
- Any characters outside of Brainfuck's ><+-.,[] are comments.
- Interactive mode keeps one tape across lines; type "exit" to quit.
- The memory size defaults to [interpreter] mem_size in
  $XDG_CONFIG_HOME/fooked.toml, or {1}.
"#,
        program, DEFAULT_MEM_SIZE
    )
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!("{}", usage(program));
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "fooked", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Brainfuck source file to run
    #[arg(value_name = "FILE")]
    file: Option<String>,

    /// Input string handed to `,`
    #[arg(short = 'i', long = "input", value_name = "INPUT")]
    input: Option<String>,

    /// Number of tape cells
    #[arg(short = 's', long = "mem-size", value_name = "SIZE")]
    mem_size: Option<String>,

    /// Read and run lines interactively after FILE (if any)
    #[arg(short = 'I', long = "interactive")]
    interactive: bool,

    /// Print a step-by-step table of operations to stderr
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Print the compiled instruction listing and exit
    #[arg(long = "dump")]
    dump: bool,

    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    bare: bool,

    /// Force interactive editor mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    editor: bool,

    /// Print the version and exit
    #[arg(short = 'v', long = "version", action = clap::ArgAction::SetTrue)]
    version: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,
}

/// Resolve the tape size: flag, then config file, then the default.
fn resolve_mem_size(flag: Option<&str>) -> usize {
    if let Some(raw) = flag {
        match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => return n,
            _ => {
                eprintln!("Invalid memory size, using default.");
                let _ = io::stderr().flush();
            }
        }
    }
    config::settings().mem_size.unwrap_or(DEFAULT_MEM_SIZE)
}

fn run_file(program: &str, path: &str, machine: &mut Machine, debug: bool, dump: bool) -> i32 {
    // Non-UTF-8 bytes can only be comments; decode lossily.
    let source = match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            eprintln!("{program}: failed to read '{path}': {e}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let compiled = match fooked::parse(&source) {
        Ok(p) => p,
        Err(err) => {
            cli_util::print_error(Some(program), &source, &err);
            return 1;
        }
    };

    if dump {
        print!("{compiled}");
        let _ = io::stdout().flush();
        return 0;
    }

    let mut stdout = io::stdout().lock();
    let result = if debug {
        let mut stderr = io::stderr().lock();
        fooked::execute_traced(&compiled, machine, &mut stdout, &mut stderr)
    } else {
        fooked::execute(&compiled, machine, &mut stdout)
    };
    let _ = stdout.flush();
    drop(stdout);

    match result {
        Ok(()) => 0,
        Err(err) => {
            cli_util::print_error(Some(program), &source, &err);
            1
        }
    }
}

fn run_interactive(program: &str, machine: &mut Machine, mode_flag: ModeFlagOverride, debug: bool) -> i32 {
    let mode = match repl::select_mode(mode_flag) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    // Install SIGINT (ctrl+c) handler to flush and exit(0) immediately
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(0);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let result = match mode {
        ReplMode::Editor => {
            if io::stderr().is_terminal() {
                eprintln!("Interactive Mode (type \"exit\" to quit)");
                let _ = io::stderr().flush();
            }
            repl::repl_loop(machine, debug)
        }
        ReplMode::Bare => {
            let stdin = io::stdin().lock();
            let mut stdout = io::stdout().lock();
            repl::bare_loop(stdin, machine, &mut stdout, debug)
        }
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{program}: interactive mode error: {e}");
            let _ = io::stderr().flush();
            1
        }
    }
}

fn main() {
    logging::init_logging();

    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("fooked"));

    let cli = Cli::parse();

    if cli.help {
        println!("\nFooked Brainfuck Interpreter\n");
        print!("{}", usage(&program));
        let _ = io::stdout().flush();
        std::process::exit(0);
    }

    if cli.version {
        println!("{program} version {VERSION}");
        std::process::exit(0);
    }

    if cli.file.is_none() && !cli.interactive {
        eprintln!("No filename or flag for interactive mode provided.");
        usage_and_exit(&program, 2);
    }

    let mem_size = resolve_mem_size(cli.mem_size.as_deref());
    let mut machine = Machine::new(mem_size, cli.input.map(String::into_bytes));

    let mut code = 0;
    if let Some(path) = cli.file.as_deref() {
        code = run_file(&program, path, &mut machine, cli.debug, cli.dump);
    }

    if cli.interactive {
        let mode_flag = if cli.bare {
            ModeFlagOverride::Bare
        } else if cli.editor {
            ModeFlagOverride::Editor
        } else {
            ModeFlagOverride::None
        };
        let repl_code = run_interactive(&program, &mut machine, mode_flag, cli.debug);
        if code == 0 {
            code = repl_code;
        }
    }

    std::process::exit(code);
}
