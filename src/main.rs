use std::io::{self, BufRead, IsTerminal, Read, Write};

use cel::config::{parse_limit, Limits};
use cel::reader;
use cel::{CelError, Machine};

/// Driver options.
struct Options {
    limits: Limits,
    load_files: Vec<String>,
    expr: Option<String>,
    echo: bool,
}

fn main() {
    init_tracing();

    let options = match parse_args(std::env::args().skip(1).collect()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Try 'cel --help' for usage information.");
            std::process::exit(1);
        }
    };

    let mut machine = match Machine::new(options.limits) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to initialize machine: {}", e);
            std::process::exit(1);
        }
    };

    let mut status = Ok(());
    for path in &options.load_files {
        status = status.and_then(|_| load_file(&mut machine, path, options.echo));
    }
    if let Some(expr) = &options.expr {
        status = status.and_then(|_| eval_and_print(expr, &mut machine, options.echo));
    }
    if options.load_files.is_empty() && options.expr.is_none() {
        let stdin = io::stdin();
        status = if stdin.is_terminal() {
            run_interactive(&mut machine, options.echo)
        } else {
            run_piped(&mut machine, options.echo)
        };
    }

    if let Err(e) = status {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install a stderr subscriber when `RUST_LOG` (or `CEL_TRACE=1`) is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if std::env::var("CEL_TRACE").map(|v| v == "1").unwrap_or(false) {
        EnvFilter::new("cel=trace")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        return;
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn parse_args(args: Vec<String>) -> Result<Options, CelError> {
    let mut options = Options {
        limits: Limits::from_env()?,
        load_files: Vec::new(),
        expr: None,
        echo: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--load" => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| CelError::Config("--load requires a file path".into()))?;
                options.load_files.push(path.clone());
                i += 2;
            }
            "--frames" => {
                let n = args
                    .get(i + 1)
                    .ok_or_else(|| CelError::Config("--frames requires a number".into()))?;
                options.limits.frames = parse_limit("--frames", n)?;
                i += 2;
            }
            "--echo" => {
                options.echo = true;
                i += 1;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with("--") => {
                return Err(CelError::Config(format!("Unknown argument: {}", other)));
            }
            other => {
                if options.expr.is_some() {
                    return Err(CelError::Config("only one expression argument".into()));
                }
                options.expr = Some(other.to_string());
                i += 1;
            }
        }
    }
    Ok(options)
}

fn print_help() {
    println!("Usage: cel [OPTIONS] [EXPR]");
    println!();
    println!("Evaluates EXPR, the files given with --load, or standard input.");
    println!();
    println!("Options:");
    println!("  --load <file>    Evaluate every expression in a file");
    println!("  --frames <n>     Binding stack capacity (bounds recursion depth)");
    println!("  --echo           Print each parsed expression before its result");
    println!("  --help, -h       Show this help message");
    println!();
    println!("Environment variables:");
    println!("  CEL_MAX_SYMBOLS, CEL_MAX_VECTORS, CEL_MAX_FRAMES   Store capacities");
    println!("  RUST_LOG=cel=debug   Log panics and trace frames to stderr");
    println!("  CEL_TRACE=1          Log every closure application");
}

fn load_file(machine: &mut Machine, path: &str, echo: bool) -> Result<(), CelError> {
    let input = std::fs::read_to_string(path)
        .map_err(|e| CelError::Io(format!("cannot load {}: {}", path, e)))?;
    tracing::debug!(path, "loading");
    eval_and_print(&input, machine, echo)
}

/// Interactive REPL: accumulate lines until parens are balanced.
fn run_interactive(machine: &mut Machine, echo: bool) -> Result<(), CelError> {
    println!("cel interpreter");
    println!(
        "  Symbols: {} interned, globals: {}",
        machine.symbols.count(),
        machine.stack.global_count()
    );

    let stdin = io::stdin();
    let mut buf = String::new();
    let mut depth: i32 = 0;

    loop {
        print!("{}", if depth == 0 { "> " } else { "  " });
        io::stdout().flush().map_err(|e| CelError::Io(e.to_string()))?;

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return Ok(()), // EOF
            Ok(_) => {}
            Err(e) => return Err(CelError::Io(e.to_string())),
        }

        for ch in line.chars() {
            match ch {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }
        buf.push_str(&line);

        if depth <= 0 {
            depth = 0;
            let input = std::mem::take(&mut buf);
            if input.trim().is_empty() {
                continue;
            }
            // Read errors end the entry, not the session; fatal ones end both.
            match eval_and_print(&input, machine, echo) {
                Err(e @ CelError::Read(_)) | Err(e @ CelError::SymbolTooLong(_)) => {
                    eprintln!("{}", e)
                }
                other => other?,
            }
        }
    }
}

/// Piped mode: read all input, then evaluate it.
fn run_piped(machine: &mut Machine, echo: bool) -> Result<(), CelError> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| CelError::Io(e.to_string()))?;
    eval_and_print(&input, machine, echo)
}

/// Evaluate each expression in a string in turn and print its result.
fn eval_and_print(input: &str, machine: &mut Machine, echo: bool) -> Result<(), CelError> {
    let mut pos = 0;
    while let Some((expr, next)) =
        reader::read_one_at(input, pos, &mut machine.heap, &mut machine.symbols)?
    {
        pos = next;
        if echo {
            println!("{}", machine.print(expr));
        }
        let val = machine.eval(expr)?;
        println!("{}", machine.print(val));
    }
    Ok(())
}
