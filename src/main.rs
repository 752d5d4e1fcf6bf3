use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::runner::{self, Diagnostics};
use rox::scanner::Scanner;
use rox::Interpreter;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print one JSON object per token instead of the text form
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive prompt; state persists between lines
    Repl,
}

/// Reads the whole input file; tokens own their lexemes, so the buffer can
/// be dropped once the source is scanned.
fn read_file(filename: PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "{} [{}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print every diagnostic to stderr and exit with the first one's code.
fn report_and_exit(diagnostics: Diagnostics) -> ! {
    for e in &diagnostics {
        let stage = if e.is_static() { "static" } else { "runtime" };
        debug!("Diagnostic ({}): {}", stage, e);
        eprintln!("{}", e);
    }

    let code = diagnostics.first().map_or(65, |e| e.exit_code());
    std::process::exit(code);
}

fn no_input() -> ! {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn tokenize(filename: PathBuf, json: bool) -> Result<()> {
    let buf = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&buf) {
        match token {
            Ok(token) if json => {
                println!("{}", serde_json::to_string(&token)?);
            }

            Ok(token) => {
                println!("{}", token);
            }

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn repl() -> Result<()> {
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();

    print!("> ");
    io::stdout().flush()?;

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let source = line.as_bytes();

        // A bare expression is evaluated and echoed; anything else runs as
        // a program.
        let outcome = if runner::parse_expression(source).is_ok() {
            runner::evaluate_source(&mut interpreter, source).map(|value| println!("{}", value))
        } else {
            runner::run_source(&mut interpreter, source)
        };

        if let Err(diagnostics) = outcome {
            for e in diagnostics {
                eprintln!("{}", e);
            }
        }

        print!("> ");
        io::stdout().flush()?;
    }

    println!();
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");
            tokenize(filename.unwrap_or_else(|| no_input()), json)?;
        }

        Commands::Parse { filename } => {
            info!("Running Parse subcommand");
            let buf = read_file(filename.unwrap_or_else(|| no_input()))?;

            match runner::parse_expression(&buf) {
                Ok(expr) => {
                    let ast_str = AstPrinter::print(&expr);
                    debug!("AST: {}", ast_str);
                    println!("{}", ast_str);
                }
                Err(diagnostics) => report_and_exit(diagnostics),
            }
        }

        Commands::Evaluate { filename } => {
            info!("Running Evaluate subcommand");
            let buf = read_file(filename.unwrap_or_else(|| no_input()))?;
            let mut interpreter = Interpreter::new();

            match runner::evaluate_source(&mut interpreter, &buf) {
                Ok(value) => {
                    debug!("Evaluated to: {}", value);
                    println!("{}", value);
                }
                Err(diagnostics) => report_and_exit(diagnostics),
            }
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let buf = read_file(filename.unwrap_or_else(|| no_input()))?;
            let mut interpreter = Interpreter::new();

            if let Err(diagnostics) = runner::run_source(&mut interpreter, &buf) {
                report_and_exit(diagnostics);
            }

            info!("Program executed successfully");
        }

        Commands::Repl => {
            info!("Running Repl subcommand");
            repl()?;
        }
    }

    Ok(())
}
