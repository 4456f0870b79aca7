//! minijs CLI

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use minijs::engine::Engine;
use minijs::interp::coerce;

#[derive(Parser)]
#[command(name = "minijs", version, about = "minijs - embeddable JavaScript-like interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script file
    Run {
        /// Source file to run
        file: PathBuf,
    },
    /// Evaluate an expression and print its value
    Eval {
        /// Source text to evaluate
        source: String,
    },
    /// Parse and dump the syntax tree as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
    /// Start the interactive shell
    Repl,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::Run { file }) => run_file(&file),
        Some(Command::Eval { source }) => eval_source(&source),
        Some(Command::Parse { file }) => parse_file(&file),
        Some(Command::Tokens { file }) => tokenize_file(&file),
        Some(Command::Repl) | None => run_repl(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_file(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let engine = Engine::new();
    if let Err(e) = engine.eval(&source) {
        minijs::error::report(&filename, &source, &e);
        std::process::exit(1);
    }
    Ok(())
}

fn eval_source(source: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::new();
    match engine.eval(source) {
        Ok(value) => {
            println!("{}", coerce::to_display(&value));
            Ok(())
        }
        Err(e) => {
            minijs::error::report("<eval>", source, &e);
            std::process::exit(1);
        }
    }
}

fn parse_file(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let program = minijs::parser::Parser::new(&source)?.parse()?;
    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(())
}

fn tokenize_file(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    for chunk in minijs::lexer::tokenize(&source)? {
        println!("{:?} {} {:?}", chunk.token, chunk.position_display(), chunk.text);
    }
    Ok(())
}

fn run_repl() -> Result<(), Box<dyn std::error::Error>> {
    minijs::repl::Repl::new()?.run()?;
    Ok(())
}
