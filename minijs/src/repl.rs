//! Interactive shell around an [`Engine`].

use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};

use crate::engine::Engine;
use crate::interp::coerce;

const PROMPT: &str = "js> ";
const HISTORY_FILE: &str = ".minijs_history";

pub struct Repl {
    editor: DefaultEditor,
    engine: Engine,
    history_path: Option<PathBuf>,
}

impl Repl {
    pub fn new() -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            engine: Engine::new(),
            history_path,
        };
        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }
        Ok(repl)
    }

    pub fn run(&mut self) -> RlResult<()> {
        println!("minijs {}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.eval_input(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }
        Ok(())
    }

    /// Colon commands, returns true when the loop should exit.
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                self.print_help();
                false
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            ":reset" => {
                self.engine = Engine::new();
                println!("Fresh scope.");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit");
        println!("  :clear          Clear the screen");
        println!("  :reset          Drop all bindings");
        println!();
        println!("Statements run in one persistent scope:");
        println!("  var x = [1, 2, 3]");
        println!("  x.map(n => n * n)");
        println!("  JSON.stringify({{a: 1}})");
    }

    fn eval_input(&mut self, input: &str) {
        match self.engine.eval(input) {
            Ok(value) => {
                if !value.is_undefined() {
                    println!("{}", coerce::to_display(&value));
                }
            }
            Err(err) => eprintln!("{}", err.message()),
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new().expect("Failed to create REPL")
    }
}

fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
