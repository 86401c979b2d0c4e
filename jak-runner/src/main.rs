mod diagnostics;
mod host;
mod repl;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use jak_core::lexer::Tokenizer;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Script to run. Starts the REPL when omitted.
    path: Option<PathBuf>,
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,
    /// Print the token stream of every input before evaluating it.
    #[arg(long)]
    tokens: bool,
    /// Print the parsed program of every input before evaluating it.
    #[arg(long)]
    ast: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DebugOptions {
    pub tokens: bool,
    pub ast: bool,
}

impl DebugOptions {
    pub fn dump(&self, source: &str) {
        if self.tokens {
            for token in Tokenizer::new(source) {
                println!("{:<8} {:?}", token.kind.as_str(), token.literal);
            }
        }
        if self.ast {
            let parser = jak_core::parser::Parser::new(Tokenizer::new(source));
            if let Ok(program) = parser.parse() {
                print!("{}", program);
            }
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let options = DebugOptions {
        tokens: cli.tokens,
        ast: cli.ast,
    };

    match cli.path {
        None => match repl::start(options) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {}", err);
                ExitCode::FAILURE
            }
        },
        Some(path) => runner::execute(&path, options),
    }
}
