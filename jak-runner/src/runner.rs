use std::path::Path;
use std::process::ExitCode;

use jak_interpreter::{Environment, Evaluator};
use tracing::info;

use crate::diagnostics;
use crate::host::{self, FsLoader};
use crate::DebugOptions;

/// Runs a script file. Any parse or evaluation error is reported on stderr
/// and turns into a failing exit status.
pub fn execute(path: &Path, options: DebugOptions) -> ExitCode {
    let file_name = path.display().to_string();
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("could not read {}: {}", file_name, err);
            return ExitCode::FAILURE;
        }
    };

    options.dump(&source);

    let mut evaluator = Evaluator::new(host::builtins())
        .with_loader(Box::new(FsLoader))
        .with_file_name(file_name.as_str());
    let environment = Environment::new();

    info!(file = %file_name, "running script");
    match evaluator.run(&source, &environment) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            diagnostics::report(&file_name, &source, &error);
            ExitCode::FAILURE
        }
    }
}
