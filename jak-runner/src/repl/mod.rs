mod evaluator;
mod printer;
mod reader;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use evaluator::{Evaluator, InterpreterEvaluator};
use printer::{InterpreterPrinter, Printer};
use reader::{ReadOutput, Reader};

use crate::DebugOptions;

struct Repl<E: Evaluator, P: Printer> {
    reader: Reader,
    evaluator: E,
    printer: P,
}

impl<O, E: Evaluator<Object = O>, P: Printer<Object = O>> Repl<E, P> {
    fn run(mut self) {
        loop {
            match self.reader.read() {
                ReadOutput::Exit => break,
                ReadOutput::Clear => continue,
                ReadOutput::Line(source) => {
                    let result = self.evaluator.evaluate(&source);
                    self.printer.print(&source, result)
                }
            }
        }
    }
}

pub fn start(options: DebugOptions) -> Result<(), ReadlineError> {
    let rl = DefaultEditor::new()?;
    debug!("starting repl");

    Repl {
        reader: Reader::new(rl),
        evaluator: InterpreterEvaluator::new(options),
        printer: InterpreterPrinter {},
    }
    .run();
    Ok(())
}
