use std::ops::Range;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use jak_interpreter::RunError;

/// Writes every error of `error` to stderr, pointing into `source` when the
/// error was raised in it.
pub fn report(file_name: &str, source: &str, error: &RunError) {
    eprint!("{}", render(file_name, source, error, true));
}

pub fn render(file_name: &str, source: &str, error: &RunError, color: bool) -> String {
    match error {
        RunError::Parse(errors) => errors
            .iter()
            .map(|error| {
                render_span(
                    file_name,
                    source,
                    error.token.start..error.token.end,
                    &error.to_string(),
                    &error.kind.to_string(),
                    color,
                )
            })
            .collect(),
        RunError::Evaluation(error) if &*error.location.file == file_name => render_span(
            file_name,
            source,
            error.location.start..error.location.end,
            &error.to_string(),
            &error.kind.to_string(),
            color,
        ),
        // Raised inside an imported file; there is no source to point into.
        RunError::Evaluation(error) => format!("{}\n", error),
    }
}

fn render_span(
    file_name: &str,
    source: &str,
    span: Range<usize>,
    message: &str,
    label: &str,
    color: bool,
) -> String {
    let mut output = Vec::new();
    let written = Report::build(ReportKind::Error, (file_name, span.clone()))
        .with_config(
            Config::default()
                .with_color(color)
                .with_index_type(IndexType::Byte),
        )
        .with_message(message)
        .with_label(
            Label::new((file_name, span))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((file_name, Source::from(source)), &mut output);

    match written {
        Ok(()) => String::from_utf8_lossy(&output).into_owned(),
        Err(_) => format!("{}\n", message),
    }
}
