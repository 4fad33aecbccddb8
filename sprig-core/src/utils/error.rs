use std::collections::HashSet;
use std::path::PathBuf;

use termcolor::Buffer;
use thiserror::Error;

use crate::{
    analyzer::prelude::InferError,
    eval::error::{RuntimeError, RuntimeErrorType},
    parser::prelude::ParseError,
};
use super::diagnostic::{Diagnostic, Label, Level, Location};
use super::line_numbers::LineNumbers;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("failed to parse source code")]
    Parse {
        path: PathBuf,
        src: String,
        error: ParseError
    },
    #[error("structural inference failed")]
    Type {
        path: PathBuf,
        src: String,
        errors: Vec<InferError>
    },
    #[error("evaluation failed")]
    Runtime {
        path: PathBuf,
        src: String,
        error: RuntimeError
    },
    #[error("IO operation failed")]
    StdIo {
        err: std::io::ErrorKind
    }
}

impl Error {
    pub fn pretty_string(&self) -> String {
        let mut nocolor = Buffer::no_color();
        self.pretty(&mut nocolor);
        String::from_utf8(nocolor.into_inner()).expect("Error printing produced invalid utf8")
    }

    pub fn pretty(&self, buf: &mut Buffer) {
        use std::io::Write;

        for diagnostic in self.to_diagnostics() {
            diagnostic.write(buf);
            writeln!(buf).expect("write new line diagnostic");
        }
    }

    pub fn compact_lines(&self) -> Vec<String> {
        self.to_diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.to_compact_line())
            .collect()
    }

    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Parse { path, src, error } => {
                let (label, extra) = error.details();
                let text = extra.join("\n");

                vec![Diagnostic {
                    title: "Syntax error".into(),
                    text,
                    level: Level::Fatal,
                    location: Some(Location {
                        src,
                        path: path.clone(),
                        label: Label {
                            text: Some(label.to_string()),
                            span: error.span,
                        },
                        extra_labels: vec![],
                    }),
                    stacktrace: vec![],
                }]
            },
            Error::Type { path, src, errors } => {
                errors
                    .iter()
                    .map(|error| match error {
                        InferError::Redeclaration { location_a, location_b, name } => Diagnostic {
                            title: "Multiple declarations".into(),
                            text: format!("`{name}` was declared twice in the same scope."),
                            level: Level::Fatal,
                            location: Some(Location {
                                src,
                                path: path.clone(),
                                label: Label {
                                    text: Some("Declared again here".into()),
                                    span: *location_b,
                                },
                                extra_labels: vec![Label {
                                    text: Some("First declared here".into()),
                                    span: *location_a
                                }]
                            }),
                            stacktrace: vec![],
                        },
                    })
                    .collect()
            },
            Error::Runtime { path, src, error } => {
                let level = match error.error {
                    RuntimeErrorType::Uncaught { .. } => Level::InterpretedException,
                    _ => Level::Exception,
                };

                vec![Diagnostic {
                    title: error.error.message(),
                    text: String::new(),
                    level,
                    location: Some(Location {
                        src,
                        path: path.clone(),
                        label: Label {
                            text: None,
                            span: error.location,
                        },
                        extra_labels: vec![],
                    }),
                    stacktrace: render_stacktrace(path, src, error),
                }]
            },
            Error::StdIo { err } => {
                vec![Diagnostic {
                    title: "Standard IO error".into(),
                    text: format!("{err}"),
                    level: Level::Error,
                    location: None,
                    stacktrace: vec![],
                }]
            }
        }
    }
}

/// The innermost function context, then one `path:line,col name` line per
/// distinct source line on the way out. Synthetic frames (builtins, no real
/// source position) are skipped.
fn render_stacktrace(path: &PathBuf, src: &str, error: &RuntimeError) -> Vec<String> {
    let lines = LineNumbers::new(src);
    let mut trace = vec![];

    if let Some(frame) = error.frames.last() {
        trace.push(format!("in {}", frame.name));
    }

    let mut seen = HashSet::new();

    for frame in error.frames.iter().rev() {
        let Some(span) = frame.location else { continue };
        let at = lines.line_and_column_number(span.start);

        if seen.insert(at.line) {
            trace.push(format!("{}:{},{} {}", path.display(), at.line, at.column, frame.name));
        }
    }

    trace
}
