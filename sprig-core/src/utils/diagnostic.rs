use std::path::PathBuf;
pub use codespan_reporting::diagnostic::{LabelStyle, Severity};
use codespan_reporting::{diagnostic::Label as CodespanLabel, files::SimpleFiles};
use termcolor::Buffer;

use super::line_numbers::LineNumbers;
use super::src_span::SrcSpan;

/// Severity of a remark. Warnings stream and never interrupt; everything
/// else unwinds to the outermost evaluation boundary exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warning,
    Error,
    Fatal,
    Exception,
    InterpretedException,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Warning => "Warning",
            Level::Error => "Error",
            Level::Fatal => "Fatal",
            Level::Exception => "Exception",
            Level::InterpretedException => "Interpreted exception",
        }
    }

    fn to_codespan_severity(self) -> Severity {
        match self {
            Level::Warning => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

pub struct Label {
    pub text: Option<String>,
    pub span: SrcSpan,
}

impl Label {
    pub fn to_codespan_label(&self, file_id: usize, label_style: Option<LabelStyle>) -> CodespanLabel<usize> {
        let label = CodespanLabel::new(
            label_style.unwrap_or(LabelStyle::Primary),
            file_id,
            (self.span.start as usize)..(self.span.end as usize),
        );

        match &self.text {
            None => label,
            Some(text) => label.with_message(text.clone()),
        }
    }
}

pub struct Location<'a> {
    pub src: &'a str,
    pub path: PathBuf,
    pub label: Label,
    pub extra_labels: Vec<Label>,
}

pub struct Diagnostic<'a> {
    pub title: String,
    pub text: String,
    pub level: Level,
    pub location: Option<Location<'a>>,
    /// Pre-rendered call-stack lines, innermost first. Printed indented
    /// below the report for fatal/exception remarks.
    pub stacktrace: Vec<String>,
}

impl<'a> Diagnostic<'a> {
    pub fn write(&self, buf: &mut Buffer) {
        use std::io::Write;

        match &self.location {
            Some(location) => self.write_span(location, buf),
            None => self.write_title(buf),
        }

        if !self.text.is_empty() {
            writeln!(buf, "{}", self.text).expect("text write")
        }

        for frame in &self.stacktrace {
            writeln!(buf, "    {frame}").expect("stacktrace write")
        }
    }

    pub fn write_span(&self, location: &Location, buf: &mut Buffer) {
        let mut files = SimpleFiles::new();

        let location_path = location.path.to_str().unwrap_or_default();
        let location_src = location.src;

        let file_id = files.add(location_path, location_src);

        let mut labels = vec![location.label.to_codespan_label(file_id, None)];

        location.extra_labels.iter()
            .for_each(|label| {
                labels.push(label.to_codespan_label(file_id, Some(LabelStyle::Secondary)))
            });

        let diagnostic = codespan_reporting::diagnostic::Diagnostic::new(self.level.to_codespan_severity())
            .with_message(&self.title)
            .with_labels(labels);

        let config = codespan_reporting::term::Config::default();
        codespan_reporting::term::emit(buf, &config, &files, &diagnostic)
            .expect("write_diagnostic");
    }

    pub fn write_title(&self, buf: &mut Buffer) {
        use std::io::Write;
        use termcolor::{Color, ColorSpec, WriteColor};

        let colour = match self.level {
            Level::Warning => Color::Yellow,
            _ => Color::Red,
        };

        buf.set_color(ColorSpec::new().set_bold(true).set_fg(Some(colour)))
            .expect("write_title_color1");
        write!(buf, "{}", self.level.as_str().to_lowercase()).expect("write_title_kind");

        buf.set_color(ColorSpec::new().set_bold(true))
            .expect("write_title_color2");
        write!(buf, ": {}\n\n", self.title).expect("write_title_title");

        buf.set_color(&ColorSpec::new())
            .expect("write_title_reset");
    }

    /// Line-oriented sink form:
    /// `path:lineStart,colStart,lineEnd,colEnd Severity: message`, with the
    /// call-stack lines indented below it.
    pub fn to_compact_line(&self) -> String {
        let mut line = match &self.location {
            Some(location) => {
                let lines = LineNumbers::new(location.src);
                let start = lines.line_and_column_number(location.label.span.start);
                let end = lines.line_and_column_number(location.label.span.end);

                format!(
                    "{}:{},{},{},{} {}: {}",
                    location.path.display(),
                    start.line, start.column,
                    end.line, end.column,
                    self.level.as_str(),
                    self.title,
                )
            },
            None => format!("{}: {}", self.level.as_str(), self.title),
        };

        if !self.text.is_empty() {
            line.push_str(&format!(" ({})", self.text.replace('\n', "; ")));
        }

        for frame in &self.stacktrace {
            line.push_str(&format!("\n    {frame}"));
        }

        line
    }
}
