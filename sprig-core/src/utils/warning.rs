use std::{path::PathBuf, rc::Rc, sync::{atomic::{AtomicUsize, Ordering}, Arc, RwLock}};

use termcolor::Buffer;

use crate::analyzer::error::Warning as InferWarning;
use crate::eval::error::RuntimeWarning;
use super::diagnostic::{Diagnostic, Label, Level, Location};

pub trait WarningEmitterIO {
    fn emit_warning(&self, warning: Warning);
}

#[derive(Debug, Clone, Copy)]
pub struct NullWarningEmitterIO;

impl WarningEmitterIO for NullWarningEmitterIO {
    fn emit_warning(&self, _warning: Warning) {}
}

#[derive(Debug, Default, Clone)]
pub struct VectorWarningEmitterIO {
    pub warnings: Arc<RwLock<Vec<Warning>>>
}

impl VectorWarningEmitterIO {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Warning> {
        let mut warnings = self.write_lock();
        std::mem::take(&mut *warnings)
    }

    pub fn reset(&self) {
        let mut warnings = self.write_lock();
        warnings.clear();
    }

    pub fn pop(&self) -> Option<Warning> {
        let mut warnings = self.write_lock();
        warnings.pop()
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Warning>> {
        self.warnings.write().expect("Vector lock poisoned")
    }
}

impl WarningEmitterIO for VectorWarningEmitterIO {
    fn emit_warning(&self, warning: Warning) {
        let mut warnings = self.write_lock();

        warnings.push(warning);
    }
}

pub struct WarningEmitter {
    count: Arc<AtomicUsize>,
    emitter: Rc<dyn WarningEmitterIO>
}

impl WarningEmitter {
    pub fn new(emitter: Rc<dyn WarningEmitterIO>) -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(0)),
            emitter,
        }
    }

    pub fn null() -> Self {
        Self::new(Rc::new(NullWarningEmitterIO))
    }

    pub fn reset_count(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn emit(&self, warning: Warning) {
        _ = self.count.fetch_add(1, Ordering::Relaxed);
        self.emitter.emit_warning(warning);
    }
}

/// Warning emitter scoped to one module's path and source, used by the
/// inference pass.
pub struct TypeWarningEmitter {
    module_path: PathBuf,
    module_src: String,
    emitter: WarningEmitter,
}

impl TypeWarningEmitter {
    pub fn new(
        module_path: PathBuf,
        module_src: String,
        emitter: WarningEmitter
    ) -> Self {
        Self {
            module_path,
            module_src,
            emitter,
        }
    }

    pub fn null() -> Self {
        Self {
            module_path: PathBuf::new(),
            module_src: String::from(""),
            emitter: WarningEmitter::new(Rc::new(NullWarningEmitterIO)),
        }
    }

    pub fn emit(&self, warning: InferWarning) {
        self.emitter.emit(Warning::Type {
            path: self.module_path.clone(),
            src: self.module_src.clone(),
            warning,
        });
    }
}

/// Same scoping for warnings raised while a program is running.
pub struct RuntimeWarningEmitter {
    module_path: PathBuf,
    module_src: String,
    emitter: WarningEmitter,
}

impl RuntimeWarningEmitter {
    pub fn new(
        module_path: PathBuf,
        module_src: String,
        emitter: WarningEmitter
    ) -> Self {
        Self {
            module_path,
            module_src,
            emitter,
        }
    }

    pub fn null() -> Self {
        Self {
            module_path: PathBuf::new(),
            module_src: String::from(""),
            emitter: WarningEmitter::new(Rc::new(NullWarningEmitterIO)),
        }
    }

    pub fn emit(&self, warning: RuntimeWarning) {
        self.emitter.emit(Warning::Runtime {
            path: self.module_path.clone(),
            src: self.module_src.clone(),
            warning,
        });
    }
}

#[derive(Debug, Clone)]
pub enum Warning {
    Type {
        path: PathBuf,
        src: String,
        warning: InferWarning
    },
    Runtime {
        path: PathBuf,
        src: String,
        warning: RuntimeWarning
    }
}

impl Warning {
    pub fn pretty_string(&self) -> String {
        let mut nocolor = Buffer::no_color();
        self.pretty(&mut nocolor);
        String::from_utf8(nocolor.into_inner()).expect("Warning printing produced invalid utf8")
    }

    pub fn pretty(&self, buf: &mut Buffer) {
        use std::io::Write;

        self.to_diagnostic().write(buf);
        buf.write_all(b"\n")
            .expect("warning pretty buffer write space after");
    }

    pub fn compact_line(&self) -> String {
        self.to_diagnostic().to_compact_line()
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Warning::Type {
                path,
                src,
                warning
            } => match warning {
                InferWarning::TypeConflict { location, expected, got } => {
                    Diagnostic {
                        title: "Conflicting types".into(),
                        text: format!("Expected `{expected}`, but this is `{got}`"),
                        level: Level::Warning,
                        location: Some(Location {
                            src,
                            path: path.to_path_buf(),
                            label: Label {
                                text: None,
                                span: *location,
                            },
                            extra_labels: vec![]
                        }),
                        stacktrace: vec![],
                    }
                },
                InferWarning::ArityMismatch { location, expected, got } => {
                    Diagnostic {
                        title: "Wrong number of arguments".into(),
                        text: format!("This function takes {expected} argument(s), but {got} were given"),
                        level: Level::Warning,
                        location: Some(Location {
                            src,
                            path: path.to_path_buf(),
                            label: Label {
                                text: None,
                                span: *location,
                            },
                            extra_labels: vec![]
                        }),
                        stacktrace: vec![],
                    }
                },
                InferWarning::ParameterMismatch { location, index, expected, got } => {
                    Diagnostic {
                        title: "Argument type mismatch".into(),
                        text: format!("Argument {} is `{got}`, but earlier calls pass `{expected}`", index + 1),
                        level: Level::Warning,
                        location: Some(Location {
                            src,
                            path: path.to_path_buf(),
                            label: Label {
                                text: None,
                                span: *location,
                            },
                            extra_labels: vec![]
                        }),
                        stacktrace: vec![],
                    }
                },
                InferWarning::NotYetDeclared { location, name } => {
                    Diagnostic {
                        title: "Unknown name".into(),
                        text: format!("`{name}` is not declared at this point; evaluation will fail here"),
                        level: Level::Warning,
                        location: Some(Location {
                            src,
                            path: path.to_path_buf(),
                            label: Label {
                                text: None,
                                span: *location,
                            },
                            extra_labels: vec![]
                        }),
                        stacktrace: vec![],
                    }
                }
            },
            Warning::Runtime {
                path,
                src,
                warning
            } => match warning {
                RuntimeWarning::LetReassignment { location, name } => {
                    Diagnostic {
                        title: "Reassignment of `let` binding".into(),
                        text: format!("`{name}` was declared with `let`; the new value is kept anyway"),
                        level: Level::Warning,
                        location: Some(Location {
                            src,
                            path: path.to_path_buf(),
                            label: Label {
                                text: Some("Assigned here".into()),
                                span: *location,
                            },
                            extra_labels: vec![]
                        }),
                        stacktrace: vec![],
                    }
                },
                RuntimeWarning::ValueKindDrift { location, name, from, to } => {
                    Diagnostic {
                        title: "Value changes kind".into(),
                        text: format!("`{name}` held a {from} and now holds a {to}"),
                        level: Level::Warning,
                        location: Some(Location {
                            src,
                            path: path.to_path_buf(),
                            label: Label {
                                text: None,
                                span: *location,
                            },
                            extra_labels: vec![]
                        }),
                        stacktrace: vec![],
                    }
                },
                RuntimeWarning::DiscardedValue { location } => {
                    Diagnostic {
                        title: "Discarded call result".into(),
                        text: "".into(),
                        level: Level::Warning,
                        location: Some(Location {
                            src,
                            path: path.to_path_buf(),
                            label: Label {
                                text: Some("This value is never used".into()),
                                span: *location,
                            },
                            extra_labels: vec![]
                        }),
                        stacktrace: vec![],
                    }
                }
            }
        }
    }
}
