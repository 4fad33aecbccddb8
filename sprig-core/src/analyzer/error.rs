use crate::utils::prelude::SrcSpan;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problems {
    errors: Vec<InferError>,
    warnings: Vec<Warning>,
}

impl Problems {
    pub fn error(&mut self, error: InferError) {
        self.errors.push(error)
    }

    pub fn take_errors(&mut self) -> Vec<InferError> {
        std::mem::take(&mut self.errors)
    }

    pub fn warning(&mut self, warning: Warning) {
        self.warnings.push(warning)
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn sort(&mut self) {
        self.errors.sort_by_key(|e| e.start_location());
        self.warnings.sort_by_key(|w| w.location().start);
    }
}

/// The pass degrades gracefully: everything it finds is a warning, except
/// redeclaration in one scope, which evaluation would also refuse.
#[derive(Debug, Clone, PartialEq)]
pub enum InferError {
    /// Occurs when a name is declared twice in the same lexical scope.
    ///
    /// ```text
    /// var a = 1
    /// var a = 2   <- `a` was declared twice in the same scope
    /// ```
    Redeclaration {
        location_a: SrcSpan,
        location_b: SrcSpan,
        name: String,
    },
}

impl InferError {
    pub fn start_location(&self) -> u32 {
        match self {
            InferError::Redeclaration { location_b: location, .. } => location.start
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Two observations of the same binding or expression disagree
    /// structurally; the newer one wins.
    TypeConflict {
        location: SrcSpan,
        expected: String,
        got: String,
    },
    /// A call site passes a different number of arguments than the
    /// function's inferred spec takes.
    ArityMismatch {
        location: SrcSpan,
        expected: usize,
        got: usize,
    },
    /// An argument disagrees with the parameter spec inferred from earlier
    /// call sites.
    ParameterMismatch {
        location: SrcSpan,
        index: usize,
        expected: String,
        got: String,
    },
    /// A name is used before any declaration of it is in scope; evaluation
    /// will fault here.
    NotYetDeclared {
        location: SrcSpan,
        name: String,
    },
}

impl Warning {
    pub fn location(&self) -> SrcSpan {
        match self {
            Warning::TypeConflict { location, .. }
            | Warning::ArityMismatch { location, .. }
            | Warning::ParameterMismatch { location, .. }
            | Warning::NotYetDeclared { location, .. } => *location
        }
    }
}
