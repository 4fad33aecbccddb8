pub mod diagnostic;
pub mod error;
pub mod line_numbers;
pub mod src_span;
pub mod warning;

pub mod prelude {
    pub use super::{
        diagnostic::*,
        error::*,
        line_numbers::*,
        src_span::*,
        warning::*
    };
}
