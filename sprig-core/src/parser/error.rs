use crate::{lexer::prelude::Token, utils::prelude::SrcSpan};

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorType {
    ExpectedIdent,
    ExpectedExpression,
    ExpectedThen,
    ExpectedBinding,
    ExpectedTextLiteral,
    ExpectedCatchOrFinally,
    InvalidAssignmentTarget,
    InvalidToken { text: String },
    UnexpectedEof,
    UnexpectedToken {
        token: Token,
        expected: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub error: ParseErrorType,
    pub span: SrcSpan
}

impl ParseError {
    pub fn details(&self) -> (&'static str, Vec<String>) {
        match &self.error {
            ParseErrorType::ExpectedIdent => ("Expected an identifier", vec![]),
            ParseErrorType::ExpectedExpression => ("Expected an expression", vec![]),
            ParseErrorType::ExpectedThen => ("Expected `then` after the `if` condition", vec![]),
            ParseErrorType::ExpectedBinding => ("Expected a `var` or `let` binding inside `new { .. }`", vec![]),
            ParseErrorType::ExpectedTextLiteral => ("Expected a text literal", vec![]),
            ParseErrorType::ExpectedCatchOrFinally => ("Expected `catch` or `finally` after the `try` body", vec![]),
            ParseErrorType::InvalidAssignmentTarget => {
                ("Only an identifier or a member access can be assigned to", vec![])
            },
            ParseErrorType::InvalidToken { .. } => ("Not a valid token", vec![]),
            ParseErrorType::UnexpectedEof => ("Unexpected end of file", vec![]),
            ParseErrorType::UnexpectedToken { token, expected } => {
                let found = match token {
                    Token::Int { .. } => "an Int".to_string(),
                    Token::CharLit { .. } => "a Char".to_string(),
                    Token::TextLit { .. } => "a Text".to_string(),
                    Token::Ident(_) => "an Identifier".to_string(),
                    _ if token.is_reserved_word() => format!("the keyword `{}`", token.as_literal()),
                    _ => format!("`{}`", token.as_literal())
                };

                let messages = std::iter::once(format!("Found {found}, expected one of: "))
                    .chain(expected.iter().map(|s| format!("- {s}")))
                    .collect();

                ("Not expected this", messages)
            },
        }
    }
}
