use std::fmt::Display;

use crate::{
    lexer::prelude::{Spanned, Token},
    parser::prelude::{parse_error, InfixParse, Parse, ParseErrorType, Parser, Precedence},
    utils::prelude::SrcSpan
};

#[derive(Debug)]
pub struct Parsed {
    pub module: Module,
    pub comments: Vec<SrcSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub program: Program
}

// program -> { <statement> }
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Expression>,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for Program {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let mut statements = vec![];

        loop {
            parser.skip_newline();

            match &parser.current_token {
                Some((_, Token::Eof, _)) | None => break,
                _ => statements.push(Expression::parse(parser, None)?)
            }
        }

        let location = match (statements.first(), statements.last()) {
            (Some(first), Some(last)) => first.location().up_to(last.location()),
            _ => SrcSpan::default()
        };

        Ok(Self {
            statements,
            location
        })
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let statements = self.statements.iter()
            .map(|statement| format!("{statement}"))
            .collect::<Vec<String>>();

        write!(f, "{}", statements.join("\n"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// An ordinary name.
    Name,
    /// An operator spelling such as `+`; resolved through the environment
    /// like any other name, to the builtin registered under it.
    Operator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub kind: IdentifierKind,
    pub location: SrcSpan
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<(u32, String, u32)> for Identifier {
    fn from(value: (u32, String, u32)) -> Self {
        Identifier {
            name: value.1,
            kind: IdentifierKind::Name,
            location: SrcSpan { start: value.0, end: value.2 }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Var,
    Let
}

// declaration -> ("var" | "let") <identifier> "=" <expression>
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: Identifier,
    pub value: Expression,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for Declaration {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (kind, start) = match &parser.current_token {
            Some((start, Token::Var, _)) => (DeclarationKind::Var, *start),
            Some((start, Token::Let, _)) => (DeclarationKind::Let, *start),
            _ => return parser.unexpected(vec!["`var`".into(), "`let`".into()])
        };
        parser.step();

        parser.skip_newline();
        let name = Identifier::from(parser.expect_ident()?);

        parser.skip_newline();
        parser.expect_one(Token::Equal)?;

        let mut value = Expression::parse(parser, None)?;

        // A function bound straight to a name carries that name into its
        // runtime frames.
        if let Expression::Function(function) = &mut value {
            if function.name.is_none() {
                function.name = Some(name.name.clone());
            }
        }

        let location = SrcSpan { start, end: value.location().end };

        Ok(Self {
            kind,
            name,
            value,
            location
        })
    }
}

impl Display for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keyword = match self.kind {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let"
        };

        write!(f, "{} {} = {}", keyword, self.name, self.value)
    }
}

// assignment -> <assignable> "=" <expression>
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Expression,
    pub value: Expression,
    pub location: SrcSpan
}

impl Assignment {
    pub fn parse<T: Iterator<Item = Spanned>>(
        parser: &mut Parser<T>,
        target: Expression
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        if !target.is_assignable() {
            return parse_error(ParseErrorType::InvalidAssignmentTarget, target.location());
        }

        parser.expect_one(Token::Equal)?;

        let mut value = Expression::parse(parser, None)?;

        if let (Expression::Identifier(target), Expression::Function(function)) = (&target, &mut value) {
            if function.name.is_none() {
                function.name = Some(target.name.clone());
            }
        }

        let location = target.location().up_to(value.location());

        Ok(Self {
            target,
            value,
            location
        })
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.target, self.value)
    }
}

// conditional -> "if" <expression> "then" <expression> ["else" <expression>]
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Expression,
    pub consequence: Expression,
    pub alternative: Option<Expression>,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for Conditional {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, _) = parser.expect_one(Token::If)?;

        let condition = Expression::parse(parser, None)?;

        parser.skip_newline();
        if let Err(err) = parser.expect_one(Token::Then) {
            return parse_error(ParseErrorType::ExpectedThen, err.span);
        }

        let consequence = Expression::parse(parser, None)?;
        let mut end = consequence.location().end;

        parser.skip_newline();
        let alternative = match &parser.current_token {
            Some((_, Token::Else, _)) => {
                parser.step();

                let alternative = Expression::parse(parser, None)?;
                end = alternative.location().end;

                Some(alternative)
            },
            _ => None
        };

        Ok(Self {
            condition,
            consequence,
            alternative,
            location: SrcSpan { start, end }
        })
    }
}

impl Display for Conditional {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "if {} then {}", self.condition, self.consequence)?;

        if let Some(alternative) = &self.alternative {
            write!(f, " else {alternative}")?;
        }

        Ok(())
    }
}

// loop -> "loop" <sequence>
#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub body: Sequence,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for Loop {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, _) = parser.expect_one(Token::Loop)?;

        parser.skip_newline();
        let body = Sequence::parse(parser, None)?;

        let location = SrcSpan { start, end: body.location.end };

        Ok(Self {
            body,
            location
        })
    }
}

impl Display for Loop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "loop {}", self.body)
    }
}

// return -> "return" [<expression>], operand ends at the line break
#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub value: Option<Expression>,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for Return {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, mut end) = parser.expect_one(Token::Return)?;

        let value = match &parser.current_token {
            Some((
                _,
                Token::Newline
                | Token::RBrace
                | Token::RParen
                | Token::RSBracket
                | Token::Comma
                | Token::Else
                | Token::Eof,
                _
            ))
            | None => None,
            _ => {
                let value = Expression::parse(parser, None)?;
                end = value.location().end;
                Some(value)
            }
        };

        Ok(Self {
            value,
            location: SrcSpan { start, end }
        })
    }
}

impl Display for Return {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "return {value}"),
            None => write!(f, "return")
        }
    }
}

// function -> "fn" { <identifier> } <sequence>
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLit {
    /// Picked up from the enclosing binding, if any; names runtime frames.
    pub name: Option<String>,
    pub parameters: Vec<Identifier>,
    pub body: Sequence,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for FunctionLit {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, _) = parser.expect_one(Token::Fn)?;

        let mut parameters = vec![];

        loop {
            parser.skip_newline();

            match &parser.current_token {
                Some((_, Token::Ident(_), _)) => {
                    parameters.push(Identifier::from(parser.expect_ident()?));
                },
                Some((_, Token::LBrace, _)) => break,
                _ => return parser.unexpected(vec!["a parameter name".into(), "`{`".into()])
            }
        }

        let body = Sequence::parse(parser, None)?;
        let location = SrcSpan { start, end: body.location.end };

        Ok(Self {
            name: None,
            parameters,
            body,
            location
        })
    }
}

impl Display for FunctionLit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn")?;

        for parameter in &self.parameters {
            write!(f, " {parameter}")?;
        }

        write!(f, " {}", self.body)
    }
}

// apply -> <expression> "(" [<expression> {"," <expression>}] ")",
// or the rewritten form of an infix operator use
#[derive(Debug, Clone, PartialEq)]
pub struct Apply {
    pub function: Expression,
    pub arguments: Vec<Expression>,
    pub location: SrcSpan
}

impl Apply {
    pub fn parse_call<T: Iterator<Item = Spanned>>(
        parser: &mut Parser<T>,
        function: Expression
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        parser.expect_one(Token::LParen)?;

        let mut arguments = vec![];

        let end = loop {
            parser.skip_newline();

            if let Some((_, Token::RParen, _)) = &parser.current_token {
                break parser.expect_one(Token::RParen)?.1;
            }

            arguments.push(Expression::parse(parser, None)?);
            parser.skip_newline();

            match &parser.current_token {
                Some((_, Token::Comma, _)) => parser.step(),
                Some((_, Token::RParen, _)) => {},
                _ => return parser.unexpected(vec!["`,`".into(), "`)`".into()])
            }
        };

        let location = SrcSpan { start: function.location().start, end };

        Ok(Self {
            function,
            arguments,
            location
        })
    }

    /// Whether this application was written as an infix operator use, which
    /// is how it prints back.
    pub fn as_infix(&self) -> Option<(&Identifier, &Expression, &Expression)> {
        match (&self.function, self.arguments.as_slice()) {
            (Expression::Identifier(op), [left, right])
                if op.kind == IdentifierKind::Operator => Some((op, left, right)),
            _ => None
        }
    }
}

impl<T: Iterator<Item = Spanned>> InfixParse<T> for Apply {
    fn parse(
        parser: &mut Parser<T>,
        left: Expression,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let precedence = parser.current_precedence();

        let operator = match parser.current_token.take() {
            Some((start, token, end)) if token.is_operator() => {
                parser.step();

                Identifier {
                    name: token.as_literal(),
                    kind: IdentifierKind::Operator,
                    location: SrcSpan { start, end }
                }
            },
            tok => {
                parser.current_token = tok;
                return parser.unexpected(vec!["an operator".into()]);
            }
        };

        let right = Expression::parse(parser, Some(precedence))?;

        let location = left.location().up_to(right.location());

        Ok(Self {
            function: Expression::Identifier(operator),
            arguments: vec![left, right],
            location
        })
    }
}

impl Display for Apply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some((op, left, right)) = self.as_infix() {
            return write!(f, "{left} {op} {right}");
        }

        let arguments = self.arguments.iter()
            .map(|argument| format!("{argument}"))
            .collect::<Vec<String>>();

        write!(f, "{}({})", self.function, arguments.join(", "))
    }
}

// member_access -> <expression> "." <identifier>
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccess {
    pub container: Expression,
    pub member: Identifier,
    pub location: SrcSpan
}

impl MemberAccess {
    pub fn parse<T: Iterator<Item = Spanned>>(
        parser: &mut Parser<T>,
        container: Expression
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        parser.expect_one(Token::Dot)?;

        parser.skip_newline();
        let member = Identifier::from(parser.expect_ident()?);

        let location = SrcSpan {
            start: container.location().start,
            end: member.location.end
        };

        Ok(Self {
            container,
            member,
            location
        })
    }
}

impl Display for MemberAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.container, self.member)
    }
}

// array -> "[" [<expression> {"," <expression>}] "]"
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLit {
    pub elements: Vec<Expression>,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for ArrayLit {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, _) = parser.expect_one(Token::LSBracket)?;

        let mut elements = vec![];

        let end = loop {
            parser.skip_newline();

            if let Some((_, Token::RSBracket, _)) = &parser.current_token {
                break parser.expect_one(Token::RSBracket)?.1;
            }

            elements.push(Expression::parse(parser, None)?);
            parser.skip_newline();

            match &parser.current_token {
                Some((_, Token::Comma, _)) => parser.step(),
                Some((_, Token::RSBracket, _)) => {},
                _ => return parser.unexpected(vec!["`,`".into(), "`]`".into()])
            }
        };

        Ok(Self {
            elements,
            location: SrcSpan { start, end }
        })
    }
}

impl Display for ArrayLit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let elements = self.elements.iter()
            .map(|element| format!("{element}"))
            .collect::<Vec<String>>();

        write!(f, "[{}]", elements.join(", "))
    }
}

// class_body -> "{" { <declaration> } "}"
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBody {
    pub bindings: Vec<Declaration>,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for ClassBody {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, _) = parser.expect_one(Token::LBrace)?;

        let mut bindings = vec![];

        let end = loop {
            parser.skip_newline();

            match &parser.current_token {
                Some((_, Token::RBrace, _)) => break parser.expect_one(Token::RBrace)?.1,
                Some((_, Token::Var | Token::Let, _)) => {
                    bindings.push(Declaration::parse(parser, None)?);
                },
                Some((_, Token::Eof, _)) | None => {
                    let span = parser.current_span();
                    return parse_error(ParseErrorType::UnexpectedEof, span);
                },
                Some((start, _, end)) => {
                    return parse_error(
                        ParseErrorType::ExpectedBinding,
                        SrcSpan { start: *start, end: *end }
                    );
                }
            }
        };

        Ok(Self {
            bindings,
            location: SrcSpan { start, end }
        })
    }
}

impl Display for ClassBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.bindings.is_empty() {
            return write!(f, "{{}}");
        }

        let bindings = self.bindings.iter()
            .map(|binding| format!("{binding}"))
            .collect::<Vec<String>>();

        write!(f, "{{\n{}\n}}", bindings.join("\n"))
    }
}

// new -> "new" <class_body>
#[derive(Debug, Clone, PartialEq)]
pub struct New {
    pub body: ClassBody,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for New {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, _) = parser.expect_one(Token::New)?;

        parser.skip_newline();
        let body = ClassBody::parse(parser, None)?;

        let location = SrcSpan { start, end: body.location.end };

        Ok(Self {
            body,
            location
        })
    }
}

impl Display for New {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "new {}", self.body)
    }
}

// import -> "import" <text>
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub path: String,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for Import {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, _) = parser.expect_one(Token::Import)?;

        parser.skip_newline();
        match parser.current_token.take() {
            Some((_, Token::TextLit { value, .. }, end)) => {
                parser.step();

                Ok(Self {
                    path: value,
                    location: SrcSpan { start, end }
                })
            },
            tok => {
                let span = match &tok {
                    Some((start, _, end)) => SrcSpan { start: *start, end: *end },
                    None => SrcSpan::default()
                };
                parser.current_token = tok;

                parse_error(ParseErrorType::ExpectedTextLiteral, span)
            }
        }
    }
}

impl Display for Import {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "import \"{}\"", escape_text(&self.path))
    }
}

// throw -> "throw" <expression>
#[derive(Debug, Clone, PartialEq)]
pub struct Throw {
    pub value: Expression,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for Throw {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, _) = parser.expect_one(Token::Throw)?;

        let value = Expression::parse(parser, None)?;
        let location = SrcSpan { start, end: value.location().end };

        Ok(Self {
            value,
            location
        })
    }
}

impl Display for Throw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "throw {}", self.value)
    }
}

// try -> "try" <expression> ["catch" <identifier> <expression>]
//        ["finally" <expression>]
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub binding: Identifier,
    pub handler: Expression,
    pub location: SrcSpan
}

#[derive(Debug, Clone, PartialEq)]
pub struct Try {
    pub body: Expression,
    pub catch: Option<CatchClause>,
    pub finally: Option<Expression>,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for Try {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, _) = parser.expect_one(Token::Try)?;

        let body = Expression::parse(parser, None)?;
        let mut end = body.location().end;

        parser.skip_newline();
        let catch = match &parser.current_token {
            Some((catch_start, Token::Catch, _)) => {
                let catch_start = *catch_start;
                parser.step();

                parser.skip_newline();
                let binding = Identifier::from(parser.expect_ident()?);
                let handler = Expression::parse(parser, None)?;

                end = handler.location().end;

                Some(CatchClause {
                    location: SrcSpan { start: catch_start, end },
                    binding,
                    handler,
                })
            },
            _ => None
        };

        parser.skip_newline();
        let finally = match &parser.current_token {
            Some((_, Token::Finally, _)) => {
                parser.step();

                let finalizer = Expression::parse(parser, None)?;
                end = finalizer.location().end;

                Some(finalizer)
            },
            _ => None
        };

        if catch.is_none() && finally.is_none() {
            return parse_error(
                ParseErrorType::ExpectedCatchOrFinally,
                SrcSpan { start, end }
            );
        }

        Ok(Self {
            body,
            catch,
            finally,
            location: SrcSpan { start, end }
        })
    }
}

impl Display for Try {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "try {}", self.body)?;

        if let Some(catch) = &self.catch {
            write!(f, " catch {} {}", catch.binding, catch.handler)?;
        }

        if let Some(finally) = &self.finally {
            write!(f, " finally {finally}")?;
        }

        Ok(())
    }
}

// sequence -> "{" { <statement> } "}", evaluated in a fresh scope
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub statements: Vec<Expression>,
    pub location: SrcSpan
}

impl<T: Iterator<Item = Spanned>> Parse<T> for Sequence {
    fn parse(
        parser: &mut Parser<T>,
        _precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        let (start, _) = parser.expect_one(Token::LBrace)?;

        let mut statements = vec![];

        let end = loop {
            parser.skip_newline();

            match &parser.current_token {
                Some((_, Token::RBrace, _)) => break parser.expect_one(Token::RBrace)?.1,
                Some((_, Token::Eof, _)) | None => {
                    let span = parser.current_span();
                    return parse_error(ParseErrorType::UnexpectedEof, span);
                },
                _ => statements.push(Expression::parse(parser, None)?)
            }
        };

        Ok(Self {
            statements,
            location: SrcSpan { start, end }
        })
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "{{}}");
        }

        let statements = self.statements.iter()
            .map(|statement| format!("{statement}"))
            .collect::<Vec<String>>();

        write!(f, "{{\n{}\n}}", statements.join("\n"))
    }
}

// expression -> the one sum type every component dispatches over
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    Int {
        value: i64,
        location: SrcSpan
    },
    Bool {
        value: bool,
        location: SrcSpan
    },
    CharLit {
        value: char,
        location: SrcSpan
    },
    TextLit {
        value: String,
        location: SrcSpan
    },
    Array(ArrayLit),
    Function(Box<FunctionLit>),
    Declaration(Box<Declaration>),
    Assignment(Box<Assignment>),
    Conditional(Box<Conditional>),
    Loop(Box<Loop>),
    Break {
        location: SrcSpan
    },
    Continue {
        location: SrcSpan
    },
    Return(Box<Return>),
    Apply(Box<Apply>),
    MemberAccess(Box<MemberAccess>),
    New(Box<New>),
    Import(Box<Import>),
    Throw(Box<Throw>),
    Try(Box<Try>),
    Sequence(Box<Sequence>),
    /// Explicit grouping parentheses. Precedence climbing never rewrites
    /// through this, and the printer restores the parentheses.
    Grouped {
        expression: Box<Expression>,
        location: SrcSpan
    }
}

impl<T: Iterator<Item = Spanned>> Parse<T> for Expression {
    fn parse(
        parser: &mut Parser<T>,
        precedence: Option<Precedence>
    ) -> Result<Self, crate::parser::prelude::ParseError> {
        parser.skip_newline();

        let mut expr = match &parser.current_token {
            Some((start, token, end)) => {
                let (start, end) = (*start, *end);

                match token {
                    Token::Ident(_) => {
                        Self::Identifier(Identifier::from(parser.expect_ident()?))
                    },
                    Token::Int { value, .. } => {
                        let value = *value;
                        parser.step();
                        Self::Int { value, location: SrcSpan { start, end } }
                    },
                    Token::True => {
                        parser.step();
                        Self::Bool { value: true, location: SrcSpan { start, end } }
                    },
                    Token::False => {
                        parser.step();
                        Self::Bool { value: false, location: SrcSpan { start, end } }
                    },
                    Token::CharLit { value, .. } => {
                        let value = *value;
                        parser.step();
                        Self::CharLit { value, location: SrcSpan { start, end } }
                    },
                    Token::TextLit { value, .. } => {
                        let value = value.clone();
                        parser.step();
                        Self::TextLit { value, location: SrcSpan { start, end } }
                    },
                    Token::Var | Token::Let => {
                        Self::Declaration(Box::new(Declaration::parse(parser, None)?))
                    },
                    Token::Fn => Self::Function(Box::new(FunctionLit::parse(parser, None)?)),
                    Token::If => Self::Conditional(Box::new(Conditional::parse(parser, None)?)),
                    Token::Loop => Self::Loop(Box::new(Loop::parse(parser, None)?)),
                    Token::Break => {
                        parser.step();
                        Self::Break { location: SrcSpan { start, end } }
                    },
                    Token::Continue => {
                        parser.step();
                        Self::Continue { location: SrcSpan { start, end } }
                    },
                    Token::Return => Self::Return(Box::new(Return::parse(parser, None)?)),
                    Token::New => Self::New(Box::new(New::parse(parser, None)?)),
                    Token::Import => Self::Import(Box::new(Import::parse(parser, None)?)),
                    Token::Throw => Self::Throw(Box::new(Throw::parse(parser, None)?)),
                    Token::Try => Self::Try(Box::new(Try::parse(parser, None)?)),
                    Token::LBrace => Self::Sequence(Box::new(Sequence::parse(parser, None)?)),
                    Token::LSBracket => Self::Array(ArrayLit::parse(parser, None)?),
                    Token::LParen => {
                        parser.expect_one(Token::LParen)?;

                        let expression = Box::new(Expression::parse(parser, None)?);

                        parser.skip_newline();
                        let (_, end) = parser.expect_one(Token::RParen)?;

                        Self::Grouped {
                            expression,
                            location: SrcSpan { start, end }
                        }
                    },
                    Token::Invalid(text) => {
                        return parse_error(
                            ParseErrorType::InvalidToken { text: text.clone() },
                            SrcSpan { start, end }
                        );
                    },
                    _ => return parser.unexpected(vec!["an expression".into()])
                }
            },
            None => {
                return parse_error(ParseErrorType::UnexpectedEof, SrcSpan::default());
            }
        };

        // Application and member access are postfix and bind tightest; both
        // must be adjacent (no line break before `(` or `.`).
        loop {
            expr = match &parser.current_token {
                Some((_, Token::LParen, _)) => {
                    Self::Apply(Box::new(Apply::parse_call(parser, expr)?))
                },
                Some((_, Token::Dot, _)) => {
                    Self::MemberAccess(Box::new(MemberAccess::parse(parser, expr)?))
                },
                _ => break
            };
        }

        let minimum = precedence.unwrap_or(Precedence::Lowest);

        loop {
            parser.skip_newline();

            match &parser.current_token {
                Some((_, token, _)) if token.is_operator()
                    && minimum < parser.current_precedence() =>
                {
                    expr = Self::Apply(Box::new(Apply::parse(parser, expr, precedence)?));
                },
                _ => break
            }
        }

        // Assignment binds loosest and associates to the right.
        if minimum == Precedence::Lowest {
            if let Some((_, Token::Equal, _)) = &parser.current_token {
                return Ok(Self::Assignment(Box::new(Assignment::parse(parser, expr)?)));
            }
        }

        Ok(expr)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(ident) => write!(f, "{ident}"),
            Self::Int { value, .. } => write!(f, "{value}"),
            Self::Bool { value, .. } => write!(f, "{value}"),
            Self::CharLit { value, .. } => write!(f, "'{}'", escape_char(*value)),
            Self::TextLit { value, .. } => write!(f, "\"{}\"", escape_text(value)),
            Self::Array(array) => write!(f, "{array}"),
            Self::Function(function) => write!(f, "{function}"),
            Self::Declaration(declaration) => write!(f, "{declaration}"),
            Self::Assignment(assignment) => write!(f, "{assignment}"),
            Self::Conditional(conditional) => write!(f, "{conditional}"),
            Self::Loop(loop_) => write!(f, "{loop_}"),
            Self::Break { .. } => write!(f, "break"),
            Self::Continue { .. } => write!(f, "continue"),
            Self::Return(return_) => write!(f, "{return_}"),
            Self::Apply(apply) => write!(f, "{apply}"),
            Self::MemberAccess(access) => write!(f, "{access}"),
            Self::New(new) => write!(f, "{new}"),
            Self::Import(import) => write!(f, "{import}"),
            Self::Throw(throw) => write!(f, "{throw}"),
            Self::Try(try_) => write!(f, "{try_}"),
            Self::Sequence(sequence) => write!(f, "{sequence}"),
            Self::Grouped { expression, .. } => write!(f, "({expression})")
        }
    }
}

impl Expression {
    pub fn location(&self) -> SrcSpan {
        match self {
            Self::Identifier(ident) => ident.location,
            Self::Int { location, .. }
            | Self::Bool { location, .. }
            | Self::CharLit { location, .. }
            | Self::TextLit { location, .. }
            | Self::Break { location }
            | Self::Continue { location }
            | Self::Grouped { location, .. } => *location,
            Self::Array(array) => array.location,
            Self::Function(function) => function.location,
            Self::Declaration(declaration) => declaration.location,
            Self::Assignment(assignment) => assignment.location,
            Self::Conditional(conditional) => conditional.location,
            Self::Loop(loop_) => loop_.location,
            Self::Return(return_) => return_.location,
            Self::Apply(apply) => apply.location,
            Self::MemberAccess(access) => access.location,
            Self::New(new) => new.location,
            Self::Import(import) => import.location,
            Self::Throw(throw) => throw.location,
            Self::Try(try_) => try_.location,
            Self::Sequence(sequence) => sequence.location,
        }
    }

    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::Identifier(_) | Self::MemberAccess(_))
    }
}

pub fn escape_char(value: char) -> String {
    match value {
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        '\0' => "\\0".to_string(),
        '\\' => "\\\\".to_string(),
        '\'' => "\\'".to_string(),
        other => other.to_string()
    }
}

pub fn escape_text(value: &str) -> String {
    value.chars()
        .map(|ch| match ch {
            '"' => "\\\"".to_string(),
            '\'' => "'".to_string(),
            other => escape_char(other)
        })
        .collect()
}
