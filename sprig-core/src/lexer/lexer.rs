use super::token::{str_to_keyword, Token};

pub type Spanned = (u32, Token, u32);

/// A total lexer: every input, malformed or not, becomes a finite token
/// stream ending in `Eof`. Unrecognized characters and broken literals come
/// out as `Token::Invalid` holding their exact source text.
#[derive(Debug)]
pub struct Lexer<T: Iterator<Item = (u32, char)>> {
    position: u32,
    next_position: u32,
    ch: Option<char>,
    next_ch: Option<char>,
    input: T,

    done: bool,
}

impl<T: Iterator<Item = (u32, char)>> Lexer<T> {
    pub fn new(input: T) -> Self {
        let mut lexer = Self {
            position: 0,
            next_position: 0,
            ch: None,
            next_ch: None,
            input,

            done: false,
        };

        lexer.next_char();
        lexer.next_char();

        lexer
    }

    pub fn next_token(&mut self) -> Spanned {
        match self.ch {
            Some(ch) => match ch {
                '{' => self.eat_one_char(Token::LBrace),
                '}' => self.eat_one_char(Token::RBrace),
                '(' => self.eat_one_char(Token::LParen),
                ')' => self.eat_one_char(Token::RParen),
                '[' => self.eat_one_char(Token::LSBracket),
                ']' => self.eat_one_char(Token::RSBracket),
                ',' => self.eat_one_char(Token::Comma),
                '.' => self.eat_one_char(Token::Dot),
                '+' => self.eat_one_char(Token::Plus),
                '-' => self.eat_one_char(Token::Minus),
                '*' => self.eat_one_char(Token::Star),
                '/' if self.next_ch == Some('/') => self.lex_comment(),
                '/' => self.eat_one_char(Token::Slash),
                '=' if self.next_ch == Some('=') => self.eat_two_chars(Token::EqualEqual),
                '=' => self.eat_one_char(Token::Equal),
                '!' if self.next_ch == Some('=') => self.eat_two_chars(Token::NotEqual),
                '<' if self.next_ch == Some('=') => self.eat_two_chars(Token::LessEqual),
                '<' => self.eat_one_char(Token::Less),
                '>' if self.next_ch == Some('=') => self.eat_two_chars(Token::GreaterEqual),
                '>' => self.eat_one_char(Token::Greater),
                '\n' => self.eat_one_char(Token::Newline),
                ' ' | '\t' | '\r' | '\x0C' => self.lex_whitespace(),
                '\'' => self.lex_char(),
                '"' => self.lex_text(),
                'a'..='z' | 'A'..='Z' | '_' => self.lex_ident(),
                '0'..='9' => self.lex_number(),
                c => {
                    let start = self.position;
                    self.next_char();
                    (start, Token::Invalid(c.to_string()), self.position)
                }
            },
            None => {
                self.done = true;
                (self.position, Token::Eof, self.position)
            }
        }
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.ch;

        let next = match self.input.next() {
            Some((pos, ch)) => {
                self.position = self.next_position;
                self.next_position = pos;

                Some(ch)
            },
            None => {
                self.position = self.next_position;
                self.next_position += 1;

                None
            }
        };

        self.ch = self.next_ch;
        self.next_ch = next;

        ch
    }

    fn eat_one_char(&mut self, token: Token) -> Spanned {
        let start = self.position;
        self.next_char();
        (start, token, self.position)
    }

    fn eat_two_chars(&mut self, token: Token) -> Spanned {
        let start = self.position;
        self.next_char();
        self.next_char();
        (start, token, self.position)
    }

    fn lex_whitespace(&mut self) -> Spanned {
        let start = self.position;
        let mut text = String::new();

        while let Some(ch) = self.ch {
            if matches!(ch, ' ' | '\t' | '\r' | '\x0C') {
                text.push(ch);
                self.next_char();
            } else {
                break;
            }
        }

        (start, Token::Whitespace(text), self.position)
    }

    fn lex_comment(&mut self) -> Spanned {
        let start = self.position;
        let mut text = String::new();

        while let Some(ch) = self.ch {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.next_char();
        }

        (start, Token::Comment(text), self.position)
    }

    fn lex_ident(&mut self) -> Spanned {
        let start = self.position;
        let mut ident = String::new();

        while let Some(ch) = self.ch {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.next_char();
            } else {
                break;
            }
        }

        let token = match str_to_keyword(&ident) {
            Some(keyword) => keyword,
            None => Token::Ident(ident),
        };

        (start, token, self.position)
    }

    fn lex_number(&mut self) -> Spanned {
        let start = self.position;
        let mut text = String::new();

        while let Some(ch) = self.ch {
            if ch.is_ascii_digit() || ch == '_' {
                text.push(ch);
                self.next_char();
            } else {
                break;
            }
        }

        // `_` is a readability separator only.
        let digits = text.replace('_', "");

        let token = match digits.parse::<i64>() {
            Ok(value) => Token::Int { value, text },
            Err(_) => Token::Invalid(text),
        };

        (start, token, self.position)
    }

    fn lex_char(&mut self) -> Spanned {
        let start = self.position;
        let mut text = String::new();

        text.push('\'');
        self.next_char();

        let value = match self.ch {
            Some('\\') => {
                text.push('\\');
                self.next_char();

                match self.ch {
                    Some(escaped) => {
                        text.push(escaped);
                        self.next_char();
                        unescape(escaped)
                    },
                    None => return (start, Token::Invalid(text), self.position),
                }
            },
            Some(ch) if ch != '\'' && ch != '\n' => {
                text.push(ch);
                self.next_char();
                Some(ch)
            },
            _ => None,
        };

        match (value, self.ch) {
            (Some(value), Some('\'')) => {
                text.push('\'');
                self.next_char();
                (start, Token::CharLit { value, text }, self.position)
            },
            _ => (start, Token::Invalid(text), self.position),
        }
    }

    fn lex_text(&mut self) -> Spanned {
        let start = self.position;
        let mut text = String::new();
        let mut value = String::new();

        text.push('"');
        self.next_char();

        loop {
            match self.ch {
                Some('"') => {
                    text.push('"');
                    self.next_char();
                    return (start, Token::TextLit { value, text }, self.position);
                },
                Some('\\') => {
                    text.push('\\');
                    self.next_char();

                    match self.ch {
                        Some(escaped) => {
                            text.push(escaped);
                            self.next_char();

                            match unescape(escaped) {
                                Some(ch) => value.push(ch),
                                None => return (start, Token::Invalid(text), self.position),
                            }
                        },
                        None => return (start, Token::Invalid(text), self.position),
                    }
                },
                Some('\n') | None => return (start, Token::Invalid(text), self.position),
                Some(ch) => {
                    text.push(ch);
                    value.push(ch);
                    self.next_char();
                }
            }
        }
    }
}

fn unescape(ch: char) -> Option<char> {
    match ch {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '0' => Some('\0'),
        '\\' => Some('\\'),
        '\'' => Some('\''),
        '"' => Some('"'),
        _ => None,
    }
}

impl<T: Iterator<Item = (u32, char)>> Iterator for Lexer<T> {
    type Item = Spanned;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        Some(self.next_token())
    }
}

/// Tokenize a source string completely, terminal `Eof` included.
pub fn tokenize(src: &str) -> Vec<Spanned> {
    Lexer::new(src.char_indices().map(|(i, c)| (i as u32, c))).collect()
}
