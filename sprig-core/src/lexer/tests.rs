use super::prelude::{tokenize, Lexer, Token};

fn lex(input: &str) -> Vec<Token> {
    tokenize(input).into_iter().map(|(_, token, _)| token).collect()
}

fn lex_code(input: &str) -> Vec<Token> {
    lex(input).into_iter().filter(|token| {
        !token.is_trivia() && !matches!(token, Token::Newline | Token::Eof)
    }).collect()
}

#[test]
fn test_numbers() {
    let input = "10 0 1_000 123_456_789";

    let tokens = vec![
        Token::Int { value: 10, text: "10".into() },
        Token::Int { value: 0, text: "0".into() },
        Token::Int { value: 1000, text: "1_000".into() },
        Token::Int { value: 123456789, text: "123_456_789".into() },
    ];

    assert_eq!(lex_code(input), tokens);
}

#[test]
fn test_number_out_of_range() {
    let input = "99999999999999999999";

    assert_eq!(lex_code(input), vec![Token::Invalid(input.to_string())]);
}

#[test]
fn test_keywords_and_idents() {
    let input = "var let fn loopy loop break_ break and or";

    let tokens = vec![
        Token::Var,
        Token::Let,
        Token::Fn,
        Token::Ident("loopy".into()),
        Token::Loop,
        Token::Ident("break_".into()),
        Token::Break,
        Token::And,
        Token::Or,
    ];

    assert_eq!(lex_code(input), tokens);
}

#[test]
fn test_operators() {
    let input = "a == b != c <= d >= e < f > g = h";

    let tokens = vec![
        Token::Ident("a".into()),
        Token::EqualEqual,
        Token::Ident("b".into()),
        Token::NotEqual,
        Token::Ident("c".into()),
        Token::LessEqual,
        Token::Ident("d".into()),
        Token::GreaterEqual,
        Token::Ident("e".into()),
        Token::Less,
        Token::Ident("f".into()),
        Token::Greater,
        Token::Ident("g".into()),
        Token::Equal,
        Token::Ident("h".into()),
    ];

    assert_eq!(lex_code(input), tokens);
}

#[test]
fn test_char_and_text_literals() {
    let input = r#"'a' '\n' "hello" "a\"b""#;

    let tokens = vec![
        Token::CharLit { value: 'a', text: "'a'".into() },
        Token::CharLit { value: '\n', text: r"'\n'".into() },
        Token::TextLit { value: "hello".into(), text: r#""hello""#.into() },
        Token::TextLit { value: "a\"b".into(), text: r#""a\"b""#.into() },
    ];

    assert_eq!(lex_code(input), tokens);
}

#[test]
fn test_unterminated_text_is_invalid() {
    let tokens = lex_code("\"oops");

    assert_eq!(tokens, vec![Token::Invalid("\"oops".into())]);
}

#[test]
fn test_unrecognized_char_is_invalid() {
    let tokens = lex_code("a ? b");

    assert_eq!(tokens, vec![
        Token::Ident("a".into()),
        Token::Invalid("?".into()),
        Token::Ident("b".into()),
    ]);
}

#[test]
fn test_comments_are_kept() {
    let input = "var a = 1 // trailing note\nvar b = 2";

    let comments = lex(input).into_iter()
        .filter(|token| matches!(token, Token::Comment(_)))
        .count();

    assert_eq!(comments, 1);
}

#[test]
fn test_lexing_always_terminates() {
    let mut lexer = Lexer::new("'".char_indices().map(|(i, c)| (i as u32, c)));

    let mut count = 0;
    while let Some((_, token, _)) = lexer.next() {
        count += 1;
        if token == Token::Eof {
            break;
        }
        assert!(count < 100, "lexer failed to make progress");
    }
}

// Concatenating every token's exact text must reproduce the source,
// whitespace, comments and broken literals included.
#[test]
fn test_round_trip() {
    let inputs = [
        "var a = 1_000\n// comment\nvar b = a + 2",
        "  fn f a b {\n\treturn a * b\n}  ",
        "\"text with \\\"escapes\\\"\" 'x' '\\t'",
        "if a < b then { print(a) } else { print(b) }",
        "weird ? input @ with $ junk",
        "\"unterminated",
    ];

    for input in inputs {
        let rebuilt = tokenize(input).iter()
            .map(|(_, token, _)| token.as_literal())
            .collect::<String>();

        assert_eq!(rebuilt, input, "round trip failed");
    }
}

#[test]
fn test_spans_cover_source() {
    let input = "var abc = 'q' + \"xyz\"";

    for (start, token, end) in tokenize(input) {
        let literal = token.as_literal();
        assert_eq!(
            &input[start as usize..end as usize], literal,
            "span mismatch for {token:?}"
        );
    }
}
