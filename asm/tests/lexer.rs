use simasm::token::{TokenKind, TokenKind::*};

fn assert(code: &str, expects: Vec<(TokenKind, &str)>) {
    use simasm::lexer::LineLexer;
    let tokens = LineLexer::new(code, 0, 0).parse().unwrap();

    println!(" {code}");
    for token in &tokens {
        print!("\r\x1b[{}C^", token.pos().col + 1);
    }
    println!();
    for (idx, token) in tokens.iter().enumerate() {
        println!("{:>2}: {:?} {:?}", idx, token.kind(), token.text());
    }

    assert_eq!(tokens.len(), expects.len());
    for (token, (kind, text)) in tokens.iter().zip(expects) {
        assert_eq!(token.kind(), kind);
        assert_eq!(token.text(), text);
    }
}

fn reject(code: &str, col: usize) {
    use simasm::lexer::LineLexer;
    let err = LineLexer::new(code, 0, 0).parse().unwrap_err();
    println!(" {code}\n {err}");
    assert_eq!(err.kind(), simasm::ErrorKind::Lexical);
    assert_eq!(err.pos().map(|pos| pos.col), Some(col));
}

macro_rules! case {
    ($name:ident, $code:expr, $expects:expr) => {
        #[test]
        fn $name() {
            assert($code, $expects);
        }
    };
}

macro_rules! fail {
    ($name:ident, $code:expr, $col:expr) => {
        #[test]
        fn $name() {
            reject($code, $col);
        }
    };
}

// ---- Single tokens ----
case!(identifier, "foo_bar.1", vec![(Identifier, "foo_bar.1")]);
case!(label, "foo123:", vec![(Label, "foo123:")]);
case!(directive, ".asciiz", vec![(Directive, ".asciiz")]);
case!(register_name, "$t0", vec![(Register, "$t0")]);
case!(register_number, "$31", vec![(Register, "$31")]);
case!(mnemonic, "addiu", vec![(Mnemonic, "addiu")]);
case!(upper_case_is_identifier, "ADDIU", vec![(Identifier, "ADDIU")]);
case!(decimal, "42", vec![(IntegerConstant, "42")]);
case!(negative, "-42", vec![(IntegerConstant, "-42")]);
case!(octal, "017", vec![(IntegerConstant, "017")]);
case!(hex, "0x1F", vec![(IntegerConstant, "0x1F")]);
case!(zero, "0", vec![(IntegerConstant, "0")]);
case!(string, "\"hi there\"", vec![(StringLiteral, "hi there")]);
case!(string_quote, r#""say \"hi\"""#, vec![(StringLiteral, "say \"hi\"")]);
case!(string_backslash, r#""a\nb""#, vec![(StringLiteral, "a\\nb")]);
case!(char_plain, "'a'", vec![(CharacterLiteral, "a")]);
case!(char_escape, r"'\n'", vec![(CharacterLiteral, "\\n")]);
case!(char_hex, r"'\x41'", vec![(CharacterLiteral, "\\x41")]);
case!(separators, ",()", vec![(Separator, ","), (Separator, "("), (Separator, ")")]);
case!(blank, "   \t ", vec![]);

// ---- Statements ----
case!(
    instruction,
    "main: addi $t0, $zero, -1",
    vec![
        (Label, "main:"),
        (Mnemonic, "addi"),
        (Register, "$t0"),
        (Separator, ","),
        (Register, "$zero"),
        (Separator, ","),
        (IntegerConstant, "-1"),
    ]
);
case!(
    memory_operand,
    "lw $t1, 8($sp)",
    vec![
        (Mnemonic, "lw"),
        (Register, "$t1"),
        (Separator, ","),
        (IntegerConstant, "8"),
        (Separator, "("),
        (Register, "$sp"),
        (Separator, ")"),
    ]
);
case!(
    data_directive,
    "msg: .asciiz \"ok\"",
    vec![(Label, "msg:"), (Directive, ".asciiz"), (StringLiteral, "ok")]
);

// ---- Rejections ----
fail!(malformed_octal, "012abc", 3);
fail!(bad_octal_digit, "09", 1);
fail!(malformed_hex, "0x1g", 3);
fail!(malformed_decimal, "add $t0, 12ab", 11);
fail!(empty_hex, "0x", 2);
fail!(lone_sign, "-", 1);
fail!(stray_colon, "main :", 5);
fail!(unterminated_string, "\"abc", 4);
fail!(bad_char_escape, r"'\q'", 2);
fail!(empty_char, "''", 1);
fail!(dotted_label, ".L1:", 0);
fail!(comment_disabled, "nop # note", 4);

#[test]
fn operators_option() {
    use simasm::lexer::{LexerOptions, LineLexer};
    let options = LexerOptions {
        operators: true,
        ..LexerOptions::default()
    };
    let tokens = LineLexer::with_options("- +1", 0, 0, options).parse().unwrap();
    assert_eq!(tokens[0].kind(), Operator);
    assert_eq!(tokens[1].text(), "+1");
}

#[test]
fn comments_option() {
    use simasm::lexer::{LexerOptions, LineLexer};
    let options = LexerOptions {
        comments: true,
        ..LexerOptions::default()
    };
    let tokens = LineLexer::with_options("jr $ra # \"done\"", 0, 0, options)
        .parse()
        .unwrap();
    assert_eq!(tokens.len(), 2);
    let tokens = LineLexer::with_options(".ascii \"a#b\"", 0, 0, options)
        .parse()
        .unwrap();
    assert_eq!(tokens[1].text(), "a#b");
}

#[test]
fn stream() {
    use simasm::lexer::Lexer;
    let mut lexer = Lexer::new("main:\r\n\n  nop\n".as_bytes(), 2);
    assert_eq!(lexer.next_line().unwrap().unwrap()[0].kind(), Label);
    assert_eq!(lexer.line(), "main:");
    assert!(lexer.next_line().unwrap().unwrap().is_empty());
    let tokens = lexer.next_line().unwrap().unwrap();
    assert_eq!(tokens[0].pos(), simasm::Pos::new(2, 2, 2));
    assert_eq!(lexer.line_idx(), 2);
    assert!(lexer.next_line().unwrap().is_none());
}
