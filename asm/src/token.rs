use crate::fsm::Builder;
use std::fmt;
use strum::Display;

/// Location in the sources of one assembly run. `src` indexes the input
/// streams in the order they were given; `line` and `col` are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pos {
    pub src: usize,
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(src: usize, line: usize, col: usize) -> Self {
        Pos { src, line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenKind {
    Identifier,
    Label,
    Directive,
    Separator,
    Operator,
    IntegerConstant,
    StringLiteral,
    CharacterLiteral,
    Register,
    Mnemonic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: String,
    pos: Pos,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    /// `main:` -> `main`
    pub fn label_name(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Label => self.text.strip_suffix(':'),
            _ => None,
        }
    }

    pub fn int_value(&self) -> Option<i64> {
        match self.kind {
            TokenKind::IntegerConstant => parse_integer(&self.text),
            TokenKind::CharacterLiteral => decode_char(&self.text).map(i64::from),
            _ => None,
        }
    }

    pub fn char_value(&self) -> Option<u8> {
        match self.kind {
            TokenKind::CharacterLiteral => decode_char(&self.text),
            _ => None,
        }
    }
}

/// Open token. The lexer owns it while the machine runs and consumes it with
/// [`TokenBuilder::build`] once the token is complete.
#[derive(Debug)]
pub struct TokenBuilder {
    src: usize,
    line: usize,
    col: Option<usize>,
    kind: Option<TokenKind>,
    text: String,
    mark: Option<usize>,
}

impl TokenBuilder {
    pub fn new(src: usize, line: usize) -> Self {
        TokenBuilder {
            src,
            line,
            col: None,
            kind: None,
            text: String::new(),
            mark: None,
        }
    }

    /// Column recorded by the last [`Action::Mark`](crate::fsm::Action::Mark).
    pub fn marked(&self) -> Option<usize> {
        self.mark
    }

    pub fn is_started(&self) -> bool {
        self.col.is_some()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> Option<TokenKind> {
        self.kind
    }

    pub fn pos(&self) -> Option<Pos> {
        self.col.map(|col| Pos::new(self.src, self.line, col))
    }

    pub fn reclassify(&mut self, kind: TokenKind) {
        self.kind = Some(kind);
    }

    /// `None` if nothing was started or no kind was assigned.
    pub fn build(self) -> Option<Token> {
        let col = self.col?;
        Some(Token {
            kind: self.kind?,
            text: self.text,
            pos: Pos::new(self.src, self.line, col),
        })
    }
}

impl Builder<TokenKind> for TokenBuilder {
    fn start(&mut self, col: usize) {
        self.col = Some(col);
        self.text.clear();
        self.kind = None;
        self.mark = None;
    }

    fn push(&mut self, ch: char) {
        self.text.push(ch);
    }

    fn set_kind(&mut self, kind: TokenKind) {
        self.kind = Some(kind);
    }

    fn mark(&mut self, col: usize) {
        self.mark = Some(col);
    }
}

/// Decimal, `0`-prefixed octal or `0x` hexadecimal with an optional sign.
pub fn parse_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.chars().next()? {
        '-' => (true, &text[1..]),
        '+' => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Value of a character literal body as produced by the lexer (`a`, `\n`,
/// `\x41`).
pub fn decode_char(body: &str) -> Option<u8> {
    let mut chars = body.chars();
    let value = match chars.next()? {
        '\\' => match chars.next()? {
            'n' => b'\n',
            't' => b'\t',
            'r' => b'\r',
            '0' => 0,
            '\\' => b'\\',
            '\'' => b'\'',
            '"' => b'"',
            'x' | 'X' => {
                let hex: String = chars.by_ref().collect();
                return u8::from_str_radix(&hex, 16).ok();
            }
            _ => return None,
        },
        ch if ch.is_ascii() => ch as u8,
        _ => return None,
    };
    match chars.next() {
        None => Some(value),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers() {
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-42"), Some(-42));
        assert_eq!(parse_integer("+7"), Some(7));
        assert_eq!(parse_integer("017"), Some(0o17));
        assert_eq!(parse_integer("0x1F"), Some(0x1F));
        assert_eq!(parse_integer("-0X10"), Some(-16));
        assert_eq!(parse_integer("0x"), None);
        assert_eq!(parse_integer("-"), None);
    }

    #[test]
    fn chars() {
        assert_eq!(decode_char("a"), Some(b'a'));
        assert_eq!(decode_char("\\n"), Some(b'\n'));
        assert_eq!(decode_char("\\0"), Some(0));
        assert_eq!(decode_char("\\x41"), Some(0x41));
        assert_eq!(decode_char("\\x7"), Some(7));
        assert_eq!(decode_char("\\q"), None);
        assert_eq!(decode_char("ab"), None);
        assert_eq!(decode_char(""), None);
    }

    #[test]
    fn builder() {
        let mut builder = TokenBuilder::new(0, 3);
        assert!(builder.pos().is_none());
        builder.start(4);
        builder.push('x');
        builder.set_kind(TokenKind::Identifier);
        let token = builder.build().unwrap();
        assert_eq!(token.text(), "x");
        assert_eq!(token.pos(), Pos::new(0, 3, 4));
        assert_eq!(token.pos().to_string(), "4:5");
        assert!(TokenBuilder::new(0, 0).build().is_none());
    }
}
