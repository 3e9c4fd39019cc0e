//! Line lexer built on the [`crate::fsm`] engine.
//!
//! String literals use a deliberately small escape grammar: `\"` becomes `"`
//! and a backslash followed by anything else is kept as both characters, so
//! `"a\nb"` holds a backslash and an `n`, not a newline. Character literals
//! are stricter and only accept `\n \t \r \0 \\ \' \"` and `\xH` / `\xHH`.

use crate::error::{Error, Result};
use crate::fsm::{Action, CharSet, Machine, StateId};
use crate::token::{Token, TokenBuilder, TokenKind};
use once_cell::sync::Lazy;
use std::io::BufRead;

use Action::{Append, AppendLit, Mark, SetKind, StartToken};
use TokenKind::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexerOptions {
    /// Emit a lone `+` / `-` as an Operator token instead of failing.
    pub operators: bool,
    /// Drop everything from `#` to the end of the line.
    pub comments: bool,
}

impl LexerOptions {
    fn index(self) -> usize {
        self.operators as usize | (self.comments as usize) << 1
    }
}

static MACHINES: Lazy<Vec<Machine<TokenKind>>> = Lazy::new(|| {
    (0..4)
        .map(|bits| {
            build(LexerOptions {
                operators: bits & 1 != 0,
                comments: bits & 2 != 0,
            })
        })
        .collect()
});

fn machine(options: LexerOptions) -> &'static Machine<TokenKind> {
    &MACHINES[options.index()]
}

fn letters() -> CharSet {
    CharSet::range('a', 'z').or(CharSet::range('A', 'Z'))
}

fn digits() -> CharSet {
    CharSet::range('0', '9')
}

fn hex_digits() -> CharSet {
    digits()
        .or(CharSet::range('a', 'f'))
        .or(CharSet::range('A', 'F'))
}

fn ident_start() -> CharSet {
    letters().or(CharSet::of("_$"))
}

fn ident_cont() -> CharSet {
    letters().or(digits()).or(CharSet::of("_$."))
}

fn build(options: LexerOptions) -> Machine<TokenKind> {
    let mut m = Machine::new("start");
    let start = m.start();

    let ident = m.add_state("identifier", true);
    let label = m.add_state("label", true);
    let dot = m.add_state("directive", false);
    let directive = m.add_state("directive", true);
    let separator = m.add_state("separator", true);
    let sign = m.add_state("sign", options.operators);
    let zero = m.add_state("integer constant", true);
    let octal = m.add_state("octal constant", true);
    let hex_prefix = m.add_state("hexadecimal constant", false);
    let hex = m.add_state("hexadecimal constant", true);
    let decimal = m.add_state("decimal constant", true);
    let malformed = m.add_state("malformed integer constant", false);
    let str_body = m.add_state("string literal", false);
    let str_escape = m.add_state("string literal", false);
    let str_end = m.add_state("string literal", true);
    let ch_open = m.add_state("character literal", false);
    let ch_escape = m.add_state("character escape", false);
    let ch_hex0 = m.add_state("character escape", false);
    let ch_hex1 = m.add_state("character literal", false);
    let ch_body = m.add_state("character literal", false);
    let ch_end = m.add_state("character literal", true);

    m.on(start, start, CharSet::Whitespace, &[]);
    m.on(start, ident, ident_start(), &[StartToken, Append, SetKind(Identifier)]);
    m.on(start, dot, CharSet::of("."), &[StartToken, Append, SetKind(Directive)]);
    m.on(start, separator, CharSet::of(",()"), &[StartToken, Append, SetKind(Separator)]);
    m.on(start, sign, CharSet::of("+-"), &[StartToken, Append, SetKind(Operator)]);
    m.on(start, zero, CharSet::of("0"), &[StartToken, Append, SetKind(IntegerConstant)]);
    m.on(start, decimal, CharSet::range('1', '9'), &[StartToken, Append, SetKind(IntegerConstant)]);
    m.on(start, str_body, CharSet::of("\""), &[StartToken, SetKind(StringLiteral)]);
    m.on(start, ch_open, CharSet::of("'"), &[StartToken, SetKind(CharacterLiteral)]);
    if options.comments {
        let comment = m.add_state("comment", true);
        m.on(start, comment, CharSet::of("#"), &[]);
        m.on(comment, comment, CharSet::any(), &[]);
    }

    // identifiers, labels, directives
    m.on(ident, ident, ident_cont(), &[Append]);
    m.on(ident, label, CharSet::of(":"), &[Append, SetKind(Label)]);
    m.on(dot, directive, letters().or(CharSet::of("_")), &[Append]);
    m.on(directive, directive, letters().or(digits()).or(CharSet::of("_")), &[Append]);
    m.on(directive, label, CharSet::of(":"), &[Append, SetKind(Label)]);

    // integer constants; a digit run running into another class is malformed,
    // blamed on the first character out of class
    m.on(sign, zero, CharSet::of("0"), &[Append, SetKind(IntegerConstant)]);
    m.on(sign, decimal, CharSet::range('1', '9'), &[Append, SetKind(IntegerConstant)]);
    m.on(zero, octal, CharSet::range('0', '7'), &[Append]);
    m.on(zero, hex_prefix, CharSet::of("xX"), &[Append]);
    m.on(zero, malformed, ident_cont(), &[Mark, Append]);
    m.on(octal, octal, CharSet::range('0', '7'), &[Append]);
    m.on(octal, malformed, ident_cont(), &[Mark, Append]);
    m.on(hex_prefix, hex, hex_digits(), &[Append]);
    m.on(hex_prefix, malformed, ident_cont(), &[Mark, Append]);
    m.on(hex, hex, hex_digits(), &[Append]);
    m.on(hex, malformed, ident_cont(), &[Mark, Append]);
    m.on(decimal, decimal, digits(), &[Append]);
    m.on(decimal, malformed, ident_cont(), &[Mark, Append]);
    m.on(malformed, malformed, ident_cont(), &[Append]);

    // string literals
    m.on(str_body, str_end, CharSet::of("\""), &[]);
    m.on(str_body, str_escape, CharSet::of("\\"), &[]);
    m.on(str_body, str_body, CharSet::any(), &[Append]);
    m.on(str_escape, str_body, CharSet::of("\""), &[AppendLit('"')]);
    m.on(str_escape, str_body, CharSet::any(), &[AppendLit('\\'), Append]);

    // character literals
    m.on(ch_open, ch_escape, CharSet::of("\\"), &[Append]);
    m.on(ch_open, ch_body, CharSet::except("'\\"), &[Append]);
    m.on(ch_escape, ch_body, CharSet::of("ntr0\\'\""), &[Append]);
    m.on(ch_escape, ch_hex0, CharSet::of("xX"), &[Append]);
    m.on(ch_hex0, ch_hex1, hex_digits(), &[Append]);
    m.on(ch_hex1, ch_body, hex_digits(), &[Append]);
    m.on(ch_hex1, ch_end, CharSet::of("'"), &[]);
    m.on(ch_body, ch_end, CharSet::of("'"), &[]);

    m
}

fn reclassify(text: &str) -> TokenKind {
    if arch::reg::is_register(text) {
        Register
    } else if arch::op::is_mnemonic(text) {
        Mnemonic
    } else {
        Identifier
    }
}

pub struct LineLexer {
    chars: Vec<char>,
    at: usize,
    src: usize,
    line_idx: usize,
    machine: &'static Machine<TokenKind>,
}

impl LineLexer {
    pub fn new(line: &str, src: usize, line_idx: usize) -> Self {
        Self::with_options(line, src, line_idx, LexerOptions::default())
    }

    pub fn with_options(line: &str, src: usize, line_idx: usize, options: LexerOptions) -> Self {
        Self {
            chars: line.chars().collect(),
            at: 0,
            src,
            line_idx,
            machine: machine(options),
        }
    }

    pub fn parse(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// `Ok(None)` once the rest of the line holds no more tokens.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        if self.at >= self.chars.len() {
            return Ok(None);
        }
        let mut builder = TokenBuilder::new(self.src, self.line_idx);
        let (state, stop) = self.machine.run(&self.chars, self.at, &mut builder);
        self.at = stop;

        if !self.machine.state(state).is_accepting() {
            if state == self.machine.start() && stop >= self.chars.len() {
                return Ok(None);
            }
            return Err(self.reject(state, builder.marked().unwrap_or(stop)));
        }
        if !builder.is_started() {
            return Ok(None);
        }

        match builder.kind() {
            Some(Identifier) => {
                let kind = reclassify(builder.text());
                builder.reclassify(kind);
            }
            Some(Label) if builder.text().starts_with('.') => {
                let pos = builder.pos().unwrap_or_default();
                return Err(Error::tokenizer(
                    pos,
                    format!("label `{}` cannot start with '.'", builder.text()),
                ));
            }
            _ => {}
        }
        Ok(builder.build())
    }

    fn reject(&self, state: StateId, stop: usize) -> Error {
        let pos = crate::token::Pos::new(self.src, self.line_idx, stop);
        let name = self.machine.state(state).name();
        let msg = match (self.chars.get(stop), state == self.machine.start()) {
            (Some(ch), true) => format!("unexpected character {:?}", ch),
            (Some(ch), false) => format!("unexpected character {:?} in {}", ch, name),
            (None, _) => format!("unexpected end of line in {}", name),
        };
        Error::tokenizer(pos, msg)
    }
}

/// Tokenizes a stream line by line.
pub struct Lexer<R> {
    reader: R,
    src: usize,
    line_idx: usize,
    line: String,
    options: LexerOptions,
}

impl<R: BufRead> Lexer<R> {
    pub fn new(reader: R, src: usize) -> Self {
        Self::with_options(reader, src, LexerOptions::default())
    }

    pub fn with_options(reader: R, src: usize, options: LexerOptions) -> Self {
        Self {
            reader,
            src,
            line_idx: 0,
            line: String::new(),
            options,
        }
    }

    /// Tokens of the next line; an empty line gives an empty vector and the
    /// end of the stream gives `None`.
    pub fn next_line(&mut self) -> Result<Option<Vec<Token>>> {
        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .map_err(Error::FileRead)?;
        if read == 0 {
            return Ok(None);
        }
        while self.line.ends_with('\n') || self.line.ends_with('\r') {
            self.line.pop();
        }
        let line_idx = self.line_idx;
        self.line_idx += 1;
        LineLexer::with_options(&self.line, self.src, line_idx, self.options)
            .parse()
            .map(Some)
    }

    /// Raw text of the line returned by the last `next_line`.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// 0-based index of the line returned by the last `next_line`.
    pub fn line_idx(&self) -> usize {
        self.line_idx.saturating_sub(1)
    }
}
