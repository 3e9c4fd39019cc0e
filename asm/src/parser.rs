use arch::{
    inst::Inst,
    op::{Format, Mnemonic},
    reg::Reg,
};
use color_print::cformat;
use std::io::BufRead;

use crate::error::{AsmError, Result};
use crate::label::Labels;
use crate::lexer::{Lexer, LexerOptions};
use crate::memory::{MemoryBuffer, DEFAULT_DATA_BASE, DEFAULT_TEXT_BASE};
use crate::token::{Pos, Token, TokenKind};

// ----------------------------------------------------------------------------
// Immediate

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Imm {
    Literal(i64),
    Ident(String),
}

impl Imm {
    fn from_token(token: &Token) -> Option<Imm> {
        match token.kind() {
            TokenKind::IntegerConstant | TokenKind::CharacterLiteral => {
                token.int_value().map(Imm::Literal)
            }
            // a label may share its name with a mnemonic (`b`, `j`)
            TokenKind::Identifier | TokenKind::Mnemonic => Some(Imm::Ident(token.text().to_string())),
            _ => None,
        }
    }

    pub fn resolve(&self, labels: &Labels) -> Result<i64, AsmError> {
        match self {
            Imm::Literal(v) => Ok(*v),
            Imm::Ident(name) => labels
                .get(name)
                .map(i64::from)
                .ok_or_else(|| AsmError::UndefinedLabel(name.clone())),
        }
    }

    fn cfmt(&self) -> String {
        match self {
            Imm::Literal(v) => cformat!("<y>{}</>", v),
            Imm::Ident(name) => cformat!("<g>{}</>", name),
        }
    }
}

fn signed16(v: i64) -> Result<u16, AsmError> {
    i16::try_from(v)
        .map(|v| v as u16)
        .map_err(|_| AsmError::ImmediateOutOfRange(v, 16))
}

fn unsigned16(v: i64) -> Result<u16, AsmError> {
    u16::try_from(v).map_err(|_| AsmError::ImmediateOutOfRange(v, 16))
}

/// Signed or unsigned, whichever reading fits.
fn either16(v: i64) -> Result<u16, AsmError> {
    signed16(v).or_else(|_| unsigned16(v))
}

fn either32(v: i64) -> Result<u32, AsmError> {
    i32::try_from(v)
        .map(|v| v as u32)
        .or_else(|_| u32::try_from(v))
        .map_err(|_| AsmError::ImmediateOutOfRange(v, 32))
}

fn target(v: i64) -> Result<u32, AsmError> {
    let addr = u32::try_from(v).map_err(|_| AsmError::AddressOverflow(v))?;
    if addr % 4 != 0 {
        return Err(AsmError::MisalignedTarget(addr));
    }
    Ok(addr)
}

// ----------------------------------------------------------------------------
// Operation

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    Reg3(Mnemonic, Reg, Reg, Reg),     // rd, rs, rt
    ShiftVar(Mnemonic, Reg, Reg, Reg), // rd, rt, rs
    Shift(Mnemonic, Reg, Reg, Imm),    // rd, rt, sa
    MulDiv(Mnemonic, Reg, Reg),        // rs, rt
    MoveFrom(Mnemonic, Reg),           // rd
    JumpReg(Mnemonic, Reg),            // rs
    Imm(Mnemonic, Reg, Reg, Imm),      // rt, rs, imm
    Upper(Reg, Imm),                   // rt, imm
    Mem(Mnemonic, Reg, Imm, Reg),      // rt, off, base
    Branch(Mnemonic, Reg, Reg, Imm),   // rs, rt, target
    BranchZero(Mnemonic, Reg, Imm),    // rs, target
    Jump(Mnemonic, Imm),               // target
    Bare(Mnemonic),
    Move(Reg, Reg),     // rd, rs
    LoadImm(Reg, Imm),  // rt, imm
    LoadAddr(Reg, Imm), // rt, target
    BranchAlways(Imm),  // target
}

impl Code {
    fn parse(m: Mnemonic, args: &mut Args) -> Result<Code> {
        let code = match m.format() {
            Format::Reg3 => Code::Reg3(m, args.reg()?, args.reg()?, args.reg()?),
            Format::ShiftVar => Code::ShiftVar(m, args.reg()?, args.reg()?, args.reg()?),
            Format::Shift => Code::Shift(m, args.reg()?, args.reg()?, args.imm()?),
            Format::MulDiv => Code::MulDiv(m, args.reg()?, args.reg()?),
            Format::MoveFrom => Code::MoveFrom(m, args.reg()?),
            Format::JumpReg => Code::JumpReg(m, args.reg()?),
            Format::ImmSigned | Format::ImmUnsigned => {
                Code::Imm(m, args.reg()?, args.reg()?, args.imm()?)
            }
            Format::Upper => Code::Upper(args.reg()?, args.imm()?),
            Format::Mem => {
                let rt = args.reg()?;
                let (off, base) = args.mem()?;
                Code::Mem(m, rt, off, base)
            }
            Format::Branch => Code::Branch(m, args.reg()?, args.reg()?, args.imm()?),
            Format::BranchZero => Code::BranchZero(m, args.reg()?, args.imm()?),
            Format::Jump => Code::Jump(m, args.imm()?),
            Format::Bare => Code::Bare(m),
            Format::Move => Code::Move(args.reg()?, args.reg()?),
            Format::LoadImm => Code::LoadImm(args.reg()?, args.imm()?),
            Format::LoadAddr => Code::LoadAddr(args.reg()?, args.imm()?),
            Format::BranchAlways => Code::BranchAlways(args.imm()?),
        };
        args.finish()?;
        Ok(code)
    }

    /// Bytes occupied in the text segment.
    pub fn size(&self) -> u32 {
        match self {
            Code::LoadAddr(..) => 8,
            Code::LoadImm(_, Imm::Literal(v)) if i16::try_from(*v).is_ok() => 4,
            Code::LoadImm(..) => 8,
            _ => 4,
        }
    }

    pub fn mnemonic(&self) -> Mnemonic {
        match self {
            Code::Reg3(m, ..)
            | Code::ShiftVar(m, ..)
            | Code::Shift(m, ..)
            | Code::MulDiv(m, ..)
            | Code::MoveFrom(m, ..)
            | Code::JumpReg(m, ..)
            | Code::Imm(m, ..)
            | Code::Mem(m, ..)
            | Code::Branch(m, ..)
            | Code::BranchZero(m, ..)
            | Code::Jump(m, ..)
            | Code::Bare(m) => *m,
            Code::Upper(..) => Mnemonic::Lui,
            Code::Move(..) => Mnemonic::Move,
            Code::LoadImm(..) => Mnemonic::Li,
            Code::LoadAddr(..) => Mnemonic::La,
            Code::BranchAlways(..) => Mnemonic::B,
        }
    }
}

impl Code {
    pub fn cformat(&self) -> String {
        let name = self.mnemonic().to_string();
        macro_rules! opfmt {
            ($($arg:expr),*) => {{
                let args: Vec<String> = vec![$($arg),*];
                cformat!("<red>{:<8}</><blue>{}</>", name, args.join(", "))
            }};
        }
        let r = |reg: &Reg| reg.to_string();
        match self {
            Code::Reg3(_, a, b, c) | Code::ShiftVar(_, a, b, c) => opfmt!(r(a), r(b), r(c)),
            Code::Shift(_, rd, rt, sa) => opfmt!(r(rd), r(rt), sa.cfmt()),
            Code::MulDiv(_, rs, rt) | Code::Move(rs, rt) => opfmt!(r(rs), r(rt)),
            Code::MoveFrom(_, reg) | Code::JumpReg(_, reg) => opfmt!(r(reg)),
            Code::Imm(_, rt, rs, imm) => opfmt!(r(rt), r(rs), imm.cfmt()),
            Code::Upper(rt, imm) | Code::LoadImm(rt, imm) | Code::LoadAddr(rt, imm) => {
                opfmt!(r(rt), imm.cfmt())
            }
            Code::Mem(_, rt, off, base) => opfmt!(r(rt), format!("{}({})", off.cfmt(), base)),
            Code::Branch(_, rs, rt, to) => opfmt!(r(rs), r(rt), to.cfmt()),
            Code::BranchZero(_, rs, to) => opfmt!(r(rs), to.cfmt()),
            Code::Jump(_, to) | Code::BranchAlways(to) => opfmt!(to.cfmt()),
            Code::Bare(_) => opfmt!(),
        }
    }
}

impl Code {
    /// Encodes the operation placed at `pc`.
    pub fn resolve(&self, pc: u32, labels: &Labels) -> Result<Vec<Inst>, AsmError> {
        let branch = |to: &Imm| -> Result<u16, AsmError> {
            let addr = target(to.resolve(labels)?)?;
            let offset = (addr as i64 - (pc as i64 + 4)) >> 2;
            i16::try_from(offset)
                .map(|v| v as u16)
                .map_err(|_| AsmError::BranchOutOfRange(addr))
        };
        let inst = match self {
            Code::Reg3(m, rd, rs, rt) => Inst::r(*m, *rd, *rs, *rt, 0)?,
            Code::ShiftVar(m, rd, rt, rs) => Inst::r(*m, *rd, *rs, *rt, 0)?,
            Code::Shift(m, rd, rt, sa) => {
                let sa = sa.resolve(labels)?;
                if !(0..32).contains(&sa) {
                    return Err(AsmError::ImmediateOutOfRange(sa, 5));
                }
                Inst::r(*m, *rd, Reg::Zero, *rt, sa as u32)?
            }
            Code::MulDiv(m, rs, rt) => Inst::r(*m, Reg::Zero, *rs, *rt, 0)?,
            Code::MoveFrom(m, rd) => Inst::r(*m, *rd, Reg::Zero, Reg::Zero, 0)?,
            Code::JumpReg(Mnemonic::Jalr, rs) => Inst::r(Mnemonic::Jalr, Reg::Ra, *rs, Reg::Zero, 0)?,
            Code::JumpReg(m, rs) => Inst::r(*m, Reg::Zero, *rs, Reg::Zero, 0)?,
            Code::Imm(m, rt, rs, imm) => {
                let v = imm.resolve(labels)?;
                let imm = match m.format() {
                    Format::ImmUnsigned => unsigned16(v)?,
                    _ => signed16(v)?,
                };
                Inst::i(*m, *rt, *rs, imm)?
            }
            Code::Upper(rt, imm) => Inst::i(Mnemonic::Lui, *rt, Reg::Zero, either16(imm.resolve(labels)?)?)?,
            Code::Mem(m, rt, off, base) => Inst::i(*m, *rt, *base, signed16(off.resolve(labels)?)?)?,
            Code::Branch(m, rs, rt, to) => Inst::i(*m, *rt, *rs, branch(to)?)?,
            Code::BranchZero(m, rs, to) => Inst::i(*m, Reg::Zero, *rs, branch(to)?)?,
            Code::Jump(m, to) => {
                let addr = target(to.resolve(labels)?)?;
                if addr & 0xF000_0000 != pc.wrapping_add(4) & 0xF000_0000 {
                    return Err(AsmError::JumpOutOfRegion(addr));
                }
                Inst::j(*m, (addr >> 2) & 0x03FF_FFFF)?
            }
            Code::Bare(Mnemonic::Nop) => Inst::NOP,
            Code::Bare(m) => Inst::r(*m, Reg::Zero, Reg::Zero, Reg::Zero, 0)?,
            Code::Move(rd, rs) => Inst::r(Mnemonic::Addu, *rd, *rs, Reg::Zero, 0)?,
            Code::LoadImm(rt, imm) => {
                let v = imm.resolve(labels)?;
                if self.size() == 4 {
                    Inst::i(Mnemonic::Addiu, *rt, Reg::Zero, signed16(v)?)?
                } else {
                    return load_upper_lower(*rt, either32(v)?);
                }
            }
            Code::LoadAddr(rt, to) => {
                let v = to.resolve(labels)?;
                let addr = u32::try_from(v).map_err(|_| AsmError::AddressOverflow(v))?;
                return load_upper_lower(*rt, addr);
            }
            Code::BranchAlways(to) => Inst::i(Mnemonic::Beq, Reg::Zero, Reg::Zero, branch(to)?)?,
        };
        Ok(vec![inst])
    }
}

fn load_upper_lower(rt: Reg, value: u32) -> Result<Vec<Inst>, AsmError> {
    Ok(vec![
        Inst::i(Mnemonic::Lui, rt, Reg::Zero, (value >> 16) as u16)?,
        Inst::i(Mnemonic::Ori, rt, rt, value as u16)?,
    ])
}

// ----------------------------------------------------------------------------
// Operands

/// Comma-separated operand list of one statement.
struct Args<'a> {
    tokens: &'a [Token],
    at: usize,
    count: usize,
    head: Pos,
}

impl<'a> Args<'a> {
    fn new(head: &Token, tokens: &'a [Token]) -> Self {
        Args {
            tokens,
            at: 0,
            count: 0,
            head: head.pos(),
        }
    }

    fn is_empty(&self) -> bool {
        self.at >= self.tokens.len()
    }

    fn next(&mut self) -> Result<&'a Token> {
        let token = self
            .tokens
            .get(self.at)
            .ok_or_else(|| AsmError::MissingArgument.at(self.head))?;
        self.at += 1;
        Ok(token)
    }

    fn expect(&mut self, sep: &str) -> Result<()> {
        let token = self.next()?;
        if !token.is(TokenKind::Separator, sep) {
            return Err(AsmError::UnexpectedToken(token.text().to_string()).at(token.pos()));
        }
        Ok(())
    }

    /// Next operand token, consuming the comma in front of it.
    fn operand(&mut self) -> Result<&'a Token> {
        if self.count > 0 {
            self.expect(",")?;
        }
        self.count += 1;
        self.next()
    }

    fn reg_token(token: &Token) -> Result<Reg> {
        Reg::parse(token.text())
            .filter(|_| token.kind() == TokenKind::Register)
            .ok_or_else(|| {
                AsmError::ParseArgument(token.text().to_string(), "register".to_string())
                    .at(token.pos())
            })
    }

    fn imm_token(token: &Token) -> Result<Imm> {
        Imm::from_token(token).ok_or_else(|| {
            AsmError::ParseArgument(token.text().to_string(), "immediate".to_string())
                .at(token.pos())
        })
    }

    fn reg(&mut self) -> Result<Reg> {
        let token = self.operand()?;
        Self::reg_token(token)
    }

    fn imm(&mut self) -> Result<Imm> {
        let token = self.operand()?;
        Self::imm_token(token)
    }

    fn string(&mut self) -> Result<&'a str> {
        let token = self.operand()?;
        match token.kind() {
            TokenKind::StringLiteral => Ok(token.text()),
            _ => Err(
                AsmError::ParseArgument(token.text().to_string(), "string".to_string())
                    .at(token.pos()),
            ),
        }
    }

    /// `off(base)` or `(base)`.
    fn mem(&mut self) -> Result<(Imm, Reg)> {
        let first = self.operand()?;
        let off = if first.is(TokenKind::Separator, "(") {
            Imm::Literal(0)
        } else {
            let off = Self::imm_token(first)?;
            self.expect("(")?;
            off
        };
        let base = Self::reg_token(self.next()?)?;
        self.expect(")")?;
        Ok((off, base))
    }

    fn finish(&self) -> Result<()> {
        match self.tokens.get(self.at) {
            None => Ok(()),
            Some(token) => Err(AsmError::UnexpectedToken(token.text().to_string()).at(token.pos())),
        }
    }
}

// ----------------------------------------------------------------------------
// Staged items

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Code(Code),
    /// `.word` / `.half` / `.byte`
    Data { width: u8, values: Vec<Imm> },
    /// `.ascii` / `.asciiz` / `.space`
    Bytes(Vec<u8>),
}

/// Memory contents waiting for the label table to be complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub addr: u32,
    pub pos: Pos,
    pub item: Item,
}

impl Unresolved {
    pub fn size(&self) -> u32 {
        match &self.item {
            Item::Code(code) => code.size(),
            Item::Data { width, values } => *width as u32 * values.len() as u32,
            Item::Bytes(bytes) => bytes.len() as u32,
        }
    }
}

/// Writes every staged item into `memory`.
pub fn resolve(items: &[Unresolved], labels: &Labels, memory: &mut MemoryBuffer) -> Result<()> {
    for item in items {
        let at = |err: AsmError| err.at(item.pos);
        match &item.item {
            Item::Code(code) => {
                let insts = code.resolve(item.addr, labels).map_err(at)?;
                for (i, inst) in insts.iter().enumerate() {
                    memory.write_word(item.addr + 4 * i as u32, inst.to_bin());
                }
            }
            Item::Data { width, values } => {
                for (i, value) in values.iter().enumerate() {
                    let v = value.resolve(labels).map_err(at)?;
                    let addr = item.addr + *width as u32 * i as u32;
                    match width {
                        1 => {
                            if !(-128..=255).contains(&v) {
                                return Err(at(AsmError::ImmediateOutOfRange(v, 8)));
                            }
                            memory.write_byte(addr, v as u8);
                        }
                        2 => memory.write_half(addr, either16(v).map_err(at)?),
                        _ => memory.write_word(addr, either32(v).map_err(at)?),
                    }
                }
            }
            Item::Bytes(bytes) => memory.write_bytes(item.addr, bytes),
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Parser

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Text,
    Data,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    pc: u32,
    open: bool,
}

/// Section state shared by every stream of one assembly run.
#[derive(Debug, Clone)]
pub struct Parser {
    section: Section,
    text: Cursor,
    data: Cursor,
    /// Labels met on a line of their own, bound by the next statement.
    pending: Vec<Token>,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new(DEFAULT_TEXT_BASE, DEFAULT_DATA_BASE)
    }
}

fn align_up(pc: u32, align: u32) -> Result<u32, AsmError> {
    let mask = align.max(1) - 1;
    pc.checked_add(mask)
        .map(|v| v & !mask)
        .ok_or(AsmError::AddressOverflow(pc as i64 + mask as i64))
}

impl Parser {
    pub fn new(text_base: u32, data_base: u32) -> Self {
        Parser {
            section: Section::Text,
            text: Cursor {
                pc: text_base,
                open: false,
            },
            data: Cursor {
                pc: data_base,
                open: false,
            },
            pending: vec![],
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Address the next statement of the current section starts at.
    pub fn pc(&self) -> u32 {
        self.cursor().pc
    }

    fn cursor(&self) -> &Cursor {
        match self.section {
            Section::Text => &self.text,
            Section::Data => &self.data,
        }
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        match self.section {
            Section::Text => &mut self.text,
            Section::Data => &mut self.data,
        }
    }

    /// Parses one stream. `src` is the index the stream's positions carry.
    pub fn parse<R: BufRead>(
        &mut self,
        src: usize,
        input: R,
        labels: &mut Labels,
        memory: &mut MemoryBuffer,
    ) -> Result<Vec<Unresolved>> {
        let options = LexerOptions {
            comments: true,
            ..LexerOptions::default()
        };
        let mut lexer = Lexer::with_options(input, src, options);
        let mut staged = vec![];
        while let Some(tokens) = lexer.next_line()? {
            self.parse_line(&tokens, labels, memory, &mut staged)?;
        }
        self.define(&[], labels)?;
        Ok(staged)
    }

    fn parse_line(
        &mut self,
        tokens: &[Token],
        labels: &mut Labels,
        memory: &mut MemoryBuffer,
        staged: &mut Vec<Unresolved>,
    ) -> Result<()> {
        let split = tokens
            .iter()
            .position(|t| t.kind() != TokenKind::Label)
            .unwrap_or(tokens.len());
        let (names, rest) = tokens.split_at(split);

        let Some((head, operands)) = rest.split_first() else {
            self.pending.extend_from_slice(names);
            return Ok(());
        };
        let mut args = Args::new(head, operands);

        match head.kind() {
            TokenKind::Directive => self.directive(head, &mut args, names, labels, memory, staged),
            TokenKind::Mnemonic => {
                let m = Mnemonic::parse(head.text())
                    .ok_or_else(|| AsmError::UnknownOperation(head.text().to_string()).at(head.pos()))?;
                if self.section != Section::Text {
                    return Err(AsmError::InstructionOutsideText.at(head.pos()));
                }
                let code = Code::parse(m, &mut args)?;
                self.align(4).map_err(|e| e.at(head.pos()))?;
                self.define(names, labels)?;
                let item = Item::Code(code);
                self.emit(head.pos(), item, memory, staged)
            }
            TokenKind::Identifier => {
                Err(AsmError::UnknownOperation(head.text().to_string()).at(head.pos()))
            }
            _ => Err(AsmError::UnexpectedToken(head.text().to_string()).at(head.pos())),
        }
    }

    fn directive(
        &mut self,
        head: &Token,
        args: &mut Args,
        names: &[Token],
        labels: &mut Labels,
        memory: &mut MemoryBuffer,
        staged: &mut Vec<Unresolved>,
    ) -> Result<()> {
        let pos = head.pos();
        let name = head.text();
        let invalid = |msg: &str| AsmError::InvalidDirectiveArgument(name.to_string(), msg.to_string()).at(pos);

        let item = match name {
            ".text" | ".data" => {
                let section = if name == ".text" { Section::Text } else { Section::Data };
                let addr = if args.is_empty() {
                    None
                } else {
                    match args.imm()? {
                        Imm::Literal(v) => Some(v),
                        Imm::Ident(_) => return Err(invalid("expected an address")),
                    }
                };
                args.finish()?;
                // earlier lone labels stay in the section they were written in
                self.define(&[], labels)?;
                self.switch(section, addr, memory);
                return self.define(names, labels);
            }
            ".word" | ".half" | ".byte" => {
                let width = match name {
                    ".word" => 4,
                    ".half" => 2,
                    _ => 1,
                };
                let mut values = vec![args.imm()?];
                while !args.is_empty() {
                    values.push(args.imm()?);
                }
                self.align(width as u32).map_err(|e| e.at(pos))?;
                Item::Data { width, values }
            }
            ".ascii" | ".asciiz" => {
                let mut bytes = args.string()?.as_bytes().to_vec();
                args.finish()?;
                if name == ".asciiz" {
                    bytes.push(0);
                }
                Item::Bytes(bytes)
            }
            ".space" => {
                let n = match args.imm()? {
                    Imm::Literal(n) => usize::try_from(n).map_err(|_| invalid("size must not be negative"))?,
                    Imm::Ident(_) => return Err(invalid("expected a size")),
                };
                args.finish()?;
                let end = (self.pc() as i64).saturating_add(n as i64);
                if end > u32::MAX as i64 {
                    return Err(AsmError::AddressOverflow(end).at(pos));
                }
                Item::Bytes(vec![0; n])
            }
            ".align" => {
                let n = match args.imm()? {
                    Imm::Literal(n) if (0..=16).contains(&n) => n as u32,
                    _ => return Err(invalid("expected a power of two between 0 and 16")),
                };
                args.finish()?;
                self.align(1 << n).map_err(|e| e.at(pos))?;
                return self.define(names, labels);
            }
            _ => return Err(AsmError::UnknownDirective(name.to_string()).at(pos)),
        };

        self.define(names, labels)?;
        self.emit(pos, item, memory, staged)
    }

    fn switch(&mut self, section: Section, addr: Option<i64>, memory: &mut MemoryBuffer) {
        self.section = section;
        let Some(addr) = addr else {
            return;
        };
        match section {
            Section::Text => memory.open_text_segment(addr),
            Section::Data => memory.open_data_segment(addr),
        }
        *self.cursor_mut() = Cursor {
            pc: addr.clamp(0, u32::MAX as i64) as u32,
            open: true,
        };
    }

    /// Binds the pending labels and `names` at the cursor.
    fn define(&mut self, names: &[Token], labels: &mut Labels) -> Result<()> {
        let pc = self.pc();
        let pending = std::mem::take(&mut self.pending);
        for token in pending.iter().chain(names) {
            let name = token.label_name().unwrap_or(token.text());
            labels.define(name, token.pos(), pc).map_err(|e| e.at(token.pos()))?;
        }
        Ok(())
    }

    fn align(&mut self, align: u32) -> Result<(), AsmError> {
        let cursor = self.cursor_mut();
        cursor.pc = align_up(cursor.pc, align)?;
        Ok(())
    }

    /// Stages `item` at the cursor, opening the section's first segment on
    /// demand, and extends the segment over it.
    fn emit(
        &mut self,
        pos: Pos,
        item: Item,
        memory: &mut MemoryBuffer,
        staged: &mut Vec<Unresolved>,
    ) -> Result<()> {
        let section = self.section;
        let cursor = self.cursor_mut();
        let addr = cursor.pc;
        let staged_item = Unresolved { addr, pos, item };
        let end = addr as u64 + staged_item.size() as u64;
        let end = u32::try_from(end).map_err(|_| AsmError::AddressOverflow(end as i64).at(pos))?;

        let open = std::mem::replace(&mut cursor.open, true);
        cursor.pc = end;
        match section {
            Section::Text => {
                if !open {
                    memory.open_text_segment(addr as i64);
                }
                memory.extend_text_segment(end);
            }
            Section::Data => {
                if !open {
                    memory.open_data_segment(addr as i64);
                }
                memory.extend_data_segment(end);
            }
        }
        staged.push(staged_item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (Vec<Unresolved>, Labels, MemoryBuffer) {
        let mut labels = Labels::new();
        let mut memory = MemoryBuffer::default();
        let staged = Parser::default()
            .parse(0, src.as_bytes(), &mut labels, &mut memory)
            .unwrap();
        (staged, labels, memory)
    }

    #[test]
    fn operands() {
        let (staged, _, _) = parse("lw $t0, -4($sp)\nsw $t1, ($a0)\nsll $t0, $t1, 2 # shift\n");
        assert_eq!(
            staged[0].item,
            Item::Code(Code::Mem(Mnemonic::Lw, Reg::T0, Imm::Literal(-4), Reg::Sp))
        );
        assert_eq!(
            staged[1].item,
            Item::Code(Code::Mem(Mnemonic::Sw, Reg::T1, Imm::Literal(0), Reg::A0))
        );
        assert_eq!(staged[2].addr, 8);
    }

    #[test]
    fn labels_follow_alignment() {
        let (staged, labels, memory) = parse(".data\nc: .byte 1\nw: .word 2, 3\n");
        assert_eq!(labels.get("c"), Some(0x1000));
        assert_eq!(labels.get("w"), Some(0x1004));
        assert_eq!(staged[1].addr, 0x1004);
        assert_eq!(memory.data_segments()[0].end(), 0x100C);
    }

    #[test]
    fn pseudo_sizes() {
        let (staged, labels, _) = parse("li $t0, 5\nli $t0, 0x12345\nla $t0, x\nx: nop\n");
        let sizes: Vec<_> = staged.iter().map(|u| u.size()).collect();
        assert_eq!(sizes, vec![4, 8, 8, 4]);
        assert_eq!(labels.get("x"), Some(20));
    }

    #[test]
    fn argument_errors() {
        let mut labels = Labels::new();
        let mut memory = MemoryBuffer::default();
        let mut parser = Parser::default();
        let err = parser
            .parse(0, "add $t0, $t1\n".as_bytes(), &mut labels, &mut memory)
            .unwrap_err();
        assert_eq!(err.asm_error(), Some(&AsmError::MissingArgument));
        let err = parser
            .parse(0, "add $t0, $t1, 4\n".as_bytes(), &mut labels, &mut memory)
            .unwrap_err();
        assert_eq!(
            err.asm_error(),
            Some(&AsmError::ParseArgument("4".into(), "register".into()))
        );
        let err = parser
            .parse(0, "jr $ra $ra\n".as_bytes(), &mut labels, &mut memory)
            .unwrap_err();
        assert_eq!(err.asm_error(), Some(&AsmError::UnexpectedToken("$ra".into())));
    }

    #[test]
    fn branch_offsets() {
        let mut labels = Labels::new();
        labels.define("loop", Pos::default(), 0x10).unwrap();
        let beq = Code::Branch(Mnemonic::Beq, Reg::T0, Reg::T1, Imm::Ident("loop".into()));
        // back from 0x20: (0x10 - 0x24) / 4 = -5
        assert_eq!(beq.resolve(0x20, &labels).unwrap()[0].to_bin(), 0x1109_FFFB);
        assert_eq!(
            beq.resolve(0x0004_0000, &labels),
            Err(AsmError::BranchOutOfRange(0x10))
        );
        let j = Code::Jump(Mnemonic::J, Imm::Literal(0x1000_0000));
        assert_eq!(j.resolve(0, &labels), Err(AsmError::JumpOutOfRegion(0x1000_0000)));
        let j = Code::Jump(Mnemonic::J, Imm::Literal(0x12));
        assert_eq!(j.resolve(0, &labels), Err(AsmError::MisalignedTarget(0x12)));
    }
}
