use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Operand layout of a mnemonic, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Reg3,         // rd, rs, rt
    ShiftVar,     // rd, rt, rs
    Shift,        // rd, rt, sa
    MulDiv,       // rs, rt
    MoveFrom,     // rd
    JumpReg,      // rs
    ImmSigned,    // rt, rs, imm
    ImmUnsigned,  // rt, rs, imm
    Upper,        // rt, imm
    Mem,          // rt, off(base)
    Branch,       // rs, rt, target
    BranchZero,   // rs, target
    Jump,         // target
    Bare,         //
    Move,         // rd, rs
    LoadImm,      // rt, imm
    LoadAddr,     // rt, target
    BranchAlways, // target
}

/// Where the mnemonic lives in the machine word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// opcode 0, selected by funct
    R(u8),
    /// selected by opcode
    I(u8),
    /// opcode 1, selected by the rt field
    RegImm(u8),
    J(u8),
    /// expands to other instructions
    Pseudo,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, EnumIter, Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Mnemonic {
    Add,
    Addu,
    Sub,
    Subu,
    And,
    Or,
    Xor,
    Nor,
    Slt,
    Sltu,
    Sll,
    Srl,
    Sra,
    Sllv,
    Srlv,
    Srav,
    Mult,
    Multu,
    Div,
    Divu,
    Mfhi,
    Mflo,
    Jr,
    Jalr,
    Addi,
    Addiu,
    Slti,
    Sltiu,
    Andi,
    Ori,
    Xori,
    Lui,
    Lb,
    Lbu,
    Lh,
    Lhu,
    Lw,
    Sb,
    Sh,
    Sw,
    Beq,
    Bne,
    Blez,
    Bgtz,
    Bltz,
    Bgez,
    J,
    Jal,
    Syscall,
    Break,
    Nop,
    Move,
    Li,
    La,
    B,
}

impl Mnemonic {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<Self>().ok()
    }

    pub fn format(self) -> Format {
        use Mnemonic::*;
        match self {
            Add | Addu | Sub | Subu | And | Or | Xor | Nor | Slt | Sltu => Format::Reg3,
            Sllv | Srlv | Srav => Format::ShiftVar,
            Sll | Srl | Sra => Format::Shift,
            Mult | Multu | Div | Divu => Format::MulDiv,
            Mfhi | Mflo => Format::MoveFrom,
            Jr | Jalr => Format::JumpReg,
            Addi | Addiu | Slti | Sltiu => Format::ImmSigned,
            Andi | Ori | Xori => Format::ImmUnsigned,
            Lui => Format::Upper,
            Lb | Lbu | Lh | Lhu | Lw | Sb | Sh | Sw => Format::Mem,
            Beq | Bne => Format::Branch,
            Blez | Bgtz | Bltz | Bgez => Format::BranchZero,
            J | Jal => Format::Jump,
            Syscall | Break | Nop => Format::Bare,
            Move => Format::Move,
            Li => Format::LoadImm,
            La => Format::LoadAddr,
            B => Format::BranchAlways,
        }
    }

    pub fn encoding(self) -> Encoding {
        use Mnemonic::*;
        match self {
            Sll => Encoding::R(0x00),
            Srl => Encoding::R(0x02),
            Sra => Encoding::R(0x03),
            Sllv => Encoding::R(0x04),
            Srlv => Encoding::R(0x06),
            Srav => Encoding::R(0x07),
            Jr => Encoding::R(0x08),
            Jalr => Encoding::R(0x09),
            Syscall => Encoding::R(0x0C),
            Break => Encoding::R(0x0D),
            Mfhi => Encoding::R(0x10),
            Mflo => Encoding::R(0x12),
            Mult => Encoding::R(0x18),
            Multu => Encoding::R(0x19),
            Div => Encoding::R(0x1A),
            Divu => Encoding::R(0x1B),
            Add => Encoding::R(0x20),
            Addu => Encoding::R(0x21),
            Sub => Encoding::R(0x22),
            Subu => Encoding::R(0x23),
            And => Encoding::R(0x24),
            Or => Encoding::R(0x25),
            Xor => Encoding::R(0x26),
            Nor => Encoding::R(0x27),
            Slt => Encoding::R(0x2A),
            Sltu => Encoding::R(0x2B),
            Bltz => Encoding::RegImm(0x00),
            Bgez => Encoding::RegImm(0x01),
            J => Encoding::J(0x02),
            Jal => Encoding::J(0x03),
            Beq => Encoding::I(0x04),
            Bne => Encoding::I(0x05),
            Blez => Encoding::I(0x06),
            Bgtz => Encoding::I(0x07),
            Addi => Encoding::I(0x08),
            Addiu => Encoding::I(0x09),
            Slti => Encoding::I(0x0A),
            Sltiu => Encoding::I(0x0B),
            Andi => Encoding::I(0x0C),
            Ori => Encoding::I(0x0D),
            Xori => Encoding::I(0x0E),
            Lui => Encoding::I(0x0F),
            Lb => Encoding::I(0x20),
            Lh => Encoding::I(0x21),
            Lw => Encoding::I(0x23),
            Lbu => Encoding::I(0x24),
            Lhu => Encoding::I(0x25),
            Sb => Encoding::I(0x28),
            Sh => Encoding::I(0x29),
            Sw => Encoding::I(0x2B),
            Nop | Move | Li | La | B => Encoding::Pseudo,
        }
    }
}

pub fn is_mnemonic(s: &str) -> bool {
    Mnemonic::parse(s).is_some()
}

#[test]
fn test() {
    use strum::IntoEnumIterator;
    assert_eq!(Mnemonic::parse("addiu"), Some(Mnemonic::Addiu));
    assert_eq!(Mnemonic::parse("ADDIU"), None);
    assert_eq!(Mnemonic::Syscall.to_string(), "syscall");
    for m in Mnemonic::iter() {
        assert_eq!(Mnemonic::parse(&m.to_string()), Some(m));
        if m.encoding() == Encoding::Pseudo {
            assert!(!matches!(m.format(), Format::Reg3 | Format::Mem));
        }
    }
}
