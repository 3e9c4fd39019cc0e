use crate::{
    op::{Encoding, Mnemonic},
    reg::Reg,
};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("`{0}` is not a {1} instruction")]
    WrongFormat(Mnemonic, &'static str),

    #[error("shift amount {0} does not fit in 5 bits")]
    ShiftAmount(u32),

    #[error("jump target index 0x{0:X} does not fit in 26 bits")]
    JumpIndex(u32),
}

/// One machine word, split into its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inst {
    R {
        rs: Reg,
        rt: Reg,
        rd: Reg,
        shamt: u8,
        funct: u8,
    },
    I {
        op: u8,
        rs: Reg,
        rt: u8,
        imm: u16,
    },
    J {
        op: u8,
        index: u32,
    },
}

impl Inst {
    pub const NOP: Inst = Inst::R {
        rs: Reg::Zero,
        rt: Reg::Zero,
        rd: Reg::Zero,
        shamt: 0,
        funct: 0,
    };

    pub fn r(m: Mnemonic, rd: Reg, rs: Reg, rt: Reg, shamt: u32) -> Result<Inst, EncodeError> {
        let Encoding::R(funct) = m.encoding() else {
            return Err(EncodeError::WrongFormat(m, "register"));
        };
        if shamt > 0x1F {
            return Err(EncodeError::ShiftAmount(shamt));
        }
        Ok(Inst::R {
            rs,
            rt,
            rd,
            shamt: shamt as u8,
            funct,
        })
    }

    pub fn i(m: Mnemonic, rt: Reg, rs: Reg, imm: u16) -> Result<Inst, EncodeError> {
        match m.encoding() {
            Encoding::I(op) => Ok(Inst::I {
                op,
                rs,
                rt: u8::from(rt),
                imm,
            }),
            // bltz/bgez select the condition through the rt field
            Encoding::RegImm(cond) => Ok(Inst::I {
                op: 0x01,
                rs,
                rt: cond,
                imm,
            }),
            _ => Err(EncodeError::WrongFormat(m, "immediate")),
        }
    }

    pub fn j(m: Mnemonic, index: u32) -> Result<Inst, EncodeError> {
        let Encoding::J(op) = m.encoding() else {
            return Err(EncodeError::WrongFormat(m, "jump"));
        };
        if index > 0x03FF_FFFF {
            return Err(EncodeError::JumpIndex(index));
        }
        Ok(Inst::J { op, index })
    }

    pub fn to_bin(&self) -> u32 {
        match *self {
            Inst::R {
                rs,
                rt,
                rd,
                shamt,
                funct,
            } => {
                (rs.num() << 21)
                    | (rt.num() << 16)
                    | (rd.num() << 11)
                    | ((shamt as u32 & 0x1F) << 6)
                    | (funct as u32 & 0x3F)
            }
            Inst::I { op, rs, rt, imm } => {
                ((op as u32 & 0x3F) << 26)
                    | (rs.num() << 21)
                    | ((rt as u32 & 0x1F) << 16)
                    | imm as u32
            }
            Inst::J { op, index } => ((op as u32 & 0x3F) << 26) | (index & 0x03FF_FFFF),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r_type() {
        let add = Inst::r(Mnemonic::Add, Reg::T0, Reg::T1, Reg::T2, 0).unwrap();
        assert_eq!(add.to_bin(), 0x012A_4020);
        let sll = Inst::r(Mnemonic::Sll, Reg::T0, Reg::Zero, Reg::T1, 4).unwrap();
        assert_eq!(sll.to_bin(), 0x0009_4100);
        let syscall = Inst::r(Mnemonic::Syscall, Reg::Zero, Reg::Zero, Reg::Zero, 0).unwrap();
        assert_eq!(syscall.to_bin(), 0x0000_000C);
        assert_eq!(Inst::NOP.to_bin(), 0);
    }

    #[test]
    fn i_type() {
        let addi = Inst::i(Mnemonic::Addi, Reg::T0, Reg::Zero, 5).unwrap();
        assert_eq!(addi.to_bin(), 0x2008_0005);
        let lw = Inst::i(Mnemonic::Lw, Reg::T0, Reg::Sp, 4).unwrap();
        assert_eq!(lw.to_bin(), 0x8FA8_0004);
        let bgez = Inst::i(Mnemonic::Bgez, Reg::Zero, Reg::T0, 0xFFFF).unwrap();
        assert_eq!(bgez.to_bin(), 0x0501_FFFF);
    }

    #[test]
    fn j_type() {
        let j = Inst::j(Mnemonic::J, 0x0010_0000).unwrap();
        assert_eq!(j.to_bin(), 0x0810_0000);
        assert_eq!(
            Inst::j(Mnemonic::J, 0x0400_0000),
            Err(EncodeError::JumpIndex(0x0400_0000))
        );
    }

    #[test]
    fn wrong_format() {
        assert!(Inst::r(Mnemonic::Lw, Reg::T0, Reg::T0, Reg::T0, 0).is_err());
        assert!(Inst::i(Mnemonic::Add, Reg::T0, Reg::T0, 0).is_err());
        assert!(Inst::r(Mnemonic::Sll, Reg::T0, Reg::T0, Reg::T0, 32).is_err());
    }
}
