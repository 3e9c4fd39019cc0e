use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// General purpose registers. Every register answers to its ABI name and to
/// its number (`$t0` and `$8` are the same register).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    TryFromPrimitive,
    IntoPrimitive,
    EnumString,
    EnumIter,
    Display,
)]
#[repr(u8)]
pub enum Reg {
    #[default]
    #[strum(to_string = "$zero", serialize = "$0")]
    Zero,
    #[strum(to_string = "$at", serialize = "$1")]
    At,
    #[strum(to_string = "$v0", serialize = "$2")]
    V0,
    #[strum(to_string = "$v1", serialize = "$3")]
    V1,
    #[strum(to_string = "$a0", serialize = "$4")]
    A0,
    #[strum(to_string = "$a1", serialize = "$5")]
    A1,
    #[strum(to_string = "$a2", serialize = "$6")]
    A2,
    #[strum(to_string = "$a3", serialize = "$7")]
    A3,
    #[strum(to_string = "$t0", serialize = "$8")]
    T0,
    #[strum(to_string = "$t1", serialize = "$9")]
    T1,
    #[strum(to_string = "$t2", serialize = "$10")]
    T2,
    #[strum(to_string = "$t3", serialize = "$11")]
    T3,
    #[strum(to_string = "$t4", serialize = "$12")]
    T4,
    #[strum(to_string = "$t5", serialize = "$13")]
    T5,
    #[strum(to_string = "$t6", serialize = "$14")]
    T6,
    #[strum(to_string = "$t7", serialize = "$15")]
    T7,
    #[strum(to_string = "$s0", serialize = "$16")]
    S0,
    #[strum(to_string = "$s1", serialize = "$17")]
    S1,
    #[strum(to_string = "$s2", serialize = "$18")]
    S2,
    #[strum(to_string = "$s3", serialize = "$19")]
    S3,
    #[strum(to_string = "$s4", serialize = "$20")]
    S4,
    #[strum(to_string = "$s5", serialize = "$21")]
    S5,
    #[strum(to_string = "$s6", serialize = "$22")]
    S6,
    #[strum(to_string = "$s7", serialize = "$23")]
    S7,
    #[strum(to_string = "$t8", serialize = "$24")]
    T8,
    #[strum(to_string = "$t9", serialize = "$25")]
    T9,
    #[strum(to_string = "$k0", serialize = "$26")]
    K0,
    #[strum(to_string = "$k1", serialize = "$27")]
    K1,
    #[strum(to_string = "$gp", serialize = "$28")]
    Gp,
    #[strum(to_string = "$sp", serialize = "$29")]
    Sp,
    #[strum(to_string = "$fp", serialize = "$30")]
    Fp,
    #[strum(to_string = "$ra", serialize = "$31")]
    Ra,
}

impl Reg {
    /// Register names are case-sensitive, as in assembly sources.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<Self>().ok()
    }

    pub fn num(self) -> u32 {
        u8::from(self) as u32
    }
}

pub fn is_register(s: &str) -> bool {
    Reg::parse(s).is_some()
}

#[test]
fn test() {
    assert_eq!(Reg::parse("$t0"), Some(Reg::T0));
    assert_eq!(Reg::parse("$8"), Some(Reg::T0));
    assert_eq!(Reg::parse("$ra").map(Reg::num), Some(31));
    assert_eq!(Reg::parse("$T0"), None);
    assert_eq!(Reg::parse("t0"), None);
    assert_eq!(Reg::parse("$32"), None);
    assert_eq!(Reg::Sp.to_string(), "$sp");
    assert_eq!(Reg::try_from(29u8).ok(), Some(Reg::Sp));
}
