//! Runtime faults raised by the pipeline engine while it executes an image.
//!
//! Defined next to the ISA so the engine and its front ends agree on kind,
//! severity and faulting address. The assembler's headless check raises
//! [`FaultKind::UnreservedMemory`] for an entry point outside every text
//! segment.

use std::fmt;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FaultKind {
    #[strum(to_string = "read of uninitialized register")]
    UninitializedRegister,
    #[strum(to_string = "access to unreserved memory")]
    UnreservedMemory,
    #[strum(to_string = "misaligned memory access")]
    MisalignedAccess,
    #[strum(to_string = "invalid instruction")]
    InvalidInstruction,
    #[strum(to_string = "arithmetic overflow")]
    Overflow,
    #[strum(to_string = "division by zero")]
    DivisionByZero,
    #[strum(to_string = "cycle budget exhausted")]
    CycleBudget,
}

impl FaultKind {
    /// Severity used when the raiser has no reason to override it.
    pub fn default_fatal(self) -> bool {
        !matches!(
            self,
            FaultKind::UninitializedRegister | FaultKind::UnreservedMemory
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    kind: FaultKind,
    fatal: bool,
    addr: Option<u32>,
}

impl Fault {
    pub fn new(kind: FaultKind) -> Self {
        Fault {
            kind,
            fatal: kind.default_fatal(),
            addr: None,
        }
    }

    pub fn at(mut self, addr: u32) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn fatal(mut self, fatal: bool) -> Self {
        self.fatal = fatal;
        self
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// A fatal fault halts the simulation; the others are reported and the
    /// pipeline keeps going.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn addr(&self) -> Option<u32> {
        self.addr
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = if self.fatal { "fatal" } else { "warning" };
        match self.addr {
            Some(addr) => write!(f, "{}: {} at 0x{:08X}", severity, self.kind, addr),
            None => write!(f, "{}: {}", severity, self.kind),
        }
    }
}

impl std::error::Error for Fault {}
