pub mod fault;
pub mod inst;
pub mod op;
pub mod reg;

/// Name written into run configurations.
pub const ISA: &str = "MIPS32";
