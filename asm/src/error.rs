use crate::token::Pos;
use color_print::cprintln;
use indexmap::IndexMap;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Assembly,
    Io,
    Config,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("Unknown operation: `{0}`")]
    UnknownOperation(String),

    #[error("Unknown directive: `{0}`")]
    UnknownDirective(String),

    #[error("More argument required")]
    MissingArgument,

    #[error("Unexpected token: `{0}`")]
    UnexpectedToken(String),

    #[error("Cannot parse `{0}` as {1}")]
    ParseArgument(String, String),

    #[error("Invalid argument for `{0}`: {1}")]
    InvalidDirectiveArgument(String, String),

    #[error("Instruction outside of a text segment")]
    InstructionOutsideText,

    #[error("Undefined label: `{0}`")]
    UndefinedLabel(String),

    #[error("Re-defined label: `{0}`")]
    RedefinedLabel(String),

    #[error("No entry point found: label `main` is not defined")]
    NoEntryPoint,

    #[error("Value {0} does not fit in {1} bits")]
    ImmediateOutOfRange(i64, u32),

    #[error("Branch target 0x{0:08X} is out of range")]
    BranchOutOfRange(u32),

    #[error("Jump target 0x{0:08X} is outside the current 256MiB region")]
    JumpOutOfRegion(u32),

    #[error("Target 0x{0:08X} is not word aligned")]
    MisalignedTarget(u32),

    #[error("Address 0x{0:X} is outside the 32-bit address space")]
    AddressOverflow(i64),

    #[error("Segments overlap: {0}")]
    SegmentOverlap(String),

    #[error("Source `{0}` was already added")]
    DuplicateSource(String),

    #[error("Encoding failed: {0}")]
    Encode(#[from] arch::inst::EncodeError),
}

impl AsmError {
    pub fn at(self, pos: Pos) -> Error {
        Error::Assembler {
            pos: Some(pos),
            err: self,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{pos}: {msg}")]
    Tokenizer { pos: Pos, msg: String },

    #[error("{}{err}", .pos.map(|pos| format!("{pos}: ")).unwrap_or_default())]
    Assembler { pos: Option<Pos>, err: AsmError },

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to read line")]
    FileRead(#[source] std::io::Error),

    #[error("Failed to create file: {0}")]
    FileCreate(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("Invalid config at line {line}: {msg}")]
    Config { line: usize, msg: String },

    #[error("Invalid pipeline settings: {0}")]
    Settings(#[from] serde_yaml::Error),
}

impl From<AsmError> for Error {
    fn from(err: AsmError) -> Self {
        Error::Assembler { pos: None, err }
    }
}

impl Error {
    pub fn tokenizer(pos: Pos, msg: impl Into<String>) -> Self {
        Error::Tokenizer {
            pos,
            msg: msg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Tokenizer { .. } => ErrorKind::Lexical,
            Error::Assembler { .. } => ErrorKind::Assembly,
            Error::FileOpen(..) | Error::FileRead(_) | Error::FileCreate(..) | Error::FileWrite(..) => {
                ErrorKind::Io
            }
            Error::Config { .. } | Error::Settings(_) => ErrorKind::Config,
        }
    }

    pub fn pos(&self) -> Option<&Pos> {
        match self {
            Error::Tokenizer { pos, .. } => Some(pos),
            Error::Assembler { pos, .. } => pos.as_ref(),
            _ => None,
        }
    }

    pub fn asm_error(&self) -> Option<&AsmError> {
        match self {
            Error::Assembler { err, .. } => Some(err),
            _ => None,
        }
    }

    /// Message without the position prefix.
    pub fn message(&self) -> String {
        match self {
            Error::Tokenizer { msg, .. } => msg.clone(),
            Error::Assembler { err, .. } => err.to_string(),
            err => err.to_string(),
        }
    }

    /// Print error with diagnostic information showing file location and line content
    pub fn print_diag(&self, files: &IndexMap<String, Vec<String>>) {
        cprintln!("<red,bold>error</>: {}", self.message());

        let Some(pos) = self.pos() else {
            return;
        };
        let Some((file, lines)) = files.get_index(pos.src) else {
            return;
        };

        let line_num = pos.line + 1;
        cprintln!(
            "     <blue>--></> <underline>{}:{}:{}</>",
            file,
            line_num,
            pos.col + 1
        );
        cprintln!("      <blue>|</>");
        let line_content = lines.get(pos.line).map(|s| s.as_str()).unwrap_or("");
        cprintln!(" <blue>{:>4} |</> {}", line_num, line_content);
        cprintln!("      <blue>|</> {}<red,bold>^</>", " ".repeat(pos.col));
    }
}
