use crate::error::{AsmError, Result};
use crate::label::Labels;
use crate::memory::{
    Endian, MemoryBuffer, DEFAULT_CAPACITY, DEFAULT_DATA_BASE, DEFAULT_TEXT_BASE,
};
use crate::parser::{self, Parser, Unresolved};
use indexmap::IndexMap;
use std::io::{BufRead, Read};

pub const ENTRY_LABEL: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsmOptions {
    pub endian: Endian,
    pub capacity: usize,
    pub text_base: u32,
    pub data_base: u32,
    /// Reject overlapping segments instead of reporting them as warnings.
    pub strict_layout: bool,
}

impl Default for AsmOptions {
    fn default() -> Self {
        AsmOptions {
            endian: Endian::Little,
            capacity: DEFAULT_CAPACITY,
            text_base: DEFAULT_TEXT_BASE,
            data_base: DEFAULT_DATA_BASE,
            strict_layout: false,
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Program {
    pub memory: MemoryBuffer,
    pub labels: Labels,
    /// Raw lines per source, in the order the sources were added.
    pub sources: IndexMap<String, Vec<String>>,
    /// Staged items in source order, kept for the listing.
    pub items: Vec<Unresolved>,
    pub warnings: Vec<String>,
}

/// One assembly run. Sources are parsed as they are added; labels from any
/// of them are visible to all the others once [`Assembler::finish`] resolves.
pub struct Assembler {
    options: AsmOptions,
    parser: Parser,
    labels: Labels,
    memory: MemoryBuffer,
    items: Vec<Unresolved>,
    sources: IndexMap<String, Vec<String>>,
}

impl Assembler {
    pub fn new(options: AsmOptions) -> Self {
        Assembler {
            options,
            parser: Parser::new(options.text_base, options.data_base),
            labels: Labels::new(),
            memory: MemoryBuffer::new(options.capacity, options.endian),
            items: vec![],
            sources: IndexMap::new(),
        }
    }

    pub fn options(&self) -> &AsmOptions {
        &self.options
    }

    /// Raw lines of every source added so far, for diagnostics.
    pub fn sources(&self) -> &IndexMap<String, Vec<String>> {
        &self.sources
    }

    /// Parses one more stream. Names must be unique within a run.
    pub fn add_source<R: BufRead>(&mut self, name: &str, mut reader: R) -> Result<()> {
        if self.sources.contains_key(name) {
            return Err(AsmError::DuplicateSource(name.to_string()).into());
        }
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(crate::error::Error::FileRead)?;
        let (src, _) = self.sources.insert_full(
            name.to_string(),
            text.lines().map(str::to_string).collect(),
        );
        let items = self
            .parser
            .parse(src, text.as_bytes(), &mut self.labels, &mut self.memory)?;
        self.items.extend(items);
        Ok(())
    }

    pub fn finish(mut self) -> Result<Program> {
        parser::resolve(&self.items, &self.labels, &mut self.memory)?;

        let entry = self.labels.get(ENTRY_LABEL).ok_or(AsmError::NoEntryPoint)?;
        self.memory.set_entry_point(entry);

        let mut warnings = vec![];
        if let Some(overlap) = self.memory.segments_overlap() {
            if self.options.strict_layout {
                return Err(AsmError::SegmentOverlap(overlap).into());
            }
            warnings.push(overlap);
        }

        Ok(Program {
            memory: self.memory,
            labels: self.labels,
            sources: self.sources,
            items: self.items,
            warnings,
        })
    }
}

/// Assembles in-memory sources given as `(name, text)` pairs.
pub fn assemble_str(sources: &[(&str, &str)], options: AsmOptions) -> Result<Program> {
    let mut asm = Assembler::new(options);
    for (name, text) in sources {
        asm.add_source(name, text.as_bytes())?;
    }
    asm.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_point() {
        let program = assemble_str(
            &[("a.s", "nop\nmain: addi $t0, $zero, 1\n")],
            AsmOptions::default(),
        )
        .unwrap();
        assert_eq!(program.memory.entry_point(), 4);
        assert_eq!(program.memory.read_word(4), Some(0x2008_0001));
        assert!(program.warnings.is_empty());
    }

    #[test]
    fn missing_main() {
        let err = assemble_str(&[("a.s", "nop\n")], AsmOptions::default()).unwrap_err();
        assert_eq!(err.asm_error(), Some(&AsmError::NoEntryPoint));
    }
}
