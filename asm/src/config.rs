//! Files handed to the pipeline engine: the raw memory image and a
//! `key=value` run configuration describing how to load it.

use crate::assembler::Program;
use crate::error::{Error, Result};
use crate::memory::{Endian, MemSegment, MemoryBuffer};
use crate::token::parse_integer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Predictor {
    Off,
    #[default]
    NotTaken,
    Taken,
    Bimodal,
}

/// Pipeline feature flags, read from YAML. Missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub forwarding: bool,
    pub load_stall_bubble: bool,
    pub branch_delay_slot: bool,
    pub branch_predictor: Predictor,
    pub predictor_bits: u32,
    pub predictor_entries: u32,
    pub max_cycles: u64,
    pub output: String,
    pub log: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            forwarding: true,
            load_stall_bubble: true,
            branch_delay_slot: false,
            branch_predictor: Predictor::default(),
            predictor_bits: 2,
            predictor_entries: 64,
            max_cycles: 100_000,
            output: "pipeline.out".to_string(),
            log: "pipeline.log".to_string(),
        }
    }
}

impl PipelineSettings {
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::FileOpen(path.display().to_string(), e))?;
        Self::from_yaml(&text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub binary: String,
    pub code_start: u32,
    pub entry_point: u32,
    pub endian: Endian,
    pub text: Vec<MemSegment>,
    pub data: Vec<MemSegment>,
    pub isa: String,
    pub settings: PipelineSettings,
}

impl RunConfig {
    pub fn from_program(program: &Program, binary: &str, settings: PipelineSettings) -> Self {
        let memory = &program.memory;
        RunConfig {
            binary: binary.to_string(),
            code_start: 0,
            entry_point: memory.entry_point(),
            endian: memory.endian(),
            text: memory.text_segments(),
            data: memory.data_segments(),
            isa: arch::ISA.to_string(),
            settings,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_string())
            .map_err(|e| Error::FileWrite(path.display().to_string(), e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::FileOpen(path.display().to_string(), e))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut binary = None;
        let mut entry_point = None;
        let mut code_start = 0;
        let mut endian = Endian::default();
        let mut isa = arch::ISA.to_string();
        let mut settings = PipelineSettings::default();
        let mut text_bounds: BTreeMap<usize, (Option<u32>, Option<u32>)> = BTreeMap::new();
        let mut data_bounds: BTreeMap<usize, (Option<u32>, Option<u32>)> = BTreeMap::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let raw = raw.trim();
            if raw.is_empty() || raw.starts_with('#') {
                continue;
            }
            let err = |msg: String| Error::Config { line, msg };
            let (key, value) = raw
                .split_once('=')
                .ok_or_else(|| err(format!("expected `key=value`, found `{}`", raw)))?;
            let (key, value) = (key.trim(), value.trim());

            let addr = || {
                parse_integer(value)
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| err(format!("`{}` is not an address", value)))
            };
            let flag = || {
                value
                    .parse::<bool>()
                    .map_err(|_| err(format!("`{}` is not true or false", value)))
            };
            let number = || {
                value
                    .parse::<u64>()
                    .map_err(|_| err(format!("`{}` is not a number", value)))
            };
            let small = || {
                value
                    .parse::<u32>()
                    .map_err(|_| err(format!("`{}` is not a 32-bit number", value)))
            };

            match key {
                "binary" => binary = Some(value.to_string()),
                "code_start" => code_start = addr()?,
                "entry_point" => entry_point = Some(addr()?),
                "endian" => {
                    endian = value
                        .parse()
                        .map_err(|_| err(format!("unknown endianness `{}`", value)))?
                }
                "isa" => isa = value.to_string(),
                "output" => settings.output = value.to_string(),
                "log" => settings.log = value.to_string(),
                "forwarding" => settings.forwarding = flag()?,
                "load_stall_bubble" => settings.load_stall_bubble = flag()?,
                "branch_delay_slot" => settings.branch_delay_slot = flag()?,
                "branch_predictor" => {
                    settings.branch_predictor = value
                        .parse()
                        .map_err(|_| err(format!("unknown predictor `{}`", value)))?
                }
                "predictor_bits" => settings.predictor_bits = small()?,
                "predictor_entries" => settings.predictor_entries = small()?,
                "max_cycles" => settings.max_cycles = number()?,
                _ => {
                    let Some((bounds, is_begin, n)) = segment_key(key) else {
                        return Err(err(format!("unknown key `{}`", key)));
                    };
                    let bounds = if bounds == "text" {
                        &mut text_bounds
                    } else {
                        &mut data_bounds
                    };
                    let entry = bounds.entry(n).or_default();
                    if is_begin {
                        entry.0 = Some(addr()?);
                    } else {
                        entry.1 = Some(addr()?);
                    }
                }
            }
        }

        let missing = |key: &str| Error::Config {
            line: 0,
            msg: format!("missing key `{}`", key),
        };
        Ok(RunConfig {
            binary: binary.ok_or_else(|| missing("binary"))?,
            code_start,
            entry_point: entry_point.ok_or_else(|| missing("entry_point"))?,
            endian,
            text: segments(text_bounds, "text").map_err(|k| missing(&k))?,
            data: segments(data_bounds, "data").map_err(|k| missing(&k))?,
            isa,
            settings,
        })
    }

    /// Rebuilds the memory image described by this config around `image`.
    pub fn memory(&self, image: &[u8]) -> MemoryBuffer {
        let mut memory = MemoryBuffer::new(image.len(), self.endian);
        for seg in &self.text {
            memory.open_text_segment(seg.begin() as i64);
            memory.extend_text_segment(seg.end());
        }
        for seg in &self.data {
            memory.open_data_segment(seg.begin() as i64);
            memory.extend_data_segment(seg.end());
        }
        memory.load_image(image);
        memory.set_entry_point(self.entry_point);
        memory
    }
}

/// `text_begin_3` -> ("text", true, 3)
fn segment_key(key: &str) -> Option<(&str, bool, usize)> {
    let (kind, rest) = key.split_once('_')?;
    if kind != "text" && kind != "data" {
        return None;
    }
    let (bound, n) = rest.split_once('_')?;
    let is_begin = match bound {
        "begin" => true,
        "end" => false,
        _ => return None,
    };
    Some((kind, is_begin, n.parse().ok()?))
}

fn segments(
    bounds: BTreeMap<usize, (Option<u32>, Option<u32>)>,
    kind: &str,
) -> std::result::Result<Vec<MemSegment>, String> {
    bounds
        .into_iter()
        .map(|(n, bound)| match bound {
            (Some(begin), Some(end)) => Ok(MemSegment::new(begin, end)),
            (None, _) => Err(format!("{}_begin_{}", kind, n)),
            (_, None) => Err(format!("{}_end_{}", kind, n)),
        })
        .collect()
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# run configuration for the {} pipeline", self.isa)?;
        writeln!(f, "binary={}", self.binary)?;
        writeln!(f, "code_start=0x{:X}", self.code_start)?;
        writeln!(f, "entry_point=0x{:08X}", self.entry_point)?;
        writeln!(f, "endian={}", self.endian)?;
        for (n, seg) in self.text.iter().enumerate() {
            writeln!(f, "text_begin_{}=0x{:08X}", n, seg.begin())?;
            writeln!(f, "text_end_{}=0x{:08X}", n, seg.end())?;
        }
        for (n, seg) in self.data.iter().enumerate() {
            writeln!(f, "data_begin_{}=0x{:08X}", n, seg.begin())?;
            writeln!(f, "data_end_{}=0x{:08X}", n, seg.end())?;
        }
        let s = &self.settings;
        writeln!(f, "output={}", s.output)?;
        writeln!(f, "log={}", s.log)?;
        writeln!(f, "isa={}", self.isa)?;
        writeln!(f, "forwarding={}", s.forwarding)?;
        writeln!(f, "load_stall_bubble={}", s.load_stall_bubble)?;
        writeln!(f, "branch_delay_slot={}", s.branch_delay_slot)?;
        writeln!(f, "branch_predictor={}", s.branch_predictor)?;
        writeln!(f, "predictor_bits={}", s.predictor_bits)?;
        writeln!(f, "predictor_entries={}", s.predictor_entries)?;
        writeln!(f, "max_cycles={}", s.max_cycles)
    }
}

/// Dumps the whole backing store, no header.
pub fn write_binary(path: &Path, memory: &MemoryBuffer) -> Result<()> {
    std::fs::write(path, memory.as_bytes())
        .map_err(|e| Error::FileCreate(path.display().to_string(), e))
}

pub fn load_binary(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::FileOpen(path.display().to_string(), e))
}
