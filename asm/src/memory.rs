//! Byte image of an assembled program.
//!
//! The image is split into data and text segments, each list kept sorted by
//! start address. Nothing stops two segments from overlapping while the
//! program is being assembled; [`MemoryBuffer::segments_overlap`] checks the
//! layout at the time it is called and has to be re-run after any later
//! change.

use std::fmt;
use strum::{Display, EnumString};

pub const DEFAULT_CAPACITY: usize = 0x2000;
pub const DEFAULT_TEXT_BASE: u32 = 0x0000_0000;
pub const DEFAULT_DATA_BASE: u32 = 0x0000_1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SegmentKind {
    Data,
    Text,
}

/// Half-open address range `[begin, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemSegment {
    begin: u32,
    end: u32,
}

impl MemSegment {
    pub fn new(begin: u32, end: u32) -> Self {
        MemSegment {
            begin,
            end: end.max(begin),
        }
    }

    pub fn begin(&self) -> u32 {
        self.begin
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.begin
    }

    /// Opened but never extended.
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn contains(&self, addr: u32) -> bool {
        self.begin <= addr && addr < self.end
    }
}

impl fmt::Display for MemSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:08X}, 0x{:08X})", self.begin, self.end)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    seg: MemSegment,
    serial: u64,
}

#[derive(Debug, Clone, Default)]
struct Segments {
    list: Vec<Entry>,
    current: Option<usize>,
}

impl Segments {
    fn open(&mut self, begin: u32, serial: u64) {
        if let Some(idx) = self.current.take() {
            if self.list[idx].seg.is_empty() {
                self.list.remove(idx);
            }
        }
        let at = self.list.partition_point(|e| e.seg.begin <= begin);
        self.list.insert(
            at,
            Entry {
                seg: MemSegment::new(begin, begin),
                serial,
            },
        );
        self.current = Some(at);
    }

    fn extend(&mut self, end: u32) {
        if let Some(idx) = self.current {
            let seg = &mut self.list[idx].seg;
            seg.end = seg.end.max(end);
        }
    }

    fn current(&self) -> Option<MemSegment> {
        self.current.map(|idx| self.list[idx].seg)
    }

    fn segments(&self) -> Vec<MemSegment> {
        self.list.iter().map(|e| e.seg).collect()
    }

    fn contains(&self, addr: u32) -> bool {
        self.list.iter().any(|e| e.seg.contains(addr))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryBuffer {
    bytes: Vec<u8>,
    endian: Endian,
    entry_point: u32,
    data: Segments,
    text: Segments,
    serial: u64,
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        MemoryBuffer::new(DEFAULT_CAPACITY, Endian::Little)
    }
}

impl MemoryBuffer {
    pub fn new(capacity: usize, endian: Endian) -> Self {
        MemoryBuffer {
            bytes: vec![0; capacity],
            endian,
            entry_point: 0,
            data: Segments::default(),
            text: Segments::default(),
            serial: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    pub fn entry_point(&self) -> u32 {
        self.entry_point
    }

    pub fn set_entry_point(&mut self, addr: u32) {
        self.entry_point = addr;
    }

    /// Copies `image` over the start of the buffer, growing it if needed.
    pub fn load_image(&mut self, image: &[u8]) {
        if image.len() > self.bytes.len() {
            self.bytes.resize(image.len(), 0);
        }
        self.bytes[..image.len()].copy_from_slice(image);
    }
}

// ----------------------------------------------------------------------------
// Byte, half-word and word access

impl MemoryBuffer {
    pub fn read_byte(&self, addr: u32) -> Option<u8> {
        self.bytes.get(addr as usize).copied()
    }

    /// Grows the buffer when `addr` is past its end: the new capacity is the
    /// required size rounded up to a word, doubled. Bytes gained this way
    /// carry no guaranteed value.
    pub fn write_byte(&mut self, addr: u32, value: u8) {
        let idx = addr as usize;
        if idx >= self.bytes.len() {
            let needed = (idx + 1 + 3) & !3;
            self.bytes.resize(needed * 2, 0);
        }
        self.bytes[idx] = value;
    }

    pub fn read_bytes(&self, addr: u32, len: usize) -> Option<&[u8]> {
        let begin = addr as usize;
        self.bytes.get(begin..begin.checked_add(len)?)
    }

    pub fn write_bytes(&mut self, addr: u32, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.write_byte(addr.wrapping_add(i as u32), *b);
        }
    }

    /// Sign-extended half-word.
    pub fn read_half(&self, addr: u32) -> Option<i16> {
        let raw: [u8; 2] = self.read_bytes(addr, 2)?.try_into().ok()?;
        Some(match self.endian {
            Endian::Little => i16::from_le_bytes(raw),
            Endian::Big => i16::from_be_bytes(raw),
        })
    }

    pub fn write_half(&mut self, addr: u32, value: u16) {
        let raw = match self.endian {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        self.write_bytes(addr, &raw);
    }

    pub fn read_word(&self, addr: u32) -> Option<u32> {
        let raw: [u8; 4] = self.read_bytes(addr, 4)?.try_into().ok()?;
        Some(match self.endian {
            Endian::Little => u32::from_le_bytes(raw),
            Endian::Big => u32::from_be_bytes(raw),
        })
    }

    pub fn write_word(&mut self, addr: u32, value: u32) {
        let raw = match self.endian {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        };
        self.write_bytes(addr, &raw);
    }
}

// ----------------------------------------------------------------------------
// Segments

fn clamp_addr(addr: i64) -> u32 {
    addr.clamp(0, u32::MAX as i64) as u32
}

impl MemoryBuffer {
    fn next_serial(&mut self) -> u64 {
        self.serial += 1;
        self.serial
    }

    pub fn open_data_segment(&mut self, addr: i64) {
        let serial = self.next_serial();
        self.data.open(clamp_addr(addr), serial);
    }

    /// Also zeroes every byte from `addr` to the end of the buffer, so that
    /// running past the last instruction reads `nop`s.
    pub fn open_text_segment(&mut self, addr: i64) {
        let begin = clamp_addr(addr);
        let serial = self.next_serial();
        self.text.open(begin, serial);
        if let Some(tail) = self.bytes.get_mut(begin as usize..) {
            tail.fill(0);
        }
    }

    pub fn extend_data_segment(&mut self, end: u32) {
        self.data.extend(end);
    }

    pub fn extend_text_segment(&mut self, end: u32) {
        self.text.extend(end);
    }

    pub fn current_data_segment(&self) -> Option<MemSegment> {
        self.data.current()
    }

    pub fn current_text_segment(&self) -> Option<MemSegment> {
        self.text.current()
    }

    pub fn data_segments(&self) -> Vec<MemSegment> {
        self.data.segments()
    }

    pub fn text_segments(&self) -> Vec<MemSegment> {
        self.text.segments()
    }

    pub fn is_in_data_segment(&self, addr: u32) -> bool {
        self.data.contains(addr)
    }

    pub fn is_in_text_segment(&self, addr: u32) -> bool {
        self.text.contains(addr)
    }

    /// All segments by start address; on equal starts the one opened first
    /// comes first.
    pub fn segments(&self) -> Vec<(SegmentKind, MemSegment)> {
        let (data, text) = (&self.data.list, &self.text.list);
        let mut merged = Vec::with_capacity(data.len() + text.len());
        let (mut i, mut j) = (0, 0);
        while i < data.len() && j < text.len() {
            let (d, t) = (&data[i], &text[j]);
            if (d.seg.begin, d.serial) <= (t.seg.begin, t.serial) {
                merged.push((SegmentKind::Data, d.seg));
                i += 1;
            } else {
                merged.push((SegmentKind::Text, t.seg));
                j += 1;
            }
        }
        merged.extend(data[i..].iter().map(|e| (SegmentKind::Data, e.seg)));
        merged.extend(text[j..].iter().map(|e| (SegmentKind::Text, e.seg)));
        merged
    }

    /// Describes the first pair of neighbouring segments where the second
    /// starts before the first ends.
    pub fn segments_overlap(&self) -> Option<String> {
        self.segments().windows(2).find_map(|pair| {
            let ((k0, s0), (k1, s1)) = (pair[0], pair[1]);
            (s1.begin < s0.end).then(|| format!("{} segment {} overlaps {} segment {}", k0, s0, k1, s1))
        })
    }
}
