use simasm::memory::{Endian, MemSegment, MemoryBuffer, SegmentKind};

#[test]
fn word_round_trip_both_endians() {
    for endian in [Endian::Little, Endian::Big] {
        let mut mem = MemoryBuffer::new(16, endian);
        mem.write_word(4, 0xDEAD_BEEF);
        assert_eq!(mem.read_word(4), Some(0xDEAD_BEEF));
        mem.write_half(8, 0xFFFE);
        assert_eq!(mem.read_half(8), Some(-2));
    }
}

#[test]
fn byte_order() {
    let mut little = MemoryBuffer::new(8, Endian::Little);
    little.write_word(0, 0x1122_3344);
    assert_eq!(little.read_bytes(0, 4), Some(&[0x44, 0x33, 0x22, 0x11][..]));

    let mut big = MemoryBuffer::new(8, Endian::Big);
    big.write_word(0, 0x1122_3344);
    assert_eq!(big.read_bytes(0, 4), Some(&[0x11, 0x22, 0x33, 0x44][..]));
    assert_eq!(big.read_half(2), Some(0x3344));
}

#[test]
fn reads_past_capacity() {
    let mem = MemoryBuffer::new(8, Endian::Little);
    assert_eq!(mem.read_byte(8), None);
    assert_eq!(mem.read_word(6), None);
    assert_eq!(mem.read_word(u32::MAX), None);
}

#[test]
fn growth_preserves_contents() {
    let mut mem = MemoryBuffer::new(4, Endian::Little);
    mem.write_word(0, 0x0102_0304);
    mem.write_word(0x100, 0xAABB_CCDD);
    assert_eq!(mem.capacity(), 0x208);
    assert_eq!(mem.read_word(0), Some(0x0102_0304));
    assert_eq!(mem.read_word(0x100), Some(0xAABB_CCDD));
}

#[test]
fn segments_stay_sorted() {
    let mut mem = MemoryBuffer::default();
    for (begin, end) in [(0x300, 0x310), (0x100, 0x110), (0x200, 0x220)] {
        mem.open_data_segment(begin);
        mem.extend_data_segment(end);
    }
    let begins: Vec<_> = mem.data_segments().iter().map(|s| s.begin()).collect();
    assert_eq!(begins, vec![0x100, 0x200, 0x300]);
    assert!(mem.is_in_data_segment(0x21F));
    assert!(!mem.is_in_data_segment(0x220));
}

#[test]
fn negative_address_clamps() {
    let mut mem = MemoryBuffer::default();
    mem.open_text_segment(-8);
    mem.extend_text_segment(4);
    assert_eq!(mem.text_segments(), vec![MemSegment::new(0, 4)]);
}

#[test]
fn extend_never_shrinks() {
    let mut mem = MemoryBuffer::default();
    mem.extend_data_segment(0x40);
    assert!(mem.data_segments().is_empty());
    mem.open_data_segment(0x10);
    mem.extend_data_segment(0x40);
    mem.extend_data_segment(0x20);
    assert_eq!(mem.current_data_segment(), Some(MemSegment::new(0x10, 0x40)));
}

#[test]
fn text_open_zero_fills() {
    let mut mem = MemoryBuffer::new(16, Endian::Little);
    mem.write_word(0, 0xFFFF_FFFF);
    mem.write_word(8, 0xFFFF_FFFF);
    mem.open_text_segment(4);
    assert_eq!(mem.read_word(0), Some(0xFFFF_FFFF));
    assert_eq!(mem.read_word(8), Some(0));
}

#[test]
fn overlap_detection() {
    let mut mem = MemoryBuffer::default();
    mem.open_text_segment(0);
    mem.extend_text_segment(0x20);
    mem.open_data_segment(0x20);
    mem.extend_data_segment(0x30);
    assert_eq!(mem.segments_overlap(), None);

    mem.open_data_segment(0x1C);
    mem.extend_data_segment(0x24);
    let kinds: Vec<_> = mem.segments().into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(
        kinds,
        vec![SegmentKind::Text, SegmentKind::Data, SegmentKind::Data]
    );
    assert_eq!(
        mem.segments_overlap().as_deref(),
        Some("text segment [0x00000000, 0x00000020) overlaps data segment [0x0000001C, 0x00000024)")
    );
}

#[test]
fn round_trip_across_growth() {
    for endian in [Endian::Little, Endian::Big] {
        let mut mem = MemoryBuffer::new(8, endian);
        let value = |addr: u32| 0x9E37_79B9u32.wrapping_mul(addr + 1);
        // unaligned, non-overlapping words; the buffer grows several times
        for addr in (0..0x400).step_by(5) {
            mem.write_word(addr, value(addr));
        }
        assert!(mem.capacity() >= 0x400);
        for addr in (0..0x400).step_by(5) {
            assert_eq!(mem.read_word(addr), Some(value(addr)), "{endian} word at {addr:#x}");
        }

        let mut mem = MemoryBuffer::new(2, endian);
        for addr in (1..0x101).step_by(3) {
            mem.write_half(addr, value(addr) as u16);
            mem.write_byte(addr + 2, addr as u8);
        }
        for addr in (1..0x101).step_by(3) {
            assert_eq!(mem.read_half(addr), Some(value(addr) as u16 as i16));
            assert_eq!(mem.read_byte(addr + 2), Some(addr as u8));
        }
    }
}

#[test]
fn overlap_pairs() {
    let mut mem = MemoryBuffer::default();
    mem.open_data_segment(0x100);
    mem.extend_data_segment(0x110);
    mem.open_text_segment(0x108);
    mem.extend_text_segment(0x120);
    assert_eq!(
        mem.segments_overlap().as_deref(),
        Some("data segment [0x00000100, 0x00000110) overlaps text segment [0x00000108, 0x00000120)")
    );

    let mut mem = MemoryBuffer::default();
    mem.open_data_segment(0x100);
    mem.extend_data_segment(0x110);
    mem.open_text_segment(0x110);
    mem.extend_text_segment(0x120);
    assert_eq!(mem.segments_overlap(), None);
}
