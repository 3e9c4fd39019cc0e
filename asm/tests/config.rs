use simasm::config::Predictor;
use simasm::{
    assemble_str, load_binary, write_binary, AsmOptions, Endian, MemSegment, PipelineSettings,
    RunConfig,
};
use std::path::PathBuf;

fn temp(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("simasm-{}-{}", std::process::id(), name))
}

fn program_config() -> (simasm::Program, RunConfig) {
    let program = assemble_str(
        &[("main.s", ".data\nx: .word 5\n.text\nmain: lw $t0, x($zero)\njr $ra\n")],
        AsmOptions::default(),
    )
    .unwrap();
    let config = RunConfig::from_program(&program, "main.bin", PipelineSettings::default());
    (program, config)
}

#[test]
fn config_keys() {
    let (_, config) = program_config();
    let text = config.to_string();
    println!("{text}");
    for line in [
        "binary=main.bin",
        "code_start=0x0",
        "entry_point=0x00000000",
        "endian=little",
        "text_begin_0=0x00000000",
        "text_end_0=0x00000008",
        "data_begin_0=0x00001000",
        "data_end_0=0x00001004",
        "isa=MIPS32",
        "forwarding=true",
        "branch_predictor=not_taken",
        "max_cycles=100000",
    ] {
        assert!(text.lines().any(|l| l == line), "missing `{line}`");
    }
}

#[test]
fn config_round_trip() {
    let (_, mut config) = program_config();
    config.settings.branch_delay_slot = true;
    config.settings.branch_predictor = Predictor::Bimodal;
    config.endian = Endian::Big;
    let parsed = RunConfig::parse(&config.to_string()).unwrap();
    assert_eq!(parsed, config);
    assert_eq!(parsed.text, vec![MemSegment::new(0, 8)]);
}

#[test]
fn comments_and_blank_lines() {
    let parsed = RunConfig::parse("# header\n\nbinary=a.bin\n  # indented\nentry_point=0x40\n").unwrap();
    assert_eq!(parsed.binary, "a.bin");
    assert_eq!(parsed.entry_point, 0x40);
    assert!(parsed.text.is_empty());
    assert_eq!(parsed.settings, PipelineSettings::default());
}

#[test]
fn binary_reload() {
    let (program, mut config) = program_config();
    let bin = temp("reload.bin");
    let cfg = temp("reload.cfg");
    config.binary = bin.display().to_string();

    write_binary(&bin, &program.memory).unwrap();
    config.write(&cfg).unwrap();

    let config = RunConfig::load(&cfg).unwrap();
    let image = load_binary(&bin).unwrap();
    assert_eq!(image.len(), program.memory.capacity());
    let memory = config.memory(&image);
    assert_eq!(memory.read_word(0x1000), Some(5));
    assert_eq!(memory.read_word(0), program.memory.read_word(0));
    assert_eq!(memory.text_segments(), program.memory.text_segments());
    assert!(memory.segments_overlap().is_none());

    std::fs::remove_file(bin).ok();
    std::fs::remove_file(cfg).ok();
}

#[test]
fn settings_file() {
    let path = temp("settings.yaml");
    std::fs::write(&path, "branch_delay_slot: true\nmax_cycles: 500\n").unwrap();
    let settings = PipelineSettings::load(&path).unwrap();
    assert!(settings.branch_delay_slot);
    assert_eq!(settings.max_cycles, 500);
    assert!(settings.forwarding);
    std::fs::remove_file(path).ok();

    let err = PipelineSettings::load(&temp("missing.yaml")).unwrap_err();
    assert_eq!(err.kind(), simasm::ErrorKind::Io);
}

#[test]
fn predictor_fields_reject_wide_values() {
    let (_, config) = program_config();
    let mut text = config.to_string();
    let line = text.lines().count() + 1;
    text.push_str("predictor_entries=4294967296\n");
    let err = RunConfig::parse(&text).unwrap_err();
    assert!(matches!(err, simasm::Error::Config { line: l, .. } if l == line), "{err}");

    text.truncate(text.len() - "predictor_entries=4294967296\n".len());
    text.push_str("predictor_entries=4294967295\n");
    assert_eq!(RunConfig::parse(&text).unwrap().settings.predictor_entries, u32::MAX);
}
