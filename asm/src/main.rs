use arch::fault::{Fault, FaultKind};
use color_print::{cformat, cprintln};
use indexmap::IndexMap;
use simasm::{
    assemble_str, load_binary, print_dump, write_binary, AsmOptions, Assembler, Endian, Error,
    PipelineSettings, RunConfig,
};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::ExitCode;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

const LICENSE: &str = "\
simasm: assembler for the MIPS32 pipeline simulator

This program is free software: you can redistribute it and/or modify it under
the terms of the GNU General Public License as published by the Free Software
Foundation, either version 3 of the License, or (at your option) any later
version.

This program is distributed in the hope that it will be useful, but WITHOUT
ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input files
    input: Vec<String>,

    /// Output binary
    #[clap(short, long, default_value = "main.bin")]
    output: String,

    /// Run configuration for the pipeline engine
    #[clap(long, default_value = "main.cfg")]
    cfg: String,

    /// Pipeline settings (YAML)
    #[clap(long)]
    settings: Option<String>,

    /// Emit a big-endian image
    #[clap(long)]
    big_endian: bool,

    /// Reject overlapping segments
    #[clap(long)]
    strict: bool,

    /// Dump assembly listing
    #[clap(short, long)]
    dump: bool,

    /// Interactive mode: read source from stdin
    #[clap(short, long)]
    gui: bool,

    /// Headless mode: reload a run configuration and its binary
    #[clap(short, long, value_name = "CONFIG", conflicts_with = "input")]
    config: Option<String>,

    /// Print the license
    #[clap(long)]
    about: bool,
}

/// Prints the diagnostic and leaves with a failure status.
macro_rules! check {
    ($result:expr, $sources:expr) => {
        match $result {
            Ok(v) => v,
            Err(err) => {
                let err: Error = err;
                err.print_diag($sources);
                return ExitCode::FAILURE;
            }
        }
    };
}

fn main() -> ExitCode {
    use clap::Parser;

    // the single-dash spelling is kept for existing scripts
    let argv = std::env::args().map(|arg| match arg.as_str() {
        "-about" => "--about".to_string(),
        _ => arg,
    });
    let args = Args::parse_from(argv);

    if args.about {
        println!("{}", LICENSE);
        return ExitCode::SUCCESS;
    }
    if let Some(config) = &args.config {
        return headless(config);
    }
    if args.gui || args.input.is_empty() {
        return interactive(&args);
    }
    assemble(&args)
}

fn options(args: &Args) -> AsmOptions {
    AsmOptions {
        endian: if args.big_endian {
            Endian::Big
        } else {
            Endian::Little
        },
        strict_layout: args.strict,
        ..AsmOptions::default()
    }
}

fn assemble(args: &Args) -> ExitCode {
    let empty = IndexMap::new();
    println!("MIPS32 Assembler");

    println!("1. Read Files and Parse Lines");
    let mut asm = Assembler::new(options(args));
    for path in &args.input {
        println!("  < {}", path);
        let file = check!(
            File::open(path).map_err(|e| Error::FileOpen(path.clone(), e)),
            &empty
        );
        check!(asm.add_source(path, BufReader::new(file)), asm.sources());
    }

    println!("2. Resolve Labels & Check Layout");
    let sources = asm.sources().clone();
    let program = check!(asm.finish(), &sources);
    for warning in &program.warnings {
        cprintln!("<yellow,bold>warn</>: {}", warning);
    }
    println!(
        "  - found #{} labels, entry point 0x{:08X}",
        program.labels.len(),
        program.memory.entry_point()
    );

    println!("3. Write Binary & Run Config");
    let settings = match &args.settings {
        Some(path) => check!(PipelineSettings::load(Path::new(path)), &empty),
        None => PipelineSettings::default(),
    };
    println!("  > {}", args.output);
    check!(write_binary(Path::new(&args.output), &program.memory), &empty);
    println!("  > {}", args.cfg);
    let config = RunConfig::from_program(&program, &args.output, settings);
    check!(config.write(Path::new(&args.cfg)), &empty);

    if args.dump {
        print_dump(&program);
    }
    ExitCode::SUCCESS
}

fn interactive(args: &Args) -> ExitCode {
    cprintln!("<green,bold>note</>: reading source from stdin, end with Ctrl-D");
    let mut text = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut text) {
        cprintln!("<red,bold>error</>: {}", Error::FileRead(e));
        return ExitCode::FAILURE;
    }

    let sources = IndexMap::from([(
        "<stdin>".to_string(),
        text.lines().map(str::to_string).collect::<Vec<_>>(),
    )]);
    let program = check!(assemble_str(&[("<stdin>", &text)], options(args)), &sources);
    for warning in &program.warnings {
        cprintln!("<yellow,bold>warn</>: {}", warning);
    }
    print_dump(&program);
    ExitCode::SUCCESS
}

fn headless(path: &str) -> ExitCode {
    let empty = IndexMap::new();
    let config = check!(RunConfig::load(Path::new(path)), &empty);
    let image = check!(load_binary(Path::new(&config.binary)), &empty);
    let memory = config.memory(&image);

    if let Some(overlap) = memory.segments_overlap() {
        cprintln!("<red,bold>error</>: Segments overlap: {}", overlap);
        return ExitCode::FAILURE;
    }
    if !memory.is_in_text_segment(memory.entry_point()) {
        // the first fetch would already leave the reserved text
        let fault = Fault::new(FaultKind::UnreservedMemory).at(memory.entry_point());
        cprintln!("<yellow,bold>{}</>", fault);
        if fault.is_fatal() {
            return ExitCode::FAILURE;
        }
    }

    let s = &config.settings;
    println!("{}", cformat!("<bold>{} run</>: {}", config.isa, path));
    println!("  binary      {} ({} bytes, {})", config.binary, image.len(), memory.endian());
    println!("  entry point 0x{:08X}", memory.entry_point());
    for seg in memory.text_segments() {
        println!("  text        {}", seg);
    }
    for seg in memory.data_segments() {
        println!("  data        {}", seg);
    }
    println!(
        "  pipeline    forwarding={} load_stall_bubble={} branch_delay_slot={}",
        s.forwarding, s.load_stall_bubble, s.branch_delay_slot
    );
    println!(
        "  predictor   {} ({} bits, {} entries)",
        s.branch_predictor, s.predictor_bits, s.predictor_entries
    );
    println!("  budget      {} cycles", s.max_cycles);
    println!("  output      {} (log {})", s.output, s.log);
    ExitCode::SUCCESS
}
