use crate::assembler::Program;
use crate::parser::{Item, Unresolved};
use color_print::cformat;
use std::collections::BTreeMap;

fn bytes_str(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn item_str(item: &Unresolved, raw: &str) -> String {
    match &item.item {
        Item::Code(code) => code.cformat(),
        Item::Data { .. } | Item::Bytes(_) => cformat!("<c>{}</>", raw.trim()),
    }
}

/// Listing of every source line with the address and bytes it produced.
pub fn print_dump(program: &Program) {
    let mut by_line: BTreeMap<(usize, usize), Vec<&Unresolved>> = BTreeMap::new();
    for item in &program.items {
        by_line.entry((item.pos.src, item.pos.line)).or_default().push(item);
    }

    for (src, (path, lines)) in program.sources.iter().enumerate() {
        println!(
            "{}+------[{}]{}",
            "-".repeat(22),
            path,
            "-".repeat(45usize.saturating_sub(path.len()))
        );
        for (idx, raw) in lines.iter().enumerate() {
            let line_num = idx + 1;
            let Some(items) = by_line.get(&(src, idx)) else {
                println!("{:22}| {:>4}: {}", "", line_num, raw);
                continue;
            };
            for item in items {
                // wide items are cut to their first word
                let len = item.size().min(4) as usize;
                let bin = match program.memory.read_bytes(item.addr, len) {
                    Some(bytes) => format!("{:<11}", bytes_str(bytes)),
                    None => cformat!("<r,s>!! !! !! !!</>"),
                };
                let label = match item.item {
                    Item::Code(_) => program
                        .labels
                        .name_of(item.addr)
                        .map(|name| cformat!("<g>{}:</> ", name))
                        .unwrap_or_default(),
                    _ => String::new(),
                };
                println!(
                    "[{:08X}] {}| {:>4}: {}{}",
                    item.addr,
                    bin,
                    line_num,
                    label,
                    item_str(item, raw)
                );
            }
        }
    }
    println!("{}+{}", "-".repeat(22), "-".repeat(53));
}
