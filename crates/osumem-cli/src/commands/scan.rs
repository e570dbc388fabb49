//! Scan command implementation.
//!
//! With a pattern, lists where it matches. Without one, checks every built-in
//! signature and flags those that are missing or match more than once, which
//! is the first thing to look at after a client update.

use anyhow::Result;
use osumem_core::memory::{attach, attach_pid};
use osumem_core::{Config, Pattern, Process, Scanner, osu};

use super::hex_utils::format_hex_address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Unique,
    Ambiguous,
    Missing,
}

impl Verdict {
    fn of(matches: &[u64]) -> Self {
        match matches.len() {
            0 => Verdict::Missing,
            1 => Verdict::Unique,
            _ => Verdict::Ambiguous,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Verdict::Unique => "OK",
            Verdict::Ambiguous => "AMBIGUOUS",
            Verdict::Missing => "MISSING",
        }
    }
}

fn open(config: &Config, pid: Option<u32>) -> Result<Box<dyn Process>> {
    Ok(match pid {
        Some(pid) => attach_pid(pid)?,
        None => attach(&config.process.name, &config.process.blacklisted_titles)?,
    })
}

fn format_matches(matches: &[u64]) -> String {
    matches
        .iter()
        .map(|&address| format_hex_address(address))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run the scan command
pub fn run(config: &Config, pid: Option<u32>, pattern: Option<&str>, limit: usize) -> Result<()> {
    let scanner = Scanner::with_window_size(config.scan.window_size);

    if let Some(source) = pattern {
        let pattern = Pattern::compile(source)?;
        let process = open(config, pid)?;
        let matches = scanner.scan_all(&process, &pattern, limit)?;

        println!("Pattern: {} ({} bytes)", pattern, pattern.len());
        if matches.is_empty() {
            println!("No matches");
        }
        for address in &matches {
            println!("  {}", format_hex_address(*address));
        }
        if matches.len() == limit {
            println!("(stopped after {} matches)", limit);
        }
        return Ok(());
    }

    let schema = osu::address_schema()?;
    let process = open(config, pid)?;
    println!("Checking {} signatures...", schema.signatures().count());

    let mut problems = 0;
    for (name, pattern) in schema.signatures() {
        // Two matches are enough to call it ambiguous
        let matches = scanner.scan_all(&process, pattern, limit.max(2))?;
        let verdict = Verdict::of(&matches);
        if verdict != Verdict::Unique {
            problems += 1;
        }
        println!(
            "  [{:<9}] {:<14} {}",
            verdict.label(),
            name,
            format_matches(&matches)
        );
    }

    if problems > 0 {
        println!("{} signature(s) need attention", problems);
    } else {
        println!("All signatures match exactly once");
    }
    Ok(())
}
