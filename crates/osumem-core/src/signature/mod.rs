//! Byte-signature search
//!
//! Signatures are whitespace-separated hex bytes with `??` wildcards, e.g.
//! `"7D 15 A1 ?? ?? ?? ?? 85 C0"`. Only whole 4-byte groups are compiled.

mod pattern;
mod scanner;

pub use pattern::Pattern;
pub use scanner::Scanner;
