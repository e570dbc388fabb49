//! Hex formatting helpers.

/// Format an address as a hex string with 0x prefix.
pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}

/// Render `bytes` as hexdump lines of 16 bytes each.
///
/// ```text
/// 0x0500000C: 2A 00 00 00 00 00 00 00  00 00 00 00 00 00 00 00  |*...............|
/// ```
pub fn hexdump_lines(base: u64, bytes: &[u8], ascii: bool) -> Vec<String> {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let mut line = format!("{:#010X}: ", base + (i * 16) as u64);

            for j in 0..16 {
                if j == 8 {
                    line.push(' ');
                }
                match chunk.get(j) {
                    Some(byte) => line.push_str(&format!("{:02X} ", byte)),
                    None => line.push_str("   "),
                }
            }

            if ascii {
                line.push_str(" |");
                for &byte in chunk {
                    line.push(if (0x20..0x7F).contains(&byte) {
                        byte as char
                    } else {
                        '.'
                    });
                }
                line.push_str(&" ".repeat(16 - chunk.len()));
                line.push('|');
            }

            line.trim_end().to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hex_address() {
        assert_eq!(format_hex_address(0x1000), "0x1000");
        assert_eq!(format_hex_address(0xDEADBEEF), "0xDEADBEEF");
        assert_eq!(format_hex_address(0), "0x0");
    }

    #[test]
    fn test_hexdump_full_line() {
        let bytes: Vec<u8> = b"Hello World".iter().copied().chain([0u8; 5]).collect();
        let lines = hexdump_lines(0x1000, &bytes, true);
        assert_eq!(
            lines,
            vec![
                "0x00001000: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|"
            ]
        );
    }

    #[test]
    fn test_hexdump_partial_line() {
        let lines = hexdump_lines(0x20, &[0xAB; 18], false);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0x00000020: AB AB"));
        assert_eq!(lines[1], "0x00000030: AB AB");

        let lines = hexdump_lines(0x20, &[0x41; 2], true);
        assert_eq!(
            lines[0],
            format!("0x00000020: 41 41 {}|AA{}|", " ".repeat(3 * 14 + 1 + 1), " ".repeat(14))
        );
    }
}
