//! Built-in Helvetica: WinAnsi encoding and AFM advance widths.

/// Helvetica widths for WinAnsi codes 32..=255, in thousandths of an em.
/// Codes WinAnsi leaves undefined carry 0.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 224] = [
    // 32..=63
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    // 64..=95
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    // 96..=127
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,
    // 128..=159
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,
    // 160..=191
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    // 192..=223
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    // 224..=255
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

/// WinAnsi code for `ch`, if the encoding has one.
pub fn win_ansi_byte(ch: char) -> Option<u8> {
    let code = ch as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => {
            let byte = match ch {
                '€' => 0x80,
                '‚' => 0x82,
                'ƒ' => 0x83,
                '„' => 0x84,
                '…' => 0x85,
                '†' => 0x86,
                '‡' => 0x87,
                'ˆ' => 0x88,
                '‰' => 0x89,
                'Š' => 0x8A,
                '‹' => 0x8B,
                'Œ' => 0x8C,
                'Ž' => 0x8E,
                '\u{2018}' => 0x91,
                '\u{2019}' => 0x92,
                '\u{201C}' => 0x93,
                '\u{201D}' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '˜' => 0x98,
                '™' => 0x99,
                'š' => 0x9A,
                '›' => 0x9B,
                'œ' => 0x9C,
                'ž' => 0x9E,
                'Ÿ' => 0x9F,
                _ => return None,
            };
            Some(byte)
        }
    }
}

/// Encode `text` for a WinAnsi font. Tabs become spaces; anything else
/// without a code becomes `?`.
pub(crate) fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\t' => b' ',
            other => win_ansi_byte(other).unwrap_or(b'?'),
        })
        .collect()
}

/// Advance width of a WinAnsi code, in thousandths of an em.
pub fn helvetica_width(code: u8) -> u16 {
    if code < 32 {
        return 0;
    }
    HELVETICA_WIDTHS[(code - 32) as usize]
}

/// Width of already-encoded text at `font_size`.
pub(crate) fn measure_win_ansi(encoded: &[u8], font_size: f64) -> f64 {
    let units: u32 = encoded.iter().map(|&b| helvetica_width(b) as u32).sum();
    units as f64 * font_size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_widths() {
        assert_eq!(helvetica_width(b' '), 278);
        assert_eq!(helvetica_width(b'@'), 1015);
        assert_eq!(helvetica_width(b'H'), 722);
        assert_eq!(helvetica_width(b'~'), 584);
        assert_eq!(helvetica_width(b'{'), 334);
    }

    #[test]
    fn test_hello_width() {
        // H 722 + e 556 + l 222 + l 222 + o 556 = 2278
        let encoded = encode_win_ansi("Hello");
        assert!((measure_win_ansi(&encoded, 12.0) - 27.336).abs() < 1e-9);
    }

    #[test]
    fn test_encoding_specials_and_latin1() {
        assert_eq!(encode_win_ansi("é€—"), vec![0xE9, 0x80, 0x97]);
        assert_eq!(helvetica_width(0x97), 1000);
        assert_eq!(helvetica_width(0x95), 350);
    }

    #[test]
    fn test_unmappable_becomes_question_mark() {
        assert_eq!(encode_win_ansi("✓"), b"?".to_vec());
        assert_eq!(encode_win_ansi("a\tb"), b"a b".to_vec());
    }
}
