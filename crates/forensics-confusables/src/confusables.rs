//! Static confusable-character table (spec §4.8): visually similar
//! codepoints from other scripts mapped onto the ASCII letter they
//! impersonate, plus a small set of multi-character substitutions.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// `(original char, ascii replacement, script name)`.
pub static SINGLE_CHAR_TABLE: Lazy<HashMap<char, (char, &'static str)>> = Lazy::new(|| {
    let mut m = HashMap::new();
    let mut add = |pairs: &[(char, char)], script: &'static str| {
        for &(from, to) in pairs {
            m.insert(from, (to, script));
        }
    };

    // Cyrillic letters that are glyph-identical to Latin ones.
    add(
        &[
            ('а', 'a'), ('е', 'e'), ('о', 'o'), ('р', 'p'), ('с', 'c'),
            ('х', 'x'), ('у', 'y'), ('і', 'i'), ('ј', 'j'), ('ѕ', 's'),
            ('А', 'A'), ('В', 'B'), ('Е', 'E'), ('К', 'K'), ('М', 'M'),
            ('Н', 'H'), ('О', 'O'), ('Р', 'P'), ('С', 'C'), ('Т', 'T'),
            ('Х', 'X'),
        ],
        "Cyrillic",
    );

    // Greek letters.
    add(
        &[
            ('α', 'a'), ('ο', 'o'), ('ν', 'v'), ('ρ', 'p'), ('τ', 't'),
            ('υ', 'u'), ('ι', 'i'), ('κ', 'k'), ('Α', 'A'), ('Β', 'B'),
            ('Ε', 'E'), ('Ζ', 'Z'), ('Η', 'H'), ('Ι', 'I'), ('Κ', 'K'),
            ('Μ', 'M'), ('Ν', 'N'), ('Ο', 'O'), ('Ρ', 'P'), ('Τ', 'T'),
            ('Υ', 'Y'), ('Χ', 'X'),
        ],
        "Greek",
    );

    // Armenian letters with Latin-lookalike glyphs.
    add(&[('ո', 'n'), ('օ', 'o'), ('ս', 'u'), ('Ս', 'U')], "Armenian");

    // Mathematical Alphanumeric Symbols (bold/italic/sans-serif letters).
    for (base, start) in [
        ('a', '\u{1D41A}'), // mathematical bold small a
        ('A', '\u{1D400}'), // mathematical bold capital A
        ('a', '\u{1D44E}'), // mathematical italic small a
        ('A', '\u{1D434}'), // mathematical italic capital A
    ] {
        let start = start as u32;
        for i in 0..26 {
            if let Some(c) = char::from_u32(start + i) {
                let replacement = (base as u8 + i as u8) as char;
                m.entry(c).or_insert((replacement, "Mathematical Alphanumeric"));
            }
        }
    }

    // Fullwidth Latin letters (U+FF21-FF3A, U+FF41-FF5A).
    for i in 0..26u32 {
        if let Some(c) = char::from_u32(0xFF21 + i) {
            m.entry(c).or_insert(((b'A' + i as u8) as char, "Fullwidth"));
        }
        if let Some(c) = char::from_u32(0xFF41 + i) {
            m.entry(c).or_insert(((b'a' + i as u8) as char, "Fullwidth"));
        }
    }

    // Enclosed Alphanumerics (circled letters, U+24B6-24E9).
    for i in 0..26u32 {
        if let Some(c) = char::from_u32(0x24B6 + i) {
            m.entry(c).or_insert(((b'A' + i as u8) as char, "Enclosed Alphanumeric"));
        }
        if let Some(c) = char::from_u32(0x24D0 + i) {
            m.entry(c).or_insert(((b'a' + i as u8) as char, "Enclosed Alphanumeric"));
        }
    }

    // Latin Extended lookalikes.
    add(
        &[('ɑ', 'a'), ('ı', 'i'), ('ƒ', 'f'), ('ℓ', 'l'), ('ɡ', 'g')],
        "Latin Extended",
    );

    m
});

/// Multi-character substitutions applied in a single pass after
/// per-codepoint replacement, e.g. `rn` impersonating `m`.
pub const MULTI_CHAR_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("rn", "m"),
    ("vv", "w"),
    ("cl", "d"),
    ("cI", "d"),
    ("ii", "n"),
    ("I1", "l"),
    ("0o", "oo"),
];
