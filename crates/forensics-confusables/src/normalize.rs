//! Confusable normalization pipeline (spec §4.8, steps 1-3).

use crate::confusables::{MULTI_CHAR_SUBSTITUTIONS, SINGLE_CHAR_TABLE};
use forensics_types::results::ConfusableReplacement;

pub struct NormalizeOutput {
    pub normalized: String,
    pub replacements: Vec<ConfusableReplacement>,
}

/// Lowercase ASCII (leaving non-ASCII as-is), replace confusable codepoints
/// with their ASCII look-alike recording each replacement, then apply the
/// multi-character substitution table in a single pass.
pub fn normalize(domain: &str) -> NormalizeOutput {
    let mut replacements = Vec::new();
    let mut stage1 = String::with_capacity(domain.len());

    for (position, c) in domain.chars().enumerate() {
        let lowered = if c.is_ascii() { c.to_ascii_lowercase() } else { c };
        if let Some(&(replacement, script)) = SINGLE_CHAR_TABLE.get(&lowered) {
            replacements.push(ConfusableReplacement {
                original: c,
                position,
                normalized: replacement,
                script: script.to_string(),
            });
            stage1.push(replacement);
        } else {
            stage1.push(lowered);
        }
    }

    let mut normalized = stage1;
    for (from, to) in MULTI_CHAR_SUBSTITUTIONS {
        normalized = normalized.replace(from, to);
    }

    NormalizeOutput { normalized, replacements }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyrillic_a_is_replaced_and_recorded() {
        let out = normalize("pаypal.com"); // 'а' is Cyrillic U+0430
        assert_eq!(out.normalized, "paypal.com");
        assert_eq!(out.replacements.len(), 1);
        assert_eq!(out.replacements[0].script, "Cyrillic");
    }

    #[test]
    fn multi_char_substitution_applies_after_per_char_pass() {
        let out = normalize("rnicrosoft.com");
        assert_eq!(out.normalized, "microsoft.com");
    }

    #[test]
    fn ascii_only_domain_has_no_replacements() {
        let out = normalize("Example.com");
        assert_eq!(out.normalized, "example.com");
        assert!(out.replacements.is_empty());
    }
}
