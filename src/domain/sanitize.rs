//! Reduce arbitrary reason text to the ASCII subset every display font covers.
//!
//! Typographic punctuation is folded to its ASCII look-alike first so that
//! curly quotes and dashes survive as readable characters; everything else
//! outside 7-bit ASCII is dropped rather than rendered as a missing glyph.

use std::fmt;

/// Text guaranteed to contain only codepoints in `0x00..=0x7F`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizedText(String);

impl SanitizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-case copy; ASCII case mapping keeps the invariant.
    pub fn to_uppercase(&self) -> SanitizedText {
        SanitizedText(self.0.to_ascii_uppercase())
    }
}

impl fmt::Display for SanitizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fold typographic punctuation to ASCII and drop anything non-ASCII.
pub fn sanitize(input: &str) -> SanitizedText {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00E9}' => out.push('e'),
            c if c.is_ascii() => out.push(c),
            _ => {}
        }
    }
    SanitizedText(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_typographic_punctuation() {
        let text = sanitize(
            "\u{201C}I can\u{2019}t\u{201D} \u{2014} it\u{2019}s a caf\u{00E9} thing\u{2026}",
        );
        assert_eq!(text.as_str(), "\"I can't\" - it's a cafe thing...");
    }

    #[test]
    fn drops_unmapped_codepoints() {
        let text = sanitize("no \u{1F645} way \u{00FC}ber \u{4E0D}");
        assert_eq!(text.as_str(), "no  way ber ");
    }

    #[test]
    fn output_is_ascii_and_idempotent() {
        let samples = [
            "",
            "plain ascii stays put",
            "\u{2018}single\u{2019} \u{201C}double\u{201D}",
            "en\u{2013}dash em\u{2014}dash",
            "\u{00C9}\u{00E9}\u{00E8}\u{00EA}",
            "mixed \u{2026} \u{1F600} \u{0000} tabs\tand\nnewlines",
        ];

        for sample in samples {
            let once = sanitize(sample);
            assert!(once.as_str().chars().all(|c| (c as u32) <= 0x7F), "{sample:?}");
            let twice = sanitize(once.as_str());
            assert_eq!(once, twice, "sanitize must be idempotent for {sample:?}");
        }
    }

    #[test]
    fn uppercase_keeps_ascii_invariant() {
        let text = sanitize("caf\u{00E9} nope").to_uppercase();
        assert_eq!(text.as_str(), "CAFE NOPE");
    }
}
