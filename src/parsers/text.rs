//! Plain text with charset detection.
//!
//! Decoding walks an ordered fallback chain and stops at the first stage
//! that succeeds:
//!
//! 1. a byte-order mark selects the encoding outright
//! 2. the statistical detector's guess, if its confidence is above the
//!    configured threshold and the bytes decode without error
//! 3. strict UTF-8
//! 4. UTF-8 with invalid sequences replaced by U+FFFD

use super::{read_bytes, ParseOutput, Parser, EMPTY_FILE};
use crate::config::ConverterConfig;
use crate::error::ConvertError;
use encoding_rs::Encoding;
use std::path::Path;
use tracing::debug;

/// Which fallback stage produced the decoded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Bom(&'static str),
    Detected(&'static str),
    Utf8,
    Lossy,
}

pub struct TextParser {
    sniff_bytes: usize,
    confidence_threshold: f32,
}

impl TextParser {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            sniff_bytes: config.encoding_sniff_bytes,
            confidence_threshold: config.encoding_confidence_threshold,
        }
    }
}

impl Parser for TextParser {
    fn parse(&self, path: &Path) -> Result<ParseOutput, ConvertError> {
        let bytes = read_bytes(path)?;
        let (text, stage) = decode_text(&bytes, self.sniff_bytes, self.confidence_threshold);
        debug!("Decoded {} via {:?}", path.display(), stage);

        let text = text.trim_end();
        if text.trim().is_empty() {
            return Ok(ParseOutput::new(EMPTY_FILE));
        }
        Ok(ParseOutput::new(text))
    }

    fn file_type_label(&self) -> &'static str {
        "Plain Text"
    }
}

/// Decode `bytes` through the fallback chain described in the module docs.
pub fn decode_text(bytes: &[u8], sniff_bytes: usize, threshold: f32) -> (String, DecodeStage) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text.into_owned(), DecodeStage::Bom(encoding.name()));
    }

    if let Some(encoding) = sniff_encoding(&bytes[..bytes.len().min(sniff_bytes)], threshold) {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return (text.into_owned(), DecodeStage::Detected(encoding.name()));
        }
        debug!("Detected {} but bytes do not decode cleanly", encoding.name());
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), DecodeStage::Utf8),
        Err(_) => (
            String::from_utf8_lossy(bytes).into_owned(),
            DecodeStage::Lossy,
        ),
    }
}

/// The detector's encoding when its confidence is strictly above `threshold`.
fn sniff_encoding(sample: &[u8], threshold: f32) -> Option<&'static Encoding> {
    if sample.is_empty() {
        return None;
    }
    let (charset, confidence, _language) = chardet::detect(sample);
    debug!("Charset sniff: {charset:?} (confidence {confidence:.2})");
    if confidence <= threshold {
        return None;
    }
    Encoding::for_label(chardet::charset2encoding(&charset).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::test_support::write_file;

    fn parser() -> TextParser {
        TextParser::new(&ConverterConfig::default())
    }

    #[test]
    fn plain_ascii() {
        let (_dir, path) = write_file("notes.txt", "Hello world\nSecond line\n\n");
        let out = parser().parse(&path).unwrap();
        assert_eq!(out.markdown, "Hello world\nSecond line");
    }

    #[test]
    fn utf16_bom_is_honoured() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "héllo".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (text, stage) = decode_text(&bytes, 10_000, 0.5);
        assert_eq!(text, "héllo");
        assert_eq!(stage, DecodeStage::Bom("UTF-16LE"));
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let (text, stage) = decode_text(b"\xEF\xBB\xBFabc", 10_000, 0.5);
        assert_eq!(text, "abc");
        assert_eq!(stage, DecodeStage::Bom("UTF-8"));
    }

    #[test]
    fn unconfident_guess_falls_back_to_utf8() {
        // A threshold of 1.0 can never be exceeded.
        let (text, stage) = decode_text("naïve café".as_bytes(), 10_000, 1.0);
        assert_eq!(text, "naïve café");
        assert_eq!(stage, DecodeStage::Utf8);
    }

    #[test]
    fn invalid_utf8_falls_back_to_lossy() {
        let (text, stage) = decode_text(b"caf\xE9 ok", 10_000, 1.0);
        assert_eq!(text, "caf\u{FFFD} ok");
        assert_eq!(stage, DecodeStage::Lossy);
    }

    #[test]
    fn undecodable_bytes_never_fail_the_parse() {
        let (_dir, path) = write_file("mixed.txt", b"start \xC3\x28 \xFF\xFE\xFD end".as_slice());
        let out = parser().parse(&path).unwrap();
        assert!(out.markdown.starts_with("start"));
        assert!(out.markdown.ends_with("end"));
    }

    #[test]
    fn empty_file_is_placeholder() {
        let (_dir, path) = write_file("empty.txt", "");
        assert_eq!(parser().parse(&path).unwrap().markdown, EMPTY_FILE);
        let (_dir, path) = write_file("blank.rst", "   \n\n");
        assert_eq!(parser().parse(&path).unwrap().markdown, EMPTY_FILE);
    }
}
