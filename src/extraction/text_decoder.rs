//! Plain text decoding with encoding detection.

use std::borrow::Cow;

use crate::error::{PipelineError, Result};

const FAILED_TEXT: &str = "Failed to process text file";

/// Bytes inspected when sniffing for binary content.
const BINARY_SAMPLE_SIZE: usize = 8192;

/// Text decoded from a plain text document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// Decoded content with Unix line endings.
    pub text: String,
    /// Encoding the bytes were read as.
    pub encoding: &'static str,
}

/// Decoder for `text/plain` uploads.
#[derive(Debug, Clone, Default)]
pub struct TextDecoder;

impl TextDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decode raw bytes into text with `\n` line breaks.
    ///
    /// UTF-16 needs a byte order mark. Anything else is read as UTF-8, with
    /// invalid sequences replaced by U+FFFD; input that holds no valid
    /// multi-byte sequence at all is read as Latin-1 instead.
    pub fn decode(&self, content: &[u8]) -> Result<DecodedText> {
        // UTF-16 carries NUL bytes for ASCII, so BOMs are checked before sniffing.
        let (text, encoding) = match content {
            [0xFF, 0xFE, body @ ..] => (decode_utf16(body, u16::from_le_bytes)?, "utf-16-le"),
            [0xFE, 0xFF, body @ ..] => (decode_utf16(body, u16::from_be_bytes)?, "utf-16-be"),
            _ if looks_binary(content) => {
                return Err(PipelineError::extraction(
                    FAILED_TEXT,
                    "binary content in text/plain document",
                ))
            }
            _ => decode_utf8_or_latin1(content),
        };

        Ok(DecodedText {
            text: unix_newlines(&text),
            encoding,
        })
    }
}

fn decode_utf16(body: &[u8], from_bytes: fn([u8; 2]) -> u16) -> Result<String> {
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| from_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| PipelineError::extraction(FAILED_TEXT, e))
}

fn decode_utf8_or_latin1(content: &[u8]) -> (String, &'static str) {
    let (text, encoding) = match String::from_utf8_lossy(content) {
        Cow::Borrowed(text) => (text.to_string(), "utf-8"),
        Cow::Owned(lossy) => {
            let has_multibyte = lossy
                .chars()
                .any(|c| !c.is_ascii() && c != char::REPLACEMENT_CHARACTER);
            if !has_multibyte {
                // Latin-1 maps every byte, so this always succeeds.
                return (content.iter().map(|&b| char::from(b)).collect(), "latin-1");
            }
            (lossy, "utf-8-lossy")
        }
    };

    match text.strip_prefix('\u{feff}') {
        Some(stripped) => (stripped.to_string(), encoding),
        None => (text, encoding),
    }
}

/// NUL bytes, or more than one in ten bytes being control characters other
/// than whitespace, within the leading sample.
fn looks_binary(content: &[u8]) -> bool {
    let sample = &content[..content.len().min(BINARY_SAMPLE_SIZE)];
    let control = sample
        .iter()
        .filter(|b| b.is_ascii_control() && !b.is_ascii_whitespace())
        .count();

    sample.contains(&0) || control * 10 > sample.len()
}

/// Rewrite `\r\n` and lone `\r` as `\n`.
pub(super) fn unix_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\r' {
            chars.next_if_eq(&'\n');
            out.push('\n');
        } else {
            out.push(c);
        }
    }

    out
}
