use std::path::{Path, PathBuf};

use thiserror::Error;

/// Malformed hex string
#[derive(Debug, Error, PartialEq)]
#[allow(missing_docs)]
pub enum HexError {
    #[error("odd number of hex digits ({0})")]
    OddLength(usize),

    #[error("invalid hex character '{c}' at offset {index}")]
    InvalidChar { c: char, index: usize },
}
type Result<T> = core::result::Result<T, HexError>;

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode a hex string without ever failing. An optional `0x` prefix is
/// removed, then every character that isn't a hex digit is skipped and the
/// remaining digits are paired in order. A trailing unpaired digit is
/// dropped. Returns an empty buffer when there is nothing to decode.
pub fn decode_hex(s: &str) -> Vec<u8> {
    let digits: Vec<u8> = strip_hex_prefix(s.trim())
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();

    digits.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect()
}

/// Decode a hex string, rejecting anything but an even number of hex digits.
/// Surrounding whitespace and a `0x` prefix are accepted.
pub fn decode_hex_strict(s: &str) -> Result<Vec<u8>> {
    let s = strip_hex_prefix(s.trim());
    if s.len() % 2 != 0 {
        return Err(HexError::OddLength(s.len()));
    }

    // Check every char first, so that multibyte chars can't split a pair
    if let Some((index, c)) = s.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(HexError::InvalidChar { c, index });
    }

    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| HexError::InvalidChar {
                c: s[i..].chars().next().unwrap_or_default(),
                index: i,
            })
        })
        .collect()
}

/// Encode a buffer as lowercase hex, without separator
pub fn encode_hex(b: &[u8]) -> String {
    b.iter().map(|b| format!("{b:02x}")).collect()
}

/// Transform a relative path to an absolute one, based on the directory
/// base_path. If path is already absolute, it is returned unchanged.
pub fn path_relative_to(path: &str, base_path: &Path) -> PathBuf {
    let mut p = base_path.to_path_buf();
    // if path is absolute, it replaces base_path
    p.push(path);
    p
}

/// Return the absolute directory containing filename
pub fn parent_dir(filename: &str) -> std::io::Result<PathBuf> {
    match Path::new(filename).parent() {
        Some(p) if p != Path::new("") => p.canonicalize(),
        _ => std::env::current_dir(),
    }
}
