//! Body classification and text renderers.
//!
//! Everything here is pure: representations are derived on demand from a
//! packet's request info and never cached, so callers may run them on any
//! thread (including `spawn_blocking` workers for large bodies).

pub mod classify;
pub mod clipboard;
pub mod curl;
pub mod keyvalue;
pub mod overview;

pub use classify::*;
pub use clipboard::*;
pub use curl::*;
pub use keyvalue::*;
pub use overview::*;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

/// Standard alphabet, padding optional
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64 body, ignoring characters outside the alphabet
/// (line breaks, whitespace). Returns None if what remains is not base64.
pub fn decode_base64(encoded: &str) -> Option<Vec<u8>> {
    let filtered: String = encoded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();
    LENIENT_BASE64.decode(filtered).ok()
}

/// Size `encoded` would decode to, without decoding it
pub fn decoded_len(encoded: &str) -> usize {
    let symbols = encoded
        .bytes()
        .filter(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/'))
        .count();
    symbols * 3 / 4
}
