use serde_json::Value;
use std::fmt;

use crate::content::{decode_base64, decoded_len};

/// Default cap on bodies fed through classification (10MB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Image container detected by magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    WebP,
    Tiff,
    Ico,
    Heif,
}

impl ImageFormat {
    /// Sniff the image format from leading bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::WebP)
        } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            Some(Self::Tiff)
        } else if is_bmp(bytes) {
            Some(Self::Bmp)
        } else if bytes.len() >= 6 && bytes[0..4] == [0, 0, 1, 0] && bytes[4..6] != [0, 0] {
            Some(Self::Ico)
        } else if is_heif(bytes) {
            Some(Self::Heif)
        } else {
            None
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::WebP => "image/webp",
            Self::Tiff => "image/tiff",
            Self::Ico => "image/x-icon",
            Self::Heif => "image/heif",
        }
    }
}

/// "BM" alone is too weak (plain text can start with it); also require a
/// known DIB header size at offset 14
fn is_bmp(bytes: &[u8]) -> bool {
    if bytes.len() < 26 || !bytes.starts_with(b"BM") {
        return false;
    }
    let dib = u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]);
    matches!(dib, 12 | 40 | 52 | 56 | 108 | 124)
}

fn is_heif(bytes: &[u8]) -> bool {
    bytes.len() >= 12
        && &bytes[4..8] == b"ftyp"
        && matches!(
            &bytes[8..12],
            b"heic" | b"heix" | b"hevc" | b"mif1" | b"msf1" | b"avif"
        )
}

/// Renderable form of a raw body payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRepresentation {
    /// Valid JSON document, re-serialized with two-space indentation
    Json { pretty: String },
    /// Recognized image; the bytes are kept for export/copy
    Image { bytes: Vec<u8>, format: ImageFormat },
    /// Text; `rich` holds the original markup when the body was HTML
    Text { plain: String, rich: Option<String> },
    /// Nothing renderable. Not an error; callers show a placeholder.
    None,
}

impl ContentRepresentation {
    /// Text form used by overviews and text copy, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Json { pretty } => Some(pretty),
            Self::Text { plain, .. } => Some(plain),
            Self::Image { .. } | Self::None => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Json { .. } => "json",
            Self::Image { .. } => "image",
            Self::Text { .. } => "text",
            Self::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for ContentRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image { bytes, format } => {
                write!(f, "<{} image, {} bytes>", format.mime(), bytes.len())
            }
            Self::None => f.write_str("<no content>"),
            other => f.write_str(other.text().unwrap_or_default()),
        }
    }
}

/// Classify a body. First match wins: JSON, image, HTML text, UTF-8 text.
pub fn classify(bytes: &[u8]) -> ContentRepresentation {
    // JSON before text: every JSON document is also valid UTF-8
    if let Some(pretty) = pretty_json(bytes) {
        return ContentRepresentation::Json { pretty };
    }

    if let Some(format) = ImageFormat::sniff(bytes) {
        return ContentRepresentation::Image {
            bytes: bytes.to_vec(),
            format,
        };
    }

    let Ok(text) = std::str::from_utf8(bytes) else {
        return ContentRepresentation::None;
    };

    if looks_like_html(text) {
        return ContentRepresentation::Text {
            plain: html_to_text(text),
            rich: Some(text.to_string()),
        };
    }

    ContentRepresentation::Text {
        plain: text.to_string(),
        rich: None,
    }
}

/// Size-guarded classification
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    pub max_body_bytes: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Classifier {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    /// Like [`classify`], but bodies over the limit are not decoded
    pub fn classify(&self, bytes: &[u8]) -> ContentRepresentation {
        if bytes.len() > self.max_body_bytes {
            tracing::debug!(
                len = bytes.len(),
                limit = self.max_body_bytes,
                "body exceeds classification limit"
            );
            return ContentRepresentation::None;
        }
        classify(bytes)
    }

    /// Classify a base64 body. The size limit is checked before decoding.
    /// Returns None if the body is not valid base64.
    pub fn classify_encoded(&self, encoded: &str) -> Option<ContentRepresentation> {
        let len = decoded_len(encoded);
        if len > self.max_body_bytes {
            tracing::debug!(
                len,
                limit = self.max_body_bytes,
                "encoded body exceeds classification limit"
            );
            return Some(ContentRepresentation::None);
        }
        decode_base64(encoded).map(|bytes| self.classify(&bytes))
    }
}

/// Only containers count; a bare `42` or `"str"` body is left to text
fn pretty_json(bytes: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    if !(value.is_object() || value.is_array()) {
        return None;
    }
    serde_json::to_string_pretty(&value).ok()
}

fn looks_like_html(text: &str) -> bool {
    let head: String = text
        .trim_start_matches('\u{feff}')
        .trim_start()
        .chars()
        .take(64)
        .collect::<String>()
        .to_ascii_lowercase();
    ["<!doctype html", "<html", "<head", "<body"]
        .iter()
        .any(|p| head.starts_with(p))
}

/// Tags whose contents are never shown
const HIDDEN_TAGS: [&str; 3] = ["script", "style", "head"];

/// Tags that end a line of rendered text
const BLOCK_TAGS: [&str; 14] = [
    "br", "p", "div", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "title", "pre", "table",
];

/// Reduce HTML to readable text: drop tags and hidden elements, break lines at
/// block elements, decode entities, and collapse whitespace.
pub(crate) fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut rest = html;
    let mut hidden: Option<&str> = None;

    while let Some(start) = rest.find('<') {
        if hidden.is_none() {
            out.push_str(&decode_entities(&rest[..start]));
        }
        // Unterminated tag: keep the remainder as text
        let Some(end) = rest[start..].find('>') else {
            rest = &rest[start..];
            break;
        };
        let tag = &rest[start + 1..start + end];
        rest = &rest[start + end + 1..];

        let closing = tag.starts_with('/');
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match hidden {
            Some(h) if closing && name == h => hidden = None,
            Some(_) => {}
            None => {
                if !closing && !tag.ends_with('/') {
                    if let Some(h) = HIDDEN_TAGS.iter().find(|h| **h == name) {
                        hidden = Some(*h);
                        continue;
                    }
                }
                if BLOCK_TAGS.contains(&name.as_str()) {
                    out.push('\n');
                }
            }
        }
    }
    if hidden.is_none() {
        out.push_str(&decode_entities(rest));
    }

    collapse_whitespace(&out)
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn test_json_is_pretty_printed() {
        let rep = classify(br#"{"a":1}"#);
        assert_eq!(
            rep,
            ContentRepresentation::Json {
                pretty: "{\n  \"a\": 1\n}".to_string()
            }
        );
    }

    #[test]
    fn test_json_keeps_key_order() {
        let rep = classify(br#"{"z":1,"a":[true,null]}"#);
        let text = rep.text().unwrap();
        assert!(text.find("\"z\"").unwrap() < text.find("\"a\"").unwrap());
    }

    #[test]
    fn test_json_scalar_is_text() {
        assert_eq!(classify(b"42").kind(), "text");
        assert_eq!(classify(b"true").kind(), "text");
    }

    #[test]
    fn test_png_is_image() {
        match classify(PNG_1X1) {
            ContentRepresentation::Image { bytes, format } => {
                assert_eq!(format, ImageFormat::Png);
                assert_eq!(bytes, PNG_1X1);
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_image_sniffing() {
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"GIF89a\x01\x00"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::sniff(b"\0\0\0\x18ftypheic"), Some(ImageFormat::Heif));
        assert_eq!(ImageFormat::sniff(b"BMW is a car brand, not a bitmap"), None);
    }

    #[test]
    fn test_ascii_is_text() {
        assert_eq!(
            classify(b"hello world"),
            ContentRepresentation::Text {
                plain: "hello world".to_string(),
                rich: None
            }
        );
    }

    #[test]
    fn test_binary_is_none() {
        assert!(classify(&[0xC3, 0x28, 0xFF, 0xFE, 0x00, 0x81]).is_none());
    }

    #[test]
    fn test_empty_body_is_empty_text() {
        assert_eq!(classify(b"").text(), Some(""));
    }

    #[test]
    fn test_html_is_rich_text() {
        let html = "<!DOCTYPE html><html><head><title>x</title><style>p{}</style></head>\
                    <body><h1>Hi &amp; bye</h1><p>one   two</p><script>var a = 1;</script>\
                    <p>&lt;3&#33;</p></body></html>";
        match classify(html.as_bytes()) {
            ContentRepresentation::Text { plain, rich } => {
                assert_eq!(plain, "Hi & bye\none two\n<3!");
                assert_eq!(rich.as_deref(), Some(html));
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_text_mentioning_tags_is_plain() {
        let rep = classify(b"use <html> for markup");
        assert_eq!(
            rep,
            ContentRepresentation::Text {
                plain: "use <html> for markup".to_string(),
                rich: None
            }
        );
    }

    #[test]
    fn test_decode_entities_leaves_unknown() {
        assert_eq!(decode_entities("a &bogus; b & c"), "a &bogus; b & c");
        assert_eq!(decode_entities("&#x41;&#66;"), "AB");
    }

    #[test]
    fn test_classifier_size_guard() {
        let classifier = Classifier::new(4);
        assert!(classifier.classify(b"hello").is_none());
        assert_eq!(classifier.classify(b"hey").kind(), "text");
    }

    #[test]
    fn test_classifier_guards_before_decoding() {
        // "aGVsb" is not valid base64; the limit must reject it first
        assert_eq!(
            Classifier::new(1).classify_encoded("aGVsb"),
            Some(ContentRepresentation::None)
        );
        assert_eq!(Classifier::new(100).classify_encoded("aGVsb"), None);

        let rep = Classifier::new(5).classify_encoded("aGVsbG8=").unwrap();
        assert_eq!(rep.text(), Some("hello"));
        assert!(Classifier::new(4).classify_encoded("aGVsbG8=").unwrap().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(classify(b"abc").to_string(), "abc");
        assert_eq!(ContentRepresentation::None.to_string(), "<no content>");
        assert_eq!(
            classify(PNG_1X1).to_string(),
            format!("<image/png image, {} bytes>", PNG_1X1.len())
        );
    }
}
