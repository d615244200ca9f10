// src/utils/charset.rs

//! Character set detection for fetched markup.
//!
//! Cached documents keep only their bytes, so the encoding is taken from a
//! byte order mark or a `<meta>` declaration near the start of the document.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};

/// How far into the document a `<meta>` charset declaration is looked for.
const PRESCAN_LIMIT: usize = 1024;

/// Decode an HTML document to text.
///
/// Without a BOM or declaration, valid UTF-8 is read as UTF-8 and anything
/// else as windows-1252.
pub fn decode_html(bytes: &[u8]) -> String {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => declared_encoding(bytes).unwrap_or_else(|| {
            if std::str::from_utf8(bytes).is_ok() {
                UTF_8
            } else {
                WINDOWS_1252
            }
        }),
    };
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Encoding named by the first `<meta>` charset declaration.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let encoding = Encoding::for_label(declared_charset(bytes)?.as_bytes())?;
    // A document declaring UTF-16 without a BOM is ASCII-compatible
    if encoding == UTF_16LE || encoding == UTF_16BE {
        return Some(UTF_8);
    }
    Some(encoding)
}

/// Label of the first `charset=` inside a `<meta>` tag, e.g. `iso-8859-1`.
fn declared_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(PRESCAN_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    head.match_indices("<meta").find_map(|(start, _)| {
        let tag = &head[start..];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];
        let rest = &tag[tag.find("charset")? + "charset".len()..];
        let rest = rest.trim_start().strip_prefix('=')?.trim_start();
        let label: String = rest
            .trim_start_matches(['"', '\''])
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
            .collect();
        (!label.is_empty()).then_some(label)
    })
}
