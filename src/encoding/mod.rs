//! Byte input decoding.
//!
//! Bytes handed to a [`SelectionBuilder`](crate::SelectionBuilder) are
//! decoded to UTF-8 with `encoding_rs` before any parsing happens. The
//! encoding is chosen by WHATWG label (`utf-8`, `latin1`, `shift_jis`, ...)
//! and defaults to UTF-8. A byte order mark, when present, overrides the
//! label.

use encoding_rs::{Encoding, UTF_8};

use crate::error::{Error, Result};

/// Looks up an encoding by label, ignoring case and surrounding whitespace.
///
/// # Errors
///
/// Returns [`Error::UnknownEncoding`] for a label `encoding_rs` does not
/// know.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.to_owned()))
}

/// Decodes `bytes` with the encoding named by `label`, or UTF-8.
///
/// Malformed sequences are replaced with U+FFFD.
///
/// # Errors
///
/// Returns [`Error::UnknownEncoding`] when `label` is not a known encoding.
///
/// # Examples
///
/// ```
/// use seloxide::encoding::decode;
///
/// assert_eq!(decode(b"caf\xe9", Some("latin1")).unwrap(), "café");
/// assert_eq!(decode("café".as_bytes(), None).unwrap(), "café");
/// assert!(decode(b"x", Some("no-such-charset")).is_err());
/// ```
pub fn decode(bytes: &[u8], label: Option<&str>) -> Result<String> {
    let encoding = match label {
        Some(label) => encoding_for_label(label)?,
        None => UTF_8,
    };
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(
            encoding = used.name(),
            "input contains malformed byte sequences, replaced with U+FFFD"
        );
    }
    Ok(text.into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_utf8() {
        assert_eq!(decode("<p>ü</p>".as_bytes(), None).unwrap(), "<p>ü</p>");
    }

    #[test]
    fn test_label_lookup_is_case_insensitive() {
        assert_eq!(encoding_for_label(" UTF-8 ").unwrap(), UTF_8);
        assert_eq!(encoding_for_label("Latin1").unwrap().name(), "windows-1252");
    }

    #[test]
    fn test_unknown_label() {
        let err = decode(b"x", Some("klingon")).unwrap_err();
        assert!(matches!(err, Error::UnknownEncoding(ref l) if l == "klingon"));
    }

    #[test]
    fn test_bom_overrides_label() {
        let bytes = b"\xFF\xFEh\x00i\x00";
        assert_eq!(decode(bytes, Some("latin1")).unwrap(), "hi");
    }

    #[test]
    fn test_malformed_bytes_replaced() {
        assert_eq!(decode(b"a\xFFb", None).unwrap(), "a\u{FFFD}b");
    }

    #[test]
    fn test_shift_jis() {
        assert_eq!(
            decode(b"\x82\xa0", Some("shift_jis")).unwrap(),
            "\u{3042}"
        );
    }
}
