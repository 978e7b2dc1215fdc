//! Text normalization for values read from tabular input.
//!
//! Generated artifacts are often device configurations that only accept
//! ASCII, while the data comes from spreadsheets full of accented names.
//! [`normalize`] folds accented Latin letters to their ASCII spelling and drops
//! every other non-ASCII character.

use deunicode::deunicode_char;

use crate::error::Error;

/// The UTF-8 byte-order marker.
pub const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];

/// Returns `bytes` without a leading UTF-8 byte-order marker.
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Validates `bytes` as UTF-8 after stripping a leading BOM.
///
/// `origin` names the input in the error message ("data source",
/// "template 'edge'").
pub fn decode_utf8<'a>(bytes: &'a [u8], origin: &str) -> Result<&'a str, Error> {
    std::str::from_utf8(strip_bom(bytes)).map_err(|e| Error::Encoding {
        origin: origin.to_string(),
        offset: e.valid_up_to(),
    })
}

/// Replaces accented Latin letters with ASCII and drops other non-ASCII characters.
///
/// ASCII passes through untouched. This function never fails.
///
/// # Example
///
/// ```rust
/// use stencil_render::normalize;
///
/// assert_eq!(normalize("Łódź-1"), "Lodz-1");
/// assert_eq!(normalize("core ♠ sw"), "core  sw");
/// ```
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else if let Some(ascii) = fold_accented(ch) {
            out.push_str(ascii);
        }
    }
    out
}

/// Looks a character up in the accented-Latin table.
///
/// The table covers the alphabetic characters of Latin-1 Supplement and
/// Latin Extended-A whose transliteration consists of ASCII letters only.
fn fold_accented(ch: char) -> Option<&'static str> {
    if !matches!(ch, '\u{00c0}'..='\u{017f}') || !ch.is_alphabetic() {
        return None;
    }
    deunicode_char(ch)
        .filter(|ascii| !ascii.is_empty() && ascii.bytes().all(|b| b.is_ascii_alphabetic()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_polish_letters() {
        assert_eq!(normalize("ĄĆĘŁŃÓŚŻŹąćęłńóśźż"), "ACELNOSZZacelnoszz");
    }

    #[test]
    fn test_normalize_ascii_unchanged() {
        let input = "hostname: core-01 / 10.0.0.1\t#x";
        assert_eq!(normalize(input), input);
    }

    #[test]
    fn test_normalize_drops_unmapped() {
        assert_eq!(normalize("♠ ♣ ♥ ♦"), "   ");
        assert_eq!(normalize("a→b"), "ab");
        assert_eq!(normalize("5×3"), "53");
    }

    #[test]
    fn test_normalize_multi_letter_folds() {
        assert_eq!(normalize("Straße"), "Strasse");
        assert_eq!(normalize("Ærø"), "AEro");
    }

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom(&[0xef, 0xbb, 0xbf, 0x41, 0x42]), b"AB");
        assert_eq!(strip_bom(b"ABC"), b"ABC");
        assert_eq!(strip_bom(b"\xef\xbb"), b"\xef\xbb");
        assert_eq!(strip_bom(&[]), b"");
    }

    #[test]
    fn test_decode_utf8_rejects_invalid() {
        let err = decode_utf8(&[0xd8, 0x01, 0xdc, 0x37], "data source").unwrap_err();
        assert!(matches!(err, Error::Encoding { offset: 0, .. }));
        assert!(err.to_string().contains("data source"));

        let err = decode_utf8(&[0x41, 0xd8, 0x37, 0xdc], "data source").unwrap_err();
        assert!(matches!(err, Error::Encoding { offset: 1, .. }));
    }

    #[test]
    fn test_decode_utf8_accepts_bom_and_multibyte() {
        assert_eq!(decode_utf8(&[0xef, 0xbb, 0xbf, 0x41], "x").unwrap(), "A");
        assert_eq!(decode_utf8("♠ ♣".as_bytes(), "x").unwrap(), "♠ ♣");
    }
}
