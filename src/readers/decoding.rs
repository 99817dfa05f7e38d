use crate::error::{ProcessingError, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Decode raw export bytes. A byte-order mark wins over `label`; input
/// that is not valid UTF-8 when UTF-8 was requested is re-read as
/// Windows-1252, which most German authority exports use.
pub fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ProcessingError::Encoding(label.to_string()))?;

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors && used == UTF_8 {
        tracing::debug!("input is not valid UTF-8, decoding as {}", WINDOWS_1252.name());
        let (text, _, _) = WINDOWS_1252.decode(bytes);
        return Ok(text.into_owned());
    }

    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8() {
        assert_eq!(decode("Gewässer".as_bytes(), "utf-8").unwrap(), "Gewässer");
    }

    #[test]
    fn test_latin1_fallback() {
        let bytes = [b'g', b'e', b'p', b'r', 0xFC, b'f', b't'];
        assert_eq!(decode(&bytes, "utf-8").unwrap(), "geprüft");
        assert_eq!(decode(&bytes, "latin1").unwrap(), "geprüft");
    }

    #[test]
    fn test_bom_is_stripped() {
        let bytes = [0xEF, 0xBB, 0xBF, b'I', b'D'];
        assert_eq!(decode(&bytes, "windows-1252").unwrap(), "ID");
    }

    #[test]
    fn test_unknown_label() {
        assert!(matches!(
            decode(b"x", "klingon"),
            Err(ProcessingError::Encoding(_))
        ));
    }
}
