//! Text encoding detection and decoding.
//!
//! E-Prime writes its logs as UTF-16 with a byte order mark, while
//! exported tables are usually UTF-8 or a Windows code page.

use crate::error::{ReadError, ReadResult};

/// Encodings the readers know how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
    Windows1252,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::Latin1 => "iso-8859-1",
            TextEncoding::Windows1252 => "windows-1252",
        }
    }

    fn bom(&self) -> &'static [u8] {
        match self {
            TextEncoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            TextEncoding::Utf16Le => &[0xFF, 0xFE],
            TextEncoding::Utf16Be => &[0xFE, 0xFF],
            TextEncoding::Latin1 | TextEncoding::Windows1252 => &[],
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bytes inspected by the NUL heuristic.
const SNIFF_LEN: usize = 4096;

/// Detect the encoding of raw bytes.
///
/// A byte order mark wins. Without one, text that is mostly NUL bytes in
/// alternating positions is taken as UTF-16; valid UTF-8 is UTF-8; anything
/// else goes to chardet and is normalized to a single-byte code page.
pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    for encoding in [TextEncoding::Utf8, TextEncoding::Utf16Le, TextEncoding::Utf16Be] {
        if bytes.starts_with(encoding.bom()) {
            return encoding;
        }
    }

    if let Some(encoding) = sniff_utf16(bytes) {
        return encoding;
    }

    if std::str::from_utf8(bytes).is_ok() {
        return TextEncoding::Utf8;
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => TextEncoding::Latin1,
        // Not valid UTF-8, so any other guess is decoded with the widest code page
        _ => TextEncoding::Windows1252,
    }
}

/// UTF-16 without a BOM: ASCII text leaves a NUL in every other byte.
fn sniff_utf16(bytes: &[u8]) -> Option<TextEncoding> {
    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    if sample.len() < 2 {
        return None;
    }

    let (mut even, mut odd) = (0usize, 0usize);
    for (i, _) in sample.iter().enumerate().filter(|(_, b)| **b == 0) {
        if i % 2 == 0 {
            even += 1;
        } else {
            odd += 1;
        }
    }

    let half = sample.len() / 2;
    if odd * 10 >= half * 9 && even * 10 < half {
        Some(TextEncoding::Utf16Le)
    } else if even * 10 >= half * 9 && odd * 10 < half {
        Some(TextEncoding::Utf16Be)
    } else {
        None
    }
}

/// Decode bytes with the given encoding, dropping a leading BOM.
pub fn decode_content(bytes: &[u8], encoding: TextEncoding) -> ReadResult<String> {
    let body = bytes.strip_prefix(encoding.bom()).unwrap_or(bytes);

    let (text, had_errors) = match encoding {
        TextEncoding::Utf8 => encoding_rs::UTF_8.decode_without_bom_handling(body),
        TextEncoding::Utf16Le => encoding_rs::UTF_16LE.decode_without_bom_handling(body),
        TextEncoding::Utf16Be => encoding_rs::UTF_16BE.decode_without_bom_handling(body),
        TextEncoding::Latin1 => encoding_rs::ISO_8859_15.decode_without_bom_handling(body),
        TextEncoding::Windows1252 => encoding_rs::WINDOWS_1252.decode_without_bom_handling(body),
    };

    if had_errors {
        return Err(ReadError::Encoding(format!("invalid {} byte sequence", encoding)));
    }
    Ok(text.into_owned())
}

/// Detect then decode.
pub fn decode_auto(bytes: &[u8]) -> ReadResult<(String, TextEncoding)> {
    let encoding = detect_encoding(bytes);
    let text = decode_content(bytes, encoding)?;
    Ok((text, encoding))
}
