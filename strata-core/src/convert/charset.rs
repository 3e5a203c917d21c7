use serde::Serialize;

/// Character encodings recognised by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Charset {
    Utf8,
    Utf16,
    Utf16Be,
    Utf16Le,
    Utf32,
    UsAscii,
    Iso8859_1,
}

impl Charset {
    pub const ALL: [Charset; 7] = [
        Self::Utf8,
        Self::Utf16,
        Self::Utf16Be,
        Self::Utf16Le,
        Self::Utf32,
        Self::UsAscii,
        Self::Iso8859_1,
    ];

    /// Looks up a charset by canonical name or alias, ignoring case.
    pub fn for_name(name: &str) -> Result<Self, String> {
        let wanted = name.trim();
        if wanted.is_empty() {
            return Err("charset name is blank".to_owned());
        }
        Self::ALL
            .into_iter()
            .find(|charset| {
                charset.canonical_name().eq_ignore_ascii_case(wanted)
                    || charset
                        .aliases()
                        .iter()
                        .any(|alias| alias.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| format!("unsupported charset '{wanted}'"))
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16 => "UTF-16",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf32 => "UTF-32",
            Self::UsAscii => "US-ASCII",
            Self::Iso8859_1 => "ISO-8859-1",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Utf8 => &["utf8", "unicode-1-1-utf-8"],
            Self::Utf16 => &["utf16", "unicode"],
            Self::Utf16Be => &["utf_16be", "x-utf-16be"],
            Self::Utf16Le => &["utf_16le", "x-utf-16le"],
            Self::Utf32 => &["utf32", "utf_32"],
            Self::UsAscii => &["ascii", "us", "iso646-us", "ascii7", "646"],
            Self::Iso8859_1 => &["iso8859_1", "iso_8859_1", "latin1", "l1", "8859_1", "cp819"],
        }
    }

    /// Encodes `text`. Characters the charset cannot represent become `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf16 => {
                let mut bytes = vec![0xFE, 0xFF];
                bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
                bytes
            }
            Self::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Self::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Self::Utf32 => text
                .chars()
                .flat_map(|ch| u32::from(ch).to_be_bytes())
                .collect(),
            Self::UsAscii => single_byte(text, 0x7F),
            Self::Iso8859_1 => single_byte(text, 0xFF),
        }
    }
}

fn single_byte(text: &str, max: u32) -> Vec<u8> {
    text.chars()
        .map(|ch| {
            let code = u32::from(ch);
            u8::try_from(code).ok().filter(|_| code <= max).unwrap_or(b'?')
        })
        .collect()
}
