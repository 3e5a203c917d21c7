use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::convert::{Charset, ConvertFn, DateTimePattern, Locale, TypeTag, TypedValue};

const TRUE_VALUES: [&str; 10] = ["true", "1", "yes", "y", "on", "ja", "j", "si", "sim", "oui"];
const FALSE_VALUES: [&str; 5] = ["false", "0", "no", "n", "off"];

pub fn parse_bool(raw: &str) -> Result<bool, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    if TRUE_VALUES.contains(&normalized.as_str()) {
        Ok(true)
    } else if FALSE_VALUES.contains(&normalized.as_str()) {
        Ok(false)
    } else {
        Err(format!("'{}' is not a boolean", raw.trim()))
    }
}

fn parse_number<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|err| err.to_string())
}

fn parse_char(raw: &str) -> Result<char, String> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(format!("expected exactly one character, got {}", raw.chars().count())),
    }
}

macro_rules! number_converter {
    ($tag:ident, $ty:ty) => {
        (
            TypeTag::$tag,
            Arc::new(|raw: &str| parse_number::<$ty>(raw).map(TypedValue::$tag)) as ConvertFn,
        )
    };
}

/// Converters registered at the builtin ordinal by every builder.
pub fn primitive_converters() -> Vec<(TypeTag, ConvertFn)> {
    vec![
        (
            TypeTag::Bool,
            Arc::new(|raw: &str| parse_bool(raw).map(TypedValue::Bool)) as ConvertFn,
        ),
        number_converter!(I8, i8),
        number_converter!(I16, i16),
        number_converter!(I32, i32),
        number_converter!(I64, i64),
        number_converter!(U8, u8),
        number_converter!(U16, u16),
        number_converter!(U32, u32),
        number_converter!(U64, u64),
        number_converter!(Usize, usize),
        number_converter!(F32, f32),
        number_converter!(F64, f64),
        (
            TypeTag::Char,
            Arc::new(|raw: &str| parse_char(raw).map(TypedValue::Char)) as ConvertFn,
        ),
        (
            TypeTag::String,
            Arc::new(|raw: &str| Ok(TypedValue::String(raw.to_owned()))) as ConvertFn,
        ),
        (
            TypeTag::Path,
            Arc::new(|raw: &str| Ok(TypedValue::Path(PathBuf::from(raw.trim())))) as ConvertFn,
        ),
    ]
}

/// Text, date/time pattern, charset and locale converters added by the standard bootstrap.
pub fn extended_converters() -> Vec<(TypeTag, ConvertFn)> {
    vec![
        (
            TypeTag::Text,
            Arc::new(|raw: &str| Ok(TypedValue::String(raw.to_owned()))) as ConvertFn,
        ),
        (
            TypeTag::DateTimePattern,
            Arc::new(|raw: &str| DateTimePattern::of_pattern(raw).map(TypedValue::DateTimePattern))
                as ConvertFn,
        ),
        (
            TypeTag::Charset,
            Arc::new(|raw: &str| Charset::for_name(raw).map(TypedValue::Charset)) as ConvertFn,
        ),
        (
            TypeTag::Locale,
            Arc::new(|raw: &str| raw.parse::<Locale>().map(TypedValue::Locale)) as ConvertFn,
        ),
    ]
}
