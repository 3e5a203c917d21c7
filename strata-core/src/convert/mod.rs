pub mod builtin;
pub mod charset;
pub mod datetime;
pub mod locale;

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub use charset::Charset;
pub use datetime::DateTimePattern;
pub use locale::Locale;

use crate::error::{Error, Result};

/// Ordinal of the converters every builder starts with.
pub const BUILTIN_CONVERTER_ORDINAL: i32 = 1;
/// Ordinal of the converters the standard bootstrap adds on top.
pub const EXTENDED_CONVERTER_ORDINAL: i32 = 101;

/// Closed set of conversion targets. `Custom` covers application types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTag {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Char,
    String,
    Text,
    Path,
    DateTimePattern,
    Charset,
    Locale,
    Custom(&'static str),
}

impl TypeTag {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::String => "String",
            Self::Text => "text",
            Self::Path => "path",
            Self::DateTimePattern => "date-time pattern",
            Self::Charset => "charset",
            Self::Locale => "locale",
            Self::Custom(name) => *name,
        }
    }

    /// Tags tried, in order, when nothing is registered for this one.
    pub fn fallbacks(&self) -> &'static [TypeTag] {
        match self {
            Self::Text => &[TypeTag::String],
            Self::Path => &[TypeTag::Text, TypeTag::String],
            _ => &[],
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The output of a converter, before it is narrowed to the caller's Rust type.
#[derive(Clone)]
pub enum TypedValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    Path(PathBuf),
    DateTimePattern(DateTimePattern),
    Charset(Charset),
    Locale(Locale),
    Custom(Arc<dyn Any + Send + Sync>),
}

impl TypedValue {
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    /// Unwraps a `Custom` payload of type `T`, for `ConfigType` impls of application types.
    pub fn downcast_custom<T: Any + Clone>(self) -> Option<T> {
        match self {
            Self::Custom(inner) => inner.downcast_ref::<T>().cloned(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::I8(v) => Some(f64::from(*v)),
            Self::I16(v) => Some(f64::from(*v)),
            Self::I32(v) => Some(f64::from(*v)),
            Self::I64(v) => Some(*v as f64),
            Self::U8(v) => Some(f64::from(*v)),
            Self::U16(v) => Some(f64::from(*v)),
            Self::U32(v) => Some(f64::from(*v)),
            Self::U64(v) => Some(*v as f64),
            Self::Usize(v) => Some(*v as f64),
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub(crate) fn variant_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::Usize(_) => "usize",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Char(_) => "char",
            Self::String(_) => "String",
            Self::Path(_) => "path",
            Self::DateTimePattern(_) => "date-time pattern",
            Self::Charset(_) => "charset",
            Self::Locale(_) => "locale",
            Self::Custom(_) => "custom value",
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::Usize(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Path(v) => write!(f, "{}", v.display()),
            Self::DateTimePattern(v) => f.write_str(v.pattern()),
            Self::Charset(v) => f.write_str(v.canonical_name()),
            Self::Locale(v) => write!(f, "{v}"),
            Self::Custom(_) => f.write_str("<custom>"),
        }
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.variant_name(), self)
    }
}

/// A Rust type the resolver can hand back from `get_value`.
pub trait ConfigType: Sized {
    const TAG: TypeTag;

    fn from_value(value: TypedValue) -> Option<Self>;
}

macro_rules! config_type {
    ($ty:ty, $tag:ident) => {
        impl ConfigType for $ty {
            const TAG: TypeTag = TypeTag::$tag;

            fn from_value(value: TypedValue) -> Option<Self> {
                match value {
                    TypedValue::$tag(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

config_type!(bool, Bool);
config_type!(i8, I8);
config_type!(i16, I16);
config_type!(i32, I32);
config_type!(i64, I64);
config_type!(u8, U8);
config_type!(u16, U16);
config_type!(u32, U32);
config_type!(u64, U64);
config_type!(usize, Usize);
config_type!(f32, F32);
config_type!(f64, F64);
config_type!(char, Char);
config_type!(String, String);
config_type!(DateTimePattern, DateTimePattern);
config_type!(Charset, Charset);
config_type!(Locale, Locale);

impl ConfigType for Box<str> {
    const TAG: TypeTag = TypeTag::Text;

    fn from_value(value: TypedValue) -> Option<Self> {
        match value {
            TypedValue::String(text) => Some(text.into_boxed_str()),
            _ => None,
        }
    }
}

impl ConfigType for Arc<str> {
    const TAG: TypeTag = TypeTag::Text;

    fn from_value(value: TypedValue) -> Option<Self> {
        match value {
            TypedValue::String(text) => Some(Arc::from(text)),
            _ => None,
        }
    }
}

impl ConfigType for PathBuf {
    const TAG: TypeTag = TypeTag::Path;

    fn from_value(value: TypedValue) -> Option<Self> {
        match value {
            TypedValue::Path(path) => Some(path),
            TypedValue::String(text) => Some(PathBuf::from(text)),
            _ => None,
        }
    }
}

pub type ConvertFn = Arc<dyn Fn(&str) -> std::result::Result<TypedValue, String> + Send + Sync>;

#[derive(Clone)]
pub struct Converter {
    tag: TypeTag,
    ordinal: i32,
    convert: ConvertFn,
}

impl Converter {
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn ordinal(&self) -> i32 {
        self.ordinal
    }

    pub fn convert(&self, raw: &str) -> std::result::Result<TypedValue, String> {
        (self.convert)(raw)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("tag", &self.tag)
            .field("ordinal", &self.ordinal)
            .finish_non_exhaustive()
    }
}

/// Converters per tag, kept sorted by descending ordinal.
#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    converters: BTreeMap<TypeTag, Vec<Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the primitive, string and path converters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (tag, convert) in builtin::primitive_converters() {
            registry.converters.entry(tag).or_default().push(Converter {
                tag,
                ordinal: BUILTIN_CONVERTER_ORDINAL,
                convert,
            });
        }
        registry
    }

    pub fn register<F>(&mut self, tag: TypeTag, ordinal: i32, convert: F) -> Result<()>
    where
        F: Fn(&str) -> std::result::Result<TypedValue, String> + Send + Sync + 'static,
    {
        self.register_fn(tag, ordinal, Arc::new(convert))
    }

    pub fn register_fn(&mut self, tag: TypeTag, ordinal: i32, convert: ConvertFn) -> Result<()> {
        let entries = self.converters.entry(tag).or_default();
        if entries.iter().any(|existing| existing.ordinal == ordinal) {
            return Err(Error::AmbiguousConverter {
                type_name: tag.name().to_owned(),
                ordinal,
            });
        }
        entries.push(Converter {
            tag,
            ordinal,
            convert,
        });
        entries.sort_by(|left, right| right.ordinal.cmp(&left.ordinal));
        Ok(())
    }

    /// Highest-ordinal converter for `tag`, else for the first fallback tag that has one.
    pub fn resolve(&self, tag: TypeTag) -> Option<&Converter> {
        std::iter::once(&tag)
            .chain(tag.fallbacks())
            .find_map(|candidate| self.converters.get(candidate).and_then(|list| list.first()))
    }

    pub fn tags(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.converters.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_one_converter_per_tag() {
        let registry = ConverterRegistry::with_builtins();
        let tags: Vec<TypeTag> = registry.tags().collect();
        assert!(tags.contains(&TypeTag::Bool));
        for tag in tags {
            assert_eq!(registry.converters[&tag].len(), 1, "{}", tag.name());
            let converter = registry.resolve(tag).expect("registered");
            assert_eq!(converter.ordinal(), BUILTIN_CONVERTER_ORDINAL);
        }
    }

    #[test]
    fn highest_ordinal_wins() {
        let mut registry = ConverterRegistry::with_builtins();
        registry
            .register(TypeTag::Bool, 200, |raw| Ok(TypedValue::Bool(raw == "sure")))
            .expect("register");

        let converter = registry.resolve(TypeTag::Bool).expect("bool converter");
        assert_eq!(converter.ordinal(), 200);
        assert!(matches!(converter.convert("sure"), Ok(TypedValue::Bool(true))));
    }

    #[test]
    fn failure_does_not_fall_through_to_lower_ordinal() {
        let mut registry = ConverterRegistry::with_builtins();
        registry
            .register(TypeTag::I32, 50, |_| Err("always fails".to_owned()))
            .expect("register");

        let converter = registry.resolve(TypeTag::I32).expect("i32 converter");
        assert_eq!(converter.convert("12").expect_err("fails"), "always fails");
    }

    #[test]
    fn equal_ordinal_for_same_tag_is_ambiguous() {
        let mut registry = ConverterRegistry::new();
        registry
            .register(TypeTag::Locale, 101, |_| Err("first".to_owned()))
            .expect("first registration");
        let error = registry
            .register(TypeTag::Locale, 101, |_| Err("second".to_owned()))
            .expect_err("second registration must fail");
        assert!(matches!(error, Error::AmbiguousConverter { ordinal: 101, .. }));
    }

    #[test]
    fn fallback_chain_is_explicit_per_tag() {
        let registry = ConverterRegistry::with_builtins();
        assert_eq!(
            registry.resolve(TypeTag::Text).map(Converter::tag),
            Some(TypeTag::String)
        );
        assert_eq!(
            registry.resolve(TypeTag::Path).map(Converter::tag),
            Some(TypeTag::Path)
        );
        assert!(registry.resolve(TypeTag::Locale).is_none());
        assert!(registry.resolve(TypeTag::Custom("money")).is_none());
    }

    #[test]
    fn typed_values_render_for_diagnostics() {
        assert_eq!(TypedValue::I32(12345).to_string(), "12345");
        assert_eq!(format!("{:?}", TypedValue::Bool(true)), "bool(true)");
        assert_eq!(TypedValue::U16(7).as_f64(), Some(7.0));
        assert_eq!(TypedValue::String("x".to_owned()).as_f64(), None);
    }
}
