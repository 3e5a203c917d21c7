use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::convert::{ConfigType, Converter, ConverterRegistry};
use crate::error::{Error, Result};
use crate::interceptor::profile::strip_active_profile;
use crate::interceptor::InterceptorChain;
use crate::source::ConfigSource;
use crate::validate::{ValidationOutcome, Validator};

/// Comma-separated list of active profiles.
pub const PROFILE_PROPERTY: &str = "strata.config.profile";

/// A resolved property together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigValue {
    name: String,
    value: String,
    raw_value: String,
    source_name: String,
    source_ordinal: i32,
}

impl ConfigValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>, source: &ConfigSource) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            raw_value: value.clone(),
            value,
            source_name: source.name().to_owned(),
            source_ordinal: source.ordinal(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value after interception.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The value exactly as the source holds it.
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn source_ordinal(&self) -> i32 {
        self.source_ordinal
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// First source, in precedence order, that defines `name`. An empty value still shadows
/// lower sources.
pub(crate) fn lookup_raw(sources: &[ConfigSource], name: &str) -> Option<ConfigValue> {
    sources
        .iter()
        .find_map(|source| source.get(name).map(|value| ConfigValue::new(name, value, source)))
}

/// Splits on commas not preceded by a backslash. `\,` yields a literal comma.
pub fn split_values(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&',') => {
                current.push(',');
                chars.next();
            }
            ',' => items.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    items.push(current);
    items.retain(|item| !item.is_empty());
    items
}

/// The resolver: every source of one generation in precedence order, plus the converters,
/// interceptors and validator that lookups run through. Immutable once built.
pub struct Config {
    sources: Vec<ConfigSource>,
    property_names: BTreeSet<String>,
    converters: ConverterRegistry,
    interceptors: InterceptorChain,
    validator: Option<Arc<dyn Validator>>,
    profiles: Vec<String>,
}

impl Config {
    /// `sources` must already be sorted by descending ordinal.
    pub(crate) fn assemble(
        sources: Vec<ConfigSource>,
        converters: ConverterRegistry,
        interceptors: InterceptorChain,
        validator: Option<Arc<dyn Validator>>,
        profiles: Vec<String>,
    ) -> Self {
        let mut property_names = BTreeSet::new();
        for name in sources.iter().flat_map(ConfigSource::property_names) {
            if let Some(unprefixed) = strip_active_profile(name, &profiles) {
                property_names.insert(unprefixed.to_owned());
            }
            property_names.insert(name.to_owned());
        }

        Self {
            sources,
            property_names,
            converters,
            interceptors,
            validator,
            profiles,
        }
    }

    pub fn get_value<T: ConfigType>(&self, key: &str) -> Result<T> {
        self.get_optional_value(key)?
            .ok_or_else(|| Error::MissingKey {
                key: key.to_owned(),
            })
    }

    /// Like [`Config::get_value`], but an absent or empty value is `Ok(None)`.
    pub fn get_optional_value<T: ConfigType>(&self, key: &str) -> Result<Option<T>> {
        check_key(key)?;
        let converter = self.converter_for::<T>()?;
        match self.get_config_value(key)? {
            Some(value) => self.convert_with(converter, key, value.value()).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_values<T: ConfigType>(&self, key: &str) -> Result<Vec<T>> {
        self.get_optional_values(key)?
            .ok_or_else(|| Error::MissingKey {
                key: key.to_owned(),
            })
    }

    pub fn get_optional_values<T: ConfigType>(&self, key: &str) -> Result<Option<Vec<T>>> {
        check_key(key)?;
        let converter = self.converter_for::<T>()?;
        let Some(value) = self.get_config_value(key)? else {
            return Ok(None);
        };

        let items = split_values(value.value());
        if items.is_empty() {
            return Ok(None);
        }
        items
            .iter()
            .map(|item| self.convert_with(converter, key, item))
            .collect::<Result<Vec<T>>>()
            .map(Some)
    }

    /// The effective, intercepted value and its origin. Empty values count as absent.
    pub fn get_config_value(&self, key: &str) -> Result<Option<ConfigValue>> {
        check_key(key)?;
        Ok(self
            .interceptors
            .resolve(&self.sources, key)?
            .filter(|value| !value.value().is_empty()))
    }

    /// The value from the highest-ordinal source that defines `key`, before interception.
    pub fn get_raw_value(&self, key: &str) -> Option<String> {
        lookup_raw(&self.sources, key)
            .map(|value| value.raw_value().to_owned())
            .filter(|value| !value.is_empty())
    }

    /// Converts a standalone string with the converter registered for `T`.
    pub fn convert<T: ConfigType>(&self, raw: &str) -> Result<T> {
        let converter = self.converter_for::<T>()?;
        self.convert_with(converter, "<inline>", raw)
    }

    pub fn property_names(&self) -> &BTreeSet<String> {
        &self.property_names
    }

    /// Sources in precedence order, highest ordinal first.
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    pub fn interceptor_names(&self) -> Vec<&str> {
        self.interceptors.names()
    }

    pub fn validator(&self) -> Option<&Arc<dyn Validator>> {
        self.validator.as_ref()
    }

    fn converter_for<T: ConfigType>(&self) -> Result<&Converter> {
        self.converters
            .resolve(T::TAG)
            .ok_or_else(|| Error::NoConverterFound {
                type_name: T::TAG.name().to_owned(),
            })
    }

    fn convert_with<T: ConfigType>(&self, converter: &Converter, key: &str, raw: &str) -> Result<T> {
        let typed = converter
            .convert(raw)
            .map_err(|reason| conversion_error::<T>(key, raw, reason))?;

        if let Some(validator) = &self.validator {
            if let ValidationOutcome::Fail(failure) = validator.validate(key, &typed) {
                return Err(Error::ValidationError(failure));
            }
        }

        let produced = typed.variant_name();
        T::from_value(typed).ok_or_else(|| {
            conversion_error::<T>(key, raw, format!("converter produced a {produced} value"))
        })
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::Config("configuration key must not be empty".to_owned()));
    }
    Ok(())
}

fn conversion_error<T: ConfigType>(key: &str, raw: &str, reason: String) -> Error {
    Error::ConversionError {
        key: key.to_owned(),
        raw_value: raw.to_owned(),
        type_name: T::TAG.name().to_owned(),
        reason,
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<(&str, i32)> = self
            .sources
            .iter()
            .map(|source| (source.name(), source.ordinal()))
            .collect();
        f.debug_struct("Config")
            .field("sources", &sources)
            .field("properties", &self.property_names.len())
            .field("interceptors", &self.interceptors)
            .field("profiles", &self.profiles)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}
