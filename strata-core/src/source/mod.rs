pub mod dotenv;
pub mod properties;
pub mod yaml;

use std::collections::BTreeMap;

pub const SYSTEM_PROPERTIES_ORDINAL: i32 = 400;
pub const ENVIRONMENT_ORDINAL: i32 = 300;
pub const DEFAULT_ORDINAL: i32 = 100;

pub const SYSTEM_PROPERTIES_SOURCE_NAME: &str = "SysPropConfigSource";
pub const ENVIRONMENT_SOURCE_NAME: &str = "EnvConfigSource";

/// How a source matches a requested key against the names it holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyStyle {
    #[default]
    Exact,
    /// `demo.mode.enabled` also matches `demo_mode_enabled` and `DEMO_MODE_ENABLED`.
    Environment,
}

/// A named, ordinal-prioritized set of raw properties. Immutable once built.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    name: String,
    ordinal: i32,
    properties: BTreeMap<String, String>,
    key_style: KeyStyle,
}

impl ConfigSource {
    pub fn new(name: impl Into<String>, ordinal: i32, properties: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            ordinal,
            properties,
            key_style: KeyStyle::Exact,
        }
    }

    pub fn from_pairs<I, K, V>(name: impl Into<String>, ordinal: i32, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let properties = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::new(name, ordinal, properties)
    }

    pub fn with_key_style(mut self, key_style: KeyStyle) -> Self {
        self.key_style = key_style;
        self
    }

    /// Environment variables. `snapshot` replaces the live process environment when given.
    pub fn environment(snapshot: Option<BTreeMap<String, String>>) -> Self {
        let properties = snapshot.unwrap_or_else(|| {
            std::env::vars_os()
                .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
                .collect()
        });
        Self::new(ENVIRONMENT_SOURCE_NAME, ENVIRONMENT_ORDINAL, properties)
            .with_key_style(KeyStyle::Environment)
    }

    pub fn system_properties(properties: BTreeMap<String, String>) -> Self {
        Self::new(
            SYSTEM_PROPERTIES_SOURCE_NAME,
            SYSTEM_PROPERTIES_ORDINAL,
            properties,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordinal(&self) -> i32 {
        self.ordinal
    }

    pub fn key_style(&self) -> KeyStyle {
        self.key_style
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.properties.get(key) {
            return Some(value);
        }

        match self.key_style {
            KeyStyle::Exact => None,
            KeyStyle::Environment => {
                let sanitized = environment_name(key);
                self.properties
                    .get(&sanitized)
                    .or_else(|| self.properties.get(&sanitized.to_ascii_uppercase()))
                    .map(String::as_str)
            }
        }
    }
}

/// Replaces every character that is not ASCII alphanumeric with `_`.
pub fn environment_name(key: &str) -> String {
    key.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
