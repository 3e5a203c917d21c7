use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Config;

/// A named, enumerable key/value layer in a host's environment.
pub trait PropertySource: Send + Sync {
    fn name(&self) -> &str;

    fn get_property(&self, key: &str) -> Option<String>;

    fn contains_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }

    fn property_names(&self) -> Vec<String>;
}

/// A plain in-memory layer, for the host's own settings.
#[derive(Debug, Clone, Default)]
pub struct MapPropertySource {
    name: String,
    properties: BTreeMap<String, String>,
}

impl MapPropertySource {
    pub fn new(name: impl Into<String>, properties: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }
}

/// The host's layered environment. Earlier sources take precedence.
#[derive(Default)]
pub struct Environment {
    sources: Vec<Arc<dyn PropertySource>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_first(&mut self, source: Arc<dyn PropertySource>) {
        self.sources.insert(0, source);
    }

    pub fn add_last(&mut self, source: Arc<dyn PropertySource>) {
        self.sources.push(source);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.iter().any(|source| source.name() == name)
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    pub fn get_property(&self, key: &str) -> Option<String> {
        self.sources
            .iter()
            .find_map(|source| source.get_property(key))
    }

    pub fn property_names(&self) -> BTreeSet<String> {
        self.sources
            .iter()
            .flat_map(|source| source.property_names())
            .collect()
    }
}

/// Exposes a [`Config`] as a host property source. Values are expanded but not converted.
#[derive(Debug, Clone)]
pub struct ConfigPropertySource {
    config: Arc<Config>,
}

impl ConfigPropertySource {
    pub const NAME: &'static str = "StrataConfig";

    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl PropertySource for ConfigPropertySource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn get_property(&self, key: &str) -> Option<String> {
        match self.config.get_config_value(key) {
            Ok(value) => value.map(|value| value.value().to_owned()),
            Err(err) => {
                warn!(key, error = %err, "cannot resolve property for host environment");
                None
            }
        }
    }

    fn property_names(&self) -> Vec<String> {
        self.config.property_names().iter().cloned().collect()
    }
}

/// Appends `config` to `environment` at the lowest precedence. Returns `false` if a source
/// with the same name is already registered.
pub fn register(environment: &mut Environment, config: Arc<Config>) -> bool {
    if environment.contains(ConfigPropertySource::NAME) {
        debug!(
            source = ConfigPropertySource::NAME,
            "property source already registered"
        );
        return false;
    }

    environment.add_last(Arc::new(ConfigPropertySource::new(config)));
    debug!(
        source = ConfigPropertySource::NAME,
        "registered property source"
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConfigBuilder;
    use crate::source::ConfigSource;

    fn config() -> Arc<Config> {
        let config = ConfigBuilder::new()
            .with_source(ConfigSource::from_pairs(
                "s",
                100,
                [
                    ("app.name", "strata"),
                    ("app.title", "${app.name} demo"),
                    ("shared", "from-config"),
                    ("broken", "${nowhere}"),
                ],
            ))
            .build()
            .expect("build");
        Arc::new(config)
    }

    fn environment() -> Environment {
        let mut environment = Environment::new();
        environment.add_first(Arc::new(MapPropertySource::new(
            "host",
            BTreeMap::from([("shared".to_owned(), "from-host".to_owned())]),
        )));
        environment
    }

    #[test]
    fn registration_is_idempotent_by_name() {
        let mut environment = environment();
        assert!(register(&mut environment, config()));
        assert!(!register(&mut environment, config()));
        assert_eq!(environment.source_names(), vec!["host", "StrataConfig"]);
    }

    #[test]
    fn config_layer_supplements_but_never_overrides_host() {
        let mut environment = environment();
        register(&mut environment, config());

        assert_eq!(environment.get_property("shared").as_deref(), Some("from-host"));
        assert_eq!(
            environment.get_property("app.title").as_deref(),
            Some("strata demo")
        );
        assert!(environment.property_names().contains("app.name"));
    }

    #[test]
    fn lookup_failures_read_as_absent() {
        let source = ConfigPropertySource::new(config());
        assert_eq!(source.get_property("broken"), None);
        assert!(!source.contains_property("missing"));
        assert!(source.contains_property("app.name"));
    }
}
