use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::builder::ConfigBuilder;
use crate::config::Config;
use crate::error::Result;
use crate::provider::{
    DotEnvSourceProvider, FileSourceProvider, SearchPath, SourceProvider,
    APPLICATION_PROPERTIES_ORDINAL, APPLICATION_TEST_YAML_ORDINAL, APPLICATION_YAML_ORDINAL,
    CONFIG_DIR_YAML_ORDINAL, META_INF_PROPERTIES_ORDINAL, META_INF_YAML_ORDINAL,
};

/// Everything the standard registration list reads from the outside world.
#[derive(Debug, Clone, Default)]
pub struct BootstrapContext {
    roots: Vec<PathBuf>,
    working_dir: PathBuf,
    system_properties: BTreeMap<String, String>,
    environment: Option<BTreeMap<String, String>>,
    profiles: Option<Vec<String>>,
}

impl BootstrapContext {
    /// Searches `working_dir` only and reads the live process environment.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        Self {
            roots: vec![working_dir.clone()],
            working_dir,
            ..Self::default()
        }
    }

    pub fn from_process() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// Replaces the search roots. The working directory is unchanged.
    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    pub fn with_system_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.system_properties.insert(key.into(), value.into());
        self
    }

    pub fn with_system_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.system_properties.extend(properties);
        self
    }

    /// Uses `environment` instead of the process environment.
    pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_profiles(mut self, profiles: Vec<String>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn search_path(&self) -> SearchPath {
        SearchPath::new(self.roots.clone(), self.working_dir.clone())
    }
}

fn yaml_provider() -> Box<dyn SourceProvider> {
    Box::new(
        FileSourceProvider::yaml()
            .with_group(
                &["application-test.yaml", "application-test.yml"],
                APPLICATION_TEST_YAML_ORDINAL,
            )
            .with_group(
                &["config/application.yaml", "config/application.yml"],
                CONFIG_DIR_YAML_ORDINAL,
            )
            .with_group(
                &["application.yaml", "application.yml"],
                APPLICATION_YAML_ORDINAL,
            )
            .with_group(
                &[
                    "META-INF/microprofile-config.yaml",
                    "META-INF/microprofile-config.yml",
                ],
                META_INF_YAML_ORDINAL,
            ),
    )
}

fn properties_provider() -> Box<dyn SourceProvider> {
    Box::new(
        FileSourceProvider::properties()
            .with_group(&["application.properties"], APPLICATION_PROPERTIES_ORDINAL)
            .with_group(
                &["META-INF/microprofile-config.properties"],
                META_INF_PROPERTIES_ORDINAL,
            ),
    )
}

fn dotenv_provider() -> Box<dyn SourceProvider> {
    Box::new(DotEnvSourceProvider::default())
}

/// File providers registered by [`standard_builder`], in registration order.
pub const STANDARD_PROVIDERS: &[fn() -> Box<dyn SourceProvider>] =
    &[dotenv_provider, yaml_provider, properties_provider];

/// System properties, environment, `.env`, YAML and properties files, extended converters,
/// profile resolution and the compiled-in validator. Unknown keys are permitted.
pub fn standard_builder(context: &BootstrapContext) -> ConfigBuilder {
    let mut builder = ConfigBuilder::new()
        .with_search_path(context.search_path())
        .with_default_sources(
            context.environment.clone(),
            context.system_properties.clone(),
        );
    for provider in STANDARD_PROVIDERS {
        builder = builder.with_boxed_provider(provider());
    }

    builder = builder
        .with_default_converters()
        .with_default_interceptors()
        .with_discovered_validator()
        .with_validate_unknown(false);
    if let Some(profiles) = &context.profiles {
        builder = builder.with_profiles(profiles.iter().cloned());
    }
    builder
}

pub fn build_standard(context: &BootstrapContext) -> Result<Config> {
    standard_builder(context).build()
}
