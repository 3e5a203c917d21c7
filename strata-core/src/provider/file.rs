use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::provider::{CandidateGroup, SearchPath, SourceProvider};
use crate::source::{self, ConfigSource, KeyStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// YAML, and JSON saved under a YAML name.
    Yaml,
    Properties,
    DotEnv,
}

impl FileFormat {
    pub fn source_label(self) -> &'static str {
        match self {
            Self::Yaml => "YamlConfigSource",
            Self::Properties => "PropertiesConfigSource",
            Self::DotEnv => "DotEnvConfigSource",
        }
    }

    pub fn key_style(self) -> KeyStyle {
        match self {
            Self::DotEnv => KeyStyle::Environment,
            Self::Yaml | Self::Properties => KeyStyle::Exact,
        }
    }

    pub fn parse(self, source_name: &str, content: &str) -> Result<BTreeMap<String, String>> {
        match self {
            Self::Yaml => source::yaml::parse(source_name, content),
            Self::Properties => source::properties::parse(source_name, content),
            Self::DotEnv => source::dotenv::parse(source_name, content),
        }
    }
}

/// Reads a file into a source of the given format. Any read or parse failure is fatal.
pub fn load_file(path: &Path, format: FileFormat, ordinal: i32) -> Result<ConfigSource> {
    let source_name = format!("{}[source={}]", format.source_label(), path.display());
    let content = std::fs::read_to_string(path).map_err(|err| Error::SourceLoadError {
        source_name: source_name.clone(),
        reason: format!("failed to read file: {err}"),
    })?;
    let properties = format.parse(&source_name, &content)?;

    debug!(
        source = %source_name,
        ordinal,
        properties = properties.len(),
        "loaded configuration source"
    );
    Ok(ConfigSource::new(source_name, ordinal, properties).with_key_style(format.key_style()))
}

/// Scans every search root for each candidate group and loads the first match per group.
#[derive(Debug, Clone)]
pub struct FileSourceProvider {
    name: String,
    format: FileFormat,
    groups: Vec<CandidateGroup>,
}

impl FileSourceProvider {
    pub fn new(name: impl Into<String>, format: FileFormat) -> Self {
        Self {
            name: name.into(),
            format,
            groups: Vec::new(),
        }
    }

    pub fn yaml() -> Self {
        Self::new("YamlConfigSourceProvider", FileFormat::Yaml)
    }

    pub fn properties() -> Self {
        Self::new("PropertiesConfigSourceProvider", FileFormat::Properties)
    }

    pub fn with_group(mut self, candidates: &[&str], ordinal: i32) -> Self {
        self.groups.push(CandidateGroup::new(candidates, ordinal));
        self
    }

    pub fn groups(&self) -> &[CandidateGroup] {
        &self.groups
    }
}

impl SourceProvider for FileSourceProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(&self, search_path: &SearchPath) -> Result<Vec<ConfigSource>> {
        let mut sources = Vec::new();
        for root in search_path.roots() {
            if !root.is_dir() {
                continue;
            }
            for group in &self.groups {
                if let Some(path) = group.first_match(root) {
                    sources.push(load_file(&path, self.format, group.ordinal())?);
                }
            }
        }
        Ok(sources)
    }
}
