use crate::error::Result;
use crate::provider::file::{load_file, FileFormat};
use crate::provider::{SearchPath, SourceProvider, DOTENV_ORDINAL};
use crate::source::ConfigSource;

/// Loads `.env` from the working directory only.
#[derive(Debug, Clone)]
pub struct DotEnvSourceProvider {
    file_name: String,
    ordinal: i32,
}

impl DotEnvSourceProvider {
    pub fn new(file_name: impl Into<String>, ordinal: i32) -> Self {
        Self {
            file_name: file_name.into(),
            ordinal,
        }
    }
}

impl Default for DotEnvSourceProvider {
    fn default() -> Self {
        Self::new(".env", DOTENV_ORDINAL)
    }
}

impl SourceProvider for DotEnvSourceProvider {
    fn name(&self) -> &str {
        "DotEnvConfigSourceProvider"
    }

    fn discover(&self, search_path: &SearchPath) -> Result<Vec<ConfigSource>> {
        let path = search_path.working_dir().join(&self.file_name);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        Ok(vec![load_file(&path, FileFormat::DotEnv, self.ordinal)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::KeyStyle;

    #[test]
    fn loads_env_file_from_working_directory_with_env_key_style() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(".env"), "DEMO_MODE_ENABLED=7\n").expect("write");

        let sources = DotEnvSourceProvider::default()
            .discover(&SearchPath::single(dir.path()))
            .expect("discover");

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].ordinal(), DOTENV_ORDINAL);
        assert_eq!(sources[0].key_style(), KeyStyle::Environment);
        assert_eq!(sources[0].get("demo.mode.enabled"), Some("7"));
    }

    #[test]
    fn absent_env_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sources = DotEnvSourceProvider::default()
            .discover(&SearchPath::single(dir.path()))
            .expect("discover");
        assert!(sources.is_empty());
    }
}
