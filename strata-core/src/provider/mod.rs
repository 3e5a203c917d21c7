pub mod dotenv;
pub mod file;

use std::path::{Path, PathBuf};

pub use dotenv::DotEnvSourceProvider;
pub use file::{FileFormat, FileSourceProvider};

use crate::error::Result;
use crate::source::ConfigSource;

pub const APPLICATION_TEST_YAML_ORDINAL: i32 = 316;
pub const DOTENV_ORDINAL: i32 = 295;
pub const CONFIG_DIR_YAML_ORDINAL: i32 = 266;
pub const APPLICATION_YAML_ORDINAL: i32 = 256;
pub const APPLICATION_PROPERTIES_ORDINAL: i32 = 250;
pub const META_INF_YAML_ORDINAL: i32 = 110;
pub const META_INF_PROPERTIES_ORDINAL: i32 = 100;

/// Discovers zero or more sources. Runs once, at build time.
pub trait SourceProvider: Send + Sync {
    fn name(&self) -> &str;

    fn discover(&self, search_path: &SearchPath) -> Result<Vec<ConfigSource>>;
}

/// Directories searched for configuration files, in order, plus the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
    working_dir: PathBuf,
}

impl SearchPath {
    pub fn new(roots: Vec<PathBuf>, working_dir: PathBuf) -> Self {
        Self { roots, working_dir }
    }

    /// One root that doubles as the working directory.
    pub fn single(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            roots: vec![root.clone()],
            working_dir: root,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

impl Default for SearchPath {
    fn default() -> Self {
        Self::single(".")
    }
}

/// Alternative file names for one logical slot; the first existing one is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateGroup {
    candidates: Vec<String>,
    ordinal: i32,
}

impl CandidateGroup {
    pub fn new(candidates: &[&str], ordinal: i32) -> Self {
        Self {
            candidates: candidates.iter().map(|name| (*name).to_owned()).collect(),
            ordinal,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn ordinal(&self) -> i32 {
        self.ordinal
    }

    pub fn first_match(&self, root: &Path) -> Option<PathBuf> {
        self.candidates
            .iter()
            .map(|candidate| root.join(candidate))
            .find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::CandidateGroup;

    #[test]
    fn first_match_prefers_earlier_candidates() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("application.yml"), "a: 1").expect("write");
        let group = CandidateGroup::new(&["application.yaml", "application.yml"], 256);

        assert_eq!(
            group.first_match(dir.path()),
            Some(dir.path().join("application.yml"))
        );

        std::fs::write(dir.path().join("application.yaml"), "a: 2").expect("write");
        assert_eq!(
            group.first_match(dir.path()),
            Some(dir.path().join("application.yaml"))
        );
    }

    #[test]
    fn directories_do_not_count_as_matches() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("application.yaml")).expect("mkdir");
        let group = CandidateGroup::new(&["application.yaml"], 256);
        assert_eq!(group.first_match(dir.path()), None);
    }
}
