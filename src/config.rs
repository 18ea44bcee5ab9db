use std::fs;
use std::io;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use crate::error::{ConfigError, Result, SceneError};
use crate::hierarchy::DEFAULT_INDENT;

pub const DEFAULT_CONFIG_FILE: &str = ".scenetree.toml";

/// Settings read from `.scenetree.toml`. Every key is optional.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Extensions of files dumped as scenes (without the dot)
    pub scene_extensions: Vec<String>,
    /// Extensions of script assets whose `.meta` files feed the unused report
    pub script_extensions: Vec<String>,
    /// Repeated once per depth level in hierarchy dumps
    pub indent: String,
    /// Glob patterns, relative to the project root, to skip
    pub exclude: Vec<String>,
    /// Honour .gitignore/.ignore files and skip hidden entries
    pub respect_ignore_files: bool,
    /// Abort the whole run on the first malformed scene or meta file
    pub fail_fast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scene_extensions: vec!["unity".to_string()],
            script_extensions: vec!["cs".to_string()],
            indent: DEFAULT_INDENT.to_string(),
            exclude: Vec::new(),
            respect_ignore_files: false,
            fail_fast: false,
        }
    }
}

/// Compiled `exclude` patterns, matched against project-relative paths.
#[derive(Debug, Clone)]
pub struct Excludes {
    files: GlobSet,
    dirs: GlobSet,
}

impl Excludes {
    pub fn file(&self, relative: &Path) -> bool {
        self.files.is_match(relative)
    }

    /// An excluded directory is not descended into.
    pub fn dir(&self, relative: &Path) -> bool {
        self.dirs.is_match(relative)
    }
}

impl Config {
    /// Load `path`. A missing file yields the defaults when `required` is false.
    pub fn load(path: &Path, required: bool) -> Result<Config> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(SceneError::Config {
                    path: path.to_path_buf(),
                    source: e.into(),
                })
            }
        };
        Config::parse(&text).map_err(|source| SceneError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Config, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.scene_extensions.is_empty() {
            return Err(ConfigError::NoSceneExtensions);
        }
        for ext in self.scene_extensions.iter().chain(self.script_extensions.iter()) {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(ConfigError::BadExtension(ext.clone()));
            }
        }
        self.excludes()?;
        Ok(())
    }

    pub fn excludes(&self) -> std::result::Result<Excludes, ConfigError> {
        let mut files = GlobSetBuilder::new();
        let mut dirs = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern)?;
            files.add(glob.clone());
            dirs.add(glob);
            // `Library/**` also names the directory itself
            if let Some(prefix) = pattern.strip_suffix("/**").filter(|p| !p.is_empty()) {
                dirs.add(Glob::new(prefix)?);
            }
        }
        Ok(Excludes {
            files: files.build()?,
            dirs: dirs.build()?,
        })
    }

    pub fn is_scene(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.scene_extensions.iter().any(|s| s.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// `Foo.cs.meta` counts when `cs` is a script extension.
    pub fn is_script_meta(&self, path: &Path) -> bool {
        if path.extension().and_then(|e| e.to_str()) != Some("meta") {
            return false;
        }
        path.file_stem()
            .map(Path::new)
            .and_then(|stem| stem.extension())
            .and_then(|e| e.to_str())
            .map(|ext| self.script_extensions.iter().any(|s| s.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}
