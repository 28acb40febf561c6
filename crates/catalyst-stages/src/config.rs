//! Pipeline configuration loaded from YAML.
//!
//! Every field has a default, so a partial (or empty) file is valid:
//!
//! ```yaml
//! context_path: context/sample_context.json
//! search_space_limit: 20
//! results_dir: out
//! ```

use catalyst_core::CatalystError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// JSON document handed to the prompt as `context`
    pub context_path: PathBuf,
    /// JSON array of candidate compositions
    pub search_space_path: PathBuf,
    /// Candidates kept from the head of the search space
    pub search_space_limit: usize,
    pub system_template: PathBuf,
    pub user_template: PathBuf,
    /// Recorded model reply, replayed by the model collaborator
    pub reply_path: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_path: PathBuf::from("context/sample_context.json"),
            search_space_path: PathBuf::from("data/search_space.json"),
            search_space_limit: 50,
            system_template: PathBuf::from("prompts/system.hbs"),
            user_template: PathBuf::from("prompts/user.hbs"),
            reply_path: PathBuf::from("replies/latest_reply.json"),
            results_dir: PathBuf::from("results"),
        }
    }
}

impl PipelineConfig {
    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalystError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalystError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CatalystError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| CatalystError::ConfigError(e.to_string()))
    }

    /// Resolve relative paths against `base`, usually the config file's directory
    pub fn relative_to(mut self, base: &Path) -> Self {
        for path in [
            &mut self.context_path,
            &mut self.search_space_path,
            &mut self.system_template,
            &mut self.user_template,
            &mut self.reply_path,
            &mut self.results_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}
