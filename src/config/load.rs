//! Configuration loading from files and the environment.

use std::path::Path;

use config::{Environment, File, FileFormat};

use super::{CONFIG_FILE, ConfigError, ProjectConfig};

impl ProjectConfig {
    /// Load the config for a project directory.
    ///
    /// `satisficer.yaml` is optional. `SATISFICER_*` environment variables
    /// override it, with `__` separating nested keys (`SATISFICER_DEV__PORT`).
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(project_dir, Environment::with_prefix("SATISFICER"))
    }

    pub(crate) fn load_with_env(
        project_dir: &Path,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let config_path = project_dir.join(CONFIG_FILE);
        let path_str = config_path
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(config_path.clone()))?;

        let config: ProjectConfig = config::Config::builder()
            .add_source(File::new(path_str, FileFormat::Yaml).required(false))
            .add_source(
                env.prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config.resolve(project_dir))
    }

    /// Resolve relative content and layout paths against the project directory.
    fn resolve(mut self, project_dir: &Path) -> Self {
        if self.content_dir.is_relative() {
            self.content_dir = project_dir.join(&self.content_dir);
        }
        if self.layout_dir.is_relative() {
            self.layout_dir = project_dir.join(&self.layout_dir);
        }
        self
    }
}
