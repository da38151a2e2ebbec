use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Load the file if given, otherwise use the built-in defaults
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`] when a path is given
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                tracing::debug!("no configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a required value is empty or out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_backend()?;
        self.validate_translation()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_backend(&self) -> anyhow::Result<()> {
        if !matches!(self.backend.base_url.scheme(), "http" | "https") {
            anyhow::bail!("backend.base_url must use http or https");
        }

        if self.backend.request_timeout.is_zero() {
            anyhow::bail!("backend.request_timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_translation(&self) -> anyhow::Result<()> {
        // An empty fallback would let an empty turn reach the backend
        if self.translation.fallback_content.trim().is_empty() {
            anyhow::bail!("translation.fallback_content must not be empty");
        }

        Ok(())
    }

    fn validate_server(&self) -> anyhow::Result<()> {
        let health = &self.server.health;
        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }

        Ok(())
    }
}
