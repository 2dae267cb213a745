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

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
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
    /// Returns an error if any routing setting is out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_routing_limits()?;
        self.validate_pricing()?;
        self.validate_rules()?;
        Ok(())
    }

    fn validate_routing_limits(&self) -> anyhow::Result<()> {
        if self.routing.latency_samples == 0 {
            anyhow::bail!("routing.latency_samples must be greater than 0");
        }

        if self.routing.stream_buffer == 0 {
            anyhow::bail!("routing.stream_buffer must be greater than 0");
        }

        if self.routing.byok.providers.iter().any(String::is_empty) {
            anyhow::bail!("routing.byok.providers must not contain empty names");
        }

        Ok(())
    }

    fn validate_pricing(&self) -> anyhow::Result<()> {
        for entry in &self.routing.pricing {
            for (field, value) in [
                ("input_per_mtok", entry.input_per_mtok),
                ("output_per_mtok", entry.output_per_mtok),
            ] {
                if !value.is_finite() || value < 0.0 {
                    anyhow::bail!(
                        "pricing for '{}/{}' has invalid {field}: {value}",
                        entry.provider,
                        entry.model
                    );
                }
            }
        }

        Ok(())
    }

    fn validate_rules(&self) -> anyhow::Result<()> {
        for (index, rule) in self.routing.rules.iter().enumerate() {
            if rule.provider.trim().is_empty() {
                anyhow::bail!("routing rule #{index} must name a provider");
            }
        }

        Ok(())
    }
}
