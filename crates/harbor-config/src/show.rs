//! Display of the resolved runtime configuration.

use std::fmt::{self, Write as _};

use crate::resolve::RuntimeConfig;

/// A resolved configuration together with the documents it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// The final runtime configuration.
    pub config: RuntimeConfig,
    /// Config document paths that were loaded (in precedence order).
    pub loaded_files: Vec<String>,
}

/// Output format for [`ResolvedConfig::show`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShowFormat {
    /// JSON (for programmatic consumption).
    #[default]
    Json,
    /// TOML with a header listing the loaded files.
    Toml,
}

impl ResolvedConfig {
    /// Render the runtime configuration. Secrets are never included.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn show(&self, format: ShowFormat) -> Result<String, fmt::Error> {
        match format {
            ShowFormat::Json => serde_json::to_string_pretty(&self.config).map_err(|_| fmt::Error),
            ShowFormat::Toml => self.show_toml(),
        }
    }

    fn show_toml(&self) -> Result<String, fmt::Error> {
        let body = toml::to_string_pretty(&self.config).map_err(|_| fmt::Error)?;

        let mut output = String::from("# Resolved Harbor agent configuration\n");
        if !self.loaded_files.is_empty() {
            output.push_str("#\n# Loaded files (in precedence order):\n");
            for (i, path) in self.loaded_files.iter().enumerate() {
                writeln!(output, "#   {}. {path}", i.saturating_add(1))?;
            }
        }
        output.push('\n');
        output.push_str(&body);
        Ok(output)
    }
}
