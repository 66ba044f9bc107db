//! Command line flags.
//!
//! The agent's flag surface is Go-style: `-name value`, `-name=value` and
//! bare booleans, with `--name` accepted as a synonym. Every flag is bound
//! to one location inside [`Flags`] through a typed [`Binding`]. Parsing
//! produces a [`ConfigFragment`] that is merged as the highest-precedence
//! layer, plus the list of extra documents named by `-config-file` and
//! `-config-dir`.

mod parser;
mod registry;

pub use registry::{Binding, FlagSet, FlagSpec};

use tracing::warn;

use crate::error::ConfigResult;
use crate::fragment::ConfigFragment;

/// The result of parsing the agent command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    /// Configuration set on the command line.
    pub file: ConfigFragment,
    /// Files and directories to read configuration from, in command line
    /// order. `-config-file` and `-config-dir` both append here.
    pub config_files: Vec<String>,

    /// `-dc`, replaced by `-datacenter`.
    pub deprecated_datacenter: Option<String>,
    /// `-atlas`, ignored.
    pub deprecated_atlas_infrastructure: Option<String>,
    /// `-atlas-join`, ignored.
    pub deprecated_atlas_join: Option<bool>,
    /// `-atlas-token`, ignored.
    pub deprecated_atlas_token: Option<String>,
    /// `-atlas-endpoint`, ignored.
    pub deprecated_atlas_endpoint: Option<String>,
}

impl Flags {
    /// Fold deprecated aliases into their replacements.
    fn apply_deprecations(&mut self) {
        if let Some(dc) = &self.deprecated_datacenter {
            if self.file.datacenter.is_none() {
                self.file.datacenter = Some(dc.clone());
            } else {
                warn!("both -dc and -datacenter given; using -datacenter");
            }
        }

        if self.deprecated_atlas_infrastructure.is_some()
            || self.deprecated_atlas_join.is_some()
            || self.deprecated_atlas_token.is_some()
            || self.deprecated_atlas_endpoint.is_some()
        {
            warn!("Atlas integration has been removed; -atlas flags are ignored");
        }
    }
}

/// Parse the agent command line with the standard flag set.
///
/// # Errors
///
/// Returns a [`ConfigError`](crate::ConfigError) for unknown flags,
/// malformed values, a missing value, or a leftover positional argument.
/// No partial result is returned.
pub fn parse_flags<S: AsRef<str>>(args: &[S]) -> ConfigResult<Flags> {
    FlagSet::agent().parse(args)
}
