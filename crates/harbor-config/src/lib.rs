#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Layered configuration for the Harbor agent.
//!
//! An agent's configuration comes from three kinds of layer: compiled-in
//! defaults, any number of JSON or TOML documents, and the command line.
//! Each layer is decoded into a sparse [`ConfigFragment`] where every field
//! is either absent or set. Fragments are merged in precedence order and the
//! merged fragment is resolved into a dense [`RuntimeConfig`] with derived
//! listener addresses.
//!
//! # Usage
//!
//! ```rust,no_run
//! let args = ["-config-dir", "/etc/harbor.d", "-server", "-bootstrap-expect", "3"];
//! let resolved = harbor_config::load(&args).unwrap();
//! println!("datacenter: {}", resolved.config.datacenter);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Command line flags**
//! 2. **Config documents** (`-config-file`/`-config-dir`), later beats earlier
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! Scalars are last-writer-wins, lists accumulate across layers, maps are
//! replaced as a whole. See [`merge`](mod@merge) for the exact rules.

/// Document decoders (JSON and TOML).
pub mod decode;
/// Configuration error types.
pub mod error;
/// Command line flag registry and parser.
pub mod flags;
/// The sparse configuration fragment.
pub mod fragment;
/// Config document discovery and loading.
pub mod loader;
/// Layered fragment merging.
pub mod merge;
/// Resolution into the runtime configuration.
pub mod resolve;
/// Resolved configuration display.
pub mod show;

// Re-export primary types at the crate root.
pub use decode::{DocumentFormat, parse_document, parse_file};
pub use error::{ConfigError, ConfigResult};
pub use flags::{FlagSet, Flags, parse_flags};
pub use fragment::{ConfigFragment, Ports};
pub use loader::{load, load_layers, read_config_paths};
pub use merge::merge;
pub use resolve::RuntimeConfig;
pub use show::{ResolvedConfig, ShowFormat};
