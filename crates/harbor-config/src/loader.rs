//! Config document discovery and layered loading.
//!
//! Implements the `load()` pipeline:
//! 1. Parse the command line → flag fragment + config paths
//! 2. Parse embedded `defaults.toml` → base
//! 3. Decode every config path in argument order (directories expand to
//!    their `.json`/`.toml` files, sorted by name)
//! 4. Merge defaults, files, then flags
//! 5. Resolve into a `RuntimeConfig`
//! 6. Return `ResolvedConfig`

use std::path::Path;

use tracing::{debug, info};

use crate::decode::{DocumentFormat, parse_file_at};
use crate::error::{ConfigError, ConfigResult};
use crate::flags::parse_flags;
use crate::fragment::ConfigFragment;
use crate::merge::merge;
use crate::resolve::RuntimeConfig;
use crate::show::ResolvedConfig;

/// Maximum allowed config document size (1 MiB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Run the whole pipeline over the agent command line (without the
/// program name).
///
/// # Errors
///
/// Returns a [`ConfigError`] for a bad command line, an unreadable or
/// malformed document, or a configuration that fails resolution.
pub fn load<S: AsRef<str>>(args: &[S]) -> ConfigResult<ResolvedConfig> {
    let flags = parse_flags(args)?;
    let defaults = ConfigFragment::builtin_defaults()?;

    let documents = read_documents(&flags.config_files)?;
    let loaded_files = documents.iter().map(|(path, _)| path.clone()).collect();
    let files = documents.into_iter().map(|(_, fragment)| fragment).collect();

    let config = load_layers(defaults, files, flags.file)?;
    Ok(ResolvedConfig {
        config,
        loaded_files,
    })
}

/// Merge already decoded layers, lowest precedence first, and resolve the
/// result.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the merged configuration fails resolution.
pub fn load_layers(
    defaults: ConfigFragment,
    files: Vec<ConfigFragment>,
    flags: ConfigFragment,
) -> ConfigResult<RuntimeConfig> {
    let mut layers = Vec::with_capacity(files.len().saturating_add(2));
    layers.push(defaults);
    layers.extend(files);
    layers.push(flags);

    RuntimeConfig::from_fragment(merge(&layers))
}

/// Decode every file named by `paths`, in order. A directory contributes
/// its `.json` and `.toml` files sorted by file name.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a path cannot be read or a document fails
/// to decode.
pub fn read_config_paths(paths: &[String]) -> ConfigResult<Vec<ConfigFragment>> {
    Ok(read_documents(paths)?
        .into_iter()
        .map(|(_, fragment)| fragment)
        .collect())
}

/// Decoded documents paired with the path they came from.
fn read_documents(paths: &[String]) -> ConfigResult<Vec<(String, ConfigFragment)>> {
    let mut documents = Vec::new();
    for raw in paths {
        let path = Path::new(raw);
        let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
            path: raw.clone(),
            source: e,
        })?;

        if metadata.is_dir() {
            for file in dir_documents(path)? {
                let fragment = read_file(&file)?;
                documents.push((file.display().to_string(), fragment));
            }
        } else {
            documents.push((raw.clone(), read_file(path)?));
        }
    }
    Ok(documents)
}

/// The config documents inside `dir`, sorted by file name. Subdirectories
/// and files with other extensions are skipped.
fn dir_documents(dir: &Path) -> ConfigResult<Vec<std::path::PathBuf>> {
    let read_err = |e: std::io::Error| ConfigError::ReadError {
        path: dir.display().to_string(),
        source: e,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() {
            continue;
        }
        if DocumentFormat::from_path(&path).is_none() {
            debug!(path = %path.display(), "skipping non-config file");
            continue;
        }
        files.push(path);
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Read and decode one document. The format comes from the extension and
/// is sniffed from the content when the extension is unknown.
fn read_file(path: &Path) -> ConfigResult<ConfigFragment> {
    let label = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: label.clone(),
        source: e,
    })?;

    // Checked after reading to avoid a stat/read race.
    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: label,
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let format = DocumentFormat::from_path(path).unwrap_or_else(|| DocumentFormat::sniff(&content));
    let fragment = parse_file_at(&content, format, &label)?;
    info!(path = %label, %format, "loaded config file");
    Ok(fragment)
}
