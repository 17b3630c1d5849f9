//! Output naming and writing helpers shared by the formatters and driver.

use crate::error::ExtractError;
use crate::formats::OutputFile;
use chrono::Local;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// File-name-safe form of a display name: ASCII alphanumerics are kept,
/// everything else becomes `_`.
pub fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Report page name for a source, e.g. `ext_roles_py_1a2b3c4d.html`.
///
/// The hash suffix keeps `a/b.py` and `a_b.py` apart.
pub fn page_file_name(display_name: &str) -> String {
    let hash = blake3::hash(display_name.as_bytes()).to_hex();
    format!("{}_{}.html", slugify(display_name), &hash.as_str()[..8])
}

/// Stable UUID-shaped identifier derived from `seed`.
pub fn stable_uuid(seed: &str) -> String {
    let hex = blake3::hash(seed.as_bytes()).to_hex();
    let hex = hex.as_str();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
    .to_uppercase()
}

/// Local time for report footers.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M %z").to_string()
}

/// Paths in `files` that already exist below `dir`.
pub fn existing_targets(dir: &Path, files: &[OutputFile]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|file| dir.join(&file.path))
        .filter(|path| path.exists())
        .collect()
}

/// Write every file below `dir`, creating parent directories.
///
/// Without `force`, nothing is written if any target already exists.
pub fn write_outputs(dir: &Path, files: &[OutputFile], force: bool) -> Result<usize, ExtractError> {
    if !force {
        if let Some(existing) = existing_targets(dir, files).into_iter().next() {
            return Err(ExtractError::OutputWrite {
                path: existing,
                reason: "file exists (pass --force to overwrite)".to_string(),
            });
        }
    }

    for file in files {
        let path = dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ExtractError::OutputWrite {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        fs::write(&path, &file.contents).map_err(|e| ExtractError::OutputWrite {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        debug!("Wrote {} ({} bytes)", path.display(), file.contents.len());
    }
    Ok(files.len())
}
