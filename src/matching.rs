//! Source discovery with glob include and exclude patterns.
//!
//! Patterns are matched against paths relative to the project root, always
//! with `/` separators:
//! - `**/` matches zero or more whole directories, a trailing `**` matches
//!   anything
//! - `*` and `?` never cross a `/`
//! - `[seq]` and `[!seq]` are character classes

use crate::error::ExtractError;
use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::{DirEntry, WalkDir};

lazy_static::lazy_static! {
    static ref PATTERN_CACHE: Mutex<HashMap<String, Regex>> = Mutex::new(HashMap::new());
}

/// Turn a glob into an anchored regular expression.
pub fn translate_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:[^/]+/)*");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push('[');
                    let mut body = &chars[i + 1..end];
                    if let Some(('!' | '^', rest)) = body.split_first() {
                        out.push('^');
                        body = rest;
                    }
                    for &c in body {
                        if matches!(c, '\\' | '[' | '&' | '~') {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push(']');
                    i = end + 1;
                }
                None => {
                    out.push_str("\\[");
                    i += 1;
                }
            },
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }

    out.push('$');
    out
}

/// Index of the `]` closing the class opened at `open`. A `]` right after
/// the opening (or after `!`) is a literal member.
fn class_end(chars: &[char], open: usize) -> Option<usize> {
    let mut j = open + 1;
    if matches!(chars.get(j), Some('!' | '^')) {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    chars[j.min(chars.len())..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| j + offset)
}

/// Compile a glob, reusing earlier compilations of the same pattern.
pub fn compile_pattern(pattern: &str) -> Result<Regex, ExtractError> {
    let mut cache = PATTERN_CACHE
        .lock()
        .map_err(|_| ExtractError::Config("pattern cache poisoned".to_string()))?;
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(&translate_pattern(pattern))
        .map_err(|e| ExtractError::Config(format!("invalid pattern '{}': {}", pattern, e)))?;
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

/// Forward-slash form of a relative path.
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Compiled include and exclude patterns for one project.
#[derive(Debug, Clone)]
pub struct SourceMatcher {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    skip_dirs: Vec<PathBuf>,
}

impl SourceMatcher {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ExtractError> {
        Ok(Self {
            include: include
                .iter()
                .map(|p| compile_pattern(p))
                .collect::<Result<_, _>>()?,
            exclude: exclude
                .iter()
                .map(|p| compile_pattern(p))
                .collect::<Result<_, _>>()?,
            skip_dirs: Vec::new(),
        })
    }

    /// Never descend into `dir`, e.g. the output directory.
    pub fn skip_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skip_dirs.push(dir.into());
        self
    }

    /// Whether a root-relative file path is selected.
    pub fn is_match(&self, relative: &str) -> bool {
        self.include.iter().any(|r| r.is_match(relative))
            && !self.exclude.iter().any(|r| r.is_match(relative))
    }

    fn prunes(&self, entry: &DirEntry, root: &Path) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        if self.skip_dirs.iter().any(|dir| entry.path() == dir) {
            return true;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            return false;
        };
        let as_dir = format!("{}/", normalize_path(relative));
        self.exclude.iter().any(|r| r.is_match(&as_dir))
    }

    /// Walk `root` and return the selected files sorted by relative path.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        if !root.is_dir() {
            return Err(ExtractError::InputRead {
                path: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.prunes(entry, root));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Cannot walk {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = normalize_path(relative);
            if self.is_match(&relative) {
                found.push((relative, entry.into_path()));
            }
        }

        found.sort();
        debug!("Discovered {} source files in {}", found.len(), root.display());
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }
}

/// Convenience wrapper over [`SourceMatcher::discover`].
pub fn discover_sources(
    root: &Path,
    include: &[String],
    exclude: &[String],
) -> Result<Vec<PathBuf>, ExtractError> {
    SourceMatcher::new(include, exclude)?.discover(root)
}
