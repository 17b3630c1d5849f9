//! Run configuration.
//!
//! Values are layered: built-in defaults, then an optional
//! `sphinx-extract.toml` (or the file given with `--config`), then
//! `SPHINX_EXTRACT_*` environment variables. Command-line flags are applied on
//! top by the binary.

use crate::error::ExtractError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the project root when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "sphinx-extract.toml";

/// Prefix of environment variable overrides, e.g. `SPHINX_EXTRACT_FORCE=true`
/// or `SPHINX_EXTRACT_CSV__SEPARATOR=;`.
pub const ENV_PREFIX: &str = "SPHINX_EXTRACT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Root directory; each format writes into `<output_dir>/<format>/`.
    pub output_dir: PathBuf,
    /// Create a missing output directory and overwrite existing files.
    pub force: bool,
    /// Requested formats. `all` or an empty list selects every format.
    pub formats: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Additional calls treated like `add_directive(name, ...)`.
    pub extra_directive_calls: Vec<String>,
    /// Additional calls treated like `add_role(name, ...)`.
    pub extra_role_calls: Vec<String>,
    pub csv: CsvOptions,
    pub list: ListOptions,
    pub html: HtmlOptions,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            force: false,
            formats: vec!["all".to_string()],
            include_patterns: vec!["conf.py".to_string(), "**/*.py".to_string()],
            exclude_patterns: vec![
                "_build/**".to_string(),
                ".*/**".to_string(),
                "**/__pycache__/**".to_string(),
            ],
            extra_directive_calls: Vec::new(),
            extra_role_calls: Vec::new(),
            csv: CsvOptions::default(),
            list: ListOptions::default(),
            html: HtmlOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub separator: String,
    /// Spreadsheet locales that read `0,5` as a number: use `;` between
    /// columns and a comma as decimal mark.
    pub decimal_comma: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            decimal_comma: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteStyle {
    /// `["a", "b"]`
    PythonDouble,
    /// `['a', 'b']`
    PythonSingle,
    /// `%w[a b]`
    RubyWords,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    /// One entry per line with a trailing `# from <source>` comment.
    pub include_comments: bool,
    pub quote_style: QuoteStyle,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            include_comments: true,
            quote_style: QuoteStyle::PythonDouble,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    pub title: String,
    /// Stamp the report footer with the generation time. Off by default so
    /// that reports are byte-identical between runs.
    pub show_timestamp: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            title: "Sphinx markup".to_string(),
            show_timestamp: false,
        }
    }
}

fn config_error(e: config::ConfigError) -> ExtractError {
    ExtractError::Config(e.to_string())
}

impl ExtractConfig {
    /// Load the layered configuration for a project.
    ///
    /// An explicit `config_file` must exist; the implicit one in
    /// `project_root` is optional.
    pub fn load(project_root: &Path, config_file: Option<&Path>) -> Result<Self, ExtractError> {
        let defaults = Config::try_from(&ExtractConfig::default()).map_err(config_error)?;
        let (file, required) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (project_root.join(CONFIG_FILE_NAME), false),
        };

        let mut environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",");
        for key in [
            "formats",
            "include_patterns",
            "exclude_patterns",
            "extra_directive_calls",
            "extra_role_calls",
        ] {
            environment = environment.with_list_parse_key(key);
        }

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(file.as_path()).required(required))
            .add_source(environment)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)
    }

    /// Expand the requested formats against the known format names.
    ///
    /// Entries may be `:`-separated (`csv:html`). `all` or an empty request
    /// selects every known format. Duplicates are dropped, keeping the first.
    pub fn resolved_formats(&self, known: &[&str]) -> Result<Vec<String>, ExtractError> {
        let requested: Vec<&str> = self
            .formats
            .iter()
            .flat_map(|f| f.split(':'))
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();

        if requested.is_empty() || requested.contains(&"all") {
            return Ok(known.iter().map(|f| f.to_string()).collect());
        }

        let mut resolved: Vec<String> = Vec::new();
        for format in requested {
            if !known.contains(&format) {
                return Err(ExtractError::Config(format!(
                    "format '{}' not recognized (valid formats: {})",
                    format,
                    known.join(", ")
                )));
            }
            if !resolved.iter().any(|f| f == format) {
                resolved.push(format.to_string());
            }
        }
        Ok(resolved)
    }

    /// Check option combinations that do not depend on the file system.
    pub fn validate(&self, known_formats: &[&str]) -> Result<(), ExtractError> {
        self.resolved_formats(known_formats)?;

        let mut separator = self.csv.separator.chars();
        match (separator.next(), separator.next()) {
            (Some(c), None) if c != '"' && c != '\n' && c != '\r' => {}
            _ => {
                return Err(ExtractError::Config(format!(
                    "csv separator must be a single character other than a quote or newline, got {:?}",
                    self.csv.separator
                )))
            }
        }

        if self.include_patterns.is_empty() {
            return Err(ExtractError::Config(
                "include_patterns must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Column separator after applying `decimal_comma`.
    pub fn csv_separator(&self) -> char {
        if self.csv.decimal_comma && self.csv.separator == "," {
            ';'
        } else {
            self.csv.separator.chars().next().unwrap_or(',')
        }
    }
}
