use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::ExtractConfig;
use crate::error::{ExtractError, ExtractWarning};
use crate::extractor::Extractor;
use crate::formats::FormatterRegistry;
use crate::matching::SourceMatcher;
use crate::model::{KindCounts, Model, SourceRef};
use crate::utils;

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub files_discovered: usize,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub counts: KindCounts,
    pub formats_written: Vec<String>,
    pub failed_formats: Vec<String>,
    pub files_written: usize,
    pub warnings: Vec<ExtractWarning>,
    pub build_time: Duration,
}

impl RunStats {
    /// At least one requested format was produced.
    pub fn succeeded(&self) -> bool {
        !self.formats_written.is_empty()
    }
}

/// Drives one run: discovery, extraction and every requested format.
pub struct ExtractBuilder {
    config: ExtractConfig,
    project_root: PathBuf,
    inputs: Vec<PathBuf>,
    extractor: Extractor,
    registry: FormatterRegistry,
    formats: Vec<String>,
}

impl ExtractBuilder {
    /// Validate `config` and set up the formatters. Display names are made
    /// relative to `project_root`; each input is a file or a directory to
    /// search.
    pub fn new(config: ExtractConfig, project_root: PathBuf, inputs: Vec<PathBuf>) -> Result<Self> {
        let registry = FormatterRegistry::with_builtin_formatters(&config)
            .context("Failed to set up output formats")?;
        let names = registry.names();
        config.validate(&names)?;
        let formats = config.resolved_formats(&names)?;

        let project_root = project_root.canonicalize().unwrap_or(project_root);
        let inputs = if inputs.is_empty() {
            vec![project_root.clone()]
        } else {
            inputs
        };

        Ok(Self {
            extractor: Extractor::from_config(&config),
            config,
            project_root,
            inputs,
            registry,
            formats,
        })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    /// Formats this run will write, in order.
    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    pub fn build(&self) -> Result<RunStats> {
        let start_time = Instant::now();
        info!("Starting extraction...");

        let output_dir = self.prepare_output_dir()?;
        let mut warnings = Vec::new();

        let sources = self.discover_sources(&output_dir, &mut warnings)?;
        info!("Discovered {} source files", sources.len());
        if sources.is_empty() {
            return Err(ExtractError::NoInput.into());
        }

        let extraction = self.extractor.extract_files(&sources);
        warnings.extend(extraction.warnings.iter().cloned());
        if extraction.all_failed() {
            warn!("None of the {} source files could be scanned", sources.len());
            return Err(ExtractError::NoInput.into());
        }

        let model = extraction.model;
        let counts = model.counts();
        info!(
            "Found {} directives and {} roles in {} files",
            counts.directives, counts.roles, extraction.scanned
        );

        let mut stats = RunStats {
            files_discovered: sources.len(),
            files_scanned: extraction.scanned,
            files_skipped: extraction.skipped,
            counts,
            ..RunStats::default()
        };

        for format in &self.formats {
            match self.write_format(format, &model, &output_dir) {
                Ok(written) => {
                    info!("Wrote {} file(s) for format '{}'", written, format);
                    stats.files_written += written;
                    stats.formats_written.push(format.clone());
                }
                Err(e) => {
                    warn!("Format '{}' failed: {}", format, e);
                    stats.failed_formats.push(format.clone());
                    match e.to_warning() {
                        Some(warning) => warnings.push(warning),
                        None => warnings.push(ExtractWarning::unwritable_output(
                            output_dir.join(format),
                            e.to_string(),
                        )),
                    }
                }
            }
        }

        stats.warnings = warnings;
        stats.build_time = start_time.elapsed();
        info!("Extraction completed in {:?}", stats.build_time);
        Ok(stats)
    }

    /// Create or check the output directory before any input is read.
    fn prepare_output_dir(&self) -> Result<PathBuf> {
        let output_dir = &self.config.output_dir;
        if !output_dir.exists() {
            if !self.config.force {
                return Err(ExtractError::Config(format!(
                    "output directory {} does not exist (pass --force to create it)",
                    output_dir.display()
                ))
                .into());
            }
            info!("Creating output directory {}", output_dir.display());
            fs::create_dir_all(output_dir).with_context(|| {
                format!("Failed to create output directory: {}", output_dir.display())
            })?;
        } else if !output_dir.is_dir() {
            return Err(ExtractError::Config(format!(
                "output path {} is not a directory",
                output_dir.display()
            ))
            .into());
        }
        Ok(output_dir
            .canonicalize()
            .unwrap_or_else(|_| output_dir.to_path_buf()))
    }

    fn discover_sources(
        &self,
        output_dir: &Path,
        warnings: &mut Vec<ExtractWarning>,
    ) -> Result<Vec<SourceRef>> {
        let matcher = SourceMatcher::new(
            &self.config.include_patterns,
            &self.config.exclude_patterns,
        )?
        .skip_dir(output_dir);

        let mut seen = HashSet::new();
        let mut sources = Vec::new();
        for input in &self.inputs {
            let Ok(input) = input.canonicalize() else {
                warn!("Input {} does not exist, skipping", input.display());
                warnings.push(ExtractWarning::skipped_file(input.clone(), "does not exist"));
                continue;
            };

            let files = if input.is_dir() {
                matcher
                    .discover(&input)
                    .with_context(|| format!("Failed to search directory: {}", input.display()))?
            } else {
                vec![input]
            };

            for file in files {
                if seen.insert(file.clone()) {
                    debug!("Source: {}", file.display());
                    sources.push(SourceRef::relative_to(&file, &self.project_root));
                }
            }
        }
        Ok(sources)
    }

    fn write_format(
        &self,
        format: &str,
        model: &Model,
        output_dir: &Path,
    ) -> Result<usize, ExtractError> {
        let formatter = self
            .registry
            .get(format)
            .ok_or_else(|| ExtractError::Config(format!("format '{}' not recognized", format)))?;
        let files = formatter.render(model)?;
        utils::write_outputs(&output_dir.join(format), &files, self.config.force)
    }
}
