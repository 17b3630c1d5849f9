//! Command line interface for sphinx-markup-extract
use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sphinx_markup_extract::{ExtractBuilder, ExtractConfig, ExtractError, FormatterRegistry};

#[derive(Parser)]
#[command(name = "sphinx-markup-extract")]
#[command(version)]
#[command(about = "List the directives and roles a Sphinx project registers")]
struct Args {
    /// Project directory or individual Python files [default: .]
    paths: Vec<PathBuf>,

    /// Output directory; each format writes into a subdirectory
    #[arg(short, long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// Create the output directory and overwrite existing files
    #[arg(short, long)]
    force: bool,

    /// Output format(s): one of the registered formats or 'all'.
    /// Separate several with ':' or repeat the flag
    #[arg(short = 'F', long = "format", value_name = "FORMAT")]
    formats: Vec<String>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file [default: <project>/sphinx-extract.toml]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the available formats and exit
    #[arg(long)]
    list_formats: bool,
}

impl Args {
    /// Root that display names are relative to: the single directory given,
    /// otherwise the working directory.
    fn project_root(&self) -> PathBuf {
        match self.paths.as_slice() {
            [only] if only.is_dir() => only.clone(),
            _ => PathBuf::from("."),
        }
    }

    fn apply_overrides(&self, config: &mut ExtractConfig) {
        if let Some(outdir) = &self.outdir {
            config.output_dir = outdir.clone();
        }
        if self.force {
            config.force = true;
        }
        if !self.formats.is_empty() {
            config.formats = self.formats.clone();
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn print_formats() -> Result<()> {
    let registry = FormatterRegistry::with_builtin_formatters(&ExtractConfig::default())?;
    println!("Valid formats:\n");
    for name in registry.names() {
        if let Some(formatter) = registry.get(name) {
            println!("  {:<10} {}", name, formatter.description());
        }
    }
    println!("  {:<10} every format above", "all");
    Ok(())
}

fn run(args: &Args, project_root: &Path) -> Result<ExitCode> {
    let mut config = ExtractConfig::load(project_root, args.config.as_deref())?;
    args.apply_overrides(&mut config);

    let builder = ExtractBuilder::new(config, project_root.to_path_buf(), args.paths.clone())?;
    info!("Formats: {}", builder.formats().join(", "));
    info!("Output directory: {}", builder.config().output_dir.display());

    let stats = builder.build()?;
    if !stats.warnings.is_empty() {
        warn!("Finished with {} warning(s)", stats.warnings.len());
    }
    println!(
        "{} directives, {} roles from {} of {} files ({} skipped); wrote {} in {:.2?}",
        stats.counts.directives,
        stats.counts.roles,
        stats.files_scanned,
        stats.files_discovered,
        stats.files_skipped,
        if stats.formats_written.is_empty() {
            "nothing".to_string()
        } else {
            stats.formats_written.join(", ")
        },
        stats.build_time
    );

    if !stats.failed_formats.is_empty() {
        eprintln!("Failed formats: {}", stats.failed_formats.join(", "));
    }
    Ok(if stats.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_formats {
        return match print_formats() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(1)
            }
        };
    }

    let project_root = args.project_root();
    match run(&args, &project_root) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            match e.downcast_ref::<ExtractError>() {
                Some(ExtractError::NoInput) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}
