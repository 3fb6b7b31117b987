//! modconv - Convert modifier types in Blender .blend files
//!
//! This tool finds every record of a modifier struct in a blend file, checks
//! its name and current type enum, and writes a copy with the enum replaced.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use modconv_core::driver::DEFAULT_SUFFIX;
use modconv_core::{patch_file, PatchOptions, RunReport, TargetSpec};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Convert modifier types in Blender .blend files
#[derive(Parser, Debug)]
#[command(name = "modconv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Modifier name stored in each record (e.g. Bevel)
    #[arg(short, long)]
    modifier: String,

    /// Modifier data struct name (e.g. BevelModifierData)
    #[arg(short = 'd', long)]
    modifier_data: String,

    /// Enum type the modifier records currently hold
    #[arg(long)]
    old_enum_type: u32,

    /// Enum type to write into the modifier records
    #[arg(long)]
    new_enum_type: u32,

    /// Output file (single file mode only; default: <name>_converted.blend)
    #[arg(short, long, conflicts_with = "directory")]
    output: Option<PathBuf>,

    /// Suffix inserted before the extension of derived output files
    #[arg(long, default_value = DEFAULT_SUFFIX, value_parser = parse_suffix)]
    suffix: String,

    /// Dry run - validate and count, but don't write anything
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing output files
    #[arg(long)]
    force: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Blender file to patch
    #[arg(value_name = "BLEND_FILE")]
    file: Option<PathBuf>,

    /// Directory of blend files to patch recursively
    #[arg(long)]
    directory: Option<PathBuf>,
}

fn parse_suffix(s: &str) -> std::result::Result<String, String> {
    if s.is_empty() {
        return Err("suffix must not be empty; the output would replace the input".to_string());
    }
    Ok(s.to_string())
}

impl Cli {
    fn target(&self) -> TargetSpec {
        TargetSpec::new(
            &self.modifier_data,
            &self.modifier,
            self.old_enum_type,
            self.new_enum_type,
        )
    }

    fn options(&self) -> PatchOptions {
        let mut options = PatchOptions::new()
            .suffix(&self.suffix)
            .dry_run(self.dry_run)
            .force(self.force);
        if let Some(ref output) = self.output {
            options = options.output(output);
        }
        options
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory)
    } else {
        bail!("Either BLEND_FILE or --directory must be specified")
    }
}

/// Patch a single blend file
fn process_single_file(cli: &Cli, file: &Path) -> Result<()> {
    if !file.is_file() {
        bail!("Input file does not exist or is not a file: {}", file.display());
    }

    let report = patch_file(file, &cli.target(), &cli.options())
        .with_context(|| format!("Failed to patch {}", file.display()))?;
    print_report(&report);
    Ok(())
}

/// Patch every blend file below a directory
fn process_directory(cli: &Cli, directory: &Path) -> Result<()> {
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let target = cli.target();
    let options = cli.options();
    let mut processed = 0;
    let mut failed = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !is_patch_candidate(path, &cli.suffix) {
            trace!("Skipping {}", path.display());
            continue;
        }

        debug!("Processing {}", path.display());
        processed += 1;
        match patch_file(path, &target, &options) {
            Ok(report) => print_report(&report),
            Err(e) => {
                // Log error but continue with other files
                warn!("Error processing {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    info!("Processed {} blend file(s), {} failed", processed, failed);

    if failed > 0 {
        bail!("{} of {} blend file(s) could not be patched", failed, processed);
    }
    Ok(())
}

/// A `.blend` file that is neither hidden nor an earlier output
fn is_patch_candidate(path: &Path, suffix: &str) -> bool {
    if !path.is_file() {
        return false;
    }

    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }

    match name.strip_suffix(".blend") {
        Some(stem) => suffix.is_empty() || !stem.ends_with(suffix),
        None => false,
    }
}

fn print_report(report: &RunReport) {
    let patched = report.result.blocks_patched;
    match (&report.output, report.written) {
        (Some(output), true) => println!(
            "{}: patched {} block{}; wrote {}",
            report.input.display(),
            patched,
            if patched == 1 { "" } else { "s" },
            output.display()
        ),
        (Some(output), false) => println!(
            "{}: would patch {} block{} and write {}",
            report.input.display(),
            patched,
            if patched == 1 { "" } else { "s" },
            output.display()
        ),
        (None, _) => println!(
            "{}: No blocks found that needed to be patched. Nothing to do.",
            report.input.display()
        ),
    }
}
