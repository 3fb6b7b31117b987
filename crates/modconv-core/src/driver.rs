//! Run driver: header → catalog → block scan → patch → output.
//!
//! A [`PatchSession`] owns a private copy of the file and steps through
//! [`RunState`] in order. Any fatal error moves it to [`RunState::Aborted`],
//! which drops the working copy's changes: [`PatchSession::into_output`]
//! only hands bytes back from a finalized run that patched something.
//!
//! [`patch_file`] wraps a session with the file-system side, and is the only
//! place in the crate that writes files.

use crate::block::{find_block, BlockCode, BlockIter};
use crate::catalog::{Sdna, TypeCatalog};
use crate::error::{Error, Result};
use crate::header::FileHeader;
use crate::patch::{patch_record, TargetSpec};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix inserted before the extension of derived output paths
pub const DEFAULT_SUFFIX: &str = "_converted";

/// Where a session is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing read yet
    Init,
    /// Header parsed, decoding config known
    HeaderRead,
    /// Target layout resolved (possibly to nothing)
    CatalogResolved,
    /// Walking blocks and patching
    Scanning,
    /// A fatal error stopped the run; nothing will be written
    Aborted,
    /// The run completed
    Finalized,
}

/// Counters accumulated over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchResult {
    /// Blocks walked before `ENDB`
    pub blocks_scanned: usize,
    /// `DATA` blocks tagged with the target layout
    pub blocks_eligible: usize,
    /// Blocks whose enum field was rewritten
    pub blocks_patched: usize,
}

/// An in-memory patch run over one file
#[derive(Debug)]
pub struct PatchSession {
    data: Vec<u8>,
    state: RunState,
    result: PatchResult,
    header: Option<FileHeader>,
    target_layout: Option<u32>,
}

impl PatchSession {
    /// Creates a session over a copy of the file
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            state: RunState::Init,
            result: PatchResult::default(),
            header: None,
            target_layout: None,
        }
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Counters so far; still meaningful after an abort
    pub fn result(&self) -> PatchResult {
        self.result
    }

    /// Parsed header, once read
    pub fn header(&self) -> Option<&FileHeader> {
        self.header.as_ref()
    }

    /// Resolved struct-layout index; `None` if unresolved or absent from the catalog
    pub fn target_layout(&self) -> Option<u32> {
        self.target_layout
    }

    /// Runs every stage. Can only be called once.
    pub fn run(&mut self, target: &TargetSpec) -> Result<PatchResult> {
        if self.state != RunState::Init {
            return Err(Error::internal(format!(
                "session already run (state {:?})",
                self.state
            )));
        }

        match self.run_stages(target) {
            Ok(()) => {
                self.state = RunState::Finalized;
                Ok(self.result)
            }
            Err(e) => {
                debug!(
                    "Aborting after {} of {} eligible block(s) patched",
                    self.result.blocks_patched, self.result.blocks_eligible
                );
                self.state = RunState::Aborted;
                Err(e)
            }
        }
    }

    /// The patched bytes, if the run finalized with at least one patch
    pub fn into_output(self) -> Option<Vec<u8>> {
        (self.state == RunState::Finalized && self.result.blocks_patched > 0).then_some(self.data)
    }

    fn run_stages(&mut self, target: &TargetSpec) -> Result<()> {
        let header = FileHeader::parse(&self.data)?;
        let config = header.config;
        self.header = Some(header);
        self.state = RunState::HeaderRead;

        let dna = find_block(&self.data, config, BlockCode::DNA1)?.ok_or(Error::MissingCatalog)?;
        let sdna = Sdna::parse(dna.body(&self.data)?, &config)?;
        self.target_layout = match sdna.resolve_layout_index(&target.type_name) {
            Ok(index) => {
                if let Some(len) = sdna.struct_len(index) {
                    debug!("Layout {} is {} bytes per record", index, len);
                }
                Some(index)
            }
            Err(e) if !e.is_fatal() => {
                warn!("{}; no blocks can match", e);
                None
            }
            Err(e) => return Err(e),
        };
        self.state = RunState::CatalogResolved;

        info!("Iterating blend file blocks...");
        self.state = RunState::Scanning;
        let blocks = BlockIter::new(&self.data, config).collect::<Result<Vec<_>>>()?;
        self.result.blocks_scanned = blocks.len();

        let Some(layout) = self.target_layout else {
            return Ok(());
        };

        for block in blocks
            .iter()
            .filter(|b| b.code == BlockCode::DATA && b.layout_index == layout)
        {
            self.result.blocks_eligible += 1;
            debug!(
                "Found DATA block with sdna index {} at offset {}",
                layout, block.offset
            );
            patch_record(&mut self.data, block, &config, target)?;
            self.result.blocks_patched += 1;
        }

        info!(
            "Scanned {} block(s), patched {}",
            self.result.blocks_scanned, self.result.blocks_patched
        );
        Ok(())
    }
}

/// Patches an in-memory file.
///
/// Returns the counters and, if anything was patched, the new bytes. The
/// input is never modified.
pub fn patch_bytes(data: &[u8], target: &TargetSpec) -> Result<(PatchResult, Option<Vec<u8>>)> {
    let mut session = PatchSession::new(data.to_vec());
    let result = session.run(target)?;
    Ok((result, session.into_output()))
}

/// Options for [`patch_file`]
#[derive(Debug, Clone)]
pub struct PatchOptions {
    /// Explicit output path; derived from the input when `None`
    pub output: Option<PathBuf>,
    /// Suffix for derived output paths
    pub suffix: String,
    /// Validate and count, but never write
    pub dry_run: bool,
    /// Overwrite an existing output file
    pub force: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            output: None,
            suffix: DEFAULT_SUFFIX.to_string(),
            dry_run: false,
            force: false,
        }
    }
}

impl PatchOptions {
    /// Creates new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit output path
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Sets the suffix for derived output paths
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Enables or disables dry-run mode
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Allows overwriting an existing output file
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Outcome of [`patch_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// The input file
    pub input: PathBuf,
    /// Output path, when at least one block was patched
    pub output: Option<PathBuf>,
    /// Whether the output was actually written (false in dry-run mode)
    pub written: bool,
    /// Run counters
    pub result: PatchResult,
}

/// Derives `<dir>/<stem><suffix>.<ext>` from `input`
pub fn output_path_for(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(suffix);
    if let Some(ext) = input.extension() {
        name.push(OsStr::new("."));
        name.push(ext);
    }
    input.with_file_name(name)
}

/// Returns true if both paths name the same existing file
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Reads `path`, patches it, and writes the result next to it.
///
/// Nothing is written when no block was patched, in dry-run mode, or when
/// the run aborts. The output never replaces the input: an empty suffix or
/// an output path naming the input is rejected before the file is read.
pub fn patch_file(
    path: impl AsRef<Path>,
    target: &TargetSpec,
    options: &PatchOptions,
) -> Result<RunReport> {
    let path = path.as_ref();
    let output = match options.output {
        Some(ref output) => output.clone(),
        None if options.suffix.is_empty() => return Err(Error::EmptySuffix),
        None => output_path_for(path, &options.suffix),
    };
    if same_file(path, &output) {
        return Err(Error::OutputIsInput { path: output });
    }

    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    debug!("Read {} bytes from {}", data.len(), path.display());

    let mut session = PatchSession::new(data);
    let result = session.run(target)?;

    let mut report = RunReport {
        input: path.to_path_buf(),
        output: None,
        written: false,
        result,
    };

    let Some(bytes) = session.into_output() else {
        info!("No blocks found that needed to be patched");
        return Ok(report);
    };

    if !options.dry_run {
        if output.exists() && !options.force {
            return Err(Error::OutputExists { path: output });
        }
        info!("Writing result to file: {}", output.display());
        std::fs::write(&output, &bytes).map_err(|e| Error::file_write(&output, e))?;
        report.written = true;
    }

    report.output = Some(output);
    Ok(report)
}
