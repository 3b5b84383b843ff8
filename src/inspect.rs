//! Orchestrator: walk the input paths, validate each changefile and dump
//! its blocks.
//!
//! Per file: open → header → block map → every present slot is verified and
//! rendered → count check.  A file-level failure is reported and the run
//! moves on to the next path, except when the first path cannot be opened
//! or a block map cannot be allocated; both stop the run.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::blockmap::{BlockMap, BlockMapError};
use crate::header::{Header, HeaderError};
use crate::hexdump::write_hexdump;
use crate::report::{BlockReport, FileReport};
use crate::storage::{seek_to, Storage};
use crate::verify::{BlockCheck, BlockScanner, ProbePolicy};

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    BlockMap(#[from] BlockMapError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl InspectError {
    pub fn exit_code(&self) -> u8 {
        match self {
            InspectError::Open { .. }  => 2,
            InspectError::Header(_)    => 3,
            InspectError::BlockMap(_)  => 4,
            InspectError::Io(_)        => 5,
        }
    }

    /// Whether this failure ends the run.  `first` is true for the first
    /// path on the command line.
    pub fn halts_run(&self, first: bool) -> bool {
        match self {
            InspectError::Open { .. } => first,
            InspectError::BlockMap(e) => e.is_alloc_failure(),
            _ => false,
        }
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectOptions {
    pub probe:   ProbePolicy,
    /// Render the byte listing after each block line.
    pub hexdump: bool,
    /// Emit one JSON report per file instead of the text listing.
    pub json:    bool,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self { probe: ProbePolicy::default(), hexdump: true, json: false }
    }
}

// ── Run status ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RunStatus {
    /// Paths attempted, including the one that halted the run.
    pub attempted: usize,
    pub reports:   Vec<FileReport>,
    pub halted:    bool,
    /// Outcome of the last path attempted; 1 if nothing was attempted.
    pub exit_code: u8,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self { attempted: 0, reports: Vec::new(), halted: false, exit_code: 1 }
    }
}

// ── Inspector ─────────────────────────────────────────────────────────────────

pub struct Inspector<S: Storage> {
    storage: S,
    options: InspectOptions,
}

impl<S: Storage> Inspector<S> {
    pub fn new(storage: S, options: InspectOptions) -> Self {
        Self { storage, options }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn options(&self) -> &InspectOptions {
        &self.options
    }

    /// Inspect every path in order.  `prog` prefixes open failures.
    pub fn run<P, W, E>(&self, prog: &str, paths: &[P], out: &mut W, err: &mut E) -> RunStatus
    where
        P: AsRef<Path>,
        W: Write + ?Sized,
        E: Write + ?Sized,
    {
        let mut status = RunStatus::default();
        for (i, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            status.attempted += 1;
            match self.inspect_file(path, out, err) {
                Ok(report) => {
                    status.exit_code = 0;
                    status.reports.push(report);
                }
                Err(e) => {
                    let _ = match &e {
                        InspectError::Open { .. } => writeln!(err, "{prog}: {e}"),
                        _ => writeln!(err, "{}: {e}", path.display()),
                    };
                    status.exit_code = e.exit_code();
                    if e.halts_run(i == 0) {
                        log::debug!("stopping after {}: {e}", path.display());
                        status.halted = true;
                        break;
                    }
                }
            }
        }
        status
    }

    /// Inspect one changefile, writing the listing to `out` and block
    /// diagnostics to `err`.
    pub fn inspect_file<W, E>(&self, path: &Path, out: &mut W, err: &mut E) -> Result<FileReport, InspectError>
    where
        W: Write + ?Sized,
        E: Write + ?Sized,
    {
        let text = !self.options.json;
        let name = path.display().to_string();

        let mut file = self.storage
            .open(path)
            .map_err(|source| InspectError::Open { path: path.to_path_buf(), source })?;

        seek_to(&mut file, 0)?;
        let header = Header::read(&mut file)?;
        if text {
            writeln!(out, "{}", header.summary(&name))?;
        }

        let map = BlockMap::load(&self.storage, &mut file, &header)?;
        let mut report = FileReport::new(name, &header);
        let mut scanner = BlockScanner::new(&self.storage, self.options.probe);

        for (index, offset) in map.present() {
            report.found += 1;
            let check = scanner.check(&mut file, offset, index)?;

            if text {
                let verdict = if check.is_valid() { "ok" } else { "INVALID" };
                writeln!(out, "{index}: offset 0x{offset:016x}: {verdict}")?;
            }
            match &check {
                BlockCheck::NoValidSize => {
                    writeln!(err, "{}: block {index}: no valid block size found", report.path)?;
                }
                BlockCheck::Checked(v) => {
                    for fault in &v.faults {
                        writeln!(err, "{}: block {index}: {fault}", report.path)?;
                    }
                    if text && self.options.hexdump {
                        write_hexdump(out, scanner.buffer())?;
                    }
                }
            }
            report.blocks.push(BlockReport::new(index, offset, &check));
        }
        report.block_size = scanner.block_size().map(|s| s as u64);

        if let Some(warning) = report.count_warning() {
            log::debug!("{}: {warning}", report.path);
            if text {
                writeln!(out, "{warning}")?;
            }
        }
        if !text {
            writeln!(out, "{}", report.to_json().map_err(io::Error::from)?)?;
        }

        log::info!(
            "{}: {} present, {} invalid, block size {:?}",
            report.path, report.found, report.invalid_blocks(), report.block_size
        );
        Ok(report)
    }
}
