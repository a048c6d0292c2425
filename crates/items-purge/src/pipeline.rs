//! End-to-end cleaning: parse, index, closure, filter, serialize, rotate.

use std::path::{Path, PathBuf};

use crate::backup::{rotate_and_write, Storage};
use crate::config::{CleanOptions, Grammar};
use crate::error::CleanError;
use crate::filter::{apply, compute_closure_with};
use crate::index::ItemIndex;
use crate::model::{Document, Identifier};
use crate::syntax::{parse, serialize};

/// Summary of a cleaning run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanReport {
    /// Items removed, in file order.
    pub removed: Vec<Identifier>,
    /// Items outside the closure removed with an enclosing record.
    pub swept: Vec<Identifier>,
    /// Ownership cycles found and left alone.
    pub cycles: Vec<Vec<Identifier>>,
    /// Protected items kept despite sitting in a deleted pile.
    pub protected: Vec<Identifier>,
    /// Deleted items left in place because they enclose a kept item.
    pub held: Vec<Identifier>,
    /// Count fields rewritten.
    pub counts_adjusted: usize,
    /// Total items in the input.
    pub items_before: usize,
    pub bytes_before: usize,
    pub bytes_after: usize,
    /// Backup holding the pre-run content; `None` on a dry run.
    pub backup: Option<PathBuf>,
}

/// A cleaned document and its serialized form.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub document: Document,
    pub output: Vec<u8>,
    pub report: CleanReport,
}

/// Runs the in-memory part of the pipeline. Nothing is written.
pub fn clean_bytes(
    input: &[u8],
    grammar: &Grammar,
    options: &CleanOptions,
) -> Result<Cleaned, CleanError> {
    let mut document = parse(input, grammar)?;
    let index = ItemIndex::build(&document)?;
    let closure = compute_closure_with(&index, &options.deleted_piles, &options.protection);
    let outcome = apply(&mut document, &closure);
    if document.is_modified() {
        log::debug!(
            "{} records cut, {} counts rewritten",
            document.removed_block_count(),
            outcome.counts_adjusted
        );
    } else {
        log::debug!("nothing to remove");
    }
    let output = serialize(&document);

    let report = CleanReport {
        removed: outcome.removed,
        swept: outcome.swept,
        cycles: closure.cycles,
        protected: closure.protected,
        held: outcome.held,
        counts_adjusted: outcome.counts_adjusted,
        items_before: index.len(),
        bytes_before: input.len(),
        bytes_after: output.len(),
        backup: None,
    };

    Ok(Cleaned {
        document,
        output,
        report,
    })
}

/// Cleans the save file at `path` in place.
///
/// The file is read fully, cleaned in memory, and only then are backups
/// rotated and the new content renamed into place. Parse and consistency
/// errors abort before anything is written.
pub fn clean_file<S: Storage + ?Sized>(
    storage: &S,
    path: &Path,
    grammar: &Grammar,
    options: &CleanOptions,
) -> Result<Cleaned, CleanError> {
    let input = storage
        .read(path)
        .map_err(|e| CleanError::io("read", path, e))?;

    let mut cleaned = clean_bytes(&input, grammar, options)?;

    if options.dry_run {
        log::info!(
            "dry run: would remove {} of {} items from {}",
            cleaned.report.removed.len(),
            cleaned.report.items_before,
            path.display()
        );
        return Ok(cleaned);
    }

    let rotation = rotate_and_write(storage, path, &cleaned.output, options.max_backups)?;
    log::info!(
        "removed {} of {} items from {} ({} -> {} bytes), backup {}",
        cleaned.report.removed.len(),
        cleaned.report.items_before,
        path.display(),
        cleaned.report.bytes_before,
        cleaned.report.bytes_after,
        rotation.newest.display()
    );
    cleaned.report.backup = Some(rotation.newest);

    Ok(cleaned)
}
