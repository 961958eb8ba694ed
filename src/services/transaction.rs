//! Capture → mutate → validate → commit-or-rollback orchestration.
//!
//! A transaction records exactly one snapshot per file: the pre-mutation
//! content returned by the first mutator call that touches it. After the
//! caller's mutation closure runs, the external validator checks the
//! *global* configuration (the mutated file is part of a larger active
//! tree). A reported syntax failure restores every touched file verbatim,
//! all-or-nothing. Validator unavailability leaves the mutation in place
//! (the change is unconfirmed, not known-bad) and is surfaced distinctly.
//!
//! The transaction itself holds no lock; the hosting layer (see
//! [`ConfEngine`](crate::engine::ConfEngine)) serializes mutating calls.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::Regex;

use crate::error::{EngineError, Result};
use crate::models::WhitespaceStyle;
use crate::services::files::write_atomic;
use crate::services::mutator;
use crate::services::validator::SyntaxValidator;

/// One logical configuration change, possibly spanning several files.
#[derive(Default)]
pub struct MutationTransaction {
    snapshots: IndexMap<Utf8PathBuf, String>,
}

impl MutationTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `mutate` against a fresh transaction, then asks `validator` to
    /// check the tree rooted at `root_conf`.
    ///
    /// - validator reports success: the transaction is committed (files are
    ///   already on disk) and `Ok(())` is returned;
    /// - validator reports failure: every touched file is restored from its
    ///   snapshot and [`EngineError::ValidationFailed`] carries the
    ///   diagnostic;
    /// - validator could not run: files stay mutated and
    ///   [`EngineError::ValidatorUnavailable`] is surfaced;
    /// - `mutate` itself fails: touched files are restored before the error
    ///   propagates.
    pub async fn apply_and_validate<F>(
        root_conf: &Utf8Path,
        validator: &dyn SyntaxValidator,
        mutate: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut MutationTransaction) -> Result<()>,
    {
        let mut txn = MutationTransaction::new();

        if let Err(err) = mutate(&mut txn) {
            txn.rollback()?;
            return Err(err);
        }

        if txn.snapshots.is_empty() {
            tracing::debug!("Transaction touched no files, skipping validation");
            return Ok(());
        }

        match validator.check(root_conf).await {
            Ok(outcome) if outcome.ok => {
                tracing::info!(
                    "Committed change to {} file(s)",
                    txn.snapshots.len()
                );
                Ok(())
            }
            Ok(outcome) => {
                tracing::warn!("Validation failed, rolling back: {}", outcome.diagnostic);
                txn.rollback()?;
                Err(EngineError::ValidationFailed {
                    diagnostic: outcome.diagnostic,
                })
            }
            Err(err) => {
                tracing::error!("Validator unavailable, leaving mutation in place: {}", err);
                Err(err)
            }
        }
    }

    /// Files touched so far, in first-touch order.
    pub fn touched_files(&self) -> Vec<&Utf8Path> {
        self.snapshots.keys().map(Utf8PathBuf::as_path).collect()
    }

    /// Inserts lines through the transaction. See [`mutator::insert_lines`].
    pub fn insert_lines<S: AsRef<str>>(
        &mut self,
        file: &Utf8Path,
        lines: &[S],
        at_line: usize,
        style: WhitespaceStyle,
    ) -> Result<()> {
        let original = mutator::insert_lines(file, lines, at_line, style)?;
        self.record(file, original);
        Ok(())
    }

    /// Replaces a line range through the transaction. See
    /// [`mutator::replace_range`].
    pub fn replace_range<S: AsRef<str>>(
        &mut self,
        file: &Utf8Path,
        lines: &[S],
        start_line: usize,
        end_line: usize,
    ) -> Result<()> {
        let original = mutator::replace_range(file, lines, start_line, end_line)?;
        self.record(file, original);
        Ok(())
    }

    /// Deletes matching lines through the transaction; returns whether
    /// anything was removed. A no-op match records no snapshot, since the
    /// file was not written.
    pub fn delete_matching(
        &mut self,
        file: &Utf8Path,
        pattern: &Regex,
        start_line: usize,
        end_line: usize,
        include_comments: bool,
    ) -> Result<bool> {
        let (original, found) =
            mutator::delete_matching(file, pattern, start_line, end_line, include_comments)?;
        if found {
            self.record(file, original);
        }
        Ok(found)
    }

    /// Appends a line through the transaction. See [`mutator::append_line`].
    pub fn append_line(&mut self, file: &Utf8Path, text: &str) -> Result<()> {
        let original = mutator::append_line(file, text)?;
        self.record(file, original);
        Ok(())
    }

    /// Removes full-line matches through the transaction. See
    /// [`mutator::remove_full_line_matches`].
    pub fn remove_full_line_matches(&mut self, file: &Utf8Path, pattern: &Regex) -> Result<()> {
        let original = mutator::remove_full_line_matches(file, pattern)?;
        self.record(file, original);
        Ok(())
    }

    /// Keeps the first snapshot per file; later writes to the same file must
    /// not overwrite the true pre-transaction image.
    fn record(&mut self, file: &Utf8Path, original: String) {
        self.snapshots.entry(file.to_path_buf()).or_insert(original);
    }

    /// Restores every touched file verbatim from its snapshot.
    fn rollback(&mut self) -> Result<()> {
        for (file, original) in self.snapshots.iter().rev() {
            tracing::debug!("Restoring {}", file);
            write_atomic(file, original)?;
        }
        self.snapshots.clear();
        Ok(())
    }
}
