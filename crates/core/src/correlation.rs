//! Correlation records linking a dump to the test that produced it
//!
//! Every instrumented test process appends exactly one line
//! `<dumpId>;<testIdentity>` to the shared lookup file once its run finishes.
//! Many processes append to the same file, so each record is written with a
//! single append-mode write.

use crate::context::{AgentContext, DumpId};
use crate::errors::{error_chain, RecordError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, instrument};

/// One `dumpId;testIdentity` line of the lookup file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationRecord<'a> {
    pub dump_id: &'a DumpId,
    pub identity: &'a str,
}

impl CorrelationRecord<'_> {
    /// Serialized form, including the trailing newline
    pub fn to_line(&self) -> String {
        format!("{};{}\n", self.dump_id, self.identity)
    }
}

/// What a call to [`CorrelationLogWriter::write_once`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record was appended
    Written,
    /// A previous call already appended the record
    AlreadyWritten,
    /// No test identity was resolved, nothing to record
    Unresolved,
    /// Appending failed; a later call may try again
    Failed,
}

/// Appends the correlation record at most once
#[derive(Debug)]
pub struct CorrelationLogWriter {
    lookup_file: PathBuf,
    written: AtomicBool,
}

impl CorrelationLogWriter {
    pub fn new(lookup_file: impl Into<PathBuf>) -> Self {
        Self {
            lookup_file: lookup_file.into(),
            written: AtomicBool::new(false),
        }
    }

    /// Writer for the lookup file in the context's output directory
    pub fn for_context(ctx: &AgentContext) -> Self {
        Self::new(ctx.lookup_file_path())
    }

    pub fn lookup_file(&self) -> &Path {
        &self.lookup_file
    }

    pub fn has_written(&self) -> bool {
        self.written.load(Ordering::Acquire)
    }

    /// Append the record for `dump_id` unless already done
    ///
    /// An unresolved or empty identity is skipped silently. Failures are
    /// logged, not returned, and release the guard so that a later completion
    /// notification can retry.
    #[instrument(skip(self, dump_id), fields(dump_id = %dump_id))]
    pub fn write_once(&self, dump_id: &DumpId, identity: Option<&str>) -> WriteOutcome {
        let Some(identity) = identity.filter(|id| !id.is_empty()) else {
            debug!("No test identity resolved, skipping lookup record");
            return WriteOutcome::Unresolved;
        };

        if self
            .written
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Lookup record already written");
            return WriteOutcome::AlreadyWritten;
        }

        let record = CorrelationRecord { dump_id, identity };
        match append_line(&self.lookup_file, &record.to_line()) {
            Ok(()) => {
                info!(
                    "Recorded dump {} for {} in {}",
                    dump_id,
                    identity,
                    self.lookup_file.display()
                );
                WriteOutcome::Written
            }
            Err(e) => {
                self.written.store(false, Ordering::Release);
                error!("{}", error_chain(&e));
                WriteOutcome::Failed
            }
        }
    }
}

fn append_line(path: &Path, line: &str) -> Result<(), RecordError> {
    let to_error = |source| RecordError::Append {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)?;
    file.write_all(line.as_bytes()).map_err(to_error)
}
