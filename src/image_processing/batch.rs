use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::codec::OutputCodec;
use super::{CompositionDetails, ImageInput, OutputPolicy, ProcessOutcome, ProcessingEngine};
use crate::error::{ProcessingWarning, SkipReason};
use crate::utils::{dedupe_filename, verbose_println};

/// Final state of one input file
#[derive(Debug, Clone)]
pub enum FileStatus {
    Processed {
        output_path: PathBuf,
        codec: OutputCodec,
        details: CompositionDetails,
        warnings: Vec<ProcessingWarning>,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone)]
pub struct FileRecord {
    pub input_path: PathBuf,
    pub status: FileStatus,
    pub duration: Duration,
}

impl FileRecord {
    pub fn is_processed(&self) -> bool {
        matches!(self.status, FileStatus::Processed { .. })
    }
}

/// Counters and per-file records for a run
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub processed: usize,
    pub skipped: usize,
    pub records: Vec<FileRecord>,
    pub total_duration: Duration,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: FileRecord) {
        if record.is_processed() {
            self.processed += 1;
        } else {
            self.skipped += 1;
        }
        self.total_duration += record.duration;
        self.records.push(record);
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped
    }

    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            (self.processed as f64 / self.total() as f64) * 100.0
        }
    }

    pub fn warning_count(&self) -> usize {
        self.records
            .iter()
            .map(|record| match &record.status {
                FileStatus::Processed { warnings, .. } => warnings.len(),
                FileStatus::Skipped(_) => 0,
            })
            .sum()
    }
}

impl OutputPolicy {
    /// Codec used for a batch run where the user asked for `requested`
    pub fn resolve_requested(&self, requested: OutputCodec) -> OutputCodec {
        match self {
            OutputPolicy::Fixed(codec) => *codec,
            OutputPolicy::FromDestination => requested,
        }
    }
}

impl ProcessingEngine {
    /// Process a single file and write the result to `output_path`.
    ///
    /// The output is encoded fully in memory first; a failed write removes
    /// the partially written file and is reported as a skip.
    pub fn process_file(&self, input_path: &Path, output_path: &Path, dry_run: bool) -> FileRecord {
        let start = Instant::now();

        let status = match self.process_one(ImageInput::Path(input_path), Some(output_path)) {
            ProcessOutcome::Success(artifact) => {
                let written = if dry_run {
                    verbose_println(
                        self.config().verbose,
                        &format!("Dry run: would write {}", output_path.display()),
                    );
                    Ok(())
                } else {
                    write_output(output_path, &artifact.bytes)
                };

                match written {
                    Ok(()) => FileStatus::Processed {
                        output_path: output_path.to_path_buf(),
                        codec: artifact.codec,
                        details: artifact.details,
                        warnings: artifact.warnings,
                    },
                    Err(e) => FileStatus::Skipped(SkipReason::WriteFailure(format!("{:#}", e))),
                }
            }
            ProcessOutcome::Skipped(reason) => FileStatus::Skipped(reason),
        };

        FileRecord {
            input_path: input_path.to_path_buf(),
            status,
            duration: start.elapsed(),
        }
    }

    /// Process every file into `output_dir` as `<stem>.<ext>`.
    ///
    /// Output names are deduplicated within the run, so `a.jpg` and `a.png`
    /// land in `a.png` and `a_1.png`. `on_record` is called after each file.
    pub fn process_directory<F>(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
        requested: OutputCodec,
        dry_run: bool,
        progress: &ProgressBar,
        mut on_record: F,
    ) -> BatchResult
    where
        F: FnMut(usize, &FileRecord),
    {
        let codec = self.config().output_policy.resolve_requested(requested);
        let mut used_names = HashSet::new();
        let mut result = BatchResult::new();

        for (index, input_path) in files.iter().enumerate() {
            let stem = input_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("image");
            progress.set_message(stem.to_string());

            let desired = format!("{}.{}", stem, codec.extension());
            let output_name = dedupe_filename(&desired, &used_names);
            used_names.insert(output_name.clone());

            let record = self.process_file(input_path, &output_dir.join(&output_name), dry_run);
            on_record(index + 1, &record);
            result.record(record);
            progress.inc(1);
        }

        result
    }
}

fn write_output(output_path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory {}", parent.display())
            })?;
        }
    }

    if let Err(e) = std::fs::write(output_path, bytes) {
        if output_path.is_file() {
            let _ = std::fs::remove_file(output_path);
        }
        return Err(e).with_context(|| format!("Failed to write {}", output_path.display()));
    }

    Ok(())
}
