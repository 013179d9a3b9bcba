//! JSON output for machine consumers
//!
//! When the --json flag is enabled, all progress and status information
//! is emitted as JSON lines to stdout, suppressing all other output.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::image_processing::batch::{FileRecord, FileStatus};

/// Last progress emission timestamp (milliseconds since epoch)
/// Used for throttling progress updates to ~25 FPS (40ms between updates)
static LAST_PROGRESS_MS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// Image placed on the canvas and written
    FileCompleted {
        input_path: String,
        output_path: String,
        offset: (u32, u32),
        placed_size: (u32, u32),
        downscaled: bool,
        processing_time_ms: u128,
    },
    /// Image produced no output
    FileSkipped {
        input_path: String,
        reason: String,
        message: String,
    },
    /// Non-fatal problem with a processed image
    Warning { input_path: String, message: String },
    /// Processing summary
    Summary {
        total_files: usize,
        processed: usize,
        skipped: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Serialize to a single JSON line
    pub fn to_line(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Some(json) = self.to_line() {
            println!("{}", json);
        }
    }

    /// Create and emit progress message (throttled to ~25 FPS)
    ///
    /// The final progress (current == total) is always emitted to ensure 100% completion.
    pub fn progress(current: usize, total: usize, message: impl Into<String>) {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let last_ms = LAST_PROGRESS_MS.load(Ordering::Relaxed);

        if now_ms.saturating_sub(last_ms) >= 40 || current == total {
            LAST_PROGRESS_MS.store(now_ms, Ordering::Relaxed);
            Self::Progress {
                current,
                total,
                message: message.into(),
            }
            .emit();
        }
    }

    /// Messages describing one finished file: the outcome followed by any warnings
    pub fn for_record(record: &FileRecord) -> Vec<JsonMessage> {
        let input_path = display(&record.input_path);
        match &record.status {
            FileStatus::Processed {
                output_path,
                details,
                warnings,
                ..
            } => {
                let mut messages = vec![Self::FileCompleted {
                    input_path: input_path.clone(),
                    output_path: display(output_path),
                    offset: details.offset,
                    placed_size: details.placed_size,
                    downscaled: details.downscaled,
                    processing_time_ms: record.duration.as_millis(),
                }];
                messages.extend(warnings.iter().map(|warning| Self::Warning {
                    input_path: input_path.clone(),
                    message: warning.to_string(),
                }));
                messages
            }
            FileStatus::Skipped(reason) => vec![Self::FileSkipped {
                input_path,
                reason: reason.label().to_string(),
                message: reason.to_string(),
            }],
        }
    }

    /// Create and emit the messages for a finished file
    pub fn file_record(record: &FileRecord) {
        for message in Self::for_record(record) {
            message.emit();
        }
    }

    /// Create and emit summary message
    pub fn summary(total_files: usize, processed: usize, skipped: usize, duration_secs: f64) {
        Self::Summary {
            total_files,
            processed,
            skipped,
            duration_secs,
        }
        .emit();
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProcessingWarning, SkipReason};
    use crate::image_processing::codec::OutputCodec;
    use crate::image_processing::orientation::ExifOrientation;
    use crate::image_processing::CompositionDetails;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_message_is_tagged() {
        let line = JsonMessage::Summary {
            total_files: 3,
            processed: 2,
            skipped: 1,
            duration_secs: 0.5,
        }
        .to_line()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "summary");
        assert_eq!(value["processed"], 2);
    }

    #[test]
    fn test_for_record_processed_with_warning() {
        let record = FileRecord {
            input_path: PathBuf::from("in/a.jpg"),
            status: FileStatus::Processed {
                output_path: PathBuf::from("out/a.png"),
                codec: OutputCodec::Png,
                details: CompositionDetails {
                    source_size: (10, 10),
                    placed_size: (10, 10),
                    offset: (5, 5),
                    orientation: ExifOrientation::Undefined,
                    downscaled: false,
                },
                warnings: vec![ProcessingWarning::OrientationReadFailure("bad".to_string())],
            },
            duration: Duration::from_millis(12),
        };

        let messages = JsonMessage::for_record(&record);
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            &messages[0],
            JsonMessage::FileCompleted { offset: (5, 5), processing_time_ms: 12, .. }
        ));
        assert!(matches!(&messages[1], JsonMessage::Warning { .. }));

        let value: serde_json::Value =
            serde_json::from_str(&messages[0].to_line().unwrap()).unwrap();
        assert_eq!(value["type"], "filecompleted");
    }

    #[test]
    fn test_for_record_skipped() {
        let record = FileRecord {
            input_path: PathBuf::from("in/b.gif"),
            status: FileStatus::Skipped(SkipReason::UnsupportedFormat {
                name: "in/b.gif".to_string(),
            }),
            duration: Duration::ZERO,
        };
        let messages = JsonMessage::for_record(&record);
        assert_eq!(
            messages,
            vec![JsonMessage::FileSkipped {
                input_path: "in/b.gif".to_string(),
                reason: "unsupported".to_string(),
                message: "unsupported file format: in/b.gif".to_string(),
            }]
        );
    }
}
