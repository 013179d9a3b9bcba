//! Processing report for the `--report` flag
//!
//! Renders one table for images that were placed on the canvas and one for
//! images that were skipped, followed by a short summary.

use prettytable::{format, Cell, Row, Table};
use std::path::Path;

use super::batch::{BatchResult, FileRecord, FileStatus};
use super::orientation::ExifOrientation;
use crate::utils::format_duration;

/// Single processed image entry for the report
#[derive(Debug, Clone)]
pub struct ProcessedEntry {
    pub input_filename: String,
    pub output_filename: String,
    pub source_size: (u32, u32),
    pub placed_size: (u32, u32),
    pub offset: (u32, u32),
    pub orientation: ExifOrientation,
    pub downscaled: bool,
    pub warnings: Vec<String>,
}

/// Single skipped image entry for the report
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub input_filename: String,
    pub label: &'static str,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ProcessingReport {
    pub processed: Vec<ProcessedEntry>,
    pub skipped: Vec<SkippedEntry>,
    pub canvas_size: u32,
}

impl ProcessingReport {
    pub fn new(canvas_size: u32) -> Self {
        Self {
            canvas_size,
            ..Self::default()
        }
    }

    pub fn from_batch(result: &BatchResult, canvas_size: u32) -> Self {
        let mut report = Self::new(canvas_size);
        for record in &result.records {
            report.add_record(record);
        }
        report
    }

    pub fn add_record(&mut self, record: &FileRecord) {
        let input_filename = extract_filename(&record.input_path);
        match &record.status {
            FileStatus::Processed {
                output_path,
                details,
                warnings,
                ..
            } => self.processed.push(ProcessedEntry {
                input_filename,
                output_filename: extract_filename(output_path),
                source_size: details.source_size,
                placed_size: details.placed_size,
                offset: details.offset,
                orientation: details.orientation,
                downscaled: details.downscaled,
                warnings: warnings.iter().map(|w| w.to_string()).collect(),
            }),
            FileStatus::Skipped(reason) => self.skipped.push(SkippedEntry {
                input_filename,
                label: reason.label(),
                reason: reason.to_string(),
            }),
        }
    }

    /// Table of processed images
    pub fn processed_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.add_row(Row::new(vec![
            Cell::new("Input"),
            Cell::new("Output"),
            Cell::new("Source"),
            Cell::new("Placed"),
            Cell::new("Offset"),
            Cell::new("Rot."),
            Cell::new("Scaled"),
            Cell::new("Warnings"),
        ]));

        for entry in &self.processed {
            let rotation_check = if entry.orientation.needs_transform() { "✓" } else { "✗" };
            let scaled_check = if entry.downscaled { "✓" } else { "✗" };
            table.add_row(Row::new(vec![
                Cell::new(&truncate(&entry.input_filename, 25)),
                Cell::new(&truncate(&entry.output_filename, 25)),
                Cell::new(&format!("{}x{}", entry.source_size.0, entry.source_size.1)),
                Cell::new(&format!("{}x{}", entry.placed_size.0, entry.placed_size.1)),
                Cell::new(&format!("{},{}", entry.offset.0, entry.offset.1)),
                Cell::new(rotation_check),
                Cell::new(scaled_check),
                Cell::new(&entry.warnings.len().to_string()),
            ]));
        }
        table
    }

    /// Table of skipped images
    pub fn skipped_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.add_row(Row::new(vec![
            Cell::new("Input"),
            Cell::new("Reason"),
            Cell::new("Details"),
        ]));

        for entry in &self.skipped {
            table.add_row(Row::new(vec![
                Cell::new(&truncate(&entry.input_filename, 25)),
                Cell::new(entry.label),
                Cell::new(&truncate(&entry.reason, 60)),
            ]));
        }
        table
    }

    /// Print the complete report
    pub fn print(&self, result: &BatchResult) {
        println!(
            "\nCANVAS REPORT ({}x{})\n",
            self.canvas_size, self.canvas_size
        );

        if !self.processed.is_empty() {
            println!("PROCESSED IMAGES ({} total)\n", self.processed.len());
            self.processed_table().printstd();
            println!();
        }

        if !self.skipped.is_empty() {
            println!("SKIPPED IMAGES ({} total)\n", self.skipped.len());
            self.skipped_table().printstd();
            println!();
        }

        let rotated = self
            .processed
            .iter()
            .filter(|e| e.orientation.needs_transform())
            .count();
        let downscaled = self.processed.iter().filter(|e| e.downscaled).count();

        println!("Summary:");
        println!("   • Total images: {}", result.total());
        println!(
            "   • Processed: {} ({:.1}%)",
            result.processed,
            result.success_rate()
        );
        println!("   • Skipped: {}", result.skipped);
        println!("   • Rotated from EXIF: {}", rotated);
        println!("   • Downscaled: {}", downscaled);
        println!("   • Warnings: {}", result.warning_count());
        println!(
            "   • Time spent in pipeline: {}",
            format_duration(result.total_duration)
        );
        println!();
    }
}

/// Truncate string to fit in column
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

/// Helper to extract filename from path
pub fn extract_filename(path: &Path) -> String {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProcessingWarning, SkipReason};
    use crate::image_processing::codec::OutputCodec;
    use crate::image_processing::CompositionDetails;
    use std::path::PathBuf;
    use std::time::Duration;

    fn sample_batch() -> BatchResult {
        let mut result = BatchResult::new();
        result.record(FileRecord {
            input_path: PathBuf::from("in/beach.jpg"),
            status: FileStatus::Processed {
                output_path: PathBuf::from("out/beach.png"),
                codec: OutputCodec::Png,
                details: CompositionDetails {
                    source_size: (2000, 1000),
                    placed_size: (1200, 600),
                    offset: (0, 300),
                    orientation: ExifOrientation::RightTop,
                    downscaled: true,
                },
                warnings: vec![ProcessingWarning::OrientationReadFailure("x".to_string())],
            },
            duration: Duration::from_millis(40),
        });
        result.record(FileRecord {
            input_path: PathBuf::from("in/huge.png"),
            status: FileStatus::Skipped(SkipReason::OversizedInput {
                width: 5000,
                height: 10,
                canvas: 1200,
            }),
            duration: Duration::from_millis(3),
        });
        result
    }

    #[test]
    fn test_report_from_batch() {
        let report = ProcessingReport::from_batch(&sample_batch(), 1200);
        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.processed[0].output_filename, "beach.png");
        assert_eq!(report.skipped[0].label, "oversized");
    }

    #[test]
    fn test_tables_contain_entries() {
        let report = ProcessingReport::from_batch(&sample_batch(), 1200);

        let processed = report.processed_table();
        assert_eq!(processed.len(), 2);
        let rendered = processed.to_string();
        assert!(rendered.contains("beach.jpg"));
        assert!(rendered.contains("1200x600"));
        assert!(rendered.contains("0,300"));

        let skipped = report.skipped_table().to_string();
        assert!(skipped.contains("huge.png"));
        assert!(skipped.contains("oversized"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("ééééééé", 4), "ééé…");
    }
}
