//! In-memory batch driver for uploaded files.
//!
//! Uploads arrive as `(filename, bytes)` pairs from an outer HTTP layer and
//! leave as named output images ready to be archived. Nothing here touches
//! the filesystem.

use std::collections::HashSet;
use std::path::Path;

use super::codec::OutputCodec;
use super::{CompositionDetails, ImageInput, ProcessOutcome, ProcessingEngine};
use crate::error::{BatchError, ProcessingWarning, SkipReason};
use crate::utils::{dedupe_filename, secure_filename, verbose_println};

/// One uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// A processed image with its final, unique name
#[derive(Debug, Clone)]
pub struct NamedOutput {
    /// Sanitized, deduplicated input name
    pub source_name: String,
    pub filename: String,
    pub codec: OutputCodec,
    pub bytes: Vec<u8>,
    pub details: CompositionDetails,
    pub warnings: Vec<ProcessingWarning>,
}

/// An upload that produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUpload {
    pub filename: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    pub outputs: Vec<NamedOutput>,
    pub skipped: Vec<SkippedUpload>,
}

impl UploadBatch {
    pub fn processed_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Hand the outputs over for archiving, or report that nothing was
    /// processed at all.
    pub fn into_outputs(self) -> Result<Vec<NamedOutput>, BatchError> {
        if self.outputs.is_empty() {
            return Err(BatchError::NothingProcessed {
                skipped: self.skipped.len(),
            });
        }
        Ok(self.outputs)
    }
}

impl ProcessingEngine {
    /// Process a set of uploads in arrival order.
    ///
    /// Uploads with an empty filename are ignored entirely. Other names are
    /// sanitized, then deduplicated among inputs; output names are
    /// deduplicated separately among outputs.
    pub fn process_uploads(&self, uploads: &[Upload]) -> UploadBatch {
        let mut batch = UploadBatch::default();
        let mut input_names = HashSet::new();
        let mut output_names = HashSet::new();

        for upload in uploads.iter().filter(|u| !u.filename.is_empty()) {
            let sanitized = secure_filename(&upload.filename);
            let source_name = dedupe_filename(&sanitized, &input_names);
            input_names.insert(source_name.clone());

            let input = ImageInput::Bytes {
                name: &source_name,
                data: &upload.data,
            };

            match self.process_one(input, None) {
                ProcessOutcome::Success(artifact) => {
                    let stem = Path::new(&source_name)
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("image");
                    let desired = format!("{}.{}", stem, artifact.codec.extension());
                    let filename = dedupe_filename(&desired, &output_names);
                    output_names.insert(filename.clone());

                    verbose_println(
                        self.config().verbose,
                        &format!("Processed upload {} -> {}", upload.filename, filename),
                    );
                    batch.outputs.push(NamedOutput {
                        source_name,
                        filename,
                        codec: artifact.codec,
                        bytes: artifact.bytes,
                        details: artifact.details,
                        warnings: artifact.warnings,
                    });
                }
                ProcessOutcome::Skipped(reason) => {
                    batch.skipped.push(SkippedUpload {
                        filename: upload.filename.clone(),
                        reason,
                    });
                }
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::tests::png_bytes;
    use crate::image_processing::{codec, Background, CanvasSpec, ProcessingConfig};

    fn web_engine(size: u32) -> ProcessingEngine {
        let spec = CanvasSpec::new(size, Background::Transparent).unwrap();
        ProcessingEngine::new(ProcessingConfig::web(spec))
    }

    #[test]
    fn test_empty_filenames_are_ignored() {
        let batch = web_engine(16).process_uploads(&[Upload::new("", png_bytes(4, 4))]);
        assert_eq!(batch.processed_count(), 0);
        assert_eq!(batch.skipped_count(), 0);
        assert_eq!(
            batch.into_outputs().unwrap_err(),
            BatchError::NothingProcessed { skipped: 0 }
        );
    }

    #[test]
    fn test_uploads_are_sanitized_and_deduplicated() {
        let uploads = vec![
            Upload::new("my photo.png", png_bytes(8, 8)),
            Upload::new("my photo.png", png_bytes(6, 6)),
            Upload::new("../my_photo.jpg", png_bytes(5, 5)),
        ];
        let batch = web_engine(16).process_uploads(&uploads);
        let outputs = batch.into_outputs().unwrap();

        let sources: Vec<_> = outputs.iter().map(|o| o.source_name.as_str()).collect();
        assert_eq!(sources, vec!["my_photo.png", "my_photo_1.png", "my_photo.jpg"]);

        let names: Vec<_> = outputs.iter().map(|o| o.filename.as_str()).collect();
        assert_eq!(names, vec!["my_photo.png", "my_photo_1.png", "my_photo_2.png"]);
        assert!(outputs.iter().all(|o| o.codec == OutputCodec::Png));
    }

    #[test]
    fn test_web_uploads_are_downscaled() {
        let batch = web_engine(20).process_uploads(&[Upload::new("wide.png", png_bytes(40, 10))]);
        let outputs = batch.into_outputs().unwrap();
        assert_eq!(outputs[0].details.placed_size, (20, 5));
        assert!(outputs[0].details.downscaled);

        let decoded = codec::decode(&outputs[0].bytes).unwrap();
        assert_eq!((decoded.pixels.width(), decoded.pixels.height()), (20, 20));
    }

    #[test]
    fn test_unsupported_and_broken_uploads_are_skipped() {
        let uploads = vec![
            Upload::new("notes.txt", b"hello".to_vec()),
            Upload::new("broken.jpg", b"not a jpeg".to_vec()),
        ];
        let batch = web_engine(16).process_uploads(&uploads);

        assert_eq!(batch.skipped_count(), 2);
        assert!(matches!(
            batch.skipped[0].reason,
            SkipReason::UnsupportedFormat { .. }
        ));
        assert!(matches!(batch.skipped[1].reason, SkipReason::DecodeFailure(_)));
        assert_eq!(
            batch.into_outputs().unwrap_err(),
            BatchError::NothingProcessed { skipped: 2 }
        );
    }
}
