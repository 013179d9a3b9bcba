use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::cli::Args;
use crate::image_processing::codec;

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg} ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Validate command line arguments before any image is touched
pub fn validate_inputs(args: &Args) -> Result<()> {
    if !args.input.exists() {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            args.input.display()
        ));
    }
    if !args.input.is_dir() && !args.input.is_file() {
        return Err(anyhow::anyhow!(
            "Input path is neither a file nor a directory: {}",
            args.input.display()
        ));
    }

    if args.input.is_file() {
        let supported = get_file_extension(&args.input)
            .map(|ext| codec::is_supported_extension(&ext))
            .unwrap_or(false);
        if !supported {
            return Err(anyhow::anyhow!(
                "Unsupported file format: {}. Supported formats: {}",
                args.input.display(),
                codec::SUPPORTED_EXTENSIONS.join(", ")
            ));
        }
    } else if args.output.is_file() {
        return Err(anyhow::anyhow!(
            "Output must be a directory when input is a directory: {}",
            args.output.display()
        ));
    }

    if args.size == 0 {
        return Err(anyhow::anyhow!(
            "Canvas size must be a positive integer, got: {}",
            args.size
        ));
    }

    Ok(())
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file has one of the specified extensions
pub fn has_valid_extension(path: &Path, extensions: &[&str]) -> bool {
    if let Some(ext) = get_file_extension(path) {
        extensions.contains(&ext.as_str())
    } else {
        false
    }
}

/// Reduce a client-supplied filename to a safe flat name.
///
/// Path separators and whitespace runs become a single `_`, anything outside
/// ASCII letters, digits, `_`, `.` and `-` is dropped, and leading/trailing
/// dots and underscores are trimmed. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Pick a filename that is not in `existing`.
///
/// `photo.png` becomes `photo_1.png`, then `photo_2.png`, and so on; the
/// extension is kept as-is.
pub fn dedupe_filename(desired: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(desired) {
        return desired.to_string();
    }

    let path = Path::new(desired);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(desired);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    (1..)
        .map(|counter| format!("{}_{}{}", stem, counter, extension))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or_else(|| desired.to_string())
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        println!("{} {}", style("[VERBOSE]").dim(), message);
    }
}

/// Print warning message
pub fn warn_println(message: &str) {
    println!("{} {}", style("[WARNING]").yellow().bold(), message);
}

/// Print error message
pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}
