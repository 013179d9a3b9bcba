use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::time::Instant;

use canvas_formatter::cli::Args;
use canvas_formatter::image_processing::batch::{BatchResult, FileRecord, FileStatus};
use canvas_formatter::image_processing::codec::OutputCodec;
use canvas_formatter::image_processing::report::ProcessingReport;
use canvas_formatter::image_processing::{Background, ProcessingConfig, ProcessingEngine};
use canvas_formatter::json_output::JsonMessage;
use canvas_formatter::utils::{
    create_progress_bar, error_println, format_duration, validate_inputs, verbose_println,
    warn_println,
};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let mut args = Args::parse();
    args.load_and_merge_config()?;

    if !args.json {
        println!("{}", style("Canvas Formatter").bold().blue());
        println!("{}", style("Lossless square canvas composition").dim());
        println!();
    }

    validate_inputs(&args)?;
    let config = args
        .processing_config()
        .context("Invalid canvas configuration")?;

    if config.verbose {
        print_configuration(&config, &args);
    }

    let engine = ProcessingEngine::new(config);

    let all_ok = if args.input.is_file() {
        process_single(&engine, &args, start_time)?
    } else {
        process_folder(&engine, &args, start_time)?
    };

    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}

fn print_configuration(config: &ProcessingConfig, args: &Args) {
    println!("{}", style("Configuration:").bold());
    let size = config.canvas.size();
    println!("  Canvas size: {}x{}", size, size);
    match config.canvas.background() {
        Background::Transparent => println!("  Background: transparent"),
        Background::Solid(color) => println!(
            "  Background: #{:02x}{:02x}{:02x}",
            color[0], color[1], color[2]
        ),
    }
    println!(
        "  Oversized images: {}",
        if config.allow_downscale {
            "scaled down to fit"
        } else {
            "skipped"
        }
    );
    println!(
        "  Metadata: {}",
        if config.preserve_metadata {
            "EXIF and ICC profile preserved"
        } else {
            "stripped"
        }
    );
    if args.input.is_dir() {
        println!("  Folder output format: {:?}", args.format);
    }
    if args.dry_run {
        println!("  Dry run mode: enabled (simulation only - no files will be created)");
    }
    println!();
}

/// Output path for single-file mode: unknown extensions fall back to `.png`
fn single_output_path(output: &Path) -> PathBuf {
    let keep = output
        .extension()
        .and_then(|e| e.to_str())
        .map(OutputCodec::is_output_extension)
        .unwrap_or(false);
    if keep {
        output.to_path_buf()
    } else {
        output.with_extension(OutputCodec::Png.extension())
    }
}

fn process_single(engine: &ProcessingEngine, args: &Args, start_time: Instant) -> Result<bool> {
    let output = single_output_path(&args.output);
    if output != args.output && !args.json {
        warn_println(&format!(
            "Output extension not supported, writing {} instead",
            output.display()
        ));
    }

    let record = engine.process_file(&args.input, &output, args.dry_run);
    let mut result = BatchResult::new();

    if args.json {
        JsonMessage::file_record(&record);
    } else {
        log_record(&record, args.dry_run);
    }
    result.record(record);

    finish(engine, args, &result, start_time);
    Ok(result.processed == 1)
}

fn process_folder(engine: &ProcessingEngine, args: &Args, start_time: Instant) -> Result<bool> {
    if !args.dry_run {
        std::fs::create_dir_all(&args.output).context("Failed to create output directory")?;
    } else {
        verbose_println(
            engine.config().verbose,
            "Dry run mode: Skipping output directory creation",
        );
    }

    let image_files = engine.discover_images(&args.input)?;
    if image_files.is_empty() {
        if args.json {
            JsonMessage::summary(0, 0, 0, start_time.elapsed().as_secs_f64());
        } else {
            println!("{}", style("No supported images found").red());
        }
        return Ok(true);
    }

    let total = image_files.len();
    let progress = if args.json {
        ProgressBar::hidden()
    } else {
        create_progress_bar(total as u64)
    };

    let result = engine.process_directory(
        &image_files,
        &args.output,
        args.format.into(),
        args.dry_run,
        &progress,
        |current, record| {
            if args.json {
                JsonMessage::file_record(record);
                JsonMessage::progress(current, total, "Processing images");
            } else {
                progress.suspend(|| log_record(record, args.dry_run));
            }
        },
    );
    progress.finish_with_message("✓ Processing complete!");

    finish(engine, args, &result, start_time);
    // Zero successes in folder mode is reported, not an error
    Ok(true)
}

fn log_record(record: &FileRecord, dry_run: bool) {
    let input = record.input_path.display();
    match &record.status {
        FileStatus::Processed {
            output_path,
            details,
            warnings,
            ..
        } => {
            let verb = if dry_run { "Would save" } else { "Saved" };
            let scaled = if details.downscaled { " (downscaled)" } else { "" };
            println!(
                "  {} {} → {} at {},{}{}",
                style("✓").green(),
                verb,
                style(output_path.display()).bold(),
                details.offset.0,
                details.offset.1,
                scaled
            );
            for warning in warnings {
                warn_println(&format!("{}: {}", input, warning));
            }
        }
        FileStatus::Skipped(reason) => {
            error_println(&format!("Skipping {}: {}", input, reason));
        }
    }
}

fn finish(engine: &ProcessingEngine, args: &Args, result: &BatchResult, start_time: Instant) {
    let total_time = start_time.elapsed();

    if args.json {
        JsonMessage::summary(
            result.total(),
            result.processed,
            result.skipped,
            total_time.as_secs_f64(),
        );
        return;
    }

    if args.report {
        ProcessingReport::from_batch(result, engine.config().canvas.size()).print(result);
    }

    println!();
    let header = if args.dry_run {
        style("Dry Run Results Summary:").bold().cyan()
    } else {
        style("Results Summary:").bold().green()
    };
    println!("{}", header);
    println!(
        "  {} processed, {} skipped",
        style(result.processed).bold().green(),
        style(result.skipped).bold().yellow()
    );
    if result.processed == 0 {
        println!("  {}", style("No images were processed successfully").yellow());
    }
    println!(
        "  Total processing time: {}",
        style(format_duration(total_time)).bold()
    );
}
