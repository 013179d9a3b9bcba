use crate::cli::{Args, OutputFormat};
use crate::image_processing::DEFAULT_CANVAS_SIZE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// JSON configuration file format
///
/// ```json
/// { "canvasSize": 1080, "background": "#ffffff", "allowDownscale": true,
///   "outputFormat": "webp", "preserveMetadata": false }
/// ```
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub canvas_size: Option<u32>,
    /// Hex color or "transparent"
    pub background: Option<String>,
    pub allow_downscale: Option<bool>,
    pub output_format: Option<String>,
    pub preserve_metadata: Option<bool>,
}

impl Args {
    /// Load configuration from a JSON file and merge with command-line arguments
    /// Command-line arguments take precedence over config file values
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let contents = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: ConfigFile = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            let args_from_cli = std::env::args().collect::<Vec<_>>();
            self.merge_from_config(config, &args_from_cli)?;

            if self.verbose && !self.json {
                eprintln!("Loaded configuration from: {:?}", config_path);
            }
        }
        Ok(())
    }

    fn merge_from_config(&mut self, config: ConfigFile, args_from_cli: &[String]) -> Result<()> {
        let given = |names: &[&str]| {
            args_from_cli
                .iter()
                .any(|a| names.iter().any(|n| a == n || a.starts_with(&format!("{}=", n))))
        };

        if !given(&["-s", "--size"]) && self.size == DEFAULT_CANVAS_SIZE {
            if let Some(size) = config.canvas_size {
                self.size = size;
            }
        }

        if self.background.is_none() {
            self.background = config.background;
        }

        if !given(&["--format"]) {
            if let Some(format) = config.output_format {
                self.format = match format.to_lowercase().as_str() {
                    "png" => OutputFormat::Png,
                    "webp" => OutputFormat::Webp,
                    other => {
                        return Err(anyhow::anyhow!(
                            "Invalid outputFormat '{}' in config file. Valid formats: png, webp",
                            other
                        ))
                    }
                };
            }
        }

        // Boolean flags - only apply if currently false (default)
        if !self.downscale {
            self.downscale = config.allow_downscale.unwrap_or(false);
        }

        if !self.strip_metadata {
            if let Some(preserve) = config.preserve_metadata {
                self.strip_metadata = !preserve;
            }
        }

        Ok(())
    }
}
