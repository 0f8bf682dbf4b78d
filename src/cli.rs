//! Command-line interface

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::domain::FileSpec;
use crate::formats;

/// Convert files using the OpenConvert agent network
#[derive(Parser, Debug, Clone)]
#[command(
    name = "openconvert",
    version,
    about,
    after_help = "Examples:
  openconvert input.txt output.pdf
  openconvert -i docs/ -o converted/ --from text/plain --to application/pdf
  openconvert data.csv report.pdf --prompt \"Create a formatted report\"
  openconvert --list-formats"
)]
pub struct Cli {
    /// Input file path (alternative to -i/--input)
    pub input_file: Option<PathBuf>,

    /// Output file path (alternative to -o/--output)
    pub output_file: Option<PathBuf>,

    /// Input file or directory path
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file or directory path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Source MIME type (auto-detected from the input extension if omitted)
    #[arg(long = "from", value_name = "MIME")]
    pub from_format: Option<String>,

    /// Target MIME type (auto-detected from the output extension if omitted)
    #[arg(long = "to", value_name = "MIME")]
    pub to_format: Option<String>,

    /// Additional instructions for the conversion
    #[arg(long)]
    pub prompt: Option<String>,

    /// Network host
    #[arg(long, env = "OPENCONVERT_HOST")]
    pub host: Option<String>,

    /// Network port
    #[arg(long, env = "OPENCONVERT_PORT")]
    pub port: Option<u16>,

    /// Per-file response timeout in seconds
    #[arg(long, env = "OPENCONVERT_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Path to the configuration file
    #[arg(long, env = "OPENCONVERT_CONFIG", default_value = "openconvert.toml")]
    pub config: PathBuf,

    /// List all conversions currently offered by the network
    #[arg(long)]
    pub list_formats: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Input path, with the positional argument taking precedence.
    pub fn effective_input(&self) -> Option<&Path> {
        self.input_file
            .as_deref()
            .or(self.input.as_deref())
    }

    /// Output path, with the positional argument taking precedence.
    pub fn effective_output(&self) -> Option<&Path> {
        self.output_file
            .as_deref()
            .or(self.output.as_deref())
    }

    /// Expand the arguments into per-file conversion jobs.
    ///
    /// Validation errors (missing paths, a directory input without explicit
    /// formats, no matching files) surface here so the caller can exit with
    /// an argument error.
    pub fn collect_jobs(&self) -> anyhow::Result<Vec<FileSpec>> {
        let input = self
            .effective_input()
            .ok_or_else(|| anyhow::anyhow!("input and output are required for conversion"))?;
        let output = self
            .effective_output()
            .ok_or_else(|| anyhow::anyhow!("input and output are required for conversion"))?;

        if !input.exists() {
            anyhow::bail!("input path does not exist: {}", input.display());
        }
        if input.is_dir() && (self.from_format.is_none() || self.to_format.is_none()) {
            anyhow::bail!(
                "when input is a directory, --from and --to formats must be specified"
            );
        }

        let files = formats::collect_input_files(input, self.from_format.as_deref());
        if files.is_empty() {
            anyhow::bail!("no input files found to process");
        }

        let is_batch = files.len() > 1;
        let jobs = files
            .into_iter()
            .map(|file| {
                let source_format = self
                    .from_format
                    .clone()
                    .unwrap_or_else(|| formats::detect(&file));
                let target_format = self
                    .to_format
                    .clone()
                    .unwrap_or_else(|| formats::detect(output));
                let planned = formats::plan_output_path(&file, output, &target_format, is_batch);
                FileSpec {
                    input: file,
                    output: planned,
                    source_format,
                    target_format,
                    prompt: self.prompt.clone(),
                }
            })
            .collect();
        Ok(jobs)
    }
}
