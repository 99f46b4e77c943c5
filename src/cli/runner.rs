//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, InputArgs};
use crate::config::ConvertOptions;
use crate::engine::{sample_schema, ConversionReport, Converter};
use crate::error::{Error, Result, ResultExt};
use crate::output::OutputTarget;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Input path meaning standard input
const STDIN: &str = "-";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Convert {
                input,
                output,
                mode,
                compression,
                drift_policy,
                skip_errors,
                report,
                input_args,
            } => {
                let mut options = self.base_options(input_args)?;
                if let Some(mode) = mode {
                    options.mode = *mode;
                }
                if let Some(compression) = compression {
                    options.compression = *compression;
                }
                if let Some(policy) = drift_policy {
                    options.drift_policy = *policy;
                }
                if *skip_errors {
                    options.skip_on_error = true;
                }
                self.convert(input, output, &options, report.as_deref())
            }
            Commands::Schema {
                input,
                sample,
                skip_errors,
                input_args,
            } => {
                let mut options = self.base_options(input_args)?;
                if *skip_errors {
                    options.skip_on_error = true;
                }
                self.schema(input, &options, *sample)
            }
        }
    }

    /// Options from the config file, if any, with flags applied on top
    fn base_options(&self, args: &InputArgs) -> Result<ConvertOptions> {
        let mut options = match &self.cli.config {
            Some(path) => {
                debug!(path = %path.display(), "Loading options file");
                ConvertOptions::from_file(path)?
            }
            None => ConvertOptions::default(),
        };

        if let Some(selector) = &args.path_selector {
            options.path_selector = selector.clone();
        }
        if let Some(size) = args.batch_size {
            options.batch_size = size;
        }
        if let Some(policy) = args.array_policy {
            options.array_policy = policy;
        }
        if let Some(separator) = &args.separator {
            options.separator.clone_from(separator);
        }
        if let Some(depth) = args.max_depth {
            options.max_depth = depth;
        }

        options.validate()?;
        Ok(options)
    }

    /// Run a conversion
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        options: &ConvertOptions,
        report_path: Option<&Path>,
    ) -> Result<()> {
        let target = OutputTarget::new(options.mode, output);
        info!(
            input = %input.display(),
            output = %target,
            selector = %options.path_selector,
            batch_size = options.batch_size,
            "Converting"
        );

        let reader = open_input(input)?;
        let report = Converter::new(options.clone()).run(reader, &target)?;

        if let Some(path) = report_path {
            write_report(path, &report)?;
        }
        Ok(())
    }

    /// Print the inferred schema
    fn schema(&self, input: &Path, options: &ConvertOptions, sample: usize) -> Result<()> {
        let reader = open_input(input)?;
        let schema = sample_schema(reader, options, sample)?;
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        Ok(())
    }
}

/// Open a file, or stdin for `-`
fn open_input(input: &Path) -> Result<Box<dyn BufRead>> {
    if input.as_os_str() == STDIN {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(input).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::FileNotFound {
            path: input.display().to_string(),
        },
        _ => Error::Io(e),
    })?;
    Ok(Box::new(BufReader::with_capacity(256 * 1024, file)))
}

/// Write the report as pretty JSON
fn write_report(path: &Path, report: &ConversionReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    debug!(path = %path.display(), "Wrote conversion report");
    Ok(())
}
