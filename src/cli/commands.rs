//! CLI commands and argument parsing

use crate::types::{ArrayPolicy, Compression, DriftPolicy, OutputMode, PathSelector};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Streaming JSON to Parquet converter
#[derive(Parser, Debug)]
#[command(name = "solidafy-stream")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Conversion options file (YAML or JSON); flags override it
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a JSON input into Parquet
    Convert {
        /// Input file, or `-` for stdin
        input: PathBuf,

        /// Output file (append mode) or file prefix (multi-file mode)
        output: PathBuf,

        /// Output mode
        #[arg(short, long)]
        mode: Option<OutputMode>,

        /// Compression codec (snappy, zstd, gzip, lz4, brotli, none)
        #[arg(long)]
        compression: Option<Compression>,

        /// What to do when a later batch does not fit the file schema
        #[arg(long)]
        drift_policy: Option<DriftPolicy>,

        /// Skip malformed NDJSON lines instead of failing
        #[arg(long)]
        skip_errors: bool,

        /// Write the conversion report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        input_args: InputArgs,
    },

    /// Print the schema inferred from the first records of an input
    Schema {
        /// Input file, or `-` for stdin
        input: PathBuf,

        /// Records to sample
        #[arg(long, default_value = "1000")]
        sample: usize,

        /// Skip malformed NDJSON lines instead of failing
        #[arg(long)]
        skip_errors: bool,

        #[command(flatten)]
        input_args: InputArgs,
    },
}

/// Options shared by commands that read and flatten records
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Where records live: `top_level_array`, `ndjson` or `key_path:<a.b.c>`
    #[arg(short, long)]
    pub path_selector: Option<PathSelector>,

    /// Records per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// How arrays are flattened (explode, opaque)
    #[arg(short, long)]
    pub array_policy: Option<ArrayPolicy>,

    /// Separator between nested key segments
    #[arg(long)]
    pub separator: Option<String>,

    /// Nesting depth past which values are kept as JSON text
    #[arg(long)]
    pub max_depth: Option<usize>,
}
