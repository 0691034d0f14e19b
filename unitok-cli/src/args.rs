//! Command-line argument definitions

use clap::{Args, ValueEnum};
use std::path::PathBuf;
use unitok_core::AnnotationFormat;

/// Annotation output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AnnotationFormatArg {
    /// JSON array of per-line chart objects
    Json,
    /// `::line N ::s ...` text form, one token per line
    DoubleColon,
}

impl From<AnnotationFormatArg> for AnnotationFormat {
    fn from(value: AnnotationFormatArg) -> Self {
        match value {
            AnnotationFormatArg::Json => AnnotationFormat::Json,
            AnnotationFormatArg::DoubleColon => AnnotationFormat::DoubleColon,
        }
    }
}

/// Arguments for the `utokenize` binary
#[derive(Debug, Args)]
pub struct TokenizeArgs {
    /// Input file (default: STDIN)
    #[arg(short, long, value_name = "INPUT-FILENAME")]
    pub input: Option<PathBuf>,

    /// Output file (default: STDOUT)
    #[arg(short, long, value_name = "OUTPUT-FILENAME")]
    pub output: Option<PathBuf>,

    /// Annotation output file (optional)
    #[arg(short, long, value_name = "ANNOTATION-FILENAME")]
    pub annotation: Option<PathBuf>,

    /// Annotation format
    #[arg(long, alias = "annotation_format", value_enum, default_value = "json")]
    pub annotation_format: AnnotationFormatArg,

    /// Resource data directory (default: bundled data)
    #[arg(short, long, value_name = "DATA-DIR")]
    pub data_dir: Option<PathBuf>,

    /// ISO 639-3 language code(s), e.g. 'fas' for Persian
    #[arg(long = "lc", value_name = "LANGUAGE-CODE")]
    pub lang_code: Option<String>,

    /// First token is a line ID, exempt from tokenization
    #[arg(short, long)]
    pub first_token_is_line_id: bool,

    /// Suppress MT-style markup such as @-@ (can degrade detokenization)
    #[arg(long)]
    pub simple: bool,

    /// Build annotation charts even without an annotation file
    #[arg(short, long)]
    pub chart: bool,

    /// Shard lines across worker threads (disabled with -a)
    #[arg(short, long)]
    pub parallel: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments for the `detokenize` binary
#[derive(Debug, Args)]
pub struct DetokenizeArgs {
    /// Input file (default: STDIN)
    #[arg(short, long, value_name = "INPUT-FILENAME")]
    pub input: Option<PathBuf>,

    /// Output file (default: STDOUT)
    #[arg(short, long, value_name = "OUTPUT-FILENAME")]
    pub output: Option<PathBuf>,

    /// Resource data directory (default: bundled data)
    #[arg(short, long, value_name = "DATA-DIR")]
    pub data_dir: Option<PathBuf>,

    /// ISO 639-3 language code(s)
    #[arg(long = "lc", value_name = "LANGUAGE-CODE")]
    pub lang_code: Option<String>,

    /// First token is a line ID, exempt from detokenization
    #[arg(short, long)]
    pub first_token_is_line_id: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
