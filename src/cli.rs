use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "gmpchunk",
    version,
    about = "Local GMP / regulatory PDF extraction and chunking tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Chunk(ChunkArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "data")]
    pub pdf_root: PathBuf,

    #[arg(long, default_value = ".cache/gmpchunk")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ChunkBy {
    Auto,
    Paragraph,
    Sentence,
    Char,
    Structure,
}

impl ChunkBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Paragraph => "paragraph",
            Self::Sentence => "sentence",
            Self::Char => "char",
            Self::Structure => "structure",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    #[arg(long, default_value = "data")]
    pub pdf_root: PathBuf,

    /// Optional PDF archive; extracted into the work directory before discovery.
    #[arg(long)]
    pub zip: Option<PathBuf>,

    #[arg(long, default_value = ".cache/gmpchunk")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "chunks.jsonl")]
    pub out: PathBuf,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    #[arg(long, default_value_t = 1400)]
    pub chunk_size: usize,

    #[arg(long, default_value_t = 120)]
    pub overlap: usize,

    #[arg(long, value_enum, default_value_t = ChunkBy::Structure)]
    pub chunk_by: ChunkBy,

    #[arg(long, default_value_t = 1600)]
    pub oversized_unit_threshold: usize,

    #[arg(long, default_value_t = false)]
    pub jurisdiction_from_path: bool,

    /// JSONL map: path|filename|stem -> {source_url, doc_date, doc_version}.
    #[arg(long)]
    pub source_map: Option<PathBuf>,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,

    /// Worker threads for per-document processing; 0 uses all available cores.
    #[arg(long, default_value_t = 0)]
    pub workers: usize,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/gmpchunk")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "chunks.jsonl")]
    pub out: PathBuf,
}
