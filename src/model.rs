use serde::{Deserialize, Serialize};

/// Coarse classification of how obligatory a passage's language is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NormativeStrength {
    Must,
    Should,
    May,
}

/// One retrievable chunk, serialized as a single JSON-lines record.
/// Optional fields serialize as explicit null so downstream consumers can
/// distinguish "not detected" from schema drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub doc_id: String,
    pub source_path: String,
    pub title: String,
    pub jurisdiction: Option<String>,
    pub doc_date: Option<String>,
    pub doc_version: Option<String>,
    pub source_url: Option<String>,
    pub section_id: Option<String>,
    pub section_title: Option<String>,
    pub normative_strength: Option<NormativeStrength>,
    pub page_start: i64,
    pub page_end: i64,
    pub chunk_index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfEntry {
    pub filename: String,
    pub relative_path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub pdf_count: usize,
    pub pdfs: Vec<PdfEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub rustc: String,
    pub cargo: String,
    pub pdftotext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRunPaths {
    pub pdf_root: String,
    pub cache_root: String,
    pub manifest_dir: String,
    pub inventory_manifest_path: String,
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRunConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub chunk_by: String,
    pub oversized_unit_threshold: usize,
    pub jurisdiction_from_path: bool,
    pub workers: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkRunCounts {
    pub pdf_count: usize,
    pub processed_pdf_count: usize,
    pub failed_pdf_count: usize,
    pub empty_doc_count: usize,
    pub chunks_total: usize,
    pub sectioned_chunk_count: usize,
    pub unsectioned_chunk_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: ChunkRunPaths,
    pub config: ChunkRunConfig,
    pub counts: ChunkRunCounts,
    pub source_hashes: Vec<PdfEntry>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}
