use anyhow::{Result, bail};
use regex::Regex;

use crate::model::{ChunkRecord, NormativeStrength};

mod metadata;
mod normalize;
mod pages;
mod sections;
mod subclause;
#[cfg(test)]
mod tests;
mod window;

pub use metadata::{MetadataPatterns, infer_jurisdiction};
pub use normalize::TextNormalizer;
pub use pages::PageMap;
pub use sections::HeadingGrammar;

use metadata::extract_doc_date_and_version;
use normalize::strip_repeating_edge_lines;
use sections::detect_sections;
use subclause::split_oversized_units;
use window::{GenericChunk, generic_chunks, window_units};

/// A unit passes through windowing untouched when it is at most this factor
/// over the target size.
pub const SINGLE_UNIT_TOLERANCE: f64 = 1.1;
/// Paragraphs over this factor of the target size get refined into sentences
/// in auto mode.
pub const SENTENCE_REFINE_TOLERANCE: f64 = 1.2;
/// Packed chunks over this factor are force-sliced as a last resort.
pub const FORCED_SLICE_TOLERANCE: f64 = 1.5;
/// Sentence fragments shorter than this merge into the following fragment.
pub const MIN_SENTENCE_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMode {
    Auto,
    Paragraph,
    Sentence,
    Char,
    Structure,
}

#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub mode: ChunkMode,
    pub oversized_unit_threshold: usize,
    pub jurisdiction_from_path: bool,
}

impl ChunkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk-size must be at least 1");
        }
        Ok(())
    }

    /// Forward stride between window starts. Falls back to a full window when
    /// the overlap would otherwise stall progress.
    pub fn stride(&self) -> usize {
        if self.overlap >= self.chunk_size {
            self.chunk_size
        } else {
            self.chunk_size - self.overlap
        }
    }
}

/// One structural division of a document: a recognized section, a sub-clause,
/// or an unheaded preface block. Offsets are character positions into the
/// full normalized text; the ordered sequence produced by section detection
/// is monotonic and non-overlapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralUnit {
    pub section_id: Option<String>,
    pub section_title: Option<String>,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Per-document input handed to the pipeline: raw per-page extracted text
/// plus identity derived from the source file. Transient; nothing is held
/// across documents.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub doc_id: String,
    pub title: String,
    pub filename: String,
    pub source_path: String,
    pub pages: Vec<String>,
}

/// Metadata supplied by an external source map; takes precedence over the
/// in-document heuristics.
#[derive(Debug, Clone, Default)]
pub struct DocumentOverrides {
    pub source_url: Option<String>,
    pub doc_date: Option<String>,
    pub doc_version: Option<String>,
}

/// All compiled patterns plus configuration for one run. Constructed once and
/// passed by reference to each document task; holds no mutable state, so it
/// is freely shared across worker threads.
#[derive(Debug)]
pub struct ChunkerContext {
    pub config: ChunkConfig,
    normalizer: TextNormalizer,
    headings: HeadingGrammar,
    subclause_marker: Regex,
    metadata: MetadataPatterns,
}

impl ChunkerContext {
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            normalizer: TextNormalizer::new()?,
            headings: HeadingGrammar::new()?,
            subclause_marker: subclause::marker_regex()?,
            metadata: MetadataPatterns::new()?,
        })
    }

    /// Runs the whole pipeline for one document. Pure with respect to the
    /// context: identical input yields an identical chunk sequence.
    pub fn chunk_document(
        &self,
        source: &DocumentSource,
        overrides: &DocumentOverrides,
    ) -> Vec<ChunkRecord> {
        let mut pages = source
            .pages
            .iter()
            .map(|page| self.normalizer.clean_page(page))
            .collect::<Vec<String>>();
        strip_repeating_edge_lines(&mut pages);

        let full_text = pages.join("\n\n");
        if full_text.trim().is_empty() {
            return Vec::new();
        }

        let page_map = PageMap::new(&pages);

        let (heuristic_date, heuristic_version) =
            extract_doc_date_and_version(&self.metadata, &pages, &source.filename);
        let doc_date = overrides.doc_date.clone().or(heuristic_date);
        let doc_version = overrides.doc_version.clone().or(heuristic_version);
        let jurisdiction = if self.config.jurisdiction_from_path {
            infer_jurisdiction(&source.source_path)
        } else {
            None
        };

        let spans: Vec<ChunkSpan> = match self.config.mode {
            ChunkMode::Structure => {
                let units = detect_sections(&full_text, &self.headings);
                let units = split_oversized_units(
                    units,
                    self.config.oversized_unit_threshold,
                    &self.subclause_marker,
                );
                window_units(units, &self.config)
                    .into_iter()
                    .map(ChunkSpan::from_unit)
                    .collect()
            }
            _ => generic_chunks(&full_text, &self.config, &self.normalizer)
                .into_iter()
                .map(ChunkSpan::from_generic)
                .collect(),
        };

        spans
            .into_iter()
            .enumerate()
            .map(|(index, span)| {
                let (page_start, page_end) =
                    page_map.page_range(span.start_offset, span.end_offset);

                ChunkRecord {
                    id: format!("{}-{:04}", source.doc_id, index),
                    doc_id: source.doc_id.clone(),
                    source_path: source.source_path.clone(),
                    title: source.title.clone(),
                    jurisdiction: jurisdiction.clone(),
                    doc_date: doc_date.clone(),
                    doc_version: doc_version.clone(),
                    source_url: overrides.source_url.clone(),
                    section_id: span.section_id,
                    section_title: span.section_title,
                    normative_strength: self.label_normative_strength(&span.text),
                    page_start,
                    page_end,
                    chunk_index: index,
                    text: span.text,
                }
            })
            .collect()
    }

    pub fn label_normative_strength(&self, text: &str) -> Option<NormativeStrength> {
        metadata::label_normative_strength(&self.metadata, text)
    }
}

/// Mode-independent intermediate between windowing and record assembly.
#[derive(Debug)]
struct ChunkSpan {
    section_id: Option<String>,
    section_title: Option<String>,
    text: String,
    start_offset: usize,
    end_offset: usize,
}

impl ChunkSpan {
    fn from_unit(unit: StructuralUnit) -> Self {
        Self {
            section_id: unit.section_id,
            section_title: unit.section_title,
            text: unit.text,
            start_offset: unit.start_offset,
            end_offset: unit.end_offset,
        }
    }

    fn from_generic(chunk: GenericChunk) -> Self {
        Self {
            section_id: None,
            section_title: None,
            text: chunk.text,
            start_offset: chunk.start_offset,
            end_offset: chunk.end_offset,
        }
    }
}

/// Character count, used everywhere offsets are involved. Offsets in this
/// pipeline are character positions, not byte positions.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
