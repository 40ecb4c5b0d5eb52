use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cli::{ChunkArgs, ChunkBy};
use crate::commands::inventory;
use crate::model::{
    ChunkRecord, ChunkRunConfig, ChunkRunCounts, ChunkRunManifest, ChunkRunPaths, PdfEntry,
    PdfInventoryManifest,
};
use crate::pipeline::{ChunkConfig, ChunkMode, ChunkerContext, DocumentSource};
use crate::util::{
    ensure_directory, now_utc_string, sha256_text_prefix, slugify, utc_compact_string,
    write_json_pretty, write_jsonl,
};

use super::extract::{collect_tool_versions, extract_pages_with_pdftotext, extract_zip_archive};
use super::source_map::SourceMap;

const DOC_SLUG_MAX_CHARS: usize = 80;
const DOC_HASH_HEX_CHARS: usize = 16;

pub fn run(args: ChunkArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    info!(cache_root = %cache_root.display(), run_id = %run_id, "starting chunk run");

    let pdf_root = match &args.zip {
        Some(zip_path) => {
            let workdir = cache_root.join("work");
            let extracted = extract_zip_archive(zip_path, &workdir)?;
            info!(archive = %zip_path.display(), files = extracted, "extracted PDF archive");
            workdir
        }
        None => args.pdf_root.clone(),
    };

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_manifest_path(&cache_root));
    let run_manifest_path = args
        .run_manifest_path
        .clone()
        .unwrap_or_else(|| manifest_dir.join("chunk_run.json"));

    let inventory = load_or_refresh_inventory(
        &pdf_root,
        &inventory_manifest_path,
        args.refresh_inventory,
    )?;

    let tool_versions = collect_tool_versions()?;

    let source_map = SourceMap::load(args.source_map.as_deref())?;
    if source_map.len() > 0 {
        info!(entries = source_map.len(), "loaded source map");
    }

    let config = ChunkConfig {
        chunk_size: args.chunk_size,
        overlap: args.overlap,
        mode: chunk_mode(args.chunk_by),
        oversized_unit_threshold: args.oversized_unit_threshold,
        jurisdiction_from_path: args.jurisdiction_from_path,
    };
    let context = ChunkerContext::new(config)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers)
        .build()
        .context("failed to build worker pool")?;

    // par_iter keeps inventory order, so the output JSONL is deterministic
    // regardless of worker count.
    let outcomes: Vec<DocOutcome> = pool.install(|| {
        inventory
            .pdfs
            .par_iter()
            .map(|entry| {
                process_document(
                    entry,
                    &pdf_root,
                    &context,
                    &source_map,
                    args.max_pages_per_doc,
                )
            })
            .collect()
    });

    let mut counts = ChunkRunCounts {
        pdf_count: inventory.pdf_count,
        ..ChunkRunCounts::default()
    };
    let mut warnings = Vec::<String>::new();
    let mut records = Vec::<ChunkRecord>::new();

    for outcome in outcomes {
        match outcome.status {
            DocStatus::Processed => counts.processed_pdf_count += 1,
            DocStatus::Empty => {
                counts.processed_pdf_count += 1;
                counts.empty_doc_count += 1;
            }
            DocStatus::Failed => counts.failed_pdf_count += 1,
        }
        if let Some(warning) = outcome.warning {
            warnings.push(warning);
        }
        records.extend(outcome.records);
    }

    counts.chunks_total = records.len();
    counts.sectioned_chunk_count = records
        .iter()
        .filter(|record| record.section_id.is_some())
        .count();
    counts.unsectioned_chunk_count = counts.chunks_total - counts.sectioned_chunk_count;

    write_jsonl(&args.out, &records)?;
    info!(path = %args.out.display(), chunks = counts.chunks_total, "wrote chunk output");

    let manifest = ChunkRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_chunk_command(&args),
        tool_versions,
        paths: ChunkRunPaths {
            pdf_root: pdf_root.display().to_string(),
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            output_path: args.out.display().to_string(),
        },
        config: ChunkRunConfig {
            chunk_size: args.chunk_size,
            overlap: args.overlap,
            chunk_by: args.chunk_by.as_str().to_string(),
            oversized_unit_threshold: args.oversized_unit_threshold,
            jurisdiction_from_path: args.jurisdiction_from_path,
            workers: args.workers,
        },
        counts,
        source_hashes: inventory.pdfs,
        warnings,
        notes: vec![
            "Chunk command completed using local manifests and JSONL output.".to_string(),
            "Structure-aware mode uses heading and sub-clause heuristics over the pdftotext text layer."
                .to_string(),
        ],
    };

    write_json_pretty(&run_manifest_path, &manifest)?;
    info!(path = %run_manifest_path.display(), "wrote chunk run manifest");
    info!(
        processed = manifest.counts.processed_pdf_count,
        failed = manifest.counts.failed_pdf_count,
        chunks = manifest.counts.chunks_total,
        "chunk run completed"
    );

    Ok(())
}

enum DocStatus {
    Processed,
    Empty,
    Failed,
}

struct DocOutcome {
    status: DocStatus,
    warning: Option<String>,
    records: Vec<ChunkRecord>,
}

/// One PDF end to end: extract, chunk, label. Extraction failure never
/// aborts the run; the document is reported in the manifest and skipped.
fn process_document(
    entry: &PdfEntry,
    pdf_root: &Path,
    context: &ChunkerContext,
    source_map: &SourceMap,
    max_pages_per_doc: Option<usize>,
) -> DocOutcome {
    let path = pdf_root.join(&entry.relative_path);
    let source_path = path.display().to_string();
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(&entry.filename)
        .to_string();

    let pages = match extract_pages_with_pdftotext(&path, max_pages_per_doc) {
        Ok(pages) => pages,
        Err(err) => {
            warn!(pdf = %entry.filename, error = %err, "text extraction failed");
            return DocOutcome {
                status: DocStatus::Failed,
                warning: Some(format!("extraction failed for {}: {err:#}", entry.filename)),
                records: Vec::new(),
            };
        }
    };

    if pages.iter().all(|page| page.trim().is_empty()) {
        warn!(pdf = %entry.filename, "no text layer; document may need OCR");
        return DocOutcome {
            status: DocStatus::Empty,
            warning: Some(format!("no text layer in {}", entry.filename)),
            records: Vec::new(),
        };
    }

    let overrides = source_map.overrides_for(&source_path, &entry.filename, &stem);
    let source = DocumentSource {
        doc_id: derive_doc_id(&stem, &source_path),
        title: stem,
        filename: entry.filename.clone(),
        source_path,
        pages,
    };

    let records = context.chunk_document(&source, &overrides);
    let status = if records.is_empty() {
        DocStatus::Empty
    } else {
        DocStatus::Processed
    };

    DocOutcome {
        status,
        warning: None,
        records,
    }
}

/// Stable document id: a filesystem-safe slug of the title plus a truncated
/// hash of the source path, so same-named files in different directories
/// never collide.
pub(super) fn derive_doc_id(stem: &str, source_path: &str) -> String {
    format!(
        "{}-{}",
        slugify(stem, DOC_SLUG_MAX_CHARS),
        sha256_text_prefix(source_path, DOC_HASH_HEX_CHARS)
    )
}

fn chunk_mode(chunk_by: ChunkBy) -> ChunkMode {
    match chunk_by {
        ChunkBy::Auto => ChunkMode::Auto,
        ChunkBy::Paragraph => ChunkMode::Paragraph,
        ChunkBy::Sentence => ChunkMode::Sentence,
        ChunkBy::Char => ChunkMode::Char,
        ChunkBy::Structure => ChunkMode::Structure,
    }
}

fn load_or_refresh_inventory(
    pdf_root: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<PdfInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(pdf_root)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            pdf_count = manifest.pdf_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let raw = fs::read(inventory_manifest_path)
        .with_context(|| format!("failed to read {}", inventory_manifest_path.display()))?;
    let manifest: PdfInventoryManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", inventory_manifest_path.display()))?;

    info!(
        path = %inventory_manifest_path.display(),
        pdf_count = manifest.pdf_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

pub(super) fn render_chunk_command(args: &ChunkArgs) -> String {
    let mut command = vec![
        "gmpchunk".to_string(),
        "chunk".to_string(),
        "--pdf-root".to_string(),
        args.pdf_root.display().to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
        "--out".to_string(),
        args.out.display().to_string(),
        "--chunk-size".to_string(),
        args.chunk_size.to_string(),
        "--overlap".to_string(),
        args.overlap.to_string(),
        "--chunk-by".to_string(),
        args.chunk_by.as_str().to_string(),
        "--oversized-unit-threshold".to_string(),
        args.oversized_unit_threshold.to_string(),
    ];

    if let Some(path) = &args.zip {
        command.push("--zip".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.inventory_manifest_path {
        command.push("--inventory-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.run_manifest_path {
        command.push("--run-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }
    if args.jurisdiction_from_path {
        command.push("--jurisdiction-from-path".to_string());
    }
    if let Some(path) = &args.source_map {
        command.push("--source-map".to_string());
        command.push(path.display().to_string());
    }
    if let Some(max_pages) = args.max_pages_per_doc {
        command.push("--max-pages-per-doc".to_string());
        command.push(max_pages.to_string());
    }
    if args.workers != 0 {
        command.push("--workers".to_string());
        command.push(args.workers.to_string());
    }

    command.join(" ")
}
