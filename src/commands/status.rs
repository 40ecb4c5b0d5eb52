use std::fs;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::{ChunkRunManifest, PdfInventoryManifest};

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let inventory_path = manifest_dir.join("pdf_inventory.json");
    let run_manifest_path = manifest_dir.join("chunk_run.json");

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: PdfInventoryManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        info!(
            generated_at = %inventory.generated_at,
            pdf_count = inventory.pdf_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    if run_manifest_path.exists() {
        let raw = fs::read(&run_manifest_path)
            .with_context(|| format!("failed to read {}", run_manifest_path.display()))?;
        let manifest: ChunkRunManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", run_manifest_path.display()))?;

        info!(
            run_id = %manifest.run_id,
            status = %manifest.status,
            started_at = %manifest.started_at,
            updated_at = %manifest.updated_at,
            processed = manifest.counts.processed_pdf_count,
            failed = manifest.counts.failed_pdf_count,
            chunks_total = manifest.counts.chunks_total,
            warnings = manifest.warnings.len(),
            "loaded chunk-run manifest"
        );
    } else {
        warn!(path = %run_manifest_path.display(), "chunk-run manifest missing");
    }

    if args.out.exists() {
        let chunk_count = count_jsonl_lines(&args.out)?;
        info!(path = %args.out.display(), chunks = chunk_count, "chunk output present");
    } else {
        warn!(path = %args.out.display(), "chunk output missing");
    }

    Ok(())
}

fn count_jsonl_lines(path: &Path) -> Result<usize> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut count = 0usize;
    for line in reader.lines() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}
