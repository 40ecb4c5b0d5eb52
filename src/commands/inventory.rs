use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;
use walkdir::WalkDir;

use crate::cli::InventoryArgs;
use crate::model::{PdfEntry, PdfInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.pdf_root)?;

    if args.dry_run {
        info!(
            pdf_count = manifest.pdf_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.cache_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(pdf_count = manifest.pdf_count, "inventory completed");

    Ok(())
}

pub fn default_manifest_path(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests").join("pdf_inventory.json")
}

pub fn build_manifest(pdf_root: &Path) -> Result<PdfInventoryManifest> {
    let mut pdf_paths = discover_pdfs(pdf_root)?;
    pdf_paths.sort();

    if pdf_paths.is_empty() {
        bail!("no PDFs found under {}", pdf_root.display());
    }

    let mut pdfs = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let relative_path = path
            .strip_prefix(pdf_root)
            .unwrap_or(&path)
            .display()
            .to_string();

        let sha256 = sha256_file(&path)?;

        pdfs.push(PdfEntry {
            filename,
            relative_path,
            sha256,
        });
    }

    pdfs.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(PdfInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: pdf_root.display().to_string(),
        pdf_count: pdfs.len(),
        pdfs,
    })
}

/// Recursive discovery: regulatory corpora commonly arrive sorted into
/// per-authority subdirectories, and those path segments also feed the
/// jurisdiction heuristic downstream.
fn discover_pdfs(pdf_root: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    for entry in WalkDir::new(pdf_root).follow_links(false) {
        let entry =
            entry.with_context(|| format!("failed to walk {}", pdf_root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            pdfs.push(path);
        }
    }

    Ok(pdfs)
}
