use std::path::PathBuf;

use super::run::{derive_doc_id, render_chunk_command};
use super::source_map::SourceMap;
use crate::cli::{ChunkArgs, ChunkBy};

fn base_args() -> ChunkArgs {
    ChunkArgs {
        pdf_root: PathBuf::from("data"),
        zip: None,
        cache_root: PathBuf::from(".cache/gmpchunk"),
        out: PathBuf::from("chunks.jsonl"),
        inventory_manifest_path: None,
        run_manifest_path: None,
        refresh_inventory: false,
        chunk_size: 1400,
        overlap: 120,
        chunk_by: ChunkBy::Structure,
        oversized_unit_threshold: 1600,
        jurisdiction_from_path: false,
        source_map: None,
        max_pages_per_doc: None,
        workers: 0,
    }
}

#[test]
fn rendered_command_echoes_core_settings() {
    let command = render_chunk_command(&base_args());

    assert!(command.starts_with("gmpchunk chunk"));
    assert!(command.contains("--chunk-size 1400"));
    assert!(command.contains("--overlap 120"));
    assert!(command.contains("--chunk-by structure"));
    assert!(!command.contains("--zip"));
    assert!(!command.contains("--workers"));
}

#[test]
fn rendered_command_includes_optional_flags_when_set() {
    let mut args = base_args();
    args.zip = Some(PathBuf::from("corpus.zip"));
    args.jurisdiction_from_path = true;
    args.max_pages_per_doc = Some(40);
    args.workers = 4;

    let command = render_chunk_command(&args);

    assert!(command.contains("--zip corpus.zip"));
    assert!(command.contains("--jurisdiction-from-path"));
    assert!(command.contains("--max-pages-per-doc 40"));
    assert!(command.contains("--workers 4"));
}

#[test]
fn source_map_lookup_prefers_path_over_filename_and_stem() {
    let raw = concat!(
        r#"{"path":"data/eu/annex11.pdf","source_url":"https://example.org/by-path"}"#,
        "\n",
        r#"{"filename":"annex11.pdf","source_url":"https://example.org/by-name","doc_date":"2011-06-30"}"#,
        "\n",
        r#"{"stem":"annex11","doc_version":"Rev 1"}"#,
        "\n",
    );
    let map = SourceMap::parse(raw);
    assert_eq!(map.len(), 3);

    let by_path = map.overrides_for("data/eu/annex11.pdf", "annex11.pdf", "annex11");
    assert_eq!(by_path.source_url.as_deref(), Some("https://example.org/by-path"));

    let by_name = map.overrides_for("elsewhere/annex11.pdf", "annex11.pdf", "annex11");
    assert_eq!(by_name.source_url.as_deref(), Some("https://example.org/by-name"));
    assert_eq!(by_name.doc_date.as_deref(), Some("2011-06-30"));

    let by_stem = map.overrides_for("other.pdf", "other.pdf", "annex11");
    assert_eq!(by_stem.doc_version.as_deref(), Some("Rev 1"));

    let miss = map.overrides_for("x.pdf", "x.pdf", "x");
    assert!(miss.source_url.is_none());
}

#[test]
fn source_map_skips_malformed_and_keyless_lines() {
    let raw = "not json at all\n{\"source_url\":\"https://example.org/no-key\"}\n\n{\"stem\":\"ok\",\"doc_date\":\"2020\"}\n";
    let map = SourceMap::parse(raw);

    assert_eq!(map.len(), 1);
    let entry = map.overrides_for("ok.pdf", "ok.pdf", "ok");
    assert_eq!(entry.doc_date.as_deref(), Some("2020"));
}

#[test]
fn doc_ids_are_stable_and_filesystem_safe() {
    let first = derive_doc_id("GMP Guide (2020)", "data/eu/GMP Guide (2020).pdf");
    let second = derive_doc_id("GMP Guide (2020)", "data/eu/GMP Guide (2020).pdf");
    assert_eq!(first, second);

    assert!(first.starts_with("GMP_Guide_2020-"));
    assert!(!first.contains('('));
    assert!(!first.contains(' '));

    let elsewhere = derive_doc_id("GMP Guide (2020)", "data/who/GMP Guide (2020).pdf");
    assert_ne!(first, elsewhere);
}

#[test]
fn korean_titles_survive_slugging_in_doc_ids() {
    let id = derive_doc_id("의약품 제조 기준", "data/mfds/notice.pdf");
    assert!(id.starts_with("의약품_제조_기준-"));
}
