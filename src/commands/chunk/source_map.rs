use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::pipeline::DocumentOverrides;

/// One JSONL line of the optional source map. A record is keyed by full
/// path, bare filename, or stem; the first key present wins.
#[derive(Debug, Clone, Deserialize)]
struct SourceMapLine {
    path: Option<String>,
    filename: Option<String>,
    stem: Option<String>,
    source_url: Option<String>,
    doc_date: Option<String>,
    doc_version: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct SourceMapEntry {
    source_url: Option<String>,
    doc_date: Option<String>,
    doc_version: Option<String>,
}

/// Externally curated document metadata, loaded once per run. Lookups try
/// full path, then filename, then stem, mirroring how the map is keyed.
#[derive(Debug, Default)]
pub(super) struct SourceMap {
    entries: HashMap<String, SourceMapEntry>,
}

impl SourceMap {
    pub(super) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read source map {}", path.display()))?;
        Ok(Self::parse(&raw))
    }

    /// Malformed or keyless lines are skipped with a warning; a partially
    /// usable map is better than refusing the whole run.
    pub(super) fn parse(raw: &str) -> Self {
        let mut entries = HashMap::new();

        for (line_number, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let parsed: SourceMapLine = match serde_json::from_str(line) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(line = line_number + 1, error = %err, "skipping malformed source-map line");
                    continue;
                }
            };

            let Some(key) = parsed.path.or(parsed.filename).or(parsed.stem) else {
                warn!(line = line_number + 1, "skipping source-map line without a key");
                continue;
            };

            entries.insert(
                key,
                SourceMapEntry {
                    source_url: parsed.source_url,
                    doc_date: parsed.doc_date,
                    doc_version: parsed.doc_version,
                },
            );
        }

        Self { entries }
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn overrides_for(&self, path: &str, filename: &str, stem: &str) -> DocumentOverrides {
        let entry = self
            .entries
            .get(path)
            .or_else(|| self.entries.get(filename))
            .or_else(|| self.entries.get(stem));

        match entry {
            Some(entry) => DocumentOverrides {
                source_url: entry.source_url.clone(),
                doc_date: entry.doc_date.clone(),
                doc_version: entry.doc_version.clone(),
            },
            None => DocumentOverrides::default(),
        }
    }
}
