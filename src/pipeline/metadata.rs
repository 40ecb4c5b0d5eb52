use anyhow::{Context, Result};
use regex::Regex;

use crate::model::NormativeStrength;

/// How many leading pages are scanned for the issue date and version; cover
/// sheets and revision tables live at the front of these documents.
const HEAD_PAGE_COUNT: usize = 3;

const MUST_KEYWORDS_KO: [&str; 5] = ["하여야 한다", "해야 한다", "해야한다", "필수", "의무"];
const SHOULD_KEYWORDS_KO: [&str; 3] = ["권장", "바람직", "권고"];
const MAY_KEYWORDS_KO: [&str; 2] = ["할 수 있다", "가능"];

/// Compiled patterns for the document-metadata heuristics: issue date and
/// version from head text or filename, and the normative keyword classes.
#[derive(Debug)]
pub struct MetadataPatterns {
    date_text: Regex,
    date_filename: Regex,
    version_text: Regex,
    version_filename: Regex,
    must_words: Regex,
    should_words: Regex,
    may_words: Regex,
}

impl MetadataPatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            date_text: Regex::new(
                r"(?i)(20\d{2}[./\- ]\d{1,2}[./\- ]\d{1,2}|[0-3]?\d\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+20\d{2})",
            )
            .context("failed to compile in-text date regex")?,
            date_filename: Regex::new(r"(20\d{2}[._-]\d{1,2}[._-]\d{1,2}|20\d{2})")
                .context("failed to compile filename date regex")?,
            version_text: Regex::new(
                r"(?i)\b(Rev(?:ision)?|Version|Ver\.?)\s*[:\-]?\s*([A-Za-z]?\d+(?:\.\d+)*)",
            )
            .context("failed to compile in-text version regex")?,
            version_filename: Regex::new(
                r"(?i)(Rev(?:ision)?|Version|Ver)[._ -]*([A-Za-z]?\d+(?:\.\d+)*)",
            )
            .context("failed to compile filename version regex")?,
            must_words: Regex::new(r"(?i)\b(shall|must|required|require)\b")
                .context("failed to compile MUST keyword regex")?,
            should_words: Regex::new(r"(?i)\b(should|recommended|recommend|ought)\b")
                .context("failed to compile SHOULD keyword regex")?,
            may_words: Regex::new(r"(?i)\b(may|can|optional)\b")
                .context("failed to compile MAY keyword regex")?,
        })
    }
}

/// Heuristic issue date and version: the leading pages are scanned first, the
/// filename is the fallback for whichever field the text did not yield.
pub fn extract_doc_date_and_version(
    patterns: &MetadataPatterns,
    pages: &[String],
    filename: &str,
) -> (Option<String>, Option<String>) {
    let head_take = HEAD_PAGE_COUNT.min(pages.len());
    let head_text = pages[..head_take].join("\n");

    let mut doc_date = patterns
        .date_text
        .find(&head_text)
        .map(|m| m.as_str().to_string());
    let mut doc_version = patterns
        .version_text
        .captures(&head_text)
        .map(version_from_captures);

    if doc_date.is_none() {
        doc_date = patterns
            .date_filename
            .find(filename)
            .map(|m| m.as_str().to_string());
    }
    if doc_version.is_none() {
        doc_version = patterns
            .version_filename
            .captures(filename)
            .map(version_from_captures);
    }

    (doc_date, doc_version)
}

fn version_from_captures(captures: regex::Captures<'_>) -> String {
    let label = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let number = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
    format!("{label} {number}").trim().to_string()
}

/// Path-keyword jurisdiction guess, checked in a fixed precedence order so a
/// path mentioning several bodies resolves deterministically.
pub fn infer_jurisdiction(path: &str) -> Option<String> {
    let lowered = path.to_lowercase();
    let contains_any = |keys: &[&str]| keys.iter().any(|key| lowered.contains(key));

    if contains_any(&["eu", "ema"]) {
        Some("EU".to_string())
    } else if contains_any(&["usfda", "fda", "cfr", "21 cfr", "21cfr"]) {
        Some("US-FDA".to_string())
    } else if lowered.contains("who") {
        Some("WHO".to_string())
    } else if lowered.contains("pic") {
        Some("PIC/S".to_string())
    } else if contains_any(&["mfds", "kfds", "korea"]) {
        Some("KR-MFDS".to_string())
    } else {
        None
    }
}

/// Labels a chunk MUST/SHOULD/MAY by counting normative keyword occurrences,
/// English word-bounded and Korean phrase matches combined. Ties break toward
/// the stronger class; no keywords at all means no label.
pub fn label_normative_strength(
    patterns: &MetadataPatterns,
    text: &str,
) -> Option<NormativeStrength> {
    let count_ko = |keywords: &[&str]| -> usize {
        keywords
            .iter()
            .map(|keyword| text.matches(keyword).count())
            .sum()
    };

    let must = patterns.must_words.find_iter(text).count() + count_ko(&MUST_KEYWORDS_KO);
    let should = patterns.should_words.find_iter(text).count() + count_ko(&SHOULD_KEYWORDS_KO);
    let may = patterns.may_words.find_iter(text).count() + count_ko(&MAY_KEYWORDS_KO);

    if must > 0 && must >= should && must >= may {
        Some(NormativeStrength::Must)
    } else if should > 0 && should >= must && should >= may {
        Some(NormativeStrength::Should)
    } else if may > 0 {
        Some(NormativeStrength::May)
    } else {
        None
    }
}
