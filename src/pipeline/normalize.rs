use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use regex::Regex;

/// Fraction of pages an edge line must appear on before it is treated as a
/// running header or footer.
const EDGE_REPEAT_THRESHOLD: f64 = 0.4;
/// How many non-blank lines at each page edge are header/footer candidates.
const EDGE_CANDIDATE_LINES: usize = 3;

/// Per-page text cleanup. The operations run in a fixed order so that the
/// character offsets later stages compute stay reproducible.
#[derive(Debug)]
pub struct TextNormalizer {
    hyphen_break: Regex,
    space_runs: Regex,
    newline_runs: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            hyphen_break: Regex::new(r"(\w)-\n(\w)")
                .context("failed to compile hyphen line-break regex")?,
            space_runs: Regex::new(r"[ \u00A0]{2,}")
                .context("failed to compile space-run regex")?,
            newline_runs: Regex::new(r"\n{3,}")
                .context("failed to compile newline-run regex")?,
        })
    }

    /// Cleans one page of raw extracted text: BOM and tabs, hyphen-broken
    /// word joins, space-run collapse, line-break normalization, blank-line
    /// collapse, edge trim.
    pub fn clean_page(&self, raw: &str) -> String {
        let text = raw.replace('\u{feff}', "").replace('\t', " ");
        let text = self.hyphen_break.replace_all(&text, "$1$2");
        let text = self.space_runs.replace_all(&text, " ");
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let text = self.newline_runs.replace_all(&text, "\n\n");
        text.trim().to_string()
    }
}

/// Strips repeating header/footer lines across the whole page set. A line is
/// only ever removed from the edges of a page, so body text that repeats in
/// the interior is untouched.
pub fn strip_repeating_edge_lines(pages: &mut [String]) {
    let (head_repeats, foot_repeats) = detect_repeating_edge_lines(pages);
    if head_repeats.is_empty() && foot_repeats.is_empty() {
        return;
    }

    for page in pages.iter_mut() {
        let mut lines = page.lines().map(str::to_string).collect::<Vec<String>>();

        while lines
            .first()
            .is_some_and(|line| head_repeats.contains(line.trim()))
        {
            lines.remove(0);
        }
        while lines
            .last()
            .is_some_and(|line| foot_repeats.contains(line.trim()))
        {
            lines.pop();
        }

        *page = lines.join("\n");
    }
}

fn detect_repeating_edge_lines(pages: &[String]) -> (HashSet<String>, HashSet<String>) {
    let mut head_counts = HashMap::<String, usize>::new();
    let mut foot_counts = HashMap::<String, usize>::new();

    for page in pages {
        let lines = page
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<&str>>();
        if lines.is_empty() {
            continue;
        }

        let head_take = EDGE_CANDIDATE_LINES.min(lines.len());
        for line in &lines[..head_take] {
            *head_counts.entry((*line).to_string()).or_insert(0) += 1;
        }

        let foot_skip = lines.len() - EDGE_CANDIDATE_LINES.min(lines.len());
        for line in &lines[foot_skip..] {
            *foot_counts.entry((*line).to_string()).or_insert(0) += 1;
        }
    }

    let page_count = pages.len().max(1) as f64;
    let over_threshold = |counts: HashMap<String, usize>| {
        counts
            .into_iter()
            .filter_map(|(line, count)| {
                (count as f64 / page_count >= EDGE_REPEAT_THRESHOLD).then_some(line)
            })
            .collect::<HashSet<String>>()
    };

    (over_threshold(head_counts), over_threshold(foot_counts))
}
