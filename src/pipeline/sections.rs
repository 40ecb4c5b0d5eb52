use anyhow::{Context, Result};
use regex::Regex;

use super::{StructuralUnit, char_len};

/// Section id assigned to text that precedes the first recognized heading.
pub const PREFACE_SECTION_ID: &str = "PREFACE";

/// Parsed heading line. A malformed match may carry a null id or title; the
/// unit is still opened rather than failing the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    pub section_id: Option<String>,
    pub section_title: Option<String>,
}

/// The heading conventions seen across regulatory corpora, kept as separate
/// matchers tried in priority order rather than one alternation mega-pattern,
/// so each convention stays independently testable.
#[derive(Debug)]
pub struct HeadingGrammar {
    structural_keyword: Regex,
    section_mark: Regex,
    dotted_code: Regex,
    korean_article: Regex,
}

impl HeadingGrammar {
    pub fn new() -> Result<Self> {
        Ok(Self {
            structural_keyword: Regex::new(
                r"(?i)^(annex|appendix|part|chapter|section|clause)\s+([\w.\-]+)\b\s*(.*)$",
            )
            .context("failed to compile structural keyword heading regex")?,
            section_mark: Regex::new(r"^§\s*([0-9.]+)\b\s*(.*)$")
                .context("failed to compile section-mark heading regex")?,
            dotted_code: Regex::new(r"^([0-9]+(?:\.[0-9]+)+)\b\s*(.+)$")
                .context("failed to compile dotted-code heading regex")?,
            korean_article: Regex::new(r"^제\s*([0-9]+)\s*(장|절|조)\s*(.*)$")
                .context("failed to compile korean article heading regex")?,
        })
    }

    /// Tries each convention in priority order; the first match wins, so a
    /// line satisfying several forms resolves deterministically.
    pub fn match_line(&self, line: &str) -> Option<HeadingMatch> {
        if let Some(captures) = self.structural_keyword.captures(line) {
            let keyword = captures.get(1).map(|m| title_case(m.as_str()));
            let code = captures.get(2).map(|m| m.as_str().trim());
            let section_id = match (keyword, code) {
                (Some(keyword), Some(code)) if !code.is_empty() => {
                    Some(format!("{keyword} {code}"))
                }
                _ => None,
            };
            return Some(HeadingMatch {
                section_id,
                section_title: capture_title(&captures, 3),
            });
        }

        if let Some(captures) = self.section_mark.captures(line) {
            let section_id = captures.get(1).map(|m| format!("§ {}", m.as_str().trim()));
            return Some(HeadingMatch {
                section_id,
                section_title: capture_title(&captures, 2),
            });
        }

        if let Some(captures) = self.dotted_code.captures(line) {
            let section_id = captures.get(1).map(|m| m.as_str().trim().to_string());
            return Some(HeadingMatch {
                section_id,
                section_title: capture_title(&captures, 2),
            });
        }

        if let Some(captures) = self.korean_article.captures(line) {
            let section_id = match (captures.get(1), captures.get(2)) {
                (Some(number), Some(kind)) => {
                    Some(format!("제{}{}", number.as_str(), kind.as_str()))
                }
                _ => None,
            };
            return Some(HeadingMatch {
                section_id,
                section_title: capture_title(&captures, 3),
            });
        }

        None
    }
}

fn capture_title(captures: &regex::Captures<'_>, group: usize) -> Option<String> {
    captures
        .get(group)
        .map(|m| m.as_str().trim())
        .filter(|title| !title.is_empty())
        .map(str::to_string)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Accumulator threaded through the line scan: the unit being built, the
/// running character offset, and the completed units.
#[derive(Debug)]
struct SectionAccumulator {
    completed: Vec<StructuralUnit>,
    open: Option<OpenUnit>,
    offset: usize,
}

#[derive(Debug)]
struct OpenUnit {
    section_id: Option<String>,
    section_title: Option<String>,
    start_offset: usize,
    lines: Vec<String>,
}

impl SectionAccumulator {
    fn new() -> Self {
        Self {
            completed: Vec::new(),
            open: None,
            offset: 0,
        }
    }

    fn close_open(&mut self, end_offset: usize) {
        let Some(open) = self.open.take() else {
            return;
        };

        let text = open.lines.join("\n").trim().to_string();
        if text.is_empty() {
            return;
        }

        self.completed.push(StructuralUnit {
            section_id: open.section_id,
            section_title: open.section_title,
            text,
            start_offset: open.start_offset,
            end_offset,
        });
    }

    fn step(&mut self, line: &str, grammar: &HeadingGrammar) {
        if let Some(heading) = grammar.match_line(line.trim()) {
            self.close_open(self.offset.saturating_sub(1));
            self.open = Some(OpenUnit {
                section_id: heading.section_id,
                section_title: heading.section_title,
                start_offset: self.offset,
                lines: vec![line.to_string()],
            });
        } else {
            let open = self.open.get_or_insert_with(|| OpenUnit {
                section_id: Some(PREFACE_SECTION_ID.to_string()),
                section_title: None,
                start_offset: self.offset,
                lines: Vec::new(),
            });
            open.lines.push(line.to_string());
        }

        // Running line counter is the authoritative offset source: each line
        // contributes its character count plus one newline.
        self.offset += char_len(line) + 1;
    }

    fn finish(mut self) -> Vec<StructuralUnit> {
        let end = self.offset;
        self.close_open(end);
        self.completed
    }
}

/// Splits the full normalized text into an ordered sequence of structural
/// units along recognized heading boundaries. Text before the first heading
/// becomes a PREFACE unit; a document with no headings at all yields exactly
/// one PREFACE unit covering everything.
pub fn detect_sections(full_text: &str, grammar: &HeadingGrammar) -> Vec<StructuralUnit> {
    let mut accumulator = SectionAccumulator::new();
    for line in full_text.lines() {
        accumulator.step(line, grammar);
    }
    accumulator.finish()
}
