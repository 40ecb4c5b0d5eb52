use anyhow::{Context, Result};
use regex::Regex;

use super::{StructuralUnit, char_len};

/// Sub-clause markers recognized at line start: `(1)`, `(a)`, `1.` forms.
pub fn marker_regex() -> Result<Regex> {
    Regex::new(r"^(\(\d+\)|\([A-Za-z]\)|\d+\.)\s+.+")
        .context("failed to compile sub-clause marker regex")
}

/// Mandatory pre-pass before windowing: partitions oversized units along
/// sub-clause markers so semantically distinct items are not forced into one
/// overlapping window. Sub-units inherit the parent's section id and title;
/// units at or below the threshold, and oversized units without any markers,
/// pass through unchanged.
pub fn split_oversized_units(
    units: Vec<StructuralUnit>,
    threshold: usize,
    marker: &Regex,
) -> Vec<StructuralUnit> {
    let mut refined = Vec::<StructuralUnit>::with_capacity(units.len());

    for unit in units {
        if char_len(&unit.text) <= threshold {
            refined.push(unit);
            continue;
        }

        let sub_units = partition_at_markers(&unit, marker);
        if sub_units.len() <= 1 {
            refined.push(unit);
        } else {
            refined.extend(sub_units);
        }
    }

    refined
}

fn partition_at_markers(unit: &StructuralUnit, marker: &Regex) -> Vec<StructuralUnit> {
    let mut sub_units = Vec::<StructuralUnit>::new();
    let mut open_lines = Vec::<String>::new();
    let mut local_offset = 0usize;
    let mut sub_start = unit.start_offset;

    let mut close_open = |lines: &mut Vec<String>, start: usize, end: usize| {
        if lines.is_empty() {
            return;
        }
        let text = lines.join("\n").trim().to_string();
        lines.clear();
        if text.is_empty() {
            return;
        }
        sub_units.push(StructuralUnit {
            section_id: unit.section_id.clone(),
            section_title: unit.section_title.clone(),
            text,
            start_offset: start,
            end_offset: end.min(unit.end_offset),
        });
    };

    for line in unit.text.lines() {
        let starts_sub_clause = marker.is_match(line.trim());
        if starts_sub_clause && !open_lines.is_empty() {
            let end = (unit.start_offset + local_offset).saturating_sub(1);
            close_open(&mut open_lines, sub_start, end);
            sub_start = unit.start_offset + local_offset;
        }
        open_lines.push(line.to_string());
        local_offset += char_len(line) + 1;
    }

    close_open(&mut open_lines, sub_start, unit.start_offset + local_offset);

    sub_units
}
