use super::{
    ChunkConfig, ChunkMode, FORCED_SLICE_TOLERANCE, MIN_SENTENCE_CHARS, SENTENCE_REFINE_TOLERANCE,
    SINGLE_UNIT_TOLERANCE, StructuralUnit, char_len, normalize::TextNormalizer,
};

/// Sliding-window segmentation within each structural unit. Units close to
/// the target size are emitted as-is; larger ones are windowed, and windows
/// never cross a unit boundary, so overlap context always comes from the same
/// clause.
pub fn window_units(units: Vec<StructuralUnit>, config: &ChunkConfig) -> Vec<StructuralUnit> {
    let mut chunks = Vec::<StructuralUnit>::new();
    let stride = config.stride();

    for unit in units {
        let chars = unit.text.chars().collect::<Vec<char>>();
        if chars.len() as f64 <= config.chunk_size as f64 * SINGLE_UNIT_TOLERANCE {
            chunks.push(unit);
            continue;
        }

        let mut position = 0usize;
        while position < chars.len() {
            let window_end = (position + config.chunk_size).min(chars.len());
            let text = chars[position..window_end].iter().collect::<String>();
            let start_offset = unit.start_offset + position;
            let end_offset = (unit.start_offset + window_end).min(unit.end_offset);

            chunks.push(StructuralUnit {
                section_id: unit.section_id.clone(),
                section_title: unit.section_title.clone(),
                text,
                start_offset,
                end_offset,
            });

            position += stride;
        }
    }

    chunks
}

/// Chunk produced without structural detection; offsets are a running
/// approximation over the packed sequence, good enough for page attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericChunk {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Fallback segmentation used when structure-aware mode is not requested:
/// paragraph/sentence units greedily packed to the target size, with the tail
/// of each chunk seeding the next for cross-boundary context, and a forced
/// fixed-size slice as the last resort for pathological units.
pub fn generic_chunks(
    text: &str,
    config: &ChunkConfig,
    normalizer: &TextNormalizer,
) -> Vec<GenericChunk> {
    let text = normalizer.clean_page(text);
    if text.is_empty() {
        return Vec::new();
    }

    let units: Vec<String> = match config.mode {
        ChunkMode::Paragraph => split_paragraphs(&text),
        ChunkMode::Sentence => split_sentences(&text),
        ChunkMode::Char => vec![text.clone()],
        _ => {
            let refine_limit = config.chunk_size as f64 * SENTENCE_REFINE_TOLERANCE;
            split_paragraphs(&text)
                .into_iter()
                .flat_map(|paragraph| {
                    if char_len(&paragraph) as f64 > refine_limit {
                        split_sentences(&paragraph)
                    } else {
                        vec![paragraph]
                    }
                })
                .collect()
        }
    };

    let packed = pack_units(&units, config);
    let sliced = force_slice_outliers(packed, config);
    assign_running_offsets(sliced, config.overlap)
}

pub(super) fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits on sentence boundaries: a whitespace run after `.` `!` `?` or their
/// full-width forms, or a whitespace run containing a newline after `)`/`]`.
/// Fragments are then merged forward until they pass the minimum size, which
/// keeps list markers and abbreviations from producing micro-sentences.
pub(super) fn split_sentences(text: &str) -> Vec<String> {
    let chars = text.chars().collect::<Vec<char>>();
    let mut parts = Vec::<String>::new();
    let mut current = String::new();
    let mut index = 0usize;

    while index < chars.len() {
        let ch = chars[index];
        if ch.is_whitespace() && !current.is_empty() {
            let mut run_end = index;
            let mut run_has_newline = false;
            while run_end < chars.len() && chars[run_end].is_whitespace() {
                if chars[run_end] == '\n' {
                    run_has_newline = true;
                }
                run_end += 1;
            }

            let previous = current.chars().next_back();
            let after_terminal = matches!(
                previous,
                Some('.' | '!' | '?' | '。' | '！' | '？')
            );
            let after_bracket = run_has_newline && matches!(previous, Some(')' | ']'));

            if after_terminal || after_bracket {
                parts.push(std::mem::take(&mut current));
                index = run_end;
                continue;
            }
        }

        current.push(ch);
        index += 1;
    }
    if !current.is_empty() {
        parts.push(current);
    }

    merge_short_fragments(parts)
}

fn merge_short_fragments(parts: Vec<String>) -> Vec<String> {
    let mut merged = Vec::<String>::new();
    let mut buffer = Vec::<String>::new();
    let mut buffered_chars = 0usize;

    for part in parts {
        let trimmed = part.trim().to_string();
        if trimmed.is_empty() {
            continue;
        }
        buffered_chars += char_len(&trimmed);
        buffer.push(trimmed);
        if buffered_chars > MIN_SENTENCE_CHARS {
            merged.push(buffer.join(" "));
            buffer.clear();
            buffered_chars = 0;
        }
    }
    if !buffer.is_empty() {
        merged.push(buffer.join(" "));
    }

    merged
}

fn pack_units(units: &[String], config: &ChunkConfig) -> Vec<String> {
    let mut chunks = Vec::<String>::new();
    let mut buffer = String::new();

    for unit in units {
        if buffer.is_empty() {
            buffer = unit.clone();
        } else if char_len(&buffer) + 1 + char_len(unit) <= config.chunk_size {
            buffer.push('\n');
            buffer.push_str(unit);
        } else {
            chunks.push(buffer.trim().to_string());
            let tail = trailing_chars(&buffer, config.overlap);
            buffer = format!("{tail}\n{unit}").trim().to_string();
        }
    }
    if !buffer.is_empty() {
        chunks.push(buffer.trim().to_string());
    }

    chunks
}

fn force_slice_outliers(chunks: Vec<String>, config: &ChunkConfig) -> Vec<String> {
    let limit = config.chunk_size as f64 * FORCED_SLICE_TOLERANCE;
    let stride = config.stride();
    let mut bounded = Vec::<String>::new();

    for chunk in chunks {
        let chars = chunk.chars().collect::<Vec<char>>();
        if chars.len() as f64 <= limit {
            bounded.push(chunk);
            continue;
        }

        let mut position = 0usize;
        while position < chars.len() {
            let end = (position + config.chunk_size).min(chars.len());
            bounded.push(chars[position..end].iter().collect::<String>());
            position += stride;
        }
    }

    bounded
}

/// Approximate offsets for generic chunks: each chunk starts where the
/// previous one ended minus the carried overlap.
fn assign_running_offsets(chunks: Vec<String>, overlap: usize) -> Vec<GenericChunk> {
    let mut positioned = Vec::<GenericChunk>::with_capacity(chunks.len());
    let mut offset = 0usize;

    for text in chunks {
        let length = char_len(&text);
        let start_offset = offset;
        let end_offset = offset + length;
        offset = end_offset - overlap.min(length);
        positioned.push(GenericChunk {
            text,
            start_offset,
            end_offset,
        });
    }

    positioned
}

fn trailing_chars(text: &str, count: usize) -> String {
    if count == 0 {
        return String::new();
    }
    let chars = text.chars().collect::<Vec<char>>();
    let start = chars.len().saturating_sub(count);
    chars[start..].iter().collect()
}
