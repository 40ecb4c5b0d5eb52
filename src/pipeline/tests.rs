use super::*;
use super::metadata::{extract_doc_date_and_version, label_normative_strength};
use super::sections::PREFACE_SECTION_ID;
use super::window::{split_paragraphs, split_sentences};

fn structure_config() -> ChunkConfig {
    ChunkConfig {
        chunk_size: 1200,
        overlap: 120,
        mode: ChunkMode::Structure,
        oversized_unit_threshold: 1600,
        jurisdiction_from_path: false,
    }
}

fn context_with(config: ChunkConfig) -> ChunkerContext {
    ChunkerContext::new(config).unwrap()
}

fn source_with_pages(pages: Vec<&str>) -> DocumentSource {
    DocumentSource {
        doc_id: "guideline-abc123".to_string(),
        title: "guideline".to_string(),
        filename: "guideline.pdf".to_string(),
        source_path: "data/guideline.pdf".to_string(),
        pages: pages.into_iter().map(str::to_string).collect(),
    }
}

#[test]
fn clean_page_joins_hyphen_breaks_and_collapses_whitespace() {
    let normalizer = TextNormalizer::new().unwrap();
    let raw = "\u{feff}valid-\nation  of\tthe process\r\n\r\n\n\n\nnext part";

    let cleaned = normalizer.clean_page(raw);

    assert!(cleaned.contains("validation of the process"));
    assert!(cleaned.contains("\n\nnext part"));
    assert!(!cleaned.contains("\n\n\n"));
    assert!(!cleaned.contains('\u{feff}'));
}

#[test]
fn clean_page_keeps_single_spaces_and_trims_edges() {
    let normalizer = TextNormalizer::new().unwrap();
    assert_eq!(normalizer.clean_page("  a b  c  "), "a b c");
}

#[test]
fn repeating_edge_lines_are_stripped_only_at_page_edges() {
    let mut pages = vec![
        "ACME GMP Guideline\nIntroduction body\nPage 1".to_string(),
        "ACME GMP Guideline\nMore body text\nPage 2".to_string(),
        "ACME GMP Guideline\nClosing remarks mention the ACME GMP Guideline inline\nPage 3".to_string(),
    ];

    super::normalize::strip_repeating_edge_lines(&mut pages);

    for page in &pages {
        assert!(!page.starts_with("ACME GMP Guideline"));
    }
    assert!(pages[0].contains("Introduction body"));
    assert!(pages[1].contains("More body text"));
}

#[test]
fn unique_edge_lines_survive_stripping() {
    let mut pages = vec![
        "Alpha heading\nbody one".to_string(),
        "Beta heading\nbody two".to_string(),
        "Gamma heading\nbody three".to_string(),
    ];

    super::normalize::strip_repeating_edge_lines(&mut pages);

    assert!(pages[0].starts_with("Alpha heading"));
    assert!(pages[2].starts_with("Gamma heading"));
}

#[test]
fn heading_grammar_recognizes_each_convention() {
    let grammar = HeadingGrammar::new().unwrap();

    let section = grammar.match_line("Section 3 Premises and Equipment").unwrap();
    assert_eq!(section.section_id.as_deref(), Some("Section 3"));
    assert_eq!(section.section_title.as_deref(), Some("Premises and Equipment"));

    let annex = grammar.match_line("ANNEX 11 Computerised Systems").unwrap();
    assert_eq!(annex.section_id.as_deref(), Some("Annex 11"));

    let mark = grammar.match_line("§ 211.68 Automatic equipment").unwrap();
    assert_eq!(mark.section_id.as_deref(), Some("§ 211.68"));

    let dotted = grammar.match_line("4.2.1 Documentation control").unwrap();
    assert_eq!(dotted.section_id.as_deref(), Some("4.2.1"));
    assert_eq!(dotted.section_title.as_deref(), Some("Documentation control"));

    let korean = grammar.match_line("제1조 목적").unwrap();
    assert_eq!(korean.section_id.as_deref(), Some("제1조"));
    assert_eq!(korean.section_title.as_deref(), Some("목적"));
}

#[test]
fn heading_grammar_rejects_body_lines() {
    let grammar = HeadingGrammar::new().unwrap();
    assert!(grammar.match_line("The batch record shall be reviewed.").is_none());
    assert!(grammar.match_line("").is_none());
}

#[test]
fn detect_sections_splits_on_headings_and_keeps_order() {
    let grammar = HeadingGrammar::new().unwrap();
    let text = "Section 1 Scope\nThis document applies broadly.\nSection 2 Definitions\nTerms used herein.";

    let units = detect_sections(text, &grammar);

    assert_eq!(units.len(), 2);
    assert_eq!(units[0].section_id.as_deref(), Some("Section 1"));
    assert_eq!(units[1].section_id.as_deref(), Some("Section 2"));
    assert!(units[0].start_offset < units[1].start_offset);
    assert!(units[0].end_offset < units[1].start_offset);
    assert!(units[1].text.contains("Terms used herein."));
}

#[test]
fn detect_sections_puts_unheaded_text_in_a_preface_unit() {
    let grammar = HeadingGrammar::new().unwrap();
    let units = detect_sections("Just some narrative.\nNo headings anywhere.", &grammar);

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].section_id.as_deref(), Some(PREFACE_SECTION_ID));
    assert!(units[0].text.contains("No headings anywhere."));
}

#[test]
fn oversized_units_split_along_subclause_markers() {
    let marker = subclause::marker_regex().unwrap();
    let filler = "x".repeat(900);
    let text = format!("(1) First requirement. {filler}\n(2) Second requirement. {filler}");
    let unit = StructuralUnit {
        section_id: Some("Section 4".to_string()),
        section_title: Some("Production".to_string()),
        text: text.clone(),
        start_offset: 0,
        end_offset: char_len(&text),
    };

    let sub_units = split_oversized_units(vec![unit], 1600, &marker);

    assert_eq!(sub_units.len(), 2);
    assert!(sub_units[0].text.starts_with("(1)"));
    assert!(sub_units[1].text.starts_with("(2)"));
    assert_eq!(sub_units[0].section_id.as_deref(), Some("Section 4"));
    assert_eq!(sub_units[1].section_title.as_deref(), Some("Production"));
    assert!(sub_units[0].end_offset < sub_units[1].start_offset);
}

#[test]
fn small_units_and_markerless_units_pass_through_unsplit() {
    let marker = subclause::marker_regex().unwrap();
    let small = StructuralUnit {
        section_id: None,
        section_title: None,
        text: "(1) short\n(2) also short".to_string(),
        start_offset: 0,
        end_offset: 24,
    };
    let markerless_text = "y".repeat(2000);
    let markerless = StructuralUnit {
        section_id: None,
        section_title: None,
        text: markerless_text.clone(),
        start_offset: 0,
        end_offset: 2000,
    };

    let out = split_oversized_units(vec![small.clone(), markerless.clone()], 1600, &marker);

    assert_eq!(out, vec![small, markerless]);
}

#[test]
fn windowing_bounds_chunk_size_and_carries_overlap() {
    let config = structure_config();
    let text = "z".repeat(5000);
    let unit = StructuralUnit {
        section_id: Some("Section 9".to_string()),
        section_title: None,
        text,
        start_offset: 0,
        end_offset: 5000,
    };

    let chunks = window_units(vec![unit], &config);

    // stride 1080 over 5000 chars: starts at 0, 1080, 2160, 3240, 4320
    assert_eq!(chunks.len(), 5);
    for chunk in &chunks {
        assert!(char_len(&chunk.text) <= config.chunk_size);
        assert_eq!(chunk.section_id.as_deref(), Some("Section 9"));
    }
    assert_eq!(chunks[0].start_offset, 0);
    assert_eq!(chunks[1].start_offset, 1080);
    assert_eq!(chunks[4].end_offset, 5000);
}

#[test]
fn window_overlap_repeats_the_tail_of_the_previous_chunk() {
    let config = structure_config();
    let text = (0..2600)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect::<String>();
    let unit = StructuralUnit {
        section_id: None,
        section_title: None,
        text: text.clone(),
        start_offset: 0,
        end_offset: 2600,
    };

    let chunks = window_units(vec![unit], &config);

    assert!(chunks.len() >= 2);
    let first_tail = chunks[0].text.chars().skip(1080).collect::<String>();
    let second_head = chunks[1].text.chars().take(120).collect::<String>();
    assert_eq!(first_tail, second_head);
}

#[test]
fn stride_never_stalls_when_overlap_reaches_chunk_size() {
    let config = ChunkConfig {
        chunk_size: 100,
        overlap: 100,
        mode: ChunkMode::Structure,
        oversized_unit_threshold: 1600,
        jurisdiction_from_path: false,
    };
    assert_eq!(config.stride(), 100);

    let unit = StructuralUnit {
        section_id: None,
        section_title: None,
        text: "q".repeat(350),
        start_offset: 0,
        end_offset: 350,
    };
    let chunks = window_units(vec![unit], &config);
    assert_eq!(chunks.len(), 4);
}

#[test]
fn zero_chunk_size_is_rejected() {
    let config = ChunkConfig {
        chunk_size: 0,
        overlap: 0,
        mode: ChunkMode::Structure,
        oversized_unit_threshold: 1600,
        jurisdiction_from_path: false,
    };
    assert!(ChunkerContext::new(config).is_err());
}

#[test]
fn paragraph_split_drops_blank_segments() {
    let parts = split_paragraphs("first para\n\n\n\nsecond para\n\n   \n\nthird");
    assert_eq!(parts, vec!["first para", "second para", "third"]);
}

#[test]
fn sentence_split_merges_short_fragments() {
    let text = "Short one. Tiny. The quality unit is responsible for reviewing all batch records before release decisions are made. Final remark.";
    let parts = split_sentences(text);

    // the two short leading sentences fold into the long one
    assert!(parts.len() >= 2);
    assert!(parts[0].contains("Short one."));
    assert!(parts[0].contains("quality unit"));
}

#[test]
fn generic_paragraph_chunks_pack_and_seed_overlap() {
    let config = ChunkConfig {
        chunk_size: 120,
        overlap: 20,
        mode: ChunkMode::Paragraph,
        oversized_unit_threshold: 1600,
        jurisdiction_from_path: false,
    };
    let normalizer = TextNormalizer::new().unwrap();
    let first = "a".repeat(100);
    let second = "b".repeat(100);
    let text = format!("{first}\n\n{second}");

    let chunks = generic_chunks(&text, &config, &normalizer);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, first);
    assert!(chunks[1].text.starts_with(&"a".repeat(20)));
    assert!(chunks[1].text.ends_with(&"b".repeat(100)));
    assert!(chunks[0].start_offset < chunks[1].start_offset);
    assert!(chunks[1].start_offset < chunks[0].end_offset);
}

#[test]
fn generic_chunks_of_empty_text_are_empty() {
    let config = structure_config();
    let normalizer = TextNormalizer::new().unwrap();
    assert!(generic_chunks("   \n\n  ", &config, &normalizer).is_empty());
}

#[test]
fn page_map_attributes_offsets_across_separators() {
    let pages = vec!["aaaa".to_string(), "bbbb".to_string(), "cccc".to_string()];
    let map = PageMap::new(&pages);

    assert_eq!(map.page_for_offset(0), 1);
    assert_eq!(map.page_for_offset(6), 1);
    assert_eq!(map.page_for_offset(7), 2);
    assert_eq!(map.page_for_offset(12), 2);
    assert_eq!(map.page_for_offset(999), 3);
    assert_eq!(map.page_range(5, 13), (1, 3));
}

#[test]
fn page_map_of_no_pages_defaults_to_page_one() {
    let map = PageMap::new(&[]);
    assert_eq!(map.page_range(0, 50), (1, 1));
}

#[test]
fn doc_date_and_version_come_from_head_text_first() {
    let patterns = MetadataPatterns::new().unwrap();
    let pages = vec![
        "Good Manufacturing Practice Guide\nEffective date: 2021-03-15\nRev 3.1".to_string(),
        "body".to_string(),
    ];

    let (date, version) = extract_doc_date_and_version(&patterns, &pages, "guide_2019.pdf");

    assert_eq!(date.as_deref(), Some("2021-03-15"));
    assert_eq!(version.as_deref(), Some("Rev 3.1"));
}

#[test]
fn doc_date_and_version_fall_back_to_the_filename() {
    let patterns = MetadataPatterns::new().unwrap();
    let pages = vec!["no dates in the body text".to_string()];

    let (date, version) =
        extract_doc_date_and_version(&patterns, &pages, "annex11_ver_2.0_2020.pdf");

    assert_eq!(date.as_deref(), Some("2020"));
    assert_eq!(version.as_deref(), Some("ver 2.0"));
}

#[test]
fn jurisdiction_is_inferred_from_path_keywords() {
    assert_eq!(infer_jurisdiction("/docs/fda/part211.pdf").as_deref(), Some("US-FDA"));
    assert_eq!(infer_jurisdiction("/docs/who_trs/annex.pdf").as_deref(), Some("WHO"));
    assert_eq!(infer_jurisdiction("/docs/mfds/notice.pdf").as_deref(), Some("KR-MFDS"));
    assert_eq!(infer_jurisdiction("/docs/pics/guide.pdf").as_deref(), Some("PIC/S"));
    assert_eq!(infer_jurisdiction("/docs/misc/notes.pdf"), None);
}

#[test]
fn normative_strength_follows_the_dominant_keyword_class() {
    let patterns = MetadataPatterns::new().unwrap();

    let must = label_normative_strength(&patterns, "Records shall be retained. Retention must be documented.");
    assert_eq!(must, Some(NormativeStrength::Must));

    let should = label_normative_strength(&patterns, "It is recommended to review the log monthly.");
    assert_eq!(should, Some(NormativeStrength::Should));

    let may = label_normative_strength(&patterns, "Copies may be stored off-site.");
    assert_eq!(may, Some(NormativeStrength::May));

    assert_eq!(label_normative_strength(&patterns, "Purely descriptive text."), None);
}

#[test]
fn normative_strength_ties_break_toward_the_stronger_class() {
    let patterns = MetadataPatterns::new().unwrap();
    let label = label_normative_strength(&patterns, "The firm shall comply. The firm should document this.");
    assert_eq!(label, Some(NormativeStrength::Must));
}

#[test]
fn normative_strength_counts_korean_keywords() {
    let patterns = MetadataPatterns::new().unwrap();
    let label = label_normative_strength(&patterns, "기록은 5년간 보관하여야 한다.");
    assert_eq!(label, Some(NormativeStrength::Must));
}

#[test]
fn chunk_document_produces_sectioned_records_with_dense_indices() {
    let context = context_with(structure_config());
    let source = source_with_pages(vec![
        "Section 1 Scope\nThis guide shall apply to manufacturing sites.",
        "Section 2 Personnel\nStaff should be trained before starting work.",
    ]);

    let records = context.chunk_document(&source, &DocumentOverrides::default());

    assert_eq!(records.len(), 2);
    for (index, record) in records.iter().enumerate() {
        assert_eq!(record.chunk_index, index);
        assert_eq!(record.id, format!("guideline-abc123-{index:04}"));
        assert_eq!(record.doc_id, "guideline-abc123");
        assert!(record.page_start >= 1);
        assert!(record.page_end <= 2);
        assert!(record.page_start <= record.page_end);
    }
    assert_eq!(records[0].section_id.as_deref(), Some("Section 1"));
    assert_eq!(records[1].section_id.as_deref(), Some("Section 2"));
    assert_eq!(records[0].normative_strength, Some(NormativeStrength::Must));
    assert_eq!(records[1].normative_strength, Some(NormativeStrength::Should));
}

#[test]
fn chunk_document_is_deterministic() {
    let context = context_with(structure_config());
    let source = source_with_pages(vec![
        "Section 1 Scope\nThe batch record shall be reviewed.",
        "Annex 1 Sterile Products\nAseptic areas should be monitored.",
    ]);

    let first = context.chunk_document(&source, &DocumentOverrides::default());
    let second = context.chunk_document(&source, &DocumentOverrides::default());
    assert_eq!(first, second);
}

#[test]
fn chunk_document_yields_nothing_for_blank_pages() {
    let context = context_with(structure_config());
    let source = source_with_pages(vec!["   \n\n ", "\t \n"]);
    assert!(context.chunk_document(&source, &DocumentOverrides::default()).is_empty());
}

#[test]
fn overrides_take_precedence_over_heuristics() {
    let context = context_with(structure_config());
    let source = source_with_pages(vec![
        "Effective date: 2021-03-15 Rev 3.1\nSection 1 Scope\nThe rule shall apply.",
    ]);
    let overrides = DocumentOverrides {
        source_url: Some("https://example.org/guide.pdf".to_string()),
        doc_date: Some("2024-01-01".to_string()),
        doc_version: None,
    };

    let records = context.chunk_document(&source, &overrides);

    assert!(!records.is_empty());
    assert_eq!(records[0].doc_date.as_deref(), Some("2024-01-01"));
    assert_eq!(records[0].doc_version.as_deref(), Some("Rev 3.1"));
    assert_eq!(records[0].source_url.as_deref(), Some("https://example.org/guide.pdf"));
}
