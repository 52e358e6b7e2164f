mod common;

use achievement_transcript::compose::padding::{append_filler, missing_pages, resolve_padding};
use achievement_transcript::compose::theme::Theme;
use achievement_transcript::odt::styles::Registry;
use achievement_transcript::{Composer, ComposerConfig, DocumentBuilder};
use common::{
    CountingRepository, ScriptedOracle, body, count_style, headings, read_part, sample_dataset,
};

fn padded(pages: usize, config: ComposerConfig) -> (Vec<u8>, usize) {
    let repo = sample_dataset();
    let oracle = ScriptedOracle::new(pages);
    let composer = Composer::new(&repo, &oracle, config).unwrap();
    let odt = composer.compose_student(1).unwrap().to_odt().unwrap();
    (odt, oracle.calls())
}

/// Row counts of the top-level tables, which are the filler tables.
fn ruled_rows(odt: &[u8]) -> Vec<usize> {
    let content = read_part(odt, "content.xml");
    let xml = roxmltree::Document::parse(&content).unwrap();
    let text = xml
        .descendants()
        .find(|n| n.has_tag_name("text") && n.parent().is_some_and(|p| p.has_tag_name("body")))
        .unwrap();
    text.children()
        .filter(|n| n.has_tag_name("table"))
        .map(|t| t.children().filter(|r| r.has_tag_name("table-row")).count())
        .collect()
}

#[test]
fn forty_one_pages_get_three() {
    assert_eq!(missing_pages(41, 4, true), 3);
    let (odt, calls) = padded(41, ComposerConfig::default());
    assert_eq!(calls, 1);
    assert_eq!(count_style(&odt, "PageBreak"), 3);
}

#[test]
fn exact_multiple_pads_a_full_signature_by_default() {
    assert_eq!(missing_pages(44, 4, true), 4);
    let (odt, _) = padded(44, ComposerConfig::default());
    assert_eq!(count_style(&odt, "PageBreak"), 4);
}

#[test]
fn exact_multiple_pads_nothing_when_disabled() {
    let config = ComposerConfig {
        pad_full_signature_on_exact_multiple: false,
        ..Default::default()
    };
    assert_eq!(missing_pages(44, 4, false), 0);
    let (odt, _) = padded(44, config);
    assert_eq!(count_style(&odt, "PageBreak"), 0);
    assert!(!headings(&odt).contains(&"Заметки".to_string()));
}

#[test]
fn single_missing_page_is_the_closing_page() {
    let (odt, _) = padded(43, ComposerConfig::default());
    assert_eq!(count_style(&odt, "PageBreak"), 1);
    assert_eq!(count_style(&odt, "Spacer"), 4);
    assert!(!headings(&odt).contains(&"Заметки".to_string()));
    assert!(ruled_rows(&odt).is_empty());

    let last = body(&odt);
    let tail: Vec<&str> = last[last.len() - 5..]
        .iter()
        .map(|i| i.style.as_deref().unwrap_or(""))
        .collect();
    assert_eq!(tail, ["PageBreak", "Spacer", "Spacer", "Spacer", "Spacer"]);
}

#[test]
fn notes_then_ruled_pages_then_closing_page() {
    let (odt, _) = padded(40, ComposerConfig::default());
    let notes_rows = ComposerConfig::default().notes_rows;

    assert_eq!(count_style(&odt, "PageBreak"), 4);
    let notes: Vec<String> = headings(&odt)
        .into_iter()
        .filter(|h| h == "Заметки")
        .collect();
    assert_eq!(notes.len(), 1);
    assert_eq!(
        ruled_rows(&odt),
        vec![notes_rows - 2, notes_rows, notes_rows]
    );

    let items = body(&odt);
    let first_break = items
        .iter()
        .position(|i| i.style.as_deref() == Some("PageBreak"))
        .unwrap();
    let shape: Vec<&str> = items[first_break..]
        .iter()
        .map(|i| match (i.tag.as_str(), i.style.as_deref()) {
            ("table", _) => "table",
            ("h", _) => "notes",
            (_, Some("PageBreak")) => "break",
            (_, Some("Spacer")) => "spacer",
            _ => "other",
        })
        .collect();
    assert_eq!(
        shape,
        [
            "break", "notes", "table", "break", "table", "break", "table", "break", "spacer",
            "spacer", "spacer", "spacer",
        ]
    );
}

#[test]
fn explicit_count_skips_the_oracle() {
    let repo = sample_dataset();
    let oracle = ScriptedOracle::new(41);
    let composer = Composer::new(&repo, &oracle, ComposerConfig::default()).unwrap();
    let mut doc = composer.begin_document("explicit");
    composer.write_student_content(&mut doc, 1).unwrap();

    let added = resolve_padding(
        &mut doc,
        composer.theme(),
        composer.oracle(),
        composer.config(),
        Some(2),
    )
    .unwrap();
    assert_eq!(added, 2);
    assert_eq!(oracle.calls(), 0);

    let odt = doc.to_odt().unwrap();
    assert_eq!(count_style(&odt, "PageBreak"), 2);
    assert_eq!(ruled_rows(&odt).len(), 1);
}

#[test]
fn larger_signature_is_honoured() {
    let config = ComposerConfig {
        booklet_signature: 8,
        ..Default::default()
    };
    let (odt, _) = padded(41, config);
    assert_eq!(count_style(&odt, "PageBreak"), 7);
}

#[test]
fn tiny_notes_rows_in_a_literal_config_are_clamped() {
    let config = ComposerConfig {
        notes_rows: 1,
        booklet_signature: 4,
        ..Default::default()
    };
    let (odt, _) = padded(2, config);
    assert_eq!(count_style(&odt, "PageBreak"), 2);
    assert_eq!(ruled_rows(&odt), vec![1]);
}

#[test]
fn zero_signature_in_a_literal_config_pads_one_closing_page() {
    let config = ComposerConfig {
        booklet_signature: 0,
        ..Default::default()
    };
    let (odt, _) = padded(7, config);
    assert_eq!(count_style(&odt, "PageBreak"), 1);
    assert!(ruled_rows(&odt).is_empty());
}

#[test]
fn filler_tables_are_never_empty() {
    let config = ComposerConfig {
        notes_rows: 0,
        ..Default::default()
    };
    let theme = Theme::new(&config).unwrap();
    let mut doc = DocumentBuilder::new();
    doc.register(&theme.master_page, Registry::Master);
    append_filler(&mut doc, &theme, 3).unwrap();
    let odt = doc.to_odt().unwrap();
    assert_eq!(ruled_rows(&odt), vec![1, 1]);
}

#[test]
fn transcript_looks_the_student_up_once() {
    let repo = CountingRepository::new(sample_dataset());
    let oracle = ScriptedOracle::new(4);
    let composer = Composer::new(&repo, &oracle, ComposerConfig::default()).unwrap();
    composer.compose_student(1).unwrap();
    assert_eq!(repo.lookups(), 1);
}
