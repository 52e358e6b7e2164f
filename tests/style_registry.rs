use std::sync::Arc;

use achievement_transcript::compose::table::{TableSpec, build_table};
use achievement_transcript::compose::theme::Theme;
use achievement_transcript::odt::DocumentBuilder;
use achievement_transcript::odt::styles::{
    CellPos, ElementKind, ParagraphProps, Registry, Style, StyleProps, StyleRegistry, StyleRule,
    TableDims,
};
use achievement_transcript::{ComposerConfig, Error};

fn para(name: &str) -> Style {
    Style::new(name, StyleProps::Paragraph(ParagraphProps::default()))
}

fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
    cells
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

#[test]
fn registering_twice_yields_one_entry() {
    let style = para("Caption");
    let mut reg = StyleRegistry::new();
    let first = reg.register(&style, Registry::Global);
    let second = reg.register(&style, Registry::Global);
    assert_eq!(first, second);
    assert_eq!(reg.len(), 1);
    assert!(reg.is_registered(&style));
}

#[test]
fn second_registration_keeps_first_registry() {
    let style = para("Caption");
    let mut reg = StyleRegistry::new();
    reg.register(&style, Registry::Automatic);
    reg.register(&style, Registry::Global);
    assert_eq!(reg.automatic().len(), 1);
    assert!(reg.global().is_empty());
}

#[test]
fn page_layout_parent_goes_to_master() {
    let theme = Theme::new(&ComposerConfig::default()).unwrap();
    let mut reg = StyleRegistry::new();
    reg.register(&theme.master_page, Registry::Master);
    assert_eq!(reg.master().len(), 2);
    assert!(reg.is_registered(&theme.page_layout));
}

#[test]
fn shared_parent_is_registered_once() {
    let base = Arc::new(para("Base"));
    let a = para("A").with_parent(base.clone());
    let b = para("B").with_parent(base.clone());
    let mut reg = StyleRegistry::new();
    reg.register(&a, Registry::Automatic);
    reg.register(&b, Registry::Automatic);
    assert_eq!(reg.len(), 3);
    assert_eq!(reg.find("B").and_then(|s| s.parent.as_deref()), Some("Base"));
}

#[test]
fn first_matching_rule_wins() {
    let header = para("Header");
    let numbers = para("Numbers");
    let exact = para("Exact");
    let rules = [
        StyleRule::Text {
            element: ElementKind::Paragraph,
            text: "42",
            style: &exact,
            registry: Registry::Global,
        },
        StyleRule::HeaderRow {
            element: ElementKind::Paragraph,
            style: &header,
            registry: Registry::Global,
        },
        StyleRule::Column {
            index: 1,
            element: ElementKind::Paragraph,
            style: &numbers,
            registry: Registry::Global,
        },
    ];
    let dims = TableDims { width: 2, height: 3 };
    let mut reg = StyleRegistry::new();

    let pick = |reg: &mut StyleRegistry, x, y, text| {
        reg.get_or_create(&rules, ElementKind::Paragraph, dims, CellPos { x, y }, text)
            .map(|h| h.name().to_string())
    };
    assert_eq!(pick(&mut reg, 1, 0, "Часов").as_deref(), Some("Header"));
    assert_eq!(pick(&mut reg, 1, 1, "36").as_deref(), Some("Numbers"));
    assert_eq!(pick(&mut reg, 1, 2, "42").as_deref(), Some("Exact"));
    assert_eq!(pick(&mut reg, 0, 1, "Алгебра"), None);
    assert_eq!(
        reg.get_or_create(&rules, ElementKind::Cell, dims, CellPos { x: 1, y: 1 }, "36"),
        None
    );
}

#[test]
fn table_cells_share_borders() {
    let theme = Theme::new(&ComposerConfig::default()).unwrap();
    let mut doc = DocumentBuilder::new();
    let table = build_table(
        &mut doc,
        &theme,
        TableSpec::new(rows(&[&["a", "b"], &["c", "d"]])),
    )
    .unwrap();

    let names: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| {
            r.cells
                .iter()
                .map(|c| c.style.as_ref().unwrap().name().to_string())
                .collect()
        })
        .collect();
    assert_eq!(names[0], vec!["CellCorner", "CellTop"]);
    assert_eq!(names[1], vec!["CellLeft", "Cell"]);

    let header = table.rows[0].cells[0].paragraphs[0].style.as_ref().unwrap();
    let body = table.rows[1].cells[0].paragraphs[0].style.as_ref().unwrap();
    assert_eq!(header.name(), "TableHeading");
    assert_eq!(body.name(), "TableContents");
    assert_eq!(table.column_count(), 2);
}

#[test]
fn ragged_rows_are_rejected() {
    let theme = Theme::new(&ComposerConfig::default()).unwrap();
    let mut doc = DocumentBuilder::new();
    let err = build_table(
        &mut doc,
        &theme,
        TableSpec::new(rows(&[&["a", "b"], &["c"]])),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::RaggedTable {
            row: 1,
            found: 1,
            expected: 2
        }
    ));
}

#[test]
fn widths_must_match_columns() {
    let theme = Theme::new(&ComposerConfig::default()).unwrap();
    let mut doc = DocumentBuilder::new();
    let err = build_table(
        &mut doc,
        &theme,
        TableSpec::new(rows(&[&["a", "b"]])).with_widths(vec![100.0]),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ColumnWidths { found: 1, expected: 2 }));
}

#[test]
fn tables_get_sequential_names() {
    let theme = Theme::new(&ComposerConfig::default()).unwrap();
    let mut doc = DocumentBuilder::new();
    let t1 = build_table(&mut doc, &theme, TableSpec::new(rows(&[&["a"]]))).unwrap();
    let t2 = build_table(&mut doc, &theme, TableSpec::new(rows(&[&["b"]]))).unwrap();
    assert_eq!(t1.name, "Table1");
    assert_eq!(t2.name, "Table2");
}
