use crate::error::{Error, Result};
use crate::model::{
    Anchor, Block, Frame, FrameContent, Paragraph, Table, TableCell, TableColumn, TableRow,
};
use crate::odt::DocumentBuilder;
use crate::odt::styles::{
    CellPlacement, CellPos, ElementKind, Registry, Style, StyleProps, StyleRule, TableDims,
};

use super::theme::Theme;

/// Row data plus styling for one table.
pub struct TableSpec<'a> {
    pub rows: Vec<Vec<String>>,
    pub column_widths: Option<Vec<f32>>,
    /// Style the first row as a header (bold, centered) unless a rule
    /// overrides it.
    pub header: bool,
    pub rules: Vec<StyleRule<'a>>,
}

impl<'a> TableSpec<'a> {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            column_widths: None,
            header: true,
            rules: Vec::new(),
        }
    }

    pub fn with_widths(mut self, widths: Vec<f32>) -> Self {
        self.column_widths = Some(widths);
        self
    }

    pub fn without_header(mut self) -> Self {
        self.header = false;
        self
    }

    pub fn with_rule(mut self, rule: StyleRule<'a>) -> Self {
        self.rules.push(rule);
        self
    }
}

fn default_cell(theme: &Theme, pos: CellPos) -> &Style {
    match CellPlacement::of(pos) {
        CellPlacement::Corner => &theme.corner_cell,
        CellPlacement::Top => &theme.top_cell,
        CellPlacement::Left => &theme.left_cell,
        CellPlacement::Interior => &theme.interior_cell,
    }
}

/// Build a table block. Every row must have as many cells as the first one.
pub fn build_table(doc: &mut DocumentBuilder, theme: &Theme, spec: TableSpec) -> Result<Table> {
    let width = spec.rows.first().map_or(0, Vec::len);
    for (y, row) in spec.rows.iter().enumerate() {
        if row.len() != width {
            return Err(Error::RaggedTable {
                row: y,
                found: row.len(),
                expected: width,
            });
        }
    }
    let dims = TableDims {
        width,
        height: spec.rows.len(),
    };
    let origin = CellPos { x: 0, y: 0 };
    let rules = spec.rules.as_slice();

    let table_style = doc
        .get_or_create(rules, ElementKind::Table, dims, origin, "")
        .unwrap_or_else(|| doc.register(&theme.table, Registry::Automatic));

    let columns = match &spec.column_widths {
        Some(widths) => {
            if widths.len() != width {
                return Err(Error::ColumnWidths {
                    found: widths.len(),
                    expected: width,
                });
            }
            // one fresh style per width, so equal base names never clash
            widths
                .iter()
                .map(|&w| {
                    let style = Style::new("Column", StyleProps::TableColumn { width: Some(w) });
                    TableColumn {
                        style: doc.register(&style, Registry::Automatic),
                        repeat: 1,
                    }
                })
                .collect()
        }
        None => {
            let style = doc
                .get_or_create(rules, ElementKind::Column, dims, origin, "")
                .unwrap_or_else(|| doc.register(&theme.column, Registry::Automatic));
            vec![TableColumn {
                style,
                repeat: width,
            }]
        }
    };

    let mut rows = Vec::with_capacity(spec.rows.len());
    for (y, row) in spec.rows.iter().enumerate() {
        let row_style = doc.get_or_create(rules, ElementKind::Row, dims, CellPos { x: 0, y }, "");
        let mut cells = Vec::with_capacity(width);
        for (x, text) in row.iter().enumerate() {
            let pos = CellPos { x, y };
            let cell_style = doc
                .get_or_create(rules, ElementKind::Cell, dims, pos, text)
                .unwrap_or_else(|| doc.register(default_cell(theme, pos), Registry::Automatic));
            let para_style = doc
                .get_or_create(rules, ElementKind::Paragraph, dims, pos, text)
                .unwrap_or_else(|| {
                    let style = if spec.header && y == 0 {
                        &theme.header_text
                    } else {
                        &theme.cell_text
                    };
                    doc.register(style, Registry::Global)
                });
            cells.push(TableCell {
                style: Some(cell_style),
                paragraphs: vec![Paragraph::new(Some(para_style), text.as_str())],
            });
        }
        rows.push(TableRow {
            style: row_style,
            cells,
        });
    }

    Ok(Table {
        name: doc.next_name("Table"),
        style: Some(table_style),
        columns,
        rows,
    })
}

/// Wrap blocks in a floating frame so they stay together on one page.
pub fn build_frame(
    doc: &mut DocumentBuilder,
    theme: &Theme,
    blocks: Vec<Block>,
    anchor: Anchor,
    width: f32,
) -> Frame {
    Frame {
        name: doc.next_name("Frame"),
        style: doc.register(&theme.frame, Registry::Automatic),
        anchor,
        width,
        content: FrameContent::Blocks(blocks),
    }
}

/// The paragraph a paragraph-anchored frame hangs from.
pub fn frame_host(doc: &mut DocumentBuilder, theme: &Theme, frame: Frame) -> Block {
    let style = doc.register(&theme.body, Registry::Global);
    Block::Paragraph(Paragraph::anchoring(Some(style), frame))
}
