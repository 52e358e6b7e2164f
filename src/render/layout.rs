//! Page-count estimation straight from an ODT package.
//!
//! Paragraphs wrap word by word, table rows never split across pages and a
//! frame always moves to the next page as a whole. The estimate is
//! deterministic, which makes it suitable for tests and dry runs; the page
//! count of a real renderer can differ.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::config::{PageGeometry, RenderConfig};
use crate::error::{Error, Result};
use crate::fonts::FontMetrics;
use crate::odt::{DRAW_NS, FO_NS, OFFICE_NS, STYLE_NS, SVG_NS, TABLE_NS, TEXT_NS};

use super::{RenderOracle, TargetFormat};

const DEFAULT_FONT_SIZE: f32 = 12.0;

type Node<'a> = roxmltree::Node<'a, 'a>;

fn odf<'a>(node: Node<'a>, ns: &str, name: &str) -> Option<Node<'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(ns))
}

fn is(node: Node, ns: &str, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(ns)
}

/// "12.00pt", "2cm", "20mm", "1in" in points.
pub(crate) fn parse_length(value: &str) -> Option<f32> {
    let value = value.trim();
    let split = value
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f32 = number.parse().ok()?;
    let factor = match unit {
        "pt" | "" => 1.0,
        "cm" => 72.0 / 2.54,
        "mm" => 72.0 / 25.4,
        "in" => 72.0,
        "px" => 0.75,
        _ => return None,
    };
    Some(number * factor)
}

fn length_attr(node: Node, ns: &str, name: &str) -> Option<f32> {
    node.attribute((ns, name)).and_then(parse_length)
}

#[derive(Clone, Default)]
struct ParaStyle {
    parent: Option<String>,
    font_size: Option<f32>,
    bold: Option<bool>,
    margin_top: Option<f32>,
    margin_bottom: Option<f32>,
    break_before: Option<bool>,
}

struct ResolvedPara {
    font_size: f32,
    bold: bool,
    margin_top: f32,
    margin_bottom: f32,
    break_before: bool,
}

#[derive(Default)]
struct StyleSheet {
    paragraphs: HashMap<String, ParaStyle>,
    column_widths: HashMap<String, f32>,
    table_widths: HashMap<String, f32>,
    row_heights: HashMap<String, f32>,
    cell_padding: HashMap<String, f32>,
    page: Option<PageGeometry>,
}

impl StyleSheet {
    fn collect(&mut self, root: Node) {
        for node in root.descendants() {
            if is(node, STYLE_NS, "style") {
                self.collect_style(node);
            } else if is(node, STYLE_NS, "page-layout") && self.page.is_none() {
                if let Some(props) = odf(node, STYLE_NS, "page-layout-properties") {
                    let d = PageGeometry::default();
                    self.page = Some(PageGeometry {
                        width: length_attr(props, FO_NS, "page-width").unwrap_or(d.width),
                        height: length_attr(props, FO_NS, "page-height").unwrap_or(d.height),
                        margin_top: length_attr(props, FO_NS, "margin-top").unwrap_or(d.margin_top),
                        margin_bottom: length_attr(props, FO_NS, "margin-bottom")
                            .unwrap_or(d.margin_bottom),
                        margin_left: length_attr(props, FO_NS, "margin-left")
                            .unwrap_or(d.margin_left),
                        margin_right: length_attr(props, FO_NS, "margin-right")
                            .unwrap_or(d.margin_right),
                    });
                }
            }
        }
    }

    fn collect_style(&mut self, node: Node) {
        let Some(name) = node.attribute((STYLE_NS, "name")) else {
            return;
        };
        let name = name.to_string();
        match node.attribute((STYLE_NS, "family")) {
            Some("paragraph") => {
                let mut style = ParaStyle {
                    parent: node
                        .attribute((STYLE_NS, "parent-style-name"))
                        .map(str::to_string),
                    ..Default::default()
                };
                if let Some(p) = odf(node, STYLE_NS, "paragraph-properties") {
                    style.margin_top = length_attr(p, FO_NS, "margin-top");
                    style.margin_bottom = length_attr(p, FO_NS, "margin-bottom");
                    style.break_before = p.attribute((FO_NS, "break-before")).map(|v| v == "page");
                }
                if let Some(t) = odf(node, STYLE_NS, "text-properties") {
                    style.font_size = length_attr(t, FO_NS, "font-size");
                    style.bold = t.attribute((FO_NS, "font-weight")).map(|v| v == "bold");
                }
                self.paragraphs.insert(name, style);
            }
            Some("table") => {
                if let Some(w) = odf(node, STYLE_NS, "table-properties")
                    .and_then(|p| length_attr(p, STYLE_NS, "width"))
                {
                    self.table_widths.insert(name, w);
                }
            }
            Some("table-column") => {
                if let Some(w) = odf(node, STYLE_NS, "table-column-properties")
                    .and_then(|p| length_attr(p, STYLE_NS, "column-width"))
                {
                    self.column_widths.insert(name, w);
                }
            }
            Some("table-row") => {
                if let Some(h) = odf(node, STYLE_NS, "table-row-properties")
                    .and_then(|p| length_attr(p, STYLE_NS, "min-row-height"))
                {
                    self.row_heights.insert(name, h);
                }
            }
            Some("table-cell") => {
                if let Some(pad) = odf(node, STYLE_NS, "table-cell-properties")
                    .and_then(|p| length_attr(p, FO_NS, "padding"))
                {
                    self.cell_padding.insert(name, pad);
                }
            }
            _ => {}
        }
    }

    fn paragraph(&self, name: Option<&str>) -> ResolvedPara {
        let mut resolved = ParaStyle::default();
        let mut current = name;
        // parent chains are short; the bound only guards against cycles
        for _ in 0..16 {
            let Some(style) = current.and_then(|n| self.paragraphs.get(n)) else {
                break;
            };
            resolved.font_size = resolved.font_size.or(style.font_size);
            resolved.bold = resolved.bold.or(style.bold);
            resolved.margin_top = resolved.margin_top.or(style.margin_top);
            resolved.margin_bottom = resolved.margin_bottom.or(style.margin_bottom);
            resolved.break_before = resolved.break_before.or(style.break_before);
            current = style.parent.as_deref();
        }
        ResolvedPara {
            font_size: resolved.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            bold: resolved.bold.unwrap_or(false),
            margin_top: resolved.margin_top.unwrap_or(0.0),
            margin_bottom: resolved.margin_bottom.unwrap_or(0.0),
            break_before: resolved.break_before.unwrap_or(false),
        }
    }
}

/// Text of a paragraph, without the content of frames anchored to it.
fn paragraph_text(node: Node) -> String {
    let mut text = String::new();
    for child in node.children() {
        if child.is_text() {
            text.push_str(child.text().unwrap_or(""));
        } else if is(child, TEXT_NS, "line-break") {
            text.push('\n');
        } else if is(child, TEXT_NS, "tab") {
            text.push(' ');
        } else if is(child, TEXT_NS, "s") {
            let count = child
                .attribute((TEXT_NS, "c"))
                .and_then(|c| c.parse().ok())
                .unwrap_or(1);
            text.push_str(&" ".repeat(count));
        } else if child.is_element() && !is(child, DRAW_NS, "frame") {
            text.push_str(&paragraph_text(child));
        }
    }
    text
}

struct Flow {
    page_height: f32,
    y: f32,
    pages: usize,
    placed_any: bool,
}

impl Flow {
    fn new(page_height: f32) -> Self {
        Self {
            page_height,
            y: 0.0,
            pages: 1,
            placed_any: false,
        }
    }

    fn break_page(&mut self) {
        if self.placed_any {
            self.pages += 1;
            self.y = 0.0;
        }
    }

    /// Place an unsplittable box of height `h`.
    fn place(&mut self, h: f32) {
        if self.y > 0.0 && self.y + h > self.page_height {
            self.pages += 1;
            self.y = 0.0;
        }
        self.y += h;
        while self.y > self.page_height {
            self.pages += 1;
            self.y -= self.page_height;
        }
        self.placed_any = true;
    }
}

/// Built-in estimator used when no office suite is available.
pub struct LayoutOracle {
    metrics: FontMetrics,
}

impl Default for LayoutOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutOracle {
    pub fn new() -> Self {
        Self {
            metrics: FontMetrics::fallback(),
        }
    }

    pub fn with_font(path: &Path) -> Result<Self> {
        Ok(Self {
            metrics: FontMetrics::load(path)?,
        })
    }

    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        match &config.font {
            Some(path) => Self::with_font(path),
            None => Ok(Self::new()),
        }
    }

    pub fn paginate(&self, document: &[u8]) -> Result<usize> {
        let mut zip = zip::ZipArchive::new(Cursor::new(document))
            .map_err(|_| Error::InvalidOdt("document is not a ZIP archive".into()))?;
        let content = read_zip_text(&mut zip, "content.xml")?
            .ok_or_else(|| Error::InvalidOdt("missing content.xml".into()))?;
        let styles = read_zip_text(&mut zip, "styles.xml")?;

        let mut sheet = StyleSheet::default();
        if let Some(styles) = &styles {
            let xml = roxmltree::Document::parse(styles)?;
            sheet.collect(xml.root_element());
        }
        let xml = roxmltree::Document::parse(&content)?;
        let root = xml.root_element();
        sheet.collect(root);

        let page = sheet.page.clone().unwrap_or_default();
        let body = odf(root, OFFICE_NS, "body")
            .and_then(|b| odf(b, OFFICE_NS, "text"))
            .ok_or_else(|| Error::InvalidOdt("missing office:text".into()))?;

        let mut flow = Flow::new(page.text_height());
        let width = page.text_width();
        for node in body.children().filter(|n| n.is_element()) {
            if is(node, TEXT_NS, "p") || is(node, TEXT_NS, "h") {
                let style = sheet.paragraph(node.attribute((TEXT_NS, "style-name")));
                if style.break_before {
                    flow.break_page();
                }
                flow.place(self.paragraph_height(&sheet, node, width));
            } else if is(node, TABLE_NS, "table") {
                for row in self.row_heights(&sheet, node, width) {
                    flow.place(row);
                }
            }
        }
        Ok(flow.pages)
    }

    fn paragraph_height(&self, sheet: &StyleSheet, node: Node, width: f32) -> f32 {
        let style = sheet.paragraph(node.attribute((TEXT_NS, "style-name")));
        let text = paragraph_text(node);
        let lines = self.metrics.line_count(&text, style.font_size, style.bold, width);
        let mut h = style.margin_top
            + lines as f32 * self.metrics.line_height(style.font_size)
            + style.margin_bottom;

        for frame in node.children().filter(|n| is(*n, DRAW_NS, "frame")) {
            let frame_w = length_attr(frame, SVG_NS, "width").unwrap_or(width);
            let frame_h = if let Some(text_box) = odf(frame, DRAW_NS, "text-box") {
                self.blocks_height(sheet, text_box, frame_w)
            } else {
                length_attr(frame, SVG_NS, "height").unwrap_or(0.0)
            };
            h += frame_h;
        }
        h
    }

    fn blocks_height(&self, sheet: &StyleSheet, parent: Node, width: f32) -> f32 {
        parent
            .children()
            .filter(|n| n.is_element())
            .map(|n| {
                if is(n, TABLE_NS, "table") {
                    self.row_heights(sheet, n, width).iter().sum()
                } else if is(n, TEXT_NS, "p") || is(n, TEXT_NS, "h") {
                    self.paragraph_height(sheet, n, width)
                } else {
                    0.0
                }
            })
            .sum()
    }

    fn row_heights(&self, sheet: &StyleSheet, table: Node, width: f32) -> Vec<f32> {
        let table_w = table
            .attribute((TABLE_NS, "style-name"))
            .and_then(|s| sheet.table_widths.get(s))
            .copied()
            .unwrap_or(width);

        let mut columns: Vec<Option<f32>> = Vec::new();
        for col in table.children().filter(|n| is(*n, TABLE_NS, "table-column")) {
            let repeat = col
                .attribute((TABLE_NS, "number-columns-repeated"))
                .and_then(|r| r.parse().ok())
                .unwrap_or(1usize);
            let w = col
                .attribute((TABLE_NS, "style-name"))
                .and_then(|s| sheet.column_widths.get(s))
                .copied();
            columns.extend(std::iter::repeat_n(w, repeat));
        }
        let even = table_w / columns.len().max(1) as f32;

        table
            .children()
            .filter(|n| is(*n, TABLE_NS, "table-row"))
            .map(|row| {
                let min_h = row
                    .attribute((TABLE_NS, "style-name"))
                    .and_then(|s| sheet.row_heights.get(s))
                    .copied()
                    .unwrap_or(0.0);
                row.children()
                    .filter(|n| is(*n, TABLE_NS, "table-cell"))
                    .enumerate()
                    .map(|(i, cell)| {
                        let pad = cell
                            .attribute((TABLE_NS, "style-name"))
                            .and_then(|s| sheet.cell_padding.get(s))
                            .copied()
                            .unwrap_or(0.0);
                        let col_w = columns.get(i).copied().flatten().unwrap_or(even);
                        2.0 * pad + self.blocks_height(sheet, cell, (col_w - 2.0 * pad).max(1.0))
                    })
                    .fold(min_h, f32::max)
            })
            .collect()
    }
}

fn read_zip_text(zip: &mut zip::ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Option<String>> {
    let mut file = match zip.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut text = String::new();
    file.read_to_string(&mut text)?;
    Ok(Some(text))
}

impl RenderOracle for LayoutOracle {
    fn convert(&self, document: &[u8], target: TargetFormat) -> Result<Vec<u8>> {
        match target {
            TargetFormat::Odt => Ok(document.to_vec()),
            TargetFormat::Pdf => Err(Error::Render(
                "the layout estimator cannot produce PDF; use the soffice oracle".into(),
            )),
        }
    }

    fn page_count(&self, document: &[u8]) -> Result<usize> {
        self.paginate(document)
    }

    fn supports_concurrency(&self) -> bool {
        true
    }
}
