pub mod styles;
mod xml;

use std::collections::HashMap;
use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::model::{Block, Frame, FrameContent, Paragraph, ParagraphKind, Table};

use styles::{
    CellPos, ElementKind, Registry, Style, StyleHandle, StyleRegistry, StyleSelector, TableDims,
};
use xml::{XmlWriter, pt};

pub(crate) const OFFICE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
pub(crate) const STYLE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:style:1.0";
pub(crate) const TEXT_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";
pub(crate) const TABLE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
pub(crate) const DRAW_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:drawing:1.0";
pub(crate) const FO_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub(crate) const SVG_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0";
const META_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:meta:1.0";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const MANIFEST_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";

pub const ODT_MIME: &str = "application/vnd.oasis.opendocument.text";

#[derive(Clone, Debug)]
pub struct Picture {
    pub href: String,
    pub media_type: &'static str,
    pub data: Vec<u8>,
}

/// A document under construction: its three style collections, the content
/// blocks in emission order, and embedded pictures.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    styles: StyleRegistry,
    blocks: Vec<Block>,
    pictures: Vec<Picture>,
    counters: HashMap<&'static str, usize>,
    title: Option<String>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, style: &Style, registry: Registry) -> StyleHandle {
        self.styles.register(style, registry)
    }

    pub fn get_or_create<S: StyleSelector>(
        &mut self,
        selectors: &[S],
        element: ElementKind,
        dims: TableDims,
        pos: CellPos,
        payload: &str,
    ) -> Option<StyleHandle> {
        self.styles
            .get_or_create(selectors, element, dims, pos, payload)
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Sequential object names per prefix: `Table1`, `Table2`, `Frame1`...
    pub fn next_name(&mut self, prefix: &'static str) -> String {
        let n = self.counters.entry(prefix).or_insert(0);
        *n += 1;
        format!("{prefix}{n}")
    }

    /// Embed a picture once per file name and return its package path.
    pub fn add_picture(
        &mut self,
        file_name: &str,
        media_type: &'static str,
        data: &[u8],
    ) -> String {
        let href = format!("Pictures/{file_name}");
        if !self.pictures.iter().any(|p| p.href == href) {
            self.pictures.push(Picture {
                href: href.clone(),
                media_type,
                data: data.to_vec(),
            });
        }
        href
    }

    pub fn pictures(&self) -> &[Picture] {
        &self.pictures
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Serialize into an OpenDocument Text package.
    pub fn to_odt(&self) -> Result<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // mimetype must be the first entry and uncompressed
        zip.start_file("mimetype", stored)?;
        zip.write_all(ODT_MIME.as_bytes())?;

        zip.start_file("content.xml", deflated)?;
        zip.write_all(self.content_xml().as_bytes())?;

        zip.start_file("styles.xml", deflated)?;
        zip.write_all(self.styles_xml().as_bytes())?;

        zip.start_file("meta.xml", deflated)?;
        zip.write_all(self.meta_xml().as_bytes())?;

        for picture in &self.pictures {
            zip.start_file(picture.href.as_str(), stored)?;
            zip.write_all(&picture.data)?;
        }

        zip.start_file("META-INF/manifest.xml", deflated)?;
        zip.write_all(self.manifest_xml().as_bytes())?;

        Ok(zip.finish()?.into_inner())
    }

    fn content_xml(&self) -> String {
        let mut w = XmlWriter::new();
        w.start("office:document-content");
        namespaces(&mut w);
        w.attr("office:version", "1.3");

        w.start("office:automatic-styles");
        for style in self.styles.automatic() {
            style.write(&mut w);
        }
        w.end();

        w.start("office:body").start("office:text");
        for block in &self.blocks {
            write_block(&mut w, block);
        }
        w.end().end();

        w.finish()
    }

    fn styles_xml(&self) -> String {
        let mut w = XmlWriter::new();
        w.start("office:document-styles");
        namespaces(&mut w);
        w.attr("office:version", "1.3");

        w.start("office:styles");
        for style in self.styles.global() {
            style.write(&mut w);
        }
        w.end();

        let (layouts, masters): (Vec<_>, Vec<_>) = self
            .styles
            .master()
            .iter()
            .partition(|s| s.handle.family() == styles::StyleFamily::PageLayout);

        w.start("office:automatic-styles");
        for style in layouts {
            style.write(&mut w);
        }
        w.end();

        w.start("office:master-styles");
        for style in masters {
            style.write(&mut w);
        }
        w.end();

        w.finish()
    }

    fn meta_xml(&self) -> String {
        let mut w = XmlWriter::new();
        w.start("office:document-meta")
            .attr("xmlns:office", OFFICE_NS)
            .attr("xmlns:meta", META_NS)
            .attr("xmlns:dc", DC_NS)
            .attr("office:version", "1.3");
        w.start("office:meta");
        w.start("meta:generator")
            .text(concat!("achievement-transcript/", env!("CARGO_PKG_VERSION")))
            .end();
        if let Some(title) = &self.title {
            w.start("dc:title").text(title).end();
        }
        w.end();
        w.finish()
    }

    fn manifest_xml(&self) -> String {
        let mut w = XmlWriter::new();
        w.start("manifest:manifest")
            .attr("xmlns:manifest", MANIFEST_NS)
            .attr("manifest:version", "1.3");
        let mut entry = |path: &str, media_type: &str| {
            w.empty(
                "manifest:file-entry",
                &[("manifest:full-path", path), ("manifest:media-type", media_type)],
            );
        };
        entry("/", ODT_MIME);
        entry("content.xml", "text/xml");
        entry("styles.xml", "text/xml");
        entry("meta.xml", "text/xml");
        for picture in &self.pictures {
            entry(&picture.href, picture.media_type);
        }
        w.finish()
    }
}

fn namespaces(w: &mut XmlWriter) {
    w.attr("xmlns:office", OFFICE_NS)
        .attr("xmlns:style", STYLE_NS)
        .attr("xmlns:text", TEXT_NS)
        .attr("xmlns:table", TABLE_NS)
        .attr("xmlns:draw", DRAW_NS)
        .attr("xmlns:fo", FO_NS)
        .attr("xmlns:xlink", XLINK_NS)
        .attr("xmlns:svg", SVG_NS);
}

fn write_block(w: &mut XmlWriter, block: &Block) {
    match block {
        Block::Paragraph(p) => write_paragraph(w, p),
        Block::Table(t) => write_table(w, t),
    }
}

fn write_paragraph(w: &mut XmlWriter, para: &Paragraph) {
    match para.kind {
        ParagraphKind::Body => {
            w.start("text:p");
        }
        ParagraphKind::Heading { level } => {
            w.start("text:h").attr("text:outline-level", level);
        }
    }
    w.attr_opt("text:style-name", para.style.as_ref().map(StyleHandle::name));
    for frame in &para.frames {
        write_frame(w, frame);
    }
    write_text(w, &para.text);
    w.end();
}

/// Runs of spaces, tabs and line breaks need explicit elements; plain
/// whitespace would be collapsed by consumers.
fn write_text(w: &mut XmlWriter, text: &str) {
    let mut plain = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\t' | '\n' => {
                w.text(&plain);
                plain.clear();
                w.empty(if ch == '\t' { "text:tab" } else { "text:line-break" }, &[]);
            }
            ' ' if chars.peek() == Some(&' ') => {
                plain.push(' ');
                let mut extra = 0;
                while chars.peek() == Some(&' ') {
                    chars.next();
                    extra += 1;
                }
                w.text(&plain);
                plain.clear();
                w.start("text:s").attr("text:c", extra).end();
            }
            _ => plain.push(ch),
        }
    }
    if !plain.is_empty() {
        w.text(&plain);
    }
}

fn write_frame(w: &mut XmlWriter, frame: &Frame) {
    w.start("draw:frame")
        .attr("draw:style-name", frame.style.name())
        .attr("draw:name", &frame.name)
        .attr("text:anchor-type", frame.anchor.as_odf())
        .attr("svg:width", pt(frame.width));
    match &frame.content {
        FrameContent::Blocks(blocks) => {
            w.start("draw:text-box");
            for block in blocks {
                write_block(w, block);
            }
            w.end();
        }
        FrameContent::Image(image) => {
            w.attr("svg:height", pt(image.height));
            w.empty(
                "draw:image",
                &[
                    ("xlink:href", image.href.as_str()),
                    ("xlink:type", "simple"),
                    ("xlink:show", "embed"),
                    ("xlink:actuate", "onLoad"),
                ],
            );
        }
    }
    w.end();
}

fn write_table(w: &mut XmlWriter, table: &Table) {
    w.start("table:table")
        .attr("table:name", &table.name)
        .attr_opt("table:style-name", table.style.as_ref().map(StyleHandle::name));
    for column in &table.columns {
        w.start("table:table-column")
            .attr("table:style-name", column.style.name());
        if column.repeat > 1 {
            w.attr("table:number-columns-repeated", column.repeat);
        }
        w.end();
    }
    for row in &table.rows {
        w.start("table:table-row")
            .attr_opt("table:style-name", row.style.as_ref().map(StyleHandle::name));
        for cell in &row.cells {
            w.start("table:table-cell")
                .attr_opt("table:style-name", cell.style.as_ref().map(StyleHandle::name))
                .attr("office:value-type", "string");
            for para in &cell.paragraphs {
                write_paragraph(w, para);
            }
            w.end();
        }
        w.end();
    }
    w.end();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_spaces_and_tabs_are_explicit() {
        let mut w = XmlWriter::new();
        w.start("text:p");
        write_text(&mut w, "a   b\tc");
        w.end();
        let xml = w.finish();
        assert!(xml.contains("<text:p>a <text:s text:c=\"2\"/>b<text:tab/>c</text:p>"));
    }

    #[test]
    fn names_count_per_prefix() {
        let mut doc = DocumentBuilder::new();
        assert_eq!(doc.next_name("Table"), "Table1");
        assert_eq!(doc.next_name("Frame"), "Frame1");
        assert_eq!(doc.next_name("Table"), "Table2");
    }
}
