//! Filler pages that bring a transcript up to a whole number of booklet
//! signatures.

use crate::config::ComposerConfig;
use crate::error::Result;
use crate::model::{Anchor, Block, EmbeddedImage, Frame, FrameContent, Paragraph, Table};
use crate::odt::DocumentBuilder;
use crate::odt::styles::{ElementKind, Registry, StyleRule};
use crate::render::RenderOracle;

use super::table::{TableSpec, build_table};
use super::theme::Theme;

pub const NOTES_HEADING: &str = "Заметки";

/// Blank paragraphs under the logo on the closing page.
const CLOSING_SPACERS: usize = 4;

/// Pages to append to `pages` so the total lands on a multiple of
/// `signature`. An already aligned count pads a whole signature unless
/// `pad_exact_multiple` is off.
pub fn missing_pages(pages: usize, signature: usize, pad_exact_multiple: bool) -> usize {
    let signature = signature.max(1);
    match pages % signature {
        0 if !pad_exact_multiple => 0,
        rem => signature - rem,
    }
}

/// Append filler pages to `doc` and return how many were appended.
///
/// With `explicit` set, exactly that many pages are appended and the oracle
/// is not consulted. Otherwise the document is serialized and measured.
pub fn resolve_padding<O>(
    doc: &mut DocumentBuilder,
    theme: &Theme,
    oracle: &O,
    config: &ComposerConfig,
    explicit: Option<usize>,
) -> Result<usize>
where
    O: RenderOracle + ?Sized,
{
    let missing = match explicit {
        Some(count) => count,
        None => {
            let pages = oracle.page_count(&doc.to_odt()?)?;
            let missing = missing_pages(
                pages,
                config.booklet_signature,
                config.pad_full_signature_on_exact_multiple,
            );
            log::debug!(
                "Padding: {} pages measured, signature {}, {} to add",
                pages,
                config.booklet_signature,
                missing
            );
            missing
        }
    };
    append_filler(doc, theme, missing)?;
    Ok(missing)
}

/// Notes page first, ruled pages in between, closing page last. A single
/// missing page is just the closing page.
pub fn append_filler(doc: &mut DocumentBuilder, theme: &Theme, missing: usize) -> Result<()> {
    if missing == 0 {
        return Ok(());
    }
    for page in 0..missing - 1 {
        page_break(doc, theme);
        let rows = if page == 0 {
            let style = doc.register(&theme.notes_heading, Registry::Global);
            doc.push(Block::Paragraph(Paragraph::heading(1, style, NOTES_HEADING)));
            theme.notes_rows.saturating_sub(2).max(1)
        } else {
            theme.notes_rows.max(1)
        };
        let table = ruled_table(doc, theme, rows)?;
        doc.push(Block::Table(table));
    }
    closing_page(doc, theme);
    Ok(())
}

fn page_break(doc: &mut DocumentBuilder, theme: &Theme) {
    let style = doc.register(&theme.page_break, Registry::Global);
    doc.push(Block::Paragraph(Paragraph::new(Some(style), "")));
}

fn ruled_table(doc: &mut DocumentBuilder, theme: &Theme, rows: usize) -> Result<Table> {
    let spec = TableSpec::new(vec![vec![String::new()]; rows])
        .without_header()
        .with_rule(StyleRule::Element {
            element: ElementKind::Row,
            style: &theme.ruled_row,
            registry: Registry::Automatic,
        })
        .with_rule(StyleRule::Element {
            element: ElementKind::Cell,
            style: &theme.ruled_cell,
            registry: Registry::Automatic,
        });
    build_table(doc, theme, spec)
}

fn closing_page(doc: &mut DocumentBuilder, theme: &Theme) {
    let style = doc.register(&theme.page_break, Registry::Global);
    let mut opening = Paragraph::new(Some(style), "");
    if let Some(logo) = &theme.logo {
        let href = doc.add_picture(&logo.file_name, logo.media_type, &logo.data);
        opening.frames.push(Frame {
            name: doc.next_name("Logo"),
            style: doc.register(&theme.logo_frame, Registry::Automatic),
            anchor: Anchor::Paragraph,
            width: logo.width,
            content: FrameContent::Image(EmbeddedImage {
                href,
                width: logo.width,
                height: logo.height,
            }),
        });
    }
    doc.push(Block::Paragraph(opening));

    let spacer = doc.register(&theme.spacer, Registry::Global);
    for _ in 0..CLOSING_SPACERS {
        doc.push(Block::Paragraph(Paragraph::new(Some(spacer.clone()), "")));
    }
}
