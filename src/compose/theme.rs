use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{ImageFormat, ImageReader};

use crate::config::{ComposerConfig, PageGeometry};
use crate::error::Result;
use crate::model::Alignment;
use crate::odt::styles::{CellProps, GraphicProps, ParagraphProps, Style, StyleProps, TableProps};

const BORDER: f32 = 0.5;
const CELL_PADDING: f32 = 2.0;

pub struct Logo {
    pub file_name: String,
    pub media_type: &'static str,
    pub data: Vec<u8>,
    pub width: f32, // points, as placed on the page
    pub height: f32,
}

impl Logo {
    pub fn load(path: &Path, max_width: f32) -> Result<Self> {
        let data = std::fs::read(path)?;
        let reader = ImageReader::new(Cursor::new(&data)).with_guessed_format()?;
        let format = reader.format();
        let (px_w, px_h) = reader.into_dimensions()?;
        let (media_type, ext) = match format {
            Some(ImageFormat::Png) => ("image/png", "png"),
            _ => ("image/jpeg", "jpg"),
        };
        // 96 dpi, shrunk to fit
        let natural_w = px_w as f32 * 0.75;
        let natural_h = px_h as f32 * 0.75;
        let scale = (max_width / natural_w).min(1.0);
        log::debug!(
            "Logo {}: {}x{} px, placed at {:.1}x{:.1} pt",
            path.display(),
            px_w,
            px_h,
            natural_w * scale,
            natural_h * scale
        );
        Ok(Self {
            file_name: format!("logo.{ext}"),
            media_type,
            data,
            width: natural_w * scale,
            height: natural_h * scale,
        })
    }
}

fn paragraph(props: ParagraphProps) -> StyleProps {
    StyleProps::Paragraph(props)
}

fn cell(top: bool, left: bool) -> StyleProps {
    StyleProps::TableCell(CellProps {
        top: top.then_some(BORDER),
        bottom: Some(BORDER),
        left: left.then_some(BORDER),
        right: Some(BORDER),
        padding: CELL_PADDING,
    })
}

/// Style prototypes shared by every document the composer produces.
pub struct Theme {
    pub geometry: PageGeometry,
    pub page_layout: Arc<Style>,
    pub master_page: Style,
    pub standard: Arc<Style>,

    pub title: Style,
    pub subtitle: Style,
    pub title_line: Style,
    pub section_heading: Style,
    pub caption: Style,
    pub body: Style,
    pub page_break: Style,
    pub notes_heading: Style,
    pub spacer: Style,

    pub table: Style,
    pub column: Style,
    pub header_text: Style,
    pub cell_text: Style,
    pub number_text: Style,
    pub corner_cell: Style,
    pub top_cell: Style,
    pub left_cell: Style,
    pub interior_cell: Style,
    pub ruled_row: Style,
    pub ruled_cell: Style,

    pub frame: Style,
    pub logo_frame: Style,
    pub logo: Option<Logo>,

    pub notes_rows: usize,
    pub ruled_row_height: f32,
}

impl Theme {
    pub fn new(config: &ComposerConfig) -> Result<Self> {
        let geometry = config.page.clone();
        let text_width = geometry.text_width();
        let logo = config
            .logo
            .as_deref()
            .map(|path| Logo::load(path, text_width / 3.0))
            .transpose()?;

        let page_layout = Arc::new(Style::new(
            "pm1",
            StyleProps::PageLayout(geometry.clone()),
        ));
        let master_page =
            Style::new("Standard", StyleProps::MasterPage).with_parent(page_layout.clone());
        let standard = Arc::new(Style::new(
            "Default",
            paragraph(ParagraphProps {
                font_size: Some(11.0),
                ..Default::default()
            }),
        ));
        let derived = |name: &str, props: ParagraphProps| {
            Style::new(name, paragraph(props)).with_parent(standard.clone())
        };

        // leaves room for the rounding of row heights in the renderer
        let ruled_row_height = (geometry.text_height() / (config.notes_rows + 1) as f32).floor();

        Ok(Self {
            title: derived(
                "Title",
                ParagraphProps {
                    align: Some(Alignment::Center),
                    break_before_page: true,
                    margin_top: Some(120.0),
                    margin_bottom: Some(24.0),
                    font_size: Some(22.0),
                    bold: Some(true),
                    ..Default::default()
                },
            ),
            subtitle: derived(
                "Subtitle",
                ParagraphProps {
                    align: Some(Alignment::Center),
                    margin_bottom: Some(18.0),
                    font_size: Some(16.0),
                    ..Default::default()
                },
            ),
            title_line: derived(
                "TitleLine",
                ParagraphProps {
                    align: Some(Alignment::Center),
                    margin_bottom: Some(6.0),
                    font_size: Some(12.0),
                    ..Default::default()
                },
            ),
            section_heading: derived(
                "Heading1",
                ParagraphProps {
                    margin_top: Some(18.0),
                    margin_bottom: Some(8.0),
                    keep_with_next: true,
                    font_size: Some(15.0),
                    bold: Some(true),
                    ..Default::default()
                },
            ),
            caption: derived(
                "Caption",
                ParagraphProps {
                    margin_top: Some(6.0),
                    margin_bottom: Some(4.0),
                    keep_with_next: true,
                    italic: Some(true),
                    ..Default::default()
                },
            ),
            body: derived("Body", ParagraphProps::default()),
            page_break: derived(
                "PageBreak",
                ParagraphProps {
                    break_before_page: true,
                    ..Default::default()
                },
            ),
            notes_heading: derived(
                "NotesHeading",
                ParagraphProps {
                    align: Some(Alignment::Center),
                    margin_bottom: Some(8.0),
                    font_size: Some(15.0),
                    bold: Some(true),
                    ..Default::default()
                },
            ),
            spacer: derived(
                "Spacer",
                ParagraphProps {
                    margin_bottom: Some(12.0),
                    ..Default::default()
                },
            ),

            table: Style::new(
                "Table",
                StyleProps::Table(TableProps {
                    width: text_width,
                    align: Alignment::Center,
                }),
            ),
            column: Style::new("Column", StyleProps::TableColumn { width: None }),
            header_text: derived(
                "TableHeading",
                ParagraphProps {
                    align: Some(Alignment::Center),
                    bold: Some(true),
                    ..Default::default()
                },
            ),
            cell_text: derived("TableContents", ParagraphProps::default()),
            number_text: derived(
                "TableNumber",
                ParagraphProps {
                    align: Some(Alignment::Center),
                    ..Default::default()
                },
            ),
            corner_cell: Style::new("CellCorner", cell(true, true)),
            top_cell: Style::new("CellTop", cell(true, false)),
            left_cell: Style::new("CellLeft", cell(false, true)),
            interior_cell: Style::new("Cell", cell(false, false)),
            ruled_row: Style::new(
                "RuledRow",
                StyleProps::TableRow {
                    min_height: Some(ruled_row_height),
                },
            ),
            ruled_cell: Style::new(
                "RuledCell",
                StyleProps::TableCell(CellProps {
                    bottom: Some(BORDER),
                    padding: 0.0,
                    ..Default::default()
                }),
            ),

            frame: Style::new(
                "BlockFrame",
                StyleProps::Graphic(GraphicProps {
                    wrap_none: true,
                    vertical_top: true,
                    horizontal_center: true,
                }),
            ),
            logo_frame: Style::new(
                "LogoFrame",
                StyleProps::Graphic(GraphicProps {
                    wrap_none: true,
                    vertical_top: false,
                    horizontal_center: true,
                }),
            ),
            logo,

            notes_rows: config.notes_rows,
            ruled_row_height,
            geometry,
            page_layout,
            master_page,
            standard,
        })
    }
}
