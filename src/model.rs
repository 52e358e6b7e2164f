use crate::odt::styles::StyleHandle;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub(crate) fn as_odf(self) -> &'static str {
        match self {
            Alignment::Left => "start",
            Alignment::Center => "center",
            Alignment::Right => "end",
            Alignment::Justify => "justify",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParagraphKind {
    Body,
    Heading { level: u8 },
}

#[derive(Clone, Debug)]
pub struct Paragraph {
    pub kind: ParagraphKind,
    pub style: Option<StyleHandle>,
    pub text: String,
    pub frames: Vec<Frame>,
}

impl Paragraph {
    pub fn new(style: Option<StyleHandle>, text: impl Into<String>) -> Self {
        Self {
            kind: ParagraphKind::Body,
            style,
            text: text.into(),
            frames: Vec::new(),
        }
    }

    pub fn heading(level: u8, style: StyleHandle, text: impl Into<String>) -> Self {
        Self {
            kind: ParagraphKind::Heading { level },
            style: Some(style),
            text: text.into(),
            frames: Vec::new(),
        }
    }

    /// Empty paragraph hosting a paragraph-anchored frame.
    pub fn anchoring(style: Option<StyleHandle>, frame: Frame) -> Self {
        Self {
            kind: ParagraphKind::Body,
            style,
            text: String::new(),
            frames: vec![frame],
        }
    }
}

#[derive(Clone, Debug)]
pub struct TableColumn {
    pub style: StyleHandle,
    pub repeat: usize,
}

#[derive(Clone, Debug)]
pub struct TableCell {
    pub style: Option<StyleHandle>,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Clone, Debug)]
pub struct TableRow {
    pub style: Option<StyleHandle>,
    pub cells: Vec<TableCell>,
}

#[derive(Clone, Debug)]
pub struct Table {
    pub name: String,
    pub style: Option<StyleHandle>,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.columns.iter().map(|c| c.repeat).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    Paragraph,
    Page,
    AsChar,
}

impl Anchor {
    pub(crate) fn as_odf(self) -> &'static str {
        match self {
            Anchor::Paragraph => "paragraph",
            Anchor::Page => "page",
            Anchor::AsChar => "as-char",
        }
    }
}

#[derive(Clone, Debug)]
pub struct EmbeddedImage {
    pub href: String, // path inside the package, e.g. "Pictures/logo.png"
    pub width: f32,   // points
    pub height: f32,
}

#[derive(Clone, Debug)]
pub enum FrameContent {
    Blocks(Vec<Block>),
    Image(EmbeddedImage),
}

#[derive(Clone, Debug)]
pub struct Frame {
    pub name: String,
    pub style: StyleHandle,
    pub anchor: Anchor,
    pub width: f32, // points
    pub content: FrameContent,
}

#[derive(Clone, Debug)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}
