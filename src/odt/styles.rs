//! Style definitions and the per-document style registry.
//!
//! A [`Style`] is a prototype: it can be registered with any number of
//! documents, and each document gives it a name that does not collide with
//! anything already registered there. Registering the same prototype twice
//! with one document returns the handle from the first registration.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::PageGeometry;
use crate::model::Alignment;

use super::xml::{XmlWriter, pt};

static NEXT_STYLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a style prototype. Clones of a [`Style`] share it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StyleId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleFamily {
    Paragraph,
    Table,
    TableColumn,
    TableRow,
    TableCell,
    Graphic,
    PageLayout,
    MasterPage,
}

impl StyleFamily {
    fn as_odf(self) -> &'static str {
        match self {
            StyleFamily::Paragraph => "paragraph",
            StyleFamily::Table => "table",
            StyleFamily::TableColumn => "table-column",
            StyleFamily::TableRow => "table-row",
            StyleFamily::TableCell => "table-cell",
            StyleFamily::Graphic => "graphic",
            StyleFamily::PageLayout => "page-layout",
            StyleFamily::MasterPage => "master-page",
        }
    }
}

/// Which of the document's three style collections a style lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registry {
    /// Named styles visible in the editor (`office:styles`).
    Global,
    /// Document-local styles (`office:automatic-styles` of the content).
    Automatic,
    /// Page layouts and master pages.
    Master,
}

/// A style as registered with one document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StyleHandle {
    name: String,
    family: StyleFamily,
}

impl StyleHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> StyleFamily {
        self.family
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphProps {
    pub align: Option<Alignment>,
    pub margin_top: Option<f32>,
    pub margin_bottom: Option<f32>,
    pub break_before_page: bool,
    pub keep_with_next: bool,
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

/// Border widths in points; `None` draws no border on that side.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellProps {
    pub top: Option<f32>,
    pub bottom: Option<f32>,
    pub left: Option<f32>,
    pub right: Option<f32>,
    pub padding: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableProps {
    pub width: f32,
    pub align: Alignment,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GraphicProps {
    /// Text never flows beside the frame.
    pub wrap_none: bool,
    pub vertical_top: bool,
    pub horizontal_center: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StyleProps {
    Paragraph(ParagraphProps),
    Table(TableProps),
    TableColumn { width: Option<f32> },
    TableRow { min_height: Option<f32> },
    TableCell(CellProps),
    Graphic(GraphicProps),
    PageLayout(PageGeometry),
    /// References its page layout through the style's parent.
    MasterPage,
}

impl StyleProps {
    pub fn family(&self) -> StyleFamily {
        match self {
            StyleProps::Paragraph(_) => StyleFamily::Paragraph,
            StyleProps::Table(_) => StyleFamily::Table,
            StyleProps::TableColumn { .. } => StyleFamily::TableColumn,
            StyleProps::TableRow { .. } => StyleFamily::TableRow,
            StyleProps::TableCell(_) => StyleFamily::TableCell,
            StyleProps::Graphic(_) => StyleFamily::Graphic,
            StyleProps::PageLayout(_) => StyleFamily::PageLayout,
            StyleProps::MasterPage => StyleFamily::MasterPage,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Style {
    id: StyleId,
    base_name: String,
    parent: Option<Arc<Style>>,
    props: StyleProps,
}

impl Style {
    pub fn new(base_name: impl Into<String>, props: StyleProps) -> Self {
        Self {
            id: StyleId(NEXT_STYLE_ID.fetch_add(1, Ordering::Relaxed)),
            base_name: base_name.into(),
            parent: None,
            props,
        }
    }

    /// Unset properties are inherited from `parent`. For master pages the
    /// parent is the page layout.
    pub fn with_parent(mut self, parent: Arc<Style>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn id(&self) -> StyleId {
        self.id
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn props(&self) -> &StyleProps {
        &self.props
    }

    pub fn family(&self) -> StyleFamily {
        self.props.family()
    }
}

#[derive(Clone, Debug)]
pub struct RegisteredStyle {
    pub handle: StyleHandle,
    pub parent: Option<String>,
    pub props: StyleProps,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Table,
    Row,
    Cell,
    Column,
    Paragraph,
}

/// Table size in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableDims {
    pub width: usize,
    pub height: usize,
}

/// Zero-based column (`x`) and row (`y`) of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellPos {
    pub x: usize,
    pub y: usize,
}

/// Where a cell sits relative to the shared-border grid. Every cell draws its
/// right and bottom edge; the top row adds the top edge and the first column
/// the left edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellPlacement {
    Corner,
    Top,
    Left,
    Interior,
}

impl CellPlacement {
    pub fn of(pos: CellPos) -> Self {
        match (pos.x, pos.y) {
            (0, 0) => CellPlacement::Corner,
            (_, 0) => CellPlacement::Top,
            (0, _) => CellPlacement::Left,
            _ => CellPlacement::Interior,
        }
    }
}

/// Picks a style for one table element, or declines.
pub trait StyleSelector {
    fn select(
        &self,
        element: ElementKind,
        dims: TableDims,
        pos: CellPos,
        payload: &str,
    ) -> Option<(&Style, Registry)>;
}

/// The selection strategies tables are built with. Rules are tried in order;
/// the first one that matches wins.
#[derive(Clone, Copy, Debug)]
pub enum StyleRule<'a> {
    /// Every element of `element` kind.
    Element {
        element: ElementKind,
        style: &'a Style,
        registry: Registry,
    },
    /// Elements of the first row.
    HeaderRow {
        element: ElementKind,
        style: &'a Style,
        registry: Registry,
    },
    /// Elements of one column below the header row.
    Column {
        index: usize,
        element: ElementKind,
        style: &'a Style,
        registry: Registry,
    },
    /// Elements whose text equals `text`.
    Text {
        element: ElementKind,
        text: &'a str,
        style: &'a Style,
        registry: Registry,
    },
}

impl StyleSelector for StyleRule<'_> {
    fn select(
        &self,
        element: ElementKind,
        _dims: TableDims,
        pos: CellPos,
        payload: &str,
    ) -> Option<(&Style, Registry)> {
        match *self {
            StyleRule::Element {
                element: e,
                style,
                registry,
            } if e == element => Some((style, registry)),
            StyleRule::HeaderRow {
                element: e,
                style,
                registry,
            } if e == element && pos.y == 0 => Some((style, registry)),
            StyleRule::Column {
                index,
                element: e,
                style,
                registry,
            } if e == element && pos.x == index && pos.y > 0 => Some((style, registry)),
            StyleRule::Text {
                element: e,
                text,
                style,
                registry,
            } if e == element && payload == text => Some((style, registry)),
            _ => None,
        }
    }
}

fn parent_registry(family: StyleFamily) -> Registry {
    match family {
        StyleFamily::PageLayout | StyleFamily::MasterPage => Registry::Master,
        _ => Registry::Global,
    }
}

#[derive(Debug, Default)]
pub struct StyleRegistry {
    global: Vec<RegisteredStyle>,
    automatic: Vec<RegisteredStyle>,
    master: Vec<RegisteredStyle>,
    bound: HashMap<StyleId, StyleHandle>,
    names: HashSet<String>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `style` with this document. A style already registered here
    /// is returned unchanged, whatever `registry` is passed the second time.
    pub fn register(&mut self, style: &Style, registry: Registry) -> StyleHandle {
        if let Some(handle) = self.bound.get(&style.id) {
            return handle.clone();
        }

        let parent = style
            .parent
            .as_deref()
            .map(|p| self.register(p, parent_registry(p.family())).name);

        let name = self.unique_name(&style.base_name);
        self.names.insert(name.clone());
        let handle = StyleHandle {
            name,
            family: style.family(),
        };
        let entry = RegisteredStyle {
            handle: handle.clone(),
            parent,
            props: style.props.clone(),
        };
        match registry {
            Registry::Global => self.global.push(entry),
            Registry::Automatic => self.automatic.push(entry),
            Registry::Master => self.master.push(entry),
        }
        self.bound.insert(style.id, handle.clone());
        handle
    }

    /// Ask each selector in turn; register and return the first match.
    pub fn get_or_create<S: StyleSelector>(
        &mut self,
        selectors: &[S],
        element: ElementKind,
        dims: TableDims,
        pos: CellPos,
        payload: &str,
    ) -> Option<StyleHandle> {
        selectors
            .iter()
            .find_map(|s| s.select(element, dims, pos, payload))
            .map(|(style, registry)| self.register(style, registry))
    }

    pub fn is_registered(&self, style: &Style) -> bool {
        self.bound.contains_key(&style.id)
    }

    pub fn global(&self) -> &[RegisteredStyle] {
        &self.global
    }

    pub fn automatic(&self) -> &[RegisteredStyle] {
        &self.automatic
    }

    pub fn master(&self) -> &[RegisteredStyle] {
        &self.master
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.automatic.len() + self.master.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, name: &str) -> Option<&RegisteredStyle> {
        self.global
            .iter()
            .chain(&self.automatic)
            .chain(&self.master)
            .find(|s| s.handle.name == name)
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.names.contains(base) {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.names.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn border(width: Option<f32>) -> String {
    match width {
        Some(w) => format!("{} solid #000000", pt(w)),
        None => String::from("none"),
    }
}

impl RegisteredStyle {
    pub(crate) fn write(&self, w: &mut XmlWriter) {
        match &self.props {
            StyleProps::PageLayout(page) => {
                w.start("style:page-layout").attr("style:name", &self.handle.name);
                w.start("style:page-layout-properties")
                    .attr("fo:page-width", pt(page.width))
                    .attr("fo:page-height", pt(page.height))
                    .attr("style:print-orientation", "portrait")
                    .attr("fo:margin-top", pt(page.margin_top))
                    .attr("fo:margin-bottom", pt(page.margin_bottom))
                    .attr("fo:margin-left", pt(page.margin_left))
                    .attr("fo:margin-right", pt(page.margin_right))
                    .end();
                w.end();
                return;
            }
            StyleProps::MasterPage => {
                w.start("style:master-page")
                    .attr("style:name", &self.handle.name)
                    .attr_opt("style:page-layout-name", self.parent.as_deref())
                    .end();
                return;
            }
            _ => {}
        }

        w.start("style:style")
            .attr("style:name", &self.handle.name)
            .attr("style:family", self.handle.family.as_odf())
            .attr_opt("style:parent-style-name", self.parent.as_deref());

        match &self.props {
            StyleProps::Paragraph(p) => {
                w.start("style:paragraph-properties")
                    .attr_opt("fo:text-align", p.align.map(Alignment::as_odf))
                    .attr_opt("fo:margin-top", p.margin_top.map(pt))
                    .attr_opt("fo:margin-bottom", p.margin_bottom.map(pt));
                if p.break_before_page {
                    w.attr("fo:break-before", "page");
                }
                if p.keep_with_next {
                    w.attr("fo:keep-with-next", "always");
                }
                w.end();
                if p.font_size.is_some() || p.bold.is_some() || p.italic.is_some() {
                    w.start("style:text-properties")
                        .attr_opt("fo:font-size", p.font_size.map(pt))
                        .attr_opt(
                            "fo:font-weight",
                            p.bold.map(|b| if b { "bold" } else { "normal" }),
                        )
                        .attr_opt(
                            "fo:font-style",
                            p.italic.map(|i| if i { "italic" } else { "normal" }),
                        )
                        .end();
                }
            }
            StyleProps::Table(t) => {
                let align = match t.align {
                    Alignment::Left | Alignment::Justify => "left",
                    Alignment::Center => "center",
                    Alignment::Right => "right",
                };
                w.start("style:table-properties")
                    .attr("style:width", pt(t.width))
                    .attr("table:align", align)
                    .end();
            }
            StyleProps::TableColumn { width } => {
                w.start("style:table-column-properties")
                    .attr_opt("style:column-width", width.map(pt))
                    .end();
            }
            StyleProps::TableRow { min_height } => {
                w.start("style:table-row-properties")
                    .attr_opt("style:min-row-height", min_height.map(pt))
                    .end();
            }
            StyleProps::TableCell(c) => {
                w.start("style:table-cell-properties")
                    .attr("fo:padding", pt(c.padding))
                    .attr("fo:border-top", border(c.top))
                    .attr("fo:border-bottom", border(c.bottom))
                    .attr("fo:border-left", border(c.left))
                    .attr("fo:border-right", border(c.right))
                    .end();
            }
            StyleProps::Graphic(g) => {
                w.start("style:graphic-properties");
                if g.wrap_none {
                    w.attr("style:wrap", "none")
                        .attr("style:run-through", "foreground");
                }
                if g.vertical_top {
                    w.attr("style:vertical-pos", "top")
                        .attr("style:vertical-rel", "paragraph");
                }
                if g.horizontal_center {
                    w.attr("style:horizontal-pos", "center")
                        .attr("style:horizontal-rel", "paragraph");
                }
                w.attr("fo:border", "none")
                    .attr("fo:padding", pt(0.0))
                    .attr("style:flow-with-text", "true")
                    .end();
            }
            StyleProps::PageLayout(_) | StyleProps::MasterPage => unreachable!(),
        }

        w.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(name: &str) -> Style {
        Style::new(name, StyleProps::Paragraph(ParagraphProps::default()))
    }

    #[test]
    fn same_base_name_gets_distinct_names() {
        let mut reg = StyleRegistry::new();
        let a = reg.register(&para("Cell"), Registry::Automatic);
        let b = reg.register(&para("Cell"), Registry::Automatic);
        let c = reg.register(&para("Cell"), Registry::Global);
        assert_eq!(a.name(), "Cell");
        assert_eq!(b.name(), "Cell_1");
        assert_eq!(c.name(), "Cell_2");
    }

    #[test]
    fn parent_is_registered_once_as_global() {
        let base = Arc::new(para("Standard"));
        let child = Style::new(
            "Heading",
            StyleProps::Paragraph(ParagraphProps {
                bold: Some(true),
                ..Default::default()
            }),
        )
        .with_parent(base.clone());
        let sibling = para("Body").with_parent(base.clone());

        let mut reg = StyleRegistry::new();
        reg.register(&child, Registry::Automatic);
        reg.register(&sibling, Registry::Automatic);
        assert_eq!(reg.global().len(), 1);
        assert_eq!(reg.automatic().len(), 2);
        assert_eq!(reg.automatic()[0].parent.as_deref(), Some("Standard"));
    }

    #[test]
    fn placement_covers_grid() {
        assert_eq!(CellPlacement::of(CellPos { x: 0, y: 0 }), CellPlacement::Corner);
        assert_eq!(CellPlacement::of(CellPos { x: 2, y: 0 }), CellPlacement::Top);
        assert_eq!(CellPlacement::of(CellPos { x: 0, y: 3 }), CellPlacement::Left);
        assert_eq!(CellPlacement::of(CellPos { x: 1, y: 1 }), CellPlacement::Interior);
    }
}
