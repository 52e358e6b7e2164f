use std::collections::HashMap;
use std::path::Path;

use memmap2::Mmap;
use ttf_parser::Face;

use crate::error::{Error, Result};

/// Average advance of a proportional serif face, in em, used when no font
/// file is configured.
const FALLBACK_ADVANCE: f32 = 0.5;
const FALLBACK_BOLD_ADVANCE: f32 = 0.55;
const FALLBACK_LINE_H_RATIO: f32 = 1.17;

/// Glyph metrics for line breaking. Advances come from a TrueType file read
/// once at load, or from fixed averages.
pub(crate) struct FontMetrics {
    /// Horizontal advance per mapped character, in em.
    advances: Option<HashMap<char, f32>>,
    line_h_ratio: f32,
}

impl FontMetrics {
    pub(crate) fn fallback() -> Self {
        Self {
            advances: None,
            line_h_ratio: FALLBACK_LINE_H_RATIO,
        }
    }

    pub(crate) fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is read-only and font files are not rewritten
        // while a composition runs.
        let data = unsafe { Mmap::map(&file) }?;
        let face = Face::parse(&data, 0).map_err(|e| Error::Font {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let upem = face.units_per_em() as f32;
        let line_h_ratio =
            (face.ascender() as f32 - face.descender() as f32 + face.line_gap() as f32) / upem;
        let advances = char_advances(&face);
        log::info!(
            "Layout metrics from {} (line height {:.2} em, {} glyphs)",
            path.display(),
            line_h_ratio,
            advances.len()
        );
        Ok(Self {
            advances: Some(advances),
            line_h_ratio,
        })
    }

    pub(crate) fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_h_ratio
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        match &self.advances {
            Some(advances) => {
                let em: f32 = text
                    .chars()
                    .map(|ch| advances.get(&ch).copied().unwrap_or(FALLBACK_ADVANCE))
                    .sum();
                // synthetic bold is slightly wider
                let emboldening = if bold { 1.05 } else { 1.0 };
                em * font_size * emboldening
            }
            None => {
                let advance = if bold {
                    FALLBACK_BOLD_ADVANCE
                } else {
                    FALLBACK_ADVANCE
                };
                text.chars().count() as f32 * advance * font_size
            }
        }
    }

    /// Lines `text` wraps to at `max_width`. Explicit line breaks start new
    /// lines; an empty paragraph still takes one line.
    pub(crate) fn line_count(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        max_width: f32,
    ) -> usize {
        let space = self.text_width(" ", font_size, bold);
        let mut lines = 0;
        for segment in text.split('\n') {
            lines += 1;
            let mut x = 0.0f32;
            for word in segment.split_whitespace() {
                let w = self.text_width(word, font_size, bold);
                if x > 0.0 && x + space + w > max_width {
                    lines += 1;
                    x = 0.0;
                }
                if w > max_width && max_width > 0.0 {
                    // unbreakable word spills over several lines
                    let extra = (w / max_width).ceil() as usize - 1;
                    lines += extra;
                    x = w - extra as f32 * max_width;
                } else {
                    x += if x > 0.0 { space + w } else { w };
                }
            }
        }
        lines
    }
}

/// Advances of every character the Unicode cmap subtables map.
fn char_advances(face: &Face) -> HashMap<char, f32> {
    let upem = face.units_per_em() as f32;
    let mut advances = HashMap::new();
    let Some(cmap) = face.tables().cmap else {
        return advances;
    };
    for subtable in cmap.subtables {
        if !subtable.is_unicode() {
            continue;
        }
        subtable.codepoints(|cp| {
            let Some(ch) = char::from_u32(cp) else {
                return;
            };
            if let Some(adv) = subtable
                .glyph_index(cp)
                .and_then(|gid| face.glyph_hor_advance(gid))
            {
                advances.entry(ch).or_insert(adv as f32 / upem);
            }
        });
    }
    advances
}
