use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// What a section writer emits when a student has no qualifying records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptySectionPolicy {
    /// No heading, no placeholder: the section does not appear.
    #[default]
    Omit,
    /// Heading followed by a "no data" line.
    Placeholder,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32, // points
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // A4, 2 cm margins
        Self {
            width: 595.3,
            height: 841.9,
            margin_top: 56.7,
            margin_bottom: 56.7,
            margin_left: 56.7,
            margin_right: 56.7,
        }
    }
}

impl PageGeometry {
    pub fn text_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn text_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub soffice: PathBuf,
    pub timeout_secs: u64,
    /// TrueType file used by the layout estimator for glyph advances.
    pub font: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            soffice: PathBuf::from("soffice"),
            timeout_secs: 120,
            font: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub booklet_signature: usize,
    /// Pad a whole extra signature when the page count is already a multiple
    /// of it. `false` pads nothing in that case.
    pub pad_full_signature_on_exact_multiple: bool,
    pub empty_sections: EmptySectionPolicy,
    pub summer_school_location: String,
    pub strict_records: bool,
    pub logo: Option<PathBuf>,
    pub notes_rows: usize,
    pub parallel_measure: bool,
    pub page: PageGeometry,
    pub render: RenderConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            booklet_signature: 4,
            pad_full_signature_on_exact_multiple: true,
            empty_sections: EmptySectionPolicy::Omit,
            summer_school_location: String::from("Летняя школа"),
            strict_records: true,
            logo: None,
            notes_rows: 32,
            parallel_measure: false,
            page: PageGeometry::default(),
            render: RenderConfig::default(),
        }
    }
}

impl ComposerConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config.normalized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub(crate) fn normalized(mut self) -> Self {
        if self.booklet_signature == 0 {
            log::warn!("booklet_signature = 0 is meaningless, using 1");
            self.booklet_signature = 1;
        }
        if self.notes_rows < 3 {
            self.notes_rows = 3;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = ComposerConfig::from_toml("").unwrap();
        assert_eq!(cfg.booklet_signature, 4);
        assert!(cfg.pad_full_signature_on_exact_multiple);
        assert_eq!(cfg.empty_sections, EmptySectionPolicy::Omit);
        assert_eq!(cfg.summer_school_location, "Летняя школа");
    }

    #[test]
    fn partial_tables_are_merged_with_defaults() {
        let cfg = ComposerConfig::from_toml(
            r#"
            booklet_signature = 8
            empty_sections = "placeholder"

            [page]
            margin_left = 30.0

            [render]
            timeout_secs = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.booklet_signature, 8);
        assert_eq!(cfg.empty_sections, EmptySectionPolicy::Placeholder);
        assert_eq!(cfg.page.margin_left, 30.0);
        assert_eq!(cfg.page.width, 595.3);
        assert_eq!(cfg.render.timeout_secs, 10);
        assert_eq!(cfg.render.soffice, PathBuf::from("soffice"));
    }

    #[test]
    fn zero_signature_is_clamped() {
        let cfg = ComposerConfig::from_toml("booklet_signature = 0").unwrap();
        assert_eq!(cfg.booklet_signature, 1);
    }
}
