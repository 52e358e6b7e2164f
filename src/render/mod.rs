//! Conversion of composed packages into their paginated form.

mod layout;
mod soffice;

pub use layout::LayoutOracle;
pub use soffice::SofficeOracle;

use std::fmt;

use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetFormat {
    Odt,
    Pdf,
}

impl TargetFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Odt => "odt",
            TargetFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Converts an ODT package and reports how many pages it lays out to.
///
/// Both calls may block on an external tool. Failures are reported as-is;
/// callers decide whether to resubmit, which is always safe.
pub trait RenderOracle {
    fn convert(&self, document: &[u8], target: TargetFormat) -> Result<Vec<u8>>;

    fn page_count(&self, document: &[u8]) -> Result<usize>;

    /// Whether independent conversions may run at the same time.
    fn supports_concurrency(&self) -> bool {
        false
    }
}

impl<O: RenderOracle + ?Sized> RenderOracle for &O {
    fn convert(&self, document: &[u8], target: TargetFormat) -> Result<Vec<u8>> {
        (**self).convert(document, target)
    }

    fn page_count(&self, document: &[u8]) -> Result<usize> {
        (**self).page_count(document)
    }

    fn supports_concurrency(&self) -> bool {
        (**self).supports_concurrency()
    }
}
