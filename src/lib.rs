pub mod compose;
pub mod config;
mod error;
mod fonts;
pub mod model;
pub mod naming;
pub mod odt;
pub mod records;
pub mod render;

pub use compose::{BatchOutcome, Composer, StudentSpan};
pub use config::ComposerConfig;
pub use error::{Error, Result};
pub use odt::DocumentBuilder;
pub use records::{AchievementRepository, MemoryRepository, StudentId};
pub use render::{LayoutOracle, RenderOracle, SofficeOracle, TargetFormat};

use std::path::Path;
use std::time::Instant;

/// Serialize a composed document, convert it to `format` and write it to
/// `output`.
pub fn export<O: RenderOracle + ?Sized>(
    doc: &DocumentBuilder,
    oracle: &O,
    format: TargetFormat,
    output: &Path,
) -> Result<()> {
    let t0 = Instant::now();

    let package = doc.to_odt()?;
    let t_package = t0.elapsed();

    let bytes = oracle.convert(&package, format)?;
    let t_convert = t0.elapsed();

    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: package={:.1}ms, convert={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_package.as_secs_f64() * 1000.0,
        (t_convert - t_package).as_secs_f64() * 1000.0,
        (t_total - t_convert).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
